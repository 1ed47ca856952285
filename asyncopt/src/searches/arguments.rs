//! Lookup helpers for string-keyed argument lists.
//!
//! Searches can be constructed from a `--name value` style argument
//! list (as handed to a BOINC daemon or MPI master); these helpers
//! pull typed values out of such a list. Absent optional arguments
//! fall back to documented defaults with a warning on stderr.

use super::errors::ConfigError;

use std::fmt::Display;
use std::str::FromStr;

/// Returns true if `name` appears in the argument list.
pub(crate) fn argument_exists(arguments: &[String], name: &str) -> bool {
    arguments.iter().any(|a| a == name)
}

/// Looks up the value following `name` and parses it.
///
/// Returns `Ok(None)` if the argument is absent, and
/// `ConfigError::InvalidArgument` if its value fails to parse.
pub(crate) fn get_argument<T: FromStr>(
    arguments: &[String],
    name: &str,
) -> Result<Option<T>, ConfigError> {
    match arguments.iter().position(|a| a == name) {
        Some(i) => {
            let value = arguments
                .get(i + 1)
                .ok_or_else(|| ConfigError::MissingArgument(name.to_string()))?;
            value
                .parse()
                .map(Some)
                .map_err(|_| ConfigError::InvalidArgument {
                    name: name.to_string(),
                    value: value.clone(),
                })
        }
        None => Ok(None),
    }
}

/// Looks up `name` and parses it, falling back to `default` with a
/// warning when absent.
pub(crate) fn get_argument_or<T: FromStr + Display>(
    arguments: &[String],
    name: &str,
    default: T,
) -> Result<T, ConfigError> {
    match get_argument(arguments, name)? {
        Some(value) => Ok(value),
        None => {
            eprintln!("Argument '{}' not found, using default of {}.", name, default);
            Ok(default)
        }
    }
}

/// Looks up a required argument, erroring when absent.
pub(crate) fn get_required_argument<T: FromStr>(
    arguments: &[String],
    name: &str,
) -> Result<T, ConfigError> {
    get_argument(arguments, name)?.ok_or_else(|| ConfigError::MissingArgument(name.to_string()))
}

/// Looks up the run of values following `name`, parsing each until
/// the next `--` flag or the end of the list.
pub(crate) fn get_argument_vector<T: FromStr>(
    arguments: &[String],
    name: &str,
) -> Result<Option<Vec<T>>, ConfigError> {
    let start = match arguments.iter().position(|a| a == name) {
        Some(i) => i + 1,
        None => return Ok(None),
    };

    let mut values = Vec::new();
    for value in &arguments[start..] {
        if value.starts_with("--") {
            break;
        }
        values.push(value.parse().map_err(|_| ConfigError::InvalidArgument {
            name: name.to_string(),
            value: value.clone(),
        })?);
    }
    if values.is_empty() {
        return Err(ConfigError::MissingArgument(name.to_string()));
    }
    Ok(Some(values))
}

/// Looks up a required vector argument, erroring when absent.
pub(crate) fn get_required_argument_vector<T: FromStr>(
    arguments: &[String],
    name: &str,
) -> Result<Vec<T>, ConfigError> {
    get_argument_vector(arguments, name)?
        .ok_or_else(|| ConfigError::MissingArgument(name.to_string()))
}
