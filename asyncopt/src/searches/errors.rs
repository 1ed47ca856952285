use crate::recombination::BoundsError;

use std::error::Error;
use std::fmt;

/// An error raised while constructing a search engine, either from
/// explicit parameters or from a string-keyed argument list.
///
/// Configuration errors are fail-fast: they terminate the search
/// before it starts and are never produced once a search is running.
#[derive(Debug)]
pub enum ConfigError {
    /// The search box or a step/radius vector was invalid.
    Bounds(BoundsError),
    /// The population must hold at least one slot.
    ZeroPopulationSize,
    /// A required argument was absent from the argument list.
    MissingArgument(String),
    /// An argument was present but its value failed to parse.
    InvalidArgument { name: String, value: String },
    /// An unrecognized parent-selection name.
    UnknownParentSelection(String),
    /// An unrecognized recombination-selection name.
    UnknownRecombinationSelection(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bounds(e) => write!(f, "{}", e),
            Self::ZeroPopulationSize => write!(f, "population size must be greater than zero"),
            Self::MissingArgument(name) => {
                write!(f, "required argument '{}' was not specified", name)
            }
            Self::InvalidArgument { name, value } => {
                write!(f, "argument '{}' has unparseable value '{}'", name, value)
            }
            Self::UnknownParentSelection(name) => write!(
                f,
                "unknown parent selection type '{}' \
                 (possibilities are: best, random, current-to-best, current-to-random)",
                name
            ),
            Self::UnknownRecombinationSelection(name) => write!(
                f,
                "unknown recombination selection type '{}' \
                 (possibilities are: binary, exponential, sum, none)",
                name
            ),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Bounds(e) => Some(e),
            _ => None,
        }
    }
}

impl From<BoundsError> for ConfigError {
    fn from(e: BoundsError) -> ConfigError {
        ConfigError::Bounds(e)
    }
}

/// An error raised by a running search.
#[derive(Debug)]
pub enum SearchError {
    /// The genetic algorithm could not generate a non-duplicate
    /// encoding within its retry budget.
    SearchSpaceExhausted { retries: usize },
}

impl fmt::Display for SearchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SearchSpaceExhausted { retries } => write!(
                f,
                "could not generate a non-duplicate encoding after {} retries",
                retries
            ),
        }
    }
}

impl Error for SearchError {}
