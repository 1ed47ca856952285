//! A name-keyed table of live searches.
//!
//! Work-distribution boundaries (a BOINC validator, an MPI master)
//! juggle many concurrently-running searches, each identified by
//! name. The registry is the explicit context object those
//! boundaries thread through their callbacks, owning the engines and
//! resolving names to them.

use crate::AsynchronousOptimizer;

use std::collections::HashMap;
use std::error::Error;
use std::fmt;

/// An error raised when registering a search.
#[derive(Debug)]
pub enum RegistryError {
    /// A search with this name is already registered.
    DuplicateName(String),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateName(name) => {
                write!(f, "a search named '{}' is already registered", name)
            }
        }
    }
}

impl Error for RegistryError {}

/// A table of named slot-protocol searches (particle swarm and
/// differential evolution engines, behind
/// [`AsynchronousOptimizer`]).
#[derive(Default)]
pub struct SearchRegistry {
    searches: HashMap<String, Box<dyn AsynchronousOptimizer>, ahash::RandomState>,
}

impl SearchRegistry {
    pub fn new() -> SearchRegistry {
        SearchRegistry {
            searches: HashMap::default(),
        }
    }

    /// Registers a search under a name.
    ///
    /// # Errors
    /// [`RegistryError::DuplicateName`] when the name is taken; the
    /// search is dropped in that case.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        search: Box<dyn AsynchronousOptimizer>,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        if self.searches.contains_key(&name) {
            return Err(RegistryError::DuplicateName(name));
        }
        self.searches.insert(name, search);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&dyn AsynchronousOptimizer> {
        self.searches.get(name).map(|s| s.as_ref())
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut dyn AsynchronousOptimizer> {
        Some(self.searches.get_mut(name)?.as_mut())
    }

    pub fn remove(&mut self, name: &str) -> Option<Box<dyn AsynchronousOptimizer>> {
        self.searches.remove(name)
    }

    /// Drops every search whose termination caps have been reached.
    pub fn prune_finished(&mut self) {
        self.searches.retain(|_, search| search.is_running());
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.searches.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.searches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.searches.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::searches::{
        DifferentialEvolution, DifferentialEvolutionConfig, ParticleSwarm, ParticleSwarmConfig,
        TerminationLimits,
    };

    fn pso(limits: TerminationLimits) -> Box<dyn AsynchronousOptimizer> {
        Box::new(
            ParticleSwarm::new(
                vec![0.0],
                vec![1.0],
                2,
                ParticleSwarmConfig::default(),
                limits,
            )
            .unwrap(),
        )
    }

    fn de() -> Box<dyn AsynchronousOptimizer> {
        Box::new(
            DifferentialEvolution::new(
                vec![0.0],
                vec![1.0],
                2,
                DifferentialEvolutionConfig::default(),
                TerminationLimits::default(),
            )
            .unwrap(),
        )
    }

    #[test]
    fn lookup_resolves_mixed_engine_types() {
        let mut registry = SearchRegistry::new();
        registry.register("swarm", pso(TerminationLimits::default())).unwrap();
        registry.register("de", de()).unwrap();

        assert_eq!(registry.len(), 2);
        assert!(registry.get("swarm").is_some());
        assert!(registry.get("missing").is_none());

        let search = registry.get_mut("de").unwrap();
        assert!(search.insert_individual(0, &[0.5], 1.0));
        assert_eq!(registry.get("de").unwrap().global_best_fitness(), Some(1.0));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut registry = SearchRegistry::new();
        registry.register("s", de()).unwrap();
        assert!(matches!(
            registry.register("s", de()),
            Err(RegistryError::DuplicateName(_))
        ));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn prune_drops_only_finished_searches() {
        let mut registry = SearchRegistry::new();
        registry
            .register("capped", pso(TerminationLimits::iterations(1)))
            .unwrap();
        registry.register("open", de()).unwrap();

        // Exhaust the capped search.
        for _ in 0..2 {
            registry.get_mut("capped").unwrap().new_individual();
        }
        assert!(!registry.get("capped").unwrap().is_running());

        registry.prune_finished();
        assert_eq!(registry.len(), 1);
        assert!(registry.get("capped").is_none());
        assert!(registry.get("open").is_some());
    }

    #[test]
    fn removed_searches_come_back_out() {
        let mut registry = SearchRegistry::new();
        registry.register("s", de()).unwrap();
        let search = registry.remove("s").unwrap();
        assert!(search.is_running());
        assert!(registry.is_empty());
    }
}
