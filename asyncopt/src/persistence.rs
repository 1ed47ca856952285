//! Write-through persistence for search engines.
//!
//! Every engine serializes its full named state (random sources
//! excluded; they are re-seeded from entropy on restore). The store
//! itself (a database row, a checkpoint file) lives behind
//! [`SearchStore`], and [`PersistedSearch`] composes an engine with
//! one, saving after every mutating call so an interrupted process
//! can resume from exactly the last committed operation.

use crate::AsynchronousOptimizer;

use serde::de::DeserializeOwned;
use serde::Serialize;

/// A backing store a search's serialized state can be written to and
/// read back from.
pub trait SearchStore {
    type Error: std::error::Error;

    /// Replaces the stored state with `state`.
    fn save<T: Serialize>(&mut self, state: &T) -> Result<(), Self::Error>;

    /// Reads back the stored state, or `None` when nothing has been
    /// saved yet.
    fn load<T: DeserializeOwned>(&self) -> Result<Option<T>, Self::Error>;
}

/// A search engine composed with a write-through store.
///
/// All mutation goes through [`mutate`](Self::mutate) or the
/// protocol delegates, each of which saves the engine's state before
/// returning; there is no write-behind caching and no batching.
pub struct PersistedSearch<E, S> {
    search: E,
    store: S,
}

impl<E, S> PersistedSearch<E, S>
where
    E: Serialize + DeserializeOwned,
    S: SearchStore,
{
    /// Wraps a fresh search, committing its initial state.
    pub fn new(search: E, mut store: S) -> Result<PersistedSearch<E, S>, S::Error> {
        store.save(&search)?;
        Ok(PersistedSearch { search, store })
    }

    /// Restores the search last saved to the store, or `None` when
    /// the store is empty.
    pub fn restore(store: S) -> Result<Option<PersistedSearch<E, S>>, S::Error> {
        Ok(store
            .load()?
            .map(|search| PersistedSearch { search, store }))
    }

    /// Restores the search last saved to the store, wrapping and
    /// committing a freshly-built one when the store is empty.
    pub fn restore_or(
        fallback: impl FnOnce() -> E,
        store: S,
    ) -> Result<PersistedSearch<E, S>, S::Error> {
        match store.load()? {
            Some(search) => Ok(PersistedSearch { search, store }),
            None => PersistedSearch::new(fallback(), store),
        }
    }

    /// Read access to the wrapped search.
    pub fn search(&self) -> &E {
        &self.search
    }

    /// Applies a mutating operation to the wrapped search, then
    /// commits the resulting state.
    pub fn mutate<T>(&mut self, operation: impl FnOnce(&mut E) -> T) -> Result<T, S::Error> {
        let result = operation(&mut self.search);
        self.store.save(&self.search)?;
        Ok(result)
    }

    pub fn into_inner(self) -> (E, S) {
        (self.search, self.store)
    }
}

/// Write-through delegates for the slot-protocol engines.
impl<E, S> PersistedSearch<E, S>
where
    E: AsynchronousOptimizer + Serialize + DeserializeOwned,
    S: SearchStore,
{
    pub fn new_individual(&mut self) -> Result<(u32, Vec<f64>), S::Error> {
        self.mutate(|search| search.new_individual())
    }

    pub fn new_individual_with_seed(&mut self) -> Result<(u32, Vec<f64>, u32), S::Error> {
        self.mutate(|search| search.new_individual_with_seed())
    }

    pub fn insert_individual(
        &mut self,
        id: u32,
        parameters: &[f64],
        fitness: f64,
    ) -> Result<bool, S::Error> {
        // Even a rejected report advances the reported counter, so
        // it is committed like any other mutation.
        self.mutate(|search| search.insert_individual(id, parameters, fitness))
    }

    pub fn is_running(&self) -> bool {
        self.search.is_running()
    }

    pub fn global_best(&self) -> &[f64] {
        self.search.global_best()
    }

    pub fn global_best_fitness(&self) -> Option<f64> {
        self.search.global_best_fitness()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::searches::{ParticleSwarm, ParticleSwarmConfig, TerminationLimits};

    use std::cell::RefCell;
    use std::rc::Rc;

    /// An in-memory store holding the serialized state as JSON.
    #[derive(Clone, Default)]
    struct MemoryStore {
        state: Rc<RefCell<Option<String>>>,
        saves: Rc<RefCell<usize>>,
    }

    impl SearchStore for MemoryStore {
        type Error = serde_json::Error;

        fn save<T: Serialize>(&mut self, state: &T) -> Result<(), Self::Error> {
            *self.state.borrow_mut() = Some(serde_json::to_string(state)?);
            *self.saves.borrow_mut() += 1;
            Ok(())
        }

        fn load<T: DeserializeOwned>(&self) -> Result<Option<T>, Self::Error> {
            match self.state.borrow().as_deref() {
                Some(json) => Ok(Some(serde_json::from_str(json)?)),
                None => Ok(None),
            }
        }
    }

    fn pso() -> ParticleSwarm {
        let mut search = ParticleSwarm::new(
            vec![0.0, 0.0],
            vec![10.0, 10.0],
            3,
            ParticleSwarmConfig::default(),
            TerminationLimits::default(),
        )
        .unwrap();
        search.seed_rng(47);
        search
    }

    #[test]
    fn restore_of_an_empty_store_is_none() {
        let restored: Option<PersistedSearch<ParticleSwarm, MemoryStore>> =
            PersistedSearch::restore(MemoryStore::default()).unwrap();
        assert!(restored.is_none());
    }

    #[test]
    fn restore_or_builds_fresh_only_when_empty() {
        let store = MemoryStore::default();
        let mut persisted = PersistedSearch::restore_or(pso, store.clone()).unwrap();
        persisted.insert_individual(0, &[1.0, 1.0], 2.0).unwrap();

        let resumed: PersistedSearch<ParticleSwarm, MemoryStore> =
            PersistedSearch::restore_or(pso, store).unwrap();
        assert_eq!(resumed.global_best_fitness(), Some(2.0));
    }

    #[test]
    fn every_mutating_call_is_committed() {
        let store = MemoryStore::default();
        let mut persisted = PersistedSearch::new(pso(), store.clone()).unwrap();
        assert_eq!(*store.saves.borrow(), 1);

        let (id, parameters) = persisted.new_individual().unwrap();
        assert_eq!(*store.saves.borrow(), 2);
        persisted.insert_individual(id, &parameters, 5.0).unwrap();
        assert_eq!(*store.saves.borrow(), 3);
    }

    #[test]
    fn rejected_reports_still_commit_their_counter() {
        let store = MemoryStore::default();
        let mut persisted = PersistedSearch::new(pso(), store.clone()).unwrap();
        persisted.insert_individual(0, &[1.0, 1.0], 5.0).unwrap();

        let saves = *store.saves.borrow();
        let modified = persisted.insert_individual(0, &[2.0, 2.0], 4.0).unwrap();
        assert!(!modified);
        assert_eq!(*store.saves.borrow(), saves + 1);
    }

    #[test]
    fn interrupted_process_resumes_from_last_commit() {
        let store = MemoryStore::default();
        let mut persisted = PersistedSearch::new(pso(), store.clone()).unwrap();
        let (id, parameters) = persisted.new_individual().unwrap();
        persisted.insert_individual(id, &parameters, 9.0).unwrap();
        let best = persisted.global_best().to_vec();
        drop(persisted);

        let restored: PersistedSearch<ParticleSwarm, MemoryStore> =
            PersistedSearch::restore(store).unwrap().unwrap();
        assert_eq!(restored.global_best_fitness(), Some(9.0));
        assert_eq!(restored.global_best(), best.as_slice());
        assert!(restored.is_running());
    }
}
