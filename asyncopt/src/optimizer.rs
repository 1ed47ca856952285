use crate::Individual;

/// The generate-work / insert-result protocol shared by the
/// population-slot engines (particle swarm and differential
/// evolution).
///
/// A driving loop repeatedly asks for a new individual, ships its
/// parameters to some evaluator, and later reports the resulting
/// fitness back under the same slot id. No ordering is assumed
/// between generation and reporting: results may arrive reordered,
/// duplicated, or never. Consistency rests entirely on the
/// monotonic-improvement rule: a report only mutates a slot when it
/// beats that slot's recorded fitness.
///
/// Implementors are not internally thread-safe; a single control
/// thread serializes all calls, and evaluation parallelism lives
/// entirely on the far side of the protocol.
pub trait AsynchronousOptimizer {
    /// Produces the next work item: a slot id in
    /// `[0, population_size)` and the parameter vector to evaluate.
    fn new_individual(&mut self) -> (u32, Vec<f64>);

    /// Like [`new_individual`](Self::new_individual), additionally
    /// drawing a per-workunit seed for stochastic objectives.
    fn new_individual_with_seed(&mut self) -> (u32, Vec<f64>, u32);

    /// Reports an evaluated fitness for a slot. Returns true iff the
    /// engine's state changed; a non-improving (stale or duplicate)
    /// report is silently discarded and returns false.
    fn insert_individual(&mut self, id: u32, parameters: &[f64], fitness: f64) -> bool;

    /// Seeded variant of [`insert_individual`](Self::insert_individual).
    fn insert_individual_with_seed(
        &mut self,
        id: u32,
        parameters: &[f64],
        fitness: f64,
        seed: u32,
    ) -> bool {
        let _ = seed;
        self.insert_individual(id, parameters, fitness)
    }

    /// True iff a report with this fitness would mutate the slot.
    /// Used by validators to vet late or duplicate results without
    /// touching engine state.
    fn would_insert(&self, id: u32, fitness: f64) -> bool;

    /// True while no termination cap has been reached. The sole
    /// predicate work generators consult before issuing more work.
    fn is_running(&self) -> bool;

    /// The best parameter vector reported so far.
    fn global_best(&self) -> &[f64];

    /// The best fitness reported so far, or `None` before any report
    /// has been accepted.
    fn global_best_fitness(&self) -> Option<f64>;

    /// Snapshots every slot's best-known individual, for statistics
    /// and persistence.
    fn individuals(&self) -> Vec<Individual>;
}
