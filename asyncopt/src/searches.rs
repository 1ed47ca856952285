//! The search engines: particle swarm, differential evolution, the
//! asynchronous Newton method, and a genetic algorithm over
//! arbitrary encodings.
//!
//! All four are driven through an asynchronous generate-work /
//! insert-result protocol; see the crate-level documentation.

mod arguments;
mod base;
mod differential_evolution;
mod errors;
mod genetic;
mod newton;
mod particle_swarm;

pub use base::TerminationLimits;
pub use differential_evolution::{
    DifferentialEvolution, DifferentialEvolutionConfig, ParentSelection, RecombinationSelection,
};
pub use errors::{ConfigError, SearchError};
pub use genetic::{Encoding, GeneticAlgorithm, GeneticAlgorithmConfig, GeneticIndividual};
pub use newton::{AsynchronousNewtonMethod, NewtonMethodConfig, WorkBatch};
pub use particle_swarm::{ParticleSwarm, ParticleSwarmConfig};
