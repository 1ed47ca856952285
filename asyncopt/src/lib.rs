//! An asynchronous black-box optimization toolkit.
//!
//! Four derivative-free maximizers (particle swarm, differential
//! evolution, an asynchronous Newton method, and a genetic algorithm
//! over arbitrary encodings) built for distributed evaluation: the
//! engine hands out parameter vectors tagged with a correlation id,
//! evaluators report fitnesses back in any order (possibly duplicated
//! or never), and a monotonic improvement-only-wins rule keeps the
//! population consistent without any locking or ordering guarantees.
//!
//! The engines are synchronous, non-blocking state machines driven by
//! a single control thread; evaluation parallelism (MPI workers,
//! volunteer-computing clients, a local thread pool) lives entirely
//! on the far side of the generate/insert protocol. Each engine also
//! offers an `iterate` convenience loop for running against a plain
//! function in-process.
//!
//! # Example usage: maximizing a paraboloid with particle swarm
//! ```
//! use asyncopt::{
//!     AsynchronousOptimizer, ParticleSwarm, ParticleSwarmConfig, TerminationLimits,
//! };
//!
//! // Peak of 3 at (1, -2).
//! fn objective(p: &[f64]) -> f64 {
//!     3.0 - (p[0] - 1.0).powi(2) - (p[1] + 2.0).powi(2)
//! }
//!
//! let mut search = ParticleSwarm::new(
//!     vec![-5.0, -5.0],
//!     vec![5.0, 5.0],
//!     20,
//!     ParticleSwarmConfig::default(),
//!     TerminationLimits::iterations(100),
//! )
//! .unwrap();
//!
//! // In a distributed deployment, new_individual/insert_individual
//! // straddle the network; here the loop runs in-process.
//! search.iterate(objective);
//!
//! let best = search.global_best();
//! assert!(search.global_best_fitness().unwrap() > 2.9);
//! assert!((best[0] - 1.0).abs() < 0.2 && (best[1] + 2.0).abs() < 0.2);
//! ```

mod individual;
mod optimizer;
mod persistence;
mod registry;
mod searches;

pub mod logging;
pub mod numerics;
pub mod recombination;

pub use individual::Individual;
pub use optimizer::AsynchronousOptimizer;
pub use persistence::{PersistedSearch, SearchStore};
pub use registry::{RegistryError, SearchRegistry};
pub use searches::*;
