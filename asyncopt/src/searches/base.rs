use super::arguments::{argument_exists, get_argument_or, get_required_argument_vector};
use super::errors::ConfigError;
use crate::recombination;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Caps on how long a search runs. A value of 0 leaves that cap
/// unbounded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminationLimits {
    /// Maximum number of whole-population iterations.
    pub maximum_iterations: u32,
    /// Maximum number of individuals handed out.
    pub maximum_created: u32,
    /// Maximum number of fitness reports accepted or rejected.
    pub maximum_reported: u32,
}

impl TerminationLimits {
    /// Limits for an iteration-capped search.
    pub fn iterations(maximum_iterations: u32) -> TerminationLimits {
        TerminationLimits {
            maximum_iterations,
            ..TerminationLimits::default()
        }
    }

    pub(crate) fn from_args(arguments: &[String]) -> Result<TerminationLimits, ConfigError> {
        Ok(TerminationLimits {
            maximum_iterations: get_argument_or(arguments, "--maximum_iterations", 0)?,
            maximum_created: get_argument_or(arguments, "--maximum_created", 0)?,
            maximum_reported: get_argument_or(arguments, "--maximum_reported", 0)?,
        })
    }
}

pub(crate) fn entropy_rng() -> StdRng {
    StdRng::from_entropy()
}

/// Lifecycle state shared by the population-slot engines (particle
/// swarm and differential evolution): the search box, the slot
/// round-robin, the created/reported counters and their caps, and the
/// engine's random source.
///
/// Engines embed this by composition rather than inheritance; all
/// slot bookkeeping funnels through [`next_slot`](Self::next_slot)
/// and [`is_running`](Self::is_running).
#[derive(Serialize, Deserialize)]
pub(crate) struct EvolutionaryBase {
    pub min_bound: Vec<f64>,
    pub max_bound: Vec<f64>,
    pub number_parameters: usize,
    pub population_size: usize,
    pub wrap_radians: bool,

    pub limits: TerminationLimits,
    pub current_iteration: u32,
    pub individuals_created: u32,
    pub individuals_reported: u32,

    pub current_individual: u32,
    pub initialized_individuals: usize,
    pub seeds: Vec<u32>,

    // Re-seeded from entropy when a search is restored from
    // persisted state.
    #[serde(skip, default = "entropy_rng")]
    pub rng: StdRng,
}

impl EvolutionaryBase {
    pub fn new(
        min_bound: Vec<f64>,
        max_bound: Vec<f64>,
        population_size: usize,
        limits: TerminationLimits,
        wrap_radians: bool,
    ) -> Result<EvolutionaryBase, ConfigError> {
        recombination::check_bounds(&min_bound, &max_bound)?;
        if population_size == 0 {
            return Err(ConfigError::ZeroPopulationSize);
        }

        let number_parameters = min_bound.len();
        Ok(EvolutionaryBase {
            min_bound,
            max_bound,
            number_parameters,
            population_size,
            wrap_radians,
            limits,
            current_iteration: 0,
            individuals_created: 0,
            individuals_reported: 0,
            current_individual: 0,
            initialized_individuals: 0,
            seeds: vec![0; population_size],
            rng: entropy_rng(),
        })
    }

    pub fn from_args(arguments: &[String]) -> Result<EvolutionaryBase, ConfigError> {
        let min_bound: Vec<f64> = get_required_argument_vector(arguments, "--min_bound")?;
        let max_bound: Vec<f64> = get_required_argument_vector(arguments, "--max_bound")?;
        let population_size = get_argument_or(arguments, "--population_size", 50)?;
        let limits = TerminationLimits::from_args(arguments)?;
        let wrap_radians = argument_exists(arguments, "--wrap_radians");

        EvolutionaryBase::new(min_bound, max_bound, population_size, limits, wrap_radians)
    }

    /// True while none of the configured caps have been reached.
    pub fn is_running(&self) -> bool {
        let l = &self.limits;
        (l.maximum_reported == 0 || self.individuals_reported < l.maximum_reported)
            && (l.maximum_created == 0 || self.individuals_created < l.maximum_created)
            && (l.maximum_iterations == 0 || self.current_iteration < l.maximum_iterations)
    }

    /// Advances the round-robin slot pointer, bumping the iteration
    /// counter each time the population wraps around.
    pub fn next_slot(&mut self) -> u32 {
        let id = self.current_individual;
        self.current_individual += 1;
        if self.current_individual as usize >= self.population_size {
            self.current_individual = 0;
            self.current_iteration += 1;
        }
        id
    }

    /// Draws and records a per-workunit seed for the given slot.
    ///
    /// Seeds are kept under `u32::MAX / 10`; some evaluators mishandle
    /// values near the full u32 range.
    pub fn next_seed(&mut self, id: u32) -> u32 {
        let seed = (self.rng.gen::<f64>() * u32::MAX as f64 / 10.0) as u32;
        self.seeds[id as usize] = seed;
        seed
    }
}
