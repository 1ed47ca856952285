use super::arguments::{argument_exists, get_argument, get_argument_or};
use super::base::{EvolutionaryBase, TerminationLimits};
use super::errors::ConfigError;
use crate::recombination;
use crate::{AsynchronousOptimizer, Individual};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use std::str::FromStr;

/// How the parent vector of a candidate is chosen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParentSelection {
    /// The current global best.
    Best,
    /// A uniformly random slot.
    Random,
    /// A scaled step from the current slot toward the global best.
    CurrentToBest,
    /// A scaled step from the current slot toward a random slot.
    CurrentToRandom,
}

impl FromStr for ParentSelection {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<ParentSelection, ConfigError> {
        match s {
            "best" => Ok(ParentSelection::Best),
            "random" => Ok(ParentSelection::Random),
            "current-to-best" => Ok(ParentSelection::CurrentToBest),
            "current-to-random" => Ok(ParentSelection::CurrentToRandom),
            other => Err(ConfigError::UnknownParentSelection(other.to_string())),
        }
    }
}

/// How the parent-plus-differential vector is recombined with the
/// slot's current vector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecombinationSelection {
    /// Binary (binomial) crossover.
    Binary,
    /// Exponential crossover.
    Exponential,
    /// Coordinate-wise sum of current vector and candidate.
    Sum,
    /// The candidate is used as-is.
    None,
}

impl FromStr for RecombinationSelection {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<RecombinationSelection, ConfigError> {
        match s {
            "binary" => Ok(RecombinationSelection::Binary),
            "exponential" => Ok(RecombinationSelection::Exponential),
            "sum" => Ok(RecombinationSelection::Sum),
            "none" => Ok(RecombinationSelection::None),
            other => Err(ConfigError::UnknownRecombinationSelection(other.to_string())),
        }
    }
}

/// Hyperparameters for [`DifferentialEvolution`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DifferentialEvolutionConfig {
    pub parent_selection: ParentSelection,
    /// How many slot pairs contribute to the differential.
    pub number_pairs: usize,
    pub recombination_selection: RecombinationSelection,
    /// Weight of the parent step for the current-to-* selections.
    pub parent_scaling_factor: f64,
    /// Weight of the averaged differential.
    pub differential_scaling_factor: f64,
    pub crossover_rate: f64,
    /// When set, each difference pair is ordered so the
    /// higher-fitness member is the minuend, biasing the
    /// differential toward fitness-increasing directions.
    pub directional: bool,
}

impl Default for DifferentialEvolutionConfig {
    fn default() -> DifferentialEvolutionConfig {
        DifferentialEvolutionConfig {
            parent_selection: ParentSelection::Best,
            number_pairs: 1,
            recombination_selection: RecombinationSelection::Binary,
            parent_scaling_factor: 1.0,
            differential_scaling_factor: 1.0,
            crossover_rate: 0.5,
            directional: false,
        }
    }
}

impl DifferentialEvolutionConfig {
    /// Reads hyperparameters from a `--name value` argument list,
    /// warning about and defaulting any that are absent. Unknown
    /// selection names are configuration errors.
    pub fn from_args(arguments: &[String]) -> Result<DifferentialEvolutionConfig, ConfigError> {
        let defaults = DifferentialEvolutionConfig::default();

        let parent_selection = match get_argument::<String>(arguments, "--parent_selection")? {
            Some(name) => name.parse()?,
            None => {
                eprintln!("Argument '--parent_selection' not found, using default of 'best'.");
                defaults.parent_selection
            }
        };
        let recombination_selection =
            match get_argument::<String>(arguments, "--recombination_selection")? {
                Some(name) => name.parse()?,
                None => {
                    eprintln!(
                        "Argument '--recombination_selection' not found, using default of 'binary'."
                    );
                    defaults.recombination_selection
                }
            };

        Ok(DifferentialEvolutionConfig {
            parent_selection,
            number_pairs: get_argument_or(arguments, "--number_pairs", defaults.number_pairs)?,
            recombination_selection,
            parent_scaling_factor: get_argument_or(
                arguments,
                "--parent_scaling_factor",
                defaults.parent_scaling_factor,
            )?,
            differential_scaling_factor: get_argument_or(
                arguments,
                "--differential_scaling_factor",
                defaults.differential_scaling_factor,
            )?,
            crossover_rate: get_argument_or(
                arguments,
                "--crossover_rate",
                defaults.crossover_rate,
            )?,
            directional: argument_exists(arguments, "--directional"),
        })
    }
}

/// An asynchronous differential evolution optimizer.
///
/// Keeps a fixed-size population of parameter vectors. After the
/// bootstrap phase, each new candidate is a parent vector (chosen by
/// [`ParentSelection`]) displaced by the average of
/// `number_pairs` scaled slot differences, recombined with the
/// slot's current vector (per [`RecombinationSelection`]) and bounded
/// into the search box. A slot is only replaced by a report that
/// improves its fitness.
#[derive(Serialize, Deserialize)]
pub struct DifferentialEvolution {
    base: EvolutionaryBase,
    config: DifferentialEvolutionConfig,

    population: Vec<Vec<f64>>,
    fitnesses: Vec<Option<f64>>,

    global_best_id: u32,
    global_best_fitness: Option<f64>,
}

impl DifferentialEvolution {
    pub fn new(
        min_bound: Vec<f64>,
        max_bound: Vec<f64>,
        population_size: usize,
        config: DifferentialEvolutionConfig,
        limits: TerminationLimits,
    ) -> Result<DifferentialEvolution, ConfigError> {
        let base = EvolutionaryBase::new(min_bound, max_bound, population_size, limits, false)?;
        Ok(DifferentialEvolution::from_base(base, config))
    }

    /// Constructs a search from a string-keyed argument list;
    /// `--min_bound` and `--max_bound` are required, everything else
    /// defaults with a warning.
    pub fn from_args(arguments: &[String]) -> Result<DifferentialEvolution, ConfigError> {
        let base = EvolutionaryBase::from_args(arguments)?;
        let config = DifferentialEvolutionConfig::from_args(arguments)?;
        Ok(DifferentialEvolution::from_base(base, config))
    }

    fn from_base(
        base: EvolutionaryBase,
        config: DifferentialEvolutionConfig,
    ) -> DifferentialEvolution {
        let n = base.number_parameters;
        let size = base.population_size;
        DifferentialEvolution {
            config,
            population: vec![vec![0.0; n]; size],
            fitnesses: vec![None; size],
            global_best_id: 0,
            global_best_fitness: None,
            base,
        }
    }

    /// Reseeds the engine's random source, for reproducible runs.
    pub fn seed_rng(&mut self, seed: u64) {
        self.base.rng = StdRng::seed_from_u64(seed);
    }

    /// Enables wrap-around bounding for coordinates whose bounds are
    /// exactly `[-2π, 2π]` (periodic/angular parameters).
    pub fn set_wrap_radians(&mut self, wrap_radians: bool) {
        self.base.wrap_radians = wrap_radians;
    }

    pub fn population_size(&self) -> usize {
        self.base.population_size
    }

    pub fn number_parameters(&self) -> usize {
        self.base.number_parameters
    }

    pub fn current_iteration(&self) -> u32 {
        self.base.current_iteration
    }

    pub fn individuals_created(&self) -> u32 {
        self.base.individuals_created
    }

    pub fn individuals_reported(&self) -> u32 {
        self.base.individuals_reported
    }

    /// Runs the generate/evaluate/insert loop synchronously,
    /// `population_size` evaluations per iteration, until
    /// [`is_running`](AsynchronousOptimizer::is_running) is false.
    pub fn iterate(&mut self, mut objective_function: impl FnMut(&[f64]) -> f64) {
        while self.is_running() {
            for _ in 0..self.base.population_size {
                let (id, parameters) = self.new_individual();
                let fitness = objective_function(&parameters);
                self.insert_individual(id, &parameters, fitness);
            }
        }
    }

    /// Seeded variant of [`iterate`](Self::iterate) for stochastic
    /// objective functions.
    pub fn iterate_with_seeds(&mut self, mut objective_function: impl FnMut(&[f64], u32) -> f64) {
        while self.is_running() {
            for _ in 0..self.base.population_size {
                let (id, parameters, seed) = self.new_individual_with_seed();
                let fitness = objective_function(&parameters, seed);
                self.insert_individual_with_seed(id, &parameters, fitness, seed);
            }
        }
    }

    fn select_parent(&mut self, slot: usize) -> Vec<f64> {
        let n = self.base.number_parameters;
        match self.config.parent_selection {
            ParentSelection::Best => self.population[self.global_best_id as usize].clone(),
            ParentSelection::Random => {
                let random_slot = self.base.rng.gen_range(0..self.base.population_size);
                self.population[random_slot].clone()
            }
            ParentSelection::CurrentToBest => {
                let best = self.global_best_id as usize;
                (0..n)
                    .map(|i| {
                        self.config.parent_scaling_factor
                            * (self.population[best][i] - self.population[slot][i])
                    })
                    .collect()
            }
            ParentSelection::CurrentToRandom => {
                let random_slot = self.base.rng.gen_range(0..self.base.population_size);
                (0..n)
                    .map(|i| {
                        self.config.parent_scaling_factor
                            * (self.population[random_slot][i] - self.population[slot][i])
                    })
                    .collect()
            }
        }
    }

    /// Averages `number_pairs` signed slot differences, scaled by
    /// `differential_scaling_factor / number_pairs`.
    fn compute_differential(&mut self) -> Vec<f64> {
        let n = self.base.number_parameters;
        let mut differential = vec![0.0; n];

        for _ in 0..self.config.number_pairs {
            let mut first = self.base.rng.gen_range(0..self.base.population_size);
            let mut second = self.base.rng.gen_range(0..self.base.population_size);

            if self.config.directional {
                let first_fitness = self.fitnesses[first].unwrap_or(f64::NEG_INFINITY);
                let second_fitness = self.fitnesses[second].unwrap_or(f64::NEG_INFINITY);
                if second_fitness > first_fitness {
                    std::mem::swap(&mut first, &mut second);
                }
            }

            for j in 0..n {
                differential[j] += self.population[first][j] - self.population[second][j];
            }
        }

        let scale = self.config.differential_scaling_factor / self.config.number_pairs as f64;
        for d in &mut differential {
            *d *= scale;
        }
        differential
    }
}

impl AsynchronousOptimizer for DifferentialEvolution {
    fn new_individual(&mut self) -> (u32, Vec<f64>) {
        let id = self.base.next_slot();
        let slot = id as usize;

        // Bootstrap: keep generating random individuals until the
        // whole population has reported at least once.
        if self.base.initialized_individuals < self.base.population_size {
            let parameters = recombination::random_within(
                &self.base.min_bound,
                &self.base.max_bound,
                &mut self.base.rng,
            );
            self.population[slot] = parameters.clone();
            self.base.individuals_created += 1;
            return (id, parameters);
        }

        let mut candidate = self.select_parent(slot);
        let differential = self.compute_differential();
        for (c, d) in candidate.iter_mut().zip(&differential) {
            *c += d;
        }

        let mut parameters = match self.config.recombination_selection {
            RecombinationSelection::Binary => recombination::binary_recombination(
                &self.population[slot],
                &candidate,
                self.config.crossover_rate,
                &mut self.base.rng,
            ),
            RecombinationSelection::Exponential => recombination::exponential_recombination(
                &self.population[slot],
                &candidate,
                self.config.crossover_rate,
                &mut self.base.rng,
            ),
            RecombinationSelection::Sum => self.population[slot]
                .iter()
                .zip(&candidate)
                .map(|(p, c)| p + c)
                .collect(),
            RecombinationSelection::None => candidate,
        };
        recombination::bound_parameters(
            &self.base.min_bound,
            &self.base.max_bound,
            &mut parameters,
            self.base.wrap_radians,
        );

        self.base.individuals_created += 1;
        (id, parameters)
    }

    fn new_individual_with_seed(&mut self) -> (u32, Vec<f64>, u32) {
        let (id, parameters) = self.new_individual();
        let seed = self.base.next_seed(id);
        (id, parameters, seed)
    }

    fn insert_individual(&mut self, id: u32, parameters: &[f64], fitness: f64) -> bool {
        let slot = id as usize;
        let mut modified = false;

        if self.fitnesses[slot].map_or(true, |f| f < fitness) {
            if self.fitnesses[slot].is_none() {
                self.base.initialized_individuals += 1;
            }
            self.fitnesses[slot] = Some(fitness);
            self.population[slot] = parameters.to_vec();

            if self.global_best_fitness.map_or(true, |f| f < fitness) {
                self.global_best_id = id;
                self.global_best_fitness = Some(fitness);
            }

            modified = true;
        }

        self.base.individuals_reported += 1;
        modified
    }

    fn would_insert(&self, id: u32, fitness: f64) -> bool {
        self.fitnesses[id as usize].map_or(true, |f| f < fitness)
    }

    fn is_running(&self) -> bool {
        self.base.is_running()
    }

    fn global_best(&self) -> &[f64] {
        &self.population[self.global_best_id as usize]
    }

    fn global_best_fitness(&self) -> Option<f64> {
        self.global_best_fitness
    }

    fn individuals(&self) -> Vec<Individual> {
        (0..self.base.population_size)
            .map(|i| {
                Individual::new(
                    i as u32,
                    self.fitnesses[i].unwrap_or(f64::NEG_INFINITY),
                    self.population[i].clone(),
                    String::new(),
                )
            })
            .collect()
    }
}
