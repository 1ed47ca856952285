use super::arguments::get_argument_or;
use super::errors::{ConfigError, SearchError};
use super::base::entropy_rng;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A user-supplied genetic encoding: how to draw a random member of
/// the search space and how to derive new members from existing ones.
///
/// Equality is exact: the population rejects any candidate whose
/// encoding compares equal to a member already present.
pub trait Encoding: Clone + PartialEq {
    /// Encoding-specific parameters (lengths, value ranges, weights)
    /// threaded through every generation call.
    type Config;

    fn random<R: Rng + ?Sized>(config: &Self::Config, rng: &mut R) -> Self;

    fn mutate<R: Rng + ?Sized>(&self, config: &Self::Config, rng: &mut R) -> Self;

    fn crossover<R: Rng + ?Sized>(
        &self,
        other: &Self,
        config: &Self::Config,
        rng: &mut R,
    ) -> Self;
}

/// Hyperparameters for [`GeneticAlgorithm`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeneticAlgorithmConfig {
    pub population_size: usize,
    /// Probability that a post-bootstrap candidate is a mutation of
    /// one existing member rather than a crossover of two.
    pub mutation_rate: f64,
    pub crossover_rate: f64,
    /// Retry budget for regenerating a candidate that duplicates an
    /// existing encoding before giving up with
    /// [`SearchError::SearchSpaceExhausted`].
    pub max_duplicate_retries: usize,
    /// Cap on individuals handed out; 0 leaves it unbounded.
    pub maximum_created: u32,
    /// Cap on fitness reports taken in; 0 leaves it unbounded.
    pub maximum_reported: u32,
}

impl Default for GeneticAlgorithmConfig {
    fn default() -> GeneticAlgorithmConfig {
        GeneticAlgorithmConfig {
            population_size: 50,
            mutation_rate: 0.5,
            crossover_rate: 0.5,
            max_duplicate_retries: 100,
            maximum_created: 0,
            maximum_reported: 0,
        }
    }
}

impl GeneticAlgorithmConfig {
    pub fn from_args(arguments: &[String]) -> Result<GeneticAlgorithmConfig, ConfigError> {
        let defaults = GeneticAlgorithmConfig::default();
        Ok(GeneticAlgorithmConfig {
            population_size: get_argument_or(
                arguments,
                "--population_size",
                defaults.population_size,
            )?,
            mutation_rate: get_argument_or(arguments, "--mutation_rate", defaults.mutation_rate)?,
            crossover_rate: get_argument_or(
                arguments,
                "--crossover_rate",
                defaults.crossover_rate,
            )?,
            max_duplicate_retries: get_argument_or(
                arguments,
                "--max_duplicate_retries",
                defaults.max_duplicate_retries,
            )?,
            maximum_created: get_argument_or(arguments, "--maximum_created", 0)?,
            maximum_reported: get_argument_or(arguments, "--maximum_reported", 0)?,
        })
    }
}

/// One population member: a fitness and the encoding it was reported
/// for.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeneticIndividual<E> {
    pub fitness: f64,
    pub encoding: E,
}

/// An asynchronous genetic algorithm over arbitrary encodings.
///
/// The population is kept sorted by descending fitness and capped at
/// `population_size`. Candidates are drawn at random until the
/// population is full, then by mutation (with probability
/// `mutation_rate`) or crossover of two distinct members. A candidate
/// that exactly duplicates a present encoding is regenerated, up to
/// the configured retry budget.
#[derive(Serialize, Deserialize)]
#[serde(bound(
    serialize = "E: Serialize, E::Config: Serialize",
    deserialize = "E: DeserializeOwned, E::Config: DeserializeOwned"
))]
pub struct GeneticAlgorithm<E: Encoding> {
    config: GeneticAlgorithmConfig,
    encoding_config: E::Config,

    population: Vec<GeneticIndividual<E>>,
    individuals_created: u32,
    individuals_reported: u32,

    // Re-seeded from entropy when a search is restored from
    // persisted state.
    #[serde(skip, default = "entropy_rng")]
    rng: StdRng,
}

impl<E: Encoding> GeneticAlgorithm<E> {
    pub fn new(
        mut config: GeneticAlgorithmConfig,
        encoding_config: E::Config,
    ) -> Result<GeneticAlgorithm<E>, ConfigError> {
        if config.population_size == 0 {
            return Err(ConfigError::ZeroPopulationSize);
        }
        if (config.mutation_rate + config.crossover_rate - 1.0).abs() > f64::EPSILON {
            let corrected = 1.0 - config.mutation_rate;
            eprintln!(
                "mutation_rate ({}) + crossover_rate ({}) != 1.0, \
                 setting crossover_rate to {}.",
                config.mutation_rate, config.crossover_rate, corrected
            );
            config.crossover_rate = corrected;
        }

        Ok(GeneticAlgorithm {
            config,
            encoding_config,
            population: Vec::with_capacity(config.population_size),
            individuals_created: 0,
            individuals_reported: 0,
            rng: entropy_rng(),
        })
    }

    /// Reseeds the engine's random source, for reproducible runs.
    pub fn seed_rng(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    pub fn individuals_created(&self) -> u32 {
        self.individuals_created
    }

    pub fn individuals_reported(&self) -> u32 {
        self.individuals_reported
    }

    /// The population, sorted by descending fitness.
    pub fn population(&self) -> &[GeneticIndividual<E>] {
        &self.population
    }

    pub fn global_best(&self) -> Option<&E> {
        self.population.first().map(|i| &i.encoding)
    }

    pub fn global_best_fitness(&self) -> Option<f64> {
        self.population.first().map(|i| i.fitness)
    }

    /// True while neither the created nor the reported cap has been
    /// reached.
    pub fn is_running(&self) -> bool {
        (self.config.maximum_created == 0
            || self.individuals_created < self.config.maximum_created)
            && (self.config.maximum_reported == 0
                || self.individuals_reported < self.config.maximum_reported)
    }

    fn is_duplicate(&self, candidate: &E) -> bool {
        self.population.iter().any(|i| i.encoding == *candidate)
    }

    fn generate_candidate(&mut self) -> E {
        if self.population.len() < self.config.population_size {
            return E::random(&self.encoding_config, &mut self.rng);
        }

        // Crossover needs two distinct members.
        if self.population.len() < 2 || self.rng.gen::<f64>() < self.config.mutation_rate {
            let parent = self.rng.gen_range(0..self.population.len());
            self.population[parent]
                .encoding
                .mutate(&self.encoding_config, &mut self.rng)
        } else {
            let first = self.rng.gen_range(0..self.population.len());
            let mut second = self.rng.gen_range(0..self.population.len() - 1);
            if second >= first {
                second += 1;
            }
            self.population[first].encoding.crossover(
                &self.population[second].encoding,
                &self.encoding_config,
                &mut self.rng,
            )
        }
    }

    /// Produces the next encoding to evaluate.
    ///
    /// # Errors
    /// [`SearchError::SearchSpaceExhausted`] when every candidate
    /// within the retry budget duplicated an existing encoding.
    pub fn new_individual(&mut self) -> Result<E, SearchError> {
        for _ in 0..=self.config.max_duplicate_retries {
            let candidate = self.generate_candidate();
            if !self.is_duplicate(&candidate) {
                self.individuals_created += 1;
                return Ok(candidate);
            }
        }
        Err(SearchError::SearchSpaceExhausted {
            retries: self.config.max_duplicate_retries,
        })
    }

    /// Reports an evaluated encoding. Returns false, leaving the
    /// population untouched, when the encoding duplicates a present
    /// member or the population is full and the fitness is below the
    /// worst kept one; otherwise inserts in sorted position, evicting
    /// the worst member on overflow.
    pub fn insert_individual(&mut self, encoding: E, fitness: f64) -> bool {
        self.individuals_reported += 1;

        if self.is_duplicate(&encoding) {
            return false;
        }
        let full = self.population.len() >= self.config.population_size;
        if full && self.population.last().map_or(false, |w| fitness < w.fitness) {
            return false;
        }

        let position = self
            .population
            .partition_point(|i| i.fitness >= fitness);
        self.population
            .insert(position, GeneticIndividual { fitness, encoding });
        self.population.truncate(self.config.population_size);
        true
    }
}
