use super::arguments::{get_argument, get_argument_or, get_required_argument_vector};
use super::base::entropy_rng;
use super::errors::ConfigError;
use crate::numerics::regression::{newton_step, randomized_hessian};
use crate::numerics::NumericsError;
use crate::recombination;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Hyperparameters for [`AsynchronousNewtonMethod`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewtonMethodConfig {
    /// Samples required before a regression phase can fit its
    /// surface. Raised to `4 * n^2` during construction when set
    /// lower; the fit needs well more than its coefficient count to
    /// be stable.
    pub minimum_regression_individuals: usize,
    /// Samples required before a line-search phase can conclude.
    pub minimum_line_search_individuals: usize,
    /// Lower end of the line-search parameter `t`.
    pub line_search_min: f64,
    /// Upper end of the line-search parameter `t`.
    pub line_search_max: f64,
    /// Slack workunits issued beyond each phase's minimum, so slow
    /// or lost evaluators cannot stall the phase.
    pub extra_workunits: usize,
    /// Cap on phase transitions; 0 leaves the search unbounded.
    pub maximum_iterations: u32,
    /// Consecutive line searches allowed to end without improving
    /// the center before the search stops; 0 disables the check.
    pub max_failed_improvements: u32,
}

impl Default for NewtonMethodConfig {
    fn default() -> NewtonMethodConfig {
        NewtonMethodConfig {
            minimum_regression_individuals: 0,
            minimum_line_search_individuals: 500,
            line_search_min: -1.0,
            line_search_max: 3.0,
            extra_workunits: 100,
            maximum_iterations: 0,
            max_failed_improvements: 0,
        }
    }
}

impl NewtonMethodConfig {
    pub fn from_args(arguments: &[String]) -> Result<NewtonMethodConfig, ConfigError> {
        let defaults = NewtonMethodConfig::default();
        Ok(NewtonMethodConfig {
            minimum_regression_individuals: get_argument(
                arguments,
                "--minimum_regression_individuals",
            )?
            .unwrap_or(defaults.minimum_regression_individuals),
            minimum_line_search_individuals: get_argument_or(
                arguments,
                "--minimum_line_search_individuals",
                defaults.minimum_line_search_individuals,
            )?,
            line_search_min: get_argument_or(
                arguments,
                "--line_search_min",
                defaults.line_search_min,
            )?,
            line_search_max: get_argument_or(
                arguments,
                "--line_search_max",
                defaults.line_search_max,
            )?,
            extra_workunits: get_argument_or(
                arguments,
                "--extra_workunits",
                defaults.extra_workunits,
            )?,
            maximum_iterations: get_argument_or(arguments, "--maximum_iterations", 0)?,
            max_failed_improvements: get_argument_or(arguments, "--max_failed_improvements", 0)?,
        })
    }
}

/// One phase's worth of workunits: every parameter vector carries the
/// iteration tag results must echo back, plus one evaluator seed per
/// vector.
#[derive(Clone, Debug, PartialEq)]
pub struct WorkBatch {
    pub iteration: u32,
    pub parameters: Vec<Vec<f64>>,
    pub seeds: Vec<u32>,
}

/// An asynchronous Newton method driven by sampled regression.
///
/// The search alternates two phases, each one iteration. Even
/// iterations sample a cloud around the current center, fit a
/// quadratic surface to the reported fitnesses, and take a Newton
/// step to obtain a line-search direction. Odd iterations sample
/// along that line and move the center to the best sample iff it
/// improves on the center's fitness.
///
/// Workunits are tagged with the iteration that issued them; a result
/// echoing any other tag is stale and is dropped. Each phase issues
/// `extra_workunits` more than it needs so lost results cannot stall
/// the phase.
#[derive(Serialize, Deserialize)]
pub struct AsynchronousNewtonMethod {
    config: NewtonMethodConfig,

    min_bound: Vec<f64>,
    max_bound: Vec<f64>,
    number_parameters: usize,
    regression_radius: Vec<f64>,

    center: Vec<f64>,
    center_fitness: Option<f64>,
    line_search_direction: Vec<f64>,

    regression_individuals: Vec<Vec<f64>>,
    regression_fitnesses: Vec<f64>,
    regression_seeds: Vec<u32>,
    line_search_individuals: Vec<Vec<f64>>,
    line_search_fitnesses: Vec<f64>,
    line_search_seeds: Vec<u32>,

    first_workunits_generated: bool,
    current_iteration: u32,
    failed_improvements: u32,

    // Re-seeded from entropy when a search is restored from
    // persisted state.
    #[serde(skip, default = "entropy_rng")]
    rng: StdRng,
}

impl AsynchronousNewtonMethod {
    pub fn new(
        min_bound: Vec<f64>,
        max_bound: Vec<f64>,
        center: Vec<f64>,
        regression_radius: Vec<f64>,
        mut config: NewtonMethodConfig,
    ) -> Result<AsynchronousNewtonMethod, ConfigError> {
        recombination::check_bounds(&min_bound, &max_bound)?;
        recombination::check_step(&regression_radius)?;

        let number_parameters = min_bound.len();
        let regression_minimum = 4 * number_parameters * number_parameters;
        if config.minimum_regression_individuals < regression_minimum {
            eprintln!(
                "minimum_regression_individuals not set or less than minimum, \
                 using minimum of 4 * number_parameters^2 = {}.",
                regression_minimum
            );
            config.minimum_regression_individuals = regression_minimum;
        }

        Ok(AsynchronousNewtonMethod {
            config,
            min_bound,
            max_bound,
            number_parameters,
            regression_radius,
            center,
            center_fitness: None,
            line_search_direction: vec![0.0; number_parameters],
            regression_individuals: Vec::new(),
            regression_fitnesses: Vec::new(),
            regression_seeds: Vec::new(),
            line_search_individuals: Vec::new(),
            line_search_fitnesses: Vec::new(),
            line_search_seeds: Vec::new(),
            first_workunits_generated: false,
            current_iteration: 0,
            failed_improvements: 0,
            rng: entropy_rng(),
        })
    }

    /// Constructs a search from a string-keyed argument list.
    /// `--min_bound`, `--max_bound` and `--regression_radius` are
    /// required; an absent `--initial_point` falls back to a random
    /// point within the bounds with a warning.
    pub fn from_args(arguments: &[String]) -> Result<AsynchronousNewtonMethod, ConfigError> {
        let min_bound: Vec<f64> = get_required_argument_vector(arguments, "--min_bound")?;
        let max_bound: Vec<f64> = get_required_argument_vector(arguments, "--max_bound")?;
        recombination::check_bounds(&min_bound, &max_bound)?;
        let regression_radius: Vec<f64> =
            get_required_argument_vector(arguments, "--regression_radius")?;

        let center = match super::arguments::get_argument_vector(arguments, "--initial_point")? {
            Some(center) => center,
            None => {
                eprintln!(
                    "Argument '--initial_point' not specified, using random starting point."
                );
                recombination::random_within(&min_bound, &max_bound, &mut entropy_rng())
            }
        };

        let config = NewtonMethodConfig::from_args(arguments)?;
        AsynchronousNewtonMethod::new(min_bound, max_bound, center, regression_radius, config)
    }

    /// Reseeds the engine's random source, for reproducible runs.
    pub fn seed_rng(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    pub fn center(&self) -> &[f64] {
        &self.center
    }

    pub fn center_fitness(&self) -> Option<f64> {
        self.center_fitness
    }

    pub fn current_iteration(&self) -> u32 {
        self.current_iteration
    }

    pub fn failed_improvements(&self) -> u32 {
        self.failed_improvements
    }

    /// True while neither the iteration cap nor the stagnation cap
    /// has been reached.
    pub fn is_running(&self) -> bool {
        (self.config.maximum_iterations == 0
            || self.current_iteration < self.config.maximum_iterations)
            && (self.config.max_failed_improvements == 0
                || self.failed_improvements < self.config.max_failed_improvements)
    }

    fn draw_seed(&mut self) -> u32 {
        // Kept under u32::MAX / 10; some evaluators mishandle values
        // near the full u32 range.
        (self.rng.gen::<f64>() * u32::MAX as f64 / 10.0) as u32
    }

    fn regression_batch(&mut self) -> WorkBatch {
        let count = self.config.minimum_regression_individuals + self.config.extra_workunits;
        let parameters = (0..count)
            .map(|_| {
                let mut p =
                    recombination::random_around(&self.center, &self.regression_radius, &mut self.rng);
                recombination::bound_parameters(&self.min_bound, &self.max_bound, &mut p, false);
                p
            })
            .collect();
        let seeds = (0..count).map(|_| self.draw_seed()).collect();

        self.regression_individuals.clear();
        self.regression_fitnesses.clear();
        self.regression_seeds.clear();

        WorkBatch {
            iteration: self.current_iteration,
            parameters,
            seeds,
        }
    }

    fn line_search_batch(&mut self) -> WorkBatch {
        let count = self.config.minimum_line_search_individuals + self.config.extra_workunits;
        let parameters = (0..count)
            .map(|_| {
                let mut p = recombination::random_along(
                    &self.center,
                    &self.line_search_direction,
                    self.config.line_search_min,
                    self.config.line_search_max,
                    &mut self.rng,
                );
                recombination::bound_parameters(&self.min_bound, &self.max_bound, &mut p, false);
                p
            })
            .collect();
        let seeds = (0..count).map(|_| self.draw_seed()).collect();

        self.line_search_individuals.clear();
        self.line_search_fitnesses.clear();
        self.line_search_seeds.clear();

        WorkBatch {
            iteration: self.current_iteration,
            parameters,
            seeds,
        }
    }

    /// Produces the next phase's workunits, or `None` while the
    /// current phase is still awaiting reports.
    ///
    /// A completed regression phase fits its surface and steps into a
    /// line-search phase; a completed line search moves (or keeps)
    /// the center and steps back into regression. Both transitions
    /// advance the iteration counter, invalidating any still-pending
    /// workunits from the finished phase.
    ///
    /// # Errors
    /// [`NumericsError`] when the fitted Hessian is singular or the
    /// regression samples cannot support a fit.
    pub fn generate_individuals(&mut self) -> Result<Option<WorkBatch>, NumericsError> {
        if !self.first_workunits_generated {
            self.first_workunits_generated = true;
            return Ok(Some(self.regression_batch()));
        }

        if self.current_iteration % 2 == 0 {
            if self.regression_fitnesses.len() < self.config.minimum_regression_individuals {
                return Ok(None);
            }

            let (hessian, gradient) = randomized_hessian(
                &self.regression_individuals,
                &self.center,
                &self.regression_fitnesses,
            )?;
            self.line_search_direction = newton_step(&hessian, &gradient)?;

            self.current_iteration += 1;
            Ok(Some(self.line_search_batch()))
        } else {
            if self.line_search_fitnesses.len() < self.config.minimum_line_search_individuals {
                return Ok(None);
            }

            let mut best = 0;
            for i in 1..self.line_search_fitnesses.len() {
                if self.line_search_fitnesses[i] > self.line_search_fitnesses[best] {
                    best = i;
                }
            }
            let best_fitness = self.line_search_fitnesses[best];

            if self.center_fitness.map_or(true, |f| best_fitness > f) {
                self.center = self.line_search_individuals[best].clone();
                self.center_fitness = Some(best_fitness);
                self.failed_improvements = 0;
            } else {
                self.failed_improvements += 1;
            }

            self.current_iteration += 1;
            Ok(Some(self.regression_batch()))
        }
    }

    /// Reports an evaluated workunit back into its phase's sample
    /// buffer. Returns false, leaving the engine untouched, when the
    /// iteration tag is stale, the phase's buffer already holds a
    /// full batch, or the fitness is not finite.
    pub fn insert_individual(&mut self, iteration: u32, parameters: &[f64], fitness: f64) -> bool {
        if iteration != self.current_iteration || !fitness.is_finite() {
            return false;
        }

        if iteration % 2 == 0 {
            let capacity =
                self.config.minimum_regression_individuals + self.config.extra_workunits;
            if self.regression_fitnesses.len() >= capacity {
                return false;
            }
            self.regression_individuals.push(parameters.to_vec());
            self.regression_fitnesses.push(fitness);
        } else {
            let capacity =
                self.config.minimum_line_search_individuals + self.config.extra_workunits;
            if self.line_search_fitnesses.len() >= capacity {
                return false;
            }
            self.line_search_individuals.push(parameters.to_vec());
            self.line_search_fitnesses.push(fitness);
        }
        true
    }

    /// Seeded variant of [`insert_individual`](Self::insert_individual).
    pub fn insert_individual_with_seed(
        &mut self,
        iteration: u32,
        parameters: &[f64],
        fitness: f64,
        seed: u32,
    ) -> bool {
        if !self.insert_individual(iteration, parameters, fitness) {
            return false;
        }
        if iteration % 2 == 0 {
            self.regression_seeds.push(seed);
        } else {
            self.line_search_seeds.push(seed);
        }
        true
    }

    /// Re-aligns phase state after restoring from a checkpoint, when
    /// any workunits outstanding at save time are gone for good.
    ///
    /// A search restored mid-line-search steps back to the preceding
    /// regression phase, whose completed sample buffer survives in
    /// the persisted state; one restored mid-regression starts that
    /// phase's sampling over.
    pub fn prepare_restart(&mut self) {
        if self.current_iteration % 2 == 1 {
            self.current_iteration -= 1;
        } else if self.regression_fitnesses.len() < self.config.minimum_regression_individuals {
            self.first_workunits_generated = false;
            self.regression_individuals.clear();
            self.regression_fitnesses.clear();
            self.regression_seeds.clear();
        }
    }

    /// Runs the generate/evaluate/insert loop synchronously until a
    /// termination cap is reached.
    ///
    /// # Errors
    /// Propagates any [`NumericsError`] from the regression fits.
    pub fn iterate(
        &mut self,
        mut objective_function: impl FnMut(&[f64]) -> f64,
    ) -> Result<(), NumericsError> {
        while self.is_running() {
            let batch = match self.generate_individuals()? {
                Some(batch) => batch,
                None => break,
            };
            for parameters in &batch.parameters {
                let fitness = objective_function(parameters);
                self.insert_individual(batch.iteration, parameters, fitness);
            }
        }
        Ok(())
    }

    /// Seeded variant of [`iterate`](Self::iterate) for stochastic
    /// objective functions.
    pub fn iterate_with_seeds(
        &mut self,
        mut objective_function: impl FnMut(&[f64], u32) -> f64,
    ) -> Result<(), NumericsError> {
        while self.is_running() {
            let batch = match self.generate_individuals()? {
                Some(batch) => batch,
                None => break,
            };
            for (parameters, &seed) in batch.parameters.iter().zip(&batch.seeds) {
                let fitness = objective_function(parameters, seed);
                self.insert_individual_with_seed(batch.iteration, parameters, fitness, seed);
            }
        }
        Ok(())
    }
}
