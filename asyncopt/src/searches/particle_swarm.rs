use super::arguments::get_argument_or;
use super::base::{EvolutionaryBase, TerminationLimits};
use super::errors::ConfigError;
use crate::recombination;
use crate::{AsynchronousOptimizer, Individual};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Hyperparameters for [`ParticleSwarm`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParticleSwarmConfig {
    /// Weight applied to a particle's previous velocity.
    pub inertia: f64,
    /// Pull toward the global best position.
    pub global_best_weight: f64,
    /// Pull toward the particle's own best position.
    pub local_best_weight: f64,
    /// Scale for bootstrap velocities, so fresh particles don't
    /// immediately fly to the bounds.
    pub initial_velocity_scale: f64,
}

impl Default for ParticleSwarmConfig {
    fn default() -> ParticleSwarmConfig {
        ParticleSwarmConfig {
            inertia: 0.75,
            global_best_weight: 1.5,
            local_best_weight: 1.5,
            initial_velocity_scale: 0.25,
        }
    }
}

impl ParticleSwarmConfig {
    /// Reads hyperparameters from a `--name value` argument list,
    /// warning about and defaulting any that are absent.
    pub fn from_args(arguments: &[String]) -> Result<ParticleSwarmConfig, ConfigError> {
        let defaults = ParticleSwarmConfig::default();
        Ok(ParticleSwarmConfig {
            inertia: get_argument_or(arguments, "--inertia", defaults.inertia)?,
            global_best_weight: get_argument_or(
                arguments,
                "--global_best_weight",
                defaults.global_best_weight,
            )?,
            local_best_weight: get_argument_or(
                arguments,
                "--local_best_weight",
                defaults.local_best_weight,
            )?,
            initial_velocity_scale: get_argument_or(
                arguments,
                "--initial_velocity_scale",
                defaults.initial_velocity_scale,
            )?,
        })
    }
}

/// An asynchronous particle swarm optimizer.
///
/// Each population slot holds a particle's current position and
/// velocity plus the best position that slot has ever reported.
/// While fewer than `population_size` slots have reported a fitness,
/// [`new_individual`](AsynchronousOptimizer::new_individual) hands
/// out uniformly random bootstrap positions; afterwards it applies
/// the canonical velocity update toward the local and global bests.
///
/// # Examples
/// ```
/// use asyncopt::{AsynchronousOptimizer, ParticleSwarm, ParticleSwarmConfig, TerminationLimits};
///
/// let mut swarm = ParticleSwarm::new(
///     vec![-1.0, -1.0],
///     vec![1.0, 1.0],
///     10,
///     ParticleSwarmConfig::default(),
///     TerminationLimits::default(),
/// )
/// .unwrap();
///
/// let (id, parameters) = swarm.new_individual();
/// let fitness = -parameters.iter().map(|p| p * p).sum::<f64>();
/// assert!(swarm.insert_individual(id, &parameters, fitness));
/// assert_eq!(swarm.global_best_fitness(), Some(fitness));
/// ```
#[derive(Serialize, Deserialize)]
pub struct ParticleSwarm {
    base: EvolutionaryBase,
    config: ParticleSwarmConfig,

    particles: Vec<Vec<f64>>,
    velocities: Vec<Vec<f64>>,
    local_bests: Vec<Vec<f64>>,
    local_best_fitnesses: Vec<Option<f64>>,

    global_best: Vec<f64>,
    global_best_fitness: Option<f64>,
}

impl ParticleSwarm {
    pub fn new(
        min_bound: Vec<f64>,
        max_bound: Vec<f64>,
        population_size: usize,
        config: ParticleSwarmConfig,
        limits: TerminationLimits,
    ) -> Result<ParticleSwarm, ConfigError> {
        let base = EvolutionaryBase::new(min_bound, max_bound, population_size, limits, false)?;
        Ok(ParticleSwarm::from_base(base, config))
    }

    /// Constructs a swarm from a string-keyed argument list;
    /// `--min_bound` and `--max_bound` are required, everything else
    /// defaults with a warning.
    pub fn from_args(arguments: &[String]) -> Result<ParticleSwarm, ConfigError> {
        let base = EvolutionaryBase::from_args(arguments)?;
        let config = ParticleSwarmConfig::from_args(arguments)?;
        Ok(ParticleSwarm::from_base(base, config))
    }

    fn from_base(base: EvolutionaryBase, config: ParticleSwarmConfig) -> ParticleSwarm {
        let n = base.number_parameters;
        let size = base.population_size;
        ParticleSwarm {
            config,
            particles: vec![vec![0.0; n]; size],
            velocities: vec![vec![0.0; n]; size],
            local_bests: vec![vec![0.0; n]; size],
            local_best_fitnesses: vec![None; size],
            global_best: vec![0.0; n],
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

    fn advance_particle(&mut self, id: usize) {
        let r1 = self.base.rng.gen::<f64>();
        let r2 = self.base.rng.gen::<f64>();

        for j in 0..self.base.number_parameters {
            let modified_velocity = self.config.inertia * self.velocities[id][j];
            let global_pull = self.config.global_best_weight
                * r1
                * (self.global_best[j] - self.particles[id][j]);
            let local_pull = self.config.local_best_weight
                * r2
                * (self.local_bests[id][j] - self.particles[id][j]);

            self.velocities[id][j] = modified_velocity + global_pull + local_pull;

            let min = self.base.min_bound[j];
            let max = self.base.max_bound[j];
            let next_position = self.particles[id][j] + self.velocities[id][j];

            if self.base.wrap_radians && recombination::is_wrappable_radian_bound(min, max) {
                let mut wrapped = [next_position];
                recombination::bound_parameters(&[min], &[max], &mut wrapped, true);
                self.particles[id][j] = wrapped[0];
            } else if next_position > max {
                // Clamp, and rein the velocity in to match the
                // movement that actually happened.
                self.velocities[id][j] = max - self.particles[id][j];
                self.particles[id][j] = max;
            } else if next_position < min {
                self.velocities[id][j] = self.particles[id][j] - min;
                self.particles[id][j] = min;
            } else {
                self.particles[id][j] = next_position;
            }
        }
    }
}

impl AsynchronousOptimizer for ParticleSwarm {
    fn new_individual(&mut self) -> (u32, Vec<f64>) {
        let id = self.base.next_slot();
        let slot = id as usize;

        // Bootstrap: not every slot has reported yet, so hand out a
        // random position with a velocity pointed at another random
        // point in the box.
        if self.base.initialized_individuals < self.base.population_size {
            self.particles[slot] = recombination::random_within(
                &self.base.min_bound,
                &self.base.max_bound,
                &mut self.base.rng,
            );
            let toward = recombination::random_within(
                &self.base.min_bound,
                &self.base.max_bound,
                &mut self.base.rng,
            );
            for j in 0..self.base.number_parameters {
                self.velocities[slot][j] =
                    self.config.initial_velocity_scale * (self.particles[slot][j] - toward[j]);
            }

            self.base.individuals_created += 1;
            return (id, self.particles[slot].clone());
        }

        self.advance_particle(slot);
        self.base.individuals_created += 1;
        (id, self.particles[slot].clone())
    }

    fn new_individual_with_seed(&mut self) -> (u32, Vec<f64>, u32) {
        let (id, parameters) = self.new_individual();
        let seed = self.base.next_seed(id);
        (id, parameters, seed)
    }

    fn insert_individual(&mut self, id: u32, parameters: &[f64], fitness: f64) -> bool {
        let slot = id as usize;
        let mut modified = false;

        if self.local_best_fitnesses[slot].map_or(true, |f| f < fitness) {
            if self.local_best_fitnesses[slot].is_none() {
                self.base.initialized_individuals += 1;
            }
            self.local_best_fitnesses[slot] = Some(fitness);
            self.local_bests[slot] = parameters.to_vec();
            modified = true;
        }

        if self.global_best_fitness.map_or(true, |f| f < fitness) {
            self.global_best_fitness = Some(fitness);
            self.global_best = parameters.to_vec();
        }

        self.base.individuals_reported += 1;
        modified
    }

    fn would_insert(&self, id: u32, fitness: f64) -> bool {
        self.local_best_fitnesses[id as usize].map_or(true, |f| f < fitness)
    }

    fn is_running(&self) -> bool {
        self.base.is_running()
    }

    fn global_best(&self) -> &[f64] {
        &self.global_best
    }

    fn global_best_fitness(&self) -> Option<f64> {
        self.global_best_fitness
    }

    fn individuals(&self) -> Vec<Individual> {
        (0..self.base.population_size)
            .map(|i| {
                Individual::new(
                    i as u32,
                    self.local_best_fitnesses[i].unwrap_or(f64::NEG_INFINITY),
                    self.local_bests[i].clone(),
                    String::new(),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recombination::out_of_bounds;

    fn swarm(population_size: usize, config: ParticleSwarmConfig) -> ParticleSwarm {
        let mut swarm = ParticleSwarm::new(
            vec![0.0],
            vec![10.0],
            population_size,
            config,
            TerminationLimits::default(),
        )
        .unwrap();
        swarm.seed_rng(7);
        swarm
    }

    #[test]
    fn forceless_particle_stays_put() {
        let config = ParticleSwarmConfig {
            inertia: 0.0,
            global_best_weight: 0.0,
            local_best_weight: 0.0,
            initial_velocity_scale: 0.25,
        };
        let mut swarm = swarm(1, config);

        let (id, parameters) = swarm.new_individual();
        assert!(swarm.insert_individual(id, &parameters, 1.0));
        assert!(swarm.velocities[0][0].abs() <= 10.0);

        // Bootstrap is over; with zero inertia and zero pull the
        // particle must not move.
        let (_, first) = swarm.new_individual();
        let (_, second) = swarm.new_individual();
        assert_eq!(first, second);
        assert!(!out_of_bounds(&[0.0], &[10.0], &first));
    }

    #[test]
    fn bootstrap_hands_out_random_positions_per_slot() {
        let mut swarm = swarm(3, ParticleSwarmConfig::default());
        let (id0, p0) = swarm.new_individual();
        let (id1, p1) = swarm.new_individual();
        let (id2, _) = swarm.new_individual();
        assert_eq!((id0, id1, id2), (0, 1, 2));
        assert_ne!(p0, p1);
    }

    #[test]
    fn all_generated_parameters_stay_in_bounds() {
        let mut swarm = swarm(5, ParticleSwarmConfig::default());
        for i in 0..200 {
            let (id, parameters) = swarm.new_individual();
            assert!(!out_of_bounds(&[0.0], &[10.0], &parameters));
            swarm.insert_individual(id, &parameters, -((i % 17) as f64));
        }
    }

    #[test]
    fn non_improving_insert_is_an_idempotent_no_op() {
        let mut swarm = swarm(2, ParticleSwarmConfig::default());
        assert!(swarm.insert_individual(0, &[5.0], 10.0));
        assert!(!swarm.insert_individual(0, &[6.0], 10.0));
        assert!(!swarm.insert_individual(0, &[6.0], 10.0));
        assert_eq!(swarm.local_bests[0], vec![5.0]);
        assert_eq!(swarm.global_best_fitness(), Some(10.0));
        assert_eq!(swarm.individuals_reported(), 3);
    }

    #[test]
    fn local_best_fitness_is_monotonic() {
        let mut swarm = swarm(1, ParticleSwarmConfig::default());
        let reports = [3.0, 1.0, 4.0, 1.0, 5.0, 2.0, 6.0];
        let mut accepted = Vec::new();
        for &fitness in &reports {
            if swarm.insert_individual(0, &[fitness], fitness) {
                accepted.push(fitness);
            }
        }
        assert_eq!(accepted, vec![3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn global_best_tracks_the_maximum_slot() {
        let mut swarm = swarm(3, ParticleSwarmConfig::default());
        swarm.insert_individual(0, &[1.0], 5.0);
        swarm.insert_individual(1, &[2.0], 9.0);
        swarm.insert_individual(2, &[3.0], 7.0);
        assert_eq!(swarm.global_best_fitness(), Some(9.0));
        assert_eq!(swarm.global_best(), &[2.0]);

        let best = swarm
            .individuals()
            .iter()
            .map(|i| i.fitness())
            .fold(f64::NEG_INFINITY, f64::max);
        assert_eq!(Some(best), swarm.global_best_fitness());
    }

    #[test]
    fn would_insert_matches_insert_without_mutating() {
        let mut swarm = swarm(2, ParticleSwarmConfig::default());
        assert!(swarm.would_insert(0, -100.0));
        swarm.insert_individual(0, &[1.0], 4.0);
        assert!(!swarm.would_insert(0, 4.0));
        assert!(swarm.would_insert(0, 4.5));
        assert_eq!(swarm.local_best_fitnesses[0], Some(4.0));
    }

    #[test]
    fn synchronous_iterate_honors_iteration_cap() {
        let mut swarm = ParticleSwarm::new(
            vec![-5.0, -5.0],
            vec![5.0, 5.0],
            8,
            ParticleSwarmConfig::default(),
            TerminationLimits::iterations(20),
        )
        .unwrap();
        swarm.seed_rng(11);

        swarm.iterate(|p| -(p[0] * p[0] + p[1] * p[1]));

        assert!(!swarm.is_running());
        assert_eq!(swarm.current_iteration(), 20);
        let best = swarm.global_best_fitness().unwrap();
        assert!(best > -50.0);
    }

    #[test]
    fn serde_round_trip_preserves_population_state() {
        let mut swarm = swarm(4, ParticleSwarmConfig::default());
        for _ in 0..10 {
            let (id, parameters) = swarm.new_individual();
            let fitness = -parameters[0].abs();
            swarm.insert_individual(id, &parameters, fitness);
        }

        let json = serde_json::to_string(&swarm).unwrap();
        let restored: ParticleSwarm = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.particles, swarm.particles);
        assert_eq!(restored.velocities, swarm.velocities);
        assert_eq!(restored.local_bests, swarm.local_bests);
        assert_eq!(restored.local_best_fitnesses, swarm.local_best_fitnesses);
        assert_eq!(restored.global_best_fitness(), swarm.global_best_fitness());
        assert_eq!(restored.individuals_created(), swarm.individuals_created());
        assert_eq!(restored.individuals_reported(), swarm.individuals_reported());
    }
}
