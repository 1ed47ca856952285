//! Fitness statistics and search-progress snapshots.

use crate::AsynchronousOptimizer;

use std::fmt;

/// Basic statistical data over a set of reported fitnesses.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FitnessStats {
    pub best: f64,
    pub worst: f64,
    pub mean: f64,
    pub median: f64,
}

impl FitnessStats {
    /// Returns statistics over the finite values in a sequence, or
    /// `None` when it contains no finite value (e.g. a population
    /// still in its bootstrap phase).
    ///
    /// # Examples
    /// ```
    /// use asyncopt::logging::FitnessStats;
    ///
    /// let stats = FitnessStats::from([-2.0, -1.0, 0.5, 1.0, 1.5].iter().copied()).unwrap();
    /// assert_eq!(stats.best, 1.5);
    /// assert_eq!(stats.worst, -2.0);
    /// assert_eq!(stats.mean, 0.0);
    /// assert_eq!(stats.median, 0.5);
    /// ```
    pub fn from(data: impl Iterator<Item = f64>) -> Option<FitnessStats> {
        let mut data: Vec<f64> = data.filter(|f| f.is_finite()).collect();
        if data.is_empty() {
            return None;
        }

        let (mut best, mut worst, mut sum) = (f64::MIN, f64::MAX, 0.0);
        for d in &data {
            best = d.max(best);
            worst = d.min(worst);
            sum += d;
        }
        let mean = sum / data.len() as f64;

        let mid = data.len() / 2;
        let mut median = *data
            .select_nth_unstable_by(mid, |a, b| a.partial_cmp(b).unwrap())
            .1;
        if data.len() % 2 == 0 {
            median = (median
                + *data
                    .select_nth_unstable_by(mid - 1, |a, b| a.partial_cmp(b).unwrap())
                    .1)
                / 2.0;
        }

        Some(FitnessStats {
            best,
            worst,
            mean,
            median,
        })
    }
}

/// A snapshot of a search's progress.
#[derive(Clone, Debug)]
pub struct SearchLog {
    pub individuals: usize,
    pub stats: Option<FitnessStats>,
    pub global_best: Vec<f64>,
    pub global_best_fitness: Option<f64>,
}

impl fmt::Display for SearchLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SearchLog {{\n\
            \tindividuals: {}\n\
            \tstats: {:?}\n\
            \tglobal_best: {:?}\n\
            \tglobal_best_fitness: {:?}\n\
            }}",
            self.individuals, self.stats, self.global_best, self.global_best_fitness
        )
    }
}

/// A log of the progress of a search over time.
#[derive(Clone, Debug, Default)]
pub struct SearchLogger {
    logs: Vec<SearchLog>,
}

impl SearchLogger {
    pub fn new() -> SearchLogger {
        SearchLogger { logs: vec![] }
    }

    /// Stores a snapshot of the search's population.
    pub fn log(&mut self, search: &dyn AsynchronousOptimizer) {
        let individuals = search.individuals();
        self.logs.push(SearchLog {
            individuals: individuals.len(),
            stats: FitnessStats::from(individuals.iter().map(|i| i.fitness())),
            global_best: search.global_best().to_vec(),
            global_best_fitness: search.global_best_fitness(),
        });
    }

    /// Iterates over all snapshots taken so far.
    pub fn iter(&self) -> impl Iterator<Item = &SearchLog> {
        self.logs.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::searches::{ParticleSwarm, ParticleSwarmConfig, TerminationLimits};

    #[test]
    fn stats_ignore_unreported_slots() {
        let stats = FitnessStats::from(
            [f64::NEG_INFINITY, 2.0, f64::NAN, 4.0, 6.0].iter().copied(),
        )
        .unwrap();
        assert_eq!(stats.best, 6.0);
        assert_eq!(stats.worst, 2.0);
        assert_eq!(stats.mean, 4.0);
        assert_eq!(stats.median, 4.0);
    }

    #[test]
    fn stats_of_nothing_finite_are_none() {
        assert_eq!(FitnessStats::from([].iter().copied()), None);
        assert_eq!(
            FitnessStats::from([f64::NEG_INFINITY].iter().copied()),
            None
        );
    }

    #[test]
    fn even_length_median_averages_the_middle_pair() {
        let stats = FitnessStats::from([1.0, 2.0, 3.0, 10.0].iter().copied()).unwrap();
        assert_eq!(stats.median, 2.5);
    }

    #[test]
    fn logger_snapshots_search_progress() {
        let mut search = ParticleSwarm::new(
            vec![0.0],
            vec![10.0],
            2,
            ParticleSwarmConfig::default(),
            TerminationLimits::default(),
        )
        .unwrap();
        search.seed_rng(5);

        let mut logger = SearchLogger::new();
        logger.log(&search);

        search.insert_individual(0, &[3.0], 7.0);
        logger.log(&search);

        let logs: Vec<&SearchLog> = logger.iter().collect();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].global_best_fitness, None);
        assert!(logs[0].stats.is_none());
        assert_eq!(logs[1].global_best_fitness, Some(7.0));
        assert_eq!(logs[1].global_best, vec![3.0]);
        assert_eq!(logs[1].stats.unwrap().best, 7.0);
    }
}
