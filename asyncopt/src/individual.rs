use serde::{Deserialize, Serialize};

use std::cmp::Ordering;
use std::fmt;

/// A snapshot of one population member: the slot it occupies, the
/// parameters it was evaluated at, and the fitness that evaluation
/// reported.
///
/// Individuals order by fitness *descending*: the best individual
/// sorts first. Fitness is always maximized in this crate;
/// minimization problems report negated objective values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Individual {
    position: u32,
    fitness: f64,
    parameters: Vec<f64>,
    metadata: String,
}

impl Individual {
    pub fn new(position: u32, fitness: f64, parameters: Vec<f64>, metadata: String) -> Individual {
        Individual {
            position,
            fitness,
            parameters,
            metadata,
        }
    }

    /// The slot index this individual occupies in its population.
    pub fn position(&self) -> u32 {
        self.position
    }

    pub fn fitness(&self) -> f64 {
        self.fitness
    }

    pub fn parameters(&self) -> &[f64] {
        &self.parameters
    }

    pub fn metadata(&self) -> &str {
        &self.metadata
    }
}

impl PartialOrd for Individual {
    /// Best-first ordering: an individual with higher fitness
    /// compares as `Less` so that sorting yields descending fitness.
    fn partial_cmp(&self, other: &Individual) -> Option<Ordering> {
        other.fitness.partial_cmp(&self.fitness)
    }
}

impl fmt::Display for Individual {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[position: {}, fitness: {}, parameters: {:?}, metadata: {}]",
            self.position, self.fitness, self.parameters, self.metadata
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorting_puts_the_best_first() {
        let mut individuals = vec![
            Individual::new(0, 1.0, vec![0.0], String::new()),
            Individual::new(1, 10.0, vec![1.0], String::new()),
            Individual::new(2, 5.0, vec![2.0], String::new()),
        ];
        individuals.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let fitnesses: Vec<f64> = individuals.iter().map(|i| i.fitness()).collect();
        assert_eq!(fitnesses, vec![10.0, 5.0, 1.0]);
    }

    #[test]
    fn serde_round_trip() {
        let individual = Individual::new(3, 2.5, vec![1.0, -1.0], "seed:17".to_string());
        let json = serde_json::to_string(&individual).unwrap();
        let restored: Individual = serde_json::from_str(&json).unwrap();
        assert_eq!(individual, restored);
    }
}
