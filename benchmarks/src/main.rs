//! Drives the search engines over the standard benchmark objective
//! functions, evaluating fitness in parallel and checkpointing
//! engine state to disk after every batch.
//!
//! All objectives are negated so their global maximum is 0 at the
//! usual optimum. Example invocation:
//!
//! ```text
//! benchmarks --search_type de --objective ackley \
//!     --min_bound -32 -32 -32 --max_bound 32 32 32 \
//!     --maximum_iterations 200 --checkpoint ackley_de.ron
//! ```

use asyncopt::logging::SearchLogger;
use asyncopt::{
    AsynchronousNewtonMethod, AsynchronousOptimizer, DifferentialEvolution, ParticleSwarm,
    PersistedSearch, SearchStore,
};

use rayon::prelude::*;
use serde::de::DeserializeOwned;
use serde::Serialize;

use std::env;
use std::error::Error;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::process;

fn sphere(x: &[f64]) -> f64 {
    -x.iter().map(|&v| v * v).sum::<f64>()
}

fn ackley(x: &[f64]) -> f64 {
    let n = x.len() as f64;
    let sum1 = -0.2 * (x.iter().map(|&v| v * v).sum::<f64>() / n).sqrt();
    let sum2 = x
        .iter()
        .map(|&v| (2.0 * std::f64::consts::PI * v).cos())
        .sum::<f64>()
        / n;
    -(20.0 + std::f64::consts::E - 20.0 * sum1.exp() - sum2.exp())
}

fn griewank(x: &[f64]) -> f64 {
    let sum = x.iter().map(|&v| v * v).sum::<f64>() / 4000.0;
    let product: f64 = x
        .iter()
        .enumerate()
        .map(|(i, &v)| (v / ((i + 1) as f64).sqrt()).cos())
        .product();
    -(sum - product + 1.0)
}

fn rastrigin(x: &[f64]) -> f64 {
    -x.iter()
        .map(|&v| v * v - 10.0 * (2.0 * std::f64::consts::PI * v).cos() + 10.0)
        .sum::<f64>()
}

fn rosenbrock(x: &[f64]) -> f64 {
    -x.windows(2)
        .map(|w| {
            let tmp = w[1] - w[0] * w[0];
            100.0 * tmp * tmp + (w[0] - 1.0) * (w[0] - 1.0)
        })
        .sum::<f64>()
}

fn objective_by_name(name: &str) -> Option<fn(&[f64]) -> f64> {
    match name {
        "sphere" => Some(sphere),
        "ackley" => Some(ackley),
        "griewank" => Some(griewank),
        "rastrigin" => Some(rastrigin),
        "rosenbrock" => Some(rosenbrock),
        _ => None,
    }
}

/// An on-disk checkpoint holding one search's serialized state as RON.
struct RonFileStore {
    path: PathBuf,
}

#[derive(Debug)]
enum StoreError {
    Io(std::io::Error),
    Ron(ron::Error),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "checkpoint io error: {}", e),
            Self::Ron(e) => write!(f, "checkpoint encoding error: {}", e),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Ron(e) => Some(e),
        }
    }
}

impl SearchStore for RonFileStore {
    type Error = StoreError;

    fn save<T: Serialize>(&mut self, state: &T) -> Result<(), StoreError> {
        let encoded = ron::to_string(state).map_err(StoreError::Ron)?;
        fs::write(&self.path, encoded).map_err(StoreError::Io)
    }

    fn load<T: DeserializeOwned>(&self) -> Result<Option<T>, StoreError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&self.path).map_err(StoreError::Io)?;
        ron::from_str(&contents).map(Some).map_err(StoreError::Ron)
    }
}

fn find_argument(arguments: &[String], name: &str) -> Option<String> {
    arguments
        .iter()
        .position(|a| a == name)
        .and_then(|i| arguments.get(i + 1).cloned())
}

/// Runs a slot-protocol engine (particle swarm or differential
/// evolution): one population's worth of workunits per batch,
/// evaluated in parallel, with a checkpoint committed per batch.
fn run_slot_search<E>(
    search: E,
    store: RonFileStore,
    objective: fn(&[f64]) -> f64,
    batch_size: usize,
) -> Result<(), StoreError>
where
    E: AsynchronousOptimizer + Serialize + DeserializeOwned,
{
    let mut persisted = PersistedSearch::restore_or(|| search, store)?;
    let mut logger = SearchLogger::new();

    while persisted.is_running() {
        let workunits = persisted.mutate(|search| {
            (0..batch_size)
                .map(|_| search.new_individual())
                .collect::<Vec<_>>()
        })?;

        let results: Vec<(u32, Vec<f64>, f64)> = workunits
            .into_par_iter()
            .map(|(id, parameters)| {
                let fitness = objective(&parameters);
                (id, parameters, fitness)
            })
            .collect();

        persisted.mutate(|search| {
            for (id, parameters, fitness) in &results {
                search.insert_individual(*id, parameters, *fitness);
            }
        })?;
        logger.log(persisted.search());

        if let Some(log) = logger.iter().last() {
            println!("{}", log);
        }
    }

    let (search, _) = persisted.into_inner();
    println!(
        "final global best {:?} with fitness {:?}",
        search.global_best(),
        search.global_best_fitness()
    );
    Ok(())
}

/// Runs the asynchronous Newton method: one phase's batch at a time,
/// evaluated in parallel, with a checkpoint committed per batch.
fn run_newton(
    search: AsynchronousNewtonMethod,
    mut store: RonFileStore,
    objective: fn(&[f64]) -> f64,
) -> Result<(), Box<dyn Error>> {
    // Resume from the last committed phase if a checkpoint exists;
    // workunits that were in flight when it was written are lost, so
    // the restored search re-aligns its phase state first.
    let mut search = match store.load::<AsynchronousNewtonMethod>()? {
        Some(mut restored) => {
            restored.prepare_restart();
            restored
        }
        None => search,
    };

    while search.is_running() {
        let batch = match search.generate_individuals()? {
            Some(batch) => batch,
            None => break,
        };

        let results: Vec<(Vec<f64>, f64)> = batch
            .parameters
            .into_par_iter()
            .map(|parameters| {
                let fitness = objective(&parameters);
                (parameters, fitness)
            })
            .collect();

        for (parameters, fitness) in &results {
            search.insert_individual(batch.iteration, parameters, *fitness);
        }
        store.save(&search)?;

        println!(
            "iteration {}: center {:?} with fitness {:?}",
            search.current_iteration(),
            search.center(),
            search.center_fitness()
        );
    }

    println!(
        "final center {:?} with fitness {:?}",
        search.center(),
        search.center_fitness()
    );
    Ok(())
}

fn run(arguments: &[String]) -> Result<(), Box<dyn Error>> {
    let objective_name =
        find_argument(arguments, "--objective").unwrap_or_else(|| "sphere".to_string());
    let objective = objective_by_name(&objective_name)
        .ok_or_else(|| format!("unknown objective function '{}'", objective_name))?;

    let checkpoint = find_argument(arguments, "--checkpoint")
        .unwrap_or_else(|| format!("{}_checkpoint.ron", objective_name));
    let store = RonFileStore {
        path: PathBuf::from(checkpoint),
    };

    let search_type =
        find_argument(arguments, "--search_type").unwrap_or_else(|| "pso".to_string());
    match search_type.as_str() {
        "pso" => {
            let search = ParticleSwarm::from_args(arguments)?;
            let batch_size = search.population_size();
            run_slot_search(search, store, objective, batch_size)?;
        }
        "de" => {
            let search = DifferentialEvolution::from_args(arguments)?;
            let batch_size = search.population_size();
            run_slot_search(search, store, objective, batch_size)?;
        }
        "anm" => {
            let search = AsynchronousNewtonMethod::from_args(arguments)?;
            run_newton(search, store, objective)?;
        }
        other => return Err(format!("unknown search type '{}'", other).into()),
    }
    Ok(())
}

fn main() {
    let arguments: Vec<String> = env::args().collect();
    if let Err(e) = run(&arguments) {
        eprintln!("{}", e);
        process::exit(1);
    }
}
