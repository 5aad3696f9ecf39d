//! NSGA-II generational loop.
//!
//! [`Nsga2`] drives the evolution as an explicit state machine:
//! initialize → evaluate → rank, then per generation
//! vary → evaluate offspring → merge → rank → select survivors,
//! until a stop condition holds between generations.
//!
//! Each step consumes a [`GenerationState`] and returns the next one, so
//! callers may also drive the loop themselves with
//! [`initialize`](Nsga2::initialize) and [`step`](Nsga2::step).

use super::config::NsgaConfig;
use super::operators::reassign_mutation;
use super::ranking::{assign_ranks, select_survivors};
use super::selection::crowded_tournament;
use super::snapshot::PopulationSnapshot;
use super::types::{Individual, Population};
use crate::error::{ConfigError, Result, SnapshotError};
use crate::problem::{Objectives, PlacementProblem};
use crate::random::create_rng;
use rand::Rng;
use std::cmp::Ordering as CmpOrdering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Everything that carries over from one generation to the next.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationState {
    /// Generations evolved so far (0 right after initialization).
    pub age: usize,

    /// The current ranked population.
    pub population: Population,

    /// Objective evaluations performed so far.
    pub evaluations: usize,
}

impl GenerationState {
    /// Members of the first front, in population order.
    pub fn front(&self) -> Vec<&Individual> {
        self.population.iter().filter(|i| i.rank == 0).collect()
    }
}

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The configured number of generations evolved.
    GenerationBudget,
    /// The wall-clock limit elapsed.
    TimeLimit,
    /// The evaluation budget was used up.
    EvaluationBudget,
    /// The caller raised the cancellation flag.
    Cancelled,
}

/// Result of an NSGA-II run.
#[derive(Debug, Clone)]
pub struct NsgaResult {
    /// The final ranked population (size N).
    pub population: Population,

    /// The non-dominated members of the final population.
    pub pareto_front: Vec<Individual>,

    /// Number of generations evolved.
    pub generations: usize,

    /// Number of objective evaluations.
    pub evaluations: usize,

    /// Which condition ended the run.
    pub stop_reason: StopReason,

    /// Wall-clock duration of the run.
    pub elapsed: Duration,
}

/// Hook called at generation boundaries.
///
/// Observers see each state after it is fully ranked. They are the only
/// place where I/O happens during a run. Any `FnMut(&GenerationState)`
/// closure is an observer of [`on_generation`](Self::on_generation).
pub trait GenerationObserver {
    /// Called once with the initial, ranked population.
    fn on_start(&mut self, _problem: &PlacementProblem, _state: &GenerationState) -> Result<()> {
        Ok(())
    }

    /// Called after every evolved generation.
    fn on_generation(
        &mut self,
        problem: &PlacementProblem,
        state: &GenerationState,
    ) -> Result<()>;

    /// Called once with the final state.
    fn on_finish(
        &mut self,
        _problem: &PlacementProblem,
        _state: &GenerationState,
        _reason: StopReason,
    ) -> Result<()> {
        Ok(())
    }
}

impl<F: FnMut(&GenerationState)> GenerationObserver for F {
    fn on_generation(
        &mut self,
        _problem: &PlacementProblem,
        state: &GenerationState,
    ) -> Result<()> {
        self(state);
        Ok(())
    }
}

impl NsgaResult {
    /// Front member with the best normalized trade-off, see [`best_compromise`].
    pub fn best_compromise(&self) -> Option<&Individual> {
        best_compromise(&self.pareto_front)
    }
}

/// Observer that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl GenerationObserver for NoopObserver {
    fn on_generation(&mut self, _: &PlacementProblem, _: &GenerationState) -> Result<()> {
        Ok(())
    }
}

/// NSGA-II optimizer bound to one problem.
///
/// # Usage
///
/// ```
/// use u_placement::nsga2::{Nsga2, NsgaConfig};
/// use u_placement::problem::{Microservice, Node, PlacementProblem};
///
/// let problem = PlacementProblem::new(
///     vec![
///         Microservice::new("api", 5.0).with_peer("db", 10.0),
///         Microservice::new("db", 8.0),
///         Microservice::new("cache", 3.0),
///     ],
///     vec![Node::new("n0", 15.0), Node::new("n1", 10.0)],
/// )
/// .unwrap();
///
/// let config = NsgaConfig::default()
///     .with_population_size(20)
///     .with_max_generations(10)
///     .with_seed(42);
/// let result = Nsga2::new(&problem, config).unwrap().run().unwrap();
/// assert_eq!(result.population.len(), 20);
/// assert!(!result.pareto_front.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct Nsga2<'a> {
    problem: &'a PlacementProblem,
    config: NsgaConfig,
}

impl<'a> Nsga2<'a> {
    /// Binds a validated configuration to a problem.
    pub fn new(
        problem: &'a PlacementProblem,
        config: NsgaConfig,
    ) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { problem, config })
    }

    pub fn problem(&self) -> &PlacementProblem {
        self.problem
    }

    pub fn config(&self) -> &NsgaConfig {
        &self.config
    }

    /// Runs with a generator seeded from `config.seed` (or entropy).
    pub fn run(&self) -> Result<NsgaResult> {
        self.run_with_cancel(None)
    }

    /// Like [`run`](Self::run), stopping early once `cancel` is raised.
    pub fn run_with_cancel(&self, cancel: Option<Arc<AtomicBool>>) -> Result<NsgaResult> {
        let mut rng = match self.config.seed {
            Some(seed) => create_rng(seed),
            None => create_rng(rand::random()),
        };
        self.run_with(&mut rng, &mut NoopObserver, cancel.as_deref())
    }

    /// Runs with a caller-supplied generator.
    pub fn run_with_rng<R: Rng>(&self, rng: &mut R) -> Result<NsgaResult> {
        self.run_with(rng, &mut NoopObserver, None)
    }

    /// Runs with a generator, an observer and an optional cancellation flag.
    ///
    /// The flag is only checked between generations.
    pub fn run_with<R: Rng, O: GenerationObserver + ?Sized>(
        &self,
        rng: &mut R,
        observer: &mut O,
        cancel: Option<&AtomicBool>,
    ) -> Result<NsgaResult> {
        let state = self.initialize(rng);
        self.run_from(state, rng, observer, cancel)
    }

    /// Evolves an existing state until a stop condition holds.
    ///
    /// `state` usually comes from [`initialize`](Self::initialize) or
    /// [`initialize_from`](Self::initialize_from). The generation budget
    /// applies to `state.age`, so a resumed state keeps counting from the
    /// generation it was captured at. The time limit starts now.
    pub fn run_from<R: Rng, O: GenerationObserver + ?Sized>(
        &self,
        state: GenerationState,
        rng: &mut R,
        observer: &mut O,
        cancel: Option<&AtomicBool>,
    ) -> Result<NsgaResult> {
        let started = Instant::now();
        info!(
            services = self.problem.service_count(),
            nodes = self.problem.node_count(),
            population_size = self.config.population_size,
            max_generations = self.config.max_generations,
            generation = state.age,
            "starting NSGA-II"
        );

        let mut state = state;
        observer.on_start(self.problem, &state)?;

        let reason = loop {
            if let Some(reason) = self.stop_reason(&state, started, cancel) {
                break reason;
            }
            state = self.step(state, rng);
            log_generation(&state);
            observer.on_generation(self.problem, &state)?;
        };

        observer.on_finish(self.problem, &state, reason)?;

        let elapsed = started.elapsed();
        if reason == StopReason::GenerationBudget {
            info!(
                generations = state.age,
                evaluations = state.evaluations,
                ?elapsed,
                "NSGA-II finished"
            );
        } else {
            warn!(
                ?reason,
                generations = state.age,
                evaluations = state.evaluations,
                ?elapsed,
                "NSGA-II stopped early"
            );
        }

        let pareto_front = state.front().into_iter().cloned().collect();
        Ok(NsgaResult {
            population: state.population,
            pareto_front,
            generations: state.age,
            evaluations: state.evaluations,
            stop_reason: reason,
            elapsed,
        })
    }

    /// Creates, evaluates and ranks a random population of size N.
    pub fn initialize<R: Rng>(&self, rng: &mut R) -> GenerationState {
        let mut individuals: Vec<Individual> = (0..self.config.population_size)
            .map(|_| Individual::unevaluated(self.problem.random_assignment(rng)))
            .collect();
        evaluate_population(self.problem, &mut individuals, self.config.parallel);
        assign_ranks(&mut individuals);

        GenerationState {
            age: 0,
            evaluations: individuals.len(),
            population: Population::new(individuals),
        }
    }

    /// Rebuilds a ranked state from a snapshot.
    ///
    /// The snapshot must hold exactly `population_size` individuals, each
    /// placing every microservice of this problem on a known node. Objectives
    /// are recomputed against this problem rather than read back. Age and
    /// evaluation count continue from the snapshot.
    pub fn initialize_from(
        &self,
        snapshot: &PopulationSnapshot,
    ) -> std::result::Result<GenerationState, SnapshotError> {
        let expected = self.config.population_size;
        if snapshot.individuals.len() != expected {
            return Err(SnapshotError::PopulationSizeMismatch {
                expected,
                found: snapshot.individuals.len(),
            });
        }

        let service_index: HashMap<&str, usize> = self
            .problem
            .services()
            .iter()
            .enumerate()
            .map(|(i, s)| (s.id.as_str(), i))
            .collect();
        let node_index: HashMap<&str, usize> = self
            .problem
            .nodes()
            .iter()
            .enumerate()
            .map(|(j, n)| (n.id.as_str(), j))
            .collect();

        let mut individuals = Vec::with_capacity(expected);
        for record in &snapshot.individuals {
            if record.assignment.len() != service_index.len() {
                return Err(SnapshotError::ServiceCountMismatch {
                    expected: service_index.len(),
                    found: record.assignment.len(),
                });
            }
            let mut assignment = vec![0; service_index.len()];
            for (service, node) in &record.assignment {
                let s = *service_index
                    .get(service.as_str())
                    .ok_or_else(|| SnapshotError::UnknownService(service.clone()))?;
                let n = *node_index
                    .get(node.as_str())
                    .ok_or_else(|| SnapshotError::UnknownNode(node.clone()))?;
                assignment[s] = n;
            }
            individuals.push(Individual::unevaluated(assignment));
        }

        evaluate_population(self.problem, &mut individuals, self.config.parallel);
        assign_ranks(&mut individuals);

        Ok(GenerationState {
            age: snapshot.generation,
            evaluations: snapshot.number_of_function_evaluations,
            population: Population::new(individuals),
        })
    }

    /// Evolves one generation.
    pub fn step<R: Rng>(&self, state: GenerationState, rng: &mut R) -> GenerationState {
        let mut offspring = self.vary(state.population.individuals(), rng);
        evaluate_population(self.problem, &mut offspring, self.config.parallel);

        let evaluations = state.evaluations + offspring.len();
        let merged = state.population.union(Population::new(offspring));
        let population = select_survivors(merged, self.config.population_size);

        GenerationState {
            age: state.age + 1,
            population,
            evaluations,
        }
    }

    /// Produces N offspring by tournament selection, crossover and mutation.
    fn vary<R: Rng>(&self, parents: &[Individual], rng: &mut R) -> Vec<Individual> {
        let n = self.config.population_size;
        let node_count = self.problem.node_count();
        let mut offspring = Vec::with_capacity(n);

        while offspring.len() < n {
            let p1 = &parents[crowded_tournament(parents, self.config.tournament_size, rng)];
            let p2 = &parents[crowded_tournament(parents, self.config.tournament_size, rng)];

            let (c1, c2) = if rng.random_range(0.0..1.0) < self.config.crossover_rate {
                self.config.crossover.apply(&p1.assignment, &p2.assignment, rng)
            } else {
                (p1.assignment.clone(), p2.assignment.clone())
            };

            for mut child in [c1, c2] {
                if offspring.len() >= n {
                    break;
                }
                reassign_mutation(&mut child, node_count, self.config.mutation_rate, rng);
                offspring.push(Individual::unevaluated(child));
            }
        }

        offspring
    }

    fn stop_reason(
        &self,
        state: &GenerationState,
        started: Instant,
        cancel: Option<&AtomicBool>,
    ) -> Option<StopReason> {
        if state.age >= self.config.max_generations {
            return Some(StopReason::GenerationBudget);
        }
        if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
            return Some(StopReason::Cancelled);
        }
        if let Some(limit) = self.config.time_limit_ms {
            if started.elapsed() >= Duration::from_millis(limit) {
                return Some(StopReason::TimeLimit);
            }
        }
        if let Some(budget) = self.config.max_evaluations {
            if state.evaluations >= budget {
                return Some(StopReason::EvaluationBudget);
            }
        }
        None
    }
}

/// Evaluates every individual; each slot is written by exactly one worker.
fn evaluate_population(problem: &PlacementProblem, individuals: &mut [Individual], parallel: bool) {
    if parallel {
        #[cfg(feature = "parallel")]
        {
            individuals.par_iter_mut().for_each(|ind| ind.evaluate(problem));
            return;
        }
    }

    for ind in individuals.iter_mut() {
        ind.evaluate(problem);
    }
}

fn log_generation(state: &GenerationState) {
    let front = state.front();
    let best = |k: usize| {
        front
            .iter()
            .map(|i| i.objectives.get(k))
            .fold(f64::INFINITY, f64::min)
    };
    debug!(
        generation = state.age,
        evaluations = state.evaluations,
        front_size = front.len(),
        best_communication_cost = best(0),
        best_resource_cost = best(1),
        best_resource_imbalance = best(2),
        "evolved generation"
    );
}

/// Individual with the lowest sum of normalized objectives.
///
/// Each objective is rescaled to [0, 1] between its best and worst value
/// across `individuals`; an objective with zero range contributes 0. Ties
/// keep the earlier individual. Returns `None` for an empty slice.
pub fn best_compromise(individuals: &[Individual]) -> Option<&Individual> {
    let ideal = ideal_point(individuals);
    let nadir = individuals.iter().fold(
        Objectives::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        |acc, ind| {
            Objectives::new(
                acc.communication_cost.max(ind.objectives.communication_cost),
                acc.resource_cost.max(ind.objectives.resource_cost),
                acc.resource_imbalance.max(ind.objectives.resource_imbalance),
            )
        },
    );
    let score = |ind: &Individual| {
        (0..Objectives::COUNT).fold(0.0, |acc, k| {
            let range = nadir.get(k) - ideal.get(k);
            if range > 0.0 {
                acc + (ind.objectives.get(k) - ideal.get(k)) / range
            } else {
                acc
            }
        })
    };
    individuals
        .iter()
        .min_by(|a, b| score(a).partial_cmp(&score(b)).unwrap_or(CmpOrdering::Equal))
}

/// Best value of each objective across a set of individuals.
pub fn ideal_point<'b, I: IntoIterator<Item = &'b Individual>>(individuals: I) -> Objectives {
    individuals.into_iter().fold(
        Objectives::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
        |acc, ind| {
            Objectives::new(
                acc.communication_cost.min(ind.objectives.communication_cost),
                acc.resource_cost.min(ind.objectives.resource_cost),
                acc.resource_imbalance.min(ind.objectives.resource_imbalance),
            )
        },
    )
}

// ============================================================================
// Tests
// ============================================================================
