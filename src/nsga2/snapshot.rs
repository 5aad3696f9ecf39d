//! Population snapshots and history export.
//!
//! A [`PopulationSnapshot`] is a self-describing JSON document of one
//! generation: its index, evaluation count, elapsed time and every
//! individual with its placement keyed by microservice and node ids.
//!
//! [`HistoryExporter`] is a [`GenerationObserver`] that writes
//! `Init_NSGA2_gen0.json`, `History_NSGA2_gen{g}.json` every
//! `generation_step` generations and `Final_NSGA2_gen{g}.json` at the end.

use super::runner::{GenerationObserver, GenerationState, NsgaResult, StopReason};
use super::types::Population;
use crate::error::{Result, SnapshotError};
use crate::problem::{Objectives, PlacementProblem};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::info;

const ALGORITHM: &str = "NSGA2";

/// Wall-clock time split into hours, minutes and seconds.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Elapsed {
    pub hours: u64,
    pub minutes: u64,
    pub seconds: f64,
}

impl From<Duration> for Elapsed {
    fn from(d: Duration) -> Self {
        let whole = d.as_secs();
        Self {
            hours: whole / 3600,
            minutes: (whole % 3600) / 60,
            seconds: (whole % 60) as f64 + f64::from(d.subsec_nanos()) * 1e-9,
        }
    }
}

/// One individual as stored in a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndividualRecord {
    /// Microservice id → node id.
    pub assignment: BTreeMap<String, String>,
    pub objectives: Objectives,
    pub rank: usize,
    /// `None` stands for an infinite distance (JSON has no infinity).
    pub crowding_distance: Option<f64>,
    pub feasible: bool,
}

/// One generation, ready for serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationSnapshot {
    pub algorithm: String,
    pub generation: usize,
    pub number_of_function_evaluations: usize,
    pub took: Elapsed,
    pub objective_names: Vec<String>,
    pub individuals: Vec<IndividualRecord>,
}

impl PopulationSnapshot {
    /// Captures a generation state.
    pub fn capture(problem: &PlacementProblem, state: &GenerationState, elapsed: Duration) -> Self {
        Self::from_population(
            problem,
            &state.population,
            state.age,
            state.evaluations,
            elapsed,
        )
    }

    /// Captures a ranked population.
    pub fn from_population(
        problem: &PlacementProblem,
        population: &Population,
        generation: usize,
        evaluations: usize,
        elapsed: Duration,
    ) -> Self {
        let services = problem.services();
        let nodes = problem.nodes();

        let individuals = population
            .iter()
            .map(|ind| IndividualRecord {
                assignment: ind
                    .assignment
                    .iter()
                    .enumerate()
                    .map(|(s, &n)| (services[s].id.clone(), nodes[n].id.clone()))
                    .collect(),
                objectives: ind.objectives,
                rank: ind.rank,
                crowding_distance: ind
                    .crowding_distance
                    .is_finite()
                    .then_some(ind.crowding_distance),
                feasible: problem.is_feasible(&ind.assignment),
            })
            .collect();

        Self {
            algorithm: ALGORITHM.to_string(),
            generation,
            number_of_function_evaluations: evaluations,
            took: elapsed.into(),
            objective_names: Objectives::NAMES.iter().map(|s| s.to_string()).collect(),
            individuals,
        }
    }

    /// Records in the first front.
    pub fn pareto_front(&self) -> Vec<&IndividualRecord> {
        self.individuals.iter().filter(|r| r.rank == 0).collect()
    }

    pub fn to_json(&self) -> std::result::Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> std::result::Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Writes the snapshot as pretty JSON to `path`.
    pub fn write_to(&self, path: &Path) -> std::result::Result<(), SnapshotError> {
        let json = self.to_json()?;
        fs::write(path, json).map_err(|source| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn read_from(path: &Path) -> std::result::Result<Self, SnapshotError> {
        let json = fs::read_to_string(path).map_err(|source| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }
}

impl NsgaResult {
    /// Snapshot of the final population.
    pub fn snapshot(&self, problem: &PlacementProblem) -> PopulationSnapshot {
        PopulationSnapshot::from_population(
            problem,
            &self.population,
            self.generations,
            self.evaluations,
            self.elapsed,
        )
    }
}

/// Writes population snapshots to a directory during a run.
///
/// ```no_run
/// use u_placement::nsga2::{HistoryExporter, Nsga2, NsgaConfig};
/// use u_placement::problem::{Microservice, Node, PlacementProblem};
/// use u_placement::random::create_rng;
///
/// let problem = PlacementProblem::new(
///     vec![Microservice::new("api", 2.0), Microservice::new("db", 3.0)],
///     vec![Node::new("n0", 4.0), Node::new("n1", 4.0)],
/// )?;
/// let nsga = Nsga2::new(&problem, NsgaConfig::default().with_max_generations(50))?;
///
/// let mut exporter = HistoryExporter::new(10, "out/history")?;
/// nsga.run_with(&mut create_rng(1), &mut exporter, None)?;
/// assert_eq!(exporter.written().len(), 7);
/// # Ok::<(), u_placement::error::PlacementError>(())
/// ```
#[derive(Debug)]
pub struct HistoryExporter {
    generation_step: usize,
    destination: PathBuf,
    started: Instant,
    written: Vec<PathBuf>,
}

impl HistoryExporter {
    /// Creates an exporter writing every `generation_step` generations.
    ///
    /// A step of 0 is treated as 1. Fails if `destination` is not an
    /// existing directory.
    pub fn new(
        generation_step: usize,
        destination: impl Into<PathBuf>,
    ) -> std::result::Result<Self, SnapshotError> {
        let destination = destination.into();
        if !destination.is_dir() {
            return Err(SnapshotError::MissingDestination(destination));
        }
        Ok(Self {
            generation_step: generation_step.max(1),
            destination,
            started: Instant::now(),
            written: Vec::new(),
        })
    }

    pub fn generation_step(&self) -> usize {
        self.generation_step
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Paths written so far, in order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    fn save(
        &mut self,
        prefix: &str,
        problem: &PlacementProblem,
        state: &GenerationState,
    ) -> Result<()> {
        let path = self
            .destination
            .join(format!("{prefix}_{ALGORITHM}_gen{}.json", state.age));
        PopulationSnapshot::capture(problem, state, self.started.elapsed()).write_to(&path)?;
        info!(path = %path.display(), generation = state.age, "wrote population snapshot");
        self.written.push(path);
        Ok(())
    }
}

impl GenerationObserver for HistoryExporter {
    fn on_start(&mut self, problem: &PlacementProblem, state: &GenerationState) -> Result<()> {
        self.started = Instant::now();
        self.save("Init", problem, state)
    }

    fn on_generation(&mut self, problem: &PlacementProblem, state: &GenerationState) -> Result<()> {
        if state.age % self.generation_step == 0 {
            self.save("History", problem, state)?;
        }
        Ok(())
    }

    fn on_finish(
        &mut self,
        problem: &PlacementProblem,
        state: &GenerationState,
        _reason: StopReason,
    ) -> Result<()> {
        self.save("Final", problem, state)
    }
}
