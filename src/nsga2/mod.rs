//! NSGA-II multi-objective optimizer for microservice placement.
//!
//! Evolves a population of assignments (one node index per microservice)
//! toward the Pareto front of the three placement objectives, all minimized.
//!
//! # Key Types
//!
//! - [`NsgaConfig`]: Algorithm parameters (population, budgets, operators, presets)
//! - [`Nsga2`]: Executes the generational loop
//! - [`GenerationState`]: Explicit state carried between generations
//! - [`NsgaResult`]: Final population, Pareto front and run statistics
//! - [`best_compromise`]: Picks one placement from a front by normalized objective sum
//! - [`HistoryExporter`]: Writes per-generation JSON snapshots; [`Nsga2::initialize_from`]
//!   resumes from one
//!
//! # Submodules
//!
//! - [`operators`]: Uniform and single-point crossover, reassignment mutation
//! - [`ranking`]: Dominance, non-dominated sorting, crowding distance, survivor selection
//!
//! # References
//!
//! - Deb et al. (2002), *A Fast and Elitist Multiobjective GA: NSGA-II*
//! - Deb (2001), *Multi-Objective Optimization Using Evolutionary Algorithms*

mod config;
pub mod operators;
pub mod ranking;
mod runner;
mod selection;
mod snapshot;
mod types;

pub use config::NsgaConfig;
pub use operators::CrossoverKind;
pub use ranking::{
    assign_ranks, crowding_distance, dominates, non_dominated_sort, select_survivors,
    NondominatedSortResult,
};
pub use runner::{
    best_compromise, ideal_point, GenerationObserver, GenerationState, NoopObserver, Nsga2,
    NsgaResult, StopReason,
};
pub use selection::{crowded_cmp, crowded_tournament};
pub use snapshot::{Elapsed, HistoryExporter, IndividualRecord, PopulationSnapshot};
pub use types::{Individual, Population};
