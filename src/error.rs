//! Error types.
//!
//! Construction problems (bad configuration, malformed problem inputs) are
//! reported as [`ConfigError`] before any optimization starts. Snapshot
//! export failures are [`SnapshotError`]. [`PlacementError`] wraps both for
//! callers of the runner.

use std::path::PathBuf;
use thiserror::Error;

/// Invalid optimizer configuration or problem definition.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("population_size must be at least 1")]
    EmptyPopulation,

    #[error("max_generations must be at least 1")]
    ZeroGenerations,

    #[error("{name} must lie in [0, 1], got {value}")]
    RateOutOfRange { name: &'static str, value: f64 },

    #[error("tournament_size must be at least 1")]
    ZeroTournament,

    #[error("time_limit_ms must be positive or None")]
    ZeroTimeLimit,

    #[error("max_evaluations must be positive or None")]
    ZeroEvaluationBudget,

    #[error("problem has no microservices")]
    NoServices,

    #[error("problem has no nodes")]
    NoNodes,

    #[error("microservice `{id}` has invalid demand {demand}")]
    InvalidDemand { id: String, demand: f64 },

    #[error("node `{id}` has invalid capacity {capacity}")]
    InvalidCapacity { id: String, capacity: f64 },

    #[error("node `{id}` has invalid cost coefficients (fixed {fixed}, unit {unit})")]
    InvalidCost { id: String, fixed: f64, unit: f64 },

    #[error("duplicate microservice id `{0}`")]
    DuplicateService(String),

    #[error("duplicate node id `{0}`")]
    DuplicateNode(String),

    #[error("microservice `{service}` communicates with unknown microservice `{peer}`")]
    UnknownPeer { service: String, peer: String },

    #[error("invalid communication weight {weight} from `{service}` to `{peer}`")]
    InvalidWeight {
        service: String,
        peer: String,
        weight: f64,
    },

    #[error("overflow penalty must be finite and non-negative, got {0}")]
    InvalidPenalty(f64),

    #[error("node `{node}` links to unknown node `{target}`")]
    UnknownLinkTarget { node: String, target: String },

    #[error("invalid path quality {quality} from node `{node}` to `{target}`")]
    InvalidLinkQuality {
        node: String,
        target: String,
        quality: f64,
    },

    #[error("{quantity} can exceed the finite f64 range for these inputs")]
    UnboundedTotal { quantity: &'static str },
}

/// Failure while writing or reading a population snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot destination {0:?} does not exist")]
    MissingDestination(PathBuf),

    #[error("snapshot I/O on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("snapshot serialization: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("snapshot has {found} individuals, population size is {expected}")]
    PopulationSizeMismatch { expected: usize, found: usize },

    #[error("snapshot individual places {found} microservices, problem has {expected}")]
    ServiceCountMismatch { expected: usize, found: usize },

    #[error("snapshot places unknown microservice `{0}`")]
    UnknownService(String),

    #[error("snapshot uses unknown node `{0}`")]
    UnknownNode(String),
}

/// Any error surfaced by an optimization run.
#[derive(Debug, Error)]
pub enum PlacementError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("snapshot export failed: {0}")]
    Snapshot(#[from] SnapshotError),
}

pub type Result<T> = std::result::Result<T, PlacementError>;
