//! Problem inputs and the objective vector.
//!
//! [`Microservice`] and [`Node`] are plain data records, deserializable from
//! whatever configuration source the caller uses. They are validated and
//! indexed once by [`PlacementProblem::new`](super::PlacementProblem::new).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A deployable service with a resource demand and outgoing traffic.
///
/// # Examples
///
/// ```
/// use u_placement::problem::Microservice;
///
/// let frontend = Microservice::new("frontend", 2.0)
///     .with_peer("search", 40.0)
///     .with_peer("user", 5.0);
/// assert_eq!(frontend.communication.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Microservice {
    /// Unique identifier.
    pub id: String,

    /// Resource demand in the same unit as node capacity. Must be >= 0.
    pub demand: f64,

    /// Directed communication weights keyed by peer microservice id.
    ///
    /// The weight is charged once whenever this service and the peer are
    /// placed on different nodes. Symmetric traffic should be listed on one
    /// side only, or split between both.
    #[serde(default)]
    pub communication: BTreeMap<String, f64>,
}

impl Microservice {
    /// Creates a microservice with no communication peers.
    pub fn new(id: impl Into<String>, demand: f64) -> Self {
        Self {
            id: id.into(),
            demand,
            communication: BTreeMap::new(),
        }
    }

    /// Adds (or replaces) a directed communication weight to `peer`.
    pub fn with_peer(mut self, peer: impl Into<String>, weight: f64) -> Self {
        self.communication.insert(peer.into(), weight);
        self
    }
}

/// A compute node that hosts microservices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier.
    pub id: String,

    /// Resource capacity. Must be >= 0.
    pub capacity: f64,

    /// Cost charged once when the node hosts any demand.
    #[serde(default = "default_fixed_cost")]
    pub fixed_cost: f64,

    /// Cost per unit of demand assigned to the node.
    #[serde(default)]
    pub unit_cost: f64,

    /// Path quality factors keyed by destination node id.
    ///
    /// Traffic from a service on this node to a peer on the destination is
    /// multiplied by the factor. Unlisted destinations use 1.0.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub links: BTreeMap<String, f64>,
}

fn default_fixed_cost() -> f64 {
    1.0
}

impl Node {
    /// Creates a node with the default cost model (fixed 1.0, unit 0.0).
    pub fn new(id: impl Into<String>, capacity: f64) -> Self {
        Self {
            id: id.into(),
            capacity,
            fixed_cost: default_fixed_cost(),
            unit_cost: 0.0,
            links: BTreeMap::new(),
        }
    }

    /// Sets the activation and per-unit costs.
    pub fn with_costs(mut self, fixed_cost: f64, unit_cost: f64) -> Self {
        self.fixed_cost = fixed_cost;
        self.unit_cost = unit_cost;
        self
    }

    /// Sets the path quality factor towards `destination`.
    pub fn with_link(mut self, destination: impl Into<String>, quality: f64) -> Self {
        self.links.insert(destination.into(), quality);
        self
    }
}

/// The three minimized objectives of a placement.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Objectives {
    /// Communication weight crossing node boundaries.
    pub communication_cost: f64,

    /// Activation and usage cost of the hosting nodes, plus overflow penalty.
    pub resource_cost: f64,

    /// Variance of node utilization ratios, plus overflow penalty.
    pub resource_imbalance: f64,
}

impl Objectives {
    /// Number of objectives.
    pub const COUNT: usize = 3;

    /// Objective names, in [`as_array`](Self::as_array) order.
    pub const NAMES: [&'static str; 3] =
        ["communication_cost", "resource_cost", "resource_imbalance"];

    pub fn new(communication_cost: f64, resource_cost: f64, resource_imbalance: f64) -> Self {
        Self {
            communication_cost,
            resource_cost,
            resource_imbalance,
        }
    }

    /// Objective values as an array, ordered as [`NAMES`](Self::NAMES).
    pub fn as_array(&self) -> [f64; 3] {
        [
            self.communication_cost,
            self.resource_cost,
            self.resource_imbalance,
        ]
    }

    /// Value of the objective at `index`.
    ///
    /// # Panics
    /// Panics if `index >= 3`.
    pub fn get(&self, index: usize) -> f64 {
        self.as_array()[index]
    }
}
