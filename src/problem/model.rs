//! Placement problem: validated inputs and objective evaluation.
//!
//! # Capacity policy
//!
//! Capacity is evaluated, never enforced. Demand above a node's capacity
//! (overflow) is added to both `resource_cost` and `resource_imbalance`,
//! scaled by [`PlacementProblem::overflow_penalty`]. Feasible utilization
//! variance never exceeds 0.25; with the default penalty of 10, an overflow
//! of 2.5% of one node's capacity already outweighs it. Infeasible states
//! stay reachable but are pushed out of the front.

use super::types::{Microservice, Node, Objectives};
use crate::error::ConfigError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Default weight of the overflow penalty term.
pub const DEFAULT_OVERFLOW_PENALTY: f64 = 10.0;

/// Loads within this tolerance of capacity count as feasible.
const FEASIBILITY_EPS: f64 = 1e-9;

/// A directed communication edge between two service indices.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Link {
    from: usize,
    to: usize,
    weight: f64,
}

/// Serializable form of a [`PlacementProblem`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemDefinition {
    pub services: Vec<Microservice>,
    pub nodes: Vec<Node>,
    #[serde(default = "default_penalty")]
    pub overflow_penalty: f64,
}

fn default_penalty() -> f64 {
    DEFAULT_OVERFLOW_PENALTY
}

/// A validated microservice placement problem.
///
/// An assignment is a `&[usize]` where entry `i` is the index of the node
/// hosting microservice `i`.
///
/// # Examples
///
/// ```
/// use u_placement::problem::{Microservice, Node, PlacementProblem};
///
/// let problem = PlacementProblem::new(
///     vec![
///         Microservice::new("a", 5.0).with_peer("b", 2.0),
///         Microservice::new("b", 8.0),
///     ],
///     vec![Node::new("n0", 15.0), Node::new("n1", 10.0)],
/// )
/// .unwrap();
///
/// let split = problem.evaluate(&[0, 1]);
/// assert_eq!(split.communication_cost, 2.0);
///
/// let together = problem.evaluate(&[0, 0]);
/// assert_eq!(together.communication_cost, 0.0);
/// assert!(problem.is_feasible(&[0, 0]));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ProblemDefinition", into = "ProblemDefinition")]
pub struct PlacementProblem {
    services: Vec<Microservice>,
    nodes: Vec<Node>,
    links: Vec<Link>,
    /// Row-major `node_count × node_count` path quality factors.
    path_quality: Vec<f64>,
    overflow_penalty: f64,
}

impl PlacementProblem {
    /// Validates and indexes the problem inputs.
    ///
    /// Fails on empty service or node sets, negative or non-finite numbers,
    /// duplicate identifiers, communication with unknown services or nodes,
    /// and inputs whose objective values could overflow `f64`.
    pub fn new(services: Vec<Microservice>, nodes: Vec<Node>) -> Result<Self, ConfigError> {
        if services.is_empty() {
            return Err(ConfigError::NoServices);
        }
        if nodes.is_empty() {
            return Err(ConfigError::NoNodes);
        }

        let mut index: HashMap<&str, usize> = HashMap::with_capacity(services.len());
        for (i, service) in services.iter().enumerate() {
            if !is_non_negative(service.demand) {
                return Err(ConfigError::InvalidDemand {
                    id: service.id.clone(),
                    demand: service.demand,
                });
            }
            if index.insert(service.id.as_str(), i).is_some() {
                return Err(ConfigError::DuplicateService(service.id.clone()));
            }
        }

        let mut node_index: HashMap<&str, usize> = HashMap::with_capacity(nodes.len());
        for (j, node) in nodes.iter().enumerate() {
            if !is_non_negative(node.capacity) {
                return Err(ConfigError::InvalidCapacity {
                    id: node.id.clone(),
                    capacity: node.capacity,
                });
            }
            if !is_non_negative(node.fixed_cost) || !is_non_negative(node.unit_cost) {
                return Err(ConfigError::InvalidCost {
                    id: node.id.clone(),
                    fixed: node.fixed_cost,
                    unit: node.unit_cost,
                });
            }
            if node_index.insert(node.id.as_str(), j).is_some() {
                return Err(ConfigError::DuplicateNode(node.id.clone()));
            }
        }

        let mut links = Vec::new();
        for (from, service) in services.iter().enumerate() {
            for (peer, &weight) in &service.communication {
                let to = *index.get(peer.as_str()).ok_or_else(|| ConfigError::UnknownPeer {
                    service: service.id.clone(),
                    peer: peer.clone(),
                })?;
                if !is_non_negative(weight) {
                    return Err(ConfigError::InvalidWeight {
                        service: service.id.clone(),
                        peer: peer.clone(),
                        weight,
                    });
                }
                if to != from && weight > 0.0 {
                    links.push(Link { from, to, weight });
                }
            }
        }

        let m = nodes.len();
        let mut path_quality = vec![1.0; m * m];
        for (from, node) in nodes.iter().enumerate() {
            for (target, &quality) in &node.links {
                let to = *node_index.get(target.as_str()).ok_or_else(|| {
                    ConfigError::UnknownLinkTarget {
                        node: node.id.clone(),
                        target: target.clone(),
                    }
                })?;
                if !is_non_negative(quality) {
                    return Err(ConfigError::InvalidLinkQuality {
                        node: node.id.clone(),
                        target: target.clone(),
                        quality,
                    });
                }
                path_quality[from * m + to] = quality;
            }
        }

        let problem = Self {
            services,
            nodes,
            links,
            path_quality,
            overflow_penalty: DEFAULT_OVERFLOW_PENALTY,
        };
        problem.check_bounds()?;
        Ok(problem)
    }

    /// Replaces the overflow penalty weight.
    pub fn with_overflow_penalty(mut self, penalty: f64) -> Result<Self, ConfigError> {
        if !is_non_negative(penalty) {
            return Err(ConfigError::InvalidPenalty(penalty));
        }
        self.overflow_penalty = penalty;
        self.check_bounds()?;
        Ok(self)
    }

    /// Rejects inputs for which some assignment evaluates to a non-finite
    /// objective.
    ///
    /// Each bound is an upper limit of the corresponding sum in
    /// [`evaluate`](Self::evaluate) over all assignments.
    fn check_bounds(&self) -> Result<(), ConfigError> {
        let total_demand = self.services.iter().fold(0.0, |acc, s| acc + s.demand);
        let min_capacity = self
            .nodes
            .iter()
            .map(|n| n.capacity)
            .filter(|&c| c > 0.0)
            .fold(f64::INFINITY, f64::min);
        let mut max_ratio = (total_demand / min_capacity).max(1.0);
        // Zero-capacity nodes report raw overflow instead of a ratio
        if self.nodes.iter().any(|n| n.capacity <= 0.0) {
            max_ratio = max_ratio.max(total_demand);
        }
        let node_count = self.nodes.len() as f64;

        let fixed = self.nodes.iter().fold(0.0, |acc, n| acc + n.fixed_cost);
        let max_unit = self.nodes.iter().fold(0.0, |acc: f64, n| acc.max(n.unit_cost));
        let total_weight = self.links.iter().fold(0.0, |acc, l| acc + l.weight);
        let max_quality = self.path_quality.iter().fold(0.0, |acc: f64, &q| acc.max(q));

        let bounds = [
            ("total demand", total_demand),
            ("resource_cost", fixed + (max_unit + self.overflow_penalty) * total_demand),
            (
                "resource_imbalance",
                node_count * max_ratio * max_ratio + 2.0 * self.overflow_penalty * max_ratio,
            ),
            ("communication_cost", total_weight * max_quality),
        ];
        match bounds.into_iter().find(|(_, bound)| !bound.is_finite()) {
            Some((quantity, _)) => Err(ConfigError::UnboundedTotal { quantity }),
            None => Ok(()),
        }
    }

    pub fn services(&self) -> &[Microservice] {
        &self.services
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn service_count(&self) -> usize {
        self.services.len()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn overflow_penalty(&self) -> f64 {
        self.overflow_penalty
    }

    /// Draws an assignment with every service on a uniformly random node.
    ///
    /// The result is structurally valid but may violate capacity.
    pub fn random_assignment<R: Rng>(&self, rng: &mut R) -> Vec<usize> {
        let m = self.node_count();
        (0..self.service_count())
            .map(|_| rng.random_range(0..m))
            .collect()
    }

    /// Whether `assignment` places every service on an existing node.
    pub fn is_valid_assignment(&self, assignment: &[usize]) -> bool {
        assignment.len() == self.service_count()
            && assignment.iter().all(|&n| n < self.node_count())
    }

    /// Aggregate demand per node.
    pub fn node_loads(&self, assignment: &[usize]) -> Vec<f64> {
        debug_assert!(self.is_valid_assignment(assignment));
        let mut loads = vec![0.0; self.node_count()];
        for (service, &node) in self.services.iter().zip(assignment) {
            loads[node] += service.demand;
        }
        loads
    }

    /// Utilization ratio (load / capacity) per node.
    ///
    /// A zero-capacity node reports 0 when empty and 1 otherwise.
    pub fn utilization(&self, assignment: &[usize]) -> Vec<f64> {
        let loads = self.node_loads(assignment);
        self.nodes
            .iter()
            .zip(&loads)
            .map(|(node, &load)| utilization_ratio(load, node.capacity))
            .collect()
    }

    /// Total demand above capacity, summed over nodes.
    pub fn overflow(&self, assignment: &[usize]) -> f64 {
        let loads = self.node_loads(assignment);
        self.nodes
            .iter()
            .zip(&loads)
            .map(|(node, &load)| (load - node.capacity).max(0.0))
            .fold(0.0, |acc, overflow| acc + overflow)
    }

    /// Whether no node is loaded above its capacity.
    pub fn is_feasible(&self, assignment: &[usize]) -> bool {
        let loads = self.node_loads(assignment);
        self.nodes
            .iter()
            .zip(&loads)
            .all(|(node, &load)| load <= node.capacity + FEASIBILITY_EPS)
    }

    /// Path quality factor for traffic from node `from` to node `to`.
    pub fn path_quality(&self, from: usize, to: usize) -> f64 {
        self.path_quality[from * self.nodes.len() + to]
    }

    /// Communication weight between services on different nodes, scaled by
    /// the path quality between their nodes.
    pub fn communication_cost(&self, assignment: &[usize]) -> f64 {
        self.links
            .iter()
            .map(|link| (assignment[link.from], assignment[link.to], link.weight))
            .filter(|(a, b, _)| a != b)
            .fold(0.0, |acc, (a, b, weight)| acc + weight * self.path_quality(a, b))
    }

    /// Cost of the active nodes plus the overflow penalty.
    pub fn resource_cost(&self, assignment: &[usize]) -> f64 {
        self.resource_cost_from_loads(&self.node_loads(assignment))
    }

    /// Variance of node utilization plus the overflow penalty.
    pub fn resource_imbalance(&self, assignment: &[usize]) -> f64 {
        self.resource_imbalance_from_loads(&self.node_loads(assignment))
    }

    /// Computes all three objectives.
    ///
    /// Pure and total: any structurally valid assignment yields a finite,
    /// non-negative vector, and equal assignments yield equal vectors.
    pub fn evaluate(&self, assignment: &[usize]) -> Objectives {
        let loads = self.node_loads(assignment);
        Objectives {
            communication_cost: self.communication_cost(assignment),
            resource_cost: self.resource_cost_from_loads(&loads),
            resource_imbalance: self.resource_imbalance_from_loads(&loads),
        }
    }

    fn resource_cost_from_loads(&self, loads: &[f64]) -> f64 {
        self.nodes
            .iter()
            .zip(loads)
            .filter(|(_, &load)| load > 0.0)
            .map(|(node, &load)| {
                let overflow = (load - node.capacity).max(0.0);
                node.fixed_cost + node.unit_cost * load + self.overflow_penalty * overflow
            })
            .fold(0.0, |acc, cost| acc + cost)
    }

    fn resource_imbalance_from_loads(&self, loads: &[f64]) -> f64 {
        let n = self.nodes.len() as f64;
        let ratios: Vec<f64> = self
            .nodes
            .iter()
            .zip(loads)
            .map(|(node, &load)| utilization_ratio(load, node.capacity))
            .collect();
        let mean = ratios.iter().fold(0.0, |acc, r| acc + r) / n;
        let variance = ratios.iter().fold(0.0, |acc, r| acc + (r - mean).powi(2)) / n;

        let overflow_ratio = self
            .nodes
            .iter()
            .zip(loads)
            .map(|(node, &load)| {
                let overflow = (load - node.capacity).max(0.0);
                if node.capacity > 0.0 {
                    overflow / node.capacity
                } else {
                    overflow
                }
            })
            .fold(0.0, |acc, ratio| acc + ratio);

        variance + self.overflow_penalty * overflow_ratio
    }
}

fn utilization_ratio(load: f64, capacity: f64) -> f64 {
    if capacity > 0.0 {
        load / capacity
    } else if load > 0.0 {
        1.0
    } else {
        0.0
    }
}

fn is_non_negative(x: f64) -> bool {
    x.is_finite() && x >= 0.0
}

impl TryFrom<ProblemDefinition> for PlacementProblem {
    type Error = ConfigError;

    fn try_from(def: ProblemDefinition) -> Result<Self, Self::Error> {
        PlacementProblem::new(def.services, def.nodes)?.with_overflow_penalty(def.overflow_penalty)
    }
}

impl From<PlacementProblem> for ProblemDefinition {
    fn from(problem: PlacementProblem) -> Self {
        Self {
            services: problem.services,
            nodes: problem.nodes,
            overflow_penalty: problem.overflow_penalty,
        }
    }
}
