//! Microservice placement problem model.
//!
//! Users describe the services to deploy and the nodes available, then
//! [`PlacementProblem`] validates the inputs once and evaluates candidate
//! assignments against three minimized objectives:
//!
//! - **communication_cost**: traffic weight crossing node boundaries
//! - **resource_cost**: activation and usage cost of the hosting nodes
//! - **resource_imbalance**: variance of node utilization ratios
//!
//! Capacity violations are penalized, not rejected (see [`model`]).

pub mod model;
mod types;

pub use model::{PlacementProblem, ProblemDefinition, DEFAULT_OVERFLOW_PENALTY};
pub use types::{Microservice, Node, Objectives};
