//! Multi-objective microservice placement.
//!
//! Assigns every microservice of an application to exactly one node of a
//! cluster, trading off three minimized objectives:
//!
//! - **communication_cost**: traffic between services split across nodes
//! - **resource_cost**: what the hosting nodes cost to run
//! - **resource_imbalance**: how unevenly node capacity is used
//!
//! Capacity overflow is allowed but penalized in both resource objectives,
//! which pushes infeasible placements out of the Pareto front.
//!
//! The search is NSGA-II: an elitist genetic algorithm that keeps a
//! population ranked by Pareto front and spread by crowding distance.
//!
//! # Modules
//!
//! - [`problem`]: Services, nodes and objective evaluation
//! - [`nsga2`]: Configuration, operators, ranking, the generational loop and
//!   snapshot export
//! - [`error`]: Configuration and export errors
//! - [`random`]: Seeded generators for reproducible runs
//!
//! # Example
//!
//! ```
//! use u_placement::nsga2::{Nsga2, NsgaConfig};
//! use u_placement::problem::{Microservice, Node, PlacementProblem};
//!
//! let problem = PlacementProblem::new(
//!     vec![
//!         Microservice::new("gateway", 2.0).with_peer("orders", 12.0),
//!         Microservice::new("orders", 4.0).with_peer("payments", 6.0),
//!         Microservice::new("payments", 3.0),
//!     ],
//!     vec![Node::new("a", 6.0), Node::new("b", 6.0)],
//! )?;
//!
//! let config = NsgaConfig::fast().with_max_generations(30).with_seed(1);
//! let result = Nsga2::new(&problem, config)?.run()?;
//!
//! for ind in &result.pareto_front {
//!     assert!(problem.is_valid_assignment(&ind.assignment));
//! }
//! # Ok::<(), u_placement::error::PlacementError>(())
//! ```
//!
//! # Features
//!
//! - `parallel`: evaluate offspring on the rayon thread pool when
//!   [`NsgaConfig::parallel`](nsga2::NsgaConfig::parallel) is set.

pub mod error;
pub mod nsga2;
pub mod problem;
pub mod random;

pub use error::{ConfigError, PlacementError, SnapshotError};
