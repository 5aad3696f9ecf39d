//! Variation operators over placement assignments.
//!
//! An assignment is a `Vec<usize>` with one node index per microservice.
//! Crossover exchanges whole per-service entries and mutation replaces
//! whole entries, so every child still places each service on exactly one
//! valid node.
//!
//! # Crossover Operators
//!
//! - [`uniform_crossover`]: each position swapped with probability 0.5
//! - [`single_point_crossover`]: tails after a random cut are exchanged
//!
//! # Mutation Operators
//!
//! - [`reassign_mutation`]: per-gene move to a different, uniformly chosen node

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Crossover operator used by the generational loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CrossoverKind {
    /// See [`uniform_crossover`].
    #[default]
    Uniform,
    /// See [`single_point_crossover`].
    SinglePoint,
}

impl CrossoverKind {
    /// Applies this operator to two parents.
    pub fn apply<R: Rng>(
        &self,
        parent1: &[usize],
        parent2: &[usize],
        rng: &mut R,
    ) -> (Vec<usize>, Vec<usize>) {
        match self {
            CrossoverKind::Uniform => uniform_crossover(parent1, parent2, rng),
            CrossoverKind::SinglePoint => single_point_crossover(parent1, parent2, rng),
        }
    }
}

// ============================================================================
// Crossover operators
// ============================================================================

/// Uniform crossover.
///
/// Child 1 starts as parent 1 and child 2 as parent 2; each position is
/// exchanged between the children with probability 0.5.
///
/// # Panics
/// Panics if parents have different lengths.
pub fn uniform_crossover<R: Rng>(
    parent1: &[usize],
    parent2: &[usize],
    rng: &mut R,
) -> (Vec<usize>, Vec<usize>) {
    assert_eq!(parent1.len(), parent2.len(), "parents must have equal length");

    let mut child1 = parent1.to_vec();
    let mut child2 = parent2.to_vec();
    for i in 0..parent1.len() {
        if rng.random_bool(0.5) {
            std::mem::swap(&mut child1[i], &mut child2[i]);
        }
    }
    (child1, child2)
}

/// Single-point crossover.
///
/// Picks a cut in `1..n` (for n >= 2) and exchanges everything from the cut
/// onwards. Single-gene parents are returned unchanged.
///
/// # Panics
/// Panics if parents have different lengths.
pub fn single_point_crossover<R: Rng>(
    parent1: &[usize],
    parent2: &[usize],
    rng: &mut R,
) -> (Vec<usize>, Vec<usize>) {
    assert_eq!(parent1.len(), parent2.len(), "parents must have equal length");

    let n = parent1.len();
    if n < 2 {
        return (parent1.to_vec(), parent2.to_vec());
    }

    let cut = rng.random_range(1..n);
    let mut child1 = Vec::with_capacity(n);
    let mut child2 = Vec::with_capacity(n);
    child1.extend_from_slice(&parent1[..cut]);
    child1.extend_from_slice(&parent2[cut..]);
    child2.extend_from_slice(&parent2[..cut]);
    child2.extend_from_slice(&parent1[cut..]);
    (child1, child2)
}

// ============================================================================
// Mutation operators
// ============================================================================

/// Reassignment mutation.
///
/// With probability `rate` per gene, moves that service to a uniformly
/// chosen node different from its current one. No-op with a single node.
///
/// # Complexity
/// O(n)
pub fn reassign_mutation<R: Rng>(
    assignment: &mut [usize],
    node_count: usize,
    rate: f64,
    rng: &mut R,
) {
    if node_count < 2 || rate <= 0.0 {
        return;
    }

    for gene in assignment.iter_mut() {
        if rng.random_range(0.0..1.0) < rate {
            // Draw from node_count - 1 slots and skip over the current node
            let pick = rng.random_range(0..node_count - 1);
            *gene = if pick >= *gene { pick + 1 } else { pick };
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
