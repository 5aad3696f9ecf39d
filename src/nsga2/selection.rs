//! Parent selection for NSGA-II.
//!
//! Parents are chosen by tournament under the crowded-comparison order:
//! lower front rank wins; within a front, larger crowding distance wins.
//!
//! # References
//!
//! - Deb et al. (2002), "A Fast and Elitist Multiobjective Genetic Algorithm: NSGA-II"

use super::types::Individual;
use rand::Rng;
use std::cmp::Ordering;

/// Crowded-comparison order.
///
/// Returns `Ordering::Less` when `a` is preferred over `b`.
pub fn crowded_cmp(a: &Individual, b: &Individual) -> Ordering {
    a.rank.cmp(&b.rank).then_with(|| {
        b.crowding_distance
            .partial_cmp(&a.crowding_distance)
            .unwrap_or(Ordering::Equal)
    })
}

/// Tournament selection: draw `k` individuals with replacement and return
/// the index of the preferred one. Ties keep the earlier draw.
///
/// # Complexity
/// O(k) per selection
///
/// # Panics
/// Panics if `population` is empty.
pub fn crowded_tournament<R: Rng>(population: &[Individual], k: usize, rng: &mut R) -> usize {
    assert!(
        !population.is_empty(),
        "cannot select from empty population"
    );

    let k = k.max(1);
    let n = population.len();

    let mut best_idx = rng.random_range(0..n);
    for _ in 1..k {
        let idx = rng.random_range(0..n);
        if crowded_cmp(&population[idx], &population[best_idx]) == Ordering::Less {
            best_idx = idx;
        }
    }
    best_idx
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::create_rng;

    fn ranked(rank: usize, crowding_distance: f64) -> Individual {
        let mut ind = Individual::unevaluated(vec![0]);
        ind.rank = rank;
        ind.crowding_distance = crowding_distance;
        ind
    }

    #[test]
    fn test_crowded_cmp_prefers_rank_then_distance() {
        assert_eq!(crowded_cmp(&ranked(0, 0.1), &ranked(1, 9.0)), Ordering::Less);
        assert_eq!(crowded_cmp(&ranked(2, 0.5), &ranked(2, 0.2)), Ordering::Less);
        assert_eq!(
            crowded_cmp(&ranked(1, f64::INFINITY), &ranked(1, 3.0)),
            Ordering::Less
        );
        assert_eq!(crowded_cmp(&ranked(1, 1.0), &ranked(1, 1.0)), Ordering::Equal);
    }

    #[test]
    fn test_tournament_favors_front_zero() {
        let pop = vec![ranked(3, 1.0), ranked(1, 1.0), ranked(0, 0.5), ranked(2, 1.0)];
        let mut rng = create_rng(42);

        let mut counts = [0u32; 4];
        let n = 10000;
        for _ in 0..n {
            counts[crowded_tournament(&pop, 4, &mut rng)] += 1;
        }
        let best_count = counts[2];
        assert!(
            best_count > 6000,
            "expected rank-0 to be selected >60% of the time, got {best_count}/{n}"
        );
    }

    #[test]
    fn test_tournament_size_1_is_random() {
        let pop = vec![ranked(3, 1.0), ranked(1, 1.0), ranked(0, 0.5), ranked(2, 1.0)];
        let mut rng = create_rng(42);

        let mut counts = [0u32; 4];
        for _ in 0..10000 {
            counts[crowded_tournament(&pop, 1, &mut rng)] += 1;
        }
        for &c in &counts {
            assert!(c > 1500, "expected uniform, got counts: {counts:?}");
        }
    }

    #[test]
    fn test_single_individual() {
        let pop = vec![ranked(0, f64::INFINITY)];
        let mut rng = create_rng(42);
        assert_eq!(crowded_tournament(&pop, 2, &mut rng), 0);
    }

    #[test]
    #[should_panic(expected = "cannot select from empty population")]
    fn test_empty_population_panics() {
        let mut rng = create_rng(42);
        crowded_tournament(&[], 2, &mut rng);
    }
}
