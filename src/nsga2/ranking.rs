//! Dominance, non-dominated sorting and crowding distance.
//!
//! The ranking engine of NSGA-II. All three objectives are **minimized**.
//!
//! # Algorithms
//!
//! - [`non_dominated_sort`]: Fast non-dominated sorting (Deb et al., 2002)
//! - [`crowding_distance`]: Crowding distance assignment for diversity preservation
//! - [`select_survivors`]: Elitist truncation by front, then by crowding distance
//!
//! # References
//!
//! - Deb et al. (2002), "A Fast and Elitist Multiobjective Genetic Algorithm: NSGA-II"
//! - IEEE Transactions on Evolutionary Computation, 6(2), 182-197

use super::types::{Individual, Population};
use crate::problem::Objectives;
use std::cmp::Ordering;

/// Result of non-dominated sorting.
///
/// Each element of `ranks` corresponds to the Pareto rank of the solution
/// at the same index. Rank 0 is the Pareto front (non-dominated solutions).
#[derive(Debug, Clone, Default)]
pub struct NondominatedSortResult {
    /// Pareto rank for each solution (0 = front).
    pub ranks: Vec<usize>,

    /// Indices grouped by front: `fronts[0]` contains rank-0 indices, etc.
    pub fronts: Vec<Vec<usize>>,
}

/// Whether `a` Pareto-dominates `b`.
///
/// `a` must be no worse in every objective and strictly better in at least
/// one. Irreflexive: identical vectors never dominate each other.
///
/// ```
/// use u_placement::nsga2::dominates;
/// use u_placement::problem::Objectives;
///
/// let a = Objectives::new(1.0, 2.0, 0.1);
/// let b = Objectives::new(1.0, 3.0, 0.1);
/// assert!(dominates(&a, &b));
/// assert!(!dominates(&b, &a));
/// assert!(!dominates(&a, &a));
/// ```
pub fn dominates(a: &Objectives, b: &Objectives) -> bool {
    dominance_cmp(a, b) == Dominance::Left
}

/// Fast non-dominated sorting.
///
/// Assigns a Pareto rank to each solution. Identical objective vectors
/// share a front.
///
/// # Complexity
///
/// O(m * n²) where m = 3 objectives, n = number of solutions
///
/// # Example
///
/// ```
/// use u_placement::nsga2::non_dominated_sort;
/// use u_placement::problem::Objectives;
///
/// let objectives = vec![
///     Objectives::new(1.0, 5.0, 0.0), // A
///     Objectives::new(3.0, 3.0, 0.0), // B
///     Objectives::new(5.0, 1.0, 0.0), // C
///     Objectives::new(4.0, 4.0, 0.0), // D, dominated by B
/// ];
///
/// let result = non_dominated_sort(&objectives);
/// assert_eq!(result.ranks, vec![0, 0, 0, 1]);
/// assert_eq!(result.fronts.len(), 2);
/// ```
pub fn non_dominated_sort(objectives: &[Objectives]) -> NondominatedSortResult {
    let n = objectives.len();
    if n == 0 {
        return NondominatedSortResult::default();
    }

    let mut domination_count = vec![0usize; n];
    let mut dominated_by: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut ranks = vec![0usize; n];
    let mut front_0 = Vec::new();

    for i in 0..n {
        for j in (i + 1)..n {
            match dominance_cmp(&objectives[i], &objectives[j]) {
                Dominance::Left => {
                    dominated_by[i].push(j);
                    domination_count[j] += 1;
                }
                Dominance::Right => {
                    dominated_by[j].push(i);
                    domination_count[i] += 1;
                }
                Dominance::Neither => {}
            }
        }

        // All comparisons involving i against earlier indices are done by now
        if domination_count[i] == 0 {
            front_0.push(i);
        }
    }

    let mut fronts = vec![front_0];
    loop {
        let current = &fronts[fronts.len() - 1];
        let mut next_front = Vec::new();

        for &i in current {
            for &j in &dominated_by[i] {
                domination_count[j] -= 1;
                if domination_count[j] == 0 {
                    ranks[j] = fronts.len();
                    next_front.push(j);
                }
            }
        }

        if next_front.is_empty() {
            break;
        }
        fronts.push(next_front);
    }

    NondominatedSortResult { ranks, fronts }
}

/// Dominance comparison result.
#[derive(Debug, PartialEq)]
enum Dominance {
    /// Left dominates right.
    Left,
    /// Right dominates left.
    Right,
    /// Neither dominates the other.
    Neither,
}

fn dominance_cmp(a: &Objectives, b: &Objectives) -> Dominance {
    let mut a_better_in_some = false;
    let mut b_better_in_some = false;

    for (va, vb) in a.as_array().into_iter().zip(b.as_array()) {
        if va < vb {
            a_better_in_some = true;
        } else if vb < va {
            b_better_in_some = true;
        }
    }

    match (a_better_in_some, b_better_in_some) {
        (true, false) => Dominance::Left,
        (false, true) => Dominance::Right,
        _ => Dominance::Neither,
    }
}

/// Crowding distance of each member of one front.
///
/// For each objective the front is sorted; the smallest and largest
/// members receive `f64::INFINITY`, interior members add the gap between
/// their neighbors divided by the objective's range. A zero range adds
/// nothing. Fronts of one or two members are all boundary.
///
/// ```
/// use u_placement::nsga2::crowding_distance;
/// use u_placement::problem::Objectives;
///
/// let front = vec![
///     Objectives::new(1.0, 5.0, 0.0),
///     Objectives::new(3.0, 3.0, 0.0),
///     Objectives::new(5.0, 1.0, 0.0),
/// ];
/// let d = crowding_distance(&front);
/// assert!(d[0].is_infinite() && d[2].is_infinite());
/// assert!((d[1] - 2.0).abs() < 1e-12);
/// ```
pub fn crowding_distance(objectives: &[Objectives]) -> Vec<f64> {
    let n = objectives.len();
    if n <= 2 {
        return vec![f64::INFINITY; n];
    }

    let mut distances = vec![0.0f64; n];

    for obj_idx in 0..Objectives::COUNT {
        let value = |i: usize| objectives[i].get(obj_idx);

        let mut indices: Vec<usize> = (0..n).collect();
        indices.sort_by(|&a, &b| value(a).partial_cmp(&value(b)).unwrap_or(Ordering::Equal));

        distances[indices[0]] = f64::INFINITY;
        distances[indices[n - 1]] = f64::INFINITY;

        let range = value(indices[n - 1]) - value(indices[0]);
        if range > 0.0 {
            for i in 1..(n - 1) {
                let gap = value(indices[i + 1]) - value(indices[i - 1]);
                distances[indices[i]] += gap / range;
            }
        }
    }

    distances
}

/// Ranks `individuals` in place and returns the fronts.
///
/// Sets `rank` and `crowding_distance` on every individual. Crowding
/// distance is computed per front.
pub fn assign_ranks(individuals: &mut [Individual]) -> Vec<Vec<usize>> {
    let objectives: Vec<Objectives> = individuals.iter().map(|i| i.objectives).collect();
    let sorted = non_dominated_sort(&objectives);

    for front in &sorted.fronts {
        let front_objs: Vec<Objectives> = front.iter().map(|&i| objectives[i]).collect();
        let distances = crowding_distance(&front_objs);
        for (&i, d) in front.iter().zip(distances) {
            individuals[i].crowding_distance = d;
        }
    }
    for (ind, &rank) in individuals.iter_mut().zip(&sorted.ranks) {
        ind.rank = rank;
    }

    sorted.fronts
}

/// Selects `n` survivors from a merged population.
///
/// Whole fronts are taken in order F0, F1, … while they fit. The first
/// front that does not fit is sorted by descending crowding distance and
/// truncated so that exactly `n` individuals survive (fewer only when the
/// input is smaller than `n`). Survivors keep the rank and crowding
/// distance computed here.
pub fn select_survivors(merged: Population, n: usize) -> Population {
    let mut individuals = merged.into_individuals();
    let fronts = assign_ranks(&mut individuals);

    let mut chosen: Vec<usize> = Vec::with_capacity(n.min(individuals.len()));
    for front in fronts {
        if chosen.len() + front.len() <= n {
            chosen.extend(front);
            if chosen.len() == n {
                break;
            }
            continue;
        }

        let mut front = front;
        front.sort_by(|&a, &b| {
            individuals[b]
                .crowding_distance
                .partial_cmp(&individuals[a].crowding_distance)
                .unwrap_or(Ordering::Equal)
        });
        let remaining = n - chosen.len();
        chosen.extend(front.into_iter().take(remaining));
        break;
    }

    let mut slots: Vec<Option<Individual>> = individuals.into_iter().map(Some).collect();
    chosen
        .into_iter()
        .filter_map(|i| slots[i].take())
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn obj(c: f64, r: f64, i: f64) -> Objectives {
        Objectives::new(c, r, i)
    }

    fn individual(c: f64, r: f64, i: f64) -> Individual {
        let mut ind = Individual::unevaluated(vec![0]);
        ind.objectives = obj(c, r, i);
        ind
    }

    // ---- Dominance ----

    #[test]
    fn test_dominance_requires_strict_improvement() {
        assert!(dominates(&obj(1.0, 1.0, 1.0), &obj(1.0, 1.0, 2.0)));
        assert!(!dominates(&obj(1.0, 1.0, 1.0), &obj(1.0, 1.0, 1.0)));
        assert!(!dominates(&obj(1.0, 3.0, 1.0), &obj(2.0, 1.0, 1.0)));
    }

    // ---- Non-dominated sort ----

    #[test]
    fn test_single_solution() {
        let result = non_dominated_sort(&[obj(1.0, 2.0, 3.0)]);
        assert_eq!(result.ranks, vec![0]);
        assert_eq!(result.fronts, vec![vec![0]]);
    }

    #[test]
    fn test_empty_input() {
        let result = non_dominated_sort(&[]);
        assert!(result.ranks.is_empty());
        assert!(result.fronts.is_empty());
    }

    #[test]
    fn test_clear_dominance_chain() {
        let objs = vec![
            obj(3.0, 3.0, 3.0),
            obj(1.0, 1.0, 1.0),
            obj(2.0, 2.0, 2.0),
        ];
        let result = non_dominated_sort(&objs);
        assert_eq!(result.ranks, vec![2, 0, 1]);
        assert_eq!(result.fronts, vec![vec![1], vec![2], vec![0]]);
    }

    #[test]
    fn test_all_equal_share_front() {
        let objs = vec![obj(2.0, 2.0, 2.0); 4];
        let result = non_dominated_sort(&objs);
        assert!(result.ranks.iter().all(|&r| r == 0));
        assert_eq!(result.fronts.len(), 1);
    }

    #[test]
    fn test_three_objective_tradeoffs() {
        let objs = vec![
            obj(1.0, 5.0, 3.0),
            obj(3.0, 1.0, 5.0),
            obj(5.0, 3.0, 1.0),
            obj(4.0, 4.0, 4.0), // trades off against each of the above
            obj(6.0, 6.0, 6.0), // dominated by [3]
        ];
        let result = non_dominated_sort(&objs);
        assert_eq!(result.ranks, vec![0, 0, 0, 0, 1]);
    }

    // ---- Crowding distance ----

    #[test]
    fn test_crowding_small_fronts_are_boundary() {
        assert!(crowding_distance(&[obj(1.0, 1.0, 1.0)])[0].is_infinite());
        let d = crowding_distance(&[obj(1.0, 3.0, 0.0), obj(3.0, 1.0, 0.0)]);
        assert!(d.iter().all(|x| x.is_infinite()));
    }

    #[test]
    fn test_crowding_evenly_spaced() {
        let objs: Vec<Objectives> = (0..5)
            .map(|i| obj(i as f64, 4.0 - i as f64, 1.0))
            .collect();
        let dist = crowding_distance(&objs);

        assert!(dist[0].is_infinite());
        assert!(dist[4].is_infinite());
        for w in dist[1..4].windows(2) {
            assert!((w[0] - w[1]).abs() < 1e-10, "expected equal: {w:?}");
        }
    }

    #[test]
    fn test_crowding_zero_range_contributes_nothing() {
        let objs = vec![obj(1.0, 5.0, 5.0), obj(2.0, 5.0, 5.0), obj(3.0, 5.0, 5.0)];
        let dist = crowding_distance(&objs);
        assert!((dist[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_crowding_fully_degenerate_front() {
        let objs = vec![obj(1.0, 1.0, 1.0); 5];
        let dist = crowding_distance(&objs);
        assert_eq!(dist.iter().filter(|d| d.is_infinite()).count(), 2);
        assert!(dist.iter().all(|d| !d.is_nan() && *d >= 0.0));
    }

    // ---- Survivor selection ----

    #[test]
    fn test_survivors_take_whole_fronts_first() {
        let merged = Population::new(vec![
            individual(5.0, 5.0, 5.0), // rank 1
            individual(1.0, 4.0, 0.0), // rank 0
            individual(4.0, 1.0, 0.0), // rank 0
            individual(9.0, 9.0, 9.0), // rank 2
        ]);
        let survivors = select_survivors(merged, 3);
        assert_eq!(survivors.len(), 3);
        let ranks: Vec<usize> = survivors.iter().map(|i| i.rank).collect();
        assert_eq!(ranks, vec![0, 0, 1]);
    }

    #[test]
    fn test_survivors_truncate_by_crowding() {
        // One front of five points on a line; keep three.
        let merged: Population = (0..5)
            .map(|i| individual(i as f64, 4.0 - i as f64, 0.0))
            .collect();
        let survivors = select_survivors(merged, 3);
        assert_eq!(survivors.len(), 3);
        let kept: Vec<f64> = survivors
            .iter()
            .map(|i| i.objectives.communication_cost)
            .collect();
        // Both extremes survive
        assert!(kept.contains(&0.0));
        assert!(kept.contains(&4.0));
    }

    #[test]
    fn test_survivors_from_small_population() {
        let merged = Population::new(vec![individual(1.0, 1.0, 1.0)]);
        assert_eq!(select_survivors(merged, 4).len(), 1);
    }

    // ---- Properties ----

    fn arb_objectives() -> impl Strategy<Value = Objectives> {
        // Small integer grid so ties and dominance both occur often
        (0u8..6, 0u8..6, 0u8..6).prop_map(|(a, b, c)| obj(a as f64, b as f64, c as f64))
    }

    proptest! {
        #[test]
        fn prop_dominance_irreflexive_and_asymmetric(a in arb_objectives(), b in arb_objectives()) {
            prop_assert!(!dominates(&a, &a));
            if dominates(&a, &b) {
                prop_assert!(!dominates(&b, &a));
            }
        }

        #[test]
        fn prop_sort_is_partition(objs in prop::collection::vec(arb_objectives(), 1..40)) {
            let result = non_dominated_sort(&objs);
            let mut seen = vec![0usize; objs.len()];
            for (f, front) in result.fronts.iter().enumerate() {
                for &i in front {
                    seen[i] += 1;
                    prop_assert_eq!(result.ranks[i], f);
                }
            }
            prop_assert!(seen.iter().all(|&c| c == 1));
        }

        #[test]
        fn prop_front_members_not_dominated_by_later_fronts(
            objs in prop::collection::vec(arb_objectives(), 1..40)
        ) {
            let result = non_dominated_sort(&objs);
            for i in 0..objs.len() {
                for j in 0..objs.len() {
                    if result.ranks[j] >= result.ranks[i] {
                        prop_assert!(!dominates(&objs[j], &objs[i]));
                    }
                }
            }
        }

        #[test]
        fn prop_crowding_extremes_infinite_and_interior_non_negative(
            objs in prop::collection::vec(arb_objectives(), 1..30)
        ) {
            let dist = crowding_distance(&objs);
            prop_assert_eq!(dist.len(), objs.len());
            prop_assert!(dist.iter().all(|d| *d >= 0.0));
            for k in 0..Objectives::COUNT {
                let min = objs.iter().map(|o| o.get(k)).fold(f64::INFINITY, f64::min);
                let max = objs.iter().map(|o| o.get(k)).fold(f64::NEG_INFINITY, f64::max);
                // Some member holding each extreme value is a boundary
                let boundary = |v: f64| {
                    objs.iter().zip(&dist).any(|(o, d)| o.get(k) == v && d.is_infinite())
                };
                prop_assert!(boundary(min));
                prop_assert!(boundary(max));
            }
        }

        #[test]
        fn prop_survivors_exact_count_and_rank_order(
            objs in prop::collection::vec(arb_objectives(), 2..40)
        ) {
            let n = objs.len() / 2;
            let merged: Population = objs.iter().map(|o| {
                let mut ind = Individual::unevaluated(vec![0]);
                ind.objectives = *o;
                ind
            }).collect();

            let mut ranked = merged.clone().into_individuals();
            assign_ranks(&mut ranked);

            let survivors = select_survivors(merged, n);
            prop_assert_eq!(survivors.len(), n);

            let worst_kept = survivors.iter().map(|i| i.rank).max().unwrap_or(0);
            // Every individual ranked strictly better than the worst survivor must survive
            let better = ranked.iter().filter(|i| i.rank < worst_kept).count();
            let kept_better = survivors.iter().filter(|i| i.rank < worst_kept).count();
            prop_assert_eq!(better, kept_better);
        }
    }
}
