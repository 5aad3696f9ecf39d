//! Individuals and populations.
//!
//! An [`Individual`] owns one assignment and its cached objective vector,
//! plus ranking metadata (front index and crowding distance) that is only
//! meaningful within the generation that computed it.

use super::ranking::{dominates, non_dominated_sort};
use crate::problem::{Objectives, PlacementProblem};
use rand::Rng;

/// A candidate placement.
#[derive(Debug, Clone, PartialEq)]
pub struct Individual {
    /// Node index per microservice.
    pub assignment: Vec<usize>,

    /// Cached objective vector. Zeroed until evaluated.
    pub objectives: Objectives,

    /// Front index from the last ranking (0 = non-dominated).
    pub rank: usize,

    /// Crowding distance within its front from the last ranking.
    pub crowding_distance: f64,
}

impl Individual {
    /// Wraps an assignment that has not been evaluated yet.
    pub fn unevaluated(assignment: Vec<usize>) -> Self {
        Self {
            assignment,
            objectives: Objectives::default(),
            rank: usize::MAX,
            crowding_distance: 0.0,
        }
    }

    /// Wraps and evaluates an assignment.
    pub fn evaluated(problem: &PlacementProblem, assignment: Vec<usize>) -> Self {
        let mut ind = Self::unevaluated(assignment);
        ind.evaluate(problem);
        ind
    }

    /// Recomputes the objective vector.
    pub fn evaluate(&mut self, problem: &PlacementProblem) {
        self.objectives = problem.evaluate(&self.assignment);
    }

    /// Pareto dominance on the cached objectives.
    pub fn dominates(&self, other: &Individual) -> bool {
        dominates(&self.objectives, &other.objectives)
    }
}

/// An ordered collection of individuals.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Population {
    individuals: Vec<Individual>,
}

impl Population {
    pub fn new(individuals: Vec<Individual>) -> Self {
        Self { individuals }
    }

    /// Creates `n` evaluated individuals with uniformly random assignments.
    pub fn random<R: Rng>(problem: &PlacementProblem, n: usize, rng: &mut R) -> Self {
        let individuals = (0..n)
            .map(|_| Individual::evaluated(problem, problem.random_assignment(rng)))
            .collect();
        Self { individuals }
    }

    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Individual> {
        self.individuals.iter()
    }

    pub fn individuals(&self) -> &[Individual] {
        &self.individuals
    }

    pub fn individuals_mut(&mut self) -> &mut [Individual] {
        &mut self.individuals
    }

    pub fn into_individuals(self) -> Vec<Individual> {
        self.individuals
    }

    /// Appends all of `other` after `self`, keeping duplicates.
    pub fn union(mut self, other: Population) -> Population {
        self.individuals.extend(other.individuals);
        self
    }

    /// Objective vectors in population order.
    pub fn objectives(&self) -> Vec<Objectives> {
        self.individuals.iter().map(|i| i.objectives).collect()
    }

    /// Members not dominated by any other member, in population order.
    ///
    /// Computed from the objectives, independent of stored rank metadata.
    pub fn pareto_front(&self) -> Vec<&Individual> {
        if self.individuals.is_empty() {
            return Vec::new();
        }
        let sorted = non_dominated_sort(&self.objectives());
        let mut front: Vec<usize> = sorted.fronts[0].clone();
        front.sort_unstable();
        front.into_iter().map(|i| &self.individuals[i]).collect()
    }
}

impl<'a> IntoIterator for &'a Population {
    type Item = &'a Individual;
    type IntoIter = std::slice::Iter<'a, Individual>;

    fn into_iter(self) -> Self::IntoIter {
        self.individuals.iter()
    }
}

impl FromIterator<Individual> for Population {
    fn from_iter<T: IntoIterator<Item = Individual>>(iter: T) -> Self {
        Self {
            individuals: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::{Microservice, Node};
    use crate::random::create_rng;

    fn problem() -> PlacementProblem {
        PlacementProblem::new(
            vec![
                Microservice::new("a", 2.0).with_peer("b", 1.0),
                Microservice::new("b", 3.0),
                Microservice::new("c", 1.0),
            ],
            vec![Node::new("n0", 4.0), Node::new("n1", 4.0)],
        )
        .unwrap()
    }

    fn with_objectives(values: [f64; 3]) -> Individual {
        let mut ind = Individual::unevaluated(vec![0]);
        ind.objectives = Objectives::new(values[0], values[1], values[2]);
        ind
    }

    #[test]
    fn test_random_population_is_valid_and_evaluated() {
        let p = problem();
        let mut rng = create_rng(42);
        let pop = Population::random(&p, 30, &mut rng);
        assert_eq!(pop.len(), 30);
        for ind in &pop {
            assert!(p.is_valid_assignment(&ind.assignment));
            assert_eq!(ind.objectives, p.evaluate(&ind.assignment));
        }
    }

    #[test]
    fn test_union_keeps_duplicates_and_order() {
        let a = Population::new(vec![with_objectives([1.0, 1.0, 1.0])]);
        let b = Population::new(vec![
            with_objectives([1.0, 1.0, 1.0]),
            with_objectives([2.0, 0.0, 0.0]),
        ]);
        let merged = a.union(b);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged.individuals()[2].objectives.communication_cost, 2.0);
    }

    #[test]
    fn test_pareto_front_ignores_stale_metadata() {
        let mut dominated = with_objectives([3.0, 3.0, 3.0]);
        dominated.rank = 0;
        let pop = Population::new(vec![
            dominated,
            with_objectives([1.0, 2.0, 3.0]),
            with_objectives([2.0, 1.0, 3.0]),
        ]);
        let front = pop.pareto_front();
        assert_eq!(front.len(), 2);
        assert_eq!(front[0].objectives.communication_cost, 1.0);
    }

    #[test]
    fn test_individual_dominance() {
        let a = with_objectives([1.0, 1.0, 1.0]);
        let b = with_objectives([1.0, 2.0, 1.0]);
        assert!(a.dominates(&b));
        assert!(!b.dominates(&a));
        assert!(!a.dominates(&a));
    }

    #[test]
    fn test_empty_population_front() {
        assert!(Population::default().pareto_front().is_empty());
    }
}
