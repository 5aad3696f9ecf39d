//! NSGA-II configuration.
//!
//! [`NsgaConfig`] holds all parameters that control the evolutionary loop.

use super::operators::CrossoverKind;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Configuration for the NSGA-II optimizer.
///
/// # Defaults
///
/// ```
/// use u_placement::nsga2::NsgaConfig;
///
/// let config = NsgaConfig::default();
/// assert_eq!(config.population_size, 100);
/// assert_eq!(config.max_generations, 250);
/// ```
///
/// # Builder Pattern
///
/// ```
/// use u_placement::nsga2::{CrossoverKind, NsgaConfig};
///
/// let config = NsgaConfig::default()
///     .with_population_size(60)
///     .with_crossover(CrossoverKind::SinglePoint)
///     .with_mutation_rate(0.05)
///     .with_seed(7);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NsgaConfig {
    /// Number of individuals per generation (N).
    pub population_size: usize,

    /// Generation budget. The run ends once this many generations evolved.
    pub max_generations: usize,

    /// Crossover operator.
    pub crossover: CrossoverKind,

    /// Probability of applying crossover to a pair of parents (0.0–1.0).
    ///
    /// When crossover is not applied, the children are clones of the parents.
    pub crossover_rate: f64,

    /// Per-microservice probability of reassignment to another node (0.0–1.0).
    pub mutation_rate: f64,

    /// Number of competitors per parent-selection tournament.
    pub tournament_size: usize,

    /// Whether to evaluate offspring in parallel.
    ///
    /// Only effective with the `parallel` cargo feature.
    pub parallel: bool,

    /// Random seed for reproducibility.
    ///
    /// `None` uses a random seed.
    pub seed: Option<u64>,

    /// Optional wall-clock time limit in milliseconds.
    ///
    /// Checked between generations, so a run may exceed it by up to one
    /// generation's worth of work.
    pub time_limit_ms: Option<u64>,

    /// Optional budget of objective evaluations.
    ///
    /// Checked between generations; the run stops once the count reaches
    /// the budget.
    pub max_evaluations: Option<usize>,
}

impl Default for NsgaConfig {
    fn default() -> Self {
        Self {
            population_size: 100,
            max_generations: 250,
            crossover: CrossoverKind::Uniform,
            crossover_rate: 0.9,
            mutation_rate: 0.1,
            tournament_size: 2,
            parallel: false,
            seed: None,
            time_limit_ms: None,
            max_evaluations: None,
        }
    }
}

impl NsgaConfig {
    /// Sets the population size.
    pub fn with_population_size(mut self, n: usize) -> Self {
        self.population_size = n;
        self
    }

    /// Sets the generation budget.
    pub fn with_max_generations(mut self, n: usize) -> Self {
        self.max_generations = n;
        self
    }

    /// Sets the crossover operator.
    pub fn with_crossover(mut self, kind: CrossoverKind) -> Self {
        self.crossover = kind;
        self
    }

    /// Sets the crossover rate.
    pub fn with_crossover_rate(mut self, rate: f64) -> Self {
        self.crossover_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Sets the per-gene mutation rate.
    pub fn with_mutation_rate(mut self, rate: f64) -> Self {
        self.mutation_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Sets the tournament size.
    pub fn with_tournament_size(mut self, k: usize) -> Self {
        self.tournament_size = k;
        self
    }

    /// Enables or disables parallel evaluation.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Sets the random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets the wall-clock time limit in milliseconds.
    pub fn with_time_limit_ms(mut self, ms: u64) -> Self {
        self.time_limit_ms = Some(ms);
        self
    }

    /// Sets the evaluation budget.
    pub fn with_max_evaluations(mut self, n: usize) -> Self {
        self.max_evaluations = Some(n);
        self
    }

    /// Preset for quick runs on small clusters.
    ///
    /// - Population: 40, Generations: 100, Time limit: 10s
    pub fn fast() -> Self {
        Self {
            population_size: 40,
            max_generations: 100,
            time_limit_ms: Some(10_000),
            ..Self::default()
        }
    }

    /// Preset balancing front quality and run time.
    ///
    /// - Population: 100, Generations: 250, Time limit: 30s
    pub fn balanced() -> Self {
        Self {
            population_size: 100,
            max_generations: 250,
            time_limit_ms: Some(30_000),
            ..Self::default()
        }
    }

    /// Preset for large service graphs.
    ///
    /// - Population: 200, Generations: 500, Time limit: 60s
    /// - Mutation rate: 0.05
    pub fn quality() -> Self {
        Self {
            population_size: 200,
            max_generations: 500,
            mutation_rate: 0.05,
            time_limit_ms: Some(60_000),
            ..Self::default()
        }
    }

    /// Selects a preset based on the number of microservices.
    ///
    /// - `service_count < 20` → [`fast()`](Self::fast)
    /// - `20 ≤ service_count < 100` → [`balanced()`](Self::balanced)
    /// - `service_count ≥ 100` → [`quality()`](Self::quality)
    pub fn auto_select(service_count: usize) -> Self {
        if service_count < 20 {
            Self::fast()
        } else if service_count < 100 {
            Self::balanced()
        } else {
            Self::quality()
        }
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.population_size == 0 {
            return Err(ConfigError::EmptyPopulation);
        }
        if self.max_generations == 0 {
            return Err(ConfigError::ZeroGenerations);
        }
        for (name, value) in [
            ("crossover_rate", self.crossover_rate),
            ("mutation_rate", self.mutation_rate),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::RateOutOfRange { name, value });
            }
        }
        if self.tournament_size == 0 {
            return Err(ConfigError::ZeroTournament);
        }
        if self.time_limit_ms == Some(0) {
            return Err(ConfigError::ZeroTimeLimit);
        }
        if self.max_evaluations == Some(0) {
            return Err(ConfigError::ZeroEvaluationBudget);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = NsgaConfig::default();
        assert_eq!(config.population_size, 100);
        assert_eq!(config.max_generations, 250);
        assert_eq!(config.crossover, CrossoverKind::Uniform);
        assert!((config.crossover_rate - 0.9).abs() < 1e-10);
        assert!((config.mutation_rate - 0.1).abs() < 1e-10);
        assert_eq!(config.tournament_size, 2);
        assert!(!config.parallel);
        assert!(config.seed.is_none());
        assert!(config.time_limit_ms.is_none());
        assert!(config.max_evaluations.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = NsgaConfig::default()
            .with_population_size(30)
            .with_max_generations(12)
            .with_crossover(CrossoverKind::SinglePoint)
            .with_crossover_rate(0.7)
            .with_mutation_rate(0.2)
            .with_tournament_size(3)
            .with_parallel(true)
            .with_seed(42)
            .with_time_limit_ms(500)
            .with_max_evaluations(1000);

        assert_eq!(config.population_size, 30);
        assert_eq!(config.max_generations, 12);
        assert_eq!(config.crossover, CrossoverKind::SinglePoint);
        assert!((config.crossover_rate - 0.7).abs() < 1e-10);
        assert!((config.mutation_rate - 0.2).abs() < 1e-10);
        assert_eq!(config.tournament_size, 3);
        assert!(config.parallel);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.time_limit_ms, Some(500));
        assert_eq!(config.max_evaluations, Some(1000));
    }

    #[test]
    fn test_clamp_rates() {
        let config = NsgaConfig::default()
            .with_crossover_rate(-0.5)
            .with_mutation_rate(2.0);
        assert_eq!(config.crossover_rate, 0.0);
        assert_eq!(config.mutation_rate, 1.0);
    }

    #[test]
    fn test_validate_rejects_empty_population() {
        let config = NsgaConfig::default().with_population_size(0);
        assert_eq!(config.validate(), Err(ConfigError::EmptyPopulation));
    }

    #[test]
    fn test_validate_rejects_zero_generations() {
        let config = NsgaConfig::default().with_max_generations(0);
        assert_eq!(config.validate(), Err(ConfigError::ZeroGenerations));
    }

    #[test]
    fn test_validate_rejects_out_of_range_rates() {
        let config = NsgaConfig {
            mutation_rate: f64::NAN,
            ..NsgaConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::RateOutOfRange { name: "mutation_rate", .. })
        ));

        let config = NsgaConfig {
            crossover_rate: 1.5,
            ..NsgaConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_limits() {
        assert_eq!(
            NsgaConfig::default().with_tournament_size(0).validate(),
            Err(ConfigError::ZeroTournament)
        );
        assert_eq!(
            NsgaConfig::default().with_time_limit_ms(0).validate(),
            Err(ConfigError::ZeroTimeLimit)
        );
        assert_eq!(
            NsgaConfig::default().with_max_evaluations(0).validate(),
            Err(ConfigError::ZeroEvaluationBudget)
        );
    }

    #[test]
    fn test_population_of_one_is_valid() {
        assert!(NsgaConfig::default().with_population_size(1).validate().is_ok());
    }

    // ---- Presets ----

    #[test]
    fn test_presets_are_valid() {
        for config in [NsgaConfig::fast(), NsgaConfig::balanced(), NsgaConfig::quality()] {
            assert!(config.validate().is_ok());
            assert!(config.time_limit_ms.is_some());
        }
        assert_eq!(NsgaConfig::fast().population_size, 40);
        assert_eq!(NsgaConfig::quality().max_generations, 500);
    }

    #[test]
    fn test_auto_select_boundaries() {
        assert_eq!(NsgaConfig::auto_select(19), NsgaConfig::fast());
        assert_eq!(NsgaConfig::auto_select(20), NsgaConfig::balanced());
        assert_eq!(NsgaConfig::auto_select(99), NsgaConfig::balanced());
        assert_eq!(NsgaConfig::auto_select(100), NsgaConfig::quality());
    }

    #[test]
    fn test_partial_config_from_json() {
        let config: NsgaConfig =
            serde_json::from_str(r#"{"population_size": 20, "crossover": "SinglePoint"}"#).unwrap();
        assert_eq!(config.population_size, 20);
        assert_eq!(config.crossover, CrossoverKind::SinglePoint);
        assert_eq!(config.max_generations, 250);
    }
}
