//! Configuration of the bifurcation search and the growth driver.

use crate::growth::GrowthError;
use crate::growth::cost::{CostEstimator, VolumetricCost};
use crate::growth::search::MIN_BIFURCATION_TESTS;
use std::sync::Arc;

const DEFAULT_BIFURCATION_TESTS: usize = 7;
const DEFAULT_TERMINAL_TRIALS: usize = 500;
const DEFAULT_DLIM_REDUCTION_FACTOR: f64 = 0.9;
const DEFAULT_DLIM_CORRECTION_FACTOR: f64 = 1.0;
const DEFAULT_MAX_ATTEMPTS: usize = 100_000;

// =#========================================================================#=
// GROWTH CONFIG
// =#========================================================================#=
/// Settings of candidate search and terminal placement.
///
/// Create with [GrowthConfig::builder] or use [GrowthConfig::default].
#[derive(Debug, Clone)]
pub struct GrowthConfig {
    bifurcation_tests: usize,
    min_bifurcation_angle: f64,
    min_plane_angle: f64,
    evaluation_levels: Option<usize>,
    terminal_trials: usize,
    dlim_reduction_factor: f64,
    dlim_correction_factor: f64,
    max_attempts: usize,
    parallel: bool,
    cost_estimator: Arc<dyn CostEstimator>,
}

impl Default for GrowthConfig {
    fn default() -> Self {
        GrowthConfig {
            bifurcation_tests: DEFAULT_BIFURCATION_TESTS,
            min_bifurcation_angle: 0.0,
            min_plane_angle: 0.0,
            evaluation_levels: None,
            terminal_trials: DEFAULT_TERMINAL_TRIALS,
            dlim_reduction_factor: DEFAULT_DLIM_REDUCTION_FACTOR,
            dlim_correction_factor: DEFAULT_DLIM_CORRECTION_FACTOR,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            parallel: true,
            cost_estimator: Arc::new(VolumetricCost),
        }
    }
}

impl GrowthConfig {
    /// Starts a [GrowthConfigBuilder] with default settings.
    pub fn builder() -> GrowthConfigBuilder {
        GrowthConfigBuilder { config: GrowthConfig::default() }
    }

    /// Resolution of the barycentric candidate grid (points per edge).
    pub fn bifurcation_tests(&self) -> usize {
        self.bifurcation_tests
    }

    /// Minimum angle in radians between the new vessel and either parent part.
    pub fn min_bifurcation_angle(&self) -> f64 {
        self.min_bifurcation_angle
    }

    /// Minimum angle in radians between the new vessel and the parent's plane.
    pub fn min_plane_angle(&self) -> f64 {
        self.min_plane_angle
    }

    /// Ancestor levels cloned per evaluation; `None` clones the whole tree.
    pub fn evaluation_levels(&self) -> Option<usize> {
        self.evaluation_levels
    }

    /// Failed draws after which the distance limit shrinks.
    pub fn terminal_trials(&self) -> usize {
        self.terminal_trials
    }

    /// Factor applied to the distance limit after `terminal_trials` failed draws.
    pub fn dlim_reduction_factor(&self) -> f64 {
        self.dlim_reduction_factor
    }

    /// Factor applied to the domain's distance limit for every new terminal.
    pub fn dlim_correction_factor(&self) -> f64 {
        self.dlim_correction_factor
    }

    /// Draws per terminal after which growth gives up.
    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Whether candidates are evaluated on the rayon pool.
    pub fn parallel(&self) -> bool {
        self.parallel
    }

    /// Cost minimized by the search.
    pub fn cost_estimator(&self) -> &dyn CostEstimator {
        self.cost_estimator.as_ref()
    }
}

// =#========================================================================#=
// GROWTH CONFIG BUILDER
// =#========================================================================#=
/// Builder for [GrowthConfig].
///
/// # Example
/// ```
/// use vascular_cco::growth::GrowthConfig;
///
/// let config = GrowthConfig::builder()
///     .with_bifurcation_tests(5)
///     .with_min_bifurcation_angle(0.1)
///     .sequential()
///     .build()
///     .unwrap();
/// assert_eq!(config.bifurcation_tests(), 5);
/// assert!(!config.parallel());
/// ```
#[derive(Debug, Clone)]
pub struct GrowthConfigBuilder {
    config: GrowthConfig,
}

impl GrowthConfigBuilder {
    /// Sets the resolution of the candidate grid; at least 3.
    pub fn with_bifurcation_tests(mut self, tests: usize) -> Self {
        self.config.bifurcation_tests = tests;
        self
    }

    /// Sets the minimum bifurcation angle in radians.
    pub fn with_min_bifurcation_angle(mut self, angle: f64) -> Self {
        self.config.min_bifurcation_angle = angle;
        self
    }

    /// Sets the minimum plane angle in radians; `0` disables the check.
    pub fn with_min_plane_angle(mut self, angle: f64) -> Self {
        self.config.min_plane_angle = angle;
        self
    }

    /// Clones only the subtree `levels` ancestors above the parent per evaluation.
    pub fn with_evaluation_levels(mut self, levels: usize) -> Self {
        self.config.evaluation_levels = Some(levels);
        self
    }

    /// Sets the failed draws after which the distance limit shrinks.
    pub fn with_terminal_trials(mut self, trials: usize) -> Self {
        self.config.terminal_trials = trials;
        self
    }

    /// Sets the shrink factor of the distance limit, in `(0, 1)`.
    pub fn with_dlim_reduction_factor(mut self, factor: f64) -> Self {
        self.config.dlim_reduction_factor = factor;
        self
    }

    /// Sets the correction factor of the domain's distance limit.
    pub fn with_dlim_correction_factor(mut self, factor: f64) -> Self {
        self.config.dlim_correction_factor = factor;
        self
    }

    /// Sets the draws per terminal after which growth gives up.
    pub fn with_max_attempts(mut self, attempts: usize) -> Self {
        self.config.max_attempts = attempts;
        self
    }

    /// Sets the cost minimized by the search.
    pub fn with_cost_estimator(mut self, estimator: impl CostEstimator + 'static) -> Self {
        self.config.cost_estimator = Arc::new(estimator);
        self
    }

    /// Evaluates candidates on the rayon pool (default).
    pub fn parallel(mut self) -> Self {
        self.config.parallel = true;
        self
    }

    /// Evaluates candidates on the calling thread.
    pub fn sequential(mut self) -> Self {
        self.config.parallel = false;
        self
    }

    /// Validates and returns the configuration.
    ///
    /// # Errors
    /// [GrowthError::InvalidConfig] for a grid resolution below 3, a
    /// reduction factor outside `(0, 1)`, a non-positive correction factor,
    /// or zero trials or attempts.
    pub fn build(self) -> Result<GrowthConfig, GrowthError> {
        let config = self.config;
        if config.bifurcation_tests < MIN_BIFURCATION_TESTS {
            return Err(GrowthError::InvalidConfig(format!(
                "bifurcation tests must be at least {MIN_BIFURCATION_TESTS}, got {}",
                config.bifurcation_tests
            )));
        }
        if !(config.dlim_reduction_factor > 0.0 && config.dlim_reduction_factor < 1.0) {
            return Err(GrowthError::InvalidConfig(format!(
                "distance limit reduction factor must lie in (0, 1), got {}",
                config.dlim_reduction_factor
            )));
        }
        if config.dlim_correction_factor <= 0.0 {
            return Err(GrowthError::InvalidConfig(format!(
                "distance limit correction factor must be positive, got {}",
                config.dlim_correction_factor
            )));
        }
        if config.terminal_trials == 0 || config.max_attempts == 0 {
            return Err(GrowthError::InvalidConfig("trials and attempts must be positive".to_string()));
        }
        Ok(config)
    }
}
