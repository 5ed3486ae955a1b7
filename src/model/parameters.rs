//! Defines the `ModelParameters` struct, which represents the contents of `model.toml`.
use crate::error::{PlanningResult, ensure_config};
use crate::input::{input_err_msg, read_toml};
use crate::units::{Dimensionless, Emissions, MoneyPerEmissions, MoneyPerQuantity, Quantity};
use anyhow::{Context, Result};
use serde::Deserialize;
use serde_string_enum::DeserializeLabeledStringEnum;
use std::path::Path;

const MODEL_PARAMETERS_FILE_NAME: &str = "model.toml";

macro_rules! define_unit_param_default {
    ($name:ident, $type: ty, $value: expr) => {
        fn $name() -> $type {
            <$type>::new($value)
        }
    };
}

macro_rules! define_param_default {
    ($name:ident, $type: ty, $value: expr) => {
        fn $name() -> $type {
            $value
        }
    };
}

define_param_default!(default_horizon, u32, 12);
define_param_default!(default_alpha, f64, 0.15);
define_param_default!(default_beta, f64, 0.003);
define_unit_param_default!(default_capacity, Quantity, 200.0);
define_unit_param_default!(default_min_production, Quantity, 0.0);
define_unit_param_default!(default_demand_mean, Quantity, 150.0);
define_unit_param_default!(default_demand_std, Quantity, 30.0);
define_unit_param_default!(default_initial_inventory, Quantity, 0.0);
define_unit_param_default!(default_unit_production_cost, MoneyPerQuantity, 10.0);
define_unit_param_default!(default_shortage_cost, MoneyPerQuantity, 200.0);
define_unit_param_default!(default_holding_cost, MoneyPerQuantity, 2.0);
define_unit_param_default!(default_emission_cost, MoneyPerEmissions, 50.0);
define_param_default!(default_num_scenarios, u32, 200);
define_param_default!(default_seed, u64, 42);
define_param_default!(default_max_iterations, u32, 200);
define_param_default!(default_tolerance, f64, 1e-6);

/// Parameters for a single planning problem.
///
/// Every field has a default, so a model file only needs to list the values it changes.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ModelParameters {
    /// Number of periods in the planning horizon
    #[serde(default = "default_horizon")]
    pub horizon: u32,
    /// Scale coefficient of the emission function
    #[serde(default = "default_alpha")]
    pub alpha: f64,
    /// Rate coefficient of the emission function
    #[serde(default = "default_beta")]
    pub beta: f64,
    /// Maximum production per period
    #[serde(default = "default_capacity")]
    pub capacity: Quantity,
    /// Minimum production per period (e.g. to keep a furnace running)
    #[serde(default = "default_min_production")]
    pub min_production: Quantity,
    /// Expected demand per period
    #[serde(default = "default_demand_mean")]
    pub demand_mean: Quantity,
    /// Nominal standard deviation of demand per period.
    ///
    /// Sampled scenarios take their spread from `demand_uncertainty` instead, so outside the
    /// industry case-study sweep this value is informational only.
    #[serde(default = "default_demand_std")]
    pub demand_std: Quantity,
    /// Stock available before the first period
    #[serde(default = "default_initial_inventory")]
    pub initial_inventory: Quantity,
    /// Cost of producing one unit
    #[serde(default = "default_unit_production_cost")]
    pub unit_production_cost: MoneyPerQuantity,
    /// Penalty for each unit of demand which goes unmet.
    ///
    /// Only used to drive production decisions; it is not part of the reported costs.
    #[serde(default = "default_shortage_cost")]
    pub shortage_cost: MoneyPerQuantity,
    /// Penalty for each unit produced beyond what a period requires.
    ///
    /// Only used to drive production decisions; it is not part of the reported costs.
    #[serde(default = "default_holding_cost")]
    pub holding_cost: MoneyPerQuantity,
    /// Price paid per unit of emissions
    #[serde(default = "default_emission_cost")]
    pub emission_cost: MoneyPerEmissions,
    /// Hard ceiling on total emissions over the horizon
    #[serde(default)]
    pub emission_cap: Option<Emissions>,
    /// Coefficient of variation of demand. If set, the problem is solved over sampled scenarios.
    #[serde(default)]
    pub demand_uncertainty: Option<Dimensionless>,
    /// How production decisions respond to sampled demand
    #[serde(default)]
    pub scenario_policy: ScenarioPolicy,
    /// Number of demand scenarios to sample
    #[serde(default = "default_num_scenarios")]
    pub num_scenarios: u32,
    /// Seed for the scenario generator
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Iteration bound for the solver's search routines
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    /// Absolute tolerance when comparing emissions against the cap
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
}

/// How production responds to demand scenarios
#[derive(DeserializeLabeledStringEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScenarioPolicy {
    /// Each scenario is re-planned with knowledge of its own demand
    #[default]
    #[string = "replanning"]
    Replanning,
    /// A single plan, optimal for expected demand, is evaluated against every scenario
    #[string = "commitment"]
    Commitment,
}

impl Default for ModelParameters {
    fn default() -> Self {
        Self {
            horizon: default_horizon(),
            alpha: default_alpha(),
            beta: default_beta(),
            capacity: default_capacity(),
            min_production: default_min_production(),
            demand_mean: default_demand_mean(),
            demand_std: default_demand_std(),
            initial_inventory: default_initial_inventory(),
            unit_production_cost: default_unit_production_cost(),
            shortage_cost: default_shortage_cost(),
            holding_cost: default_holding_cost(),
            emission_cost: default_emission_cost(),
            emission_cap: None,
            demand_uncertainty: None,
            scenario_policy: ScenarioPolicy::default(),
            num_scenarios: default_num_scenarios(),
            seed: default_seed(),
            max_iterations: default_max_iterations(),
            tolerance: default_tolerance(),
        }
    }
}

/// Check that a value is finite and not negative
fn check_non_negative(name: &str, value: f64) -> PlanningResult<()> {
    ensure_config!(
        value.is_finite() && value >= 0.0,
        "{name} must be a finite non-negative number, got {value}"
    );

    Ok(())
}

/// Check that a value is finite and strictly positive
fn check_positive(name: &str, value: f64) -> PlanningResult<()> {
    ensure_config!(
        value.is_finite() && value > 0.0,
        "{name} must be a finite number greater than zero, got {value}"
    );

    Ok(())
}

/// Check that a count is not zero
fn check_nonzero(name: &str, value: u64) -> PlanningResult<()> {
    ensure_config!(value > 0, "{name} cannot be zero");

    Ok(())
}

impl ModelParameters {
    /// Read a model file from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `model_dir` - Folder containing model configuration files
    ///
    /// # Returns
    ///
    /// The model file contents as a [`ModelParameters`] struct or an error if the file is invalid
    pub fn from_path<P: AsRef<Path>>(model_dir: P) -> Result<ModelParameters> {
        let file_path = model_dir.as_ref().join(MODEL_PARAMETERS_FILE_NAME);
        let model_params: ModelParameters = read_toml(&file_path)?;

        model_params
            .validate()
            .with_context(|| input_err_msg(&file_path))?;

        Ok(model_params)
    }

    /// Check that all parameters are within their valid ranges
    pub fn validate(&self) -> PlanningResult<()> {
        check_nonzero("horizon", self.horizon.into())?;
        check_non_negative("alpha", self.alpha)?;
        check_non_negative("beta", self.beta)?;
        check_positive("capacity", self.capacity.value())?;
        check_non_negative("min_production", self.min_production.value())?;
        ensure_config!(
            self.min_production <= self.capacity,
            "min_production ({}) cannot exceed capacity ({})",
            self.min_production,
            self.capacity
        );
        check_non_negative("demand_mean", self.demand_mean.value())?;
        check_non_negative("demand_std", self.demand_std.value())?;
        check_non_negative("initial_inventory", self.initial_inventory.value())?;
        check_non_negative("unit_production_cost", self.unit_production_cost.value())?;
        check_non_negative("shortage_cost", self.shortage_cost.value())?;
        check_non_negative("holding_cost", self.holding_cost.value())?;
        check_non_negative("emission_cost", self.emission_cost.value())?;
        if let Some(cap) = self.emission_cap {
            check_non_negative("emission_cap", cap.value())?;
        }
        if let Some(uncertainty) = self.demand_uncertainty {
            check_non_negative("demand_uncertainty", uncertainty.value())?;
        }
        check_nonzero("num_scenarios", self.num_scenarios.into())?;
        check_nonzero("max_iterations", self.max_iterations.into())?;
        check_positive("tolerance", self.tolerance)?;

        Ok(())
    }

    /// The coefficient of variation implied by `demand_std` and `demand_mean`
    pub fn demand_variation(&self) -> Dimensionless {
        if self.demand_mean.value() > 0.0 {
            self.demand_std / self.demand_mean
        } else {
            Dimensionless(0.0)
        }
    }

    /// Set the number of planning periods
    pub fn with_horizon(mut self, horizon: u32) -> Self {
        self.horizon = horizon;
        self
    }

    /// Set the emission function coefficients
    pub fn with_coefficients(mut self, alpha: f64, beta: f64) -> Self {
        self.alpha = alpha;
        self.beta = beta;
        self
    }

    /// Set the production capacity per period
    pub fn with_capacity(mut self, capacity: Quantity) -> Self {
        self.capacity = capacity;
        self
    }

    /// Set the minimum production per period
    pub fn with_min_production(mut self, min_production: Quantity) -> Self {
        self.min_production = min_production;
        self
    }

    /// Set the mean and standard deviation of per-period demand
    pub fn with_demand(mut self, mean: Quantity, std: Quantity) -> Self {
        self.demand_mean = mean;
        self.demand_std = std;
        self
    }

    /// Set the stock available before the first period
    pub fn with_initial_inventory(mut self, inventory: Quantity) -> Self {
        self.initial_inventory = inventory;
        self
    }

    /// Set the cost of producing one unit
    pub fn with_unit_production_cost(mut self, cost: MoneyPerQuantity) -> Self {
        self.unit_production_cost = cost;
        self
    }

    /// Set the penalty per unit of unmet demand
    pub fn with_shortage_cost(mut self, cost: MoneyPerQuantity) -> Self {
        self.shortage_cost = cost;
        self
    }

    /// Set the penalty per unit produced beyond a period's requirement
    pub fn with_holding_cost(mut self, cost: MoneyPerQuantity) -> Self {
        self.holding_cost = cost;
        self
    }

    /// Set the price per unit of emissions
    pub fn with_emission_cost(mut self, cost: MoneyPerEmissions) -> Self {
        self.emission_cost = cost;
        self
    }

    /// Impose a cap on total emissions over the horizon
    pub fn with_emission_cap(mut self, cap: Emissions) -> Self {
        self.emission_cap = Some(cap);
        self
    }

    /// Solve over sampled demand scenarios with the given coefficient of variation
    pub fn with_demand_uncertainty(mut self, uncertainty: Dimensionless) -> Self {
        self.demand_uncertainty = Some(uncertainty);
        self
    }

    /// Set how production responds to sampled demand
    pub fn with_scenario_policy(mut self, policy: ScenarioPolicy) -> Self {
        self.scenario_policy = policy;
        self
    }

    /// Set the number of sampled scenarios
    pub fn with_num_scenarios(mut self, num_scenarios: u32) -> Self {
        self.num_scenarios = num_scenarios;
        self
    }

    /// Set the scenario generator's seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the solver's iteration bound
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlanningError;
    use rstest::rstest;
    use std::fmt::Display;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    /// Helper function to assert validation result based on expected validity
    fn assert_validation_result<U: Display>(
        result: PlanningResult<()>,
        expected_valid: bool,
        value: U,
        expected_error_fragment: &str,
    ) {
        if expected_valid {
            assert!(
                result.is_ok(),
                "Expected value {} to be valid, but got error: {:?}",
                value,
                result.err()
            );
        } else {
            let Err(PlanningError::Configuration(message)) = result else {
                panic!("Expected value {value} to be rejected as a configuration error");
            };
            assert!(
                message.contains(expected_error_fragment),
                "Error message should mention the validation constraint, got: {message}",
            );
        }
    }

    #[test]
    fn test_default_parameters_are_valid() {
        assert!(ModelParameters::default().validate().is_ok());
    }

    #[test]
    fn test_model_params_from_path() {
        let dir = tempdir().unwrap();
        {
            let mut file = File::create(dir.path().join(MODEL_PARAMETERS_FILE_NAME)).unwrap();
            writeln!(file, "capacity = 300.0").unwrap();
            writeln!(file, "emission_cap = 2500.0").unwrap();
            writeln!(file, "demand_uncertainty = 0.2").unwrap();
            writeln!(file, "scenario_policy = \"commitment\"").unwrap();
        }

        let model_params = ModelParameters::from_path(dir.path()).unwrap();
        assert_eq!(
            model_params,
            ModelParameters::default()
                .with_capacity(Quantity(300.0))
                .with_emission_cap(Emissions(2500.0))
                .with_demand_uncertainty(Dimensionless(0.2))
                .with_scenario_policy(ScenarioPolicy::Commitment)
        );
    }

    #[test]
    fn test_model_params_from_path_empty_file() {
        let dir = tempdir().unwrap();
        File::create(dir.path().join(MODEL_PARAMETERS_FILE_NAME)).unwrap();

        assert_eq!(
            ModelParameters::from_path(dir.path()).unwrap(),
            ModelParameters::default()
        );
    }

    #[test]
    fn test_model_params_from_path_invalid() {
        let dir = tempdir().unwrap();
        {
            let mut file = File::create(dir.path().join(MODEL_PARAMETERS_FILE_NAME)).unwrap();
            writeln!(file, "capacity = 0.0").unwrap();
        }

        let err = ModelParameters::from_path(dir.path()).unwrap_err();
        assert!(err.to_string().starts_with("Error reading"));
        assert_eq!(
            err.root_cause().to_string(),
            "Invalid configuration: capacity must be a finite number greater than zero, got 0"
        );
    }

    #[rstest]
    #[case("commitment")]
    #[case("Commitment")]
    #[case("COMMITMENT")]
    fn test_model_params_from_path_policy_case_insensitive(#[case] label: &str) {
        let dir = tempdir().unwrap();
        {
            let mut file = File::create(dir.path().join(MODEL_PARAMETERS_FILE_NAME)).unwrap();
            writeln!(file, "scenario_policy = \"{label}\"").unwrap();
        }

        assert_eq!(
            ModelParameters::from_path(dir.path())
                .unwrap()
                .scenario_policy,
            ScenarioPolicy::Commitment
        );
    }

    #[test]
    fn test_model_params_from_path_unknown_policy() {
        let dir = tempdir().unwrap();
        {
            let mut file = File::create(dir.path().join(MODEL_PARAMETERS_FILE_NAME)).unwrap();
            writeln!(file, "scenario_policy = \"hedging\"").unwrap();
        }

        assert!(ModelParameters::from_path(dir.path()).is_err());
    }

    #[rstest]
    #[case(200.0, true)] // Default
    #[case(1e-10, true)] // Valid very small positive value
    #[case(0.0, false)] // Invalid: exactly zero
    #[case(-1.0, false)] // Invalid: negative value
    #[case(f64::INFINITY, false)] // Invalid: infinite value
    #[case(f64::NAN, false)] // Invalid: NaN value
    fn test_validate_capacity(#[case] value: f64, #[case] expected_valid: bool) {
        let params = ModelParameters::default().with_capacity(Quantity(value));
        assert_validation_result(
            params.validate(),
            expected_valid,
            value,
            "capacity must be a finite number greater than zero",
        );
    }

    #[rstest]
    #[case(0.0, true)] // Free emissions
    #[case(50.0, true)] // Default
    #[case(-1e-10, false)] // Invalid: very small negative value
    #[case(f64::NEG_INFINITY, false)] // Invalid: negative infinite value
    fn test_validate_emission_cost(#[case] value: f64, #[case] expected_valid: bool) {
        let params = ModelParameters::default().with_emission_cost(MoneyPerEmissions(value));
        assert_validation_result(
            params.validate(),
            expected_valid,
            value,
            "emission_cost must be a finite non-negative number",
        );
    }

    #[rstest]
    #[case(0.15, 0.003, true)]
    #[case(0.0, 0.0, true)]
    #[case(-0.15, 0.003, false)]
    #[case(0.15, -0.003, false)]
    fn test_validate_coefficients(
        #[case] alpha: f64,
        #[case] beta: f64,
        #[case] expected_valid: bool,
    ) {
        let params = ModelParameters::default().with_coefficients(alpha, beta);
        assert_validation_result(
            params.validate(),
            expected_valid,
            format!("alpha={alpha}, beta={beta}"),
            "must be a finite non-negative number",
        );
    }

    #[test]
    fn test_validate_min_production_above_capacity() {
        let params = ModelParameters::default().with_min_production(Quantity(250.0));
        assert_validation_result(
            params.validate(),
            false,
            250.0,
            "min_production (250) cannot exceed capacity (200)",
        );
    }

    #[rstest]
    #[case(ModelParameters::default().with_horizon(0), "horizon cannot be zero")]
    #[case(ModelParameters::default().with_num_scenarios(0), "num_scenarios cannot be zero")]
    #[case(ModelParameters::default().with_max_iterations(0), "max_iterations cannot be zero")]
    #[case(
        ModelParameters::default().with_emission_cap(Emissions(-5.0)),
        "emission_cap must be a finite non-negative number"
    )]
    #[case(
        ModelParameters::default().with_demand_uncertainty(Dimensionless(f64::NAN)),
        "demand_uncertainty must be a finite non-negative number"
    )]
    fn test_validate_invalid(#[case] params: ModelParameters, #[case] fragment: &str) {
        assert_validation_result(params.validate(), false, fragment, fragment);
    }

    #[rstest]
    #[case(150.0, 30.0, 0.2)]
    #[case(200.0, 40.0, 0.2)]
    #[case(0.0, 30.0, 0.0)] // No demand
    fn test_demand_variation(#[case] mean: f64, #[case] std: f64, #[case] expected: f64) {
        let params = ModelParameters::default().with_demand(Quantity(mean), Quantity(std));
        assert_eq!(params.demand_variation(), Dimensionless(expected));
    }
}
