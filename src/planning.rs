//! The planning engine, which builds production plans for a given emission function.
use crate::demand::{expected_demand, sample_scenarios};
use crate::emission::{EmissionFunction, EmissionShape};
use crate::error::PlanningResult;
use crate::model::{ModelParameters, ScenarioPolicy};
use crate::units::Quantity;
use log::{debug, info};
use rayon::prelude::*;

mod cap;
pub use cap::CapStatus;
use cap::plan_within_cap;
mod decision;
use decision::{Planner, ProductionSearch};
mod metrics;
use metrics::evaluate_plan;
mod solution;
pub use solution::{Costs, ScenarioOutcome, Solution};

/// Solves production planning problems for a fixed set of parameters.
///
/// The engine holds no mutable state, so it can be shared between threads and solved any number
/// of times. Each call returns a freshly built [`Solution`].
#[derive(Debug, Clone)]
pub struct PlanningEngine {
    params: ModelParameters,
}

impl PlanningEngine {
    /// Create a new engine, checking that the parameters are valid
    pub fn new(params: ModelParameters) -> PlanningResult<Self> {
        params.validate()?;

        Ok(Self { params })
    }

    /// The parameters this engine plans with
    pub fn parameters(&self) -> &ModelParameters {
        &self.params
    }

    /// The emission function of the given shape, using this engine's coefficients
    pub fn emission_function(&self, shape: EmissionShape) -> EmissionFunction {
        EmissionFunction::new(shape, self.params.alpha, self.params.beta)
    }

    /// Build the optimal production plan for an emission shape.
    ///
    /// # Arguments
    ///
    /// * `shape` - Functional form of the emission curve
    /// * `production_levels` - If given, each period must produce one of these levels; otherwise
    ///   production can take any value between `min_production` and `capacity`
    ///
    /// # Returns
    ///
    /// The solution, or an error if the inputs are invalid, the emission cap cannot be met or the
    /// solver fails
    pub fn solve(
        &self,
        shape: EmissionShape,
        production_levels: Option<&[Quantity]>,
    ) -> PlanningResult<Solution> {
        let params = &self.params;
        let function = self.emission_function(shape);
        let search = ProductionSearch::new(params, production_levels)?;
        let planner = Planner::new(params, function, &search);

        info!(
            "Planning {} periods with {shape} emissions{}",
            params.horizon,
            if search.is_continuous() {
                String::new()
            } else {
                " over candidate production levels".to_string()
            }
        );

        let nominal_demand = expected_demand(params);
        let nominal = plan_within_cap(&planner, &nominal_demand.demand)?;
        debug!("Emission cap status for expected demand: {:?}", nominal.status);
        let nominal_outcome =
            evaluate_plan(params, &function, nominal_demand, nominal.production.clone());
        let solution = Solution::from_nominal(shape, nominal_outcome, nominal.status);

        let Some(variation) = params.demand_uncertainty else {
            return Ok(solution);
        };

        let scenarios = sample_scenarios(params, variation)?;
        info!(
            "Evaluating {} demand scenarios ({} policy)",
            scenarios.len(),
            match params.scenario_policy {
                ScenarioPolicy::Replanning => "replanning",
                ScenarioPolicy::Commitment => "commitment",
            }
        );
        let outcomes = scenarios
            .into_par_iter()
            .map(|scenario| {
                let production = match params.scenario_policy {
                    ScenarioPolicy::Replanning => {
                        plan_within_cap(&planner, &scenario.demand)?.production
                    }
                    ScenarioPolicy::Commitment => nominal.production.clone(),
                };
                Ok(evaluate_plan(params, &function, scenario, production))
            })
            .collect::<PlanningResult<Vec<_>>>()?;

        Ok(solution.with_scenarios(outcomes))
    }

    /// As [`PlanningEngine::solve`], looking up the emission shape by name
    pub fn solve_named(
        &self,
        shape: &str,
        production_levels: Option<&[Quantity]>,
    ) -> PlanningResult<Solution> {
        self.solve(EmissionShape::from_name(shape)?, production_levels)
    }
}
