//! The results returned by a solve.
use super::cap::CapStatus;
use super::metrics::mean_and_variance;
use crate::emission::EmissionShape;
use crate::units::{Dimensionless, Emissions, Money, Quantity};
use serde::Serialize;

/// Breakdown of the cost of a plan
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Costs {
    /// Cost of producing every unit in the plan
    pub production: Money,
    /// Cost of the plan's emissions
    pub emission: Money,
    /// Sum of production and emission cost
    pub total: Money,
}

impl Costs {
    /// Create a new [`Costs`], computing the total
    pub fn new(production: Money, emission: Money) -> Self {
        Self {
            production,
            emission,
            total: production + emission,
        }
    }
}

/// The result of applying a production plan to one demand scenario
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioOutcome {
    /// The demand the plan was evaluated against
    pub demand: Vec<Quantity>,
    /// Production in each period
    pub production_plan: Vec<Quantity>,
    /// Emissions in each period
    pub emissions: Vec<Emissions>,
    /// Sum of emissions over the horizon
    pub total_emissions: Emissions,
    /// Cost breakdown
    pub costs: Costs,
    /// Fraction of periods in which demand was met in full
    pub service_level: Dimensionless,
    /// Mean end-of-period inventory
    pub avg_inventory: Quantity,
    /// Demand lost over the horizon
    pub unmet_demand: Quantity,
}

/// The result of a solve.
///
/// Without demand uncertainty every field describes the plan for expected demand and the
/// uncertainty fields are empty. With uncertainty, the plan and cost fields still describe the plan
/// for expected demand, while `service_level`, `avg_inventory` and `unmet_demand` are averages over
/// the sampled scenarios.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Solution {
    /// The emission function planned for
    pub shape: EmissionShape,
    /// Production in each period
    pub production_plan: Vec<Quantity>,
    /// Emissions in each period
    pub emissions: Vec<Emissions>,
    /// Sum of emissions over the horizon
    pub total_emissions: Emissions,
    /// Cost breakdown
    pub costs: Costs,
    /// Fraction of periods in which demand was met in full
    pub service_level: Dimensionless,
    /// Mean end-of-period inventory
    pub avg_inventory: Quantity,
    /// Demand lost over the horizon
    pub unmet_demand: Quantity,
    /// How the emission cap affected the plan
    pub cap_status: CapStatus,
    /// Mean total cost over scenarios
    pub expected_cost: Option<Money>,
    /// Mean total emissions over scenarios
    pub expected_emissions: Option<Emissions>,
    /// Sample variance of total cost over scenarios
    pub cost_variance: Option<f64>,
    /// Sample variance of total emissions over scenarios
    pub emission_variance: Option<f64>,
    /// Outcome for each sampled scenario, in sampling order
    pub scenarios: Vec<ScenarioOutcome>,
}

impl Solution {
    /// Build a solution from the outcome of the plan for expected demand
    pub fn from_nominal(
        shape: EmissionShape,
        nominal: ScenarioOutcome,
        cap_status: CapStatus,
    ) -> Self {
        Self {
            shape,
            production_plan: nominal.production_plan,
            emissions: nominal.emissions,
            total_emissions: nominal.total_emissions,
            costs: nominal.costs,
            service_level: nominal.service_level,
            avg_inventory: nominal.avg_inventory,
            unmet_demand: nominal.unmet_demand,
            cap_status,
            expected_cost: None,
            expected_emissions: None,
            cost_variance: None,
            emission_variance: None,
            scenarios: Vec::new(),
        }
    }

    /// Add statistics over sampled scenarios
    pub fn with_scenarios(mut self, scenarios: Vec<ScenarioOutcome>) -> Self {
        let (expected_cost, cost_variance) =
            mean_and_variance(scenarios.iter().map(|s| s.costs.total.value()));
        let (expected_emissions, emission_variance) =
            mean_and_variance(scenarios.iter().map(|s| s.total_emissions.value()));
        let (service_level, _) =
            mean_and_variance(scenarios.iter().map(|s| s.service_level.value()));
        let (avg_inventory, _) =
            mean_and_variance(scenarios.iter().map(|s| s.avg_inventory.value()));
        let (unmet_demand, _) =
            mean_and_variance(scenarios.iter().map(|s| s.unmet_demand.value()));

        self.expected_cost = Some(Money(expected_cost));
        self.expected_emissions = Some(Emissions(expected_emissions));
        self.cost_variance = Some(cost_variance);
        self.emission_variance = Some(emission_variance);
        self.service_level = Dimensionless(service_level);
        self.avg_inventory = Quantity(avg_inventory);
        self.unmet_demand = Quantity(unmet_demand);
        self.scenarios = scenarios;
        self
    }
}
