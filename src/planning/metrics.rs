//! Performance metrics for a production plan applied to realised demand.
use super::solution::{Costs, ScenarioOutcome};
use crate::demand::Scenario;
use crate::emission::EmissionFunction;
use crate::model::ModelParameters;
use crate::units::{Dimensionless, Emissions, Quantity};
use itertools::Itertools;

/// Shortfalls smaller than this are treated as demand met
const SHORTFALL_TOLERANCE: f64 = 1e-9;

/// Apply a production plan to a demand scenario.
///
/// Inventory starts at `initial_inventory` and evolves with lost sales.
///
/// # Arguments
///
/// * `params` - Model parameters
/// * `function` - Emission function for the plan
/// * `scenario` - Realised demand
/// * `production` - Production in each period (same length as the scenario)
pub fn evaluate_plan(
    params: &ModelParameters,
    function: &EmissionFunction,
    scenario: Scenario,
    production: Vec<Quantity>,
) -> ScenarioOutcome {
    let zero = Quantity(0.0);
    let emissions = production
        .iter()
        .map(|&quantity| function.evaluate(quantity))
        .collect_vec();
    let total_emissions: Emissions = emissions.iter().sum();
    let total_production: Quantity = production.iter().sum();

    let mut inventory = params.initial_inventory;
    let mut inventory_sum = zero;
    let mut unmet_demand = zero;
    let mut periods_met = 0usize;
    for (&quantity, &demand) in production.iter().zip(&scenario.demand) {
        let shortfall = (demand - inventory - quantity).max(zero);
        if shortfall.value() <= SHORTFALL_TOLERANCE {
            periods_met += 1;
        }
        unmet_demand += shortfall;
        inventory = (inventory + quantity - demand).max(zero);
        inventory_sum += inventory;
    }

    let periods = Dimensionless(production.len().max(1) as f64);
    let costs = Costs::new(
        params.unit_production_cost * total_production,
        params.emission_cost * total_emissions,
    );

    ScenarioOutcome {
        demand: scenario.demand,
        production_plan: production,
        emissions,
        total_emissions,
        costs,
        service_level: Dimensionless(periods_met as f64) / periods,
        avg_inventory: inventory_sum / periods,
        unmet_demand,
    }
}

/// Sample mean and variance of a sequence of values.
///
/// The variance uses an `n - 1` denominator and is zero for fewer than two values. The mean of an
/// empty sequence is zero.
pub fn mean_and_variance<I>(values: I) -> (f64, f64)
where
    I: IntoIterator<Item = f64>,
{
    let values = values.into_iter().collect_vec();
    if values.is_empty() {
        return (0.0, 0.0);
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    if values.len() < 2 {
        return (mean, 0.0);
    }

    let variance = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
    (mean, variance)
}
