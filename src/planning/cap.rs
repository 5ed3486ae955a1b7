//! Enforcement of the emission cap.
//!
//! A binding cap is priced in with a multiplier added to the emission cost. The smallest
//! multiplier giving a feasible plan is found by bisection, after which the remaining headroom
//! under the cap is handed back to the periods where extra production emits least.
//!
//! With candidate levels the priced plan can jump between levels as the multiplier moves, so the
//! plan is instead built up from the floor one level at a time. That plan depends only on demand
//! and the cap, never on the emission price.
use super::decision::{Planner, ProductionSearch, bisect};
use crate::error::{PlanningError, PlanningResult};
use crate::units::{Emissions, MoneyPerEmissions, Quantity};
use itertools::Itertools;
use log::debug;
use serde::Serialize;

/// How the emission cap affected a plan
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CapStatus {
    /// No cap was set
    Unconstrained,
    /// The cap was set but the cheapest plan already satisfies it
    Slack,
    /// The cap forced production down
    Binding {
        /// Extra price per unit of emissions needed to meet the cap
        multiplier: MoneyPerEmissions,
    },
    /// The cap equals the lowest achievable emissions, so every period produces at its floor
    AtFloor,
}

/// A production plan together with the effect of the cap on it
#[derive(Debug, Clone, PartialEq)]
pub struct CappedPlan {
    /// Production in each period
    pub production: Vec<Quantity>,
    /// How the cap affected the plan
    pub status: CapStatus,
}

/// Plan production for a demand trajectory, respecting the emission cap if one is set.
///
/// # Arguments
///
/// * `planner` - Planner for the chosen emission function
/// * `demand` - Demand in each period
///
/// # Returns
///
/// The plan and its cap status, or [`PlanningError::Infeasible`] if even the lowest-emitting plan
/// exceeds the cap
pub fn plan_within_cap(planner: &Planner, demand: &[Quantity]) -> PlanningResult<CappedPlan> {
    let params = planner.params();
    let unconstrained = planner.plan(demand, params.emission_cost)?;
    let Some(cap) = params.emission_cap else {
        return Ok(CappedPlan {
            production: unconstrained,
            status: CapStatus::Unconstrained,
        });
    };

    let tolerance = Emissions(params.tolerance);
    if planner.total_emissions(&unconstrained) <= cap + tolerance {
        return Ok(CappedPlan {
            production: unconstrained,
            status: CapStatus::Slack,
        });
    }

    let minimum = planner.minimum_emissions(demand.len());
    if minimum > cap + tolerance {
        return Err(PlanningError::Infeasible { cap, minimum });
    }
    if minimum >= cap - tolerance {
        debug!("Emission cap of {cap} leaves no headroom above minimum emissions");
        return Ok(CappedPlan {
            production: planner.floor_plan(demand.len()),
            status: CapStatus::AtFloor,
        });
    }

    let (below, multiplier) = find_multiplier(planner, demand, cap + tolerance)?;
    debug!("Emission cap of {cap} binds with multiplier {multiplier}");

    let production = match planner.search() {
        ProductionSearch::Continuous => {
            // Plans either side of the threshold
            let feasible = planner.plan(demand, params.emission_cost + multiplier)?;
            let infeasible = planner.plan(demand, params.emission_cost + below)?;
            fill_headroom(planner, feasible, &infeasible, cap)?
        }
        ProductionSearch::Candidates(levels) => {
            // No period is raised above what it would produce if emissions were free
            let target = planner.plan(demand, MoneyPerEmissions(0.0))?;
            step_up_levels(planner, levels, &target, cap)
        }
    };

    Ok(CappedPlan {
        production,
        status: CapStatus::Binding { multiplier },
    })
}

/// Find the smallest extra emission price for which planned emissions stay within `limit`.
///
/// # Returns
///
/// A bracket of multipliers: planned emissions exceed `limit` at the first and do not at the second
fn find_multiplier(
    planner: &Planner,
    demand: &[Quantity],
    limit: Emissions,
) -> PlanningResult<(MoneyPerEmissions, MoneyPerEmissions)> {
    let params = planner.params();
    let is_feasible = |multiplier: f64| -> PlanningResult<bool> {
        let plan = planner.plan(demand, params.emission_cost + MoneyPerEmissions(multiplier))?;
        let total = planner.total_emissions(&plan);
        if total.value().is_nan() {
            return Err(PlanningError::Numerical(
                "Total emissions are not a number".into(),
            ));
        }

        Ok(total <= limit)
    };

    // Double until the plan is feasible
    let mut upper = params.emission_cost.value().max(1.0);
    let mut iterations = 0;
    while !is_feasible(upper)? {
        iterations += 1;
        if iterations >= params.max_iterations || !upper.is_finite() {
            return Err(PlanningError::Numerical(format!(
                "Could not bracket the emission cap multiplier within {} iterations",
                params.max_iterations
            )));
        }
        upper *= 2.0;
    }

    let (lower, upper) = bisect(0.0, upper, params.max_iterations, is_feasible)?;
    Ok((MoneyPerEmissions(lower), MoneyPerEmissions(upper)))
}

/// Raise production in a feasible plan towards a higher-emitting one while staying within `cap`.
///
/// Periods whose extra production emits least per unit are raised first. The last period raised
/// may stop part way, so that emissions meet the cap from below.
fn fill_headroom(
    planner: &Planner,
    mut plan: Vec<Quantity>,
    target: &[Quantity],
    cap: Emissions,
) -> PlanningResult<Vec<Quantity>> {
    let function = planner.function();
    let intensity = |period: usize| {
        let extra = target[period] - plan[period];
        (function.evaluate(target[period]) - function.evaluate(plan[period])) / extra
    };
    let order = (0..plan.len())
        .filter(|&period| target[period] > plan[period])
        .sorted_by(|&a, &b| intensity(a).value().total_cmp(&intensity(b).value()))
        .collect_vec();

    let mut total = planner.total_emissions(&plan);
    for period in order {
        let current = function.evaluate(plan[period]);
        let raised = total - current + function.evaluate(target[period]);
        if raised <= cap {
            plan[period] = target[period];
            total = raised;
            continue;
        }

        let (lower, _) = bisect(
            plan[period].value(),
            target[period].value(),
            planner.params().max_iterations,
            |q| Ok(total - current + function.evaluate(Quantity(q)) > cap),
        )?;
        plan[period] = Quantity(lower);
        break;
    }

    Ok(plan)
}

/// Build a plan within `cap` by raising periods from the floor one candidate level at a time.
///
/// Each step takes the period whose next level adds least emissions per unit (the earliest period
/// on ties). A period stops once it reaches its level in `target` or its next step would breach
/// the cap.
fn step_up_levels(
    planner: &Planner,
    levels: &[Quantity],
    target: &[Quantity],
    cap: Emissions,
) -> Vec<Quantity> {
    let function = planner.function();
    let mut plan = planner.floor_plan(target.len());
    let mut total = planner.total_emissions(&plan);
    let mut blocked = vec![false; plan.len()];

    loop {
        let step = (0..plan.len())
            .filter(|&period| !blocked[period])
            .filter_map(|period| {
                let current = plan[period];
                let next = levels.iter().copied().find(|&level| level > current)?;
                (next <= target[period]).then(|| {
                    let extra = function.evaluate(next) - function.evaluate(current);
                    let intensity = (extra / (next - current)).value();
                    (period, next, extra, intensity)
                })
            })
            .min_by(|a, b| a.3.total_cmp(&b.3));
        let Some((period, next, extra, _)) = step else {
            break;
        };

        if total + extra <= cap {
            plan[period] = next;
            total += extra;
        } else {
            // Total emissions only grow, so this step will never fit
            blocked[period] = true;
        }
    }

    plan
}
