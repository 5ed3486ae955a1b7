//! Per-period production decisions.
//!
//! Each period trades production and emission cost against penalties for missing (or overshooting)
//! the period's net requirement. Periods only interact through inventory, so a plan is built by
//! deciding one period at a time and carrying inventory forward.
use crate::emission::{Curvature, EmissionFunction};
use crate::error::{PlanningError, PlanningResult, ensure_config};
use crate::model::ModelParameters;
use crate::units::{Dimensionless, Emissions, Money, MoneyPerEmissions, Quantity};
use itertools::Itertools;
use log::warn;

/// Relative width of the bracket at which bisection is considered converged
const CONVERGENCE_TOLERANCE: f64 = 1e-10;

/// Which production quantities a period may choose from
#[derive(Debug, Clone, PartialEq)]
pub enum ProductionSearch {
    /// Any quantity between `min_production` and `capacity`
    Continuous,
    /// Only the given levels (sorted, unique and within bounds)
    Candidates(Vec<Quantity>),
}

impl ProductionSearch {
    /// Build the search space from optional candidate production levels.
    ///
    /// Candidates are sorted and de-duplicated. Levels outside `[min_production, capacity]` are
    /// dropped with a warning.
    pub fn new(params: &ModelParameters, levels: Option<&[Quantity]>) -> PlanningResult<Self> {
        let Some(levels) = levels else {
            return Ok(Self::Continuous);
        };

        for level in levels {
            ensure_config!(
                level.is_finite() && *level >= Quantity(0.0),
                "Production levels must be finite and non-negative, got {level}"
            );
        }

        let (admissible, rejected): (Vec<_>, Vec<_>) = levels
            .iter()
            .copied()
            .sorted_by(|a, b| a.value().total_cmp(&b.value()))
            .dedup()
            .partition(|level| (params.min_production..=params.capacity).contains(level));
        if !rejected.is_empty() {
            warn!(
                "Ignoring {} production level(s) outside [{}, {}]: {}",
                rejected.len(),
                params.min_production,
                params.capacity,
                rejected.iter().join(", ")
            );
        }
        ensure_config!(
            !admissible.is_empty(),
            "No production levels lie between min_production ({}) and capacity ({})",
            params.min_production,
            params.capacity
        );

        Ok(Self::Candidates(admissible))
    }

    /// The lowest quantity a period can produce
    pub fn floor(&self, params: &ModelParameters) -> Quantity {
        match self {
            Self::Continuous => params.min_production,
            Self::Candidates(levels) => levels[0],
        }
    }

    /// Whether quantities may take any value in a range
    pub fn is_continuous(&self) -> bool {
        matches!(self, Self::Continuous)
    }
}

/// Chooses production quantities for one emission function and search space
pub struct Planner<'a> {
    params: &'a ModelParameters,
    function: EmissionFunction,
    search: &'a ProductionSearch,
}

impl<'a> Planner<'a> {
    /// Create a new [`Planner`]
    pub fn new(
        params: &'a ModelParameters,
        function: EmissionFunction,
        search: &'a ProductionSearch,
    ) -> Self {
        Self {
            params,
            function,
            search,
        }
    }

    /// The model parameters
    pub fn params(&self) -> &ModelParameters {
        self.params
    }

    /// The emission function being planned for
    pub fn function(&self) -> &EmissionFunction {
        &self.function
    }

    /// The space of admissible quantities
    pub fn search(&self) -> &ProductionSearch {
        self.search
    }

    /// Cost of producing `quantity` in a period with net requirement `requirement`
    fn objective(
        &self,
        quantity: Quantity,
        requirement: Quantity,
        price: MoneyPerEmissions,
    ) -> Money {
        let zero = Quantity(0.0);
        let shortfall = (requirement - quantity).max(zero);
        let surplus = (quantity - requirement).max(zero);

        self.params.unit_production_cost * quantity
            + price * self.function.evaluate(quantity)
            + self.params.shortage_cost * shortfall
            + self.params.holding_cost * surplus
    }

    /// Derivative of the objective for quantities below the requirement
    fn slope(&self, quantity: Quantity, price: MoneyPerEmissions) -> f64 {
        (self.params.unit_production_cost - self.params.shortage_cost
            + price * self.function.marginal(quantity))
        .value()
    }

    /// Choose the production quantity for one period.
    ///
    /// # Arguments
    ///
    /// * `requirement` - Demand not covered by inventory carried into the period
    /// * `price` - Effective emission price, including any cap multiplier
    pub fn decide(
        &self,
        requirement: Quantity,
        price: MoneyPerEmissions,
    ) -> PlanningResult<Quantity> {
        match self.search {
            ProductionSearch::Continuous => self.decide_continuous(requirement, price),
            ProductionSearch::Candidates(levels) => {
                self.decide_from_candidates(levels, requirement, price)
            }
        }
    }

    fn decide_continuous(
        &self,
        requirement: Quantity,
        price: MoneyPerEmissions,
    ) -> PlanningResult<Quantity> {
        // Producing beyond the requirement only adds cost
        let lower = self.params.min_production;
        let upper = requirement.min(self.params.capacity);
        if upper <= lower {
            return Ok(lower);
        }

        match self.function.curvature() {
            Curvature::Convex => {
                let slope_at = |quantity| {
                    let slope = self.slope(quantity, price);
                    if slope.is_nan() {
                        Err(PlanningError::Numerical(format!(
                            "Marginal cost is not a number at production level {quantity}"
                        )))
                    } else {
                        Ok(slope)
                    }
                };
                if slope_at(lower)? >= 0.0 {
                    return Ok(lower);
                }
                if slope_at(upper)? <= 0.0 {
                    return Ok(upper);
                }

                let (lo, hi) = bisect(
                    lower.value(),
                    upper.value(),
                    self.params.max_iterations,
                    |q| Ok(slope_at(Quantity(q))? >= 0.0),
                )?;
                Ok(Quantity(0.5 * (lo + hi)))
            }
            // The objective is linear or concave on the interval, so an end point is optimal
            Curvature::Linear | Curvature::Concave => {
                let cost_lower = self.checked_objective(lower, requirement, price)?;
                let cost_upper = self.checked_objective(upper, requirement, price)?;
                Ok(if cost_upper < cost_lower { upper } else { lower })
            }
        }
    }

    fn decide_from_candidates(
        &self,
        levels: &[Quantity],
        requirement: Quantity,
        price: MoneyPerEmissions,
    ) -> PlanningResult<Quantity> {
        let mut best = (levels[0], self.checked_objective(levels[0], requirement, price)?);
        for &level in &levels[1..] {
            let cost = self.checked_objective(level, requirement, price)?;
            // Strict comparison, so ties go to the smaller level
            if cost < best.1 {
                best = (level, cost);
            }
        }

        Ok(best.0)
    }

    fn checked_objective(
        &self,
        quantity: Quantity,
        requirement: Quantity,
        price: MoneyPerEmissions,
    ) -> PlanningResult<Money> {
        let cost = self.objective(quantity, requirement, price);
        if cost.value().is_nan() {
            return Err(PlanningError::Numerical(format!(
                "Objective is not a number at production level {quantity}"
            )));
        }

        Ok(cost)
    }

    /// Plan production for every period of a demand trajectory.
    ///
    /// Inventory starts at `initial_inventory` and evolves with lost sales, i.e. unmet demand is
    /// not carried forward.
    pub fn plan(
        &self,
        demand: &[Quantity],
        price: MoneyPerEmissions,
    ) -> PlanningResult<Vec<Quantity>> {
        let zero = Quantity(0.0);
        let mut inventory = self.params.initial_inventory;
        demand
            .iter()
            .map(|&period_demand| {
                let requirement = (period_demand - inventory).max(zero);
                let quantity = self.decide(requirement, price)?;
                inventory = (inventory + quantity - period_demand).max(zero);
                Ok(quantity)
            })
            .collect()
    }

    /// Every period producing the lowest admissible quantity
    pub fn floor_plan(&self, horizon: usize) -> Vec<Quantity> {
        vec![self.search.floor(self.params); horizon]
    }

    /// Lowest total emissions any plan over `horizon` periods can achieve
    pub fn minimum_emissions(&self, horizon: usize) -> Emissions {
        self.function.evaluate(self.search.floor(self.params)) * Dimensionless(horizon as f64)
    }

    /// Total emissions of a plan
    pub fn total_emissions(&self, plan: &[Quantity]) -> Emissions {
        plan.iter().map(|&q| self.function.evaluate(q)).sum()
    }
}

/// Shrink the bracket `[lower, upper]` around the point where `is_upper` switches to true.
///
/// `is_upper` must be false at `lower`, true at `upper` and monotonic in between.
///
/// # Returns
///
/// The final bracket, or a numerical error if it fails to converge within `max_iterations` steps
pub fn bisect<F>(
    mut lower: f64,
    mut upper: f64,
    max_iterations: u32,
    mut is_upper: F,
) -> PlanningResult<(f64, f64)>
where
    F: FnMut(f64) -> PlanningResult<bool>,
{
    for _ in 0..max_iterations {
        if upper - lower <= CONVERGENCE_TOLERANCE * upper.abs().max(1.0) {
            return Ok((lower, upper));
        }

        let mid = 0.5 * (lower + upper);
        if is_upper(mid)? {
            upper = mid;
        } else {
            lower = mid;
        }
    }

    Err(PlanningError::Numerical(format!(
        "Bisection did not converge within {max_iterations} iterations"
    )))
}
