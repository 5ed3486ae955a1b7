//! Parameter sweeps over the planning engine.
//!
//! Each sweep varies a few parameters of a base model, solves every combination in parallel and
//! records the outcome of each point. A failed point is logged and recorded rather than aborting
//! the sweep.
use crate::emission::EmissionShape;
use crate::error::PlanningResult;
use crate::model::ModelParameters;
use crate::planning::{PlanningEngine, Solution};
use crate::units::{Dimensionless, Emissions, MoneyPerEmissions, Quantity};
use indexmap::IndexMap;
use itertools::iproduct;
use log::{info, warn};
use rayon::prelude::*;
use serde::Serialize;
use strum::{Display, EnumIter, IntoEnumIterator};

/// Emission costs compared in the sustainability sweep
const SUSTAINABILITY_EMISSION_COSTS: [f64; 3] = [20.0, 50.0, 80.0];
/// Emission caps compared in the sustainability sweep
const SUSTAINABILITY_EMISSION_CAPS: [f64; 3] = [1500.0, 2000.0, 2500.0];
/// Coefficients of variation compared in the uncertainty sweep
const UNCERTAINTY_LEVELS: [f64; 3] = [0.1, 0.2, 0.3];
/// Emission costs compared in the sensitivity sweep
const SENSITIVITY_EMISSION_COSTS: [f64; 4] = [20.0, 40.0, 60.0, 80.0];

/// The settings which vary between points of a sweep
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SweepPoint {
    /// Emission shape solved for
    pub shape: EmissionShape,
    /// Price per unit of emissions
    pub emission_cost: MoneyPerEmissions,
    /// Cap on total emissions, if any
    pub emission_cap: Option<Emissions>,
    /// Coefficient of variation of demand, if any
    pub demand_uncertainty: Option<Dimensionless>,
}

impl SweepPoint {
    fn from_base(base: &ModelParameters, shape: EmissionShape) -> Self {
        Self {
            shape,
            emission_cost: base.emission_cost,
            emission_cap: base.emission_cap,
            demand_uncertainty: base.demand_uncertainty,
        }
    }

    /// The base parameters with this point's settings applied
    fn apply(&self, base: &ModelParameters) -> ModelParameters {
        ModelParameters {
            emission_cost: self.emission_cost,
            emission_cap: self.emission_cap,
            demand_uncertainty: self.demand_uncertainty,
            ..base.clone()
        }
    }
}

/// The outcome of one point of a sweep
#[derive(Debug, Clone, PartialEq)]
pub struct SweepRecord {
    /// The settings used
    pub point: SweepPoint,
    /// The solution, or why the point could not be solved
    pub outcome: PlanningResult<Solution>,
}

/// Industries modelled in the case studies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Industry {
    /// Steel making: emissions accelerate at high output
    Steel,
    /// Semiconductor fabrication: efficiency gains at scale
    Semiconductor,
}

impl Industry {
    /// Model parameters representative of the industry
    pub fn parameters(self) -> ModelParameters {
        let params = match self {
            Self::Steel => ModelParameters::default()
                .with_coefficients(0.15, 0.003)
                .with_capacity(Quantity(200.0))
                .with_demand(Quantity(150.0), Quantity(30.0)),
            Self::Semiconductor => ModelParameters::default()
                .with_coefficients(2.0, 0.2)
                .with_capacity(Quantity(300.0))
                .with_demand(Quantity(200.0), Quantity(40.0)),
        };
        let variation = params.demand_variation();

        params
            .with_emission_cost(MoneyPerEmissions(50.0))
            .with_emission_cap(Emissions(2500.0))
            .with_demand_uncertainty(variation)
    }

    /// The emission shape characteristic of the industry
    pub fn shape(self) -> EmissionShape {
        match self {
            Self::Steel => EmissionShape::Quadratic,
            Self::Semiconductor => EmissionShape::Logarithmic,
        }
    }
}

/// `n` evenly spaced production levels from `start` to `end` inclusive
pub fn linspace(start: Quantity, end: Quantity, n: usize) -> Vec<Quantity> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / Dimensionless((n - 1) as f64);
            (0..n)
                .map(|i| start + step * Dimensionless(i as f64))
                .collect()
        }
    }
}

/// Solve a single point, logging a warning if it fails
fn solve_point(
    name: &str,
    base: &ModelParameters,
    point: SweepPoint,
    production_levels: Option<&[Quantity]>,
) -> SweepRecord {
    let outcome = PlanningEngine::new(point.apply(base))
        .and_then(|engine| engine.solve(point.shape, production_levels));
    if let Err(err) = &outcome {
        warn!("{name}: {} point failed: {err}", point.shape);
    }

    SweepRecord { point, outcome }
}

/// Solve every point of a sweep in parallel, preserving the order of `points`
fn run_points(
    name: &str,
    base: &ModelParameters,
    points: Vec<SweepPoint>,
    production_levels: Option<&[Quantity]>,
) -> Vec<SweepRecord> {
    info!("Running {name} over {} points", points.len());
    points
        .into_par_iter()
        .map(|point| solve_point(name, base, point, production_levels))
        .collect()
}

/// Compare emission shapes when production is restricted to discrete levels
pub fn emission_pattern_analysis(base: &ModelParameters) -> Vec<SweepRecord> {
    let levels = linspace(Quantity(50.0), Quantity(250.0), 20);
    let points = EmissionShape::iter()
        .map(|shape| SweepPoint::from_base(base, shape))
        .collect();

    run_points(
        "emission pattern analysis",
        base,
        points,
        Some(levels.as_slice()),
    )
}

/// Solve each industry's representative model with its characteristic emission shape
pub fn industry_case_studies() -> IndexMap<Industry, SweepRecord> {
    info!("Running industry case studies");
    Industry::iter()
        .map(|industry| {
            let params = industry.parameters();
            let point = SweepPoint::from_base(&params, industry.shape());
            let name = format!("{industry} case study");
            (industry, solve_point(&name, &params, point, None))
        })
        .collect()
}

/// Trade off emission prices against emission caps
pub fn sustainability_analysis(base: &ModelParameters) -> Vec<SweepRecord> {
    let points = iproduct!(
        SUSTAINABILITY_EMISSION_COSTS,
        SUSTAINABILITY_EMISSION_CAPS,
        EmissionShape::iter()
    )
    .map(|(cost, cap, shape)| SweepPoint {
        emission_cost: MoneyPerEmissions(cost),
        emission_cap: Some(Emissions(cap)),
        ..SweepPoint::from_base(base, shape)
    })
    .collect();

    run_points("sustainability analysis", base, points, None)
}

/// Compare emission shapes under increasing demand uncertainty
pub fn uncertainty_analysis(base: &ModelParameters) -> Vec<SweepRecord> {
    let points = iproduct!(UNCERTAINTY_LEVELS, EmissionShape::iter())
        .map(|(uncertainty, shape)| SweepPoint {
            demand_uncertainty: Some(Dimensionless(uncertainty)),
            ..SweepPoint::from_base(base, shape)
        })
        .collect();

    run_points("uncertainty analysis", base, points, None)
}

/// Compare emission shapes as the emission price rises
pub fn sensitivity_analysis(base: &ModelParameters) -> Vec<SweepRecord> {
    let points = iproduct!(SENSITIVITY_EMISSION_COSTS, EmissionShape::iter())
        .map(|(cost, shape)| SweepPoint {
            emission_cost: MoneyPerEmissions(cost),
            ..SweepPoint::from_base(base, shape)
        })
        .collect();

    run_points("sensitivity analysis", base, points, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlanningError;
    use crate::fixture::default_params;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    #[rstest]
    #[case(0, &[])]
    #[case(1, &[50.0])]
    #[case(3, &[50.0, 150.0, 250.0])]
    fn test_linspace(#[case] n: usize, #[case] expected: &[f64]) {
        let levels = linspace(Quantity(50.0), Quantity(250.0), n);
        assert_eq!(levels.len(), expected.len());
        for (level, expected) in levels.iter().zip(expected) {
            assert_approx_eq!(Quantity, *level, Quantity(*expected));
        }
    }

    #[rstest]
    fn test_point_apply(default_params: ModelParameters) {
        let point = SweepPoint {
            emission_cost: MoneyPerEmissions(80.0),
            emission_cap: Some(Emissions(1500.0)),
            ..SweepPoint::from_base(&default_params, EmissionShape::Linear)
        };
        let params = point.apply(&default_params);
        assert_eq!(
            params,
            default_params
                .clone()
                .with_emission_cost(MoneyPerEmissions(80.0))
                .with_emission_cap(Emissions(1500.0))
        );
    }

    #[test]
    fn test_industry_parameters() {
        let steel = Industry::Steel.parameters();
        assert_eq!(steel.demand_uncertainty, Some(Dimensionless(0.2)));
        assert_eq!(steel.emission_cap, Some(Emissions(2500.0)));

        let semiconductor = Industry::Semiconductor.parameters();
        assert_eq!(semiconductor.capacity, Quantity(300.0));
        assert_eq!(semiconductor.demand_uncertainty, Some(Dimensionless(0.2)));
        assert_eq!(Industry::Semiconductor.shape(), EmissionShape::Logarithmic);
    }

    #[rstest]
    fn test_failed_points_are_recorded(default_params: ModelParameters) {
        let params = default_params.with_min_production(Quantity(100.0));
        let points = vec![
            SweepPoint {
                emission_cap: Some(Emissions(100.0)),
                ..SweepPoint::from_base(&params, EmissionShape::Quadratic)
            },
            SweepPoint::from_base(&params, EmissionShape::Linear),
        ];

        let records = run_points("test", &params, points, None);
        assert!(matches!(
            records[0].outcome,
            Err(PlanningError::Infeasible { .. })
        ));
        assert!(records[1].outcome.is_ok());
    }
}
