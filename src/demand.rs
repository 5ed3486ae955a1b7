//! Demand trajectories used to plan and evaluate production.
use crate::error::{PlanningError, PlanningResult};
use crate::model::ModelParameters;
use crate::units::{Dimensionless, Quantity};
use itertools::Itertools;
use log::debug;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};
use serde::Serialize;

/// One realised demand trajectory over the planning horizon
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scenario {
    /// Demand in each period
    pub demand: Vec<Quantity>,
}

impl Scenario {
    /// Total demand over the horizon
    pub fn total(&self) -> Quantity {
        self.demand.iter().sum()
    }
}

/// The scenario in which every period sees the mean demand
pub fn expected_demand(params: &ModelParameters) -> Scenario {
    Scenario {
        demand: vec![params.demand_mean; params.horizon as usize],
    }
}

/// Sample demand scenarios around the mean.
///
/// Each period's demand is drawn independently from a normal distribution with standard deviation
/// `variation * demand_mean` and clipped at zero. Scenarios are drawn one after another from a
/// single generator seeded with `params.seed`, so the same parameters always give the same set.
///
/// # Arguments
///
/// * `params` - Model parameters supplying the horizon, mean demand, scenario count and seed
/// * `variation` - Coefficient of variation of demand
///
/// # Returns
///
/// `params.num_scenarios` scenarios, or a configuration error if the distribution is invalid
pub fn sample_scenarios(
    params: &ModelParameters,
    variation: Dimensionless,
) -> PlanningResult<Vec<Scenario>> {
    let std = variation * params.demand_mean;
    let normal = Normal::new(params.demand_mean.value(), std.value()).map_err(|err| {
        PlanningError::Configuration(format!(
            "Invalid demand distribution (mean {}, standard deviation {std}): {err}",
            params.demand_mean
        ))
    })?;

    debug!(
        "Sampling {} demand scenarios with standard deviation {std}",
        params.num_scenarios
    );
    let mut rng = StdRng::seed_from_u64(params.seed);
    let scenarios = (0..params.num_scenarios)
        .map(|_| Scenario {
            demand: (0..params.horizon)
                .map(|_| Quantity(normal.sample(&mut rng).max(0.0)))
                .collect_vec(),
        })
        .collect();

    Ok(scenarios)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::default_params;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    #[rstest]
    fn test_expected_demand(default_params: ModelParameters) {
        let scenario = expected_demand(&default_params);
        assert_eq!(scenario.demand, vec![Quantity(150.0); 12]);
        assert_eq!(scenario.total(), Quantity(1800.0));
    }

    #[rstest]
    fn test_sample_scenarios_shape(default_params: ModelParameters) {
        let params = default_params.with_num_scenarios(7).with_horizon(5);
        let scenarios = sample_scenarios(&params, Dimensionless(0.2)).unwrap();
        assert_eq!(scenarios.len(), 7);
        assert!(scenarios.iter().all(|s| s.demand.len() == 5));
    }

    #[rstest]
    fn test_sample_scenarios_reproducible(default_params: ModelParameters) {
        let first = sample_scenarios(&default_params, Dimensionless(0.2)).unwrap();
        let second = sample_scenarios(&default_params, Dimensionless(0.2)).unwrap();
        assert_eq!(first, second);

        let reseeded = sample_scenarios(&default_params.with_seed(7), Dimensionless(0.2)).unwrap();
        assert_ne!(first, reseeded);
    }

    #[rstest]
    fn test_sample_scenarios_clipped_at_zero(default_params: ModelParameters) {
        // Huge spread, so many draws fall below zero
        let scenarios = sample_scenarios(&default_params, Dimensionless(5.0)).unwrap();
        assert!(
            scenarios
                .iter()
                .flat_map(|s| &s.demand)
                .all(|d| *d >= Quantity(0.0))
        );
    }

    #[rstest]
    fn test_sample_scenarios_mean(default_params: ModelParameters) {
        let params = default_params.with_num_scenarios(2000);
        let scenarios = sample_scenarios(&params, Dimensionless(0.1)).unwrap();
        let draws = scenarios.iter().flat_map(|s| &s.demand).collect_vec();
        let mean = draws.iter().map(|d| d.value()).sum::<f64>() / draws.len() as f64;
        assert_approx_eq!(f64, mean, 150.0, epsilon = 1.0);
    }

    #[rstest]
    fn test_sample_scenarios_zero_variation(default_params: ModelParameters) {
        let scenarios = sample_scenarios(&default_params, Dimensionless(0.0)).unwrap();
        assert!(scenarios.iter().all(|s| s == &expected_demand(&default_params)));
    }

    #[rstest]
    fn test_sample_scenarios_invalid_variation(default_params: ModelParameters) {
        assert!(matches!(
            sample_scenarios(&default_params, Dimensionless(f64::NAN)),
            Err(PlanningError::Configuration(_))
        ));
    }
}
