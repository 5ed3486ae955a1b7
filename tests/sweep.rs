//! Integration tests for the parameter sweeps.
use ecoplan::sweep::{
    Industry, emission_pattern_analysis, industry_case_studies, sensitivity_analysis,
    sustainability_analysis, uncertainty_analysis,
};
use ecoplan::units::{Dimensionless, Emissions, MoneyPerEmissions};
use ecoplan::{EmissionShape, ModelParameters};
use itertools::Itertools;

fn base() -> ModelParameters {
    ModelParameters::default().with_num_scenarios(20)
}

#[test]
fn test_emission_pattern_analysis() {
    let records = emission_pattern_analysis(&base());
    assert_eq!(
        records.iter().map(|r| r.point.shape).collect_vec(),
        [
            EmissionShape::Linear,
            EmissionShape::Quadratic,
            EmissionShape::Exponential,
            EmissionShape::Logarithmic
        ]
    );
    for record in &records {
        let solution = record.outcome.as_ref().unwrap();
        assert_eq!(solution.production_plan.len(), 12);
    }
}

#[test]
fn test_industry_case_studies() {
    let results = industry_case_studies();
    assert_eq!(
        results.keys().copied().collect_vec(),
        [Industry::Steel, Industry::Semiconductor]
    );

    let steel = results[&Industry::Steel].outcome.as_ref().unwrap();
    assert_eq!(steel.shape, EmissionShape::Quadratic);
    assert!(steel.total_emissions <= Emissions(2500.0));
    assert!(steel.expected_cost.is_some());

    let semiconductor = results[&Industry::Semiconductor].outcome.as_ref().unwrap();
    assert_eq!(semiconductor.shape, EmissionShape::Logarithmic);
}

#[test]
fn test_sustainability_analysis() {
    let records = sustainability_analysis(&base());
    assert_eq!(records.len(), 36);
    assert_eq!(records[0].point.emission_cost, MoneyPerEmissions(20.0));
    assert_eq!(records[0].point.emission_cap, Some(Emissions(1500.0)));
    assert_eq!(records[35].point.emission_cost, MoneyPerEmissions(80.0));
    assert_eq!(records[35].point.emission_cap, Some(Emissions(2500.0)));

    for record in &records {
        let solution = record.outcome.as_ref().unwrap();
        assert!(solution.total_emissions <= record.point.emission_cap.unwrap());
    }
}

#[test]
fn test_uncertainty_analysis() {
    let records = uncertainty_analysis(&base());
    assert_eq!(records.len(), 12);
    for record in &records {
        assert!(record.point.demand_uncertainty.unwrap() > Dimensionless(0.0));
        let solution = record.outcome.as_ref().unwrap();
        assert!(solution.cost_variance.unwrap() >= 0.0);
        assert_eq!(solution.scenarios.len(), 20);
    }
}

#[test]
fn test_sensitivity_analysis() {
    let records = sensitivity_analysis(&base());
    assert_eq!(records.len(), 16);
    assert!(records.iter().all(|r| r.outcome.is_ok()));
}

#[test]
fn test_failures_do_not_stop_sweep() {
    // A minimum output whose emissions exceed the smallest cap for some shapes
    let base = base()
        .with_coefficients(1.0, 0.01)
        .with_min_production(ecoplan::units::Quantity(130.0));
    let records = sustainability_analysis(&base);

    assert_eq!(records.len(), 36);
    assert!(records.iter().any(|r| r.outcome.is_err()));
    assert!(records.iter().any(|r| r.outcome.is_ok()));
}
