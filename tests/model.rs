use ecoplan::{EmissionShape, ModelParameters, PlanningEngine};
use std::path::{Path, PathBuf};

/// Get the path to the steel plant model.
fn get_model_dir() -> PathBuf {
    Path::new(file!())
        .parent()
        .unwrap()
        .join("data")
        .join("steel")
}

/// An integration test which loads the steel plant model and solves it
#[test]
fn test_model_from_path() {
    let params = ModelParameters::from_path(get_model_dir()).unwrap();
    assert_eq!(params.num_scenarios, 100);

    let engine = PlanningEngine::new(params).unwrap();
    let solution = engine.solve(EmissionShape::Quadratic, None).unwrap();
    assert_eq!(solution.scenarios.len(), 100);
    assert!(solution.total_emissions.value() <= 2500.0);
}
