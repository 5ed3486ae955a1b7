//! Fixtures for tests

use crate::emission::{EmissionFunction, EmissionShape};
use crate::model::ModelParameters;
use rstest::fixture;

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!($result.unwrap_err().to_string(), $msg);
    };
}
pub(crate) use assert_error;

#[fixture]
pub fn default_params() -> ModelParameters {
    ModelParameters::default()
}

#[fixture]
pub fn quadratic_function() -> EmissionFunction {
    EmissionFunction::new(EmissionShape::Quadratic, 0.15, 0.003)
}
