//! Configuration of planning models.
mod parameters;
pub use parameters::{ModelParameters, ScenarioPolicy};
