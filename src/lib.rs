//! Emission-aware aggregate production planning.
//!
//! Given a planning horizon, production capacity, a demand distribution and a price on emissions,
//! [`PlanningEngine`] chooses how much to produce in each period so as to balance production cost
//! against the cost of the emissions it causes. Emissions grow with output according to one of
//! several [`EmissionShape`]s. An optional cap on total emissions and sampled demand scenarios are
//! supported.
#![warn(missing_docs)]
pub mod demand;
pub mod emission;
pub mod error;
pub mod input;
pub mod log;
pub mod model;
pub mod planning;
pub mod sweep;
pub mod units;

pub use emission::{EmissionFunction, EmissionShape};
pub use error::{PlanningError, PlanningResult};
pub use model::{ModelParameters, ScenarioPolicy};
pub use planning::{CapStatus, Costs, PlanningEngine, ScenarioOutcome, Solution};

#[cfg(test)]
mod fixture;
