//! Errors raised while building or solving a planning problem.
use crate::units::Emissions;

/// The ways in which a solve can fail.
///
/// All variants are terminal for the call which raised them: the engine never retries and never
/// returns a partial plan.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlanningError {
    /// Invalid parameters supplied at construction or solve time
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// The emission cap is lower than the emissions of the least-emitting admissible plan
    #[error(
        "Emission cap of {cap} cannot be met: the minimum achievable emissions are {minimum}"
    )]
    Infeasible {
        /// The requested cap
        cap: Emissions,
        /// Total emissions when every period produces at its floor
        minimum: Emissions,
    },

    /// The solver failed to converge within its iteration bound or hit a non-finite value
    #[error("Solver failed: {0}")]
    Numerical(String),
}

/// Result type used throughout the planning engine
pub type PlanningResult<T> = Result<T, PlanningError>;

/// Return early with a [`PlanningError::Configuration`] if the condition does not hold
macro_rules! ensure_config {
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            return Err($crate::error::PlanningError::Configuration(format!($($arg)+)));
        }
    };
}
pub(crate) use ensure_config;
