//! Emission functions relating production volume to process emissions.
//!
//! Each shape is a pure map from a production quantity to an emission quantity, parameterised by
//! two coefficients, `alpha` and `beta`. For non-negative coefficients every shape is
//! non-negative and non-decreasing on `[0, ∞)` and emits nothing at zero production. Negative
//! coefficients give non-monotonic (undefined) behaviour; the planning engine rejects them.
use crate::error::{PlanningError, PlanningResult};
use crate::units::{Emissions, EmissionsPerQuantity, Quantity};
use serde::Serialize;
use std::str::FromStr;
use strum::{Display, EnumIter, EnumString};

/// The functional form of the emission curve
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumIter, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum EmissionShape {
    /// `alpha * q`
    Linear,
    /// `alpha * q + beta * q^2`: emissions accelerate at high volume
    Quadratic,
    /// `alpha * (exp(beta * q) - 1)`: runaway emissions near capacity
    Exponential,
    /// `alpha * ln(1 + beta * q)`: economies of scale
    Logarithmic,
}

impl EmissionShape {
    /// Look up a shape by name, failing with a configuration error for unknown names
    pub fn from_name(name: &str) -> PlanningResult<Self> {
        Self::from_str(name.trim()).map_err(|_| {
            PlanningError::Configuration(format!("Unknown emission function type: {name}"))
        })
    }

    /// How the marginal emission rate changes with production volume
    pub fn curvature(self) -> Curvature {
        match self {
            Self::Linear => Curvature::Linear,
            Self::Quadratic | Self::Exponential => Curvature::Convex,
            Self::Logarithmic => Curvature::Concave,
        }
    }
}

/// Curvature of an emission function for non-negative coefficients
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Curvature {
    /// Constant marginal emissions
    Linear,
    /// Non-decreasing marginal emissions
    Convex,
    /// Non-increasing marginal emissions
    Concave,
}

/// An emission shape together with its coefficients
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EmissionFunction {
    /// The functional form
    pub shape: EmissionShape,
    /// Scale coefficient
    pub alpha: f64,
    /// Shape-specific rate coefficient
    pub beta: f64,
}

impl EmissionFunction {
    /// Create a new [`EmissionFunction`]
    pub fn new(shape: EmissionShape, alpha: f64, beta: f64) -> Self {
        Self { shape, alpha, beta }
    }

    /// Emissions caused by producing `quantity` units.
    ///
    /// # Arguments
    ///
    /// * `quantity` - Production quantity (must be non-negative)
    pub fn evaluate(&self, quantity: Quantity) -> Emissions {
        let (alpha, beta, q) = (self.alpha, self.beta, quantity.value());
        let emissions = match self.shape {
            EmissionShape::Linear => alpha * q,
            EmissionShape::Quadratic => alpha * q + beta * q * q,
            EmissionShape::Exponential => alpha * (beta * q).exp_m1(),
            EmissionShape::Logarithmic => alpha * (beta * q).ln_1p(),
        };

        Emissions(emissions)
    }

    /// Marginal emissions (first derivative of [`Self::evaluate`]) at `quantity`
    pub fn marginal(&self, quantity: Quantity) -> EmissionsPerQuantity {
        let (alpha, beta, q) = (self.alpha, self.beta, quantity.value());
        let rate = match self.shape {
            EmissionShape::Linear => alpha,
            EmissionShape::Quadratic => alpha + 2.0 * beta * q,
            EmissionShape::Exponential => alpha * beta * (beta * q).exp(),
            EmissionShape::Logarithmic => alpha * beta / (1.0 + beta * q),
        };

        EmissionsPerQuantity(rate)
    }

    /// Curvature of the underlying shape
    pub fn curvature(&self) -> Curvature {
        self.shape.curvature()
    }
}
