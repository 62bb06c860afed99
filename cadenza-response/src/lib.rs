//! Analytic frequency-response synthesis for Cadenza
//!
//! Predicts what a chain of filters will sound like without running any
//! audio: a closed-form magnitude curve per filter type, sampled on a
//! log-frequency grid. This is a visualization model, not a filter design -
//! the formulas favor smoothness and cheapness over biquad accuracy, and
//! the curve they produce is a contractual output.

mod curve;
mod engine;

pub use curve::{
    frequency_grid, magnitude_at, synthesize, ResponseCurve, CURVE_POINTS, MAG_LIMIT_DB,
};
pub use engine::ResponseEngine;
