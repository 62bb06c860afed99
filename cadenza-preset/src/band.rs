//! Single filter stage of an equalizer chain

use serde::{Deserialize, Serialize};

use crate::validate::ValidationError;

/// Lowest representable band frequency in Hz
pub const FREQ_MIN: f64 = 20.0;
/// Highest representable band frequency in Hz
pub const FREQ_MAX: f64 = 20_000.0;
/// Lowest band gain in dB
pub const GAIN_MIN: f64 = -24.0;
/// Highest band gain in dB
pub const GAIN_MAX: f64 = 24.0;
/// Lowest Q factor
pub const Q_MIN: f64 = 0.1;
/// Highest Q factor
pub const Q_MAX: f64 = 10.0;

/// Filter shape of a band.
///
/// Q is only meaningful as a bandwidth for `Peaking` and `Notch`; the shelf
/// and pass types use it as a rolloff-steepness factor. It is never
/// "disabled".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterType {
    Peaking,
    LowShelf,
    HighShelf,
    LowPass,
    HighPass,
    Notch,
}

impl FilterType {
    /// Default Q when a source format omits it
    pub fn default_q(self) -> f64 {
        match self {
            FilterType::Peaking | FilterType::Notch => 1.0,
            _ => 0.707,
        }
    }
}

/// One filter stage: frequency, gain, Q, and shape
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    /// Center (or cutoff) frequency in Hz
    pub frequency: f64,
    /// Gain in dB
    pub gain: f64,
    /// Q factor
    pub q: f64,
    /// Filter shape
    #[serde(rename = "type")]
    pub filter_type: FilterType,
}

impl Band {
    /// Create a band
    pub fn new(frequency: f64, gain: f64, q: f64, filter_type: FilterType) -> Self {
        Self {
            frequency,
            gain,
            q,
            filter_type,
        }
    }

    /// Neutral (flat) peaking band at the given frequency
    pub fn neutral(frequency: f64) -> Self {
        Self::new(frequency, 0.0, 1.0, FilterType::Peaking)
    }

    /// Check all parameters against the canonical ranges
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.frequency.is_finite() || !(FREQ_MIN..=FREQ_MAX).contains(&self.frequency) {
            return Err(ValidationError::new("frequency", self.frequency));
        }
        if !self.gain.is_finite() || !(GAIN_MIN..=GAIN_MAX).contains(&self.gain) {
            return Err(ValidationError::new("gain", self.gain));
        }
        if !self.q.is_finite() || !(Q_MIN..=Q_MAX).contains(&self.q) {
            return Err(ValidationError::new("q", self.q));
        }
        Ok(())
    }
}
