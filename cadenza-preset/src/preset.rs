//! Canonical preset - the format-agnostic representation every converter targets

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::band::Band;
use crate::validate::ValidationError;

/// Standard 10-band layout used for neutral padding and the flat preset
pub const REFERENCE_FREQUENCIES: [f64; 10] = [
    32.0, 64.0, 125.0, 250.0, 500.0, 1000.0, 2000.0, 4000.0, 8000.0, 16000.0,
];

/// Where a preset originally came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresetSource {
    Native,
    AutoEq,
    PowerAmp,
    Qudelix,
    Generic,
    User,
}

impl Default for PresetSource {
    fn default() -> Self {
        PresetSource::Native
    }
}

/// Canonical EQ preset.
///
/// Bands are kept sorted ascending by frequency after any conversion; a
/// preset with zero bands is valid (flat EQ). Presets are value types:
/// edits produce a new `Preset` rather than mutating in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preset {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub version: String,
    /// Broadband gain offset in dB applied alongside all bands
    #[serde(default)]
    pub preamp: f64,
    #[serde(default)]
    pub bands: Vec<Band>,
    #[serde(default)]
    pub source: PresetSource,
    /// Headphone/speaker target the preset was authored for, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_type: Option<String>,
    /// Unix timestamp of when the preset entered the system
    #[serde(default)]
    pub import_date: u64,
}

impl Preset {
    /// Empty (zero-band) preset with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            version: "1.0".to_string(),
            preamp: 0.0,
            bands: Vec::new(),
            source: PresetSource::Native,
            target: None,
            device_type: None,
            import_date: epoch_seconds(),
        }
    }

    /// Flat preset over the standard 10-band reference layout
    pub fn flat(name: impl Into<String>) -> Self {
        let mut preset = Self::new(name);
        preset.bands = REFERENCE_FREQUENCIES.iter().map(|&f| Band::neutral(f)).collect();
        preset
    }

    /// Copy of this preset with bands sorted ascending by frequency.
    ///
    /// Idempotent: normalizing a normalized preset is a no-op.
    pub fn normalized(&self) -> Self {
        let mut preset = self.clone();
        preset.bands.sort_by(|a, b| {
            a.frequency
                .partial_cmp(&b.frequency)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        preset
    }

    /// Validate the preset and every band in it
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::new("name", &self.name));
        }
        if !self.preamp.is_finite() || !(crate::GAIN_MIN..=crate::GAIN_MAX).contains(&self.preamp)
        {
            return Err(ValidationError::new("preamp", self.preamp));
        }
        for band in &self.bands {
            band.validate()?;
        }
        Ok(())
    }
}

/// Current time as Unix epoch seconds
pub fn epoch_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::band::FilterType;

    #[test]
    fn test_empty_preset_is_valid() {
        let preset = Preset::new("Flat");
        assert!(preset.validate().is_ok());
        assert!(preset.bands.is_empty());
    }

    #[test]
    fn test_blank_name_rejected() {
        let preset = Preset::new("  ");
        assert_eq!(preset.validate().unwrap_err().field, "name");
    }

    #[test]
    fn test_preamp_out_of_range() {
        let mut preset = Preset::new("Loud");
        preset.preamp = -30.0;
        assert_eq!(preset.validate().unwrap_err().field, "preamp");
    }

    #[test]
    fn test_normalized_sorts_by_frequency() {
        let mut preset = Preset::new("Unsorted");
        preset.bands = vec![
            Band::neutral(8000.0),
            Band::neutral(100.0),
            Band::neutral(1000.0),
        ];
        let normalized = preset.normalized();
        let freqs: Vec<f64> = normalized.bands.iter().map(|b| b.frequency).collect();
        assert_eq!(freqs, vec![100.0, 1000.0, 8000.0]);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let mut preset = Preset::new("P");
        preset.bands = vec![
            Band::new(4000.0, -2.0, 2.0, FilterType::Peaking),
            Band::new(50.0, 3.0, 0.707, FilterType::LowShelf),
            Band::new(500.0, 1.5, 1.0, FilterType::Peaking),
        ];
        let once = preset.normalized();
        let twice = once.normalized();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_flat_preset_uses_reference_layout() {
        let preset = Preset::flat("Flat");
        assert_eq!(preset.bands.len(), 10);
        assert_eq!(preset.bands[0].frequency, 32.0);
        assert_eq!(preset.bands[9].frequency, 16000.0);
        assert!(preset.bands.iter().all(|b| b.gain == 0.0));
    }

    #[test]
    fn test_json_field_names() {
        let mut preset = Preset::new("Shape");
        preset.device_type = Some("headphone".to_string());
        let json = serde_json::to_value(&preset).unwrap();
        assert!(json.get("deviceType").is_some());
        assert!(json.get("importDate").is_some());
        assert_eq!(json["source"], "native");
    }

    #[test]
    fn test_native_json_roundtrip() {
        let mut preset = Preset::new("Round");
        preset.bands = vec![Band::new(100.0, 4.0, 0.7, FilterType::Peaking)];
        preset.target = Some("HD 650".to_string());
        let text = serde_json::to_string(&preset).unwrap();
        let back: Preset = serde_json::from_str(&text).unwrap();
        assert_eq!(back, preset);
    }

    #[test]
    fn test_missing_optional_fields_default() {
        let back: Preset =
            serde_json::from_str(r#"{"name":"Bare","bands":[]}"#).unwrap();
        assert_eq!(back.preamp, 0.0);
        assert_eq!(back.source, PresetSource::Native);
        assert!(back.target.is_none());
    }
}
