//! Qudelix dialect - bidirectional JSON converter with a hardware optimizer
//!
//! The Qudelix hardware accepts at most ten bands and enforces tighter gain
//! bounds than the canonical model, so presets pass through an optimizer
//! before export.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use cadenza_preset::{epoch_seconds, Band, FilterType, Preset, PresetSource, Q_MAX, Q_MIN};

use crate::error::CodecError;

/// Band count the hardware accepts
pub const QUDELIX_MAX_BANDS: usize = 10;
/// Hardware gain and preamp bound in dB (symmetric)
pub const QUDELIX_GAIN_LIMIT: f64 = 12.0;

/// One band of a Qudelix payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QudelixBand {
    pub id: u32,
    pub frequency: f64,
    pub gain: f64,
    pub q: f64,
    #[serde(rename = "type")]
    pub band_type: String,
    pub enabled: bool,
}

/// The `eq` envelope of a Qudelix payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QudelixEq {
    pub enabled: bool,
    pub preamp: f64,
    pub bands: Vec<QudelixBand>,
}

/// Export bookkeeping carried alongside the bands
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QudelixMetadata {
    pub source: String,
    pub original_band_count: usize,
    pub exported_band_count: usize,
}

/// Complete Qudelix export payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QudelixPreset {
    pub name: String,
    pub description: String,
    pub version: String,
    pub created: u64,
    pub eq: QudelixEq,
    pub metadata: QudelixMetadata,
}

fn type_name(filter_type: FilterType) -> &'static str {
    match filter_type {
        FilterType::Peaking | FilterType::Notch => "bell",
        FilterType::LowShelf => "low_shelf",
        FilterType::HighShelf => "high_shelf",
        FilterType::LowPass => "low_pass",
        FilterType::HighPass => "high_pass",
    }
}

fn type_from_name(name: &str) -> FilterType {
    match name {
        "low_shelf" => FilterType::LowShelf,
        "high_shelf" => FilterType::HighShelf,
        "low_pass" => FilterType::LowPass,
        "high_pass" => FilterType::HighPass,
        // "bell" and anything unknown
        _ => FilterType::Peaking,
    }
}

/// Reduce a preset to what the hardware can hold.
///
/// Two-phase: rank by |gain| and keep the strongest ten, then re-sort by
/// frequency; finally clamp gain, Q, and preamp to hardware bounds.
pub fn optimize_for_qudelix(preset: &Preset) -> Preset {
    let mut optimized = preset.clone();

    if optimized.bands.len() > QUDELIX_MAX_BANDS {
        optimized.bands.sort_by(|a, b| {
            b.gain
                .abs()
                .partial_cmp(&a.gain.abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        optimized.bands.truncate(QUDELIX_MAX_BANDS);
    }

    for band in &mut optimized.bands {
        band.gain = band.gain.clamp(-QUDELIX_GAIN_LIMIT, QUDELIX_GAIN_LIMIT);
        band.q = band.q.clamp(Q_MIN, Q_MAX);
    }
    optimized.preamp = optimized
        .preamp
        .clamp(-QUDELIX_GAIN_LIMIT, QUDELIX_GAIN_LIMIT);

    optimized.normalized()
}

/// Export a preset as a Qudelix payload.
///
/// Runs the optimizer first, keeps only bands inside the audible range,
/// and rounds frequency to whole Hz, gain to one decimal, Q to two.
pub fn export_qudelix(preset: &Preset) -> QudelixPreset {
    let original_band_count = preset.bands.len();
    let optimized = optimize_for_qudelix(preset);

    let bands: Vec<QudelixBand> = optimized
        .bands
        .iter()
        .filter(|b| (20.0..=20_000.0).contains(&b.frequency))
        .enumerate()
        .map(|(i, b)| {
            let gain = (b.gain * 10.0).round() / 10.0;
            QudelixBand {
                id: i as u32,
                frequency: b.frequency.round(),
                gain,
                q: (b.q * 100.0).round() / 100.0,
                band_type: type_name(b.filter_type).to_string(),
                enabled: gain != 0.0,
            }
        })
        .collect();

    let exported_band_count = bands.len();
    QudelixPreset {
        name: optimized.name.clone(),
        description: optimized.description.clone(),
        version: "1.0".to_string(),
        created: epoch_seconds(),
        eq: QudelixEq {
            enabled: true,
            preamp: optimized.preamp,
            bands,
        },
        metadata: QudelixMetadata {
            source: "cadenza".to_string(),
            original_band_count,
            exported_band_count,
        },
    }
}

/// Import a Qudelix payload into a canonical preset.
///
/// Gain and Q pass through unchanged; preamp defaults to 0 when absent.
pub fn import_qudelix(doc: &Value) -> Result<Preset, CodecError> {
    #[derive(Deserialize)]
    struct BandIn {
        frequency: f64,
        #[serde(default)]
        gain: f64,
        #[serde(default = "default_q")]
        q: f64,
        #[serde(rename = "type", default)]
        band_type: String,
    }
    #[derive(Deserialize)]
    struct EqIn {
        #[serde(default)]
        preamp: f64,
        bands: Option<Vec<BandIn>>,
    }
    #[derive(Deserialize)]
    struct PayloadIn {
        name: Option<String>,
        #[serde(default)]
        description: String,
        eq: Option<EqIn>,
    }
    fn default_q() -> f64 {
        1.0
    }

    let payload: PayloadIn = serde_json::from_value(doc.clone())?;
    let eq = payload.eq.ok_or(CodecError::MissingEqData)?;
    let bands_in = eq.bands.ok_or(CodecError::MissingEqData)?;

    let mut preset = Preset::new(payload.name.as_deref().unwrap_or("Qudelix import"));
    preset.description = payload.description;
    preset.preamp = eq.preamp;
    preset.source = PresetSource::Qudelix;
    preset.bands = bands_in
        .into_iter()
        .map(|b| Band::new(b.frequency, b.gain, b.q, type_from_name(&b.band_type)))
        .collect();

    Ok(preset.normalized())
}
