//! Format sniffing for untyped preset documents
//!
//! The supported dialects overlap structurally, so the checks run in a fixed
//! order: AutoEQ's `filters[0].fc` is a stronger signature than a bare
//! `bands` array, and the generic fallback must come last or it would
//! swallow everything.

use serde_json::Value;
use tracing::debug;

use cadenza_preset::{Band, FilterType, Preset, PresetSource};

use crate::autoeq;
use crate::error::CodecError;
use crate::qudelix;

/// Dialect a document was classified as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresetFormat {
    Native,
    AutoEq,
    PowerAmp,
    Generic,
}

/// Classify an untyped JSON document into one of the supported dialects.
pub fn detect(doc: &Value) -> Result<PresetFormat, CodecError> {
    // AutoEQ JSON variant: numeric preamp + filters[0].fc
    if doc.get("preamp").is_some_and(Value::is_number) {
        if let Some(filters) = doc.get("filters").and_then(Value::as_array) {
            if filters.first().is_some_and(|f| f.get("fc").is_some()) {
                return Ok(PresetFormat::AutoEq);
            }
        }
    }

    // Native: string name + bands[0].frequency
    if doc.get("name").is_some_and(Value::is_string) {
        if let Some(bands) = doc.get("bands").and_then(Value::as_array) {
            if bands.first().is_some_and(|b| b.get("frequency").is_some()) {
                return Ok(PresetFormat::Native);
            }
        }
    }

    // PowerAmp settings dump
    if doc
        .pointer("/EQSettings/bands")
        .is_some_and(Value::is_array)
    {
        return Ok(PresetFormat::PowerAmp);
    }

    // Best-effort: any non-empty bands array of objects
    if let Some(bands) = doc.get("bands").and_then(Value::as_array) {
        if !bands.is_empty() && bands.iter().all(Value::is_object) {
            return Ok(PresetFormat::Generic);
        }
    }

    Err(CodecError::UnknownFormat)
}

/// Detect a document and run it through the matching importer.
///
/// Qudelix payloads carry their own envelope (`eq.bands`) and are routed by
/// the caller; this entry point covers the drag-in-a-file path.
pub fn import_value(doc: &Value) -> Result<Preset, CodecError> {
    // A Qudelix payload also has a name but never a top-level bands array;
    // give its envelope priority before the ordered sniff.
    if doc.pointer("/eq/bands").is_some() {
        return qudelix::import_qudelix(doc);
    }

    let format = detect(doc)?;
    debug!(?format, "classified preset document");
    match format {
        PresetFormat::AutoEq => autoeq::import_autoeq_json(doc),
        PresetFormat::Native => {
            let preset: Preset = serde_json::from_value(doc.clone())?;
            preset.validate()?;
            Ok(preset.normalized())
        }
        PresetFormat::PowerAmp => Err(CodecError::UnsupportedImport("PowerAmp")),
        PresetFormat::Generic => import_generic(doc),
    }
}

/// Copy recognizable fields out of an unknown bands-shaped document.
fn import_generic(doc: &Value) -> Result<Preset, CodecError> {
    let bands = doc
        .get("bands")
        .and_then(Value::as_array)
        .ok_or(CodecError::UnknownFormat)?;

    let mut preset = Preset::new(
        doc.get("name")
            .and_then(Value::as_str)
            .unwrap_or("Imported preset"),
    );
    preset.source = PresetSource::Generic;
    preset.preamp = doc.get("preamp").and_then(Value::as_f64).unwrap_or(0.0);

    preset.bands = bands
        .iter()
        .filter_map(|b| {
            let frequency = b
                .get("frequency")
                .or_else(|| b.get("freq"))
                .and_then(Value::as_f64)?;
            let filter_type = b
                .get("type")
                .cloned()
                .and_then(|t| serde_json::from_value::<FilterType>(t).ok())
                .unwrap_or(FilterType::Peaking);
            Some(Band::new(
                frequency,
                b.get("gain").and_then(Value::as_f64).unwrap_or(0.0),
                b.get("q").and_then(Value::as_f64).unwrap_or(1.0),
                filter_type,
            ))
        })
        .collect();

    Ok(preset.normalized())
}
