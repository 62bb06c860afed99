//! Preset dialect codecs for Cadenza
//!
//! Reads and writes the third-party EQ preset formats the player understands,
//! always converting through the canonical model in `cadenza-preset`.
//! Detection, parsing, and conversion are pure and synchronous; errors are
//! typed values and never escape a component boundary as panics.

mod autoeq;
mod detect;
mod error;
mod poweramp;
mod qudelix;

pub use autoeq::{
    export_autoeq_text, from_autoeq, import_autoeq_json, to_autoeq, AutoEqExport,
    AutoEqExportFilter, AutoEqParser, AutoEqTextDocument, RawFilter, MAX_NATIVE_BANDS,
};
pub use detect::{detect, import_value, PresetFormat};
pub use error::CodecError;
pub use poweramp::{export_poweramp_xml, POWERAMP_FREQUENCIES};
pub use qudelix::{
    export_qudelix, import_qudelix, optimize_for_qudelix, QudelixBand, QudelixEq,
    QudelixMetadata, QudelixPreset, QUDELIX_GAIN_LIMIT, QUDELIX_MAX_BANDS,
};
