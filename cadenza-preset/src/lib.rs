//! Canonical EQ model for Cadenza - bands, presets, and validation
//!
//! Every converter in the engine targets these types; a preset is normalized
//! exactly once before storage or rendering and treated as a value afterwards.

mod band;
mod builtin;
mod preset;
mod validate;

pub use band::{Band, FilterType, FREQ_MAX, FREQ_MIN, GAIN_MAX, GAIN_MIN, Q_MAX, Q_MIN};
pub use builtin::builtin_presets;
pub use preset::{epoch_seconds, Preset, PresetSource, REFERENCE_FREQUENCIES};
pub use validate::ValidationError;
