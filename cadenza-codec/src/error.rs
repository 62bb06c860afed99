//! Codec error types

use cadenza_preset::ValidationError;
use thiserror::Error;

/// Errors from detection, parsing, and conversion.
///
/// These are always returned to the caller as values; user-facing messaging
/// is the host application's concern.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Document matched none of the supported dialects
    #[error("unrecognized preset format")]
    UnknownFormat,
    /// AutoEQ text contained no well-formed filter line
    #[error("no filter lines found in AutoEQ text (first lines: {context:?})")]
    NoFiltersFound {
        /// First few source lines, kept for diagnostics
        context: Vec<String>,
    },
    /// Source document carries no filters to convert
    #[error("source document has no filters")]
    EmptyFilterList,
    /// Qudelix payload lacks the `eq.bands` array
    #[error("payload has no eq.bands data")]
    MissingEqData,
    /// The dialect is export-only
    #[error("{0} presets cannot be imported")]
    UnsupportedImport(&'static str),
    #[error("converted preset is invalid: {0}")]
    Validation(#[from] ValidationError),
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
}
