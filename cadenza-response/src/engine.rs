//! Response engine with an explicit curve cache
//!
//! The host application constructs one engine and passes it by reference to
//! whatever needs curves; there is no ambient global state.

use std::collections::HashMap;
use std::sync::Arc;

use cadenza_preset::Band;
use tracing::debug;

use crate::curve::{synthesize, ResponseCurve};

/// Synthesizes response curves and caches them by band-list fingerprint.
#[derive(Default)]
pub struct ResponseEngine {
    cache: HashMap<String, Arc<ResponseCurve>>,
}

impl ResponseEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Curve for the given bands, computed at most once per distinct list.
    pub fn response_for(&mut self, bands: &[Band]) -> Arc<ResponseCurve> {
        let key = fingerprint(bands);
        if let Some(curve) = self.cache.get(&key) {
            return Arc::clone(curve);
        }
        debug!(bands = bands.len(), "synthesizing response curve");
        let curve = Arc::new(synthesize(bands));
        self.cache.insert(key, Arc::clone(&curve));
        curve
    }

    /// Number of cached curves
    pub fn cached_curves(&self) -> usize {
        self.cache.len()
    }

    /// Drop every cached curve
    pub fn clear(&mut self) {
        self.cache.clear();
    }
}

/// Stable textual key for a band list.
///
/// Full float precision via the `?` formatting of f64, so two lists collide
/// only when every parameter is bit-equal.
fn fingerprint(bands: &[Band]) -> String {
    use std::fmt::Write;
    let mut key = String::with_capacity(bands.len() * 32);
    for band in bands {
        let _ = write!(
            key,
            "{:?}:{:?}:{:?}:{:?};",
            band.frequency, band.gain, band.q, band.filter_type
        );
    }
    key
}
