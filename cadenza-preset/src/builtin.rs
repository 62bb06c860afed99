//! Factory presets shipped with the player

use crate::band::{Band, FilterType};
use crate::preset::{Preset, PresetSource, REFERENCE_FREQUENCIES};

/// Build a preset from per-reference-band gains
fn from_gains(name: &str, description: &str, gains: [f64; 10]) -> Preset {
    let mut preset = Preset::new(name);
    preset.description = description.to_string();
    preset.source = PresetSource::Native;
    preset.bands = REFERENCE_FREQUENCIES
        .iter()
        .zip(gains)
        .map(|(&f, g)| Band::new(f, g, 1.0, FilterType::Peaking))
        .collect();
    preset
}

/// The factory presets seeded into a fresh library
pub fn builtin_presets() -> Vec<Preset> {
    vec![
        from_gains("Flat", "No coloration", [0.0; 10]),
        from_gains(
            "Bass Boost",
            "Lifted sub-bass and bass",
            [6.0, 5.0, 3.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        ),
        from_gains(
            "Treble Boost",
            "Lifted presence and air",
            [0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 2.0, 4.0, 5.0, 6.0],
        ),
        from_gains(
            "V-Shape",
            "Boosted lows and highs, recessed mids",
            [5.0, 4.0, 2.0, 0.0, -2.0, -2.0, 0.0, 2.0, 4.0, 5.0],
        ),
        from_gains(
            "Vocal",
            "Forward midrange for voice",
            [-2.0, -1.0, 0.0, 2.0, 4.0, 4.0, 3.0, 1.0, 0.0, -1.0],
        ),
    ]
}
