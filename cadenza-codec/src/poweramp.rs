//! PowerAmp equalizer export (one-way)
//!
//! The target format mandates ten fixed band frequencies, one-decimal gains,
//! and no Q or filter-type information. Q is dropped on export; that is a
//! documented lossy limitation of the target, not a bug. Import is
//! deliberately unsupported.

use cadenza_preset::{Band, Preset};

/// Band frequencies mandated by the PowerAmp format (Hz)
pub const POWERAMP_FREQUENCIES: [f64; 10] = [
    60.0, 170.0, 310.0, 600.0, 1000.0, 3000.0, 6000.0, 12000.0, 14000.0, 16000.0,
];

/// Render a preset as a PowerAmp equalizer XML document.
///
/// Each mandated frequency takes the gain of the native band closest to it
/// in log-frequency distance; octave spacing matters perceptually, so the
/// distance is `|ln(band) - ln(target)|`, not Hz. A preset without bands
/// emits ten disabled zero-gain entries.
pub fn export_poweramp_xml(preset: &Preset) -> String {
    let mut out = String::with_capacity(768);
    out.push_str("<poweramp_equalizer version=\"1.0\">\n");
    out.push_str(&format!(
        "  <preset name=\"{}\">\n",
        escape_xml(&preset.name)
    ));
    out.push_str(&format!("    <preamp gain=\"{:.1}\"/>\n", preset.preamp));

    for (index, &target) in POWERAMP_FREQUENCIES.iter().enumerate() {
        let (gain, enabled) = match nearest_band(&preset.bands, target) {
            Some(band) => (band.gain, true),
            None => (0.0, false),
        };
        out.push_str(&format!(
            "    <band index=\"{}\" freq=\"{}\" gain=\"{:.1}\" enabled=\"{}\"/>\n",
            index, target as u32, gain, enabled
        ));
    }

    out.push_str("  </preset>\n");
    out.push_str("</poweramp_equalizer>\n");
    out
}

/// Band with the smallest log-distance to the target frequency
fn nearest_band(bands: &[Band], target: f64) -> Option<&Band> {
    bands.iter().min_by(|a, b| {
        let da = (a.frequency.ln() - target.ln()).abs();
        let db = (b.frequency.ln() - target.ln()).abs();
        da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
    })
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}
