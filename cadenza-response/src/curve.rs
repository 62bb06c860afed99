//! Sampled magnitude curve for a band list

use cadenza_preset::{Band, FilterType, FREQ_MAX, FREQ_MIN};

/// Number of samples in a response curve
pub const CURVE_POINTS: usize = 512;
/// Total magnitude clamp in dB (symmetric)
pub const MAG_LIMIT_DB: f64 = 48.0;

/// Bands with less gain than this contribute nothing (fast path)
const GAIN_EPSILON: f64 = 0.001;

/// A sampled frequency response: `magnitudes_db[i]` is the predicted gain
/// at `frequencies[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseCurve {
    pub frequencies: Vec<f64>,
    pub magnitudes_db: Vec<f64>,
}

/// The log-spaced grid every curve is sampled on: `CURVE_POINTS` points
/// between 20 Hz and 20 kHz, `f_i = 10^(log_min + i/(N-1) * (log_max - log_min))`.
pub fn frequency_grid() -> Vec<f64> {
    let log_min = FREQ_MIN.log10();
    let log_max = FREQ_MAX.log10();
    (0..CURVE_POINTS)
        .map(|i| {
            let t = i as f64 / (CURVE_POINTS - 1) as f64;
            10f64.powf(log_min + t * (log_max - log_min))
        })
        .collect()
}

/// Total predicted magnitude of a band list at one frequency, clamped to
/// `±MAG_LIMIT_DB`.
pub fn magnitude_at(bands: &[Band], frequency: f64) -> f64 {
    let total: f64 = bands
        .iter()
        .filter(|b| b.gain.abs() >= GAIN_EPSILON)
        .map(|b| band_contribution(b, frequency))
        .sum();
    total.clamp(-MAG_LIMIT_DB, MAG_LIMIT_DB)
}

/// Synthesize the full response curve for a band list.
pub fn synthesize(bands: &[Band]) -> ResponseCurve {
    let frequencies = frequency_grid();
    let magnitudes_db = frequencies
        .iter()
        .map(|&f| magnitude_at(bands, f))
        .collect();
    ResponseCurve {
        frequencies,
        magnitudes_db,
    }
}

/// Closed-form contribution of one band at one frequency.
///
/// The peaking bell is Lorentzian-like rather than a true biquad response;
/// shelf and pass types treat Q as a rolloff-steepness factor in
/// log-frequency space. Types without a model here contribute 0.
fn band_contribution(band: &Band, frequency: f64) -> f64 {
    let ratio = frequency / band.frequency;
    match band.filter_type {
        FilterType::Peaking => {
            let log_ratio = ratio.log2();
            let bandwidth = 2.0 / band.q; // octaves
            let norm_dist = log_ratio.abs() / (bandwidth / 2.0);
            if norm_dist <= 0.01 {
                band.gain
            } else {
                band.gain / (1.0 + (2.0 * norm_dist).powi(2))
            }
        }
        FilterType::LowShelf => {
            if ratio <= 1.0 {
                band.gain
            } else {
                band.gain / (1.0 + ratio.log2() * band.q)
            }
        }
        FilterType::HighShelf => {
            if ratio >= 1.0 {
                band.gain
            } else {
                band.gain / (1.0 + (1.0 / ratio).log2() * band.q)
            }
        }
        FilterType::LowPass => {
            if ratio <= 1.0 {
                0.0
            } else {
                -6.0 * ratio.log2() * band.q
            }
        }
        FilterType::HighPass => {
            if ratio >= 1.0 {
                0.0
            } else {
                -6.0 * (1.0 / ratio).log2() * band.q
            }
        }
        // No closed-form model; drawn flat
        FilterType::Notch => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peaking(frequency: f64, gain: f64, q: f64) -> Band {
        Band::new(frequency, gain, q, FilterType::Peaking)
    }

    #[test]
    fn test_grid_shape() {
        let grid = frequency_grid();
        assert_eq!(grid.len(), CURVE_POINTS);
        assert!((grid[0] - 20.0).abs() < 1e-9);
        assert!((grid[CURVE_POINTS - 1] - 20_000.0).abs() < 1e-6);
        assert!(grid.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_grid_is_log_spaced() {
        let grid = frequency_grid();
        // Constant ratio between consecutive points
        let r0 = grid[1] / grid[0];
        let r_mid = grid[301] / grid[300];
        assert!((r0 - r_mid).abs() < 1e-9);
    }

    #[test]
    fn test_peaking_full_gain_at_center() {
        let band = peaking(1000.0, 6.0, 5.0);
        let mag = magnitude_at(&[band], 1000.0);
        assert!((mag - 6.0).abs() < 0.05, "got {mag}");
    }

    #[test]
    fn test_peaking_monotonically_decays_from_center() {
        let band = peaking(1000.0, 6.0, 5.0);
        let curve = synthesize(&[band]);

        let center = curve
            .frequencies
            .iter()
            .position(|&f| f >= 1000.0)
            .unwrap();
        // Above the center the magnitude never increases
        for w in curve.magnitudes_db[center..].windows(2) {
            assert!(w[1] <= w[0] + 1e-12);
        }
        // Below the center it never decreases
        for w in curve.magnitudes_db[..=center.saturating_sub(1)].windows(2) {
            assert!(w[1] >= w[0] - 1e-12);
        }
    }

    #[test]
    fn test_peaking_halfway_formula() {
        // One octave from a Q=2 bell: bandwidth = 1 octave, norm_dist = 2,
        // contribution = gain / (1 + 16)
        let band = peaking(1000.0, 8.5, 2.0);
        let mag = magnitude_at(&[band], 2000.0);
        assert!((mag - 8.5 / 17.0).abs() < 1e-9);
    }

    #[test]
    fn test_flat_band_skipped() {
        let band = peaking(1000.0, 0.0005, 1.0);
        assert_eq!(magnitude_at(&[band], 1000.0), 0.0);
    }

    #[test]
    fn test_low_shelf_flat_below_cutoff() {
        let band = Band::new(200.0, 5.0, 0.707, FilterType::LowShelf);
        assert_eq!(magnitude_at(&[band], 20.0), 5.0);
        assert_eq!(magnitude_at(&[band], 200.0), 5.0);
        // One octave above: gain / (1 + 1 * Q)
        let above = magnitude_at(&[band], 400.0);
        assert!((above - 5.0 / 1.707).abs() < 1e-9);
    }

    #[test]
    fn test_high_shelf_mirrors_low_shelf() {
        let band = Band::new(5000.0, 4.0, 0.707, FilterType::HighShelf);
        assert_eq!(magnitude_at(&[band], 20_000.0), 4.0);
        assert_eq!(magnitude_at(&[band], 5000.0), 4.0);
        let below = magnitude_at(&[band], 2500.0);
        assert!((below - 4.0 / 1.707).abs() < 1e-9);
    }

    #[test]
    fn test_lowpass_slope_in_q_units() {
        // Gain must be nonzero or the fast path skips the band entirely
        let band = Band::new(1000.0, 1.0, 2.0, FilterType::LowPass);
        assert_eq!(magnitude_at(&[band], 500.0), 0.0);
        assert_eq!(magnitude_at(&[band], 1000.0), 0.0);
        // One octave above cutoff: -6 dB * Q
        let mag = magnitude_at(&[band], 2000.0);
        assert!((mag - (-12.0)).abs() < 1e-9);
    }

    #[test]
    fn test_highpass_mirrors_lowpass() {
        let band = Band::new(1000.0, 1.0, 1.0, FilterType::HighPass);
        assert_eq!(magnitude_at(&[band], 2000.0), 0.0);
        let mag = magnitude_at(&[band], 500.0);
        assert!((mag - (-6.0)).abs() < 1e-9);
    }

    #[test]
    fn test_notch_contributes_nothing() {
        let band = Band::new(1000.0, 6.0, 5.0, FilterType::Notch);
        assert_eq!(magnitude_at(&[band], 1000.0), 0.0);
    }

    #[test]
    fn test_contributions_sum() {
        let bands = [peaking(1000.0, 6.0, 5.0), peaking(1000.0, 2.0, 5.0)];
        let mag = magnitude_at(&bands, 1000.0);
        assert!((mag - 8.0).abs() < 0.05);
    }

    #[test]
    fn test_total_is_clamped() {
        let bands: Vec<Band> = (0..10).map(|_| peaking(1000.0, 24.0, 1.0)).collect();
        let mag = magnitude_at(&bands, 1000.0);
        assert_eq!(mag, MAG_LIMIT_DB);
        let cut: Vec<Band> = (0..10).map(|_| peaking(1000.0, -24.0, 1.0)).collect();
        assert_eq!(magnitude_at(&cut, 1000.0), -MAG_LIMIT_DB);
    }

    #[test]
    fn test_empty_band_list_is_flat() {
        let curve = synthesize(&[]);
        assert!(curve.magnitudes_db.iter().all(|&m| m == 0.0));
    }
}
