//! Diagnostic notes
//!
//! Fixed threshold rules evaluated in priority order. A rule whose input is
//! absent is skipped.

use crate::model::{LevelStats, SpectralStats, StereoStats};

/// True peak above this is flagged
pub const TRUE_PEAK_WARN_DBTP: f64 = -1.0;

/// Ceiling suggested when the true peak is flagged
pub const TRUE_PEAK_CEILING_DBTP: f64 = -1.5;

/// Flatness above this reads as noise
pub const NOISE_FLATNESS: f64 = 0.5;

/// Correlation below this reads as wide or out of phase
pub const WIDE_CORRELATION: f64 = 0.2;

pub fn diagnose(level: &LevelStats, spectral: &SpectralStats, stereo: &StereoStats) -> Vec<String> {
    let mut notes = Vec::new();

    if let Some(clipped) = level.clipped_samples().filter(|&n| n > 0) {
        notes.push(match level.clipped_percent() {
            Some(pct) => format!("Clipping detected: {} samples ({:.3}%)", clipped, pct),
            None => format!("Clipping detected: {} samples", clipped),
        });
    }

    if let Some(tp) = level.true_peak_dbtp().filter(|&tp| tp > TRUE_PEAK_WARN_DBTP) {
        notes.push(format!(
            "True peak dangerously high ({:.2} dBTP). Consider {:.1} dBTP ceiling.",
            tp, TRUE_PEAK_CEILING_DBTP
        ));
    }

    if spectral.flatness.is_some_and(|f| f > NOISE_FLATNESS) {
        notes.push("High spectral flatness → noise-like content.".to_string());
    }

    if stereo.correlation().is_some_and(|c| c < WIDE_CORRELATION) {
        notes.push("Low L/R correlation → wide or phasey stereo.".to_string());
    }

    notes
}
