//! Numeric derivations shared by the analysis records
//!
//! Everything here is a pure function of already-present measurements.

use crate::model::{ProbeInfo, SilenceSpan};

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

pub fn crest_db(peak_db: f64, rms_db: f64) -> f64 {
    peak_db - rms_db
}

pub fn headroom_db(peak_db: f64) -> f64 {
    0.0 - peak_db
}

/// Clipped samples as a percentage of every sample in every channel
pub fn clip_percent(count: u64, probe: &ProbeInfo) -> Option<f64> {
    if probe.duration_secs <= 0.0 || probe.sample_rate == 0 || probe.channels == 0 {
        return None;
    }
    let total = probe.duration_secs * f64::from(probe.sample_rate) * f64::from(probe.channels);
    Some(100.0 * count as f64 / total)
}

/// Middle element of an ascending slice (upper middle for even lengths)
pub fn median(sorted: &[f64]) -> f64 {
    sorted[sorted.len() / 2]
}

/// Population mean
pub fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation with Bessel's correction; 0 below two samples
pub fn sample_std_dev(values: &[f64], mean: f64) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let sum_sq: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    (sum_sq / (values.len() - 1) as f64).sqrt()
}

/// Events per minute over `duration_secs`
pub fn per_minute(events: u64, duration_secs: f64) -> Option<f64> {
    (duration_secs > 0.0).then(|| events as f64 / (duration_secs / 60.0))
}

pub fn hz_to_midi(hz: f64) -> f64 {
    69.0 + 12.0 * (hz / 440.0).log2()
}

/// Note name with octave, MIDI 60 = "C4"
pub fn note_name(midi: i32) -> String {
    let pitch_class = midi.rem_euclid(12) as usize;
    let octave = midi.div_euclid(12) - 1;
    format!("{}{}", NOTE_NAMES[pitch_class], octave)
}

/// Summed length of all spans; `None` when there are no spans
pub fn silence_total(spans: &[SilenceSpan]) -> Option<f64> {
    if spans.is_empty() {
        return None;
    }
    Some(spans.iter().map(SilenceSpan::duration).sum())
}

pub fn silence_ratio(total_secs: f64, duration_secs: f64) -> Option<f64> {
    (duration_secs > 0.0).then(|| total_secs / duration_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_names() {
        assert_eq!(note_name(69), "A4");
        assert_eq!(note_name(60), "C4");
        assert_eq!(note_name(61), "C#4");
        assert_eq!(note_name(59), "B3");
        assert_eq!(note_name(0), "C-1");
        assert_eq!(note_name(-1), "B-2");
    }

    #[test]
    fn test_hz_to_midi() {
        assert_eq!(hz_to_midi(440.0), 69.0);
        assert_eq!(hz_to_midi(880.0), 81.0);
        assert!((hz_to_midi(261.63) - 60.0).abs() < 0.01);
    }

    #[test]
    fn test_std_dev_small_samples() {
        assert_eq!(sample_std_dev(&[5.0], 5.0), 0.0);
        assert_eq!(sample_std_dev(&[], 0.0), 0.0);
        assert!((sample_std_dev(&[1.0, 3.0], 2.0) - 2f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_silence_totals() {
        let spans = [SilenceSpan::new(0.0, 1.5), SilenceSpan::new(10.0, 12.0)];
        assert_eq!(silence_total(&spans), Some(3.5));
        assert_eq!(silence_total(&[]), None);
        assert_eq!(silence_ratio(3.5, 35.0), Some(0.1));
        assert_eq!(silence_ratio(3.5, 0.0), None);
    }

    #[test]
    fn test_per_minute() {
        assert_eq!(per_minute(30, 30.0), Some(60.0));
        assert_eq!(per_minute(30, 0.0), None);
    }
}
