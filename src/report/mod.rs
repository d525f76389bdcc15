//! Report rendering
//!
//! Rendering is pure: the same analysis (or diff) and format always give the
//! same bytes. Absent values are left out of text and markdown output and are
//! `null` in JSON.

mod json;
mod markdown;
mod text;

use crate::compare::Diff;
use crate::config::ReportFormat;
use crate::model::Analysis;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to write report {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub fn render_analysis(analysis: &Analysis, format: ReportFormat) -> Result<String, ReportError> {
    Ok(match format {
        ReportFormat::Json => json::render(analysis)?,
        ReportFormat::Text => text::render_analysis(analysis),
        ReportFormat::Markdown => markdown::render_analysis(analysis),
    })
}

pub fn render_diff(diff: &Diff<'_>, format: ReportFormat) -> Result<String, ReportError> {
    Ok(match format {
        ReportFormat::Json => json::render(diff)?,
        ReportFormat::Text => text::render_diff(diff),
        ReportFormat::Markdown => markdown::render_diff(diff),
    })
}

/// Write rendered text to `path`, replacing any existing file
pub fn write_report(path: &Path, text: &str) -> Result<(), ReportError> {
    std::fs::write(path, text).map_err(|source| ReportError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!("Report written to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::compare;
    use crate::model::{
        Band, BandStat, ExtendedStats, KeyInfo, Loudness, Measurements, ProbeInfo, SilenceSpan,
        SpectralStats, StereoReading, VolumeReading,
    };
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn measurements(input: &str) -> Measurements {
        let mut m = Measurements::new(
            input,
            ProbeInfo {
                format_name: "wav".to_string(),
                duration_secs: 20.0,
                sample_rate: 44100,
                channels: 2,
                bit_rate: 1_411_200,
                bit_depth: 16,
            },
        );
        m.analyzed_at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        m.volume = Some(VolumeReading {
            peak_db: -0.3,
            rms_db: -14.2,
        });
        m.stereo = Some(StereoReading {
            mid_rms_db: -15.0,
            side_rms_db: -27.0,
            correlation: None,
        });
        m
    }

    fn minimal() -> Analysis {
        Analysis::from_measurements(measurements("/music/a.wav"))
    }

    fn full() -> Analysis {
        let mut m = measurements("/music/b.wav");
        let mut extended = ExtendedStats::default();
        extended.insert(ExtendedStats::DC_OFFSET, 0.00012);
        extended.insert(ExtendedStats::ZERO_CROSSINGS_RATE, 0.05);
        extended.insert("noise_floor_db", -70.0);
        extended.insert(ExtendedStats::CLIPPED_SAMPLES, 1764.0);
        m.extended = Some(extended);
        m.loudness = Some(Loudness {
            integrated_lufs: -9.5,
            range_lu: 4.25,
            true_peak_dbtp: Some(0.4),
        });
        m.stereo = Some(StereoReading {
            mid_rms_db: -15.0,
            side_rms_db: -21.0,
            correlation: Some(0.1),
        });
        m.spectral = Some(SpectralStats {
            centroid_hz: Some(2345.6),
            flatness: Some(0.61),
            ..SpectralStats::default()
        });
        m.bands = vec![BandStat {
            band: Band::new(20.0, 60.0),
            peak_db: -6.0,
            rms_db: -20.5,
        }];
        m.silence = Some(vec![SilenceSpan::new(2.0, 4.0)]);
        m.tempo_series = Some(vec![128.0]);
        m.onsets = Some(crate::model::OnsetReading { events: 40 });
        m.pitch_series = Some(vec![440.0]);
        m.key = Some(KeyInfo {
            key: Some("A".to_string()),
            scale: Some("minor".to_string()),
            confidence: Some(0.8),
        });
        Analysis::from_measurements(m)
    }

    #[test]
    fn test_text_minimal_omits_absent_sections() {
        let text = render_analysis(&minimal(), ReportFormat::Text).unwrap();
        let expected = "\
File: /music/a.wav
When: 2024-05-01T12:00:00Z

Format: wav | Duration: 20.000s | SR: 44100 Hz | Ch: 2 | Bitrate: 1411200 bps | BitDepth: 16
Levels: Peak -0.30 dBFS | RMS -14.20 dBFS | Crest 13.90 dB | Headroom 0.30 dB | DC 0.0000 | ZeroX 0.00 | NoiseFloor 0.00 dBFS
Stereo: Mid RMS -15.00 dB | Side RMS -27.00 dB | Side/Mid -12.00 dB
";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_text_full() {
        let text = render_analysis(&full(), ReportFormat::Text).unwrap();
        assert!(text.contains("| TruePeak 0.40 dBTP | Clips 1764 (0.100%) | DC 0.0001 |"));
        assert!(text.contains(
            "LUFS: Integrated -9.50 LUFS | Range 4.25 LU | TruePeak 0.40 dBTP\n"
        ));
        assert!(text.contains(
            "Stereo: Mid RMS -15.00 dB | Side RMS -21.00 dB | Side/Mid -6.00 dB | Corr 0.10\n"
        ));
        assert!(text.contains("Spectral: Centroid 2346 Hz | Flatness 0.610\n"));
        assert!(text.contains(
            "Tempo: BPM med 128.00 | mean 128.00 | std 0.00 | events 40 | onsets/min 120.00\n"
        ));
        assert!(text.contains(
            "Pitch: median 440.00 Hz | mean 440.00 Hz | min/max 440.00/440.00 Hz | MIDI 69.0 | note A4\n"
        ));
        assert!(text.contains("Key: A minor (conf 0.80)\n"));
        assert!(text.contains(
            "\nBand Loudness (dBFS):\n      20-60     Hz : peak   -6.00 | rms  -20.50\n"
        ));
        assert!(text.contains(
            "\nSilence spans:\n  2.000 → 4.000 (2.000s)\nTotal silence: 2.000s\nSilence ratio: 10.00% of duration\n"
        ));
        assert!(text.ends_with(
            "\nNotes:\n  - Clipping detected: 1764 samples (0.100%)\n  - True peak dangerously high (0.40 dBTP). Consider -1.5 dBTP ceiling.\n  - High spectral flatness → noise-like content.\n  - Low L/R correlation → wide or phasey stereo.\n"
        ));
    }

    #[test]
    fn test_markdown_sections() {
        let md = render_analysis(&full(), ReportFormat::Markdown).unwrap();
        assert!(md.starts_with("# Analysis: b.wav\n\n- When: `2024-05-01T12:00:00Z`\n"));
        assert!(md.contains("## Loudness (EBU R128)\n- Integrated: `-9.50 LUFS`\n"));
        assert!(md.contains(
            "## Band Loudness\n\n| Band (Hz) | Peak (dBFS) | RMS (dBFS) |\n|---:|---:|---:|\n| 20–60 | -6.00 | -20.50 |\n"
        ));
        assert!(md.contains("- Silence ratio: `10.00%`\n"));

        let md = render_analysis(&minimal(), ReportFormat::Markdown).unwrap();
        assert!(!md.contains("## Loudness"));
        assert!(!md.contains("## Band Loudness"));
        assert!(!md.contains("## Silence"));
        assert!(!md.contains("## Notes"));
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let analysis = full();
        for format in [ReportFormat::Json, ReportFormat::Text, ReportFormat::Markdown] {
            let first = render_analysis(&analysis, format).unwrap();
            let second = render_analysis(&analysis, format).unwrap();
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_json_uses_null_for_absent() {
        let json = render_analysis(&minimal(), ReportFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value["loudness"].is_null());
        assert!(value["tempo"].is_null());
        assert!(value["spectral"]["centroid_hz"].is_null());
        assert_eq!(value["level"]["crest_db"].as_f64(), Some(-0.3 - -14.2));
        assert!(json.ends_with("}\n"));
    }

    #[test]
    fn test_diff_text() {
        let (a, b) = (minimal(), full());
        let text = render_diff(&compare(&a, &b), ReportFormat::Text).unwrap();
        let expected = "\
COMPARE: /music/a.wav vs /music/b.wav

peak_db              :   +0.000
rms_db               :   +0.000
crest_db             :   +0.000
stereo_side_mid_db   :   +6.000
duration_s           :   +0.000
";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_diff_markdown_skips_one_sided_rows() {
        let (a, b) = (minimal(), full());
        let md = render_diff(&compare(&a, &b), ReportFormat::Markdown).unwrap();
        let expected = "\
# Compare: a.wav ↔ b.wav

| Metric | a.wav | b.wav | Δ (B-A) |
|---|---:|---:|---:|
| Peak dBFS | -0.30 | -0.30 | 0.00 |
| RMS dBFS | -14.20 | -14.20 | 0.00 |
| Crest dB | 13.90 | 13.90 | 0.00 |
| Side/Mid dB | -12.00 | -6.00 | 6.00 |
| Duration (s) | 20.000 | 20.000 | 0.000 |
";
        assert_eq!(md, expected);
    }

    #[test]
    fn test_diff_json_keys() {
        let (a, b) = (minimal(), full());
        let json = render_diff(&compare(&a, &b), ReportFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let keys: Vec<&str> = value["delta"]
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(
            keys,
            vec!["crest_db", "duration_s", "peak_db", "rms_db", "stereo_side_mid_db"]
        );
        assert_eq!(value["a"]["input"], "/music/a.wav");
    }

    #[test]
    fn test_write_report_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.log");
        let err = write_report(&path, "x").unwrap_err();
        assert!(matches!(err, ReportError::Write { .. }));
    }
}
