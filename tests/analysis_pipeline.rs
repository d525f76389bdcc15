use analit::model::{
    Band, ExtendedStats, KeyInfo, Loudness, OnsetReading, ProbeInfo, SilenceSpan, SpectralStats,
    StereoReading, VolumeReading,
};
use analit::provider::ScriptedProvider;
use analit::{
    compare, render_analysis, render_diff, write_report, Analysis, AnalysisConfig, Analyzer,
    Metric, ReportFormat, TempoEngine,
};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn probe(duration_secs: f64) -> ProbeInfo {
    ProbeInfo {
        format_name: "flac".to_string(),
        duration_secs,
        sample_rate: 44100,
        channels: 2,
        bit_rate: 900_000,
        bit_depth: 24,
    }
}

fn reading(peak_db: f64, rms_db: f64) -> VolumeReading {
    VolumeReading { peak_db, rms_db }
}

/// Provider with every capability answering
fn full_provider(duration_secs: f64, peak_db: f64) -> ScriptedProvider {
    let mut provider = ScriptedProvider::new(probe(duration_secs));
    provider.volume = Some(VolumeReading {
        peak_db,
        rms_db: peak_db - 11.0,
    });
    let mut extended = ExtendedStats::default();
    extended.insert(ExtendedStats::DC_OFFSET, 0.0002);
    extended.insert(ExtendedStats::ZERO_CROSSINGS_RATE, 0.07);
    extended.insert("noise_floor_db", -82.0);
    provider.extended = Some(extended);
    provider.loudness = Some(Loudness {
        integrated_lufs: -13.5,
        range_lu: 7.0,
        true_peak_dbtp: Some(-1.6),
    });
    provider.stereo = Some(StereoReading {
        mid_rms_db: -14.0,
        side_rms_db: -24.0,
        correlation: Some(0.72),
    });
    provider.spectral = Some(SpectralStats {
        centroid_hz: Some(1800.0),
        rolloff95_hz: Some(9500.0),
        flatness: Some(0.12),
        spread: Some(2100.0),
        skewness: Some(2.5),
        kurtosis: Some(11.0),
    });
    provider.bands = vec![
        (Band::new(20.0, 60.0), reading(-8.0, -22.0)),
        (Band::new(60.0, 120.0), reading(-5.0, -18.0)),
    ];
    provider.silence = Some(vec![SilenceSpan::new(0.0, 1.5), SilenceSpan::new(58.0, 60.0)]);
    provider.tempo = Some(vec![126.0, 125.5, 126.2, 126.0]);
    provider.onsets = Some(OnsetReading { events: 240 });
    provider.pitch = Some(vec![0.0, 220.0, 221.0, 0.0, 219.0]);
    provider.key = Some(KeyInfo {
        key: Some("D".to_string()),
        scale: Some("minor".to_string()),
        confidence: Some(0.66),
    });
    provider
}

fn config(dir: &Path) -> AnalysisConfig {
    AnalysisConfig::new(dir.join("out.log"))
        .with_bands(vec![Band::new(20.0, 60.0), Band::new(60.0, 120.0)])
        .with_tempo_engine(TempoEngine::Aubio)
        .with_workers(3)
}

fn input_file(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, b"not really audio").unwrap();
    path
}

#[test]
fn test_full_analysis() {
    let dir = TempDir::new().unwrap();
    let input = input_file(dir.path(), "track.flac");

    let analyzer = Analyzer::new(config(dir.path()), full_provider(60.0, -0.5)).unwrap();
    let analysis = analyzer.analyze(&input).unwrap();

    assert_eq!(analysis.level().crest_db(), 11.0);
    assert_eq!(analysis.level().headroom_db(), 0.5);
    assert_eq!(analysis.level().true_peak_dbtp(), Some(-1.6));
    assert_eq!(analysis.level().noise_floor_db(), -82.0);
    assert_eq!(analysis.stereo().side_mid_ratio_db(), -10.0);
    assert_eq!(analysis.bands().len(), 2);

    let tempo = analysis.tempo().unwrap();
    assert_eq!(tempo.bpm_median(), 126.0);
    assert_eq!(tempo.onsets_per_minute(), Some(240.0));

    let pitch = analysis.pitch().unwrap();
    assert_eq!(pitch.hz_median(), 220.0);
    assert_eq!(pitch.note(), "A3");

    assert_eq!(analysis.silence_total_secs(), Some(3.5));
    let ratio = analysis.silence_ratio().unwrap();
    assert!((ratio - 3.5 / 60.0).abs() < 1e-12);
    assert!(analysis.notes().is_empty());
}

#[test]
fn test_partial_failure_still_reports() {
    let dir = TempDir::new().unwrap();
    let input = input_file(dir.path(), "track.flac");

    let mut provider = full_provider(60.0, -0.5);
    provider.volume = None;
    provider.loudness = None;
    provider.stereo = None;
    provider.tempo = None;
    provider.key = None;
    provider.bands.remove(0);

    let analyzer = Analyzer::new(config(dir.path()), provider).unwrap();
    let analysis = analyzer.analyze(&input).unwrap();

    assert_eq!(analysis.level().peak_db(), 0.0);
    assert_eq!(analysis.level().rms_db(), 0.0);
    assert!(analysis.level().true_peak_dbtp().is_none());
    assert!(analysis.loudness().is_none());
    assert_eq!(analysis.stereo().mid_rms_db(), 0.0);
    assert!(analysis.stereo().correlation().is_none());
    assert!(analysis.tempo().is_none());
    assert!(analysis.key().is_none());
    assert_eq!(analysis.bands().len(), 1);
    assert_eq!(analysis.bands()[0].band, Band::new(60.0, 120.0));

    let text = render_analysis(&analysis, ReportFormat::Text).unwrap();
    assert!(!text.contains("LUFS:"));
    assert!(!text.contains("Tempo:"));
    assert!(!text.contains("Key:"));
}

#[test]
fn test_json_report_round_trips() {
    let dir = TempDir::new().unwrap();
    let input = input_file(dir.path(), "track.flac");
    let cfg = config(dir.path()).with_report_format(ReportFormat::Json);

    let analyzer = Analyzer::new(cfg.clone(), full_provider(60.0, 0.2)).unwrap();
    let analysis = analyzer.analyze(&input).unwrap();

    let text = render_analysis(&analysis, cfg.report_format).unwrap();
    write_report(&cfg.output_path, &text).unwrap();

    let written = fs::read_to_string(&cfg.output_path).unwrap();
    let parsed: Analysis = serde_json::from_str(&written).unwrap();
    assert_eq!(parsed, analysis);
}

#[test]
fn test_json_round_trip_keeps_absent_fields_absent() {
    let dir = TempDir::new().unwrap();
    let input = input_file(dir.path(), "bare.wav");

    // Only the mandatory probe answers
    let provider = ScriptedProvider::new(probe(30.0));
    let analyzer = Analyzer::new(config(dir.path()), provider).unwrap();
    let analysis = analyzer.analyze(&input).unwrap();

    let json = render_analysis(&analysis, ReportFormat::Json).unwrap();
    let parsed: Analysis = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, analysis);

    assert!(parsed.loudness().is_none());
    assert!(parsed.tempo().is_none());
    assert!(parsed.pitch().is_none());
    assert!(parsed.key().is_none());
    assert!(parsed.level().clipped_samples().is_none());
    assert!(parsed.level().true_peak_dbtp().is_none());
    assert!(parsed.stereo().correlation().is_none());
    assert!(parsed.silence_total_secs().is_none());
    assert!(parsed.bands().is_empty());
}

#[test]
fn test_compare_reports() {
    let dir = TempDir::new().unwrap();
    let input_a = input_file(dir.path(), "a.flac");
    let input_b = input_file(dir.path(), "b.flac");

    let analyzer_a = Analyzer::new(config(dir.path()), full_provider(60.0, -3.0)).unwrap();
    let analysis_a = analyzer_a.analyze(&input_a).unwrap();

    let mut provider_b = full_provider(62.5, -1.0);
    provider_b.tempo = None;
    let analyzer_b = Analyzer::new(config(dir.path()), provider_b).unwrap();
    let analysis_b = analyzer_b.analyze(&input_b).unwrap();

    let diff = compare(&analysis_a, &analysis_b);
    assert_eq!(diff.get(Metric::PeakDb), Some(2.0));
    assert_eq!(diff.get(Metric::LufsIntegrated), Some(0.0));
    assert_eq!(diff.get(Metric::DurationS), Some(2.5));
    assert!(diff.get(Metric::BpmMedian).is_none());

    let text = render_diff(&diff, ReportFormat::Text).unwrap();
    assert!(text.contains("peak_db              :   +2.000\n"));
    assert!(!text.contains("bpm_median"));

    let md = render_diff(&diff, ReportFormat::Markdown).unwrap();
    assert!(md.contains("| Metric | a.flac | b.flac | Δ (B-A) |\n"));
    assert!(md.contains("| Duration (s) | 60.000 | 62.500 | 2.500 |\n"));
    assert!(!md.contains("BPM"));
}

#[test]
fn test_clipping_notes_end_to_end() {
    let dir = TempDir::new().unwrap();
    let input = input_file(dir.path(), "hot.flac");

    let mut provider = full_provider(10.0, 0.0);
    if let Some(extended) = provider.extended.as_mut() {
        extended.insert(ExtendedStats::CLIPPED_SAMPLES, 882.0);
    }
    if let Some(loudness) = provider.loudness.as_mut() {
        loudness.true_peak_dbtp = Some(0.3);
    }

    let analyzer = Analyzer::new(config(dir.path()), provider).unwrap();
    let analysis = analyzer.analyze(&input).unwrap();

    assert_eq!(analysis.level().clipped_percent(), Some(0.1));
    assert_eq!(
        analysis.notes(),
        [
            "Clipping detected: 882 samples (0.100%)".to_string(),
            "True peak dangerously high (0.30 dBTP). Consider -1.5 dBTP ceiling.".to_string(),
        ]
    );
}

#[test]
fn test_missing_input_file() {
    let dir = TempDir::new().unwrap();
    let analyzer = Analyzer::new(config(dir.path()), full_provider(60.0, -1.0)).unwrap();
    assert!(analyzer.analyze(&dir.path().join("absent.flac")).is_err());
    assert!(analyzer.analyze(dir.path()).is_err());
}
