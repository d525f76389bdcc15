use super::stats::{
    BandStat, ExtendedStats, KeyInfo, LevelStats, Loudness, OnsetReading, PitchStats, ProbeInfo,
    SilenceSpan, SpectralStats, StereoReading, StereoStats, TempoStats, VolumeReading,
};
use crate::analysis::{notes, stats};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Raw probe results for one input, before any derivation
///
/// `None` means the probe failed, was disabled or timed out.
#[derive(Debug, Clone, Default)]
pub struct Measurements {
    pub input: String,
    pub analyzed_at: DateTime<Utc>,
    pub probe: ProbeInfo,
    pub volume: Option<VolumeReading>,
    pub extended: Option<ExtendedStats>,
    pub loudness: Option<Loudness>,
    pub stereo: Option<StereoReading>,
    pub spectral: Option<SpectralStats>,
    /// Successful band measurements, in configured order
    pub bands: Vec<BandStat>,
    pub silence: Option<Vec<SilenceSpan>>,
    pub tempo_series: Option<Vec<f64>>,
    pub onsets: Option<OnsetReading>,
    pub pitch_series: Option<Vec<f64>>,
    pub key: Option<KeyInfo>,
}

impl Measurements {
    /// Start a record from a successful mandatory probe
    pub fn new(input: impl Into<String>, probe: ProbeInfo) -> Self {
        Self {
            input: input.into(),
            analyzed_at: Utc::now(),
            probe,
            ..Self::default()
        }
    }
}

/// Complete analysis of one input
///
/// Built once by [`Analysis::from_measurements`] and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    input: String,
    analyzed_at: DateTime<Utc>,
    probe: ProbeInfo,
    level: LevelStats,
    loudness: Option<Loudness>,
    stereo: StereoStats,
    spectral: SpectralStats,
    bands: Vec<BandStat>,
    tempo: Option<TempoStats>,
    pitch: Option<PitchStats>,
    key: Option<KeyInfo>,
    silence: Vec<SilenceSpan>,
    silence_total_secs: Option<f64>,
    silence_ratio: Option<f64>,
    notes: Vec<String>,
}

impl Analysis {
    /// Fold raw measurements into an analysis, computing every derived field
    pub fn from_measurements(m: Measurements) -> Self {
        let duration = m.probe.duration_secs;

        let level = LevelStats::new(
            m.volume.unwrap_or_default(),
            m.extended.as_ref(),
            &m.probe,
            m.loudness.as_ref(),
        );
        let stereo = StereoStats::new(m.stereo.unwrap_or_default());
        let spectral = m.spectral.unwrap_or_default();

        let tempo = m.tempo_series.as_deref().and_then(|series| {
            TempoStats::from_series(series, m.onsets.map(|o| o.events), duration)
        });
        let pitch = m.pitch_series.as_deref().and_then(PitchStats::from_series);
        // An empty key guess carries nothing
        let key = m.key.filter(|k| k.key.is_some() || k.scale.is_some() || k.confidence.is_some());

        let silence = m.silence.unwrap_or_default();
        let silence_total_secs = stats::silence_total(&silence);
        let silence_ratio =
            silence_total_secs.and_then(|total| stats::silence_ratio(total, duration));

        let notes = notes::diagnose(&level, &spectral, &stereo);

        Self {
            input: m.input,
            analyzed_at: m.analyzed_at,
            probe: m.probe,
            level,
            loudness: m.loudness,
            stereo,
            spectral,
            bands: m.bands,
            tempo,
            pitch,
            key,
            silence,
            silence_total_secs,
            silence_ratio,
            notes,
        }
    }

    /// Input identifier (the path as given)
    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn analyzed_at(&self) -> DateTime<Utc> {
        self.analyzed_at
    }

    pub fn probe(&self) -> &ProbeInfo {
        &self.probe
    }

    pub fn level(&self) -> &LevelStats {
        &self.level
    }

    pub fn loudness(&self) -> Option<&Loudness> {
        self.loudness.as_ref()
    }

    pub fn stereo(&self) -> &StereoStats {
        &self.stereo
    }

    pub fn spectral(&self) -> &SpectralStats {
        &self.spectral
    }

    pub fn bands(&self) -> &[BandStat] {
        &self.bands
    }

    pub fn tempo(&self) -> Option<&TempoStats> {
        self.tempo.as_ref()
    }

    pub fn pitch(&self) -> Option<&PitchStats> {
        self.pitch.as_ref()
    }

    pub fn key(&self) -> Option<&KeyInfo> {
        self.key.as_ref()
    }

    pub fn silence(&self) -> &[SilenceSpan] {
        &self.silence
    }

    pub fn silence_total_secs(&self) -> Option<f64> {
        self.silence_total_secs
    }

    /// Fraction of the duration that is silent
    pub fn silence_ratio(&self) -> Option<f64> {
        self.silence_ratio
    }

    pub fn notes(&self) -> &[String] {
        &self.notes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probe() -> ProbeInfo {
        ProbeInfo {
            format_name: "flac".to_string(),
            duration_secs: 20.0,
            sample_rate: 44100,
            channels: 2,
            bit_rate: 900_000,
            bit_depth: 16,
        }
    }

    #[test]
    fn test_minimal_measurements() {
        let analysis = Analysis::from_measurements(Measurements::new("a.flac", probe()));

        assert_eq!(analysis.input(), "a.flac");
        assert_eq!(analysis.level().peak_db(), 0.0);
        assert!(analysis.loudness().is_none());
        assert!(analysis.spectral().is_empty());
        assert!(analysis.bands().is_empty());
        assert!(analysis.tempo().is_none());
        assert!(analysis.pitch().is_none());
        assert!(analysis.key().is_none());
        assert!(analysis.silence().is_empty());
        assert!(analysis.silence_total_secs().is_none());
        assert!(analysis.silence_ratio().is_none());
        assert!(analysis.notes().is_empty());
    }

    #[test]
    fn test_silence_derivations() {
        let mut m = Measurements::new("a.flac", probe());
        m.silence = Some(vec![SilenceSpan::new(2.0, 4.0), SilenceSpan::new(10.0, 11.0)]);

        let analysis = Analysis::from_measurements(m);
        assert_eq!(analysis.silence().len(), 2);
        assert_eq!(analysis.silence_total_secs(), Some(3.0));
        assert_eq!(analysis.silence_ratio(), Some(0.15));
    }

    #[test]
    fn test_silence_ratio_needs_duration() {
        let mut m = Measurements::new("a.flac", ProbeInfo::default());
        m.silence = Some(vec![SilenceSpan::new(0.0, 1.0)]);

        let analysis = Analysis::from_measurements(m);
        assert_eq!(analysis.silence_total_secs(), Some(1.0));
        assert!(analysis.silence_ratio().is_none());
    }

    #[test]
    fn test_empty_key_guess_is_dropped() {
        let mut m = Measurements::new("a.flac", probe());
        m.key = Some(KeyInfo::default());
        assert!(Analysis::from_measurements(m).key().is_none());
    }

    #[test]
    fn test_empty_tempo_series_has_no_stats() {
        let mut m = Measurements::new("a.flac", probe());
        m.tempo_series = Some(Vec::new());
        m.onsets = Some(OnsetReading { events: 12 });
        assert!(Analysis::from_measurements(m).tempo().is_none());
    }
}
