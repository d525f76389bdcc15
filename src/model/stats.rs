use crate::analysis::stats;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Container and stream facts from the mandatory probe
///
/// Unknown values are zero rather than absent: the probe either succeeds as a
/// whole or aborts the analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProbeInfo {
    /// Container format name as reported by the prober (e.g. "flac")
    pub format_name: String,

    /// Duration in seconds
    pub duration_secs: f64,

    /// Sample rate in Hz
    pub sample_rate: u32,

    /// Channel count
    pub channels: u32,

    /// Overall bit rate in bits per second
    pub bit_rate: u64,

    /// Bits per sample (0 for lossy codecs)
    pub bit_depth: u32,
}

/// A frequency band, `[lo_hz, hi_hz)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub lo_hz: f64,
    pub hi_hz: f64,
}

impl Band {
    pub fn new(lo_hz: f64, hi_hz: f64) -> Self {
        Self { lo_hz, hi_hz }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.lo_hz, self.hi_hz)
    }
}

/// Peak and mean level of one volume pass, in dBFS
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VolumeReading {
    pub peak_db: f64,
    pub rms_db: f64,
}

/// Named overall statistics from the extended statistics pass
///
/// Keys are lower-case snake case (`dc_offset`, `zero_crossings_rate`, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtendedStats(pub std::collections::BTreeMap<String, f64>);

impl ExtendedStats {
    pub const DC_OFFSET: &'static str = "dc_offset";
    pub const ZERO_CROSSINGS_RATE: &'static str = "zero_crossings_rate";
    pub const NOISE_FLOOR: &'static [&'static str] = &["noise_floor_db", "noise_floor"];
    pub const CLIPPED_SAMPLES: &'static str = "number_of_clipped_samples";
    /// Not emitted by astats; a provider that measures true peak during the
    /// level pass may supply it, otherwise loudness back-fills it
    pub const TRUE_PEAK: &'static str = "true_peak_dbtp";

    pub fn get(&self, key: &str) -> Option<f64> {
        self.0.get(key).copied()
    }

    /// First present value among several spellings of the same statistic
    pub fn get_any(&self, keys: &[&str]) -> Option<f64> {
        keys.iter().find_map(|k| self.get(k))
    }

    pub fn insert(&mut self, key: impl Into<String>, value: f64) {
        self.0.insert(key.into(), value);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Level statistics with crest, headroom and clip percentage derived on construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelStats {
    peak_db: f64,
    rms_db: f64,
    crest_db: f64,
    true_peak_dbtp: Option<f64>,
    headroom_db: f64,
    dc_offset: f64,
    zero_crossing_rate: f64,
    noise_floor_db: f64,
    clipped_samples: Option<u64>,
    clipped_percent: Option<f64>,
}

impl LevelStats {
    /// Derive level statistics from the raw readings
    ///
    /// Order: peak/RMS, crest, headroom, clip percentage, then the true peak
    /// is back-filled from `loudness` when the level pass did not report one.
    pub fn new(
        volume: VolumeReading,
        extended: Option<&ExtendedStats>,
        probe: &ProbeInfo,
        loudness: Option<&Loudness>,
    ) -> Self {
        let crest_db = stats::crest_db(volume.peak_db, volume.rms_db);
        let headroom_db = stats::headroom_db(volume.peak_db);

        let clipped_samples = extended
            .and_then(|e| e.get(ExtendedStats::CLIPPED_SAMPLES))
            .filter(|c| c.is_finite() && *c >= 0.0)
            .map(|c| c.round() as u64);
        let clipped_percent = clipped_samples.and_then(|count| stats::clip_percent(count, probe));

        let true_peak_dbtp = extended
            .and_then(|e| e.get(ExtendedStats::TRUE_PEAK))
            .or_else(|| loudness.and_then(|l| l.true_peak_dbtp));

        Self {
            peak_db: volume.peak_db,
            rms_db: volume.rms_db,
            crest_db,
            true_peak_dbtp,
            headroom_db,
            dc_offset: extended
                .and_then(|e| e.get(ExtendedStats::DC_OFFSET))
                .unwrap_or_default(),
            zero_crossing_rate: extended
                .and_then(|e| e.get(ExtendedStats::ZERO_CROSSINGS_RATE))
                .unwrap_or_default(),
            noise_floor_db: extended
                .and_then(|e| e.get_any(ExtendedStats::NOISE_FLOOR))
                .unwrap_or_default(),
            clipped_samples,
            clipped_percent,
        }
    }

    pub fn peak_db(&self) -> f64 {
        self.peak_db
    }

    pub fn rms_db(&self) -> f64 {
        self.rms_db
    }

    /// Peak minus RMS
    pub fn crest_db(&self) -> f64 {
        self.crest_db
    }

    pub fn true_peak_dbtp(&self) -> Option<f64> {
        self.true_peak_dbtp
    }

    /// Distance from the peak to 0 dBFS
    pub fn headroom_db(&self) -> f64 {
        self.headroom_db
    }

    pub fn dc_offset(&self) -> f64 {
        self.dc_offset
    }

    pub fn zero_crossing_rate(&self) -> f64 {
        self.zero_crossing_rate
    }

    pub fn noise_floor_db(&self) -> f64 {
        self.noise_floor_db
    }

    pub fn clipped_samples(&self) -> Option<u64> {
        self.clipped_samples
    }

    /// Clipped samples as a percentage of all samples across channels
    pub fn clipped_percent(&self) -> Option<f64> {
        self.clipped_percent
    }
}

/// EBU R128 loudness summary
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Loudness {
    /// Integrated loudness (LUFS)
    pub integrated_lufs: f64,

    /// Loudness range (LU)
    pub range_lu: f64,

    /// True peak (dBTP), when the meter reported one
    pub true_peak_dbtp: Option<f64>,
}

/// Loudness of one configured band
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandStat {
    pub band: Band,
    pub peak_db: f64,
    pub rms_db: f64,
}

/// Raw mid/side measurement from the stereo probe
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StereoReading {
    pub mid_rms_db: f64,
    pub side_rms_db: f64,
    pub correlation: Option<f64>,
}

/// Mid/side balance with the side/mid ratio derived on construction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StereoStats {
    mid_rms_db: f64,
    side_rms_db: f64,
    side_mid_ratio_db: f64,
    correlation: Option<f64>,
}

impl StereoStats {
    pub fn new(reading: StereoReading) -> Self {
        Self {
            mid_rms_db: reading.mid_rms_db,
            side_rms_db: reading.side_rms_db,
            side_mid_ratio_db: reading.side_rms_db - reading.mid_rms_db,
            correlation: reading.correlation.map(|c| c.clamp(-1.0, 1.0)),
        }
    }

    pub fn mid_rms_db(&self) -> f64 {
        self.mid_rms_db
    }

    pub fn side_rms_db(&self) -> f64 {
        self.side_rms_db
    }

    pub fn side_mid_ratio_db(&self) -> f64 {
        self.side_mid_ratio_db
    }

    /// L/R correlation in [-1, 1]
    pub fn correlation(&self) -> Option<f64> {
        self.correlation
    }
}

impl Default for StereoStats {
    fn default() -> Self {
        Self::new(StereoReading::default())
    }
}

/// Spectral shape descriptors; zero is a valid value, so each is optional
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SpectralStats {
    pub centroid_hz: Option<f64>,
    pub rolloff95_hz: Option<f64>,
    pub flatness: Option<f64>,
    pub spread: Option<f64>,
    pub skewness: Option<f64>,
    pub kurtosis: Option<f64>,
}

impl SpectralStats {
    pub fn is_empty(&self) -> bool {
        self.centroid_hz.is_none()
            && self.rolloff95_hz.is_none()
            && self.flatness.is_none()
            && self.spread.is_none()
            && self.skewness.is_none()
            && self.kurtosis.is_none()
    }
}

/// Onset detector result
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OnsetReading {
    pub events: u64,
}

/// Tempo statistics derived from a BPM series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TempoStats {
    bpm_median: f64,
    bpm_mean: f64,
    bpm_std: f64,
    onset_events: Option<u64>,
    onsets_per_minute: Option<f64>,
}

impl TempoStats {
    /// Returns `None` for an empty series.
    pub fn from_series(
        series: &[f64],
        onset_events: Option<u64>,
        duration_secs: f64,
    ) -> Option<Self> {
        let mut sorted: Vec<f64> = series.iter().copied().filter(|v| v.is_finite()).collect();
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_by(f64::total_cmp);

        let bpm_mean = stats::mean(&sorted);
        Some(Self {
            bpm_median: stats::median(&sorted),
            bpm_mean,
            bpm_std: stats::sample_std_dev(&sorted, bpm_mean),
            onset_events,
            onsets_per_minute: onset_events.and_then(|n| stats::per_minute(n, duration_secs)),
        })
    }

    pub fn bpm_median(&self) -> f64 {
        self.bpm_median
    }

    pub fn bpm_mean(&self) -> f64 {
        self.bpm_mean
    }

    /// Sample standard deviation; 0 for a single estimate
    pub fn bpm_std(&self) -> f64 {
        self.bpm_std
    }

    pub fn onset_events(&self) -> Option<u64> {
        self.onset_events
    }

    pub fn onsets_per_minute(&self) -> Option<f64> {
        self.onsets_per_minute
    }
}

/// Pitch statistics derived from a series of f0 estimates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PitchStats {
    hz_median: f64,
    hz_mean: f64,
    hz_min: f64,
    hz_max: f64,
    midi_median: f64,
    note: String,
}

impl PitchStats {
    /// Non-positive estimates are unvoiced frames and are ignored.
    /// Returns `None` when nothing voiced remains.
    pub fn from_series(series: &[f64]) -> Option<Self> {
        let mut hz: Vec<f64> = series
            .iter()
            .copied()
            .filter(|v| v.is_finite() && *v > 0.0)
            .collect();
        if hz.is_empty() {
            return None;
        }
        hz.sort_by(f64::total_cmp);

        let hz_median = stats::median(&hz);
        let midi_median = stats::hz_to_midi(hz_median);
        Some(Self {
            hz_median,
            hz_mean: stats::mean(&hz),
            hz_min: hz[0],
            hz_max: hz[hz.len() - 1],
            midi_median,
            note: stats::note_name(midi_median.round() as i32),
        })
    }

    pub fn hz_median(&self) -> f64 {
        self.hz_median
    }

    pub fn hz_mean(&self) -> f64 {
        self.hz_mean
    }

    pub fn hz_min(&self) -> f64 {
        self.hz_min
    }

    pub fn hz_max(&self) -> f64 {
        self.hz_max
    }

    pub fn midi_median(&self) -> f64 {
        self.midi_median
    }

    /// Nearest note to the median, e.g. "A4"
    pub fn note(&self) -> &str {
        &self.note
    }
}

/// Key estimate
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyInfo {
    /// Tonic, A-G with an optional accidental
    pub key: Option<String>,

    /// Mode name ("major", "minor", "dorian", ...)
    pub scale: Option<String>,

    /// Detector confidence in [0, 1]
    pub confidence: Option<f64>,
}

/// A detected silence, in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SilenceSpan {
    pub start: f64,
    pub end: f64,
}

impl SilenceSpan {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}
