//! Measurement provider trait and probe errors

use crate::model::{
    Band, ExtendedStats, KeyInfo, Loudness, OnsetReading, ProbeInfo, SilenceSpan, SpectralStats,
    StereoReading, VolumeReading,
};
use crate::segment::Segment;
use std::path::Path;

pub type ProbeResult<T> = Result<T, ProbeError>;

/// Why a single probe produced no data
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("tool not found: {0}")]
    ToolMissing(String),

    #[error("failed to run {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} exited with {status}: {detail}")]
    Failed {
        tool: String,
        status: String,
        detail: String,
    },

    #[error("{0} timed out")]
    TimedOut(String),

    #[error("{0} cancelled")]
    Cancelled(String),

    #[error("could not parse {0} output")]
    Parse(String),

    #[error("{0} unavailable")]
    Unavailable(String),
}

/// Independent measurement capabilities over one input
///
/// Every method succeeds or fails atomically. Implementations must be
/// shareable across the probe worker threads.
pub trait MeasurementProvider: Sync {
    /// Format, duration and stream geometry; the only mandatory probe
    fn probe(&self, input: &Path) -> ProbeResult<ProbeInfo>;

    /// Whole-file peak and RMS level
    fn level_volume(&self, input: &Path) -> ProbeResult<VolumeReading>;

    /// Named overall statistics (DC offset, zero crossings, noise floor, ...)
    ///
    /// `window_secs` > 0 asks for windowed measurement.
    fn extended_stats(&self, input: &Path, window_secs: f64) -> ProbeResult<ExtendedStats>;

    /// EBU R128 integrated loudness, range and true peak
    fn loudness(&self, input: &Path) -> ProbeResult<Loudness>;

    /// Peak and RMS of the input band-limited to `band`
    fn band_loudness(&self, input: &Path, band: Band) -> ProbeResult<VolumeReading>;

    /// Mid/side levels and L/R correlation
    fn stereo_stats(&self, input: &Path) -> ProbeResult<StereoReading>;

    fn spectral_stats(&self, input: &Path) -> ProbeResult<SpectralStats>;

    /// Silences below `threshold_db`, ordered by start time
    fn silence_spans(&self, input: &Path, threshold_db: f64) -> ProbeResult<Vec<SilenceSpan>>;

    /// Raw BPM estimates; fails when no estimate is produced
    fn tempo_series(&self, input: &Path) -> ProbeResult<Vec<f64>>;

    /// Onset event count; the per-minute rate is derived from it and the duration
    fn onset_rate(&self, input: &Path) -> ProbeResult<OnsetReading>;

    /// Raw f0 estimates in Hz (non-positive values mark unvoiced frames)
    fn pitch_series(&self, input: &Path) -> ProbeResult<Vec<f64>>;

    fn key_guess(&self, input: &Path) -> ProbeResult<KeyInfo>;

    /// Copy `segment` of the input to `output` without re-encoding
    fn cut_segment(&self, input: &Path, segment: Segment, output: &Path) -> ProbeResult<()>;
}
