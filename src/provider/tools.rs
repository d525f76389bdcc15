//! Provider backed by the installed command-line tools

use super::aubio::Aubio;
use super::ffmpeg::Ffmpeg;
use super::parse::OutputParser;
use super::process::RunLimits;
use super::traits::{MeasurementProvider, ProbeResult};
use crate::config::ToolPaths;
use crate::model::{
    Band, ExtendedStats, KeyInfo, Loudness, OnsetReading, ProbeInfo, SilenceSpan, SpectralStats,
    StereoReading, VolumeReading,
};
use crate::segment::Segment;
use std::path::Path;

/// ffprobe + ffmpeg for stream, level, loudness, spectral and silence
/// measurements; aubio for tempo, onsets, pitch and key
#[derive(Debug, Clone)]
pub struct ToolProvider {
    ffmpeg: Ffmpeg,
    aubio: Aubio,
}

impl ToolProvider {
    /// Every tool run shares `limits`, so one deadline or cancel covers the
    /// whole invocation.
    pub fn new(
        tools: &ToolPaths,
        silence_detect_secs: f64,
        limits: RunLimits,
    ) -> Result<Self, regex::Error> {
        let parser = OutputParser::new()?;
        Ok(Self {
            ffmpeg: Ffmpeg::new(
                tools.ffmpeg.clone(),
                tools.ffprobe.clone(),
                silence_detect_secs,
                parser.clone(),
                limits.clone(),
            ),
            aubio: Aubio::new(tools.aubio.clone(), parser, limits),
        })
    }
}

impl MeasurementProvider for ToolProvider {
    fn probe(&self, input: &Path) -> ProbeResult<ProbeInfo> {
        self.ffmpeg.probe(input)
    }

    fn level_volume(&self, input: &Path) -> ProbeResult<VolumeReading> {
        self.ffmpeg.volume(input)
    }

    fn extended_stats(&self, input: &Path, window_secs: f64) -> ProbeResult<ExtendedStats> {
        self.ffmpeg.astats(input, window_secs)
    }

    fn loudness(&self, input: &Path) -> ProbeResult<Loudness> {
        self.ffmpeg.ebur128(input)
    }

    fn band_loudness(&self, input: &Path, band: Band) -> ProbeResult<VolumeReading> {
        self.ffmpeg.band_volume(input, band)
    }

    fn stereo_stats(&self, input: &Path) -> ProbeResult<StereoReading> {
        self.ffmpeg.stereo(input)
    }

    fn spectral_stats(&self, input: &Path) -> ProbeResult<SpectralStats> {
        self.ffmpeg.spectral(input)
    }

    fn silence_spans(&self, input: &Path, threshold_db: f64) -> ProbeResult<Vec<SilenceSpan>> {
        self.ffmpeg.silence(input, threshold_db)
    }

    fn tempo_series(&self, input: &Path) -> ProbeResult<Vec<f64>> {
        self.aubio.tempo(input)
    }

    fn onset_rate(&self, input: &Path) -> ProbeResult<OnsetReading> {
        self.aubio.onsets(input)
    }

    fn pitch_series(&self, input: &Path) -> ProbeResult<Vec<f64>> {
        self.aubio.pitch(input)
    }

    fn key_guess(&self, input: &Path) -> ProbeResult<KeyInfo> {
        self.aubio.key(input)
    }

    fn cut_segment(&self, input: &Path, segment: Segment, output: &Path) -> ProbeResult<()> {
        self.ffmpeg.cut(input, segment, output)
    }
}
