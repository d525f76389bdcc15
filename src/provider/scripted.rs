//! Provider that replays canned measurements
//!
//! Each capability answers with its configured value, or
//! [`ProbeError::Unavailable`] when none is set. Calls are recorded so callers
//! can check which probes ran.

use super::traits::{MeasurementProvider, ProbeError, ProbeResult};
use crate::model::{
    Band, ExtendedStats, KeyInfo, Loudness, OnsetReading, ProbeInfo, SilenceSpan, SpectralStats,
    StereoReading, VolumeReading,
};
use crate::segment::Segment;
use std::path::Path;
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct ScriptedProvider {
    pub probe: Option<ProbeInfo>,
    pub volume: Option<VolumeReading>,
    pub extended: Option<ExtendedStats>,
    pub loudness: Option<Loudness>,
    /// Band answers; bands not listed fail
    pub bands: Vec<(Band, VolumeReading)>,
    pub stereo: Option<StereoReading>,
    pub spectral: Option<SpectralStats>,
    pub silence: Option<Vec<SilenceSpan>>,
    pub tempo: Option<Vec<f64>>,
    pub onsets: Option<OnsetReading>,
    pub pitch: Option<Vec<f64>>,
    pub key: Option<KeyInfo>,
    /// Whether `cut_segment` writes its output file
    pub cuts_succeed: bool,
    calls: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    /// Provider that only answers the mandatory probe
    pub fn new(probe: ProbeInfo) -> Self {
        Self {
            probe: Some(probe),
            cuts_succeed: true,
            ..Self::default()
        }
    }

    /// Capability names in call order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn was_called(&self, capability: &str) -> bool {
        self.calls().iter().any(|c| c == capability)
    }

    fn answer<T: Clone>(&self, capability: &str, value: &Option<T>) -> ProbeResult<T> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(capability.to_string());
        }
        value
            .clone()
            .ok_or_else(|| ProbeError::Unavailable(capability.to_string()))
    }
}

impl MeasurementProvider for ScriptedProvider {
    fn probe(&self, _input: &Path) -> ProbeResult<ProbeInfo> {
        self.answer("probe", &self.probe)
    }

    fn level_volume(&self, _input: &Path) -> ProbeResult<VolumeReading> {
        self.answer("level_volume", &self.volume)
    }

    fn extended_stats(&self, _input: &Path, _window_secs: f64) -> ProbeResult<ExtendedStats> {
        self.answer("extended_stats", &self.extended)
    }

    fn loudness(&self, _input: &Path) -> ProbeResult<Loudness> {
        self.answer("loudness", &self.loudness)
    }

    fn band_loudness(&self, _input: &Path, band: Band) -> ProbeResult<VolumeReading> {
        let reading = self
            .bands
            .iter()
            .find(|(b, _)| *b == band)
            .map(|(_, reading)| *reading);
        self.answer("band_loudness", &reading)
    }

    fn stereo_stats(&self, _input: &Path) -> ProbeResult<StereoReading> {
        self.answer("stereo_stats", &self.stereo)
    }

    fn spectral_stats(&self, _input: &Path) -> ProbeResult<SpectralStats> {
        self.answer("spectral_stats", &self.spectral)
    }

    fn silence_spans(&self, _input: &Path, _threshold_db: f64) -> ProbeResult<Vec<SilenceSpan>> {
        self.answer("silence_spans", &self.silence)
    }

    fn tempo_series(&self, _input: &Path) -> ProbeResult<Vec<f64>> {
        self.answer("tempo_series", &self.tempo)
    }

    fn onset_rate(&self, _input: &Path) -> ProbeResult<OnsetReading> {
        self.answer("onset_rate", &self.onsets)
    }

    fn pitch_series(&self, _input: &Path) -> ProbeResult<Vec<f64>> {
        self.answer("pitch_series", &self.pitch)
    }

    fn key_guess(&self, _input: &Path) -> ProbeResult<KeyInfo> {
        self.answer("key_guess", &self.key)
    }

    fn cut_segment(&self, _input: &Path, segment: Segment, output: &Path) -> ProbeResult<()> {
        let outcome = self.cuts_succeed.then_some(());
        self.answer("cut_segment", &outcome)?;
        std::fs::write(output, format!("{:.3}-{:.3}\n", segment.start, segment.end)).map_err(
            |source| ProbeError::Spawn {
                tool: "cut".to_string(),
                source,
            },
        )
    }
}
