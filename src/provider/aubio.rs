//! aubio-backed tempo, onset, pitch and key measurements

use super::parse::OutputParser;
use super::process::{run_tool, RunLimits, ToolOutput};
use super::traits::ProbeResult;
use crate::model::{KeyInfo, OnsetReading};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct Aubio {
    binary: PathBuf,
    parser: OutputParser,
    limits: RunLimits,
}

impl Aubio {
    pub fn new(binary: PathBuf, parser: OutputParser, limits: RunLimits) -> Self {
        Self {
            binary,
            parser,
            limits,
        }
    }

    fn run(&self, command: &str, input: &Path) -> ProbeResult<ToolOutput> {
        let args: Vec<OsString> = vec![command.into(), "-i".into(), input.into()];
        log::debug!("aubio {} on {}", command, input.display());
        run_tool(&self.binary, args, &self.limits)?.require_success("aubio")
    }

    pub fn tempo(&self, input: &Path) -> ProbeResult<Vec<f64>> {
        let output = self.run("tempo", input)?;
        self.parser.bpm_series(&output.combined())
    }

    pub fn onsets(&self, input: &Path) -> ProbeResult<OnsetReading> {
        let output = self.run("onset", input)?;
        Ok(self.parser.onsets(&output.stdout))
    }

    pub fn pitch(&self, input: &Path) -> ProbeResult<Vec<f64>> {
        let output = self.run("pitch", input)?;
        Ok(self.parser.pitch_series(&output.stdout))
    }

    pub fn key(&self, input: &Path) -> ProbeResult<KeyInfo> {
        let output = self.run("key", input)?;
        Ok(self.parser.key(&output.combined()))
    }
}
