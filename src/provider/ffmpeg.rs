//! ffprobe/ffmpeg-backed measurements

use super::parse::OutputParser;
use super::process::{run_tool, RunLimits};
use super::traits::{ProbeError, ProbeResult};
use crate::model::{
    Band, ExtendedStats, Loudness, ProbeInfo, SilenceSpan, SpectralStats, StereoReading,
    VolumeReading,
};
use crate::segment::Segment;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

const SPECTRAL_FILTER: &str = "aspectralstats=measure=centroid+rolloff+flatness+spread+skewness+kurtosis,\
                               ametadata=mode=print";
const PHASE_FILTER: &str = "aphasemeter=video=0,ametadata=mode=print:key=lavfi.aphasemeter.phase";

fn astats_graph(window_secs: f64) -> String {
    if window_secs > 0.0 {
        format!(
            "astats=measure_perchannel=none:metadata=1:reset=1:window={:.2}",
            window_secs
        )
    } else {
        "astats=measure_perchannel=none:reset=0".to_string()
    }
}

/// One filter pass over an input, run through `ffmpeg ... -f null -`
enum Filter<'a> {
    Audio(&'a str),
    Complex(&'a str),
}

#[derive(Debug, Clone)]
pub struct Ffmpeg {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
    silence_detect_secs: f64,
    parser: OutputParser,
    limits: RunLimits,
}

impl Ffmpeg {
    pub fn new(
        ffmpeg: PathBuf,
        ffprobe: PathBuf,
        silence_detect_secs: f64,
        parser: OutputParser,
        limits: RunLimits,
    ) -> Self {
        Self {
            ffmpeg,
            ffprobe,
            silence_detect_secs,
            parser,
            limits,
        }
    }

    /// Run a filter pass and return ffmpeg's log (stderr) together with stdout
    fn run_filter(&self, input: &Path, filter: Filter<'_>) -> ProbeResult<String> {
        let (flag, graph) = match filter {
            Filter::Audio(graph) => ("-af", graph),
            Filter::Complex(graph) => ("-filter_complex", graph),
        };
        let args: Vec<OsString> = vec![
            "-hide_banner".into(),
            "-nostats".into(),
            "-vn".into(),
            "-i".into(),
            input.into(),
            flag.into(),
            graph.into(),
            "-f".into(),
            "null".into(),
            "-".into(),
        ];
        log::debug!("ffmpeg {} {} on {}", flag, graph, input.display());
        let output = run_tool(&self.ffmpeg, args, &self.limits)?.require_success("ffmpeg")?;
        Ok(output.combined())
    }

    pub fn probe(&self, input: &Path) -> ProbeResult<ProbeInfo> {
        let args: Vec<OsString> = vec![
            "-v".into(),
            "error".into(),
            "-show_format".into(),
            "-show_streams".into(),
            "-of".into(),
            "json".into(),
            input.into(),
        ];
        let output = run_tool(&self.ffprobe, args, &self.limits)?.require_success("ffprobe")?;
        self.parser.probe_info(&output.stdout)
    }

    pub fn volume(&self, input: &Path) -> ProbeResult<VolumeReading> {
        let text = self.run_filter(input, Filter::Audio("volumedetect"))?;
        self.parser.volume(&text)
    }

    /// Overall statistics only; `measure_overall` keeps its default of all
    /// measurements so clip counts and the noise floor are reported
    pub fn astats(&self, input: &Path, window_secs: f64) -> ProbeResult<ExtendedStats> {
        let graph = astats_graph(window_secs);
        let text = self.run_filter(input, Filter::Audio(&graph))?;
        self.parser.astats_overall(&text)
    }

    pub fn ebur128(&self, input: &Path) -> ProbeResult<Loudness> {
        let text = self.run_filter(input, Filter::Complex("ebur128=peak=true"))?;
        self.parser.loudness(&text)
    }

    pub fn band_volume(&self, input: &Path, band: Band) -> ProbeResult<VolumeReading> {
        let graph = format!("highpass=f={},lowpass=f={},volumedetect", band.lo_hz, band.hi_hz);
        let text = self.run_filter(input, Filter::Audio(&graph))?;
        self.parser.volume(&text)
    }

    /// Mid and side levels from two single-channel passes, plus the phase
    /// meter correlation when that filter is available
    pub fn stereo(&self, input: &Path) -> ProbeResult<StereoReading> {
        let mid = self.run_filter(
            input,
            Filter::Audio("pan=mono|c0=0.5*c0+0.5*c1,astats=measure_perchannel=none"),
        )?;
        let side = self.run_filter(
            input,
            Filter::Audio("pan=mono|c0=0.5*c0-0.5*c1,astats=measure_perchannel=none"),
        )?;

        let correlation = match self.run_filter(input, Filter::Audio(PHASE_FILTER)) {
            Ok(text) => self.parser.phase_correlation(&text),
            Err(err) => {
                log::debug!("Phase meter unavailable for {}: {}", input.display(), err);
                None
            }
        };

        Ok(StereoReading {
            mid_rms_db: self.parser.astats_rms(&mid)?,
            side_rms_db: self.parser.astats_rms(&side)?,
            correlation,
        })
    }

    pub fn spectral(&self, input: &Path) -> ProbeResult<SpectralStats> {
        let text = self.run_filter(input, Filter::Audio(SPECTRAL_FILTER))?;
        self.parser.spectral(&text)
    }

    pub fn silence(&self, input: &Path, threshold_db: f64) -> ProbeResult<Vec<SilenceSpan>> {
        let graph = format!(
            "silencedetect=noise={:.1}dB:d={}",
            threshold_db, self.silence_detect_secs
        );
        let text = self.run_filter(input, Filter::Audio(&graph))?;
        Ok(self.parser.silence(&text))
    }

    /// Stream-copy `segment` into `output`, overwriting it
    pub fn cut(&self, input: &Path, segment: Segment, output: &Path) -> ProbeResult<()> {
        if segment.duration() <= 0.0 {
            return Err(ProbeError::Unavailable(format!(
                "empty segment {:.3}-{:.3}",
                segment.start, segment.end
            )));
        }
        let args: Vec<OsString> = vec![
            "-hide_banner".into(),
            "-nostats".into(),
            "-y".into(),
            "-i".into(),
            input.into(),
            "-ss".into(),
            format!("{:.3}", segment.start).into(),
            "-to".into(),
            format!("{:.3}", segment.end).into(),
            "-c".into(),
            "copy".into(),
            output.into(),
        ];
        run_tool(&self.ffmpeg, args, &self.limits)?.require_success("ffmpeg")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_astats_graph_measures_everything_overall() {
        for window in [0.0, 2.5] {
            let graph = astats_graph(window);
            assert!(graph.starts_with("astats=measure_perchannel=none"));
            assert!(!graph.contains("measure_overall"));
        }
        assert!(astats_graph(2.5).ends_with(":window=2.50"));
        assert!(astats_graph(0.0).ends_with(":reset=0"));
    }
}
