//! Analysis configuration

use crate::model::Band;
use std::path::PathBuf;
use std::time::Duration;

/// Band list used when none is given
pub const DEFAULT_BANDS: &str =
    "20-60,60-120,120-250,250-500,500-2000,2000-5000,5000-10000,10000-20000";

/// Output layout of reports and diffs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ReportFormat {
    /// Pretty-printed JSON
    Json,

    /// Line-oriented plain text
    #[default]
    #[value(alias = "txt")]
    Text,

    /// Markdown with tables
    #[value(alias = "md")]
    Markdown,
}

/// Tempo engine used for the BPM series and onset count
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum TempoEngine {
    /// Tempo analysis disabled
    #[default]
    None,

    /// aubio `tempo` and `onset`
    Aubio,
}

/// Locations of the external measurement tools
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
    pub aubio: PathBuf,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
            aubio: PathBuf::from("aubio"),
        }
    }
}

/// Configuration for one analysis run
///
/// Read-only once the run starts.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Where the report (or diff) is written
    pub output_path: PathBuf,

    /// Report layout
    pub report_format: ReportFormat,

    /// External tool locations
    pub tools: ToolPaths,

    /// Tempo engine; `None` skips tempo and onset probes
    pub tempo_engine: TempoEngine,

    /// Whether per-band loudness is measured
    pub use_bands: bool,

    /// Bands measured when `use_bands` is set, in report order
    pub bands: Vec<Band>,

    /// Whether the EBU R128 loudness probe runs
    pub use_loudness: bool,

    /// Extended statistics window in seconds (0 = whole file)
    pub stats_window_secs: f64,

    /// Level below which audio counts as silence (dBFS)
    pub silence_threshold_db: f64,

    /// Shortest silence the detector reports (seconds)
    pub silence_detect_secs: f64,

    /// Shortest silence that splits a file into parts (seconds)
    pub split_min_silence_secs: f64,

    /// Seconds trimmed from both ends of each split part
    pub trim_secs: f64,

    /// Probe worker threads
    pub workers: usize,

    /// Run-level timeout; unfinished probes count as failed
    pub timeout: Option<Duration>,
}

impl AnalysisConfig {
    /// Create a configuration with the stock defaults
    pub fn new(output_path: PathBuf) -> Self {
        Self {
            output_path,
            report_format: ReportFormat::default(),
            tools: ToolPaths::default(),
            tempo_engine: TempoEngine::default(),
            use_bands: true,
            bands: parse_bands(DEFAULT_BANDS),
            use_loudness: true,
            stats_window_secs: 0.0,
            silence_threshold_db: -45.0,
            silence_detect_secs: 0.3,
            split_min_silence_secs: 1.0,
            trim_secs: 0.0,
            workers: std::thread::available_parallelism().map_or(4, |n| n.get()),
            timeout: None,
        }
    }

    pub fn with_report_format(mut self, format: ReportFormat) -> Self {
        self.report_format = format;
        self
    }

    pub fn with_tools(mut self, tools: ToolPaths) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_tempo_engine(mut self, engine: TempoEngine) -> Self {
        self.tempo_engine = engine;
        self
    }

    /// Set the band list; an empty list disables band measurement
    pub fn with_bands(mut self, bands: Vec<Band>) -> Self {
        self.use_bands = !bands.is_empty();
        self.bands = bands;
        self
    }

    pub fn without_bands(mut self) -> Self {
        self.use_bands = false;
        self
    }

    pub fn without_loudness(mut self) -> Self {
        self.use_loudness = false;
        self
    }

    pub fn with_stats_window(mut self, secs: f64) -> Self {
        self.stats_window_secs = secs.max(0.0);
        self
    }

    pub fn with_silence_threshold(mut self, db: f64) -> Self {
        self.silence_threshold_db = db;
        self
    }

    /// Set the split rules: minimum cutting silence and per-part trim
    pub fn with_split(mut self, min_silence_secs: f64, trim_secs: f64) -> Self {
        self.split_min_silence_secs = min_silence_secs.max(0.0);
        self.trim_secs = trim_secs.max(0.0);
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Parse a band list such as `"20-60,60-120"`
///
/// Malformed entries, and entries without `0 < lo < hi`, are skipped.
pub fn parse_bands(spec: &str) -> Vec<Band> {
    spec.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .filter_map(|part| {
            let (lo, hi) = part.split_once('-')?;
            let lo: f64 = lo.trim().parse().ok()?;
            let hi: f64 = hi.trim().parse().ok()?;
            (lo > 0.0 && hi > lo).then(|| Band::new(lo, hi))
        })
        .collect()
}
