use analit::config::{parse_bands, DEFAULT_BANDS};
use analit::provider::{locate, CancelToken, RunLimits, ToolProvider};
use analit::{
    compare, render_analysis, render_diff, split_by_silence, write_report, AnalysisConfig,
    Analyzer, ReportFormat, TempoEngine, ToolPaths,
};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "analit")]
#[command(about = "Analyze, compare and split audio files with ffmpeg and aubio", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Report (or diff) output file
    #[arg(short = 'o', long, default_value = "out.log", global = true)]
    output: String,

    /// Report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Text, global = true)]
    report: ReportFormat,

    /// ffmpeg binary
    #[arg(long, default_value = "ffmpeg", global = true)]
    ffmpeg: String,

    /// ffprobe binary
    #[arg(long, default_value = "ffprobe", global = true)]
    ffprobe: String,

    /// aubio binary
    #[arg(long, default_value = "aubio", global = true)]
    aubio: String,

    /// Tempo engine for BPM and onset analysis
    #[arg(long, value_enum, default_value_t = TempoEngine::None, global = true)]
    bpm_engine: TempoEngine,

    /// Frequency bands as "lo-hi,lo-hi" in Hz
    #[arg(long, default_value = DEFAULT_BANDS, global = true)]
    bands: String,

    /// Skip per-band loudness
    #[arg(long, global = true)]
    no_bands: bool,

    /// Skip EBU R128 loudness
    #[arg(long = "no-ebur128", global = true)]
    no_ebur128: bool,

    /// Extended statistics window in seconds (0 = whole file)
    #[arg(long, default_value_t = 0.0, global = true)]
    astats_window: f64,

    /// Silence threshold in dBFS
    #[arg(long, default_value_t = -45.0, allow_hyphen_values = true, global = true)]
    silence_threshold: f64,

    /// Probe worker threads (default: available cores)
    #[arg(long, global = true)]
    workers: Option<usize>,

    /// Abort unfinished tool runs after this many seconds
    #[arg(long, global = true)]
    timeout: Option<f64>,

    /// Verbose logging
    #[arg(short = 'v', long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Full analysis of one file
    Full { input: String },

    /// Analyze two files and report the differences (B - A)
    Compare { a: String, b: String },

    /// Split a file into parts at long silences
    Split {
        input: String,

        /// Shortest silence that splits, in seconds
        #[arg(long, default_value_t = 1.0)]
        min_silence: f64,

        /// Seconds trimmed from both ends of every part
        #[arg(long, default_value_t = 0.0)]
        trim: f64,
    },
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

fn build_config(args: &Args) -> AnalysisConfig {
    let tools = ToolPaths {
        ffmpeg: expand(&args.ffmpeg),
        ffprobe: expand(&args.ffprobe),
        aubio: expand(&args.aubio),
    };

    let mut config = AnalysisConfig::new(expand(&args.output))
        .with_report_format(args.report)
        .with_tempo_engine(args.bpm_engine)
        .with_stats_window(args.astats_window)
        .with_silence_threshold(args.silence_threshold);

    if args.bpm_engine == TempoEngine::Aubio && locate(&tools.aubio).is_none() {
        log::info!("aubio not found at {:?}, tempo analysis disabled", tools.aubio);
        config = config.with_tempo_engine(TempoEngine::None);
    }
    config = config.with_tools(tools);

    config = if args.no_bands {
        config.without_bands()
    } else {
        config.with_bands(parse_bands(&args.bands))
    };
    if args.no_ebur128 {
        config = config.without_loudness();
    }
    if let Some(workers) = args.workers {
        config = config.with_workers(workers);
    }
    if let Some(secs) = args.timeout.filter(|s| s.is_finite() && *s > 0.0) {
        config = config.with_timeout(Duration::from_secs_f64(secs));
    }
    config
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config = build_config(&args);
    log::debug!("Configuration: {:?}", config);

    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        ctrlc::set_handler(move || cancel.cancel()).context("Failed to install Ctrl-C handler")?;
    }

    let mut limits = RunLimits::new().with_cancel(cancel.clone());
    if let Some(timeout) = config.timeout {
        limits = limits.with_timeout(timeout);
    }
    let provider = ToolProvider::new(&config.tools, config.silence_detect_secs, limits)
        .context("Failed to build tool output parsers")?;

    match &args.command {
        Command::Full { input } => {
            let input = expand(input);
            let analyzer = Analyzer::new(config.clone(), provider)?;
            let analysis = analyzer
                .analyze(&input)
                .with_context(|| format!("Failed to analyze {:?}", input))?;
            if cancel.is_cancelled() {
                bail!("Interrupted");
            }

            let text = render_analysis(&analysis, config.report_format)?;
            write_report(&config.output_path, &text)?;
        }
        Command::Compare { a, b } => {
            let (path_a, path_b) = (expand(a), expand(b));
            let analyzer = Analyzer::new(config.clone(), provider)?;
            let analysis_a = analyzer
                .analyze(&path_a)
                .with_context(|| format!("Failed to analyze {:?}", path_a))?;
            let analysis_b = analyzer
                .analyze(&path_b)
                .with_context(|| format!("Failed to analyze {:?}", path_b))?;
            if cancel.is_cancelled() {
                bail!("Interrupted");
            }

            let diff = compare(&analysis_a, &analysis_b);
            let text = render_diff(&diff, config.report_format)?;
            write_report(&config.output_path, &text)?;
        }
        Command::Split {
            input,
            min_silence,
            trim,
        } => {
            let input = expand(input);
            let config = config.clone().with_split(*min_silence, *trim);
            let parts = split_by_silence(&provider, &config, &input)
                .with_context(|| format!("Failed to split {:?}", input))?;
            log::info!("Wrote {} parts", parts.len());
        }
    }

    Ok(())
}
