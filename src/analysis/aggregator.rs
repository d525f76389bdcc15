//! Analysis aggregation
//!
//! Runs the mandatory probe, fans the optional probes out over a bounded
//! worker pool, and folds the results into an [`Analysis`].

use crate::config::{AnalysisConfig, TempoEngine};
use crate::model::{Analysis, BandStat, Measurements};
use crate::provider::{MeasurementProvider, ProbeError, ProbeResult};
use std::path::{Path, PathBuf};

/// Errors that abort an analysis
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("cannot read input {}: {source}", path.display())]
    Input {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("mandatory probe failed: {0}")]
    Probe(#[from] ProbeError),

    #[error("failed to start probe workers: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

/// Aggregates provider measurements into analyses
pub struct Analyzer<P: MeasurementProvider> {
    config: AnalysisConfig,
    provider: P,
    pool: rayon::ThreadPool,
}

impl<P: MeasurementProvider> Analyzer<P> {
    /// Create an analyzer with a probe pool of `config.workers` threads
    pub fn new(config: AnalysisConfig, provider: P) -> Result<Self, AnalysisError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.workers.max(1))
            .thread_name(|i| format!("probe-{}", i))
            .build()?;

        Ok(Self {
            config,
            provider,
            pool,
        })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Analyze one input
    ///
    /// Only a missing input or a failed mandatory probe is an error; every
    /// other probe failure leaves its field absent.
    pub fn analyze(&self, input: &Path) -> Result<Analysis, AnalysisError> {
        check_input(input)?;

        log::info!("Analyzing {}", input.display());
        let probe = self.provider.probe(input)?;
        log::debug!(
            "Probe: {} {:.3}s {} Hz {} ch",
            probe.format_name,
            probe.duration_secs,
            probe.sample_rate,
            probe.channels
        );

        let mut measurements = Measurements::new(input.display().to_string(), probe);
        self.run_probes(input, &mut measurements);

        let analysis = Analysis::from_measurements(measurements);
        log::info!(
            "Analysis complete: {} bands, {} silences, {} notes",
            analysis.bands().len(),
            analysis.silence().len(),
            analysis.notes().len()
        );
        Ok(analysis)
    }

    /// Run every enabled optional probe concurrently
    ///
    /// Each probe writes only its own slot; the record is filled in after all
    /// of them have joined, so ordering never depends on completion order.
    fn run_probes(&self, input: &Path, m: &mut Measurements) {
        let provider = &self.provider;
        let config = &self.config;
        let tempo_enabled = config.tempo_engine != TempoEngine::None;
        let bands: &[crate::model::Band] = if config.use_bands {
            &config.bands
        } else {
            &[]
        };

        let mut volume = None;
        let mut extended = None;
        let mut loudness = None;
        let mut stereo = None;
        let mut spectral = None;
        let mut silence = None;
        let mut tempo_series = None;
        let mut onsets = None;
        let mut pitch_series = None;
        let mut key = None;
        let mut band_slots: Vec<Option<BandStat>> = vec![None; bands.len()];

        self.pool.scope(|s| {
            let slot = &mut volume;
            s.spawn(move |_| *slot = optional(input, "volume", provider.level_volume(input)));

            let slot = &mut extended;
            s.spawn(move |_| {
                *slot = optional(
                    input,
                    "extended stats",
                    provider.extended_stats(input, config.stats_window_secs),
                )
            });

            if config.use_loudness {
                let slot = &mut loudness;
                s.spawn(move |_| *slot = optional(input, "loudness", provider.loudness(input)));
            }

            let slot = &mut stereo;
            s.spawn(move |_| *slot = optional(input, "stereo", provider.stereo_stats(input)));

            let slot = &mut spectral;
            s.spawn(move |_| *slot = optional(input, "spectral", provider.spectral_stats(input)));

            let slot = &mut silence;
            s.spawn(move |_| {
                *slot = optional(
                    input,
                    "silence",
                    provider.silence_spans(input, config.silence_threshold_db),
                )
            });

            if tempo_enabled {
                let slot = &mut tempo_series;
                s.spawn(move |_| *slot = optional(input, "tempo", provider.tempo_series(input)));

                let slot = &mut onsets;
                s.spawn(move |_| *slot = optional(input, "onsets", provider.onset_rate(input)));
            }

            let slot = &mut pitch_series;
            s.spawn(move |_| *slot = optional(input, "pitch", provider.pitch_series(input)));

            let slot = &mut key;
            s.spawn(move |_| *slot = optional(input, "key", provider.key_guess(input)));

            for (slot, band) in band_slots.iter_mut().zip(bands.iter().copied()) {
                s.spawn(move |_| {
                    let what = format!("band {} Hz", band);
                    *slot = optional(input, &what, provider.band_loudness(input, band)).map(
                        |reading| BandStat {
                            band,
                            peak_db: reading.peak_db,
                            rms_db: reading.rms_db,
                        },
                    )
                });
            }
        });

        m.volume = volume;
        m.extended = extended;
        m.loudness = loudness;
        m.stereo = stereo;
        m.spectral = spectral;
        m.silence = silence;
        m.tempo_series = tempo_series;
        m.onsets = onsets;
        m.pitch_series = pitch_series;
        m.key = key;
        m.bands = band_slots.into_iter().flatten().collect();
    }
}

fn check_input(input: &Path) -> Result<(), AnalysisError> {
    let metadata = std::fs::metadata(input).map_err(|source| AnalysisError::Input {
        path: input.to_path_buf(),
        source,
    })?;
    if !metadata.is_file() {
        return Err(AnalysisError::Input {
            path: input.to_path_buf(),
            source: std::io::Error::other("not a regular file"),
        });
    }
    Ok(())
}

/// Keep a successful reading; log and drop a failure
fn optional<T>(input: &Path, what: &str, result: ProbeResult<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            log::debug!("{} unavailable for {}: {}", what, input.display(), err);
            None
        }
    }
}
