//! Silence-based segmentation
//!
//! [`segment_by_silence`] turns detected silences into the playable parts of
//! a file; [`split_by_silence`] cuts those parts out with the provider.

use crate::config::AnalysisConfig;
use crate::model::SilenceSpan;
use crate::provider::{MeasurementProvider, ProbeError};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// A time range of the input, in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Segment {
    pub start: f64,
    pub end: f64,
}

impl Segment {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Shrink by `trim` at both ends without ever inverting
    fn trimmed(self, trim: f64) -> Self {
        if trim <= 0.0 {
            return self;
        }
        let start = self.end.min(self.start + trim);
        let end = start.max(self.end - trim);
        Self { start, end }
    }
}

/// Cut points are silences at least `min_silence_secs` long
///
/// Returns the audio between cut points (plus the tail after the last one),
/// each trimmed by `trim_secs` at both ends. A result of one segment or fewer
/// means there is nothing to split and is returned as an empty list.
pub fn segment_by_silence(
    spans: &[SilenceSpan],
    total_secs: f64,
    min_silence_secs: f64,
    trim_secs: f64,
) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut cursor = 0.0;

    for span in spans.iter().filter(|s| s.duration() >= min_silence_secs) {
        segments.push(Segment::new(cursor, span.start));
        cursor = span.end;
    }
    if cursor < total_secs {
        segments.push(Segment::new(cursor, total_secs));
    }

    if segments.len() <= 1 {
        return Vec::new();
    }
    segments.into_iter().map(|s| s.trimmed(trim_secs)).collect()
}

/// Output path of the 1-based `index`-th part: `<stem>-partNN<.ext>` next to the input
pub fn part_path(input: &Path, index: usize) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match input.extension() {
        Some(ext) => format!("{}-part{:02}.{}", stem, index, ext.to_string_lossy()),
        None => format!("{}-part{:02}", stem, index),
    };
    input.with_file_name(name)
}

#[derive(Debug, thiserror::Error)]
pub enum SplitError {
    #[error("cannot segment input: {0}")]
    Probe(#[from] ProbeError),

    #[error("failed to write {}: {source}", path.display())]
    Cut {
        path: PathBuf,
        #[source]
        source: ProbeError,
    },
}

/// Detect silences in `input` and cut it into parts
///
/// Returns the written paths in order; an input with nothing to split writes
/// nothing. Zero-length parts are skipped but keep their number.
pub fn split_by_silence<P: MeasurementProvider>(
    provider: &P,
    config: &AnalysisConfig,
    input: &Path,
) -> Result<Vec<PathBuf>, SplitError> {
    let probe = provider.probe(input)?;
    let spans = provider.silence_spans(input, config.silence_threshold_db)?;
    let segments = segment_by_silence(
        &spans,
        probe.duration_secs,
        config.split_min_silence_secs,
        config.trim_secs,
    );

    if segments.is_empty() {
        log::info!("Nothing to split in {}", input.display());
        return Ok(Vec::new());
    }
    log::info!("Splitting {} into {} parts", input.display(), segments.len());

    let mut written = Vec::with_capacity(segments.len());
    for (i, segment) in segments.into_iter().enumerate() {
        let path = part_path(input, i + 1);
        if segment.duration() <= 0.0 {
            log::debug!("Skipping empty part {}", path.display());
            continue;
        }
        provider
            .cut_segment(input, segment, &path)
            .map_err(|source| SplitError::Cut {
                path: path.clone(),
                source,
            })?;
        log::info!(
            "Wrote {} ({:.3}-{:.3})",
            path.display(),
            segment.start,
            segment.end
        );
        written.push(path);
    }
    Ok(written)
}
