//! analit - audio analysis aggregation
//!
//! This library merges the partial outputs of several external measurement
//! tools into one analysis record, derives composite metrics and diagnostic
//! notes from it, compares analyses, and splits audio on silence.

pub mod analysis;
pub mod compare;
pub mod config;
pub mod model;
pub mod provider;
pub mod report;
pub mod segment;

pub use analysis::{AnalysisError, Analyzer};
pub use compare::{compare, Diff, Metric};
pub use config::{AnalysisConfig, ReportFormat, TempoEngine, ToolPaths};
pub use model::Analysis;
pub use report::{render_analysis, render_diff, write_report, ReportError};
pub use segment::{segment_by_silence, split_by_silence, Segment, SplitError};
