//! Measurement providers
//!
//! [`MeasurementProvider`] is the seam between the aggregation engine and the
//! external tools. [`ToolProvider`] drives ffprobe, ffmpeg and aubio;
//! [`ScriptedProvider`] replays canned readings.

mod aubio;
mod ffmpeg;
pub mod parse;
pub mod process;
mod scripted;
mod tools;
mod traits;

pub use parse::OutputParser;
pub use process::{locate, run_tool, CancelToken, RunLimits, ToolOutput};
pub use scripted::ScriptedProvider;
pub use tools::ToolProvider;
pub use traits::{MeasurementProvider, ProbeError, ProbeResult};
