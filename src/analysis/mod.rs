//! Analysis aggregation and derivation
//!
//! [`Analyzer`] drives a [`MeasurementProvider`](crate::provider::MeasurementProvider)
//! over one input. The derivation helpers in [`stats`] and the diagnostic
//! rules in [`notes`] are pure and shared with the data model.

mod aggregator;
pub mod notes;
pub mod stats;

pub use aggregator::{AnalysisError, Analyzer};
