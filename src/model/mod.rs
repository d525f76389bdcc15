//! Analysis data model
//!
//! Raw probe readings, the per-capability statistics built from them, and the
//! top-level [`Analysis`] record. Derived values are computed when a record is
//! built and are only readable through accessors.

mod analysis;
mod stats;

pub use analysis::{Analysis, Measurements};
pub use stats::{
    Band, BandStat, ExtendedStats, KeyInfo, LevelStats, Loudness, OnsetReading, PitchStats,
    ProbeInfo, SilenceSpan, SpectralStats, StereoReading, StereoStats, TempoStats, VolumeReading,
};
