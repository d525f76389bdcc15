//! Comparison of two analyses

use crate::model::Analysis;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Compared metrics; the declaration order is the catalogue order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    PeakDb,
    RmsDb,
    CrestDb,
    LufsIntegrated,
    LufsRange,
    StereoSideMidDb,
    BpmMedian,
    DurationS,
}

impl Metric {
    pub const CATALOGUE: [Metric; 8] = [
        Metric::PeakDb,
        Metric::RmsDb,
        Metric::CrestDb,
        Metric::LufsIntegrated,
        Metric::LufsRange,
        Metric::StereoSideMidDb,
        Metric::BpmMedian,
        Metric::DurationS,
    ];

    /// Stable machine key, as used in JSON and text diffs
    pub fn key(self) -> &'static str {
        match self {
            Metric::PeakDb => "peak_db",
            Metric::RmsDb => "rms_db",
            Metric::CrestDb => "crest_db",
            Metric::LufsIntegrated => "lufs_integrated",
            Metric::LufsRange => "lufs_range",
            Metric::StereoSideMidDb => "stereo_side_mid_db",
            Metric::BpmMedian => "bpm_median",
            Metric::DurationS => "duration_s",
        }
    }

    /// Human-readable row label
    pub fn label(self) -> &'static str {
        match self {
            Metric::PeakDb => "Peak dBFS",
            Metric::RmsDb => "RMS dBFS",
            Metric::CrestDb => "Crest dB",
            Metric::LufsIntegrated => "LUFS (integr.)",
            Metric::LufsRange => "LUFS Range",
            Metric::StereoSideMidDb => "Side/Mid dB",
            Metric::BpmMedian => "BPM (median)",
            Metric::DurationS => "Duration (s)",
        }
    }

    /// Decimal places used when rendering values of this metric
    pub fn precision(self) -> usize {
        match self {
            Metric::DurationS => 3,
            _ => 2,
        }
    }

    /// Value of this metric in `analysis`, if the analysis has it
    pub fn value(self, analysis: &Analysis) -> Option<f64> {
        match self {
            Metric::PeakDb => Some(analysis.level().peak_db()),
            Metric::RmsDb => Some(analysis.level().rms_db()),
            Metric::CrestDb => Some(analysis.level().crest_db()),
            Metric::LufsIntegrated => analysis.loudness().map(|l| l.integrated_lufs),
            Metric::LufsRange => analysis.loudness().map(|l| l.range_lu),
            Metric::StereoSideMidDb => Some(analysis.stereo().side_mid_ratio_db()),
            Metric::BpmMedian => analysis.tempo().map(|t| t.bpm_median()),
            Metric::DurationS => Some(analysis.probe().duration_secs),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// B − A over the metrics both analyses carry
#[derive(Debug, Clone, Serialize)]
pub struct Diff<'a> {
    a: &'a Analysis,
    b: &'a Analysis,
    delta: BTreeMap<Metric, f64>,
}

impl<'a> Diff<'a> {
    pub fn a(&self) -> &'a Analysis {
        self.a
    }

    pub fn b(&self) -> &'a Analysis {
        self.b
    }

    /// Deltas in catalogue order
    pub fn delta(&self) -> &BTreeMap<Metric, f64> {
        &self.delta
    }

    pub fn get(&self, metric: Metric) -> Option<f64> {
        self.delta.get(&metric).copied()
    }
}

/// Compare `b` against `a`
///
/// A metric missing on either side is left out rather than defaulted.
pub fn compare<'a>(a: &'a Analysis, b: &'a Analysis) -> Diff<'a> {
    let delta = Metric::CATALOGUE
        .iter()
        .filter_map(|&metric| {
            let d = metric.value(b)? - metric.value(a)?;
            d.is_finite().then_some((metric, d))
        })
        .collect();

    Diff { a, b, delta }
}
