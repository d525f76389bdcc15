//! Parsers for the textual output dialects of ffprobe, ffmpeg filters and aubio
//!
//! All patterns are compiled once in [`OutputParser::new`] and shared by
//! cloning; `regex::Regex` clones are cheap.

use super::traits::{ProbeError, ProbeResult};
use crate::model::{
    ExtendedStats, KeyInfo, Loudness, OnsetReading, ProbeInfo, SilenceSpan, SpectralStats,
    VolumeReading,
};
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Default, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    format: FfprobeFormat,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Default, Deserialize)]
struct FfprobeFormat {
    #[serde(default)]
    format_name: String,
    duration: Option<String>,
    bit_rate: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct FfprobeStream {
    #[serde(default)]
    codec_type: String,
    sample_rate: Option<String>,
    #[serde(default)]
    channels: u32,
    #[serde(default)]
    bits_per_sample: u32,
    bits_per_raw_sample: Option<String>,
}

/// Compiled patterns for every supported tool dialect
#[derive(Debug, Clone)]
pub struct OutputParser {
    max_volume: Regex,
    mean_volume: Regex,
    log_prefix: Regex,
    astats_inline: Regex,
    astats_line: Regex,
    integrated: Regex,
    range: Regex,
    true_peak: Regex,
    silence_start: Regex,
    silence_end: Regex,
    input_duration: Regex,
    metadata: Regex,
    bpm: Regex,
    key: Regex,
    confidence: Regex,
}

impl OutputParser {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            max_volume: Regex::new(r"max_volume:\s*(-?[\d.]+)\s*dB")?,
            mean_volume: Regex::new(r"mean_volume:\s*(-?[\d.]+)\s*dB")?,
            log_prefix: Regex::new(r"^\s*\[[^\]]*\]\s*")?,
            astats_inline: Regex::new(r"^Overall\s+([A-Za-z0-9 /\-]+?):\s*(\S+)")?,
            astats_line: Regex::new(r"^([A-Za-z][A-Za-z0-9 /\-]*?):\s*(\S+)")?,
            integrated: Regex::new(r"I:\s+(-?[\d.]+)\s+LUFS")?,
            range: Regex::new(r"LRA:\s+(-?[\d.]+)\s+LU\b")?,
            true_peak: Regex::new(r"Peak:\s+(-?[\d.]+)\s+dBFS")?,
            silence_start: Regex::new(r"silence_start:\s*(-?[\d.]+)")?,
            silence_end: Regex::new(r"silence_end:\s*(-?[\d.]+)")?,
            input_duration: Regex::new(r"Duration:\s*(\d+):(\d{2}):(\d{2}(?:\.\d+)?)")?,
            metadata: Regex::new(r"lavfi\.([A-Za-z0-9_.]+)=(\S+)")?,
            bpm: Regex::new(r"(?i)([0-9]+(?:\.[0-9]+)?)\s*bpm")?,
            // Tonic and mode at the start of a line or after a label, ending
            // the line or followed by punctuation or a confidence figure
            key: Regex::new(concat!(
                r"(?im)(?:^|:|\bkey\b)\s*([a-g][#b]?)\s+",
                r"(major|minor|dorian|mixolydian|lydian|phrygian|locrian)\b",
                r"\s*(?:$|[(,;|]|confidence)",
            ))?,
            confidence: Regex::new(r"(?i)confidence\W*([0-9]+(?:\.[0-9]+)?)")?,
        })
    }

    /// `ffprobe -show_format -show_streams -of json`
    ///
    /// Stream facts come from the first audio stream; missing values are zero.
    pub fn probe_info(&self, json: &str) -> ProbeResult<ProbeInfo> {
        let parsed: FfprobeOutput =
            serde_json::from_str(json).map_err(|_| ProbeError::Parse("ffprobe".to_string()))?;

        let mut info = ProbeInfo {
            format_name: parsed.format.format_name,
            duration_secs: parse_or_zero(parsed.format.duration.as_deref()),
            bit_rate: parse_or_zero(parsed.format.bit_rate.as_deref()),
            ..ProbeInfo::default()
        };
        if let Some(stream) = parsed.streams.iter().find(|s| s.codec_type == "audio") {
            info.sample_rate = parse_or_zero(stream.sample_rate.as_deref());
            info.channels = stream.channels;
            info.bit_depth = if stream.bits_per_sample > 0 {
                stream.bits_per_sample
            } else {
                parse_or_zero(stream.bits_per_raw_sample.as_deref())
            };
        }
        Ok(info)
    }

    /// `volumedetect` summary; both values are required
    pub fn volume(&self, text: &str) -> ProbeResult<VolumeReading> {
        let peak = capture_f64(&self.max_volume, text);
        let rms = capture_f64(&self.mean_volume, text);
        match (peak, rms) {
            (Some(peak_db), Some(rms_db)) => Ok(VolumeReading { peak_db, rms_db }),
            _ => Err(ProbeError::Parse("volumedetect".to_string())),
        }
    }

    /// Overall section of `astats`
    ///
    /// Accepts both the block form (an `Overall` header line followed by
    /// `Name: value` lines) and the inline `Overall Name: value` form. Per
    /// channel blocks are ignored. Non-finite values are dropped.
    pub fn astats_overall(&self, text: &str) -> ProbeResult<ExtendedStats> {
        let mut stats = ExtendedStats::default();
        let mut in_overall = false;

        for raw in text.lines() {
            let line = self.log_prefix.replace(raw, "");
            let line = line.trim();

            if line.starts_with("Channel:") {
                in_overall = false;
                continue;
            }
            if line == "Overall" {
                in_overall = true;
                continue;
            }

            let captures = if let Some(caps) = self.astats_inline.captures(line) {
                caps
            } else if in_overall {
                match self.astats_line.captures(line) {
                    Some(caps) => caps,
                    None => continue,
                }
            } else {
                continue;
            };

            if let Ok(value) = captures[2].parse::<f64>() {
                if value.is_finite() {
                    stats.insert(stat_key(&captures[1]), value);
                }
            }
        }

        if stats.is_empty() {
            return Err(ProbeError::Parse("astats".to_string()));
        }
        Ok(stats)
    }

    /// Overall RMS level from an `astats` run over a single derived channel
    pub fn astats_rms(&self, text: &str) -> ProbeResult<f64> {
        self.astats_overall(text)?
            .get("rms_level_db")
            .ok_or_else(|| ProbeError::Parse("astats rms".to_string()))
    }

    /// `ebur128=peak=true` summary block
    ///
    /// Only lines after `Summary:` are read, so the running per-frame log does
    /// not leak in. Integrated loudness is required.
    pub fn loudness(&self, text: &str) -> ProbeResult<Loudness> {
        let summary = text
            .rfind("Summary:")
            .map(|at| &text[at..])
            .ok_or_else(|| ProbeError::Parse("ebur128".to_string()))?;

        let integrated_lufs = capture_f64(&self.integrated, summary)
            .ok_or_else(|| ProbeError::Parse("ebur128".to_string()))?;
        Ok(Loudness {
            integrated_lufs,
            range_lu: capture_f64(&self.range, summary).unwrap_or_default(),
            true_peak_dbtp: capture_f64(&self.true_peak, summary),
        })
    }

    /// `silencedetect` start/end pairs
    ///
    /// A silence still open at the end of the stream is closed at the input
    /// duration when the log reports one. Pairs with `end <= start` are dropped.
    pub fn silence(&self, text: &str) -> Vec<SilenceSpan> {
        let mut spans = Vec::new();
        let mut open: Option<f64> = None;

        for line in text.lines() {
            if let Some(start) = capture_f64(&self.silence_start, line) {
                open = Some(start);
            }
            if let Some(end) = capture_f64(&self.silence_end, line) {
                if let Some(start) = open.take() {
                    if end > start {
                        spans.push(SilenceSpan::new(start, end));
                    }
                }
            }
        }

        if let (Some(start), Some(duration)) = (open, self.input_duration(text)) {
            if duration > start {
                spans.push(SilenceSpan::new(start, duration));
            }
        }
        spans
    }

    /// `Duration: HH:MM:SS.ss` from the ffmpeg input banner
    pub fn input_duration(&self, text: &str) -> Option<f64> {
        let caps = self.input_duration.captures(text)?;
        let hours: f64 = caps[1].parse().ok()?;
        let minutes: f64 = caps[2].parse().ok()?;
        let seconds: f64 = caps[3].parse().ok()?;
        Some(hours * 3600.0 + minutes * 60.0 + seconds)
    }

    /// Mean of every `lavfi.<key>=<value>` metadata line, keyed by the last
    /// dotted component (channel indices are folded together)
    pub fn metadata_means(&self, text: &str) -> BTreeMap<String, f64> {
        let mut sums: BTreeMap<String, (f64, u32)> = BTreeMap::new();
        for caps in self.metadata.captures_iter(text) {
            let Ok(value) = caps[2].parse::<f64>() else {
                continue;
            };
            if !value.is_finite() {
                continue;
            }
            let name = caps[1].rsplit('.').next().unwrap_or_default().to_string();
            let slot = sums.entry(name).or_insert((0.0, 0));
            slot.0 += value;
            slot.1 += 1;
        }
        sums.into_iter()
            .map(|(name, (sum, n))| (name, sum / f64::from(n)))
            .collect()
    }

    /// `aspectralstats` metadata; fails when no descriptor is present
    pub fn spectral(&self, text: &str) -> ProbeResult<SpectralStats> {
        let means = self.metadata_means(text);
        let stats = SpectralStats {
            centroid_hz: means.get("centroid").copied(),
            rolloff95_hz: means.get("rolloff").copied(),
            flatness: means.get("flatness").copied(),
            spread: means.get("spread").copied(),
            skewness: means.get("skewness").copied(),
            kurtosis: means.get("kurtosis").copied(),
        };
        if stats.is_empty() {
            return Err(ProbeError::Parse("aspectralstats".to_string()));
        }
        Ok(stats)
    }

    /// `aphasemeter` phase metadata averaged into an L/R correlation
    pub fn phase_correlation(&self, text: &str) -> Option<f64> {
        self.metadata_means(text).get("phase").copied()
    }

    /// aubio tempo estimates (`<n> bpm`)
    pub fn bpm_series(&self, text: &str) -> ProbeResult<Vec<f64>> {
        let series: Vec<f64> = self
            .bpm
            .captures_iter(text)
            .filter_map(|caps| caps[1].parse().ok())
            .collect();
        if series.is_empty() {
            return Err(ProbeError::Parse("aubio tempo".to_string()));
        }
        Ok(series)
    }

    /// aubio onset timestamps, one per line
    pub fn onsets(&self, text: &str) -> OnsetReading {
        let events = text
            .lines()
            .filter_map(|line| line.split_whitespace().next())
            .filter(|field| field.parse::<f64>().is_ok())
            .count();
        OnsetReading {
            events: events as u64,
        }
    }

    /// aubio pitch: the last numeric field of each line, in Hz
    pub fn pitch_series(&self, text: &str) -> Vec<f64> {
        text.lines()
            .filter_map(|line| line.split_whitespace().last())
            .filter_map(|field| field.parse::<f64>().ok())
            .filter(|hz| hz.is_finite())
            .collect()
    }

    /// Key token (`A minor`, `F# major`, ...) and optional confidence
    ///
    /// A tonic without a mode is not accepted.
    pub fn key(&self, text: &str) -> KeyInfo {
        let mut info = KeyInfo::default();
        if let Some(caps) = self.key.captures(text) {
            info.key = Some(tonic(&caps[1]));
            info.scale = caps.get(2).map(|m| m.as_str().to_lowercase());
        }
        info.confidence = capture_f64(&self.confidence, text).map(|c| c.clamp(0.0, 1.0));
        info
    }
}

fn capture_f64(re: &Regex, text: &str) -> Option<f64> {
    re.captures(text)?.get(1)?.as_str().parse().ok()
}

fn parse_or_zero<T: std::str::FromStr + Default>(value: Option<&str>) -> T {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or_default()
}

/// "Zero crossings rate" -> "zero_crossings_rate"
fn stat_key(name: &str) -> String {
    name.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

/// Upper-case letter, accidental kept as written ("f#" -> "F#", "bb" -> "Bb")
fn tonic(token: &str) -> String {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}
