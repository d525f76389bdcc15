//! Markdown rendering with tables for bands and diffs

use crate::compare::Diff;
use crate::model::Analysis;
use chrono::SecondsFormat;
use std::path::Path;

/// Last path component, or the whole identifier when there is none
fn base_name(input: &str) -> String {
    Path::new(input)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.to_string())
}

/// Blocks of `- Name: `value`` lines, each ending with a blank line
struct Sections {
    out: Vec<String>,
}

impl Sections {
    fn heading(&mut self, title: &str) {
        self.out.push(format!("## {}", title));
    }

    fn item(&mut self, name: &str, value: impl std::fmt::Display) {
        self.out.push(format!("- {}: `{}`", name, value));
    }

    fn end(&mut self) {
        self.out.push(String::new());
    }
}

pub fn render_analysis(a: &Analysis) -> String {
    let probe = a.probe();
    let level = a.level();
    let mut s = Sections { out: Vec::new() };

    s.out.push(format!("# Analysis: {}", base_name(a.input())));
    s.end();
    s.item("When", a.analyzed_at().to_rfc3339_opts(SecondsFormat::Secs, true));
    s.item("Format", &probe.format_name);
    s.item("Duration", format!("{:.3}s", probe.duration_secs));
    s.item("Sample Rate", format!("{} Hz", probe.sample_rate));
    s.item("Channels", probe.channels);
    s.item("Bit Depth", probe.bit_depth);
    s.end();

    s.heading("Levels");
    s.item("Peak", format!("{:.2} dBFS", level.peak_db()));
    s.item("RMS", format!("{:.2} dBFS", level.rms_db()));
    s.item("Crest", format!("{:.2} dB", level.crest_db()));
    s.item("Headroom", format!("{:.2} dB", level.headroom_db()));
    if let Some(tp) = level.true_peak_dbtp() {
        s.item("True Peak", format!("{:.2} dBTP", tp));
    }
    if let Some(count) = level.clipped_samples() {
        match level.clipped_percent() {
            Some(pct) => s.item("Clipped samples", format!("{} ({:.3}%)", count, pct)),
            None => s.item("Clipped samples", count),
        }
    }
    s.item("DC Offset", format!("{:.4}", level.dc_offset()));
    s.item("Zero-Crossing Rate", format!("{:.2}", level.zero_crossing_rate()));
    s.item("Noise Floor", format!("{:.2} dBFS", level.noise_floor_db()));
    s.end();

    if let Some(loudness) = a.loudness() {
        s.heading("Loudness (EBU R128)");
        s.item("Integrated", format!("{:.2} LUFS", loudness.integrated_lufs));
        s.item("Range", format!("{:.2} LU", loudness.range_lu));
        if let Some(tp) = loudness.true_peak_dbtp {
            s.item("True Peak", format!("{:.2} dBTP", tp));
        }
        s.end();
    }

    let stereo = a.stereo();
    s.heading("Stereo");
    s.item("Mid RMS", format!("{:.2} dB", stereo.mid_rms_db()));
    s.item("Side RMS", format!("{:.2} dB", stereo.side_rms_db()));
    s.item("Side/Mid", format!("{:.2} dB", stereo.side_mid_ratio_db()));
    if let Some(corr) = stereo.correlation() {
        s.item("Correlation", format!("{:.2}", corr));
    }
    s.end();

    let spectral = a.spectral();
    if !spectral.is_empty() {
        s.heading("Spectral");
        if let Some(v) = spectral.centroid_hz {
            s.item("Centroid", format!("{:.0} Hz", v));
        }
        if let Some(v) = spectral.rolloff95_hz {
            s.item("Rolloff (95%)", format!("{:.0} Hz", v));
        }
        if let Some(v) = spectral.flatness {
            s.item("Flatness", format!("{:.3}", v));
        }
        if let Some(v) = spectral.spread {
            s.item("Spread", format!("{:.3}", v));
        }
        if let Some(v) = spectral.skewness {
            s.item("Skewness", format!("{:.3}", v));
        }
        if let Some(v) = spectral.kurtosis {
            s.item("Kurtosis", format!("{:.3}", v));
        }
        s.end();
    }

    if let Some(tempo) = a.tempo() {
        s.heading("Tempo");
        s.item("BPM (median)", format!("{:.2}", tempo.bpm_median()));
        s.item("BPM (mean)", format!("{:.2}", tempo.bpm_mean()));
        s.item("BPM (stddev)", format!("{:.2}", tempo.bpm_std()));
        if let Some(events) = tempo.onset_events() {
            s.item("Onset events", events);
        }
        if let Some(rate) = tempo.onsets_per_minute() {
            s.item("Onsets/min", format!("{:.2}", rate));
        }
        s.end();
    }

    if let Some(pitch) = a.pitch() {
        s.heading("Pitch");
        s.item("Median", format!("{:.2} Hz", pitch.hz_median()));
        s.item("Mean", format!("{:.2} Hz", pitch.hz_mean()));
        s.item("Min/Max", format!("{:.2} / {:.2} Hz", pitch.hz_min(), pitch.hz_max()));
        s.item("MIDI", format!("{:.1}", pitch.midi_median()));
        s.item("Note", pitch.note());
        s.end();
    }

    if let Some(key) = a.key() {
        s.heading("Key");
        if let Some(tonic) = &key.key {
            s.item("Key", tonic);
        }
        if let Some(scale) = &key.scale {
            s.item("Scale", scale);
        }
        if let Some(conf) = key.confidence {
            s.item("Confidence", format!("{:.2}", conf));
        }
        s.end();
    }

    if !a.bands().is_empty() {
        s.heading("Band Loudness");
        s.end();
        s.out.push("| Band (Hz) | Peak (dBFS) | RMS (dBFS) |".to_string());
        s.out.push("|---:|---:|---:|".to_string());
        for b in a.bands() {
            s.out.push(format!(
                "| {:.0}–{:.0} | {:.2} | {:.2} |",
                b.band.lo_hz, b.band.hi_hz, b.peak_db, b.rms_db
            ));
        }
        s.end();
    }

    if !a.silence().is_empty() {
        s.heading("Silence");
        for span in a.silence() {
            s.out.push(format!(
                "- `{:.3} → {:.3}` ({:.3}s)",
                span.start,
                span.end,
                span.duration()
            ));
        }
        if let Some(total) = a.silence_total_secs() {
            s.item("Total silence", format!("{:.3}s", total));
        }
        if let Some(ratio) = a.silence_ratio() {
            s.item("Silence ratio", format!("{:.2}%", ratio * 100.0));
        }
        s.end();
    }

    if !a.notes().is_empty() {
        s.heading("Notes");
        for note in a.notes() {
            s.out.push(format!("- {}", note));
        }
        s.end();
    }

    let mut text = s.out.join("\n");
    text.push('\n');
    text
}

pub fn render_diff(d: &Diff<'_>) -> String {
    let name_a = base_name(d.a().input());
    let name_b = base_name(d.b().input());

    let mut lines = vec![
        format!("# Compare: {} ↔ {}", name_a, name_b),
        String::new(),
        format!("| Metric | {} | {} | Δ (B-A) |", name_a, name_b),
        "|---|---:|---:|---:|".to_string(),
    ];
    for (&metric, delta) in d.delta() {
        let (Some(va), Some(vb)) = (metric.value(d.a()), metric.value(d.b())) else {
            continue;
        };
        let p = metric.precision();
        lines.push(format!(
            "| {} | {:.p$} | {:.p$} | {:.p$} |",
            metric.label(),
            va,
            vb,
            delta,
            p = p
        ));
    }

    let mut text = lines.join("\n");
    text.push('\n');
    text
}
