//! Line-oriented plain text rendering

use crate::compare::Diff;
use crate::model::Analysis;
use chrono::SecondsFormat;

pub fn render_analysis(a: &Analysis) -> String {
    let mut lines = Vec::new();
    let probe = a.probe();
    let level = a.level();

    lines.push(format!("File: {}", a.input()));
    lines.push(format!(
        "When: {}",
        a.analyzed_at().to_rfc3339_opts(SecondsFormat::Secs, true)
    ));
    lines.push(String::new());
    lines.push(format!(
        "Format: {} | Duration: {:.3}s | SR: {} Hz | Ch: {} | Bitrate: {} bps | BitDepth: {}",
        probe.format_name,
        probe.duration_secs,
        probe.sample_rate,
        probe.channels,
        probe.bit_rate,
        probe.bit_depth
    ));

    let mut parts = vec![
        format!("Peak {:.2} dBFS", level.peak_db()),
        format!("RMS {:.2} dBFS", level.rms_db()),
        format!("Crest {:.2} dB", level.crest_db()),
        format!("Headroom {:.2} dB", level.headroom_db()),
    ];
    if let Some(tp) = level.true_peak_dbtp() {
        parts.push(format!("TruePeak {:.2} dBTP", tp));
    }
    if let Some(count) = level.clipped_samples() {
        match level.clipped_percent() {
            Some(pct) => parts.push(format!("Clips {} ({:.3}%)", count, pct)),
            None => parts.push(format!("Clips {}", count)),
        }
    }
    parts.push(format!("DC {:.4}", level.dc_offset()));
    parts.push(format!("ZeroX {:.2}", level.zero_crossing_rate()));
    parts.push(format!("NoiseFloor {:.2} dBFS", level.noise_floor_db()));
    lines.push(format!("Levels: {}", parts.join(" | ")));

    if let Some(loudness) = a.loudness() {
        let mut parts = vec![
            format!("Integrated {:.2} LUFS", loudness.integrated_lufs),
            format!("Range {:.2} LU", loudness.range_lu),
        ];
        if let Some(tp) = loudness.true_peak_dbtp {
            parts.push(format!("TruePeak {:.2} dBTP", tp));
        }
        lines.push(format!("LUFS: {}", parts.join(" | ")));
    }

    let stereo = a.stereo();
    let mut parts = vec![
        format!("Mid RMS {:.2} dB", stereo.mid_rms_db()),
        format!("Side RMS {:.2} dB", stereo.side_rms_db()),
        format!("Side/Mid {:.2} dB", stereo.side_mid_ratio_db()),
    ];
    if let Some(corr) = stereo.correlation() {
        parts.push(format!("Corr {:.2}", corr));
    }
    lines.push(format!("Stereo: {}", parts.join(" | ")));

    let spectral = a.spectral();
    if !spectral.is_empty() {
        let parts: Vec<String> = [
            spectral.centroid_hz.map(|v| format!("Centroid {:.0} Hz", v)),
            spectral.rolloff95_hz.map(|v| format!("Rolloff95 {:.0} Hz", v)),
            spectral.flatness.map(|v| format!("Flatness {:.3}", v)),
            spectral.spread.map(|v| format!("Spread {:.3}", v)),
            spectral.skewness.map(|v| format!("Skew {:.3}", v)),
            spectral.kurtosis.map(|v| format!("Kurt {:.3}", v)),
        ]
        .into_iter()
        .flatten()
        .collect();
        lines.push(format!("Spectral: {}", parts.join(" | ")));
    }

    if let Some(tempo) = a.tempo() {
        let mut parts = vec![
            format!("BPM med {:.2}", tempo.bpm_median()),
            format!("mean {:.2}", tempo.bpm_mean()),
            format!("std {:.2}", tempo.bpm_std()),
        ];
        if let Some(events) = tempo.onset_events() {
            parts.push(format!("events {}", events));
        }
        if let Some(rate) = tempo.onsets_per_minute() {
            parts.push(format!("onsets/min {:.2}", rate));
        }
        lines.push(format!("Tempo: {}", parts.join(" | ")));
    }

    if let Some(pitch) = a.pitch() {
        lines.push(format!(
            "Pitch: median {:.2} Hz | mean {:.2} Hz | min/max {:.2}/{:.2} Hz | MIDI {:.1} | note {}",
            pitch.hz_median(),
            pitch.hz_mean(),
            pitch.hz_min(),
            pitch.hz_max(),
            pitch.midi_median(),
            pitch.note()
        ));
    }

    if let Some(key) = a.key() {
        let mut line = String::from("Key:");
        if let Some(tonic) = &key.key {
            line.push_str(&format!(" {}", tonic));
        }
        if let Some(scale) = &key.scale {
            line.push_str(&format!(" {}", scale));
        }
        if let Some(conf) = key.confidence {
            line.push_str(&format!(" (conf {:.2})", conf));
        }
        lines.push(line);
    }

    if !a.bands().is_empty() {
        lines.push(String::new());
        lines.push("Band Loudness (dBFS):".to_string());
        for b in a.bands() {
            lines.push(format!(
                "  {:>6.0}-{:<6.0} Hz : peak {:>7.2} | rms {:>7.2}",
                b.band.lo_hz, b.band.hi_hz, b.peak_db, b.rms_db
            ));
        }
    }

    if !a.silence().is_empty() {
        lines.push(String::new());
        lines.push("Silence spans:".to_string());
        for s in a.silence() {
            lines.push(format!(
                "  {:.3} → {:.3} ({:.3}s)",
                s.start,
                s.end,
                s.duration()
            ));
        }
        if let Some(total) = a.silence_total_secs() {
            lines.push(format!("Total silence: {:.3}s", total));
        }
        if let Some(ratio) = a.silence_ratio() {
            lines.push(format!("Silence ratio: {:.2}% of duration", ratio * 100.0));
        }
    }

    if !a.notes().is_empty() {
        lines.push(String::new());
        lines.push("Notes:".to_string());
        for note in a.notes() {
            lines.push(format!("  - {}", note));
        }
    }

    let mut text = lines.join("\n");
    text.push('\n');
    text
}

pub fn render_diff(d: &Diff<'_>) -> String {
    let mut text = format!("COMPARE: {} vs {}\n\n", d.a().input(), d.b().input());
    for (metric, delta) in d.delta() {
        text.push_str(&format!("{:<20} : {:+8.3}\n", metric.key(), delta));
    }
    text
}
