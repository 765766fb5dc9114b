// Copyright 2026 the FlashGuard Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][format] JSON to the given writer.
//! Dim changes are emitted as counter events, so the applied intensity and
//! the measured brightness plot as tracks over time.
//!
//! [format]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use flashguard_core::trace::TrackChange;

use crate::recorder::{RecordedEvent, decode};

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
/// Timestamps are host microseconds.
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();

    for recorded in decode(bytes) {
        match recorded {
            RecordedEvent::Tick(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "Tick",
                    "cat": "Monitor",
                    "ts": e.now.micros(),
                    "pid": 0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "tick_index": e.tick_index,
                        "video_count": e.video_count,
                        "enabled": e.enabled,
                    }
                }));
            }
            RecordedEvent::Track(e) => {
                let change = match e.change {
                    TrackChange::Adopted { switched: true } => "switched",
                    TrackChange::Adopted { switched: false } => "adopted",
                    TrackChange::Released => "released",
                };
                events.push(json!({
                    "ph": "i",
                    "name": "Track",
                    "cat": "Monitor",
                    "ts": e.now.micros(),
                    "pid": 0,
                    "tid": 0,
                    "s": "p",
                    "args": {
                        "tick_index": e.tick_index,
                        "change": change,
                    }
                }));
            }
            RecordedEvent::CaptureFallback(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "CaptureFallback",
                    "cat": "Capture",
                    "ts": e.now.micros(),
                    "pid": 0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "tick_index": e.tick_index,
                        "cause": e.cause.to_string(),
                        "fallback": e.fallback,
                    }
                }));
            }
            RecordedEvent::DimChange(e) => {
                events.push(json!({
                    "ph": "C",
                    "name": "Dimming",
                    "cat": "Dim",
                    "ts": e.now.micros(),
                    "pid": 0,
                    "tid": 0,
                    "args": {
                        "level": e.level,
                        "brightness": e.brightness,
                        "visible": e.visible_brightness,
                    }
                }));
            }
            RecordedEvent::Settings(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "Settings",
                    "cat": "Settings",
                    "ts": e.now.micros(),
                    "pid": 0,
                    "tid": 0,
                    "s": "g",
                    "args": {
                        "enabled": e.settings.enabled(),
                        "dim_level": e.settings.dim_level(),
                        "brightness_threshold": e.settings.brightness_threshold(),
                        "policy": e.policy.as_str(),
                    }
                }));
            }
            RecordedEvent::Lifecycle(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": format!("{:?}", e.phase),
                    "cat": "Lifecycle",
                    "ts": e.now.micros(),
                    "pid": 0,
                    "tid": 0,
                    "s": "g",
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::RecorderSink;
    use flashguard_core::luma::CaptureError;
    use flashguard_core::time::HostTime;
    use flashguard_core::trace::{
        CaptureFallbackEvent, DimChangeEvent, LifecycleEvent, LifecyclePhase, TraceSink,
    };

    #[test]
    fn export_produces_valid_json() {
        let mut rec = RecorderSink::new();
        rec.on_lifecycle(&LifecycleEvent {
            now: HostTime(0),
            phase: LifecyclePhase::Started,
        });
        rec.on_dim_change(&DimChangeEvent {
            tick_index: 4,
            now: HostTime(132_000),
            brightness: 0.8,
            previous: 0.0,
            level: 0.5,
            visible_brightness: 0.6,
        });
        rec.on_capture_fallback(&CaptureFallbackEvent {
            tick_index: 5,
            now: HostTime(165_000),
            cause: CaptureError::Readback,
            fallback: Some(0.8),
        });

        let mut out = Vec::new();
        export(rec.as_bytes(), &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();

        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert_eq!(parsed.len(), 3);

        assert_eq!(parsed[0]["ph"], "i");
        assert_eq!(parsed[0]["name"], "Started");

        assert_eq!(parsed[1]["ph"], "C");
        assert_eq!(parsed[1]["ts"], 132_000);
        assert_eq!(parsed[1]["args"]["level"], 0.5);

        assert_eq!(parsed[2]["name"], "CaptureFallback");
        assert_eq!(parsed[2]["args"]["cause"], "pixel readback was refused");
    }

    #[test]
    fn export_empty_recording() {
        let mut out = Vec::new();
        export(&[], &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();
        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert!(parsed.is_empty());
    }
}
