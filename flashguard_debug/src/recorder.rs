// Copyright 2026 the FlashGuard Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records. [`decode`] reads them back
//! as an iterator of [`RecordedEvent`].

use flashguard_core::luma::CaptureError;
use flashguard_core::policy::DimPolicy;
use flashguard_core::settings::Settings;
use flashguard_core::time::HostTime;
use flashguard_core::trace::{
    CaptureFallbackEvent, DimChangeEvent, LifecycleEvent, LifecyclePhase, SettingsEvent,
    TickEvent, TraceSink, TrackChange, TrackEvent,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_TICK: u8 = 1;
const TAG_TRACK: u8 = 2;
const TAG_CAPTURE_FALLBACK: u8 = 3;
const TAG_DIM_CHANGE: u8 = 4;
const TAG_SETTINGS: u8 = 5;
const TAG_LIFECYCLE: u8 = 6;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Discards everything recorded so far.
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_f32(&mut self, v: f32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_bool(&mut self, v: bool) {
        self.write_u8(u8::from(v));
    }

    fn write_option_f32(&mut self, v: Option<f32>) {
        match v {
            Some(val) => {
                self.write_u8(1);
                self.write_f32(val);
            }
            None => {
                self.write_u8(0);
                self.write_f32(0.0);
            }
        }
    }

    fn write_cause(&mut self, cause: CaptureError) {
        let (code, expected, actual) = match cause {
            CaptureError::NoContext => (0, 0, 0),
            CaptureError::Draw => (1, 0, 0),
            CaptureError::Readback => (2, 0, 0),
            CaptureError::SizeMismatch { expected, actual } => (3, expected, actual),
            CaptureError::EmptyFrame => (4, 0, 0),
        };
        self.write_u8(code);
        self.write_u64(expected as u64);
        self.write_u64(actual as u64);
    }

    fn write_track_change(&mut self, c: TrackChange) {
        self.write_u8(match c {
            TrackChange::Adopted { switched: false } => 0,
            TrackChange::Adopted { switched: true } => 1,
            TrackChange::Released => 2,
        });
    }

    fn write_lifecycle(&mut self, p: LifecyclePhase) {
        self.write_u8(match p {
            LifecyclePhase::Started => 0,
            LifecyclePhase::Probe => 1,
            LifecyclePhase::Restarted => 2,
            LifecyclePhase::TornDown => 3,
        });
    }
}

impl TraceSink for RecorderSink {
    fn on_tick(&mut self, e: &TickEvent) {
        self.write_u8(TAG_TICK);
        self.write_u64(e.tick_index);
        self.write_u64(e.now.micros());
        self.write_u64(e.video_count as u64);
        self.write_bool(e.enabled);
    }

    fn on_track(&mut self, e: &TrackEvent) {
        self.write_u8(TAG_TRACK);
        self.write_u64(e.tick_index);
        self.write_u64(e.now.micros());
        self.write_track_change(e.change);
    }

    fn on_capture_fallback(&mut self, e: &CaptureFallbackEvent) {
        self.write_u8(TAG_CAPTURE_FALLBACK);
        self.write_u64(e.tick_index);
        self.write_u64(e.now.micros());
        self.write_cause(e.cause);
        self.write_option_f32(e.fallback);
    }

    fn on_dim_change(&mut self, e: &DimChangeEvent) {
        self.write_u8(TAG_DIM_CHANGE);
        self.write_u64(e.tick_index);
        self.write_u64(e.now.micros());
        self.write_f32(e.brightness);
        self.write_f32(e.previous);
        self.write_f32(e.level);
        self.write_f32(e.visible_brightness);
    }

    fn on_settings(&mut self, e: &SettingsEvent) {
        self.write_u8(TAG_SETTINGS);
        self.write_u64(e.now.micros());
        self.write_bool(e.settings.enabled());
        self.write_f32(e.settings.dim_level());
        self.write_f32(e.settings.brightness_threshold());
        self.write_u8(match e.policy {
            DimPolicy::Threshold => 0,
            DimPolicy::Gradual => 1,
        });
    }

    fn on_lifecycle(&mut self, e: &LifecycleEvent) {
        self.write_u8(TAG_LIFECYCLE);
        self.write_u64(e.now.micros());
        self.write_lifecycle(e.phase);
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug)]
pub enum RecordedEvent {
    /// A [`TickEvent`].
    Tick(TickEvent),
    /// A [`TrackEvent`].
    Track(TrackEvent),
    /// A [`CaptureFallbackEvent`].
    CaptureFallback(CaptureFallbackEvent),
    /// A [`DimChangeEvent`].
    DimChange(DimChangeEvent),
    /// A [`SettingsEvent`].
    Settings(SettingsEvent),
    /// A [`LifecycleEvent`].
    Lifecycle(LifecycleEvent),
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let bytes = self.data.get(self.pos..self.pos + N)?.try_into().ok()?;
        self.pos += N;
        Some(bytes)
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.take::<1>().map(|[b]| b)
    }

    fn read_u64(&mut self) -> Option<u64> {
        self.take().map(u64::from_le_bytes)
    }

    fn read_f32(&mut self) -> Option<f32> {
        self.take().map(f32::from_le_bytes)
    }

    fn read_bool(&mut self) -> Option<bool> {
        Some(self.read_u8()? != 0)
    }

    fn read_usize(&mut self) -> Option<usize> {
        usize::try_from(self.read_u64()?).ok()
    }

    fn read_option_f32(&mut self) -> Option<Option<f32>> {
        let present = self.read_u8()?;
        let val = self.read_f32()?;
        Some((present != 0).then_some(val))
    }

    fn read_cause(&mut self) -> Option<CaptureError> {
        let code = self.read_u8()?;
        let expected = self.read_usize()?;
        let actual = self.read_usize()?;
        Some(match code {
            0 => CaptureError::NoContext,
            1 => CaptureError::Draw,
            2 => CaptureError::Readback,
            3 => CaptureError::SizeMismatch { expected, actual },
            _ => CaptureError::EmptyFrame,
        })
    }

    fn read_track_change(&mut self) -> Option<TrackChange> {
        Some(match self.read_u8()? {
            0 => TrackChange::Adopted { switched: false },
            1 => TrackChange::Adopted { switched: true },
            _ => TrackChange::Released,
        })
    }

    fn read_lifecycle(&mut self) -> Option<LifecyclePhase> {
        Some(match self.read_u8()? {
            0 => LifecyclePhase::Started,
            1 => LifecyclePhase::Probe,
            2 => LifecyclePhase::Restarted,
            _ => LifecyclePhase::TornDown,
        })
    }

    fn decode_tick(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Tick(TickEvent {
            tick_index: self.read_u64()?,
            now: HostTime(self.read_u64()?),
            video_count: self.read_usize()?,
            enabled: self.read_bool()?,
        }))
    }

    fn decode_track(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Track(TrackEvent {
            tick_index: self.read_u64()?,
            now: HostTime(self.read_u64()?),
            change: self.read_track_change()?,
        }))
    }

    fn decode_capture_fallback(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::CaptureFallback(CaptureFallbackEvent {
            tick_index: self.read_u64()?,
            now: HostTime(self.read_u64()?),
            cause: self.read_cause()?,
            fallback: self.read_option_f32()?,
        }))
    }

    fn decode_dim_change(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::DimChange(DimChangeEvent {
            tick_index: self.read_u64()?,
            now: HostTime(self.read_u64()?),
            brightness: self.read_f32()?,
            previous: self.read_f32()?,
            level: self.read_f32()?,
            visible_brightness: self.read_f32()?,
        }))
    }

    fn decode_settings(&mut self) -> Option<RecordedEvent> {
        let now = HostTime(self.read_u64()?);
        let enabled = self.read_bool()?;
        let dim_level = self.read_f32()?;
        let threshold = self.read_f32()?;
        let policy = match self.read_u8()? {
            0 => DimPolicy::Threshold,
            _ => DimPolicy::Gradual,
        };
        Some(RecordedEvent::Settings(SettingsEvent {
            now,
            settings: Settings::new(enabled, dim_level, threshold),
            policy,
        }))
    }

    fn decode_lifecycle(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Lifecycle(LifecycleEvent {
            now: HostTime(self.read_u64()?),
            phase: self.read_lifecycle()?,
        }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        match tag {
            TAG_TICK => self.decode_tick(),
            TAG_TRACK => self.decode_track(),
            TAG_CAPTURE_FALLBACK => self.decode_capture_fallback(),
            TAG_DIM_CHANGE => self.decode_dim_change(),
            TAG_SETTINGS => self.decode_settings(),
            TAG_LIFECYCLE => self.decode_lifecycle(),
            _ => None, // unknown tag → stop iteration
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_a_session() {
        let mut rec = RecorderSink::new();
        rec.on_lifecycle(&LifecycleEvent {
            now: HostTime(0),
            phase: LifecyclePhase::Started,
        });
        rec.on_tick(&TickEvent {
            tick_index: 0,
            now: HostTime(33_000),
            video_count: 2,
            enabled: true,
        });
        rec.on_track(&TrackEvent {
            tick_index: 0,
            now: HostTime(33_000),
            change: TrackChange::Adopted { switched: false },
        });
        rec.on_dim_change(&DimChangeEvent {
            tick_index: 0,
            now: HostTime(33_000),
            brightness: 0.8,
            previous: 0.0,
            level: 0.5,
            visible_brightness: 0.6,
        });

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 4);
        assert!(matches!(
            events[0],
            RecordedEvent::Lifecycle(LifecycleEvent {
                phase: LifecyclePhase::Started,
                ..
            })
        ));
        match &events[1] {
            RecordedEvent::Tick(t) => {
                assert_eq!(t.now, HostTime(33_000));
                assert_eq!(t.video_count, 2);
                assert!(t.enabled);
            }
            other => panic!("expected tick, got {other:?}"),
        }
        match &events[3] {
            RecordedEvent::DimChange(d) => {
                assert_eq!(d.level, 0.5);
                assert_eq!(d.visible_brightness, 0.6);
            }
            other => panic!("expected dim change, got {other:?}"),
        }
    }

    #[test]
    fn capture_cause_survives_recording() {
        let mut rec = RecorderSink::new();
        let cause = CaptureError::SizeMismatch {
            expected: 9216,
            actual: 16,
        };
        rec.on_capture_fallback(&CaptureFallbackEvent {
            tick_index: 5,
            now: HostTime(1),
            cause,
            fallback: None,
        });
        match decode(rec.as_bytes()).next() {
            Some(RecordedEvent::CaptureFallback(e)) => {
                assert_eq!(e.cause, cause);
                assert_eq!(e.fallback, None);
            }
            other => panic!("expected fallback, got {other:?}"),
        }
    }

    #[test]
    fn settings_are_renormalized_on_decode() {
        let mut rec = RecorderSink::new();
        rec.on_settings(&SettingsEvent {
            now: HostTime(7),
            settings: Settings::new(false, 0.3, 0.75),
            policy: DimPolicy::Gradual,
        });
        match decode(rec.as_bytes()).next() {
            Some(RecordedEvent::Settings(e)) => {
                assert_eq!(e.settings, Settings::new(false, 0.3, 0.75));
                assert_eq!(e.policy, DimPolicy::Gradual);
            }
            other => panic!("expected settings, got {other:?}"),
        }
    }

    #[test]
    fn truncated_buffer_stops_cleanly() {
        let mut rec = RecorderSink::new();
        rec.on_tick(&TickEvent {
            tick_index: 1,
            now: HostTime(1),
            video_count: 0,
            enabled: false,
        });
        let bytes = rec.into_bytes();
        assert_eq!(decode(&bytes[..bytes.len() - 1]).count(), 0);
        assert_eq!(decode(&[]).count(), 0);
    }
}
