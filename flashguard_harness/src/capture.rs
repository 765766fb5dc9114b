// Copyright 2026 the FlashGuard Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deterministic frame capture.

use alloc::collections::VecDeque;

use flashguard_core::luma::{
    ANALYSIS_HEIGHT, ANALYSIS_WIDTH, AnalysisSurface, BYTES_PER_PIXEL, CaptureError, FrameCapture,
};

use crate::video::FakeVideo;

/// Capture that paints a uniform grey frame.
///
/// Scripted results are consumed first, one per capture. With nothing
/// scripted, the frame is the video's scene brightness, and a cross-origin
/// video fails readback.
#[derive(Debug)]
pub struct ScriptedCapture {
    surface: AnalysisSurface,
    script: VecDeque<Result<f32, CaptureError>>,
    captures: u64,
}

impl Default for ScriptedCapture {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedCapture {
    /// Creates a capture with an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self {
            surface: AnalysisSurface::new(ANALYSIS_WIDTH, ANALYSIS_HEIGHT),
            script: VecDeque::new(),
            captures: 0,
        }
    }

    /// Queues a frame of the given brightness.
    pub fn push_frame(&mut self, brightness: f32) {
        self.script.push_back(Ok(brightness));
    }

    /// Queues a capture failure.
    pub fn push_error(&mut self, error: CaptureError) {
        self.script.push_back(Err(error));
    }

    /// Number of scripted results not yet consumed.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.script.len()
    }

    /// Number of capture attempts so far.
    #[must_use]
    pub fn captures(&self) -> u64 {
        self.captures
    }

    fn paint(&mut self, brightness: f32) {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "clamped to the u8 range first"
        )]
        let grey = {
            // `f32::round` needs std; this is the same rounding for the
            // non-negative, clamped value.
            let scaled = brightness.clamp(0.0, 1.0) * 255.0;
            let floor = scaled as u8;
            if scaled - f32::from(floor) >= 0.5 {
                floor + 1
            } else {
                floor
            }
        };
        for px in self.surface.pixels_mut().chunks_exact_mut(BYTES_PER_PIXEL) {
            px.copy_from_slice(&[grey, grey, grey, 255]);
        }
    }
}

impl FrameCapture<FakeVideo> for ScriptedCapture {
    fn capture(&mut self, video: &FakeVideo) -> Result<&AnalysisSurface, CaptureError> {
        self.captures += 1;
        let next = match self.script.pop_front() {
            Some(scripted) => scripted,
            None if video.cross_origin() => Err(CaptureError::Readback),
            None => Ok(video.scene()),
        };
        self.paint(next?);
        Ok(&self.surface)
    }
}
