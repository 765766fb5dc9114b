// Copyright 2026 the FlashGuard Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame capture and luminance estimation.
//!
//! A frame is drawn into a small fixed-size RGBA raster (the analysis
//! surface, 64×36) and reduced to one perceptual brightness value:
//!
//! ```text
//!   luma = (0.299 R + 0.587 G + 0.114 B) / 255
//! ```
//!
//! averaged over every 4th pixel. Because the surface size is fixed, the cost
//! per tick does not depend on the video's resolution.
//!
//! Platform crates implement [`FrameCapture`] to do the actual drawing and
//! readback; [`FrameSampler`] wraps a capture with the fallback rules.

use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use crate::history::BrightnessHistory;

/// Width of the analysis surface in pixels.
pub const ANALYSIS_WIDTH: u32 = 64;

/// Height of the analysis surface in pixels.
pub const ANALYSIS_HEIGHT: u32 = 36;

/// Bytes per RGBA pixel.
pub const BYTES_PER_PIXEL: usize = 4;

/// Only every `SAMPLE_STRIDE`-th pixel contributes to the estimate.
pub const SAMPLE_STRIDE: usize = 4;

/// Rec. 601 luma weights for red, green and blue.
pub const LUMA_WEIGHTS: [f32; 3] = [0.299, 0.587, 0.114];

/// Estimates the mean perceptual brightness of an RGBA buffer.
///
/// Samples every [`SAMPLE_STRIDE`]-th pixel and ignores alpha and any
/// trailing partial pixel. Returns `None` when the buffer holds no pixel.
#[must_use]
pub fn luminance(rgba: &[u8]) -> Option<f32> {
    let mut total = 0.0_f32;
    let mut count = 0_u32;
    for px in rgba.chunks_exact(BYTES_PER_PIXEL).step_by(SAMPLE_STRIDE) {
        let weighted = LUMA_WEIGHTS[0] * f32::from(px[0])
            + LUMA_WEIGHTS[1] * f32::from(px[1])
            + LUMA_WEIGHTS[2] * f32::from(px[2]);
        total += weighted / 255.0;
        count += 1;
    }
    (count > 0).then(|| (total / count as f32).clamp(0.0, 1.0))
}

/// Why a frame could not be turned into a brightness reading.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaptureError {
    /// The host could not provide a drawing context for the surface.
    NoContext,
    /// Drawing the video frame into the surface failed.
    Draw,
    /// Reading pixels back failed, usually because the video is
    /// cross-origin and the surface is tainted.
    Readback,
    /// Readback returned a buffer of the wrong size.
    SizeMismatch {
        /// Bytes the surface holds.
        expected: usize,
        /// Bytes returned by the host.
        actual: usize,
    },
    /// The frame contained no pixel to sample.
    EmptyFrame,
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoContext => f.write_str("no 2d context for the analysis surface"),
            Self::Draw => f.write_str("drawing the video frame failed"),
            Self::Readback => f.write_str("pixel readback was refused"),
            Self::SizeMismatch { expected, actual } => {
                write!(f, "readback returned {actual} bytes, expected {expected}")
            }
            Self::EmptyFrame => f.write_str("frame contained no pixels"),
        }
    }
}

impl core::error::Error for CaptureError {}

/// Fixed-size RGBA readback buffer.
///
/// Created once per monitor and reused for every tick. The size never
/// changes after construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnalysisSurface {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Default for AnalysisSurface {
    fn default() -> Self {
        Self::new(ANALYSIS_WIDTH, ANALYSIS_HEIGHT)
    }
}

impl AnalysisSurface {
    /// Creates a zeroed surface of the given size.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        let len = width as usize * height as usize * BYTES_PER_PIXEL;
        Self {
            width,
            height,
            pixels: vec![0; len],
        }
    }

    /// Surface width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Surface height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Returns the RGBA bytes of the last capture.
    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Mutable access for hosts that render directly into the buffer.
    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    /// Copies a readback result into the surface.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::SizeMismatch`] if `rgba` is not exactly the
    /// surface's size; the surface is left untouched in that case.
    pub fn load(&mut self, rgba: &[u8]) -> Result<(), CaptureError> {
        if rgba.len() != self.pixels.len() {
            return Err(CaptureError::SizeMismatch {
                expected: self.pixels.len(),
                actual: rgba.len(),
            });
        }
        self.pixels.copy_from_slice(rgba);
        Ok(())
    }

    /// Returns the luminance of the current contents.
    #[must_use]
    pub fn luminance(&self) -> Option<f32> {
        luminance(&self.pixels)
    }
}

/// Draws the current frame of a video into an analysis surface.
///
/// Implemented by platform backends (a 2D canvas on the web) and by test
/// doubles.
pub trait FrameCapture<V: ?Sized> {
    /// Captures the current frame of `video` and returns the surface holding
    /// its pixels.
    ///
    /// # Errors
    ///
    /// Returns a [`CaptureError`] if the frame cannot be drawn or read back.
    fn capture(&mut self, video: &V) -> Result<&AnalysisSurface, CaptureError>;
}

/// Outcome of one sampling attempt.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Sample {
    /// A brightness computed from the current frame.
    Fresh(f32),
    /// Capture failed; this is the last known good brightness.
    Fallback {
        /// Reused reading.
        brightness: f32,
        /// Why capture failed.
        cause: CaptureError,
    },
    /// Capture failed and there is no earlier reading to fall back on.
    Unavailable {
        /// Why capture failed.
        cause: CaptureError,
    },
}

impl Sample {
    /// Returns the brightness to act on, if any.
    #[must_use]
    pub const fn brightness(&self) -> Option<f32> {
        match *self {
            Self::Fresh(b) | Self::Fallback { brightness: b, .. } => Some(b),
            Self::Unavailable { .. } => None,
        }
    }
}

/// Frame capture plus last-known-good fallback.
#[derive(Debug)]
pub struct FrameSampler<C> {
    capture: C,
    history: BrightnessHistory,
}

impl<C> FrameSampler<C> {
    /// Wraps a capture backend.
    #[must_use]
    pub const fn new(capture: C) -> Self {
        Self {
            capture,
            history: BrightnessHistory::new(),
        }
    }

    /// Samples the current frame of `video`.
    ///
    /// Never fails: capture errors fall back to the last good reading.
    pub fn sample<V: ?Sized>(&mut self, video: &V) -> Sample
    where
        C: FrameCapture<V>,
    {
        let result = self
            .capture
            .capture(video)
            .and_then(|surface| surface.luminance().ok_or(CaptureError::EmptyFrame));
        match result {
            Ok(brightness) => {
                self.history.record(brightness);
                Sample::Fresh(brightness)
            }
            Err(cause) => match self.history.last() {
                Some(brightness) => Sample::Fallback { brightness, cause },
                None => Sample::Unavailable { cause },
            },
        }
    }

    /// Returns the brightness history.
    #[must_use]
    pub const fn history(&self) -> &BrightnessHistory {
        &self.history
    }

    /// Forgets the last good reading, e.g. when a different video is tracked.
    pub fn reset(&mut self) {
        self.history.clear();
    }

    /// Returns the capture backend.
    #[must_use]
    pub const fn capture(&self) -> &C {
        &self.capture
    }

    /// Returns the capture backend mutably.
    pub fn capture_mut(&mut self) -> &mut C {
        &mut self.capture
    }
}
