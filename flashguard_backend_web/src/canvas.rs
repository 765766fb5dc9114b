// Copyright 2026 the FlashGuard Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Canvas-based frame capture.
//!
//! Frames are drawn, scaled down, into a detached 64×36 `<canvas>` and read
//! back with `getImageData`. The canvas and its 2D context are created on
//! first use and reused for the lifetime of the capture. The context is
//! requested with `willReadFrequently` since every tick reads it back.
//!
//! Cross-origin videos without CORS headers taint the canvas; readback then
//! throws and the sampler falls back to the last good brightness.

use js_sys::{Object, Reflect};
use wasm_bindgen::JsCast as _;
use wasm_bindgen::JsValue;
use web_sys::{CanvasRenderingContext2d, Document, HtmlCanvasElement};

use flashguard_core::luma::{AnalysisSurface, CaptureError, FrameCapture};

use crate::video::DomVideo;

struct Canvas {
    // Kept alive for the context's sake; never attached to the document.
    _element: HtmlCanvasElement,
    context: CanvasRenderingContext2d,
}

/// Draws video frames into a small offscreen canvas.
pub struct CanvasCapture {
    document: Document,
    canvas: Option<Canvas>,
    surface: AnalysisSurface,
}

impl core::fmt::Debug for CanvasCapture {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CanvasCapture")
            .field("created", &self.canvas.is_some())
            .field("width", &self.surface.width())
            .field("height", &self.surface.height())
            .finish()
    }
}

impl CanvasCapture {
    /// Creates a capture that will allocate its canvas from `document`.
    #[must_use]
    pub fn new(document: Document) -> Self {
        Self {
            document,
            canvas: None,
            surface: AnalysisSurface::default(),
        }
    }

    /// Returns the surface holding the last captured frame.
    #[must_use]
    pub fn surface(&self) -> &AnalysisSurface {
        &self.surface
    }
}

fn create_canvas(document: &Document, width: u32, height: u32) -> Result<Canvas, JsValue> {
    let element: HtmlCanvasElement = document.create_element("canvas")?.dyn_into()?;
    element.set_width(width);
    element.set_height(height);

    let options = Object::new();
    Reflect::set(&options, &"willReadFrequently".into(), &JsValue::TRUE)?;
    let context = element
        .get_context_with_context_options("2d", &options)?
        .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
        .dyn_into::<CanvasRenderingContext2d>()?;

    Ok(Canvas {
        _element: element,
        context,
    })
}

impl FrameCapture<DomVideo> for CanvasCapture {
    fn capture(&mut self, video: &DomVideo) -> Result<&AnalysisSurface, CaptureError> {
        let (width, height) = (self.surface.width(), self.surface.height());
        if self.canvas.is_none() {
            let canvas = create_canvas(&self.document, width, height)
                .map_err(|_| CaptureError::NoContext)?;
            self.canvas = Some(canvas);
        }
        let Some(canvas) = &self.canvas else {
            return Err(CaptureError::NoContext);
        };

        let (w, h) = (f64::from(width), f64::from(height));
        canvas
            .context
            .draw_image_with_html_video_element_and_dw_and_dh(video.element(), 0.0, 0.0, w, h)
            .map_err(|_| CaptureError::Draw)?;
        let image = canvas
            .context
            .get_image_data(0.0, 0.0, w, h)
            .map_err(|_| CaptureError::Readback)?;
        self.surface.load(&image.data().0)?;
        Ok(&self.surface)
    }
}
