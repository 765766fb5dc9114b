// Copyright 2026 the FlashGuard Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `<video>` element handles.
//!
//! [`DomVideo`] exposes an `HTMLVideoElement`'s playback state to the core
//! tracker and writes the dim filter to the element's inline style. Only the
//! `filter` and `transition` properties are ever touched.

use alloc::vec::Vec;

use wasm_bindgen::JsCast as _;
use web_sys::{Document, HtmlVideoElement};

use flashguard_core::filter::{DimFilter, FILTER_PROPERTY, FilterTarget, TRANSITION_PROPERTY};
use flashguard_core::tracker::VideoElement;

/// A handle to a video element on the page.
///
/// Equality is element identity.
#[derive(Clone, PartialEq)]
pub struct DomVideo {
    element: HtmlVideoElement,
}

impl core::fmt::Debug for DomVideo {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DomVideo")
            .field("ready_state", &self.element.ready_state())
            .field("paused", &self.element.paused())
            .field("current_time", &self.element.current_time())
            .finish()
    }
}

impl DomVideo {
    /// Wraps an element.
    #[must_use]
    pub fn new(element: HtmlVideoElement) -> Self {
        Self { element }
    }

    /// Returns the underlying element.
    #[must_use]
    pub fn element(&self) -> &HtmlVideoElement {
        &self.element
    }
}

impl VideoElement for DomVideo {
    fn ready_state(&self) -> u16 {
        self.element.ready_state()
    }

    fn paused(&self) -> bool {
        self.element.paused()
    }

    fn current_time(&self) -> f64 {
        self.element.current_time()
    }
}

impl FilterTarget for DomVideo {
    fn apply_filter(&self, filter: &DimFilter) {
        let s = self.element.style();
        let _ = s.set_property(FILTER_PROPERTY, &filter.css_filter());
        let _ = s.set_property(TRANSITION_PROPERTY, &filter.css_transition());
    }

    fn clear_filter(&self) {
        let s = self.element.style();
        let _ = s.remove_property(FILTER_PROPERTY);
        let _ = s.remove_property(TRANSITION_PROPERTY);
    }
}

/// Returns every `<video>` element in `document`, in document order.
#[must_use]
pub fn collect_videos(document: &Document) -> Vec<DomVideo> {
    let list = document.get_elements_by_tag_name("video");
    (0..list.length())
        .filter_map(|i| list.item(i))
        .filter_map(|el| el.dyn_into::<HtmlVideoElement>().ok())
        .map(DomVideo::new)
        .collect()
}

/// Returns the number of `<video>` elements in `document`.
#[must_use]
pub fn video_count(document: &Document) -> usize {
    document.get_elements_by_tag_name("video").length() as usize
}
