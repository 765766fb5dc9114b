// Copyright 2026 the FlashGuard Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory stand-in for a `<video>` element.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};

use flashguard_core::filter::{DimFilter, FilterTarget};
use flashguard_core::tracker::VideoElement;

/// One style mutation made on a [`FakeVideo`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FilterOp {
    /// `apply_filter` was called.
    Apply {
        /// Video id.
        video: u32,
        /// The filter written.
        filter: DimFilter,
    },
    /// `clear_filter` was called.
    Clear {
        /// Video id.
        video: u32,
    },
}

impl FilterOp {
    /// Returns the id of the video the op touched.
    #[must_use]
    pub const fn video(&self) -> u32 {
        match *self {
            Self::Apply { video, .. } | Self::Clear { video } => video,
        }
    }
}

/// Shared, ordered record of every filter mutation across all videos.
pub type FilterLog = Rc<RefCell<Vec<FilterOp>>>;

#[derive(Debug)]
struct VideoState {
    id: u32,
    ready_state: Cell<u16>,
    paused: Cell<bool>,
    current_time: Cell<f64>,
    scene: Cell<f32>,
    cross_origin: Cell<bool>,
    filter: Cell<Option<DimFilter>>,
    log: FilterLog,
}

/// A scriptable video element.
///
/// Clones share state, like handles to the same DOM node. The video's
/// `scene` brightness is what [`ScriptedCapture`](crate::ScriptedCapture)
/// reads when it has nothing scripted.
#[derive(Clone, Debug)]
pub struct FakeVideo {
    state: Rc<VideoState>,
}

impl PartialEq for FakeVideo {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }
}

impl FakeVideo {
    /// Creates a video that is loaded and playing, a second in, showing a
    /// black scene.
    #[must_use]
    pub fn playing(id: u32, log: &FilterLog) -> Self {
        Self {
            state: Rc::new(VideoState {
                id,
                ready_state: Cell::new(4),
                paused: Cell::new(false),
                current_time: Cell::new(1.0),
                scene: Cell::new(0.0),
                cross_origin: Cell::new(false),
                filter: Cell::new(None),
                log: Rc::clone(log),
            }),
        }
    }

    /// Creates a video that has not loaded any data yet.
    #[must_use]
    pub fn unloaded(id: u32, log: &FilterLog) -> Self {
        let v = Self::playing(id, log);
        v.state.ready_state.set(0);
        v.state.current_time.set(0.0);
        v
    }

    /// The id given at construction.
    #[must_use]
    pub fn id(&self) -> u32 {
        self.state.id
    }

    /// Resumes playback.
    pub fn play(&self) {
        self.state.paused.set(false);
    }

    /// Pauses playback.
    pub fn pause(&self) {
        self.state.paused.set(true);
    }

    /// Sets `readyState`.
    pub fn set_ready_state(&self, ready_state: u16) {
        self.state.ready_state.set(ready_state);
    }

    /// Sets the playback position in seconds.
    pub fn set_current_time(&self, seconds: f64) {
        self.state.current_time.set(seconds);
    }

    /// Sets the brightness of what the video currently shows.
    pub fn set_scene(&self, brightness: f32) {
        self.state.scene.set(brightness);
    }

    /// Brightness of what the video currently shows.
    #[must_use]
    pub fn scene(&self) -> f32 {
        self.state.scene.get()
    }

    /// Marks the video as cross-origin, which makes readback fail.
    pub fn set_cross_origin(&self, cross_origin: bool) {
        self.state.cross_origin.set(cross_origin);
    }

    /// Whether readback of this video fails.
    #[must_use]
    pub fn cross_origin(&self) -> bool {
        self.state.cross_origin.get()
    }

    /// The filter currently on the element's style, if any.
    #[must_use]
    pub fn filter(&self) -> Option<DimFilter> {
        self.state.filter.get()
    }
}

impl VideoElement for FakeVideo {
    fn ready_state(&self) -> u16 {
        self.state.ready_state.get()
    }

    fn paused(&self) -> bool {
        self.state.paused.get()
    }

    fn current_time(&self) -> f64 {
        self.state.current_time.get()
    }
}

impl FilterTarget for FakeVideo {
    fn apply_filter(&self, filter: &DimFilter) {
        self.state.filter.set(Some(*filter));
        self.state.log.borrow_mut().push(FilterOp::Apply {
            video: self.state.id,
            filter: *filter,
        });
    }

    fn clear_filter(&self) {
        self.state.filter.set(None);
        self.state
            .log
            .borrow_mut()
            .push(FilterOp::Clear { video: self.state.id });
    }
}
