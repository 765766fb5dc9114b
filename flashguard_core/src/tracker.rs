// Copyright 2026 the FlashGuard Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Video eligibility and single-active-video tracking.
//!
//! Only one video is tracked at a time. Each tick, the first eligible video
//! on the page is selected; if it is not the one already tracked, tracking
//! switches and the caller is handed the previous video so it can remove its
//! filter before anything is applied to the new one.

/// `HTMLMediaElement.HAVE_CURRENT_DATA`: enough data to render the current
/// frame.
pub const HAVE_CURRENT_DATA: u16 = 2;

/// Read-only playback state of a video element.
///
/// Equality must be identity: two handles are equal if and only if they
/// refer to the same element.
pub trait VideoElement: Clone + PartialEq {
    /// `HTMLMediaElement.readyState`.
    fn ready_state(&self) -> u16;

    /// Whether playback is paused.
    fn paused(&self) -> bool;

    /// Playback position in seconds.
    fn current_time(&self) -> f64;
}

/// Returns `true` if `video` has a frame to show, is playing, and has moved
/// past the start.
///
/// This excludes poster-only, paused and not-yet-started elements.
#[must_use]
pub fn is_eligible<V: VideoElement>(video: &V) -> bool {
    video.ready_state() >= HAVE_CURRENT_DATA && !video.paused() && video.current_time() > 0.0
}

/// Result of [`VideoTracker::track`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Track<V> {
    /// The video was already tracked.
    Unchanged,
    /// The video is now tracked.
    Adopted {
        /// The video that was tracked before, if any. Its filter must be
        /// removed before the new video is dimmed.
        previous: Option<V>,
    },
}

/// Holds at most one active video.
#[derive(Clone, Debug)]
pub struct VideoTracker<V> {
    active: Option<V>,
}

impl<V> Default for VideoTracker<V> {
    fn default() -> Self {
        Self { active: None }
    }
}

impl<V: VideoElement> VideoTracker<V> {
    /// Creates a tracker with no active video.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the first eligible video in page order.
    #[must_use]
    pub fn select<I>(videos: I) -> Option<V>
    where
        I: IntoIterator<Item = V>,
    {
        videos.into_iter().find(is_eligible)
    }

    /// Makes `video` the active one.
    pub fn track(&mut self, video: V) -> Track<V> {
        if self.active.as_ref() == Some(&video) {
            return Track::Unchanged;
        }
        let previous = self.active.replace(video);
        Track::Adopted { previous }
    }

    /// Stops tracking and returns the video that was active.
    pub fn release(&mut self) -> Option<V> {
        self.active.take()
    }

    /// Returns the active video.
    #[must_use]
    pub fn active(&self) -> Option<&V> {
        self.active.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct Probe {
        id: u32,
        ready: u16,
        paused: bool,
        time: f64,
    }

    impl VideoElement for Probe {
        fn ready_state(&self) -> u16 {
            self.ready
        }
        fn paused(&self) -> bool {
            self.paused
        }
        fn current_time(&self) -> f64 {
            self.time
        }
    }

    fn playing(id: u32) -> Probe {
        Probe {
            id,
            ready: 4,
            paused: false,
            time: 1.5,
        }
    }

    #[test]
    fn eligibility_predicate() {
        assert!(is_eligible(&playing(0)));
        assert!(!is_eligible(&Probe {
            ready: 1,
            ..playing(0)
        }));
        assert!(!is_eligible(&Probe {
            paused: true,
            ..playing(0)
        }));
        assert!(!is_eligible(&Probe {
            time: 0.0,
            ..playing(0)
        }));
        assert!(is_eligible(&Probe {
            ready: HAVE_CURRENT_DATA,
            ..playing(0)
        }));
    }

    #[test]
    fn select_takes_first_eligible() {
        let poster = Probe {
            time: 0.0,
            ..playing(1)
        };
        let picked = VideoTracker::select(vec![poster, playing(2), playing(3)]);
        assert_eq!(picked.map(|p| p.id), Some(2));
        assert_eq!(VideoTracker::<Probe>::select(vec![]), None);
    }

    #[test]
    fn switching_hands_back_previous() {
        let mut t = VideoTracker::new();
        assert_eq!(t.track(playing(1)), Track::Adopted { previous: None });
        assert_eq!(t.track(playing(1)), Track::Unchanged);
        assert_eq!(
            t.track(playing(2)),
            Track::Adopted {
                previous: Some(playing(1))
            }
        );
        assert_eq!(t.active().map(|p| p.id), Some(2));
        assert_eq!(t.release().map(|p| p.id), Some(2));
        assert!(t.active().is_none());
    }
}
