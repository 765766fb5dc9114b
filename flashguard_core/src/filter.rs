// Copyright 2026 the FlashGuard Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Visual darkening of the tracked video.
//!
//! A [`DimFilter`] is the presentation-level description of one intensity:
//! a CSS `brightness()` multiplier plus the transition used to ease into it.
//! Platform video handles implement [`FilterTarget`] to write or clear those
//! values on the element's inline style.

use alloc::format;
use alloc::string::String;

use crate::policy::{DimPolicy, Transition};

/// Inline style property carrying the brightness filter.
pub const FILTER_PROPERTY: &str = "filter";

/// Inline style property carrying the filter transition.
pub const TRANSITION_PROPERTY: &str = "transition";

/// Filter values for one dim intensity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DimFilter {
    /// CSS `brightness()` multiplier, `1.0` meaning unchanged.
    pub brightness: f32,
    /// Transition into this value.
    pub transition: Transition,
}

impl DimFilter {
    /// Builds the filter for `intensity` under `policy`.
    #[must_use]
    pub fn for_intensity(policy: DimPolicy, intensity: f32) -> Self {
        Self {
            brightness: policy.filter_curve().visible_brightness(intensity),
            transition: policy.transition(),
        }
    }

    /// Returns the `filter` property value, e.g. `brightness(0.600)`.
    #[must_use]
    pub fn css_filter(&self) -> String {
        format!("brightness({:.3})", self.brightness)
    }

    /// Returns the `transition` property value, e.g. `filter 100ms ease-out`.
    #[must_use]
    pub fn css_transition(&self) -> String {
        format!(
            "{FILTER_PROPERTY} {}ms {}",
            self.transition.duration.as_millis(),
            self.transition.easing.css()
        )
    }
}

/// Something a [`DimFilter`] can be applied to.
///
/// Both operations take `&self`: platform handles are shared references to
/// elements whose style is mutated in place.
pub trait FilterTarget {
    /// Writes `filter` to the element, replacing any previous filter.
    fn apply_filter(&self, filter: &DimFilter);

    /// Removes the filter and transition, restoring the element's original
    /// presentation. Must be safe to call when nothing is applied.
    fn clear_filter(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_filter_css() {
        let f = DimFilter::for_intensity(DimPolicy::Threshold, 0.5);
        assert!((f.brightness - 0.6).abs() < 1e-6);
        assert_eq!(f.css_filter(), "brightness(0.600)");
        assert_eq!(f.css_transition(), "filter 100ms ease-out");
    }

    #[test]
    fn gradual_filter_css() {
        let f = DimFilter::for_intensity(DimPolicy::Gradual, 1.0);
        assert_eq!(f.css_filter(), "brightness(0.100)");
        assert_eq!(f.css_transition(), "filter 300ms ease-in-out");
    }

    #[test]
    fn zero_intensity_is_neutral() {
        let f = DimFilter::for_intensity(DimPolicy::Gradual, 0.0);
        assert_eq!(f.css_filter(), "brightness(1.000)");
    }
}
