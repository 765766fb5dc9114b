// Copyright 2026 the FlashGuard Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dimming policies.
//!
//! A [`DimPolicy`] is a pure mapping from a brightness reading and the user's
//! [`Settings`] to a *target intensity* in `[0, dim_level]`. It also decides
//! how an intensity becomes a visible brightness multiplier
//! ([`FilterCurve`]) and how quickly the filter eases between values
//! ([`Transition`]).
//!
//! Neither mapping holds state; update gating lives in
//! [`DimController`](crate::controller::DimController).

use crate::settings::Settings;
use crate::time::Duration;

/// Lowest brightness at which the gradual ramp may start.
pub const MIN_RAMP_START: f32 = 0.3;

/// Distance below the threshold at which the gradual ramp starts.
pub const RAMP_WIDTH: f32 = 0.3;

/// Brightness above which a scene counts as bright for the ramp coefficient.
pub const BRIGHT_SCENE: f32 = 0.7;

/// How brightness readings become a dim intensity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DimPolicy {
    /// Binary: full `dim_level` above the threshold, nothing at or below it.
    #[default]
    Threshold,
    /// Ramp up between a lower start point and the threshold, then full
    /// `dim_level` at or above the threshold.
    Gradual,
}

impl DimPolicy {
    /// Returns the name used in the settings store.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Threshold => "threshold",
            Self::Gradual => "gradual",
        }
    }

    /// Parses a stored policy name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "threshold" => Some(Self::Threshold),
            "gradual" => Some(Self::Gradual),
            _ => None,
        }
    }

    /// Computes the target intensity for `brightness` under `settings`.
    ///
    /// The result ignores [`Settings::enabled`]; the controller forces zero
    /// when disabled.
    #[must_use]
    pub fn target_intensity(self, brightness: f32, settings: &Settings) -> f32 {
        let threshold = settings.brightness_threshold();
        let dim_level = settings.dim_level();
        match self {
            Self::Threshold => {
                if brightness > threshold {
                    dim_level
                } else {
                    0.0
                }
            }
            Self::Gradual => {
                let start = ramp_start(threshold);
                if brightness <= start {
                    0.0
                } else if brightness >= threshold {
                    dim_level
                } else {
                    let factor = ((brightness - start) / (1.0 - start)).clamp(0.0, 1.0);
                    dim_level * factor * scene_coefficient(brightness)
                }
            }
        }
    }

    /// Returns the intensity → visible brightness mapping for this policy.
    #[must_use]
    pub const fn filter_curve(self) -> FilterCurve {
        match self {
            Self::Threshold => FilterCurve {
                floor: 0.2,
                gain: 0.8,
            },
            Self::Gradual => FilterCurve {
                floor: 0.1,
                gain: 0.9,
            },
        }
    }

    /// Returns the eased transition used when the filter changes.
    #[must_use]
    pub const fn transition(self) -> Transition {
        match self {
            Self::Threshold => Transition {
                duration: Duration::from_millis(100),
                easing: Easing::EaseOut,
            },
            Self::Gradual => Transition {
                duration: Duration::from_millis(300),
                easing: Easing::EaseInOut,
            },
        }
    }
}

/// Returns where the gradual ramp begins for a given threshold.
#[must_use]
pub fn ramp_start(threshold: f32) -> f32 {
    (threshold - RAMP_WIDTH).max(MIN_RAMP_START)
}

/// Scales ramp intensity: bright scenes get twice the share of dimming.
#[must_use]
pub fn scene_coefficient(brightness: f32) -> f32 {
    if brightness > BRIGHT_SCENE { 0.3 } else { 0.15 }
}

/// Maps a dim intensity to a CSS `brightness()` multiplier.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FilterCurve {
    /// The multiplier never drops below this value.
    pub floor: f32,
    /// How much one unit of intensity darkens the video.
    pub gain: f32,
}

impl FilterCurve {
    /// Returns `max(floor, 1 - intensity * gain)`.
    #[must_use]
    pub fn visible_brightness(self, intensity: f32) -> f32 {
        (1.0 - intensity * self.gain).max(self.floor)
    }
}

/// CSS timing function for filter transitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Easing {
    /// `ease-out`
    EaseOut,
    /// `ease-in-out`
    EaseInOut,
}

impl Easing {
    /// Returns the CSS keyword.
    #[must_use]
    pub const fn css(self) -> &'static str {
        match self {
            Self::EaseOut => "ease-out",
            Self::EaseInOut => "ease-in-out",
        }
    }
}

/// An eased transition of the `filter` property.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Transition {
    /// How long a change takes to settle.
    pub duration: Duration,
    /// Timing function.
    pub easing: Easing,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> Settings {
        Settings::new(true, 0.5, 0.6)
    }

    #[test]
    fn threshold_policy_is_binary() {
        let s = settings();
        let mut b = 0.0_f32;
        while b <= 1.0 {
            let target = DimPolicy::Threshold.target_intensity(b, &s);
            if b > 0.6 {
                assert_eq!(target, 0.5, "b={b}");
            } else {
                assert_eq!(target, 0.0, "b={b}");
            }
            b += 0.01;
        }
        assert_eq!(DimPolicy::Threshold.target_intensity(0.6, &s), 0.0);
    }

    #[test]
    fn ramp_start_has_a_floor() {
        assert!((ramp_start(0.6) - 0.3).abs() < 1e-6);
        assert!((ramp_start(0.9) - 0.6).abs() < 1e-6);
        assert!((ramp_start(0.2) - 0.3).abs() < 1e-6);
    }

    #[test]
    fn gradual_policy_shape() {
        let s = settings();
        let p = DimPolicy::Gradual;
        assert_eq!(p.target_intensity(0.1, &s), 0.0);
        assert_eq!(p.target_intensity(0.3, &s), 0.0, "ramp start itself is off");
        assert_eq!(p.target_intensity(0.6, &s), 0.5, "threshold is full strength");
        assert_eq!(p.target_intensity(0.95, &s), 0.5);

        let mut prev = 0.0;
        let mut b = 0.301_f32;
        while b <= 0.6 {
            let t = p.target_intensity(b, &s);
            assert!(t >= prev, "not monotonic at b={b}: {t} < {prev}");
            assert!(t <= 0.5, "ramp exceeds dim level at b={b}");
            prev = t;
            b += 0.005;
        }
    }

    #[test]
    fn gradual_ramp_uses_scene_coefficient() {
        // Threshold 0.9 → ramp 0.6..0.9, crossing the bright-scene boundary.
        let s = Settings::new(true, 0.8, 0.9);
        let dim = DimPolicy::Gradual.target_intensity(0.65, &s);
        let bright = DimPolicy::Gradual.target_intensity(0.75, &s);
        let expected_dim = 0.8 * (0.05 / 0.4) * 0.15;
        let expected_bright = 0.8 * (0.15 / 0.4) * 0.3;
        assert!((dim - expected_dim).abs() < 1e-5, "got {dim}");
        assert!((bright - expected_bright).abs() < 1e-5, "got {bright}");
    }

    #[test]
    fn gradual_small_reading_stays_tiny() {
        let target = DimPolicy::Gradual.target_intensity(0.45, &settings());
        let expected = 0.5 * (0.15 / 0.7) * 0.15;
        assert!((target - expected).abs() < 1e-5, "got {target}");
        assert!(target < 0.05);
    }

    #[test]
    fn filter_curves_differ_by_policy() {
        let t = DimPolicy::Threshold.filter_curve();
        assert!((t.visible_brightness(0.5) - 0.6).abs() < 1e-6);
        assert!((t.visible_brightness(1.0) - 0.2).abs() < 1e-6);
        assert_eq!(t.visible_brightness(0.0), 1.0);

        let g = DimPolicy::Gradual.filter_curve();
        assert!((g.visible_brightness(1.0) - 0.1).abs() < 1e-6);
        assert!((g.visible_brightness(0.5) - 0.55).abs() < 1e-6);
    }

    #[test]
    fn gradual_transitions_are_slower() {
        let fast = DimPolicy::Threshold.transition();
        let slow = DimPolicy::Gradual.transition();
        assert!(slow.duration > fast.duration);
        assert_eq!(fast.easing.css(), "ease-out");
    }

    #[test]
    fn policy_names_parse() {
        for p in [DimPolicy::Threshold, DimPolicy::Gradual] {
            assert_eq!(DimPolicy::from_name(p.as_str()), Some(p));
        }
        assert_eq!(DimPolicy::from_name("smooth"), None);
    }
}
