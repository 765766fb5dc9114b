// Copyright 2026 the FlashGuard Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! User settings and their normalization.
//!
//! Settings are owned by an external store (`chrome.storage.sync` in the
//! extension). The store hands back loosely typed values, so this module
//! separates the raw record ([`StoredSettings`], every field optional) from
//! the normalized value the monitor works with ([`Settings`]).
//!
//! # Normalization
//!
//! - `enabled` defaults to `true` when absent.
//! - `dim_level` and `brightness_threshold` default to `0.5` and `0.6` when
//!   absent, non-finite or not positive; anything else is clamped to `[0, 1]`.
//!
//! A zero level is treated as "unset" rather than as a valid value. The
//! settings popup never produces values below `0.1`.

use crate::policy::DimPolicy;

/// Default for [`Settings::enabled`].
pub const DEFAULT_ENABLED: bool = true;

/// Default for [`Settings::dim_level`].
pub const DEFAULT_DIM_LEVEL: f32 = 0.5;

/// Default for [`Settings::brightness_threshold`].
pub const DEFAULT_BRIGHTNESS_THRESHOLD: f32 = 0.6;

/// Dim level installed during daytime hours when the user has none yet.
pub const DAY_DIM_LEVEL: f32 = 0.3;

/// Dim level installed during night hours when the user has none yet.
pub const NIGHT_DIM_LEVEL: f32 = 0.5;

/// A settings key as it appears in the settings store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SettingKey {
    /// Master on/off switch.
    Enabled,
    /// Strength of the dimming effect.
    DimLevel,
    /// Brightness above which dimming kicks in.
    BrightnessThreshold,
    /// Which dimming policy to use.
    Policy,
}

impl SettingKey {
    /// Every key, in the order they are requested from the store.
    pub const ALL: [Self; 4] = [
        Self::Enabled,
        Self::DimLevel,
        Self::BrightnessThreshold,
        Self::Policy,
    ];

    /// Returns the storage key name.
    #[must_use]
    pub const fn storage_key(self) -> &'static str {
        match self {
            Self::Enabled => "flashGuardEnabled",
            Self::DimLevel => "flashGuardDimLevel",
            Self::BrightnessThreshold => "flashGuardBrightnessThreshold",
            Self::Policy => "flashGuardPolicy",
        }
    }

    /// Looks up a key by its storage name.
    #[must_use]
    pub fn from_storage_key(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.storage_key() == name)
    }
}

/// Settings exactly as read from the store, before normalization.
///
/// `None` means the key was absent or held a value of the wrong type.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StoredSettings {
    /// Raw `flashGuardEnabled`.
    pub enabled: Option<bool>,
    /// Raw `flashGuardDimLevel`.
    pub dim_level: Option<f64>,
    /// Raw `flashGuardBrightnessThreshold`.
    pub brightness_threshold: Option<f64>,
    /// Raw `flashGuardPolicy`.
    pub policy: Option<DimPolicy>,
}

impl StoredSettings {
    /// Returns `true` if no key is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.enabled.is_none()
            && self.dim_level.is_none()
            && self.brightness_threshold.is_none()
            && self.policy.is_none()
    }

    /// Builds a record holding only the keys present in `changes`.
    ///
    /// Later changes to the same key win.
    #[must_use]
    pub fn from_changes(changes: &[SettingsChange]) -> Self {
        let mut out = Self::default();
        for change in changes {
            match *change {
                SettingsChange::Enabled(v) => out.enabled = v,
                SettingsChange::DimLevel(v) => out.dim_level = v,
                SettingsChange::BrightnessThreshold(v) => out.brightness_threshold = v,
                SettingsChange::Policy(v) => out.policy = v,
            }
        }
        out
    }
}

/// A single key update delivered by the store's change notification.
///
/// The payload is the key's new value; `None` means the key was removed or
/// its new value is unusable, which resets it to the default.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SettingsChange {
    /// `flashGuardEnabled` changed.
    Enabled(Option<bool>),
    /// `flashGuardDimLevel` changed.
    DimLevel(Option<f64>),
    /// `flashGuardBrightnessThreshold` changed.
    BrightnessThreshold(Option<f64>),
    /// `flashGuardPolicy` changed.
    Policy(Option<DimPolicy>),
}

impl SettingsChange {
    /// Returns the key this change applies to.
    #[must_use]
    pub const fn key(&self) -> SettingKey {
        match self {
            Self::Enabled(_) => SettingKey::Enabled,
            Self::DimLevel(_) => SettingKey::DimLevel,
            Self::BrightnessThreshold(_) => SettingKey::BrightnessThreshold,
            Self::Policy(_) => SettingKey::Policy,
        }
    }
}

/// Normalized user settings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Settings {
    enabled: bool,
    dim_level: f32,
    brightness_threshold: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enabled: DEFAULT_ENABLED,
            dim_level: DEFAULT_DIM_LEVEL,
            brightness_threshold: DEFAULT_BRIGHTNESS_THRESHOLD,
        }
    }
}

impl Settings {
    /// Creates normalized settings from explicit values.
    #[must_use]
    pub fn new(enabled: bool, dim_level: f32, brightness_threshold: f32) -> Self {
        Self {
            enabled,
            dim_level: normalize_unit(Some(f64::from(dim_level)), DEFAULT_DIM_LEVEL),
            brightness_threshold: normalize_unit(
                Some(f64::from(brightness_threshold)),
                DEFAULT_BRIGHTNESS_THRESHOLD,
            ),
        }
    }

    /// Normalizes a raw record from the store.
    #[must_use]
    pub fn from_stored(stored: &StoredSettings) -> Self {
        Self {
            enabled: stored.enabled.unwrap_or(DEFAULT_ENABLED),
            dim_level: normalize_unit(stored.dim_level, DEFAULT_DIM_LEVEL),
            brightness_threshold: normalize_unit(
                stored.brightness_threshold,
                DEFAULT_BRIGHTNESS_THRESHOLD,
            ),
        }
    }

    /// Applies a change notification. Policy changes are ignored here; they
    /// are routed to the monitor's configuration instead.
    pub fn apply(&mut self, change: &SettingsChange) {
        match *change {
            SettingsChange::Enabled(v) => self.enabled = v.unwrap_or(DEFAULT_ENABLED),
            SettingsChange::DimLevel(v) => self.dim_level = normalize_unit(v, DEFAULT_DIM_LEVEL),
            SettingsChange::BrightnessThreshold(v) => {
                self.brightness_threshold = normalize_unit(v, DEFAULT_BRIGHTNESS_THRESHOLD);
            }
            SettingsChange::Policy(_) => {}
        }
    }

    /// Returns a copy with `enabled` replaced.
    #[must_use]
    pub const fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Whether dimming is switched on.
    #[must_use]
    pub const fn enabled(&self) -> bool {
        self.enabled
    }

    /// Dim intensity applied to fully bright content, in `[0, 1]`.
    #[must_use]
    pub const fn dim_level(&self) -> f32 {
        self.dim_level
    }

    /// Brightness above which full dimming applies, in `[0, 1]`.
    #[must_use]
    pub const fn brightness_threshold(&self) -> f32 {
        self.brightness_threshold
    }
}

/// Clamps a stored level to `[0, 1]`, or returns `default` when it is
/// missing, non-finite or not positive.
#[must_use]
pub fn normalize_unit(value: Option<f64>, default: f32) -> f32 {
    let Some(v) = value.filter(|v| v.is_finite() && *v > 0.0) else {
        return default;
    };
    #[expect(
        clippy::cast_possible_truncation,
        reason = "positive finite level; precision beyond f32 is irrelevant"
    )]
    let narrowed = v as f32;
    narrowed.clamp(0.0, 1.0)
}

/// Returns the install-time dim level for a local hour of day (0–23).
///
/// Daytime (06:00 to 19:59) gets the lighter level.
#[must_use]
pub const fn day_dim_level(hour: u8) -> f32 {
    if hour >= 6 && hour < 20 {
        DAY_DIM_LEVEL
    } else {
        NIGHT_DIM_LEVEL
    }
}

/// Computes the defaults to write on install.
///
/// Returns a record holding only the keys that are missing from `existing`;
/// keys the user already set are never overwritten. The returned record is
/// empty when nothing needs writing.
#[must_use]
pub fn install_defaults(existing: &StoredSettings, hour: u8) -> StoredSettings {
    StoredSettings {
        enabled: existing.enabled.is_none().then_some(DEFAULT_ENABLED),
        dim_level: existing
            .dim_level
            .is_none()
            .then(|| f64::from(day_dim_level(hour))),
        brightness_threshold: existing
            .brightness_threshold
            .is_none()
            .then_some(f64::from(DEFAULT_BRIGHTNESS_THRESHOLD)),
        policy: existing.policy.is_none().then_some(DimPolicy::Threshold),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_store_yields_defaults() {
        let s = Settings::from_stored(&StoredSettings::default());
        assert_eq!(s, Settings::default());
        assert!(s.enabled());
        assert_eq!(s.dim_level(), 0.5);
        assert_eq!(s.brightness_threshold(), 0.6);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let s = Settings::from_stored(&StoredSettings {
            enabled: Some(false),
            dim_level: Some(3.0),
            brightness_threshold: Some(0.25),
            policy: None,
        });
        assert!(!s.enabled());
        assert_eq!(s.dim_level(), 1.0);
        assert_eq!(s.brightness_threshold(), 0.25);
    }

    #[test]
    fn invalid_values_fall_back_to_defaults() {
        let s = Settings::from_stored(&StoredSettings {
            enabled: None,
            dim_level: Some(f64::NAN),
            brightness_threshold: Some(-0.4),
            policy: None,
        });
        assert_eq!(s, Settings::default());

        let zero = Settings::new(true, 0.0, 0.0);
        assert_eq!(zero.dim_level(), DEFAULT_DIM_LEVEL, "zero reads as unset");
    }

    #[test]
    fn change_notifications_update_cached_copy() {
        let mut s = Settings::default();
        s.apply(&SettingsChange::Enabled(Some(false)));
        s.apply(&SettingsChange::DimLevel(Some(0.8)));
        assert!(!s.enabled());
        assert!((s.dim_level() - 0.8).abs() < 1e-6);

        // A removed key resets to its default.
        s.apply(&SettingsChange::Enabled(None));
        s.apply(&SettingsChange::DimLevel(None));
        assert!(s.enabled());
        assert_eq!(s.dim_level(), DEFAULT_DIM_LEVEL);
    }

    #[test]
    fn storage_keys_round_trip() {
        for key in SettingKey::ALL {
            assert_eq!(SettingKey::from_storage_key(key.storage_key()), Some(key));
        }
        assert_eq!(SettingKey::from_storage_key("ytDimmerEnabled"), None);
    }

    #[test]
    fn from_changes_keeps_last_value_per_key() {
        let stored = StoredSettings::from_changes(&[
            SettingsChange::DimLevel(Some(0.2)),
            SettingsChange::Enabled(Some(true)),
            SettingsChange::DimLevel(Some(0.7)),
        ]);
        assert_eq!(stored.dim_level, Some(0.7));
        assert_eq!(stored.enabled, Some(true));
        assert_eq!(stored.brightness_threshold, None);
    }

    #[test]
    fn day_and_night_dim_levels() {
        assert_eq!(day_dim_level(5), NIGHT_DIM_LEVEL);
        assert_eq!(day_dim_level(6), DAY_DIM_LEVEL);
        assert_eq!(day_dim_level(19), DAY_DIM_LEVEL);
        assert_eq!(day_dim_level(20), NIGHT_DIM_LEVEL);
        assert_eq!(day_dim_level(0), NIGHT_DIM_LEVEL);
    }

    #[test]
    fn install_defaults_only_fills_missing_keys() {
        let existing = StoredSettings {
            enabled: Some(false),
            dim_level: None,
            brightness_threshold: Some(0.9),
            policy: None,
        };
        let defaults = install_defaults(&existing, 22);
        assert_eq!(defaults.enabled, None, "user choice is preserved");
        assert_eq!(defaults.dim_level, Some(f64::from(NIGHT_DIM_LEVEL)));
        assert_eq!(defaults.brightness_threshold, None);
        assert_eq!(defaults.policy, Some(DimPolicy::Threshold));

        let full = StoredSettings {
            policy: Some(DimPolicy::Gradual),
            dim_level: Some(0.4),
            ..existing
        };
        assert!(install_defaults(&full, 12).is_empty());
    }
}
