// Copyright 2026 the FlashGuard Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Runtime messages handled by the background worker.
//!
//! The popup and content scripts talk to the background worker with small
//! JSON-shaped messages:
//!
//! | request | response |
//! |---|---|
//! | `{action: "getSettings"}` | `{enabled, dimLevel, brightnessThreshold}` |
//! | `{action: "updateSettings", settings: {...}}` | `{success: true}` |
//!
//! This module only models the shapes; the platform crate converts to and
//! from JS objects.

use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use crate::settings::{Settings, StoredSettings};

/// `action` value requesting the current settings.
pub const GET_SETTINGS: &str = "getSettings";

/// `action` value requesting a settings write.
pub const UPDATE_SETTINGS: &str = "updateSettings";

/// A decoded runtime message.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Request {
    /// Read the normalized settings.
    GetSettings,
    /// Persist the given keys.
    UpdateSettings(StoredSettings),
}

impl Request {
    /// Decodes a message from its `action` string and optional `settings`
    /// payload.
    ///
    /// # Errors
    ///
    /// Returns [`MessageError::UnknownAction`] for any other action and
    /// [`MessageError::MissingSettings`] for an update without a payload.
    pub fn parse(action: &str, settings: Option<StoredSettings>) -> Result<Self, MessageError> {
        match action {
            GET_SETTINGS => Ok(Self::GetSettings),
            UPDATE_SETTINGS => settings
                .map(Self::UpdateSettings)
                .ok_or(MessageError::MissingSettings),
            _ => Err(MessageError::UnknownAction),
        }
    }
}

/// A primitive response value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Field {
    /// A JS boolean.
    Bool(bool),
    /// A JS number.
    Number(f64),
}

/// A reply to a [`Request`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Response {
    /// Reply to [`Request::GetSettings`].
    Settings(Settings),
    /// Reply to [`Request::UpdateSettings`].
    Updated {
        /// Whether the write was issued.
        success: bool,
    },
}

impl Response {
    /// Returns the response object's properties in order.
    #[must_use]
    pub fn fields(&self) -> Vec<(&'static str, Field)> {
        match self {
            Self::Settings(s) => vec![
                ("enabled", Field::Bool(s.enabled())),
                ("dimLevel", Field::Number(f64::from(s.dim_level()))),
                (
                    "brightnessThreshold",
                    Field::Number(f64::from(s.brightness_threshold())),
                ),
            ],
            Self::Updated { success } => vec![("success", Field::Bool(*success))],
        }
    }
}

/// Why a runtime message could not be handled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageError {
    /// The `action` is not one this worker answers.
    UnknownAction,
    /// `updateSettings` arrived without a `settings` object.
    MissingSettings,
}

impl fmt::Display for MessageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownAction => f.write_str("unknown message action"),
            Self::MissingSettings => f.write_str("updateSettings without a settings object"),
        }
    }
}

impl core::error::Error for MessageError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_actions() {
        assert_eq!(Request::parse("getSettings", None), Ok(Request::GetSettings));
        let stored = StoredSettings {
            enabled: Some(false),
            ..StoredSettings::default()
        };
        assert_eq!(
            Request::parse("updateSettings", Some(stored)),
            Ok(Request::UpdateSettings(stored))
        );
    }

    #[test]
    fn rejects_unknown_or_incomplete() {
        assert_eq!(
            Request::parse("toggle-popup", None),
            Err(MessageError::UnknownAction)
        );
        assert_eq!(
            Request::parse("updateSettings", None),
            Err(MessageError::MissingSettings)
        );
    }

    #[test]
    fn settings_response_shape() {
        let fields = Response::Settings(Settings::default()).fields();
        let names: Vec<_> = fields.iter().map(|(n, _)| *n).collect();
        assert_eq!(names, ["enabled", "dimLevel", "brightnessThreshold"]);
        assert_eq!(fields[0].1, Field::Bool(true));
        match fields[1].1 {
            Field::Number(v) => assert!((v - 0.5).abs() < 1e-6),
            Field::Bool(_) => panic!("dimLevel is a number"),
        }
        assert_eq!(
            Response::Updated { success: true }.fields(),
            [("success", Field::Bool(true))]
        );
    }
}
