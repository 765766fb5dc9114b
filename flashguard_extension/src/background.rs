// Copyright 2026 the FlashGuard Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Background worker: install defaults and settings messages.

use flashguard_backend_web::SettingsStore;
use flashguard_backend_web::runtime::{on_installed, on_message, response_to_js};
use flashguard_core::message::{Request, Response};
use flashguard_core::settings::{Settings, StoredSettings, install_defaults};
use js_sys::{Date, Function};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

use crate::console::warn;

pub(crate) fn start() -> Result<(), JsValue> {
    on_installed(|| spawn_local(install()))?;
    on_message(handle_message)?;
    Ok(())
}

/// Writes defaults for every key the user has not set.
///
/// `onInstalled` also fires on updates, so a failed read writes nothing.
async fn install() {
    let store = SettingsStore;
    let hour = u8::try_from(Date::new_0().get_hours()).unwrap_or_default();
    let defaults = match pending_defaults(store.try_load().await, hour) {
        Ok(defaults) => defaults,
        Err(err) => {
            warn("flashguard: reading settings on install failed", &err);
            return;
        }
    };
    if let Err(err) = store.save(&defaults).await {
        warn("flashguard: writing install defaults failed", &err);
    }
}

/// Defaults still to write, given the result of reading the store.
fn pending_defaults<E>(read: Result<StoredSettings, E>, hour: u8) -> Result<StoredSettings, E> {
    read.map(|existing| install_defaults(&existing, hour))
}

fn reply(send_response: &Function, response: &Response) {
    if let Err(err) = send_response.call1(&JsValue::NULL, &response_to_js(response)) {
        warn("flashguard: sendResponse failed", &err);
    }
}

/// Returns `true` when the reply is sent asynchronously.
fn handle_message(request: Request, send_response: Function) -> bool {
    match request {
        Request::GetSettings => {
            spawn_local(async move {
                let stored = SettingsStore.load().await;
                reply(
                    &send_response,
                    &Response::Settings(Settings::from_stored(&stored)),
                );
            });
            true
        }
        Request::UpdateSettings(stored) => {
            spawn_local(async move {
                if let Err(err) = SettingsStore.save(&stored).await {
                    warn("flashguard: saving settings failed", &err);
                }
            });
            reply(&send_response, &Response::Updated { success: true });
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_read_writes_nothing() {
        let read: Result<StoredSettings, &str> = Err("storage unavailable");
        assert_eq!(pending_defaults(read, 12), Err("storage unavailable"));
    }

    #[test]
    fn only_missing_keys_are_written() {
        let existing = StoredSettings {
            enabled: Some(false),
            dim_level: Some(0.8),
            brightness_threshold: None,
            policy: None,
        };
        let defaults = pending_defaults::<()>(Ok(existing), 12).unwrap();
        assert_eq!(defaults.enabled, None);
        assert_eq!(defaults.dim_level, None);
        assert!(defaults.brightness_threshold.is_some());
        assert!(defaults.policy.is_some());
    }
}
