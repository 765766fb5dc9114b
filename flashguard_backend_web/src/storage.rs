// Copyright 2026 the FlashGuard Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `chrome.storage.sync` access.
//!
//! [`SettingsStore`] reads and writes the settings record. Reads never fail:
//! a missing storage API or a rejected promise yields an empty record, which
//! normalizes to the defaults. [`SettingsSubscription`] forwards
//! `storage.onChanged` deltas as [`SettingsChange`] lists and removes its
//! listener when dropped.

use alloc::boxed::Box;
use alloc::vec::Vec;

use js_sys::{Array, Object, Promise, Reflect};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use flashguard_core::policy::DimPolicy;
use flashguard_core::settings::{SettingKey, SettingsChange, StoredSettings};

/// Storage area the settings live in.
pub const SYNC_AREA: &str = "sync";

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(catch, js_namespace = ["chrome", "storage", "sync"], js_name = "get")]
    fn sync_get(keys: &JsValue) -> Result<Promise, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "storage", "sync"], js_name = "set")]
    fn sync_set(items: &JsValue) -> Result<Promise, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "storage", "onChanged"], js_name = "addListener")]
    fn add_changed_listener(callback: &JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "storage", "onChanged"], js_name = "removeListener")]
    fn remove_changed_listener(callback: &JsValue) -> Result<(), JsValue>;
}

/// Decodes one stored value. Values of the wrong type decode as absent.
#[must_use]
pub fn change_from_js(key: SettingKey, value: &JsValue) -> SettingsChange {
    match key {
        SettingKey::Enabled => SettingsChange::Enabled(value.as_bool()),
        SettingKey::DimLevel => SettingsChange::DimLevel(value.as_f64()),
        SettingKey::BrightnessThreshold => SettingsChange::BrightnessThreshold(value.as_f64()),
        SettingKey::Policy => SettingsChange::Policy(
            value
                .as_string()
                .as_deref()
                .and_then(DimPolicy::from_name),
        ),
    }
}

/// Decodes a `storage.get` result (or any object keyed by storage keys).
#[must_use]
pub fn stored_from_js(items: &JsValue) -> StoredSettings {
    if !items.is_object() {
        return StoredSettings::default();
    }
    let changes: Vec<_> = SettingKey::ALL
        .iter()
        .filter_map(|&key| {
            let value = Reflect::get(items, &key.storage_key().into()).ok()?;
            Some(change_from_js(key, &value))
        })
        .collect();
    StoredSettings::from_changes(&changes)
}

/// Encodes the present keys of `stored` as a plain object.
///
/// # Errors
///
/// Returns the JS exception if a property cannot be set.
pub fn stored_to_js(stored: &StoredSettings) -> Result<Object, JsValue> {
    let obj = Object::new();
    if let Some(v) = stored.enabled {
        Reflect::set(&obj, &SettingKey::Enabled.storage_key().into(), &v.into())?;
    }
    if let Some(v) = stored.dim_level {
        Reflect::set(&obj, &SettingKey::DimLevel.storage_key().into(), &v.into())?;
    }
    if let Some(v) = stored.brightness_threshold {
        Reflect::set(
            &obj,
            &SettingKey::BrightnessThreshold.storage_key().into(),
            &v.into(),
        )?;
    }
    if let Some(v) = stored.policy {
        Reflect::set(&obj, &SettingKey::Policy.storage_key().into(), &v.as_str().into())?;
    }
    Ok(obj)
}

/// Decodes a `storage.onChanged` payload: `{key: {oldValue, newValue}}`.
///
/// Keys this extension does not own are skipped. A removed key (no
/// `newValue`) decodes as a change to absent.
#[must_use]
pub fn changes_from_js(changes: &JsValue) -> Vec<SettingsChange> {
    if !changes.is_object() {
        return Vec::new();
    }
    SettingKey::ALL
        .iter()
        .filter_map(|&key| {
            let name = JsValue::from_str(key.storage_key());
            if !Reflect::has(changes, &name).unwrap_or(false) {
                return None;
            }
            let delta = Reflect::get(changes, &name).ok()?;
            let value = Reflect::get(&delta, &"newValue".into()).unwrap_or(JsValue::UNDEFINED);
            Some(change_from_js(key, &value))
        })
        .collect()
}

/// Reads and writes the settings record in `chrome.storage.sync`.
#[derive(Clone, Copy, Debug, Default)]
pub struct SettingsStore;

impl SettingsStore {
    /// Reads the settings record.
    ///
    /// # Errors
    ///
    /// Returns the JS exception if the storage API is missing or the read is
    /// rejected.
    pub async fn try_load(self) -> Result<StoredSettings, JsValue> {
        let keys: Array = SettingKey::ALL
            .iter()
            .map(|k| JsValue::from_str(k.storage_key()))
            .collect();
        let items = JsFuture::from(sync_get(&keys)?).await?;
        Ok(stored_from_js(&items))
    }

    /// Reads the settings record, treating any failure as "nothing stored".
    pub async fn load(self) -> StoredSettings {
        self.try_load().await.unwrap_or_default()
    }

    /// Writes the present keys of `stored`. Absent keys are left untouched.
    ///
    /// # Errors
    ///
    /// Returns the JS exception if the write is rejected.
    pub async fn save(self, stored: &StoredSettings) -> Result<(), JsValue> {
        if stored.is_empty() {
            return Ok(());
        }
        let items = stored_to_js(stored)?;
        JsFuture::from(sync_set(&items)?).await?;
        Ok(())
    }
}

type ChangedClosure = Closure<dyn FnMut(JsValue, JsValue)>;

/// A registered `storage.onChanged` listener.
///
/// The listener is removed when the subscription is dropped.
pub struct SettingsSubscription {
    closure: ChangedClosure,
}

impl core::fmt::Debug for SettingsSubscription {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SettingsSubscription").finish_non_exhaustive()
    }
}

impl SettingsSubscription {
    /// Subscribes `callback` to changes of this extension's keys in the sync
    /// area. Notifications that touch none of them are not forwarded.
    ///
    /// # Errors
    ///
    /// Returns the JS exception if the storage API is unavailable.
    pub fn new(mut callback: impl FnMut(Vec<SettingsChange>) + 'static) -> Result<Self, JsValue> {
        let closure = Closure::wrap(Box::new(move |changes: JsValue, area: JsValue| {
            if area.as_string().is_some_and(|a| a != SYNC_AREA) {
                return;
            }
            let decoded = changes_from_js(&changes);
            if !decoded.is_empty() {
                callback(decoded);
            }
        }) as Box<dyn FnMut(JsValue, JsValue)>);
        add_changed_listener(closure.as_ref().unchecked_ref())?;
        Ok(Self { closure })
    }
}

impl Drop for SettingsSubscription {
    fn drop(&mut self) {
        let _ = remove_changed_listener(self.closure.as_ref().unchecked_ref());
    }
}
