// Copyright 2026 the FlashGuard Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `chrome.runtime` events for the background worker.
//!
//! Install notifications and runtime messages. Message payloads are decoded
//! into [`Request`]s and [`Response`]s are encoded back into plain objects.

use alloc::boxed::Box;

use js_sys::{Function, Object, Reflect};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;

use flashguard_core::message::{Field, MessageError, Request, Response};

use crate::storage::stored_from_js;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(catch, js_namespace = ["chrome", "runtime", "onInstalled"], js_name = "addListener")]
    fn add_installed_listener(callback: &JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "runtime", "onMessage"], js_name = "addListener")]
    fn add_message_listener(callback: &JsValue) -> Result<(), JsValue>;
}

/// Decodes a runtime message `{action, settings?}`.
///
/// # Errors
///
/// Returns a [`MessageError`] for a missing or unknown action, or an update
/// without a settings object.
pub fn request_from_js(message: &JsValue) -> Result<Request, MessageError> {
    let action = Reflect::get(message, &"action".into())
        .ok()
        .and_then(|a| a.as_string())
        .ok_or(MessageError::UnknownAction)?;
    let settings = Reflect::get(message, &"settings".into())
        .ok()
        .filter(JsValue::is_object)
        .map(|s| stored_from_js(&s));
    Request::parse(&action, settings)
}

/// Encodes a [`Response`] as a plain object.
#[must_use]
pub fn response_to_js(response: &Response) -> JsValue {
    let obj = Object::new();
    for (name, field) in response.fields() {
        let value = match field {
            Field::Bool(b) => JsValue::from_bool(b),
            Field::Number(n) => JsValue::from_f64(n),
        };
        // Setting a data property on a fresh plain object cannot throw.
        let _ = Reflect::set(&obj, &name.into(), &value);
    }
    obj.into()
}

/// Registers `callback` for `runtime.onInstalled`.
///
/// The listener lives for the lifetime of the worker.
///
/// # Errors
///
/// Returns the JS exception if the runtime API is unavailable.
pub fn on_installed(callback: impl FnMut() + 'static) -> Result<(), JsValue> {
    let mut callback = callback;
    let closure = Closure::wrap(Box::new(move |_details: JsValue| {
        callback();
    }) as Box<dyn FnMut(JsValue)>);
    add_installed_listener(closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

/// Registers `handler` for `runtime.onMessage`.
///
/// The handler receives the decoded request and a `sendResponse` function.
/// It returns `true` if it will respond asynchronously, which keeps the
/// message channel open. Undecodable messages are ignored.
///
/// # Errors
///
/// Returns the JS exception if the runtime API is unavailable.
pub fn on_message(handler: impl FnMut(Request, Function) -> bool + 'static) -> Result<(), JsValue> {
    let mut handler = handler;
    let closure = Closure::wrap(Box::new(
        move |message: JsValue, _sender: JsValue, send_response: JsValue| -> JsValue {
            let Ok(request) = request_from_js(&message) else {
                return JsValue::FALSE;
            };
            let Ok(send_response) = send_response.dyn_into::<Function>() else {
                return JsValue::FALSE;
            };
            JsValue::from_bool(handler(request, send_response))
        },
    ) as Box<dyn FnMut(JsValue, JsValue, JsValue) -> JsValue>);
    add_message_listener(closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}
