// Copyright 2026 the FlashGuard Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Browser extension entry points.
//!
//! The extension's JS shims load this module and call one entry point each:
//!
//! - the content script calls [`start_content`] in every page, which starts a
//!   dimming session for the page's videos;
//! - the background worker calls [`start_background`], which installs
//!   default settings and answers settings messages.
//!
//! Build with: `wasm-pack build --target web flashguard_extension`

#![cfg_attr(
    not(target_arch = "wasm32"),
    allow(dead_code, reason = "this crate only runs in the browser")
)]

mod background;
mod console;
mod content;

use wasm_bindgen::prelude::*;

/// Starts the dimming session for the current page.
///
/// # Errors
///
/// Returns the JS exception if an extension or DOM API is unavailable.
#[cfg_attr(target_arch = "wasm32", wasm_bindgen(js_name = startContent))]
pub fn start_content() -> Result<(), JsValue> {
    content::start()
}

/// Registers the background worker's install and message handlers.
///
/// # Errors
///
/// Returns the JS exception if the runtime API is unavailable.
#[cfg_attr(target_arch = "wasm32", wasm_bindgen(js_name = startBackground))]
pub fn start_background() -> Result<(), JsValue> {
    background::start()
}
