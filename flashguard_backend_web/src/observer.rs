// Copyright 2026 the FlashGuard Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! DOM mutation observation.
//!
//! Single-page sites swap videos in and out without a navigation. The
//! [`DomObserver`] watches a subtree for added or removed children so the
//! session can restart its cadence when videos appear after load.

use alloc::boxed::Box;

use js_sys::Array;
use wasm_bindgen::JsCast as _;
use wasm_bindgen::JsValue;
use wasm_bindgen::closure::Closure;
use web_sys::{MutationObserver, MutationObserverInit, Node};

type MutationClosure = Closure<dyn FnMut(Array, MutationObserver)>;

/// A connected `MutationObserver` watching `childList` changes in a subtree.
///
/// Disconnected by [`disconnect`](Self::disconnect) or on drop.
pub struct DomObserver {
    observer: MutationObserver,
    _closure: MutationClosure,
}

impl core::fmt::Debug for DomObserver {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DomObserver").finish_non_exhaustive()
    }
}

impl DomObserver {
    /// Starts observing `target` and its descendants. `callback` runs once
    /// per batch of mutations.
    ///
    /// # Errors
    ///
    /// Returns the JS exception if the observer cannot be created or attached.
    pub fn observe(target: &Node, mut callback: impl FnMut() + 'static) -> Result<Self, JsValue> {
        let closure = Closure::wrap(Box::new(move |_records: Array, _observer: MutationObserver| {
            callback();
        }) as Box<dyn FnMut(Array, MutationObserver)>);
        let observer = MutationObserver::new(closure.as_ref().unchecked_ref())?;

        let init = MutationObserverInit::new();
        init.set_child_list(true);
        init.set_subtree(true);
        observer.observe_with_options(target, &init)?;

        Ok(Self {
            observer,
            _closure: closure,
        })
    }

    /// Stops delivering mutations. Safe to call more than once.
    pub fn disconnect(&self) {
        self.observer.disconnect();
    }
}

impl Drop for DomObserver {
    fn drop(&mut self) {
        self.disconnect();
    }
}
