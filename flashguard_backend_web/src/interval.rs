// Copyright 2026 the FlashGuard Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `setInterval` tick source and one-shot timeouts.
//!
//! [`IntervalLoop`] drives the monitor at a fixed period with the browser's
//! `setInterval`, independent of `requestAnimationFrame` so that a hidden or
//! throttled tab does not change what a tick means. Each callback receives the
//! current [`HostTime`] from `performance.now()`.
//!
//! [`Timeout`] schedules a single delayed callback and cancels it on drop.

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::cell::{Cell, RefCell};

use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;

use flashguard_core::cadence::TickSource;
use flashguard_core::time::{Duration, HostTime};

// Direct global bindings instead of `web_sys::Window` methods; content
// scripts and service workers both expose these on the global object.
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = performance, js_name = "now")]
    pub(crate) fn performance_now() -> f64;

    #[wasm_bindgen(js_name = "setInterval")]
    fn set_interval(callback: &JsValue, delay_ms: i32) -> i32;

    #[wasm_bindgen(js_name = "clearInterval")]
    fn clear_interval(id: i32);

    #[wasm_bindgen(js_name = "setTimeout")]
    fn set_timeout(callback: &JsValue, delay_ms: i32) -> i32;

    #[wasm_bindgen(js_name = "clearTimeout")]
    fn clear_timeout(id: i32);
}

/// Converts a duration to the millisecond delay timer APIs take.
fn delay_ms(d: Duration) -> i32 {
    i32::try_from(d.as_millis()).unwrap_or(i32::MAX)
}

/// A fixed-period `setInterval` loop.
///
/// Create with [`IntervalLoop::new`], then call [`start`](Self::start) to
/// begin receiving callbacks. The interval keeps firing until
/// [`stop`](Self::stop) is called or the `IntervalLoop` is dropped.
pub struct IntervalLoop {
    inner: Rc<IntervalInner>,
}

type IntervalClosure = Closure<dyn FnMut()>;

struct IntervalInner {
    /// The JS closure registered with `setInterval`. Created on first start
    /// and reused across restarts.
    closure: RefCell<Option<IntervalClosure>>,

    /// The user-supplied callback.
    callback: RefCell<Box<dyn FnMut(HostTime)>>,

    /// Time between callbacks.
    period: Duration,

    /// Number of callbacks delivered.
    tick_counter: Cell<u64>,

    /// Whether the interval is currently registered.
    running: Cell<bool>,

    /// The ID returned by the most recent `setInterval` call.
    interval_id: Cell<i32>,
}

impl IntervalLoop {
    /// Creates a new `IntervalLoop` that is **not yet running**.
    pub fn new(callback: impl FnMut(HostTime) + 'static, period: Duration) -> Self {
        Self {
            inner: Rc::new(IntervalInner {
                closure: RefCell::new(None),
                callback: RefCell::new(Box::new(callback)),
                period,
                tick_counter: Cell::new(0),
                running: Cell::new(false),
                interval_id: Cell::new(0),
            }),
        }
    }

    /// Starts the interval. If already running, this is a no-op.
    pub fn start(&self) {
        if self.inner.running.get() {
            return;
        }
        self.inner.running.set(true);

        let mut slot = self.inner.closure.borrow_mut();
        let closure = slot.get_or_insert_with(|| {
            // Weak so the registered closure does not keep `inner` alive.
            let inner = Rc::downgrade(&self.inner);
            Closure::wrap(Box::new(move || {
                let Some(inner) = inner.upgrade() else {
                    return;
                };
                if !inner.running.get() {
                    return;
                }
                inner.tick_counter.set(inner.tick_counter.get() + 1);
                // A callback that is still running (e.g. it stopped and
                // restarted the loop) is skipped rather than re-entered.
                if let Ok(mut callback) = inner.callback.try_borrow_mut() {
                    callback(crate::now());
                }
            }) as Box<dyn FnMut()>)
        });
        let id = set_interval(closure.as_ref().unchecked_ref(), delay_ms(self.inner.period));
        self.inner.interval_id.set(id);
    }

    /// Stops the interval. Can be restarted with [`start`](Self::start).
    pub fn stop(&self) {
        if !self.inner.running.get() {
            return;
        }
        self.inner.running.set(false);
        clear_interval(self.inner.interval_id.get());
    }

    /// Returns `true` if the interval is currently registered.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.inner.running.get()
    }

    /// Returns the number of callbacks delivered so far.
    #[must_use]
    pub fn tick_count(&self) -> u64 {
        self.inner.tick_counter.get()
    }
}

impl TickSource for IntervalLoop {
    fn start(&self) {
        Self::start(self);
    }

    fn stop(&self) {
        Self::stop(self);
    }

    fn is_running(&self) -> bool {
        Self::is_running(self)
    }
}

impl Drop for IntervalLoop {
    fn drop(&mut self) {
        self.stop();
        // Drop the JS closure so it doesn't leak.
        self.inner.closure.borrow_mut().take();
    }
}

impl core::fmt::Debug for IntervalLoop {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("IntervalLoop")
            .field("running", &self.inner.running.get())
            .field("period", &self.inner.period)
            .field("tick_counter", &self.inner.tick_counter.get())
            .finish()
    }
}

/// A pending one-shot `setTimeout` callback.
///
/// Dropping the `Timeout` cancels it if it has not fired yet.
pub struct Timeout {
    id: i32,
    _closure: Closure<dyn FnMut()>,
}

impl Timeout {
    /// Schedules `callback` to run once after `delay`.
    pub fn new(delay: Duration, callback: impl FnOnce() + 'static) -> Self {
        let closure: Closure<dyn FnMut()> = Closure::once(callback);
        let id = set_timeout(closure.as_ref().unchecked_ref(), delay_ms(delay));
        Self {
            id,
            _closure: closure,
        }
    }
}

impl Drop for Timeout {
    fn drop(&mut self) {
        // No-op if the timeout already fired.
        clear_timeout(self.id);
    }
}

impl core::fmt::Debug for Timeout {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Timeout").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_is_whole_milliseconds() {
        assert_eq!(delay_ms(Duration::from_millis(33)), 33);
        assert_eq!(delay_ms(Duration(33_999)), 33);
        assert_eq!(delay_ms(Duration::ZERO), 0);
    }

    #[test]
    fn delay_saturates_at_timer_limit() {
        assert_eq!(delay_ms(Duration::from_millis(3_000_000_000)), i32::MAX);
        assert_eq!(delay_ms(Duration(u64::MAX)), i32::MAX);
    }
}
