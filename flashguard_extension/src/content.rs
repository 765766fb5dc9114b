// Copyright 2026 the FlashGuard Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Content-script session.
//!
//! One `Session` per page, owned by the page's unload handler. The interval
//! tick, the storage subscription, the DOM observer and the startup probes
//! reach it through a `Weak`.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use flashguard_backend_web::{
    CanvasCapture, DomObserver, DomVideo, IntervalLoop, SettingsStore, SettingsSubscription,
    Timeout, collect_videos, video_count,
};
use flashguard_core::cadence::{CadenceConfig, Lifecycle};
use flashguard_core::monitor::{Monitor, MonitorConfig};
use flashguard_core::settings::{SettingsChange, StoredSettings};
use flashguard_core::time::HostTime;
use flashguard_core::trace::{LifecycleEvent, LifecyclePhase, Tracer};
use flashguard_debug::pretty::PrettyPrintSink;
use wasm_bindgen::JsCast as _;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, Event};

use crate::console::ConsoleWriter;

struct Session {
    document: Document,
    monitor: Monitor<DomVideo, CanvasCapture>,
    lifecycle: Lifecycle<IntervalLoop>,
    sink: PrettyPrintSink,
    subscription: Option<SettingsSubscription>,
    observer: Option<DomObserver>,
    probes: Vec<Timeout>,
}

type SharedSession = Rc<RefCell<Session>>;

impl Session {
    fn new(document: Document, config: MonitorConfig, cadence: CadenceConfig) -> SharedSession {
        Rc::new_cyclic(|weak: &Weak<RefCell<Self>>| {
            let tick_session = weak.clone();
            let interval = IntervalLoop::new(
                move |now| {
                    with_session(&tick_session, |s| s.tick(now));
                },
                cadence.period,
            );
            RefCell::new(Self {
                monitor: Monitor::new(config, CanvasCapture::new(document.clone())),
                document,
                lifecycle: Lifecycle::new(interval, cadence),
                sink: PrettyPrintSink::new(Box::new(ConsoleWriter::default())),
                subscription: None,
                observer: None,
                probes: Vec::new(),
            })
        })
    }

    fn tick(&mut self, now: HostTime) {
        let videos = collect_videos(&self.document);
        let mut tracer = Tracer::new(&mut self.sink);
        self.monitor.tick(now, &videos, &mut tracer);
    }

    fn load(&mut self, stored: &StoredSettings) {
        let mut tracer = Tracer::new(&mut self.sink);
        self.monitor
            .apply_settings(stored, flashguard_backend_web::now(), &mut tracer);
    }

    fn apply_changes(&mut self, changes: &[SettingsChange]) {
        let mut tracer = Tracer::new(&mut self.sink);
        self.monitor
            .apply_changes(changes, flashguard_backend_web::now(), &mut tracer);
    }

    fn start(&mut self, phase: LifecyclePhase) {
        if self.lifecycle.start() {
            self.trace_lifecycle(phase);
        }
    }

    fn on_dom_mutation(&mut self) {
        let enabled = self.monitor.settings().enabled();
        if self
            .lifecycle
            .on_dom_mutation(enabled, video_count(&self.document))
        {
            self.trace_lifecycle(LifecyclePhase::Restarted);
        }
    }

    fn teardown(&mut self) {
        if !self.lifecycle.teardown() {
            return;
        }
        let mut tracer = Tracer::new(&mut self.sink);
        self.monitor
            .teardown(flashguard_backend_web::now(), &mut tracer);
        if let Some(observer) = self.observer.take() {
            observer.disconnect();
        }
        self.subscription = None;
        self.probes.clear();
        self.trace_lifecycle(LifecyclePhase::TornDown);
    }

    fn trace_lifecycle(&mut self, phase: LifecyclePhase) {
        Tracer::new(&mut self.sink).lifecycle(&LifecycleEvent {
            now: flashguard_backend_web::now(),
            phase,
        });
    }
}

/// Runs `f` on the session if it is still alive and not already borrowed.
fn with_session(weak: &Weak<RefCell<Session>>, f: impl FnOnce(&mut Session)) {
    let Some(session) = weak.upgrade() else {
        return;
    };
    if let Ok(mut session) = session.try_borrow_mut() {
        f(&mut session);
    }
}

/// Reads settings, applies them, then starts the cadence.
fn load_and_start(weak: Weak<RefCell<Session>>, phase: LifecyclePhase) {
    spawn_local(async move {
        let stored = SettingsStore.load().await;
        with_session(&weak, |s| {
            s.load(&stored);
            s.start(phase);
        });
    });
}

pub(crate) fn start() -> Result<(), JsValue> {
    let window = web_sys::window().expect("window");
    let document = window.document().expect("document");

    let cadence = CadenceConfig::web();
    let session = Session::new(document.clone(), MonitorConfig::threshold(), cadence);

    let weak = Rc::downgrade(&session);
    let subscription = SettingsSubscription::new(move |changes| {
        with_session(&weak, |s| s.apply_changes(&changes));
    })?;

    let weak = Rc::downgrade(&session);
    let observer = DomObserver::observe(&document, move || {
        with_session(&weak, Session::on_dom_mutation);
    })?;

    let probes: Vec<Timeout> = cadence
        .startup_probes
        .iter()
        .map(|&delay| {
            let weak = Rc::downgrade(&session);
            Timeout::new(delay, move || {
                with_session(&weak, |s| s.trace_lifecycle(LifecyclePhase::Probe));
                load_and_start(weak, LifecyclePhase::Started);
            })
        })
        .collect();

    {
        let mut s = session.borrow_mut();
        s.subscription = Some(subscription);
        s.observer = Some(observer);
        s.probes = probes;
    }

    let unload_session = Rc::clone(&session);
    let unload_cb = Closure::wrap(Box::new(move |_event: Event| {
        if let Ok(mut session) = unload_session.try_borrow_mut() {
            session.teardown();
        }
    }) as Box<dyn FnMut(Event)>);
    window.add_event_listener_with_callback("beforeunload", unload_cb.as_ref().unchecked_ref())?;
    unload_cb.forget();

    load_and_start(Rc::downgrade(&session), LifecyclePhase::Started);
    Ok(())
}
