// Copyright 2026 the FlashGuard Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Routes trace output to the devtools console.

use std::io::{self, Write};

use wasm_bindgen::JsValue;
use web_sys::console;

/// Splits a byte stream into lines.
#[derive(Debug, Default)]
struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    /// Appends `bytes` and passes every completed line to `emit`, without
    /// its newline.
    fn push(&mut self, bytes: &[u8], mut emit: impl FnMut(&str)) {
        for &b in bytes {
            if b == b'\n' {
                emit(&String::from_utf8_lossy(&self.pending));
                self.pending.clear();
            } else {
                self.pending.push(b);
            }
        }
    }

    /// Passes any unterminated line to `emit`.
    fn flush(&mut self, mut emit: impl FnMut(&str)) {
        if !self.pending.is_empty() {
            emit(&String::from_utf8_lossy(&self.pending));
            self.pending.clear();
        }
    }
}

/// An [`io::Write`] that logs each line with `console.debug`.
#[derive(Debug, Default)]
pub(crate) struct ConsoleWriter {
    buffer: LineBuffer,
}

fn debug(line: &str) {
    console::debug_1(&JsValue::from_str(line));
}

impl Write for ConsoleWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.push(buf, debug);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.buffer.flush(debug);
        Ok(())
    }
}

/// Logs a failure with `console.warn`.
pub(crate) fn warn(context: &str, error: &JsValue) {
    console::warn_2(&JsValue::from_str(context), error);
}
