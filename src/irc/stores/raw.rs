// Copyright (C) 2021  Anthony DeDominic <adedomin@gmail.com>

// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
// The above copyright notice and this permission notice shall be included in
// all copies or substantial portions of the Software.

// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN
// THE SOFTWARE.

//! Escape hatch: a write to this store's file sends whatever was written
//! straight to the server, bypassing every typed store's `generate`.
//! Preserved from the original as a deliberate quirk, not a design we'd
//! pick fresh -- it means a write here can desync a typed store's view
//! of the world (e.g. a raw `JOIN` never shows up in `JoinStore`'s log).

use crate::irc::event::{Event, EventLog};
use crate::irc::store::{Sink, Store};

pub struct RawStore {
    log: EventLog,
}

impl RawStore {
    pub fn new(id: u64) -> RawStore {
        RawStore {
            log: EventLog::new(id, "raw"),
        }
    }
}

impl Store for RawStore {
    fn declared_inbound(&self) -> &'static [&'static str] {
        &[]
    }
    fn declared_outbound(&self) -> &'static [&'static str] {
        &[]
    }

    fn on_event(&mut self, _event: &Event, _sink: &mut dyn Sink) -> Vec<Event> {
        Vec::new()
    }

    /// `verb` here is not a real command name: the whole write(2) payload
    /// is split on the first space and reassembled verbatim.
    fn generate(&mut self, verb: &str, params: &str, sink: &mut dyn Sink) -> Vec<Event> {
        let line = if params.is_empty() {
            verb.to_string()
        } else {
            format!("{} {}", verb, params)
        };
        sink.send_line(&line);
        Vec::new()
    }

    fn format(&self, _event: &Event) -> String {
        String::new()
    }

    fn log(&mut self) -> &mut EventLog {
        &mut self.log
    }
}
