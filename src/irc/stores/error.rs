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

//! `ERROR` and the 400-599 numeric range. A server closing the link with
//! `ERROR :Closing Link: ...` while we're still registering or freshly
//! registered is the ordinary "that nick/server didn't work out" path,
//! not a surprise -- this store just flags it for the handler to act on;
//! whether to actually tear the connection down depends on the session's
//! own status, which only the handler tracks.

use crate::irc::event::{Event, EventLog};
use crate::irc::store::{Sink, Store};

pub const CLOSE_REQUEST: &str = "__CLOSE_REQUEST__";

pub struct ErrorStore {
    log: EventLog,
}

impl ErrorStore {
    pub fn new(id: u64) -> ErrorStore {
        ErrorStore {
            log: EventLog::new(id, "error"),
        }
    }

    fn is_numeric_error(command: &str) -> bool {
        command
            .parse::<u16>()
            .map(|n| (400..=599).contains(&n))
            .unwrap_or(false)
    }
}

impl Store for ErrorStore {
    fn declared_inbound(&self) -> &'static [&'static str] {
        &["ERROR"]
    }
    fn declared_outbound(&self) -> &'static [&'static str] {
        &[]
    }

    fn on_event(&mut self, event: &Event, _sink: &mut dyn Sink) -> Vec<Event> {
        self.log.push(event.clone());
        if event.command == "ERROR" && event.params_endpart.starts_with("Closing Link:") {
            return vec![Event::informational(CLOSE_REQUEST, &event.params_endpart)];
        }
        Vec::new()
    }

    fn generate(&mut self, _verb: &str, _params: &str, _sink: &mut dyn Sink) -> Vec<Event> {
        Vec::new()
    }

    fn format(&self, event: &Event) -> String {
        if event.command == "ERROR" || Self::is_numeric_error(&event.command) {
            format!("{}\n", event.params_endpart)
        } else {
            String::new()
        }
    }

    fn log(&mut self) -> &mut EventLog {
        &mut self.log
    }
}

#[cfg(test)]
mod test {
    use super::*;

    struct NopSink;
    impl Sink for NopSink {
        fn send_line(&mut self, _line: &str) {}
        fn nickname(&self) -> &str {
            ""
        }
        fn set_nickname(&mut self, _nick: &str) {}
        fn nickname_candidates(&self) -> &[String] {
            &[]
        }
    }

    #[test]
    fn closing_link_raises_close_request() {
        let mut store = ErrorStore::new(1);
        let mut sink = NopSink;
        let ev = Event::from_line(b"ERROR :Closing Link: host (Bad Password)");
        let out = store.on_event(&ev, &mut sink);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].command, CLOSE_REQUEST);
    }

    #[test]
    fn unrelated_error_does_not_request_close() {
        let mut store = ErrorStore::new(1);
        let mut sink = NopSink;
        let ev = Event::from_line(b"ERROR :Flooding detected");
        let out = store.on_event(&ev, &mut sink);
        assert!(out.is_empty());
    }
}
