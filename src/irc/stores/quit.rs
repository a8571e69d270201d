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

use crate::irc::event::{Event, EventLog};
use crate::irc::store::{Sink, Store};

/// Logs other users' QUITs and lets a write(2) send our own.
pub struct QuitStore {
    log: EventLog,
}

impl QuitStore {
    pub fn new(id: u64) -> QuitStore {
        QuitStore {
            log: EventLog::new(id, "quit"),
        }
    }
}

impl Store for QuitStore {
    fn declared_inbound(&self) -> &'static [&'static str] {
        &["QUIT"]
    }
    fn declared_outbound(&self) -> &'static [&'static str] {
        &["QUIT"]
    }

    fn on_event(&mut self, event: &Event, _sink: &mut dyn Sink) -> Vec<Event> {
        self.log.push(event.clone());
        Vec::new()
    }

    fn generate(&mut self, _verb: &str, params: &str, sink: &mut dyn Sink) -> Vec<Event> {
        let line = if params.is_empty() {
            "QUIT".to_string()
        } else {
            format!("QUIT :{}", params)
        };
        sink.send_line(&line);
        let e = Event::generate(sink.nickname(), "QUIT", params);
        self.log.push(e.clone());
        vec![e]
    }

    fn format(&self, event: &Event) -> String {
        format!("{} has quit ({})\n", event.prefix, event.params_endpart)
    }

    fn log(&mut self) -> &mut EventLog {
        &mut self.log
    }
}
