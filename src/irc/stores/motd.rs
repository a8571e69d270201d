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

/// 375 (start), 372 (body line), 376 (end) -- rendered as plain text, one
/// line per body event, start/end markers dropped from the contents.
pub struct MotdStore {
    log: EventLog,
}

impl MotdStore {
    pub fn new(id: u64) -> MotdStore {
        MotdStore {
            log: EventLog::new(id, "motd"),
        }
    }
}

impl Store for MotdStore {
    fn declared_inbound(&self) -> &'static [&'static str] {
        &["375", "372", "376"]
    }
    fn declared_outbound(&self) -> &'static [&'static str] {
        &["MOTD"]
    }

    fn on_event(&mut self, event: &Event, _sink: &mut dyn Sink) -> Vec<Event> {
        self.log.push(event.clone());
        Vec::new()
    }

    fn generate(&mut self, _verb: &str, params: &str, sink: &mut dyn Sink) -> Vec<Event> {
        if params.is_empty() {
            sink.send_line("MOTD");
        } else {
            sink.send_line(&format!("MOTD {}", params));
        }
        Vec::new()
    }

    fn format(&self, event: &Event) -> String {
        match event.command.as_str() {
            "372" => format!("{}\n", event.params_endpart),
            _ => String::new(),
        }
    }

    fn log(&mut self) -> &mut EventLog {
        &mut self.log
    }
}
