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

/// RPL_WHOREPLY (352) / RPL_ENDOFWHO (315) accumulation for a `WHO` query.
pub struct WhoStore {
    log: EventLog,
}

impl WhoStore {
    pub fn new(id: u64) -> WhoStore {
        WhoStore {
            log: EventLog::new(id, "who"),
        }
    }
}

impl Store for WhoStore {
    fn declared_inbound(&self) -> &'static [&'static str] {
        &["352", "315"]
    }
    fn declared_outbound(&self) -> &'static [&'static str] {
        &["WHO"]
    }

    fn on_event(&mut self, event: &Event, _sink: &mut dyn Sink) -> Vec<Event> {
        self.log.push(event.clone());
        Vec::new()
    }

    fn generate(&mut self, _verb: &str, params: &str, sink: &mut dyn Sink) -> Vec<Event> {
        sink.send_line(&format!("WHO {}", params));
        Vec::new()
    }

    fn format(&self, event: &Event) -> String {
        if event.command == "315" {
            return String::new();
        }
        // 352: "<me> <chan> <user> <host> <server> <nick> <flags> :<hops> <realname>"
        let fields: Vec<&str> = event.params.split(' ').collect();
        if fields.len() < 6 {
            return String::new();
        }
        format!(
            "{} {}!{}@{} {}\n",
            fields[5], fields[5], fields[2], fields[3], fields[6..].join(" ")
        )
    }

    fn log(&mut self) -> &mut EventLog {
        &mut self.log
    }
}
