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
use crate::irc::stores::part::splitparams;

pub struct JoinStore {
    log: EventLog,
}

impl JoinStore {
    pub fn new(id: u64) -> JoinStore {
        JoinStore {
            log: EventLog::new(id, "join"),
        }
    }
}

impl Store for JoinStore {
    fn declared_inbound(&self) -> &'static [&'static str] {
        &["JOIN"]
    }
    fn declared_outbound(&self) -> &'static [&'static str] {
        &["JOIN"]
    }

    fn on_event(&mut self, event: &Event, _sink: &mut dyn Sink) -> Vec<Event> {
        self.log.push(event.clone());
        Vec::new()
    }

    fn generate(&mut self, _verb: &str, params: &str, sink: &mut dyn Sink) -> Vec<Event> {
        let (channels, key) = splitparams(params);
        // TODO: split into multiple JOIN lines once a channel list exceeds
        // the 50-channel-per-command limit most networks enforce.
        let line = if key.is_empty() {
            format!("JOIN {}", channels.join(","))
        } else {
            format!("JOIN {} {}", channels.join(","), key)
        };
        sink.send_line(&line);
        let e = Event::generate(sink.nickname(), "JOIN", params);
        self.log.push(e.clone());
        vec![e]
    }

    fn format(&self, event: &Event) -> String {
        let (channels, _) = splitparams(&event.params);
        format!("{} joined {}\n", event.prefix, channels.join(","))
    }

    fn log(&mut self) -> &mut EventLog {
        &mut self.log
    }
}
