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
use crate::irc::modes::extract_modes;
use crate::irc::store::{Sink, Store};

/// Standalone MODE log (user modes, or a channel's raw MODE history
/// outside of what [`crate::irc::stores::channel::ChannelStore`] tracks
/// as live state).
pub struct ModeStore {
    log: EventLog,
}

impl ModeStore {
    pub fn new(id: u64) -> ModeStore {
        ModeStore {
            log: EventLog::new(id, "mode"),
        }
    }
}

impl Store for ModeStore {
    fn declared_inbound(&self) -> &'static [&'static str] {
        &["MODE", "221"]
    }
    fn declared_outbound(&self) -> &'static [&'static str] {
        &["MODE"]
    }

    fn on_event(&mut self, event: &Event, _sink: &mut dyn Sink) -> Vec<Event> {
        self.log.push(event.clone());
        Vec::new()
    }

    fn generate(&mut self, _verb: &str, params: &str, sink: &mut dyn Sink) -> Vec<Event> {
        sink.send_line(&format!("MODE {}", params));
        let e = Event::generate(sink.nickname(), "MODE", params);
        self.log.push(e.clone());
        vec![e]
    }

    fn format(&self, event: &Event) -> String {
        let changes = extract_modes(&event.params);
        let rendered = changes
            .iter()
            .map(|c| match &c.param {
                Some(p) => format!("{} {}", c.flag, p),
                None => c.flag.clone(),
            })
            .collect::<Vec<_>>()
            .join(" ");
        format!("{} sets mode: {}\n", event.prefix, rendered)
    }

    fn log(&mut self) -> &mut EventLog {
        &mut self.log
    }
}
