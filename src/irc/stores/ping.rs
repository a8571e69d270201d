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

//! Internal keepalive bookkeeping: auto-PONG every PING, never surfaced
//! as a file.

use crate::irc::event::{Event, EventLog};
use crate::irc::store::{Sink, Store};

pub struct PingStore {
    log: EventLog,
}

impl PingStore {
    pub fn new(id: u64) -> PingStore {
        PingStore {
            log: EventLog::new(id, "ping"),
        }
    }
}

impl Store for PingStore {
    fn declared_inbound(&self) -> &'static [&'static str] {
        &["PING"]
    }
    fn declared_outbound(&self) -> &'static [&'static str] {
        &[]
    }

    fn on_event(&mut self, event: &Event, sink: &mut dyn Sink) -> Vec<Event> {
        sink.send_line(&format!("PONG :{}", event.params_endpart));
        Vec::new()
    }

    fn generate(&mut self, _verb: &str, _params: &str, _sink: &mut dyn Sink) -> Vec<Event> {
        Vec::new()
    }

    fn format(&self, _event: &Event) -> String {
        String::new()
    }

    fn log(&mut self) -> &mut EventLog {
        &mut self.log
    }

    fn internal(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod test {
    use super::*;

    struct FakeSink(Vec<String>);
    impl Sink for FakeSink {
        fn send_line(&mut self, line: &str) {
            self.0.push(line.to_string());
        }
        fn nickname(&self) -> &str {
            "me"
        }
        fn set_nickname(&mut self, _nick: &str) {}
        fn nickname_candidates(&self) -> &[String] {
            &[]
        }
    }

    #[test]
    fn replies_pong_with_same_payload() {
        let mut store = PingStore::new(1);
        let mut sink = FakeSink(Vec::new());
        let ev = Event::from_line(b"PING :server.example");
        store.on_event(&ev, &mut sink);
        assert_eq!(sink.0, vec!["PONG :server.example".to_string()]);
    }
}
