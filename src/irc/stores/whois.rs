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

/// Aggregates the numerics a WHOIS reply is made of: 311 (user), 312
/// (server), 319 (channels), 317 (idle), 318 (end). Each gets its own
/// formatter since the field layout differs per numeric.
pub struct WhoisStore {
    log: EventLog,
}

impl WhoisStore {
    pub fn new(id: u64) -> WhoisStore {
        WhoisStore {
            log: EventLog::new(id, "whois"),
        }
    }
}

impl Store for WhoisStore {
    fn declared_inbound(&self) -> &'static [&'static str] {
        &["311", "312", "319", "317", "318"]
    }
    fn declared_outbound(&self) -> &'static [&'static str] {
        &["WHOIS"]
    }

    fn on_event(&mut self, event: &Event, _sink: &mut dyn Sink) -> Vec<Event> {
        self.log.push(event.clone());
        Vec::new()
    }

    fn generate(&mut self, _verb: &str, params: &str, sink: &mut dyn Sink) -> Vec<Event> {
        sink.send_line(&format!("WHOIS {}", params));
        Vec::new()
    }

    fn format(&self, event: &Event) -> String {
        let fields: Vec<&str> = event.params.split(' ').collect();
        match event.command.as_str() {
            // "<me> <nick> <user> <host> * :<realname>"
            "311" if fields.len() >= 4 => {
                format!("{} is {}@{} ({})\n", fields[1], fields[2], fields[3], event.params_endpart)
            }
            // "<me> <nick> <server> :<serverinfo>"
            "312" if fields.len() >= 2 => {
                format!("{} using {} ({})\n", fields[1], fields[2], event.params_endpart)
            }
            // "<me> <nick> :#chan1 #chan2 ..."
            "319" if fields.len() >= 2 => {
                format!("{} on {}\n", fields[1], event.params_endpart)
            }
            // "<me> <nick> <secs> :seconds idle"
            "317" if fields.len() >= 3 => {
                format!("{} idle {}s\n", fields[1], fields[2])
            }
            "318" => String::new(),
            _ => String::new(),
        }
    }

    fn log(&mut self) -> &mut EventLog {
        &mut self.log
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn formats_311_as_user_host() {
        let store = WhoisStore::new(1);
        let ev = Event::from_line(b":irc.example 311 me alice a b * :Alice Realname");
        assert_eq!(store.format(&ev), "alice is a@b (Alice Realname)\n");
    }
}
