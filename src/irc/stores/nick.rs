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

//! Nick changes, plus collision recovery during and after registration.
//!
//! Collision recovery is deliberately NOT randomized: on a 433/437 we look
//! up the nick we just tried in the ordered candidate list and move to the
//! next entry. If the rejected nick was the last candidate, registration
//! fails outright (status 104) rather than appending digits forever.

use crate::irc::event::{Event, EventLog};
use crate::irc::store::{Sink, Store};

pub const STATUS_NICK_EXHAUSTED: &str = "104";

pub struct NickStore {
    log: EventLog,
}

impl NickStore {
    pub fn new(id: u64) -> NickStore {
        NickStore {
            log: EventLog::new(id, "nick"),
        }
    }
}

impl Store for NickStore {
    fn declared_inbound(&self) -> &'static [&'static str] {
        &["NICK", "433", "437"]
    }
    fn declared_outbound(&self) -> &'static [&'static str] {
        &["NICK"]
    }

    fn on_event(&mut self, event: &Event, sink: &mut dyn Sink) -> Vec<Event> {
        match event.command.as_str() {
            "NICK" => {
                sink.set_nickname(&event.params_endpart);
                self.log.push(event.clone());
                Vec::new()
            }
            "433" | "437" => {
                // params: "<ourcurrentnick-or-*> <rejected-nick> :message"
                let rejected = event.params.split(' ').nth(1).unwrap_or("");
                let candidates = sink.nickname_candidates();
                match candidates.iter().position(|c| c == rejected) {
                    Some(idx) if idx + 1 < candidates.len() => {
                        let next = candidates[idx + 1].clone();
                        sink.send_line(&format!("NICK {}", next));
                        Vec::new()
                    }
                    _ => vec![Event::informational(
                        STATUS_NICK_EXHAUSTED,
                        "no more nicknames to try",
                    )],
                }
            }
            _ => Vec::new(),
        }
    }

    fn generate(&mut self, _verb: &str, params: &str, sink: &mut dyn Sink) -> Vec<Event> {
        sink.send_line(&format!("NICK {}", params));
        let e = Event::generate(sink.nickname(), "NICK", params);
        self.log.push(e.clone());
        vec![e]
    }

    fn format(&self, event: &Event) -> String {
        format!("{} is now known as {}\n", event.prefix, event.params_endpart)
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

    struct FakeSink {
        nick: String,
        candidates: Vec<String>,
        sent: Vec<String>,
    }
    impl Sink for FakeSink {
        fn send_line(&mut self, line: &str) {
            self.sent.push(line.to_string());
        }
        fn nickname(&self) -> &str {
            &self.nick
        }
        fn set_nickname(&mut self, nick: &str) {
            self.nick = nick.to_string();
        }
        fn nickname_candidates(&self) -> &[String] {
            &self.candidates
        }
    }

    #[test]
    fn collision_tries_next_candidate() {
        let mut store = NickStore::new(1);
        let mut sink = FakeSink {
            nick: "bob".to_string(),
            candidates: vec!["bob".to_string(), "bob_".to_string(), "bob__".to_string()],
            sent: Vec::new(),
        };
        let ev = Event::from_line(b":irc.example 433 * bob :Nickname is already in use.");
        store.on_event(&ev, &mut sink);
        assert_eq!(sink.sent, vec!["NICK bob_".to_string()]);
    }

    #[test]
    fn exhausted_candidates_reports_status() {
        let mut store = NickStore::new(1);
        let mut sink = FakeSink {
            nick: "bob__".to_string(),
            candidates: vec!["bob".to_string(), "bob_".to_string(), "bob__".to_string()],
            sent: Vec::new(),
        };
        let ev = Event::from_line(b":irc.example 433 * bob__ :Nickname is already in use.");
        let out = store.on_event(&ev, &mut sink);
        assert!(sink.sent.is_empty());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].command, STATUS_NICK_EXHAUSTED);
    }
}
