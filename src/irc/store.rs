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

//! The store abstraction. Each IRC command family the filesystem exposes
//! as a file (PING bookkeeping, channel membership, a private
//! conversation, MOTD...) is a `Store`: something that reacts to inbound
//! events, can manufacture outbound ones from a write(2), and knows how
//! to render its own event log as file contents.
//!
//! A store never touches the connection or the rest of the handler
//! directly; it only gets a [`Sink`], which is the one capability it
//! needs (send a raw line, learn the current nickname). That's the
//! Rust-shaped replacement for the original design, where every store
//! held a full back-reference to the session object that owned it.

use crate::irc::event::{Event, EventLog};

/// What a store is allowed to do to the outside world.
pub trait Sink {
    /// Queue a raw command line (no trailing CRLF) for the server.
    fn send_line(&mut self, line: &str);
    /// The nick this session is currently known by.
    fn nickname(&self) -> &str;
    /// Record a successful nick change (accepted by the server, or about
    /// to be sent speculatively during registration).
    fn set_nickname(&mut self, nick: &str);
    /// Ordered list of nicknames to try during registration/collision
    /// recovery: primary, alternate, then whatever else config supplied.
    fn nickname_candidates(&self) -> &[String];
}

/// A single IRC-command-family projection.
pub trait Store: std::any::Any {
    /// Commands from the server this store wants to see.
    fn declared_inbound(&self) -> &'static [&'static str];
    /// Commands a write(2) on this store's file is allowed to generate.
    fn declared_outbound(&self) -> &'static [&'static str];

    /// React to an inbound event already routed to this store. May
    /// return further events (e.g. an auto-generated reply) for the
    /// handler to dispatch as if they arrived from the wire.
    fn on_event(&mut self, event: &Event, sink: &mut dyn Sink) -> Vec<Event>;

    /// Turn a write(2) (`verb`, raw param text) into wire traffic via the
    /// sink, and return the event(s) this store should also log locally
    /// so the write shows up immediately in a subsequent read.
    fn generate(&mut self, verb: &str, params: &str, sink: &mut dyn Sink) -> Vec<Event>;

    /// Render one event as it should appear in the store's file.
    fn format(&self, event: &Event) -> String;

    /// Called once when the store is being torn down (file removed from
    /// the directory, or session disconnect). Default is a no-op.
    fn on_remove(&mut self, _sink: &mut dyn Sink) {}

    /// Mutable access to the backing log, needed by the generic
    /// size/contents helpers in [`Store::contents`]/[`Store::size`].
    fn log(&mut self) -> &mut EventLog;

    /// `true` for stores that exist purely for protocol bookkeeping and
    /// must never be listed as a file (PING, USER, PASS).
    fn internal(&self) -> bool {
        false
    }

    fn contents(&mut self) -> String {
        if self.log().needs_recompute() {
            // `format` needs `&self` while `log()` needs `&mut self`, so
            // the events are cloned out first to break the borrow before
            // rendering, then the cache is written back through `log()`.
            let events: Vec<Event> = self.log().events().to_vec();
            let rendered: String = events.iter().map(|e| self.format(e)).collect();
            self.log().set_cache(rendered);
        }
        self.log().cached().to_string()
    }

    fn size(&mut self) -> u64 {
        self.contents().len() as u64
    }

    /// Unix seconds of the first logged event, for the filesystem's
    /// `ctime`. `None` for a store with no events yet.
    fn ctime(&mut self) -> Option<u64> {
        self.log().first_timestamp()
    }

    /// Unix seconds of the most recently logged event, for the
    /// filesystem's `mtime`/`atime`. `None` for a store with no events yet.
    fn mtime(&mut self) -> Option<u64> {
        self.log().last_timestamp()
    }

    fn id(&mut self) -> u64 {
        self.log().id
    }

    fn name(&mut self) -> String {
        self.log().name.clone()
    }

    /// Escape hatch for the filesystem layer, which needs to read
    /// [`crate::irc::stores::channel::ChannelStore`]'s membership fields
    /// directly rather than through the narrow `Store` interface every
    /// other caller uses.
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

#[cfg(test)]
mod test {
    use super::*;

    struct RecordingSink {
        lines: Vec<String>,
        nick: String,
        candidates: Vec<String>,
    }

    impl Sink for RecordingSink {
        fn send_line(&mut self, line: &str) {
            self.lines.push(line.to_string());
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

    struct Echo {
        log: EventLog,
    }

    impl Store for Echo {
        fn declared_inbound(&self) -> &'static [&'static str] {
            &["PRIVMSG"]
        }
        fn declared_outbound(&self) -> &'static [&'static str] {
            &["PRIVMSG"]
        }
        fn on_event(&mut self, event: &Event, _sink: &mut dyn Sink) -> Vec<Event> {
            self.log.push(event.clone());
            Vec::new()
        }
        fn generate(&mut self, verb: &str, params: &str, sink: &mut dyn Sink) -> Vec<Event> {
            sink.send_line(&format!("{} {}", verb, params));
            let e = Event::generate(sink.nickname(), verb, params);
            self.log.push(e.clone());
            vec![e]
        }
        fn format(&self, event: &Event) -> String {
            format!("<{}> {}\n", event.prefix, event.params_endpart)
        }
        fn log(&mut self) -> &mut EventLog {
            &mut self.log
        }
    }

    #[test]
    fn generate_queues_line_and_logs_event() {
        let mut sink = RecordingSink {
            lines: Vec::new(),
            nick: "me".to_string(),
            candidates: vec!["me".to_string()],
        };
        let mut store = Echo {
            log: EventLog::new(1, "#chan"),
        };
        store.generate("PRIVMSG", "#chan :hi", &mut sink);
        assert_eq!(sink.lines, vec!["PRIVMSG #chan :hi".to_string()]);
        assert_eq!(store.log().len(), 1);
    }
}
