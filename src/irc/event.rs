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

//! Owned, line-independent representation of a single IRC message plus the
//! append-only, lazily-rendered log that stores keep of them.
//!
//! [`crate::irc::parse::IrcMessage`] borrows from the read buffer and dies
//! with it; an [`Event`] is what a store actually holds onto.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::irc::parse::IrcMessage;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Unix seconds the event was received (or generated) at.
    pub timestamp: u64,
    /// Full sender prefix, e.g. `"nick!user@host"` or a server name.
    /// Empty for generated events and messages that carried no prefix.
    pub prefix: String,
    pub command: String,
    /// All parameters re-joined with single spaces, trailing parameter's
    /// internal spacing (if any) preserved verbatim.
    pub params: String,
    /// Substring following the first `:` in the raw parameter section,
    /// empty if there wasn't one. Kept separate from `params` because a
    /// handful of formatters (MOTD, topic text) only want this part.
    pub params_endpart: String,
    /// True for events this process produced locally (outbound commands
    /// mirrored into a store) rather than ones read off the wire.
    pub generated: bool,
    /// True for events that exist purely to report state (e.g. a status
    /// change) rather than being directly renderable IRC traffic.
    pub informational: bool,
}

/// Current Unix time in seconds, used to stamp events and to track when
/// session-level state (like the connection status) last changed.
pub fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn reconstruct_prefix(m: &IrcMessage) -> String {
    match (m.nick, m.user, m.host) {
        (None, _, _) => String::new(),
        (Some(nick), None, None) => String::from_utf8_lossy(nick).to_string(),
        (Some(nick), Some(user), None) => format!(
            "{}!{}",
            String::from_utf8_lossy(nick),
            String::from_utf8_lossy(user)
        ),
        (Some(nick), None, Some(host)) => format!(
            "{}@{}",
            String::from_utf8_lossy(nick),
            String::from_utf8_lossy(host)
        ),
        (Some(nick), Some(user), Some(host)) => format!(
            "{}!{}@{}",
            String::from_utf8_lossy(nick),
            String::from_utf8_lossy(user),
            String::from_utf8_lossy(host)
        ),
    }
}

fn params_endpart_of(params: &str) -> String {
    if let Some(rest) = params.strip_prefix(':') {
        return rest.to_string();
    }
    if let Some(idx) = params.find(" :") {
        return params[idx + 2..].to_string();
    }
    String::new()
}

impl Event {
    /// Parse a single wire line (without the trailing CRLF) into an owned
    /// event, stamped with the current time.
    pub fn from_line(raw: &[u8]) -> Event {
        let m = IrcMessage::new(raw);
        let prefix = reconstruct_prefix(&m);
        let command = m
            .command
            .map(|c| String::from_utf8_lossy(c).to_string())
            .unwrap_or_default();
        let params = m
            .params
            .iter()
            .map(|p| String::from_utf8_lossy(p).to_string())
            .collect::<Vec<_>>()
            .join(" ");
        let params_endpart = params_endpart_of(&params);
        Event {
            timestamp: now(),
            prefix,
            command,
            params,
            params_endpart,
            generated: false,
            informational: false,
        }
    }

    /// Build an event that didn't come off the wire: an outbound command
    /// this process sent, or a synthetic notification a store raises for
    /// itself (e.g. a disconnect).
    pub fn generate(prefix: &str, command: &str, params: &str) -> Event {
        Event {
            timestamp: now(),
            prefix: prefix.to_string(),
            command: command.to_string(),
            params: params.to_string(),
            params_endpart: params_endpart_of(params),
            generated: true,
            informational: false,
        }
    }

    pub fn informational(command: &str, params: &str) -> Event {
        let mut e = Event::generate("", command, params);
        e.informational = true;
        e
    }
}

/// Append-only event list with a lazily-rebuilt, length-gated text cache.
/// Every store variant owns one of these; only the formatting closure
/// passed to [`EventLog::contents`] differs between them.
#[derive(Debug, Default)]
pub struct EventLog {
    pub id: u64,
    pub name: String,
    events: Vec<Event>,
    cached: String,
    last_len: usize,
}

impl EventLog {
    pub fn new(id: u64, name: impl Into<String>) -> EventLog {
        EventLog {
            id,
            name: name.into(),
            events: Vec::new(),
            cached: String::new(),
            last_len: 0,
        }
    }

    pub fn push(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Timestamp of the first recorded event, if any.
    pub fn first_timestamp(&self) -> Option<u64> {
        self.events.first().map(|e| e.timestamp)
    }

    /// Timestamp of the most recently recorded event, if any.
    pub fn last_timestamp(&self) -> Option<u64> {
        self.events.last().map(|e| e.timestamp)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Render (and cache) the full contents using `format` for each event.
    /// Only recomputed when the event list has grown since the last call,
    /// matching the original's `len(_eventlist) != _lastlen` check.
    pub fn contents<F: Fn(&Event) -> String>(&mut self, format: F) -> &str {
        if self.needs_recompute() {
            self.set_cache(self.events.iter().map(format).collect::<Vec<_>>().join(""));
        }
        &self.cached
    }

    pub fn size<F: Fn(&Event) -> String>(&mut self, format: F) -> u64 {
        self.contents(format).len() as u64
    }

    /// `true` once the event list has grown past what's reflected in the
    /// cache. Exposed so callers whose `format` needs an immutable borrow
    /// of `self` (and so can't pass a closure into [`EventLog::contents`])
    /// can still drive the same cache by hand.
    pub fn needs_recompute(&self) -> bool {
        self.events.len() != self.last_len
    }

    pub fn cached(&self) -> &str {
        &self.cached
    }

    pub fn set_cache(&mut self, rendered: String) {
        self.cached = rendered;
        self.last_len = self.events.len();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_full_message() {
        let e = Event::from_line(b":happy!test@case PRIVMSG #chan :hello there");
        assert_eq!(e.prefix, "happy!test@case");
        assert_eq!(e.command, "PRIVMSG");
        assert_eq!(e.params, "#chan hello there");
        assert_eq!(e.params_endpart, "hello there");
        assert!(!e.generated);
    }

    #[test]
    fn no_prefix_no_trailing() {
        let e = Event::from_line(b"PING");
        assert_eq!(e.prefix, "");
        assert_eq!(e.command, "PING");
        assert_eq!(e.params, "");
        assert_eq!(e.params_endpart, "");
    }

    #[test]
    fn server_prefix_is_bare_nick_field() {
        let e = Event::from_line(b":irc.example.org 001 nick :Welcome");
        assert_eq!(e.prefix, "irc.example.org");
        assert_eq!(e.params_endpart, "Welcome");
    }

    #[test]
    fn event_log_caches_until_grown() {
        let mut log = EventLog::new(1, "test");
        log.push(Event::generate("", "X", "a"));
        let c1 = log.contents(|e| format!("{}\n", e.params)).to_string();
        assert_eq!(c1, "a\n");
        // call again without pushing: cache must not be recomputed (same result regardless)
        let c2 = log.contents(|e| format!("{}\n", e.params)).to_string();
        assert_eq!(c1, c2);
        log.push(Event::generate("", "X", "b"));
        let c3 = log.contents(|e| format!("{}\n", e.params)).to_string();
        assert_eq!(c3, "a\nb\n");
    }
}
