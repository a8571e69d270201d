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

//! One file per private conversation. [`PrivmsgStore`] is also the base
//! that [`crate::irc::stores::channel::ChannelStore`] embeds and adds
//! membership tracking on top of.

use crate::irc::casemap::{case_cmp_str, CaseMapping};
use crate::irc::event::{Event, EventLog};
use crate::irc::store::{Sink, Store};

pub const CTCP_DELIM: char = '\u{1}';

/// Reply text for an auto-answered CTCP VERSION, without the delimiters.
pub const CTCP_VERSION_REPLY: &str = "VERSION pyircfs";

pub struct PrivmsgStore {
    log: EventLog,
    /// Nick (or channel name) this conversation is with. Tracked through
    /// nick changes for private conversations; fixed for channels.
    target: String,
    casemap: CaseMapping,
}

impl PrivmsgStore {
    pub fn new(id: u64, target: &str) -> PrivmsgStore {
        PrivmsgStore {
            log: EventLog::new(id, target),
            target: target.to_string(),
            casemap: CaseMapping::default(),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Does this event belong to our conversation? True when it's
    /// addressed to us from `target`, or it's a NICK change from the
    /// nick we're currently tracking (handled by the caller, which then
    /// updates `target`).
    pub fn matches(&self, event: &Event) -> bool {
        match event.command.as_str() {
            "PRIVMSG" | "NOTICE" => case_cmp_str(self.casemap, sender(event), &self.target),
            "NICK" => case_cmp_str(self.casemap, sender(event), &self.target),
            _ => false,
        }
    }

}

/// The nick part of a message prefix (`"nick!user@host"` -> `"nick"`).
pub fn sender(event: &Event) -> &str {
    event.prefix.split('!').next().unwrap_or(&event.prefix)
}

/// If `event` is a CTCP VERSION request, the NOTICE line that answers it.
pub fn ctcp_reply(event: &Event) -> Option<Event> {
    let text = &event.params_endpart;
    if event.command != "PRIVMSG" {
        return None;
    }
    let inner = text.strip_prefix(CTCP_DELIM)?.strip_suffix(CTCP_DELIM)?;
    if inner.eq_ignore_ascii_case("VERSION") {
        let nick = sender(event);
        Some(Event::generate(
            "",
            "NOTICE",
            &format!("{} :{}{}{}", nick, CTCP_DELIM, CTCP_VERSION_REPLY, CTCP_DELIM),
        ))
    } else {
        None
    }
}

impl Store for PrivmsgStore {
    fn declared_inbound(&self) -> &'static [&'static str] {
        &["PRIVMSG", "NOTICE", "NICK"]
    }
    fn declared_outbound(&self) -> &'static [&'static str] {
        &["PRIVMSG", "NOTICE"]
    }

    fn on_event(&mut self, event: &Event, sink: &mut dyn Sink) -> Vec<Event> {
        if !self.matches(event) {
            return Vec::new();
        }
        if event.command == "NICK" {
            self.target = event.params_endpart.clone();
            self.log.push(event.clone());
            return Vec::new();
        }
        self.log.push(event.clone());
        if let Some(reply) = ctcp_reply(event) {
            sink.send_line(&format!("{} {}", reply.command, reply.params));
            return Vec::new();
        }
        Vec::new()
    }

    fn generate(&mut self, verb: &str, params: &str, sink: &mut dyn Sink) -> Vec<Event> {
        let verb = if verb.is_empty() { "PRIVMSG" } else { verb };
        sink.send_line(&format!("{} {} :{}", verb, self.target, params));
        let e = Event::generate(sink.nickname(), verb, &format!("{} :{}", self.target, params));
        self.log.push(e.clone());
        vec![e]
    }

    fn format(&self, event: &Event) -> String {
        match event.command.as_str() {
            "PRIVMSG" | "NOTICE" => format!("<{}> {}\n", sender(event), event.params_endpart),
            "NICK" => format!("* {} is now known as {}\n", sender(event), event.params_endpart),
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

    struct FakeSink {
        nick: String,
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
            &[]
        }
    }

    #[test]
    fn matches_is_case_insensitive() {
        let store = PrivmsgStore::new(1, "Alice");
        let ev = Event::from_line(b":alice!u@h PRIVMSG me :hi");
        assert!(store.matches(&ev));
    }

    #[test]
    fn ctcp_version_auto_replies() {
        let mut store = PrivmsgStore::new(1, "alice");
        let mut sink = FakeSink {
            nick: "me".to_string(),
            sent: Vec::new(),
        };
        let ev = Event::from_line(b":alice!u@h PRIVMSG me :\x01VERSION\x01");
        store.on_event(&ev, &mut sink);
        assert_eq!(sink.sent, vec!["NOTICE alice :\u{1}VERSION pyircfs\u{1}".to_string()]);
    }

    #[test]
    fn generate_writes_to_target() {
        let mut store = PrivmsgStore::new(1, "alice");
        let mut sink = FakeSink {
            nick: "me".to_string(),
            sent: Vec::new(),
        };
        store.generate("PRIVMSG", "hello", &mut sink);
        assert_eq!(sink.sent, vec!["PRIVMSG alice :hello".to_string()]);
    }

    #[test]
    fn nick_change_retargets_conversation() {
        let mut store = PrivmsgStore::new(1, "alice");
        let mut sink = FakeSink {
            nick: "me".to_string(),
            sent: Vec::new(),
        };
        let ev = Event::from_line(b":alice!u@h NICK :alice2");
        store.on_event(&ev, &mut sink);
        assert_eq!(store.target(), "alice2");
    }
}
