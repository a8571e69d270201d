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

//! The richest store: a channel is a private conversation (chat lines,
//! CTCP) plus membership, topic and mode state, plus the dance of
//! queries a client issues right after its own JOIN lands.

use std::collections::HashMap;

use crate::irc::casemap::{case_cmp_str, CaseMapping};
use crate::irc::event::{Event, EventLog};
use crate::irc::modes::extract_modes;
use crate::irc::store::{Sink, Store};
use crate::irc::stores::part::splitparams;
use crate::irc::stores::privmsg::{ctcp_reply, sender};

#[derive(Debug, Clone, Default)]
pub struct Member {
    pub op: bool,
    pub voice: bool,
    pub away: bool,
    pub host: String,
    pub user: String,
    pub server: String,
    pub realname: String,
    pub hopcount: u32,
}

pub struct ChannelStore {
    log: EventLog,
    channel: String,
    casemap: CaseMapping,
    pub members: HashMap<String, Member>,
    pub topic: String,
    pub channelmode: String,
    pub bans: Vec<String>,
    pub invites: Vec<String>,
    pub exceptions: Vec<String>,
    /// Set once our own JOIN to this channel has been echoed back.
    pub joined: bool,
    /// Guards against sending the JOIN command more than once while a
    /// join is already outstanding.
    join_sent: bool,
    /// Outbound PRIVMSGs queued while we haven't joined yet.
    send_queue: Vec<String>,
}

impl ChannelStore {
    pub fn new(id: u64, channel: &str) -> ChannelStore {
        ChannelStore {
            log: EventLog::new(id, channel),
            channel: channel.to_string(),
            casemap: CaseMapping::default(),
            members: HashMap::new(),
            topic: String::new(),
            channelmode: String::new(),
            bans: Vec::new(),
            invites: Vec::new(),
            exceptions: Vec::new(),
            joined: false,
            join_sent: false,
            send_queue: Vec::new(),
        }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    fn matches_channel(&self, name: &str) -> bool {
        case_cmp_str(self.casemap, name, &self.channel)
    }

    fn apply_modes(&mut self, params: &str) {
        for change in extract_modes(params) {
            let (sign, flag) = {
                let mut chars = change.flag.chars();
                (chars.next().unwrap_or('+'), chars.next().unwrap_or(' '))
            };
            match flag {
                'o' | 'v' => {
                    if let Some(nick) = &change.param {
                        if let Some(member) = self.members.get_mut(nick) {
                            if flag == 'o' {
                                member.op = sign == '+';
                            } else {
                                member.voice = sign == '+';
                            }
                        }
                    }
                }
                'b' => {
                    if let Some(mask) = &change.param {
                        if sign == '+' {
                            self.bans.push(mask.clone());
                        } else {
                            self.bans.retain(|b| b != mask);
                        }
                    }
                }
                'I' => {
                    if let Some(mask) = &change.param {
                        if sign == '+' {
                            self.invites.push(mask.clone());
                        } else {
                            self.invites.retain(|b| b != mask);
                        }
                    }
                }
                'e' => {
                    if let Some(mask) = &change.param {
                        if sign == '+' {
                            self.exceptions.push(mask.clone());
                        } else {
                            self.exceptions.retain(|b| b != mask);
                        }
                    }
                }
                _ => {
                    // plain channel mode flag (n, t, s, m, l, k, ...): fold into the
                    // running channelmode string.
                    if sign == '+' && !self.channelmode.contains(flag) {
                        self.channelmode.push(flag);
                    } else if sign == '-' {
                        self.channelmode.retain(|c| c != flag);
                    }
                }
            }
        }
    }

    fn flush_send_queue(&mut self, sink: &mut dyn Sink) {
        for line in self.send_queue.drain(..) {
            sink.send_line(&line);
        }
    }
}

impl Store for ChannelStore {
    fn declared_inbound(&self) -> &'static [&'static str] {
        &[
            "PRIVMSG", "NOTICE", "NICK", "JOIN", "PART", "QUIT", "KICK", "MODE", "TOPIC", "353",
            "366", "352", "315", "324", "332", "367", "471", "473", "474", "475",
        ]
    }
    fn declared_outbound(&self) -> &'static [&'static str] {
        &["PRIVMSG", "NOTICE", "PART", "MODE", "TOPIC"]
    }

    fn on_event(&mut self, event: &Event, sink: &mut dyn Sink) -> Vec<Event> {
        match event.command.as_str() {
            "JOIN" => {
                let (channels, _) = splitparams(&event.params);
                if !channels.iter().any(|c| self.matches_channel(c)) {
                    return Vec::new();
                }
                let nick = sender(event);
                self.members.entry(nick.to_string()).or_default();
                if case_cmp_str(self.casemap, nick, sink.nickname()) {
                    self.joined = true;
                    self.join_sent = false;
                    self.flush_send_queue(sink);
                    sink.send_line(&format!("WHO {}", self.channel));
                    sink.send_line(&format!("MODE {}", self.channel));
                    sink.send_line(&format!("MODE {} b", self.channel));
                }
                self.log.push(event.clone());
                Vec::new()
            }
            "PART" | "KICK" => {
                let nick = if event.command == "KICK" {
                    event.params.split(' ').nth(1).unwrap_or("")
                } else {
                    sender(event)
                };
                self.members.remove(nick);
                if case_cmp_str(self.casemap, nick, sink.nickname()) {
                    self.joined = false;
                    self.members.clear();
                }
                self.log.push(event.clone());
                Vec::new()
            }
            "QUIT" => {
                self.members.remove(sender(event));
                self.log.push(event.clone());
                Vec::new()
            }
            "NICK" => {
                let old = sender(event);
                if let Some(member) = self.members.remove(old) {
                    self.members.insert(event.params_endpart.clone(), member);
                    self.log.push(event.clone());
                }
                Vec::new()
            }
            "MODE" => {
                self.apply_modes(&event.params);
                self.log.push(event.clone());
                Vec::new()
            }
            "TOPIC" => {
                self.topic = event.params_endpart.clone();
                self.log.push(event.clone());
                Vec::new()
            }
            "324" => {
                // "<me> <chan> <modestring> [params...]"
                if let Some(rest) = event.params.splitn(3, ' ').nth(2) {
                    self.apply_modes(&format!("{} {}", self.channel, rest));
                }
                Vec::new()
            }
            "353" => {
                // RPL_NAMREPLY: "<me> <= | * | @> <chan> :<names>"
                for token in event.params_endpart.split(' ') {
                    let (op, voice, nick) = match token.as_bytes().first() {
                        Some(b'@') => (true, false, &token[1..]),
                        Some(b'+') => (false, true, &token[1..]),
                        _ => (false, false, token),
                    };
                    if nick.is_empty() {
                        continue;
                    }
                    let member = self.members.entry(nick.to_string()).or_default();
                    member.op = op;
                    member.voice = voice;
                }
                Vec::new()
            }
            "352" => {
                // RPL_WHOREPLY: "<me> <chan> <user> <host> <server> <nick>
                // <H|G>[*][@|+] :<hopcount> <realname>"
                let fields: Vec<&str> = event.params.splitn(8, ' ').collect();
                if fields.len() >= 7 {
                    let (user, host, server, nick, flags) =
                        (fields[2], fields[3], fields[4], fields[5], fields[6]);
                    let (hopcount, realname) = event
                        .params_endpart
                        .split_once(' ')
                        .unwrap_or((event.params_endpart.as_str(), ""));
                    let member = self.members.entry(nick.to_string()).or_default();
                    member.user = user.to_string();
                    member.host = host.to_string();
                    member.server = server.to_string();
                    member.away = flags.starts_with('G');
                    member.hopcount = hopcount.parse().unwrap_or(0);
                    member.realname = realname.to_string();
                }
                Vec::new()
            }
            "PRIVMSG" | "NOTICE" => {
                let (target, _) = event
                    .params
                    .split_once(' ')
                    .unwrap_or((event.params.as_str(), ""));
                if !self.matches_channel(target) {
                    return Vec::new();
                }
                self.log.push(event.clone());
                if let Some(reply) = ctcp_reply(event) {
                    sink.send_line(&format!("{} {}", reply.command, reply.params));
                }
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    fn generate(&mut self, verb: &str, params: &str, sink: &mut dyn Sink) -> Vec<Event> {
        match verb {
            "PRIVMSG" | "NOTICE" | "" => {
                let verb = if verb.is_empty() { "PRIVMSG" } else { verb };
                let line = format!("{} {} :{}", verb, self.channel, params);
                if self.joined {
                    sink.send_line(&line);
                } else {
                    if !self.join_sent {
                        sink.send_line(&format!("JOIN {}", self.channel));
                        self.join_sent = true;
                    }
                    self.send_queue.push(line);
                }
                let e = Event::generate(sink.nickname(), verb, &format!("{} :{}", self.channel, params));
                self.log.push(e.clone());
                vec![e]
            }
            "PART" => {
                sink.send_line(&format!("PART {} :{}", self.channel, params));
                Vec::new()
            }
            "TOPIC" => {
                sink.send_line(&format!("TOPIC {} :{}", self.channel, params));
                Vec::new()
            }
            "MODE" => {
                sink.send_line(&format!("MODE {} {}", self.channel, params));
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    fn format(&self, event: &Event) -> String {
        match event.command.as_str() {
            "PRIVMSG" | "NOTICE" => format!("<{}> {}\n", sender(event), event.params_endpart),
            "JOIN" => format!("* {} has joined {}\n", sender(event), self.channel),
            "PART" => format!("* {} has left {}\n", sender(event), self.channel),
            "KICK" => format!("* {} was kicked ({})\n", event.params.split(' ').nth(1).unwrap_or(""), event.params_endpart),
            "QUIT" => format!("* {} has quit ({})\n", sender(event), event.params_endpart),
            "NICK" => format!("* {} is now known as {}\n", sender(event), event.params_endpart),
            "MODE" => format!("* {} sets mode {}\n", sender(event), event.params),
            "TOPIC" => format!("* {} changed the topic to: {}\n", sender(event), event.params_endpart),
            _ => String::new(),
        }
    }

    fn log(&mut self) -> &mut EventLog {
        &mut self.log
    }

    fn on_remove(&mut self, sink: &mut dyn Sink) {
        if self.joined {
            sink.send_line(&format!("PART {}", self.channel));
        }
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
    fn own_join_triggers_who_and_mode_queries() {
        let mut store = ChannelStore::new(1, "#chan");
        let mut sink = FakeSink {
            nick: "me".to_string(),
            sent: Vec::new(),
        };
        let ev = Event::from_line(b":me!u@h JOIN :#chan");
        store.on_event(&ev, &mut sink);
        assert!(store.joined);
        assert_eq!(
            sink.sent,
            vec![
                "WHO #chan".to_string(),
                "MODE #chan".to_string(),
                "MODE #chan b".to_string(),
            ]
        );
    }

    #[test]
    fn privmsg_queues_until_joined_then_flushes() {
        let mut store = ChannelStore::new(1, "#chan");
        let mut sink = FakeSink {
            nick: "me".to_string(),
            sent: Vec::new(),
        };
        store.generate("PRIVMSG", "hello", &mut sink);
        assert_eq!(sink.sent, vec!["JOIN #chan".to_string()]);
        sink.sent.clear();

        let ev = Event::from_line(b":me!u@h JOIN :#chan");
        store.on_event(&ev, &mut sink);
        assert!(sink.sent.contains(&"PRIVMSG #chan :hello".to_string()));
    }

    #[test]
    fn mode_updates_op_status() {
        let mut store = ChannelStore::new(1, "#chan");
        store.members.insert("alice".to_string(), Member::default());
        let ev = Event::from_line(b":op!u@h MODE #chan +o alice");
        let mut sink = FakeSink {
            nick: "me".to_string(),
            sent: Vec::new(),
        };
        store.on_event(&ev, &mut sink);
        assert!(store.members["alice"].op);
    }

    #[test]
    fn names_reply_marks_ops_and_voices() {
        let mut store = ChannelStore::new(1, "#chan");
        let ev = Event::from_line(b":irc.example 353 me = #chan :@alice +bob carol");
        let mut sink = FakeSink {
            nick: "me".to_string(),
            sent: Vec::new(),
        };
        store.on_event(&ev, &mut sink);
        assert!(store.members["alice"].op);
        assert!(store.members["bob"].voice);
        assert!(!store.members["carol"].op && !store.members["carol"].voice);
    }

    #[test]
    fn who_reply_fills_in_member_detail() {
        let mut store = ChannelStore::new(1, "#chan");
        let ev = Event::from_line(
            b":irc.example 352 me #chan ~alice host.example irc.example alice H :3 Alice Example",
        );
        let mut sink = FakeSink {
            nick: "me".to_string(),
            sent: Vec::new(),
        };
        store.on_event(&ev, &mut sink);
        let member = &store.members["alice"];
        assert_eq!(member.user, "~alice");
        assert_eq!(member.host, "host.example");
        assert_eq!(member.server, "irc.example");
        assert_eq!(member.hopcount, 3);
        assert_eq!(member.realname, "Alice Example");
        assert!(!member.away);
    }
}
