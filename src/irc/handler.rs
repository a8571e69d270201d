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

//! The session kernel: owns every store, routes inbound events to the
//! ones that declared interest, and is the only thing a write(2) on the
//! filesystem ever calls into.

use std::collections::{HashMap, VecDeque};

use crate::irc::casemap::{irc_uppercase, is_channel, CaseMapping};
use crate::irc::event::{now, Event};
use crate::irc::store::{Sink, Store};
use crate::irc::stores::channel::ChannelStore;
use crate::irc::stores::error::{ErrorStore, CLOSE_REQUEST};
use crate::irc::stores::join::JoinStore;
use crate::irc::stores::mode::ModeStore;
use crate::irc::stores::motd::MotdStore;
use crate::irc::stores::nick::{NickStore, STATUS_NICK_EXHAUSTED};
use crate::irc::stores::part::PartStore;
use crate::irc::stores::ping::PingStore;
use crate::irc::stores::privmsg::PrivmsgStore;
use crate::irc::stores::quit::QuitStore;
use crate::irc::stores::raw::RawStore;
use crate::irc::stores::register::{PassStore, UserStore};
use crate::irc::stores::who::WhoStore;
use crate::irc::stores::whois::WhoisStore;

pub mod status {
    pub const DISCONNECTED: u16 = 0;
    pub const REGISTERING: u16 = 1;
    pub const REGISTERED: u16 = 10;
    pub const CLOSED_OK: u16 = 100;
    pub const CLOSED_SERVER: u16 = 101;
    pub const CONNECT_FAILED: u16 = 102;
    pub const REGISTRATION_FAILED: u16 = 103;
    pub const NICK_EXHAUSTED: u16 = 104;
    pub const BAD_PASSWORD: u16 = 105;
}

/// The fields a [`Store`] is allowed to touch, kept separate from the
/// store registry itself so `Handler` can hand out `&mut Session` while
/// still holding a store it just pulled out of its map.
pub struct Session {
    nickname: String,
    candidates: Vec<String>,
    casemap: CaseMapping,
    pending_out: VecDeque<String>,
}

impl Sink for Session {
    fn send_line(&mut self, line: &str) {
        self.pending_out.push_back(line.to_string());
    }
    fn nickname(&self) -> &str {
        &self.nickname
    }
    fn set_nickname(&mut self, nick: &str) {
        self.nickname = nick.to_string();
    }
    fn nickname_candidates(&self) -> &[String] {
        &self.candidates
    }
}

struct Registration {
    username: String,
    realname: String,
    password: String,
}

pub struct Handler {
    pub status: u16,
    /// Unix seconds `status` was last assigned, for `/info/status`'s
    /// `mtime`/`atime`.
    status_changed_at: u64,
    session: Session,
    registration: Registration,
    next_id: u64,
    stores: HashMap<u64, Box<dyn Store>>,
    /// command -> store ids that declared it inbound, for the
    /// protocol-bookkeeping stores (ping/nick/quit/error/mode/who/motd/whois).
    reply_routes: HashMap<String, Vec<u64>>,
    /// casefolded conversation target (nick or channel) -> store id, for
    /// PrivmsgStore/ChannelStore.
    privmsg_routes: HashMap<String, u64>,
    /// every PrivmsgStore/ChannelStore id, for NICK/QUIT broadcast.
    privmsg_like: Vec<u64>,
}

impl Handler {
    pub fn new(nickname: &str, altnick: &str, username: &str, realname: &str, password: &str) -> Handler {
        let mut candidates = vec![nickname.to_string()];
        if !altnick.is_empty() {
            candidates.push(altnick.to_string());
        }
        let mut h = Handler {
            status: status::DISCONNECTED,
            status_changed_at: now(),
            session: Session {
                nickname: nickname.to_string(),
                candidates,
                casemap: CaseMapping::default(),
                pending_out: VecDeque::new(),
            },
            registration: Registration {
                username: username.to_string(),
                realname: realname.to_string(),
                password: password.to_string(),
            },
            next_id: 1,
            stores: HashMap::new(),
            reply_routes: HashMap::new(),
            privmsg_routes: HashMap::new(),
            privmsg_like: Vec::new(),
        };
        h.register_broadcast(Box::new(QuitStore::new(h.next_id())));
        h.register_broadcast(Box::new(NickStore::new(h.next_id())));
        h.register_broadcast(Box::new(ErrorStore::new(h.next_id())));
        h.register_broadcast(Box::new(PingStore::new(h.next_id())));
        h.register_broadcast(Box::new(UserStore::new(h.next_id())));
        h.register_broadcast(Box::new(PassStore::new(h.next_id())));
        h.register_broadcast(Box::new(ModeStore::new(h.next_id())));
        h.register_broadcast(Box::new(WhoStore::new(h.next_id())));
        h.register_broadcast(Box::new(MotdStore::new(h.next_id())));
        h.register_broadcast(Box::new(WhoisStore::new(h.next_id())));
        h.register_broadcast(Box::new(JoinStore::new(h.next_id())));
        h.register_broadcast(Box::new(PartStore::new(h.next_id())));
        h.register_broadcast(Box::new(RawStore::new(h.next_id())));
        h
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn register_broadcast(&mut self, mut store: Box<dyn Store>) -> u64 {
        let id = store.id();
        for cmd in store.declared_inbound() {
            self.reply_routes.entry(cmd.to_string()).or_default().push(id);
        }
        self.stores.insert(id, store);
        id
    }

    fn casefold(&self, s: &str) -> String {
        String::from_utf8_lossy(&irc_uppercase(self.session.casemap, s.as_bytes())).to_string()
    }

    fn set_status(&mut self, new_status: u16) {
        self.status = new_status;
        self.status_changed_at = now();
    }

    /// Demand-create the conversation/channel store a PRIVMSG/NOTICE/JOIN
    /// needs *before* the event is routed, mirroring the original's
    /// ordering: the store must exist before dispatch sees it, so a
    /// JOIN to a brand new channel is logged in that channel's own file
    /// rather than dropped.
    fn ensure_demand_store(&mut self, event: &Event) {
        let target = match event.command.as_str() {
            "PRIVMSG" | "NOTICE" => event.params.split(' ').next(),
            "JOIN" => crate::irc::stores::part::splitparams(&event.params)
                .0
                .first()
                .map(|s| s.as_str()),
            _ => None,
        };
        let target = match target {
            Some(t) if !t.is_empty() => t,
            _ => return,
        };
        let key = self.casefold(target);
        if self.privmsg_routes.contains_key(&key) {
            return;
        }
        let id = self.next_id();
        let store: Box<dyn Store> = if is_channel(target) {
            Box::new(ChannelStore::new(id, target))
        } else {
            Box::new(PrivmsgStore::new(id, target))
        };
        self.privmsg_routes.insert(key, id);
        self.privmsg_like.push(id);
        self.stores.insert(id, store);
    }

    fn call_store(&mut self, id: u64, event: &Event) -> Vec<Event> {
        if let Some(mut store) = self.stores.remove(&id) {
            let produced = store.on_event(event, &mut self.session);
            self.stores.insert(id, store);
            produced
        } else {
            Vec::new()
        }
    }

    /// Parse and route one wire line. Returns any control-plane
    /// notifications (status changes, close requests) for the caller
    /// (the I/O loop) to act on; it must not feed these back through
    /// `on_line` itself.
    pub fn on_line(&mut self, raw: &[u8]) -> Vec<Event> {
        let event = Event::from_line(raw);
        self.dispatch(event)
    }

    fn dispatch(&mut self, event: Event) -> Vec<Event> {
        self.ensure_demand_store(&event);

        let mut produced = Vec::new();

        match event.command.as_str() {
            "PRIVMSG" | "NOTICE" => {
                if let Some(target) = event.params.split(' ').next() {
                    let key = self.casefold(target);
                    if let Some(&id) = self.privmsg_routes.get(&key) {
                        produced.extend(self.call_store(id, &event));
                    }
                }
            }
            "JOIN" | "PART" | "KICK" | "MODE" | "TOPIC" => {
                // plain channel commands: the first param names the channel.
                if let Some(target) = event.params.split(' ').next() {
                    let key = self.casefold(target);
                    if let Some(&id) = self.privmsg_routes.get(&key) {
                        produced.extend(self.call_store(id, &event));
                    }
                }
            }
            "353" => {
                // RPL_NAMREPLY: "<me> <symbol> <channel> :<names>" -- the
                // channel is the third param, not the first (the first is
                // our own nick, same as every other numeric reply below).
                if let Some(target) = event.params.split(' ').nth(2) {
                    let key = self.casefold(target);
                    if let Some(&id) = self.privmsg_routes.get(&key) {
                        produced.extend(self.call_store(id, &event));
                    }
                }
            }
            "366" | "324" | "332" | "367" | "471" | "473" | "474" | "475" | "352" => {
                // channel-addressed numeric replies: "<me> <channel> ..."
                if let Some(target) = event.params.split(' ').nth(1) {
                    let key = self.casefold(target);
                    if let Some(&id) = self.privmsg_routes.get(&key) {
                        produced.extend(self.call_store(id, &event));
                    }
                }
            }
            "NICK" | "QUIT" => {
                for id in self.privmsg_like.clone() {
                    produced.extend(self.call_store(id, &event));
                }
            }
            _ => {}
        }

        if let Some(ids) = self.reply_routes.get(&event.command).cloned() {
            for id in ids {
                produced.extend(self.call_store(id, &event));
            }
        }

        // Numerics 400-599 all land on ErrorStore's log/format path, but
        // it only declares "ERROR" as inbound (it has no single numeric
        // to name). Route the whole range to whatever store claimed
        // "ERROR" rather than teaching register_broadcast about ranges.
        if let Ok(n) = event.command.parse::<u16>() {
            if (400..=599).contains(&n) {
                if let Some(ids) = self.reply_routes.get("ERROR").cloned() {
                    for id in ids {
                        produced.extend(self.call_store(id, &event));
                    }
                }
            }
        }

        let mut signals = Vec::new();
        for ev in produced {
            match ev.command.as_str() {
                CLOSE_REQUEST => {
                    if matches!(self.status, status::REGISTERING | status::REGISTERED) {
                        self.set_status(status::CLOSED_SERVER);
                    }
                    signals.push(ev);
                }
                STATUS_NICK_EXHAUSTED => {
                    self.set_status(status::NICK_EXHAUSTED);
                    signals.push(ev);
                }
                _ => signals.push(ev),
            }
        }
        signals
    }

    /// Begin registration: PASS (if set), NICK, USER.
    pub fn connect(&mut self) {
        self.set_status(status::REGISTERING);
        if !self.registration.password.is_empty() {
            self.call_store_generate("PASS", &self.registration.password.clone());
        }
        let nick = self.session.candidates[0].clone();
        self.call_store_generate("NICK", &nick);
        let user_params = format!(
            "{} 0 * :{}",
            self.registration.username, self.registration.realname
        );
        self.call_store_generate("USER", &user_params);
    }

    /// Route a write(2) to whichever session-global store declares
    /// `verb` as outbound (PASS/NICK/USER/MODE/WHO/WHOIS/MOTD/QUIT/JOIN/PART).
    /// PRIVMSG/NOTICE/TOPIC always address a specific conversation and go
    /// through [`Handler::send_message`] instead; there is no
    /// session-global store declaring them so the search below would
    /// find nothing anyway, but the early return keeps that explicit.
    fn call_store_generate(&mut self, verb: &str, params: &str) {
        if matches!(verb, "PRIVMSG" | "NOTICE" | "TOPIC") {
            return;
        }
        let id = self
            .stores
            .iter()
            .find(|(_, s)| s.declared_outbound().contains(&verb))
            .map(|(&id, _)| id);
        if let Some(id) = id {
            self.call_store_with_generate(id, verb, params);
        }
    }

    fn call_store_with_generate(&mut self, id: u64, verb: &str, params: &str) -> Vec<Event> {
        if let Some(mut store) = self.stores.remove(&id) {
            let out = store.generate(verb, params, &mut self.session);
            self.stores.insert(id, store);
            out
        } else {
            Vec::new()
        }
    }

    /// Send a command through the store that owns `verb` (PING, MODE,
    /// WHOIS, and the other non-conversation commands).
    pub fn send_command(&mut self, verb: &str, params: &str) {
        self.call_store_generate(verb, params);
    }

    /// Write a PRIVMSG/NOTICE to a specific conversation (private nick
    /// or channel), demand-creating the store if needed.
    pub fn send_message(&mut self, target: &str, text: &str, notice: bool) {
        let key = self.casefold(target);
        let id = match self.privmsg_routes.get(&key) {
            Some(&id) => id,
            None => {
                let id = self.next_id();
                let store: Box<dyn Store> = if is_channel(target) {
                    Box::new(ChannelStore::new(id, target))
                } else {
                    Box::new(PrivmsgStore::new(id, target))
                };
                self.privmsg_routes.insert(key, id);
                self.privmsg_like.push(id);
                self.stores.insert(id, store);
                id
            }
        };
        let verb = if notice { "NOTICE" } else { "PRIVMSG" };
        self.call_store_with_generate(id, verb, text);
    }

    pub fn send_notice(&mut self, target: &str, text: &str) {
        self.send_message(target, text, true);
    }

    /// `/commands/raw`: send `line` to the wire verbatim, bypassing every
    /// typed store. [`RawStore`] declares no outbound verbs (there isn't
    /// one to declare), so it can't be found by [`Handler::call_store_generate`]'s
    /// verb search and is instead addressed by name.
    pub fn send_raw(&mut self, line: &str) {
        if let Some(id) = self.get_store_id("raw") {
            let (verb, params) = line.split_once(' ').unwrap_or((line, ""));
            self.call_store_with_generate(id, verb, params);
        }
    }

    /// Create a conversation/channel store without sending anything,
    /// e.g. so the filesystem can `mkdir` a channel before joining it.
    pub fn create_privmsg_store(&mut self, target: &str) -> u64 {
        let key = self.casefold(target);
        if let Some(&id) = self.privmsg_routes.get(&key) {
            return id;
        }
        let id = self.next_id();
        let store: Box<dyn Store> = if is_channel(target) {
            Box::new(ChannelStore::new(id, target))
        } else {
            Box::new(PrivmsgStore::new(id, target))
        };
        self.privmsg_routes.insert(key, id);
        self.privmsg_like.push(id);
        self.stores.insert(id, store);
        id
    }

    pub fn remove_store(&mut self, id: u64) {
        if let Some(mut store) = self.stores.remove(&id) {
            store.on_remove(&mut self.session);
        }
        self.privmsg_like.retain(|&i| i != id);
        self.privmsg_routes.retain(|_, &mut v| v != id);
    }

    pub fn get_store_id(&self, name: &str) -> Option<u64> {
        let key = self.casefold(name);
        self.privmsg_routes.get(&key).copied()
    }

    /// Every non-internal store: (id, name). What the filesystem layer
    /// lists as top-level entries.
    pub fn all_stores(&mut self) -> Vec<(u64, String)> {
        self.stores
            .iter_mut()
            .filter(|(_, s)| !s.internal())
            .map(|(&id, s)| (id, s.name()))
            .collect()
    }

    /// Privmsg/channel conversation stores only: the entries the
    /// filesystem lists at the mount root.
    pub fn conversation_stores(&mut self) -> Vec<(u64, String)> {
        let ids = self.privmsg_like.clone();
        ids.into_iter()
            .filter_map(|id| self.stores.get_mut(&id).map(|s| (id, s.name())))
            .collect()
    }

    /// Protocol-bookkeeping stores that aren't a conversation: what the
    /// filesystem lists under `/info`.
    pub fn info_stores(&mut self) -> Vec<(u64, String)> {
        let conv: std::collections::HashSet<u64> = self.privmsg_like.iter().copied().collect();
        self.stores
            .iter_mut()
            .filter(|(id, s)| !s.internal() && !conv.contains(id))
            .map(|(&id, s)| (id, s.name()))
            .collect()
    }

    /// `mkdir /names/<#chan>`: demand-create the channel store and issue
    /// the wire JOIN, mirroring `ensure_demand_store` + `connect`'s own
    /// send-through-the-declaring-store path.
    pub fn join_channel(&mut self, channel: &str) {
        self.create_privmsg_store(channel);
        self.call_store_generate("JOIN", channel);
    }

    fn channel_store(&self, channel: &str) -> Option<&ChannelStore> {
        let key = self.casefold(channel);
        let id = self.privmsg_routes.get(&key)?;
        self.stores.get(id)?.as_any().downcast_ref::<ChannelStore>()
    }

    /// Sorted member nicks for `/names/<#chan>/`.
    pub fn channel_members(&self, channel: &str) -> Option<Vec<String>> {
        let c = self.channel_store(channel)?;
        let mut names: Vec<String> = c.members.keys().cloned().collect();
        names.sort();
        Some(names)
    }

    /// Synthesized `/names/<#chan>/<nick>` file contents.
    pub fn channel_member_info(&self, channel: &str, nick: &str) -> Option<String> {
        let c = self.channel_store(channel)?;
        let m = c.members.get(nick)?;
        Some(format!(
            "nick: {}\nuser: {}\nhost: {}\nserver: {}\nrealname: {}\nhopcount: {}\nop: {}\nvoice: {}\naway: {}\n",
            nick, m.user, m.host, m.server, m.realname, m.hopcount, m.op, m.voice, m.away
        ))
    }

    /// Synthesized `/info/<#chan>` snapshot.
    pub fn channel_snapshot(&self, channel: &str) -> Option<String> {
        let c = self.channel_store(channel)?;
        let mut members: Vec<&String> = c.members.keys().collect();
        members.sort();
        let names: Vec<&str> = members.iter().map(|s| s.as_str()).collect();
        Some(format!(
            "channel: {}\njoined: {}\ntopic: {}\nmode: {}\nmembers: {}\n",
            c.channel(),
            c.joined,
            c.topic,
            c.channelmode,
            names.join(", ")
        ))
    }

    /// Synthesized `/info/status` snapshot.
    pub fn status_snapshot(&self) -> String {
        let label = match self.status {
            status::DISCONNECTED => "not-connected",
            status::REGISTERING => "socket-open",
            status::REGISTERED => "connected",
            status::CLOSED_OK => "user-disconnect",
            status::CLOSED_SERVER => "peer-reset",
            status::CONNECT_FAILED => "connect-failure",
            status::REGISTRATION_FAILED => "registration-failure",
            status::NICK_EXHAUSTED => "all-nicks-in-use",
            status::BAD_PASSWORD => "bad-password",
            _ => "unknown",
        };
        format!("status: {} ({})\nnickname: {}\n", self.status, label, self.session.nickname)
    }

    pub fn store_contents(&mut self, id: u64) -> Option<String> {
        self.stores.get_mut(&id).map(|s| s.contents())
    }

    pub fn store_size(&mut self, id: u64) -> Option<u64> {
        self.stores.get_mut(&id).map(|s| s.size())
    }

    /// Unix seconds of a store's first event, for the filesystem's `ctime`.
    pub fn store_ctime(&mut self, id: u64) -> Option<u64> {
        self.stores.get_mut(&id).and_then(|s| s.ctime())
    }

    /// Unix seconds of a store's most recent event, for the filesystem's
    /// `mtime`/`atime`.
    pub fn store_mtime(&mut self, id: u64) -> Option<u64> {
        self.stores.get_mut(&id).and_then(|s| s.mtime())
    }

    /// Unix seconds `status` was last assigned, for `/info/status`.
    pub fn status_changed_at(&self) -> u64 {
        self.status_changed_at
    }

    pub fn nickname(&self) -> &str {
        &self.session.nickname
    }

    /// Drain whatever lines stores have queued since the last call. The
    /// connection's send loop is the only consumer.
    pub fn drain_outbound(&mut self) -> VecDeque<String> {
        std::mem::take(&mut self.session.pending_out)
    }

    /// How many lines are queued waiting for the I/O thread to pick
    /// them up. The filesystem's write-path backpressure pause uses
    /// this as a proxy for the Connection's own (not lock-visible from
    /// here) outbound queue depth.
    pub fn pending_outbound_len(&self) -> usize {
        self.session.pending_out.len()
    }

    /// Broadcast a disconnect to every store so QUIT/PART-like cleanup
    /// can run, then move to the closed status the caller determined.
    pub fn receive_status(&mut self, new_status: u16) {
        self.set_status(new_status);
        let ids: Vec<u64> = self.stores.keys().copied().collect();
        let ev = Event::informational("DISCONNECT", "");
        for id in ids {
            self.call_store(id, &ev);
        }
    }

    /// Drop every per-conversation store (channels, private chats) and
    /// go back to the pre-registration state, so a fresh `connect()`
    /// starts from a clean slate. Protocol-bookkeeping stores (ping,
    /// nick, quit, ...) are reused across reconnects.
    pub fn reconnect(&mut self) {
        self.set_status(status::DISCONNECTED);
        for id in self.privmsg_like.drain(..) {
            self.stores.remove(&id);
        }
        self.privmsg_routes.clear();
        self.session.pending_out.clear();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn connect_emits_pass_nick_user_in_order() {
        let mut h = Handler::new("bob", "bob_", "bobuser", "Bob Realname", "secret");
        h.connect();
        let out: Vec<String> = h.drain_outbound().into_iter().collect();
        assert_eq!(out[0], "PASS secret");
        assert_eq!(out[1], "NICK bob");
        assert!(out[2].starts_with("USER bobuser 0 * :Bob Realname"));
    }

    #[test]
    fn ping_gets_auto_ponged() {
        let mut h = Handler::new("bob", "", "bobuser", "Bob", "");
        h.connect();
        h.drain_outbound();
        h.on_line(b"PING :server.example");
        let out: Vec<String> = h.drain_outbound().into_iter().collect();
        assert_eq!(out, vec!["PONG :server.example".to_string()]);
    }

    #[test]
    fn privmsg_demand_creates_store_before_dispatch() {
        let mut h = Handler::new("bob", "", "bobuser", "Bob", "");
        h.on_line(b":alice!u@h PRIVMSG bob :hello");
        let id = h.get_store_id("alice").expect("store created");
        let contents = h.store_contents(id).unwrap();
        assert!(contents.contains("hello"));
    }

    #[test]
    fn join_creates_channel_store_before_routing() {
        let mut h = Handler::new("bob", "", "bobuser", "Bob", "");
        h.on_line(b":bob!u@h JOIN :#chan");
        let id = h.get_store_id("#chan").expect("channel store created");
        assert!(h.store_contents(id).is_some());
    }

    #[test]
    fn nick_collision_exhaustion_sets_status() {
        let mut h = Handler::new("bob", "bob_", "bobuser", "Bob", "");
        h.connect();
        h.drain_outbound();
        h.on_line(b":irc.example 433 * bob :Nickname is already in use.");
        h.drain_outbound();
        h.on_line(b":irc.example 433 * bob_ :Nickname is already in use.");
        assert_eq!(h.status, status::NICK_EXHAUSTED);
    }
}
