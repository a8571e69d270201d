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

//! `USER` and `PASS`: fired once during registration, never surfaced as
//! files, and carrying no inbound traffic of their own.

use crate::irc::event::{Event, EventLog};
use crate::irc::store::{Sink, Store};

pub struct UserStore {
    log: EventLog,
}

impl UserStore {
    pub fn new(id: u64) -> UserStore {
        UserStore {
            log: EventLog::new(id, "user"),
        }
    }
}

impl Store for UserStore {
    fn declared_inbound(&self) -> &'static [&'static str] {
        &[]
    }
    fn declared_outbound(&self) -> &'static [&'static str] {
        &["USER"]
    }
    fn on_event(&mut self, _event: &Event, _sink: &mut dyn Sink) -> Vec<Event> {
        Vec::new()
    }
    fn generate(&mut self, _verb: &str, params: &str, sink: &mut dyn Sink) -> Vec<Event> {
        sink.send_line(&format!("USER {}", params));
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

pub struct PassStore {
    log: EventLog,
}

impl PassStore {
    pub fn new(id: u64) -> PassStore {
        PassStore {
            log: EventLog::new(id, "pass"),
        }
    }
}

impl Store for PassStore {
    fn declared_inbound(&self) -> &'static [&'static str] {
        &[]
    }
    fn declared_outbound(&self) -> &'static [&'static str] {
        &["PASS"]
    }
    fn on_event(&mut self, _event: &Event, _sink: &mut dyn Sink) -> Vec<Event> {
        Vec::new()
    }
    fn generate(&mut self, _verb: &str, params: &str, sink: &mut dyn Sink) -> Vec<Event> {
        sink.send_line(&format!("PASS {}", params));
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
