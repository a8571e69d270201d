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

/// Split a PART/JOIN-style params string (`"#a,#b,#c :reason"`) into the
/// list of channel names and whatever trailing reason followed.
pub fn splitparams(params: &str) -> (Vec<String>, String) {
    let (chanlist, reason) = match params.find(" :") {
        Some(idx) => (&params[..idx], &params[idx + 2..]),
        None => match params.strip_prefix(':') {
            Some(rest) => ("", rest),
            None => (params, ""),
        },
    };
    let channels = chanlist
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    (channels, reason.to_string())
}

pub struct PartStore {
    log: EventLog,
}

impl PartStore {
    pub fn new(id: u64) -> PartStore {
        PartStore {
            log: EventLog::new(id, "part"),
        }
    }
}

impl Store for PartStore {
    fn declared_inbound(&self) -> &'static [&'static str] {
        &["PART"]
    }
    fn declared_outbound(&self) -> &'static [&'static str] {
        &["PART"]
    }

    fn on_event(&mut self, event: &Event, _sink: &mut dyn Sink) -> Vec<Event> {
        self.log.push(event.clone());
        Vec::new()
    }

    fn generate(&mut self, _verb: &str, params: &str, sink: &mut dyn Sink) -> Vec<Event> {
        let (channels, reason) = splitparams(params);
        let line = if reason.is_empty() {
            format!("PART {}", channels.join(","))
        } else {
            format!("PART {} :{}", channels.join(","), reason)
        };
        sink.send_line(&line);
        let e = Event::generate(sink.nickname(), "PART", params);
        self.log.push(e.clone());
        vec![e]
    }

    fn format(&self, event: &Event) -> String {
        let (channels, reason) = splitparams(&event.params);
        format!("{} left {} ({})\n", event.prefix, channels.join(","), reason)
    }

    fn log(&mut self) -> &mut EventLog {
        &mut self.log
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn split_multiple_channels_with_reason() {
        let (chans, reason) = splitparams("#a,#b,#c :goodbye");
        assert_eq!(chans, vec!["#a", "#b", "#c"]);
        assert_eq!(reason, "goodbye");
    }

    #[test]
    fn split_no_reason() {
        let (chans, reason) = splitparams("#a,#b");
        assert_eq!(chans, vec!["#a", "#b"]);
        assert_eq!(reason, "");
    }
}
