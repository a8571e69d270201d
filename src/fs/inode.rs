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

//! fuser addresses everything by inode number; the session model
//! addresses everything by name (a store id, a channel name, a command
//! verb). [`PathTable`] is the bijection between the two, built lazily
//! as the kernel looks entries up.

use std::collections::HashMap;

pub const ROOT_INO: u64 = 1;
const FIRST_DYNAMIC_INO: u64 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Entry {
    Root,
    CommandsDir,
    InfoDir,
    NamesDir,
    /// A privmsg or channel store, listed at the mount root.
    Conversation(String),
    /// `/commands/<verb>`.
    Command(String),
    /// `/info/<name>` — a bookkeeping store's log, `status`, or a
    /// channel's synthesized snapshot.
    Info(String),
    /// `/names/<#chan>`.
    NamesChanDir(String),
    /// `/names/<#chan>/<nick>`.
    NamesMember(String, String),
}

pub struct PathTable {
    by_ino: HashMap<u64, Entry>,
    by_entry: HashMap<Entry, u64>,
    next: u64,
}

impl PathTable {
    pub fn new() -> PathTable {
        let mut t = PathTable {
            by_ino: HashMap::new(),
            by_entry: HashMap::new(),
            next: FIRST_DYNAMIC_INO,
        };
        t.put(ROOT_INO, Entry::Root);
        t.put(2, Entry::CommandsDir);
        t.put(3, Entry::InfoDir);
        t.put(4, Entry::NamesDir);
        t
    }

    fn put(&mut self, ino: u64, entry: Entry) {
        self.by_entry.insert(entry.clone(), ino);
        self.by_ino.insert(ino, entry);
    }

    pub fn entry(&self, ino: u64) -> Option<&Entry> {
        self.by_ino.get(&ino)
    }

    /// Look up the inode for `entry`, assigning a fresh one the first
    /// time it's seen. Static directories always keep their fixed
    /// numbers from [`PathTable::new`].
    pub fn intern(&mut self, entry: Entry) -> u64 {
        if let Some(&ino) = self.by_entry.get(&entry) {
            return ino;
        }
        let ino = self.next;
        self.next += 1;
        self.put(ino, entry);
        ino
    }
}
