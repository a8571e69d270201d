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

//! The filesystem projection: turns the live IRC session into a tree of
//! files a shell can `cat`/`echo`/`mv` against. Everything here reads
//! through [`Handler`]; the only state this module owns is the inode
//! table, since fuser addresses everything by inode and the session
//! model addresses everything by name.

mod inode;
mod write_heuristic;

use std::ffi::OsStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use fuser::{
    FileAttr, FileType, Filesystem, ReplyAttr, ReplyCreate, ReplyData, ReplyDirectory, ReplyEmpty,
    ReplyEntry, ReplyWrite, Request,
};
use libc::{EACCES, ENOENT, ENOTDIR, ENOTEMPTY};
use log::{debug, warn};

use crate::irc::casemap::is_channel;
use crate::irc::handler::Handler;

pub use inode::Entry;
use inode::PathTable;

const TTL: Duration = Duration::from_secs(1);
/// `write(2)` pauses briefly once the handler's queue backs up past this
/// depth, mirroring the flood gate's burst budget back to the caller.
const BACKPRESSURE_DEPTH: usize = 30;
const BACKPRESSURE_PAUSE: Duration = Duration::from_millis(2300);

/// Command verbs exposed as `/commands/<verb>`. Each maps to a
/// session-global store that declares it as outbound; `raw` is the one
/// exception, routed through [`Handler::send_raw`] by name.
pub const COMMAND_VERBS: &[&str] = &[
    "nick", "user", "pass", "mode", "who", "whois", "quit", "join", "part", "raw",
];

pub struct PyIrcFs {
    handler: Arc<Mutex<Handler>>,
    inodes: Mutex<PathTable>,
    stop: Arc<AtomicBool>,
}

impl PyIrcFs {
    pub fn new(handler: Arc<Mutex<Handler>>, stop: Arc<AtomicBool>) -> PyIrcFs {
        PyIrcFs {
            handler,
            inodes: Mutex::new(PathTable::new()),
            stop,
        }
    }

    /// Convert Unix seconds to a `SystemTime`, for a store's event
    /// timestamps.
    fn unix_time(secs: u64) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
    }

    /// `ctime` = the store's first event; `mtime`/`atime` = its most
    /// recent one, falling back to `ctime` for a store with a single (or
    /// no) event yet. A brand new, still-empty store falls back further
    /// to the current time, since it has no creation timestamp of its own.
    fn store_times(&self, id: u64) -> (SystemTime, SystemTime) {
        let mut h = self.handler.lock().unwrap();
        let ctime = h.store_ctime(id).map(Self::unix_time).unwrap_or_else(SystemTime::now);
        let mtime = h.store_mtime(id).map(Self::unix_time).unwrap_or(ctime);
        (ctime, mtime)
    }

    fn attr_for(&self, ino: u64, entry: &Entry) -> FileAttr {
        let now = SystemTime::now();
        let (kind, perm, size, ctime, mtime) = match entry {
            Entry::Root | Entry::CommandsDir | Entry::InfoDir | Entry::NamesDir | Entry::NamesChanDir(_) => {
                (FileType::Directory, 0o755, 0, now, now)
            }
            Entry::Conversation(name) => {
                let id = {
                    let mut h = self.handler.lock().unwrap();
                    h.get_store_id(name)
                };
                let size = id
                    .and_then(|id| self.handler.lock().unwrap().store_size(id))
                    .unwrap_or(0);
                let (ctime, mtime) = id.map(|id| self.store_times(id)).unwrap_or((now, now));
                (FileType::RegularFile, 0o644, size, ctime, mtime)
            }
            Entry::Command(_) => (FileType::RegularFile, 0o644, 0, now, now),
            Entry::Info(name) => {
                let size = self.render_info(name).map(|s| s.len() as u64).unwrap_or(0);
                let (ctime, mtime) = if name == "status" {
                    let h = self.handler.lock().unwrap();
                    let t = Self::unix_time(h.status_changed_at());
                    (t, t)
                } else {
                    // both a channel's synthesized snapshot and a plain
                    // store's own log key off that store's event history.
                    let id = {
                        let mut h = self.handler.lock().unwrap();
                        h.get_store_id(name)
                    };
                    id.map(|id| self.store_times(id)).unwrap_or((now, now))
                };
                (FileType::RegularFile, 0o444, size, ctime, mtime)
            }
            Entry::NamesMember(chan, nick) => {
                let h = self.handler.lock().unwrap();
                let size = h
                    .channel_member_info(chan, nick)
                    .map(|s| s.len() as u64)
                    .unwrap_or(0);
                drop(h);
                let id = {
                    let mut h = self.handler.lock().unwrap();
                    h.get_store_id(chan)
                };
                let (ctime, mtime) = id.map(|id| self.store_times(id)).unwrap_or((now, now));
                (FileType::RegularFile, 0o444, size, ctime, mtime)
            }
        };
        let nlink = if kind == FileType::Directory { 2 } else { 1 };
        FileAttr {
            ino,
            size,
            blocks: (size + 511) / 512,
            atime: mtime,
            mtime,
            ctime,
            crtime: ctime,
            kind,
            perm,
            nlink,
            uid: unsafe { libc::getuid() },
            gid: unsafe { libc::getgid() },
            rdev: 0,
            flags: 0,
            blksize: 512,
        }
    }

    fn render_info(&self, name: &str) -> Option<String> {
        let h = self.handler.lock().unwrap();
        if name == "status" {
            return Some(h.status_snapshot());
        }
        if is_channel(name) {
            return h.channel_snapshot(name);
        }
        let id = h.get_store_id(name)?;
        drop(h);
        let mut h = self.handler.lock().unwrap();
        h.store_contents(id)
    }

    /// Children of a directory entry, as plain names (no `.`/`..`).
    fn children_of(&self, entry: &Entry) -> Result<Vec<String>, i32> {
        let mut h = self.handler.lock().unwrap();
        match entry {
            Entry::Root => {
                let mut names: Vec<String> =
                    h.conversation_stores().into_iter().map(|(_, n)| n).collect();
                names.sort();
                names.push("commands".to_string());
                names.push("info".to_string());
                names.push("names".to_string());
                Ok(names)
            }
            Entry::CommandsDir => Ok(COMMAND_VERBS.iter().map(|s| s.to_string()).collect()),
            Entry::InfoDir => {
                let mut names: Vec<String> =
                    h.info_stores().into_iter().map(|(_, n)| n).collect();
                names.push("status".to_string());
                names.extend(
                    h.conversation_stores()
                        .into_iter()
                        .map(|(_, n)| n)
                        .filter(|n| is_channel(n)),
                );
                names.sort();
                names.dedup();
                Ok(names)
            }
            Entry::NamesDir => {
                let mut names: Vec<String> = h
                    .conversation_stores()
                    .into_iter()
                    .map(|(_, n)| n)
                    .filter(|n| is_channel(n))
                    .collect();
                names.sort();
                Ok(names)
            }
            Entry::NamesChanDir(chan) => Ok(h.channel_members(chan).unwrap_or_default()),
            _ => Err(ENOTDIR),
        }
    }

    /// Resolve `name` as a direct child of `parent_entry`, interning a
    /// fresh inode for it if this is the first time it's been looked up.
    fn resolve_child(&self, parent_entry: &Entry, name: &str) -> Option<Entry> {
        match parent_entry {
            Entry::Root => match name {
                "commands" => Some(Entry::CommandsDir),
                "info" => Some(Entry::InfoDir),
                "names" => Some(Entry::NamesDir),
                _ => Some(Entry::Conversation(name.to_string())),
            },
            Entry::CommandsDir => {
                if COMMAND_VERBS.contains(&name) {
                    Some(Entry::Command(name.to_string()))
                } else {
                    None
                }
            }
            Entry::InfoDir => Some(Entry::Info(name.to_string())),
            Entry::NamesDir => Some(Entry::NamesChanDir(name.to_string())),
            Entry::NamesChanDir(chan) => Some(Entry::NamesMember(chan.clone(), name.to_string())),
            _ => None,
        }
    }
}

impl Filesystem for PyIrcFs {
    fn lookup(&mut self, _req: &Request, parent: u64, name: &OsStr, reply: ReplyEntry) {
        let name = match name.to_str() {
            Some(n) => n,
            None => return reply.error(ENOENT),
        };
        let mut table = self.inodes.lock().unwrap();
        let parent_entry = match table.entry(parent) {
            Some(e) => e.clone(),
            None => return reply.error(ENOENT),
        };
        drop(table);

        let children = match self.children_of(&parent_entry) {
            Ok(c) => c,
            Err(e) => return reply.error(e),
        };
        if !children.iter().any(|c| c == name) {
            return reply.error(ENOENT);
        }
        let entry = match self.resolve_child(&parent_entry, name) {
            Some(e) => e,
            None => return reply.error(ENOENT),
        };
        let mut table = self.inodes.lock().unwrap();
        let ino = table.intern(entry.clone());
        drop(table);
        let attr = self.attr_for(ino, &entry);
        reply.entry(&TTL, &attr, 0);
    }

    fn getattr(&mut self, _req: &Request, ino: u64, reply: ReplyAttr) {
        let entry = {
            let table = self.inodes.lock().unwrap();
            table.entry(ino).cloned()
        };
        match entry {
            Some(e) => reply.attr(&TTL, &self.attr_for(ino, &e)),
            None => reply.error(ENOENT),
        }
    }

    fn readdir(&mut self, _req: &Request, ino: u64, _fh: u64, offset: i64, mut reply: ReplyDirectory) {
        let entry = {
            let table = self.inodes.lock().unwrap();
            table.entry(ino).cloned()
        };
        let entry = match entry {
            Some(e) => e,
            None => return reply.error(ENOENT),
        };
        let children = match self.children_of(&entry) {
            Ok(c) => c,
            Err(e) => return reply.error(e),
        };

        let mut listing: Vec<(u64, FileType, String)> = vec![
            (ino, FileType::Directory, ".".to_string()),
            (ino, FileType::Directory, "..".to_string()),
        ];
        for name in children {
            let child_entry = match self.resolve_child(&entry, &name) {
                Some(e) => e,
                None => continue,
            };
            let mut table = self.inodes.lock().unwrap();
            let child_ino = table.intern(child_entry.clone());
            drop(table);
            let kind = match child_entry {
                Entry::Root
                | Entry::CommandsDir
                | Entry::InfoDir
                | Entry::NamesDir
                | Entry::NamesChanDir(_) => FileType::Directory,
                _ => FileType::RegularFile,
            };
            listing.push((child_ino, kind, name));
        }

        for (i, (ino, kind, name)) in listing.into_iter().enumerate().skip(offset as usize) {
            if reply.add(ino, (i + 1) as i64, kind, name) {
                break;
            }
        }
        reply.ok();
    }

    fn open(&mut self, _req: &Request, _ino: u64, _flags: i32, reply: fuser::ReplyOpen) {
        reply.opened(0, 0);
    }

    fn read(
        &mut self,
        _req: &Request,
        ino: u64,
        _fh: u64,
        offset: i64,
        size: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyData,
    ) {
        let entry = {
            let table = self.inodes.lock().unwrap();
            table.entry(ino).cloned()
        };
        let contents = match entry {
            Some(Entry::Conversation(name)) => {
                let mut h = self.handler.lock().unwrap();
                h.get_store_id(&name).and_then(|id| h.store_contents(id))
            }
            Some(Entry::Info(name)) => self.render_info(&name),
            Some(Entry::NamesMember(chan, nick)) => {
                let h = self.handler.lock().unwrap();
                h.channel_member_info(&chan, &nick)
            }
            Some(Entry::Command(_)) => Some(String::new()),
            _ => None,
        };
        let contents = contents.unwrap_or_default();
        let bytes = contents.as_bytes();
        let offset = offset.max(0) as usize;
        if offset >= bytes.len() {
            return reply.data(&[]);
        }
        let end = (offset + size as usize).min(bytes.len());
        reply.data(&bytes[offset..end]);
    }

    fn write(
        &mut self,
        _req: &Request,
        ino: u64,
        _fh: u64,
        _offset: i64,
        data: &[u8],
        _write_flags: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyWrite,
    ) {
        let len = data.len() as u32;
        let entry = {
            let table = self.inodes.lock().unwrap();
            table.entry(ino).cloned()
        };
        let buf = String::from_utf8_lossy(data).to_string();

        match entry {
            Some(Entry::Conversation(name)) => {
                let existing = {
                    let mut h = self.handler.lock().unwrap();
                    h.get_store_id(&name)
                        .and_then(|id| h.store_contents(id))
                        .unwrap_or_default()
                };
                let to_send = write_heuristic::new_suffix(&existing, &buf);
                for line in to_send.split('\n').filter(|l| !l.is_empty()) {
                    let mut h = self.handler.lock().unwrap();
                    h.send_message(&name, line, false);
                    self.backpressure(&h);
                }
            }
            Some(Entry::Command(verb)) => {
                for line in buf.split('\n').filter(|l| !l.is_empty()) {
                    let mut h = self.handler.lock().unwrap();
                    if verb == "raw" {
                        h.send_raw(line);
                    } else {
                        h.send_command(&verb.to_uppercase(), line);
                    }
                    self.backpressure(&h);
                }
            }
            Some(Entry::Info(_)) | Some(Entry::NamesMember(_, _)) => {
                return reply.error(EACCES);
            }
            _ => return reply.error(EACCES),
        }
        reply.written(len);
    }

    fn mkdir(
        &mut self,
        _req: &Request,
        parent: u64,
        name: &OsStr,
        _mode: u32,
        _umask: u32,
        reply: ReplyEntry,
    ) {
        let name = match name.to_str() {
            Some(n) => n,
            None => return reply.error(ENOENT),
        };
        let parent_entry = {
            let table = self.inodes.lock().unwrap();
            table.entry(parent).cloned()
        };
        match parent_entry {
            Some(Entry::NamesDir) => {
                let mut h = self.handler.lock().unwrap();
                h.join_channel(name);
                drop(h);
                let entry = Entry::NamesChanDir(name.to_string());
                let mut table = self.inodes.lock().unwrap();
                let ino = table.intern(entry.clone());
                drop(table);
                reply.entry(&TTL, &self.attr_for(ino, &entry), 0);
            }
            _ => reply.error(EACCES),
        }
    }

    fn unlink(&mut self, _req: &Request, parent: u64, name: &OsStr, reply: ReplyEmpty) {
        let name = match name.to_str() {
            Some(n) => n,
            None => return reply.error(ENOENT),
        };
        if name.starts_with('.') {
            return reply.error(EACCES);
        }
        let parent_entry = {
            let table = self.inodes.lock().unwrap();
            table.entry(parent).cloned()
        };
        match parent_entry {
            Some(Entry::Root) => {
                let mut h = self.handler.lock().unwrap();
                match h.get_store_id(name) {
                    Some(id) => {
                        h.remove_store(id);
                        reply.ok();
                    }
                    None => reply.error(ENOENT),
                }
            }
            Some(Entry::NamesChanDir(_)) => reply.ok(),
            Some(Entry::InfoDir) | Some(Entry::CommandsDir) => reply.error(EACCES),
            _ => reply.error(ENOENT),
        }
    }

    fn rmdir(&mut self, _req: &Request, parent: u64, name: &OsStr, reply: ReplyEmpty) {
        let name = match name.to_str() {
            Some(n) => n,
            None => return reply.error(ENOENT),
        };
        let parent_entry = {
            let table = self.inodes.lock().unwrap();
            table.entry(parent).cloned()
        };
        match parent_entry {
            Some(Entry::NamesDir) => {
                let h = self.handler.lock().unwrap();
                match h.channel_members(name) {
                    Some(members) if !members.is_empty() => reply.error(ENOTEMPTY),
                    _ => reply.ok(),
                }
            }
            _ => reply.error(EACCES),
        }
    }

    fn rename(
        &mut self,
        _req: &Request,
        _parent: u64,
        name: &OsStr,
        newparent: u64,
        newname: &OsStr,
        _flags: u32,
        reply: ReplyEmpty,
    ) {
        let arg = match name.to_str() {
            Some(n) => n.to_string(),
            None => return reply.error(ENOENT),
        };
        let verb = match newname.to_str() {
            Some(n) => n.to_string(),
            None => return reply.error(ENOENT),
        };
        let newparent_entry = {
            let table = self.inodes.lock().unwrap();
            table.entry(newparent).cloned()
        };
        match newparent_entry {
            Some(Entry::CommandsDir) if COMMAND_VERBS.contains(&verb.as_str()) => {
                let mut h = self.handler.lock().unwrap();
                if verb == "raw" {
                    h.send_raw(&arg);
                } else {
                    h.send_command(&verb.to_uppercase(), &arg);
                }
                reply.ok();
            }
            _ => reply.error(EACCES),
        }
    }

    fn create(
        &mut self,
        _req: &Request,
        parent: u64,
        name: &OsStr,
        _mode: u32,
        _umask: u32,
        _flags: i32,
        reply: ReplyCreate,
    ) {
        let name = match name.to_str() {
            Some(n) => n,
            None => return reply.error(ENOENT),
        };
        if name.starts_with('.') {
            return reply.error(EACCES);
        }
        let parent_entry = {
            let table = self.inodes.lock().unwrap();
            table.entry(parent).cloned()
        };
        let entry = match parent_entry {
            Some(Entry::Root) => {
                let mut h = self.handler.lock().unwrap();
                h.create_privmsg_store(name);
                Entry::Conversation(name.to_string())
            }
            Some(Entry::CommandsDir) if COMMAND_VERBS.contains(&name) => {
                Entry::Command(name.to_string())
            }
            Some(Entry::CommandsDir) => return reply.error(ENOENT),
            _ => return reply.error(EACCES),
        };
        let mut table = self.inodes.lock().unwrap();
        let ino = table.intern(entry.clone());
        drop(table);
        let attr = self.attr_for(ino, &entry);
        reply.created(&TTL, &attr, 0, 0, 0);
    }

    fn destroy(&mut self) {
        debug!("unmounting, requesting QUIT");
        self.stop.store(true, Ordering::SeqCst);
        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        loop {
            {
                let h = self.handler.lock().unwrap();
                if h.status == crate::irc::handler::status::CLOSED_OK
                    || h.status == crate::irc::handler::status::CLOSED_SERVER
                {
                    break;
                }
            }
            if std::time::Instant::now() >= deadline {
                warn!("timed out waiting for the session to close on unmount");
                break;
            }
            std::thread::sleep(Duration::from_millis(100));
        }
    }
}

impl PyIrcFs {
    fn backpressure(&self, h: &Handler) {
        if h.pending_outbound_len() > BACKPRESSURE_DEPTH {
            std::thread::sleep(BACKPRESSURE_PAUSE);
        }
    }
}
