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

//! The socket side of a session: line framing off the wire, and a
//! flood-gated priority queue going out. Nothing in here knows about
//! IRC semantics beyond PING/PONG/QUIT getting to jump the queue.

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::net::ToSocketAddrs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use mio::net::TcpStream;

use crate::irc::iter::{BufIterator, TruncStatus};

/// How far into the future the flood gate lets the allowance cursor run
/// before it stops draining the queue.
const FLOOD_BURST: Duration = Duration::from_secs(8);
/// Per-line cost charged against the allowance after it's sent.
const FLOOD_BASE_COST: Duration = Duration::from_millis(2100);
/// Extra cost per 120 bytes of line length.
const FLOOD_BYTES_PER_SEC: usize = 120;
/// RFC 2812's 512-byte message limit, minus 2 bytes for the CRLF this
/// layer always appends itself.
const MAX_LINE_BYTES: usize = 510;

pub enum ReadStat {
    Okay,
    Blocked,
    Eof,
}

pub enum WriteStat {
    Okay,
    Blocked,
    Idle,
}

fn open_conn(conn_str: &str) -> io::Result<TcpStream> {
    let mut conn_details = conn_str.to_socket_addrs()?;
    let mut last_err = io::Error::new(io::ErrorKind::Other, "no addresses resolved");
    loop {
        match conn_details.next() {
            Some(addr) => match TcpStream::connect(addr) {
                Ok(conn) => return Ok(conn),
                Err(e) => last_err = e,
            },
            None => return Err(last_err),
        }
    }
}

/// A connected socket, the partially-read line buffer, and the
/// flood-gated outbound queue. Owned by the Mutex-guarded `Handler` the
/// rest of the session lives in; the I/O thread only ever touches it
/// while holding that lock, and only for as long as a single
/// read-or-write syscall takes.
pub struct Connection {
    stream: TcpStream,
    read_buf: Vec<u8>,
    out_queue: VecDeque<Vec<u8>>,
    write_buf: Vec<u8>,
    write_pos: usize,
    allowance: Instant,
    closed: Arc<AtomicBool>,
}

impl Connection {
    pub fn connect(server: &str) -> io::Result<Connection> {
        let stream = open_conn(server)?;
        Ok(Connection {
            stream,
            read_buf: Vec::with_capacity(4096),
            out_queue: VecDeque::new(),
            write_buf: Vec::new(),
            write_pos: 0,
            allowance: Instant::now(),
            closed: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn stream_mut(&mut self) -> &mut TcpStream {
        &mut self.stream
    }

    /// Queue a raw line (no CRLF). PING/PONG/QUIT jump to the front so
    /// keepalive traffic and a graceful exit aren't stuck behind a
    /// flood-gated backlog.
    pub fn enqueue(&mut self, line: &str) {
        if self.out_queue.is_empty() {
            self.allowance = Instant::now();
        }
        let verb = line.split(' ').next().unwrap_or("");
        let mut bytes = line.as_bytes().to_vec();
        bytes.truncate(MAX_LINE_BYTES);
        if matches!(verb, "PING" | "PONG" | "QUIT") {
            self.out_queue.push_front(bytes);
        } else {
            self.out_queue.push_back(bytes);
        }
    }

    /// Read whatever is available and return complete lines (without
    /// CRLF). Empty return with `ReadStat::Okay` just means "nothing
    /// terminated yet, keep polling".
    pub fn receive_lines(&mut self) -> io::Result<(Vec<Vec<u8>>, ReadStat)> {
        let mut chunk = [0u8; 4096];
        match self.stream.read(&mut chunk) {
            Ok(0) => Ok((self.drain_lines(), ReadStat::Eof)),
            Ok(n) => {
                self.read_buf.extend_from_slice(&chunk[..n]);
                Ok((self.drain_lines(), ReadStat::Okay))
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                Ok((Vec::new(), ReadStat::Blocked))
            }
            Err(e) => Err(e),
        }
    }

    fn drain_lines(&mut self) -> Vec<Vec<u8>> {
        let mut lines = Vec::new();
        let mut trailing_partial_len = None;
        for item in BufIterator::new(&self.read_buf) {
            match item {
                TruncStatus::Full(x) => lines.push(x.to_vec()),
                TruncStatus::Part(x) => trailing_partial_len = Some(x.len()),
            }
        }
        let consumed = match trailing_partial_len {
            Some(plen) => self.read_buf.len() - plen,
            None => self.read_buf.len(),
        };
        self.read_buf.drain(..consumed);
        lines
    }

    /// Push as much of the flood-gated queue to the socket as the
    /// allowance and a non-blocking write allow.
    pub fn pump_outbound(&mut self) -> io::Result<WriteStat> {
        loop {
            if self.write_pos < self.write_buf.len() {
                match self.stream.write(&self.write_buf[self.write_pos..]) {
                    Ok(0) => return Ok(WriteStat::Blocked),
                    Ok(n) => {
                        self.write_pos += n;
                        if self.write_pos >= self.write_buf.len() {
                            self.write_buf.clear();
                            self.write_pos = 0;
                        }
                        continue;
                    }
                    Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                        return Ok(WriteStat::Blocked)
                    }
                    Err(e) => return Err(e),
                }
            }

            if self.allowance >= Instant::now() + FLOOD_BURST {
                return Ok(WriteStat::Idle);
            }
            let line = match self.out_queue.pop_front() {
                Some(l) => l,
                None => return Ok(WriteStat::Idle),
            };
            self.allowance += FLOOD_BASE_COST
                + Duration::from_secs_f64(line.len() as f64 / FLOOD_BYTES_PER_SEC as f64);
            self.write_buf.extend_from_slice(&line);
            self.write_buf.extend_from_slice(b"\r\n");
            let _ = WriteStat::Okay;
        }
    }

    pub fn has_pending_output(&self) -> bool {
        !self.out_queue.is_empty() || self.write_pos < self.write_buf.len()
    }

    /// Latch the connection closed. Returns `true` the first time it's
    /// called so the caller reports status 100 exactly once regardless
    /// of whether the EOF was noticed by the read path or the write path.
    pub fn close(&self) -> bool {
        self.closed
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Write as _;
    use std::net::TcpListener;
    use std::thread::spawn;

    #[test]
    fn connect_and_roundtrip_a_line() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let server = spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            stream.write_all(b"PING :abc\r\n").unwrap();
            let mut buf = [0u8; 64];
            let n = stream.read(&mut buf).unwrap();
            assert_eq!(&buf[..n], b"PONG :abc\r\n");
        });

        let mut conn = Connection::connect(&addr.to_string()).unwrap();
        // block briefly for the server's write to land; std socket is
        // blocking by default for this test since it never registers
        // with mio.
        std::thread::sleep(Duration::from_millis(50));
        let (lines, _) = conn.receive_lines().unwrap();
        assert_eq!(lines, vec![b"PING :abc".to_vec()]);

        conn.enqueue("PONG :abc");
        conn.pump_outbound().unwrap();
        server.join().unwrap();
    }

    #[test]
    fn close_latch_fires_once() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let _server = spawn(move || {
            let _ = listener.accept().unwrap();
        });
        let conn = Connection::connect(&addr.to_string()).unwrap();
        assert!(conn.close());
        assert!(!conn.close());
    }

    #[test]
    fn priority_commands_jump_the_queue() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let _server = spawn(move || {
            let _ = listener.accept().unwrap();
        });
        let mut conn = Connection::connect(&addr.to_string()).unwrap();
        conn.enqueue("PRIVMSG #chan :hi");
        conn.enqueue("QUIT :bye");
        assert_eq!(conn.out_queue.front().unwrap(), b"QUIT :bye");
    }

    #[test]
    fn oversized_line_is_truncated_to_510_bytes() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let _server = spawn(move || {
            let _ = listener.accept().unwrap();
        });
        let mut conn = Connection::connect(&addr.to_string()).unwrap();
        let payload = "a".repeat(600);
        conn.enqueue(&format!("PRIVMSG #chan :{}", payload));
        let queued = conn.out_queue.back().unwrap();
        assert_eq!(queued.len(), 510);
    }
}
