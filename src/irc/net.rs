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

//! The I/O thread: a single mio poll loop that owns the socket, feeds
//! wire lines into the lock-guarded [`Handler`] and drains whatever the
//! handler queued back out. The lock is only ever held for the length
//! of a dispatch or a queue drain, never across `poll.poll()` itself.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{debug, info, warn};
use mio::{Events, Interest, Poll, Token};

use crate::irc::connection::{Connection, ReadStat, WriteStat};
use crate::irc::handler::{status, Handler};

const IRC_CONN: Token = Token(0);
const POLL_TIMEOUT: Duration = Duration::from_millis(200);

/// Connect, register, and pump the session until EOF, a protocol-level
/// close request, or `stop` is raised by the filesystem side (unmount).
pub fn event_loop(
    handler: Arc<Mutex<Handler>>,
    server: &str,
    stop: Arc<AtomicBool>,
) -> io::Result<()> {
    let mut conn = Connection::connect(server)?;
    let mut poll = Poll::new()?;
    let mut events = Events::with_capacity(128);

    poll.registry().register(
        conn.stream_mut(),
        IRC_CONN,
        Interest::READABLE | Interest::WRITABLE,
    )?;

    {
        let mut h = handler.lock().unwrap();
        h.connect();
    }
    info!("connecting to {}", server);

    'outer: loop {
        if stop.load(Ordering::SeqCst) {
            send_quit(&handler, &mut conn);
            let _ = conn.pump_outbound();
            break;
        }

        poll.poll(&mut events, Some(POLL_TIMEOUT))?;

        for event in &events {
            if event.token() != IRC_CONN {
                continue;
            }
            if event.is_readable() {
                loop {
                    match conn.receive_lines() {
                        Ok((lines, stat)) => {
                            if !lines.is_empty() {
                                let mut h = handler.lock().unwrap();
                                for line in &lines {
                                    debug!("<- {}", String::from_utf8_lossy(line));
                                    h.on_line(line);
                                }
                            }
                            match stat {
                                ReadStat::Okay => continue,
                                ReadStat::Blocked => break,
                                ReadStat::Eof => {
                                    report_close(&handler, &conn, status::CLOSED_SERVER);
                                    break 'outer;
                                }
                            }
                        }
                        Err(e) => {
                            warn!("read error: {}", e);
                            report_close(&handler, &conn, status::CLOSED_SERVER);
                            return Err(e);
                        }
                    }
                }
            }
        }

        {
            let mut h = handler.lock().unwrap();
            for line in h.drain_outbound() {
                debug!("-> {}", line);
                conn.enqueue(&line);
            }
        }

        match conn.pump_outbound() {
            Ok(WriteStat::Idle) => {
                poll.registry()
                    .reregister(conn.stream_mut(), IRC_CONN, Interest::READABLE)?;
            }
            Ok(_) => {
                poll.registry().reregister(
                    conn.stream_mut(),
                    IRC_CONN,
                    Interest::READABLE | Interest::WRITABLE,
                )?;
            }
            Err(e) => {
                warn!("write error: {}", e);
                report_close(&handler, &conn, status::CLOSED_SERVER);
                return Err(e);
            }
        }
    }

    Ok(())
}

fn send_quit(handler: &Arc<Mutex<Handler>>, conn: &mut Connection) {
    let mut h = handler.lock().unwrap();
    let reason = format!("pyircfs {} unmounted", env!("CARGO_PKG_VERSION"));
    h.send_command("QUIT", &reason);
    for line in h.drain_outbound() {
        conn.enqueue(&line);
    }
    report_close(handler, conn, status::CLOSED_OK);
}

fn report_close(handler: &Arc<Mutex<Handler>>, conn: &Connection, new_status: u16) {
    if conn.close() {
        let mut h = handler.lock().unwrap();
        h.receive_status(new_status);
    }
}

#[cfg(test)]
mod test {
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread::spawn;

    use super::*;

    #[test]
    fn event_loop_registers_and_auto_pongs() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let server_thread = spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = [0u8; 256];
            let n = stream.read(&mut buf).unwrap();
            let greeting = String::from_utf8_lossy(&buf[..n]).to_string();
            assert!(greeting.contains("NICK bot\r\n"));
            assert!(greeting.contains("USER bot 0 * :Bot\r\n"));
            stream.write_all(b"PING :xyz\r\n").unwrap();
            let n = stream.read(&mut buf).unwrap();
            assert_eq!(&buf[..n], b"PONG :xyz\r\n");
            stream.write_all(b"ERROR :Closing Link: bye\r\n").unwrap();
        });

        let handler = Arc::new(Mutex::new(Handler::new("bot", "", "bot", "Bot", "")));
        let stop = Arc::new(AtomicBool::new(false));
        event_loop(handler.clone(), &addr.to_string(), stop).unwrap();

        assert_eq!(handler.lock().unwrap().status, status::CLOSED_SERVER);
        server_thread.join().unwrap();
    }
}
