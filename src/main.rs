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

mod config;
mod fs;
mod irc;

use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use std::thread;

use fuser::MountOption;
use log::{error, info};

use config::cmdline::{MountArgs, MountArgsError};
use config::config_file::{Config, ConfigError};
use config::Settings;
use irc::handler::Handler;

#[derive(thiserror::Error, Debug)]
enum MainError {
    #[error("{0}")]
    Cmdline(#[from] MountArgsError),
    #[error("{0}")]
    InitConfig(#[from] ConfigError),
    #[error("mount failed: {0}")]
    Mount(#[from] std::io::Error),
}

fn main() -> Result<(), MainError> {
    env_logger::init();

    let args = MountArgs::new()?;
    let file = if args.config.is_empty() {
        None
    } else {
        Some(Config::from_path(Path::new(&args.config))?)
    };
    let settings = Settings::resolve(args, file);

    let handler = Arc::new(Mutex::new(Handler::new(
        &settings.nickname,
        &settings.altnick,
        &settings.username,
        &settings.realname,
        &settings.password,
    )));
    let stop = Arc::new(AtomicBool::new(false));

    let server_addr = format!("{}:{}", settings.server, settings.port);
    let io_handler = handler.clone();
    let io_stop = stop.clone();
    let io_thread = thread::spawn(move || {
        if let Err(e) = irc::net::event_loop(io_handler, &server_addr, io_stop) {
            error!("session ended: {}", e);
        }
    });

    info!("mounting pyircfs at {}", settings.mountpoint);
    let filesystem = fs::PyIrcFs::new(handler, stop);
    fuser::mount2(
        filesystem,
        &settings.mountpoint,
        &[
            MountOption::FSName("pyircfs".to_string()),
            MountOption::AutoUnmount,
        ],
    )?;

    let _ = io_thread.join();
    Ok(())
}
