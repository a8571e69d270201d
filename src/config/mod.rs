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

pub mod cmdline;
pub mod config_file;

use cmdline::MountArgs;
use config_file::Config;

/// Fully resolved mount settings: CLI flags win, config-file values fill
/// in anything the CLI left blank, built-in defaults fill in the rest.
#[derive(Debug, Clone)]
pub struct Settings {
    pub mountpoint: String,
    pub server: String,
    pub port: u16,
    pub nickname: String,
    pub altnick: String,
    pub username: String,
    pub realname: String,
    pub password: String,
}

fn pick(cli: &str, file: &str) -> String {
    if !cli.is_empty() {
        cli.to_string()
    } else {
        file.to_string()
    }
}

fn split_host_port(server: &str, file_port: u16) -> (String, u16) {
    match server.rsplit_once(':') {
        Some((host, port)) => match port.parse::<u16>() {
            Ok(p) => (host.to_string(), p),
            Err(_) => (server.to_string(), file_port),
        },
        None => (server.to_string(), file_port),
    }
}

impl Settings {
    pub fn resolve(args: MountArgs, file: Option<Config>) -> Settings {
        let file = file.unwrap_or_default();
        let server_field = pick(&args.server, &file.general.server);
        let (server, port) = split_host_port(&server_field, file.general.port);

        Settings {
            mountpoint: args.mountpoint,
            server,
            port,
            nickname: pick(&args.nickname, &file.general.nickname),
            altnick: pick(&args.altnick, &file.general.altnick),
            username: pick(&args.username, &file.general.username),
            realname: pick(&args.realname, &file.general.realname),
            password: pick(&args.password, &file.general.password),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn cli_server_beats_file_server() {
        let args = MountArgs {
            mountpoint: "/mnt/irc".to_string(),
            server: "irc.cli.example:6669".to_string(),
            nickname: "bot".to_string(),
            username: "bot".to_string(),
            realname: "bot".to_string(),
            ..Default::default()
        };
        let mut file = Config::default();
        file.general.server = "irc.file.example".to_string();
        file.general.port = 6697;

        let s = Settings::resolve(args, Some(file));
        assert_eq!(s.server, "irc.cli.example");
        assert_eq!(s.port, 6669);
    }

    #[test]
    fn falls_back_to_file_when_cli_blank() {
        let args = MountArgs {
            mountpoint: "/mnt/irc".to_string(),
            ..Default::default()
        };
        let mut file = Config::default();
        file.general.server = "irc.file.example".to_string();

        let s = Settings::resolve(args, Some(file));
        assert_eq!(s.server, "irc.file.example");
        assert_eq!(s.port, 6667);
    }
}
