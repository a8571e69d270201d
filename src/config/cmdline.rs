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

use core::fmt;
use std::env;

use ParseState::{Altnick, Boolarg, Config, Nickname, Password, Realname, Server, Username};

const HELP_MESSAGE: &str = r#"pyircfs [-s|--server=] [-n|--nickname=] [-a|--altnick=]
        [-u|--username=] [-r|--realname=] [-p|--password=] [-c|--config=]
        <mountpoint>

-s --server=host[:port]  IRC server to connect to (required).
-n --nickname=nick       Nickname to use (default: $LOGNAME).
-a --altnick=nick        Alternate nickname to fall back to.
-u --username=user       Username/ident (default: $LOGNAME).
-r --realname=name       Real name/gecos (default: $LOGNAME).
-p --password=pass       Server password.
-c --config=path         TOML config file providing defaults.
-h --help                This message.
"#;

#[derive(PartialEq)]
enum ParseState {
    Boolarg,
    Server,
    Nickname,
    Altnick,
    Username,
    Realname,
    Password,
    Config,
}

#[derive(thiserror::Error, Debug)]
pub struct MountArgsError(String);

impl fmt::Display for MountArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Default)]
pub struct MountArgs {
    pub mountpoint: String,
    pub server: String,
    pub nickname: String,
    pub altnick: String,
    pub username: String,
    pub realname: String,
    pub password: String,
    pub config: String,
}

fn logname() -> String {
    env::var("LOGNAME")
        .or_else(|_| env::var("USER"))
        .unwrap_or_else(|_| "pyircfs".to_string())
}

impl MountArgs {
    pub fn new() -> Result<MountArgs, MountArgsError> {
        let mut ret = MountArgs {
            nickname: logname(),
            username: logname(),
            realname: logname(),
            ..Default::default()
        };
        let mut arg_state = ParseState::Boolarg;
        let mut itr = env::args();
        itr.next(); // throw away argv[0]
        for arg in itr {
            let (flag, val) = if arg_state != Boolarg {
                (arg.as_str(), "")
            } else if let Some(idx) = arg.as_str().find('=') {
                arg.split_at(idx + 1usize)
            } else {
                (arg.as_str(), "")
            };

            arg_state = match flag {
                "-s" | "--server" => Server,
                "--server=" => {
                    ret.server = val.to_string();
                    Boolarg
                }
                "-n" | "--nickname" => Nickname,
                "--nickname=" => {
                    ret.nickname = val.to_string();
                    Boolarg
                }
                "-a" | "--altnick" => Altnick,
                "--altnick=" => {
                    ret.altnick = val.to_string();
                    Boolarg
                }
                "-u" | "--username" => Username,
                "--username=" => {
                    ret.username = val.to_string();
                    Boolarg
                }
                "-r" | "--realname" => Realname,
                "--realname=" => {
                    ret.realname = val.to_string();
                    Boolarg
                }
                "-p" | "--password" => Password,
                "--password=" => {
                    ret.password = val.to_string();
                    Boolarg
                }
                "-c" | "--config" => Config,
                "--config=" => {
                    ret.config = val.to_string();
                    Boolarg
                }
                "-h" | "--help" => return Err(MountArgsError(HELP_MESSAGE.to_string())),
                _ => match arg_state {
                    Boolarg => {
                        if ret.mountpoint.is_empty() && !flag.starts_with('-') {
                            ret.mountpoint = flag.to_string();
                            Boolarg
                        } else {
                            return Err(MountArgsError(format!(
                                "Unknown option passed ({}), see --help",
                                flag,
                            )));
                        }
                    }
                    Server => {
                        ret.server = flag.to_string();
                        Boolarg
                    }
                    Nickname => {
                        ret.nickname = flag.to_string();
                        Boolarg
                    }
                    Altnick => {
                        ret.altnick = flag.to_string();
                        Boolarg
                    }
                    Username => {
                        ret.username = flag.to_string();
                        Boolarg
                    }
                    Realname => {
                        ret.realname = flag.to_string();
                        Boolarg
                    }
                    Password => {
                        ret.password = flag.to_string();
                        Boolarg
                    }
                    Config => {
                        ret.config = flag.to_string();
                        Boolarg
                    }
                },
            }
        }

        if ret.mountpoint.is_empty() {
            return Err(MountArgsError(
                "Please specify mount point and (at least) IRC server!".to_string(),
            ));
        }
        if ret.server.is_empty() {
            return Err(MountArgsError(
                "Please specify mount point and (at least) IRC server!".to_string(),
            ));
        }
        Ok(ret)
    }
}
