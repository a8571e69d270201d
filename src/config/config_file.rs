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

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use serde::Deserialize;

/// Defaults loaded from an optional TOML file, overridden by whatever
/// the mount-option CLI parser collected.
#[derive(Deserialize, Debug, Default)]
pub struct Config {
    #[serde(default)]
    pub general: General,
}

#[derive(Deserialize, Debug, Default)]
pub struct General {
    #[serde(default)]
    pub server: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub nickname: String,
    #[serde(default)]
    pub altnick: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub realname: String,
    #[serde(default)]
    pub password: String,
}

fn default_port() -> u16 {
    6667
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Could not open/read config file: {0}")]
    IO(#[from] io::Error),
    #[error("Could not parse config file: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Config {
    pub fn from_str(c: &str) -> Result<Config, ConfigError> {
        toml::from_str::<Config>(c).map_err(|e| e.into())
    }

    pub fn from_path(p: &Path) -> Result<Config, ConfigError> {
        let mut f = File::open(&p)?;
        let mut c = String::new();
        f.read_to_string(&mut c)?;
        Config::from_str(c.as_ref())
    }
}

#[cfg(test)]
mod test {
    use super::Config;

    #[test]
    fn defaults_to_port_6667() {
        let c = Config::from_str("[general]\nserver = \"irc.example.org\"\n").unwrap();
        assert_eq!(c.general.port, 6667);
        assert_eq!(c.general.server, "irc.example.org");
    }

    #[test]
    fn empty_file_parses_with_blank_defaults() {
        let c = Config::from_str("").unwrap();
        assert_eq!(c.general.server, "");
        assert_eq!(c.general.port, 6667);
    }
}
