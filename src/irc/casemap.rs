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

//! Channel/nick equality as IRC servers define it: ASCII case-folding with
//! the three RFC 1459 swaps for `{}|^`. The store layer never compares
//! targets with `==`; it goes through here instead.

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum CaseMapping {
    Ascii,
    Rfc1459,
}

impl Default for CaseMapping {
    fn default() -> CaseMapping {
        CaseMapping::Rfc1459
    }
}

/// Uppercases a slice and returns a copy.
/// Note that this function currently only supports CASEMAPPING=ascii or CASEMAPPING=rfc1459
pub fn irc_uppercase(casemap: CaseMapping, the_str: &[u8]) -> Vec<u8> {
    the_str
        .iter()
        .map(|&chr| match chr {
            b'a'..=b'z' => chr - 32u8,
            b'{'..=b'}' if casemap == CaseMapping::Rfc1459 => chr - 32u8,
            b'^' if casemap == CaseMapping::Rfc1459 => chr + 32,
            _ => chr,
        })
        .collect::<Vec<u8>>()
}

pub fn case_cmp(casemap: CaseMapping, lhs: &[u8], rhs: &[u8]) -> bool {
    irc_uppercase(casemap, lhs) == irc_uppercase(casemap, rhs)
}

pub fn case_cmp_str(casemap: CaseMapping, lhs: &str, rhs: &str) -> bool {
    case_cmp(casemap, lhs.as_bytes(), rhs.as_bytes())
}

/// `*#+!&` -- the set of characters RFC 1459 allows as a channel name's
/// first byte.
pub const CHANCHARS: &[u8] = b"*#+!&";

pub fn is_channel(target: &str) -> bool {
    target
        .as_bytes()
        .first()
        .map_or(false, |b| CHANCHARS.contains(b))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn uppercase() {
        assert!(case_cmp(CaseMapping::Rfc1459, b"^{|}", b"~[\\]"));
        assert!(case_cmp(CaseMapping::Rfc1459, b"^{|}abc", b"~[\\]ABC"));
        assert!(!case_cmp(CaseMapping::Ascii, b"^{|}abc", b"~[\\]ABC"));
    }

    #[test]
    fn channel_detection() {
        assert!(is_channel("#foo"));
        assert!(is_channel("&foo"));
        assert!(!is_channel("foo"));
        assert!(!is_channel(""));
    }
}
