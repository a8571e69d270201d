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

//! A shell or editor that rewrites a whole file on save shouldn't
//! replay its entire history back out to the wire. Given what's
//! already on record (`existing`) and the newly written buffer
//! (`buf`), figure out the part of `buf` that's genuinely new.

/// The prefix match is the common case (append-only editing); the
/// newline-aligned scan catches edits that don't start at byte 0 but
/// still leave a recognizable suffix of `existing` intact.
pub fn new_suffix(existing: &str, buf: &str) -> String {
    if !existing.is_empty() && buf.starts_with(existing) {
        return buf[existing.len()..].to_string();
    }

    let mut candidates = vec![0usize];
    for (idx, b) in buf.bytes().enumerate() {
        if b == b'\n' {
            candidates.push(idx + 1);
        }
    }

    for i in candidates {
        if i > buf.len() {
            continue;
        }
        let suffix = &buf[i..];
        if !suffix.is_empty() && existing.contains(suffix) {
            return buf[..i].to_string();
        }
    }

    buf.to_string()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn identical_rewrite_sends_nothing() {
        let existing = "<alice> hi\n<bob> hey\n";
        assert_eq!(new_suffix(existing, existing), "");
    }

    #[test]
    fn appended_line_sends_only_the_new_line() {
        let existing = "<alice> hi\n";
        let buf = "<alice> hi\nhello\n";
        assert_eq!(new_suffix(existing, buf), "hello\n");
    }

    #[test]
    fn unrelated_buffer_sends_whole_thing() {
        let existing = "<alice> hi\n";
        let buf = "totally different\n";
        assert_eq!(new_suffix(existing, buf), "totally different\n");
    }

    #[test]
    fn empty_existing_sends_whole_buffer() {
        assert_eq!(new_suffix("", "first line\n"), "first line\n");
    }
}
