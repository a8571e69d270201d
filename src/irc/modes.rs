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

//! MODE parameter extraction. A mode string like `+tnl-k 123 oldkey` is
//! split into a flat list of `(flag, param)` pairs, where `flag` carries
//! its sign (`+t`, `-k`) and `param` is only present for the flags that
//! take one. Which flags take a param differs by sign: `+k`/`+l` consume
//! one, `-k` does not (servers don't echo the key back on unset), `-l`
//! does not either.

/// Flags that take a parameter when being set.
const PARAM_FLAGS_PLUS: &[u8] = b"abehIkLloqv";
/// Flags that take a parameter when being unset.
const PARAM_FLAGS_MINUS: &[u8] = b"abehIoqv";

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ModeChange {
    /// e.g. `"+o"` or `"-b"`.
    pub flag: String,
    pub param: Option<String>,
}

/// Parse a raw MODE params string (e.g. `"#chan +tnl-k 123 oldkey"` or just
/// `"+tnl-k 123 oldkey"`) into a sequence of mode changes.
///
/// Mirrors the original implementation exactly: splits on whitespace,
/// treats the first token as an optional target and the second as the
/// flag string, and silently stops consuming params once they run out
/// rather than erroring.
pub fn extract_modes(params: &str) -> Vec<ModeChange> {
    let tokens: Vec<&str> = params.split_whitespace().collect();
    if tokens.len() < 2 {
        return Vec::new();
    }
    let flags = tokens[1];
    let mut param_iter = tokens[2..].iter();

    let mut ret = Vec::new();
    let mut sign = '+';
    for chr in flags.chars() {
        match chr {
            '+' | '-' => sign = chr,
            _ => {
                let takes_param = if sign == '+' {
                    PARAM_FLAGS_PLUS.contains(&(chr as u8))
                } else {
                    PARAM_FLAGS_MINUS.contains(&(chr as u8))
                };
                let param = if takes_param {
                    match param_iter.next() {
                        Some(p) => Some(p.to_string()),
                        None => break,
                    }
                } else {
                    None
                };
                ret.push(ModeChange {
                    flag: format!("{}{}", sign, chr),
                    param,
                });
            }
        }
    }
    ret
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn simple_flags_no_params() {
        let got = extract_modes("#x +tnl 123");
        assert_eq!(
            got,
            vec![
                ModeChange {
                    flag: "+t".to_string(),
                    param: None
                },
                ModeChange {
                    flag: "+n".to_string(),
                    param: None
                },
                ModeChange {
                    flag: "+l".to_string(),
                    param: Some("123".to_string())
                },
            ]
        );
    }

    #[test]
    fn voice_with_param() {
        let got = extract_modes("#x +v alice");
        assert_eq!(
            got,
            vec![ModeChange {
                flag: "+v".to_string(),
                param: Some("alice".to_string())
            }]
        );
    }

    #[test]
    fn mixed_sign() {
        let got = extract_modes("#x +o-o alice bob");
        assert_eq!(
            got,
            vec![
                ModeChange {
                    flag: "+o".to_string(),
                    param: Some("alice".to_string())
                },
                ModeChange {
                    flag: "-o".to_string(),
                    param: Some("bob".to_string())
                },
            ]
        );
    }

    #[test]
    fn exhausted_params_stop_silently() {
        let got = extract_modes("#x +ov alice");
        assert_eq!(
            got,
            vec![ModeChange {
                flag: "+o".to_string(),
                param: Some("alice".to_string())
            }]
        );
    }

    #[test]
    fn minus_l_takes_no_param() {
        let got = extract_modes("#x -l");
        assert_eq!(
            got,
            vec![ModeChange {
                flag: "-l".to_string(),
                param: None
            }]
        );
    }

    #[test]
    fn no_flags_token() {
        assert!(extract_modes("#x").is_empty());
        assert!(extract_modes("").is_empty());
    }
}
