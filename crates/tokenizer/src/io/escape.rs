//! Text rendering of token bytes for the line-based model files.
//!
//! Tokens are written as their UTF-8 text. Characters that would break the
//! line or field structure are escaped:
//!
//! | escape   | meaning                                      |
//! |----------|----------------------------------------------|
//! | `\\`     | backslash                                    |
//! | `\t`     | tab                                          |
//! | `\n`     | newline                                      |
//! | `\r`     | carriage return                              |
//! | `\xNN`   | a byte that is not part of valid UTF-8       |
//! | `\s`     | space (merges file only)                     |
//! | `\u{..}` | other whitespace character (merges file only) |
//!
//! A backslash followed by anything else is read literally.

use std::fmt::Write;

/// Which file a token is rendered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// Vocabulary file: fields are tab separated
    Vocab,
    /// Merges file: fields are whitespace separated
    Merge,
}

/// Render token bytes as a single field.
pub fn escape_token(bytes: &[u8], field: Field) -> String {
    let mut out = String::with_capacity(bytes.len());
    let mut rest = bytes;

    while !rest.is_empty() {
        match std::str::from_utf8(rest) {
            Ok(text) => {
                push_escaped(&mut out, text, field);
                break;
            }
            Err(err) => {
                let (valid, invalid) = rest.split_at(err.valid_up_to());
                if let Ok(text) = std::str::from_utf8(valid) {
                    push_escaped(&mut out, text, field);
                }
                let bad = err.error_len().unwrap_or(invalid.len());
                for byte in &invalid[..bad] {
                    let _ = write!(out, "\\x{:02x}", byte);
                }
                rest = &invalid[bad..];
            }
        }
    }

    out
}

fn push_escaped(out: &mut String, text: &str, field: Field) {
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            ' ' if field == Field::Merge => out.push_str("\\s"),
            c if field == Field::Merge && c.is_whitespace() => {
                let _ = write!(out, "\\u{{{:x}}}", c as u32);
            }
            c => out.push(c),
        }
    }
}

/// Read a field back into token bytes.
pub fn unescape_token(text: &str) -> Vec<u8> {
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'\\' {
            if let Some((decoded, consumed)) = decode_escape(&bytes[i + 1..]) {
                match decoded {
                    Escaped::Byte(byte) => out.push(byte),
                    Escaped::Char(c) => {
                        let mut buf = [0u8; 4];
                        out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
                    }
                }
                i += 1 + consumed;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }

    out
}

enum Escaped {
    Byte(u8),
    Char(char),
}

/// Decode the escape following a backslash. Returns the value and the
/// number of bytes consumed after the backslash.
fn decode_escape(after: &[u8]) -> Option<(Escaped, usize)> {
    match after.first()? {
        b'\\' => Some((Escaped::Byte(b'\\'), 1)),
        b't' => Some((Escaped::Byte(b'\t'), 1)),
        b'n' => Some((Escaped::Byte(b'\n'), 1)),
        b'r' => Some((Escaped::Byte(b'\r'), 1)),
        b's' => Some((Escaped::Byte(b' '), 1)),
        b'x' => {
            let digits = std::str::from_utf8(after.get(1..3)?).ok()?;
            if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
                return None;
            }
            let byte = u8::from_str_radix(digits, 16).ok()?;
            Some((Escaped::Byte(byte), 3))
        }
        b'u' => {
            if after.get(1) != Some(&b'{') {
                return None;
            }
            let close = after.iter().position(|&b| b == b'}')?;
            let digits = std::str::from_utf8(&after[2..close]).ok()?;
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
                return None;
            }
            let c = char::from_u32(u32::from_str_radix(digits, 16).ok()?)?;
            Some((Escaped::Char(c), close + 1))
        }
        _ => None,
    }
}
