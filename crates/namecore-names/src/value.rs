//! Validation of name values and of the endpoints embedded in them.
//!
//! Like the namespace grammar, every check here answers with a plain `bool`
//! and never fails on malformed input.

use crate::netaddr::{self, I2P_SUFFIX, ONION_SUFFIX};
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use serde_json::ser::Formatter;
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr};

/// Deepest nesting of arrays and objects a value may have.
pub const MAX_JSON_DEPTH: usize = 512;

/// Compact JSON formatter that additionally escapes DEL, matching the
/// canonical on-chain value encoding.
struct CanonicalFormatter;

impl Formatter for CanonicalFormatter {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut parts = fragment.split('\x7f');
        if let Some(first) = parts.next() {
            writer.write_all(first.as_bytes())?;
        }
        for part in parts {
            writer.write_all(b"\\u007f")?;
            writer.write_all(part.as_bytes())?;
        }
        Ok(())
    }
}

/// Deepest nesting of arrays and objects, ignoring brackets inside strings.
fn nesting_depth(text: &str) -> usize {
    let mut depth = 0usize;
    let mut max_depth = 0;
    let mut in_string = false;
    let mut escaped = false;

    for byte in text.bytes() {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'[' | b'{' => {
                depth += 1;
                max_depth = max_depth.max(depth);
            }
            b']' | b'}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }

    max_depth
}

/// Whether the text holds exactly one JSON value.
fn is_well_formed(text: &str) -> bool {
    if nesting_depth(text) > MAX_JSON_DEPTH {
        return false;
    }

    let mut deserializer = serde_json::Deserializer::from_str(text);
    deserializer.disable_recursion_limit();
    let stacked = serde_stacker::Deserializer::new(&mut deserializer);
    IgnoredAny::deserialize(stacked).is_ok() && deserializer.end().is_ok()
}

/// Index just past the closing quote of the string token opening at `start`.
fn string_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut pos = start + 1;
    loop {
        match *bytes.get(pos)? {
            b'\\' => pos += 2,
            b'"' => return Some(pos + 1),
            _ => pos += 1,
        }
    }
}

fn write_string(out: &mut String, token: &str) -> Option<()> {
    let decoded: String = serde_json::from_str(token).ok()?;
    let mut buf = Vec::with_capacity(decoded.len() + 2);
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, CanonicalFormatter);
    decoded.serialize(&mut serializer).ok()?;
    out.push_str(std::str::from_utf8(&buf).ok()?);
    Some(())
}

/// Rewrites a well-formed JSON text without insignificant whitespace.
///
/// Numbers and object members are copied exactly as written, duplicate keys
/// included. Strings are re-escaped in their shortest form.
fn write_canonical(text: &str) -> Option<String> {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut pos = 0;

    while let Some(&byte) = bytes.get(pos) {
        match byte {
            b' ' | b'\t' | b'\n' | b'\r' => pos += 1,
            b'"' => {
                let end = string_end(bytes, pos)?;
                write_string(&mut out, &text[pos..end])?;
                pos = end;
            }
            // Outside of strings a well-formed text is plain ASCII.
            _ => {
                out.push(char::from(byte));
                pos += 1;
            }
        }
    }

    Some(out)
}

/// Canonical form of the text, `None` when it is not valid JSON.
fn parse_json(text: &str) -> Option<String> {
    if !is_well_formed(text) {
        return None;
    }
    write_canonical(text)
}

/// Whether the text is empty or any valid JSON value.
pub fn is_valid_json(text: &str) -> bool {
    text.is_empty() || parse_json(text).is_some()
}

/// Whether the text is empty, or valid JSON that is byte-identical to its
/// canonical form.
pub fn is_minimal_json(text: &str) -> bool {
    if text.is_empty() {
        return true;
    }

    let Some(minimal) = parse_json(text) else {
        return false;
    };

    if minimal != text {
        tracing::debug!("Minimalised JSON string is: {minimal}");
        return false;
    }

    true
}

/// Re-serializes JSON without any insignificant whitespace.
///
/// The caller must have checked the text with [`is_valid_json`] first;
/// invalid input yields an empty string.
pub fn canonicalize_json(text: &str) -> String {
    parse_json(text).unwrap_or_default()
}

/// Strict dotted-decimal IPv4 address.
pub fn is_valid_ipv4(text: &str) -> bool {
    text.parse::<Ipv4Addr>().is_ok()
}

/// Strict colon-hex IPv6 address, including the embedded IPv4 forms and an
/// optional `%<scope>` zone suffix.
pub fn is_valid_ipv6(text: &str) -> bool {
    let address = text.split_once('%').map_or(text, |(address, _scope)| address);
    address.parse::<Ipv6Addr>().is_ok()
}

/// Whether the text is a valid Tor onion service address.
pub fn is_valid_onion_address(text: &str) -> bool {
    text.ends_with(ONION_SUFFIX) && netaddr::parse_special(text).is_some()
}

/// Whether the text is a valid I2P base32 destination.
pub fn is_valid_i2p_address(text: &str) -> bool {
    text.ends_with(I2P_SUFFIX) && netaddr::parse_special(text).is_some()
}
