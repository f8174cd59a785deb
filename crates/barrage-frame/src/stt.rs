//! STT key/value body encoding.
//!
//! A body is a sequence of `key@=value/` pairs followed by a NUL byte.
//! Inside keys and values `@` is written as `@A` and `/` as `@S`.

use std::collections::BTreeMap;

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// A flat string-keyed message body.
pub type Fields = BTreeMap<String, String>;

/// Reserved key used to classify messages.
pub const TYPE_KEY: &str = "type";

const PAIR_SEPARATOR: &str = "@=";
const FIELD_TERMINATOR: u8 = b'/';
const BODY_TERMINATOR: u8 = 0;

/// Encode `fields` into an STT body.
///
/// The `type` key is written first (the server expects it to lead); the
/// remaining keys follow in sorted order.
pub fn encode(fields: &Fields) -> Bytes {
    let mut dst = BytesMut::new();
    encode_into(fields, &mut dst);
    dst.freeze()
}

/// Encode `fields` into `dst`, appending the NUL terminator.
pub fn encode_into(fields: &Fields, dst: &mut BytesMut) {
    if let Some(kind) = fields.get(TYPE_KEY) {
        put_pair(dst, TYPE_KEY, kind);
    }
    for (key, value) in fields.iter().filter(|(key, _)| key.as_str() != TYPE_KEY) {
        put_pair(dst, key, value);
    }
    dst.put_u8(BODY_TERMINATOR);
}

fn put_pair(dst: &mut BytesMut, key: &str, value: &str) {
    put_escaped(dst, key);
    dst.put_slice(PAIR_SEPARATOR.as_bytes());
    put_escaped(dst, value);
    dst.put_u8(FIELD_TERMINATOR);
}

fn put_escaped(dst: &mut BytesMut, text: &str) {
    for byte in text.bytes() {
        match byte {
            b'@' => dst.put_slice(b"@A"),
            b'/' => dst.put_slice(b"@S"),
            other => dst.put_u8(other),
        }
    }
}

/// Decode an STT body into its fields.
pub fn decode(body: &[u8]) -> Result<Fields> {
    let end = body
        .iter()
        .rposition(|&b| b != BODY_TERMINATOR)
        .map_or(0, |pos| pos + 1);
    let text = std::str::from_utf8(&body[..end])?;

    let mut fields = Fields::new();
    for segment in text.split(FIELD_TERMINATOR as char) {
        if segment.is_empty() {
            continue;
        }
        let (key, value) = segment
            .split_once(PAIR_SEPARATOR)
            .ok_or_else(|| FrameError::MalformedField(segment.to_string()))?;
        fields.insert(unescape(key)?, unescape(value)?);
    }
    Ok(fields)
}

fn unescape(raw: &str) -> Result<String> {
    if !raw.contains('@') {
        return Ok(raw.to_string());
    }

    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '@' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('A') => out.push('@'),
            Some('S') => out.push('/'),
            _ => return Err(FrameError::InvalidEscape(raw.to_string())),
        }
    }
    Ok(out)
}
