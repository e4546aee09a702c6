//! Device text encoding
//!
//! The built-in TSPL fonts render a Windows-1252 code page. Command text is
//! built as UTF-8 and converted once, right before it is written to the
//! device. ASCII (and therefore every command keyword) passes through
//! unchanged.

use tracing::instrument;

/// Byte written in place of a character the code page cannot express
pub const REPLACEMENT: u8 = b'?';

/// Convert command text to the bytes the printer expects
///
/// Characters outside Windows-1252 become [`REPLACEMENT`]. encoding_rs would
/// emit an HTML numeric reference for them, which the printer would print
/// literally, so characters are encoded one at a time.
#[instrument(skip(text), fields(len = text.len()))]
pub fn to_device_bytes(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    let mut replaced = 0usize;
    let mut buf = [0u8; 4];

    for c in text.chars() {
        if c.is_ascii() {
            out.push(c as u8);
            continue;
        }
        let s: &str = c.encode_utf8(&mut buf);
        let (bytes, _, had_errors) = encoding_rs::WINDOWS_1252.encode(s);
        if had_errors {
            out.push(REPLACEMENT);
            replaced += 1;
        } else {
            out.extend_from_slice(&bytes);
        }
    }

    if replaced > 0 {
        tracing::debug!(replaced, "characters outside the device code page");
    }
    out
}

/// Whether every character of `text` survives [`to_device_bytes`]
pub fn is_device_encodable(text: &str) -> bool {
    text.chars().all(|c| {
        let mut buf = [0u8; 4];
        c.is_ascii() || !encoding_rs::WINDOWS_1252.encode(c.encode_utf8(&mut buf)).2
    })
}
