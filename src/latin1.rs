//! ISO-8859-1 text encoding for message payloads.
//!
//! Latin-1 maps each code point up to U+00FF to the byte of the same value. Characters beyond
//! that range have no representation and are written as `?`, so payloads carrying them are
//! lossy. Consumers expecting full Unicode payloads cannot use this encoding.

/// Byte written for characters outside the Latin-1 range.
pub const REPLACEMENT: u8 = b'?';

/// Encodes text as Latin-1, one byte per character.
pub fn encode(text: &str) -> Vec<u8> {
    let mut replaced = 0usize;
    let bytes = text
        .chars()
        .map(|c| {
            u8::try_from(c).unwrap_or_else(|_| {
                replaced += 1;
                REPLACEMENT
            })
        })
        .collect();
    if replaced > 0 {
        tracing::trace!(replaced, "characters outside Latin-1 replaced");
    }
    bytes
}

/// Decodes Latin-1 bytes. Every byte sequence is valid Latin-1.
pub fn decode(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}
