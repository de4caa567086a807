//! MIME encoding and decoding utilities.
//!
//! Supports Base64, Quoted-Printable, and RFC 2047 header encoding.

use crate::error::Result;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::fmt::Write as _;

/// Maximum line length for encoded bodies (RFC 2045).
const MAX_LINE_LENGTH: usize = 76;

/// Longest raw chunk placed in one encoded word, keeping each word under 75 chars.
const ENCODED_WORD_CHUNK: usize = 45;

/// Encodes data as Base64.
#[must_use]
pub fn encode_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Encodes data as Base64 split into CRLF-terminated 76 column lines.
#[must_use]
pub fn encode_base64_wrapped(data: &[u8]) -> String {
    let encoded = STANDARD.encode(data);
    let mut result = String::with_capacity(encoded.len() + encoded.len() / MAX_LINE_LENGTH * 2);
    for (i, chunk) in encoded.as_bytes().chunks(MAX_LINE_LENGTH).enumerate() {
        if i > 0 {
            result.push_str("\r\n");
        }
        // Base64 output is pure ASCII
        result.push_str(&String::from_utf8_lossy(chunk));
    }
    result
}

/// Decodes Base64 data, ignoring embedded whitespace and line breaks.
///
/// # Errors
///
/// Returns an error if the input is not valid Base64.
pub fn decode_base64(data: &str) -> Result<Vec<u8>> {
    let cleaned: String = data.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD.decode(cleaned).map_err(Into::into)
}

/// Encodes text using Quoted-Printable encoding (RFC 2045).
///
/// Line breaks in the input are emitted as CRLF hard breaks; long lines
/// get soft breaks so no output line exceeds 76 characters.
#[must_use]
pub fn encode_quoted_printable(text: &str) -> String {
    let mut result = String::with_capacity(text.len());

    for (index, line) in text.split('\n').enumerate() {
        if index > 0 {
            result.push_str("\r\n");
        }
        let line = line.strip_suffix('\r').unwrap_or(line);
        encode_quoted_printable_line(line.as_bytes(), &mut result);
    }

    result
}

fn encode_quoted_printable_line(line: &[u8], out: &mut String) {
    let mut line_length = 0;

    for (i, byte) in line.iter().enumerate() {
        let is_last = i + 1 == line.len();
        let token_len = match byte {
            b'!'..=b'<' | b'>'..=b'~' => 1,
            // Trailing whitespace must be encoded
            b' ' | b'\t' if !is_last => 1,
            _ => 3,
        };

        if line_length + token_len > MAX_LINE_LENGTH - 1 {
            out.push_str("=\r\n");
            line_length = 0;
        }

        if token_len == 1 {
            out.push(char::from(*byte));
        } else {
            let _ = write!(out, "={byte:02X}");
        }
        line_length += token_len;
    }
}

/// Decodes Quoted-Printable text (RFC 2045) to raw bytes.
///
/// An `=` that does not start a valid escape is kept as-is.
#[must_use]
pub fn decode_quoted_printable_bytes(text: &str) -> Vec<u8> {
    let bytes = text.as_bytes();
    let mut result = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'=' {
            result.push(bytes[i]);
            i += 1;
            continue;
        }

        // Soft line break, possibly preceded by transport padding
        let mut j = i + 1;
        while j < bytes.len() && (bytes[j] == b' ' || bytes[j] == b'\t') {
            j += 1;
        }
        if j == bytes.len() {
            break;
        }
        if bytes[j] == b'\n' {
            i = j + 1;
            continue;
        }
        if bytes[j] == b'\r' && bytes.get(j + 1) == Some(&b'\n') {
            i = j + 2;
            continue;
        }

        match decode_hex_pair(bytes.get(i + 1..i + 3)) {
            Some(byte) => {
                result.push(byte);
                i += 3;
            }
            None => {
                result.push(b'=');
                i += 1;
            }
        }
    }

    result
}

fn decode_hex_pair(hex: Option<&[u8]>) -> Option<u8> {
    let hex = std::str::from_utf8(hex?).ok()?;
    // from_str_radix accepts a leading sign
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u8::from_str_radix(hex, 16).ok()
}

/// Decodes Quoted-Printable text (RFC 2045) as UTF-8.
///
/// # Errors
///
/// Returns an error if the decoded bytes are not UTF-8.
pub fn decode_quoted_printable(text: &str) -> Result<String> {
    String::from_utf8(decode_quoted_printable_bytes(text)).map_err(Into::into)
}

/// Returns true if a header value cannot be sent as-is.
#[must_use]
pub fn needs_encoding(text: &str) -> bool {
    text.contains("=?") || text.chars().any(|c| !c.is_ascii() || c.is_ascii_control())
}

/// Encodes a header value using RFC 2047 encoding.
///
/// Format: `=?charset?B?encoded-text?=`. Text that is plain ASCII is
/// returned unchanged. Long values are split into several encoded words
/// at character boundaries.
#[must_use]
pub fn encode_rfc2047(text: &str, charset: &str) -> String {
    if !needs_encoding(text) {
        return text.to_string();
    }

    let mut words = Vec::new();
    let mut chunk = String::new();
    for ch in text.chars() {
        if chunk.len() + ch.len_utf8() > ENCODED_WORD_CHUNK {
            words.push(format!("=?{charset}?B?{}?=", encode_base64(chunk.as_bytes())));
            chunk.clear();
        }
        chunk.push(ch);
    }
    if !chunk.is_empty() {
        words.push(format!("=?{charset}?B?{}?=", encode_base64(chunk.as_bytes())));
    }

    words.join(" ")
}

/// Decodes every RFC 2047 encoded word in a header value.
///
/// Whitespace separating two adjacent encoded words is dropped
/// (RFC 2047 section 6.2). Words that cannot be decoded are kept verbatim.
///
/// `"=?UTF-8?B?SG9sYQ==?= =?UTF-8?B?IG11bmRv?="` decodes to `"Hola mundo"`.
#[must_use]
pub fn decode_encoded_words(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut remaining = input;
    let mut last_was_encoded = false;

    while let Some(start) = remaining.find("=?") {
        let before = &remaining[..start];
        if !last_was_encoded || !before.trim().is_empty() {
            result.push_str(before);
        }

        let after_start = &remaining[start + 2..];
        if let Some((text, consumed)) = decode_one_word(after_start) {
            result.push_str(&text);
            remaining = &after_start[consumed..];
            last_was_encoded = true;
        } else {
            result.push_str("=?");
            remaining = after_start;
            last_was_encoded = false;
        }
    }

    result.push_str(remaining);
    result
}

/// Decodes `charset?encoding?text?=`, returning the text and the bytes consumed.
fn decode_one_word(s: &str) -> Option<(String, usize)> {
    let (charset, rest) = s.split_once('?')?;
    let (encoding, rest) = rest.split_once('?')?;
    let end = rest.find("?=")?;
    let encoded_text = &rest[..end];

    if charset.is_empty()
        || charset.contains(char::is_whitespace)
        || encoded_text.contains(char::is_whitespace)
    {
        return None;
    }

    let bytes = match encoding {
        "B" | "b" => decode_base64(encoded_text).ok()?,
        "Q" | "q" => decode_q_encoding(encoded_text),
        _ => return None,
    };

    let consumed = charset.len() + 1 + encoding.len() + 1 + end + 2;
    Some((decode_charset(charset, &bytes), consumed))
}

/// Decodes Q encoding: underscores are spaces, `=XX` is a byte.
fn decode_q_encoding(input: &str) -> Vec<u8> {
    let bytes = input.as_bytes();
    let mut result = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'_' => {
                result.push(b' ');
                i += 1;
            }
            b'=' => {
                if let Some(byte) = decode_hex_pair(bytes.get(i + 1..i + 3)) {
                    result.push(byte);
                    i += 3;
                } else {
                    result.push(b'=');
                    i += 1;
                }
            }
            b => {
                result.push(b);
                i += 1;
            }
        }
    }

    result
}

/// Decodes bytes using a named charset.
///
/// An RFC 2231 language suffix (`utf-8*en`) is ignored. Unknown charsets
/// fall back to lossy UTF-8.
#[must_use]
pub fn decode_charset(charset: &str, bytes: &[u8]) -> String {
    let label = charset.split('*').next().unwrap_or(charset).trim();
    match encoding_rs::Encoding::for_label(label.as_bytes()) {
        Some(encoding) => encoding.decode_without_bom_handling(bytes).0.into_owned(),
        None => String::from_utf8_lossy(bytes).into_owned(),
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_base64_encode_decode() {
        let data = b"Hello, World!";
        let encoded = encode_base64(data);
        assert_eq!(encoded, "SGVsbG8sIFdvcmxkIQ==");

        let decoded = decode_base64("SGVsbG8s\r\nIFdvcmxkIQ==").unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn test_base64_wrapped_line_length() {
        let data = vec![0xAB_u8; 300];
        let encoded = encode_base64_wrapped(&data);
        assert!(encoded.split("\r\n").all(|line| line.len() <= 76));
        assert_eq!(decode_base64(&encoded).unwrap(), data);
    }

    #[test]
    fn test_quoted_printable_encode() {
        assert_eq!(encode_quoted_printable("Hello, World!"), "Hello, World!");

        let encoded = encode_quoted_printable("Héllo, Wørld!");
        assert!(encoded.contains("=C3=A9"));

        assert_eq!(encode_quoted_printable("a=b"), "a=3Db");
    }

    #[test]
    fn test_quoted_printable_encode_hard_breaks() {
        let encoded = encode_quoted_printable("line one\nline two \r\nend");
        assert_eq!(encoded, "line one\r\nline two=20\r\nend");
    }

    #[test]
    fn test_quoted_printable_encode_soft_breaks() {
        let text = "x".repeat(200);
        let encoded = encode_quoted_printable(&text);
        assert!(encoded.split("\r\n").all(|line| line.len() <= 76));
        assert_eq!(decode_quoted_printable(&encoded).unwrap(), text);
    }

    #[test]
    fn test_quoted_printable_decode() {
        assert_eq!(decode_quoted_printable("Hello, World!").unwrap(), "Hello, World!");
        assert_eq!(decode_quoted_printable("H=C3=A9llo").unwrap(), "Héllo");
        assert_eq!(decode_quoted_printable("Hello=\r\nWorld").unwrap(), "HelloWorld");
        assert_eq!(decode_quoted_printable("Hello= \nWorld").unwrap(), "HelloWorld");
    }

    #[test]
    fn test_quoted_printable_keeps_invalid_escapes() {
        assert_eq!(decode_quoted_printable("a=ZZb").unwrap(), "a=ZZb");
        assert_eq!(decode_quoted_printable("short=4").unwrap(), "short=4");
        assert_eq!(decode_quoted_printable("sign=+1").unwrap(), "sign=+1");
        assert_eq!(decode_quoted_printable("mix=ZZ=C3=A9").unwrap(), "mix=ZZé");
        assert!(decode_quoted_printable("=FF").is_err());
    }

    #[test]
    fn test_rfc2047_encode() {
        assert_eq!(encode_rfc2047("Hello", "utf-8"), "Hello");

        let encoded = encode_rfc2047("Héllo", "utf-8");
        assert_eq!(encoded, "=?utf-8?B?SMOpbGxv?=");
    }

    #[test]
    fn test_rfc2047_encode_long_value_splits_words() {
        let text = "ü".repeat(60);
        let encoded = encode_rfc2047(&text, "utf-8");
        assert!(encoded.split(' ').count() > 1);
        assert!(encoded.split(' ').all(|w| w.len() <= 75));
        assert_eq!(decode_encoded_words(&encoded), text);
    }

    #[test]
    fn test_decode_encoded_words() {
        assert_eq!(decode_encoded_words("Hello"), "Hello");
        assert_eq!(decode_encoded_words("=?utf-8?B?SMOpbGxv?="), "Héllo");
        assert_eq!(decode_encoded_words("=?utf-8?Q?H=C3=A9llo_there?="), "Héllo there");
    }

    #[test]
    fn test_decode_adjacent_words_drop_whitespace() {
        let input = "=?UTF-8?B?SG9sYQ==?= =?UTF-8?B?IG11bmRv?=";
        assert_eq!(decode_encoded_words(input), "Hola mundo");
    }

    #[test]
    fn test_decode_mixed_plain_and_encoded() {
        let input = "Re: =?iso-8859-1?Q?caf=E9?= order";
        assert_eq!(decode_encoded_words(input), "Re: café order");
    }

    #[test]
    fn test_decode_malformed_word_is_kept() {
        assert_eq!(decode_encoded_words("=?utf-8?X?abc?="), "=?utf-8?X?abc?=");
        assert_eq!(decode_encoded_words("price =? unknown"), "price =? unknown");
    }

    #[test]
    fn test_decode_charset_unknown_falls_back() {
        assert_eq!(decode_charset("x-made-up", b"plain"), "plain");
        assert_eq!(decode_charset("windows-1252", &[0x80]), "€");
    }

    proptest! {
        #[test]
        fn prop_quoted_printable_preserves_text(text in "[ -~é€\n]{0,200}") {
            let encoded = encode_quoted_printable(&text);
            let expected = text.replace('\n', "\r\n");
            prop_assert_eq!(decode_quoted_printable(&encoded).unwrap(), expected);
        }

        #[test]
        fn prop_encoded_words_preserve_text(text in "\\PC{0,80}") {
            let encoded = encode_rfc2047(&text, "utf-8");
            prop_assert_eq!(decode_encoded_words(&encoded), text);
        }
    }
}
