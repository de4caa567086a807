//! MIME message structure, parsing and serialization.

use crate::content_type::{ContentDisposition, ContentType, DispositionType};
use crate::encoding::{decode_base64, decode_charset, decode_quoted_printable_bytes};
use crate::error::{Error, Result};
use crate::header::Headers;
use std::fmt;

/// Maximum multipart nesting accepted by the parser.
const MAX_DEPTH: usize = 16;

/// Transfer encoding types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEncoding {
    /// 7-bit ASCII.
    SevenBit,
    /// 8-bit binary.
    EightBit,
    /// Base64 encoding.
    Base64,
    /// Quoted-Printable encoding.
    QuotedPrintable,
    /// Binary (no encoding).
    Binary,
}

impl TransferEncoding {
    /// Parses transfer encoding from string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "8bit" => Self::EightBit,
            "base64" => Self::Base64,
            "quoted-printable" => Self::QuotedPrintable,
            "binary" => Self::Binary,
            _ => Self::SevenBit, // Default (includes "7bit")
        }
    }
}

impl fmt::Display for TransferEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SevenBit => write!(f, "7bit"),
            Self::EightBit => write!(f, "8bit"),
            Self::Base64 => write!(f, "base64"),
            Self::QuotedPrintable => write!(f, "quoted-printable"),
            Self::Binary => write!(f, "binary"),
        }
    }
}

/// A MIME entity: headers plus either a leaf body or child parts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Part {
    /// Part headers.
    pub headers: Headers,
    /// Leaf body, still transfer-encoded. Empty for multipart entities.
    pub body: Vec<u8>,
    /// Child parts of a multipart entity.
    pub children: Vec<Part>,
}

impl Part {
    /// Creates a leaf part.
    #[must_use]
    pub const fn new(headers: Headers, body: Vec<u8>) -> Self {
        Self {
            headers,
            body,
            children: Vec::new(),
        }
    }

    /// Creates a multipart entity.
    #[must_use]
    pub const fn multipart(headers: Headers, children: Vec<Self>) -> Self {
        Self {
            headers,
            body: Vec::new(),
            children,
        }
    }

    /// Parses an entity (headers, blank line, body).
    ///
    /// # Errors
    ///
    /// Returns an error if a multipart entity has no boundary or
    /// the nesting is too deep.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        Self::parse_at_depth(raw, 0)
    }

    fn parse_at_depth(raw: &[u8], depth: usize) -> Result<Self> {
        if depth > MAX_DEPTH {
            return Err(Error::InvalidMultipart("Nesting too deep".to_string()));
        }

        let (header_bytes, body) = split_header_body(raw);
        let headers = Headers::parse(&decode_charset("utf-8", header_bytes));

        let content_type = headers
            .get("content-type")
            .and_then(|ct| ContentType::parse(ct).ok())
            .unwrap_or_default();

        if !content_type.is_multipart() {
            return Ok(Self::new(headers, body.to_vec()));
        }

        let boundary = content_type.boundary().ok_or(Error::MissingBoundary)?;
        let children = split_multipart(body, boundary)
            .into_iter()
            .map(|section| Self::parse_at_depth(section, depth + 1))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::multipart(headers, children))
    }

    /// Gets the content type, defaulting to `text/plain` when absent or malformed.
    #[must_use]
    pub fn content_type(&self) -> ContentType {
        self.headers
            .get("content-type")
            .and_then(|ct| ContentType::parse(ct).ok())
            .unwrap_or_default()
    }

    /// Gets the content disposition, if declared.
    #[must_use]
    pub fn content_disposition(&self) -> Option<ContentDisposition> {
        self.headers
            .get("content-disposition")
            .map(ContentDisposition::parse)
    }

    /// Gets the content id without angle brackets.
    #[must_use]
    pub fn content_id(&self) -> Option<String> {
        self.headers
            .get("content-id")
            .map(|id| id.trim().trim_start_matches('<').trim_end_matches('>').to_string())
            .filter(|id| !id.is_empty())
    }

    /// Gets the transfer encoding.
    #[must_use]
    pub fn transfer_encoding(&self) -> TransferEncoding {
        self.headers
            .get("content-transfer-encoding")
            .map_or(TransferEncoding::SevenBit, TransferEncoding::parse)
    }

    /// Returns the filename from the disposition or the content type `name`.
    #[must_use]
    pub fn filename(&self) -> Option<String> {
        self.content_disposition()
            .and_then(|d| d.filename)
            .or_else(|| {
                self.content_type()
                    .parameter("name")
                    .map(crate::encoding::decode_encoded_words)
            })
    }

    /// Returns true if this part is an attachment rather than body text.
    #[must_use]
    pub fn is_attachment(&self) -> bool {
        match self.content_disposition() {
            Some(d) => d.kind == DispositionType::Attachment || d.filename.is_some(),
            None => !self.content_type().is_text() && !self.content_type().is_multipart(),
        }
    }

    /// Checks if this is a multipart entity.
    #[must_use]
    pub fn is_multipart(&self) -> bool {
        !self.children.is_empty() || self.content_type().is_multipart()
    }

    /// Decodes the body according to the transfer encoding.
    ///
    /// # Errors
    ///
    /// Returns an error if decoding fails.
    pub fn decode_body(&self) -> Result<Vec<u8>> {
        match self.transfer_encoding() {
            TransferEncoding::Base64 => decode_base64(&String::from_utf8_lossy(&self.body)),
            TransferEncoding::QuotedPrintable => Ok(decode_quoted_printable_bytes(
                &String::from_utf8_lossy(&self.body),
            )),
            _ => Ok(self.body.clone()),
        }
    }

    /// Gets the decoded body as text, honoring the charset parameter.
    ///
    /// # Errors
    ///
    /// Returns an error if transfer decoding fails.
    pub fn body_text(&self) -> Result<String> {
        let decoded = self.decode_body()?;
        let content_type = self.content_type();
        let charset = content_type.charset().unwrap_or("utf-8");
        Ok(decode_charset(charset, &decoded))
    }

    /// Iterates over all leaf parts, depth first.
    #[must_use]
    pub fn leaves(&self) -> Vec<&Self> {
        if self.children.is_empty() {
            return vec![self];
        }
        self.children.iter().flat_map(Self::leaves).collect()
    }

    /// Serializes the entity, writing child parts between boundary lines.
    ///
    /// # Errors
    ///
    /// Returns an error if a multipart entity lacks a boundary.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = self.headers.to_string().into_bytes();
        out.extend_from_slice(b"\r\n");

        if self.children.is_empty() {
            out.extend_from_slice(&self.body);
            return Ok(out);
        }

        let content_type = self.content_type();
        let boundary = content_type.boundary().ok_or(Error::MissingBoundary)?;
        for child in &self.children {
            out.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
            out.extend_from_slice(&child.to_bytes()?);
            out.extend_from_slice(b"\r\n");
        }
        out.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

        Ok(out)
    }
}

/// A complete RFC 822 message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    /// Top-level entity; its headers are the message headers.
    pub root: Part,
}

impl Message {
    /// Wraps a top-level entity.
    #[must_use]
    pub const fn new(root: Part) -> Self {
        Self { root }
    }

    /// Parses a raw message.
    ///
    /// # Errors
    ///
    /// Returns an error if the MIME structure is invalid.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        Part::parse(raw).map(Self::new)
    }

    /// Message headers.
    #[must_use]
    pub const fn headers(&self) -> &Headers {
        &self.root.headers
    }

    /// Gets the decoded Subject header.
    #[must_use]
    pub fn subject(&self) -> Option<String> {
        self.root.headers.get_decoded("subject")
    }

    /// Gets the Message-ID header without angle brackets.
    #[must_use]
    pub fn message_id(&self) -> Option<String> {
        self.root
            .headers
            .get("message-id")
            .and_then(|v| extract_ids(v).into_iter().next())
    }

    /// Serializes the message.
    ///
    /// # Errors
    ///
    /// Returns an error if a multipart entity lacks a boundary.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.root.to_bytes()
    }
}

/// Extracts `<id>` tokens from a header such as References.
///
/// A value with no angle brackets is returned as a single id.
#[must_use]
pub fn extract_ids(value: &str) -> Vec<String> {
    let mut ids = Vec::new();
    let mut remaining = value;
    while let Some(start) = remaining.find('<') {
        let Some(len) = remaining[start..].find('>') else {
            break;
        };
        let id = remaining[start + 1..start + len].trim();
        if !id.is_empty() {
            ids.push(id.to_string());
        }
        remaining = &remaining[start + len + 1..];
    }
    if ids.is_empty() && !value.trim().is_empty() {
        ids.push(value.trim().to_string());
    }
    ids
}

/// Splits at the first empty line. A message without one is header-only.
fn split_header_body(raw: &[u8]) -> (&[u8], &[u8]) {
    if raw.starts_with(b"\r\n") {
        return (&[], &raw[2..]);
    }
    if raw.starts_with(b"\n") {
        return (&[], &raw[1..]);
    }
    for i in 0..raw.len() {
        if raw[i..].starts_with(b"\r\n\r\n") {
            return (&raw[..i + 2], &raw[i + 4..]);
        }
        if raw[i..].starts_with(b"\n\n") {
            return (&raw[..i + 1], &raw[i + 2..]);
        }
    }
    (raw, &[])
}

/// Returns the sections between `--boundary` delimiter lines.
///
/// The preamble and epilogue are discarded. A missing close delimiter is
/// tolerated.
fn split_multipart<'a>(body: &'a [u8], boundary: &str) -> Vec<&'a [u8]> {
    let delimiter = format!("--{boundary}");
    let delimiter = delimiter.as_bytes();

    let mut sections = Vec::new();
    let mut section_start: Option<usize> = None;
    let mut line_start = 0;

    while line_start < body.len() {
        let line_end = body[line_start..]
            .iter()
            .position(|&b| b == b'\n')
            .map_or(body.len(), |p| line_start + p + 1);
        let line = trim_line_ending(&body[line_start..line_end]);

        if line.starts_with(delimiter) {
            let rest = trim_trailing_whitespace(&line[delimiter.len()..]);
            let is_close = rest == b"--";
            if rest.is_empty() || is_close {
                if let Some(start) = section_start.take() {
                    sections.push(strip_final_newline(&body[start..line_start]));
                }
                if is_close {
                    return sections;
                }
                section_start = Some(line_end);
            }
        }

        line_start = line_end;
    }

    if let Some(start) = section_start {
        sections.push(&body[start.min(body.len())..]);
    }
    sections
}

fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

fn trim_trailing_whitespace(mut bytes: &[u8]) -> &[u8] {
    while let [rest @ .., b' ' | b'\t'] = bytes {
        bytes = rest;
    }
    bytes
}

/// The line break before a delimiter belongs to the delimiter.
fn strip_final_newline(section: &[u8]) -> &[u8] {
    let section = section.strip_suffix(b"\n").unwrap_or(section);
    section.strip_suffix(b"\r").unwrap_or(section)
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

    const MULTIPART: &str = concat!(
        "From: sender@example.com\r\n",
        "Subject: =?utf-8?B?SMOpbGxv?=\r\n",
        "Message-ID: <abc@example.com>\r\n",
        "Content-Type: multipart/mixed; boundary=\"outer\"\r\n",
        "\r\n",
        "This is a preamble.\r\n",
        "--outer\r\n",
        "Content-Type: multipart/alternative; boundary=inner\r\n",
        "\r\n",
        "--inner\r\n",
        "Content-Type: text/plain; charset=utf-8\r\n",
        "Content-Transfer-Encoding: quoted-printable\r\n",
        "\r\n",
        "Caf=C3=A9\r\n",
        "--inner\r\n",
        "Content-Type: text/html; charset=utf-8\r\n",
        "\r\n",
        "<p>Caf\u{e9}</p>\r\n",
        "--inner--\r\n",
        "--outer\r\n",
        "Content-Type: application/pdf; name=\"doc.pdf\"\r\n",
        "Content-Disposition: attachment; filename=\"doc.pdf\"\r\n",
        "Content-Transfer-Encoding: base64\r\n",
        "\r\n",
        "SGVsbG8s\r\n",
        "IFdvcmxkIQ==\r\n",
        "--outer--\r\n",
        "epilogue\r\n"
    );

    #[test]
    fn test_transfer_encoding_parse() {
        assert_eq!(TransferEncoding::parse("7bit"), TransferEncoding::SevenBit);
        assert_eq!(TransferEncoding::parse("BASE64"), TransferEncoding::Base64);
        assert_eq!(
            TransferEncoding::parse("quoted-printable"),
            TransferEncoding::QuotedPrintable
        );
    }

    #[test]
    fn test_parse_single_part() {
        let raw = b"From: a@example.com\r\nSubject: Hi\r\n\r\nHello, World!";
        let message = Message::parse(raw).unwrap();
        assert_eq!(message.subject().as_deref(), Some("Hi"));
        assert!(message.root.children.is_empty());
        assert_eq!(message.root.body_text().unwrap(), "Hello, World!");
    }

    #[test]
    fn test_parse_header_only() {
        let message = Message::parse(b"Subject: Only headers\r\n").unwrap();
        assert_eq!(message.subject().as_deref(), Some("Only headers"));
        assert!(message.root.body.is_empty());
    }

    #[test]
    fn test_parse_nested_multipart() {
        let message = Message::parse(MULTIPART.as_bytes()).unwrap();
        assert_eq!(message.subject().as_deref(), Some("Héllo"));
        assert_eq!(message.message_id().as_deref(), Some("abc@example.com"));
        assert_eq!(message.root.children.len(), 2);

        let leaves = message.root.leaves();
        assert_eq!(leaves.len(), 3);
        assert_eq!(leaves[0].body_text().unwrap(), "Café");
        assert_eq!(leaves[1].body_text().unwrap(), "<p>Café</p>");
        assert!(leaves[2].is_attachment());
        assert_eq!(leaves[2].filename().as_deref(), Some("doc.pdf"));
        assert_eq!(leaves[2].decode_body().unwrap(), b"Hello, World!");
    }

    #[test]
    fn test_parse_latin1_body() {
        let mut raw = b"Content-Type: text/plain; charset=iso-8859-1\r\n\r\ncaf".to_vec();
        raw.push(0xE9);
        let message = Message::parse(&raw).unwrap();
        assert_eq!(message.root.body_text().unwrap(), "café");
    }

    #[test]
    fn test_parse_missing_boundary() {
        let raw = b"Content-Type: multipart/mixed\r\n\r\nbody";
        assert!(matches!(Message::parse(raw), Err(Error::MissingBoundary)));
    }

    #[test]
    fn test_parse_unterminated_multipart() {
        let raw = concat!(
            "Content-Type: multipart/mixed; boundary=b\n",
            "\n",
            "--b\n",
            "Content-Type: text/plain\n",
            "\n",
            "first\n",
            "--b\n",
            "\n",
            "second"
        );
        let message = Message::parse(raw.as_bytes()).unwrap();
        let texts: Vec<_> = message
            .root
            .leaves()
            .iter()
            .map(|p| p.body_text().unwrap())
            .collect();
        assert_eq!(texts, vec!["first", "second"]);
    }

    #[test]
    fn test_serialize_then_parse_structure() {
        let mut inner_headers = Headers::new();
        inner_headers.add("Content-Type", "text/plain; charset=utf-8");
        let child = Part::new(inner_headers, b"hello".to_vec());

        let mut headers = Headers::new();
        headers.add("Content-Type", "multipart/mixed; boundary=zzz");
        let root = Part::multipart(headers, vec![child.clone()]);

        let bytes = Message::new(root).to_bytes().unwrap();
        let parsed = Message::parse(&bytes).unwrap();
        assert_eq!(parsed.root.children, vec![child]);
    }

    #[test]
    fn test_extract_ids() {
        assert_eq!(
            extract_ids("<a@x> <b@x>\r\n <c@x>"),
            vec!["a@x", "b@x", "c@x"]
        );
        assert_eq!(extract_ids("bare@x"), vec!["bare@x"]);
        assert!(extract_ids("  ").is_empty());
    }
}
