//! MIME content type and content disposition handling.

use crate::encoding::decode_encoded_words;
use crate::error::{Error, Result};
use std::fmt;

/// Characters that force a parameter value to be quoted (RFC 2045 tspecials).
const TSPECIALS: &str = "()<>@,;:\\\"/[]?=";

/// MIME content type with parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    /// Main type (e.g., "text", "image", "multipart").
    pub main_type: String,
    /// Subtype (e.g., "plain", "html", "jpeg").
    pub sub_type: String,
    /// Parameters in declaration order, names lowercased.
    pub parameters: Vec<(String, String)>,
}

impl ContentType {
    /// Creates a new content type.
    #[must_use]
    pub fn new(main_type: impl Into<String>, sub_type: impl Into<String>) -> Self {
        Self {
            main_type: main_type.into(),
            sub_type: sub_type.into(),
            parameters: Vec::new(),
        }
    }

    /// Creates a text/plain content type.
    #[must_use]
    pub fn text_plain() -> Self {
        Self::new("text", "plain").with_parameter("charset", "utf-8")
    }

    /// Creates a text/html content type.
    #[must_use]
    pub fn text_html() -> Self {
        Self::new("text", "html").with_parameter("charset", "utf-8")
    }

    /// Creates a multipart content type of the given subtype with boundary.
    #[must_use]
    pub fn multipart(sub_type: impl Into<String>, boundary: impl Into<String>) -> Self {
        Self::new("multipart", sub_type).with_parameter("boundary", boundary)
    }

    /// Parses a `type/subtype` MIME type string without parameters.
    ///
    /// Falls back to `application/octet-stream` when malformed.
    #[must_use]
    pub fn from_mime_type(mime_type: &str) -> Self {
        match mime_type.trim().split_once('/') {
            Some((main, sub)) if !main.is_empty() && !sub.is_empty() => {
                Self::new(main.to_lowercase(), sub.to_lowercase())
            }
            _ => Self::new("application", "octet-stream"),
        }
    }

    /// Adds or replaces a parameter.
    #[must_use]
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into().to_lowercase();
        let value = value.into();
        if let Some(existing) = self.parameters.iter_mut().find(|(k, _)| *k == key) {
            existing.1 = value;
        } else {
            self.parameters.push((key, value));
        }
        self
    }

    /// Returns a parameter value by (case-insensitive) name.
    #[must_use]
    pub fn parameter(&self, key: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Returns the charset parameter if present.
    #[must_use]
    pub fn charset(&self) -> Option<&str> {
        self.parameter("charset")
    }

    /// Returns the boundary parameter if present.
    #[must_use]
    pub fn boundary(&self) -> Option<&str> {
        self.parameter("boundary")
    }

    /// Returns the `type/subtype` essence, e.g. `text/plain`.
    #[must_use]
    pub fn essence(&self) -> String {
        format!("{}/{}", self.main_type, self.sub_type)
    }

    /// Checks if this is a multipart content type.
    #[must_use]
    pub fn is_multipart(&self) -> bool {
        self.main_type.eq_ignore_ascii_case("multipart")
    }

    /// Checks if this is a text content type.
    #[must_use]
    pub fn is_text(&self) -> bool {
        self.main_type.eq_ignore_ascii_case("text")
    }

    /// Checks for an exact `type/subtype` match.
    #[must_use]
    pub fn is(&self, main_type: &str, sub_type: &str) -> bool {
        self.main_type.eq_ignore_ascii_case(main_type) && self.sub_type.eq_ignore_ascii_case(sub_type)
    }

    /// Parses a content type string.
    ///
    /// Format: `type/subtype; param1=value1; param2="value 2"`
    ///
    /// # Errors
    ///
    /// Returns an error if the type or subtype is missing.
    pub fn parse(s: &str) -> Result<Self> {
        let mut parts = split_parameters(s).into_iter();

        let type_str = parts
            .next()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::InvalidContentType("Empty content type".to_string()))?;

        let (main_type, sub_type) = type_str
            .split_once('/')
            .ok_or_else(|| Error::InvalidContentType(format!("Missing subtype in {type_str}")))?;
        let main_type = main_type.trim().to_lowercase();
        let sub_type = sub_type.trim().to_lowercase();
        if main_type.is_empty() || sub_type.is_empty() {
            return Err(Error::InvalidContentType(type_str));
        }

        let mut content_type = Self::new(main_type, sub_type);
        for (key, value) in parts.filter_map(|p| parse_parameter(&p)) {
            content_type = content_type.with_parameter(key, value);
        }

        Ok(content_type)
    }
}

impl Default for ContentType {
    fn default() -> Self {
        Self::text_plain()
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.main_type, self.sub_type)?;
        write_parameters(f, &self.parameters)
    }
}

/// Disposition type of a body part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispositionType {
    /// Displayed as part of the message.
    Inline,
    /// Presented as a separate attachment.
    Attachment,
}

/// Parsed `Content-Disposition` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDisposition {
    /// Disposition type.
    pub kind: DispositionType,
    /// Filename parameter, with encoded words decoded.
    pub filename: Option<String>,
}

impl ContentDisposition {
    /// Creates an attachment disposition.
    #[must_use]
    pub fn attachment(filename: impl Into<String>) -> Self {
        Self {
            kind: DispositionType::Attachment,
            filename: Some(filename.into()),
        }
    }

    /// Creates an inline disposition.
    #[must_use]
    pub fn inline(filename: impl Into<String>) -> Self {
        Self {
            kind: DispositionType::Inline,
            filename: Some(filename.into()),
        }
    }

    /// Parses a disposition header value. Unknown types are treated as attachments
    /// (RFC 2183 section 2.8).
    #[must_use]
    pub fn parse(s: &str) -> Self {
        let mut parts = split_parameters(s).into_iter();
        let kind = match parts.next() {
            Some(t) if t.eq_ignore_ascii_case("inline") => DispositionType::Inline,
            _ => DispositionType::Attachment,
        };
        let filename = parts
            .filter_map(|p| parse_parameter(&p))
            .find(|(k, _)| k == "filename")
            .map(|(_, v)| decode_encoded_words(&v));

        Self { kind, filename }
    }
}

impl fmt::Display for ContentDisposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            DispositionType::Inline => f.write_str("inline")?,
            DispositionType::Attachment => f.write_str("attachment")?,
        }
        if let Some(filename) = &self.filename {
            let encoded = crate::encoding::encode_rfc2047(filename, "utf-8");
            write_parameters(f, &[("filename".to_string(), encoded)])?;
        }
        Ok(())
    }
}

fn write_parameters(f: &mut fmt::Formatter<'_>, parameters: &[(String, String)]) -> fmt::Result {
    for (key, value) in parameters {
        if value.is_empty() || value.contains(|c: char| c.is_whitespace() || TSPECIALS.contains(c)) {
            let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
            write!(f, "; {key}=\"{escaped}\"")?;
        } else {
            write!(f, "; {key}={value}")?;
        }
    }
    Ok(())
}

/// Splits a header value on `;` outside of quoted strings.
fn split_parameters(s: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            current.push(ch);
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_quotes => {
                current.push(ch);
                escaped = true;
            }
            '"' => {
                in_quotes = !in_quotes;
                current.push(ch);
            }
            ';' if !in_quotes => {
                parts.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    if !current.trim().is_empty() {
        parts.push(current.trim().to_string());
    }

    parts
}

fn parse_parameter(param: &str) -> Option<(String, String)> {
    let (key, value) = param.split_once('=')?;
    let key = key.trim().to_lowercase();
    let value = value.trim();
    let value = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .map_or_else(|| value.to_string(), |v| v.replace("\\\"", "\"").replace("\\\\", "\\"));
    Some((key, value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_text_plain() {
        let ct = ContentType::text_plain();
        assert!(ct.is("text", "plain"));
        assert_eq!(ct.charset(), Some("utf-8"));
        assert_eq!(ct.to_string(), "text/plain; charset=utf-8");
    }

    #[test]
    fn test_multipart() {
        let ct = ContentType::multipart("mixed", "b1");
        assert!(ct.is_multipart());
        assert_eq!(ct.boundary(), Some("b1"));
    }

    #[test]
    fn test_content_type_parse() {
        let ct = ContentType::parse("Text/Plain; Charset=UTF-8").unwrap();
        assert_eq!(ct.essence(), "text/plain");
        assert_eq!(ct.charset(), Some("UTF-8"));
    }

    #[test]
    fn test_content_type_parse_quoted_semicolon() {
        let ct =
            ContentType::parse("application/pdf; name=\"a;b.pdf\"; x=\"say \\\"hi\\\"\"").unwrap();
        assert_eq!(ct.parameter("name"), Some("a;b.pdf"));
        assert_eq!(ct.parameter("x"), Some("say \"hi\""));
    }

    #[test]
    fn test_content_type_parse_boundary_with_equals() {
        let ct = ContentType::parse("multipart/mixed; boundary=\"----=_Part_123\"").unwrap();
        assert_eq!(ct.boundary(), Some("----=_Part_123"));
        assert_eq!(ct.to_string(), "multipart/mixed; boundary=\"----=_Part_123\"");
    }

    #[test]
    fn test_content_type_parse_invalid() {
        assert!(ContentType::parse("").is_err());
        assert!(ContentType::parse("textplain").is_err());
        assert!(ContentType::parse("text/").is_err());
    }

    #[test]
    fn test_from_mime_type_fallback() {
        assert_eq!(ContentType::from_mime_type("image/PNG").essence(), "image/png");
        assert_eq!(
            ContentType::from_mime_type("garbage").essence(),
            "application/octet-stream"
        );
    }

    #[test]
    fn test_disposition_parse() {
        let d = ContentDisposition::parse("attachment; filename=\"report 1.pdf\"");
        assert_eq!(d.kind, DispositionType::Attachment);
        assert_eq!(d.filename.as_deref(), Some("report 1.pdf"));

        let d = ContentDisposition::parse("INLINE");
        assert_eq!(d.kind, DispositionType::Inline);
        assert!(d.filename.is_none());

        let d = ContentDisposition::parse("x-unknown; filename==?utf-8?B?w6kucG5n?=");
        assert_eq!(d.kind, DispositionType::Attachment);
        assert_eq!(d.filename.as_deref(), Some("é.png"));
    }

    #[test]
    fn test_disposition_display_encodes_filename() {
        let d = ContentDisposition::attachment("é.png");
        assert_eq!(d.to_string(), "attachment; filename=\"=?utf-8?B?w6kucG5n?=\"");
    }
}
