//! Mailbox address parsing and formatting (RFC 5322 section 3.4).

use crate::encoding::{decode_encoded_words, encode_rfc2047};
use crate::error::{Error, Result};
use std::fmt;

/// A single mailbox: an address with an optional display name.
///
/// - `"Juan García <juan@example.com>"` has display name `Juan García`
/// - `"user@example.com"` has no display name
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Mailbox {
    /// Human-readable display name.
    pub display_name: Option<String>,
    /// The bare address (`local@domain`).
    pub address: String,
}

impl Mailbox {
    /// Creates a mailbox without a display name.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            display_name: None,
            address: address.into(),
        }
    }

    /// Creates a mailbox with a display name.
    #[must_use]
    pub fn with_name(address: impl Into<String>, display_name: impl Into<String>) -> Self {
        let display_name = display_name.into();
        Self {
            display_name: (!display_name.trim().is_empty()).then_some(display_name),
            address: address.into(),
        }
    }

    /// Parses a single mailbox from a header value.
    ///
    /// Supported formats: `user@domain`, `<user@domain>`,
    /// `Display Name <user@domain>`, `"Last, First" <user@domain>` and
    /// encoded-word display names.
    ///
    /// # Errors
    ///
    /// Returns an error if no `local@domain` address can be found.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();

        let (name_part, address) = match (trimmed.rfind('<'), trimmed.rfind('>')) {
            (Some(open), Some(close)) if close > open => {
                (&trimmed[..open], trimmed[open + 1..close].trim())
            }
            _ => ("", trimmed),
        };

        let address = strip_comment(address);
        if !looks_like_address(address) {
            return Err(Error::InvalidAddress(raw.to_string()));
        }

        let display_name = unquote(name_part.trim());
        let display_name = decode_encoded_words(&display_name);

        Ok(Self::with_name(address, display_name))
    }

    /// Parses a comma-separated address list.
    ///
    /// Commas inside quotes or angle brackets do not split. Group syntax
    /// (`team: a@x.com, b@x.com;`) is flattened.
    ///
    /// # Errors
    ///
    /// Returns an error if any entry is not a valid mailbox.
    pub fn parse_list(raw: &str) -> Result<Vec<Self>> {
        split_list(raw)
            .iter()
            .map(|entry| Self::parse(entry))
            .collect()
    }

    /// Formats the mailbox for a header, RFC 2047-encoding a non-ASCII display name.
    #[must_use]
    pub fn encoded(&self) -> String {
        match &self.display_name {
            Some(name) if crate::encoding::needs_encoding(name) => {
                format!("{} <{}>", encode_rfc2047(name, "utf-8"), self.address)
            }
            Some(name) => format!("{} <{}>", quote_if_needed(name), self.address),
            None => format!("<{}>", self.address),
        }
    }

    /// Returns the domain part of the address.
    #[must_use]
    pub fn domain(&self) -> &str {
        self.address.rsplit_once('@').map_or("", |(_, domain)| domain)
    }
}

impl fmt::Display for Mailbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.display_name {
            Some(name) => write!(f, "{name} <{}>", self.address),
            None => f.write_str(&self.address),
        }
    }
}

/// Formats a list of mailboxes as a header value.
#[must_use]
pub fn format_list(mailboxes: &[Mailbox]) -> String {
    mailboxes
        .iter()
        .map(Mailbox::encoded)
        .collect::<Vec<_>>()
        .join(", ")
}

fn looks_like_address(address: &str) -> bool {
    match address.rsplit_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !address.contains(char::is_whitespace)
                && !address.contains(['<', '>', ','])
        }
        None => false,
    }
}

/// Drops a trailing `(comment)` after a bare address.
fn strip_comment(address: &str) -> &str {
    address
        .find('(')
        .map_or(address, |index| address[..index].trim_end())
}

fn unquote(name: &str) -> String {
    name.strip_prefix('"')
        .and_then(|n| n.strip_suffix('"'))
        .map_or_else(|| name.to_string(), |n| n.replace("\\\"", "\"").replace("\\\\", "\\"))
}

fn quote_if_needed(name: &str) -> String {
    if name.contains(|c: char| "()<>[]:;@\\,.\"".contains(c)) {
        format!("\"{}\"", name.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        name.to_string()
    }
}

fn split_list(raw: &str) -> Vec<String> {
    let mut entries = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut in_angle = false;

    let mut push = |current: &mut String| {
        let entry = current.trim();
        if !entry.is_empty() {
            entries.push(entry.to_string());
        }
        current.clear();
    };

    for ch in raw.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                current.push(ch);
            }
            '<' if !in_quotes => {
                in_angle = true;
                current.push(ch);
            }
            '>' if !in_quotes => {
                in_angle = false;
                current.push(ch);
            }
            // Group name: drop what was collected before the colon
            ':' if !in_quotes && !in_angle => current.clear(),
            ',' | ';' if !in_quotes && !in_angle => push(&mut current),
            _ => current.push(ch),
        }
    }
    push(&mut current);

    entries
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare() {
        let mb = Mailbox::parse(" user@example.com ").unwrap();
        assert_eq!(mb.address, "user@example.com");
        assert!(mb.display_name.is_none());
    }

    #[test]
    fn test_parse_named() {
        let mb = Mailbox::parse("Jane Doe <jane@example.com>").unwrap();
        assert_eq!(mb.address, "jane@example.com");
        assert_eq!(mb.display_name.as_deref(), Some("Jane Doe"));
        assert_eq!(mb.domain(), "example.com");
    }

    #[test]
    fn test_parse_quoted_and_encoded() {
        let mb = Mailbox::parse("\"Doe, Jane\" <jane@example.com>").unwrap();
        assert_eq!(mb.display_name.as_deref(), Some("Doe, Jane"));

        let mb = Mailbox::parse("=?UTF-8?Q?Jos=C3=A9?= <jose@example.com>").unwrap();
        assert_eq!(mb.display_name.as_deref(), Some("José"));
    }

    #[test]
    fn test_parse_comment_and_empty_angle_name() {
        let mb = Mailbox::parse("user@example.com (Work)").unwrap();
        assert_eq!(mb.address, "user@example.com");

        let mb = Mailbox::parse("<user@example.com>").unwrap();
        assert!(mb.display_name.is_none());
    }

    #[test]
    fn test_parse_invalid() {
        assert!(Mailbox::parse("").is_err());
        assert!(Mailbox::parse("not an address").is_err());
        assert!(Mailbox::parse("Name <@example.com>").is_err());
    }

    #[test]
    fn test_parse_list() {
        let list = Mailbox::parse_list(
            "\"Last, First\" <a@example.com>, b@example.com, team: c@example.com, d@example.com;",
        )
        .unwrap();
        let addresses: Vec<_> = list.iter().map(|m| m.address.as_str()).collect();
        assert_eq!(
            addresses,
            vec!["a@example.com", "b@example.com", "c@example.com", "d@example.com"]
        );
        assert_eq!(list[0].display_name.as_deref(), Some("Last, First"));
    }

    #[test]
    fn test_parse_list_empty() {
        assert!(Mailbox::parse_list("").unwrap().is_empty());
        assert!(Mailbox::parse_list(" , ").unwrap().is_empty());
    }

    #[test]
    fn test_encoded() {
        assert_eq!(Mailbox::new("a@example.com").encoded(), "<a@example.com>");
        assert_eq!(
            Mailbox::with_name("a@example.com", "Doe, Jane").encoded(),
            "\"Doe, Jane\" <a@example.com>"
        );
        assert_eq!(
            Mailbox::with_name("a@example.com", "Héllo").encoded(),
            "=?utf-8?B?SMOpbGxv?= <a@example.com>"
        );
    }

    #[test]
    fn test_format_list() {
        let list = vec![
            Mailbox::new("a@example.com"),
            Mailbox::with_name("b@example.com", "Bee"),
        ];
        assert_eq!(format_list(&list), "<a@example.com>, Bee <b@example.com>");
    }
}
