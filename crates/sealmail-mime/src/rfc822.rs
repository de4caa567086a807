//! Conversion between message details and RFC 822 internet message data.
//!
//! Encrypted messages travel as ordinary RFC 822 messages whose visible
//! body is a fixed notice; the sealed body and the per-recipient key
//! exchange data ride along as attachments of well-known types.

use chrono::{DateTime, Utc};

use crate::address::Mailbox;
use crate::builder::{Attachment, MessageBuilder};
use crate::error::Result;
use crate::message::{Message, Part, extract_ids};

/// Visible body of an encrypted message.
pub const ENCRYPTED_BODY_NOTICE: &str = "Encrypted message attached";

/// Whether a message body is end-to-end encrypted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EncryptionStatus {
    /// Body is sent as-is.
    #[default]
    Unencrypted,
    /// Body is sealed and carried as a secure attachment.
    Encrypted,
}

/// Format of the message body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BodyFormat {
    /// `text/plain`.
    #[default]
    Plain,
    /// `text/html`.
    Html,
}

/// Well-known attachments carrying encrypted content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecureAttachmentType {
    /// The sealed message body.
    Body,
    /// Key exchange data for one recipient.
    KeyExchange,
}

impl SecureAttachmentType {
    /// File name of the attachment.
    #[must_use]
    pub const fn filename(self) -> &'static str {
        match self {
            Self::Body => "Secure Data",
            Self::KeyExchange => "Secure Email Key Exchange",
        }
    }

    /// MIME type of the attachment.
    #[must_use]
    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Body => "application/x-sealmail-body",
            Self::KeyExchange => "application/x-sealmail-key-exchange",
        }
    }

    /// Content id of the attachment.
    #[must_use]
    pub const fn content_id(self) -> &'static str {
        match self {
            Self::Body => "securebody@sealmail",
            Self::KeyExchange => "securekeyexchange@sealmail",
        }
    }

    /// Wraps data as an attachment of this type.
    #[must_use]
    pub fn attachment(self, data: Vec<u8>) -> Attachment {
        Attachment::new(self.filename(), self.mime_type(), data).with_content_id(self.content_id())
    }

    /// Wraps data as the `index`th attachment of this type. Content ids stay
    /// unique when a message carries several, one per key holder.
    #[must_use]
    pub fn indexed_attachment(self, index: usize, data: Vec<u8>) -> Attachment {
        let (local, domain) = self
            .content_id()
            .split_once('@')
            .unwrap_or((self.content_id(), ""));
        Attachment::new(self.filename(), self.mime_type(), data)
            .with_content_id(format!("{local}{index}@{domain}"))
    }

    /// Identifies the secure type of an attachment, by MIME type or content id.
    #[must_use]
    pub fn of(attachment: &Attachment) -> Option<Self> {
        [Self::Body, Self::KeyExchange].into_iter().find(|kind| {
            attachment.mime_type.eq_ignore_ascii_case(kind.mime_type())
                || attachment
                    .content_id
                    .as_deref()
                    .is_some_and(|id| kind.matches_content_id(id))
        })
    }

    fn matches_content_id(self, id: &str) -> bool {
        let Some((local, domain)) = self.content_id().split_once('@') else {
            return id == self.content_id();
        };
        id.strip_suffix(domain)
            .and_then(|rest| rest.strip_suffix('@'))
            .and_then(|rest| rest.strip_prefix(local))
            .is_some_and(|index| index.bytes().all(|b| b.is_ascii_digit()))
    }
}

/// Everything needed to build, or read back from, an RFC 822 message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EmailMessageDetails {
    /// Sender(s).
    pub from: Vec<Mailbox>,
    /// To recipients.
    pub to: Vec<Mailbox>,
    /// Cc recipients.
    pub cc: Vec<Mailbox>,
    /// Bcc recipients.
    pub bcc: Vec<Mailbox>,
    /// Reply-To addresses.
    pub reply_to: Vec<Mailbox>,
    /// Subject, with encoded words decoded.
    pub subject: Option<String>,
    /// Body text.
    pub body: Option<String>,
    /// Body format.
    pub body_format: BodyFormat,
    /// Regular attachments.
    pub attachments: Vec<Attachment>,
    /// Inline attachments referenced from the body.
    pub inline_attachments: Vec<Attachment>,
    /// Encryption status.
    pub encryption_status: EncryptionStatus,
    /// Date header.
    pub date: Option<DateTime<Utc>>,
    /// Message-ID without angle brackets.
    pub message_id: Option<String>,
    /// In-Reply-To id.
    pub in_reply_to: Option<String>,
    /// References ids.
    pub references: Vec<String>,
}

impl EmailMessageDetails {
    /// All recipients: To, Cc and Bcc.
    pub fn recipients(&self) -> impl Iterator<Item = &Mailbox> {
        self.to.iter().chain(&self.cc).chain(&self.bcc)
    }

    /// The sealed body attachment, if present.
    #[must_use]
    pub fn secure_body(&self) -> Option<&Attachment> {
        self.secure_attachments(SecureAttachmentType::Body).next()
    }

    /// Key exchange attachments, one per key holder.
    pub fn key_exchanges(&self) -> impl Iterator<Item = &Attachment> {
        self.secure_attachments(SecureAttachmentType::KeyExchange)
    }

    fn secure_attachments(&self, kind: SecureAttachmentType) -> impl Iterator<Item = &Attachment> {
        self.attachments
            .iter()
            .chain(&self.inline_attachments)
            .filter(move |a| SecureAttachmentType::of(a) == Some(kind))
    }
}

/// Encodes message details as RFC 822 data.
///
/// For encrypted messages the body is replaced by [`ENCRYPTED_BODY_NOTICE`];
/// the caller supplies the secure attachments. A message without a body
/// gets no body part.
///
/// # Errors
///
/// Returns an error if the message has no sender.
pub fn encode_internet_message(details: &EmailMessageDetails) -> Result<Vec<u8>> {
    let mut builder = MessageBuilder::new();
    for mailbox in &details.from {
        builder = builder.from(mailbox.clone());
    }
    for mailbox in &details.to {
        builder = builder.to(mailbox.clone());
    }
    for mailbox in &details.cc {
        builder = builder.cc(mailbox.clone());
    }
    for mailbox in &details.bcc {
        builder = builder.bcc(mailbox.clone());
    }
    for mailbox in &details.reply_to {
        builder = builder.reply_to(mailbox.clone());
    }
    if let Some(subject) = &details.subject {
        builder = builder.subject(subject.clone());
    }
    if let Some(date) = details.date {
        builder = builder.date(date);
    }
    if let Some(id) = &details.message_id {
        builder = builder.message_id(id.clone());
    }
    if let Some(id) = &details.in_reply_to {
        builder = builder.in_reply_to(id.clone());
    }
    for id in &details.references {
        builder = builder.reference(id.clone());
    }

    builder = match details.encryption_status {
        EncryptionStatus::Encrypted => builder.text_body(ENCRYPTED_BODY_NOTICE),
        EncryptionStatus::Unencrypted => match (&details.body, details.body_format) {
            (None, _) => builder,
            (Some(body), BodyFormat::Html) => builder.html_body(body.clone()),
            (Some(body), BodyFormat::Plain) => builder.text_body(body.clone()),
        },
    };

    for attachment in &details.attachments {
        let mut attachment = attachment.clone();
        attachment.inline = false;
        builder = builder.attach(attachment);
    }
    for attachment in &details.inline_attachments {
        let mut attachment = attachment.clone();
        attachment.inline = true;
        builder = builder.attach(attachment);
    }

    builder.build()?.to_bytes()
}

/// Decodes RFC 822 data into message details.
///
/// Address lists that fail to parse are skipped entry by entry rather than
/// failing the whole message.
///
/// # Errors
///
/// Returns an error if the MIME structure is invalid or a body part
/// cannot be transfer-decoded.
pub fn decode_internet_message(data: &[u8]) -> Result<EmailMessageDetails> {
    let message = Message::parse(data)?;
    let headers = message.headers();

    let addresses = |name: &str| -> Vec<Mailbox> {
        headers
            .get_all(name)
            .into_iter()
            .flat_map(|value| {
                Mailbox::parse_list(value).unwrap_or_else(|_| lenient_address_list(value))
            })
            .collect()
    };

    let mut details = EmailMessageDetails {
        from: addresses("from"),
        to: addresses("to"),
        cc: addresses("cc"),
        bcc: addresses("bcc"),
        reply_to: addresses("reply-to"),
        subject: message.subject(),
        date: headers
            .get("date")
            .and_then(|d| DateTime::parse_from_rfc2822(d.trim()).ok())
            .map(|d| d.with_timezone(&Utc)),
        message_id: message.message_id(),
        in_reply_to: headers
            .get("in-reply-to")
            .and_then(|v| extract_ids(v).into_iter().next()),
        references: headers.get("references").map(extract_ids).unwrap_or_default(),
        ..EmailMessageDetails::default()
    };

    collect_content(&message.root, &mut details)?;

    if details.secure_body().is_some() {
        details.encryption_status = EncryptionStatus::Encrypted;
    }

    Ok(details)
}

fn collect_content(part: &Part, details: &mut EmailMessageDetails) -> Result<()> {
    if !part.children.is_empty() {
        let content_type = part.content_type();
        if content_type.is("multipart", "alternative") {
            return collect_alternative(part, details);
        }
        for child in &part.children {
            collect_content(child, details)?;
        }
        return Ok(());
    }

    let content_type = part.content_type();
    if content_type.is_multipart() {
        // Multipart without any body parts
        return Ok(());
    }
    if !part.is_attachment() && content_type.is_text() && details.body.is_none() {
        let text = part.body_text()?;
        // An empty leaf, as in a header-only message, is no body at all
        if !text.trim().is_empty() {
            details.body = Some(text);
            details.body_format = if content_type.sub_type.eq_ignore_ascii_case("html") {
                BodyFormat::Html
            } else {
                BodyFormat::Plain
            };
        }
        return Ok(());
    }
    if !part.is_attachment() && content_type.is_text() {
        // A second body-like text part is kept as an attachment
        details.attachments.push(to_attachment(part, false)?);
        return Ok(());
    }

    let inline = part
        .content_disposition()
        .map_or(part.content_id().is_some(), |d| {
            d.kind == crate::content_type::DispositionType::Inline
        });
    let attachment = to_attachment(part, inline)?;
    if inline && attachment.content_id.is_some() {
        details.inline_attachments.push(attachment);
    } else {
        details.attachments.push(attachment);
    }
    Ok(())
}

/// Picks the richest alternative: HTML over plain text.
fn collect_alternative(part: &Part, details: &mut EmailMessageDetails) -> Result<()> {
    let preferred = part
        .children
        .iter()
        .rev()
        .find(|c| c.content_type().is("text", "html") || c.content_type().is("multipart", "related"))
        .or_else(|| part.children.iter().find(|c| c.content_type().is_text()))
        .or_else(|| part.children.first());

    match preferred {
        Some(child) => collect_content(child, details),
        None => Ok(()),
    }
}

fn to_attachment(part: &Part, inline: bool) -> Result<Attachment> {
    let content_type = part.content_type();
    Ok(Attachment {
        filename: part.filename().unwrap_or_default(),
        mime_type: content_type.essence(),
        content_id: part.content_id(),
        inline,
        data: part.decode_body()?,
    })
}

fn lenient_address_list(value: &str) -> Vec<Mailbox> {
    value
        .split(',')
        .filter_map(|entry| Mailbox::parse(entry).ok())
        .collect()
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
    use chrono::TimeZone;

    fn details() -> EmailMessageDetails {
        EmailMessageDetails {
            from: vec![Mailbox::with_name("alice@example.com", "Alice")],
            to: vec![Mailbox::new("bob@example.com")],
            cc: vec![Mailbox::with_name("carol@example.com", "Carol Ünal")],
            bcc: vec![Mailbox::new("dave@example.com")],
            subject: Some("Quarterly numbers ✓".to_string()),
            body: Some("Hi Bob,\nnumbers attached.".to_string()),
            date: Some(Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap()),
            message_id: Some("m1@example.com".to_string()),
            in_reply_to: Some("m0@example.com".to_string()),
            references: vec!["root@example.com".to_string(), "m0@example.com".to_string()],
            attachments: vec![Attachment::new("q1.csv", "text/csv", b"a,b\n1,2".to_vec())],
            inline_attachments: vec![Attachment::inline(
                "chart.png",
                "image/png",
                "chart@example.com",
                vec![0x89, 0x50, 0x4E, 0x47],
            )],
            ..EmailMessageDetails::default()
        }
    }

    #[test]
    fn test_encode_decode_preserves_details() {
        let original = details();
        let data = encode_internet_message(&original).unwrap();
        let decoded = decode_internet_message(&data).unwrap();

        assert_eq!(decoded.from, original.from);
        assert_eq!(decoded.to, original.to);
        assert_eq!(decoded.cc, original.cc);
        assert_eq!(decoded.bcc, original.bcc);
        assert_eq!(decoded.subject, original.subject);
        assert_eq!(decoded.body.as_deref(), Some("Hi Bob,\r\nnumbers attached."));
        assert_eq!(decoded.date, original.date);
        assert_eq!(decoded.message_id, original.message_id);
        assert_eq!(decoded.in_reply_to, original.in_reply_to);
        assert_eq!(decoded.references, original.references);
        assert_eq!(decoded.attachments, original.attachments);
        assert_eq!(decoded.inline_attachments, original.inline_attachments);
        assert_eq!(decoded.encryption_status, EncryptionStatus::Unencrypted);
    }

    #[test]
    fn test_encrypted_message_uses_notice_body() {
        let mut original = details();
        original.encryption_status = EncryptionStatus::Encrypted;
        original.inline_attachments.clear();
        original.attachments = vec![
            SecureAttachmentType::Body.attachment(b"sealed-body".to_vec()),
            SecureAttachmentType::KeyExchange.attachment(b"key-1".to_vec()),
        ];

        let data = encode_internet_message(&original).unwrap();
        let text = String::from_utf8_lossy(&data);
        assert!(text.contains(ENCRYPTED_BODY_NOTICE));
        assert!(!text.contains("numbers attached"));

        let decoded = decode_internet_message(&data).unwrap();
        assert_eq!(decoded.encryption_status, EncryptionStatus::Encrypted);
        assert_eq!(decoded.body.as_deref(), Some(ENCRYPTED_BODY_NOTICE));
        assert_eq!(decoded.secure_body().unwrap().data, b"sealed-body");
    }

    #[test]
    fn test_decode_prefers_html_alternative() {
        let raw = concat!(
            "From: =?utf-8?Q?Ren=C3=A9e?= <renee@example.com>\r\n",
            "To: a@example.com, broken entry, b@example.com\r\n",
            "Subject: =?utf-8?B?w4lsYW4=?= =?utf-8?B?IHZpdGFs?=\r\n",
            "Date: not a date\r\n",
            "Content-Type: multipart/alternative; boundary=alt\r\n",
            "\r\n",
            "--alt\r\n",
            "Content-Type: text/plain\r\n",
            "\r\n",
            "plain\r\n",
            "--alt\r\n",
            "Content-Type: text/html\r\n",
            "\r\n",
            "<b>rich</b>\r\n",
            "--alt--\r\n"
        );

        let decoded = decode_internet_message(raw.as_bytes()).unwrap();
        assert_eq!(decoded.from[0].display_name.as_deref(), Some("Renée"));
        let to: Vec<_> = decoded.to.iter().map(|m| m.address.as_str()).collect();
        assert_eq!(to, vec!["a@example.com", "b@example.com"]);
        assert_eq!(decoded.subject.as_deref(), Some("Élan vital"));
        assert!(decoded.date.is_none());
        assert_eq!(decoded.body.as_deref(), Some("<b>rich</b>"));
        assert_eq!(decoded.body_format, BodyFormat::Html);
        assert!(decoded.attachments.is_empty());
    }

    #[test]
    fn test_decode_without_body_or_from() {
        let decoded = decode_internet_message(b"Subject: empty\r\n").unwrap();
        assert!(decoded.from.is_empty());
        assert!(decoded.body.is_none());

        let decoded =
            decode_internet_message(b"From: a@example.com\r\nSubject: empty\r\n\r\n  \r\n")
                .unwrap();
        assert_eq!(decoded.from[0].address, "a@example.com");
        assert!(decoded.body.is_none());
        assert!(decoded.attachments.is_empty());

        let decoded = decode_internet_message(
            b"Content-Type: application/octet-stream\r\nContent-Transfer-Encoding: base64\r\n\r\nAAE=",
        )
        .unwrap();
        assert!(decoded.body.is_none());
        assert_eq!(decoded.attachments[0].data, vec![0, 1]);
    }

    #[test]
    fn test_encode_without_body_keeps_body_absent() {
        let mut original = details();
        original.body = None;
        let decoded = decode_internet_message(&encode_internet_message(&original).unwrap()).unwrap();
        assert!(decoded.body.is_none());
        assert_eq!(decoded.attachments, original.attachments);
        assert_eq!(decoded.inline_attachments, original.inline_attachments);

        original.attachments.clear();
        original.inline_attachments.clear();
        let data = encode_internet_message(&original).unwrap();
        let decoded = decode_internet_message(&data).unwrap();
        assert!(decoded.body.is_none());
        assert_eq!(decoded.subject, original.subject);
        assert!(decoded.attachments.is_empty());
    }

    #[test]
    fn test_encrypted_message_carries_key_exchange_per_key() {
        let mut original = details();
        original.encryption_status = EncryptionStatus::Encrypted;
        original.inline_attachments.clear();
        original.attachments = vec![SecureAttachmentType::Body.attachment(b"sealed".to_vec())];
        original.attachments.extend(
            (0u8..3).map(|i| {
                SecureAttachmentType::KeyExchange.indexed_attachment(usize::from(i), vec![i])
            }),
        );

        let decoded = decode_internet_message(&encode_internet_message(&original).unwrap()).unwrap();
        let data: Vec<_> = decoded.key_exchanges().map(|a| a.data.clone()).collect();
        assert_eq!(data, vec![vec![0], vec![1], vec![2]]);
        let ids: Vec<_> = decoded
            .key_exchanges()
            .filter_map(|a| a.content_id.clone())
            .collect();
        assert_eq!(
            ids,
            vec![
                "securekeyexchange0@sealmail",
                "securekeyexchange1@sealmail",
                "securekeyexchange2@sealmail"
            ]
        );
    }

    #[test]
    fn test_encode_requires_sender() {
        let mut original = details();
        original.from.clear();
        assert!(encode_internet_message(&original).is_err());
    }

    #[test]
    fn test_secure_attachment_type_of() {
        let body = SecureAttachmentType::Body.attachment(vec![]);
        assert_eq!(SecureAttachmentType::of(&body), Some(SecureAttachmentType::Body));

        let plain = Attachment::new("x.txt", "text/plain", vec![]);
        assert_eq!(SecureAttachmentType::of(&plain), None);

        let by_id = Attachment::new("k", "application/octet-stream", vec![])
            .with_content_id("securekeyexchange12@sealmail");
        assert_eq!(
            SecureAttachmentType::of(&by_id),
            Some(SecureAttachmentType::KeyExchange)
        );
        let other = by_id.clone().with_content_id("securekeyexchangex@sealmail");
        assert_eq!(SecureAttachmentType::of(&other), None);
    }
}
