//! Message generation.

use chrono::{DateTime, Utc};

use crate::address::{Mailbox, format_list};
use crate::content_type::{ContentDisposition, ContentType};
use crate::encoding::{encode_base64_wrapped, encode_quoted_printable, encode_rfc2047};
use crate::error::{Error, Result};
use crate::header::Headers;
use crate::message::{Message, Part, TransferEncoding};

/// Longest line RFC 5322 allows in a 7bit body.
const MAX_7BIT_LINE: usize = 998;

/// A file carried by a message, either attached or referenced inline by content id.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Attachment {
    /// File name presented to the recipient.
    pub filename: String,
    /// MIME type, e.g. `image/png`.
    pub mime_type: String,
    /// Content id used by `cid:` references.
    pub content_id: Option<String>,
    /// Whether the part is displayed inline.
    pub inline: bool,
    /// Raw (decoded) content.
    pub data: Vec<u8>,
}

impl Attachment {
    /// Creates a regular attachment.
    #[must_use]
    pub fn new(filename: impl Into<String>, mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            mime_type: mime_type.into(),
            content_id: None,
            inline: false,
            data,
        }
    }

    /// Creates an inline attachment referenced by content id.
    #[must_use]
    pub fn inline(
        filename: impl Into<String>,
        mime_type: impl Into<String>,
        content_id: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        Self {
            filename: filename.into(),
            mime_type: mime_type.into(),
            content_id: Some(content_id.into()),
            inline: true,
            data,
        }
    }

    /// Sets the content id.
    #[must_use]
    pub fn with_content_id(mut self, content_id: impl Into<String>) -> Self {
        self.content_id = Some(content_id.into());
        self
    }

    /// Lowercased file extension, if any.
    #[must_use]
    pub fn extension(&self) -> Option<String> {
        self.filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .filter(|ext| !ext.is_empty())
    }

    fn to_part(&self) -> Part {
        let mut headers = Headers::new();
        let content_type = ContentType::from_mime_type(&self.mime_type)
            .with_parameter("name", encode_rfc2047(&self.filename, "utf-8"));
        headers.add("Content-Type", content_type.to_string());
        let disposition = if self.inline {
            ContentDisposition::inline(&self.filename)
        } else {
            ContentDisposition::attachment(&self.filename)
        };
        headers.add("Content-Disposition", disposition.to_string());
        if let Some(id) = &self.content_id {
            headers.add("Content-ID", format!("<{id}>"));
        }
        headers.add("Content-Transfer-Encoding", TransferEncoding::Base64.to_string());

        Part::new(headers, encode_base64_wrapped(&self.data).into_bytes())
    }
}

/// Builder for outgoing RFC 822 messages.
///
/// Produces a single text part, `multipart/related` when inline attachments
/// are present, wrapped in `multipart/mixed` when regular attachments are
/// present.
#[derive(Debug, Clone, Default)]
pub struct MessageBuilder {
    from: Vec<Mailbox>,
    to: Vec<Mailbox>,
    cc: Vec<Mailbox>,
    bcc: Vec<Mailbox>,
    reply_to: Vec<Mailbox>,
    subject: Option<String>,
    date: Option<DateTime<Utc>>,
    message_id: Option<String>,
    in_reply_to: Option<String>,
    references: Vec<String>,
    body: Option<String>,
    html: bool,
    attachments: Vec<Attachment>,
}

impl MessageBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a sender.
    #[must_use]
    pub fn from(mut self, mailbox: Mailbox) -> Self {
        self.from.push(mailbox);
        self
    }

    /// Adds a To recipient.
    #[must_use]
    pub fn to(mut self, mailbox: Mailbox) -> Self {
        self.to.push(mailbox);
        self
    }

    /// Adds a Cc recipient.
    #[must_use]
    pub fn cc(mut self, mailbox: Mailbox) -> Self {
        self.cc.push(mailbox);
        self
    }

    /// Adds a Bcc recipient.
    #[must_use]
    pub fn bcc(mut self, mailbox: Mailbox) -> Self {
        self.bcc.push(mailbox);
        self
    }

    /// Adds a Reply-To address.
    #[must_use]
    pub fn reply_to(mut self, mailbox: Mailbox) -> Self {
        self.reply_to.push(mailbox);
        self
    }

    /// Sets the subject.
    #[must_use]
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Sets the Date header (defaults to now).
    #[must_use]
    pub const fn date(mut self, date: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self
    }

    /// Sets the Message-ID (without angle brackets).
    #[must_use]
    pub fn message_id(mut self, id: impl Into<String>) -> Self {
        self.message_id = Some(id.into());
        self
    }

    /// Sets the In-Reply-To id.
    #[must_use]
    pub fn in_reply_to(mut self, id: impl Into<String>) -> Self {
        self.in_reply_to = Some(id.into());
        self
    }

    /// Adds a References id.
    #[must_use]
    pub fn reference(mut self, id: impl Into<String>) -> Self {
        self.references.push(id.into());
        self
    }

    /// Sets a plain text body.
    #[must_use]
    pub fn text_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self.html = false;
        self
    }

    /// Sets an HTML body.
    #[must_use]
    pub fn html_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self.html = true;
        self
    }

    /// Adds an attachment (inline or regular, per [`Attachment::inline`]).
    #[must_use]
    pub fn attach(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// Builds the message.
    ///
    /// # Errors
    ///
    /// Returns an error if no sender was given.
    pub fn build(self) -> Result<Message> {
        let sender = self
            .from
            .first()
            .ok_or_else(|| Error::Build("a From address is required".to_string()))?;

        let mut headers = Headers::new();
        headers.add("From", format_list(&self.from));
        for (name, list) in [
            ("To", &self.to),
            ("Cc", &self.cc),
            ("Bcc", &self.bcc),
            ("Reply-To", &self.reply_to),
        ] {
            if !list.is_empty() {
                headers.add(name, format_list(list));
            }
        }
        if let Some(subject) = &self.subject {
            headers.add("Subject", encode_rfc2047(subject, "utf-8"));
        }
        headers.add("Date", self.date.unwrap_or_else(Utc::now).to_rfc2822());
        let message_id = self.message_id.clone().unwrap_or_else(|| {
            let domain = match sender.domain() {
                "" => "localhost",
                domain => domain,
            };
            format!("{}@{domain}", uuid::Uuid::new_v4().simple())
        });
        headers.add("Message-ID", format!("<{message_id}>"));
        if let Some(id) = &self.in_reply_to {
            headers.add("In-Reply-To", format!("<{id}>"));
        }
        if !self.references.is_empty() {
            let refs: Vec<_> = self.references.iter().map(|id| format!("<{id}>")).collect();
            headers.add("References", refs.join(" "));
        }
        headers.add("MIME-Version", "1.0");

        // No body and no attachments leaves a header-only message
        let Some(entity) = self.content_entity() else {
            return Ok(Message::new(Part::new(headers, Vec::new())));
        };
        for (name, value) in entity.headers.iter() {
            headers.add(name, value);
        }

        Ok(Message::new(Part {
            headers,
            body: entity.body,
            children: entity.children,
        }))
    }

    fn content_entity(&self) -> Option<Part> {
        let mut entity = self.body.as_deref().map(|text| self.body_part(text));

        let (inline, attached): (Vec<&Attachment>, Vec<&Attachment>) =
            self.attachments.iter().partition(|a| a.inline);

        if !inline.is_empty() {
            let mut children: Vec<Part> = entity.into_iter().collect();
            children.extend(inline.into_iter().map(Attachment::to_part));
            entity = Some(multipart_entity("related", children));
        }

        if !attached.is_empty() {
            let mut children: Vec<Part> = entity.into_iter().collect();
            children.extend(attached.into_iter().map(Attachment::to_part));
            entity = Some(multipart_entity("mixed", children));
        }

        entity
    }

    fn body_part(&self, text: &str) -> Part {
        let content_type = if self.html {
            ContentType::text_html()
        } else {
            ContentType::text_plain()
        };

        let mut headers = Headers::new();
        headers.add("Content-Type", content_type.to_string());

        let fits_7bit =
            text.is_ascii() && text.lines().all(|line| line.len() <= MAX_7BIT_LINE);
        let body = if fits_7bit {
            headers.add("Content-Transfer-Encoding", TransferEncoding::SevenBit.to_string());
            normalize_line_endings(text)
        } else {
            headers.add(
                "Content-Transfer-Encoding",
                TransferEncoding::QuotedPrintable.to_string(),
            );
            encode_quoted_printable(text)
        };

        Part::new(headers, body.into_bytes())
    }
}

fn multipart_entity(sub_type: &str, children: Vec<Part>) -> Part {
    let boundary = format!("----=_Part_{}", uuid::Uuid::new_v4().simple());
    let mut headers = Headers::new();
    headers.add(
        "Content-Type",
        ContentType::multipart(sub_type, boundary).to_string(),
    );
    Part::multipart(headers, children)
}

fn normalize_line_endings(text: &str) -> String {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect::<Vec<_>>()
        .join("\r\n")
}
