//! Mailbox message handle as delivered by a [`Mailbox`](crate::mailbox::Mailbox).
//!
//! The shape follows the Gmail `format=full` message resource: a tree of
//! MIME parts whose leaf bodies carry base64url-encoded data.

use serde::{Deserialize, Serialize};

/// A single header (`name: value`) of a message part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub name: String,
    pub value: String,
}

impl Header {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Transfer-encoded body of a part.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartBody {
    /// Base64url content (padding optional). `None` for container parts.
    #[serde(default)]
    pub data: Option<String>,
}

/// One node of the payload tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePart {
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub headers: Vec<Header>,
    #[serde(default)]
    pub body: Option<PartBody>,
    #[serde(default)]
    pub parts: Vec<MessagePart>,
}

impl MessagePart {
    /// Leaf part with already-encoded body data.
    pub fn leaf(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            headers: Vec::new(),
            body: Some(PartBody {
                data: Some(data.into()),
            }),
            parts: Vec::new(),
        }
    }

    /// Encoded body data, if this part carries any.
    pub fn data(&self) -> Option<&str> {
        self.body.as_ref().and_then(|b| b.data.as_deref())
    }
}

/// A fetched message: stable id plus its payload tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMessage {
    pub id: String,
    #[serde(default)]
    pub payload: Option<MessagePart>,
}

impl RawMessage {
    /// Case-insensitive lookup of a top-level header.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.payload
            .as_ref()?
            .headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }

    /// The `Subject` header, or an empty string.
    pub fn subject(&self) -> &str {
        self.header("subject").unwrap_or("")
    }
}
