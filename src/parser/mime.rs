//! MIME structure of archived messages: raw RFC 5322 bytes → payload tree.
//!
//! Bodies are decoded by `mail-parser` and re-encoded as base64url so the
//! tree has the same shape a remote mailbox would deliver.

use mail_parser::{Message, MessageParser, MimeHeaders, PartType};

use super::body::encode_data;
use super::header;
use crate::model::message::{MessagePart, PartBody};

/// Maximum depth for recursive multipart conversion (adversarial input).
const MAX_DEPTH: usize = 10;

/// Parse a complete raw message (headers + body) into a payload tree.
///
/// The top-level part carries the decoded headers. Messages `mail-parser`
/// cannot parse become a single `text/plain` part with the raw body.
pub fn parse_payload(raw_message: &[u8]) -> MessagePart {
    let message_bytes = skip_from_line(raw_message);
    let headers = header::parse_headers(&extract_raw_headers(message_bytes));

    let mut payload = match MessageParser::default().parse(message_bytes) {
        Some(msg) => convert_part(&msg, 0, 0),
        None => {
            let body = extract_body_fallback(message_bytes);
            MessagePart::leaf("text/plain", encode_data(body.as_bytes()))
        }
    };
    payload.headers = headers;
    payload
}

/// Convert part `id` (and its children) of a parsed message.
fn convert_part(msg: &Message<'_>, id: usize, depth: usize) -> MessagePart {
    let Some(part) = msg.parts.get(id) else {
        return MessagePart::default();
    };

    let declared = part.content_type().map(|ct| match ct.subtype() {
        Some(sub) => format!("{}/{}", ct.ctype(), sub).to_lowercase(),
        None => ct.ctype().to_lowercase(),
    });

    match &part.body {
        PartType::Text(text) => MessagePart::leaf(
            declared.unwrap_or_else(|| "text/plain".to_string()),
            encode_data(text.as_bytes()),
        ),
        PartType::Html(html) => MessagePart::leaf(
            declared.unwrap_or_else(|| "text/html".to_string()),
            encode_data(html.as_bytes()),
        ),
        PartType::Multipart(children) => MessagePart {
            mime_type: declared.unwrap_or_else(|| "multipart/mixed".to_string()),
            parts: if depth < MAX_DEPTH {
                children
                    .iter()
                    .map(|&child| convert_part(msg, child, depth + 1))
                    .collect()
            } else {
                Vec::new()
            },
            ..Default::default()
        },
        // Attachments and nested messages keep their type but no data.
        PartType::Binary(_) | PartType::InlineBinary(_) | PartType::Message(_) => MessagePart {
            mime_type: declared.unwrap_or_else(|| "application/octet-stream".to_string()),
            body: Some(PartBody::default()),
            ..Default::default()
        },
    }
}

/// Skip the `From ` separator line at the start of MBOX messages.
pub fn skip_from_line(data: &[u8]) -> &[u8] {
    let data = data.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(data);

    if data.starts_with(b"From ") {
        if let Some(pos) = data.iter().position(|&b| b == b'\n') {
            return &data[pos + 1..];
        }
    }
    data
}

/// Raw header block (everything before the first blank line).
fn extract_raw_headers(data: &[u8]) -> Vec<u8> {
    match find_header_end(data) {
        Some(pos) => data[..pos].to_vec(),
        None => data.to_vec(),
    }
}

/// Fallback body extraction when `mail-parser` cannot parse the message.
fn extract_body_fallback(data: &[u8]) -> String {
    let text = String::from_utf8_lossy(data);
    if let Some(pos) = text.find("\n\n") {
        text[pos + 2..].to_string()
    } else if let Some(pos) = text.find("\r\n\r\n") {
        text[pos + 4..].to_string()
    } else {
        String::new()
    }
}

/// Byte offset where headers end (position of the first blank line).
fn find_header_end(data: &[u8]) -> Option<usize> {
    for i in 0..data.len().saturating_sub(1) {
        if data[i] == b'\n' && data[i + 1] == b'\n' {
            return Some(i);
        }
        if data[i..].starts_with(b"\r\n\r\n") {
            return Some(i);
        }
    }
    None
}
