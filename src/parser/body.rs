//! Body decoding: payload tree → plain text.
//!
//! Never fails. Missing parts, undecodable base64 and unexpected MIME
//! structure all degrade to `None`.

use std::sync::LazyLock;

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use regex::Regex;
use tracing::debug;

use crate::model::message::MessagePart;

/// Base64url, padding optional, lenient about trailing bits.
const BODY_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

static RE_SCRIPT_STYLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<(script|style)\b[^>]*>.*?</(script|style)>").unwrap());

static RE_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());

/// The text-bearing parts of a message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedBody {
    /// Decoded `text/plain` part.
    pub plain: Option<String>,
    /// Decoded `text/html` part, markup intact.
    pub html: Option<String>,
    /// The `text/plain` data exactly as delivered (still encoded).
    pub raw_plain: Option<String>,
}

impl DecodedBody {
    /// HTML part with scripts, styles and tags removed.
    pub fn html_text(&self) -> Option<String> {
        self.html.as_deref().map(strip_html)
    }

    /// Single canonical body: plain text, else stripped HTML, else empty.
    pub fn text(&self) -> String {
        match &self.plain {
            Some(plain) => plain.clone(),
            None => self.html_text().unwrap_or_default(),
        }
    }
}

/// Decode the text parts of a payload.
///
/// Multipart payloads use the first direct child of each type; a leaf
/// payload is dispatched on its own MIME type.
pub fn decode_body(payload: Option<&MessagePart>) -> DecodedBody {
    let Some(payload) = payload else {
        return DecodedBody::default();
    };

    let (plain_part, html_part) = if payload.parts.is_empty() {
        match payload.mime_type.as_str() {
            "text/plain" => (Some(payload), None),
            "text/html" => (None, Some(payload)),
            _ => (None, None),
        }
    } else {
        (
            payload.parts.iter().find(|p| p.mime_type == "text/plain"),
            payload.parts.iter().find(|p| p.mime_type == "text/html"),
        )
    };

    let raw_plain = plain_part.and_then(|p| p.data()).map(str::to_string);

    DecodedBody {
        plain: plain_part.and_then(decode_part),
        html: html_part.and_then(decode_part),
        raw_plain,
    }
}

/// Empty data counts as no part at all, so an empty plain alternative
/// falls through to HTML.
fn decode_part(part: &MessagePart) -> Option<String> {
    let data = part.data().filter(|d| !d.is_empty())?;
    match decode_data(data) {
        Some(text) => Some(text),
        None => {
            debug!(mime_type = %part.mime_type, "Undecodable part body, ignoring");
            None
        }
    }
}

/// Decode base64 (url-safe or standard alphabet) into text.
///
/// Non-UTF-8 content falls back to Windows-1252, which accepts every byte.
pub fn decode_data(data: &str) -> Option<String> {
    let normalized: String = data
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();

    let bytes = BODY_ENGINE.decode(normalized.as_bytes()).ok()?;
    Some(match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(e.as_bytes());
            decoded.into_owned()
        }
    })
}

/// Encode text the way mailbox transports deliver it (base64url, no padding).
pub fn encode_data(bytes: &[u8]) -> String {
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Remove `<script>`/`<style>` blocks, then replace every tag with a newline.
pub fn strip_html(html: &str) -> String {
    let without_blocks = RE_SCRIPT_STYLE.replace_all(html, "");
    RE_TAG.replace_all(&without_blocks, "\n").into_owned()
}
