//! Local MBOX archives (e.g. a Google Takeout export) as a [`Mailbox`].
//!
//! The archive is read once into an in-memory catalogue. Search queries are
//! evaluated locally and results come back newest first, like Gmail.

use std::collections::HashMap;
use std::path::Path;

use chrono::NaiveDate;
use tracing::{debug, info};

use super::{Mailbox, MessagePage};
use crate::error::{PlanemailError, Result};
use crate::model::message::{MessagePart, RawMessage};
use crate::parser::body::decode_body;
use crate::parser::header::{extract_angle_bracket, parse_date};
use crate::parser::mbox::MboxSplitter;
use crate::parser::mime::parse_payload;
use crate::query::local::LocalQuery;

/// One archived message, indexed for search.
#[derive(Debug, Clone)]
struct CatalogEntry {
    id: String,
    date: Option<NaiveDate>,
    subject: String,
    /// Lowercase subject + body text.
    text: String,
    payload: MessagePart,
}

impl CatalogEntry {
    fn from_raw(offset: u64, raw: &[u8]) -> Self {
        let payload = parse_payload(raw);
        let message = RawMessage {
            id: String::new(),
            payload: Some(payload),
        };

        let id = message
            .header("Message-ID")
            .map(extract_angle_bracket)
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| format!("mbox-{offset}"));
        let date = message
            .header("Date")
            .and_then(parse_date)
            .map(|dt| dt.date_naive());
        let subject = message.subject().to_string();
        let body = decode_body(message.payload.as_ref()).text();
        let text = format!("{subject}\n{body}").to_lowercase();

        Self {
            id,
            date,
            subject: subject.to_lowercase(),
            text,
            payload: message.payload.unwrap_or_default(),
        }
    }
}

/// A searchable, read-only MBOX archive.
#[derive(Debug)]
pub struct MboxMailbox {
    /// Newest first.
    entries: Vec<CatalogEntry>,
    by_id: HashMap<String, usize>,
    /// Matches of the most recent query, as indexes into `entries`.
    last_query: Option<(String, Vec<usize>)>,
}

impl MboxMailbox {
    /// Read and index the archive at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let splitter = MboxSplitter::new(path.as_ref())?;
        let mut entries = Vec::new();
        splitter.for_each(&mut |entry| {
            entries.push(CatalogEntry::from_raw(entry.offset, entry.raw));
            true
        })?;
        info!(
            path = %path.as_ref().display(),
            messages = entries.len(),
            "Indexed MBOX archive"
        );
        Ok(Self::from_entries(entries))
    }

    fn from_entries(mut entries: Vec<CatalogEntry>) -> Self {
        // Stable: archive order breaks date ties. Undated messages go last.
        entries.sort_by(|a, b| b.date.cmp(&a.date));

        let mut by_id = HashMap::with_capacity(entries.len());
        let mut unique = Vec::with_capacity(entries.len());
        for entry in entries {
            if by_id.contains_key(&entry.id) {
                debug!(id = %entry.id, "Duplicate Message-ID in archive, keeping first");
                continue;
            }
            by_id.insert(entry.id.clone(), unique.len());
            unique.push(entry);
        }

        Self {
            entries: unique,
            by_id,
            last_query: None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn matching(&mut self, query: &str) -> &[usize] {
        let cached = matches!(&self.last_query, Some((q, _)) if q == query);
        if !cached {
            let parsed = LocalQuery::parse(query);
            let hits = self
                .entries
                .iter()
                .enumerate()
                .filter(|(_, e)| parsed.matches(&e.subject, &e.text, e.date))
                .map(|(i, _)| i)
                .collect();
            self.last_query = Some((query.to_string(), hits));
        }
        match &self.last_query {
            Some((_, hits)) => hits.as_slice(),
            None => &[],
        }
    }
}

impl Mailbox for MboxMailbox {
    fn list_message_ids(
        &mut self,
        query: &str,
        page_token: Option<&str>,
        max_results: usize,
    ) -> Result<MessagePage> {
        let start = match page_token {
            Some(token) => token
                .parse::<usize>()
                .map_err(|_| PlanemailError::Transport(format!("invalid page token '{token}'")))?,
            None => 0,
        };
        let max_results = max_results.max(1);

        let hits = self.matching(query).to_vec();
        let end = start.saturating_add(max_results).min(hits.len());
        let ids = hits
            .get(start..end)
            .unwrap_or_default()
            .iter()
            .map(|&i| self.entries[i].id.clone())
            .collect();
        let next_page_token = (end < hits.len()).then(|| end.to_string());

        Ok(MessagePage {
            ids,
            next_page_token,
        })
    }

    fn fetch_message(&mut self, id: &str) -> Result<RawMessage> {
        let index = *self
            .by_id
            .get(id)
            .ok_or_else(|| PlanemailError::NotFound(id.to_string()))?;
        Ok(RawMessage {
            id: id.to_string(),
            payload: Some(self.entries[index].payload.clone()),
        })
    }
}
