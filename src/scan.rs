//! Mailbox scanning: search → fetch → decode → extract, one account at a time.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::extract::FlightExtractor;
use crate::mailbox::Mailbox;
use crate::model::flight::ExtractionRecord;
use crate::model::message::RawMessage;
use crate::parser::body::decode_body;
use crate::query::SubjectFilter;

/// Gmail message ids are long alphanumeric strings.
static RE_MESSAGE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9]{16,}$").unwrap());

/// Counters for one account scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Messages fetched and inspected.
    pub examined: u64,
    /// Skipped because of the subject blacklist.
    pub blacklisted: u64,
    /// Listed but gone by the time they were fetched.
    pub vanished: u64,
    /// Produced a qualifying record.
    pub matched: u64,
}

/// Drives extraction over every message a mailbox returns for a query.
#[derive(Debug, Clone, Copy)]
pub struct Scanner<'a> {
    extractor: &'a FlightExtractor<'a>,
    filter: &'a SubjectFilter,
    page_size: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(extractor: &'a FlightExtractor<'a>, filter: &'a SubjectFilter, page_size: usize) -> Self {
        Self {
            extractor,
            filter,
            page_size: page_size.max(1),
        }
    }

    /// Scan every message matching `query`.
    ///
    /// Records come back oldest first. Messages that vanish between listing
    /// and fetching are skipped; any other mailbox error aborts the scan.
    /// `progress` receives the number of messages examined so far.
    pub fn scan(
        &self,
        mailbox: &mut dyn Mailbox,
        query: &str,
        progress: Option<&dyn Fn(u64)>,
    ) -> Result<Vec<ExtractionRecord>> {
        let (records, _) = self.scan_with_report(mailbox, query, progress)?;
        Ok(records)
    }

    /// Like [`scan`](Self::scan), also returning the counters.
    pub fn scan_with_report(
        &self,
        mailbox: &mut dyn Mailbox,
        query: &str,
        progress: Option<&dyn Fn(u64)>,
    ) -> Result<(Vec<ExtractionRecord>, ScanReport)> {
        let mut records = Vec::new();
        let mut report = ScanReport::default();
        let mut page_token: Option<String> = None;

        loop {
            let page = mailbox.list_message_ids(query, page_token.as_deref(), self.page_size)?;

            for id in &page.ids {
                let message = match mailbox.fetch_message(id) {
                    Ok(message) => message,
                    Err(e) if e.is_not_found() => {
                        debug!(id = %id, "Message vanished before fetch, skipping");
                        report.vanished += 1;
                        continue;
                    }
                    Err(e) => return Err(e),
                };
                report.examined += 1;
                if let Some(cb) = progress {
                    cb(report.examined);
                }

                let subject = message.subject();
                if self.filter.is_blacklisted(subject) {
                    debug!(id = %id, subject, "Blacklisted subject, skipping");
                    report.blacklisted += 1;
                    continue;
                }

                if let Some(record) = self.extract(&message) {
                    debug!(id = %id, flights = ?record.flight_numbers, "Flight mention found");
                    report.matched += 1;
                    records.push(record);
                }
            }

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        records.reverse();
        info!(
            examined = report.examined,
            blacklisted = report.blacklisted,
            vanished = report.vanished,
            matched = report.matched,
            "Scan complete"
        );
        Ok((records, report))
    }

    /// Extract a record from one fetched message, if it qualifies.
    pub fn extract(&self, message: &RawMessage) -> Option<ExtractionRecord> {
        let body = decode_body(message.payload.as_ref()).text();
        self.extractor
            .extract_message(&message.id, message.subject(), &body)
    }
}

/// Whether `needle` should be fetched directly rather than searched for.
pub fn looks_like_message_id(needle: &str) -> bool {
    RE_MESSAGE_ID.is_match(needle)
        || (needle.starts_with('<') && needle.ends_with('>') && needle.contains('@'))
}

/// Locate one message across several mailboxes.
///
/// Id-like needles are fetched directly (an account that does not have it,
/// or rejects it, is skipped; the last rejection is returned if no account
/// has the message). Anything else is treated as a subject and the oldest match
/// wins. Returns the account label with the message.
pub fn find_message<'m, I, M>(
    mailboxes: I,
    needle: &str,
    page_size: usize,
) -> Result<Option<(String, RawMessage)>>
where
    I: IntoIterator<Item = (String, &'m mut M)>,
    M: Mailbox + ?Sized + 'm,
{
    let by_id = looks_like_message_id(needle);
    let query = format!("subject:\"{}\"", needle.replace('"', ""));
    // A rejected id only fails the lookup when no account has the message.
    let mut rejected = None;

    for (label, mailbox) in mailboxes {
        if by_id {
            match mailbox.fetch_message(needle) {
                Ok(message) => return Ok(Some((label, message))),
                Err(e) if e.is_not_found() => {
                    debug!(account = %label, id = needle, "Not in this mailbox");
                }
                Err(e) => {
                    warn!(
                        account = %label,
                        id = needle,
                        error = %e,
                        "Id lookup failed, trying next account"
                    );
                    rejected = Some(e);
                }
            }
            continue;
        }

        let Some(id) = oldest_match(&mut *mailbox, &query, page_size)? else {
            debug!(account = %label, query = %query, "No subject match");
            continue;
        };
        match mailbox.fetch_message(&id) {
            Ok(message) => return Ok(Some((label, message))),
            Err(e) if e.is_not_found() => {
                warn!(account = %label, id = %id, "Matched message vanished");
            }
            Err(e) => return Err(e),
        }
    }

    match rejected {
        Some(e) => Err(e),
        None => Ok(None),
    }
}

/// Last id of the last page: results are newest first.
fn oldest_match<M: Mailbox + ?Sized>(
    mailbox: &mut M,
    query: &str,
    page_size: usize,
) -> Result<Option<String>> {
    let mut last = None;
    let mut page_token: Option<String> = None;
    loop {
        let page = mailbox.list_message_ids(query, page_token.as_deref(), page_size.max(1))?;
        if let Some(id) = page.ids.last() {
            last = Some(id.clone());
        }
        match page.next_page_token {
            Some(token) => page_token = Some(token),
            None => return Ok(last),
        }
    }
}
