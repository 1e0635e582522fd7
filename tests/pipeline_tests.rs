//! Scanner, aggregator and lookup behaviour against an in-memory mailbox.

use std::collections::HashSet;

use planemail::aggregate::Aggregator;
use planemail::error::{PlanemailError, Result};
use planemail::extract::FlightExtractor;
use planemail::mailbox::{Mailbox, MessagePage};
use planemail::model::message::{Header, MessagePart, RawMessage};
use planemail::parser::body::encode_data;
use planemail::query::{build_search_query, SubjectFilter};
use planemail::scan::{find_message, Scanner};

/// Messages newest first; ids listed in `vanished` are listed but not fetchable.
#[derive(Default)]
struct MemoryMailbox {
    messages: Vec<RawMessage>,
    vanished: HashSet<String>,
    broken: HashSet<String>,
    queries: Vec<String>,
}

impl MemoryMailbox {
    fn with(mut self, id: &str, subject: &str, body: &str) -> Self {
        self.messages.push(message(id, subject, body));
        self
    }
}

impl Mailbox for MemoryMailbox {
    fn list_message_ids(
        &mut self,
        query: &str,
        page_token: Option<&str>,
        max_results: usize,
    ) -> Result<MessagePage> {
        self.queries.push(query.to_string());
        let needle = query
            .strip_prefix("subject:\"")
            .and_then(|q| q.strip_suffix('"'));
        let ids: Vec<String> = self
            .messages
            .iter()
            .filter(|m| needle.is_none_or(|n| m.subject().contains(n)))
            .map(|m| m.id.clone())
            .collect();

        let start: usize = page_token.map_or(0, |t| t.parse().unwrap());
        let end = (start + max_results).min(ids.len());
        Ok(MessagePage {
            ids: ids[start..end].to_vec(),
            next_page_token: (end < ids.len()).then(|| end.to_string()),
        })
    }

    fn fetch_message(&mut self, id: &str) -> Result<RawMessage> {
        if self.broken.contains(id) {
            return Err(PlanemailError::Transport("connection reset".into()));
        }
        if self.vanished.contains(id) {
            return Err(PlanemailError::NotFound(id.to_string()));
        }
        self.messages
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .ok_or_else(|| PlanemailError::NotFound(id.to_string()))
    }
}

fn message(id: &str, subject: &str, body: &str) -> RawMessage {
    RawMessage {
        id: id.to_string(),
        payload: Some(MessagePart {
            mime_type: "multipart/alternative".into(),
            headers: vec![Header::new("Subject", subject)],
            parts: vec![MessagePart::leaf("text/plain", encode_data(body.as_bytes()))],
            ..Default::default()
        }),
    }
}

const DUB_LHR: &str = "Dublin (DUB) to London (LHR) on 2024-05-01 14:30, Flight EI 154, Booking Ref: AB12CD";
const JFK_SFO: &str = "JFK to SFO Flight UA 123 on 12/06/2024 at 9:15 AM PNR: XK7P2Q";

fn scan(mailbox: &mut MemoryMailbox, page_size: usize) -> Result<Vec<String>> {
    let extractor = FlightExtractor::default();
    let filter = SubjectFilter::default();
    let scanner = Scanner::new(&extractor, &filter, page_size);
    let records = scanner.scan(mailbox, &build_search_query(None), None)?;
    Ok(records.into_iter().map(|r| r.message_id).collect())
}

#[test]
fn test_records_come_back_oldest_first_across_pages() {
    let mut mb = MemoryMailbox::default()
        .with("newest", "Your flight", JFK_SFO)
        .with("middle", "Hello", "nothing here")
        .with("oldest", "Your flight", DUB_LHR);

    let ids = scan(&mut mb, 1).unwrap();
    assert_eq!(ids, vec!["oldest", "newest"]);
    // One list call per page.
    assert_eq!(mb.queries.len(), 3);
}

#[test]
fn test_vanished_messages_are_skipped() {
    let mut mb = MemoryMailbox::default()
        .with("a", "Your flight", DUB_LHR)
        .with("b", "Your flight", JFK_SFO);
    mb.vanished.insert("a".into());

    let extractor = FlightExtractor::default();
    let filter = SubjectFilter::default();
    let scanner = Scanner::new(&extractor, &filter, 50);
    let (records, report) = scanner
        .scan_with_report(&mut mb, "anything", None)
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].message_id, "b");
    assert_eq!(report.vanished, 1);
    assert_eq!(report.examined, 1);
    assert_eq!(report.matched, 1);
}

#[test]
fn test_transport_errors_abort_the_scan() {
    let mut mb = MemoryMailbox::default()
        .with("a", "Your flight", DUB_LHR)
        .with("b", "Your flight", JFK_SFO);
    mb.broken.insert("b".into());

    let err = scan(&mut mb, 50).unwrap_err();
    assert!(matches!(err, PlanemailError::Transport(_)));
}

#[test]
fn test_blacklisted_subjects_are_excluded() {
    let mut mb = MemoryMailbox::default()
        .with("fwd", "Fwd: Your flight", DUB_LHR)
        .with("ok", "Your flight", DUB_LHR)
        .with("receipt", "Flight RECEIPT", JFK_SFO);

    assert_eq!(scan(&mut mb, 50).unwrap(), vec!["ok"]);
}

#[test]
fn test_progress_counts_examined_messages() {
    let mut mb = MemoryMailbox::default()
        .with("a", "x", "y")
        .with("b", "x", "y");
    let extractor = FlightExtractor::default();
    let filter = SubjectFilter::default();
    let scanner = Scanner::new(&extractor, &filter, 1);

    let seen = std::cell::RefCell::new(Vec::new());
    scanner
        .scan(&mut mb, "q", Some(&|n| seen.borrow_mut().push(n)))
        .unwrap();
    assert_eq!(seen.into_inner(), vec![1, 2]);
}

#[test]
fn test_same_flight_from_two_accounts_merges() {
    let mut personal = MemoryMailbox::default()
        .with("p2", "Your flight", JFK_SFO)
        .with("p1", "Your flight confirmation", DUB_LHR);
    let mut work = MemoryMailbox::default().with(
        "w1",
        "Your boarding pass",
        "Dublin (DUB) to London (LHR) Flight EI 154 on 2024-05-01 at 14:30 PNR: ZX98YW",
    );

    let extractor = FlightExtractor::default();
    let filter = SubjectFilter::default();
    let scanner = Scanner::new(&extractor, &filter, 50);
    let query = build_search_query(Some("2024-01-01 2024-12-31"));

    let mut aggregator = Aggregator::new();
    aggregator.ingest("personal", scanner.scan(&mut personal, &query, None).unwrap());
    aggregator.ingest("work", scanner.scan(&mut work, &query, None).unwrap());

    let flights = aggregator.into_entities();
    assert_eq!(flights.len(), 2);

    let dub = &flights[0];
    assert_eq!(dub.key(), "DUB|LHR|2024-05-01|14:30|EI 154");
    assert_eq!(dub.subject, "Your flight confirmation");
    assert_eq!(dub.message_ids, vec!["p1", "w1"]);
    assert_eq!(dub.booking_refs, vec!["AB12CD", "ZX98YW"]);
    assert_eq!(dub.accounts, vec!["personal", "work"]);

    let jfk = &flights[1];
    assert_eq!(jfk.departure_iata, "JFK");
    assert_eq!(jfk.arrival_iata, "SFO");
    assert_eq!(jfk.time, "9:15 AM");
    assert_eq!(jfk.booking_refs, vec!["XK7P2Q"]);
}

#[test]
fn test_find_message_by_id_moves_to_next_account() {
    let mut first = MemoryMailbox::default().with("aaaaaaaaaaaaaaaa", "Other", "x");
    let mut second = MemoryMailbox::default().with("18c0ffee12345678", "Your flight", DUB_LHR);

    let found = find_message(
        [
            ("first".to_string(), &mut first as &mut dyn Mailbox),
            ("second".to_string(), &mut second as &mut dyn Mailbox),
        ],
        "18c0ffee12345678",
        50,
    )
    .unwrap()
    .expect("found");
    assert_eq!(found.0, "second");
    assert_eq!(found.1.subject(), "Your flight");
    // Id lookups never search.
    assert!(first.queries.is_empty());
}

#[test]
fn test_find_message_by_subject_takes_oldest() {
    let mut mb = MemoryMailbox::default()
        .with("new", "Trip to Dublin", "second")
        .with("mid", "Trip to Dublin", "first-ish")
        .with("old", "Trip to Dublin", "first");

    let found = find_message(
        [("me".to_string(), &mut mb as &mut dyn Mailbox)],
        "Trip to Dublin",
        2,
    )
    .unwrap()
    .expect("found");
    assert_eq!(found.1.id, "old");
    assert_eq!(mb.queries[0], "subject:\"Trip to Dublin\"");

    let mut empty = MemoryMailbox::default();
    let none = find_message(
        [("me".to_string(), &mut empty as &mut dyn Mailbox)],
        "Trip to Dublin",
        2,
    )
    .unwrap();
    assert!(none.is_none());
}

#[test]
fn test_find_message_id_rejected_by_one_account_tries_the_next() {
    let archive_id = "<m9@air.example>";
    let mut remote = MemoryMailbox::default();
    remote.broken.insert(archive_id.into());
    let mut archive = MemoryMailbox::default().with(archive_id, "Your flight", DUB_LHR);

    let found = find_message(
        [
            ("remote".to_string(), &mut remote as &mut dyn Mailbox),
            ("archive".to_string(), &mut archive as &mut dyn Mailbox),
        ],
        archive_id,
        50,
    )
    .unwrap()
    .expect("found in archive");
    assert_eq!(found.0, "archive");
    assert_eq!(found.1.id, archive_id);

    let mut remote = MemoryMailbox::default();
    remote.broken.insert(archive_id.into());
    let mut empty = MemoryMailbox::default();
    let err = find_message(
        [
            ("remote".to_string(), &mut remote as &mut dyn Mailbox),
            ("empty".to_string(), &mut empty as &mut dyn Mailbox),
        ],
        archive_id,
        50,
    )
    .unwrap_err();
    assert!(matches!(err, PlanemailError::Transport(_)));
}
