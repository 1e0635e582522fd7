//! Heuristic flight-fact extraction from free text.
//!
//! Airport codes come from an ordered strategy chain (see [`iata`]); dates,
//! times, flight numbers and booking references are matched independently
//! with fixed patterns. Everything runs on [`sanitize`]d text and every
//! output list is deduplicated in first-seen order.

pub mod airports;
pub mod iata;
pub mod sanitize;

use std::sync::LazyLock;

use regex::Regex;

use crate::model::flight::{dedup_ordered, ExtractionRecord};

pub use self::airports::AirportTable;
pub use self::sanitize::sanitize;

// ── Patterns ────────────────────────────────────────────────────────────

static RE_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{4}-\d{2}-\d{2}|\d{2}/\d{2}/\d{4}|\d{1,2} [A-Za-z]{3,9} \d{4})\b").unwrap()
});

static RE_TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\d{1,2}:\d{2}(?: ?[APM]{2})?)\b").unwrap());

/// Two letters, optional alphanumeric, optional space, 1-4 digits.
static RE_FLIGHT_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([A-Z]{2}[A-Z0-9]? ?\d{1,4})\b").unwrap());

static RE_BOOKING_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:booking reference|PNR|confirmation no|ref|reservation no):? *\b([A-Z0-9]{6,8})\b",
    )
    .unwrap()
});

// ── Types ───────────────────────────────────────────────────────────────

/// Candidate flight facts found in one piece of text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlightInfo {
    pub iatas: Vec<String>,
    pub dates: Vec<String>,
    pub times: Vec<String>,
    pub flight_numbers: Vec<String>,
    pub booking_refs: Vec<String>,
}

impl FlightInfo {
    /// Attach message identity, producing a record only when the evidence qualifies.
    pub fn into_record(self, message_id: &str, subject: &str) -> Option<ExtractionRecord> {
        let record = ExtractionRecord {
            message_id: message_id.to_string(),
            subject: subject.to_string(),
            iatas: self.iatas,
            dates: self.dates,
            times: self.times,
            flight_numbers: self.flight_numbers,
            booking_refs: self.booking_refs,
        };
        record.qualifies().then_some(record)
    }
}

/// Runs the extraction patterns against a fixed airport table.
#[derive(Debug, Clone, Copy)]
pub struct FlightExtractor<'a> {
    airports: &'a AirportTable,
}

impl Default for FlightExtractor<'static> {
    fn default() -> Self {
        Self::new(AirportTable::builtin())
    }
}

impl<'a> FlightExtractor<'a> {
    pub fn new(airports: &'a AirportTable) -> Self {
        Self { airports }
    }

    /// Sanitize `text` and extract all candidate facts.
    pub fn extract(&self, text: &str) -> FlightInfo {
        let text = sanitize(text);

        FlightInfo {
            iatas: iata::airport_codes(&text, self.airports),
            dates: first_group(&RE_DATE, &text),
            times: first_group(&RE_TIME, &text),
            flight_numbers: first_group(&RE_FLIGHT_NUMBER, &text),
            booking_refs: first_group(&RE_BOOKING_REF, &text),
        }
    }

    /// Extract from a message's subject and body (joined by a newline).
    pub fn extract_message(
        &self,
        message_id: &str,
        subject: &str,
        body: &str,
    ) -> Option<ExtractionRecord> {
        self.extract(&format!("{subject}\n{body}"))
            .into_record(message_id, subject)
    }
}

/// Every capture of group 1, deduplicated.
fn first_group(re: &Regex, text: &str) -> Vec<String> {
    dedup_ordered(re.captures_iter(text).map(|c| c[1].to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(text: &str) -> FlightInfo {
        FlightExtractor::default().extract(text)
    }

    #[test]
    fn test_full_confirmation_sentence() {
        let info = extract(
            "Dublin (DUB) to London (LHR) on 2024-05-01 14:30, Flight EI 154, Booking Ref: AB12CD",
        );
        assert_eq!(info.iatas, vec!["DUB", "LHR"]);
        assert_eq!(info.dates, vec!["2024-05-01"]);
        assert_eq!(info.times, vec!["14:30"]);
        assert_eq!(info.flight_numbers, vec!["EI 154"]);
        assert_eq!(info.booking_refs, vec!["AB12CD"]);
    }

    #[test]
    fn test_direct_pair_with_slash_date() {
        let info = extract("DUB-LHR 01/05/2024");
        assert_eq!(info.iatas, vec!["DUB", "LHR"]);
        assert_eq!(info.dates, vec!["01/05/2024"]);
    }

    #[test]
    fn test_written_dates_and_meridiem_times() {
        let info = extract("Departs 3 March 2025 at 7:05 PM, returns 10 Mar 2025 9:15am");
        assert_eq!(info.dates, vec!["3 March 2025", "10 Mar 2025"]);
        assert_eq!(info.times, vec!["7:05 PM", "9:15am"]);
    }

    #[test]
    fn test_flight_number_shapes() {
        let info = extract("Flights FR1234, EZY 8012 and BA 5 but not ab123");
        assert_eq!(info.flight_numbers, vec!["FR1234", "EZY 8012", "BA 5"]);
    }

    #[test]
    fn test_booking_reference_labels() {
        let info = extract(
            "PNR: XK7P2Q. Reservation no 1A2B3C4D. Booking reference ZZTOP9 and ref QQ11WW",
        );
        assert_eq!(info.booking_refs, vec!["XK7P2Q", "1A2B3C4D", "ZZTOP9", "QQ11WW"]);
    }

    #[test]
    fn test_outputs_are_deduplicated() {
        let info = extract("EI 154 EI 154 on 2024-05-01 and 2024-05-01 at 14:30 / 14:30");
        assert_eq!(info.flight_numbers, vec!["EI 154"]);
        assert_eq!(info.dates, vec!["2024-05-01"]);
        assert_eq!(info.times, vec!["14:30"]);
    }

    #[test]
    fn test_extract_message_requires_evidence() {
        let ex = FlightExtractor::default();
        let rec = ex
            .extract_message("m1", "Your trip DUB-LHR", "Flight EI 154 on 2024-05-01")
            .expect("qualifies");
        assert_eq!(rec.message_id, "m1");
        assert_eq!(rec.subject, "Your trip DUB-LHR");
        assert_eq!(rec.iatas, vec!["DUB", "LHR"]);

        // No flight number.
        assert!(ex
            .extract_message("m2", "Your trip DUB-LHR", "on 2024-05-01")
            .is_none());
        // No date.
        assert!(ex
            .extract_message("m3", "Your trip DUB-LHR", "Flight EI 154")
            .is_none());
    }

    #[test]
    fn test_custom_table_controls_validation() {
        let table = AirportTable::from_csv("AAA,Alpha,Alpha\nBBB,Bravo,Bravo\n").expect("table");
        let ex = FlightExtractor::new(&table);
        assert_eq!(ex.extract("AAA-BBB").iatas, vec!["AAA", "BBB"]);
        assert!(ex.extract("DUB-LHR").iatas.is_empty());
    }
}
