//! Per-message extraction records and aggregated flight entities.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Flight facts recovered from one qualifying message.
///
/// Every sequence is deduplicated and keeps first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionRecord {
    pub message_id: String,
    pub subject: String,
    pub iatas: Vec<String>,
    pub dates: Vec<String>,
    pub times: Vec<String>,
    pub flight_numbers: Vec<String>,
    pub booking_refs: Vec<String>,
}

impl ExtractionRecord {
    /// Minimum evidence for a flight mention: two airports, a date and a flight number.
    pub fn qualifies(&self) -> bool {
        self.iatas.len() >= 2 && !self.dates.is_empty() && !self.flight_numbers.is_empty()
    }
}

/// One physical flight, merged from every message that mentions it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightEntity {
    pub subject: String,
    pub departure_iata: String,
    pub arrival_iata: String,
    pub date: String,
    pub time: String,
    pub flight_number: String,
    pub booking_refs: Vec<String>,
    pub message_ids: Vec<String>,
    /// Labels of the accounts the messages came from (provenance only).
    #[serde(default)]
    pub accounts: Vec<String>,
}

impl FlightEntity {
    /// Composite identity: `departure|arrival|date|time|flight_number`.
    pub fn key(&self) -> String {
        identity_key(
            &self.departure_iata,
            &self.arrival_iata,
            &self.date,
            &self.time,
            &self.flight_number,
        )
    }
}

/// Build the identity key shared by records and entities.
pub fn identity_key(dep: &str, arr: &str, date: &str, time: &str, flight_number: &str) -> String {
    format!("{dep}|{arr}|{date}|{time}|{flight_number}")
}

/// Drop repeated items, keeping the first occurrence of each.
pub fn dedup_ordered<I>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

/// Append `item` unless already present. Returns whether it was added.
pub fn push_unique(list: &mut Vec<String>, item: &str) -> bool {
    if list.iter().any(|existing| existing == item) {
        false
    } else {
        list.push(item.to_string());
        true
    }
}
