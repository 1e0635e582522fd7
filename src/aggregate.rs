//! Merge per-message extraction records into one entity per physical flight.

use std::collections::HashMap;

use tracing::trace;

use crate::model::flight::{identity_key, push_unique, ExtractionRecord, FlightEntity};

/// Accumulates flight entities across accounts, in creation order.
///
/// The first record for an identity key seeds the entity; later ones only
/// contribute message ids, booking references and account labels.
#[derive(Debug, Default)]
pub struct Aggregator {
    entities: Vec<FlightEntity>,
    index: HashMap<String, usize>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one account's records into the aggregate.
    ///
    /// Records lacking a departure, arrival, date or flight number are dropped.
    pub fn ingest<I>(&mut self, account: &str, records: I)
    where
        I: IntoIterator<Item = ExtractionRecord>,
    {
        for record in records {
            self.ingest_one(account, record);
        }
    }

    fn ingest_one(&mut self, account: &str, record: ExtractionRecord) {
        let (Some(dep), Some(arr), Some(date), Some(flight_number)) = (
            record.iatas.first(),
            record.iatas.get(1),
            record.dates.first(),
            record.flight_numbers.first(),
        ) else {
            trace!(id = %record.message_id, "Incomplete record, discarded");
            return;
        };
        let time = record.times.first().map(String::as_str).unwrap_or("");
        let key = identity_key(dep, arr, date, time, flight_number);

        if let Some(&i) = self.index.get(&key) {
            let entity = &mut self.entities[i];
            entity.message_ids.push(record.message_id);
            for booking_ref in &record.booking_refs {
                push_unique(&mut entity.booking_refs, booking_ref);
            }
            push_unique(&mut entity.accounts, account);
            return;
        }

        let entity = FlightEntity {
            subject: record.subject,
            departure_iata: dep.clone(),
            arrival_iata: arr.clone(),
            date: date.clone(),
            time: time.to_string(),
            flight_number: flight_number.clone(),
            booking_refs: record.booking_refs,
            message_ids: vec![record.message_id],
            accounts: vec![account.to_string()],
        };
        self.index.insert(key, self.entities.len());
        self.entities.push(entity);
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn entities(&self) -> &[FlightEntity] {
        &self.entities
    }

    pub fn into_entities(self) -> Vec<FlightEntity> {
        self.entities
    }
}
