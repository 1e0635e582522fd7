//! JSON export: a pretty-printed array of flight entities.

use crate::error::{PlanemailError, Result};
use crate::model::flight::FlightEntity;

pub fn to_json(entities: &[FlightEntity]) -> Result<String> {
    serde_json::to_string_pretty(entities).map_err(|e| PlanemailError::ExportError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_uses_camel_case_fields() {
        let entity = FlightEntity {
            subject: "Trip".into(),
            departure_iata: "DUB".into(),
            arrival_iata: "LHR".into(),
            date: "2024-05-01".into(),
            time: String::new(),
            flight_number: "EI 154".into(),
            booking_refs: vec![],
            message_ids: vec!["m1".into()],
            accounts: vec!["a".into()],
        };
        let json = to_json(&[entity.clone()]).unwrap();
        assert!(json.contains("\"flightNumber\": \"EI 154\""));
        assert!(json.contains("\"bookingRefs\": []"));

        let back: Vec<FlightEntity> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, vec![entity]);
        assert_eq!(to_json(&[]).unwrap(), "[]");
    }
}
