//! Flight-log CSV (the column layout flight-tracking apps import).

use chrono::{NaiveDate, NaiveTime};

use crate::model::flight::FlightEntity;

/// Column header, written verbatim.
pub const HEADER: &str = "Date,\"Flight number\",From,To,\"Dep time\",\"Arr time\",Duration,\
Airline,Aircraft,Registration,\"Seat number\",\"Seat type\",\"Flight class\",\"Flight reason\",\
Note,\"Message IDs\",Dep_id,Arr_id,Airline_id,Aircraft_id,\"Booking Reference\"";

/// Render entities as CSV: header plus one row per entity, no trailing newline.
pub fn to_csv(entities: &[FlightEntity]) -> String {
    let mut lines = Vec::with_capacity(entities.len() + 1);
    lines.push(HEADER.to_string());
    lines.extend(entities.iter().map(row));
    lines.join("\n")
}

fn row(entity: &FlightEntity) -> String {
    let mut fields: Vec<String> = vec![
        csv_escape(&normalize_date(&entity.date)),
        quoted(&entity.flight_number),
        csv_escape(&entity.departure_iata),
        csv_escape(&entity.arrival_iata),
        quoted(&normalize_time(&entity.time)),
    ];
    // Arr time through Flight reason
    fields.extend(std::iter::repeat_n(String::new(), 9));
    fields.push(quoted(&entity.subject));
    fields.push(quoted(&entity.message_ids.join(",")));
    // Dep_id through Aircraft_id
    fields.extend(std::iter::repeat_n(String::new(), 4));
    fields.push(quoted(&entity.booking_refs.join(",")));
    fields.join(",")
}

/// Extracted date as `YYYY-MM-DD`; empty when unrecognised.
///
/// Accepts ISO dates, day-first `DD/MM/YYYY` and `D Month YYYY`.
pub fn normalize_date(date: &str) -> String {
    const FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%d %B %Y"];
    let date = date.trim();
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date, fmt).ok())
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// Extracted time as `HH:MM:SS`; midnight when unrecognised.
pub fn normalize_time(time: &str) -> String {
    const FORMATS: &[&str] = &["%H:%M", "%I:%M %p", "%I:%M%p"];
    let time = time.trim();
    FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(time, fmt).ok())
        .unwrap_or(NaiveTime::MIN)
        .format("%H:%M:%S")
        .to_string()
}

/// Always quote, doubling embedded quotes.
fn quoted(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// Escape a value for CSV (RFC 4180).
///
/// Wraps in double quotes if the value contains commas, quotes, or newlines.
fn csv_escape(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        quoted(value)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity() -> FlightEntity {
        FlightEntity {
            subject: "Your \"Dublin\" trip".into(),
            departure_iata: "DUB".into(),
            arrival_iata: "LHR".into(),
            date: "2024-05-01".into(),
            time: "2:30 PM".into(),
            flight_number: "EI 154".into(),
            booking_refs: vec!["AB12CD".into(), "ZX98YW".into()],
            message_ids: vec!["m1".into(), "m2".into()],
            accounts: vec!["me@example.com".into()],
        }
    }

    #[test]
    fn test_csv_escape() {
        assert_eq!(csv_escape("hello"), "hello");
        assert_eq!(csv_escape("hello, world"), "\"hello, world\"");
        assert_eq!(csv_escape("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_escape("line1\nline2"), "\"line1\nline2\"");
    }

    #[test]
    fn test_row_layout() {
        let csv = to_csv(&[entity()]);
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some(HEADER));
        assert_eq!(
            lines.next(),
            Some(
                "2024-05-01,\"EI 154\",DUB,LHR,\"14:30:00\",,,,,,,,,,\
\"Your \"\"Dublin\"\" trip\",\"m1,m2\",,,,,\"AB12CD,ZX98YW\""
            )
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_header_has_21_columns() {
        assert_eq!(HEADER.split(',').count(), 21);
        assert_eq!(to_csv(&[]), HEADER);
    }

    #[test]
    fn test_normalize_date() {
        assert_eq!(normalize_date("2024-05-01"), "2024-05-01");
        assert_eq!(normalize_date("01/05/2024"), "2024-05-01");
        assert_eq!(normalize_date("3 March 2025"), "2025-03-03");
        assert_eq!(normalize_date("10 Mar 2025"), "2025-03-10");
        assert_eq!(normalize_date("someday"), "");
    }

    #[test]
    fn test_normalize_time() {
        assert_eq!(normalize_time("14:30"), "14:30:00");
        assert_eq!(normalize_time("7:05 PM"), "19:05:00");
        assert_eq!(normalize_time("9:15am"), "09:15:00");
        assert_eq!(normalize_time(""), "00:00:00");
        assert_eq!(normalize_time("25:99"), "00:00:00");
    }
}
