//! Mailbox search queries and subject filtering.
//!
//! The query string uses Gmail search syntax. Remote mailboxes evaluate it
//! server-side; archives evaluate it with [`local::LocalQuery`].

pub mod local;

use std::fmt;

use chrono::NaiveDate;

use crate::error::{PlanemailError, Result};

/// Phrases that show up in flight confirmation subjects and bodies.
pub const DEFAULT_KEYWORDS: &[&str] = &[
    "flight confirmation",
    "flight receipt",
    "your flight",
    "itinerary",
    "boarding pass",
    "e-ticket",
    "upcoming trip",
    "airline reservation",
    "flight details",
    "travel confirmation",
];

/// Subjects containing any of these are replies, receipts or newsletters.
pub const DEFAULT_SUBJECT_BLACKLIST: &[&str] = &[
    "re:",
    "fwd:",
    "receipt",
    "ramp",
    "transaction",
    "tracked flight",
    "pantera",
    "needs an itinerary",
    "needs a receipt",
    "political pivot",
    "blockchain letter",
    "price change",
];

/// Search query builder.
///
/// ```
/// use planemail::query::SearchQuery;
///
/// let q = SearchQuery::builder()
///     .keywords(["boarding pass"])
///     .date_range(Some("2024-01-01 2024-12-31"))
///     .build();
/// assert_eq!(
///     q,
///     r#"category:travel ("boarding pass") after:2024/01/01 before:2024/12/31"#
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    keywords: Vec<String>,
    travel_category: bool,
    date_range: Option<String>,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            keywords: DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            travel_category: true,
            date_range: None,
        }
    }
}

impl SearchQuery {
    /// Start from the default keywords, restricted to the travel category.
    pub fn builder() -> Self {
        Self::default()
    }

    pub fn keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    pub fn travel_category(mut self, enabled: bool) -> Self {
        self.travel_category = enabled;
        self
    }

    /// `"START END"`; split at the first space, not validated here.
    pub fn date_range(mut self, range: Option<&str>) -> Self {
        self.date_range = range.map(str::to_string);
        self
    }

    /// Render the query string.
    pub fn build(&self) -> String {
        let phrases = self
            .keywords
            .iter()
            .map(|k| format!("\"{k}\""))
            .collect::<Vec<_>>()
            .join(" OR ");

        let mut query = if self.travel_category {
            format!("category:travel ({phrases})")
        } else {
            format!("({phrases})")
        };

        if let Some(range) = &self.date_range {
            let (start, end) = range.split_once(' ').unwrap_or((range.as_str(), ""));
            query.push_str(&format!(
                " after:{} before:{}",
                start.replace('-', "/"),
                end.replace('-', "/")
            ));
        }

        query
    }
}

/// Default query with an optional `"START END"` range.
pub fn build_search_query(date_range: Option<&str>) -> String {
    SearchQuery::builder().date_range(date_range).build()
}

/// Case-insensitive subject blacklist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectFilter {
    blacklist: Vec<String>,
}

impl Default for SubjectFilter {
    fn default() -> Self {
        Self::new(DEFAULT_SUBJECT_BLACKLIST.iter().copied())
    }
}

impl SubjectFilter {
    pub fn new<I, S>(blacklist: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            blacklist: blacklist
                .into_iter()
                .map(|s| s.as_ref().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    /// Whether the subject contains any blacklisted substring.
    pub fn is_blacklisted(&self, subject: &str) -> bool {
        let subject = subject.to_lowercase();
        self.blacklist.iter().any(|entry| subject.contains(entry))
    }
}

/// A validated `START END` pair of ISO dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Parse `"YYYY-MM-DD YYYY-MM-DD"` with `start <= end`.
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = || PlanemailError::InvalidDateRange(input.to_string());

        let (start, end) = input.trim().split_once(' ').ok_or_else(invalid)?;
        let start = NaiveDate::parse_from_str(start.trim(), "%Y-%m-%d").map_err(|_| invalid())?;
        let end = NaiveDate::parse_from_str(end.trim(), "%Y-%m-%d").map_err(|_| invalid())?;
        if start > end {
            return Err(invalid());
        }
        Ok(Self { start, end })
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.start.format("%Y-%m-%d"), self.end.format("%Y-%m-%d"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_query_without_range() {
        let q = build_search_query(None);
        assert!(q.starts_with("category:travel (\"flight confirmation\" OR \"flight receipt\""));
        assert!(q.ends_with("\"travel confirmation\")"));
        assert_eq!(q.matches(" OR ").count(), DEFAULT_KEYWORDS.len() - 1);
        assert!(!q.contains("after:"));
    }

    #[test]
    fn test_range_dashes_become_slashes() {
        let q = build_search_query(Some("2024-01-01 2024-12-31"));
        assert!(q.ends_with(") after:2024/01/01 before:2024/12/31"));
    }

    #[test]
    fn test_range_without_space() {
        let q = build_search_query(Some("2024-01-01"));
        assert!(q.ends_with(" after:2024/01/01 before:"));
    }

    #[test]
    fn test_range_split_at_first_space_only() {
        let q = SearchQuery::builder()
            .keywords(["x"])
            .travel_category(false)
            .date_range(Some("2024-01-01 2024-02-01 junk"))
            .build();
        assert_eq!(q, "(\"x\") after:2024/01/01 before:2024/02/01 junk");
    }

    #[test]
    fn test_subject_blacklist() {
        let filter = SubjectFilter::default();
        assert!(filter.is_blacklisted("RE: your flight"));
        assert!(filter.is_blacklisted("Fwd: Itinerary"));
        assert!(filter.is_blacklisted("Your Ramp transaction"));
        assert!(!filter.is_blacklisted("Your flight confirmation"));

        let custom = SubjectFilter::new(["Spam", ""]);
        assert!(custom.is_blacklisted("more spam"));
        assert!(!custom.is_blacklisted("anything"));
    }

    #[test]
    fn test_date_range_parse() {
        let range = DateRange::parse("2024-01-01 2024-12-31").expect("valid");
        assert_eq!(range.to_string(), "2024-01-01 2024-12-31");

        assert!(DateRange::parse("2024-01-01").is_err());
        assert!(DateRange::parse("2024-12-31 2024-01-01").is_err());
        assert!(DateRange::parse("yesterday today").is_err());
        assert!(matches!(
            DateRange::parse("nope"),
            Err(PlanemailError::InvalidDateRange(_))
        ));
    }
}
