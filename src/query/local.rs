//! Local evaluation of Gmail search syntax for archived mailboxes.
//!
//! # Supported syntax
//!
//! - `term` / `"exact phrase"`: case-insensitive substring of subject + body
//! - `t1 t2`: implicit AND; any `OR` token turns all text terms into OR
//! - `-term`: exclude
//! - `subject:value` / `subject:"phrase"`
//! - `after:YYYY/MM/DD` (inclusive), `before:YYYY/MM/DD` (exclusive);
//!   dashes are accepted too
//! - `( ... )` grouping is accepted and ignored
//! - `category:` is ignored (archives carry no categories)

use chrono::NaiveDate;

/// A text condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextTerm {
    /// Lowercase needle.
    pub needle: String,
    pub subject_only: bool,
    pub negated: bool,
}

/// A parsed query, ready to match catalogue entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalQuery {
    pub terms: Vec<TextTerm>,
    /// Inclusive lower bound.
    pub after: Option<NaiveDate>,
    /// Exclusive upper bound.
    pub before: Option<NaiveDate>,
    /// Text terms are OR-ed instead of AND-ed.
    pub is_or: bool,
}

impl LocalQuery {
    /// Parse a query string. Never fails; unknown syntax is plain text.
    pub fn parse(input: &str) -> Self {
        let mut query = LocalQuery::default();

        for raw in tokenize(input.trim()) {
            let token = raw.trim_start_matches('(').trim_end_matches(')');
            if token.is_empty() {
                continue;
            }
            if token == "OR" {
                query.is_or = true;
                continue;
            }

            let (negated, token) = match token.strip_prefix('-') {
                Some(rest) if !rest.is_empty() => (true, rest),
                _ => (false, token),
            };

            if token.starts_with("category:") {
                continue;
            } else if let Some(value) = token.strip_prefix("subject:") {
                query.push_text(value, true, negated);
            } else if let Some(value) = token.strip_prefix("after:") {
                if let Some(d) = parse_query_date(value) {
                    query.after = Some(d);
                }
            } else if let Some(value) = token.strip_prefix("before:") {
                if let Some(d) = parse_query_date(value) {
                    query.before = Some(d);
                }
            } else {
                query.push_text(token, false, negated);
            }
        }

        query
    }

    fn push_text(&mut self, value: &str, subject_only: bool, negated: bool) {
        let needle = unquote(value).to_lowercase();
        if !needle.is_empty() {
            self.terms.push(TextTerm {
                needle,
                subject_only,
                negated,
            });
        }
    }

    /// Match one message. `subject` and `text` must already be lowercase;
    /// `text` should include the subject.
    pub fn matches(&self, subject: &str, text: &str, date: Option<NaiveDate>) -> bool {
        if self.after.is_some() || self.before.is_some() {
            let Some(date) = date else {
                return false;
            };
            if self.after.is_some_and(|after| date < after) {
                return false;
            }
            if self.before.is_some_and(|before| date >= before) {
                return false;
            }
        }

        let (excluded, required): (Vec<&TextTerm>, Vec<&TextTerm>) =
            self.terms.iter().partition(|t| t.negated);

        let hit = |term: &TextTerm| {
            let haystack = if term.subject_only { subject } else { text };
            haystack.contains(&term.needle)
        };

        if excluded.iter().any(|t| hit(t)) {
            return false;
        }
        if required.is_empty() {
            return true;
        }
        if self.is_or {
            required.iter().any(|t| hit(t))
        } else {
            required.iter().all(|t| hit(t))
        }
    }
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(value)
}

/// `YYYY/MM/DD` as Gmail writes it, or ISO `YYYY-MM-DD`.
fn parse_query_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y/%m/%d")
        .or_else(|_| NaiveDate::parse_from_str(value, "%Y-%m-%d"))
        .ok()
}

/// Split on whitespace outside double quotes.
fn tokenize(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in input.chars() {
        if ch == '"' {
            in_quotes = !in_quotes;
            current.push(ch);
        } else if ch.is_whitespace() && !in_quotes {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
        } else {
            current.push(ch);
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}
