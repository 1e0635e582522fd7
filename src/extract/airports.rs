//! Airport reference data: valid IATA codes and the name/city lookup used
//! by the named-airport strategy.
//!
//! The table is CSV with a `iata,name,city` header. The built-in copy is
//! embedded at compile time and parsed once per process.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use tracing::warn;

use crate::error::{PlanemailError, Result};

const BUILTIN_CSV: &str = include_str!("../../data/airports.csv");

/// Compiled size cap for the name alternation (large user tables).
const NAME_PATTERN_SIZE_LIMIT: usize = 64 * 1024 * 1024;

static BUILTIN: LazyLock<AirportTable> = LazyLock::new(|| {
    AirportTable::from_csv(BUILTIN_CSV).expect("embedded airport table is valid")
});

/// One row of the reference table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Airport {
    pub iata: String,
    pub name: String,
    pub city: String,
}

/// Read-only lookup structures built from a list of airports.
#[derive(Debug)]
pub struct AirportTable {
    airports: Vec<Airport>,
    codes: HashSet<String>,
    /// Lowercase name or city → IATA code. First row wins on collisions.
    by_name: HashMap<String, String>,
    name_pattern: Option<Regex>,
}

impl AirportTable {
    /// The table shipped with the binary.
    pub fn builtin() -> &'static AirportTable {
        &BUILTIN
    }

    /// Build a table from rows. Later rows never override earlier names.
    pub fn new(airports: Vec<Airport>) -> Result<Self> {
        let mut codes = HashSet::new();
        let mut by_name = HashMap::new();

        for airport in &airports {
            codes.insert(airport.iata.clone());
            for label in [&airport.name, &airport.city] {
                let key = label.trim().to_lowercase();
                if !key.is_empty() {
                    by_name.entry(key).or_insert_with(|| airport.iata.clone());
                }
            }
        }

        let name_pattern = build_name_pattern(by_name.keys())?;

        Ok(Self {
            airports,
            codes,
            by_name,
            name_pattern,
        })
    }

    /// Parse CSV text (`iata,name,city`). Malformed rows are skipped.
    pub fn from_csv(text: &str) -> Result<Self> {
        let mut airports = Vec::new();

        for (line_no, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if line_no == 0 && line.to_lowercase().starts_with("iata,") {
                continue;
            }

            let mut fields = line.splitn(3, ',').map(str::trim);
            let iata = fields.next().unwrap_or_default();
            let name = fields.next().unwrap_or_default();
            let city = fields.next().unwrap_or_default();

            if !is_iata_code(iata) {
                warn!(line = line_no + 1, value = iata, "Skipping airport row with invalid code");
                continue;
            }

            airports.push(Airport {
                iata: iata.to_string(),
                name: name.to_string(),
                city: city.to_string(),
            });
        }

        Self::new(airports)
    }

    /// Load a CSV table from disk.
    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PlanemailError::FileNotFound(path.to_path_buf())
            } else {
                PlanemailError::io(path, e)
            }
        })?;
        Self::from_csv(&text)
    }

    /// A new table holding `self`'s rows first, then `fallback`'s.
    pub fn merged_with(&self, fallback: &AirportTable) -> Result<Self> {
        let mut rows = self.airports.clone();
        rows.extend(fallback.airports.iter().cloned());
        Self::new(rows)
    }

    /// Whether `code` is a known IATA code.
    pub fn contains(&self, code: &str) -> bool {
        self.codes.contains(code)
    }

    /// Code for an airport name or city, case-insensitively.
    pub fn code_for_name(&self, name: &str) -> Option<&str> {
        self.by_name.get(&name.to_lowercase()).map(String::as_str)
    }

    /// Codes of every airport name or city mentioned in `text`, in text order.
    pub fn find_names(&self, text: &str) -> Vec<String> {
        let Some(pattern) = &self.name_pattern else {
            return Vec::new();
        };
        pattern
            .find_iter(text)
            .filter_map(|m| self.code_for_name(m.as_str()))
            .map(str::to_string)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.airports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.airports.is_empty()
    }
}

/// Three ASCII uppercase letters.
pub fn is_iata_code(s: &str) -> bool {
    s.len() == 3 && s.bytes().all(|b| b.is_ascii_uppercase())
}

/// Case-insensitive, word-bounded alternation of all names.
///
/// Longer names come first so "London City" beats "London".
fn build_name_pattern<'a>(names: impl Iterator<Item = &'a String>) -> Result<Option<Regex>> {
    let mut names: Vec<&String> = names.collect();
    if names.is_empty() {
        return Ok(None);
    }
    names.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

    let alternation = names
        .iter()
        .map(|n| regex::escape(n))
        .collect::<Vec<_>>()
        .join("|");

    RegexBuilder::new(&format!(r"\b(?:{alternation})\b"))
        .case_insensitive(true)
        .size_limit(NAME_PATTERN_SIZE_LIMIT)
        .build()
        .map(Some)
        .map_err(|e| PlanemailError::InvalidAirportTable(e.to_string()))
}
