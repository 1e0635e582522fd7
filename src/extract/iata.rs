//! Airport-code recovery: an ordered chain of strategies with an early
//! accept threshold, followed by validation against the reference table.

use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

use super::airports::AirportTable;
use crate::model::flight::dedup_ordered;

/// A strategy is accepted once it yields this many candidates.
pub const MIN_CODES: usize = 2;

static RE_PARENTHETICAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(([A-Z]{3})\)").unwrap());

static RE_DIRECT_PAIR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Z]{3})(?:-| to )([A-Z]{3})").unwrap());

/// Candidate sources, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IataStrategy {
    /// `Dublin (DUB) to London (LHR)`
    Parenthetical,
    /// `DUB-LHR` or `DUB to LHR`
    DirectPair,
    /// Airport names and cities looked up in the reference table.
    NamedAirport,
}

impl IataStrategy {
    pub const ORDER: [IataStrategy; 3] = [
        IataStrategy::Parenthetical,
        IataStrategy::DirectPair,
        IataStrategy::NamedAirport,
    ];

    /// Raw candidates found by this strategy, in text order.
    pub fn candidates(self, text: &str, table: &AirportTable) -> Vec<String> {
        match self {
            Self::Parenthetical => RE_PARENTHETICAL
                .captures_iter(text)
                .map(|c| c[1].to_string())
                .collect(),
            Self::DirectPair => RE_DIRECT_PAIR
                .captures_iter(text)
                .flat_map(|c| [c[1].to_string(), c[2].to_string()])
                .collect(),
            Self::NamedAirport => table.find_names(text),
        }
    }
}

/// Candidates of the first strategy reaching [`MIN_CODES`], if any.
pub fn select_candidates(text: &str, table: &AirportTable) -> Option<(IataStrategy, Vec<String>)> {
    IataStrategy::ORDER.into_iter().find_map(|strategy| {
        let found = strategy.candidates(text, table);
        (found.len() >= MIN_CODES).then_some((strategy, found))
    })
}

/// Validated, deduplicated airport codes for `text`; empty when fewer than
/// [`MIN_CODES`] survive.
pub fn airport_codes(text: &str, table: &AirportTable) -> Vec<String> {
    let Some((strategy, candidates)) = select_candidates(text, table) else {
        return Vec::new();
    };

    let valid = dedup_ordered(candidates.into_iter().filter(|code| table.contains(code)));
    trace!(?strategy, codes = ?valid, "Airport strategy accepted");

    if valid.len() < MIN_CODES {
        Vec::new()
    } else {
        valid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> &'static AirportTable {
        AirportTable::builtin()
    }

    #[test]
    fn test_parenthetical_wins_first() {
        let text = "Dublin (DUB) to London (LHR) also JFK-LAX";
        let (strategy, codes) = select_candidates(text, table()).expect("match");
        assert_eq!(strategy, IataStrategy::Parenthetical);
        assert_eq!(codes, vec!["DUB", "LHR"]);
    }

    #[test]
    fn test_direct_pair_fallback() {
        assert_eq!(airport_codes("DUB-LHR 01/05/2024", table()), vec!["DUB", "LHR"]);
        assert_eq!(airport_codes("JFK to SFO", table()), vec!["JFK", "SFO"]);
    }

    #[test]
    fn test_single_parenthetical_falls_through() {
        let text = "Terminal (DUB) route BOS-SEA";
        let (strategy, codes) = select_candidates(text, table()).expect("match");
        assert_eq!(strategy, IataStrategy::DirectPair);
        assert_eq!(codes, vec!["BOS", "SEA"]);
    }

    #[test]
    fn test_named_airport_fallback() {
        let codes = airport_codes("Departing Dublin arriving Amsterdam", table());
        assert_eq!(codes, vec!["DUB", "AMS"]);
    }

    #[test]
    fn test_accepted_strategy_is_not_reconsidered() {
        // Parenthetical qualifies with two unknown codes; validation then
        // empties it even though a direct pair would have been valid.
        let text = "(QQQ) (XXX) DUB-LHR";
        assert!(airport_codes(text, table()).is_empty());
    }

    #[test]
    fn test_duplicate_codes_do_not_qualify() {
        assert!(airport_codes("(DUB) and again (DUB)", table()).is_empty());
    }

    #[test]
    fn test_nothing_found() {
        assert!(select_candidates("no airports here", table()).is_none());
        assert!(airport_codes("no airports here", table()).is_empty());
    }
}
