//! Watchlist parsing for batch commands.
//!
//! The symbol set always arrives as configuration; the core never embeds a
//! fixed list of instruments.

use std::collections::HashSet;

#[derive(Debug, Clone, thiserror::Error)]
pub enum WatchlistError {
    #[error("empty token in symbol list")]
    EmptyToken,

    #[error("duplicate symbol: {0}")]
    DuplicateSymbol(String),
}

/// Parse a comma-separated symbol list, trimming and uppercasing each token.
pub fn parse_symbols(input: &str) -> Result<Vec<String>, WatchlistError> {
    let mut symbols = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(WatchlistError::EmptyToken);
        }
        let symbol = trimmed.to_uppercase();
        if seen.contains(&symbol) {
            return Err(WatchlistError::DuplicateSymbol(symbol));
        }
        seen.insert(symbol.clone());
        symbols.push(symbol);
    }

    Ok(symbols)
}
