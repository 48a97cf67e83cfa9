//! Expansion of command targets into a flat ticker sequence.

use std::collections::HashSet;

use crate::lists::ListStore;
use crate::{has_sigil, strip_sigil, Notice, Ticker};

/// Output of [`resolve`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Unique tickers in first-seen order.
    pub tickers: Vec<Ticker>,
    /// Tokens that failed ticker validation.
    pub rejected: Vec<Notice>,
}

/// Resolves list names and ticker tokens.
///
/// A bare token naming an existing list expands into its members unless
/// `in_list_context` is set. Members are already [`Ticker`]s, so expansion
/// never goes deeper than one level. `$`-prefixed tokens are always taken
/// literally. With no tokens every list is expanded.
pub fn resolve<S: AsRef<str>>(tokens: &[S], lists: &ListStore, in_list_context: bool) -> Resolution {
    let mut resolution = Resolution::default();
    let mut seen = HashSet::new();
    let mut push = |ticker: Ticker, resolution: &mut Resolution| {
        if seen.insert(ticker.clone()) {
            resolution.tickers.push(ticker);
        }
    };

    if tokens.is_empty() {
        for name in lists.names() {
            for ticker in lists.get(name).into_iter().flatten() {
                push(ticker.clone(), &mut resolution);
            }
        }
        return resolution;
    }

    for raw in tokens {
        let raw = raw.as_ref();
        let stripped = strip_sigil(raw);
        if stripped.is_empty() {
            continue;
        }

        if !in_list_context && !has_sigil(raw) {
            if let Some(members) = lists.get(stripped) {
                for ticker in members {
                    push(ticker.clone(), &mut resolution);
                }
                continue;
            }
        }

        match Ticker::parse(stripped) {
            Ok(ticker) => push(ticker, &mut resolution),
            Err(reason) => resolution.rejected.push(Notice::RejectedToken {
                token: raw.trim().to_owned(),
                reason,
            }),
        }
    }

    resolution
}
