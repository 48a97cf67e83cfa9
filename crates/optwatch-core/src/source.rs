//! Collaborator contracts for market data.
//!
//! The engine never talks to the network directly. It asks a
//! [`ChainSource`] for contract months and option chains and a
//! [`DividendSource`] for the ex-dividend calendar.
//!
//! | Trait | Method | Response |
//! |-------|--------|----------|
//! | [`ChainSource`] | [`contract_months`](ChainSource::contract_months) | `Vec<MonthCode>` |
//! | [`ChainSource`] | [`option_chain`](ChainSource::option_chain) | [`OptionChain`] |
//! | [`ChainSource`] | [`daily_watchlist`](ChainSource::daily_watchlist) | `Vec<Ticker>` |
//! | [`DividendSource`] | [`upcoming_dividends`](DividendSource::upcoming_dividends) | `Vec<Dividend>` |

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use time::Date;

use crate::{Dividend, MonthCode, OptionChain, OptionType, Ticker};

/// Boxed future returned by collaborator methods.
pub type SourceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, SourceError>> + Send + 'a>>;

/// Adapter-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    InvalidTicker,
    Unavailable,
    RateLimited,
    Malformed,
    Internal,
}

/// Structured source error returned by collaborators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
    retryable: bool,
}

impl SourceError {
    pub fn invalid_ticker(ticker: &Ticker, message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::InvalidTicker,
            message: format!("{ticker}: {}", message.into()),
            retryable: false,
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Unavailable,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::RateLimited,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Malformed,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Internal,
            message: message.into(),
            retryable: false,
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::InvalidTicker => "source.invalid_ticker",
            SourceErrorKind::Unavailable => "source.unavailable",
            SourceErrorKind::RateLimited => "source.rate_limited",
            SourceErrorKind::Malformed => "source.malformed",
            SourceErrorKind::Internal => "source.internal",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

/// Option-chain collaborator.
///
/// Implementations must be `Send + Sync`; the engine itself awaits one call
/// at a time.
pub trait ChainSource: Send + Sync {
    /// Short provider name used in logs.
    fn name(&self) -> &'static str;

    /// Expiration months currently listed for `ticker`, in any order.
    ///
    /// # Errors
    ///
    /// Returns [`SourceErrorKind::InvalidTicker`] when the provider does not
    /// know the ticker or lists no options for it.
    fn contract_months<'a>(&'a self, ticker: &'a Ticker) -> SourceFuture<'a, Vec<MonthCode>>;

    /// Underlying price and raw chain for one expiration and right.
    fn option_chain<'a>(
        &'a self,
        ticker: &'a Ticker,
        month: MonthCode,
        option_type: OptionType,
    ) -> SourceFuture<'a, OptionChain>;

    /// Tickers worth scanning in the unattended daily report.
    fn daily_watchlist<'a>(&'a self) -> SourceFuture<'a, Vec<Ticker>>;
}

/// Ex-dividend calendar collaborator.
pub trait DividendSource: Send + Sync {
    /// Entries going ex-dividend on the first trading day after `today`.
    fn upcoming_dividends<'a>(&'a self, today: Date) -> SourceFuture<'a, Vec<Dividend>>;
}
