//! # Domain Models
//!
//! Canonical, validated types shared by the stores, the orchestrator and the
//! collaborator adapters.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Ticker`] | Normalized equity ticker (uppercase, no `$`) |
//! | [`MonthCode`] | Contract expiration, persisted as `YYYYMMDD` |
//! | [`InstrumentMode`] | Bit-flag set of requested instrument kinds |
//! | [`OptionType`] | Put or call |
//! | [`OptionChain`] | Raw chain for one ticker/month/right |
//! | [`FilteredOption`] | Option that passed the filter |
//! | [`CreditSpread`] | Vertical credit spread candidate |
//! | [`Dividend`] | Upcoming ex-dividend entry |

mod mode;
mod month;
mod option;
mod ticker;

pub use mode::InstrumentMode;
pub use month::MonthCode;
pub use option::{
    CreditSpread, Dividend, FilteredOption, OptionChain, OptionQuote, OptionType,
};
pub use ticker::{has_sigil, strip_sigil, Ticker, TICKER_SIGIL};
