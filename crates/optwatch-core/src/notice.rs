use std::fmt::{Display, Formatter};
use std::path::PathBuf;

use crate::{OptionType, Ticker, ValidationError};

/// Persisted store a save or load refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Lists,
    Months,
    Settings,
}

impl StoreKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lists => "lists",
            Self::Months => "months",
            Self::Settings => "settings",
        }
    }
}

impl Display for StoreKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Non-fatal, user-facing condition raised by an operation.
///
/// Operations collect these instead of failing so that the remaining
/// targets of a command still run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Ticker the chain source cannot resolve.
    InvalidTicker(Ticker),
    /// Token that could not be normalized into a ticker.
    RejectedToken {
        token: String,
        reason: ValidationError,
    },
    NoListSpecified,
    NoValidList,
    ListExists(String),
    ListMissing(String),
    InvalidList(String),
    NotInList(Ticker),
    RefreshingMonths,
    DataDirCreated(PathBuf),
    CredentialMissing,
    ChainUnavailable {
        ticker: Ticker,
        option_type: OptionType,
        message: String,
    },
    SaveFailed {
        store: StoreKind,
        message: String,
    },
}

impl Display for Notice {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTicker(ticker) => write!(f, "{ticker} is not a valid stock ticker"),
            Self::RejectedToken { token, reason } => {
                write!(f, "'{token}' is not a valid ticker: {reason}")
            }
            Self::NoListSpecified => f.write_str("No list specified"),
            Self::NoValidList => f.write_str("No valid list specified"),
            Self::ListExists(name) => write!(f, "{name} already exists"),
            Self::ListMissing(name) => write!(f, "{name} does not exist"),
            Self::InvalidList(name) => write!(f, "{name} is not a valid list"),
            Self::NotInList(ticker) => write!(f, "{ticker} not in list"),
            Self::RefreshingMonths => f.write_str("Refreshing contract months..."),
            Self::DataDirCreated(path) => write!(f, "Building data dir {}", path.display()),
            Self::CredentialMissing => f.write_str(
                "SLOGIN not set for options. Use 'set SLOGIN xxxxxxxxxx' to set.",
            ),
            Self::ChainUnavailable {
                ticker,
                option_type,
                message,
            } => write!(f, "could not fetch {option_type} chain for {ticker}: {message}"),
            Self::SaveFailed { store, message } => write!(f, "failed to save {store}: {message}"),
        }
    }
}
