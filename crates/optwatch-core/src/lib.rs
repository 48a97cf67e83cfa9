//! # optwatch core
//!
//! Watchlist and contract-month state engine with fetch orchestration.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Yahoo options, Nasdaq dividends and deterministic mocks |
//! | [`domain`] | Tickers, month codes, instrument modes, chain types |
//! | [`error`] | Validation, persistence and startup errors |
//! | [`fetch`] | Fetch orchestrator and streamed events |
//! | [`http_client`] | HTTP transport abstraction |
//! | [`lists`] | Named watchlists |
//! | [`months`] | Contract-month cache with rollover |
//! | [`notice`] | Non-fatal user-facing conditions |
//! | [`persistence`] | Flat CSV files in the data directory |
//! | [`prompt`] | Confirmation prompts |
//! | [`resolver`] | Target expansion into tickers |
//! | [`retry`] | Backoff and retry for HTTP calls |
//! | [`settings`] | Typed settings store |
//! | [`source`] | Collaborator traits and source errors |
//! | [`strategy`] | Option filter and credit-spread builder |
//! | [`workspace`] | Owner of the stores and their files |
//!
//! ## Architecture
//!
//! ```text
//! command ─▶ resolver ─▶ fetcher ─▶ month cache (rollover) ─▶ chain source
//!                           │                                      │
//!                           ▼                                      ▼
//!                      FetchEvent ◀──────── strategy ◀──────── OptionChain
//! ```

pub mod adapters;
pub mod domain;
pub mod error;
pub mod fetch;
pub mod http_client;
pub mod lists;
pub mod months;
pub mod notice;
pub mod persistence;
pub mod prompt;
pub mod resolver;
pub mod retry;
pub mod settings;
pub mod source;
pub mod strategy;
pub mod workspace;

pub use domain::*;
pub use error::{CoreError, PersistenceError, ValidationError};
pub use fetch::{ChainReport, FetchEvent, FetchSummary, Fetcher};
pub use lists::ListStore;
pub use months::{ContractMonthCache, LoadSummary, RollOutcome};
pub use notice::{Notice, StoreKind};
pub use persistence::DataPaths;
pub use prompt::{confirm, Prompt, ScriptedPrompt};
pub use resolver::{resolve, Resolution};
pub use settings::{SettingKey, SettingValue, Settings};
pub use source::{ChainSource, DividendSource, SourceError, SourceErrorKind};
pub use strategy::{OptionFilter, PremiumFilter, SpreadBuilder, VerticalSpreadBuilder};
pub use workspace::{load_settings, Workspace};
