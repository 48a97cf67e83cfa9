//! Concrete market-data collaborators.

pub mod mock;
pub mod nasdaq;
pub mod yahoo;

pub use mock::{third_fridays, MockCalls, MockChainSource, MockDividendSource};
pub use nasdaq::{next_trading_day, NasdaqDividendSource};
pub use yahoo::YahooChainSource;
