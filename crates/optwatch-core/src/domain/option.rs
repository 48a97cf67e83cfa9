use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use super::{MonthCode, Ticker};

/// Option right. Fetches always walk [`OptionType::ALL`] in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionType {
    Put,
    Call,
}

impl OptionType {
    pub const ALL: [Self; 2] = [Self::Put, Self::Call];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Put => "put",
            Self::Call => "call",
        }
    }

    pub const fn title(self) -> &'static str {
        match self {
            Self::Put => "Put",
            Self::Call => "Call",
        }
    }

    /// A put is out of the money above its strike, a call below it.
    pub fn is_out_of_the_money(self, strike: f64, underlying: f64) -> bool {
        match self {
            Self::Put => strike < underlying,
            Self::Call => strike > underlying,
        }
    }
}

impl Display for OptionType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One contract row of a raw option chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionQuote {
    pub strike: f64,
    pub bid: f64,
    pub ask: f64,
    pub last: f64,
    pub implied_volatility: f64,
    pub volume: Option<u64>,
    pub open_interest: Option<u64>,
}

impl OptionQuote {
    /// Mid price when both sides are quoted, otherwise the bid.
    pub fn premium(&self) -> f64 {
        if self.bid > 0.0 && self.ask >= self.bid {
            (self.bid + self.ask) / 2.0
        } else {
            self.bid
        }
    }
}

/// Raw chain for one ticker, expiration and right.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionChain {
    pub ticker: Ticker,
    pub month: MonthCode,
    pub option_type: OptionType,
    pub underlying_price: f64,
    pub contracts: Vec<OptionQuote>,
}

/// Single option that passed the filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilteredOption {
    pub strike: f64,
    pub premium: f64,
    pub implied_volatility: f64,
    /// Premium relative to the capital at risk, as a fraction.
    pub premium_yield: f64,
    /// Probability of expiring out of the money, as a fraction.
    pub probability_otm: f64,
    /// Distance of the strike from the underlying, as a fraction.
    pub percent_out: f64,
    /// Puts: effective cost basis if assigned. Calls: return if called away.
    pub if_assigned: f64,
    pub in_the_money: bool,
}

/// Vertical credit spread: sell `short_strike`, buy `long_strike`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditSpread {
    pub option_type: OptionType,
    pub short_strike: f64,
    pub long_strike: f64,
    pub width: f64,
    pub credit: f64,
    /// Credit relative to maximum loss, as a fraction.
    pub return_on_risk: f64,
    pub probability_otm: f64,
    pub percent_out: f64,
}

/// Upcoming ex-dividend entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dividend {
    pub ticker: Ticker,
    pub company: String,
    pub ex_date: String,
    pub rate: f64,
    pub annual_rate: f64,
    /// Annual rate over the share price, as a fraction. `None` when the
    /// calendar carries no price.
    pub dividend_yield: Option<f64>,
}
