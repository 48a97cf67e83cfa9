//! Deterministic offline collaborators for `--mock` runs and tests.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::{Mutex, MutexGuard};

use time::{Date, Duration, Month, Weekday};

use crate::source::{ChainSource, DividendSource, SourceError, SourceFuture};
use crate::{Dividend, MonthCode, OptionChain, OptionQuote, OptionType, Ticker};

/// Every call the mock chain source has served, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MockCalls {
    pub contract_months: Vec<Ticker>,
    pub option_chains: Vec<(Ticker, MonthCode, OptionType)>,
    pub daily_watchlist: usize,
}

#[derive(Debug, Default)]
struct MockState {
    /// Successive `contract_months` answers per ticker; the last one repeats.
    months: BTreeMap<Ticker, VecDeque<Vec<MonthCode>>>,
    chains: BTreeMap<(Ticker, OptionType), OptionChain>,
    unknown: BTreeSet<Ticker>,
    failing: bool,
    watchlist: Vec<Ticker>,
    synthetic_from: Option<Date>,
    calls: MockCalls,
}

/// Scriptable [`ChainSource`].
///
/// Unscripted tickers are invalid unless synthetic generation is on, in
/// which case they get the next six third-Friday expirations and a chain
/// priced from the distance between strike and underlying.
#[derive(Debug, Default)]
pub struct MockChainSource {
    state: Mutex<MockState>,
}

impl MockChainSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves every ticker with generated months and chains relative to `today`.
    pub fn synthetic(today: Date) -> Self {
        let source = Self::new();
        source.lock().synthetic_from = Some(today);
        source
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    pub fn set_months(&self, ticker: &Ticker, months: Vec<MonthCode>) -> &Self {
        self.lock()
            .months
            .insert(ticker.clone(), VecDeque::from([months]));
        self
    }

    /// Queues a later answer for `ticker`, served after the current one.
    pub fn then_months(&self, ticker: &Ticker, months: Vec<MonthCode>) -> &Self {
        self.lock()
            .months
            .entry(ticker.clone())
            .or_default()
            .push_back(months);
        self
    }

    pub fn set_chain(&self, chain: OptionChain) -> &Self {
        self.lock()
            .chains
            .insert((chain.ticker.clone(), chain.option_type), chain);
        self
    }

    pub fn set_unknown(&self, ticker: &Ticker) -> &Self {
        self.lock().unknown.insert(ticker.clone());
        self
    }

    /// Makes every call fail as unavailable.
    pub fn set_failing(&self, failing: bool) -> &Self {
        self.lock().failing = failing;
        self
    }

    pub fn set_watchlist(&self, tickers: Vec<Ticker>) -> &Self {
        self.lock().watchlist = tickers;
        self
    }

    pub fn calls(&self) -> MockCalls {
        self.lock().calls.clone()
    }

    pub fn reset_calls(&self) {
        self.lock().calls = MockCalls::default();
    }

    fn months_for(&self, ticker: &Ticker) -> Result<Vec<MonthCode>, SourceError> {
        let mut state = self.lock();
        state.calls.contract_months.push(ticker.clone());
        if state.failing {
            return Err(SourceError::unavailable("mock source is offline"));
        }
        if state.unknown.contains(ticker) {
            return Err(SourceError::invalid_ticker(ticker, "unknown to mock source"));
        }

        if let Some(queue) = state.months.get_mut(ticker) {
            let answer = if queue.len() > 1 {
                queue.pop_front()
            } else {
                queue.front().cloned()
            };
            return Ok(answer.unwrap_or_default());
        }

        match state.synthetic_from {
            Some(today) => Ok(third_fridays(today, 6)),
            None => Err(SourceError::invalid_ticker(ticker, "unknown to mock source")),
        }
    }

    fn chain_for(
        &self,
        ticker: &Ticker,
        month: MonthCode,
        option_type: OptionType,
    ) -> Result<OptionChain, SourceError> {
        let mut state = self.lock();
        state
            .calls
            .option_chains
            .push((ticker.clone(), month, option_type));
        if state.failing {
            return Err(SourceError::unavailable("mock source is offline"));
        }

        if let Some(chain) = state.chains.get(&(ticker.clone(), option_type)) {
            return Ok(OptionChain {
                month,
                ..chain.clone()
            });
        }

        match state.synthetic_from {
            Some(today) => Ok(synthetic_chain(ticker, month, option_type, month.days_from(today))),
            None => Ok(OptionChain {
                ticker: ticker.clone(),
                month,
                option_type,
                underlying_price: 0.0,
                contracts: Vec::new(),
            }),
        }
    }
}

impl ChainSource for MockChainSource {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn contract_months<'a>(&'a self, ticker: &'a Ticker) -> SourceFuture<'a, Vec<MonthCode>> {
        let outcome = self.months_for(ticker);
        Box::pin(async move { outcome })
    }

    fn option_chain<'a>(
        &'a self,
        ticker: &'a Ticker,
        month: MonthCode,
        option_type: OptionType,
    ) -> SourceFuture<'a, OptionChain> {
        let outcome = self.chain_for(ticker, month, option_type);
        Box::pin(async move { outcome })
    }

    fn daily_watchlist<'a>(&'a self) -> SourceFuture<'a, Vec<Ticker>> {
        let outcome = {
            let mut state = self.lock();
            state.calls.daily_watchlist += 1;
            if state.failing {
                Err(SourceError::unavailable("mock source is offline"))
            } else {
                Ok(state.watchlist.clone())
            }
        };
        Box::pin(async move { outcome })
    }
}

/// Third Friday of each of the next `count` months with an expiration after `today`.
pub fn third_fridays(today: Date, count: usize) -> Vec<MonthCode> {
    let mut months = Vec::with_capacity(count);
    let (mut year, mut month) = (today.year(), today.month());
    while months.len() < count {
        if let Some(expiry) = third_friday(year, month).filter(|expiry| *expiry > today) {
            months.push(MonthCode::new(expiry));
        }
        if month == Month::December {
            year += 1;
        }
        month = month.next();
    }
    months
}

fn third_friday(year: i32, month: Month) -> Option<Date> {
    let first = Date::from_calendar_date(year, month, 1).ok()?;
    let offset = (7 + i64::from(Weekday::Friday.number_days_from_monday())
        - i64::from(first.weekday().number_days_from_monday()))
        % 7;
    Some(first + Duration::days(offset + 14))
}

fn synthetic_chain(ticker: &Ticker, month: MonthCode, option_type: OptionType, days: i64) -> OptionChain {
    let seed = ticker
        .as_str()
        .bytes()
        .fold(17u64, |acc, byte| acc.wrapping_mul(31).wrapping_add(u64::from(byte)));
    let underlying_price = 25.0 + (seed % 400) as f64 + (seed % 100) as f64 / 100.0;
    let implied_volatility = 0.20 + (seed % 30) as f64 / 100.0;
    let step = if underlying_price < 100.0 { 1.0 } else { 5.0 };
    let horizon = (days.max(1) as f64 / 365.0).sqrt();
    let atm = (underlying_price / step).round() * step;

    let contracts = (-8..=8)
        .map(|offset| {
            let strike = atm + f64::from(offset) * step;
            let distance = (strike / underlying_price).ln().abs();
            let intrinsic = match option_type {
                OptionType::Put => (strike - underlying_price).max(0.0),
                OptionType::Call => (underlying_price - strike).max(0.0),
            };
            let time_value = underlying_price
                * implied_volatility
                * horizon
                * 0.4
                * (-distance / (implied_volatility * horizon)).exp();
            let mid = ((intrinsic + time_value) * 100.0).round() / 100.0;
            OptionQuote {
                strike,
                bid: (mid - 0.02).max(0.0),
                ask: mid + 0.02,
                last: mid,
                implied_volatility,
                volume: Some(100 + seed % 900),
                open_interest: Some(1_000 + seed % 9_000),
            }
        })
        .filter(|quote| quote.strike > 0.0)
        .collect();

    OptionChain {
        ticker: ticker.clone(),
        month,
        option_type,
        underlying_price,
        contracts,
    }
}

/// Fixed ex-dividend calendar.
#[derive(Debug, Default)]
pub struct MockDividendSource {
    dividends: Vec<Dividend>,
    failing: bool,
}

impl MockDividendSource {
    pub fn new(dividends: Vec<Dividend>) -> Self {
        Self {
            dividends,
            failing: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            dividends: Vec::new(),
            failing: true,
        }
    }

    /// A small calendar for `--mock` runs.
    pub fn sample() -> Self {
        let entries = [
            ("KO", "Coca-Cola Company (The)", 0.51, 2.04, 0.0301),
            ("PEP", "PepsiCo, Inc.", 1.4225, 5.69, 0.0379),
            ("O", "Realty Income Corporation", 0.2685, 3.222, 0.0565),
            ("T", "AT&T Inc.", 0.2775, 1.11, 0.0411),
        ];
        Self::new(
            entries
                .into_iter()
                .filter_map(|(symbol, company, rate, annual_rate, dividend_yield)| {
                    Some(Dividend {
                        ticker: Ticker::parse(symbol).ok()?,
                        company: company.to_owned(),
                        ex_date: String::new(),
                        rate,
                        annual_rate,
                        dividend_yield: Some(dividend_yield),
                    })
                })
                .collect(),
        )
    }
}

impl DividendSource for MockDividendSource {
    fn upcoming_dividends<'a>(&'a self, today: Date) -> SourceFuture<'a, Vec<Dividend>> {
        Box::pin(async move {
            if self.failing {
                return Err(SourceError::unavailable("mock dividend calendar is offline"));
            }
            let ex_date = super::nasdaq::next_trading_day(today);
            let label = format!("{:02}/{:02}/{}", u8::from(ex_date.month()), ex_date.day(), ex_date.year());
            Ok(self
                .dividends
                .iter()
                .cloned()
                .map(|dividend| Dividend {
                    ex_date: if dividend.ex_date.is_empty() {
                        label.clone()
                    } else {
                        dividend.ex_date
                    },
                    ..dividend
                })
                .collect())
        })
    }
}
