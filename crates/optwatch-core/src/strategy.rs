//! Option filtering and vertical credit-spread construction.
//!
//! Probabilities come from a driftless lognormal model of the underlying
//! using each contract's implied volatility.

use statrs::distribution::{ContinuousCDF, Normal};

use crate::{CreditSpread, FilteredOption, OptionChain, OptionQuote, OptionType};

const DAYS_PER_YEAR: f64 = 365.0;

/// Selects single options worth selling from a raw chain.
pub trait OptionFilter: Send + Sync {
    fn filter(&self, chain: &OptionChain, days_to_expiry: i64) -> Vec<FilteredOption>;
}

/// Builds credit spreads from a raw chain.
pub trait SpreadBuilder: Send + Sync {
    fn credit_spreads(
        &self,
        chain: &OptionChain,
        days_to_expiry: i64,
        aggressive: bool,
    ) -> Vec<CreditSpread>;
}

/// Probability that a contract at `strike` expires out of the money.
pub fn probability_otm(
    option_type: OptionType,
    strike: f64,
    underlying: f64,
    implied_volatility: f64,
    days_to_expiry: i64,
) -> f64 {
    let time = days_to_expiry as f64 / DAYS_PER_YEAR;
    if implied_volatility <= 0.0 || time <= 0.0 || strike <= 0.0 || underlying <= 0.0 {
        return if option_type.is_out_of_the_money(strike, underlying) {
            1.0
        } else {
            0.0
        };
    }

    let spread = implied_volatility * time.sqrt();
    let d2 = ((underlying / strike).ln() - 0.5 * implied_volatility * implied_volatility * time) / spread;
    let normal = Normal::standard();
    match option_type {
        OptionType::Put => normal.cdf(d2),
        OptionType::Call => normal.cdf(-d2),
    }
}

/// Distance from the underlying to `strike` in the out-of-the-money direction.
pub fn percent_out(option_type: OptionType, strike: f64, underlying: f64) -> f64 {
    if underlying <= 0.0 {
        return 0.0;
    }
    match option_type {
        OptionType::Put => (underlying - strike) / underlying,
        OptionType::Call => (strike - underlying) / underlying,
    }
}

/// Keeps bid-quoted contracts with enough yield and a high chance of expiring worthless.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PremiumFilter {
    pub min_yield: f64,
    pub min_probability: f64,
}

impl Default for PremiumFilter {
    fn default() -> Self {
        Self {
            min_yield: 0.005,
            min_probability: 0.70,
        }
    }
}

impl PremiumFilter {
    fn evaluate(&self, chain: &OptionChain, quote: &OptionQuote, days: i64) -> Option<FilteredOption> {
        if quote.bid <= 0.0 || quote.strike <= 0.0 {
            return None;
        }
        let underlying = chain.underlying_price;
        let premium = quote.premium();
        let (premium_yield, if_assigned) = match chain.option_type {
            OptionType::Put => (premium / quote.strike, quote.strike - premium),
            OptionType::Call if underlying > 0.0 => (
                premium / underlying,
                (quote.strike - underlying + premium) / underlying,
            ),
            OptionType::Call => return None,
        };
        let probability = probability_otm(
            chain.option_type,
            quote.strike,
            underlying,
            quote.implied_volatility,
            days,
        );

        if premium_yield < self.min_yield || probability < self.min_probability {
            return None;
        }

        Some(FilteredOption {
            strike: quote.strike,
            premium,
            implied_volatility: quote.implied_volatility,
            premium_yield,
            probability_otm: probability,
            percent_out: percent_out(chain.option_type, quote.strike, underlying),
            if_assigned,
            in_the_money: !chain.option_type.is_out_of_the_money(quote.strike, underlying),
        })
    }
}

impl OptionFilter for PremiumFilter {
    fn filter(&self, chain: &OptionChain, days_to_expiry: i64) -> Vec<FilteredOption> {
        chain
            .contracts
            .iter()
            .filter_map(|quote| self.evaluate(chain, quote, days_to_expiry))
            .collect()
    }
}

/// Pairs neighbouring out-of-the-money strikes into short/long verticals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VerticalSpreadBuilder {
    pub min_probability: f64,
    pub min_return_on_risk: f64,
}

impl Default for VerticalSpreadBuilder {
    fn default() -> Self {
        Self {
            min_probability: 0.70,
            min_return_on_risk: 0.10,
        }
    }
}

impl SpreadBuilder for VerticalSpreadBuilder {
    fn credit_spreads(
        &self,
        chain: &OptionChain,
        days_to_expiry: i64,
        aggressive: bool,
    ) -> Vec<CreditSpread> {
        let underlying = chain.underlying_price;
        let mut legs: Vec<&OptionQuote> = chain
            .contracts
            .iter()
            .filter(|quote| chain.option_type.is_out_of_the_money(quote.strike, underlying))
            .collect();

        // Nearest strike to the money first, so each window is (short, long).
        match chain.option_type {
            OptionType::Put => legs.sort_by(|a, b| b.strike.total_cmp(&a.strike)),
            OptionType::Call => legs.sort_by(|a, b| a.strike.total_cmp(&b.strike)),
        }

        legs.windows(2)
            .filter_map(|pair| {
                let (short, long) = (pair[0], pair[1]);
                let width = (short.strike - long.strike).abs();
                let credit = short.premium() - long.premium();
                if width <= 0.0 || credit <= 0.0 || credit >= width {
                    return None;
                }

                let spread = CreditSpread {
                    option_type: chain.option_type,
                    short_strike: short.strike,
                    long_strike: long.strike,
                    width,
                    credit,
                    return_on_risk: credit / (width - credit),
                    probability_otm: probability_otm(
                        chain.option_type,
                        short.strike,
                        underlying,
                        short.implied_volatility,
                        days_to_expiry,
                    ),
                    percent_out: percent_out(chain.option_type, short.strike, underlying),
                };

                let keep = !aggressive
                    || (spread.probability_otm >= self.min_probability
                        && spread.return_on_risk >= self.min_return_on_risk);
                keep.then_some(spread)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::*;
    use crate::{MonthCode, Ticker};

    fn quote(strike: f64, bid: f64, ask: f64, iv: f64) -> OptionQuote {
        OptionQuote {
            strike,
            bid,
            ask,
            last: bid,
            implied_volatility: iv,
            volume: None,
            open_interest: None,
        }
    }

    fn chain(option_type: OptionType, contracts: Vec<OptionQuote>) -> OptionChain {
        OptionChain {
            ticker: Ticker::parse("TEST").expect("ticker"),
            month: MonthCode::new(date!(2026 - 11 - 20)),
            option_type,
            underlying_price: 100.0,
            contracts,
        }
    }

    #[test]
    fn deep_otm_put_has_high_probability() {
        let probability = probability_otm(OptionType::Put, 80.0, 100.0, 0.3, 30);
        assert!(probability > 0.95, "probability was {probability}");
        let near = probability_otm(OptionType::Put, 99.0, 100.0, 0.3, 30);
        assert!(near < probability);
    }

    #[test]
    fn zero_volatility_falls_back_to_moneyness() {
        assert_eq!(probability_otm(OptionType::Call, 110.0, 100.0, 0.0, 30), 1.0);
        assert_eq!(probability_otm(OptionType::Call, 90.0, 100.0, 0.0, 30), 0.0);
    }

    #[test]
    fn filter_drops_unbid_and_low_probability_contracts() {
        let chain = chain(
            OptionType::Put,
            vec![
                quote(90.0, 0.80, 0.90, 0.30),
                quote(85.0, 0.0, 0.10, 0.30),
                quote(99.0, 2.50, 2.70, 0.30),
            ],
        );
        let kept = PremiumFilter::default().filter(&chain, 30);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].strike, 90.0);
        assert!((kept[0].premium - 0.85).abs() < 1e-9);
        assert!(!kept[0].in_the_money);
    }

    #[test]
    fn put_spreads_pair_adjacent_otm_strikes() {
        let chain = chain(
            OptionType::Put,
            vec![
                quote(85.0, 0.20, 0.30, 0.35),
                quote(90.0, 0.70, 0.80, 0.35),
                quote(95.0, 1.80, 1.90, 0.35),
                quote(105.0, 6.00, 6.20, 0.35),
            ],
        );
        let spreads = VerticalSpreadBuilder::default().credit_spreads(&chain, 30, false);
        let strikes: Vec<(f64, f64)> = spreads
            .iter()
            .map(|spread| (spread.short_strike, spread.long_strike))
            .collect();
        assert_eq!(strikes, vec![(95.0, 90.0), (90.0, 85.0)]);
        assert!(spreads.iter().all(|spread| spread.credit > 0.0));
    }

    #[test]
    fn aggressive_mode_is_a_subset() {
        let chain = chain(
            OptionType::Call,
            vec![
                quote(102.0, 2.00, 2.10, 0.30),
                quote(105.0, 1.00, 1.10, 0.30),
                quote(120.0, 0.05, 0.10, 0.30),
                quote(125.0, 0.01, 0.05, 0.30),
            ],
        );
        let builder = VerticalSpreadBuilder::default();
        let all = builder.credit_spreads(&chain, 30, false);
        let strict = builder.credit_spreads(&chain, 30, true);
        assert!(strict.len() <= all.len());
        assert!(strict
            .iter()
            .all(|spread| spread.probability_otm >= 0.7 && spread.return_on_risk >= 0.1));
    }
}
