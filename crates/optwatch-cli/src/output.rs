//! Plain-text rendering of command results.

use std::io::{self, Write};

use optwatch_core::{
    ChainReport, CreditSpread, Dividend, FilteredOption, MonthCode, Notice, OptionType, Settings,
    Ticker,
};

pub fn notice(out: &mut dyn Write, notice: &Notice) -> io::Result<()> {
    match notice {
        Notice::InvalidTicker(ticker) => invalid_ticker(out, ticker.as_str()),
        Notice::RejectedToken { token, reason } => {
            invalid_ticker(out, &token.trim_start_matches('$').to_ascii_uppercase())?;
            writeln!(out, "({reason})")
        }
        other => writeln!(out, "{other}"),
    }
}

pub fn notices(out: &mut dyn Write, notices: &[Notice]) -> io::Result<()> {
    notices.iter().try_for_each(|item| notice(out, item))
}

/// Dashed box around the invalid-ticker message.
pub fn invalid_ticker(out: &mut dyn Write, ticker: &str) -> io::Result<()> {
    let message = format!("| {ticker} is not a valid stock ticker |");
    let rule = format!(" {}", "-".repeat(message.chars().count().saturating_sub(2)));
    writeln!(out, "{rule}")?;
    writeln!(out, "{message}")?;
    writeln!(out, "{rule} ")?;
    writeln!(out)
}

pub fn chain_report(out: &mut dyn Write, report: &ChainReport, verbose: bool) -> io::Result<()> {
    write!(
        out,
        "{} {} {} @ {:.2}",
        report.ticker,
        report.month,
        report.option_type.title(),
        report.underlying_price
    )?;
    if verbose {
        write!(out, " [{} contracts]", report.contract_count)?;
    }
    writeln!(out)?;
    writeln!(out)?;

    let title = report.option_type.title();
    if let Some(options) = &report.options {
        if options.is_empty() {
            writeln!(out, "No {title} options")?;
        } else {
            writeln!(out, "--{title} options--")?;
            for option in options {
                writeln!(out, "{}", option_line(report.option_type, option))?;
            }
        }
        writeln!(out)?;
    }

    if let Some(spreads) = &report.spreads {
        if spreads.is_empty() {
            writeln!(out, "No {title} spreads")?;
        } else {
            writeln!(out, "--{title} spreads--")?;
            for spread in spreads {
                writeln!(out, "{}", spread_line(spread))?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

/// `STRIKE type: PREMIUM/YIELD% \t(PROB%; OUT% out) EXTRA`, prefixed `-` when in the money.
pub fn option_line(option_type: OptionType, option: &FilteredOption) -> String {
    let extra = match option_type {
        OptionType::Put => format!("{:.2} if put", option.if_assigned),
        OptionType::Call => format!("{:.1}% if called", option.if_assigned * 100.0),
    };
    format!(
        "{}{:.2} {}: {:.2}/{:.1}% \t({:.0}%; {:.1}% out) {extra}",
        if option.in_the_money { "-" } else { "" },
        option.strike,
        option_type,
        option.premium,
        option.premium_yield * 100.0,
        option.probability_otm * 100.0,
        option.percent_out * 100.0,
    )
}

/// `SHORT/LONG type: $CREDIT/YIELD% \t(PROB%; OUT% out)`.
pub fn spread_line(spread: &CreditSpread) -> String {
    format!(
        "{:.2}/{:.2} {}: ${:.2}/{:.1}% \t({:.0}%; {:.1}% out)",
        spread.short_strike,
        spread.long_strike,
        spread.option_type,
        spread.credit,
        spread.return_on_risk * 100.0,
        spread.probability_otm * 100.0,
        spread.percent_out * 100.0,
    )
}

/// `COMPANY (TICKER): EX_DATE RATE/ANNUAL (YIELD%)`; the yield is left out when unknown.
pub fn dividends(out: &mut dyn Write, dividends: &[Dividend]) -> io::Result<()> {
    for dividend in dividends {
        write!(
            out,
            "{} ({}): {} {:.2}/{:.2}",
            dividend.company, dividend.ticker, dividend.ex_date, dividend.rate, dividend.annual_rate
        )?;
        if let Some(dividend_yield) = dividend.dividend_yield {
            write!(out, " ({:.2}%)", dividend_yield * 100.0)?;
        }
        writeln!(out)?;
    }
    writeln!(out)
}

pub fn front_month(out: &mut dyn Write, ticker: &Ticker, month: Option<MonthCode>) -> io::Result<()> {
    match month {
        Some(month) => writeln!(out, "{ticker}: {month}"),
        None => writeln!(out, "{ticker}: needs refresh"),
    }
}

pub fn settings(out: &mut dyn Write, settings: &Settings) -> io::Result<()> {
    for (key, value) in settings.iter() {
        writeln!(out, "{key}: {value}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_ticker_box_matches_message_width() {
        let mut out = Vec::new();
        invalid_ticker(&mut out, "ZZZZ").expect("write");
        let text = String::from_utf8(out).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[1], "| ZZZZ is not a valid stock ticker |");
        assert_eq!(lines[0].len(), lines[1].len() - 1);
        assert!(lines[0].starts_with(" --"));
    }

    #[test]
    fn in_the_money_put_is_marked() {
        let option = FilteredOption {
            strike: 105.0,
            premium: 6.1,
            implied_volatility: 0.3,
            premium_yield: 0.0581,
            probability_otm: 0.31,
            percent_out: -0.05,
            if_assigned: 98.9,
            in_the_money: true,
        };
        assert_eq!(
            option_line(OptionType::Put, &option),
            "-105.00 put: 6.10/5.8% \t(31%; -5.0% out) 98.90 if put"
        );
    }

    #[test]
    fn spread_line_shows_credit_and_yield() {
        let spread = CreditSpread {
            option_type: OptionType::Call,
            short_strike: 110.0,
            long_strike: 115.0,
            width: 5.0,
            credit: 0.75,
            return_on_risk: 0.1764,
            probability_otm: 0.82,
            percent_out: 0.1,
        };
        assert_eq!(
            spread_line(&spread),
            "110.00/115.00 call: $0.75/17.6% \t(82%; 10.0% out)"
        );
    }

    #[test]
    fn dividend_yield_is_printed_when_known() {
        let known = Dividend {
            ticker: Ticker::parse("PEP").expect("ticker"),
            company: String::from("PepsiCo, Inc."),
            ex_date: String::from("10/15/2026"),
            rate: 1.42,
            annual_rate: 5.69,
            dividend_yield: Some(0.0379),
        };
        let unknown = Dividend {
            ticker: Ticker::parse("O").expect("ticker"),
            company: String::from("Realty Income"),
            dividend_yield: None,
            ..known.clone()
        };
        let mut out = Vec::new();
        dividends(&mut out, &[known, unknown]).expect("write");
        assert_eq!(
            String::from_utf8(out).expect("utf8"),
            "PepsiCo, Inc. (PEP): 10/15/2026 1.42/5.69 (3.79%)\nRealty Income (O): 10/15/2026 1.42/5.69\n\n"
        );
    }

    #[test]
    fn unrequested_sections_are_not_printed() {
        let report = ChainReport {
            ticker: Ticker::parse("AAPL").expect("ticker"),
            month: MonthCode::parse("20261120").expect("month"),
            option_type: OptionType::Put,
            underlying_price: 231.5,
            contract_count: 40,
            options: None,
            spreads: Some(Vec::new()),
            calendar: false,
        };
        let mut out = Vec::new();
        chain_report(&mut out, &report, false).expect("write");
        let text = String::from_utf8(out).expect("utf8");
        assert!(text.starts_with("AAPL 20261120 Put @ 231.50\n"));
        assert!(text.contains("No Put spreads"));
        assert!(!text.contains("options"));
    }
}
