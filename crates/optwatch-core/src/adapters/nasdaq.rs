use std::sync::Arc;

use serde::Deserialize;
use time::macros::format_description;
use time::{Date, Duration, Weekday};
use tracing::debug;

use crate::http_client::{HttpClient, HttpRequest, ReqwestHttpClient, DEFAULT_TIMEOUT_MS};
use crate::retry::{execute_with_retry, RetryConfig};
use crate::source::{DividendSource, SourceError, SourceFuture};
use crate::{Dividend, Ticker};

const CALENDAR_ENDPOINT: &str = "https://api.nasdaq.com/api/calendar/dividends";
// The calendar API refuses requests without a browser-like user agent.
const BROWSER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko)";

/// Dividend calendar from the Nasdaq public API.
pub struct NasdaqDividendSource {
    http_client: Arc<dyn HttpClient>,
    retry: RetryConfig,
    timeout_ms: u64,
}

impl NasdaqDividendSource {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            retry: RetryConfig::default(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    pub fn with_reqwest() -> Self {
        Self::new(Arc::new(ReqwestHttpClient::new()))
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }
}

impl DividendSource for NasdaqDividendSource {
    fn upcoming_dividends<'a>(&'a self, today: Date) -> SourceFuture<'a, Vec<Dividend>> {
        Box::pin(async move {
            let day = next_trading_day(today);
            let date = day
                .format(format_description!("[year]-[month]-[day]"))
                .map_err(|error| SourceError::internal(error.to_string()))?;

            let request = HttpRequest::get(format!("{CALENDAR_ENDPOINT}?date={date}"))
                .with_header("user-agent", BROWSER_AGENT)
                .with_header("accept", "application/json")
                .with_timeout_ms(self.timeout_ms);
            let response = execute_with_retry(self.http_client.as_ref(), request, &self.retry)
                .await
                .map_err(|error| SourceError::unavailable(format!("nasdaq transport error: {error}")))?;

            match response.status {
                429 => Err(SourceError::rate_limited("nasdaq rate limit exceeded")),
                status if !(200..300).contains(&status) => Err(SourceError::unavailable(format!(
                    "nasdaq returned status {status}"
                ))),
                _ => {
                    let dividends = parse_calendar(&response.body)?;
                    debug!(%date, count = dividends.len(), "fetched dividend calendar");
                    Ok(dividends)
                }
            }
        })
    }
}

/// First weekday strictly after `today`.
pub fn next_trading_day(today: Date) -> Date {
    let mut day = today + Duration::days(1);
    while matches!(day.weekday(), Weekday::Saturday | Weekday::Sunday) {
        day += Duration::days(1);
    }
    day
}

#[derive(Debug, Deserialize)]
struct CalendarEnvelope {
    #[serde(default)]
    data: Option<CalendarData>,
}

#[derive(Debug, Deserialize)]
struct CalendarData {
    #[serde(default)]
    calendar: Option<CalendarBody>,
}

#[derive(Debug, Deserialize)]
struct CalendarBody {
    #[serde(default)]
    rows: Option<Vec<CalendarRow>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CalendarRow {
    symbol: String,
    #[serde(default)]
    company_name: String,
    #[serde(rename = "dividend_Ex_Date", default)]
    ex_date: String,
    #[serde(rename = "dividend_Rate", default)]
    rate: serde_json::Value,
    #[serde(rename = "indicated_Annual_Dividend", default)]
    annual_rate: serde_json::Value,
}

/// Amount fields arrive as numbers or as strings like `"$0.26"`.
fn amount(value: &serde_json::Value) -> f64 {
    match value {
        serde_json::Value::Number(number) => number.as_f64().unwrap_or_default(),
        serde_json::Value::String(text) => text
            .trim()
            .trim_start_matches('$')
            .replace(',', "")
            .parse()
            .unwrap_or_default(),
        _ => 0.0,
    }
}

pub(crate) fn parse_calendar(body: &str) -> Result<Vec<Dividend>, SourceError> {
    let envelope: CalendarEnvelope = serde_json::from_str(body)
        .map_err(|error| SourceError::malformed(format!("failed to parse nasdaq calendar: {error}")))?;
    let rows = envelope
        .data
        .and_then(|data| data.calendar)
        .and_then(|calendar| calendar.rows)
        .unwrap_or_default();

    Ok(rows
        .into_iter()
        .filter_map(|row| {
            let ticker = Ticker::parse(&row.symbol).ok()?;
            Some(Dividend {
                ticker,
                company: row.company_name.trim().to_owned(),
                ex_date: row.ex_date,
                rate: amount(&row.rate),
                annual_rate: amount(&row.annual_rate),
                dividend_yield: None,
            })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::*;
    use crate::http_client::{CannedHttpClient, HttpResponse};

    const BODY: &str = r#"{
        "data": {"calendar": {"rows": [
            {"companyName": "Coca-Cola Company (The)", "symbol": "KO", "dividend_Ex_Date": "10/15/2026", "dividend_Rate": 0.51, "indicated_Annual_Dividend": 2.04},
            {"companyName": "Realty Income", "symbol": "O", "dividend_Ex_Date": "10/15/2026", "dividend_Rate": "$0.2685", "indicated_Annual_Dividend": "3.222"}
        ]}}
    }"#;

    #[test]
    fn weekends_are_skipped() {
        assert_eq!(next_trading_day(date!(2026 - 10 - 14)), date!(2026 - 10 - 15));
        assert_eq!(next_trading_day(date!(2026 - 10 - 16)), date!(2026 - 10 - 19));
    }

    #[test]
    fn numeric_and_string_amounts_parse() {
        let dividends = parse_calendar(BODY).expect("calendar");
        assert_eq!(dividends.len(), 2);
        assert_eq!(dividends[0].ticker.as_str(), "KO");
        assert_eq!(dividends[1].rate, 0.2685);
        assert_eq!(dividends[1].annual_rate, 3.222);
        assert!(dividends.iter().all(|dividend| dividend.dividend_yield.is_none()));
    }

    #[test]
    fn holiday_calendar_has_no_rows() {
        let body = r#"{"data":{"calendar":{"rows":null}}}"#;
        assert!(parse_calendar(body).expect("calendar").is_empty());
    }

    #[tokio::test]
    async fn requests_the_next_trading_day() {
        let client = Arc::new(CannedHttpClient::new());
        client.push(Ok(HttpResponse::ok_json(BODY)));

        let source = NasdaqDividendSource::new(client.clone()).with_retry(RetryConfig::no_retry());
        let dividends = source
            .upcoming_dividends(date!(2026 - 10 - 16))
            .await
            .expect("dividends");
        assert_eq!(dividends.len(), 2);
        assert!(client.requests()[0].url.ends_with("?date=2026-10-19"));
    }
}
