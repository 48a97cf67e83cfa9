use std::sync::{Arc, Mutex};

use serde::Deserialize;
use tracing::debug;

use crate::http_client::{HttpClient, HttpRequest, HttpResponse, ReqwestHttpClient, DEFAULT_TIMEOUT_MS};
use crate::retry::{execute_with_retry, RetryConfig};
use crate::source::{ChainSource, SourceError, SourceFuture};
use crate::{MonthCode, OptionChain, OptionQuote, OptionType, Ticker};

const OPTIONS_ENDPOINT: &str = "https://query2.finance.yahoo.com/v7/finance/options";
const SCREENER_ENDPOINT: &str =
    "https://query1.finance.yahoo.com/v1/finance/screener/predefined/saved";
const CRUMB_ENDPOINT: &str = "https://query2.finance.yahoo.com/v1/test/getcrumb";
const REFERER: &str = "https://finance.yahoo.com/";

/// Chain source backed by Yahoo Finance's unofficial options API.
///
/// The `SLOGIN` setting is forwarded as the session cookie. A crumb is
/// fetched lazily with that cookie and dropped whenever Yahoo answers 401.
pub struct YahooChainSource {
    http_client: Arc<dyn HttpClient>,
    retry: RetryConfig,
    timeout_ms: u64,
    cookie: Option<String>,
    crumb: Mutex<Option<String>>,
    watchlist_size: usize,
}

impl YahooChainSource {
    pub fn new(http_client: Arc<dyn HttpClient>, cookie: Option<String>) -> Self {
        Self {
            http_client,
            retry: RetryConfig::default(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            cookie: cookie.filter(|cookie| !cookie.is_empty()),
            crumb: Mutex::new(None),
            watchlist_size: 25,
        }
    }

    pub fn with_reqwest(cookie: Option<String>) -> Self {
        Self::new(Arc::new(ReqwestHttpClient::new()), cookie)
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_watchlist_size(mut self, watchlist_size: usize) -> Self {
        self.watchlist_size = watchlist_size;
        self
    }

    fn request(&self, url: String) -> HttpRequest {
        HttpRequest::get(url)
            .with_header("referer", REFERER)
            .with_cookie(self.cookie.as_deref())
            .with_timeout_ms(self.timeout_ms)
    }

    fn cached_crumb(&self) -> Option<String> {
        self.crumb.lock().ok().and_then(|crumb| crumb.clone())
    }

    fn store_crumb(&self, value: Option<String>) {
        if let Ok(mut crumb) = self.crumb.lock() {
            *crumb = value;
        }
    }

    /// Crumb for query strings. Without a session cookie none is requested.
    async fn crumb(&self) -> Option<String> {
        self.cookie.as_ref()?;
        if let Some(crumb) = self.cached_crumb() {
            return Some(crumb);
        }

        let response = execute_with_retry(
            self.http_client.as_ref(),
            self.request(String::from(CRUMB_ENDPOINT)),
            &self.retry,
        )
        .await
        .ok()?;
        let crumb = parse_crumb(&response)?;
        debug!("obtained yahoo crumb");
        self.store_crumb(Some(crumb.clone()));
        Some(crumb)
    }

    async fn get_json(&self, base_url: String, ticker: Option<&Ticker>) -> Result<String, SourceError> {
        let mut url = base_url;
        if let Some(crumb) = self.crumb().await {
            let separator = if url.contains('?') { '&' } else { '?' };
            url = format!("{url}{separator}crumb={}", urlencoding::encode(&crumb));
        }

        let response = execute_with_retry(self.http_client.as_ref(), self.request(url), &self.retry)
            .await
            .map_err(|error| SourceError::unavailable(format!("yahoo transport error: {error}")))?;

        match response.status {
            status if (200..300).contains(&status) => Ok(response.body),
            401 => {
                self.store_crumb(None);
                Err(SourceError::unavailable(
                    "yahoo rejected the session; check SLOGIN",
                ))
            }
            404 => match ticker {
                Some(ticker) => Err(SourceError::invalid_ticker(ticker, "unknown to yahoo")),
                None => Err(SourceError::unavailable("yahoo endpoint not found")),
            },
            429 => Err(SourceError::rate_limited("yahoo rate limit exceeded")),
            status => Err(SourceError::unavailable(format!(
                "yahoo returned status {status}"
            ))),
        }
    }
}

impl ChainSource for YahooChainSource {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    fn contract_months<'a>(&'a self, ticker: &'a Ticker) -> SourceFuture<'a, Vec<MonthCode>> {
        Box::pin(async move {
            let url = format!("{OPTIONS_ENDPOINT}/{}", urlencoding::encode(ticker.as_str()));
            let body = self.get_json(url, Some(ticker)).await?;
            parse_expirations(ticker, &body)
        })
    }

    fn option_chain<'a>(
        &'a self,
        ticker: &'a Ticker,
        month: MonthCode,
        option_type: OptionType,
    ) -> SourceFuture<'a, OptionChain> {
        Box::pin(async move {
            let url = format!(
                "{OPTIONS_ENDPOINT}/{}?date={}",
                urlencoding::encode(ticker.as_str()),
                month.unix_timestamp()
            );
            let body = self.get_json(url, Some(ticker)).await?;
            parse_chain(ticker, month, option_type, &body)
        })
    }

    fn daily_watchlist<'a>(&'a self) -> SourceFuture<'a, Vec<Ticker>> {
        Box::pin(async move {
            let url = format!(
                "{SCREENER_ENDPOINT}?scrIds=most_actives&count={}",
                self.watchlist_size
            );
            let body = self.get_json(url, None).await?;
            parse_screener(&body)
        })
    }
}

fn parse_crumb(response: &HttpResponse) -> Option<String> {
    let body = response.body.trim();
    let plausible = response.is_success()
        && !body.is_empty()
        && body.len() < 100
        && !body.contains(char::is_whitespace)
        && !body.contains('<');
    plausible.then(|| body.to_owned())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OptionsEnvelope {
    option_chain: OptionsBody,
}

#[derive(Debug, Deserialize)]
struct OptionsBody {
    #[serde(default)]
    result: Vec<OptionsResult>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OptionsResult {
    #[serde(default)]
    expiration_dates: Vec<i64>,
    #[serde(default)]
    quote: Option<UnderlyingQuote>,
    #[serde(default)]
    options: Vec<OptionsBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UnderlyingQuote {
    #[serde(default)]
    regular_market_price: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OptionsBlock {
    #[serde(default)]
    calls: Vec<YahooContract>,
    #[serde(default)]
    puts: Vec<YahooContract>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YahooContract {
    strike: f64,
    #[serde(default)]
    bid: Option<f64>,
    #[serde(default)]
    ask: Option<f64>,
    #[serde(default)]
    last_price: Option<f64>,
    #[serde(default)]
    implied_volatility: Option<f64>,
    #[serde(default)]
    volume: Option<u64>,
    #[serde(default)]
    open_interest: Option<u64>,
}

impl From<YahooContract> for OptionQuote {
    fn from(contract: YahooContract) -> Self {
        Self {
            strike: contract.strike,
            bid: contract.bid.unwrap_or_default(),
            ask: contract.ask.unwrap_or_default(),
            last: contract.last_price.unwrap_or_default(),
            implied_volatility: contract.implied_volatility.unwrap_or_default(),
            volume: contract.volume,
            open_interest: contract.open_interest,
        }
    }
}

fn first_result(ticker: &Ticker, body: &str) -> Result<OptionsResult, SourceError> {
    let envelope: OptionsEnvelope = serde_json::from_str(body)
        .map_err(|error| SourceError::malformed(format!("failed to parse yahoo options: {error}")))?;
    if let Some(error) = envelope.option_chain.error.filter(|error| !error.is_null()) {
        return Err(SourceError::invalid_ticker(ticker, format!("yahoo error: {error}")));
    }
    envelope
        .option_chain
        .result
        .into_iter()
        .next()
        .ok_or_else(|| SourceError::invalid_ticker(ticker, "no option data"))
}

pub(crate) fn parse_expirations(ticker: &Ticker, body: &str) -> Result<Vec<MonthCode>, SourceError> {
    let result = first_result(ticker, body)?;
    let mut months = result
        .expiration_dates
        .into_iter()
        .map(MonthCode::from_unix_timestamp)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|error| SourceError::malformed(error.to_string()))?;
    months.sort_unstable();
    months.dedup();
    Ok(months)
}

pub(crate) fn parse_chain(
    ticker: &Ticker,
    month: MonthCode,
    option_type: OptionType,
    body: &str,
) -> Result<OptionChain, SourceError> {
    let result = first_result(ticker, body)?;
    let underlying_price = result
        .quote
        .and_then(|quote| quote.regular_market_price)
        .ok_or_else(|| SourceError::malformed(format!("{ticker}: missing underlying price")))?;

    let contracts = result
        .options
        .into_iter()
        .next()
        .map(|block| match option_type {
            OptionType::Put => block.puts,
            OptionType::Call => block.calls,
        })
        .unwrap_or_default()
        .into_iter()
        .map(OptionQuote::from)
        .collect();

    Ok(OptionChain {
        ticker: ticker.clone(),
        month,
        option_type,
        underlying_price,
        contracts,
    })
}

#[derive(Debug, Deserialize)]
struct ScreenerEnvelope {
    finance: ScreenerBody,
}

#[derive(Debug, Deserialize)]
struct ScreenerBody {
    #[serde(default)]
    result: Vec<ScreenerResult>,
}

#[derive(Debug, Deserialize)]
struct ScreenerResult {
    #[serde(default)]
    quotes: Vec<ScreenerQuote>,
}

#[derive(Debug, Deserialize)]
struct ScreenerQuote {
    symbol: String,
}

pub(crate) fn parse_screener(body: &str) -> Result<Vec<Ticker>, SourceError> {
    let envelope: ScreenerEnvelope = serde_json::from_str(body)
        .map_err(|error| SourceError::malformed(format!("failed to parse yahoo screener: {error}")))?;
    Ok(envelope
        .finance
        .result
        .into_iter()
        .flat_map(|result| result.quotes)
        .filter_map(|quote| Ticker::parse(&quote.symbol).ok())
        .collect())
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::*;
    use crate::http_client::CannedHttpClient;
    use crate::source::SourceErrorKind;

    const CHAIN_BODY: &str = r#"{
        "optionChain": {
            "result": [{
                "underlyingSymbol": "AAPL",
                "expirationDates": [1795132800, 1792713600, 1795132800],
                "quote": {"regularMarketPrice": 231.5},
                "options": [{
                    "expirationDate": 1792713600,
                    "calls": [
                        {"strike": 240.0, "bid": 1.2, "ask": 1.3, "lastPrice": 1.25, "impliedVolatility": 0.28, "volume": 900, "openInterest": 4200}
                    ],
                    "puts": [
                        {"strike": 220.0, "bid": 1.9, "ask": 2.0, "lastPrice": 1.95, "impliedVolatility": 0.31},
                        {"strike": 215.0, "lastPrice": 1.1}
                    ]
                }]
            }],
            "error": null
        }
    }"#;

    fn aapl() -> Ticker {
        Ticker::parse("AAPL").expect("ticker")
    }

    #[test]
    fn expirations_are_sorted_and_deduplicated() {
        let months = parse_expirations(&aapl(), CHAIN_BODY).expect("months");
        assert_eq!(
            months,
            vec![
                MonthCode::new(date!(2026 - 10 - 23)),
                MonthCode::new(date!(2026 - 11 - 20)),
            ]
        );
    }

    #[test]
    fn chain_selects_the_requested_side() {
        let month = MonthCode::new(date!(2026 - 10 - 23));
        let chain = parse_chain(&aapl(), month, OptionType::Put, CHAIN_BODY).expect("chain");
        assert_eq!(chain.underlying_price, 231.5);
        assert_eq!(chain.contracts.len(), 2);
        assert_eq!(chain.contracts[1].bid, 0.0);

        let calls = parse_chain(&aapl(), month, OptionType::Call, CHAIN_BODY).expect("chain");
        assert_eq!(calls.contracts[0].open_interest, Some(4200));
    }

    #[test]
    fn empty_result_means_invalid_ticker() {
        let body = r#"{"optionChain":{"result":[],"error":null}}"#;
        let error = parse_expirations(&aapl(), body).unwrap_err();
        assert_eq!(error.kind(), SourceErrorKind::InvalidTicker);
    }

    #[test]
    fn screener_skips_unparsable_symbols() {
        let body = r#"{"finance":{"result":[{"quotes":[{"symbol":"NVDA"},{"symbol":"BRK-B"},{"symbol":"??"}]}]}}"#;
        let tickers = parse_screener(body).expect("screener");
        let symbols: Vec<&str> = tickers.iter().map(Ticker::as_str).collect();
        assert_eq!(symbols, ["NVDA", "BRK-B"]);
    }

    #[tokio::test]
    async fn session_cookie_and_crumb_are_sent() {
        let client = Arc::new(CannedHttpClient::new());
        client
            .push(Ok(HttpResponse::ok_json("crumb123")))
            .push(Ok(HttpResponse::ok_json(CHAIN_BODY)));

        let source = YahooChainSource::new(client.clone(), Some(String::from("A3=session")))
            .with_retry(RetryConfig::no_retry());
        let months = source.contract_months(&aapl()).await.expect("months");
        assert_eq!(months.len(), 2);

        let requests = client.requests();
        assert_eq!(requests.len(), 2);
        assert!(requests[1].url.ends_with("/AAPL?crumb=crumb123"));
        assert_eq!(
            requests[1].headers.get("cookie").map(String::as_str),
            Some("A3=session")
        );
    }

    #[tokio::test]
    async fn daily_watchlist_requests_the_configured_count() {
        let client = Arc::new(CannedHttpClient::new());
        client.push(Ok(HttpResponse::ok_json(
            r#"{"finance":{"result":[{"quotes":[{"symbol":"NVDA"},{"symbol":"TSLA"}]}]}}"#,
        )));

        let source = YahooChainSource::new(client.clone(), None)
            .with_retry(RetryConfig::no_retry())
            .with_watchlist_size(10);
        let tickers = source.daily_watchlist().await.expect("watchlist");
        assert_eq!(tickers.len(), 2);

        let requests = client.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].url.ends_with("scrIds=most_actives&count=10"));
        assert!(requests[0].headers.get("cookie").is_none());
    }

    #[tokio::test]
    async fn not_found_maps_to_invalid_ticker() {
        let client = Arc::new(CannedHttpClient::new());
        client.push(Ok(HttpResponse::status(404, "")));

        let source = YahooChainSource::new(client, None).with_retry(RetryConfig::no_retry());
        let error = source.contract_months(&aapl()).await.unwrap_err();
        assert_eq!(error.kind(), SourceErrorKind::InvalidTicker);
    }
}
