//! Retry with exponential backoff and jitter for adapter HTTP calls.

use std::time::Duration;

use tracing::warn;

use crate::http_client::{HttpClient, HttpError, HttpErrorKind, HttpRequest, HttpResponse};

/// Backoff strategy between attempts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
    Fixed {
        delay: Duration,
    },
    /// `base * factor^attempt`, capped at `max`, optionally jittered by +/- 50%.
    Exponential {
        base: Duration,
        factor: f64,
        max: Duration,
        jitter: bool,
    },
}

impl Default for Backoff {
    fn default() -> Self {
        Self::Exponential {
            base: Duration::from_millis(250),
            factor: 2.0,
            max: Duration::from_secs(4),
            jitter: true,
        }
    }
}

impl Backoff {
    /// Delay before retry number `attempt` (0-based).
    pub fn delay(self, attempt: u32) -> Duration {
        match self {
            Self::Fixed { delay } => delay,
            Self::Exponential {
                base,
                factor,
                max,
                jitter,
            } => {
                let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
                let seconds = (base.as_secs_f64() * factor.powi(exponent)).min(max.as_secs_f64());
                let delay = Duration::from_secs_f64(seconds);
                if !jitter {
                    return delay;
                }

                let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
                let spread = millis / 2;
                let low = millis - spread;
                Duration::from_millis(fastrand::u64(low..=millis.saturating_add(spread)))
            }
        }
    }
}

/// Which failures are retried, how often, and how long to wait.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub backoff: Backoff,
    pub retry_on_status: Vec<u16>,
    pub retry_on_timeout: bool,
    pub retry_on_connect: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff: Backoff::default(),
            retry_on_status: vec![408, 429, 500, 502, 503, 504],
            retry_on_timeout: true,
            retry_on_connect: true,
        }
    }
}

impl RetryConfig {
    pub fn fixed(delay: Duration, max_retries: u32) -> Self {
        Self {
            max_retries,
            backoff: Backoff::Fixed { delay },
            ..Self::default()
        }
    }

    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    pub fn should_retry_status(&self, status: u16) -> bool {
        self.retry_on_status.contains(&status)
    }

    pub fn should_retry_error(&self, error: &HttpError) -> bool {
        match error.kind() {
            HttpErrorKind::Timeout => self.retry_on_timeout,
            HttpErrorKind::Connect => self.retry_on_connect,
            HttpErrorKind::Other => false,
        }
    }

    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.backoff.delay(attempt)
    }
}

/// Runs `request`, retrying transient failures per `config`.
///
/// The last response is returned as-is once retries are used up, so the
/// caller still sees a final 429 or 5xx status.
pub async fn execute_with_retry(
    client: &dyn HttpClient,
    request: HttpRequest,
    config: &RetryConfig,
) -> Result<HttpResponse, HttpError> {
    let mut attempt = 0;
    loop {
        let outcome = client.execute(request.clone()).await;
        let retry = match &outcome {
            Ok(response) => config.should_retry_status(response.status),
            Err(error) => config.should_retry_error(error),
        };
        if !retry || attempt >= config.max_retries {
            return outcome;
        }

        let delay = config.delay_for_attempt(attempt);
        match &outcome {
            Ok(response) => warn!(url = %request.url, status = response.status, attempt, ?delay, "retrying request"),
            Err(error) => warn!(url = %request.url, %error, attempt, ?delay, "retrying request"),
        }
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_client::CannedHttpClient;

    #[test]
    fn exponential_backoff_doubles_until_capped() {
        let backoff = Backoff::Exponential {
            base: Duration::from_millis(100),
            factor: 2.0,
            max: Duration::from_secs(1),
            jitter: false,
        };

        assert_eq!(backoff.delay(0), Duration::from_millis(100));
        assert_eq!(backoff.delay(2), Duration::from_millis(400));
        assert_eq!(backoff.delay(4), Duration::from_secs(1));
    }

    #[test]
    fn jitter_stays_within_half_either_side() {
        let backoff = Backoff::Exponential {
            base: Duration::from_millis(200),
            factor: 2.0,
            max: Duration::from_secs(1),
            jitter: true,
        };
        for _ in 0..20 {
            let millis = backoff.delay(1).as_millis();
            assert!((200..=600).contains(&millis), "delay {millis}ms");
        }
    }

    #[test]
    fn only_transient_statuses_retry() {
        let config = RetryConfig::default();
        assert!(config.should_retry_status(429));
        assert!(config.should_retry_status(503));
        assert!(!config.should_retry_status(404));
        assert!(!config.should_retry_error(&HttpError::new(HttpErrorKind::Other, "tls")));
    }

    #[tokio::test]
    async fn retries_until_success() {
        let client = CannedHttpClient::new();
        client
            .push(Ok(HttpResponse::status(503, "")))
            .push(Err(HttpError::new(HttpErrorKind::Timeout, "slow")))
            .push(Ok(HttpResponse::ok_json("{\"ok\":true}")));

        let config = RetryConfig::fixed(Duration::from_millis(1), 3);
        let response = execute_with_retry(&client, HttpRequest::get("https://x.test"), &config)
            .await
            .expect("third attempt succeeds");
        assert!(response.is_success());
        assert_eq!(client.requests().len(), 3);
    }

    #[tokio::test]
    async fn gives_back_last_status_when_exhausted() {
        let client = CannedHttpClient::new();
        client
            .push(Ok(HttpResponse::status(429, "")))
            .push(Ok(HttpResponse::status(429, "")));

        let config = RetryConfig::fixed(Duration::from_millis(1), 1);
        let response = execute_with_retry(&client, HttpRequest::get("https://x.test"), &config)
            .await
            .expect("response");
        assert_eq!(response.status, 429);
    }
}
