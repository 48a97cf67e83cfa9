//! Fetch orchestration: resolve targets, secure a front month, pull chains.
//!
//! Results stream to the caller through [`FetchEvent`]s so a long batch can
//! be printed while it runs. Per-ticker and per-chain failures become
//! notices; nothing here aborts a batch.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::resolver::resolve;
use crate::source::{ChainSource, SourceError};
use crate::strategy::{OptionFilter, PremiumFilter, SpreadBuilder, VerticalSpreadBuilder};
use crate::workspace::Workspace;
use crate::{CreditSpread, FilteredOption, InstrumentMode, MonthCode, Notice, OptionType, Ticker};

/// Output of one ticker, month and option type.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainReport {
    pub ticker: Ticker,
    pub month: MonthCode,
    pub option_type: OptionType,
    pub underlying_price: f64,
    pub contract_count: usize,
    /// `None` when options were not requested.
    pub options: Option<Vec<FilteredOption>>,
    /// `None` when spreads were not requested.
    pub spreads: Option<Vec<CreditSpread>>,
    pub calendar: bool,
}

impl ChainReport {
    /// True when neither filtered options nor spreads produced anything.
    pub fn is_empty(&self) -> bool {
        self.options.as_ref().map_or(true, Vec::is_empty)
            && self.spreads.as_ref().map_or(true, Vec::is_empty)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchEvent {
    Notice(Notice),
    Chain(ChainReport),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchSummary {
    pub tickers: usize,
    pub invalid: usize,
    pub reports: usize,
    pub suppressed: usize,
    pub chain_failures: usize,
}

/// Runs fetch batches against a chain source and a strategy.
#[derive(Clone)]
pub struct Fetcher {
    source: Arc<dyn ChainSource>,
    filter: Arc<dyn OptionFilter>,
    spreads: Arc<dyn SpreadBuilder>,
}

impl Fetcher {
    pub fn new(source: Arc<dyn ChainSource>) -> Self {
        Self {
            source,
            filter: Arc::new(PremiumFilter::default()),
            spreads: Arc::new(VerticalSpreadBuilder::default()),
        }
    }

    pub fn with_filter(mut self, filter: Arc<dyn OptionFilter>) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_spread_builder(mut self, spreads: Arc<dyn SpreadBuilder>) -> Self {
        self.spreads = spreads;
        self
    }

    pub fn source(&self) -> &dyn ChainSource {
        self.source.as_ref()
    }

    /// Resolves `targets` against the workspace lists and fetches the result.
    pub async fn fetch<S, F>(
        &self,
        workspace: &mut Workspace,
        targets: &[S],
        mode: InstrumentMode,
        omit_empty: bool,
        mut on_event: F,
    ) -> FetchSummary
    where
        S: AsRef<str>,
        F: FnMut(FetchEvent),
    {
        let resolution = resolve(targets, &workspace.lists, false);
        for rejected in resolution.rejected {
            on_event(FetchEvent::Notice(rejected));
        }
        self.fetch_tickers(workspace, &resolution.tickers, mode, omit_empty, on_event)
            .await
    }

    /// Fetches an already-resolved ticker set, then saves months if they changed.
    pub async fn fetch_tickers<F>(
        &self,
        workspace: &mut Workspace,
        tickers: &[Ticker],
        mode: InstrumentMode,
        omit_empty: bool,
        mut on_event: F,
    ) -> FetchSummary
    where
        F: FnMut(FetchEvent),
    {
        let mut summary = FetchSummary::default();
        let today = workspace.today;
        let min_days = workspace.settings.min_time_difference();
        let aggressive = workspace.settings.aggressive_filtering();

        for ticker in tickers {
            summary.tickers += 1;
            let month = match workspace
                .months
                .ensure_front_month(ticker, self.source.as_ref(), today, min_days)
                .await
            {
                Ok(month) => month,
                Err(error) => {
                    warn!(%ticker, %error, "skipping ticker without a usable month");
                    summary.invalid += 1;
                    on_event(FetchEvent::Notice(Notice::InvalidTicker(ticker.clone())));
                    continue;
                }
            };

            if !mode.needs_chain() {
                debug!(%ticker, %mode, "no chain needed");
                continue;
            }

            let days = month.days_from(today);
            for option_type in OptionType::ALL {
                match self.report(ticker, month, option_type, days, mode, aggressive).await {
                    Ok(report) if omit_empty && report.is_empty() => summary.suppressed += 1,
                    Ok(report) => {
                        summary.reports += 1;
                        on_event(FetchEvent::Chain(report));
                    }
                    Err(error) => {
                        summary.chain_failures += 1;
                        warn!(%ticker, %option_type, %error, "chain fetch failed");
                        on_event(FetchEvent::Notice(Notice::ChainUnavailable {
                            ticker: ticker.clone(),
                            option_type,
                            message: error.message().to_owned(),
                        }));
                    }
                }
            }
        }

        if let Some(notice) = workspace.flush_months() {
            on_event(FetchEvent::Notice(notice));
        }

        info!(
            tickers = summary.tickers,
            reports = summary.reports,
            suppressed = summary.suppressed,
            "fetch batch finished"
        );
        summary
    }

    /// Pulls the chain source's daily watchlist and fetches it, hiding empty blocks.
    pub async fn daily_report<F>(
        &self,
        workspace: &mut Workspace,
        on_event: F,
    ) -> Result<FetchSummary, SourceError>
    where
        F: FnMut(FetchEvent),
    {
        let tickers = self.source.daily_watchlist().await?;
        info!(count = tickers.len(), "fetched daily watchlist");
        Ok(self
            .fetch_tickers(workspace, &tickers, InstrumentMode::ALL, true, on_event)
            .await)
    }

    async fn report(
        &self,
        ticker: &Ticker,
        month: MonthCode,
        option_type: OptionType,
        days: i64,
        mode: InstrumentMode,
        aggressive: bool,
    ) -> Result<ChainReport, SourceError> {
        let chain = self.source.option_chain(ticker, month, option_type).await?;
        debug!(
            %ticker,
            %month,
            %option_type,
            contracts = chain.contracts.len(),
            underlying = chain.underlying_price,
            "fetched chain"
        );

        let options = mode
            .contains(InstrumentMode::OPTIONS)
            .then(|| self.filter.filter(&chain, days));
        let spreads = mode
            .contains(InstrumentMode::SPREADS)
            .then(|| self.spreads.credit_spreads(&chain, days, aggressive));

        Ok(ChainReport {
            ticker: ticker.clone(),
            month,
            option_type,
            underlying_price: chain.underlying_price,
            contract_count: chain.contracts.len(),
            options,
            spreads,
            calendar: mode.contains(InstrumentMode::CALENDAR),
        })
    }
}
