//! Per-ticker contract-month cache with forward rollover.
//!
//! Each record is the ordered list of expirations still considered usable
//! for a ticker, soonest first. Element 0 is the front month handed to the
//! chain source. Rollover only ever removes months from the front.

use std::collections::{BTreeMap, BTreeSet};

use time::Date;
use tracing::{debug, info, warn};

use crate::persistence::Row;
use crate::source::{ChainSource, SourceError};
use crate::{MonthCode, Notice, Ticker};

/// Result of [`ContractMonthCache::roll_forward`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollOutcome {
    /// No record for the ticker.
    Missing,
    /// The front month already has enough runway.
    Unchanged { front: MonthCode },
    /// `dropped` months were consumed; `front` is the new front month.
    Rolled { dropped: usize, front: MonthCode },
    /// Every cached month fell inside the window.
    Exhausted { dropped: usize },
}

/// Summary of [`ContractMonthCache::load`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub loaded: usize,
    /// Rows dropped because no list references the ticker.
    pub dropped_untracked: usize,
    /// Tracked tickers persisted without months.
    pub pending: Vec<Ticker>,
}

/// Owns the ticker → months mapping and its dirty flag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContractMonthCache {
    records: BTreeMap<Ticker, Vec<MonthCode>>,
    dirty: bool,
}

impl ContractMonthCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn months(&self, ticker: &Ticker) -> Option<&[MonthCode]> {
        self.records.get(ticker).map(Vec::as_slice)
    }

    pub fn front_month(&self, ticker: &Ticker) -> Option<MonthCode> {
        self.records.get(ticker).and_then(|months| months.first().copied())
    }

    pub fn has_usable_record(&self, ticker: &Ticker) -> bool {
        self.records.get(ticker).is_some_and(|months| !months.is_empty())
    }

    pub fn tickers(&self) -> impl Iterator<Item = &Ticker> {
        self.records.keys()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Replaces the record for `ticker` with `months`, sorted and de-duplicated.
    pub fn insert(&mut self, ticker: Ticker, mut months: Vec<MonthCode>) {
        months.sort_unstable();
        months.dedup();
        self.records.insert(ticker, months);
        self.dirty = true;
    }

    /// Pops front months while they expire less than `min_days` after `today`.
    pub fn roll_forward(&mut self, ticker: &Ticker, today: Date, min_days: i64) -> RollOutcome {
        let Some(months) = self.records.get_mut(ticker) else {
            return RollOutcome::Missing;
        };

        let keep_from = months
            .iter()
            .position(|month| month.days_from(today) >= min_days)
            .unwrap_or(months.len());

        if keep_from == 0 {
            return match months.first() {
                Some(front) => RollOutcome::Unchanged { front: *front },
                None => RollOutcome::Exhausted { dropped: 0 },
            };
        }

        months.drain(..keep_from);
        self.dirty = true;

        match months.first() {
            Some(front) => {
                info!(%ticker, dropped = keep_from, front = %front, "rolled contract month forward");
                RollOutcome::Rolled {
                    dropped: keep_from,
                    front: *front,
                }
            }
            None => {
                info!(%ticker, dropped = keep_from, "contract months exhausted by rollover");
                RollOutcome::Exhausted { dropped: keep_from }
            }
        }
    }

    /// Fetches and stores the months for one ticker.
    pub async fn fetch_record(
        &mut self,
        ticker: &Ticker,
        source: &dyn ChainSource,
    ) -> Result<(), SourceError> {
        let months = source.contract_months(ticker).await?;
        if months.is_empty() {
            return Err(SourceError::invalid_ticker(ticker, "no listed contract months"));
        }
        debug!(%ticker, count = months.len(), source = source.name(), "fetched contract months");
        self.insert(ticker.clone(), months);
        Ok(())
    }

    /// Front month with at least `min_days` of runway, fetching when needed.
    ///
    /// A record that rollover exhausts is fetched again once. If the fresh
    /// months are all inside the window too, the ticker is unusable and the
    /// empty record is kept so it persists as needing refresh.
    pub async fn ensure_front_month(
        &mut self,
        ticker: &Ticker,
        source: &dyn ChainSource,
        today: Date,
        min_days: i64,
    ) -> Result<MonthCode, SourceError> {
        let mut refetched = false;
        if !self.has_usable_record(ticker) {
            self.fetch_record(ticker, source).await?;
            refetched = true;
        }

        loop {
            match self.roll_forward(ticker, today, min_days) {
                RollOutcome::Unchanged { front } | RollOutcome::Rolled { front, .. } => {
                    return Ok(front)
                }
                RollOutcome::Exhausted { .. } | RollOutcome::Missing if !refetched => {
                    self.fetch_record(ticker, source).await?;
                    refetched = true;
                }
                RollOutcome::Exhausted { .. } | RollOutcome::Missing => {
                    return Err(SourceError::invalid_ticker(
                        ticker,
                        format!("no contract month at least {min_days} days out"),
                    ));
                }
            }
        }
    }

    /// Rebuilds the cache for exactly `tickers`, discarding everything else.
    ///
    /// A ticker whose fetch fails keeps its previous record, if any.
    pub async fn refresh_all(
        &mut self,
        tickers: &BTreeSet<Ticker>,
        source: &dyn ChainSource,
    ) -> Vec<Notice> {
        let mut previous = std::mem::take(&mut self.records);
        self.dirty = true;

        let mut notices = Vec::new();
        for ticker in tickers {
            match source.contract_months(ticker).await {
                Ok(months) if !months.is_empty() => self.insert(ticker.clone(), months),
                outcome => {
                    if let Err(error) = &outcome {
                        warn!(%ticker, %error, "contract month refresh failed");
                    }
                    if let Some(months) = previous.remove(ticker) {
                        self.records.insert(ticker.clone(), months);
                    }
                    notices.push(Notice::InvalidTicker(ticker.clone()));
                }
            }
        }

        info!(
            refreshed = self.records.len(),
            discarded = previous.len(),
            "contract month cache rebuilt"
        );
        notices
    }

    /// Hydrates from persisted rows `[ticker, YYYYMMDD, ...]`.
    ///
    /// Rows for tickers outside `tracked` are dropped. Tracked tickers with
    /// no months are returned as pending; [`reconcile`](Self::reconcile)
    /// fetches them.
    pub fn load(&mut self, rows: Vec<Row>, tracked: &BTreeSet<Ticker>) -> LoadSummary {
        let mut summary = LoadSummary::default();

        for row in rows {
            let mut fields = row.into_iter();
            let Some(key) = fields.next() else {
                continue;
            };
            let ticker = match Ticker::parse(&key) {
                Ok(ticker) => ticker,
                Err(error) => {
                    warn!(token = %key, %error, "dropping persisted month row");
                    self.dirty = true;
                    continue;
                }
            };

            if !tracked.contains(&ticker) {
                debug!(%ticker, "dropping months for untracked ticker");
                summary.dropped_untracked += 1;
                self.dirty = true;
                continue;
            }

            let mut months = Vec::new();
            for field in fields.filter(|field| !field.is_empty()) {
                match MonthCode::parse(&field) {
                    Ok(month) => months.push(month),
                    Err(error) => {
                        warn!(%ticker, %error, "dropping persisted month code");
                        self.dirty = true;
                    }
                }
            }

            if months.is_empty() {
                summary.pending.push(ticker);
            } else {
                summary.loaded += 1;
                self.records.insert(ticker, months);
            }
        }

        summary
    }

    /// Makes sure every tracked ticker has a non-empty record.
    pub async fn reconcile(
        &mut self,
        tracked: &BTreeSet<Ticker>,
        source: &dyn ChainSource,
    ) -> Vec<Notice> {
        let mut notices = Vec::new();
        for ticker in tracked {
            if self.has_usable_record(ticker) {
                continue;
            }
            if let Err(error) = self.fetch_record(ticker, source).await {
                warn!(%ticker, %error, "could not populate contract months");
                notices.push(Notice::InvalidTicker(ticker.clone()));
            }
        }
        notices
    }

    pub fn to_rows(&self) -> Vec<Row> {
        self.records
            .iter()
            .map(|(ticker, months)| {
                std::iter::once(ticker.to_string())
                    .chain(months.iter().copied().map(MonthCode::code))
                    .collect()
            })
            .collect()
    }
}
