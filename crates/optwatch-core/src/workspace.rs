//! Owner of the three stores and their on-disk copies.

use time::Date;
use tracing::{info, warn};

use crate::lists::ListStore;
use crate::months::ContractMonthCache;
use crate::notice::StoreKind;
use crate::persistence::{read_rows_if_exists, write_rows, DataPaths};
use crate::settings::{SettingKey, Settings};
use crate::source::ChainSource;
use crate::{CoreError, MonthCode, Notice, PersistenceError, Ticker, ValidationError};

/// Reads the settings file, creating it with defaults when missing.
pub fn load_settings(paths: &DataPaths) -> Result<Settings, CoreError> {
    match read_rows_if_exists(&paths.settings)? {
        Some(rows) => Ok(Settings::from_rows(rows)?),
        None => {
            let mut settings = Settings::default();
            write_rows(&paths.settings, &settings.to_rows())?;
            settings.mark_clean();
            info!(path = %paths.settings.display(), "created settings file with defaults");
            Ok(settings)
        }
    }
}

/// In-memory state of one data directory.
#[derive(Debug)]
pub struct Workspace {
    pub(crate) paths: DataPaths,
    pub(crate) lists: ListStore,
    pub(crate) months: ContractMonthCache,
    pub(crate) settings: Settings,
    pub(crate) today: Date,
}

impl Workspace {
    /// Workspace with no persisted state, for callers that hydrate it themselves.
    pub fn empty(paths: DataPaths, settings: Settings, today: Date) -> Self {
        Self {
            paths,
            lists: ListStore::new(),
            months: ContractMonthCache::new(),
            settings,
            today,
        }
    }

    /// Loads lists and months and brings the month cache in line with the lists.
    ///
    /// Without a months file every tracked ticker is fetched and the result
    /// saved right away. Otherwise persisted months are loaded and any
    /// tracked ticker still lacking months is fetched.
    ///
    /// # Errors
    ///
    /// Fails when a persisted file cannot be read, or when the freshly
    /// rebuilt months file cannot be written.
    pub async fn open(
        paths: DataPaths,
        settings: Settings,
        source: &dyn ChainSource,
        today: Date,
    ) -> Result<(Self, Vec<Notice>), CoreError> {
        let mut notices = Vec::new();

        let lists = match read_rows_if_exists(&paths.lists)? {
            Some(rows) => ListStore::from_rows(rows),
            None => {
                write_rows(&paths.lists, &[])?;
                ListStore::new()
            }
        };

        let mut workspace = Self {
            lists,
            ..Self::empty(paths, settings, today)
        };
        let tracked = workspace.lists.tracked_tickers();

        match read_rows_if_exists(&workspace.paths.months)? {
            None => {
                notices.push(Notice::RefreshingMonths);
                notices.extend(workspace.months.refresh_all(&tracked, source).await);
                workspace.save_months()?;
            }
            Some(rows) => {
                let summary = workspace.months.load(rows, &tracked);
                info!(
                    loaded = summary.loaded,
                    dropped = summary.dropped_untracked,
                    pending = summary.pending.len(),
                    "loaded contract months"
                );
                notices.extend(workspace.months.reconcile(&tracked, source).await);
            }
        }

        if workspace.settings.login().is_none() {
            notices.push(Notice::CredentialMissing);
        }

        Ok((workspace, notices))
    }

    pub fn paths(&self) -> &DataPaths {
        &self.paths
    }

    pub fn lists(&self) -> &ListStore {
        &self.lists
    }

    pub fn lists_mut(&mut self) -> &mut ListStore {
        &mut self.lists
    }

    pub fn months(&self) -> &ContractMonthCache {
        &self.months
    }

    pub fn months_mut(&mut self) -> &mut ContractMonthCache {
        &mut self.months
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub const fn today(&self) -> Date {
        self.today
    }

    pub fn is_dirty(&self) -> bool {
        self.lists.is_dirty() || self.months.is_dirty() || self.settings.is_dirty()
    }

    pub fn save_lists(&mut self) -> Result<(), PersistenceError> {
        write_rows(&self.paths.lists, &self.lists.to_rows())?;
        self.lists.mark_clean();
        Ok(())
    }

    pub fn save_months(&mut self) -> Result<(), PersistenceError> {
        write_rows(&self.paths.months, &self.months.to_rows())?;
        self.months.mark_clean();
        Ok(())
    }

    pub fn save_settings(&mut self) -> Result<(), PersistenceError> {
        write_rows(&self.paths.settings, &self.settings.to_rows())?;
        self.settings.mark_clean();
        Ok(())
    }

    fn save(&mut self, store: StoreKind) -> Option<Notice> {
        let outcome = match store {
            StoreKind::Lists => self.save_lists(),
            StoreKind::Months => self.save_months(),
            StoreKind::Settings => self.save_settings(),
        };
        outcome.err().map(|error| {
            warn!(%store, %error, "save failed; store stays dirty");
            Notice::SaveFailed {
                store,
                message: error.to_string(),
            }
        })
    }

    /// Writes all three stores regardless of their dirty flags.
    pub fn save_all(&mut self) -> Vec<Notice> {
        [StoreKind::Months, StoreKind::Lists, StoreKind::Settings]
            .into_iter()
            .filter_map(|store| self.save(store))
            .collect()
    }

    /// Writes only the stores holding unsaved changes.
    pub fn flush_dirty(&mut self) -> Vec<Notice> {
        let mut notices = Vec::new();
        if self.months.is_dirty() {
            notices.extend(self.save(StoreKind::Months));
        }
        if self.lists.is_dirty() {
            notices.extend(self.save(StoreKind::Lists));
        }
        if self.settings.is_dirty() {
            notices.extend(self.save(StoreKind::Settings));
        }
        notices
    }

    /// Saves the month cache if a batch touched it.
    pub fn flush_months(&mut self) -> Option<Notice> {
        if self.months.is_dirty() {
            self.save(StoreKind::Months)
        } else {
            None
        }
    }

    /// Validates and stores a setting, then writes the settings file at once.
    pub fn set_setting(
        &mut self,
        key: &str,
        value: &str,
    ) -> Result<(SettingKey, Option<Notice>), ValidationError> {
        let key = self.settings.set(key, value)?;
        Ok((key, self.save(StoreKind::Settings)))
    }

    /// Rebuilds the month cache for every tracked ticker and saves it.
    pub async fn refresh_months(&mut self, source: &dyn ChainSource) -> Vec<Notice> {
        let tracked = self.lists.tracked_tickers();
        let mut notices = self.months.refresh_all(&tracked, source).await;
        notices.extend(self.flush_months());
        notices
    }

    /// Front month per tracked ticker, optionally scoped to the named lists.
    pub fn front_months<S: AsRef<str>>(&self, names: &[S]) -> Vec<Result<(Ticker, Option<MonthCode>), Notice>> {
        if names.is_empty() {
            return self
                .lists
                .tracked_tickers()
                .into_iter()
                .map(|ticker| {
                    let front = self.months.front_month(&ticker);
                    Ok((ticker, front))
                })
                .collect();
        }

        let mut rows = Vec::new();
        for name in names {
            let name = name.as_ref();
            match self.lists.get(name) {
                Some(members) => rows.extend(
                    members
                        .iter()
                        .map(|ticker| Ok((ticker.clone(), self.months.front_month(ticker)))),
                ),
                None => rows.push(Err(Notice::InvalidList(name.to_owned()))),
            }
        }
        rows
    }
}
