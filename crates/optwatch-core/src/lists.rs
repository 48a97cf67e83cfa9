//! Named watchlists of tickers.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};

use crate::persistence::Row;
use crate::prompt::{confirm, Prompt};
use crate::{strip_sigil, Notice, Ticker};

/// Owns the list name → ticker set mapping and its dirty flag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListStore {
    lists: BTreeMap<String, BTreeSet<Ticker>>,
    dirty: bool,
}

impl ListStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hydrates from persisted rows `[name, ticker, ticker, ...]`.
    ///
    /// Invalid tickers are dropped and leave the store dirty so the cleaned
    /// file is written back on the next save.
    pub fn from_rows(rows: Vec<Row>) -> Self {
        let mut store = Self::new();
        for row in rows {
            let mut fields = row.into_iter();
            let Some(name) = fields.next() else {
                continue;
            };
            let members = store.lists.entry(name.clone()).or_default();
            for field in fields.filter(|field| !field.is_empty()) {
                match Ticker::parse(&field) {
                    Ok(ticker) => {
                        members.insert(ticker);
                    }
                    Err(error) => {
                        warn!(list = %name, token = %field, %error, "dropping invalid persisted ticker");
                        store.dirty = true;
                    }
                }
            }
        }
        store
    }

    pub fn to_rows(&self) -> Vec<Row> {
        self.lists
            .iter()
            .map(|(name, members)| {
                std::iter::once(name.clone())
                    .chain(members.iter().map(|ticker| ticker.to_string()))
                    .collect()
            })
            .collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lists.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&BTreeSet<Ticker>> {
        self.lists.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.lists.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    /// Every ticker referenced by at least one list.
    pub fn tracked_tickers(&self) -> BTreeSet<Ticker> {
        self.lists.values().flatten().cloned().collect()
    }

    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    pub fn create<S: AsRef<str>>(&mut self, names: &[S]) -> Vec<Notice> {
        let mut notices = Vec::new();
        if names.is_empty() {
            notices.push(Notice::NoListSpecified);
        }
        for raw in names {
            let name = strip_sigil(raw.as_ref());
            if name.is_empty() {
                notices.push(Notice::NoListSpecified);
            } else if self.lists.contains_key(name) {
                notices.push(Notice::ListExists(name.to_owned()));
            } else {
                self.lists.insert(name.to_owned(), BTreeSet::new());
                self.dirty = true;
                debug!(list = name, "created list");
            }
        }
        notices
    }

    /// Deletes lists, asking `prompt` before deleting a non-empty one.
    pub fn delete<S: AsRef<str>>(&mut self, names: &[S], prompt: &mut dyn Prompt) -> Vec<Notice> {
        let mut notices = Vec::new();
        if names.is_empty() {
            notices.push(Notice::NoListSpecified);
        }
        for raw in names {
            let name = raw.as_ref().trim();
            if name.is_empty() {
                notices.push(Notice::NoListSpecified);
                continue;
            }
            let Some(members) = self.lists.get(name) else {
                notices.push(Notice::ListMissing(name.to_owned()));
                continue;
            };

            let approved = members.is_empty() || {
                prompt.show(&render_list(name, members));
                confirm(prompt, &format!("{name} is not empty. Are you sure? y/n: "))
            };

            if approved {
                self.lists.remove(name);
                self.dirty = true;
                debug!(list = name, "deleted list");
            }
        }
        notices
    }

    /// Inserts tickers into `list_name`; already-present tickers are ignored.
    pub fn add<S: AsRef<str>>(&mut self, list_name: &str, tokens: &[S]) -> Vec<Notice> {
        let Some(members) = self.lists.get_mut(list_name) else {
            return vec![Notice::NoValidList];
        };

        let mut notices = Vec::new();
        let mut changed = false;
        for ticker in normalize_tokens(tokens, &mut notices) {
            changed |= members.insert(ticker);
        }
        if changed {
            self.dirty = true;
        }
        notices
    }

    pub fn remove<S: AsRef<str>>(&mut self, list_name: &str, tokens: &[S]) -> Vec<Notice> {
        let Some(members) = self.lists.get_mut(list_name) else {
            return vec![Notice::NoValidList];
        };

        let mut notices = Vec::new();
        let mut changed = false;
        for ticker in normalize_tokens(tokens, &mut notices) {
            if members.remove(&ticker) {
                changed = true;
            } else {
                notices.push(Notice::NotInList(ticker));
            }
        }
        if changed {
            self.dirty = true;
        }
        notices
    }

    /// `name: A, B, C` for a known list.
    pub fn render(&self, name: &str) -> Option<String> {
        self.lists
            .get(name)
            .map(|members| render_list(name, members))
    }

    /// Renders the requested lists, or all lists when `names` is empty.
    pub fn render_many<S: AsRef<str>>(&self, names: &[S]) -> Vec<Result<String, Notice>> {
        if names.is_empty() {
            return self
                .lists
                .iter()
                .map(|(name, members)| Ok(render_list(name, members)))
                .collect();
        }

        names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                self.render(name)
                    .ok_or_else(|| Notice::InvalidList(name.to_owned()))
            })
            .collect()
    }
}

fn render_list(name: &str, members: &BTreeSet<Ticker>) -> String {
    let joined = members
        .iter()
        .map(Ticker::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    format!("{name}: {joined}")
}

fn normalize_tokens<S: AsRef<str>>(tokens: &[S], notices: &mut Vec<Notice>) -> Vec<Ticker> {
    tokens
        .iter()
        .map(AsRef::as_ref)
        .filter(|token| !strip_sigil(token).is_empty())
        .filter_map(|token| match Ticker::parse(token) {
            Ok(ticker) => Some(ticker),
            Err(reason) => {
                notices.push(Notice::RejectedToken {
                    token: token.to_owned(),
                    reason,
                });
                None
            }
        })
        .collect()
}
