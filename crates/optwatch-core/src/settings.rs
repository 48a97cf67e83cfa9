//! Typed key-value settings persisted as `[key, value]` rows.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use tracing::warn;

use crate::persistence::Row;
use crate::ValidationError;

/// Recognized setting keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SettingKey {
    MinTimeDifference,
    PrintAll,
    Login,
    Debug,
}

impl SettingKey {
    pub const ALL: [Self; 4] = [
        Self::MinTimeDifference,
        Self::PrintAll,
        Self::Login,
        Self::Debug,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MinTimeDifference => "MIN_TIME_DIFFERENCE",
            Self::PrintAll => "PRINT_ALL",
            Self::Login => "SLOGIN",
            Self::Debug => "DEBUG",
        }
    }

    pub const fn default_value(self) -> SettingValue {
        match self {
            Self::MinTimeDifference => SettingValue::Integer(5),
            Self::PrintAll | Self::Debug => SettingValue::Boolean(false),
            Self::Login => SettingValue::Text(String::new()),
        }
    }

    const fn expected(self) -> &'static str {
        match self {
            Self::MinTimeDifference => "an integer number of days",
            Self::PrintAll | Self::Debug => "a boolean (true/false, yes/no, on/off, 1/0)",
            Self::Login => "a string",
        }
    }

    /// Parses `raw` into the value type this key holds.
    pub fn parse_value(self, raw: &str) -> Result<SettingValue, ValidationError> {
        let raw = raw.trim();
        let invalid = || ValidationError::InvalidSettingValue {
            key: self.as_str(),
            expected: self.expected(),
            value: raw.to_owned(),
        };

        match self {
            Self::MinTimeDifference => raw.parse::<i64>().map(SettingValue::Integer).map_err(|_| invalid()),
            Self::PrintAll | Self::Debug => parse_bool(raw).map(SettingValue::Boolean).ok_or_else(invalid),
            Self::Login => Ok(SettingValue::Text(raw.to_owned())),
        }
    }
}

impl Display for SettingKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettingKey {
    type Err = ValidationError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        Self::ALL
            .into_iter()
            .find(|key| key.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ValidationError::UnknownSetting {
                key: trimmed.to_owned(),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingValue {
    Integer(i64),
    Boolean(bool),
    Text(String),
}

impl Display for SettingValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Integer(value) => write!(f, "{value}"),
            Self::Boolean(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

/// Settings store. Every key always has a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    values: BTreeMap<SettingKey, SettingValue>,
    dirty: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            values: SettingKey::ALL
                .into_iter()
                .map(|key| (key, key.default_value()))
                .collect(),
            dirty: false,
        }
    }
}

impl Settings {
    /// Hydrates from persisted rows, falling back to defaults per key.
    ///
    /// Unknown keys are dropped and leave the store dirty, as does any key
    /// missing from the file. A known key holding a value of the wrong type
    /// is an error.
    pub fn from_rows(rows: Vec<Row>) -> Result<Self, ValidationError> {
        let mut settings = Self::default();
        let mut seen = 0usize;

        for row in rows {
            let mut fields = row.into_iter();
            let Some(raw_key) = fields.next() else {
                continue;
            };
            let key = match raw_key.parse::<SettingKey>() {
                Ok(key) => key,
                Err(error) => {
                    warn!(key = %raw_key, %error, "dropping persisted setting");
                    settings.dirty = true;
                    continue;
                }
            };
            let value = key.parse_value(&fields.next().unwrap_or_default())?;
            settings.values.insert(key, value);
            seen += 1;
        }

        if seen < SettingKey::ALL.len() {
            settings.dirty = true;
        }
        Ok(settings)
    }

    pub fn to_rows(&self) -> Vec<Row> {
        self.values
            .iter()
            .map(|(key, value)| vec![key.as_str().to_owned(), value.to_string()])
            .collect()
    }

    /// Validates and stores `raw_value` under `raw_key`.
    pub fn set(&mut self, raw_key: &str, raw_value: &str) -> Result<SettingKey, ValidationError> {
        let key = raw_key.parse::<SettingKey>()?;
        let value = key.parse_value(raw_value)?;
        self.values.insert(key, value);
        self.dirty = true;
        Ok(key)
    }

    pub fn get(&self, key: SettingKey) -> SettingValue {
        self.values
            .get(&key)
            .cloned()
            .unwrap_or_else(|| key.default_value())
    }

    pub fn iter(&self) -> impl Iterator<Item = (SettingKey, &SettingValue)> {
        self.values.iter().map(|(key, value)| (*key, value))
    }

    pub fn min_time_difference(&self) -> i64 {
        match self.values.get(&SettingKey::MinTimeDifference) {
            Some(SettingValue::Integer(days)) => *days,
            _ => 5,
        }
    }

    /// `true` unless `PRINT_ALL` is on.
    pub fn aggressive_filtering(&self) -> bool {
        !self.flag(SettingKey::PrintAll)
    }

    pub fn debug(&self) -> bool {
        self.flag(SettingKey::Debug)
    }

    /// Session credential for the chain source, if one is configured.
    pub fn login(&self) -> Option<&str> {
        match self.values.get(&SettingKey::Login) {
            Some(SettingValue::Text(login)) if !login.is_empty() => Some(login),
            _ => None,
        }
    }

    fn flag(&self, key: SettingKey) -> bool {
        matches!(self.values.get(&key), Some(SettingValue::Boolean(true)))
    }

    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }
}
