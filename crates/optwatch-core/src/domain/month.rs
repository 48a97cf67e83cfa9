use std::fmt::{Display, Formatter};

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::format_description::FormatItem;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

use crate::ValidationError;

const MONTH_CODE_FORMAT: &[FormatItem<'static>] = format_description!("[year][month][day]");

/// Expiration date of a contract month, persisted as `YYYYMMDD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthCode(Date);

impl MonthCode {
    pub const fn new(date: Date) -> Self {
        Self(date)
    }

    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if trimmed.len() != 8 || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ValidationError::InvalidMonthCode {
                value: input.to_owned(),
            });
        }

        Date::parse(trimmed, MONTH_CODE_FORMAT)
            .map(Self)
            .map_err(|_| ValidationError::InvalidMonthCode {
                value: input.to_owned(),
            })
    }

    /// Month code for the UTC calendar day of a unix timestamp.
    pub fn from_unix_timestamp(seconds: i64) -> Result<Self, ValidationError> {
        OffsetDateTime::from_unix_timestamp(seconds)
            .map(|value| Self(value.date()))
            .map_err(|_| ValidationError::InvalidMonthCode {
                value: seconds.to_string(),
            })
    }

    pub const fn date(self) -> Date {
        self.0
    }

    /// Unix timestamp of midnight UTC on the expiration day.
    pub fn unix_timestamp(self) -> i64 {
        self.0.midnight().assume_utc().unix_timestamp()
    }

    /// Whole days from `today` until expiration; negative once expired.
    pub fn days_from(self, today: Date) -> i64 {
        (self.0 - today).whole_days()
    }

    pub fn code(self) -> String {
        self.0
            .format(MONTH_CODE_FORMAT)
            .unwrap_or_else(|_| String::from("00000000"))
    }
}

impl Display for MonthCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.code())
    }
}

impl Serialize for MonthCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.code())
    }
}

impl<'de> Deserialize<'de> for MonthCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::parse(&value).map_err(D::Error::custom)
    }
}
