// SPDX-FileCopyrightText: 2026 TokenWatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the ledger, the budget monitor, and the CLI.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// A named or literal time window used to filter usage records.
///
/// Parsing never fails. Strings that are neither a keyword nor a `YYYY-MM-DD`
/// date become [`Period::Unrecognized`], which selects every record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Period {
    /// Local midnight up to now.
    #[default]
    Today,
    /// Rolling seven days back from now.
    Week,
    /// Rolling thirty days back from now.
    Month,
    /// Every record.
    All,
    /// One calendar day.
    Date(NaiveDate),
    /// Anything else; kept verbatim so reports echo what the caller asked for.
    Unrecognized(String),
}

impl Period {
    /// Parse a period string. See the type docs for the fallback policy.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "today" => Self::Today,
            "week" => Self::Week,
            "month" => Self::Month,
            "all" => Self::All,
            other => match NaiveDate::parse_from_str(other, "%Y-%m-%d") {
                Ok(date) => Self::Date(date),
                Err(_) => Self::Unrecognized(other.to_string()),
            },
        }
    }

    /// Resolve this period into a concrete window relative to `now`.
    pub fn window(&self, now: NaiveDateTime) -> PeriodWindow {
        match self {
            Self::Today => PeriodWindow::Since(now.date().and_time(NaiveTime::MIN)),
            Self::Week => PeriodWindow::Since(now - Duration::days(7)),
            Self::Month => PeriodWindow::Since(now - Duration::days(30)),
            Self::All | Self::Unrecognized(_) => PeriodWindow::Unbounded,
            Self::Date(date) => {
                let start = date.and_time(NaiveTime::MIN);
                PeriodWindow::Between(start, start + Duration::days(1))
            }
        }
    }

    /// Whether this period fell back to "everything" because it was not understood.
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Unrecognized(_))
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Today => f.write_str("today"),
            Self::Week => f.write_str("week"),
            Self::Month => f.write_str("month"),
            Self::All => f.write_str("all"),
            Self::Date(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            Self::Unrecognized(raw) => f.write_str(raw),
        }
    }
}

impl FromStr for Period {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<String> for Period {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<Period> for String {
    fn from(value: Period) -> Self {
        value.to_string()
    }
}

/// A concrete time window produced by [`Period::window`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodWindow {
    /// Everything at or after the cutoff.
    Since(NaiveDateTime),
    /// Half-open `[start, end)`.
    Between(NaiveDateTime, NaiveDateTime),
    /// No bound at all.
    Unbounded,
}

impl PeriodWindow {
    pub fn contains(&self, timestamp: NaiveDateTime) -> bool {
        match *self {
            Self::Since(cutoff) => timestamp >= cutoff,
            Self::Between(start, end) => start <= timestamp && timestamp < end,
            Self::Unbounded => true,
        }
    }
}
