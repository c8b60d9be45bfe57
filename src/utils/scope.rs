// Time scope selection (day / week / month relative to today)

use chrono::{Datelike, Months, NaiveDate};
use std::str::FromStr;

use crate::models::Entry;
use crate::utils::date::{format_date, shift_weeks, week_label, DATE_FORMAT};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Day,
    Week,
    Month,
    Invalid,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Day => "day",
            Scope::Week => "week",
            Scope::Month => "month",
            Scope::Invalid => "invalid",
        }
    }
}

impl FromStr for Scope {
    type Err = std::convert::Infallible;

    /// Unrecognised names map to [`Scope::Invalid`] rather than failing.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "day" | "d" | "today" => Scope::Day,
            "week" | "w" => Scope::Week,
            "month" | "m" => Scope::Month,
            _ => Scope::Invalid,
        })
    }
}

/// A concrete value rows are compared against for equality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeFilter {
    /// `YYYY-MM-DD`
    Date(String),
    /// Two-character ISO week, qualified by its ISO year
    Week { year: i32, week: String },
    /// `YYYY-MM`
    Month(String),
}

impl ScopeFilter {
    /// Resolve `scope` shifted by `offset` periods from `today`.
    ///
    /// Returns `None` for [`Scope::Invalid`] without computing anything, and
    /// when the shifted period falls outside chrono's calendar.
    pub fn resolve(scope: Scope, offset: i64, today: NaiveDate) -> Option<ScopeFilter> {
        match scope {
            Scope::Day => Some(ScopeFilter::Date(format_date(today, offset)?)),
            Scope::Week => {
                let date = shift_weeks(today, offset)?;
                Some(ScopeFilter::Week {
                    year: date.iso_week().year(),
                    week: week_label(date),
                })
            }
            Scope::Month => {
                let first = today.with_day(1)?;
                let months = Months::new(u32::try_from(offset.unsigned_abs()).ok()?);
                let shifted = if offset >= 0 {
                    first.checked_add_months(months)?
                } else {
                    first.checked_sub_months(months)?
                };
                Some(ScopeFilter::Month(shifted.format("%Y-%m").to_string()))
            }
            Scope::Invalid => None,
        }
    }

    pub fn matches(&self, entry: &Entry) -> bool {
        let date = entry.meta.date();
        match self {
            ScopeFilter::Date(value) => date.format(DATE_FORMAT).to_string() == *value,
            ScopeFilter::Week { year, week } => {
                date.iso_week().year() == *year && week_label(date) == *week
            }
            ScopeFilter::Month(value) => date.format("%Y-%m").to_string() == *value,
        }
    }

    pub fn label(&self) -> String {
        match self {
            ScopeFilter::Date(value) | ScopeFilter::Month(value) => value.clone(),
            ScopeFilter::Week { year, week } => format!("{}-W{}", year, week),
        }
    }
}
