// Calendar keys, time-of-day values and display formatting

use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Timelike};
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::LedgerError;
use crate::utils::duration::{Minutes, MINUTES_PER_DAY};
use crate::utils::locale::weekday_label;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A wall-clock time of day with minute precision, written `HH:MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTime(u16);

impl ClockTime {
    /// `hour:minute` for constants; out-of-range input wraps around the day.
    pub const fn at(hour: u16, minute: u16) -> Self {
        ClockTime((hour * 60 + minute) % (MINUTES_PER_DAY as u16))
    }

    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        if hour < 24 && minute < 60 {
            Some(ClockTime((hour * 60 + minute) as u16))
        } else {
            None
        }
    }

    pub fn from_naive(time: NaiveTime) -> Self {
        ClockTime((time.hour() * 60 + time.minute()) as u16)
    }

    pub fn minutes_of_day(self) -> i64 {
        i64::from(self.0)
    }

    /// `self - amount` on a 24-hour dial.
    pub fn wrapping_sub(self, amount: Minutes) -> Self {
        let amount = amount.get().rem_euclid(MINUTES_PER_DAY);
        let value = (self.minutes_of_day() - amount).rem_euclid(MINUTES_PER_DAY);
        ClockTime(value as u16)
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

impl FromStr for ClockTime {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || LedgerError::invalid(format!("Invalid time: '{}'. Use HH:MM.", s));
        let (hour, minute) = s.split_once(':').ok_or_else(invalid)?;
        if hour.is_empty() || hour.len() > 2 || minute.len() != 2 {
            return Err(invalid());
        }
        let hour: u32 = hour.parse().map_err(|_| invalid())?;
        let minute: u32 = minute.parse().map_err(|_| invalid())?;
        ClockTime::from_hm(hour, minute).ok_or_else(invalid)
    }
}

impl Serialize for ClockTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// The `YYYY/MM/WW/DD` key that places an entry on the calendar.
///
/// The week component is redundant with the date and is carried for display
/// only; ordering and equality of days go through [`compare_meta`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Meta {
    pub year: i32,
    pub month: u32,
    pub week: u32,
    pub day: u32,
}

impl Meta {
    pub fn from_date(date: NaiveDate) -> Self {
        Meta {
            year: date.year(),
            month: date.month(),
            week: date.iso_week().week(),
            day: date.day(),
        }
    }

    pub fn date(&self) -> NaiveDate {
        // Metas are only built from valid dates, see `from_date` and `from_str`
        NaiveDate::from_ymd_opt(self.year, self.month, self.day).unwrap_or_default()
    }

    fn sort_key(&self) -> i64 {
        i64::from(self.year) * 10_000 + i64::from(self.month) * 100 + i64::from(self.day)
    }

    pub fn same_day(&self, other: &Meta) -> bool {
        compare_meta(self, other) == Ordering::Equal
    }
}

impl fmt::Display for Meta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}/{:02}/{:02}/{:02}", self.year, self.month, self.week, self.day)
    }
}

impl FromStr for Meta {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || LedgerError::invalid(format!("Invalid meta key: '{}'. Use YYYY/MM/WW/DD.", s));
        let parts: Vec<&str> = s.trim().split('/').collect();
        if parts.len() != 4 {
            return Err(invalid());
        }
        let year: i32 = parts[0].parse().map_err(|_| invalid())?;
        let month: u32 = parts[1].parse().map_err(|_| invalid())?;
        let week: u32 = parts[2].parse().map_err(|_| invalid())?;
        let day: u32 = parts[3].parse().map_err(|_| invalid())?;
        if NaiveDate::from_ymd_opt(year, month, day).is_none() || !(1..=53).contains(&week) {
            return Err(invalid());
        }
        Ok(Meta { year, month, week, day })
    }
}

impl Serialize for Meta {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Orders two meta keys by year, month and day. The week is ignored.
pub fn compare_meta(a: &Meta, b: &Meta) -> Ordering {
    a.sort_key().cmp(&b.sort_key())
}

/// `today + offset_days`, or `None` when that leaves chrono's calendar.
pub fn shift_days(today: NaiveDate, offset_days: i64) -> Option<NaiveDate> {
    today.checked_add_signed(Duration::try_days(offset_days)?)
}

pub fn shift_weeks(today: NaiveDate, offset_weeks: i64) -> Option<NaiveDate> {
    shift_days(today, offset_weeks.checked_mul(7)?)
}

pub fn format_date(today: NaiveDate, offset_days: i64) -> Option<String> {
    Some(shift_days(today, offset_days)?.format(DATE_FORMAT).to_string())
}

/// ISO week number of `today + offset_weeks`, zero-padded to two characters.
pub fn format_week_of_year(today: NaiveDate, offset_weeks: i64) -> Option<String> {
    Some(week_label(shift_weeks(today, offset_weeks)?))
}

pub fn format_day_of_week(today: NaiveDate, offset_days: i64, locale: &str) -> Option<String> {
    Some(weekday_label(shift_days(today, offset_days)?.weekday(), locale))
}

pub fn week_label(date: NaiveDate) -> String {
    format!("{:02}", date.iso_week().week())
}
