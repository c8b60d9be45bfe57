// Duration arithmetic on whole minutes

use std::fmt;
use std::ops::{Add, AddAssign, Sub};
use std::str::FromStr;

use crate::error::LedgerError;
use crate::utils::date::ClockTime;

pub const MINUTES_PER_DAY: i64 = 24 * 60;

/// A signed span of whole minutes, written as `H:MM` (or `-H:MM`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
pub struct Minutes(pub i64);

impl Minutes {
    pub const ZERO: Minutes = Minutes(0);

    pub fn get(self) -> i64 {
        self.0
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }
}

impl Add for Minutes {
    type Output = Minutes;

    fn add(self, rhs: Minutes) -> Minutes {
        Minutes(self.0 + rhs.0)
    }
}

impl AddAssign for Minutes {
    fn add_assign(&mut self, rhs: Minutes) {
        self.0 += rhs.0;
    }
}

impl Sub for Minutes {
    type Output = Minutes;

    fn sub(self, rhs: Minutes) -> Minutes {
        Minutes(self.0 - rhs.0)
    }
}

impl fmt::Display for Minutes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.abs();
        write!(f, "{}{}:{:02}", sign, abs / 60, abs % 60)
    }
}

impl FromStr for Minutes {
    type Err = LedgerError;

    /// Accepts `H:MM`, `-H:MM` or a bare number of minutes.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || LedgerError::invalid(format!("Invalid duration: '{}'. Use H:MM or minutes.", s));
        let (negative, body) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        if body.is_empty() {
            return Err(invalid());
        }

        let total = match body.split_once(':') {
            Some((hours, mins)) => {
                let hours: i64 = hours.parse().map_err(|_| invalid())?;
                if mins.len() != 2 {
                    return Err(invalid());
                }
                let mins: i64 = mins.parse().map_err(|_| invalid())?;
                if hours < 0 || !(0..60).contains(&mins) {
                    return Err(invalid());
                }
                hours
                    .checked_mul(60)
                    .and_then(|h| h.checked_add(mins))
                    .ok_or_else(invalid)?
            }
            None => {
                let mins: i64 = body.parse().map_err(|_| invalid())?;
                if mins < 0 {
                    return Err(invalid());
                }
                mins
            }
        };

        Ok(Minutes(if negative { -total } else { total }))
    }
}

/// Elapsed time from `start` to `end`.
///
/// An `end` earlier than `start` is read as one midnight crossing. Two or more
/// crossings cannot be represented; callers have to rule them out.
pub fn duration(start: ClockTime, end: ClockTime) -> Minutes {
    let start = start.minutes_of_day();
    let mut end = end.minutes_of_day();
    if end < start {
        end += MINUTES_PER_DAY;
    }
    Minutes(end - start)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> ClockTime {
        s.parse().unwrap()
    }

    #[test]
    fn test_duration_same_day() {
        assert_eq!(duration(t("09:00"), t("17:30")), Minutes(510));
        assert_eq!(duration(t("09:00"), t("09:00")), Minutes::ZERO);
    }

    #[test]
    fn test_duration_midnight_wrap() {
        assert_eq!(duration(t("23:30"), t("00:15")), Minutes(45));
        assert_eq!(duration(t("22:00"), t("06:00")), Minutes(480));
    }

    #[test]
    fn test_format() {
        assert_eq!(Minutes(90).to_string(), "1:30");
        assert_eq!(Minutes(5).to_string(), "0:05");
        assert_eq!(Minutes(-75).to_string(), "-1:15");
        assert_eq!(Minutes(600).to_string(), "10:00");
    }

    #[test]
    fn test_parse() {
        assert_eq!("1:30".parse::<Minutes>().unwrap(), Minutes(90));
        assert_eq!("-0:45".parse::<Minutes>().unwrap(), Minutes(-45));
        assert_eq!("25".parse::<Minutes>().unwrap(), Minutes(25));
        assert!("1:3".parse::<Minutes>().is_err());
        assert!("1:75".parse::<Minutes>().is_err());
        assert!("abc".parse::<Minutes>().is_err());
        assert!("".parse::<Minutes>().is_err());
        assert!("-".parse::<Minutes>().is_err());
    }

    #[test]
    fn test_parse_rejects_overflowing_hours() {
        assert!("999999999999999999:00".parse::<Minutes>().is_err());
        assert!("-999999999999999999:00".parse::<Minutes>().is_err());
        assert_eq!(
            "153722867280912930:07".parse::<Minutes>().unwrap(),
            Minutes(i64::MAX)
        );
    }
}
