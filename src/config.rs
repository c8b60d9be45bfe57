use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::utils::date::ClockTime;
use crate::utils::duration::{Minutes, MINUTES_PER_DAY};
use crate::utils::locale::known_locales;

const CONFIG_DIR: &str = ".timecard";
const CONFIG_FILE: &str = "rc";
const DEFAULT_DOCUMENT: &str = "timesheet.html";

/// Morning and afternoon blocks written for a backfilled full working day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FullDay {
    pub start: ClockTime,
    pub lunch: ClockTime,
    pub resume: ClockTime,
    pub end: ClockTime,
}

impl Default for FullDay {
    fn default() -> Self {
        Self {
            start: ClockTime::at(8, 0),
            lunch: ClockTime::at(12, 0),
            resume: ClockTime::at(12, 30),
            end: ClockTime::at(16, 30),
        }
    }
}

/// Settings the ledger needs, independent of where they came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerSettings {
    /// Longest gap two entries may have and still be merged.
    pub break_threshold: Minutes,
    /// Target per worked day; the balance accumulates the difference.
    pub daily_target: Minutes,
    pub full_day: FullDay,
    pub locale: String,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            break_threshold: Minutes(15),
            daily_target: Minutes(8 * 60),
            full_day: FullDay::default(),
            locale: "en".to_string(),
        }
    }
}

/// Configuration read from `~/.timecard/rc`.
///
/// One `key=value` per line, `#` starts a comment line:
///
/// ```text
/// data.location=~/Documents/timesheet.html
/// break.threshold=15
/// fullday.start=08:00
/// fullday.lunch=12:00
/// fullday.resume=12:30
/// fullday.end=16:30
/// workday.minutes=480
/// locale=de
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub data_location: PathBuf,
    pub settings: LedgerSettings,
}

impl Config {
    /// Directory holding the rc file and the default timesheet
    pub fn config_dir() -> PathBuf {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join(CONFIG_DIR)
    }

    pub fn config_path() -> PathBuf {
        Self::config_dir().join(CONFIG_FILE)
    }

    pub fn default_data_location() -> PathBuf {
        Self::config_dir().join(DEFAULT_DOCUMENT)
    }

    /// Load the rc file, or defaults when it does not exist.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();
        if !config_path.exists() {
            return Ok(Self::defaults());
        }
        let text = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config: {}", config_path.display()))?;
        Self::parse(&text, &config_path)
    }

    fn defaults() -> Self {
        Self {
            data_location: Self::default_data_location(),
            settings: LedgerSettings::default(),
        }
    }

    /// Parse rc text. Relative paths resolve against the rc file's directory.
    pub fn parse(text: &str, config_path: &Path) -> Result<Self> {
        let mut config = Self::defaults();
        let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));

        for (lineno, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (key, value) = line
                .split_once('=')
                .with_context(|| format!("{}:{}: expected key=value", config_path.display(), lineno + 1))?;
            let key = key.trim();
            let value = value.trim();
            let here = || format!("{}:{}: invalid value for {}", config_path.display(), lineno + 1, key);

            match key {
                "data.location" => config.data_location = resolve_location(value, base_dir),
                "break.threshold" => config.settings.break_threshold = parse_day_span(value).with_context(here)?,
                "workday.minutes" => config.settings.daily_target = parse_day_span(value).with_context(here)?,
                "fullday.start" => config.settings.full_day.start = value.parse().with_context(here)?,
                "fullday.lunch" => config.settings.full_day.lunch = value.parse().with_context(here)?,
                "fullday.resume" => config.settings.full_day.resume = value.parse().with_context(here)?,
                "fullday.end" => config.settings.full_day.end = value.parse().with_context(here)?,
                "locale" => {
                    if !known_locales().iter().any(|known| *known == value) {
                        log::warn!("no weekday names for locale '{}', English will be used", value);
                    }
                    config.settings.locale = value.to_string();
                }
                other => log::warn!("ignoring unknown config key '{}'", other),
            }
        }

        Ok(config)
    }
}

/// A duration setting between zero and one full day.
fn parse_day_span(value: &str) -> Result<Minutes> {
    let minutes: Minutes = value.parse()?;
    if !(0..=MINUTES_PER_DAY).contains(&minutes.get()) {
        anyhow::bail!("{} is not between 0:00 and 24:00", minutes);
    }
    Ok(minutes)
}

fn resolve_location(value: &str, base_dir: &Path) -> PathBuf {
    if let Some(rest) = value.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    let path = PathBuf::from(value);
    if path.is_relative() {
        base_dir.join(path)
    } else {
        path
    }
}
