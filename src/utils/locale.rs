// Weekday names per locale, loaded once from an embedded JSON table

use chrono::Weekday;
use std::collections::HashMap;
use std::sync::OnceLock;

const WEEKDAYS_JSON: &str = include_str!("weekdays.json");

/// Locale whose labels are used when a locale is unknown.
pub const SOURCE_LOCALE: &str = "en";

const SOURCE_LABELS: [&str; 7] = [
    "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday",
];

fn table() -> &'static HashMap<String, Vec<String>> {
    static TABLE: OnceLock<HashMap<String, Vec<String>>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let parsed: HashMap<String, Vec<String>> = match serde_json::from_str(WEEKDAYS_JSON) {
            Ok(map) => map,
            Err(e) => {
                log::warn!("weekday table is unreadable, using English labels: {}", e);
                HashMap::new()
            }
        };
        parsed.into_iter().filter(|(_, names)| names.len() == 7).collect()
    })
}

/// Localized name of `weekday`, falling back to the English label.
pub fn weekday_label(weekday: Weekday, locale: &str) -> String {
    let idx = weekday.num_days_from_monday() as usize;
    match table().get(locale) {
        Some(names) => names[idx].clone(),
        None => {
            if locale != SOURCE_LOCALE {
                log::warn!("unknown locale '{}', using English weekday names", locale);
            }
            SOURCE_LABELS[idx].to_string()
        }
    }
}

/// Translate an English weekday name into `locale`.
///
/// A name that is not a weekday is returned unchanged.
pub fn translate_weekday(name: &str, locale: &str) -> String {
    match SOURCE_LABELS.iter().position(|label| label.eq_ignore_ascii_case(name)) {
        Some(idx) => weekday_label(weekday_from_index(idx), locale),
        None => name.to_string(),
    }
}

pub fn known_locales() -> Vec<&'static str> {
    let mut locales: Vec<&'static str> = table().keys().map(|k| k.as_str()).collect();
    locales.sort_unstable();
    locales
}

fn weekday_from_index(idx: usize) -> Weekday {
    match idx {
        0 => Weekday::Mon,
        1 => Weekday::Tue,
        2 => Weekday::Wed,
        3 => Weekday::Thu,
        4 => Weekday::Fri,
        5 => Weekday::Sat,
        _ => Weekday::Sun,
    }
}
