// Output formatting utilities

use anyhow::Result;
use chrono::NaiveDateTime;
use serde::Serialize;

use crate::models::Entry;
use crate::utils::date::{ClockTime, DATE_FORMAT};
use crate::utils::duration::{duration, Minutes};

const COMMENT_MAX_WIDTH: usize = 40;

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() > width {
        let cut: String = text.chars().take(width.saturating_sub(2)).collect();
        format!("{}..", cut)
    } else {
        text.to_string()
    }
}

/// Time spent on `entry`, counting a running entry up to `now`.
pub fn entry_elapsed(entry: &Entry, now: NaiveDateTime) -> Minutes {
    entry
        .elapsed()
        .unwrap_or_else(|| duration(entry.start, ClockTime::from_naive(now.time())))
}

/// Plain table of entries with their row numbers.
pub fn format_entries_table(entries: &[(usize, Entry)], now: NaiveDateTime) -> String {
    if entries.is_empty() {
        return "No entries.".to_string();
    }

    let rows: Vec<[String; 8]> = entries
        .iter()
        .map(|(index, entry)| {
            [
                index.to_string(),
                entry.meta.date().format(DATE_FORMAT).to_string(),
                entry.start.to_string(),
                entry.end.map(|t| t.to_string()).unwrap_or_else(|| "...".to_string()),
                entry_elapsed(entry, now).to_string(),
                entry.task.clone(),
                truncate(&entry.comment, COMMENT_MAX_WIDTH),
                entry.balance.clone(),
            ]
        })
        .collect();

    let headers = ["Row", "Date", "Start", "End", "Time", "Task", "Comment", "Balance"];
    let mut widths = headers.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let format_line = |cells: &[&str]| -> String {
        let line = cells
            .iter()
            .zip(widths.iter())
            .map(|(cell, width)| format!("{:<width$}", cell, width = width))
            .collect::<Vec<_>>()
            .join(" ");
        format!("{}\n", line.trim_end())
    };

    let mut output = format_line(&headers);
    let total_width = widths.iter().sum::<usize>() + widths.len() - 1;
    output.push_str(&format!("{}\n", "-".repeat(total_width)));
    for row in &rows {
        let cells: Vec<&str> = row.iter().map(String::as_str).collect();
        output.push_str(&format_line(&cells));
    }

    let total = entries
        .iter()
        .fold(Minutes::ZERO, |sum, (_, entry)| sum + entry_elapsed(entry, now));
    output.push_str(&format!("\nTotal: {}\n", total));
    output
}

#[derive(Serialize)]
struct JsonRow<'a> {
    row: usize,
    #[serde(flatten)]
    entry: &'a Entry,
}

pub fn format_entries_json(entries: &[(usize, Entry)]) -> Result<String> {
    let rows: Vec<JsonRow> = entries
        .iter()
        .map(|(row, entry)| JsonRow { row: *row, entry })
        .collect();
    Ok(serde_json::to_string_pretty(&rows)?)
}

/// One-line summary of the running entry and today's total.
pub fn format_status(running: Option<&(usize, Entry)>, today: &[(usize, Entry)], now: NaiveDateTime) -> String {
    let total = today
        .iter()
        .fold(Minutes::ZERO, |sum, (_, entry)| sum + entry_elapsed(entry, now));
    match running {
        Some((index, entry)) => {
            let task = if entry.task.is_empty() {
                String::new()
            } else {
                format!(" [{}]", entry.task)
            };
            format!(
                "Running: row {} since {} ({}){}; today {}",
                index,
                entry.start,
                entry_elapsed(entry, now),
                task,
                total
            )
        }
        None => format!("Not running; today {}", total),
    }
}
