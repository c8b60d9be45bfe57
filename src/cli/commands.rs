use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::cli::error::{parse_row_ref, user_error, validate_non_empty, validate_row_id};
use crate::cli::output::{entry_elapsed, format_entries_json, format_entries_table, format_status};
use crate::config::Config;
use crate::db::FileGateway;
use crate::models::Column;
use crate::repo::{EntryLedger, NewEntry};
use crate::utils::clock::Clock;
use crate::utils::date::{ClockTime, Meta, DATE_FORMAT};
use crate::utils::duration::Minutes;
use crate::utils::scope::Scope;

#[derive(Parser)]
#[command(name = "timecard")]
#[command(about = "Timecard - Track working time in an HTML timesheet")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create an empty timesheet
    Init,
    /// Replace the timesheet with an empty one
    Reset {
        /// Confirm discarding every entry
        #[arg(short = 'y', long)]
        yes: bool,
    },
    /// Start timing now
    Start {
        /// Task or issue number
        #[arg(short, long, default_value = "")]
        task: String,
        /// Comment text
        #[arg(trailing_var_arg = true)]
        comment: Vec<String>,
    },
    /// Stop the running entry
    Stop {
        /// Comment text merged into the entry's comment
        #[arg(trailing_var_arg = true)]
        comment: Vec<String>,
    },
    /// Show the running entry and today's total
    Status,
    /// List entries of a day, week or month
    Show {
        /// day, week or month
        #[arg(short, long, default_value = "day")]
        scope: String,
        /// Periods relative to the current one (e.g., -1 for the previous)
        #[arg(short, long, default_value_t = 0, allow_negative_numbers = true)]
        offset: i64,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Log a standard working day as a morning and an afternoon entry
    Fullday {
        /// Days relative to today
        #[arg(short, long, default_value_t = 0, allow_negative_numbers = true)]
        offset: i64,
        /// Task or issue number
        #[arg(short, long, default_value = "")]
        task: String,
        /// Comment text
        #[arg(trailing_var_arg = true)]
        comment: Vec<String>,
    },
    /// Add a finished entry for a past or future day
    Insert {
        /// Date (YYYY-MM-DD)
        date: String,
        /// Start time (HH:MM)
        start: String,
        /// End time (HH:MM)
        end: String,
        /// Insert after this row instead of after the day's last entry
        #[arg(long)]
        after: Option<String>,
        /// Task or issue number
        #[arg(short, long, default_value = "")]
        task: String,
        /// Comment text
        #[arg(trailing_var_arg = true)]
        comment: Vec<String>,
    },
    /// Merge a row with the row after it
    Merge {
        row: String,
    },
    /// Split the last part of a row into a new row
    Split {
        row: String,
        /// Length of the new row (H:MM or minutes)
        duration: String,
    },
    /// Remove the latest entries
    Remove {
        /// Number of entries to remove
        #[arg(default_value_t = 1)]
        amount: usize,
    },
    /// Delete one row
    Delete {
        row: String,
    },
    /// Set the task or issue number of a row
    Issue {
        task: String,
        /// Row to change (defaults to the latest)
        #[arg(short, long)]
        row: Option<String>,
    },
    /// Append to the comment of a row
    Comment {
        /// Row to change (defaults to the latest)
        #[arg(short, long)]
        row: Option<String>,
        /// Append without a separating space
        #[arg(long)]
        no_space: bool,
        #[arg(trailing_var_arg = true, required = true)]
        text: Vec<String>,
    },
    /// Set one column of a row
    Set {
        row: String,
        /// Column name (e.g., start, end, task, comment)
        column: String,
        /// New content; empty End reopens the entry
        #[arg(default_value = "")]
        value: String,
    },
    /// Shorten a row by moving its end earlier
    Reduce {
        row: String,
        /// Time to take off (H:MM or minutes)
        duration: String,
    },
    /// Recompute durations, sums and balance
    Recalc,
    /// List the task numbers logged on a day
    Issues {
        /// Days relative to today
        #[arg(short, long, default_value_t = 0, allow_negative_numbers = true)]
        offset: i64,
    },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    handle_command(cli)
}

fn handle_command(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Init => handle_init(),
        Commands::Reset { yes } => handle_reset(yes),
        Commands::Start { task, comment } => handle_start(task, comment),
        Commands::Stop { comment } => handle_stop(comment),
        Commands::Status => handle_status(),
        Commands::Show { scope, offset, json } => handle_show(scope, offset, json),
        Commands::Fullday { offset, task, comment } => handle_fullday(offset, task, comment),
        Commands::Insert { date, start, end, after, task, comment } => {
            handle_insert(date, start, end, after, task, comment)
        }
        Commands::Merge { row } => handle_merge(row),
        Commands::Split { row, duration } => handle_split(row, duration),
        Commands::Remove { amount } => handle_remove(amount),
        Commands::Delete { row } => handle_delete(row),
        Commands::Issue { task, row } => handle_issue(task, row),
        Commands::Comment { row, no_space, text } => handle_comment(row, no_space, text),
        Commands::Set { row, column, value } => handle_set(row, column, value),
        Commands::Reduce { row, duration } => handle_reduce(row, duration),
        Commands::Recalc => handle_recalc(),
        Commands::Issues { offset } => handle_issues(offset),
    }
}

fn open_ledger() -> Result<EntryLedger<FileGateway>> {
    let config = Config::load().context("Failed to load configuration")?;
    log::debug!("using timesheet {}", config.data_location.display());
    Ok(EntryLedger::new(FileGateway::new(config.data_location), config.settings).with_auto_recalculate(true))
}

fn row_arg(row: &str) -> usize {
    validate_row_id(row).unwrap_or_else(|e| user_error(&e))
}

fn minutes_arg(value: &str) -> Minutes {
    value.parse().unwrap_or_else(|e: crate::error::LedgerError| user_error(&e.to_string()))
}

fn join_text(words: Vec<String>) -> String {
    words.join(" ").trim().to_string()
}

fn handle_init() -> Result<()> {
    let ledger = open_ledger()?;
    let location = ledger.gateway().path().display().to_string();
    if ledger.init()? {
        println!("Created timesheet at {}", location);
    } else {
        println!("Timesheet already exists at {}", location);
    }
    Ok(())
}

fn handle_reset(yes: bool) -> Result<()> {
    if !yes {
        user_error("Reset discards every entry. Pass --yes to confirm.");
    }
    let ledger = open_ledger()?;
    ledger.reset()?;
    println!("Reset timesheet at {}", ledger.gateway().path().display());
    Ok(())
}

fn handle_start(task: String, comment: Vec<String>) -> Result<()> {
    let ledger = open_ledger()?;
    let index = ledger.start_entry(&join_text(comment), &task)?;
    let entries = ledger.entries()?;
    println!("Started entry {} at {}", index, entries[index].start);
    Ok(())
}

fn handle_stop(comment: Vec<String>) -> Result<()> {
    let ledger = open_ledger()?;
    let index = ledger.stop_entry(&join_text(comment))?;
    let entries = ledger.entries()?;
    let entry = &entries[index];
    let end = entry.end.map(|t| t.to_string()).unwrap_or_default();
    println!(
        "Stopped entry {}: {}-{} ({})",
        index,
        entry.start,
        end,
        entry.elapsed().unwrap_or_default()
    );
    Ok(())
}

fn handle_status() -> Result<()> {
    let ledger = open_ledger()?;
    let now = ledger.clock().now();
    let running = ledger.ongoing()?;
    let today = ledger.entries_in_scope(Scope::Day, 0)?;
    println!("{}", format_status(running.as_ref(), &today, now));
    Ok(())
}

fn handle_show(scope: String, offset: i64, json: bool) -> Result<()> {
    let ledger = open_ledger()?;
    let scope: Scope = scope.parse().unwrap_or(Scope::Invalid);
    if scope == Scope::Invalid {
        user_error("Invalid scope. Use day, week or month.");
    }
    let filter = ledger.scope_filter(scope, offset)?;
    let entries = ledger.entries_in_scope(scope, offset)?;
    if json {
        println!("{}", format_entries_json(&entries)?);
    } else {
        println!("{} {}", scope.as_str(), filter.label());
        println!("{}", format_entries_table(&entries, ledger.clock().now()).trim_end());
    }
    Ok(())
}

fn handle_fullday(offset: i64, task: String, comment: Vec<String>) -> Result<()> {
    let ledger = open_ledger()?;
    let (first, second) = ledger.add_full_day_entry(offset, &join_text(comment), &task)?;
    let entries = ledger.entries()?;
    println!(
        "Logged full day {} as rows {} and {}",
        entries[first].meta.date().format(DATE_FORMAT),
        first,
        second
    );
    Ok(())
}

fn handle_insert(
    date: String,
    start: String,
    end: String,
    after: Option<String>,
    task: String,
    comment: Vec<String>,
) -> Result<()> {
    let date = NaiveDate::parse_from_str(date.trim(), DATE_FORMAT)
        .unwrap_or_else(|_| user_error(&format!("Invalid date: '{}'. Use YYYY-MM-DD.", date)));
    let start: ClockTime = start.parse().unwrap_or_else(|e: crate::error::LedgerError| user_error(&e.to_string()));
    let end: ClockTime = end.parse().unwrap_or_else(|e: crate::error::LedgerError| user_error(&e.to_string()));
    let meta = Meta::from_date(date);

    let ledger = open_ledger()?;
    let after = match after {
        Some(row) => Some(row_arg(&row)),
        None => ledger.insertion_point(&meta)?,
    };
    let new_entry = NewEntry::new(meta, start, end)
        .task(task.trim())
        .comment(join_text(comment));
    let index = ledger.insert_entry_after(after, new_entry)?;
    println!("Inserted entry {} on {}: {}-{}", index, date.format(DATE_FORMAT), start, end);
    Ok(())
}

fn handle_merge(row: String) -> Result<()> {
    let index = row_arg(&row);
    let ledger = open_ledger()?;
    ledger.merge(index)?;
    println!("Merged row {} into row {}", index + 1, index);
    Ok(())
}

fn handle_split(row: String, duration: String) -> Result<()> {
    let index = row_arg(&row);
    let amount = minutes_arg(&duration);
    let ledger = open_ledger()?;
    let new_index = ledger.split(index, amount)?;
    println!("Split row {}; the last {} is now row {}", index, amount, new_index);
    Ok(())
}

fn handle_remove(amount: usize) -> Result<()> {
    let ledger = open_ledger()?;
    let removed = ledger.remove_entries(amount)?;
    println!("Removed {} entries", removed);
    Ok(())
}

fn handle_delete(row: String) -> Result<()> {
    let index = row_arg(&row);
    let ledger = open_ledger()?;
    let removed = ledger.remove_entry_by_id(index)?;
    println!(
        "Deleted row {} ({} {})",
        index,
        removed.meta.date().format(DATE_FORMAT),
        removed.start
    );
    Ok(())
}

fn handle_issue(task: String, row: Option<String>) -> Result<()> {
    if let Err(e) = validate_non_empty(&task, "Task") {
        user_error(&e);
    }
    let row = parse_row_ref(row.as_deref()).unwrap_or_else(|e| user_error(&e));
    let ledger = open_ledger()?;
    let index = ledger.update_issue_number(&task, row)?;
    println!("Set task of row {} to {}", index, task.trim());
    Ok(())
}

fn handle_comment(row: Option<String>, no_space: bool, text: Vec<String>) -> Result<()> {
    let text = join_text(text);
    if let Err(e) = validate_non_empty(&text, "Comment") {
        user_error(&e);
    }
    let row = parse_row_ref(row.as_deref()).unwrap_or_else(|e| user_error(&e));
    let ledger = open_ledger()?;
    let index = ledger.append_comment(&text, row, !no_space)?;
    println!("Updated comment of row {}", index);
    Ok(())
}

fn handle_set(row: String, column: String, value: String) -> Result<()> {
    let row = parse_row_ref(Some(&row)).unwrap_or_else(|e| user_error(&e));
    let column = Column::from_str(&column.to_lowercase()).unwrap_or_else(|| {
        let names: Vec<&str> = Column::ALL.iter().map(|c| c.as_str()).collect();
        user_error(&format!("Unknown column '{}'. Use one of: {}", column, names.join(", ")))
    });
    if column.is_derived() {
        user_error(&format!("Column '{}' is computed by recalc", column.as_str()));
    }
    if matches!(column, Column::Week | Column::Day | Column::Date) {
        user_error(&format!("Column '{}' follows meta; set meta instead", column.as_str()));
    }
    let ledger = open_ledger()?;
    let index = ledger.update_column(row, column, &value)?;
    println!("Set {} of row {}", column.as_str(), index);
    Ok(())
}

fn handle_reduce(row: String, duration: String) -> Result<()> {
    let index = row_arg(&row);
    let amount = minutes_arg(&duration);
    let ledger = open_ledger()?;
    let end = ledger.reduce_entry_time(index, amount)?;
    println!("Row {} now ends at {}", index, end);
    Ok(())
}

fn handle_recalc() -> Result<()> {
    let ledger = open_ledger()?;
    ledger.recalculate()?;
    let entries = ledger.entries()?;
    let balance = entries
        .iter()
        .rev()
        .find(|e| !e.balance.is_empty())
        .map(|e| e.balance.clone())
        .unwrap_or_else(|| Minutes::ZERO.to_string());
    let now = ledger.clock().now();
    let total = entries
        .iter()
        .fold(Minutes::ZERO, |sum, e| sum + entry_elapsed(e, now));
    println!("Recalculated {} rows; total {}, balance {}", entries.len(), total, balance);
    Ok(())
}

fn handle_issues(offset: i64) -> Result<()> {
    let ledger = open_ledger()?;
    let issues = ledger.issue_numbers_of_day(offset)?;
    if issues.is_empty() {
        println!("No issues.");
    } else {
        for issue in issues {
            println!("{}", issue);
        }
    }
    Ok(())
}
