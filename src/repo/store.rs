use chrono::Datelike;
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::db::{Gateway, TimesheetDocument};
use crate::error::{LedgerError, Result};
use crate::models::{Column, Entry};
use crate::utils::date::{compare_meta, week_label, Meta, DATE_FORMAT};
use crate::utils::duration::Minutes;
use crate::utils::locale::weekday_label;

const COMMENT_SEPARATOR: &str = ", ";

/// Which row an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowRef {
    /// The most recent row (last in document order)
    Latest,
    At(usize),
}

impl From<Option<usize>> for RowRef {
    fn from(index: Option<usize>) -> Self {
        index.map(RowRef::At).unwrap_or(RowRef::Latest)
    }
}

/// In-memory view of the timesheet with positional access to rows and
/// columns.
///
/// Rows are addressed by their index in document order (0 = oldest). Every
/// insert and removal renumbers the rows after it, so indices stay dense.
///
/// # Example
///
/// ```
/// use timecard::db::MemoryGateway;
/// use timecard::models::Column;
/// use timecard::repo::{DocumentStore, RowRef};
///
/// let gateway = MemoryGateway::new();
/// let store = DocumentStore::empty();
/// assert_eq!(store.row_count(), 0);
/// assert!(store.get_column(RowRef::Latest, Column::Task).is_err());
/// store.save(&gateway).unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct DocumentStore {
    doc: TimesheetDocument,
}

impl DocumentStore {
    pub fn empty() -> Self {
        Self {
            doc: TimesheetDocument::empty(),
        }
    }

    /// Read and parse the whole document.
    pub fn load<G: Gateway + ?Sized>(gateway: &G) -> Result<Self> {
        let text = gateway.read_all()?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self> {
        let doc = TimesheetDocument::parse(text)?;
        let ongoing = doc.entries.iter().filter(|e| e.is_ongoing()).count();
        if ongoing > 1 {
            return Err(LedgerError::structural(format!(
                "{} entries are running at once",
                ongoing
            )));
        }
        Ok(Self { doc })
    }

    pub fn render(&self) -> String {
        self.doc.render()
    }

    pub fn save<G: Gateway + ?Sized>(&self, gateway: &G) -> Result<()> {
        gateway.write_all(&self.render())
    }

    pub fn entries(&self) -> &[Entry] {
        &self.doc.entries
    }

    pub fn row_count(&self) -> usize {
        self.doc.entries.len()
    }

    pub fn last_index(&self) -> Option<usize> {
        self.row_count().checked_sub(1)
    }

    /// Concrete index for `row`.
    pub fn resolve(&self, row: RowRef) -> Result<usize> {
        let len = self.row_count();
        match row {
            RowRef::Latest => self
                .last_index()
                .ok_or(LedgerError::IndexOutOfRange { index: 0, len }),
            RowRef::At(index) if index < len => Ok(index),
            RowRef::At(index) => Err(LedgerError::IndexOutOfRange { index, len }),
        }
    }

    pub fn entry(&self, row: RowRef) -> Result<&Entry> {
        let index = self.resolve(row)?;
        Ok(&self.doc.entries[index])
    }

    pub fn entry_mut(&mut self, row: RowRef) -> Result<&mut Entry> {
        let index = self.resolve(row)?;
        Ok(&mut self.doc.entries[index])
    }

    pub fn get_column(&self, row: RowRef, column: Column) -> Result<String> {
        Ok(self.entry(row)?.column(column))
    }

    pub fn set_column(&mut self, row: RowRef, column: Column, content: impl Into<String>) -> Result<()> {
        let index = self.resolve(row)?;
        let content = content.into();
        if column == Column::End && content.trim().is_empty() {
            if let Some(running) = self.ongoing_index().filter(|i| *i != index) {
                return Err(LedgerError::OngoingConflict(running));
            }
        }
        log::debug!("row {}: {} = '{}'", index, column.as_str(), content);
        self.doc.entries[index].set_column(column, content)
    }

    /// Append to a column. With `leading_space` a space separates the new
    /// text from existing content.
    pub fn append_column(
        &mut self,
        row: RowRef,
        column: Column,
        content: &str,
        leading_space: bool,
    ) -> Result<()> {
        let mut value = self.get_column(row, column)?;
        if leading_space && !value.is_empty() && !content.is_empty() {
            value.push(' ');
        }
        value.push_str(content);
        self.set_column(row, column, value)
    }

    pub fn is_ongoing(&self) -> bool {
        self.ongoing_index().is_some()
    }

    pub fn is_row_ongoing(&self, row: RowRef) -> Result<bool> {
        Ok(self.entry(row)?.is_ongoing())
    }

    pub fn ongoing_index(&self) -> Option<usize> {
        self.doc.entries.iter().position(|e| e.is_ongoing())
    }

    /// Task numbers logged on `date_filter` (`YYYY-MM-DD`), in document order.
    pub fn issue_numbers_of_day(&self, date_filter: &str) -> Vec<String> {
        self.doc
            .entries
            .iter()
            .filter(|e| e.meta.date().format(DATE_FORMAT).to_string() == date_filter)
            .filter(|e| !e.task.is_empty())
            .map(|e| e.task.clone())
            .collect()
    }

    /// Last row whose meta is strictly before `meta`.
    pub fn index_before_meta(&self, meta: &Meta) -> Option<usize> {
        self.doc
            .entries
            .iter()
            .rposition(|e| compare_meta(&e.meta, meta) == Ordering::Less)
    }

    /// Last row whose meta is not after `meta`.
    pub fn index_not_after_meta(&self, meta: &Meta) -> Option<usize> {
        self.doc
            .entries
            .iter()
            .rposition(|e| compare_meta(&e.meta, meta) != Ordering::Greater)
    }

    /// Insert `entry` right after `after`, or before the first row when
    /// `after` is `None`. Returns the new row's index.
    pub fn insert_after(&mut self, after: Option<usize>, entry: Entry) -> Result<usize> {
        let len = self.row_count();
        let position = match after {
            None => 0,
            Some(index) if index < len => index + 1,
            Some(index) => return Err(LedgerError::IndexOutOfRange { index, len }),
        };
        if entry.is_ongoing() {
            if let Some(running) = self.ongoing_index() {
                return Err(LedgerError::OngoingConflict(running));
            }
        }
        log::debug!("inserting row at {}", position);
        self.doc.entries.insert(position, entry);
        Ok(position)
    }

    pub fn remove(&mut self, index: usize) -> Result<Entry> {
        let index = self.resolve(RowRef::At(index))?;
        log::debug!("removing row {}", index);
        Ok(self.doc.entries.remove(index))
    }

    /// Drop up to `amount` rows from the end; returns how many went.
    pub fn truncate_latest(&mut self, amount: usize) -> usize {
        let removed = amount.min(self.row_count());
        let keep = self.row_count() - removed;
        self.doc.entries.truncate(keep);
        removed
    }

    /// Write week, weekday and date labels on the first row of each day and
    /// clear them on the rest.
    pub fn relabel_days(&mut self, locale: &str) {
        let mut previous: Option<Meta> = None;
        for entry in self.doc.entries.iter_mut() {
            let first_of_day = previous.map_or(true, |p| !p.same_day(&entry.meta));
            if first_of_day {
                let date = entry.meta.date();
                entry.week = week_label(date);
                entry.weekday = weekday_label(date.weekday(), locale);
                entry.date = date.format(DATE_FORMAT).to_string();
            } else {
                entry.clear_labels();
            }
            previous = Some(entry.meta);
        }
    }

    /// Rebuild every derived column from scratch.
    ///
    /// Durations go on every stopped row. The per-task sum goes on the last
    /// row of each task within a day, the day total and running balance on
    /// the last row of each day. Running entries count as zero.
    pub fn recalculate(&mut self, daily_target: Minutes) {
        let entries = &mut self.doc.entries;
        for entry in entries.iter_mut() {
            entry.clear_derived();
            if let Some(elapsed) = entry.elapsed() {
                entry.duration = elapsed.to_string();
            }
        }

        let mut balance = Minutes::ZERO;
        let mut day_start = 0;
        while day_start < entries.len() {
            let day = entries[day_start].meta;
            let day_end = entries[day_start..]
                .iter()
                .position(|e| !e.meta.same_day(&day))
                .map_or(entries.len(), |offset| day_start + offset);

            let mut day_total = Minutes::ZERO;
            let mut task_totals: HashMap<&str, (Minutes, usize)> = HashMap::new();
            for (index, entry) in entries[day_start..day_end].iter().enumerate() {
                let elapsed = entry.elapsed().unwrap_or_default();
                day_total += elapsed;
                if !entry.task.is_empty() {
                    let slot = task_totals.entry(entry.task.as_str()).or_default();
                    slot.0 += elapsed;
                    slot.1 = day_start + index;
                }
            }
            let task_totals: Vec<(usize, Minutes)> = task_totals
                .into_values()
                .map(|(total, last)| (last, total))
                .collect();
            for (last, total) in task_totals {
                entries[last].sum_task_day = total.to_string();
            }

            balance += day_total - daily_target;
            let last = &mut entries[day_end - 1];
            last.sum_day = day_total.to_string();
            last.balance = balance.to_string();

            day_start = day_end;
        }
    }
}

/// Join two comments with a separator, or return whichever is non-empty.
pub fn merge_comment_text(a: &str, b: &str) -> String {
    match (a.is_empty(), b.is_empty()) {
        (false, false) => format!("{}{}{}", a, COMMENT_SEPARATOR, b),
        (true, _) => b.to_string(),
        (false, true) => a.to_string(),
    }
}
