use serde::Serialize;

use crate::error::LedgerError;
use crate::utils::date::{ClockTime, Meta};
use crate::utils::duration::{duration, Minutes};

/// The twelve columns of a timesheet row, in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Meta,
    Week,
    Day,
    Date,
    Start,
    End,
    Task,
    Comment,
    Duration,
    SumTaskDay,
    SumDay,
    Balance,
}

impl Column {
    pub const ALL: [Column; 12] = [
        Column::Meta,
        Column::Week,
        Column::Day,
        Column::Date,
        Column::Start,
        Column::End,
        Column::Task,
        Column::Comment,
        Column::Duration,
        Column::SumTaskDay,
        Column::SumDay,
        Column::Balance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Column::Meta => "meta",
            Column::Week => "week",
            Column::Day => "day",
            Column::Date => "date",
            Column::Start => "start",
            Column::End => "end",
            Column::Task => "task",
            Column::Comment => "comment",
            Column::Duration => "duration",
            Column::SumTaskDay => "sum_task_day",
            Column::SumDay => "sum_day",
            Column::Balance => "balance",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Column::ALL.iter().copied().find(|c| c.as_str() == s)
    }

    /// Header text written into the document.
    pub fn title(&self) -> &'static str {
        match self {
            Column::Meta => "Meta",
            Column::Week => "Week",
            Column::Day => "Day",
            Column::Date => "Date",
            Column::Start => "Start",
            Column::End => "End",
            Column::Task => "Task",
            Column::Comment => "Comment",
            Column::Duration => "Duration",
            Column::SumTaskDay => "Task/Day",
            Column::SumDay => "Day Total",
            Column::Balance => "Balance",
        }
    }

    /// Columns recomputed by a recalculation.
    pub fn is_derived(&self) -> bool {
        matches!(
            self,
            Column::Duration | Column::SumTaskDay | Column::SumDay | Column::Balance
        )
    }
}

/// Entry lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Started,
    Stopped,
}

/// One row of the timesheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub meta: Meta,
    pub week: String,
    pub weekday: String,
    pub date: String,
    pub start: ClockTime,
    pub end: Option<ClockTime>,
    pub task: String,
    pub comment: String,
    pub duration: String,
    pub sum_task_day: String,
    pub sum_day: String,
    pub balance: String,
}

impl Entry {
    /// An ongoing entry with no labels, task or comment.
    pub fn new(meta: Meta, start: ClockTime) -> Self {
        Self {
            meta,
            week: String::new(),
            weekday: String::new(),
            date: String::new(),
            start,
            end: None,
            task: String::new(),
            comment: String::new(),
            duration: String::new(),
            sum_task_day: String::new(),
            sum_day: String::new(),
            balance: String::new(),
        }
    }

    pub fn is_ongoing(&self) -> bool {
        self.end.is_none()
    }

    pub fn status(&self) -> EntryStatus {
        if self.is_ongoing() {
            EntryStatus::Started
        } else {
            EntryStatus::Stopped
        }
    }

    /// Elapsed time of a stopped entry.
    pub fn elapsed(&self) -> Option<Minutes> {
        self.end.map(|end| duration(self.start, end))
    }

    pub fn column(&self, column: Column) -> String {
        match column {
            Column::Meta => self.meta.to_string(),
            Column::Week => self.week.clone(),
            Column::Day => self.weekday.clone(),
            Column::Date => self.date.clone(),
            Column::Start => self.start.to_string(),
            Column::End => self.end.map(|t| t.to_string()).unwrap_or_default(),
            Column::Task => self.task.clone(),
            Column::Comment => self.comment.clone(),
            Column::Duration => self.duration.clone(),
            Column::SumTaskDay => self.sum_task_day.clone(),
            Column::SumDay => self.sum_day.clone(),
            Column::Balance => self.balance.clone(),
        }
    }

    /// Replace one column. Meta, Start and End are parsed; an empty End
    /// reopens the entry.
    pub fn set_column(&mut self, column: Column, content: String) -> Result<(), LedgerError> {
        match column {
            Column::Meta => self.meta = content.parse()?,
            Column::Week => self.week = content,
            Column::Day => self.weekday = content,
            Column::Date => self.date = content,
            Column::Start => self.start = content.parse()?,
            Column::End => {
                self.end = if content.trim().is_empty() {
                    None
                } else {
                    Some(content.parse()?)
                }
            }
            Column::Task => self.task = content,
            Column::Comment => self.comment = content,
            Column::Duration => self.duration = content,
            Column::SumTaskDay => self.sum_task_day = content,
            Column::SumDay => self.sum_day = content,
            Column::Balance => self.balance = content,
        }
        Ok(())
    }

    /// Build an entry from the twelve cell texts of a document row.
    pub fn from_cells(cells: &[String]) -> Result<Self, LedgerError> {
        if cells.len() != Column::ALL.len() {
            return Err(LedgerError::structural(format!(
                "row has {} cells, expected {}",
                cells.len(),
                Column::ALL.len()
            )));
        }
        let meta: Meta = cells[0]
            .parse()
            .map_err(|e: LedgerError| LedgerError::structural(e.to_string()))?;
        let start: ClockTime = cells[4]
            .parse()
            .map_err(|e: LedgerError| LedgerError::structural(e.to_string()))?;
        let mut entry = Entry::new(meta, start);
        for (column, cell) in Column::ALL.iter().zip(cells.iter()).skip(1) {
            if *column == Column::Start {
                continue;
            }
            entry
                .set_column(*column, cell.clone())
                .map_err(|e| LedgerError::structural(e.to_string()))?;
        }
        Ok(entry)
    }

    pub fn cells(&self) -> Vec<String> {
        Column::ALL.iter().map(|c| self.column(*c)).collect()
    }

    pub fn clear_derived(&mut self) {
        self.duration.clear();
        self.sum_task_day.clear();
        self.sum_day.clear();
        self.balance.clear();
    }

    pub fn clear_labels(&mut self) {
        self.week.clear();
        self.weekday.clear();
        self.date.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Entry {
        let mut entry = Entry::new("2026/10/42/17".parse().unwrap(), "09:00".parse().unwrap());
        entry.task = "42".to_string();
        entry
    }

    #[test]
    fn test_column_conversion() {
        assert_eq!(Column::SumTaskDay.as_str(), "sum_task_day");
        assert_eq!(Column::from_str("comment"), Some(Column::Comment));
        assert_eq!(Column::from_str("nope"), None);
        assert!(Column::Balance.is_derived());
        assert!(!Column::End.is_derived());
    }

    #[test]
    fn test_status_follows_end() {
        let mut entry = sample();
        assert!(entry.is_ongoing());
        assert_eq!(entry.status(), EntryStatus::Started);
        assert_eq!(entry.elapsed(), None);

        entry.set_column(Column::End, "10:30".to_string()).unwrap();
        assert_eq!(entry.status(), EntryStatus::Stopped);
        assert_eq!(entry.elapsed(), Some(Minutes(90)));

        entry.set_column(Column::End, String::new()).unwrap();
        assert!(entry.is_ongoing());
    }

    #[test]
    fn test_set_column_validates_typed_cells() {
        let mut entry = sample();
        assert!(entry.set_column(Column::Start, "late".to_string()).is_err());
        assert!(entry.set_column(Column::Meta, "2026-10-17".to_string()).is_err());
        assert_eq!(entry.column(Column::Start), "09:00");
    }

    #[test]
    fn test_cells_round_trip() {
        let mut entry = sample();
        entry.end = Some("11:15".parse().unwrap());
        entry.comment = "review".to_string();
        let parsed = Entry::from_cells(&entry.cells()).unwrap();
        assert_eq!(parsed, entry);
    }

    #[test]
    fn test_from_cells_rejects_short_rows() {
        let cells = vec!["2026/10/42/17".to_string(); 5];
        let err = Entry::from_cells(&cells).unwrap_err();
        assert!(err.is_internal());
    }
}
