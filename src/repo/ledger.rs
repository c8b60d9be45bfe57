use chrono::{NaiveDate, NaiveDateTime};
use std::cmp::Ordering;

use crate::config::LedgerSettings;
use crate::db::Gateway;
use crate::error::{LedgerError, Result};
use crate::models::{Column, Entry};
use crate::repo::store::{merge_comment_text, DocumentStore, RowRef};
use crate::utils::clock::{Clock, SystemClock};
use crate::utils::date::{compare_meta, shift_days, ClockTime, Meta, DATE_FORMAT};
use crate::utils::duration::{duration, Minutes};
use crate::utils::scope::{Scope, ScopeFilter};

/// A fully specified, stopped entry for backfilling.
///
/// Week, weekday and date labels are derived from `meta` when the row is
/// written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    pub meta: Meta,
    pub start: ClockTime,
    pub end: ClockTime,
    pub task: String,
    pub comment: String,
}

impl NewEntry {
    pub fn new(meta: Meta, start: ClockTime, end: ClockTime) -> Self {
        Self {
            meta,
            start,
            end,
            task: String::new(),
            comment: String::new(),
        }
    }

    pub fn task(mut self, task: impl Into<String>) -> Self {
        self.task = task.into();
        self
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    fn into_entry(self) -> Entry {
        let mut entry = Entry::new(self.meta, self.start);
        entry.end = Some(self.end);
        entry.task = self.task;
        entry.comment = self.comment;
        entry
    }
}

/// Transactional operations on the timesheet.
///
/// Every operation reads the whole document, applies its change in memory
/// and writes the result back once. A failing operation writes nothing.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use timecard::config::LedgerSettings;
/// use timecard::db::MemoryGateway;
/// use timecard::repo::EntryLedger;
/// use timecard::utils::FixedClock;
///
/// let now = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap().and_hms_opt(9, 0, 0).unwrap();
/// let ledger = EntryLedger::new(MemoryGateway::new(), LedgerSettings::default())
///     .with_clock(FixedClock::new(now));
/// ledger.init().unwrap();
/// ledger.start_entry("standup", "").unwrap();
/// assert!(ledger.ongoing().unwrap().is_some());
/// ```
pub struct EntryLedger<G: Gateway, C: Clock = SystemClock> {
    gateway: G,
    clock: C,
    settings: LedgerSettings,
    auto_recalculate: bool,
}

impl<G: Gateway> EntryLedger<G, SystemClock> {
    pub fn new(gateway: G, settings: LedgerSettings) -> Self {
        Self {
            gateway,
            clock: SystemClock,
            settings,
            auto_recalculate: false,
        }
    }
}

impl<G: Gateway, C: Clock> EntryLedger<G, C> {
    pub fn with_clock<C2: Clock>(self, clock: C2) -> EntryLedger<G, C2> {
        EntryLedger {
            gateway: self.gateway,
            clock,
            settings: self.settings,
            auto_recalculate: self.auto_recalculate,
        }
    }

    /// Refresh the derived columns as part of every write.
    pub fn with_auto_recalculate(mut self, enabled: bool) -> Self {
        self.auto_recalculate = enabled;
        self
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn settings(&self) -> &LedgerSettings {
        &self.settings
    }

    fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }

    fn transact<T>(&self, op: &str, f: impl FnOnce(&mut DocumentStore) -> Result<T>) -> Result<T> {
        let mut store = DocumentStore::load(&self.gateway)?;
        let value = f(&mut store)?;
        store.relabel_days(&self.settings.locale);
        if self.auto_recalculate {
            store.recalculate(self.settings.daily_target);
        }
        store.save(&self.gateway)?;
        log::info!("{}: committed, {} rows", op, store.row_count());
        Ok(value)
    }

    /// Create the timesheet if it does not exist yet. Returns whether it
    /// was created.
    pub fn init(&self) -> Result<bool> {
        if self.gateway.exists() {
            return Ok(false);
        }
        DocumentStore::empty().save(&self.gateway)?;
        log::info!("created timesheet at {}", self.gateway.location().display());
        Ok(true)
    }

    /// Replace the timesheet with an empty table.
    pub fn reset(&self) -> Result<()> {
        DocumentStore::empty().save(&self.gateway)?;
        log::info!("reset timesheet at {}", self.gateway.location().display());
        Ok(())
    }

    /// Start a new running entry now. Returns its row index.
    pub fn start_entry(&self, comment: &str, task: &str) -> Result<usize> {
        let now = self.now();
        self.transact("start", |store| {
            if let Some(running) = store.ongoing_index() {
                return Err(LedgerError::OngoingConflict(running));
            }
            let meta = Meta::from_date(now.date());
            let mut entry = Entry::new(meta, ClockTime::from_naive(now.time()));
            entry.task = task.trim().to_string();
            entry.comment = comment.trim().to_string();
            let after = store.index_not_after_meta(&meta);
            store.insert_after(after, entry)
        })
    }

    /// Stop the running entry now, merging `comment` into its comment.
    pub fn stop_entry(&self, comment: &str) -> Result<usize> {
        let now = self.now();
        self.transact("stop", |store| {
            let index = store.ongoing_index().ok_or(LedgerError::NoOngoingEntry)?;
            let entry = store.entry_mut(RowRef::At(index))?;
            let end = ClockTime::from_naive(now.time());
            let started = entry.meta.date();
            let days = (now.date() - started).num_days();
            let fits = match days {
                0 => end >= entry.start,
                1 => end < entry.start,
                _ => false,
            };
            if days < 0 || (days == 0 && !fits) {
                return Err(LedgerError::invalid(format!(
                    "Running entry starts after the current time ({} {})",
                    started.format(DATE_FORMAT),
                    entry.start
                )));
            }
            if !fits {
                return Err(LedgerError::SpansMultipleDays(started.format(DATE_FORMAT).to_string()));
            }
            entry.end = Some(end);
            entry.comment = merge_comment_text(&entry.comment, comment.trim());
            Ok(index)
        })
    }

    /// Insert a stopped entry right after row `after` (`None` = before the
    /// first row). The entry has to fit between its neighbours in time.
    pub fn insert_entry_after(&self, after: Option<usize>, new_entry: NewEntry) -> Result<usize> {
        self.transact("insert", |store| {
            if let Some(index) = after {
                store.resolve(RowRef::At(index))?;
            }
            let position = after.map_or(0, |index| index + 1);
            check_order(store, position, &new_entry.meta, position)?;
            store.insert_after(after, new_entry.into_entry())
        })
    }

    /// Backfill a full working day `offset_days` from today as a morning
    /// and an afternoon entry. Returns both row indices.
    pub fn add_full_day_entry(&self, offset_days: i64, comment: &str, task: &str) -> Result<(usize, usize)> {
        let date = self.day_at(offset_days)?;
        let meta = Meta::from_date(date);
        let full_day = self.settings.full_day;
        self.transact("fullday", |store| {
            let morning = NewEntry::new(meta, full_day.start, full_day.lunch)
                .task(task.trim())
                .comment(comment.trim());
            let afternoon = NewEntry::new(meta, full_day.resume, full_day.end)
                .task(task.trim())
                .comment(comment.trim());
            let after = store.index_before_meta(&meta);
            let first = store.insert_after(after, morning.into_entry())?;
            let second = store.insert_after(Some(first), afternoon.into_entry())?;
            Ok((first, second))
        })
    }

    /// Fold the entry after `row` into `row`.
    pub fn merge(&self, row: usize) -> Result<()> {
        let threshold = self.settings.break_threshold;
        self.transact("merge", |store| {
            let index = store.resolve(RowRef::At(row))?;
            let not_mergeable = |reason: String| LedgerError::NotMergeable { index, reason };
            if index + 1 >= store.row_count() {
                return Err(not_mergeable("it has no following entry".to_string()));
            }
            let following = store.entries()[index + 1].clone();
            let first = store.entry_mut(RowRef::At(index))?;
            let first_end = first
                .end
                .ok_or_else(|| not_mergeable("it is still running".to_string()))?;
            if !first.meta.same_day(&following.meta) {
                return Err(not_mergeable("the following entry is on another day".to_string()));
            }
            let gap = if following.start >= first_end {
                duration(first_end, following.start)
            } else {
                Minutes::ZERO
            };
            if gap > threshold {
                return Err(not_mergeable(format!(
                    "the {} break exceeds the {} threshold",
                    gap, threshold
                )));
            }

            first.end = following.end;
            first.comment = merge_comment_text(&first.comment, &following.comment);
            if first.task.is_empty() {
                first.task = following.task.clone();
            }
            store.remove(index + 1)?;
            Ok(())
        })
    }

    /// Cut `before_end` off the end of `row` into a new entry right after
    /// it. Returns the new row's index.
    pub fn split(&self, row: usize, before_end: Minutes) -> Result<usize> {
        self.transact("split", |store| {
            let index = store.resolve(RowRef::At(row))?;
            let entry = store.entry_mut(RowRef::At(index))?;
            let (end, total) = match (entry.end, entry.elapsed()) {
                (Some(end), Some(total)) => (end, total),
                _ => {
                    return Err(LedgerError::invalid(format!(
                        "Row {} is still running; stop it before splitting",
                        index
                    )))
                }
            };
            if !before_end.is_positive() || before_end >= total {
                return Err(LedgerError::invalid(format!(
                    "Split of {} must be inside the {} entry",
                    before_end, total
                )));
            }

            let cut = end.wrapping_sub(before_end);
            entry.end = Some(cut);
            let mut second = Entry::new(entry.meta, cut);
            second.end = Some(end);
            second.task = entry.task.clone();
            store.insert_after(Some(index), second)
        })
    }

    /// Remove the latest `amount` entries. Returns how many were removed.
    pub fn remove_entries(&self, amount: usize) -> Result<usize> {
        self.transact("remove", |store| Ok(store.truncate_latest(amount)))
    }

    pub fn remove_entry_by_id(&self, id: usize) -> Result<Entry> {
        self.transact("delete", |store| store.remove(id))
    }

    pub fn update_issue_number(&self, task: &str, row: RowRef) -> Result<usize> {
        self.update_column(row, Column::Task, task.trim())
    }

    pub fn append_comment(&self, comment: &str, row: RowRef, leading_space: bool) -> Result<usize> {
        self.transact("comment", |store| {
            let index = store.resolve(row)?;
            store.append_column(RowRef::At(index), Column::Comment, comment, leading_space)?;
            Ok(index)
        })
    }

    /// Overwrite one column of one row. Returns the row index.
    pub fn update_column(&self, row: RowRef, column: Column, content: &str) -> Result<usize> {
        self.transact("update", |store| {
            let index = store.resolve(row)?;
            if column == Column::Meta {
                let meta: Meta = content.parse()?;
                check_order(store, index, &meta, index + 1)?;
            }
            store.set_column(RowRef::At(index), column, content)?;
            Ok(index)
        })
    }

    /// Move the end of `row` back by `subtrahend`. Returns the new end.
    pub fn reduce_entry_time(&self, row: usize, subtrahend: Minutes) -> Result<ClockTime> {
        self.transact("reduce", |store| {
            let entry = store.entry_mut(RowRef::At(row))?;
            let (end, total) = match (entry.end, entry.elapsed()) {
                (Some(end), Some(total)) => (end, total),
                _ => return Err(LedgerError::invalid(format!("Row {} is still running", row))),
            };
            if subtrahend.get() < 0 {
                return Err(LedgerError::invalid("Cannot reduce by a negative duration"));
            }
            if subtrahend > total {
                return Err(LedgerError::invalid(format!(
                    "Reducing the {} entry by {} would leave a negative duration",
                    total, subtrahend
                )));
            }
            let new_end = end.wrapping_sub(subtrahend);
            entry.end = Some(new_end);
            Ok(new_end)
        })
    }

    /// Recompute durations, per-task and per-day sums and the balance.
    pub fn recalculate(&self) -> Result<()> {
        let target = self.settings.daily_target;
        self.transact("recalculate", |store| {
            store.recalculate(target);
            Ok(())
        })
    }

    pub fn entries(&self) -> Result<Vec<Entry>> {
        Ok(DocumentStore::load(&self.gateway)?.entries().to_vec())
    }

    pub fn ongoing(&self) -> Result<Option<(usize, Entry)>> {
        let store = DocumentStore::load(&self.gateway)?;
        Ok(store
            .ongoing_index()
            .map(|index| (index, store.entries()[index].clone())))
    }

    /// The concrete day, week or month `offset` periods from today.
    pub fn scope_filter(&self, scope: Scope, offset: i64) -> Result<ScopeFilter> {
        if scope == Scope::Invalid {
            return Err(LedgerError::invalid("Invalid scope. Use day, week or month."));
        }
        ScopeFilter::resolve(scope, offset, self.now().date()).ok_or_else(|| {
            LedgerError::invalid(format!("Offset {} is out of range for a {}", offset, scope.as_str()))
        })
    }

    /// Entries in the day, week or month `offset` periods from today.
    pub fn entries_in_scope(&self, scope: Scope, offset: i64) -> Result<Vec<(usize, Entry)>> {
        let filter = self.scope_filter(scope, offset)?;
        let store = DocumentStore::load(&self.gateway)?;
        Ok(store
            .entries()
            .iter()
            .enumerate()
            .filter(|(_, e)| filter.matches(e))
            .map(|(i, e)| (i, e.clone()))
            .collect())
    }

    pub fn issue_numbers_of_day(&self, offset_days: i64) -> Result<Vec<String>> {
        let date = self.day_at(offset_days)?;
        let store = DocumentStore::load(&self.gateway)?;
        Ok(store.issue_numbers_of_day(&date.format(DATE_FORMAT).to_string()))
    }

    /// Row a new entry stamped `meta` goes after to keep the sheet in order
    /// (`None` = before the first row).
    pub fn insertion_point(&self, meta: &Meta) -> Result<Option<usize>> {
        Ok(DocumentStore::load(&self.gateway)?.index_not_after_meta(meta))
    }

    fn day_at(&self, offset_days: i64) -> Result<NaiveDate> {
        shift_days(self.now().date(), offset_days)
            .ok_or_else(|| LedgerError::invalid(format!("Offset {} is out of range", offset_days)))
    }
}

/// Check that `meta` fits between the row before `before` and the row at
/// `next`.
fn check_order(store: &DocumentStore, before: usize, meta: &Meta, next: usize) -> Result<()> {
    let entries = store.entries();
    if let Some(prev) = before.checked_sub(1).and_then(|i| entries.get(i)) {
        if compare_meta(&prev.meta, meta) == Ordering::Greater {
            return Err(LedgerError::OrderViolation(format!(
                "{} would follow the later entry {}",
                meta, prev.meta
            )));
        }
    }
    if let Some(following) = entries.get(next) {
        if compare_meta(meta, &following.meta) == Ordering::Greater {
            return Err(LedgerError::OrderViolation(format!(
                "{} would precede the earlier entry {}",
                meta, following.meta
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryGateway;
    use crate::utils::clock::FixedClock;

    fn at(day: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, day)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn ledger() -> EntryLedger<MemoryGateway, FixedClock> {
        let ledger = EntryLedger::new(MemoryGateway::new(), LedgerSettings::default())
            .with_clock(FixedClock::new(at(16, 9, 0)));
        ledger.init().unwrap();
        ledger
    }

    fn t(s: &str) -> ClockTime {
        s.parse().unwrap()
    }

    fn meta(day: u32) -> Meta {
        Meta::from_date(NaiveDate::from_ymd_opt(2026, 10, day).unwrap())
    }

    #[test]
    fn test_missing_document_is_reported() {
        let ledger = EntryLedger::new(MemoryGateway::new(), LedgerSettings::default());
        assert!(matches!(ledger.start_entry("", ""), Err(LedgerError::NotFound(_))));
        assert_eq!(ledger.gateway().writes(), 0);
    }

    #[test]
    fn test_init_only_creates_once() {
        let ledger = ledger();
        assert!(!ledger.init().unwrap());
        assert_eq!(ledger.gateway().writes(), 1);
    }

    #[test]
    fn test_start_twice_conflicts() {
        let ledger = ledger();
        assert_eq!(ledger.start_entry("a", "").unwrap(), 0);
        let writes = ledger.gateway().writes();
        let err = ledger.start_entry("b", "").unwrap_err();
        assert!(matches!(err, LedgerError::OngoingConflict(0)));
        assert_eq!(ledger.gateway().writes(), writes);
    }

    #[test]
    fn test_stop_without_running_entry() {
        let ledger = ledger();
        assert!(matches!(ledger.stop_entry("x"), Err(LedgerError::NoOngoingEntry)));
    }

    #[test]
    fn test_labels_only_on_first_row_of_day() {
        let ledger = ledger();
        ledger.start_entry("", "").unwrap();
        ledger.clock().set(at(16, 10, 0));
        ledger.stop_entry("").unwrap();
        ledger.start_entry("", "").unwrap();

        let entries = ledger.entries().unwrap();
        assert_eq!(entries[0].date, "2026-10-16");
        assert_eq!(entries[0].weekday, "Friday");
        assert_eq!(entries[0].week, "42");
        assert!(entries[1].date.is_empty());
        assert!(entries[1].weekday.is_empty());
    }

    #[test]
    fn test_stop_across_midnight() {
        let ledger = ledger();
        ledger.clock().set(at(16, 23, 30));
        ledger.start_entry("late", "").unwrap();
        ledger.clock().set(at(17, 0, 15));
        ledger.stop_entry("").unwrap();
        let entry = &ledger.entries().unwrap()[0];
        assert_eq!(entry.elapsed(), Some(Minutes(45)));
    }

    #[test]
    fn test_stop_after_two_midnights_fails() {
        let ledger = ledger();
        ledger.start_entry("", "").unwrap();
        ledger.clock().set(at(18, 8, 0));
        assert!(matches!(ledger.stop_entry(""), Err(LedgerError::SpansMultipleDays(_))));
        ledger.clock().set(at(17, 9, 30));
        assert!(matches!(ledger.stop_entry(""), Err(LedgerError::SpansMultipleDays(_))));
        assert!(ledger.ongoing().unwrap().is_some());
    }

    #[test]
    fn test_start_after_future_backfill_keeps_order() {
        let ledger = ledger();
        ledger.add_full_day_entry(3, "holiday", "").unwrap();
        let index = ledger.start_entry("today", "").unwrap();
        assert_eq!(index, 0);
        let entries = ledger.entries().unwrap();
        assert_eq!(entries[0].meta, meta(16));
        assert_eq!(entries[1].meta, meta(19));
    }

    #[test]
    fn test_insert_entry_after_checks_order() {
        let ledger = ledger();
        ledger
            .insert_entry_after(None, NewEntry::new(meta(14), t("09:00"), t("10:00")))
            .unwrap();
        ledger
            .insert_entry_after(Some(0), NewEntry::new(meta(16), t("09:00"), t("10:00")))
            .unwrap();

        let err = ledger
            .insert_entry_after(Some(1), NewEntry::new(meta(15), t("09:00"), t("10:00")))
            .unwrap_err();
        assert!(matches!(err, LedgerError::OrderViolation(_)));
        let err = ledger
            .insert_entry_after(None, NewEntry::new(meta(15), t("09:00"), t("10:00")))
            .unwrap_err();
        assert!(matches!(err, LedgerError::OrderViolation(_)));
        let err = ledger
            .insert_entry_after(Some(5), NewEntry::new(meta(17), t("09:00"), t("10:00")))
            .unwrap_err();
        assert!(matches!(err, LedgerError::IndexOutOfRange { index: 5, .. }));

        let index = ledger
            .insert_entry_after(Some(0), NewEntry::new(meta(15), t("09:00"), t("10:00")).task("8"))
            .unwrap();
        assert_eq!(index, 1);
        let entries = ledger.entries().unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[1].task, "8");
        assert_eq!(entries[1].date, "2026-10-15");
    }

    #[test]
    fn test_full_day_goes_before_same_day_entries() {
        let ledger = ledger();
        ledger.start_entry("", "").unwrap();
        ledger.clock().set(at(16, 10, 0));
        ledger.stop_entry("").unwrap();
        ledger
            .insert_entry_after(None, NewEntry::new(meta(12), t("09:00"), t("10:00")))
            .unwrap();

        let (first, second) = ledger.add_full_day_entry(0, "training", "T-1").unwrap();
        assert_eq!((first, second), (1, 2));
        let entries = ledger.entries().unwrap();
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[1].start.to_string(), "08:00");
        assert_eq!(entries[1].end.unwrap().to_string(), "12:00");
        assert_eq!(entries[2].start.to_string(), "12:30");
        assert_eq!(entries[2].end.unwrap().to_string(), "16:30");
        assert_eq!(entries[2].task, "T-1");
        assert_eq!(entries[1].date, "2026-10-16");
        assert!(entries[3].date.is_empty());
    }

    #[test]
    fn test_merge_rejections() {
        let ledger = ledger();
        ledger
            .insert_entry_after(None, NewEntry::new(meta(15), t("09:00"), t("10:00")))
            .unwrap();
        ledger
            .insert_entry_after(Some(0), NewEntry::new(meta(15), t("11:00"), t("12:00")))
            .unwrap();
        ledger
            .insert_entry_after(Some(1), NewEntry::new(meta(16), t("12:05"), t("13:00")))
            .unwrap();

        assert!(matches!(ledger.merge(0), Err(LedgerError::NotMergeable { index: 0, .. })));
        assert!(matches!(ledger.merge(1), Err(LedgerError::NotMergeable { index: 1, .. })));
        assert!(matches!(ledger.merge(2), Err(LedgerError::NotMergeable { index: 2, .. })));
        assert!(matches!(ledger.merge(3), Err(LedgerError::IndexOutOfRange { .. })));
        assert_eq!(ledger.entries().unwrap().len(), 3);
    }

    #[test]
    fn test_merge_keeps_running_state() {
        let ledger = ledger();
        ledger
            .insert_entry_after(None, NewEntry::new(meta(16), t("08:00"), t("08:55")).task("5"))
            .unwrap();
        ledger.start_entry("cont", "").unwrap();
        ledger.merge(0).unwrap();
        let entries = ledger.entries().unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].is_ongoing());
        assert_eq!(entries[0].task, "5");
        assert_eq!(entries[0].comment, "cont");
    }

    #[test]
    fn test_split_rejections() {
        let ledger = ledger();
        ledger
            .insert_entry_after(None, NewEntry::new(meta(16), t("08:00"), t("09:00")))
            .unwrap();
        assert!(ledger.split(0, Minutes(60)).is_err());
        assert!(ledger.split(0, Minutes(0)).is_err());
        assert!(ledger.split(1, Minutes(10)).is_err());
        ledger.start_entry("", "").unwrap();
        assert!(ledger.split(1, Minutes(10)).is_err());
    }

    #[test]
    fn test_split_across_midnight() {
        let ledger = ledger();
        ledger
            .insert_entry_after(None, NewEntry::new(meta(16), t("23:00"), t("00:30")))
            .unwrap();
        let index = ledger.split(0, Minutes(45)).unwrap();
        assert_eq!(index, 1);
        let entries = ledger.entries().unwrap();
        assert_eq!(entries[0].end.unwrap().to_string(), "23:45");
        assert_eq!(entries[1].start.to_string(), "23:45");
        assert_eq!(entries[1].end.unwrap().to_string(), "00:30");
    }

    #[test]
    fn test_remove_entry_by_id() {
        let ledger = ledger();
        ledger
            .insert_entry_after(None, NewEntry::new(meta(15), t("08:00"), t("09:00")))
            .unwrap();
        ledger
            .insert_entry_after(Some(0), NewEntry::new(meta(16), t("08:00"), t("09:00")))
            .unwrap();
        let removed = ledger.remove_entry_by_id(0).unwrap();
        assert_eq!(removed.meta, meta(15));
        let entries = ledger.entries().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].date, "2026-10-16");
        assert!(matches!(
            ledger.remove_entry_by_id(1),
            Err(LedgerError::IndexOutOfRange { index: 1, len: 1 })
        ));
    }

    #[test]
    fn test_update_issue_number_and_comment_default_to_latest() {
        let ledger = ledger();
        ledger
            .insert_entry_after(None, NewEntry::new(meta(15), t("08:00"), t("09:00")))
            .unwrap();
        ledger.start_entry("first", "").unwrap();

        assert_eq!(ledger.update_issue_number("77", RowRef::Latest).unwrap(), 1);
        assert_eq!(ledger.append_comment("second", RowRef::Latest, true).unwrap(), 1);
        assert_eq!(ledger.append_comment("old", RowRef::At(0), true).unwrap(), 0);

        let entries = ledger.entries().unwrap();
        assert_eq!(entries[1].task, "77");
        assert_eq!(entries[1].comment, "first second");
        assert_eq!(entries[0].comment, "old");
    }

    #[test]
    fn test_update_column_guards_meta_order() {
        let ledger = ledger();
        ledger
            .insert_entry_after(None, NewEntry::new(meta(15), t("08:00"), t("09:00")))
            .unwrap();
        ledger
            .insert_entry_after(Some(0), NewEntry::new(meta(16), t("08:00"), t("09:00")))
            .unwrap();
        let err = ledger
            .update_column(RowRef::At(0), Column::Meta, "2026/10/43/20")
            .unwrap_err();
        assert!(matches!(err, LedgerError::OrderViolation(_)));
        ledger
            .update_column(RowRef::At(0), Column::Meta, "2026/10/42/14")
            .unwrap();
        assert_eq!(ledger.entries().unwrap()[0].date, "2026-10-14");
    }

    #[test]
    fn test_reduce_entry_time() {
        let ledger = ledger();
        ledger
            .insert_entry_after(None, NewEntry::new(meta(16), t("08:00"), t("09:00")))
            .unwrap();
        assert_eq!(ledger.reduce_entry_time(0, Minutes(20)).unwrap().to_string(), "08:40");
        assert!(ledger.reduce_entry_time(0, Minutes(41)).is_err());
        assert!(ledger.reduce_entry_time(0, Minutes(-5)).is_err());
        assert_eq!(ledger.reduce_entry_time(0, Minutes(40)).unwrap().to_string(), "08:00");
        ledger.start_entry("", "").unwrap();
        assert!(ledger.reduce_entry_time(1, Minutes(1)).is_err());
    }

    #[test]
    fn test_auto_recalculate() {
        let ledger = ledger().with_auto_recalculate(true);
        ledger.start_entry("", "").unwrap();
        ledger.clock().set(at(16, 9, 45));
        ledger.stop_entry("").unwrap();
        let entries = ledger.entries().unwrap();
        assert_eq!(entries[0].duration, "0:45");
        assert_eq!(entries[0].sum_day, "0:45");
        assert_eq!(entries[0].balance, "-7:15");
    }

    #[test]
    fn test_reset() {
        let ledger = ledger();
        ledger.start_entry("", "").unwrap();
        ledger.reset().unwrap();
        assert!(ledger.entries().unwrap().is_empty());
        assert!(ledger.ongoing().unwrap().is_none());
    }

    #[test]
    fn test_scope_queries() {
        let ledger = ledger();
        ledger
            .insert_entry_after(None, NewEntry::new(meta(9), t("08:00"), t("09:00")).task("1"))
            .unwrap();
        ledger
            .insert_entry_after(Some(0), NewEntry::new(meta(15), t("08:00"), t("09:00")).task("2"))
            .unwrap();
        ledger
            .insert_entry_after(Some(1), NewEntry::new(meta(16), t("08:00"), t("09:00")).task("3"))
            .unwrap();

        let today = ledger.entries_in_scope(Scope::Day, 0).unwrap();
        assert_eq!(today.len(), 1);
        assert_eq!(today[0].0, 2);
        assert_eq!(ledger.entries_in_scope(Scope::Week, 0).unwrap().len(), 2);
        assert_eq!(ledger.entries_in_scope(Scope::Week, -1).unwrap().len(), 1);
        assert_eq!(ledger.entries_in_scope(Scope::Month, 0).unwrap().len(), 3);
        assert!(ledger.entries_in_scope(Scope::Invalid, 0).is_err());

        assert_eq!(ledger.issue_numbers_of_day(-1).unwrap(), vec!["2"]);
        assert!(ledger.issue_numbers_of_day(1).unwrap().is_empty());
    }

    #[test]
    fn test_offsets_outside_calendar_are_rejected() {
        let ledger = ledger();
        let writes = ledger.gateway().writes();

        for offset in [i64::MAX / 2, 10_000_000_000, i64::MIN] {
            assert!(matches!(
                ledger.add_full_day_entry(offset, "", ""),
                Err(LedgerError::InvalidArgument(_))
            ));
            assert!(matches!(
                ledger.issue_numbers_of_day(offset),
                Err(LedgerError::InvalidArgument(_))
            ));
        }
        assert!(matches!(
            ledger.entries_in_scope(Scope::Week, i64::MAX / 4),
            Err(LedgerError::InvalidArgument(_))
        ));
        assert!(matches!(
            ledger.entries_in_scope(Scope::Month, 1 << 32),
            Err(LedgerError::InvalidArgument(_))
        ));
        assert_eq!(ledger.gateway().writes(), writes);
        assert!(ledger.entries().unwrap().is_empty());
    }

    #[test]
    fn test_scope_filter() {
        let ledger = ledger();
        assert_eq!(ledger.scope_filter(Scope::Week, 0).unwrap().label(), "2026-W42");
        assert_eq!(ledger.scope_filter(Scope::Month, -10).unwrap().label(), "2025-12");
        let invalid = ledger.scope_filter(Scope::Invalid, 0).unwrap_err();
        assert!(invalid.to_string().contains("Invalid scope"));
        let far = ledger.scope_filter(Scope::Day, 10_000_000_000).unwrap_err();
        assert!(far.to_string().contains("out of range"));
    }

    #[test]
    fn test_insertion_point() {
        let ledger = ledger();
        assert_eq!(ledger.insertion_point(&meta(16)).unwrap(), None);
        ledger
            .insert_entry_after(None, NewEntry::new(meta(12), t("09:00"), t("10:00")))
            .unwrap();
        ledger
            .insert_entry_after(Some(0), NewEntry::new(meta(14), t("09:00"), t("10:00")))
            .unwrap();

        assert_eq!(ledger.insertion_point(&meta(11)).unwrap(), None);
        assert_eq!(ledger.insertion_point(&meta(12)).unwrap(), Some(0));
        assert_eq!(ledger.insertion_point(&meta(13)).unwrap(), Some(0));
        assert_eq!(ledger.insertion_point(&meta(20)).unwrap(), Some(1));
    }

    #[test]
    fn test_structural_error_aborts_without_write() {
        let gateway = MemoryGateway::with_content("<html><table><tr><th>Meta</th></tr><tr><td>x</td></tr></table>");
        let ledger = EntryLedger::new(&gateway, LedgerSettings::default());
        let err = ledger.start_entry("", "").unwrap_err();
        assert!(err.is_internal());
        assert_eq!(gateway.writes(), 0);
    }
}
