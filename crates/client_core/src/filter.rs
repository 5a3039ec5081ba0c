//! In-memory filtering of design and apply lists.

use std::time::{Duration, Instant};

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use shared::domain::{ApplyRecord, ApplyStatus, DesignRecord, DesignStatus, RollbackStatus};

pub const ID_FILTER_DEBOUNCE: Duration = Duration::from_millis(200);

/// Inclusive range; an unset side is unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn new(from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Self {
        Self { from, to }
    }

    pub fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    pub fn contains(&self, value: Option<DateTime<Utc>>) -> bool {
        if self.is_unbounded() {
            return true;
        }
        let Some(value) = value else {
            return false;
        };
        self.from.map_or(true, |from| value >= from) && self.to.map_or(true, |to| value <= to)
    }

    /// Parses operator input. A bare date covers the whole day on its side of
    /// the range.
    pub fn parse(from: Option<&str>, to: Option<&str>) -> Result<Self, String> {
        let from = from.map(|raw| parse_bound(raw, false)).transpose()?;
        let to = to.map(|raw| parse_bound(raw, true)).transpose()?;
        if let (Some(from), Some(to)) = (from, to) {
            if from > to {
                return Err(format!("range start {from} is after range end {to}"));
            }
        }
        Ok(Self { from, to })
    }
}

fn parse_bound(raw: &str, end_of_day: bool) -> Result<DateTime<Utc>, String> {
    let raw = raw.trim();
    if let Ok(value) = DateTime::parse_from_rfc3339(raw) {
        return Ok(value.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y/%m/%d"))
        .map_err(|_| format!("invalid date `{raw}`; expected YYYY-MM-DD or RFC 3339"))?;
    let naive = if end_of_day {
        date.and_hms_nano_opt(23, 59, 59, 999_999_999)
    } else {
        date.and_hms_opt(0, 0, 0)
    }
    .ok_or_else(|| format!("invalid date `{raw}`"))?;
    Ok(Utc.from_utc_datetime(&naive))
}

pub fn matches_id(id: &str, query: &str) -> bool {
    let query = query.trim();
    query.is_empty() || id.contains(query)
}

/// Membership test where an empty selection accepts everything.
pub fn matches_any<T: PartialEq>(value: &T, selected: &[T]) -> bool {
    selected.is_empty() || selected.contains(value)
}

pub fn matches_optional<T: PartialEq>(value: Option<&T>, selected: &[T]) -> bool {
    if selected.is_empty() {
        return true;
    }
    value.is_some_and(|value| selected.contains(value))
}

pub trait RecordFilter {
    type Record;

    fn matches(&self, record: &Self::Record) -> bool;
    fn set_id_query(&mut self, query: String);
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplyFilter {
    pub id: String,
    pub status: Vec<ApplyStatus>,
    pub rollback_status: Vec<RollbackStatus>,
    pub started_at: DateRange,
    pub ended_at: DateRange,
}

impl RecordFilter for ApplyFilter {
    type Record = ApplyRecord;

    fn matches(&self, record: &ApplyRecord) -> bool {
        matches_id(record.id.as_str(), &self.id)
            && matches_any(&record.status, &self.status)
            && matches_optional(record.rollback_status.as_ref(), &self.rollback_status)
            && self.started_at.contains(record.started_at)
            && self.ended_at.contains(record.ended_at)
    }

    fn set_id_query(&mut self, query: String) {
        self.id = query;
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DesignFilter {
    pub id: String,
    pub status: Vec<DesignStatus>,
    pub started_at: DateRange,
    pub ended_at: DateRange,
}

impl RecordFilter for DesignFilter {
    type Record = DesignRecord;

    fn matches(&self, record: &DesignRecord) -> bool {
        matches_id(record.id.as_str(), &self.id)
            && matches_any(&record.status, &self.status)
            && self.started_at.contains(record.started_at)
            && self.ended_at.contains(record.ended_at)
    }

    fn set_id_query(&mut self, query: String) {
        self.id = query;
    }
}

pub fn filter_records<'a, F: RecordFilter>(
    records: &'a [F::Record],
    filter: &F,
) -> Vec<&'a F::Record> {
    records.iter().filter(|record| filter.matches(record)).collect()
}

/// Holds the latest input and releases it once it has been stable for the
/// configured delay.
#[derive(Debug, Clone)]
pub struct Debounced<T> {
    settled: T,
    pending: Option<(T, Instant)>,
    delay: Duration,
}

impl<T> Debounced<T> {
    pub fn new(initial: T, delay: Duration) -> Self {
        Self {
            settled: initial,
            pending: None,
            delay,
        }
    }

    pub fn set(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now + self.delay));
    }

    /// Returns true when a pending value was released.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.pending.take() {
            Some((value, due)) if now >= due => {
                self.settled = value;
                true
            }
            other => {
                self.pending = other;
                false
            }
        }
    }

    pub fn value(&self) -> &T {
        &self.settled
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

/// Record list plus filter; the visible subset is recomputed on every change.
pub struct FilteredList<F: RecordFilter> {
    records: Vec<F::Record>,
    filter: F,
    id_input: Debounced<String>,
    visible: Vec<usize>,
}

impl<F: RecordFilter> FilteredList<F> {
    pub fn new(filter: F) -> Self {
        Self {
            records: Vec::new(),
            filter,
            id_input: Debounced::new(String::new(), ID_FILTER_DEBOUNCE),
            visible: Vec::new(),
        }
    }

    pub fn set_records(&mut self, records: Vec<F::Record>) {
        self.records = records;
        self.recompute();
    }

    pub fn update_filter(&mut self, update: impl FnOnce(&mut F)) {
        update(&mut self.filter);
        self.recompute();
    }

    /// Buffers an id query; it takes effect on the first `tick` after the
    /// debounce delay.
    pub fn input_id(&mut self, query: impl Into<String>, now: Instant) {
        self.id_input.set(query.into(), now);
    }

    pub fn tick(&mut self, now: Instant) -> bool {
        if !self.id_input.poll(now) {
            return false;
        }
        let query = self.id_input.value().clone();
        self.filter.set_id_query(query);
        self.recompute();
        true
    }

    pub fn filter(&self) -> &F {
        &self.filter
    }

    pub fn records(&self) -> &[F::Record] {
        &self.records
    }

    pub fn visible(&self) -> impl Iterator<Item = &F::Record> + '_ {
        self.visible.iter().map(|index| &self.records[*index])
    }

    pub fn visible_len(&self) -> usize {
        self.visible.len()
    }

    fn recompute(&mut self) {
        self.visible = self
            .records
            .iter()
            .enumerate()
            .filter(|(_, record)| self.filter.matches(record))
            .map(|(index, _)| index)
            .collect();
    }
}

#[cfg(test)]
#[path = "tests/filter_tests.rs"]
mod tests;
