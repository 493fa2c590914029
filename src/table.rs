//! The in-memory epidemic table.
//!
//! A `Table` is an immutable, ordered snapshot of rows. Filtering produces a
//! new table; the original is never mutated, so clones are cheap and a replay
//! can hold one while the caller builds the next.

use chrono::NaiveDate;
use epiwatch_types::record::CaseRecord;
use rustc_hash::FxHashSet;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Table {
    rows: Arc<[CaseRecord]>,
    has_coordinates: bool,
}

impl Table {
    /// Build a table from rows in their source order.
    ///
    /// `has_coordinates` records whether the source carried both the
    /// `latitude` and `longitude` columns, independent of whether any given
    /// row has values for them.
    pub fn new(rows: Vec<CaseRecord>, has_coordinates: bool) -> Self {
        Self {
            rows: rows.into(),
            has_coordinates,
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), false)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[CaseRecord] {
        &self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CaseRecord> {
        self.rows.iter()
    }

    pub fn has_coordinates(&self) -> bool {
        self.has_coordinates
    }

    /// Distinct regions in first-seen order.
    pub fn regions(&self) -> Vec<String> {
        distinct(self.rows.iter().map(|r| r.region.as_str()))
    }

    /// Distinct diseases in first-seen order.
    pub fn diseases(&self) -> Vec<String> {
        distinct(self.rows.iter().map(|r| r.disease.as_str()))
    }

    /// Earliest and latest calendar day present, or `None` for an empty table.
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let mut days = self.rows.iter().map(CaseRecord::day);
        let first = days.next()?;
        Some(days.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d))))
    }

    /// Keep the rows matching `predicate`, preserving their order.
    pub fn retain<F>(&self, mut predicate: F) -> Table
    where
        F: FnMut(&CaseRecord) -> bool,
    {
        let rows: Vec<CaseRecord> = self.rows.iter().filter(|r| predicate(r)).cloned().collect();
        Table::new(rows, self.has_coordinates)
    }
}

impl<'a> IntoIterator for &'a Table {
    type Item = &'a CaseRecord;
    type IntoIter = std::slice::Iter<'a, CaseRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = FxHashSet::default();
    let mut out = Vec::new();
    for value in values {
        if seen.insert(value) {
            out.push(value.to_string());
        }
    }
    out
}
