//! Categorical and date-range filtering.
//!
//! An empty region or disease selection matches everything, mirroring a
//! cleared multiselect falling back to all values.

use crate::table::Table;
use chrono::NaiveDate;
use epiwatch_types::record::CaseRecord;
use rustc_hash::FxHashSet;

/// Row predicate over region, disease and calendar day.
///
/// # Examples
///
/// ```
/// use epiwatch::Filter;
/// use chrono::NaiveDate;
///
/// let filter = Filter::new()
///     .regions(["North", "East"])
///     .date_range(
///         NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
///         NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
///     );
/// assert!(!filter.is_unrestricted());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    regions: Vec<String>,
    diseases: Vec<String>,
    date_range: Option<(NaiveDate, NaiveDate)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn regions<I, S>(mut self, regions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.regions = regions.into_iter().map(Into::into).collect();
        self
    }

    pub fn diseases<I, S>(mut self, diseases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.diseases = diseases.into_iter().map(Into::into).collect();
        self
    }

    /// Inclusive day range. A reversed range is swapped.
    pub fn date_range(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.date_range = Some(if start <= end {
            (start, end)
        } else {
            (end, start)
        });
        self
    }

    pub fn selected_regions(&self) -> &[String] {
        &self.regions
    }

    pub fn selected_diseases(&self) -> &[String] {
        &self.diseases
    }

    pub fn selected_dates(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.date_range
    }

    /// True when every row passes.
    pub fn is_unrestricted(&self) -> bool {
        self.regions.is_empty() && self.diseases.is_empty() && self.date_range.is_none()
    }

    /// Produce a new table with the matching rows in their original order.
    pub fn apply(&self, table: &Table) -> Table {
        if self.is_unrestricted() {
            return table.clone();
        }

        let regions: FxHashSet<&str> = self.regions.iter().map(String::as_str).collect();
        let diseases: FxHashSet<&str> = self.diseases.iter().map(String::as_str).collect();

        let filtered = table.retain(|row| {
            (regions.is_empty() || regions.contains(row.region.as_str()))
                && (diseases.is_empty() || diseases.contains(row.disease.as_str()))
                && self.in_range(row)
        });

        log::debug!("Filter kept {} of {} rows", filtered.len(), table.len());
        filtered
    }

    fn in_range(&self, row: &CaseRecord) -> bool {
        match self.date_range {
            Some((start, end)) => {
                let day = row.day();
                start <= day && day <= end
            }
            None => true,
        }
    }
}

impl Table {
    /// Shorthand for [`Filter::apply`].
    pub fn filter(&self, filter: &Filter) -> Table {
        filter.apply(self)
    }
}
