use chrono::{NaiveDate, NaiveDateTime};
use geo::Point;
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign};

/// Case counts reported for one region, disease and date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counts {
    pub new_cases: i64,
    pub recovered: i64,
    pub deaths: i64,
}

impl Counts {
    pub fn new(new_cases: i64, recovered: i64, deaths: i64) -> Self {
        Self {
            new_cases,
            recovered,
            deaths,
        }
    }
}

/// Sums saturate at the `i64` bounds rather than wrapping.
impl Add for Counts {
    type Output = Counts;

    fn add(self, rhs: Counts) -> Counts {
        Counts {
            new_cases: self.new_cases.saturating_add(rhs.new_cases),
            recovered: self.recovered.saturating_add(rhs.recovered),
            deaths: self.deaths.saturating_add(rhs.deaths),
        }
    }
}

impl AddAssign for Counts {
    fn add_assign(&mut self, rhs: Counts) {
        *self = *self + rhs;
    }
}

/// One row of the epidemic dataset.
///
/// `location` is only populated when the source carried both a latitude and a
/// longitude for the row. The point stores longitude as x and latitude as y.
///
/// # Examples
///
/// ```
/// use epiwatch_types::record::{CaseRecord, Counts};
/// use chrono::NaiveDate;
/// use geo::Point;
///
/// let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap().and_hms_opt(0, 0, 0).unwrap();
/// let record = CaseRecord::new(date, "Lagos", "Cholera", Counts::new(30, 10, 2))
///     .with_location(Point::new(3.3792, 6.5244));
///
/// assert_eq!(record.latitude(), Some(6.5244));
/// assert_eq!(record.longitude(), Some(3.3792));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseRecord {
    pub date: NaiveDateTime,
    pub region: String,
    pub disease: String,
    pub counts: Counts,
    pub location: Option<Point<f64>>,
}

impl CaseRecord {
    pub fn new(
        date: NaiveDateTime,
        region: impl Into<String>,
        disease: impl Into<String>,
        counts: Counts,
    ) -> Self {
        Self {
            date,
            region: region.into(),
            disease: disease.into(),
            counts,
            location: None,
        }
    }

    pub fn with_location(mut self, location: Point<f64>) -> Self {
        self.location = Some(location);
        self
    }

    /// Calendar day of the row, ignoring the time of day.
    pub fn day(&self) -> NaiveDate {
        self.date.date()
    }

    pub fn latitude(&self) -> Option<f64> {
        self.location.map(|p| p.y())
    }

    pub fn longitude(&self) -> Option<f64> {
        self.location.map(|p| p.x())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_accumulate() {
        let mut total = Counts::default();
        total += Counts::new(3, 1, 0);
        total += Counts::new(7, 2, 1);
        assert_eq!(total, Counts::new(10, 3, 1));
    }

    #[test]
    fn counts_saturate_instead_of_overflowing() {
        let huge = Counts::new(i64::MAX - 1, 9_000_000_000_000_000_000, 1);
        let total = huge + huge;
        assert_eq!(total, Counts::new(i64::MAX, i64::MAX, 2));

        let low = Counts::new(i64::MIN, 0, 0) + Counts::new(-5, 0, 0);
        assert_eq!(low.new_cases, i64::MIN);
    }

    #[test]
    fn record_serializes_with_location() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap();
        let record = CaseRecord::new(date, "East", "Measles", Counts::new(5, 0, 0))
            .with_location(Point::new(10.0, 20.0));

        let json = serde_json::to_string(&record).unwrap();
        let back: CaseRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
        assert_eq!(back.day(), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    }
}
