use crate::record::Counts;
use geo::Point;
use serde::{Deserialize, Serialize};

/// Totals for one region across every row of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionSummary {
    pub region: String,
    pub totals: Counts,
}

/// New cases for one disease.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiseaseSummary {
    pub disease: String,
    pub new_cases: i64,
}

/// New cases for one region inside a single replay window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionCases {
    pub region: String,
    pub new_cases: i64,
}

/// A point on the map: new cases summed per region and coordinate pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hotspot {
    pub region: String,
    pub location: Point<f64>,
    pub new_cases: i64,
}

impl Hotspot {
    pub fn latitude(&self) -> f64 {
        self.location.y()
    }

    pub fn longitude(&self) -> f64 {
        self.location.x()
    }
}
