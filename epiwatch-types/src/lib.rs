//! # epiwatch-types
//!
//! Row and summary types for the epiwatch epidemic dataset toolkit.
//!
//! - **Row types**: `CaseRecord`, `Counts`
//! - **Summary types**: `RegionSummary`, `DiseaseSummary`, `RegionCases`, `Hotspot`
//!
//! All types are serializable with Serde. Coordinates use the `geo` crate's
//! `Point` with longitude as x and latitude as y.
//!
//! ## Examples
//!
//! ```rust
//! use epiwatch_types::record::{CaseRecord, Counts};
//! use chrono::NaiveDate;
//!
//! let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
//! let record = CaseRecord::new(date, "North", "Influenza", Counts::new(12, 4, 1));
//! assert!(record.location.is_none());
//! ```

pub mod record;
pub mod summary;
