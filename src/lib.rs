//! Epidemic case-count dashboard core: loading, filtering, aggregation,
//! ad-hoc SQL, and paced window replay of a static dataset.
//!
//! ## Features
//! - **Loading**: delimited text with a `date` column parsed to timestamps and
//!   optional `latitude`/`longitude` columns
//! - **Filtering**: by region, disease and inclusive date range; empty
//!   selections match everything
//! - **Aggregation**: per-region and per-disease totals, map hotspots with
//!   GeoJSON export
//! - **Query store**: the unfiltered table registered as `data` in an embedded
//!   SQL engine, queried read-only
//! - **Replay**: the filtered rows cut into fixed-size windows delivered with a
//!   cancellable delay between them, simulating a live feed
//!
//! ```rust
//! use epiwatch::{Filter, QueryStore, ReplayConfig};
//! use epiwatch::loader::DatasetLoader;
//! use epiwatch::replay::ReplayEngine;
//! use std::time::Duration;
//!
//! let csv = "\
//! date,region,disease,new_cases,recovered,deaths
//! 2024-01-01,North,Influenza,10,2,0
//! 2024-01-02,South,Dengue,5,1,1
//! 2024-01-03,North,Dengue,7,3,0
//! ";
//! let table = DatasetLoader::new().read(csv.as_bytes())?;
//!
//! let store = QueryStore::memory()?;
//! store.register_table(&table)?;
//! let totals = store.run_query("SELECT SUM(new_cases) FROM data")?;
//! assert_eq!(totals.rows[0][0].as_i64(), Some(22));
//!
//! let north = table.filter(&Filter::new().regions(["North"]));
//! let engine = ReplayEngine::new(ReplayConfig::new(1, Duration::ZERO))?;
//! let sizes: Vec<usize> = engine.replay(&north).map(|w| w.len()).collect();
//! assert_eq!(sizes, vec![1, 1]);
//! # Ok::<(), epiwatch::EpiError>(())
//! ```

pub mod aggregate;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod filter;
pub mod loader;
pub mod replay;
pub mod store;
pub mod table;

pub use config::{Config, ReplayConfig, StoreConfig};
pub use dashboard::{Dashboard, DashboardView, Presenter, RunSummary, TextPresenter};
pub use error::{EpiError, Result};
pub use filter::Filter;
pub use loader::{DatasetLoader, load_csv};
pub use replay::{CancelToken, Replay, ReplayEngine, Window};
pub use store::{Cell, QueryResult, QueryStore, StoreBuilder};
pub use table::Table;

pub use aggregate::MapView;
pub use epiwatch_types::record::{CaseRecord, Counts};
pub use epiwatch_types::summary::{DiseaseSummary, Hotspot, RegionCases, RegionSummary};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {
    pub use crate::{Config, EpiError, ReplayConfig, Result};

    pub use crate::{CaseRecord, Counts, Filter, Table};

    pub use crate::{CancelToken, ReplayEngine, Window};

    pub use crate::{Dashboard, Presenter, QueryStore, StoreBuilder};

    pub use std::time::Duration;
}
