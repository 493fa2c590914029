//! Embedded SQL query store.
//!
//! Holds a single registered table named `data` and runs read-only SQL
//! (SQLite dialect) against it. The store is an owned value: create one with
//! [`StoreBuilder`] and pass it to whatever needs it.
//!
//! ```rust
//! use epiwatch::{QueryStore, Table};
//!
//! let store = QueryStore::memory()?;
//! store.register_table(&Table::empty())?;
//! let result = store.run_query("SELECT COUNT(*) AS n FROM data")?;
//! assert_eq!(result.rows[0][0].as_i64(), Some(0));
//! # Ok::<(), epiwatch::EpiError>(())
//! ```

mod builder;
mod result;

pub use builder::StoreBuilder;
pub use result::{Cell, QueryResult};

use crate::error::{EpiError, Result};
use crate::table::Table;
use parking_lot::Mutex;
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, Transaction, params};

/// Name of the logical table queries run against.
pub const TABLE_NAME: &str = "data";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Query store over one embedded database connection.
///
/// Registration and queries each hold the connection lock for their whole
/// duration, so a query never observes a half-replaced table.
pub struct QueryStore {
    conn: Mutex<Connection>,
}

impl QueryStore {
    pub fn builder() -> StoreBuilder {
        StoreBuilder::new()
    }

    /// Create an in-memory store.
    pub fn memory() -> Result<Self> {
        StoreBuilder::new().build()
    }

    pub(crate) fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Replace whatever is registered as `data` with the rows of `table`.
    ///
    /// A previous registration may have left either a table or a view named
    /// `data` behind (the latter when an earlier run was interrupted); either
    /// one is dropped first. The drop, create and inserts share a single
    /// transaction, so on error the previous registration stays visible.
    pub fn register_table(&self, table: &Table) -> Result<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        drop_existing(&tx)?;
        tx.execute_batch(&create_table_sql(table.has_coordinates()))?;
        insert_rows(&tx, table)?;
        tx.commit()?;

        log::info!(
            "Registered {} rows as '{}' in the query store",
            table.len(),
            TABLE_NAME
        );
        Ok(())
    }

    /// Run a read-only statement and collect its full result.
    ///
    /// Engine errors are returned as [`EpiError::Query`] with the engine's
    /// message untouched. Statements that would write are refused with
    /// [`EpiError::ReadOnly`] before they run.
    pub fn run_query(&self, sql: &str) -> Result<QueryResult> {
        if sql.trim().is_empty() {
            return Err(EpiError::InvalidInput("Query is empty".to_string()));
        }

        let conn = self.conn.lock();
        let mut stmt = conn.prepare(sql)?;
        if !stmt.readonly() {
            return Err(EpiError::ReadOnly(sql.trim().to_string()));
        }

        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let width = columns.len();

        let mut rows = Vec::new();
        let mut cursor = stmt.query([])?;
        while let Some(row) = cursor.next()? {
            let mut cells = Vec::with_capacity(width);
            for idx in 0..width {
                cells.push(Cell::from(row.get::<_, Value>(idx)?));
            }
            rows.push(cells);
        }

        log::debug!("Query returned {} rows", rows.len());
        Ok(QueryResult { columns, rows })
    }

    /// Row count of the registered table, or `None` if nothing is registered.
    pub fn registered_rows(&self) -> Result<Option<usize>> {
        let conn = self.conn.lock();
        let kind: Option<String> = conn
            .query_row(
                "SELECT type FROM sqlite_master WHERE name = ?1",
                [TABLE_NAME],
                |row| row.get(0),
            )
            .optional()?;
        if kind.is_none() {
            return Ok(None);
        }

        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM \"{}\"", TABLE_NAME),
            [],
            |row| row.get(0),
        )?;
        Ok(Some(count as usize))
    }
}

fn drop_existing(tx: &Transaction<'_>) -> Result<()> {
    let kind: Option<String> = tx
        .query_row(
            "SELECT type FROM sqlite_master WHERE name = ?1 AND type IN ('table', 'view')",
            [TABLE_NAME],
            |row| row.get(0),
        )
        .optional()?;

    match kind.as_deref() {
        Some("table") => {
            log::debug!("Dropping previously registered table '{}'", TABLE_NAME);
            tx.execute_batch(&format!("DROP TABLE \"{}\"", TABLE_NAME))?;
        }
        Some("view") => {
            log::warn!(
                "Found leftover view '{}' from an interrupted registration; dropping it",
                TABLE_NAME
            );
            tx.execute_batch(&format!("DROP VIEW \"{}\"", TABLE_NAME))?;
        }
        _ => {}
    }
    Ok(())
}

fn create_table_sql(with_coordinates: bool) -> String {
    let coordinates = if with_coordinates {
        ",\n    latitude REAL,\n    longitude REAL"
    } else {
        ""
    };
    format!(
        "CREATE TABLE \"{}\" (
    date TEXT NOT NULL,
    region TEXT NOT NULL,
    disease TEXT NOT NULL,
    new_cases INTEGER NOT NULL,
    recovered INTEGER NOT NULL,
    deaths INTEGER NOT NULL{}
)",
        TABLE_NAME, coordinates
    )
}

fn insert_rows(tx: &Transaction<'_>, table: &Table) -> Result<()> {
    if table.has_coordinates() {
        let mut stmt = tx.prepare(&format!(
            "INSERT INTO \"{}\" (date, region, disease, new_cases, recovered, deaths, latitude, longitude)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            TABLE_NAME
        ))?;
        for row in table {
            stmt.execute(params![
                row.date.format(TIMESTAMP_FORMAT).to_string(),
                row.region,
                row.disease,
                row.counts.new_cases,
                row.counts.recovered,
                row.counts.deaths,
                row.latitude(),
                row.longitude(),
            ])?;
        }
    } else {
        let mut stmt = tx.prepare(&format!(
            "INSERT INTO \"{}\" (date, region, disease, new_cases, recovered, deaths)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            TABLE_NAME
        ))?;
        for row in table {
            stmt.execute(params![
                row.date.format(TIMESTAMP_FORMAT).to_string(),
                row.region,
                row.disease,
                row.counts.new_cases,
                row.counts.recovered,
                row.counts.deaths,
            ])?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::tests::sample_table;

    #[test]
    fn test_query_registered_rows() {
        let store = QueryStore::memory().unwrap();
        store.register_table(&sample_table(6)).unwrap();

        let result = store
            .run_query("SELECT region, SUM(new_cases) AS total FROM data GROUP BY region ORDER BY region")
            .unwrap();
        assert_eq!(result.columns, vec!["region", "total"]);
        assert_eq!(result.len(), 3);
        // East holds rows 2 and 5
        assert_eq!(result.rows[0][0].as_str(), Some("East"));
        assert_eq!(result.rows[0][1].as_i64(), Some(7));
    }

    #[test]
    fn test_dates_stored_as_text() {
        let store = QueryStore::memory().unwrap();
        store.register_table(&sample_table(2)).unwrap();
        let result = store.run_query("SELECT date FROM data LIMIT 1").unwrap();
        assert_eq!(result.rows[0][0].as_str(), Some("2024-01-01 00:00:00"));
    }

    #[test]
    fn test_reregister_replaces_rows() {
        let store = QueryStore::memory().unwrap();
        store.register_table(&sample_table(10)).unwrap();
        store.register_table(&sample_table(3)).unwrap();
        assert_eq!(store.registered_rows().unwrap(), Some(3));
    }

    #[test]
    fn test_leftover_view_is_replaced() {
        let store = QueryStore::memory().unwrap();
        store
            .conn
            .lock()
            .execute_batch("CREATE VIEW data AS SELECT 1 AS stale")
            .unwrap();

        store.register_table(&sample_table(4)).unwrap();
        let result = store.run_query("SELECT * FROM data").unwrap();
        assert_eq!(result.len(), 4);
        assert!(result.column_index("stale").is_none());
    }

    #[test]
    fn test_engine_error_passes_through() {
        let store = QueryStore::memory().unwrap();
        store.register_table(&sample_table(1)).unwrap();

        let err = store.run_query("SELECT nope FROM data").unwrap_err();
        assert!(matches!(err, EpiError::Query(_)));
        assert!(err.to_string().contains("no such column: nope"));
    }

    #[test]
    fn test_writes_are_refused() {
        let store = QueryStore::memory().unwrap();
        store.register_table(&sample_table(2)).unwrap();

        let err = store.run_query("DELETE FROM data").unwrap_err();
        assert!(matches!(err, EpiError::ReadOnly(_)));
        assert_eq!(store.registered_rows().unwrap(), Some(2));
    }

    #[test]
    fn test_empty_query_rejected() {
        let store = QueryStore::memory().unwrap();
        assert!(matches!(
            store.run_query("   "),
            Err(EpiError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_coordinate_columns_follow_table() {
        let store = QueryStore::memory().unwrap();
        store.register_table(&sample_table(2)).unwrap();
        assert!(store.run_query("SELECT latitude FROM data").is_err());
    }
}
