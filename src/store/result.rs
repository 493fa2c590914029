use crate::error::Result;
use rusqlite::types::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One value in a query result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Cell {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Cell::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Integer(v) => Some(*v as f64),
            Cell::Real(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Cell::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }
}

impl From<Value> for Cell {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Cell::Null,
            Value::Integer(v) => Cell::Integer(v),
            Value::Real(v) => Cell::Real(v),
            Value::Text(v) => Cell::Text(v),
            Value::Blob(v) => Cell::Blob(v),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => f.write_str("NULL"),
            Cell::Integer(v) => write!(f, "{}", v),
            Cell::Real(v) => write!(f, "{}", v),
            Cell::Text(v) => f.write_str(v),
            Cell::Blob(v) => write!(f, "<{} bytes>", v.len()),
        }
    }
}

/// Column names plus rows of cells, in the order the engine returned them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl QueryResult {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// All values of one column, top to bottom.
    pub fn column(&self, name: &str) -> Option<Vec<&Cell>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().filter_map(|row| row.get(idx)).collect())
    }

    /// Serialize as `{"columns": [...], "rows": [[...], ...]}` with plain JSON values.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Renders as a left-aligned text grid.
impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| row.iter().map(ToString::to_string).collect())
            .collect();

        let mut widths: Vec<usize> = self.columns.iter().map(|c| c.chars().count()).collect();
        for row in &rendered {
            for (i, cell) in row.iter().enumerate() {
                if let Some(w) = widths.get_mut(i) {
                    *w = (*w).max(cell.chars().count());
                }
            }
        }

        write_line(f, &self.columns, &widths)?;
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        writeln!(f, "{}", rule.join("-+-"))?;
        for row in &rendered {
            write_line(f, row, &widths)?;
        }
        write!(f, "({} rows)", self.rows.len())
    }
}

fn write_line(f: &mut fmt::Formatter<'_>, cells: &[String], widths: &[usize]) -> fmt::Result {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(c, w)| format!("{:<width$}", c, width = *w))
        .collect();
    writeln!(f, "{}", padded.join(" | ").trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_grid() {
        let result = QueryResult {
            columns: vec!["region".into(), "total".into()],
            rows: vec![
                vec![Cell::Text("North".into()), Cell::Integer(12)],
                vec![Cell::Text("S".into()), Cell::Null],
            ],
        };
        let text = result.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "region | total");
        assert_eq!(lines[1], "-------+------");
        assert_eq!(lines[2], "North  | 12");
        assert_eq!(lines[3], "S      | NULL");
        assert_eq!(lines[4], "(2 rows)");
    }

    #[test]
    fn test_column_lookup() {
        let result = QueryResult {
            columns: vec!["a".into(), "b".into()],
            rows: vec![vec![Cell::Integer(1), Cell::Real(2.5)]],
        };
        assert_eq!(result.column_index("b"), Some(1));
        assert_eq!(result.column("b").unwrap()[0].as_f64(), Some(2.5));
        assert!(result.column("missing").is_none());
    }

    #[test]
    fn test_to_json_uses_plain_values() {
        let result = QueryResult {
            columns: vec!["region".into(), "total".into()],
            rows: vec![vec![Cell::Text("North".into()), Cell::Null]],
        };
        assert_eq!(
            result.to_json().unwrap(),
            r#"{"columns":["region","total"],"rows":[["North",null]]}"#
        );
    }
}
