//! [`RawTable`]: a named, column-ordered table of JSON cells.

use std::collections::HashSet;

use serde_json::Value;
use statsnba_api::types::ResultSet;

/// A dataset name, an ordered column list, and rows aligned to the columns.
///
/// Cells stay as JSON values until they reach the warehouse, so tables from
/// endpoints whose columns drift between seasons can still be merged.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawTable {
    pub dataset: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

/// Result of aligning a table to a destination column list.
#[derive(Debug, PartialEq)]
pub struct Aligned {
    pub rows: Vec<Vec<Value>>,
    /// Incoming columns the destination does not have, in incoming order.
    pub dropped: Vec<String>,
}

impl RawTable {
    pub fn new(dataset: impl Into<String>, columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        debug_assert!(rows.iter().all(|r| r.len() == columns.len()));
        Self {
            dataset: dataset.into(),
            columns,
            rows,
        }
    }

    pub fn empty(dataset: impl Into<String>) -> Self {
        Self {
            dataset: dataset.into(),
            ..Default::default()
        }
    }

    pub fn from_result_set(dataset: impl Into<String>, rs: ResultSet) -> Self {
        Self::new(dataset, rs.headers, rs.rows)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Sets `name` to `value` on every row, overwriting an existing column of
    /// that name or appending a new one.
    pub fn set_column(&mut self, name: &str, value: Value) {
        match self.column_index(name) {
            Some(idx) => {
                for row in &mut self.rows {
                    row[idx] = value.clone();
                }
            }
            None => {
                self.columns.push(name.to_string());
                for row in &mut self.rows {
                    row.push(value.clone());
                }
            }
        }
    }

    /// Cells of one column, or `None` if the column does not exist.
    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = &Value>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| &row[idx]))
    }

    /// Distinct non-null tuples over `names`, in first-seen order. Rows with a
    /// null in any of the columns are skipped. Missing columns yield nothing.
    pub fn distinct(&self, names: &[&str]) -> Vec<Vec<Value>> {
        let Some(indices) = names
            .iter()
            .map(|n| self.column_index(n))
            .collect::<Option<Vec<_>>>()
        else {
            return Vec::new();
        };

        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for row in &self.rows {
            let tuple: Vec<Value> = indices.iter().map(|&i| row[i].clone()).collect();
            if tuple.iter().any(Value::is_null) {
                continue;
            }
            let key = tuple
                .iter()
                .map(|v| id_string(v).unwrap_or_default())
                .collect::<Vec<_>>()
                .join("\u{1f}");
            if seen.insert(key) {
                out.push(tuple);
            }
        }
        out
    }

    /// Drops rows repeating an earlier row's values over `keys`, keeping the
    /// first. Returns the number of rows removed. A no-op when any key column
    /// is missing.
    pub fn dedupe_by(&mut self, keys: &[&str]) -> usize {
        let Some(indices) = keys
            .iter()
            .map(|n| self.column_index(n))
            .collect::<Option<Vec<_>>>()
        else {
            return 0;
        };
        let before = self.rows.len();
        let mut seen = HashSet::new();
        self.rows.retain(|row| {
            let key = indices
                .iter()
                .map(|&i| row[i].to_string())
                .collect::<Vec<_>>()
                .join("\u{1f}");
            seen.insert(key)
        });
        before - self.rows.len()
    }

    /// Concatenates tables over the union of their columns (first-seen
    /// order). Cells for columns a table lacks are null.
    pub fn concat(dataset: impl Into<String>, tables: impl IntoIterator<Item = RawTable>) -> Self {
        let mut out = RawTable::empty(dataset);
        for table in tables {
            if table.columns.is_empty() {
                continue;
            }
            for col in &table.columns {
                if !out.has_column(col) {
                    out.columns.push(col.clone());
                    for row in &mut out.rows {
                        row.push(Value::Null);
                    }
                }
            }
            let mapping: Vec<Option<usize>> = out
                .columns
                .iter()
                .map(|c| table.column_index(c))
                .collect();
            for row in table.rows {
                out.rows.push(
                    mapping
                        .iter()
                        .map(|m| m.map(|i| row[i].clone()).unwrap_or(Value::Null))
                        .collect(),
                );
            }
        }
        out
    }

    /// Projects rows onto `destination`: destination columns missing here are
    /// filled with null, columns absent from `destination` are dropped and
    /// reported.
    pub fn align_to(&self, destination: &[String]) -> Aligned {
        let mapping: Vec<Option<usize>> = destination
            .iter()
            .map(|c| self.column_index(c))
            .collect();
        let dropped = self
            .columns
            .iter()
            .filter(|c| !destination.contains(c))
            .cloned()
            .collect();
        let rows = self
            .rows
            .iter()
            .map(|row| {
                mapping
                    .iter()
                    .map(|m| m.map(|i| row[i].clone()).unwrap_or(Value::Null))
                    .collect()
            })
            .collect();
        Aligned { rows, dropped }
    }
}

/// Renders an identifier cell as a string: integral numbers lose any `.0`,
/// strings are trimmed, null and empty strings give `None`.
pub fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i.to_string())
            } else if let Some(f) = n.as_f64() {
                if f.fract() == 0.0 && f.is_finite() {
                    Some(format!("{}", f as i64))
                } else {
                    Some(f.to_string())
                }
            } else {
                Some(n.to_string())
            }
        }
        other => Some(other.to_string()),
    }
}
