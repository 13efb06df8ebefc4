//! Decoding of the `resultSets` / `resultSet` payload shapes.
//!
//! The API answers with either a single table addressed positionally or a
//! list of named tables. Every table is a header list plus a row list whose
//! rows must be exactly as long as the header list.

use serde::Deserialize;
use serde_json::Value;

use crate::Error;

/// Which table to take out of a multi-table response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResultSelector {
    /// Select by the table's `name`; falls back to the first table when no
    /// table carries that name.
    Name(&'static str),
    /// Select by position.
    Index(usize),
}

impl ResultSelector {
    fn index(&self) -> usize {
        match self {
            ResultSelector::Name(_) => 0,
            ResultSelector::Index(i) => *i,
        }
    }
}

impl Default for ResultSelector {
    fn default() -> Self {
        ResultSelector::Index(0)
    }
}

/// One decoded table: ordered headers and rows aligned to them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResultSet {
    pub name: Option<String>,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

#[derive(Deserialize)]
struct RawResultSet {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    headers: Vec<RawHeader>,
    #[serde(default, rename = "rowSet")]
    row_set: Vec<Vec<Value>>,
}

/// Most endpoints send plain column names; a few (lineups, some dashboards)
/// send grouped header rows where the last group holds the real columns.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawHeader {
    Column(String),
    Group {
        #[serde(rename = "columnNames")]
        column_names: Vec<String>,
    },
}

impl ResultSet {
    /// Picks one table out of a decoded response body.
    ///
    /// A payload with neither `resultSets` nor `resultSet` yields an empty
    /// table, matching how the API answers for seasons with no data.
    pub fn select(payload: &Value, selector: &ResultSelector) -> Result<ResultSet, Error> {
        if let Some(sets) = payload.get("resultSets") {
            return match sets {
                Value::Object(_) => ResultSet::from_value(sets),
                Value::Array(items) => {
                    if let ResultSelector::Name(name) = selector {
                        let found = items
                            .iter()
                            .find(|rs| rs.get("name").and_then(Value::as_str) == Some(*name));
                        if let Some(rs) = found {
                            return ResultSet::from_value(rs);
                        }
                        tracing::debug!("Result set {} not found, using index 0", name);
                    }
                    let index = selector.index();
                    let rs = items.get(index).ok_or_else(|| {
                        Error::Shape(format!(
                            "result set index {} out of range ({} sets)",
                            index,
                            items.len()
                        ))
                    })?;
                    ResultSet::from_value(rs)
                }
                _ => Err(Error::Shape(
                    "resultSets is neither an array nor an object".to_string(),
                )),
            };
        }

        if let Some(rs) = payload.get("resultSet") {
            return ResultSet::from_value(rs);
        }

        Ok(ResultSet::default())
    }

    fn from_value(value: &Value) -> Result<ResultSet, Error> {
        let raw = RawResultSet::deserialize(value)
            .map_err(|e| Error::Shape(format!("malformed result set: {}", e)))?;

        let mut headers = Vec::new();
        let mut grouped: Option<Vec<String>> = None;
        for header in raw.headers {
            match header {
                RawHeader::Column(name) => headers.push(name),
                RawHeader::Group { column_names } => grouped = Some(column_names),
            }
        }
        if let Some(columns) = grouped {
            headers = columns;
        }

        for (i, row) in raw.row_set.iter().enumerate() {
            if row.len() != headers.len() {
                return Err(Error::Shape(format!(
                    "row {} has {} values for {} headers",
                    i,
                    row.len(),
                    headers.len()
                )));
            }
        }

        Ok(ResultSet {
            name: raw.name,
            headers,
            rows: raw.row_set,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
