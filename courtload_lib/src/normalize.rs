//! Column-name canonicalization and run-context tagging.

use std::collections::{HashMap, HashSet};

use serde_json::Value;

use crate::season::SeasonContext;
use crate::table::RawTable;

/// Context columns appended to every normalized table.
pub const SEASON_COLUMN: &str = "season";
pub const SEASON_LABEL_COLUMN: &str = "season_label";
pub const SEASON_TYPE_COLUMN: &str = "season_type";

/// `W/L%` becomes `w_l`, `FG3_PCT` becomes `fg3_pct`, an all-punctuation
/// label becomes `unknown`.
pub fn to_snake_case(label: &str) -> String {
    let spaced: String = label
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();
    let snake = spaced.split_whitespace().collect::<Vec<_>>().join("_").to_lowercase();
    if snake.is_empty() {
        "unknown".to_string()
    } else {
        snake
    }
}

/// Canonicalizes a label list. Repeats get `_1`, `_2`, ... in first-seen
/// order, skipping any suffixed name already taken, so applying this to its
/// own output changes nothing.
pub fn canonical_labels(raw: &[String]) -> Vec<String> {
    let base: Vec<String> = raw.iter().map(|l| to_snake_case(l)).collect();
    let mut taken: HashSet<String> = HashSet::with_capacity(base.len());
    let mut counters: HashMap<String, usize> = HashMap::new();
    let mut out = Vec::with_capacity(base.len());

    for name in base {
        if taken.insert(name.clone()) {
            out.push(name);
            continue;
        }
        let n = counters.entry(name.clone()).or_insert(0);
        let candidate = loop {
            *n += 1;
            let candidate = format!("{}_{}", name, n);
            if !taken.contains(&candidate) {
                break candidate;
            }
        };
        taken.insert(candidate.clone());
        out.push(candidate);
    }
    out
}

/// Normalizes tables for one season: canonical column names plus the
/// season, season label and season type columns on every row.
#[derive(Clone, Copy, Debug)]
pub struct TableNormalizer {
    context: SeasonContext,
}

impl TableNormalizer {
    pub fn new(context: SeasonContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &SeasonContext {
        &self.context
    }

    /// Renames columns only; no context columns.
    pub fn canonicalize(&self, mut table: RawTable) -> RawTable {
        table.columns = canonical_labels(&table.columns);
        table
    }

    /// Renames columns and writes the context columns. Existing context
    /// columns are overwritten. A table without columns is returned as is.
    pub fn normalize(&self, table: RawTable) -> RawTable {
        if table.columns.is_empty() {
            return table;
        }
        let mut table = self.canonicalize(table);
        self.tag_context(&mut table);
        table
    }

    pub fn tag_context(&self, table: &mut RawTable) {
        table.set_column(SEASON_COLUMN, Value::String(self.context.season_id()));
        table.set_column(
            SEASON_LABEL_COLUMN,
            Value::String(self.context.season_label()),
        );
        table.set_column(
            SEASON_TYPE_COLUMN,
            Value::String(self.context.season_type.to_string()),
        );
    }
}
