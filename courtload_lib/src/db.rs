//! SQLite warehouse: one table per dataset, season-scoped idempotent writes.
//!
//! A dataset table is created from the first non-empty write and its column
//! list is authoritative from then on. Later writes are aligned to it (missing
//! columns become NULL, unknown columns are dropped with a warning) and
//! replace the rows of their `(season, season_type)` partition.

use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use serde::Serialize;
use serde_json::{Number, Value};

use crate::normalize::{SEASON_COLUMN, SEASON_TYPE_COLUMN};
use crate::orchestrator::Tables;
use crate::season::SeasonContext;
use crate::table::RawTable;

/// Locks older than this are treated as left behind by a dead loader.
pub const DEFAULT_LOCK_TTL_HOURS: i64 = 6;

#[derive(thiserror::Error, Debug)]
pub enum DbError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid identifier {0:?}")]
    InvalidIdentifier(String),
    #[error("season {season} ({season_type}) is being loaded by {owner} since {since}")]
    PartitionLocked {
        season: String,
        season_type: String,
        owner: String,
        since: String,
    },
}

/// What one write did to its table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// No rows; the table was not touched.
    Skipped,
    Created { rows: usize },
    Upserted {
        deleted: usize,
        inserted: usize,
        dropped_columns: Vec<String>,
    },
}

/// Row counts of one warehouse table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableStats {
    pub table: String,
    pub rows: i64,
    /// `(season, rows)` pairs; empty when the table has no season column.
    pub seasons: Vec<(String, i64)>,
}

pub struct Db {
    conn: Connection,
}

impl Db {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    #[doc(hidden)]
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn init(&self) -> Result<(), DbError> {
        let schema = include_str!("../schema/sqlite.sql");
        self.conn.execute_batch(schema)?;
        Ok(())
    }

    /// Closes the connection, surfacing any error SQLite reports on close.
    pub fn close(self) -> Result<(), DbError> {
        self.conn.close().map_err(|(_, e)| DbError::Sqlite(e))
    }

    pub fn get_meta(&self, key: &str) -> Result<Option<String>, DbError> {
        self.conn
            .query_row(
                "SELECT value FROM _ingest_meta WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(DbError::from)
    }

    pub fn set_meta(&self, key: &str, value: &str) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO _ingest_meta (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    /// Records when a season partition last finished loading.
    pub fn mark_loaded(&self, context: &SeasonContext) -> Result<(), DbError> {
        self.set_meta(&loaded_key(context), &Utc::now().to_rfc3339())
    }

    pub fn last_loaded(&self, context: &SeasonContext) -> Result<Option<String>, DbError> {
        self.get_meta(&loaded_key(context))
    }

    pub fn table_exists(&self, table: &str) -> Result<bool, DbError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(1) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![table],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Column names of `table` in declaration order.
    pub fn table_columns(&self, table: &str) -> Result<Vec<String>, DbError> {
        let sql = format!("PRAGMA table_info({})", quote_ident(table)?);
        let mut stmt = self.conn.prepare(&sql)?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }

    /// Dataset tables, excluding bookkeeping and SQLite internals.
    pub fn list_tables(&self) -> Result<Vec<String>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM sqlite_master
             WHERE type = 'table' AND name NOT LIKE '\\_%' ESCAPE '\\' AND name NOT LIKE 'sqlite%'
             ORDER BY name",
        )?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }

    /// Creates `name` from `table` or replaces its `(season[, season_type])`
    /// partition with `table`'s rows.
    ///
    /// An empty table is a no-op and never deletes anything. A destination
    /// without a season column is appended to.
    pub fn upsert_raw_table(
        &mut self,
        name: &str,
        table: &RawTable,
        season: &str,
        season_type: &str,
    ) -> Result<WriteOutcome, DbError> {
        if table.is_empty() {
            tracing::debug!("Skipping empty table: {}", name);
            return Ok(WriteOutcome::Skipped);
        }
        let quoted = quote_ident(name)?;

        if !self.table_exists(name)? {
            let tx = self.conn.transaction()?;
            let columns = table
                .columns
                .iter()
                .enumerate()
                .map(|(i, col)| {
                    Ok(format!("{} {}", quote_ident(col)?, column_affinity(&table.rows, i)))
                })
                .collect::<Result<Vec<_>, DbError>>()?;
            tx.execute(&format!("CREATE TABLE {} ({})", quoted, columns.join(", ")), [])?;
            insert_rows(&tx, &quoted, &table.columns, &table.rows)?;
            tx.commit()?;
            tracing::info!("  created {}: {} rows", name, table.len());
            return Ok(WriteOutcome::Created { rows: table.len() });
        }

        let existing = self.table_columns(name)?;
        let aligned = table.align_to(&existing);
        if !aligned.dropped.is_empty() {
            tracing::warn!(
                "{}: dropping {} new/unexpected columns: {}",
                name,
                aligned.dropped.len(),
                aligned.dropped.join(", ")
            );
        }

        let has = |c: &str| existing.iter().any(|e| e == c);
        let tx = self.conn.transaction()?;
        let deleted = if has(SEASON_COLUMN) && has(SEASON_TYPE_COLUMN) {
            tx.execute(
                &format!("DELETE FROM {} WHERE season = ?1 AND season_type = ?2", quoted),
                params![season, season_type],
            )?
        } else if has(SEASON_COLUMN) {
            tx.execute(
                &format!("DELETE FROM {} WHERE season = ?1", quoted),
                params![season],
            )?
        } else {
            0
        };
        insert_rows(&tx, &quoted, &existing, &aligned.rows)?;
        tx.commit()?;

        tracing::info!(
            "  upserted {}: {} rows ({} replaced)",
            name,
            aligned.rows.len(),
            deleted
        );
        Ok(WriteOutcome::Upserted {
            deleted,
            inserted: aligned.rows.len(),
            dropped_columns: aligned.dropped,
        })
    }

    /// Writes every table of one season. Store errors abort the whole write.
    pub fn write_tables_for_season(
        &mut self,
        tables: &Tables,
        context: &SeasonContext,
    ) -> Result<Vec<(String, WriteOutcome)>, DbError> {
        tracing::info!("Writing {} to the warehouse", context);
        let season = context.season_id();
        let season_type = context.season_type.to_string();
        let mut outcomes = Vec::with_capacity(tables.len());
        for (name, table) in tables {
            let outcome = self.upsert_raw_table(name, table, &season, &season_type)?;
            outcomes.push((name.clone(), outcome));
        }
        Ok(outcomes)
    }

    /// Takes the single-writer lock for a season partition.
    ///
    /// Fails with [`DbError::PartitionLocked`] while another owner holds a
    /// lock younger than `ttl`. Re-acquiring one's own lock refreshes it.
    pub fn acquire_lock(
        &self,
        context: &SeasonContext,
        owner: &str,
        ttl: Duration,
    ) -> Result<(), DbError> {
        self.acquire_lock_at(context, owner, ttl, Utc::now())
    }

    fn acquire_lock_at(
        &self,
        context: &SeasonContext,
        owner: &str,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<(), DbError> {
        let season = context.season_id();
        let season_type = context.season_type.to_string();
        let tx = self.conn.unchecked_transaction()?;

        let held: Option<(String, String)> = tx
            .query_row(
                "SELECT owner, acquired_at FROM _load_locks WHERE season = ?1 AND season_type = ?2",
                params![season, season_type],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        if let Some((holder, since)) = held {
            let fresh = DateTime::parse_from_rfc3339(&since)
                .map(|at| now.signed_duration_since(at.with_timezone(&Utc)) < ttl)
                .unwrap_or(false);
            if holder != owner && fresh {
                return Err(DbError::PartitionLocked {
                    season,
                    season_type,
                    owner: holder,
                    since,
                });
            }
            if holder != owner {
                tracing::warn!(
                    "Taking over stale lock on {} held by {} since {}",
                    context,
                    holder,
                    since
                );
            }
        }

        tx.execute(
            "INSERT INTO _load_locks (season, season_type, owner, acquired_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(season, season_type) DO UPDATE SET
               owner = excluded.owner,
               acquired_at = excluded.acquired_at",
            params![season, season_type, owner, now.to_rfc3339()],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Releases a lock held by `owner`. Locks held by others are left alone.
    pub fn release_lock(&self, context: &SeasonContext, owner: &str) -> Result<bool, DbError> {
        let n = self.conn.execute(
            "DELETE FROM _load_locks WHERE season = ?1 AND season_type = ?2 AND owner = ?3",
            params![context.season_id(), context.season_type.to_string(), owner],
        )?;
        Ok(n > 0)
    }

    /// Total and per-season row counts for every dataset table.
    pub fn table_stats(&self) -> Result<Vec<TableStats>, DbError> {
        let mut out = Vec::new();
        for table in self.list_tables()? {
            let quoted = quote_ident(&table)?;
            let rows: i64 =
                self.conn
                    .query_row(&format!("SELECT COUNT(1) FROM {}", quoted), [], |row| {
                        row.get(0)
                    })?;
            let seasons = if self.table_columns(&table)?.iter().any(|c| c == SEASON_COLUMN) {
                let mut stmt = self.conn.prepare(&format!(
                    "SELECT season, COUNT(1) FROM {} GROUP BY season ORDER BY season",
                    quoted
                ))?;
                let pairs = stmt
                    .query_map([], |row| {
                        let season: SqlValue = row.get(0)?;
                        Ok((sql_to_string(&season), row.get::<_, i64>(1)?))
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                pairs
            } else {
                Vec::new()
            };
            out.push(TableStats {
                table,
                rows,
                seasons,
            });
        }
        Ok(out)
    }

    /// Reads a whole table back as a [`RawTable`].
    pub fn read_table(&self, table: &str) -> Result<RawTable, DbError> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT * FROM {}", quote_ident(table)?))?;
        let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
        let width = columns.len();
        let rows = stmt
            .query_map([], |row| {
                (0..width)
                    .map(|i| row.get_ref(i).map(json_from_sql))
                    .collect::<Result<Vec<_>, _>>()
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(RawTable::new(table, columns, rows))
    }
}

fn loaded_key(context: &SeasonContext) -> String {
    format!(
        "last_loaded_at:{}:{}",
        context.season_id(),
        context.season_type
    )
}

/// Double-quotes an identifier. Empty names and NUL bytes are rejected.
fn quote_ident(name: &str) -> Result<String, DbError> {
    if name.is_empty() || name.contains('\0') {
        return Err(DbError::InvalidIdentifier(name.to_string()));
    }
    Ok(format!("\"{}\"", name.replace('"', "\"\"")))
}

fn insert_rows(
    conn: &Connection,
    quoted_table: &str,
    columns: &[String],
    rows: &[Vec<Value>],
) -> Result<(), DbError> {
    let cols = columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Result<Vec<_>, _>>()?;
    let placeholders = (1..=cols.len())
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>();
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quoted_table,
        cols.join(", "),
        placeholders.join(", ")
    );
    let mut stmt = conn.prepare(&sql)?;
    for row in rows {
        stmt.execute(params_from_iter(row.iter().map(sql_from_json)))?;
    }
    Ok(())
}

/// Declared type for a new column, from its first non-null cell.
fn column_affinity(rows: &[Vec<Value>], index: usize) -> &'static str {
    let first = rows.iter().map(|r| &r[index]).find(|v| !v.is_null());
    match first {
        Some(Value::Bool(_)) => "INTEGER",
        Some(Value::Number(n)) if n.is_i64() || n.is_u64() => "INTEGER",
        Some(Value::Number(_)) => "REAL",
        _ => "TEXT",
    }
}

fn sql_from_json(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => n.as_f64().map(SqlValue::Real).unwrap_or(SqlValue::Null),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}

fn json_from_sql(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::String(String::from_utf8_lossy(b).into_owned()),
    }
}

fn sql_to_string(value: &SqlValue) -> String {
    match value {
        SqlValue::Null => String::new(),
        SqlValue::Integer(i) => i.to_string(),
        SqlValue::Real(f) => f.to_string(),
        SqlValue::Text(s) => s.clone(),
        SqlValue::Blob(b) => String::from_utf8_lossy(b).into_owned(),
    }
}
