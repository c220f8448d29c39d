mod cache;
mod frame;
mod inputs;
mod outputs;
mod schema;

use std::{path::Path, time::Duration};

use anyhow::{Context, Result};
use rusqlite::{Connection, Transaction};

use crate::{config::Config, error::RedistributionError};

pub use cache::AggregationCacheEntry;
pub use frame::{totals_by_area, write_csv};
pub use outputs::StratumFilter;

/// SQLite-backed store for redistribution inputs, the weight table, both
/// stratified output tables and the aggregation cache.
///
/// A `Store` owns its connection and carries no other state, so the pipeline
/// can run from a request handler or a background job alike. Callers must not
/// run two units touching the same (dataset, level) scope concurrently.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open (or create) a store at `path`.
    pub fn open(path: impl AsRef<Path>, config: &Config) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("[store] Failed to create database directory {}", parent.display()))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("[store] Failed to open database {}", path.display()))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;

        Self::init(conn)
    }

    /// Open a private in-memory store.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.execute_batch(schema::TABLES).context("[store] Failed to create schema")?;
        for (_, sql) in schema::SECONDARY_INDEXES {
            conn.execute(sql, [])?;
        }
        log::debug!("[store] schema ready");
        Ok(Self { conn })
    }

    /// Run `f` inside one transaction; commits only if every statement succeeds.
    /// Any failure is reported as a bulk write error for `what`.
    pub(crate) fn write_unit<T>(&mut self, what: &str, f: impl FnOnce(&Transaction) -> rusqlite::Result<T>) -> Result<T> {
        let result = (|| -> rusqlite::Result<T> {
            let tx = self.conn.transaction()?;
            let value = f(&tx)?;
            tx.commit()?;
            Ok(value)
        })();

        result.map_err(|err| {
            anyhow::Error::new(err).context(RedistributionError::BulkWrite(what.to_string()))
        })
    }

    /// Drop secondary indexes and foreign-key enforcement ahead of a large bulk load.
    pub fn begin_bulk_load(&mut self) -> Result<()> {
        for (name, _) in schema::SECONDARY_INDEXES {
            self.conn.execute(&format!("DROP INDEX IF EXISTS {name}"), [])?;
        }
        self.conn.pragma_update(None, "foreign_keys", "OFF")?;
        log::info!("[store] bulk mode: dropped {} secondary indexes", schema::SECONDARY_INDEXES.len());
        Ok(())
    }

    /// Restore everything `begin_bulk_load` dropped.
    pub fn end_bulk_load(&mut self) -> Result<()> {
        for (_, sql) in schema::SECONDARY_INDEXES {
            self.conn.execute(sql, [])?;
        }
        self.conn.pragma_update(None, "foreign_keys", "ON")?;
        log::info!("[store] bulk mode: restored secondary indexes");
        Ok(())
    }

    /// Names of the secondary indexes currently present.
    pub fn secondary_indexes(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT name FROM sqlite_master WHERE type = 'index' AND name LIKE 'idx_%' ORDER BY name")?;
        let names = stmt.query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(names)
    }
}
