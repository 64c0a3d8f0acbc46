//! C3: pooled embedded SQL store (§4.3). A `busy`/`locked` SQLite error is
//! retried with jittered backoff up to a fixed attempt count; any other
//! error, including a failed retry budget, is returned to the caller
//! unchanged so it can be matched on `Error` kind.

mod schema;

pub use schema::CURRENT_SCHEMA_VERSION;

use crate::config::knobs::DatabaseConfig;
use crate::error::{Error, Result};
use r2d2::{CustomizeConnection, Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rand::Rng;
use rusqlite::Connection;
use std::time::Duration;

const MAX_ATTEMPTS: u32 = 5;
const BASE_BACKOFF_MS: u64 = 10;

#[derive(Debug)]
struct PragmaCustomizer {
    busy_timeout_ms: u64,
    enable_wal: bool,
    enable_foreign_keys: bool,
}

impl CustomizeConnection<Connection, rusqlite::Error> for PragmaCustomizer {
    fn on_acquire(&self, conn: &mut Connection) -> std::result::Result<(), rusqlite::Error> {
        conn.busy_timeout(Duration::from_millis(self.busy_timeout_ms))?;
        if self.enable_wal {
            conn.pragma_update(None, "journal_mode", "WAL")?;
        }
        if self.enable_foreign_keys {
            conn.pragma_update(None, "foreign_keys", true)?;
        }
        Ok(())
    }
}

pub struct DatabaseService {
    pool: Pool<SqliteConnectionManager>,
}

impl DatabaseService {
    pub fn open(config: &DatabaseConfig) -> Result<Self> {
        let manager = SqliteConnectionManager::file(&config.path);
        let customizer = PragmaCustomizer {
            busy_timeout_ms: config.busy_timeout_ms,
            enable_wal: config.enable_wal,
            enable_foreign_keys: config.enable_foreign_keys,
        };
        let pool = Pool::builder()
            .max_size(config.max_connections)
            .connection_timeout(Duration::from_millis(config.pool_acquire_timeout_ms))
            .connection_customizer(Box::new(customizer))
            .build(manager)
            .map_err(Error::from)?;

        let service = Self { pool };
        service.install_schema()?;
        Ok(service)
    }

    fn connection(&self) -> Result<PooledConnection<SqliteConnectionManager>> {
        self.pool.get().map_err(Error::from)
    }

    fn install_schema(&self) -> Result<()> {
        let conn = self.connection()?;
        schema::install(&conn)
    }

    pub fn schema_version(&self) -> Result<u32> {
        let conn = self.connection()?;
        schema::version(&conn)
    }

    /// Run `f` against a pooled connection, retrying transient contention
    /// with jittered exponential backoff, up to `MAX_ATTEMPTS`.
    pub fn with_retry<T>(&self, mut f: impl FnMut(&Connection) -> Result<T>) -> Result<T> {
        let mut attempt = 0;
        loop {
            let conn = self.connection()?;
            match f(&conn) {
                Ok(value) => return Ok(value),
                Err(Error::TransientContention(detail)) => {
                    attempt += 1;
                    if attempt >= MAX_ATTEMPTS {
                        return Err(Error::TransientContention(detail));
                    }
                    let jitter = rand::thread_rng().gen_range(0..BASE_BACKOFF_MS);
                    let backoff = BASE_BACKOFF_MS * (1 << attempt.min(6)) + jitter;
                    std::thread::sleep(Duration::from_millis(backoff));
                }
                Err(e) => return Err(e),
            }
        }
    }

    pub fn query_row<T>(
        &self,
        sql: &str,
        params: &[&dyn rusqlite::ToSql],
        map: impl Fn(&rusqlite::Row<'_>) -> rusqlite::Result<T>,
    ) -> Result<Option<T>> {
        self.with_retry(|conn| {
            let mut stmt = conn.prepare(sql).map_err(Error::from)?;
            let mut rows = stmt.query(params).map_err(Error::from)?;
            match rows.next().map_err(Error::from)? {
                Some(row) => Ok(Some(map(row).map_err(Error::from)?)),
                None => Ok(None),
            }
        })
    }

    pub fn execute(&self, sql: &str, params: &[&dyn rusqlite::ToSql]) -> Result<usize> {
        self.with_retry(|conn| conn.execute(sql, params).map_err(Error::from))
    }

    /// Run a closure inside a transaction; any error rolls back. Retries
    /// transient contention on the whole transaction, same as `with_retry`.
    pub fn transaction<T>(&self, mut f: impl FnMut(&rusqlite::Transaction<'_>) -> Result<T>) -> Result<T> {
        let mut attempt = 0;
        loop {
            let mut conn = self.connection()?;
            let outcome = (|| {
                let tx = conn.transaction().map_err(Error::from)?;
                let result = f(&tx)?;
                tx.commit().map_err(Error::from)?;
                Ok(result)
            })();
            match outcome {
                Ok(value) => return Ok(value),
                Err(Error::TransientContention(detail)) => {
                    attempt += 1;
                    if attempt >= MAX_ATTEMPTS {
                        return Err(Error::TransientContention(detail));
                    }
                    let jitter = rand::thread_rng().gen_range(0..BASE_BACKOFF_MS);
                    let backoff = BASE_BACKOFF_MS * (1 << attempt.min(6)) + jitter;
                    std::thread::sleep(Duration::from_millis(backoff));
                }
                Err(e) => return Err(e),
            }
        }
    }

    pub fn pool_stats(&self) -> PoolStats {
        let state = self.pool.state();
        PoolStats { connections: state.connections, idle_connections: state.idle_connections }
    }
}

#[derive(Debug, Clone)]
pub struct PoolStats {
    pub connections: u32,
    pub idle_connections: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(dir: &tempfile::TempDir) -> DatabaseConfig {
        DatabaseConfig {
            path: dir.path().join("test.db").to_string_lossy().to_string(),
            max_connections: 4,
            busy_timeout_ms: 1000,
            enable_wal: false,
            enable_foreign_keys: true,
            pool_acquire_timeout_ms: 1000,
        }
    }

    #[test]
    fn open_installs_schema_and_reports_current_version() {
        let dir = tempfile::tempdir().unwrap();
        let db = DatabaseService::open(&test_config(&dir)).unwrap();
        assert_eq!(db.schema_version().unwrap(), CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn insert_violating_foreign_key_surfaces_as_fk_violation() {
        let dir = tempfile::tempdir().unwrap();
        let db = DatabaseService::open(&test_config(&dir)).unwrap();
        let result = db.execute(
            "INSERT INTO concept_relationships (source_concept_id, target_concept_id, relationship_type, confidence, evidence) VALUES (?1, ?2, ?3, ?4, ?5)",
            &[&"missing-source", &"missing-target", &"uses", &0.5_f64, &"{}"],
        );
        assert!(matches!(result, Err(Error::FkViolation(_))));
    }
}
