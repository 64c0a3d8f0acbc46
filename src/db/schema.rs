//! Schema installer and version tracking. Tables mirror the persisted data
//! model in `crate::model`; `schema_version` guards against an on-disk
//! database older or newer than this binary expects.

use crate::error::{Error, Result};
use rusqlite::Connection;

pub const CURRENT_SCHEMA_VERSION: u32 = 1;

const DDL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);

CREATE TABLE IF NOT EXISTS concepts (
    id TEXT PRIMARY KEY,
    canonical_name TEXT NOT NULL,
    signature_fingerprint TEXT,
    confidence REAL NOT NULL,
    category TEXT,
    flags TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL,
    metadata TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS symbol_representations (
    concept_id TEXT NOT NULL REFERENCES concepts(id),
    name TEXT NOT NULL,
    uri TEXT NOT NULL,
    range TEXT NOT NULL,
    first_seen INTEGER NOT NULL,
    last_seen INTEGER NOT NULL,
    occurrences INTEGER NOT NULL,
    context TEXT,
    PRIMARY KEY (concept_id, uri, name)
);

CREATE TABLE IF NOT EXISTS concept_relationships (
    source_concept_id TEXT NOT NULL REFERENCES concepts(id),
    target_concept_id TEXT NOT NULL REFERENCES concepts(id),
    relationship_type TEXT NOT NULL,
    confidence REAL NOT NULL,
    evidence TEXT NOT NULL,
    PRIMARY KEY (source_concept_id, target_concept_id, relationship_type)
);

CREATE TABLE IF NOT EXISTS patterns (
    id TEXT PRIMARY KEY,
    from_form TEXT NOT NULL,
    to_form TEXT NOT NULL,
    confidence REAL NOT NULL,
    occurrences INTEGER NOT NULL,
    category TEXT NOT NULL,
    last_applied INTEGER,
    created_at INTEGER NOT NULL,
    examples TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS feedback_events (
    id TEXT PRIMARY KEY,
    kind TEXT NOT NULL,
    suggestion_id TEXT NOT NULL,
    pattern_id TEXT REFERENCES patterns(id),
    original TEXT NOT NULL,
    final_value TEXT,
    context TEXT NOT NULL,
    metadata TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS evolution_events (
    id TEXT PRIMARY KEY,
    kind TEXT NOT NULL,
    timestamp INTEGER NOT NULL,
    file TEXT NOT NULL,
    before_snapshot TEXT,
    after_snapshot TEXT,
    context TEXT NOT NULL,
    impact TEXT NOT NULL,
    metadata TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS evolution_patterns (
    id TEXT PRIMARY KEY,
    kind TEXT NOT NULL,
    name TEXT NOT NULL,
    description TEXT NOT NULL,
    frequency INTEGER NOT NULL,
    confidence REAL NOT NULL,
    examples TEXT NOT NULL,
    characteristics TEXT NOT NULL,
    detected_at INTEGER NOT NULL,
    last_seen INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS team_members (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    role TEXT NOT NULL,
    expertise TEXT NOT NULL,
    joined_at INTEGER NOT NULL,
    last_active INTEGER NOT NULL,
    preferences TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS shared_patterns (
    id TEXT PRIMARY KEY,
    pattern TEXT NOT NULL,
    contributor_id TEXT NOT NULL REFERENCES team_members(id),
    documentation TEXT NOT NULL,
    tags TEXT NOT NULL,
    status TEXT NOT NULL,
    validations TEXT NOT NULL,
    adoptions TEXT NOT NULL,
    metrics TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS quality_metrics_snapshots (
    timestamp INTEGER PRIMARY KEY,
    complexity TEXT NOT NULL,
    duplication TEXT NOT NULL,
    dependencies TEXT NOT NULL,
    test_coverage TEXT NOT NULL,
    maintainability TEXT NOT NULL
);
"#;

pub fn install(conn: &Connection) -> Result<()> {
    conn.execute_batch(DDL).map_err(Error::from)?;
    let count: u32 = conn
        .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
        .map_err(Error::from)?;
    if count == 0 {
        conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [CURRENT_SCHEMA_VERSION])
            .map_err(Error::from)?;
        return Ok(());
    }
    let on_disk = version(conn)?;
    if on_disk > CURRENT_SCHEMA_VERSION {
        return Err(Error::SchemaMismatch(format!(
            "database schema version {on_disk} is newer than this binary supports ({CURRENT_SCHEMA_VERSION})"
        )));
    }
    Ok(())
}

pub fn version(conn: &Connection) -> Result<u32> {
    conn.query_row("SELECT version FROM schema_version LIMIT 1", [], |row| row.get(0))
        .map_err(Error::from)
}
