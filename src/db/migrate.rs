use rusqlite::{Connection, params};
use crate::error::Result;

/// Migration metadata
struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

/// Schema migrations, applied in order.
///
/// Embedded rather than loaded from disk: graph databases are created at
/// arbitrary caller-chosen paths where no migrations directory exists.
const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "001_graph_tables",
        sql: r#"
            CREATE TABLE IF NOT EXISTS vertices (
                vertex_id TEXT PRIMARY KEY NOT NULL,
                label TEXT NOT NULL,
                schema TEXT,
                payload_json TEXT NOT NULL DEFAULT '{}',
                created_at TIMESTAMP NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_vertices_label_schema
                ON vertices(label, schema);

            CREATE TABLE IF NOT EXISTS edges (
                edge_id INTEGER PRIMARY KEY AUTOINCREMENT,
                source_id TEXT NOT NULL REFERENCES vertices(vertex_id) ON DELETE CASCADE,
                target_id TEXT NOT NULL REFERENCES vertices(vertex_id),
                predicate TEXT NOT NULL,
                UNIQUE(source_id, target_id)
            );

            CREATE INDEX IF NOT EXISTS idx_edges_source
                ON edges(source_id);
        "#,
    },
];

/// Create schema_migrations table if it doesn't exist
fn ensure_migrations_table(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;
    Ok(())
}

/// Get list of applied migrations
pub fn get_applied_migrations(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM schema_migrations ORDER BY version")?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
    Ok(names)
}

/// Run all pending migrations
pub fn run_migrations(conn: &mut Connection) -> Result<()> {
    ensure_migrations_table(conn)?;

    let applied = get_applied_migrations(conn)?;

    for migration in MIGRATIONS {
        if applied.iter().any(|name| name == migration.name) {
            log::debug!("Migration {} already applied, skipping", migration.name);
            continue;
        }

        log::info!(
            "Applying migration: {} (version {})",
            migration.name,
            migration.version
        );

        // Execute migration in a transaction
        let tx = conn.transaction()?;
        tx.execute_batch(migration.sql)?;
        tx.execute(
            "INSERT INTO schema_migrations (version, name) VALUES (?1, ?2)",
            params![migration.version, migration.name],
        )?;
        tx.commit()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_migration_tracking() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let mut conn = Connection::open(&db_path).unwrap();

        run_migrations(&mut conn).unwrap();

        let applied = get_applied_migrations(&conn).unwrap();
        assert!(applied.contains(&"001_graph_tables".to_string()));
    }

    #[test]
    fn test_migrations_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let mut conn = Connection::open(&db_path).unwrap();

        run_migrations(&mut conn).unwrap();
        run_migrations(&mut conn).unwrap();

        let applied = get_applied_migrations(&conn).unwrap();
        assert_eq!(applied.len(), MIGRATIONS.len());
    }

    #[test]
    fn test_migration_schema() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let mut conn = Connection::open(&db_path).unwrap();

        run_migrations(&mut conn).unwrap();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get::<_, String>(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()
            .unwrap();

        assert!(tables.contains(&"vertices".to_string()));
        assert!(tables.contains(&"edges".to_string()));
        assert!(tables.contains(&"schema_migrations".to_string()));

        let indexes: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='index' AND name LIKE 'idx_%'")
            .unwrap()
            .query_map([], |row| row.get::<_, String>(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()
            .unwrap();

        assert!(indexes.contains(&"idx_vertices_label_schema".to_string()));
        assert!(indexes.contains(&"idx_edges_source".to_string()));
    }

    #[test]
    fn test_edge_uniqueness_constraint() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let mut conn = Connection::open(&db_path).unwrap();
        run_migrations(&mut conn).unwrap();

        conn.execute(
            "INSERT INTO vertices (vertex_id, label, schema, payload_json, created_at) \
             VALUES ('a', 'A', NULL, '{}', '2024-01-01T00:00:00Z')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO vertices (vertex_id, label, schema, payload_json, created_at) \
             VALUES ('b', 'B', NULL, '{}', '2024-01-01T00:00:00Z')",
            [],
        )
        .unwrap();

        conn.execute(
            "INSERT INTO edges (source_id, target_id, predicate) VALUES ('a', 'b', 'knows')",
            [],
        )
        .unwrap();

        // Second edge to the same target violates UNIQUE(source_id, target_id)
        let dup = conn.execute(
            "INSERT INTO edges (source_id, target_id, predicate) VALUES ('a', 'b', 'likes')",
            [],
        );
        assert!(dup.is_err());
    }
}
