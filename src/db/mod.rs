use rusqlite::Connection;
use std::path::Path;
use crate::error::{Result, GraphldError};

/// Database connection manager
///
/// Holds the path to one graph database and hands out configured
/// connections. The `Graph` owns a single open connection for its session;
/// this type is the sole authority for pragma setup.
pub struct Db {
    path: std::path::PathBuf,
}

impl Db {
    /// Create a new database connection manager
    pub fn new<P: AsRef<Path>>(db_path: P) -> Self {
        Self {
            path: db_path.as_ref().to_path_buf(),
        }
    }

    /// Path of the backing database file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open a new database connection with optimized pragmas
    ///
    /// WAL mode, NORMAL sync for speed, foreign keys for integrity,
    /// temp_store = MEMORY for faster temp operations.
    pub fn open_connection(&self) -> Result<Connection> {
        let conn = Connection::open(&self.path)
            .map_err(GraphldError::Database)?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL; \
             PRAGMA synchronous = NORMAL; \
             PRAGMA foreign_keys = ON; \
             PRAGMA temp_store = MEMORY;"
        )?;

        Ok(conn)
    }
}

pub mod migrate;
