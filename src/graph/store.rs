//! SQLite persistence for vertices and edges, and the per-graph handle.
//!
//! `VertexStore` is the only component aware of the storage technology;
//! `Graph` orchestrates it and guarantees at most one vertex per
//! (label, schema) pair.

use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::db::{migrate, Db};
use crate::error::{GraphldError, Result};
use super::vertex::{Edge, Vertex};
use super::VertexQuery;

/// SQLite-backed store of vertices and edges for one graph.
///
/// Owns the connection for the graph session. Sole authority for vertex id
/// generation.
pub struct VertexStore {
    conn: Connection,
}

impl VertexStore {
    /// Open the store, applying pending schema migrations.
    pub fn open(db: &Db) -> Result<Self> {
        let mut conn = db.open_connection()?;
        migrate::run_migrations(&mut conn)?;
        Ok(Self { conn })
    }

    /// Fetch a vertex by its generated id, edges included.
    pub fn get_by_id(&self, id: &str) -> Result<Option<Vertex>> {
        let row = self
            .conn
            .query_row(
                "SELECT vertex_id, label, schema, payload_json FROM vertices \
                 WHERE vertex_id = ?1",
                params![id],
                Self::map_vertex_row,
            )
            .optional()?;
        self.attach_edges(row)
    }

    /// Fetch a vertex by identity key. An absent schema matches only an
    /// absent schema (`IS`, not `=`, so NULL compares exactly).
    pub fn get_by_key(&self, label: &str, schema: Option<&str>) -> Result<Option<Vertex>> {
        let row = self
            .conn
            .query_row(
                "SELECT vertex_id, label, schema, payload_json FROM vertices \
                 WHERE label = ?1 AND schema IS ?2",
                params![label, schema],
                Self::map_vertex_row,
            )
            .optional()?;
        self.attach_edges(row)
    }

    /// Construct and persist a new vertex with a freshly generated id.
    pub fn create_vertex(&self, label: &str, schema: Option<&str>) -> Result<Vertex> {
        let vertex = Vertex::new(Uuid::new_v4().to_string(), label, schema);
        self.conn.execute(
            "INSERT INTO vertices (vertex_id, label, schema, payload_json, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                vertex.id,
                vertex.label,
                vertex.schema,
                serialize_payload(&vertex.payload)?,
                chrono::Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(vertex)
    }

    /// Overwrite the stored payload of a vertex.
    pub fn update_payload(&self, id: &str, payload: &Map<String, Value>) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE vertices SET payload_json = ?1 WHERE vertex_id = ?2",
            params![serialize_payload(payload)?, id],
        )?;
        if changed == 0 {
            return Err(GraphldError::NotFound(format!("vertex {id}")));
        }
        Ok(())
    }

    /// Persist one outgoing edge of a vertex.
    pub fn insert_edge(&self, source_id: &str, edge: &Edge) -> Result<()> {
        self.conn.execute(
            "INSERT INTO edges (source_id, target_id, predicate) VALUES (?1, ?2, ?3)",
            params![source_id, edge.target_id, edge.predicate],
        )?;
        Ok(())
    }

    /// All vertices in insertion order, edges included.
    pub fn all_vertices(&self) -> Result<Vec<Vertex>> {
        let mut stmt = self.conn.prepare(
            "SELECT vertex_id, label, schema, payload_json FROM vertices ORDER BY rowid",
        )?;
        let rows = stmt.query_map([], Self::map_vertex_row)?;

        let mut vertices = Vec::new();
        for row in rows {
            let (vertex, payload_json) = row?;
            let vertex = self.finish_vertex(vertex, payload_json)?;
            vertices.push(vertex);
        }
        Ok(vertices)
    }

    /// Number of vertices in the store.
    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM vertices", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Start the session-wide load transaction.
    pub(crate) fn begin(&self) -> Result<()> {
        self.conn.execute_batch("BEGIN IMMEDIATE")?;
        Ok(())
    }

    pub(crate) fn commit(&self) -> Result<()> {
        self.conn.execute_batch("COMMIT")?;
        Ok(())
    }

    pub(crate) fn rollback(&self) -> Result<()> {
        self.conn.execute_batch("ROLLBACK")?;
        Ok(())
    }

    /// Release the backing connection.
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| GraphldError::Database(e))
    }

    fn map_vertex_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<(Vertex, String)> {
        let id: String = row.get(0)?;
        let label: String = row.get(1)?;
        let schema: Option<String> = row.get(2)?;
        let payload_json: String = row.get(3)?;
        Ok((Vertex::new(id, label, schema.as_deref()), payload_json))
    }

    fn finish_vertex(&self, mut vertex: Vertex, payload_json: String) -> Result<Vertex> {
        vertex.payload = serde_json::from_str(&payload_json)?;
        vertex.edges = self.load_edges(&vertex.id)?;
        Ok(vertex)
    }

    fn attach_edges(&self, row: Option<(Vertex, String)>) -> Result<Option<Vertex>> {
        match row {
            Some((vertex, payload_json)) => Ok(Some(self.finish_vertex(vertex, payload_json)?)),
            None => Ok(None),
        }
    }

    fn load_edges(&self, vertex_id: &str) -> Result<Vec<Edge>> {
        let mut stmt = self.conn.prepare(
            "SELECT target_id, predicate FROM edges WHERE source_id = ?1 ORDER BY edge_id",
        )?;
        let rows = stmt.query_map(params![vertex_id], |row| {
            Ok(Edge {
                target_id: row.get(0)?,
                predicate: row.get(1)?,
            })
        })?;

        let mut edges = Vec::new();
        for row in rows {
            edges.push(row?);
        }
        Ok(edges)
    }
}

fn serialize_payload(payload: &Map<String, Value>) -> Result<String> {
    Ok(serde_json::to_string(payload)?)
}

/// A named graph: the sole entry point for vertex creation and lookup.
pub struct Graph {
    name: String,
    store: VertexStore,
}

impl Graph {
    /// Open (or create) the graph database at `db_path`.
    pub fn open<P: AsRef<Path>>(name: &str, db_path: P) -> Result<Self> {
        let db = Db::new(db_path);
        let store = VertexStore::open(&db)?;
        log::debug!("Opened graph '{}' at {}", name, db.path().display());
        Ok(Self {
            name: name.to_string(),
            store,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up a vertex by id, by (label, schema), or by vertex reference.
    ///
    /// A vertex-shaped query matches only when id, label, and schema all
    /// agree with the stored record.
    pub fn get<'a>(&self, query: impl Into<VertexQuery<'a>>) -> Result<Option<Vertex>> {
        match query.into() {
            VertexQuery::Id(id) => self.store.get_by_id(id),
            VertexQuery::Key { label, schema } => self.store.get_by_key(label, schema),
            VertexQuery::Vertex(v) => Ok(self
                .store
                .get_by_id(&v.id)?
                .filter(|found| found.label == v.label && found.schema == v.schema)),
        }
    }

    /// True iff `get(query)` would find a vertex.
    pub fn contains<'a>(&self, query: impl Into<VertexQuery<'a>>) -> Result<bool> {
        Ok(self.get(query)?.is_some())
    }

    /// Lookup-or-create a vertex for an identity key.
    ///
    /// Idempotent: repeated calls with the same (label, schema) always yield
    /// the same logical vertex, and the vertex count grows by at most one.
    pub fn add_vertex(&mut self, label: &str, schema: Option<&str>) -> Result<Vertex> {
        if let Some(existing) = self.store.get_by_key(label, schema)? {
            return Ok(existing);
        }
        let vertex = self.store.create_vertex(label, schema)?;
        log::info!("New vertex: label={}, schema={:?}", label, schema);
        Ok(vertex)
    }

    /// Merge primitive fields into a vertex payload and persist the result.
    ///
    /// Returns the refreshed vertex. Reserved keys, non-primitive values, and
    /// keys already present are skipped (see [`Vertex::add_payload`]).
    pub fn add_payload(&mut self, vertex: &Vertex, fields: &Map<String, Value>) -> Result<Vertex> {
        let mut fresh = self
            .store
            .get_by_id(&vertex.id)?
            .ok_or_else(|| GraphldError::NotFound(format!("vertex {}", vertex.id)))?;

        let before = fresh.payload.len();
        fresh.add_payload(fields);
        if fresh.payload.len() != before {
            self.store.update_payload(&fresh.id, &fresh.payload)?;
        }
        Ok(fresh)
    }

    /// Connect `source` to `target` under `predicate` and persist the edge.
    ///
    /// Idempotent per target: an existing edge is returned unchanged and its
    /// predicate is not overwritten.
    pub fn add_neighbor(&mut self, source: &Vertex, target: &Vertex, predicate: &str) -> Result<Edge> {
        let mut fresh = self
            .store
            .get_by_id(&source.id)?
            .ok_or_else(|| GraphldError::NotFound(format!("vertex {}", source.id)))?;

        if let Some(existing) = fresh.get_connection(target) {
            return Ok(existing.clone());
        }

        let edge = fresh.add_neighbor(target, predicate).clone();
        self.store.insert_edge(&fresh.id, &edge)?;
        Ok(edge)
    }

    /// All vertices currently known to this graph, in insertion order.
    pub fn vertices(&self) -> Result<Vec<Vertex>> {
        self.store.all_vertices()
    }

    /// Number of vertices in the graph.
    pub fn len(&self) -> Result<usize> {
        self.store.count()
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    pub(crate) fn begin(&self) -> Result<()> {
        self.store.begin()
    }

    pub(crate) fn commit(&self) -> Result<()> {
        self.store.commit()
    }

    pub(crate) fn rollback(&self) -> Result<()> {
        self.store.rollback()
    }

    /// Release the backing database connection.
    pub fn close(self) -> Result<()> {
        self.store.close()
    }
}
