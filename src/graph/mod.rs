//! Knowledge graph core: the vertex/edge data model, the SQLite-backed
//! vertex store, and the recursive document-to-graph loader.
//!
//! Entities are vertices identified by a (label, schema) pair; the key a
//! nested entity appeared under becomes the predicate of a directed edge.

pub mod knowledge;
pub mod loader;
pub mod store;
pub mod vertex;

pub use knowledge::{KnowledgeGraph, MultiKnowledgeGraph};
pub use loader::{entity_key, load_document, DEFAULT_MAX_DEPTH};
pub use store::{Graph, VertexStore};
pub use vertex::{Edge, EntityKey, Vertex};

use crate::error::{GraphldError, Result};

/// Lookup key for graph queries.
///
/// One resolver handles the three supported call shapes: a raw vertex id, a
/// (label, schema) identity key, or a vertex reference. Malformed shapes are
/// unrepresentable here; textual keys go through [`VertexQuery::parse`].
#[derive(Debug, Clone, Copy)]
pub enum VertexQuery<'a> {
    /// A generated vertex id.
    Id(&'a str),
    /// An identity key; an absent schema matches only an absent schema.
    Key {
        label: &'a str,
        schema: Option<&'a str>,
    },
    /// A vertex reference: id, label, and schema must all match.
    Vertex(&'a Vertex),
}

impl<'a> VertexQuery<'a> {
    /// Parse a textual key, the CLI-facing shape.
    ///
    /// Accepted forms: `id:<vertex-id>`, `<label>,<schema>`, `<label>,`
    /// (explicitly untyped), or `<label>`.
    pub fn parse(text: &'a str) -> Result<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Err(GraphldError::InvalidKey("empty key".to_string()));
        }

        if let Some(id) = text.strip_prefix("id:") {
            let id = id.trim();
            if id.is_empty() {
                return Err(GraphldError::InvalidKey("empty id after `id:`".to_string()));
            }
            return Ok(VertexQuery::Id(id));
        }

        match text.split_once(',') {
            Some((label, schema)) => {
                let label = label.trim();
                let schema = schema.trim();
                if label.is_empty() {
                    return Err(GraphldError::InvalidKey(format!("missing label in `{text}`")));
                }
                if schema.contains(',') {
                    return Err(GraphldError::InvalidKey(format!(
                        "expected `label,schema`, got `{text}`"
                    )));
                }
                Ok(VertexQuery::Key {
                    label,
                    schema: if schema.is_empty() { None } else { Some(schema) },
                })
            }
            None => Ok(VertexQuery::Key {
                label: text,
                schema: None,
            }),
        }
    }
}

impl<'a> From<&'a str> for VertexQuery<'a> {
    fn from(id: &'a str) -> Self {
        VertexQuery::Id(id)
    }
}

impl<'a> From<(&'a str, Option<&'a str>)> for VertexQuery<'a> {
    fn from((label, schema): (&'a str, Option<&'a str>)) -> Self {
        VertexQuery::Key { label, schema }
    }
}

impl<'a> From<(&'a str, &'a str)> for VertexQuery<'a> {
    fn from((label, schema): (&'a str, &'a str)) -> Self {
        VertexQuery::Key {
            label,
            schema: Some(schema),
        }
    }
}

impl<'a> From<&'a Vertex> for VertexQuery<'a> {
    fn from(vertex: &'a Vertex) -> Self {
        VertexQuery::Vertex(vertex)
    }
}

impl<'a> From<&'a EntityKey> for VertexQuery<'a> {
    fn from(key: &'a EntityKey) -> Self {
        VertexQuery::Key {
            label: &key.label,
            schema: key.schema.as_deref(),
        }
    }
}
