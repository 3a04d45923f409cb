//! Recursive document-to-graph loader.
//!
//! Walks a parsed nested document depth-first: primitive fields merge into
//! the owning vertex payload, nested objects become neighboring vertices
//! connected by an edge named after the field they appeared under.
//!
//! Nested objects lacking both `name` and `@type` normalize to the sentinel
//! ("Unknown", "Thing") key, so every anonymous object in a document
//! coalesces into one shared vertex. That is a consequence of identity-key
//! deduplication, not a special case.

use serde_json::{Map, Value};

use crate::error::{GraphldError, Result};
use super::store::Graph;
use super::vertex::{EntityKey, Vertex};

/// Document field holding an entity's label.
const LABEL_FIELD: &str = "name";
/// Document field holding an entity's schema/type tag.
const SCHEMA_FIELD: &str = "@type";
/// Label sentinel for anonymous entities.
const DEFAULT_LABEL: &str = "Unknown";
/// Schema sentinel for untyped entities (schema.org's root type).
const DEFAULT_SCHEMA: &str = "Thing";

/// Default cap on document nesting depth.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Normalize a mapping to its identity key.
///
/// Label comes from the `name` field, schema from `@type`; either absent
/// (or non-string) falls back to the sentinel.
pub fn entity_key(mapping: &Map<String, Value>) -> EntityKey {
    let label = mapping
        .get(LABEL_FIELD)
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_LABEL);
    let schema = mapping
        .get(SCHEMA_FIELD)
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_SCHEMA);
    EntityKey::new(label, Some(schema))
}

/// Load one parsed document into a graph.
///
/// The whole load runs in a single transaction: on error the graph rolls
/// back to its prior state rather than keeping a partial load.
pub fn load_document(graph: &mut Graph, doc: &Value, max_depth: usize) -> Result<()> {
    graph.begin()?;
    match load_node(graph, doc, max_depth) {
        Ok(()) => graph.commit(),
        Err(e) => {
            let _ = graph.rollback();
            Err(e)
        }
    }
}

/// Dispatch on a top-level document node.
///
/// A mapping loads as one entity; a sequence loads each element
/// independently (no vertex for the sequence itself); primitives carry no
/// entity and are ignored.
fn load_node(graph: &mut Graph, node: &Value, max_depth: usize) -> Result<()> {
    match node {
        Value::Object(mapping) => {
            load_mapping(graph, mapping, max_depth, 1)?;
            Ok(())
        }
        Value::Array(items) => {
            for item in items {
                load_node(graph, item, max_depth)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Create the vertex for a mapping and expand its fields.
fn load_mapping(
    graph: &mut Graph,
    mapping: &Map<String, Value>,
    max_depth: usize,
    depth: usize,
) -> Result<Vertex> {
    check_depth(depth, max_depth)?;
    let key = entity_key(mapping);
    let vertex = graph.add_vertex(&key.label, key.schema.as_deref())?;
    expand_fields(graph, &vertex, mapping, max_depth, depth)?;
    Ok(vertex)
}

/// Walk a mapping's fields: primitives into payload, nested values into
/// edges plus recursion.
fn expand_fields(
    graph: &mut Graph,
    vertex: &Vertex,
    mapping: &Map<String, Value>,
    max_depth: usize,
    depth: usize,
) -> Result<()> {
    // Primitive fields first, merged in one pass. The label field is
    // consumed by identity; add_payload itself drops reserved @-keys and
    // non-primitive values, so only containers are skipped here.
    let mut fields = Map::new();
    for (key, value) in mapping {
        if key == LABEL_FIELD || value.is_object() || value.is_array() {
            continue;
        }
        fields.insert(key.clone(), value.clone());
    }
    if !fields.is_empty() {
        graph.add_payload(vertex, &fields)?;
    }

    // Nested fields in document order.
    for (key, value) in mapping {
        match value {
            Value::Object(nested) => {
                link_and_expand(graph, vertex, key, nested, max_depth, depth)?;
            }
            Value::Array(items) => {
                expand_sequence(graph, vertex, key, items, max_depth, depth)?;
            }
            _ => {}
        }
    }
    Ok(())
}

/// Handle one nested mapping: create-or-fetch its vertex, link it under the
/// field's predicate, then recurse into its own fields.
fn link_and_expand(
    graph: &mut Graph,
    source: &Vertex,
    predicate: &str,
    nested: &Map<String, Value>,
    max_depth: usize,
    depth: usize,
) -> Result<()> {
    check_depth(depth + 1, max_depth)?;
    let key = entity_key(nested);
    let nbr = graph.add_vertex(&key.label, key.schema.as_deref())?;
    graph.add_neighbor(source, &nbr, predicate)?;
    log::debug!(
        "{} --{}--> {}",
        source.label,
        predicate,
        nbr.label
    );
    expand_fields(graph, &nbr, nested, max_depth, depth + 1)?;
    Ok(())
}

/// Handle a sequence-valued field. Mapping elements get an edge and are
/// expanded; nested sequences are recursed; primitive elements are ignored.
fn expand_sequence(
    graph: &mut Graph,
    source: &Vertex,
    predicate: &str,
    items: &[Value],
    max_depth: usize,
    depth: usize,
) -> Result<()> {
    for item in items {
        match item {
            Value::Object(nested) => {
                link_and_expand(graph, source, predicate, nested, max_depth, depth)?;
            }
            Value::Array(inner) => {
                check_depth(depth + 1, max_depth)?;
                expand_sequence(graph, source, predicate, inner, max_depth, depth + 1)?;
            }
            _ => {}
        }
    }
    Ok(())
}

fn check_depth(depth: usize, max_depth: usize) -> Result<()> {
    if depth > max_depth {
        return Err(GraphldError::UnsupportedFormat(format!(
            "document nesting exceeds maximum depth {max_depth}"
        )));
    }
    Ok(())
}
