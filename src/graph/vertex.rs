use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field names starting with this prefix are metadata, never payload.
pub const RESERVED_PREFIX: char = '@';

/// The (label, schema) pair that decides whether two entities are the same
/// vertex. Equality and hashing ignore generated vertex ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityKey {
    pub label: String,
    pub schema: Option<String>,
}

impl EntityKey {
    pub fn new(label: impl Into<String>, schema: Option<&str>) -> Self {
        Self {
            label: label.into(),
            schema: schema.map(str::to_string),
        }
    }
}

/// A directed, labeled connection from an owning vertex to a target vertex id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    /// Id of the destination vertex.
    pub target_id: String,
    /// Relation name: the document field the target appeared under.
    pub predicate: String,
}

impl Edge {
    pub fn new(target_id: impl Into<String>, predicate: impl Into<String>) -> Self {
        Self {
            target_id: target_id.into(),
            predicate: predicate.into(),
        }
    }
}

/// One entity in a graph: generated id, identity key, open attribute map,
/// and ordered outgoing edges.
///
/// A plain data record; persistence is the vertex store's concern. Ids are
/// generated by the store, never by callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vertex {
    /// Opaque unique token, assigned once at creation.
    pub id: String,
    pub label: String,
    /// Schema/type tag, e.g. a schema.org type. `None` means untyped.
    pub schema: Option<String>,
    /// Primitive attributes carried by this vertex.
    pub payload: Map<String, Value>,
    /// Outgoing edges, at most one per distinct target id, in insertion order.
    pub edges: Vec<Edge>,
}

impl Vertex {
    pub fn new(id: impl Into<String>, label: impl Into<String>, schema: Option<&str>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            schema: schema.map(str::to_string),
            payload: Map::new(),
            edges: Vec::new(),
        }
    }

    /// Identity key of this vertex.
    pub fn key(&self) -> EntityKey {
        EntityKey::new(self.label.clone(), self.schema.as_deref())
    }

    /// Add a connection to a neighboring vertex.
    ///
    /// Idempotent per target: if an edge to `nbr` already exists it is
    /// returned unchanged and the predicate is NOT overwritten.
    pub fn add_neighbor(&mut self, nbr: &Vertex, predicate: &str) -> &Edge {
        match self.edges.iter().position(|e| e.target_id == nbr.id) {
            Some(i) => &self.edges[i],
            None => {
                self.edges.push(Edge::new(nbr.id.clone(), predicate));
                let last = self.edges.len() - 1;
                &self.edges[last]
            }
        }
    }

    /// Retrieve the immediate connection to a target vertex, if any.
    pub fn get_connection(&self, nbr: &Vertex) -> Option<&Edge> {
        self.edges.iter().find(|e| e.target_id == nbr.id)
    }

    /// Merge fields into the payload.
    ///
    /// Admits only non-reserved keys with primitive values (string, number,
    /// boolean). Keys already present are left untouched, so repeated
    /// ingestion of the same document is idempotent.
    pub fn add_payload(&mut self, fields: &Map<String, Value>) {
        for (key, value) in fields {
            if key.starts_with(RESERVED_PREFIX) || !is_primitive(value) {
                continue;
            }
            if !self.payload.contains_key(key) {
                self.payload.insert(key.clone(), value.clone());
            }
        }
    }
}

impl PartialEq for Vertex {
    /// Two vertices are the same entity iff their identity keys are equal.
    fn eq(&self, other: &Self) -> bool {
        self.label == other.label && self.schema == other.schema
    }
}

impl Eq for Vertex {}

impl std::hash::Hash for Vertex {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.label.hash(state);
        self.schema.hash(state);
    }
}

/// True for the value kinds admitted into a payload.
fn is_primitive(value: &Value) -> bool {
    matches!(value, Value::String(_) | Value::Number(_) | Value::Bool(_))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vertex(id: &str, label: &str, schema: Option<&str>) -> Vertex {
        Vertex::new(id, label, schema)
    }

    #[test]
    fn test_add_neighbor_creates_edge() {
        let mut movie = vertex("v1", "Avatar", Some("Movie"));
        let director = vertex("v2", "James Cameron", Some("Person"));

        let edge = movie.add_neighbor(&director, "director");
        assert_eq!(edge.target_id, "v2");
        assert_eq!(edge.predicate, "director");
        assert_eq!(movie.edges.len(), 1);
    }

    #[test]
    fn test_add_neighbor_idempotent_first_predicate_wins() {
        let mut movie = vertex("v1", "Avatar", Some("Movie"));
        let director = vertex("v2", "James Cameron", Some("Person"));

        movie.add_neighbor(&director, "director");
        let edge = movie.add_neighbor(&director, "producer");

        // One edge, predicate from the first call
        assert_eq!(edge.predicate, "director");
        assert_eq!(movie.edges.len(), 1);
    }

    #[test]
    fn test_add_neighbor_preserves_insertion_order() {
        let mut movie = vertex("v1", "Avatar", Some("Movie"));
        let a = vertex("v2", "A", None);
        let b = vertex("v3", "B", None);
        let c = vertex("v4", "C", None);

        movie.add_neighbor(&a, "actor");
        movie.add_neighbor(&b, "actor");
        movie.add_neighbor(&c, "musicBy");

        let targets: Vec<_> = movie.edges.iter().map(|e| e.target_id.as_str()).collect();
        assert_eq!(targets, vec!["v2", "v3", "v4"]);
    }

    #[test]
    fn test_get_connection() {
        let mut movie = vertex("v1", "Avatar", Some("Movie"));
        let director = vertex("v2", "James Cameron", Some("Person"));
        let stranger = vertex("v3", "Nobody", None);

        movie.add_neighbor(&director, "director");

        assert!(movie.get_connection(&director).is_some());
        assert!(movie.get_connection(&stranger).is_none());
    }

    #[test]
    fn test_add_payload() {
        let mut movie = vertex("v1", "Avatar", Some("Movie"));
        let mut fields = Map::new();
        fields.insert("genre".to_string(), json!("Science Fiction"));
        fields.insert("year".to_string(), json!(2009));
        fields.insert("released".to_string(), json!(true));

        movie.add_payload(&fields);
        assert_eq!(movie.payload.len(), 3);
        assert_eq!(movie.payload["genre"], json!("Science Fiction"));
        assert_eq!(movie.payload["year"], json!(2009));
        assert_eq!(movie.payload["released"], json!(true));
    }

    #[test]
    fn test_add_payload_merge_is_non_destructive() {
        let mut movie = vertex("v1", "Avatar", Some("Movie"));
        let mut first = Map::new();
        first.insert("genre".to_string(), json!("Sci-Fi"));
        movie.add_payload(&first);

        let mut second = Map::new();
        second.insert("genre".to_string(), json!("Horror"));
        movie.add_payload(&second);

        assert_eq!(movie.payload["genre"], json!("Sci-Fi"));
    }

    #[test]
    fn test_add_payload_excludes_reserved_keys() {
        let mut movie = vertex("v1", "Avatar", Some("Movie"));
        let mut fields = Map::new();
        fields.insert("@type".to_string(), json!("Movie"));
        fields.insert("@context".to_string(), json!("https://schema.org"));
        fields.insert("genre".to_string(), json!("Sci-Fi"));

        movie.add_payload(&fields);
        assert_eq!(movie.payload.len(), 1);
        assert!(!movie.payload.contains_key("@type"));
        assert!(!movie.payload.contains_key("@context"));
    }

    #[test]
    fn test_add_payload_excludes_non_primitives() {
        let mut movie = vertex("v1", "Avatar", Some("Movie"));
        let mut fields = Map::new();
        fields.insert("cast".to_string(), json!(["a", "b"]));
        fields.insert("studio".to_string(), json!({"name": "Fox"}));
        fields.insert("tagline".to_string(), json!(null));
        fields.insert("genre".to_string(), json!("Sci-Fi"));

        movie.add_payload(&fields);
        assert_eq!(movie.payload.len(), 1);
        assert!(movie.payload.contains_key("genre"));
    }

    #[test]
    fn test_vertex_equality_is_identity_key() {
        let a = vertex("v1", "Victor", Some("Person"));
        let b = vertex("v2", "Victor", Some("Person"));
        let c = vertex("v3", "Victor", None);

        // Same (label, schema) means same entity, ids notwithstanding
        assert_eq!(a, b);
        // Absent schema is not a wildcard
        assert_ne!(a, c);
    }

    #[test]
    fn test_entity_key_equality_and_hash() {
        use std::collections::HashSet;

        let mut seen = HashSet::new();
        seen.insert(EntityKey::new("Victor", Some("Person")));
        seen.insert(EntityKey::new("Victor", Some("Person")));
        seen.insert(EntityKey::new("Victor", None));

        assert_eq!(seen.len(), 2);
    }
}
