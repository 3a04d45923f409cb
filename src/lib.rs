pub mod config;
pub mod error;
pub mod db;
pub mod graph;
pub mod ingest;

pub use config::Config;
pub use error::{GraphldError, Result};
pub use graph::{
    Edge, EntityKey, Graph, KnowledgeGraph, MultiKnowledgeGraph, Vertex, VertexQuery,
};
