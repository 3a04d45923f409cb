//! Construction entry points: one knowledge graph per source document, or a
//! collection of graphs built from a directory tree.

use std::path::Path;

use walkdir::WalkDir;

use crate::error::{GraphldError, Result};
use crate::ingest::reader;
use super::loader::{self, DEFAULT_MAX_DEPTH};
use super::store::Graph;
use super::vertex::Vertex;
use super::VertexQuery;

/// A graph materialized from one source document.
pub struct KnowledgeGraph {
    name: String,
    graph: Graph,
}

impl KnowledgeGraph {
    /// Build a knowledge graph from a document, creating `<stem>.db` in the
    /// current directory.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_file_in(path, ".", DEFAULT_MAX_DEPTH)
    }

    /// Build a knowledge graph from a document, creating the graph database
    /// under `data_dir`, with an explicit nesting depth limit.
    pub fn from_file_in<P, D>(path: P, data_dir: D, max_depth: usize) -> Result<Self>
    where
        P: AsRef<Path>,
        D: AsRef<Path>,
    {
        let path = path.as_ref();
        let doc = reader::read_document(path)?;

        let name = graph_name(path);
        let db_path = data_dir.as_ref().join(format!("{name}.db"));
        let mut graph = Graph::open(&name, &db_path)?;

        match loader::load_document(&mut graph, &doc, max_depth) {
            Ok(()) => {
                log::info!(
                    "Loaded {} into graph '{}' ({} vertices)",
                    path.display(),
                    name,
                    graph.len()?
                );
                Ok(Self { name, graph })
            }
            Err(e) => {
                // Release the backing store before surfacing the failure
                let _ = graph.close();
                Err(e)
            }
        }
    }

    /// Graph name, derived from the source file's base name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up a vertex by id, (label, schema), or vertex reference.
    pub fn get<'a>(&self, query: impl Into<VertexQuery<'a>>) -> Result<Option<Vertex>> {
        self.graph.get(query)
    }

    pub fn contains<'a>(&self, query: impl Into<VertexQuery<'a>>) -> Result<bool> {
        self.graph.contains(query)
    }

    /// All vertices in the graph, in insertion order.
    pub fn vertices(&self) -> Result<Vec<Vertex>> {
        self.graph.vertices()
    }

    pub fn len(&self) -> Result<usize> {
        self.graph.len()
    }

    pub fn is_empty(&self) -> Result<bool> {
        self.graph.is_empty()
    }

    /// Release the backing database.
    pub fn close(self) -> Result<()> {
        self.graph.close()
    }
}

/// A collection of knowledge graphs built from one directory tree.
pub struct MultiKnowledgeGraph {
    name: String,
    graphs: Vec<KnowledgeGraph>,
}

impl MultiKnowledgeGraph {
    /// Build one knowledge graph per loadable document under `dir`,
    /// placing the graph databases under `data_dir`.
    ///
    /// Files without an implemented reader (including the recognized RDF
    /// serializations) are skipped, not failed.
    pub fn from_dir<P, D>(dir: P, data_dir: D) -> Result<Self>
    where
        P: AsRef<Path>,
        D: AsRef<Path>,
    {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(GraphldError::NotFound(format!(
                "{} is not a directory",
                dir.display()
            )));
        }

        let mut paths: Vec<_> = WalkDir::new(dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_file() && reader::is_loadable(e.path()))
            .map(|e| e.path().to_path_buf())
            .collect();
        paths.sort();

        log::info!("Discovered {} documents in {}", paths.len(), dir.display());

        let mut graphs = Vec::with_capacity(paths.len());
        for path in paths {
            graphs.push(KnowledgeGraph::from_file_in(
                &path,
                data_dir.as_ref(),
                DEFAULT_MAX_DEPTH,
            )?);
        }

        Ok(Self {
            name: graph_name(dir),
            graphs,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fetch a member graph by name.
    pub fn get(&self, graph_name: &str) -> Option<&KnowledgeGraph> {
        self.graphs.iter().find(|g| g.name() == graph_name)
    }

    pub fn graphs(&self) -> &[KnowledgeGraph] {
        &self.graphs
    }

    pub fn len(&self) -> usize {
        self.graphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graphs.is_empty()
    }

    /// Release every member graph's backing database.
    pub fn close(self) -> Result<()> {
        for graph in self.graphs {
            graph.close()?;
        }
        Ok(())
    }
}

/// Derive a graph name from a file or directory path: the base name with
/// non-alphanumeric characters normalized to `_`.
fn graph_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("graph");
    stem.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn write_doc(dir: &Path, name: &str, doc: &serde_json::Value) -> std::path::PathBuf {
        let path = dir.join(name);
        fs::write(&path, serde_json::to_string_pretty(doc).unwrap()).unwrap();
        path
    }

    #[test]
    fn test_from_file_builds_graph() {
        let temp = TempDir::new().unwrap();
        let doc = json!({
            "name": "Avatar",
            "@type": "Movie",
            "genre": "Science Fiction",
            "director": {"name": "James Cameron", "@type": "Person"}
        });
        let path = write_doc(temp.path(), "avatar.jsonld", &doc);

        let kg = KnowledgeGraph::from_file_in(&path, temp.path(), DEFAULT_MAX_DEPTH).unwrap();
        assert_eq!(kg.name(), "avatar");
        assert_eq!(kg.len().unwrap(), 2);
        assert!(temp.path().join("avatar.db").exists());

        let movie = kg.get(("Avatar", Some("Movie"))).unwrap().unwrap();
        assert_eq!(movie.payload["genre"], json!("Science Fiction"));
        assert_eq!(movie.edges.len(), 1);
        kg.close().unwrap();
    }

    #[test]
    fn test_graph_name_normalization() {
        let temp = TempDir::new().unwrap();
        let doc = json!({"name": "X", "@type": "Thing"});
        let path = write_doc(temp.path(), "medical-condition.jsonld", &doc);

        let kg = KnowledgeGraph::from_file_in(&path, temp.path(), DEFAULT_MAX_DEPTH).unwrap();
        assert_eq!(kg.name(), "medical_condition");
        assert!(temp.path().join("medical_condition.db").exists());
    }

    #[test]
    fn test_from_file_missing_path() {
        let result = KnowledgeGraph::from_file("no/such/file.jsonld");
        assert!(matches!(result, Err(GraphldError::NotFound(_))));
    }

    #[test]
    fn test_from_file_unsupported_extension() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("doc.csv");
        fs::write(&path, "a,b,c").unwrap();

        let result = KnowledgeGraph::from_file_in(&path, temp.path(), DEFAULT_MAX_DEPTH);
        assert!(matches!(result, Err(GraphldError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_from_file_reopens_existing_graph() {
        let temp = TempDir::new().unwrap();
        let doc = json!({"name": "Victor", "@type": "Person", "age": 23});
        let path = write_doc(temp.path(), "people.json", &doc);

        let kg = KnowledgeGraph::from_file_in(&path, temp.path(), DEFAULT_MAX_DEPTH).unwrap();
        kg.close().unwrap();

        // Loading the same document into the same graph db stays deduplicated
        let kg = KnowledgeGraph::from_file_in(&path, temp.path(), DEFAULT_MAX_DEPTH).unwrap();
        assert_eq!(kg.len().unwrap(), 1);
    }

    #[test]
    fn test_from_dir_builds_one_graph_per_document() {
        let docs = TempDir::new().unwrap();
        let data = TempDir::new().unwrap();
        write_doc(
            docs.path(),
            "movie.jsonld",
            &json!({"name": "Avatar", "@type": "Movie"}),
        );
        write_doc(
            docs.path(),
            "person.json",
            &json!({"name": "Victor", "@type": "Person"}),
        );
        // Not loadable: recognized RDF serialization, skipped
        fs::write(docs.path().join("triples.nt"), "<a> <b> <c> .").unwrap();
        // Not loadable: unknown extension, skipped
        fs::write(docs.path().join("notes.txt"), "notes").unwrap();

        let mkg = MultiKnowledgeGraph::from_dir(docs.path(), data.path()).unwrap();
        assert_eq!(mkg.len(), 2);
        assert!(mkg.get("movie").is_some());
        assert!(mkg.get("person").is_some());
        assert!(mkg.get("triples").is_none());

        let movie = mkg.get("movie").unwrap();
        assert!(movie.contains(("Avatar", Some("Movie"))).unwrap());
        mkg.close().unwrap();
    }

    #[test]
    fn test_from_dir_missing_directory() {
        let data = TempDir::new().unwrap();
        let result = MultiKnowledgeGraph::from_dir("no/such/dir", data.path());
        assert!(matches!(result, Err(GraphldError::NotFound(_))));
    }
}
