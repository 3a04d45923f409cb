use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use graphld::{Config, Graph, KnowledgeGraph, VertexQuery};

#[derive(Parser, Debug)]
#[command(name = "graphld")]
#[command(about = "Materialize JSON-LD documents as knowledge graphs in SQLite")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a document into its knowledge graph
    Load {
        /// Path to a JSON / JSON-LD document
        file: PathBuf,
    },
    /// Look up one vertex in a graph
    Query {
        /// Graph name (file stem of the loaded document)
        graph: String,
        /// Key: `id:<vertex-id>`, `<label>,<schema>`, or `<label>`
        key: String,
    },
    /// List all vertices in a graph
    Vertices {
        /// Graph name (file stem of the loaded document)
        graph: String,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default().filter_or("RUST_LOG", "info"),
    )
    .init();

    let args = Args::parse();
    let config = Config::load()?;

    match args.command {
        Command::Load { file } => cmd_load(&config, &file),
        Command::Query { graph, key } => cmd_query(&config, &graph, &key),
        Command::Vertices { graph } => cmd_vertices(&config, &graph),
    }
}

fn cmd_load(config: &Config, file: &PathBuf) -> Result<()> {
    std::fs::create_dir_all(config.data_dir())?;

    log::info!("Loading {}", file.display());
    let kg = KnowledgeGraph::from_file_in(file, config.data_dir(), config.max_depth())?;

    println!("Graph '{}': {} vertices", kg.name(), kg.len()?);
    kg.close()?;
    Ok(())
}

fn open_graph(config: &Config, name: &str) -> Result<Graph> {
    let db_path = config.data_dir().join(format!("{name}.db"));
    if !db_path.exists() {
        anyhow::bail!(
            "graph '{}' not found under {} (run `graphld load` first)",
            name,
            config.data_dir().display()
        );
    }
    Ok(Graph::open(name, &db_path)?)
}

fn cmd_query(config: &Config, graph_name: &str, key: &str) -> Result<()> {
    let graph = open_graph(config, graph_name)?;
    let query = VertexQuery::parse(key)?;

    let Some(vertex) = graph.get(query)? else {
        // Not-found is a result, not a failure
        println!("No vertex found for `{key}` in graph '{graph_name}'");
        return Ok(());
    };

    println!(
        "{} ({}) [{}]",
        vertex.label,
        vertex.schema.as_deref().unwrap_or("-"),
        vertex.id
    );

    if !vertex.payload.is_empty() {
        println!("\nPayload ({}):", vertex.payload.len());
        for (field, value) in &vertex.payload {
            println!("  {field}: {value}");
        }
    }

    if !vertex.edges.is_empty() {
        println!("\nEdges ({}):", vertex.edges.len());
        for edge in &vertex.edges {
            let target = graph
                .get(edge.target_id.as_str())?
                .map(|v| v.label)
                .unwrap_or_else(|| edge.target_id.clone());
            println!("  --{}--> {}", edge.predicate, target);
        }
    }

    graph.close()?;
    Ok(())
}

fn cmd_vertices(config: &Config, graph_name: &str) -> Result<()> {
    let graph = open_graph(config, graph_name)?;
    let vertices = graph.vertices()?;

    println!("Graph '{}' ({} vertices)\n", graph_name, vertices.len());
    println!("{:<38} {:<25} {:<20} {:>6}", "ID", "Label", "Schema", "Edges");
    println!("{:-<91}", "");
    for vertex in &vertices {
        println!(
            "{:<38} {:<25} {:<20} {:>6}",
            vertex.id,
            vertex.label,
            vertex.schema.as_deref().unwrap_or("-"),
            vertex.edges.len()
        );
    }

    graph.close()?;
    Ok(())
}
