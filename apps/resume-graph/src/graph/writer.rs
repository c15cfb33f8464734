//! Graph persistence. Pretty-printed JSON files in an output directory.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::models::{AttributeRecord, Graph, GraphEdge, GraphNode, Member};

pub const GRAPH_FILE: &str = "graph.json";
pub const NODES_FILE: &str = "nodes.json";
pub const EDGES_FILE: &str = "edges.json";
pub const RECORDS_FILE: &str = "records.json";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// One `graph.json` holding `{nodes, edges}`.
    #[default]
    Combined,
    /// `nodes.json` and `edges.json`.
    Split,
}

/// Persisted extraction result for one member. `full_text` is not stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: String,
    pub name: String,
    pub backend: String,
    pub extracted_at: DateTime<Utc>,
    #[serde(flatten)]
    pub record: AttributeRecord,
}

impl StoredRecord {
    pub fn new(member: &Member, record: &AttributeRecord, backend: &str) -> Self {
        Self {
            id: member.id.clone(),
            name: member.display_name.clone(),
            backend: backend.to_string(),
            extracted_at: Utc::now(),
            record: AttributeRecord {
                full_text: String::new(),
                ..record.clone()
            },
        }
    }
}

/// Writes the graph into `dir`, creating it if needed. Returns the files
/// written.
pub async fn write_graph(
    dir: &Path,
    graph: &Graph,
    format: OutputFormat,
) -> Result<Vec<PathBuf>, AppError> {
    tokio::fs::create_dir_all(dir).await?;

    let written = match format {
        OutputFormat::Combined => vec![write_json(&dir.join(GRAPH_FILE), graph).await?],
        OutputFormat::Split => vec![
            write_json::<[GraphNode]>(&dir.join(NODES_FILE), &graph.nodes).await?,
            write_json::<[GraphEdge]>(&dir.join(EDGES_FILE), &graph.edges).await?,
        ],
    };

    info!(
        dir = %dir.display(),
        nodes = graph.nodes.len(),
        edges = graph.edges.len(),
        "Graph written"
    );
    Ok(written)
}

pub async fn write_records(dir: &Path, records: &[StoredRecord]) -> Result<PathBuf, AppError> {
    tokio::fs::create_dir_all(dir).await?;
    let path = write_json(&dir.join(RECORDS_FILE), records).await?;
    info!(path = %path.display(), count = records.len(), "Records written");
    Ok(path)
}

async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<PathBuf, AppError> {
    let json = serde_json::to_string_pretty(value)?;
    tokio::fs::write(path, json).await?;
    Ok(path.to_path_buf())
}
