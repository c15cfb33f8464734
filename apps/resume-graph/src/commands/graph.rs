use std::path::PathBuf;

use clap::Args;
use tracing::info;

use crate::commands::build_pipeline;
use crate::config::Config;
use crate::errors::AppError;
use crate::graph::{write_graph, write_records, OutputFormat, StoredRecord};
use crate::models::member::load_population;

#[derive(Debug, Args)]
pub struct GraphArgs {
    /// Member export: a JSON object keyed by member id
    #[arg(short, long, default_value = "members.json")]
    pub members: PathBuf,

    /// Directory the graph files are written to
    #[arg(short, long, default_value = "output")]
    pub output: PathBuf,

    /// `combined` writes graph.json, `split` writes nodes.json and edges.json
    #[arg(long, value_enum, default_value_t = OutputFormat::Combined)]
    pub format: OutputFormat,

    /// Also write records.json with every member's extracted attributes
    #[arg(long)]
    pub records: bool,
}

pub async fn run(args: GraphArgs, config: &Config) -> Result<(), AppError> {
    let pipeline = build_pipeline(config)?;
    let members = load_population(&args.members)?;

    let output = pipeline.run(&members).await?;

    let written = write_graph(&args.output, &output.graph, args.format).await?;
    if args.records {
        let backend = pipeline.extractor_backend();
        let stored: Vec<StoredRecord> = members
            .iter()
            .zip(&output.records)
            .map(|(member, record)| StoredRecord::new(member, record, backend))
            .collect();
        write_records(&args.output, &stored).await?;
    }

    for path in written {
        println!("{}", path.display());
    }
    info!(
        members = members.len(),
        edges = output.graph.edges.len(),
        isolated = output.graph.isolated_count(),
        "Done"
    );
    Ok(())
}
