use std::path::PathBuf;

use clap::Args;
use tracing::info;

use crate::commands::build_pipeline;
use crate::config::Config;
use crate::errors::AppError;
use crate::models::member::load_population;
use crate::search::find_members;

#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Text to look for in majors, affiliations, interests and skills
    pub term: String,

    /// Member export: a JSON object keyed by member id
    #[arg(short, long, default_value = "members.json")]
    pub members: PathBuf,
}

pub async fn run(args: SearchArgs, config: &Config) -> Result<(), AppError> {
    if args.term.trim().is_empty() {
        return Err(AppError::Input("search term is empty".to_string()));
    }

    let pipeline = build_pipeline(config)?;
    let members = load_population(&args.members)?;
    let records = pipeline.extract_population(&members).await;

    let hits = find_members(&members, &records, &args.term);
    info!(term = %args.term, hits = hits.len(), "Search finished");
    for member in hits {
        println!("{}\t{}", member.id, member.display_name);
    }
    Ok(())
}
