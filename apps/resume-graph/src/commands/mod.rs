//! CLI subcommands and the wiring they share.
//!
//! Backends are chosen once from `Config` and handed out as trait objects;
//! nothing below this point branches on configuration again.

pub mod compare;
pub mod graph;
pub mod search;

use std::sync::Arc;

use tracing::info;

use crate::acquisition::ResumeFetcher;
use crate::config::{Config, EmbedderKind, ExtractorKind, PairScorerKind};
use crate::errors::AppError;
use crate::extraction::{HeuristicExtractor, LlmExtractor, ResumeExtractor};
use crate::llm_client::{self, LlmClient};
use crate::pipeline::{Pipeline, ScoringBackend};
use crate::scoring::{CategoryMatcher, Embedder, LlmPairScorer, RemoteEmbedder, TfidfEmbedder};

fn build_llm(config: &Config) -> Result<Option<LlmClient>, AppError> {
    let needs_llm =
        config.extractor == ExtractorKind::Llm || config.pair_scorer == PairScorerKind::Llm;
    if !needs_llm {
        return Ok(None);
    }
    let api_key = config
        .anthropic_api_key
        .clone()
        .ok_or_else(|| AppError::Config("ANTHROPIC_API_KEY is not set".to_string()))?;
    let llm = LlmClient::new(api_key).map_err(|e| AppError::Llm(e.to_string()))?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);
    Ok(Some(llm))
}

fn build_extractor(
    config: &Config,
    llm: Option<&LlmClient>,
) -> Result<Arc<dyn ResumeExtractor>, AppError> {
    match (config.extractor, llm) {
        (ExtractorKind::Llm, Some(llm)) => Ok(Arc::new(LlmExtractor::new(llm.clone()))),
        (ExtractorKind::Llm, None) => Err(AppError::Config(
            "LLM extractor selected without an LLM client".to_string(),
        )),
        (ExtractorKind::Heuristic, _) => {
            let extractor = config
                .extraction_rules()
                .and_then(|rules| HeuristicExtractor::from_rules(&rules))
                .map_err(|e| AppError::Config(format!("{e:#}")))?;
            Ok(Arc::new(extractor))
        }
    }
}

fn build_embedder(config: &Config) -> Result<Arc<dyn Embedder>, AppError> {
    match (config.embedder, &config.remote_embedding) {
        (EmbedderKind::Tfidf, _) => Ok(Arc::new(TfidfEmbedder::new())),
        (EmbedderKind::Remote, Some(remote)) => {
            let embedder = RemoteEmbedder::new(
                remote.url.clone(),
                remote.model.clone(),
                remote.api_key.clone(),
            )
            .map_err(|e| AppError::Internal(e.into()))?;
            Ok(Arc::new(embedder))
        }
        (EmbedderKind::Remote, None) => Err(AppError::Config(
            "remote embedder selected without EMBEDDING_URL/EMBEDDING_MODEL".to_string(),
        )),
    }
}

fn build_scoring(config: &Config, llm: Option<&LlmClient>) -> Result<ScoringBackend, AppError> {
    match (config.pair_scorer, llm) {
        (PairScorerKind::Composed, _) => Ok(ScoringBackend::Composed {
            embedder: build_embedder(config)?,
            matcher: CategoryMatcher::new(config.fuzzy_threshold),
            params: config.blend,
        }),
        (PairScorerKind::Llm, Some(llm)) => Ok(ScoringBackend::Direct(Arc::new(
            LlmPairScorer::new(llm.clone(), config.concurrency, config.blend.precision),
        ))),
        (PairScorerKind::Llm, None) => Err(AppError::Config(
            "LLM pair scorer selected without an LLM client".to_string(),
        )),
    }
}

pub fn build_pipeline(config: &Config) -> Result<Pipeline, AppError> {
    let llm = build_llm(config)?;
    let extractor = build_extractor(config, llm.as_ref())?;
    let scoring = build_scoring(config, llm.as_ref())?;
    let source = ResumeFetcher::new().map_err(|e| AppError::Internal(e.into()))?;

    Ok(Pipeline::new(
        Arc::new(source),
        extractor,
        scoring,
        config.weights.clone(),
        config.graph,
        config.concurrency,
    ))
}
