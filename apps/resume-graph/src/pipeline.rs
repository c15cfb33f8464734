//! Population pipeline: fetch → extract → score every pair → graph.
//!
//! Records are fully built before any scorer reads them and are shared
//! read-only afterwards. Per-member failures degrade that member to empty
//! text or an empty record; they never abort the batch.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::info;

use crate::acquisition::{fetch_or_empty, DocumentSource};
use crate::errors::AppError;
use crate::extraction::ResumeExtractor;
use crate::graph::{build_graph, GraphOptions};
use crate::models::{AttributeRecord, Graph, Member};
use crate::scoring::{
    BlendParams, CategoryMatcher, CategoryWeights, CorpusSimilarity, Embedder, PairScorer,
    PairScores, SimilarityComposer,
};

/// How pair scores are produced.
pub enum ScoringBackend {
    /// Category overlap blended with corpus-wide embedding similarity. The
    /// population is embedded once, after extraction.
    Composed {
        embedder: Arc<dyn Embedder>,
        matcher: CategoryMatcher,
        params: BlendParams,
    },
    /// Any self-contained pair scorer, e.g. the LLM one.
    Direct(Arc<dyn PairScorer>),
}

impl ScoringBackend {
    /// Readies a scorer for this population.
    pub async fn prepare(&self, records: &[AttributeRecord]) -> Arc<dyn PairScorer> {
        match self {
            ScoringBackend::Composed {
                embedder,
                matcher,
                params,
            } => {
                let texts: Vec<String> = records.iter().map(|r| r.full_text.clone()).collect();
                let corpus = CorpusSimilarity::build(embedder.as_ref(), &texts).await;
                Arc::new(SimilarityComposer::new(
                    matcher.clone(),
                    Arc::new(corpus),
                    *params,
                ))
            }
            ScoringBackend::Direct(scorer) => Arc::clone(scorer),
        }
    }
}

/// Everything a graph run produced.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub graph: Graph,
    pub records: Vec<AttributeRecord>,
}

pub struct Pipeline {
    source: Arc<dyn DocumentSource>,
    extractor: Arc<dyn ResumeExtractor>,
    scoring: ScoringBackend,
    weights: CategoryWeights,
    graph_options: GraphOptions,
    concurrency: usize,
}

impl Pipeline {
    pub fn new(
        source: Arc<dyn DocumentSource>,
        extractor: Arc<dyn ResumeExtractor>,
        scoring: ScoringBackend,
        weights: CategoryWeights,
        graph_options: GraphOptions,
        concurrency: usize,
    ) -> Self {
        Self {
            source,
            extractor,
            scoring,
            weights,
            graph_options,
            concurrency: concurrency.max(1),
        }
    }

    pub fn extractor_backend(&self) -> &'static str {
        self.extractor.backend()
    }

    /// Fetches and extracts every member with bounded concurrency. Output is
    /// index-aligned with `members`.
    pub async fn extract_population(&self, members: &[Member]) -> Vec<AttributeRecord> {
        info!(
            members = members.len(),
            extractor = self.extractor.backend(),
            concurrency = self.concurrency,
            "Extracting records"
        );

        let records: Vec<AttributeRecord> = stream::iter(members)
            .map(|member| async move {
                let text = fetch_or_empty(self.source.as_ref(), member).await;
                self.extractor.extract(&text).await
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let empty = records.iter().filter(|r| !r.has_categories()).count();
        info!(records = records.len(), empty, "Extraction finished");
        records
    }

    pub async fn run(&self, members: &[Member]) -> Result<PipelineOutput, AppError> {
        let records = self.extract_population(members).await;

        let scorer = self.scoring.prepare(&records).await;
        info!(
            scorer = scorer.backend(),
            pairs = PairScores::pair_count(members.len()),
            "Scoring pairs"
        );
        let scores = scorer.score_all(&records, &self.weights).await;

        let graph = build_graph(members, &scores, &self.graph_options)?;
        Ok(PipelineOutput { graph, records })
    }
}
