//! Pair scoring.
//!
//! Default: `SimilarityComposer` blends a weighted category overlap
//! (`CategoryMatcher`) with whole-document similarity (`SemanticScorer`).
//! Alternate: `LlmPairScorer` asks the LLM for a score directly.
//!
//! Both implement `PairScorer`; the pipeline holds an `Arc<dyn PairScorer>`
//! chosen at startup.

pub mod category;
pub mod composer;
pub mod embedding;
pub mod llm;
pub mod pairs;
pub mod prompts;
pub mod semantic;

use async_trait::async_trait;

use crate::models::AttributeRecord;

pub use category::{CategoryMatcher, CategoryWeights};
pub use composer::{BlendParams, SimilarityComposer, SimilarityReport};
pub use embedding::{Embedder, RemoteEmbedder, TfidfEmbedder};
pub use llm::LlmPairScorer;
pub use pairs::PairScores;
pub use semantic::{CorpusSimilarity, PairwiseTfidf, SemanticScorer};

/// Scores pairs of records into [0, 1]. Scoring never fails: collaborator
/// errors fall back to 0 for the affected component or pair.
#[async_trait]
pub trait PairScorer: Send + Sync {
    async fn score(
        &self,
        a: &AttributeRecord,
        b: &AttributeRecord,
        weights: &CategoryWeights,
    ) -> f64;

    /// Scores every unordered pair of `records`.
    async fn score_all(&self, records: &[AttributeRecord], weights: &CategoryWeights) -> PairScores;

    fn backend(&self) -> &'static str;
}
