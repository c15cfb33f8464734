//! Whole-document similarity in [0, 1].
//!
//! The pair loop is synchronous and CPU-bound, so scorers here never await.
//! `CorpusSimilarity` embeds the population once up front; `PairwiseTfidf`
//! fits on just the two texts it is asked about.

use std::collections::{HashMap, HashSet};

use tracing::{error, info};

use crate::scoring::embedding::{cosine_similarity, Embedder, TfidfEmbedder};

pub trait SemanticScorer: Send + Sync {
    /// Similarity of two documents in [0, 1]. Either text blank → 0.
    fn similarity(&self, a: &str, b: &str) -> f64;
}

/// Maps a raw cosine onto [0, 1]: negatives clamp to 0, NaN becomes 0.
pub fn normalize_cosine(raw: f64) -> f64 {
    if raw.is_nan() {
        0.0
    } else {
        raw.clamp(0.0, 1.0)
    }
}

fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

/// Vectors for every distinct non-blank text of a population, looked up by
/// text at scoring time.
#[derive(Debug, Default)]
pub struct CorpusSimilarity {
    vectors: HashMap<String, Vec<f32>>,
}

impl CorpusSimilarity {
    /// Embeds every distinct non-blank text in a single embedder call.
    ///
    /// An embedder failure is logged and yields a scorer that returns 0 for
    /// every pair, leaving scores to the category component.
    pub async fn build(embedder: &dyn Embedder, texts: &[String]) -> Self {
        let mut distinct: Vec<String> = Vec::new();
        let mut seen = HashSet::new();
        for text in texts.iter().filter(|t| !is_blank(t)) {
            if seen.insert(text.as_str()) {
                distinct.push(text.clone());
            }
        }

        if distinct.is_empty() {
            return Self::default();
        }

        match embedder.embed(&distinct).await {
            Ok(vectors) if vectors.len() == distinct.len() => {
                info!(
                    embedder = embedder.name(),
                    documents = distinct.len(),
                    "Embedded population"
                );
                Self {
                    vectors: distinct.into_iter().zip(vectors).collect(),
                }
            }
            Ok(vectors) => {
                error!(
                    expected = distinct.len(),
                    got = vectors.len(),
                    "Embedder returned wrong number of vectors, semantic scores disabled"
                );
                Self::default()
            }
            Err(e) => {
                error!(embedder = embedder.name(), "Embedding failed, semantic scores disabled: {e}");
                Self::default()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

impl SemanticScorer for CorpusSimilarity {
    fn similarity(&self, a: &str, b: &str) -> f64 {
        if is_blank(a) || is_blank(b) {
            return 0.0;
        }
        match (self.vectors.get(a), self.vectors.get(b)) {
            (Some(va), Some(vb)) => normalize_cosine(cosine_similarity(va, vb)),
            _ => 0.0,
        }
    }
}

/// TF-IDF fitted on the two texts being compared.
#[derive(Debug, Default)]
pub struct PairwiseTfidf {
    embedder: TfidfEmbedder,
}

impl PairwiseTfidf {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SemanticScorer for PairwiseTfidf {
    fn similarity(&self, a: &str, b: &str) -> f64 {
        if is_blank(a) || is_blank(b) {
            return 0.0;
        }
        let rows = self.embedder.fit_transform(&[a.to_string(), b.to_string()]);
        normalize_cosine(cosine_similarity(&rows[0], &rows[1]))
    }
}
