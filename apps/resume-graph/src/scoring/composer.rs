//! Similarity composer. Blends the category score and the semantic score.
//!
//! `final = α·sem + (1 − α)·min(categoryScore / D, 1)`, clamped to [0, 1] and
//! rounded. Both components are symmetric in their arguments, so the final
//! score is too.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, error};

use crate::models::{AttributeRecord, Category};
use crate::scoring::category::{CategoryMatcher, CategoryMatches, CategoryWeights};
use crate::scoring::pairs::PairScores;
use crate::scoring::semantic::SemanticScorer;
use crate::scoring::PairScorer;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlendParams {
    /// Weight of the semantic component.
    pub alpha: f64,
    /// Category score that saturates the category component.
    pub denominator: f64,
    /// Decimal places kept in the final score.
    pub precision: u32,
}

impl Default for BlendParams {
    fn default() -> Self {
        Self {
            alpha: 0.5,
            denominator: 10.0,
            precision: 4,
        }
    }
}

/// Breakdown of one pair's score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarityReport {
    pub semantic_score: f64,
    pub category_score: f64,
    pub final_score: f64,
    pub matches: BTreeMap<Category, CategoryMatches>,
}

impl fmt::Display for SimilarityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Semantic similarity: {:.4}", self.semantic_score)?;
        writeln!(f, "Category score:      {:.2}", self.category_score)?;
        writeln!(f, "Final score:         {:.4}", self.final_score)?;
        for (category, found) in &self.matches {
            let shared = found.describe();
            if shared.is_empty() {
                writeln!(f, "Shared {}: none", category.title())?;
            } else {
                writeln!(f, "Shared {}: {}", category.title(), shared.join(", "))?;
            }
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct SimilarityComposer {
    matcher: CategoryMatcher,
    semantic: Arc<dyn SemanticScorer>,
    params: BlendParams,
}

impl SimilarityComposer {
    pub fn new(
        matcher: CategoryMatcher,
        semantic: Arc<dyn SemanticScorer>,
        params: BlendParams,
    ) -> Self {
        Self {
            matcher,
            semantic,
            params,
        }
    }

    pub fn params(&self) -> BlendParams {
        self.params
    }

    pub fn score_sync(
        &self,
        a: &AttributeRecord,
        b: &AttributeRecord,
        weights: &CategoryWeights,
    ) -> f64 {
        self.explain(a, b, weights).final_score
    }

    pub fn explain(
        &self,
        a: &AttributeRecord,
        b: &AttributeRecord,
        weights: &CategoryWeights,
    ) -> SimilarityReport {
        let comparison = self.matcher.compare(a, b, weights);
        let semantic_score = self.semantic.similarity(&a.full_text, &b.full_text);
        let final_score = self.blend(comparison.score, semantic_score);

        SimilarityReport {
            semantic_score,
            category_score: comparison.score,
            final_score,
            matches: comparison.matches,
        }
    }

    pub fn blend(&self, category_score: f64, semantic_score: f64) -> f64 {
        let BlendParams {
            alpha,
            denominator,
            precision,
        } = self.params;
        let category_component = if denominator > 0.0 {
            (category_score / denominator).min(1.0)
        } else {
            0.0
        };
        let blended = alpha * semantic_score + (1.0 - alpha) * category_component;
        round_to(blended.clamp(0.0, 1.0), precision)
    }
}

#[async_trait]
impl PairScorer for SimilarityComposer {
    async fn score(
        &self,
        a: &AttributeRecord,
        b: &AttributeRecord,
        weights: &CategoryWeights,
    ) -> f64 {
        self.score_sync(a, b, weights)
    }

    /// CPU-bound: the pair loop runs on the rayon pool from a blocking task,
    /// so async workers stay free while it runs.
    async fn score_all(&self, records: &[AttributeRecord], weights: &CategoryWeights) -> PairScores {
        let n = records.len();
        let composer = self.clone();
        let records = records.to_vec();
        let weights = weights.clone();

        let scored = tokio::task::spawn_blocking(move || {
            PairScores::par_from_fn(records.len(), |i, j| {
                let score = composer.score_sync(&records[i], &records[j], &weights);
                debug!(i, j, score, "Scored pair");
                score
            })
        })
        .await;

        match scored {
            Ok(scores) => scores,
            Err(e) => {
                error!("Pair scoring task failed, all pairs scored 0: {e}");
                PairScores::from_fn(n, |_, _| 0.0)
            }
        }
    }

    fn backend(&self) -> &'static str {
        "composed"
    }
}

/// Rounds half away from zero to `precision` decimal places.
pub fn round_to(value: f64, precision: u32) -> f64 {
    let factor = 10f64.powi(precision as i32);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::{Duration, Instant};

    use super::*;
    use crate::scoring::semantic::PairwiseTfidf;

    /// Returns the same similarity for every non-blank pair.
    struct FixedSemantic(f64);

    impl SemanticScorer for FixedSemantic {
        fn similarity(&self, a: &str, b: &str) -> f64 {
            if a.trim().is_empty() || b.trim().is_empty() {
                0.0
            } else {
                self.0
            }
        }
    }

    /// Blocks each call until `open` is set, giving up after two seconds
    /// with a score of 0.
    struct GatedSemantic {
        open: Arc<AtomicBool>,
    }

    impl SemanticScorer for GatedSemantic {
        fn similarity(&self, _a: &str, _b: &str) -> f64 {
            let deadline = Instant::now() + Duration::from_secs(2);
            while !self.open.load(Ordering::SeqCst) {
                if Instant::now() > deadline {
                    return 0.0;
                }
                std::thread::sleep(Duration::from_millis(5));
            }
            1.0
        }
    }

    fn composer(semantic: f64) -> SimilarityComposer {
        SimilarityComposer::new(
            CategoryMatcher::default(),
            Arc::new(FixedSemantic(semantic)),
            BlendParams::default(),
        )
    }

    fn sample(text: &str, majors: &[&str], clubs: &[&str]) -> AttributeRecord {
        let mut record = AttributeRecord::from_text(text);
        record.majors = majors.iter().map(|s| s.to_string()).collect();
        record.affiliations = clubs.iter().map(|s| s.to_string()).collect();
        record
    }

    #[test]
    fn test_blend_formula() {
        let c = composer(0.0);
        assert_eq!(c.blend(4.5, 0.6), 0.525);
        assert_eq!(c.blend(25.0, 1.0), 1.0);
        assert_eq!(c.blend(0.0, 0.0), 0.0);
    }

    #[test]
    fn test_blend_rounds_to_precision() {
        let c = SimilarityComposer::new(
            CategoryMatcher::default(),
            Arc::new(FixedSemantic(0.0)),
            BlendParams {
                precision: 2,
                ..BlendParams::default()
            },
        );
        assert_eq!(c.blend(1.0, 0.123456), 0.11);
    }

    #[test]
    fn test_zero_denominator_disables_category_component() {
        let c = SimilarityComposer::new(
            CategoryMatcher::default(),
            Arc::new(FixedSemantic(0.0)),
            BlendParams {
                denominator: 0.0,
                ..BlendParams::default()
            },
        );
        assert_eq!(c.blend(100.0, 0.4), 0.2);
    }

    #[test]
    fn test_empty_text_members_score_category_only() {
        let a = sample("", &["computer science"], &["Debate Club"]);
        let b = sample("", &["computer science", "economics"], &["Debate Club"]);
        let weights = CategoryWeights::new()
            .with(Category::Majors, 2.5)
            .with(Category::Affiliations, 2.0);

        let report = composer(0.9).explain(&a, &b, &weights);
        assert_eq!(report.semantic_score, 0.0);
        assert_eq!(report.category_score, 4.5);
        assert_eq!(report.final_score, 0.225);
    }

    #[test]
    fn test_score_is_symmetric_and_bounded() {
        let records = [
            sample("python finance debate", &["economics"], &["ACM", "Debate Club"]),
            sample("python hiking piano", &["computer science"], &["ACM Club"]),
            sample("", &[], &[]),
            sample("investment banking", &["economics", "finance"], &["Investment Group"]),
        ];
        let c = SimilarityComposer::new(
            CategoryMatcher::default(),
            Arc::new(PairwiseTfidf::new()),
            BlendParams::default(),
        );
        let weights = CategoryWeights::standard();

        for a in &records {
            for b in &records {
                let ab = c.score_sync(a, b, &weights);
                let ba = c.score_sync(b, a, &weights);
                assert_eq!(ab, ba);
                assert!((0.0..=1.0).contains(&ab));
            }
        }
    }

    #[test]
    fn test_report_display_lists_shared_values() {
        let a = sample("x", &["economics"], &["ACM"]);
        let b = sample("x", &["economics"], &["ACM Club"]);
        let weights = CategoryWeights::new()
            .with(Category::Majors, 2.5)
            .with(Category::Affiliations, 2.0)
            .with(Category::Skills, 1.5);
        let text = composer(1.0).explain(&a, &b, &weights).to_string();

        assert!(text.contains("Shared Majors: economics"));
        assert!(text.contains("Shared Affiliations: ACM ~ ACM Club"));
        assert!(text.contains("Shared Skills: none"));
        assert!(text.contains("Final score:         0.7250"));
    }

    #[tokio::test]
    async fn test_score_all_covers_every_pair() {
        let records = vec![
            sample("a", &["economics"], &[]),
            sample("b", &["economics"], &[]),
            sample("c", &["history"], &[]),
        ];
        let weights = CategoryWeights::new().with(Category::Majors, 2.5);
        let c = composer(0.0);

        let scores = c.score_all(&records, &weights).await;
        assert_eq!(scores.len(), 3);
        assert_eq!(scores.get(0, 1), Some(0.125));
        assert_eq!(scores.get(0, 2), Some(0.0));
        assert_eq!(scores.get(1, 2), Some(0.0));
        assert_eq!(c.score(&records[0], &records[1], &weights).await, 0.125);
    }

    #[tokio::test]
    async fn test_score_all_leaves_runtime_free() {
        let open = Arc::new(AtomicBool::new(false));
        let c = SimilarityComposer::new(
            CategoryMatcher::default(),
            Arc::new(GatedSemantic {
                open: Arc::clone(&open),
            }),
            BlendParams::default(),
        );
        let records = vec![sample("a", &[], &[]), sample("b", &[], &[]), sample("c", &[], &[])];
        let weights = CategoryWeights::standard();

        let (scores, _) = tokio::join!(c.score_all(&records, &weights), async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            open.store(true, Ordering::SeqCst);
        });

        assert_eq!(scores.len(), 3);
        assert!(PairScores::pairs(3).all(|(i, j)| scores.get(i, j) == Some(0.5)));
    }
}
