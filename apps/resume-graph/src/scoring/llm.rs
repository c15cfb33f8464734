//! LLM-backed pair scorer. Same contract as the composer: a score in [0, 1]
//! for every pair. Any failure scores the pair 0.0.

use std::sync::LazyLock;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use regex::Regex;
use tracing::{error, info, warn};

use crate::llm_client::prompts::NUMBER_ONLY_SYSTEM;
use crate::llm_client::LlmClient;
use crate::models::AttributeRecord;
use crate::scoring::category::CategoryWeights;
use crate::scoring::composer::round_to;
use crate::scoring::pairs::PairScores;
use crate::scoring::prompts::PAIR_SCORE_PROMPT_TEMPLATE;
use crate::scoring::PairScorer;

static NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-?\d+(?:\.\d+)?").unwrap());

pub struct LlmPairScorer {
    llm: LlmClient,
    concurrency: usize,
    precision: u32,
}

impl LlmPairScorer {
    pub fn new(llm: LlmClient, concurrency: usize, precision: u32) -> Self {
        Self {
            llm,
            concurrency: concurrency.max(1),
            precision,
        }
    }

    fn build_prompt(
        a: &AttributeRecord,
        b: &AttributeRecord,
        weights: &CategoryWeights,
    ) -> Result<String, serde_json::Error> {
        let weights = weights
            .iter()
            .map(|(category, weight)| format!("- {}: {weight}", category.title()))
            .collect::<Vec<_>>()
            .join("\n");
        Ok(PAIR_SCORE_PROMPT_TEMPLATE
            .replace("{weights}", &weights)
            .replace("{profile_a}", &serde_json::to_string_pretty(a)?)
            .replace("{profile_b}", &serde_json::to_string_pretty(b)?))
    }
}

#[async_trait]
impl PairScorer for LlmPairScorer {
    async fn score(
        &self,
        a: &AttributeRecord,
        b: &AttributeRecord,
        weights: &CategoryWeights,
    ) -> f64 {
        let prompt = match Self::build_prompt(a, b, weights) {
            Ok(p) => p,
            Err(e) => {
                warn!("Could not render pair-score prompt: {e}");
                return 0.0;
            }
        };

        match self.llm.call_text(&prompt, NUMBER_ONLY_SYSTEM).await {
            Ok(answer) => match parse_score(&answer) {
                Some(score) => round_to(score, self.precision),
                None => {
                    warn!(answer = %answer, "LLM pair score was not a number, using 0.0");
                    0.0
                }
            },
            Err(e) => {
                warn!("LLM pair scoring failed, using 0.0: {e}");
                0.0
            }
        }
    }

    async fn score_all(&self, records: &[AttributeRecord], weights: &CategoryWeights) -> PairScores {
        let n = records.len();
        info!(
            pairs = PairScores::pair_count(n),
            concurrency = self.concurrency,
            "Scoring pairs with LLM"
        );

        let values: Vec<f64> = stream::iter(PairScores::pairs(n))
            .map(|(i, j)| self.score(&records[i], &records[j], weights))
            .buffered(self.concurrency)
            .collect()
            .await;

        PairScores::from_values(n, values).unwrap_or_else(|| {
            error!("LLM pair scores incomplete, scoring every pair 0.0");
            PairScores::from_fn(n, |_, _| 0.0)
        })
    }

    fn backend(&self) -> &'static str {
        "llm"
    }
}

/// First number in the answer, clamped to [0, 1].
pub fn parse_score(answer: &str) -> Option<f64> {
    let value: f64 = NUMBER_RE.find(answer)?.as_str().parse().ok()?;
    value.is_finite().then(|| value.clamp(0.0, 1.0))
}
