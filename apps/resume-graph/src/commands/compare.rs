use std::sync::Arc;

use clap::Args;

use crate::acquisition::{DocumentSource, ResumeFetcher};
use crate::commands::{build_embedder, build_extractor, build_llm};
use crate::config::{Config, EmbedderKind, PairScorerKind};
use crate::errors::AppError;
use crate::scoring::{
    CategoryMatcher, CorpusSimilarity, LlmPairScorer, PairScorer, PairwiseTfidf, SemanticScorer,
    SimilarityComposer, SimilarityReport,
};

#[derive(Debug, Args)]
pub struct CompareArgs {
    /// First resume: a local path or an http(s) URL
    pub first: String,

    /// Second resume: a local path or an http(s) URL
    pub second: String,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(args: CompareArgs, config: &Config) -> Result<(), AppError> {
    let llm = build_llm(config)?;
    let extractor = build_extractor(config, llm.as_ref())?;
    let fetcher = ResumeFetcher::new().map_err(|e| AppError::Internal(e.into()))?;

    let mut texts = Vec::with_capacity(2);
    for reference in [&args.first, &args.second] {
        let text = fetcher
            .fetch(reference)
            .await
            .map_err(|e| AppError::Input(format!("could not read '{reference}': {e}")))?;
        texts.push(text);
    }

    let a = extractor.extract(&texts[0]).await;
    let b = extractor.extract(&texts[1]).await;

    let semantic: Arc<dyn SemanticScorer> = match config.embedder {
        EmbedderKind::Tfidf => Arc::new(PairwiseTfidf::new()),
        EmbedderKind::Remote => {
            let embedder = build_embedder(config)?;
            Arc::new(CorpusSimilarity::build(embedder.as_ref(), &texts).await)
        }
    };
    let composer = SimilarityComposer::new(
        CategoryMatcher::new(config.fuzzy_threshold),
        semantic,
        config.blend,
    );
    let report = composer.explain(&a, &b, &config.weights);

    let llm_score = match (config.pair_scorer, llm) {
        (PairScorerKind::Llm, Some(llm)) => {
            let scorer = LlmPairScorer::new(llm, 1, config.blend.precision);
            Some(scorer.score(&a, &b, &config.weights).await)
        }
        _ => None,
    };

    print!("{}", render(&report, llm_score, args.json)?);
    Ok(())
}

/// Text report, or pretty JSON with `llm_score` added when present.
fn render(
    report: &SimilarityReport,
    llm_score: Option<f64>,
    json: bool,
) -> Result<String, AppError> {
    if json {
        let mut value = serde_json::to_value(report)?;
        if let (Some(score), Some(object)) = (llm_score, value.as_object_mut()) {
            object.insert("llm_score".to_string(), score.into());
        }
        return Ok(format!("{}\n", serde_json::to_string_pretty(&value)?));
    }

    let mut out = report.to_string();
    if let Some(score) = llm_score {
        out.push_str(&format!("LLM score:           {score:.4}\n"));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::models::Category;
    use crate::scoring::category::CategoryMatches;

    fn report() -> SimilarityReport {
        SimilarityReport {
            semantic_score: 0.6,
            category_score: 4.5,
            final_score: 0.525,
            matches: BTreeMap::from([(
                Category::Majors,
                CategoryMatches::Exact(vec!["economics".to_string()]),
            )]),
        }
    }

    #[test]
    fn test_render_text_appends_llm_score() {
        let text = render(&report(), Some(0.8), false).unwrap();
        assert!(text.starts_with("Semantic similarity: 0.6000\n"));
        assert!(text.contains("Shared Majors: economics\n"));
        assert!(text.ends_with("LLM score:           0.8000\n"));

        let plain = render(&report(), None, false).unwrap();
        assert!(!plain.contains("LLM score"));
    }

    #[test]
    fn test_render_json() {
        let value: serde_json::Value =
            serde_json::from_str(&render(&report(), Some(0.8), true).unwrap()).unwrap();
        assert_eq!(value["final_score"], 0.525);
        assert_eq!(value["llm_score"], 0.8);
        assert_eq!(value["matches"]["majors"][0], "economics");

        let value: serde_json::Value =
            serde_json::from_str(&render(&report(), None, true).unwrap()).unwrap();
        assert!(value.get("llm_score").is_none());
    }
}
