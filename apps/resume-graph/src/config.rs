use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{anyhow, bail, Context, Result};

use crate::extraction::ExtractionRules;
use crate::graph::GraphOptions;
use crate::scoring::category::DEFAULT_FUZZY_THRESHOLD;
use crate::scoring::{BlendParams, CategoryWeights};

const DEFAULT_WEIGHTS: &str =
    "graduation_years=3.0,majors=2.5,affiliations=2.0,skills=1.5,interests=1.0";
const MAX_PRECISION: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractorKind {
    Heuristic,
    Llm,
}

impl FromStr for ExtractorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "heuristic" => Ok(Self::Heuristic),
            "llm" => Ok(Self::Llm),
            other => Err(format!("expected 'heuristic' or 'llm', got '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairScorerKind {
    Composed,
    Llm,
}

impl FromStr for PairScorerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "composed" => Ok(Self::Composed),
            "llm" => Ok(Self::Llm),
            other => Err(format!("expected 'composed' or 'llm', got '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedderKind {
    Tfidf,
    Remote,
}

impl FromStr for EmbedderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tfidf" => Ok(Self::Tfidf),
            "remote" => Ok(Self::Remote),
            other => Err(format!("expected 'tfidf' or 'remote', got '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RemoteEmbeddingConfig {
    pub url: String,
    pub model: String,
    pub api_key: Option<String>,
}

/// Run configuration loaded from environment variables.
/// Every value is validated here, before any member data is touched.
#[derive(Debug, Clone)]
pub struct Config {
    pub weights: CategoryWeights,
    pub blend: BlendParams,
    pub fuzzy_threshold: f64,
    pub graph: GraphOptions,
    pub extractor: ExtractorKind,
    pub pair_scorer: PairScorerKind,
    pub embedder: EmbedderKind,
    pub anthropic_api_key: Option<String>,
    pub remote_embedding: Option<RemoteEmbeddingConfig>,
    pub extraction_rules_path: Option<PathBuf>,
    pub concurrency: usize,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup. Blank values count as
    /// unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let weights_raw = get("CATEGORY_WEIGHTS").unwrap_or_else(|| DEFAULT_WEIGHTS.to_string());
        let weights = CategoryWeights::parse(&weights_raw)
            .map_err(|e| anyhow!(e))
            .context("CATEGORY_WEIGHTS is invalid")?;

        let alpha = unit_interval("BLEND_ALPHA", parse_or(&get, "BLEND_ALPHA", 0.5)?)?;
        let fuzzy_threshold = unit_interval(
            "FUZZY_THRESHOLD",
            parse_or(&get, "FUZZY_THRESHOLD", DEFAULT_FUZZY_THRESHOLD)?,
        )?;
        let edge_threshold =
            unit_interval("EDGE_THRESHOLD", parse_or(&get, "EDGE_THRESHOLD", 0.15)?)?;

        let denominator: f64 = parse_or(&get, "CATEGORY_DENOMINATOR", 10.0)?;
        if !denominator.is_finite() || denominator <= 0.0 {
            bail!("CATEGORY_DENOMINATOR must be greater than 0, got {denominator}");
        }

        let precision: u32 = parse_or(&get, "SCORE_PRECISION", 4)?;
        if precision > MAX_PRECISION {
            bail!("SCORE_PRECISION must be at most {MAX_PRECISION}, got {precision}");
        }

        let weight_scale: f64 = parse_or(&get, "EDGE_WEIGHT_SCALE", 1.0)?;
        if !weight_scale.is_finite() || weight_scale <= 0.0 {
            bail!("EDGE_WEIGHT_SCALE must be greater than 0, got {weight_scale}");
        }

        let extractor: ExtractorKind = parse_or(&get, "EXTRACTOR", ExtractorKind::Heuristic)?;
        let pair_scorer: PairScorerKind = parse_or(&get, "PAIR_SCORER", PairScorerKind::Composed)?;
        let embedder: EmbedderKind = parse_or(&get, "EMBEDDER", EmbedderKind::Tfidf)?;

        let needs_llm = extractor == ExtractorKind::Llm || pair_scorer == PairScorerKind::Llm;
        let anthropic_api_key = if needs_llm {
            Some(require(&get, "ANTHROPIC_API_KEY")?)
        } else {
            get("ANTHROPIC_API_KEY")
        };

        let remote_embedding = match embedder {
            EmbedderKind::Remote => Some(RemoteEmbeddingConfig {
                url: require(&get, "EMBEDDING_URL")?,
                model: require(&get, "EMBEDDING_MODEL")?,
                api_key: get("EMBEDDING_API_KEY"),
            }),
            EmbedderKind::Tfidf => None,
        };

        let concurrency: usize = parse_or(&get, "CONCURRENCY", 8)?;
        if concurrency == 0 {
            bail!("CONCURRENCY must be at least 1");
        }

        Ok(Config {
            weights,
            blend: BlendParams {
                alpha,
                denominator,
                precision,
            },
            fuzzy_threshold,
            graph: GraphOptions {
                threshold: edge_threshold,
                weight_scale,
            },
            extractor,
            pair_scorer,
            embedder,
            anthropic_api_key,
            remote_embedding,
            extraction_rules_path: get("EXTRACTION_RULES_PATH").map(PathBuf::from),
            concurrency,
            rust_log: get("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Rule set for the heuristic extractor: the JSON override file when
    /// configured, the built-in rules otherwise.
    pub fn extraction_rules(&self) -> Result<ExtractionRules> {
        match &self.extraction_rules_path {
            Some(path) => ExtractionRules::from_json_file(path).with_context(|| {
                format!("EXTRACTION_RULES_PATH '{}' could not be loaded", path.display())
            }),
            None => Ok(ExtractionRules::default()),
        }
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow!("{e}"))
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        None => Ok(default),
    }
}

fn require<G>(get: &G, key: &str) -> Result<String>
where
    G: Fn(&str) -> Option<String>,
{
    get(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn unit_interval(key: &str, value: f64) -> Result<f64> {
    if !(0.0..=1.0).contains(&value) {
        bail!("{key} must be within [0, 1], got {value}");
    }
    Ok(value)
}
