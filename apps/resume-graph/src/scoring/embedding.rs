//! Embeddings: texts to fixed-length vectors, plus cosine similarity.
//!
//! `TfidfEmbedder` runs in-process and is the default. `RemoteEmbedder` talks
//! to an OpenAI-compatible `/embeddings` endpoint.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b[a-z][a-z]+\b").unwrap());

static STOP_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "about", "above", "after", "again", "against", "all", "also", "am", "an", "and", "any",
        "are", "as", "at", "be", "been", "before", "being", "below", "between", "both", "but",
        "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "etc",
        "few", "for", "from", "further", "had", "has", "have", "having", "he", "her", "here",
        "hers", "him", "his", "how", "if", "in", "into", "is", "it", "its", "itself", "just",
        "me", "more", "most", "my", "myself", "no", "nor", "not", "of", "off", "on", "once",
        "only", "or", "other", "our", "ours", "out", "over", "own", "same", "she", "should",
        "so", "some", "such", "than", "that", "the", "their", "them", "then", "there", "these",
        "they", "this", "those", "through", "to", "too", "under", "until", "up", "upon", "us",
        "very", "was", "we", "were", "what", "when", "where", "which", "while", "who", "whom",
        "why", "will", "with", "within", "would", "you", "your", "yours",
    ]
    .into_iter()
    .collect()
});

#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Embedding API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Embedding response malformed: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Expected {expected} embeddings, got {got}")]
    Shape { expected: usize, got: usize },
}

#[async_trait]
pub trait Embedder: Send + Sync {
    /// One vector per input text, same order, all the same length.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError>;

    fn name(&self) -> &'static str;
}

// ────────────────────────────────────────────────────────────────────────────
// TF-IDF
// ────────────────────────────────────────────────────────────────────────────

/// TF-IDF over the texts of a single `embed` call. Vectors from different
/// calls live in different spaces and must not be compared.
#[derive(Debug, Clone, Default)]
pub struct TfidfEmbedder;

impl TfidfEmbedder {
    pub fn new() -> Self {
        Self
    }

    pub fn fit_transform(&self, texts: &[String]) -> Vec<Vec<f32>> {
        let docs: Vec<Vec<String>> = texts.iter().map(|t| tokenize(t)).collect();

        let vocabulary: BTreeMap<&str, usize> = docs
            .iter()
            .flatten()
            .map(String::as_str)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .enumerate()
            .map(|(i, term)| (term, i))
            .collect();

        let mut document_frequency = vec![0usize; vocabulary.len()];
        for doc in &docs {
            let unique: HashSet<&str> = doc.iter().map(String::as_str).collect();
            for term in unique {
                document_frequency[vocabulary[term]] += 1;
            }
        }

        let n = docs.len() as f64;
        let idf: Vec<f64> = document_frequency
            .iter()
            .map(|&df| ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0)
            .collect();

        debug!(documents = docs.len(), terms = vocabulary.len(), "TF-IDF fitted");

        docs.iter()
            .map(|doc| {
                let mut row = vec![0.0f64; vocabulary.len()];
                for term in doc {
                    row[vocabulary[term.as_str()]] += 1.0;
                }
                for (value, weight) in row.iter_mut().zip(&idf) {
                    *value *= weight;
                }
                let norm = row.iter().map(|v| v * v).sum::<f64>().sqrt();
                row.into_iter()
                    .map(|v| if norm > 0.0 { (v / norm) as f32 } else { 0.0 })
                    .collect()
            })
            .collect()
    }
}

#[async_trait]
impl Embedder for TfidfEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        Ok(self.fit_transform(texts))
    }

    fn name(&self) -> &'static str {
        "tfidf"
    }
}

fn tokenize(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    TOKEN_RE
        .find_iter(&lower)
        .map(|m| m.as_str())
        .filter(|t| !STOP_WORDS.contains(t))
        .map(str::to_string)
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Remote
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingItem {
    #[serde(default)]
    index: Option<usize>,
    embedding: Vec<f32>,
}

#[derive(Debug, Clone)]
pub struct RemoteEmbedder {
    client: Client,
    url: String,
    model: String,
    api_key: Option<String>,
}

impl RemoteEmbedder {
    pub fn new(url: String, model: String, api_key: Option<String>) -> Result<Self, EmbedError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            url,
            model,
            api_key,
        })
    }
}

#[async_trait]
impl Embedder for RemoteEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut request = self.client.post(&self.url).json(&EmbeddingRequest {
            model: &self.model,
            input: texts,
        });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(EmbedError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        parse_embedding_response(&body, texts.len())
    }

    fn name(&self) -> &'static str {
        "remote"
    }
}

/// Orders `data[]` by `index` when present and checks one vector per input.
fn parse_embedding_response(body: &str, expected: usize) -> Result<Vec<Vec<f32>>, EmbedError> {
    let mut parsed: EmbeddingResponse = serde_json::from_str(body)?;
    if parsed.data.len() != expected {
        return Err(EmbedError::Shape {
            expected,
            got: parsed.data.len(),
        });
    }
    if parsed.data.iter().all(|item| item.index.is_some()) {
        parsed.data.sort_by_key(|item| item.index);
    }
    Ok(parsed.data.into_iter().map(|item| item.embedding).collect())
}

/// Raw cosine of two vectors. Zero-norm or mismatched lengths give 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_tokenize_drops_stop_words_and_short_tokens() {
        let tokens = tokenize("The Python and SQL analyst, a team of 3");
        assert_eq!(tokens, vec!["python", "sql", "analyst", "team"]);
    }

    #[test]
    fn test_tfidf_rows_are_unit_length() {
        let rows = TfidfEmbedder::new().fit_transform(&texts(&[
            "python sql finance",
            "python hiking piano",
        ]));
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].len(), rows[1].len());
        for row in &rows {
            let norm: f32 = row.iter().map(|v| v * v).sum::<f32>().sqrt();
            assert!((norm - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_tfidf_identical_texts_have_cosine_one() {
        let rows = TfidfEmbedder::new().fit_transform(&texts(&[
            "economics debate finance",
            "economics debate finance",
            "chemistry lab",
        ]));
        assert!((cosine_similarity(&rows[0], &rows[1]) - 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&rows[0], &rows[2]), 0.0);
    }

    #[test]
    fn test_tfidf_shared_rare_term_outweighs_common_term() {
        let rows = TfidfEmbedder::new().fit_transform(&texts(&[
            "student falcons",
            "student falcons",
            "student chess",
            "student piano",
        ]));
        let rare = cosine_similarity(&rows[0], &rows[1]);
        let common = cosine_similarity(&rows[0], &rows[2]);
        assert!(rare > common);
        assert!(common > 0.0);
    }

    #[test]
    fn test_stop_word_only_text_is_zero_vector() {
        let rows = TfidfEmbedder::new().fit_transform(&texts(&["the and of", "python"]));
        assert!(rows[0].iter().all(|v| *v == 0.0));
        assert_eq!(cosine_similarity(&rows[0], &rows[1]), 0.0);
    }

    #[test]
    fn test_cosine_edge_cases() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0]), 0.0);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_parse_embedding_response_orders_by_index() {
        let body = r#"{"data": [
            {"index": 1, "embedding": [0.0, 1.0]},
            {"index": 0, "embedding": [1.0, 0.0]}
        ]}"#;
        let vectors = parse_embedding_response(body, 2).unwrap();
        assert_eq!(vectors[0], vec![1.0, 0.0]);
        assert_eq!(vectors[1], vec![0.0, 1.0]);
    }

    #[test]
    fn test_parse_embedding_response_checks_count() {
        let body = r#"{"data": [{"embedding": [1.0]}]}"#;
        assert!(matches!(
            parse_embedding_response(body, 2),
            Err(EmbedError::Shape { expected: 2, got: 1 })
        ));
        assert!(matches!(
            parse_embedding_response("not json", 1),
            Err(EmbedError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn test_remote_embedder_with_no_texts_makes_no_request() {
        let embedder =
            RemoteEmbedder::new("http://127.0.0.1:9/embeddings".into(), "m".into(), None).unwrap();
        assert!(embedder.embed(&[]).await.unwrap().is_empty());
    }
}
