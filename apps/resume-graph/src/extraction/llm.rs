//! LLM-backed extractor. Same contract as the heuristic one: any failure
//! (HTTP, API, unparsable answer) is logged and yields a record with empty
//! categories.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

use crate::extraction::prompts::EXTRACT_PROMPT_TEMPLATE;
use crate::extraction::rules::normalize_phrase;
use crate::extraction::ResumeExtractor;
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::LlmClient;
use crate::models::AttributeRecord;

static YEAR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b20\d{2}\b").unwrap());

/// Profile shape requested from the model. Every field tolerates being
/// missing, `null`, a bare string, or a list containing non-strings.
#[derive(Debug, Default, Deserialize)]
pub struct LlmResumeProfile {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub graduation_year: Option<Value>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub majors: Vec<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub experiences: Vec<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub skills: Vec<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub interests: Vec<String>,
}

impl LlmResumeProfile {
    /// Normalizes the model's answer the same way the heuristic extractor
    /// normalizes its own matches.
    pub fn into_record(self, text: &str) -> AttributeRecord {
        let graduation_years = match self.graduation_year {
            Some(Value::Number(n)) => YEAR_RE
                .find_iter(&n.to_string())
                .map(|m| m.as_str().to_string())
                .collect(),
            Some(Value::String(s)) => YEAR_RE
                .find_iter(&s)
                .map(|m| m.as_str().to_string())
                .collect(),
            _ => BTreeSet::new(),
        };

        AttributeRecord {
            graduation_years,
            majors: lowercase_set(self.majors),
            affiliations: self
                .experiences
                .iter()
                .map(|e| normalize_phrase(e))
                .filter(|e| !e.is_empty())
                .collect(),
            skills: lowercase_set(self.skills),
            interests: lowercase_set(self.interests),
            full_text: text.to_string(),
        }
    }
}

pub struct LlmExtractor {
    llm: LlmClient,
}

impl LlmExtractor {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl ResumeExtractor for LlmExtractor {
    async fn extract(&self, text: &str) -> AttributeRecord {
        if text.trim().is_empty() {
            return AttributeRecord::from_text(text);
        }

        let prompt = EXTRACT_PROMPT_TEMPLATE.replace("{resume_text}", text);
        match self
            .llm
            .call_json::<LlmResumeProfile>(&prompt, JSON_ONLY_SYSTEM)
            .await
        {
            Ok(profile) => profile.into_record(text),
            Err(e) => {
                warn!("LLM extraction failed, using empty record: {e}");
                AttributeRecord::from_text(text)
            }
        }
    }

    fn backend(&self) -> &'static str {
        "llm"
    }
}

fn lowercase_set(values: Vec<String>) -> BTreeSet<String> {
    values
        .iter()
        .map(|v| normalize_phrase(v).to_lowercase())
        .filter(|v| !v.is_empty())
        .collect()
}

fn lenient_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        Some(Value::String(s)) => s.split(',').map(|p| p.trim().to_string()).collect(),
        _ => Vec::new(),
    })
}
