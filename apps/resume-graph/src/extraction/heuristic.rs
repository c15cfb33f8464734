//! Heuristic extractor. Regex-level rules over raw resume text.
//!
//! Deterministic and infallible: the worst case is a record whose categories
//! are all empty. Affiliation detection errs towards false negatives, since a
//! spurious organization name pollutes every pair that shares it.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;

use crate::extraction::rules::{normalize_phrase, CompiledRules, ExtractionRules};
use crate::extraction::ResumeExtractor;
use crate::models::AttributeRecord;

static GRADUATION_YEAR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sept?(?:ember)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\.?,?\s*(20\d{2})\b",
    )
    .unwrap()
});

static MAJOR_SPLIT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\band\b|&|,").unwrap());

static OPEN_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b[a-z]{3,29}\b").unwrap());

pub struct HeuristicExtractor {
    rules: CompiledRules,
}

impl HeuristicExtractor {
    pub fn new(rules: CompiledRules) -> Self {
        Self { rules }
    }

    pub fn from_rules(rules: &ExtractionRules) -> anyhow::Result<Self> {
        Ok(Self::new(rules.compile()?))
    }

    pub fn extract_sync(&self, text: &str) -> AttributeRecord {
        let lower = text.to_lowercase();

        AttributeRecord {
            graduation_years: extract_graduation_years(text),
            majors: self.extract_majors(&lower),
            affiliations: self.extract_affiliations(text),
            skills: extract_terms(self.rules.skill_vocabulary.as_ref(), &lower),
            interests: extract_terms(self.rules.interest_vocabulary.as_ref(), &lower),
            full_text: text.to_string(),
        }
    }

    fn extract_majors(&self, lower: &str) -> BTreeSet<String> {
        let mut majors = BTreeSet::new();

        for pattern in &self.rules.degree_patterns {
            for captures in pattern.captures_iter(lower) {
                let Some(phrase) = captures.get(1) else {
                    continue;
                };
                for part in MAJOR_SPLIT_RE.split(phrase.as_str()) {
                    if let Some(major) = self.clean_major(part) {
                        majors.insert(major);
                    }
                }
            }
        }

        if majors.is_empty() {
            if let Some(vocab) = &self.rules.major_vocabulary {
                majors.extend(vocab.find_iter(lower).map(|m| normalize_phrase(m.as_str())));
            }
        }

        majors
    }

    /// Cuts a phrase fragment at its first terminator word.
    fn clean_major(&self, fragment: &str) -> Option<String> {
        let words: Vec<&str> = fragment
            .split_whitespace()
            .take_while(|w| !self.rules.phrase_terminators.contains(*w))
            .collect();
        let major = words.join(" ");
        (major.len() > 1).then_some(major)
    }

    fn extract_affiliations(&self, text: &str) -> BTreeSet<String> {
        self.rules
            .affiliation
            .find_iter(text)
            .map(|m| normalize_phrase(m.as_str()))
            .filter(|candidate| !self.rules.is_blacklisted(candidate))
            .collect()
    }
}

#[async_trait]
impl ResumeExtractor for HeuristicExtractor {
    async fn extract(&self, text: &str) -> AttributeRecord {
        self.extract_sync(text)
    }

    fn backend(&self) -> &'static str {
        "heuristic"
    }
}

fn extract_graduation_years(text: &str) -> BTreeSet<String> {
    GRADUATION_YEAR_RE
        .captures_iter(text)
        .filter_map(|c| c.get(1).map(|y| y.as_str().to_string()))
        .collect()
}

/// Controlled-vocabulary hits, or every distinct 3–29 letter word when no
/// vocabulary is configured.
fn extract_terms(vocabulary: Option<&Regex>, lower: &str) -> BTreeSet<String> {
    match vocabulary {
        Some(vocab) => vocab
            .find_iter(lower)
            .map(|m| normalize_phrase(m.as_str()))
            .collect(),
        None => OPEN_TOKEN_RE
            .find_iter(lower)
            .map(|m| m.as_str().to_string())
            .collect(),
    }
}
