//! Extraction rule set — the injectable vocabulary, blacklist and pattern
//! configuration behind `HeuristicExtractor`.
//!
//! `ExtractionRules` is the serializable form (defaults built in, overridable
//! from a JSON file); `CompiledRules` holds the regexes built from it.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

const DEFAULT_DEGREE_PATTERNS: &[&str] = &[
    r"bachelor[^\n]*?\bin\s+([a-z][a-z ,&]*)",
    r"\bb\.?\s?[as]\.?\s+in\s+([a-z][a-z ,&]*)",
];

const DEFAULT_PHRASE_TERMINATORS: &[&str] = &[
    "minor", "minors", "gpa", "expected", "with", "honors", "graduation", "class", "cum",
    "january", "february", "march", "april", "may", "june", "july", "august", "september",
    "october", "november", "december", "jan", "feb", "mar", "apr", "jun", "jul", "aug", "sep",
    "sept", "oct", "nov", "dec",
];

const DEFAULT_MAJORS: &[&str] = &[
    "computer science",
    "mathematics",
    "economics",
    "data science",
    "finance",
    "electrical engineering",
];

const DEFAULT_BLACKLIST: &[&str] = &[
    "Bachelor of Arts",
    "Bachelor of Science",
    "High School",
    "College Park",
    "Evanston",
    "New York",
];

const DEFAULT_CONNECTORS: &[&str] = &["of", "for", "and", "the", "&"];

const DEFAULT_SKILLS: &[&str] = &["excel", "factset", "stata", "pitchbook", "html", "python", "sql"];

const DEFAULT_INTERESTS: &[&str] = &[
    "guitar",
    "piano",
    "basketball",
    "falcons",
    "birdwatching",
    "biking",
    "hiking",
    "documentaries",
];

/// Serializable extraction rule set. Any field missing from an override file
/// keeps its default; an explicit `null` vocabulary switches that category to
/// the open-token fallback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionRules {
    /// Regexes run against lowercased text; capture group 1 is the major phrase.
    pub degree_patterns: Vec<String>,
    /// Words that end a captured major phrase (e.g. "minor", month names).
    pub phrase_terminators: Vec<String>,
    /// Known majors, used only when no degree pattern matches.
    pub major_vocabulary: Vec<String>,
    pub affiliation_blacklist: Vec<String>,
    /// Lowercase words allowed between capitalized words of an organization name.
    pub affiliation_connectors: Vec<String>,
    pub skill_vocabulary: Option<Vec<String>>,
    pub interest_vocabulary: Option<Vec<String>>,
}

impl Default for ExtractionRules {
    fn default() -> Self {
        Self {
            degree_patterns: to_owned(DEFAULT_DEGREE_PATTERNS),
            phrase_terminators: to_owned(DEFAULT_PHRASE_TERMINATORS),
            major_vocabulary: to_owned(DEFAULT_MAJORS),
            affiliation_blacklist: to_owned(DEFAULT_BLACKLIST),
            affiliation_connectors: to_owned(DEFAULT_CONNECTORS),
            skill_vocabulary: Some(to_owned(DEFAULT_SKILLS)),
            interest_vocabulary: Some(to_owned(DEFAULT_INTERESTS)),
        }
    }
}

impl ExtractionRules {
    /// Rules with no skill/interest vocabulary: both categories fall back to
    /// every distinct word of the resume.
    pub fn open_vocabulary() -> Self {
        Self {
            skill_vocabulary: None,
            interest_vocabulary: None,
            ..Self::default()
        }
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read extraction rules from {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Invalid extraction rules in {}", path.display()))
    }

    pub fn compile(&self) -> Result<CompiledRules> {
        let degree_patterns = self
            .degree_patterns
            .iter()
            .map(|p| Regex::new(p).with_context(|| format!("Invalid degree pattern '{p}'")))
            .collect::<Result<Vec<_>>>()?;

        let connectors: Vec<String> = self
            .affiliation_connectors
            .iter()
            .map(|c| regex::escape(c.trim()))
            .filter(|c| !c.is_empty())
            .collect();
        let connector_group = if connectors.is_empty() {
            String::new()
        } else {
            format!("(?:(?:{})[ \\t]+)?", connectors.join("|"))
        };
        let affiliation = Regex::new(&format!(
            r"\b[A-Z][a-z]+(?:[ \t]+{connector_group}[A-Z][a-z]+)+\b"
        ))
        .context("Invalid affiliation connectors")?;

        Ok(CompiledRules {
            degree_patterns,
            phrase_terminators: self
                .phrase_terminators
                .iter()
                .map(|t| t.trim().to_lowercase())
                .collect(),
            major_vocabulary: vocabulary_regex(&self.major_vocabulary)?,
            affiliation,
            affiliation_blacklist: self
                .affiliation_blacklist
                .iter()
                .map(|b| normalize_phrase(b).to_lowercase())
                .collect(),
            skill_vocabulary: match &self.skill_vocabulary {
                Some(v) => vocabulary_regex(v)?,
                None => None,
            },
            interest_vocabulary: match &self.interest_vocabulary {
                Some(v) => vocabulary_regex(v)?,
                None => None,
            },
        })
    }
}

/// Regexes and lookup sets derived from `ExtractionRules`.
#[derive(Debug, Clone)]
pub struct CompiledRules {
    pub degree_patterns: Vec<Regex>,
    pub phrase_terminators: HashSet<String>,
    pub major_vocabulary: Option<Regex>,
    pub affiliation: Regex,
    pub affiliation_blacklist: HashSet<String>,
    pub skill_vocabulary: Option<Regex>,
    pub interest_vocabulary: Option<Regex>,
}

impl CompiledRules {
    pub fn is_blacklisted(&self, candidate: &str) -> bool {
        self.affiliation_blacklist
            .contains(&normalize_phrase(candidate).to_lowercase())
    }
}

/// Builds a case-insensitive, word-bounded alternation over the vocabulary.
/// Multi-word terms tolerate any whitespace (including line breaks) between
/// their words. An empty vocabulary compiles to `None`.
fn vocabulary_regex(terms: &[String]) -> Result<Option<Regex>> {
    let mut alternatives: Vec<String> = terms
        .iter()
        .map(|t| {
            t.split_whitespace()
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(r"\s+")
        })
        .filter(|t| !t.is_empty())
        .collect();
    if alternatives.is_empty() {
        return Ok(None);
    }
    // Longest first so "data science" wins over a shorter overlapping term.
    alternatives.sort_by(|a, b| b.len().cmp(&a.len()));
    let regex = Regex::new(&format!(r"(?i)\b(?:{})\b", alternatives.join("|")))
        .context("Invalid vocabulary term")?;
    Ok(Some(regex))
}

/// Trims and collapses internal whitespace.
pub fn normalize_phrase(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn to_owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
