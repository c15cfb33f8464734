//! Weighted exact and fuzzy overlap between two records.
//!
//! Exact categories contribute `weight × |A ∩ B|`. Fuzzy categories contribute
//! `weight × |{(x, y) ∈ A × B : ratio(x, y) > threshold}|`; one value may pair
//! with several values on the other side and every such pair counts.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::models::{AttributeRecord, Category};

pub const DEFAULT_FUZZY_THRESHOLD: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    Exact,
    Fuzzy,
}

impl MatchMode {
    /// Affiliations vary in naming ("ACM" vs "ACM Club"); everything else is
    /// normalized tightly enough for exact matching.
    pub fn default_for(category: Category) -> Self {
        match category {
            Category::Affiliations => MatchMode::Fuzzy,
            _ => MatchMode::Exact,
        }
    }
}

/// Non-negative weight per category. Categories without a weight are not scored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryWeights(BTreeMap<Category, f64>);

impl CategoryWeights {
    pub fn new() -> Self {
        Self::default()
    }

    /// graduation 3.0, majors 2.5, affiliations 2.0, skills 1.5, interests 1.0.
    pub fn standard() -> Self {
        Self::new()
            .with(Category::GraduationYears, 3.0)
            .with(Category::Majors, 2.5)
            .with(Category::Affiliations, 2.0)
            .with(Category::Skills, 1.5)
            .with(Category::Interests, 1.0)
    }

    pub fn with(mut self, category: Category, weight: f64) -> Self {
        self.0.insert(category, weight);
        self
    }

    pub fn get(&self, category: Category) -> Option<f64> {
        self.0.get(&category).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, f64)> + '_ {
        self.0.iter().map(|(c, w)| (*c, *w))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parses `name=weight` pairs separated by commas.
    ///
    /// Unknown category names are logged and skipped. A malformed pair, a
    /// non-finite or negative weight, or an empty result is an error.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let mut weights = Self::new();

        for pair in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (name, value) = pair
                .split_once('=')
                .ok_or_else(|| format!("expected name=weight, got '{pair}'"))?;
            let weight: f64 = value
                .trim()
                .parse()
                .map_err(|_| format!("weight for '{}' is not a number: '{}'", name.trim(), value.trim()))?;
            if !weight.is_finite() || weight < 0.0 {
                return Err(format!(
                    "weight for '{}' must be a non-negative number, got {weight}",
                    name.trim()
                ));
            }
            match name.parse::<Category>() {
                Ok(category) => weights.0.insert(category, weight),
                Err(e) => {
                    warn!("Ignoring weight: {e}");
                    continue;
                }
            };
        }

        if weights.is_empty() {
            return Err("no known categories in weight map".to_string());
        }
        Ok(weights)
    }
}

/// Literal evidence behind a category's contribution.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CategoryMatches {
    Exact(Vec<String>),
    Fuzzy(Vec<(String, String)>),
}

impl CategoryMatches {
    pub fn len(&self) -> usize {
        match self {
            CategoryMatches::Exact(v) => v.len(),
            CategoryMatches::Fuzzy(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Display form: values as-is, fuzzy pairs as `x ~ y` (or just `x` when
    /// both sides are identical).
    pub fn describe(&self) -> Vec<String> {
        match self {
            CategoryMatches::Exact(v) => v.clone(),
            CategoryMatches::Fuzzy(pairs) => pairs
                .iter()
                .map(|(x, y)| {
                    if x == y {
                        x.clone()
                    } else {
                        format!("{x} ~ {y}")
                    }
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryComparison {
    pub score: f64,
    pub matches: BTreeMap<Category, CategoryMatches>,
}

#[derive(Debug, Clone)]
pub struct CategoryMatcher {
    fuzzy_threshold: f64,
    modes: BTreeMap<Category, MatchMode>,
}

impl CategoryMatcher {
    pub fn new(fuzzy_threshold: f64) -> Self {
        Self {
            fuzzy_threshold,
            modes: Category::ALL
                .iter()
                .map(|c| (*c, MatchMode::default_for(*c)))
                .collect(),
        }
    }

    pub fn with_mode(mut self, category: Category, mode: MatchMode) -> Self {
        self.modes.insert(category, mode);
        self
    }

    pub fn mode(&self, category: Category) -> MatchMode {
        self.modes
            .get(&category)
            .copied()
            .unwrap_or_else(|| MatchMode::default_for(category))
    }

    pub fn compare(
        &self,
        a: &AttributeRecord,
        b: &AttributeRecord,
        weights: &CategoryWeights,
    ) -> CategoryComparison {
        let mut score = 0.0;
        let mut matches = BTreeMap::new();

        for (category, weight) in weights.iter() {
            let left = a.values(category);
            let right = b.values(category);

            let found = match self.mode(category) {
                MatchMode::Exact => {
                    CategoryMatches::Exact(left.intersection(right).cloned().collect())
                }
                MatchMode::Fuzzy => CategoryMatches::Fuzzy(
                    left.iter()
                        .flat_map(|x| right.iter().map(move |y| (x, y)))
                        .filter(|(x, y)| fuzzy_ratio(x, y) > self.fuzzy_threshold)
                        .map(|(x, y)| (x.clone(), y.clone()))
                        .collect(),
                ),
            };

            score += weight * found.len() as f64;
            matches.insert(category, found);
        }

        CategoryComparison { score, matches }
    }
}

impl Default for CategoryMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_FUZZY_THRESHOLD)
    }
}

/// Case-insensitive partial ratio in [0, 1], order-independent.
///
/// The shorter value is aligned against every equally long window of the
/// longer one and the best normalized Levenshtein similarity wins, so an
/// abbreviation contained in a longer name scores 1.0 while names that only
/// share a prefix or suffix do not.
pub fn fuzzy_ratio(x: &str, y: &str) -> f64 {
    let x: Vec<char> = x.to_lowercase().chars().collect();
    let y: Vec<char> = y.to_lowercase().chars().collect();
    let (shorter, longer) = if x.len() <= y.len() { (x, y) } else { (y, x) };
    if shorter.is_empty() {
        return if longer.is_empty() { 1.0 } else { 0.0 };
    }

    let needle: String = shorter.iter().collect();
    longer
        .windows(shorter.len())
        .map(|window| {
            let window: String = window.iter().collect();
            strsim::normalized_levenshtein(&needle, &window)
        })
        .fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(category: Category, values: &[&str]) -> AttributeRecord {
        let mut record = AttributeRecord::default();
        let set = values.iter().map(|v| v.to_string()).collect();
        match category {
            Category::GraduationYears => record.graduation_years = set,
            Category::Majors => record.majors = set,
            Category::Affiliations => record.affiliations = set,
            Category::Skills => record.skills = set,
            Category::Interests => record.interests = set,
        }
        record
    }

    #[test]
    fn test_majors_and_affiliations_scenario() {
        let mut a = record(Category::Majors, &["computer science"]);
        a.affiliations.insert("Debate Club".to_string());
        let mut b = record(Category::Majors, &["computer science", "economics"]);
        b.affiliations.insert("Debate Club".to_string());

        let weights = CategoryWeights::new()
            .with(Category::Majors, 2.5)
            .with(Category::Affiliations, 2.0);
        let result = CategoryMatcher::default().compare(&a, &b, &weights);

        assert!((result.score - 4.5).abs() < 1e-9, "score was {}", result.score);
        assert_eq!(
            result.matches[&Category::Majors],
            CategoryMatches::Exact(vec!["computer science".to_string()])
        );
        assert_eq!(
            result.matches[&Category::Affiliations],
            CategoryMatches::Fuzzy(vec![("Debate Club".to_string(), "Debate Club".to_string())])
        );
    }

    #[test]
    fn test_self_comparison_is_weighted_cardinality() {
        let mut a = AttributeRecord::default();
        a.graduation_years.insert("2025".to_string());
        a.majors.extend(["economics".to_string(), "finance".to_string()]);
        a.skills.extend(["python".to_string(), "sql".to_string(), "excel".to_string()]);

        let weights = CategoryWeights::new()
            .with(Category::GraduationYears, 3.0)
            .with(Category::Majors, 2.5)
            .with(Category::Skills, 1.5)
            .with(Category::Interests, 1.0);
        let result = CategoryMatcher::default().compare(&a, &a, &weights);

        let expected = 3.0 * 1.0 + 2.5 * 2.0 + 1.5 * 3.0 + 1.0 * 0.0;
        assert!((result.score - expected).abs() < 1e-9);
    }

    #[test]
    fn test_fuzzy_matches_naming_variants() {
        let a = record(Category::Affiliations, &["ACM"]);
        let b = record(Category::Affiliations, &["ACM Club", "Tennis Team"]);
        let weights = CategoryWeights::new().with(Category::Affiliations, 2.0);

        let result = CategoryMatcher::default().compare(&a, &b, &weights);
        assert!((result.score - 2.0).abs() < 1e-9);
        assert_eq!(
            result.matches[&Category::Affiliations].describe(),
            vec!["ACM ~ ACM Club".to_string()]
        );
    }

    #[test]
    fn test_fuzzy_pairs_are_many_to_many() {
        let a = record(Category::Affiliations, &["ACM"]);
        let b = record(Category::Affiliations, &["ACM Club", "ACM Chapter"]);
        let weights = CategoryWeights::new().with(Category::Affiliations, 1.0);

        let result = CategoryMatcher::default().compare(&a, &b, &weights);
        assert_eq!(result.matches[&Category::Affiliations].len(), 2);
        assert!((result.score - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_exact_mode_override_disables_fuzzy() {
        let a = record(Category::Affiliations, &["ACM"]);
        let b = record(Category::Affiliations, &["ACM Club"]);
        let weights = CategoryWeights::new().with(Category::Affiliations, 1.0);

        let matcher = CategoryMatcher::default().with_mode(Category::Affiliations, MatchMode::Exact);
        assert_eq!(matcher.compare(&a, &b, &weights).score, 0.0);
    }

    #[test]
    fn test_empty_categories_contribute_zero() {
        let empty = AttributeRecord::default();
        let result = CategoryMatcher::default().compare(&empty, &empty, &CategoryWeights::standard());
        assert_eq!(result.score, 0.0);
        assert!(result.matches.values().all(|m| m.is_empty()));
    }

    #[test]
    fn test_unweighted_categories_are_ignored() {
        let a = record(Category::Skills, &["python"]);
        let weights = CategoryWeights::new().with(Category::Majors, 2.5);
        let result = CategoryMatcher::default().compare(&a, &a, &weights);
        assert_eq!(result.score, 0.0);
        assert!(!result.matches.contains_key(&Category::Skills));
    }

    #[test]
    fn test_fuzzy_ratio_bounds() {
        assert_eq!(fuzzy_ratio("Debate Club", "debate club"), 1.0);
        assert_eq!(fuzzy_ratio("ACM", "ACM Club"), 1.0);
        assert_eq!(fuzzy_ratio("ACM Club", "ACM"), 1.0);
        assert!(fuzzy_ratio("ACM", "Tennis Team") < DEFAULT_FUZZY_THRESHOLD);
        assert_eq!(fuzzy_ratio("", ""), 1.0);
        assert_eq!(fuzzy_ratio("", "ACM"), 0.0);
    }

    #[test]
    fn test_shared_prefix_or_suffix_is_not_a_match() {
        assert!((fuzzy_ratio("Debate Club", "Chess Club") - 0.5).abs() < 1e-9);
        assert!(fuzzy_ratio("Jordan Avery", "Jordan Smith") < DEFAULT_FUZZY_THRESHOLD);

        let a = record(Category::Affiliations, &["Debate Club", "Jordan Avery"]);
        let b = record(Category::Affiliations, &["Chess Club", "Jordan Smith"]);
        let weights = CategoryWeights::new().with(Category::Affiliations, 2.0);

        let result = CategoryMatcher::default().compare(&a, &b, &weights);
        assert_eq!(result.score, 0.0);
        assert!(result.matches[&Category::Affiliations].is_empty());
    }

    #[test]
    fn test_parse_weights() {
        let weights = CategoryWeights::parse("majors=2.5, affiliations = 2.0").unwrap();
        assert_eq!(weights.get(Category::Majors), Some(2.5));
        assert_eq!(weights.get(Category::Affiliations), Some(2.0));
        assert_eq!(weights.get(Category::Skills), None);
    }

    #[test]
    fn test_parse_weights_ignores_unknown_categories() {
        let weights = CategoryWeights::parse("majors=2.5,hobbies=9").unwrap();
        assert_eq!(weights.iter().count(), 1);
    }

    #[test]
    fn test_parse_weights_rejects_bad_values() {
        assert!(CategoryWeights::parse("majors=-1").is_err());
        assert!(CategoryWeights::parse("majors=lots").is_err());
        assert!(CategoryWeights::parse("majors").is_err());
        assert!(CategoryWeights::parse("hobbies=1.0").is_err());
        assert!(CategoryWeights::parse("").is_err());
    }
}
