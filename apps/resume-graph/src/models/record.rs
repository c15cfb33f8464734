use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A named attribute dimension scored by the category matcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    GraduationYears,
    Majors,
    Affiliations,
    Skills,
    Interests,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::GraduationYears,
        Category::Majors,
        Category::Affiliations,
        Category::Skills,
        Category::Interests,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::GraduationYears => "graduation_years",
            Category::Majors => "majors",
            Category::Affiliations => "affiliations",
            Category::Skills => "skills",
            Category::Interests => "interests",
        }
    }

    /// Human-readable label used in similarity reports.
    pub fn title(&self) -> &'static str {
        match self {
            Category::GraduationYears => "Graduation Years",
            Category::Majors => "Majors",
            Category::Affiliations => "Affiliations",
            Category::Skills => "Skills",
            Category::Interests => "Interests",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "graduation_years" | "graduation_year" | "grad_year" => Ok(Category::GraduationYears),
            "majors" => Ok(Category::Majors),
            "affiliations" | "clubs" | "experiences" => Ok(Category::Affiliations),
            "skills" => Ok(Category::Skills),
            "interests" => Ok(Category::Interests),
            other => Err(format!("unknown category '{other}'")),
        }
    }
}

/// Structured extraction result for one resume.
///
/// Every category is a set that defaults to empty; absence and emptiness are
/// the same thing to the scorers. Records are built once and never mutated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeRecord {
    #[serde(default)]
    pub graduation_years: BTreeSet<String>,
    #[serde(default)]
    pub majors: BTreeSet<String>,
    #[serde(default)]
    pub affiliations: BTreeSet<String>,
    #[serde(default)]
    pub skills: BTreeSet<String>,
    #[serde(default)]
    pub interests: BTreeSet<String>,
    #[serde(default, skip_serializing)]
    pub full_text: String,
}

impl AttributeRecord {
    /// A record with no categorical values, keeping only the source text.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            full_text: text.into(),
            ..Self::default()
        }
    }

    pub fn values(&self, category: Category) -> &BTreeSet<String> {
        match category {
            Category::GraduationYears => &self.graduation_years,
            Category::Majors => &self.majors,
            Category::Affiliations => &self.affiliations,
            Category::Skills => &self.skills,
            Category::Interests => &self.interests,
        }
    }

    pub fn has_categories(&self) -> bool {
        Category::ALL.iter().any(|c| !self.values(*c).is_empty())
    }

    /// True when any majors, affiliations, interests or skills value contains
    /// `term`, case-insensitively.
    pub fn contains_term(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return false;
        }
        [
            Category::Affiliations,
            Category::Majors,
            Category::Interests,
            Category::Skills,
        ]
        .iter()
        .flat_map(|c| self.values(*c))
        .any(|v| v.to_lowercase().contains(&term))
    }
}
