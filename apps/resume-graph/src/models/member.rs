use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::errors::AppError;

/// One participant in the population. Immutable for the length of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: String,
    pub display_name: String,
    pub image_reference: String,
    pub resume_reference: String,
}

/// Member entry as it appears in the population export.
#[derive(Debug, Deserialize)]
struct RawMember {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    profile_pic_link: Option<String>,
    #[serde(default)]
    resume_link: Option<String>,
    #[serde(default)]
    signed_up: Option<bool>,
}

/// Parses a `member_id -> record` JSON object into the scored population.
///
/// Members that have not signed up, or that have no resume link, are dropped
/// here so they never reach extraction. Object order is kept and becomes the
/// node order of the graph.
pub fn parse_population(json: &str) -> Result<Vec<Member>, AppError> {
    let raw: Value = serde_json::from_str(json)?;
    let entries: Map<String, Value> = match raw {
        Value::Object(map) => map,
        other => {
            return Err(AppError::Input(format!(
                "expected a JSON object keyed by member id, found {}",
                json_kind(&other)
            )))
        }
    };

    let total = entries.len();
    let mut members = Vec::with_capacity(total);

    for (id, value) in entries {
        let raw: RawMember = match serde_json::from_value(value) {
            Ok(r) => r,
            Err(e) => {
                warn!(member_id = %id, "Skipping malformed member entry: {e}");
                continue;
            }
        };

        if !raw.signed_up.unwrap_or(false) {
            continue;
        }
        let resume_reference = match raw.resume_link {
            Some(link) if !link.trim().is_empty() => link,
            _ => continue,
        };

        members.push(Member {
            id,
            display_name: raw
                .name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| "Unknown".to_string()),
            image_reference: raw.profile_pic_link.unwrap_or_default(),
            resume_reference,
        });
    }

    info!(
        "Loaded {} eligible members ({} excluded)",
        members.len(),
        total - members.len()
    );
    Ok(members)
}

pub fn load_population(path: &Path) -> Result<Vec<Member>, AppError> {
    let json = std::fs::read_to_string(path)?;
    parse_population(&json)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPORT: &str = r#"{
        "u3": {"name": "Priya", "profile_pic_link": "https://img/p.png", "resume_link": "https://cdn/p.pdf", "signed_up": true},
        "u1": {"name": "Marcus", "resume_link": "https://cdn/m.pdf", "signed_up": true},
        "u2": {"name": "Lena", "resume_link": "https://cdn/l.pdf"},
        "u4": {"name": "Omar", "signed_up": true},
        "u5": {"name": "Ada", "resume_link": "", "signed_up": true},
        "u6": {"name": "Kim", "resume_link": "https://cdn/k.pdf", "signed_up": false}
    }"#;

    #[test]
    fn test_only_signed_up_members_with_resume_are_kept() {
        let members = parse_population(EXPORT).unwrap();
        let ids: Vec<&str> = members.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["u3", "u1"]);
    }

    #[test]
    fn test_input_order_is_preserved() {
        let members = parse_population(EXPORT).unwrap();
        assert_eq!(members[0].display_name, "Priya");
        assert_eq!(members[1].display_name, "Marcus");
    }

    #[test]
    fn test_missing_picture_defaults_to_empty() {
        let members = parse_population(EXPORT).unwrap();
        assert_eq!(members[0].image_reference, "https://img/p.png");
        assert_eq!(members[1].image_reference, "");
    }

    #[test]
    fn test_missing_name_becomes_unknown() {
        let json = r#"{"x": {"resume_link": "r.pdf", "signed_up": true}}"#;
        let members = parse_population(json).unwrap();
        assert_eq!(members[0].display_name, "Unknown");
    }

    #[test]
    fn test_malformed_entry_is_skipped() {
        let json = r#"{"a": "not a record", "b": {"name": "B", "resume_link": "b.pdf", "signed_up": true}}"#;
        let members = parse_population(json).unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].id, "b");
    }

    #[test]
    fn test_non_object_input_is_rejected() {
        let err = parse_population("[1, 2, 3]").unwrap_err();
        assert!(matches!(err, AppError::Input(_)));
    }
}
