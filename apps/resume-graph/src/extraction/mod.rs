//! Entity extraction: raw resume text to `AttributeRecord`.
//!
//! Default: `HeuristicExtractor` (regex rules, deterministic, no I/O).
//! Alternate: `LlmExtractor` (structured output from the LLM client).
//!
//! The pipeline holds an `Arc<dyn ResumeExtractor>` chosen at startup.

pub mod heuristic;
pub mod llm;
pub mod prompts;
pub mod rules;

use async_trait::async_trait;

use crate::models::AttributeRecord;

pub use heuristic::HeuristicExtractor;
pub use llm::LlmExtractor;
pub use rules::ExtractionRules;

/// Turns resume text into a structured record.
///
/// Implementations never fail: a collaborator error degrades to a record
/// with empty categories. `full_text` is always the input verbatim.
#[async_trait]
pub trait ResumeExtractor: Send + Sync {
    async fn extract(&self, text: &str) -> AttributeRecord;

    /// Short backend name recorded alongside persisted records.
    fn backend(&self) -> &'static str;
}
