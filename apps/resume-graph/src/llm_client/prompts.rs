// Cross-cutting prompt fragments. Each LLM-backed module keeps its own
// prompts.rs and builds on these.

/// System prompt that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise resume analysis tool. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// System prompt for answers that must be a single number.
pub const NUMBER_ONLY_SYSTEM: &str = "You are a precise resume comparison tool. \
    Respond with a single decimal number and nothing else.";
