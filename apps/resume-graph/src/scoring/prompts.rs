/// Pair-scoring prompt. Replace `{weights}`, `{profile_a}` and `{profile_b}`.
pub const PAIR_SCORE_PROMPT_TEMPLATE: &str = r#"Compare the two student profiles below and rate how similar they are.

Give the most credit to shared internships or employers, shared clubs and
organizations, the same graduation year and the same majors. Shared skills and
interests count for less. Relative category importance:
{weights}

Profile A:
{profile_a}

Profile B:
{profile_b}

Answer with a single number between 0 and 1, where 0 means nothing in common
and 1 means near-identical backgrounds."#;
