/// Resume extraction prompt. Replace `{resume_text}` before sending.
pub const EXTRACT_PROMPT_TEMPLATE: &str = r#"Extract key information from the resume below.

Return a JSON object with this EXACT schema (no extra fields):
{
  "full_name": "Jordan Avery",
  "graduation_year": "2026",
  "majors": ["economics", "mathematics"],
  "experiences": ["Investment Management Group", "Debate Club"],
  "skills": ["python", "sql"],
  "interests": ["hiking", "piano"]
}

Rules:
- "experiences" lists organization names only: employers, internships, clubs.
- "skills" lists tools and languages; "interests" lists topics or hobbies.
- Use an empty list when a field has no evidence in the resume. Do not guess.

Resume:
{resume_text}"#;
