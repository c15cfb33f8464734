use crate::models::{AttributeRecord, Member};

/// Members whose majors, affiliations, interests or skills contain `term`
/// (case-insensitive substring). `records` is index-aligned with `members`.
pub fn find_members<'a>(
    members: &'a [Member],
    records: &[AttributeRecord],
    term: &str,
) -> Vec<&'a Member> {
    members
        .iter()
        .zip(records)
        .filter(|(_, record)| record.contains_term(term))
        .map(|(member, _)| member)
        .collect()
}
