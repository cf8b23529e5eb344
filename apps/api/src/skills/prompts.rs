// Prompt constants for skill extraction from peer reviews.

use crate::llm_client::prompts::json_system;
use crate::resumes::prompts::truncate_chars;

const MAX_REVIEW_CHARS: usize = 4_000;

const SKILLS_PERSONA: &str = "You read peer reviews of a professional and list the \
    concrete skills the reviewer credits them with.";

const SKILLS_PROMPT_TEMPLATE: &str = r#"List the skills this review says the professional has.

Return a JSON object with this EXACT schema:
{"skills": ["stakeholder management", "postgresql"]}

Rules:
- Only skills the review explicitly praises or describes being used.
- Short noun phrases, at most 10 skills.
- Return {"skills": []} if the review names none.

REVIEW:
{review}"#;

pub fn skills_system() -> String {
    json_system(SKILLS_PERSONA)
}

pub fn build_skills_prompt(review: &str) -> String {
    SKILLS_PROMPT_TEMPLATE.replace("{review}", truncate_chars(review.trim(), MAX_REVIEW_CHARS))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_is_embedded() {
        let prompt = build_skills_prompt("  Great at Kubernetes migrations. ");
        assert!(prompt.ends_with("REVIEW:\nGreat at Kubernetes migrations."));
    }
}
