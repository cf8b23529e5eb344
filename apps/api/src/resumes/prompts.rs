// Prompt constants for resume review.

/// Resume text beyond this many characters is cut before prompting.
const MAX_RESUME_CHARS: usize = 12_000;
const MAX_JD_CHARS: usize = 6_000;

pub const ATS_SYSTEM: &str = "You are an experienced technical recruiter who screens resumes \
    the way applicant tracking systems and hiring managers do. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";

const ATS_PROMPT_TEMPLATE: &str = r#"Review the resume below{jd_clause}.

A rule-based checker already gave it {baseline}/100 for structure, contact details,
quantified impact, length, action verbs and keyword coverage.

Return a JSON object with this EXACT schema:
{
  "score": 72,
  "strengths": ["Clear, metric-driven experience bullets"],
  "improvements": ["Move the skills section above projects"]
}

Rules:
- "score" is 0-100 and reflects how likely this resume is to pass screening{jd_rule}.
- At most 5 strengths and 5 improvements, each one sentence.
- Improvements must be specific and actionable.

RESUME:
{resume_text}
{jd_block}"#;

pub fn build_ats_prompt(resume_text: &str, job_description: Option<&str>, baseline: u32) -> String {
    let jd = job_description.map(str::trim).filter(|jd| !jd.is_empty());
    let (jd_clause, jd_rule, jd_block) = match jd {
        Some(jd) => (
            " against the job description that follows it",
            " for this specific job",
            format!("\nJOB DESCRIPTION:\n{}", truncate_chars(jd, MAX_JD_CHARS)),
        ),
        None => ("", "", String::new()),
    };

    ATS_PROMPT_TEMPLATE
        .replace("{jd_clause}", jd_clause)
        .replace("{jd_rule}", jd_rule)
        .replace("{baseline}", &baseline.to_string())
        .replace("{resume_text}", truncate_chars(resume_text, MAX_RESUME_CHARS))
        .replace("{jd_block}", &jd_block)
}

/// Cuts at a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_without_jd() {
        let prompt = build_ats_prompt("Rust developer", None, 55);
        assert!(prompt.contains("55/100"));
        assert!(prompt.contains("Rust developer"));
        assert!(!prompt.contains("JOB DESCRIPTION"));
        assert!(!prompt.contains("{jd"));
    }

    #[test]
    fn test_prompt_with_jd() {
        let prompt = build_ats_prompt("Rust developer", Some("Need Go"), 40);
        assert!(prompt.contains("JOB DESCRIPTION:\nNeed Go"));
        assert!(prompt.contains("for this specific job"));
    }

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("hi", 10), "hi");
    }
}
