// Cross-cutting prompt fragments. Each feature keeps its own prompts.rs
// next to the code that sends them.

/// Appended to every system prompt that expects machine-readable output.
pub const JSON_ONLY_INSTRUCTION: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON value. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Keeps generated advice tied to what the user actually told us.
pub const NO_FABRICATION_INSTRUCTION: &str = "\
    Only use facts present in the provided input. \
    Do NOT invent employers, degrees, certifications or metrics. \
    If the input is thin, give general guidance instead of specifics.";

/// Builds a system prompt from a persona line plus the JSON-only rule.
pub fn json_system(persona: &str) -> String {
    format!("{persona} {JSON_ONLY_INSTRUCTION}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_system_appends_rule() {
        let system = json_system("You are a recruiter.");
        assert!(system.starts_with("You are a recruiter."));
        assert!(system.ends_with(JSON_ONLY_INSTRUCTION));
    }
}
