// System prompt for the career counsellor chat.

use crate::llm_client::prompts::NO_FABRICATION_INSTRUCTION;

const COUNSELLOR_PERSONA: &str = "You are Launchpad's career counsellor. You help students, \
    recent graduates and working professionals plan their careers: choosing courses, \
    preparing for placements, improving resumes and switching roles. \
    Answer in plain prose or short lists, stay encouraging and concrete, \
    and keep replies under 300 words unless asked for more. \
    Politely decline requests unrelated to careers or education.";

pub fn counsellor_system(user_name: &str) -> String {
    format!(
        "{COUNSELLOR_PERSONA} You are talking to {}. {}",
        user_name.trim(),
        NO_FABRICATION_INSTRUCTION.trim()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_names_the_user() {
        let system = counsellor_system(" Priya ");
        assert!(system.contains("You are talking to Priya."));
        assert!(system.starts_with(COUNSELLOR_PERSONA));
    }
}
