// Prompt constants for career-plan generation.

use crate::llm_client::prompts::{json_system, NO_FABRICATION_INSTRUCTION};
use crate::resumes::prompts::truncate_chars;

const MAX_GOAL_CHARS: usize = 500;
const MAX_QUIZ_CHARS: usize = 2_000;

pub const PLAN_PERSONA: &str = "You are a career coach who turns a person's goal into a \
    short, practical roadmap of milestones and concrete weekly tasks.";

const PLAN_PROMPT_TEMPLATE: &str = r#"Build a career roadmap for this person.

GOAL: {goal}
TIMEFRAME: {weeks} weeks
ROLE: {role}
CURRENT SKILLS: {skills}
INTERESTS: {interests}
CAREER QUIZ ANSWERS: {quiz}

Return a JSON object with this EXACT schema:
{
  "summary": "Two sentences on the overall strategy.",
  "milestones": [
    {
      "title": "Master the fundamentals",
      "description": "What finishing this milestone means.",
      "tasks": [
        {"title": "Complete an intro SQL course", "description": "...", "difficulty": "easy"}
      ]
    }
  ]
}

Rules:
- 3 to 6 milestones in the order they should be tackled.
- 2 to 5 tasks per milestone, each finishable within a week.
- "difficulty" is exactly one of "easy", "medium", "hard".
- Build on the listed skills instead of repeating them.
- {no_fabrication}"#;

/// Profile facts fed into the plan prompt.
#[derive(Debug, Default)]
pub struct PlanContext {
    pub role: String,
    pub skills: Vec<String>,
    pub interests: Vec<String>,
    pub quiz_answers: serde_json::Value,
}

pub fn plan_system() -> String {
    json_system(PLAN_PERSONA)
}

pub fn build_plan_prompt(goal: &str, timeframe_weeks: u32, ctx: &PlanContext) -> String {
    let list = |items: &[String]| {
        if items.is_empty() {
            "(none given)".to_string()
        } else {
            items.join(", ")
        }
    };
    let quiz = match &ctx.quiz_answers {
        serde_json::Value::Object(map) if !map.is_empty() => ctx.quiz_answers.to_string(),
        _ => "(not taken)".to_string(),
    };

    PLAN_PROMPT_TEMPLATE
        .replace("{goal}", truncate_chars(goal, MAX_GOAL_CHARS))
        .replace("{weeks}", &timeframe_weeks.to_string())
        .replace("{role}", &ctx.role)
        .replace("{skills}", &list(&ctx.skills))
        .replace("{interests}", &list(&ctx.interests))
        .replace("{quiz}", truncate_chars(&quiz, MAX_QUIZ_CHARS))
        .replace("{no_fabrication}", NO_FABRICATION_INSTRUCTION.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_fills_every_placeholder() {
        let ctx = PlanContext {
            role: "student".to_string(),
            skills: vec!["python".to_string(), "sql".to_string()],
            interests: vec![],
            quiz_answers: serde_json::json!({"work_style": "remote"}),
        };
        let prompt = build_plan_prompt("Become a data analyst", 12, &ctx);
        assert!(prompt.contains("GOAL: Become a data analyst"));
        assert!(prompt.contains("TIMEFRAME: 12 weeks"));
        assert!(prompt.contains("python, sql"));
        assert!(prompt.contains("INTERESTS: (none given)"));
        assert!(prompt.contains("work_style"));
        assert!(!prompt.contains("{goal}"));
        assert!(!prompt.contains("{no_fabrication}"));
    }

    #[test]
    fn test_empty_quiz_marked_not_taken() {
        let prompt = build_plan_prompt("x", 4, &PlanContext::default());
        assert!(prompt.contains("CAREER QUIZ ANSWERS: (not taken)"));
    }
}
