//! Career plan shaping: LLM output normalization, default milestones and
//! difficulty-based XP rewards.

use serde::{Deserialize, Serialize};

const MAX_MILESTONES: usize = 8;
const MAX_TASKS_PER_MILESTONE: usize = 8;
const MAX_TITLE_CHARS: usize = 200;
const MAX_DESCRIPTION_CHARS: usize = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Unknown or missing labels count as medium.
    pub fn parse_lenient(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("easy") => Difficulty::Easy,
            Some("hard") => Difficulty::Hard,
            _ => Difficulty::Medium,
        }
    }

    pub fn xp_reward(self) -> i32 {
        match self {
            Difficulty::Easy => 10,
            Difficulty::Medium => 25,
            Difficulty::Hard => 50,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

// ── Raw LLM output ──────────────────────────────────────────────────────────
// Every field is optional so a partially valid answer still parses.

#[derive(Debug, Default, Deserialize)]
pub struct GeneratedPlan {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub milestones: Vec<GeneratedMilestone>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GeneratedMilestone {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tasks: Vec<GeneratedTask>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GeneratedTask {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
}

// ── Normalized plan, ready to persist ───────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct PlanDraft {
    pub summary: String,
    pub milestones: Vec<MilestoneDraft>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MilestoneDraft {
    pub title: String,
    pub description: String,
    pub tasks: Vec<TaskDraft>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub difficulty: Difficulty,
}

impl TaskDraft {
    pub fn xp_reward(&self) -> i32 {
        self.difficulty.xp_reward()
    }
}

fn clean(text: Option<String>, max_chars: usize) -> String {
    let text = text.unwrap_or_default();
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.chars().take(max_chars).collect()
}

/// Drops blank titles and task-less milestones. Falls back to the default
/// roadmap when nothing usable is left.
pub fn normalize_plan(raw: GeneratedPlan, goal: &str) -> PlanDraft {
    let milestones: Vec<MilestoneDraft> = raw
        .milestones
        .into_iter()
        .filter_map(|m| {
            let title = clean(m.title, MAX_TITLE_CHARS);
            if title.is_empty() {
                return None;
            }
            let tasks: Vec<TaskDraft> = m
                .tasks
                .into_iter()
                .filter_map(|t| {
                    let title = clean(t.title, MAX_TITLE_CHARS);
                    (!title.is_empty()).then(|| TaskDraft {
                        title,
                        description: clean(t.description, MAX_DESCRIPTION_CHARS),
                        difficulty: Difficulty::parse_lenient(t.difficulty.as_deref()),
                    })
                })
                .take(MAX_TASKS_PER_MILESTONE)
                .collect();
            (!tasks.is_empty()).then(|| MilestoneDraft {
                title,
                description: clean(m.description, MAX_DESCRIPTION_CHARS),
                tasks,
            })
        })
        .take(MAX_MILESTONES)
        .collect();

    let summary = clean(raw.summary, MAX_DESCRIPTION_CHARS);

    if milestones.is_empty() {
        let mut plan = default_plan(goal);
        if !summary.is_empty() {
            plan.summary = summary;
        }
        return plan;
    }

    PlanDraft {
        summary: if summary.is_empty() {
            format!("A step-by-step roadmap towards: {goal}")
        } else {
            summary
        },
        milestones,
    }
}

/// Four generic milestones of three tasks each, phrased around the goal.
pub fn default_plan(goal: &str) -> PlanDraft {
    let goal = goal.trim();
    PlanDraft {
        summary: format!("A step-by-step roadmap towards: {goal}"),
        milestones: vec![
            milestone(
                "Research the path",
                format!("Understand what \"{goal}\" requires day to day."),
                [
                    ("Read three job postings for the target role", Difficulty::Easy),
                    ("List the skills those postings share", Difficulty::Easy),
                    ("Talk to someone already working in the role", Difficulty::Medium),
                ],
            ),
            milestone(
                "Build core skills",
                "Close the biggest gaps from your research.".to_string(),
                [
                    ("Pick one course for your largest skill gap", Difficulty::Easy),
                    ("Finish the first half of the course", Difficulty::Medium),
                    ("Finish the course and summarise what you learned", Difficulty::Hard),
                ],
            ),
            milestone(
                "Prove it with a project",
                "Create evidence an employer can look at.".to_string(),
                [
                    ("Choose a small project that uses the new skills", Difficulty::Easy),
                    ("Build and publish the project", Difficulty::Hard),
                    ("Write a short case study about the project", Difficulty::Medium),
                ],
            ),
            milestone(
                "Go to market",
                format!("Start applying for opportunities related to \"{goal}\"."),
                [
                    ("Update your resume with the new project", Difficulty::Medium),
                    ("Apply to five relevant openings", Difficulty::Medium),
                    ("Complete a mock interview", Difficulty::Hard),
                ],
            ),
        ],
    }
}

fn milestone(title: &str, description: String, tasks: [(&str, Difficulty); 3]) -> MilestoneDraft {
    MilestoneDraft {
        title: title.to_string(),
        description,
        tasks: tasks
            .into_iter()
            .map(|(title, difficulty)| TaskDraft {
                title: title.to_string(),
                description: String::new(),
                difficulty,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(title: &str, difficulty: Option<&str>) -> GeneratedTask {
        GeneratedTask {
            title: Some(title.to_string()),
            description: None,
            difficulty: difficulty.map(str::to_string),
        }
    }

    #[test]
    fn test_difficulty_rewards() {
        assert_eq!(Difficulty::parse_lenient(Some("easy")).xp_reward(), 10);
        assert_eq!(Difficulty::parse_lenient(Some(" HARD ")).xp_reward(), 50);
        assert_eq!(Difficulty::parse_lenient(Some("medium")).xp_reward(), 25);
        assert_eq!(Difficulty::parse_lenient(Some("epic")).xp_reward(), 25);
        assert_eq!(Difficulty::parse_lenient(None), Difficulty::Medium);
    }

    #[test]
    fn test_default_plan_shape() {
        let plan = default_plan("Become a data analyst");
        assert_eq!(plan.milestones.len(), 4);
        assert!(plan.milestones.iter().all(|m| m.tasks.len() == 3));
        assert!(plan.milestones[0].description.contains("Become a data analyst"));
    }

    #[test]
    fn test_normalize_drops_blank_and_empty_milestones() {
        let raw = GeneratedPlan {
            summary: Some("  Learn   then ship ".to_string()),
            milestones: vec![
                GeneratedMilestone {
                    title: Some("   ".to_string()),
                    description: None,
                    tasks: vec![task("orphan", None)],
                },
                GeneratedMilestone {
                    title: Some("No tasks".to_string()),
                    description: None,
                    tasks: vec![task("  ", Some("easy"))],
                },
                GeneratedMilestone {
                    title: Some("Foundations".to_string()),
                    description: Some("basics".to_string()),
                    tasks: vec![task("SQL course", Some("easy")), task("Capstone", Some("hard"))],
                },
            ],
        };
        let plan = normalize_plan(raw, "goal");
        assert_eq!(plan.summary, "Learn then ship");
        assert_eq!(plan.milestones.len(), 1);
        assert_eq!(plan.milestones[0].title, "Foundations");
        let rewards: Vec<i32> = plan.milestones[0].tasks.iter().map(TaskDraft::xp_reward).collect();
        assert_eq!(rewards, vec![10, 50]);
    }

    #[test]
    fn test_normalize_seeds_defaults_when_nothing_usable() {
        let plan = normalize_plan(GeneratedPlan::default(), "Get into product management");
        assert_eq!(plan, default_plan("Get into product management"));
    }

    #[test]
    fn test_generated_plan_tolerates_missing_fields() {
        let raw: GeneratedPlan =
            serde_json::from_str(r#"{"milestones":[{"title":"A","tasks":[{"title":"t"}]}]}"#).unwrap();
        let plan = normalize_plan(raw, "goal");
        assert_eq!(plan.milestones[0].tasks[0].difficulty, Difficulty::Medium);
        assert!(plan.summary.contains("goal"));
    }
}
