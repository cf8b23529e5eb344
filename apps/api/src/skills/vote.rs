//! Majority-vote aggregation of per-review skill lists.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

/// One LLM answer. Accepts either a bare array or `{"skills": [...]}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum SkillAnswer {
    List(Vec<String>),
    Object { skills: Vec<String> },
}

impl SkillAnswer {
    pub fn into_skills(self) -> Vec<String> {
        match self {
            SkillAnswer::List(skills) | SkillAnswer::Object { skills } => skills,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkillVote {
    pub skill: String,
    pub votes: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VoteResult {
    /// Reviews whose answer could be parsed; the majority threshold is based on this.
    pub voters: u32,
    pub kept: Vec<SkillVote>,
}

/// Trim, lowercase, collapse inner whitespace.
pub fn normalize_skill(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// `None` entries are reviews whose answer failed to parse; they do not vote.
/// A skill is kept when more than half of the voters named it.
pub fn majority_skills(answers: &[Option<Vec<String>>]) -> VoteResult {
    let mut counts: BTreeMap<String, u32> = BTreeMap::new();
    let mut voters = 0u32;

    for answer in answers.iter().flatten() {
        voters += 1;
        let unique: HashSet<String> = answer
            .iter()
            .map(|s| normalize_skill(s))
            .filter(|s| !s.is_empty())
            .collect();
        for skill in unique {
            *counts.entry(skill).or_insert(0) += 1;
        }
    }

    let mut kept: Vec<SkillVote> = counts
        .into_iter()
        .filter(|(_, votes)| votes * 2 > voters)
        .map(|(skill, votes)| SkillVote { skill, votes })
        .collect();
    kept.sort_by(|a, b| b.votes.cmp(&a.votes).then_with(|| a.skill.cmp(&b.skill)));

    VoteResult { voters, kept }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answer(skills: &[&str]) -> Option<Vec<String>> {
        Some(skills.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_normalize_skill() {
        assert_eq!(normalize_skill("  Machine   Learning "), "machine learning");
        assert_eq!(normalize_skill("\t"), "");
    }

    #[test]
    fn test_strict_majority_required() {
        let result = majority_skills(&[
            answer(&["Rust", "SQL"]),
            answer(&["rust", "Leadership"]),
            answer(&["SQL", "RUST "]),
            answer(&["Go"]),
        ]);
        assert_eq!(result.voters, 4);
        // sql has 2/4 which is not a strict majority
        assert_eq!(
            result.kept,
            vec![SkillVote {
                skill: "rust".to_string(),
                votes: 3
            }]
        );
    }

    #[test]
    fn test_unparseable_answers_do_not_vote() {
        let result = majority_skills(&[answer(&["python"]), None, None]);
        assert_eq!(result.voters, 1);
        assert_eq!(result.kept.len(), 1);
    }

    #[test]
    fn test_duplicates_within_one_review_count_once() {
        let result = majority_skills(&[
            answer(&["Python", "python", " PYTHON"]),
            answer(&["java"]),
            answer(&["go"]),
        ]);
        assert!(result.kept.is_empty());
    }

    #[test]
    fn test_sorted_by_votes_then_name() {
        let result = majority_skills(&[
            answer(&["b", "a", "c"]),
            answer(&["b", "a", "c"]),
            answer(&["c"]),
        ]);
        let names: Vec<&str> = result.kept.iter().map(|v| v.skill.as_str()).collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_no_voters() {
        let result = majority_skills(&[None]);
        assert_eq!(result.voters, 0);
        assert!(result.kept.is_empty());
    }

    #[test]
    fn test_answer_shapes() {
        let list: SkillAnswer = serde_json::from_str(r#"["a","b"]"#).unwrap();
        let object: SkillAnswer = serde_json::from_str(r#"{"skills":["a"]}"#).unwrap();
        assert_eq!(list.into_skills().len(), 2);
        assert_eq!(object.into_skills(), vec!["a".to_string()]);
    }
}
