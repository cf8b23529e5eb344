//! Pluggable, trait-based ATS scoring of extracted resume text.
//!
//! Default: `KeywordAtsScorer` (pure Rust, deterministic, fully testable).
//! `LlmAtsScorer` blends the keyword report with a model-assigned score.
//!
//! `AppState` holds an `Arc<dyn AtsScorer>`, swapped at startup via config.

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::AppError;
use crate::llm_client::LlmClient;
use crate::resumes::prompts::{build_ats_prompt, ATS_SYSTEM};

// ────────────────────────────────────────────────────────────────────────────
// Output data models
// ────────────────────────────────────────────────────────────────────────────

/// Score for one scoring dimension.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtsDimension {
    pub name: String,
    pub score: f32,
    pub max: f32,
    pub detail: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtsReport {
    pub overall_score: u32, // 0 – 100
    pub dimensions: Vec<AtsDimension>,
    pub matched_keywords: Vec<String>,
    pub missing_keywords: Vec<String>,
    pub suggestions: Vec<String>,
    pub scorer_backend: String, // "keyword" | "llm"
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait AtsScorer: Send + Sync {
    async fn score(
        &self,
        resume_text: &str,
        job_description: Option<&str>,
    ) -> Result<AtsReport, AppError>;
}

// ────────────────────────────────────────────────────────────────────────────
// KeywordAtsScorer
// ────────────────────────────────────────────────────────────────────────────

/// Heuristic scorer. Weights: sections 30, contact 10, quantified bullets 20,
/// length 10, action verbs 10, keywords 20.
pub struct KeywordAtsScorer;

#[async_trait]
impl AtsScorer for KeywordAtsScorer {
    async fn score(
        &self,
        resume_text: &str,
        job_description: Option<&str>,
    ) -> Result<AtsReport, AppError> {
        Ok(compute_keyword_report(resume_text, job_description))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// LlmAtsScorer
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct LlmAtsVerdict {
    score: f32,
    #[serde(default)]
    strengths: Vec<String>,
    #[serde(default)]
    improvements: Vec<String>,
}

/// Asks the model for a second opinion and averages it with the keyword score.
pub struct LlmAtsScorer(pub LlmClient);

#[async_trait]
impl AtsScorer for LlmAtsScorer {
    async fn score(
        &self,
        resume_text: &str,
        job_description: Option<&str>,
    ) -> Result<AtsReport, AppError> {
        let mut report = compute_keyword_report(resume_text, job_description);
        let prompt = build_ats_prompt(resume_text, job_description, report.overall_score);

        match self.0.call_json::<LlmAtsVerdict>(&prompt, ATS_SYSTEM).await {
            Ok(verdict) => {
                let llm_score = verdict.score.clamp(0.0, 100.0);
                report.overall_score =
                    ((report.overall_score as f32 + llm_score) / 2.0).round() as u32;
                report.dimensions.push(AtsDimension {
                    name: "reviewer".to_string(),
                    score: llm_score,
                    max: 100.0,
                    detail: verdict.strengths.join("; "),
                });
                let mut suggestions = verdict.improvements;
                suggestions.extend(report.suggestions);
                report.suggestions = dedup_preserving_order(suggestions);
                report.scorer_backend = "llm".to_string();
            }
            Err(e) => {
                warn!("LLM ATS scoring failed, using keyword report: {e}");
            }
        }
        Ok(report)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Core keyword algorithm
// ────────────────────────────────────────────────────────────────────────────

const SECTION_POINTS: f32 = 6.0;
const BULLET_GLYPHS: &[char] = &['•', '-', '*', '–', '▪', '●', '◦', '‣'];

const SECTIONS: &[(&str, &[&str])] = &[
    ("education", &["education", "academic", "qualifications"]),
    (
        "experience",
        &["experience", "employment", "work history", "internship", "internships"],
    ),
    ("skills", &["skills", "technical skills", "technologies", "tech stack"]),
    ("projects", &["projects", "project", "portfolio"]),
];

const ACTION_VERBS: &[&str] = &[
    "achieved", "analyzed", "architected", "automated", "built", "created", "cut",
    "delivered", "deployed", "designed", "developed", "drove", "engineered",
    "established", "implemented", "improved", "increased", "launched", "led",
    "managed", "mentored", "migrated", "optimized", "organized", "owned",
    "reduced", "refactored", "resolved", "scaled", "shipped", "spearheaded",
    "streamlined", "trained", "wrote",
];

const TECH_SKILLS: &[&str] = &[
    "python", "java", "javascript", "typescript", "rust", "go", "c++", "c#", "sql",
    "react", "node.js", "django", "flask", "spring", "aws", "azure", "gcp",
    "docker", "kubernetes", "git", "linux", "postgresql", "mysql", "mongodb",
    "redis", "html", "css", "excel", "tableau", "power bi", "machine learning",
    "tensorflow", "pytorch", "figma", "kotlin", "swift", "graphql", "rest",
];

const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "have",
    "in", "is", "it", "of", "on", "or", "our", "that", "the", "their", "this",
    "to", "we", "will", "with", "you", "your", "who", "what", "can", "all", "any",
    "work", "team", "role", "job", "years", "year", "experience", "ability",
    "strong", "skills", "knowledge", "including", "etc", "plus", "must", "should",
    "looking", "join", "us", "about", "responsibilities", "requirements",
    "preferred", "required", "candidate", "good", "excellent", "using", "within",
];

const MAX_JD_KEYWORDS: usize = 25;

pub(crate) fn compute_keyword_report(resume_text: &str, job_description: Option<&str>) -> AtsReport {
    let text_lower = resume_text.to_lowercase();
    let lines: Vec<&str> = resume_text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    let tokens = tokenize(&text_lower);
    let mut suggestions = Vec::new();
    let mut dimensions = Vec::new();

    // Sections
    let has_email = has_email(resume_text);
    let has_phone = has_phone(resume_text);
    let mut found_sections = Vec::new();
    let mut missing_sections = Vec::new();
    if has_email || has_phone {
        found_sections.push("contact");
    } else {
        missing_sections.push("contact");
    }
    for (section, headings) in SECTIONS {
        if has_heading(&lines, headings) {
            found_sections.push(*section);
        } else {
            missing_sections.push(*section);
        }
    }
    for section in &missing_sections {
        suggestions.push(format!("Add a clearly labelled '{section}' section"));
    }
    dimensions.push(AtsDimension {
        name: "sections".to_string(),
        score: found_sections.len() as f32 * SECTION_POINTS,
        max: 30.0,
        detail: format!("found: {}", found_sections.join(", ")),
    });

    // Contact
    let contact_score = (if has_email { 5.0 } else { 0.0 }) + (if has_phone { 5.0 } else { 0.0 });
    if !has_email {
        suggestions.push("Include an email address in the header".to_string());
    }
    if !has_phone {
        suggestions.push("Include a phone number in the header".to_string());
    }
    dimensions.push(AtsDimension {
        name: "contact".to_string(),
        score: contact_score,
        max: 10.0,
        detail: format!("email: {has_email}, phone: {has_phone}"),
    });

    // Quantified bullets
    let bullets = bullet_lines(&lines);
    let quantified = bullets.iter().filter(|b| is_quantified(b)).count();
    let quantified_ratio = ratio(quantified, bullets.len());
    if quantified_ratio < 0.5 {
        suggestions.push(
            "Quantify more achievements with numbers, percentages or money saved".to_string(),
        );
    }
    dimensions.push(AtsDimension {
        name: "quantified_impact".to_string(),
        score: 20.0 * quantified_ratio,
        max: 20.0,
        detail: format!("{quantified} of {} bullets carry a metric", bullets.len()),
    });

    // Length
    let word_count = resume_text.split_whitespace().count();
    let length_score = match word_count {
        300..=900 => 10.0,
        150..=1200 => 5.0,
        _ => 0.0,
    };
    if word_count < 300 {
        suggestions.push(format!(
            "Resume is short ({word_count} words); aim for 300–900 words"
        ));
    } else if word_count > 900 {
        suggestions.push(format!(
            "Resume is long ({word_count} words); trim to 300–900 words"
        ));
    }
    dimensions.push(AtsDimension {
        name: "length".to_string(),
        score: length_score,
        max: 10.0,
        detail: format!("{word_count} words"),
    });

    // Action verbs
    let verb_led = bullets.iter().filter(|b| starts_with_action_verb(b)).count();
    let verb_ratio = ratio(verb_led, bullets.len());
    if verb_ratio < 0.5 {
        suggestions.push("Start bullets with strong action verbs (built, led, reduced…)".to_string());
    }
    dimensions.push(AtsDimension {
        name: "action_verbs".to_string(),
        score: 10.0 * (verb_ratio / 0.5).min(1.0),
        max: 10.0,
        detail: format!("{verb_led} of {} bullets start with an action verb", bullets.len()),
    });

    // Keywords
    let (keyword_score, matched_keywords, missing_keywords, keyword_detail) = match job_description
        .map(str::trim)
        .filter(|jd| !jd.is_empty())
    {
        Some(jd) => {
            let keywords = extract_jd_keywords(jd);
            let (matched, missing): (Vec<String>, Vec<String>) = keywords
                .into_iter()
                .partition(|k| contains_term(&tokens, &text_lower, k));
            let share = ratio(matched.len(), matched.len() + missing.len());
            if !missing.is_empty() {
                let top: Vec<&str> = missing.iter().take(5).map(String::as_str).collect();
                suggestions.push(format!(
                    "Mirror the job description's keywords where truthful: {}",
                    top.join(", ")
                ));
            }
            let detail = format!(
                "{} of {} job keywords present",
                matched.len(),
                matched.len() + missing.len()
            );
            (20.0 * share, matched, missing, detail)
        }
        None => {
            let matched: Vec<String> = TECH_SKILLS
                .iter()
                .filter(|s| contains_term(&tokens, &text_lower, s))
                .map(|s| s.to_string())
                .collect();
            if matched.len() < 8 {
                suggestions.push("List more concrete tools and technologies in a skills section".to_string());
            }
            let detail = format!("{} recognised technical skills", matched.len());
            (20.0 * (matched.len() as f32 / 8.0).min(1.0), matched, vec![], detail)
        }
    };
    dimensions.push(AtsDimension {
        name: "keywords".to_string(),
        score: keyword_score,
        max: 20.0,
        detail: keyword_detail,
    });

    let total: f32 = dimensions.iter().map(|d| d.score).sum();

    AtsReport {
        overall_score: total.round().clamp(0.0, 100.0) as u32,
        dimensions,
        matched_keywords,
        missing_keywords,
        suggestions,
        scorer_backend: "keyword".to_string(),
    }
}

fn ratio(part: usize, whole: usize) -> f32 {
    if whole == 0 {
        0.0
    } else {
        part as f32 / whole as f32
    }
}

/// Splits into lowercase terms, keeping `+`, `#` and inner `.` (c++, c#, node.js).
fn tokenize(text_lower: &str) -> HashSet<String> {
    text_lower
        .split(|c: char| !(c.is_alphanumeric() || matches!(c, '+' | '#' | '.')))
        .map(|t| t.trim_matches('.'))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Multi-word terms match as substrings, single words as whole tokens.
fn contains_term(tokens: &HashSet<String>, text_lower: &str, term: &str) -> bool {
    if term.contains(' ') {
        text_lower.contains(term)
    } else {
        tokens.contains(term)
    }
}

fn has_heading(lines: &[&str], headings: &[&str]) -> bool {
    lines.iter().any(|line| {
        let l = line.to_lowercase();
        let l = l.trim_end_matches(':');
        l.len() <= 40 && headings.iter().any(|h| l.contains(h))
    })
}

fn has_email(text: &str) -> bool {
    text.split_whitespace().any(|word| {
        let word = word.trim_matches(|c: char| matches!(c, '<' | '>' | '(' | ')' | ',' | ';' | '|'));
        match word.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty()
                    && domain.contains('.')
                    && !domain.ends_with('.')
                    && !domain.contains('@')
            }
            None => false,
        }
    })
}

/// A run of at least 10 digits allowing common separators.
fn has_phone(text: &str) -> bool {
    let mut digits = 0;
    for c in text.chars() {
        if c.is_ascii_digit() {
            digits += 1;
            if digits >= 10 {
                return true;
            }
        } else if !matches!(c, ' ' | '-' | '(' | ')' | '+' | '.') {
            digits = 0;
        }
    }
    false
}

/// Lines starting with a bullet glyph; falls back to long lines when the PDF lost its glyphs.
fn bullet_lines(lines: &[&str]) -> Vec<String> {
    let glyphed: Vec<String> = lines
        .iter()
        .filter(|l| l.starts_with(BULLET_GLYPHS))
        .map(|l| l.trim_start_matches(BULLET_GLYPHS).trim().to_string())
        .filter(|l| !l.is_empty())
        .collect();
    if !glyphed.is_empty() {
        return glyphed;
    }
    lines
        .iter()
        .filter(|l| l.split_whitespace().count() >= 6)
        .map(|l| l.to_string())
        .collect()
}

fn is_quantified(text: &str) -> bool {
    text.chars().any(|c| c.is_ascii_digit() || matches!(c, '%' | '$' | '€' | '£' | '₹'))
}

fn starts_with_action_verb(text: &str) -> bool {
    text.split_whitespace()
        .next()
        .map(|w| w.trim_matches(|c: char| !c.is_alphabetic()).to_lowercase())
        .map(|w| ACTION_VERBS.contains(&w.as_str()))
        .unwrap_or(false)
}

/// Most frequent non-stopword terms of a job description, ties broken alphabetically.
fn extract_jd_keywords(jd: &str) -> Vec<String> {
    let lower = jd.to_lowercase();
    let mut counts: BTreeMap<String, u32> = BTreeMap::new();
    for token in lower
        .split(|c: char| !(c.is_alphanumeric() || matches!(c, '+' | '#' | '.')))
        .map(|t| t.trim_matches('.'))
        .filter(|t| t.len() >= 2 && !t.chars().all(|c| c.is_ascii_digit()))
        .filter(|t| !STOPWORDS.contains(t))
    {
        *counts.entry(token.to_string()).or_insert(0) += 1;
    }
    for skill in TECH_SKILLS.iter().filter(|s| s.contains(' ')) {
        if lower.contains(skill) {
            *counts.entry(skill.to_string()).or_insert(0) += 1;
        }
    }
    let mut ranked: Vec<(String, u32)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
        .into_iter()
        .take(MAX_JD_KEYWORDS)
        .map(|(k, _)| k)
        .collect()
}

fn dedup_preserving_order(items: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|s| !s.trim().is_empty())
        .filter(|s| seen.insert(s.to_lowercase()))
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const STRONG_RESUME: &str = "\
Priya Sharma
priya.sharma@example.com | +91 98765 43210
Education
B.Tech Computer Science, 2024
Experience
• Built a Rust ingestion service handling 2M events per day
• Reduced API latency by 40% by adding Redis caching
• Led a team of 4 interns to ship an internal dashboard
• Automated deployment with Docker and Kubernetes, cutting release time to 10 minutes
Projects
• Developed a React and TypeScript budgeting app used by 300 students
Skills
Rust, Python, SQL, PostgreSQL, Docker, Kubernetes, AWS, Git, React, TypeScript, Linux
";

    fn dimension<'a>(report: &'a AtsReport, name: &str) -> &'a AtsDimension {
        report.dimensions.iter().find(|d| d.name == name).unwrap()
    }

    #[test]
    fn test_strong_resume_gets_full_structure_points() {
        let report = compute_keyword_report(STRONG_RESUME, None);
        assert_eq!(dimension(&report, "sections").score, 30.0);
        assert_eq!(dimension(&report, "contact").score, 10.0);
        assert_eq!(dimension(&report, "quantified_impact").score, 20.0);
        assert_eq!(dimension(&report, "action_verbs").score, 10.0);
        assert_eq!(dimension(&report, "keywords").score, 20.0);
        assert_eq!(report.scorer_backend, "keyword");
    }

    #[test]
    fn test_short_resume_loses_length_points() {
        let report = compute_keyword_report(STRONG_RESUME, None);
        // ~100 words: below both length bands.
        assert_eq!(dimension(&report, "length").score, 0.0);
        assert!(report.suggestions.iter().any(|s| s.contains("short")));
        assert_eq!(report.overall_score, 90);
    }

    #[test]
    fn test_empty_resume_scores_zero() {
        let report = compute_keyword_report("", None);
        assert_eq!(report.overall_score, 0);
        assert!(report.suggestions.iter().any(|s| s.contains("contact")));
    }

    #[test]
    fn test_job_description_keywords_matched() {
        let jd = "We need Kubernetes and Kubernetes operators, Terraform, and Rust. Terraform is key.";
        let report = compute_keyword_report(STRONG_RESUME, Some(jd));
        assert!(report.matched_keywords.contains(&"kubernetes".to_string()));
        assert!(report.matched_keywords.contains(&"rust".to_string()));
        assert!(report.missing_keywords.contains(&"terraform".to_string()));
        assert!(dimension(&report, "keywords").score < 20.0);
    }

    #[test]
    fn test_blank_job_description_treated_as_absent() {
        let with_blank = compute_keyword_report(STRONG_RESUME, Some("   "));
        let without = compute_keyword_report(STRONG_RESUME, None);
        assert_eq!(with_blank.overall_score, without.overall_score);
    }

    #[test]
    fn test_phone_detection() {
        assert!(has_phone("Call (555) 123-4567 ext"));
        assert!(has_phone("+91 98765 43210"));
        assert!(!has_phone("Class of 2024, GPA 3.9"));
    }

    #[test]
    fn test_email_detection() {
        assert!(has_email("Contact: <me@uni.edu>"));
        assert!(!has_email("me at uni dot edu"));
        assert!(!has_email("@handle"));
    }

    #[test]
    fn test_bullet_fallback_uses_long_lines() {
        let lines = vec!["Experience", "Worked on the billing system for three years"];
        assert_eq!(bullet_lines(&lines).len(), 1);
    }

    #[test]
    fn test_tokenize_keeps_symbols() {
        let tokens = tokenize("c++, c# and node.js.");
        assert!(tokens.contains("c++"));
        assert!(tokens.contains("c#"));
        assert!(tokens.contains("node.js"));
    }

    #[test]
    fn test_jd_keywords_ranked_by_frequency() {
        let keywords = extract_jd_keywords("Python python python. SQL sql. Airflow. The the the.");
        assert_eq!(keywords[0], "python");
        assert_eq!(keywords[1], "sql");
        assert!(!keywords.contains(&"the".to_string()));
    }

    #[test]
    fn test_dedup_preserving_order() {
        let items = vec!["Add metrics".into(), "add metrics".into(), "".into(), "Trim".into()];
        assert_eq!(
            dedup_preserving_order(items),
            vec!["Add metrics".to_string(), "Trim".to_string()]
        );
    }
}
