//! Leaderboard ordering with competition ("1224") ranking.

use std::cmp::Ordering;

use serde::Serialize;
use uuid::Uuid;

use crate::models::career::LeaderboardRow;

pub const DEFAULT_LIMIT: i64 = 20;
pub const MAX_LIMIT: i64 = 100;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub user_id: Uuid,
    pub name: String,
    pub xp: i64,
    pub level: i32,
    pub longest_streak: i32,
}

pub fn clamp_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

fn standing(a: &LeaderboardRow, b: &LeaderboardRow) -> Ordering {
    b.xp.cmp(&a.xp)
        .then_with(|| b.longest_streak.cmp(&a.longest_streak))
}

/// Sorts by xp desc, longest streak desc, name asc. Entries tied on xp and
/// streak share a rank; the following rank skips accordingly.
pub fn rank_entries(mut rows: Vec<LeaderboardRow>) -> Vec<LeaderboardEntry> {
    rows.sort_by(|a, b| standing(a, b).then_with(|| a.name.cmp(&b.name)));

    let mut entries: Vec<LeaderboardEntry> = Vec::with_capacity(rows.len());
    let mut previous: Option<&LeaderboardRow> = None;
    let mut rank = 0;
    for (idx, row) in rows.iter().enumerate() {
        let tied = previous.is_some_and(|p| standing(p, row) == Ordering::Equal);
        if !tied {
            rank = idx as u32 + 1;
        }
        entries.push(LeaderboardEntry {
            rank,
            user_id: row.user_id,
            name: row.name.clone(),
            xp: row.xp,
            level: row.level,
            longest_streak: row.longest_streak,
        });
        previous = Some(row);
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, xp: i64, streak: i32) -> LeaderboardRow {
        LeaderboardRow {
            user_id: Uuid::new_v4(),
            name: name.to_string(),
            xp,
            level: 1,
            longest_streak: streak,
        }
    }

    #[test]
    fn test_competition_ranking() {
        let ranked = rank_entries(vec![
            row("Dev", 100, 2),
            row("Bea", 300, 4),
            row("Ana", 300, 4),
            row("Cy", 300, 1),
        ]);
        let summary: Vec<(u32, &str)> = ranked.iter().map(|e| (e.rank, e.name.as_str())).collect();
        assert_eq!(summary, vec![(1, "Ana"), (1, "Bea"), (3, "Cy"), (4, "Dev")]);
    }

    #[test]
    fn test_empty_leaderboard() {
        assert!(rank_entries(vec![]).is_empty());
    }

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(None), 20);
        assert_eq!(clamp_limit(Some(0)), 1);
        assert_eq!(clamp_limit(Some(500)), 100);
        assert_eq!(clamp_limit(Some(42)), 42);
    }
}
