//! XP, levels and daily streaks. Pure functions over `CareerProgressRow`.

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::career::CareerProgressRow;

pub const MILESTONE_BONUS_XP: i64 = 100;
const STREAK_BONUS_CAP: i32 = 7;
const STREAK_BONUS_PER_DAY: i64 = 2;

/// ⌊√(xp / 100)⌋ + 1, so level 2 starts at 100 XP, level 3 at 400, level 4 at 900.
pub fn level_for_xp(xp: i64) -> i32 {
    let n = xp.max(0) / 100;
    let mut root = (n as f64).sqrt() as i64;
    // Correct float rounding at perfect squares.
    while root * root > n {
        root -= 1;
    }
    while (root + 1) * (root + 1) <= n {
        root += 1;
    }
    root as i32 + 1
}

pub fn streak_bonus(streak: i32) -> i64 {
    i64::from(streak.clamp(0, STREAK_BONUS_CAP)) * STREAK_BONUS_PER_DAY
}

/// Same UTC day keeps the streak, the next day extends it, any gap restarts it.
pub fn next_streak(last_active: Option<NaiveDate>, current: i32, today: NaiveDate) -> i32 {
    match last_active {
        Some(last) if last >= today => current.max(1),
        Some(last) if last.succ_opt() == Some(today) => current + 1,
        _ => 1,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionOutcome {
    pub xp_gained: i64,
    pub task_xp: i64,
    pub streak_bonus_xp: i64,
    pub milestone_bonus_xp: i64,
    pub milestone_completed: bool,
    pub total_xp: i64,
    pub level: i32,
    pub leveled_up: bool,
    pub current_streak: i32,
    pub longest_streak: i32,
}

/// Applies one task completion and returns the updated progress row.
pub fn apply_completion(
    progress: &CareerProgressRow,
    task_xp: i32,
    milestone_completed: bool,
    today: NaiveDate,
) -> (CareerProgressRow, CompletionOutcome) {
    let current_streak = next_streak(progress.last_active_date, progress.current_streak, today);
    let longest_streak = progress.longest_streak.max(current_streak);

    let task_xp = i64::from(task_xp.max(0));
    let streak_bonus_xp = streak_bonus(current_streak);
    let milestone_bonus_xp = if milestone_completed {
        MILESTONE_BONUS_XP
    } else {
        0
    };
    let xp_gained = task_xp + streak_bonus_xp + milestone_bonus_xp;
    let total_xp = progress.xp + xp_gained;
    let level = level_for_xp(total_xp);

    let updated = CareerProgressRow {
        user_id: progress.user_id,
        xp: total_xp,
        level,
        current_streak,
        longest_streak,
        last_active_date: Some(today.max(progress.last_active_date.unwrap_or(today))),
    };
    let outcome = CompletionOutcome {
        xp_gained,
        task_xp,
        streak_bonus_xp,
        milestone_bonus_xp,
        milestone_completed,
        total_xp,
        level,
        leveled_up: level > level_for_xp(progress.xp),
        current_streak,
        longest_streak,
    };
    (updated, outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    #[test]
    fn test_level_thresholds() {
        assert_eq!(level_for_xp(0), 1);
        assert_eq!(level_for_xp(99), 1);
        assert_eq!(level_for_xp(100), 2);
        assert_eq!(level_for_xp(399), 2);
        assert_eq!(level_for_xp(400), 3);
        assert_eq!(level_for_xp(900), 4);
        assert_eq!(level_for_xp(-50), 1);
    }

    #[test]
    fn test_streak_bonus_caps_at_seven_days() {
        assert_eq!(streak_bonus(1), 2);
        assert_eq!(streak_bonus(7), 14);
        assert_eq!(streak_bonus(30), 14);
    }

    #[test]
    fn test_next_streak_rules() {
        assert_eq!(next_streak(None, 0, day(10)), 1);
        assert_eq!(next_streak(Some(day(10)), 3, day(10)), 3);
        assert_eq!(next_streak(Some(day(9)), 3, day(10)), 4);
        assert_eq!(next_streak(Some(day(7)), 3, day(10)), 1);
    }

    #[test]
    fn test_first_completion() {
        let progress = CareerProgressRow::default();
        let (updated, outcome) = apply_completion(&progress, 25, false, day(1));
        assert_eq!(outcome.xp_gained, 27);
        assert_eq!(updated.xp, 27);
        assert_eq!(updated.current_streak, 1);
        assert_eq!(updated.longest_streak, 1);
        assert_eq!(updated.last_active_date, Some(day(1)));
        assert!(!outcome.leveled_up);
    }

    #[test]
    fn test_milestone_bonus_and_level_up() {
        let progress = CareerProgressRow {
            xp: 80,
            level: 1,
            current_streak: 2,
            longest_streak: 5,
            last_active_date: Some(day(4)),
            ..Default::default()
        };
        let (updated, outcome) = apply_completion(&progress, 10, true, day(5));
        // 10 task + 3-day streak bonus 6 + milestone 100
        assert_eq!(outcome.xp_gained, 116);
        assert_eq!(updated.xp, 196);
        assert_eq!(updated.level, 2);
        assert!(outcome.leveled_up);
        assert_eq!(updated.current_streak, 3);
        assert_eq!(updated.longest_streak, 5);
    }

    #[test]
    fn test_gap_resets_streak_but_keeps_longest() {
        let progress = CareerProgressRow {
            xp: 500,
            level: 3,
            current_streak: 9,
            longest_streak: 9,
            last_active_date: Some(day(1)),
            ..Default::default()
        };
        let (updated, outcome) = apply_completion(&progress, 50, false, day(5));
        assert_eq!(updated.current_streak, 1);
        assert_eq!(updated.longest_streak, 9);
        assert_eq!(outcome.streak_bonus_xp, 2);
    }
}
