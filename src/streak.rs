// =============================================================================
// StudyQuest Engine - Streak Tracker
// =============================================================================
// A streak counts consecutive calendar days with at least one qualifying
// activity. The calendar transition is a pure function so the day rules are
// testable without storage; the wrapper persists and pays milestones.
// =============================================================================

use chrono::{Duration, NaiveDate};

use crate::badges::{self, BadgeGrant};
use crate::coins;
use crate::db::{BadgeDefinition, Database, StreakState};
use crate::error::EngineError;

/// Coin bonuses paid when a streak reaches these exact lengths.
const STREAK_COIN_BONUSES: &[(i64, i64)] = &[(7, 50), (14, 100), (30, 200), (100, 500)];

/// Streak badges attempted at these exact lengths. Overlaps the coin table
/// at 30 on purpose; a coin bonus and a badge are different rewards.
const STREAK_BADGE_MILESTONES: &[(i64, &str)] = &[
    (5, "5-day-streak"),
    (10, "10-day-streak"),
    (30, "30-day-streak"),
];

/// Result of applying one activity date to a streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakTransition {
    pub current_streak: i64,
    pub longest_streak: i64,
    /// True when the streak grew by one consecutive day (milestones only
    /// fire on this path)
    pub extended: bool,
    /// False when a gap broke the previous streak
    pub maintained: bool,
}

/// Apply one activity on `today` to the stored streak values.
///
/// Same-day repeats are no-ops; `today` earlier than the stored date is
/// treated the same way (activity dates never move the clock backwards).
pub fn advance(
    current_streak: i64,
    longest_streak: i64,
    last_activity_date: Option<NaiveDate>,
    today: NaiveDate,
) -> StreakTransition {
    let (current, extended, maintained) = match last_activity_date {
        None => (1, false, true),
        Some(last) if today <= last => (current_streak, false, true),
        Some(last) if today == last + Duration::days(1) => (current_streak + 1, true, true),
        Some(_) => (1, false, false),
    };

    StreakTransition {
        current_streak: current,
        longest_streak: longest_streak.max(current),
        extended,
        maintained,
    }
}

/// Outcome of recording one qualifying activity.
#[derive(Debug)]
pub struct StreakOutcome {
    pub state: StreakState,
    pub streak_maintained: bool,
    /// Coin bonus paid for hitting a milestone this update (0 if none)
    pub coin_bonus: i64,
    /// Streak badges newly granted this update
    pub new_badges: Vec<BadgeDefinition>,
}

/// Record a qualifying activity for `today` (get-or-create on first touch).
pub async fn record_activity(
    db: &Database,
    account_id: &str,
    today: NaiveDate,
) -> Result<StreakOutcome, EngineError> {
    let state = db.get_or_create_streak(account_id).await?;
    let transition = advance(
        state.current_streak,
        state.longest_streak,
        state.last_activity_date,
        today,
    );

    // Never let the stored date move backwards
    let store_date = state.last_activity_date.map_or(today, |last| last.max(today));
    db.update_streak(
        account_id,
        transition.current_streak,
        transition.longest_streak,
        store_date,
    )
    .await?;

    if !transition.maintained {
        tracing::info!(
            account_id,
            lost_streak = state.current_streak,
            "streak broken"
        );
    }

    let mut coin_bonus = 0;
    let mut new_badges = Vec::new();
    if transition.extended {
        if let Some((_, bonus)) = STREAK_COIN_BONUSES
            .iter()
            .find(|(days, _)| *days == transition.current_streak)
        {
            coins::credit(db, account_id, *bonus, "streak-milestone").await?;
            coin_bonus = *bonus;
        }

        if let Some((_, code)) = STREAK_BADGE_MILESTONES
            .iter()
            .find(|(days, _)| *days == transition.current_streak)
        {
            // Already-held badges are silently skipped
            if let BadgeGrant::Granted(badge) = badges::grant_if_eligible(db, account_id, code).await? {
                new_badges.push(badge);
            }
        }
    }

    Ok(StreakOutcome {
        state: StreakState {
            account_id: account_id.to_string(),
            current_streak: transition.current_streak,
            longest_streak: transition.longest_streak,
            last_activity_date: Some(store_date),
        },
        streak_maintained: transition.maintained,
        coin_bonus,
        new_badges,
    })
}

/// Read the streak for an account (get-or-create on first read).
pub async fn get_streak(db: &Database, account_id: &str) -> Result<StreakState, EngineError> {
    Ok(db.get_or_create_streak(account_id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_db;

    fn day(n: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, n).unwrap()
    }

    #[test]
    fn test_first_activity_starts_at_one() {
        let t = advance(0, 0, None, day(1));
        assert_eq!(t.current_streak, 1);
        assert_eq!(t.longest_streak, 1);
        assert!(t.maintained);
        assert!(!t.extended);
    }

    #[test]
    fn test_consecutive_days_build_streak() {
        // D, D+1, D+2 -> 3
        let t1 = advance(0, 0, None, day(1));
        let t2 = advance(t1.current_streak, t1.longest_streak, Some(day(1)), day(2));
        let t3 = advance(t2.current_streak, t2.longest_streak, Some(day(2)), day(3));
        assert_eq!(t3.current_streak, 3);
        assert_eq!(t3.longest_streak, 3);
        assert!(t3.extended);
    }

    #[test]
    fn test_same_day_repeat_is_idempotent() {
        let t = advance(4, 6, Some(day(10)), day(10));
        assert_eq!(t.current_streak, 4);
        assert_eq!(t.longest_streak, 6);
        assert!(t.maintained);
        assert!(!t.extended);
    }

    #[test]
    fn test_gap_resets_streak() {
        // D then D+3
        let t = advance(5, 5, Some(day(1)), day(4));
        assert_eq!(t.current_streak, 1);
        assert!(!t.maintained);
        // Longest survives the reset
        assert_eq!(t.longest_streak, 5);
    }

    #[test]
    fn test_longest_tracks_current() {
        let t = advance(7, 7, Some(day(8)), day(9));
        assert_eq!(t.current_streak, 8);
        assert_eq!(t.longest_streak, 8);
    }

    #[tokio::test]
    async fn test_seven_day_streak_pays_bonus_once() {
        let db = memory_db().await;
        db.create_account("a1", "alice").await.unwrap();

        for n in 1..=7 {
            record_activity(&db, "a1", day(n)).await.unwrap();
        }
        let state = get_streak(&db, "a1").await.unwrap();
        assert_eq!(state.current_streak, 7);

        let coins = crate::coins::balance(&db, "a1").await.unwrap();
        assert_eq!(coins.balance, 50);

        // A same-day repeat does not pay the bonus again
        record_activity(&db, "a1", day(7)).await.unwrap();
        let coins = crate::coins::balance(&db, "a1").await.unwrap();
        assert_eq!(coins.balance, 50);
    }

    #[tokio::test]
    async fn test_streak_badges_at_milestones() {
        let db = memory_db().await;
        db.create_account("a1", "alice").await.unwrap();

        let mut badge_days = Vec::new();
        for n in 1..=10 {
            let outcome = record_activity(&db, "a1", day(n)).await.unwrap();
            if !outcome.new_badges.is_empty() {
                badge_days.push(n);
            }
        }
        // Badges at day 5 and day 10
        assert_eq!(badge_days, vec![5, 10]);

        let held = db.badges_for_account("a1").await.unwrap();
        let codes: Vec<_> = held.iter().map(|b| b.requirement_code.as_str()).collect();
        assert_eq!(codes, vec!["5-day-streak", "10-day-streak"]);
    }
}
