// =============================================================================
// StudyQuest Engine - Badge Engine
// =============================================================================
// Badges are permanent, at-most-once-per-account awards keyed by a
// requirement code. Stat-threshold badges derive their counters from the
// activity ledger and the progression total.
// =============================================================================

use crate::activity::ActivityKind;
use crate::db::{BadgeDefinition, Database};
use crate::error::EngineError;

/// Static badge catalog seeded at migration time: (code, name, category).
pub const SEED_BADGES: &[(&str, &str, &str)] = &[
    ("5-day-streak", "On a Roll", "streak"),
    ("10-day-streak", "Unstoppable", "streak"),
    ("30-day-streak", "Iron Will", "streak"),
    ("gamer-10", "Game On", "games"),
    ("gamer-50", "Arcade Regular", "games"),
    ("studious-10", "Getting Serious", "sessions"),
    ("studious-50", "Deep Focus", "sessions"),
    ("scholar-1000", "Scholar", "xp"),
    ("scholar-5000", "Sage", "xp"),
    ("scholar-10000", "Luminary", "xp"),
];

/// Games-completed thresholds and their badge codes.
const GAME_COUNT_BADGES: &[(i64, &str)] = &[(10, "gamer-10"), (50, "gamer-50")];

/// Study-sessions-completed thresholds and their badge codes.
const SESSION_COUNT_BADGES: &[(i64, &str)] = &[(10, "studious-10"), (50, "studious-50")];

/// Total-XP thresholds and their badge codes.
const TOTAL_XP_BADGES: &[(i64, &str)] = &[
    (1000, "scholar-1000"),
    (5000, "scholar-5000"),
    (10000, "scholar-10000"),
];

/// Outcome of a single grant attempt.
#[derive(Debug, Clone)]
pub enum BadgeGrant {
    /// The badge was newly awarded
    Granted(BadgeDefinition),
    /// The account already held this badge
    AlreadyHeld,
    /// No badge is seeded for this requirement code (tolerated, not an error)
    NoSuchBadge,
}

/// Grant a badge by requirement code if the account does not hold it yet.
///
/// The at-most-once invariant rests on the storage-level unique index over
/// (account_id, badge_id), so concurrent triggers crossing the same
/// threshold still produce a single award.
pub async fn grant_if_eligible(
    db: &Database,
    account_id: &str,
    requirement_code: &str,
) -> Result<BadgeGrant, EngineError> {
    let Some(badge) = db.find_badge_by_code(requirement_code).await? else {
        tracing::debug!(requirement_code, "no badge seeded for requirement code");
        return Ok(BadgeGrant::NoSuchBadge);
    };

    if db.try_insert_badge_award(account_id, &badge.id).await? {
        tracing::info!(account_id, requirement_code, "badge granted");
        Ok(BadgeGrant::Granted(badge))
    } else {
        Ok(BadgeGrant::AlreadyHeld)
    }
}

/// Grant every stat-threshold badge the account is now eligible for.
///
/// Safe to call repeatedly; only ungranted, now-eligible badges produce
/// awards. Returns the newly granted badges.
pub async fn evaluate_stat_thresholds(
    db: &Database,
    account_id: &str,
) -> Result<Vec<BadgeDefinition>, EngineError> {
    let games_completed = db.count_activity(account_id, ActivityKind::Game.as_str()).await?;
    let sessions_completed = db
        .count_activity(account_id, ActivityKind::StudySession.as_str())
        .await?;
    let total_xp = db.get_or_create_progression(account_id).await?.total_xp;

    let mut newly_granted = Vec::new();
    let eligible = GAME_COUNT_BADGES
        .iter()
        .filter(|(threshold, _)| games_completed >= *threshold)
        .chain(
            SESSION_COUNT_BADGES
                .iter()
                .filter(|(threshold, _)| sessions_completed >= *threshold),
        )
        .chain(
            TOTAL_XP_BADGES
                .iter()
                .filter(|(threshold, _)| total_xp >= *threshold),
        );

    for (_, code) in eligible {
        if let BadgeGrant::Granted(badge) = grant_if_eligible(db, account_id, code).await? {
            newly_granted.push(badge);
        }
    }

    Ok(newly_granted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_db;

    async fn setup() -> Database {
        let db = memory_db().await;
        db.create_account("a1", "alice").await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_grant_is_idempotent() {
        let db = setup().await;

        let first = grant_if_eligible(&db, "a1", "5-day-streak").await.unwrap();
        assert!(matches!(first, BadgeGrant::Granted(_)));

        let second = grant_if_eligible(&db, "a1", "5-day-streak").await.unwrap();
        assert!(matches!(second, BadgeGrant::AlreadyHeld));

        let held = db.badges_for_account("a1").await.unwrap();
        assert_eq!(held.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_code_is_tolerated() {
        let db = setup().await;
        let outcome = grant_if_eligible(&db, "a1", "not-a-real-badge").await.unwrap();
        assert!(matches!(outcome, BadgeGrant::NoSuchBadge));
    }

    #[tokio::test]
    async fn test_stat_thresholds_from_ledger_counts() {
        let db = setup().await;

        // Nine games: below every threshold
        for _ in 0..9 {
            db.append_activity("a1", "game", "Word Scramble", 10).await.unwrap();
        }
        let granted = evaluate_stat_thresholds(&db, "a1").await.unwrap();
        assert!(granted.is_empty());

        // Tenth game crosses the first games threshold
        db.append_activity("a1", "game", "Word Scramble", 10).await.unwrap();
        let granted = evaluate_stat_thresholds(&db, "a1").await.unwrap();
        assert_eq!(granted.len(), 1);
        assert_eq!(granted[0].requirement_code, "gamer-10");

        // Re-evaluation grants nothing new
        let granted = evaluate_stat_thresholds(&db, "a1").await.unwrap();
        assert!(granted.is_empty());
    }

    #[tokio::test]
    async fn test_xp_threshold_badges() {
        let db = setup().await;
        db.get_or_create_progression("a1").await.unwrap();
        db.update_progression("a1", 5200, 10, 0).await.unwrap();

        let granted = evaluate_stat_thresholds(&db, "a1").await.unwrap();
        let codes: Vec<_> = granted.iter().map(|b| b.requirement_code.as_str()).collect();
        assert!(codes.contains(&"scholar-1000"));
        assert!(codes.contains(&"scholar-5000"));
        assert!(!codes.contains(&"scholar-10000"));
    }
}
