// =============================================================================
// StudyQuest Engine - Progression Ledger
// =============================================================================
// Total XP is monotonically non-decreasing; the level is always the highest
// table entry whose threshold the total has crossed. Level-ups credit the
// coin ledger with the crossed levels' rewards.
// =============================================================================

use crate::coins;
use crate::db::Database;
use crate::error::EngineError;
use crate::levels::{self, LevelProgress};

/// Result of one XP award.
#[derive(Debug, Clone)]
pub struct XpAward {
    pub new_total_xp: i64,
    pub leveled_up: bool,
    /// Set when leveled_up
    pub new_level: Option<i64>,
    pub levels_gained: i64,
    /// Coins credited for the level-ups (0 when none)
    pub coins_awarded: i64,
}

/// Award XP to an account. `amount` must be >= 0; zero is a no-op that
/// still normalizes the derived level fields.
///
/// Also mirrors the new total into the legacy `accounts.points` field.
pub async fn award_xp(
    db: &Database,
    account_id: &str,
    amount: i64,
) -> Result<XpAward, EngineError> {
    if amount < 0 {
        return Err(EngineError::Validation(format!(
            "XP amount must be non-negative, got {amount}"
        )));
    }

    let state = db.get_or_create_progression(account_id).await?;
    let old_level = levels::level_of(state.total_xp).level;

    let new_total = state.total_xp + amount;
    let progress = levels::level_of(new_total);

    db.update_progression(account_id, new_total, progress.level, progress.current_level_xp)
        .await?;
    db.set_account_points(account_id, new_total).await?;

    let levels_gained = progress.level - old_level;
    let mut coins_awarded = 0;
    if levels_gained > 0 {
        coins_awarded = levels::coins_for_level_ups(old_level, progress.level);
        if coins_awarded > 0 {
            coins::credit(db, account_id, coins_awarded, "level-up").await?;
        }
        tracing::info!(
            account_id,
            old_level,
            new_level = progress.level,
            new_total,
            coins_awarded,
            "level up"
        );
    }

    Ok(XpAward {
        new_total_xp: new_total,
        leveled_up: levels_gained > 0,
        new_level: (levels_gained > 0).then_some(progress.level),
        levels_gained,
        coins_awarded,
    })
}

/// Level progress projection for an account (get-or-create on first read).
pub async fn get_progress(db: &Database, account_id: &str) -> Result<(i64, LevelProgress), EngineError> {
    let state = db.get_or_create_progression(account_id).await?;
    Ok((state.total_xp, levels::level_of(state.total_xp)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_db;

    #[tokio::test]
    async fn test_total_xp_is_running_sum() {
        let db = memory_db().await;
        db.create_account("a1", "alice").await.unwrap();

        let amounts = [10, 0, 35, 5, 50];
        let mut expected = 0;
        for amount in amounts {
            let award = award_xp(&db, "a1", amount).await.unwrap();
            expected += amount;
            assert_eq!(award.new_total_xp, expected);
        }

        let (total, _) = get_progress(&db, "a1").await.unwrap();
        assert_eq!(total, expected);

        // Legacy mirror stays in sync
        let account = db.find_account("a1").await.unwrap().unwrap();
        assert_eq!(account.points, expected);
    }

    #[tokio::test]
    async fn test_negative_amount_rejected() {
        let db = memory_db().await;
        db.create_account("a1", "alice").await.unwrap();

        let err = award_xp(&db, "a1", -1).await.unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[tokio::test]
    async fn test_level_up_credits_table_reward() {
        let db = memory_db().await;
        db.create_account("a1", "alice").await.unwrap();

        award_xp(&db, "a1", 90).await.unwrap();
        let award = award_xp(&db, "a1", 20).await.unwrap();

        assert_eq!(award.new_total_xp, 110);
        assert!(award.leveled_up);
        assert_eq!(award.new_level, Some(2));
        assert_eq!(award.levels_gained, 1);
        assert_eq!(award.coins_awarded, 25);

        let coins = crate::coins::balance(&db, "a1").await.unwrap();
        assert_eq!(coins.balance, 25);
    }

    #[tokio::test]
    async fn test_multi_level_jump_pays_each_level() {
        let db = memory_db().await;
        db.create_account("a1", "alice").await.unwrap();

        // 0 -> 300 XP crosses levels 2 (100) and 3 (250)
        let award = award_xp(&db, "a1", 300).await.unwrap();
        assert_eq!(award.levels_gained, 2);
        assert_eq!(award.coins_awarded, 50);
    }

    #[tokio::test]
    async fn test_zero_award_normalizes_without_change() {
        let db = memory_db().await;
        db.create_account("a1", "alice").await.unwrap();

        award_xp(&db, "a1", 120).await.unwrap();
        let award = award_xp(&db, "a1", 0).await.unwrap();
        assert_eq!(award.new_total_xp, 120);
        assert!(!award.leveled_up);
        assert_eq!(award.coins_awarded, 0);
    }
}
