// =============================================================================
// StudyQuest Engine - Leaderboard
// =============================================================================
// Rank is a 1-based position over the entire account population, sorted by
// total XP descending. Tie-break: account id ascending, so recomputation is
// deterministic regardless of storage order.
// =============================================================================

use crate::db::{Database, LeaderboardRow};
use crate::error::EngineError;

/// Sort a (account_id, total_xp) snapshot into rank order.
///
/// Pure so the ordering contract is testable without storage.
pub fn rank_order(mut totals: Vec<(String, i64)>) -> Vec<(String, i64)> {
    totals.sort_by(|a, b| {
        b.1.cmp(&a.1) // Higher XP first
            .then_with(|| a.0.cmp(&b.0)) // Account id for stable ordering
    });
    totals
        .into_iter()
        .enumerate()
        .map(|(i, (account_id, _))| (account_id, (i + 1) as i64))
        .collect()
}

/// Recompute and persist every account's rank from a point-in-time snapshot
/// of committed progression totals. Returns the ranked population size.
///
/// Runs after every XP-affecting mutation; a rank briefly reflecting
/// slightly stale XP is acceptable, a torn read is not (single SELECT
/// snapshot, ranks written in one transaction).
pub async fn recompute(db: &Database) -> Result<usize, EngineError> {
    let totals = db.progression_totals().await?;
    let ranks = rank_order(totals);
    let count = ranks.len();
    db.write_ranks(&ranks).await?;
    tracing::debug!(accounts = count, "leaderboard recomputed");
    Ok(count)
}

/// Top `limit` accounts by persisted rank.
pub async fn top(db: &Database, limit: i64) -> Result<Vec<LeaderboardRow>, EngineError> {
    Ok(db.top_ranked(limit).await?)
}

/// The window of `window` ranks on each side of an account's persisted rank.
/// Empty when the account has never been ranked.
pub async fn around(
    db: &Database,
    account_id: &str,
    window: i64,
) -> Result<Vec<LeaderboardRow>, EngineError> {
    let state = db.get_or_create_progression(account_id).await?;
    let Some(rank) = state.current_rank else {
        return Ok(Vec::new());
    };

    let lo = (rank - window).max(1);
    let hi = rank + window;
    Ok(db.ranked_window(lo, hi).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_db;
    use crate::progression::award_xp;

    #[test]
    fn test_rank_order_descending_with_id_tiebreak() {
        let totals = vec![
            ("carol".to_string(), 300),
            ("alice".to_string(), 500),
            ("dave".to_string(), 300),
            ("bob".to_string(), 700),
        ];
        let ranks = rank_order(totals);
        assert_eq!(
            ranks,
            vec![
                ("bob".to_string(), 1),
                ("alice".to_string(), 2),
                ("carol".to_string(), 3), // ties broken by id ascending
                ("dave".to_string(), 4),
            ]
        );
    }

    #[test]
    fn test_ranks_are_permutation_of_1_to_n() {
        let totals: Vec<_> = (0..20i64)
            .map(|i| (format!("acct-{i:02}"), (i * 37) % 11))
            .collect();
        let mut ranks: Vec<_> = rank_order(totals).into_iter().map(|(_, r)| r).collect();
        ranks.sort_unstable();
        assert_eq!(ranks, (1..=20).collect::<Vec<i64>>());
    }

    #[tokio::test]
    async fn test_recompute_persists_ranks() {
        let db = memory_db().await;
        for (id, name, xp) in [("a1", "alice", 120), ("a2", "bob", 450), ("a3", "carol", 40)] {
            db.create_account(id, name).await.unwrap();
            award_xp(&db, id, xp).await.unwrap();
        }

        let ranked = recompute(&db).await.unwrap();
        assert_eq!(ranked, 3);

        let rows = top(&db, 10).await.unwrap();
        let order: Vec<_> = rows.iter().map(|r| (r.account_id.as_str(), r.rank)).collect();
        assert_eq!(order, vec![("a2", 1), ("a1", 2), ("a3", 3)]);
    }

    #[tokio::test]
    async fn test_around_window() {
        let db = memory_db().await;
        for i in 0..5i64 {
            let id = format!("a{i}");
            db.create_account(&id, &format!("user{i}")).await.unwrap();
            award_xp(&db, &id, (5 - i) * 100).await.unwrap();
        }
        recompute(&db).await.unwrap();

        // a2 holds rank 3; window of 1 -> ranks 2..4
        let rows = around(&db, "a2", 1).await.unwrap();
        let ranks: Vec<_> = rows.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![2, 3, 4]);

        // Unranked account yields an empty window
        db.create_account("zz", "newbie").await.unwrap();
        let rows = around(&db, "zz", 1).await.unwrap();
        assert!(rows.is_empty());
    }
}
