// =============================================================================
// StudyQuest Engine - Coin Ledger
// =============================================================================
// Coins are the secondary spendable currency, separate from XP. Credits
// always succeed; debits must never drive the balance negative.
// =============================================================================

use crate::db::{CoinBalance, Database};
use crate::error::EngineError;

/// Credit coins to an account (get-or-create semantics).
pub async fn credit(
    db: &Database,
    account_id: &str,
    amount: i64,
    reason: &str,
) -> Result<(), EngineError> {
    if amount <= 0 {
        return Err(EngineError::Validation(format!(
            "credit amount must be positive, got {amount}"
        )));
    }

    db.credit_coins(account_id, amount).await?;
    tracing::info!(account_id, amount, reason, "coins credited");
    Ok(())
}

/// Debit coins from an account. Fails with `InsufficientFunds` when the
/// balance cannot cover the amount, leaving balance and total_spent
/// unchanged. The check and decrement execute as one conditional update.
pub async fn debit(db: &Database, account_id: &str, amount: i64) -> Result<i64, EngineError> {
    if amount <= 0 {
        return Err(EngineError::Validation(format!(
            "debit amount must be positive, got {amount}"
        )));
    }

    // Ensure the row exists so a first-touch debit reports funds, not a miss
    let before = db.get_or_create_coins(account_id).await?;
    if !db.try_debit_coins(account_id, amount).await? {
        return Err(EngineError::InsufficientFunds {
            requested: amount,
            available: before.balance,
        });
    }

    let after = db.get_or_create_coins(account_id).await?;
    Ok(after.balance)
}

/// Current balance for an account (get-or-create on first read).
pub async fn balance(db: &Database, account_id: &str) -> Result<CoinBalance, EngineError> {
    Ok(db.get_or_create_coins(account_id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_db;

    #[tokio::test]
    async fn test_credit_then_debit() {
        let db = memory_db().await;
        db.create_account("a1", "alice").await.unwrap();

        credit(&db, "a1", 100, "test").await.unwrap();
        let new_balance = debit(&db, "a1", 30).await.unwrap();
        assert_eq!(new_balance, 70);

        let coins = balance(&db, "a1").await.unwrap();
        assert_eq!(coins.balance, 70);
        assert_eq!(coins.total_earned, 100);
        assert_eq!(coins.total_spent, 30);
        assert_eq!(coins.balance, coins.total_earned - coins.total_spent);
    }

    #[tokio::test]
    async fn test_overdraft_rejected_and_state_unchanged() {
        let db = memory_db().await;
        db.create_account("a1", "alice").await.unwrap();
        credit(&db, "a1", 20, "test").await.unwrap();

        let err = debit(&db, "a1", 50).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::InsufficientFunds { requested: 50, available: 20 }
        ));

        let coins = balance(&db, "a1").await.unwrap();
        assert_eq!(coins.balance, 20);
        assert_eq!(coins.total_spent, 0);
    }

    #[tokio::test]
    async fn test_nonpositive_amounts_rejected() {
        let db = memory_db().await;
        db.create_account("a1", "alice").await.unwrap();

        assert!(matches!(
            credit(&db, "a1", 0, "test").await.unwrap_err(),
            EngineError::Validation(_)
        ));
        assert!(matches!(
            debit(&db, "a1", -5).await.unwrap_err(),
            EngineError::Validation(_)
        ));
    }
}
