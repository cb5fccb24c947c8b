// =============================================================================
// StudyQuest Engine - Database Layer
// =============================================================================
// Row models and queries for every record the engine owns or consumes.
// Content catalogs (games, materials, sessions, tasks) are owned by
// collaborators; the engine reads them and marks completion.
// =============================================================================

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqlitePoolOptions, Pool, Sqlite};

use crate::badges::SEED_BADGES;

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

// =============================================================================
// Row Models
// =============================================================================

/// Account model. Owned by the account-management collaborator; the engine
/// only updates the legacy denormalized `points` mirror.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Account {
    pub id: String,
    pub username: String,
    pub points: i64,
    pub created_at: DateTime<Utc>,
}

/// Per-account progression state (1:1 with Account, created lazily).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProgressionState {
    pub account_id: String,
    pub total_xp: i64,
    pub current_level: i64,
    pub current_level_xp: i64,
    /// 1-based leaderboard rank; None until the first recompute
    pub current_rank: Option<i64>,
    pub updated_at: DateTime<Utc>,
}

/// Per-account streak state (1:1 with Account, created lazily).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct StreakState {
    pub account_id: String,
    pub current_streak: i64,
    pub longest_streak: i64,
    pub last_activity_date: Option<NaiveDate>,
}

/// Per-account coin balance (1:1 with Account, created lazily).
/// Invariant: balance = total_earned - total_spent.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CoinBalance {
    pub account_id: String,
    pub balance: i64,
    pub total_earned: i64,
    pub total_spent: i64,
}

/// Badge definition, seeded at migration time.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct BadgeDefinition {
    pub id: String,
    pub requirement_code: String,
    pub name: String,
    pub category: String,
}

/// A permanent badge grant. At most one per (account, badge), ever.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct BadgeAward {
    pub id: String,
    pub account_id: String,
    pub badge_id: String,
    pub earned_at: DateTime<Utc>,
}

/// Append-only audit record of a point-earning event.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ActivityRecord {
    pub id: String,
    pub account_id: String,
    pub kind: String,
    pub title: String,
    pub points_earned: i64,
    pub created_at: DateTime<Utc>,
}

/// Game definition (collaborator-owned catalog).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Game {
    pub id: String,
    pub name: String,
    pub points_reward: i64,
}

/// Study material definition (collaborator-owned catalog).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct StudyMaterial {
    pub id: String,
    pub title: String,
    pub points_reward: i64,
}

/// Timed study session (collaborator-owned; engine marks completion).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct StudySession {
    pub id: String,
    pub account_id: String,
    pub duration_minutes: i64,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Task (collaborator-owned; engine marks completion).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: String,
    pub account_id: String,
    pub title: String,
    pub base_reward: i64,
    pub priority: String,
    pub deadline: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Leaderboard projection row (persisted rank joined with identity).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LeaderboardRow {
    pub account_id: String,
    pub username: String,
    pub total_xp: i64,
    pub rank: i64,
}

impl Database {
    /// Create a new database connection pool.
    pub async fn new(url: &str) -> Result<Self, sqlx::Error> {
        // Add create_if_missing option for SQLite
        let url_with_options = if url.starts_with("sqlite:") && !url.contains("?") {
            format!("{}?mode=rwc", url)
        } else if url.starts_with("sqlite:") && !url.contains("mode=") {
            format!("{}&mode=rwc", url)
        } else {
            url.to_string()
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url_with_options)
            .await?;

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Run database migrations and seed static badge definitions.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        // Accounts table (collaborator-owned; `points` is the legacy mirror)
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS accounts (
                id TEXT PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                points INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Progression state
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS progression_state (
                account_id TEXT PRIMARY KEY REFERENCES accounts(id),
                total_xp INTEGER NOT NULL DEFAULT 0,
                current_level INTEGER NOT NULL DEFAULT 1,
                current_level_xp INTEGER NOT NULL DEFAULT 0,
                current_rank INTEGER,
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Streak state
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS streak_state (
                account_id TEXT PRIMARY KEY REFERENCES accounts(id),
                current_streak INTEGER NOT NULL DEFAULT 0,
                longest_streak INTEGER NOT NULL DEFAULT 0,
                last_activity_date TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Coin balances (CHECK is a backstop; debits are conditional updates)
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS coin_balances (
                account_id TEXT PRIMARY KEY REFERENCES accounts(id),
                balance INTEGER NOT NULL DEFAULT 0 CHECK (balance >= 0),
                total_earned INTEGER NOT NULL DEFAULT 0,
                total_spent INTEGER NOT NULL DEFAULT 0
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Badge catalog
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS badge_definitions (
                id TEXT PRIMARY KEY,
                requirement_code TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                category TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Badge awards (the UNIQUE pair enforces at-most-once grants)
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS badge_awards (
                id TEXT PRIMARY KEY,
                account_id TEXT NOT NULL REFERENCES accounts(id),
                badge_id TEXT NOT NULL REFERENCES badge_definitions(id),
                earned_at TEXT NOT NULL DEFAULT (datetime('now')),
                UNIQUE(account_id, badge_id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Activity ledger (append-only)
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS activity_log (
                id TEXT PRIMARY KEY,
                account_id TEXT NOT NULL REFERENCES accounts(id),
                kind TEXT NOT NULL,
                title TEXT NOT NULL,
                points_earned INTEGER NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Content catalogs
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS games (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                points_reward INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS study_materials (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                points_reward INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS study_sessions (
                id TEXT PRIMARY KEY,
                account_id TEXT NOT NULL REFERENCES accounts(id),
                duration_minutes INTEGER NOT NULL,
                completed_at TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS tasks (
                id TEXT PRIMARY KEY,
                account_id TEXT NOT NULL REFERENCES accounts(id),
                title TEXT NOT NULL,
                base_reward INTEGER NOT NULL,
                priority TEXT NOT NULL DEFAULT 'low',
                deadline TEXT,
                completed_at TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Create indexes for performance
        let _ = sqlx::query("CREATE INDEX IF NOT EXISTS idx_badge_awards_account ON badge_awards(account_id)")
            .execute(&self.pool)
            .await;
        let _ = sqlx::query("CREATE INDEX IF NOT EXISTS idx_activity_account ON activity_log(account_id, kind)")
            .execute(&self.pool)
            .await;
        let _ = sqlx::query("CREATE INDEX IF NOT EXISTS idx_progression_rank ON progression_state(current_rank)")
            .execute(&self.pool)
            .await;

        self.seed_badges().await?;

        tracing::info!("Database migrations complete");
        Ok(())
    }

    /// Seed the static badge catalog. Idempotent on requirement code.
    async fn seed_badges(&self) -> Result<(), sqlx::Error> {
        for (code, name, category) in SEED_BADGES.iter().copied() {
            sqlx::query(
                r#"
                INSERT OR IGNORE INTO badge_definitions (id, requirement_code, name, category)
                VALUES (?, ?, ?, ?)
                "#,
            )
            .bind(uuid::Uuid::new_v4().to_string())
            .bind(code)
            .bind(name)
            .bind(category)
            .execute(&self.pool)
            .await?;
        }
        Ok(())
    }

    // =========================================================================
    // Account Methods
    // =========================================================================

    /// Create a new account (collaborator/test helper).
    pub async fn create_account(&self, id: &str, username: &str) -> Result<Account, sqlx::Error> {
        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO accounts (id, username, points, created_at)
            VALUES (?, ?, 0, ?)
            "#,
        )
        .bind(id)
        .bind(username)
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await?;

        self.find_account(id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Find account by ID.
    pub async fn find_account(&self, id: &str) -> Result<Option<Account>, sqlx::Error> {
        sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Mirror the progression total into the legacy `points` field.
    pub async fn set_account_points(&self, id: &str, points: i64) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE accounts SET points = ? WHERE id = ?")
            .bind(points)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // =========================================================================
    // Progression Methods
    // =========================================================================

    /// Get-or-create progression state for an account.
    pub async fn get_or_create_progression(
        &self,
        account_id: &str,
    ) -> Result<ProgressionState, sqlx::Error> {
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO progression_state (account_id, updated_at)
            VALUES (?, ?)
            "#,
        )
        .bind(account_id)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        sqlx::query_as::<_, ProgressionState>(
            "SELECT * FROM progression_state WHERE account_id = ?",
        )
        .bind(account_id)
        .fetch_one(&self.pool)
        .await
    }

    /// Persist a progression update after an XP award.
    pub async fn update_progression(
        &self,
        account_id: &str,
        total_xp: i64,
        current_level: i64,
        current_level_xp: i64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE progression_state
            SET total_xp = ?, current_level = ?, current_level_xp = ?, updated_at = ?
            WHERE account_id = ?
            "#,
        )
        .bind(total_xp)
        .bind(current_level)
        .bind(current_level_xp)
        .bind(Utc::now().to_rfc3339())
        .bind(account_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Snapshot of (account_id, total_xp) for rank recomputation.
    pub async fn progression_totals(&self) -> Result<Vec<(String, i64)>, sqlx::Error> {
        sqlx::query_as::<_, (String, i64)>(
            "SELECT account_id, total_xp FROM progression_state",
        )
        .fetch_all(&self.pool)
        .await
    }

    /// Write recomputed ranks in one transaction.
    pub async fn write_ranks(&self, ranks: &[(String, i64)]) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        for (account_id, rank) in ranks {
            sqlx::query("UPDATE progression_state SET current_rank = ? WHERE account_id = ?")
                .bind(rank)
                .bind(account_id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await
    }

    /// Top N leaderboard rows by persisted rank.
    pub async fn top_ranked(&self, limit: i64) -> Result<Vec<LeaderboardRow>, sqlx::Error> {
        sqlx::query_as::<_, LeaderboardRow>(
            r#"
            SELECT p.account_id, a.username, p.total_xp, p.current_rank AS rank
            FROM progression_state p
            INNER JOIN accounts a ON a.id = p.account_id
            WHERE p.current_rank IS NOT NULL
            ORDER BY p.current_rank ASC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }

    /// Leaderboard rows with persisted rank in [lo, hi].
    pub async fn ranked_window(&self, lo: i64, hi: i64) -> Result<Vec<LeaderboardRow>, sqlx::Error> {
        sqlx::query_as::<_, LeaderboardRow>(
            r#"
            SELECT p.account_id, a.username, p.total_xp, p.current_rank AS rank
            FROM progression_state p
            INNER JOIN accounts a ON a.id = p.account_id
            WHERE p.current_rank BETWEEN ? AND ?
            ORDER BY p.current_rank ASC
            "#,
        )
        .bind(lo)
        .bind(hi)
        .fetch_all(&self.pool)
        .await
    }

    // =========================================================================
    // Streak Methods
    // =========================================================================

    /// Get-or-create streak state for an account.
    pub async fn get_or_create_streak(&self, account_id: &str) -> Result<StreakState, sqlx::Error> {
        sqlx::query("INSERT OR IGNORE INTO streak_state (account_id) VALUES (?)")
            .bind(account_id)
            .execute(&self.pool)
            .await?;

        sqlx::query_as::<_, StreakState>("SELECT * FROM streak_state WHERE account_id = ?")
            .bind(account_id)
            .fetch_one(&self.pool)
            .await
    }

    /// Persist a streak transition.
    pub async fn update_streak(
        &self,
        account_id: &str,
        current_streak: i64,
        longest_streak: i64,
        last_activity_date: NaiveDate,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE streak_state
            SET current_streak = ?, longest_streak = ?, last_activity_date = ?
            WHERE account_id = ?
            "#,
        )
        .bind(current_streak)
        .bind(longest_streak)
        .bind(last_activity_date)
        .bind(account_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    // =========================================================================
    // Coin Methods
    // =========================================================================

    /// Get-or-create coin balance for an account.
    pub async fn get_or_create_coins(&self, account_id: &str) -> Result<CoinBalance, sqlx::Error> {
        sqlx::query("INSERT OR IGNORE INTO coin_balances (account_id) VALUES (?)")
            .bind(account_id)
            .execute(&self.pool)
            .await?;

        sqlx::query_as::<_, CoinBalance>("SELECT * FROM coin_balances WHERE account_id = ?")
            .bind(account_id)
            .fetch_one(&self.pool)
            .await
    }

    /// Credit coins. Always succeeds for a positive amount.
    pub async fn credit_coins(&self, account_id: &str, amount: i64) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT OR IGNORE INTO coin_balances (account_id) VALUES (?)")
            .bind(account_id)
            .execute(&self.pool)
            .await?;

        sqlx::query(
            r#"
            UPDATE coin_balances
            SET balance = balance + ?, total_earned = total_earned + ?
            WHERE account_id = ?
            "#,
        )
        .bind(amount)
        .bind(amount)
        .bind(account_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Conditional debit: the balance check and decrement are one statement,
    /// so concurrent spends cannot both succeed past the balance.
    /// Returns false when the balance is insufficient.
    pub async fn try_debit_coins(&self, account_id: &str, amount: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE coin_balances
            SET balance = balance - ?, total_spent = total_spent + ?
            WHERE account_id = ? AND balance >= ?
            "#,
        )
        .bind(amount)
        .bind(amount)
        .bind(account_id)
        .bind(amount)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Badge Methods
    // =========================================================================

    /// Find a badge definition by requirement code.
    pub async fn find_badge_by_code(&self, code: &str) -> Result<Option<BadgeDefinition>, sqlx::Error> {
        sqlx::query_as::<_, BadgeDefinition>(
            "SELECT * FROM badge_definitions WHERE requirement_code = ?",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await
    }

    /// Insert a badge award. The UNIQUE(account_id, badge_id) index makes
    /// this at-most-once; returns false when the award already existed.
    pub async fn try_insert_badge_award(
        &self,
        account_id: &str,
        badge_id: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO badge_awards (id, account_id, badge_id, earned_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(account_id)
        .bind(badge_id)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// All badges held by an account.
    pub async fn badges_for_account(&self, account_id: &str) -> Result<Vec<BadgeDefinition>, sqlx::Error> {
        sqlx::query_as::<_, BadgeDefinition>(
            r#"
            SELECT d.* FROM badge_definitions d
            INNER JOIN badge_awards w ON w.badge_id = d.id
            WHERE w.account_id = ?
            ORDER BY w.earned_at ASC
            "#,
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await
    }

    // =========================================================================
    // Activity Ledger Methods
    // =========================================================================

    /// Append one point-earning event. Pure insert, never mutated.
    pub async fn append_activity(
        &self,
        account_id: &str,
        kind: &str,
        title: &str,
        points_earned: i64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO activity_log (id, account_id, kind, title, points_earned, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(account_id)
        .bind(kind)
        .bind(title)
        .bind(points_earned)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Count of ledger entries of one kind for an account.
    pub async fn count_activity(&self, account_id: &str, kind: &str) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM activity_log WHERE account_id = ? AND kind = ?",
        )
        .bind(account_id)
        .bind(kind)
        .fetch_one(&self.pool)
        .await
    }

    /// Recent ledger entries for history views.
    pub async fn recent_activity(&self, account_id: &str, limit: i64) -> Result<Vec<ActivityRecord>, sqlx::Error> {
        sqlx::query_as::<_, ActivityRecord>(
            r#"
            SELECT * FROM activity_log
            WHERE account_id = ?
            ORDER BY created_at DESC
            LIMIT ?
            "#,
        )
        .bind(account_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }

    // =========================================================================
    // Content Catalog Methods (collaborator-owned definitions)
    // =========================================================================

    /// Register a game definition.
    pub async fn create_game(&self, id: &str, name: &str, points_reward: i64) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO games (id, name, points_reward) VALUES (?, ?, ?)")
            .bind(id)
            .bind(name)
            .bind(points_reward)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Find game by ID.
    pub async fn find_game(&self, id: &str) -> Result<Option<Game>, sqlx::Error> {
        sqlx::query_as::<_, Game>("SELECT * FROM games WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Register a study material definition.
    pub async fn create_study_material(&self, id: &str, title: &str, points_reward: i64) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO study_materials (id, title, points_reward) VALUES (?, ?, ?)")
            .bind(id)
            .bind(title)
            .bind(points_reward)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Find study material by ID.
    pub async fn find_study_material(&self, id: &str) -> Result<Option<StudyMaterial>, sqlx::Error> {
        sqlx::query_as::<_, StudyMaterial>("SELECT * FROM study_materials WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Register a study session.
    pub async fn create_study_session(
        &self,
        id: &str,
        account_id: &str,
        duration_minutes: i64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO study_sessions (id, account_id, duration_minutes) VALUES (?, ?, ?)")
            .bind(id)
            .bind(account_id)
            .bind(duration_minutes)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Find study session by ID.
    pub async fn find_study_session(&self, id: &str) -> Result<Option<StudySession>, sqlx::Error> {
        sqlx::query_as::<_, StudySession>("SELECT * FROM study_sessions WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Mark a session completed. Returns false when it was already completed,
    /// so re-completions are rejected rather than re-rewarded.
    pub async fn try_complete_session(&self, id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE study_sessions SET completed_at = ? WHERE id = ? AND completed_at IS NULL",
        )
        .bind(Utc::now().to_rfc3339())
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Register a task.
    pub async fn create_task(
        &self,
        id: &str,
        account_id: &str,
        title: &str,
        base_reward: i64,
        priority: &str,
        deadline: Option<DateTime<Utc>>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO tasks (id, account_id, title, base_reward, priority, deadline)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id)
        .bind(account_id)
        .bind(title)
        .bind(base_reward)
        .bind(priority)
        .bind(deadline.map(|d| d.to_rfc3339()))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Find task by ID.
    pub async fn find_task(&self, id: &str) -> Result<Option<Task>, sqlx::Error> {
        sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Mark a task completed. Returns false when it was already completed.
    pub async fn try_complete_task(&self, id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE tasks SET completed_at = ? WHERE id = ? AND completed_at IS NULL",
        )
        .bind(Utc::now().to_rfc3339())
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
pub(crate) async fn memory_db() -> Database {
    // A single connection keeps every test query on the same in-memory
    // database; a larger pool would hand each connection its own.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory db");
    let db = Database { pool };
    db.run_migrations().await.expect("migrations");
    db
}
