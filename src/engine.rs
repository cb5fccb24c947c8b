// =============================================================================
// StudyQuest Engine - External Interface
// =============================================================================
// The facade request handlers call into. Every completion operation runs
// the same pipeline under the account's lock: compute XP, award it (coins
// on level-up inside), streak when eligible, append to the activity ledger,
// evaluate badge thresholds, recompute the leaderboard, emit events.
// =============================================================================

use std::sync::Arc;

use chrono::Utc;

use crate::activity::{self, ActivityKind};
use crate::badges;
use crate::coins;
use crate::config::Config;
use crate::db::{ActivityRecord, CoinBalance, Database, LeaderboardRow, StreakState};
use crate::error::EngineError;
use crate::events::{EngineEvent, EventSink};
use crate::leaderboard;
use crate::levels::LevelProgress;
use crate::locks::AccountLocks;
use crate::progression::{self, XpAward};
use crate::streak::{self, StreakOutcome};

/// Raw game scores are normalized against this scale before applying the
/// game's points reward.
const SCORE_SCALE: i64 = 1000;

/// Reward multiplier for finishing a task before its deadline.
const EARLY_FINISH_MULTIPLIER: f64 = 1.5;

/// Task priority and its reward multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

impl TaskPriority {
    pub fn multiplier(&self) -> f64 {
        match self {
            Self::Low => 1.0,
            Self::Medium => 1.2,
            Self::High => 1.5,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Parse the stored form; unknown values fall back to Low.
    pub fn from_code(code: &str) -> Self {
        match code {
            "high" => Self::High,
            "medium" => Self::Medium,
            _ => Self::Low,
        }
    }
}

/// Result of completing a game.
#[derive(Debug, Clone)]
pub struct GameCompletion {
    pub points_earned: i64,
    pub new_total_xp: i64,
}

/// Result of completing a study material.
#[derive(Debug, Clone)]
pub struct MaterialCompletion {
    pub points_earned: i64,
    pub new_total_xp: i64,
}

/// Result of completing a timed study session.
#[derive(Debug, Clone)]
pub struct SessionCompletion {
    pub xp_earned: i64,
    pub new_total_xp: i64,
    pub current_streak: i64,
}

/// Result of completing a task.
#[derive(Debug, Clone)]
pub struct TaskCompletion {
    pub xp_earned: i64,
    pub new_total_xp: i64,
}

/// The progression & ranking engine.
///
/// A single logical instance owns the progression rules; request handlers
/// share it behind an `Arc`.
pub struct Engine {
    db: Database,
    config: Config,
    events: Arc<dyn EventSink>,
    locks: AccountLocks,
}

impl Engine {
    pub fn new(db: Database, config: Config, events: Arc<dyn EventSink>) -> Self {
        Self {
            db,
            config,
            events,
            locks: AccountLocks::new(),
        }
    }

    /// The underlying database handle (for collaborators that seed content).
    pub fn db(&self) -> &Database {
        &self.db
    }

    async fn require_account(&self, account_id: &str) -> Result<(), EngineError> {
        if self.db.find_account(account_id).await?.is_none() {
            return Err(EngineError::AccountNotFound(account_id.to_string()));
        }
        Ok(())
    }

    /// Shared completion tail: ledger append, badge evaluation, leaderboard
    /// recompute, event emission. Runs while the account lock is held.
    async fn finish_completion(
        &self,
        account_id: &str,
        kind: ActivityKind,
        title: &str,
        points: i64,
        award: &XpAward,
        streak: Option<&StreakOutcome>,
    ) -> Result<(), EngineError> {
        activity::append(&self.db, account_id, kind, title, points).await?;
        let threshold_badges = badges::evaluate_stat_thresholds(&self.db, account_id).await?;
        leaderboard::recompute(&self.db).await?;

        if award.leveled_up {
            self.events.publish(EngineEvent::LevelUp);
        }
        if let Some(outcome) = streak {
            if outcome.coin_bonus > 0 || !outcome.new_badges.is_empty() {
                self.events.publish(EngineEvent::StreakMilestone);
            }
        }
        let streak_badges = streak.map_or(0, |outcome| outcome.new_badges.len());
        if !threshold_badges.is_empty() || streak_badges > 0 {
            self.events.publish(EngineEvent::BadgeEarned);
        }
        self.events.publish(EngineEvent::LeaderboardChanged);
        Ok(())
    }

    // =========================================================================
    // Completion Operations
    // =========================================================================

    /// Complete a game: points = raw_score / SCORE_SCALE * game reward,
    /// floored. Games are repeatable.
    pub async fn complete_game(
        &self,
        account_id: &str,
        game_id: &str,
        raw_score: i64,
    ) -> Result<GameCompletion, EngineError> {
        if raw_score < 0 {
            return Err(EngineError::Validation(format!(
                "raw score must be non-negative, got {raw_score}"
            )));
        }
        self.require_account(account_id).await?;
        let game = self
            .db
            .find_game(game_id)
            .await?
            .ok_or_else(|| EngineError::not_found("game", game_id))?;

        let lock = self.locks.lock_for(account_id);
        let _guard = lock.lock().await;

        let points = raw_score
            .checked_mul(game.points_reward)
            .map(|scaled| scaled / SCORE_SCALE)
            .ok_or_else(|| {
                EngineError::Validation(format!("raw score {raw_score} is out of range"))
            })?;
        let award = progression::award_xp(&self.db, account_id, points).await?;
        self.finish_completion(account_id, ActivityKind::Game, &game.name, points, &award, None)
            .await?;

        Ok(GameCompletion {
            points_earned: points,
            new_total_xp: award.new_total_xp,
        })
    }

    /// Complete a study material for its flat reward. Repeatable.
    pub async fn complete_study_material(
        &self,
        account_id: &str,
        material_id: &str,
    ) -> Result<MaterialCompletion, EngineError> {
        self.require_account(account_id).await?;
        let material = self
            .db
            .find_study_material(material_id)
            .await?
            .ok_or_else(|| EngineError::not_found("study material", material_id))?;

        let lock = self.locks.lock_for(account_id);
        let _guard = lock.lock().await;

        let award = progression::award_xp(&self.db, account_id, material.points_reward).await?;
        self.finish_completion(
            account_id,
            ActivityKind::StudyMaterial,
            &material.title,
            material.points_reward,
            &award,
            None,
        )
        .await?;

        Ok(MaterialCompletion {
            points_earned: material.points_reward,
            new_total_xp: award.new_total_xp,
        })
    }

    /// Complete a timed study session: XP = minutes x configured rate.
    /// Streak-eligible; re-completion is rejected, not re-rewarded.
    pub async fn complete_study_session(
        &self,
        account_id: &str,
        session_id: &str,
    ) -> Result<SessionCompletion, EngineError> {
        self.require_account(account_id).await?;
        let session = self
            .db
            .find_study_session(session_id)
            .await?
            .ok_or_else(|| EngineError::not_found("study session", session_id))?;
        if session.account_id != account_id {
            return Err(EngineError::not_found("study session", session_id));
        }

        let lock = self.locks.lock_for(account_id);
        let _guard = lock.lock().await;

        if !self.db.try_complete_session(session_id).await? {
            return Err(EngineError::AlreadyCompleted("study session"));
        }

        let xp = session.duration_minutes * self.config.xp_per_study_minute;
        let award = progression::award_xp(&self.db, account_id, xp).await?;
        let outcome = streak::record_activity(&self.db, account_id, Utc::now().date_naive()).await?;
        self.finish_completion(
            account_id,
            ActivityKind::StudySession,
            "Study session",
            xp,
            &award,
            Some(&outcome),
        )
        .await?;

        Ok(SessionCompletion {
            xp_earned: xp,
            new_total_xp: award.new_total_xp,
            current_streak: outcome.state.current_streak,
        })
    }

    /// Complete a task: XP = base reward x priority multiplier, x1.5 when
    /// finished before the deadline, floored. Re-completion is rejected.
    pub async fn complete_task(
        &self,
        account_id: &str,
        task_id: &str,
    ) -> Result<TaskCompletion, EngineError> {
        self.require_account(account_id).await?;
        let task = self
            .db
            .find_task(task_id)
            .await?
            .ok_or_else(|| EngineError::not_found("task", task_id))?;
        if task.account_id != account_id {
            return Err(EngineError::not_found("task", task_id));
        }

        let lock = self.locks.lock_for(account_id);
        let _guard = lock.lock().await;

        if !self.db.try_complete_task(task_id).await? {
            return Err(EngineError::AlreadyCompleted("task"));
        }

        let priority = TaskPriority::from_code(&task.priority);
        let early = match task.deadline {
            Some(deadline) if Utc::now() < deadline => EARLY_FINISH_MULTIPLIER,
            _ => 1.0,
        };
        let xp = (task.base_reward as f64 * priority.multiplier() * early).floor() as i64;
        tracing::debug!(
            task = %task.title,
            priority = priority.as_str(),
            xp,
            "task completed"
        );

        let award = progression::award_xp(&self.db, account_id, xp).await?;
        self.finish_completion(account_id, ActivityKind::Task, &task.title, xp, &award, None)
            .await?;

        Ok(TaskCompletion {
            xp_earned: xp,
            new_total_xp: award.new_total_xp,
        })
    }

    // =========================================================================
    // Coins
    // =========================================================================

    /// Spend coins (the generic debit primitive; the shop flow around it is
    /// an external collaborator). Returns the new balance.
    pub async fn spend_coins(&self, account_id: &str, amount: i64) -> Result<i64, EngineError> {
        self.require_account(account_id).await?;

        let lock = self.locks.lock_for(account_id);
        let _guard = lock.lock().await;

        coins::debit(&self.db, account_id, amount).await
    }

    /// Coin balance (get-or-create on first read).
    pub async fn get_coin_balance(&self, account_id: &str) -> Result<CoinBalance, EngineError> {
        self.require_account(account_id).await?;
        coins::balance(&self.db, account_id).await
    }

    // =========================================================================
    // Read Projections
    // =========================================================================

    /// Top of the leaderboard; `limit` defaults from config.
    pub async fn get_leaderboard(
        &self,
        limit: Option<i64>,
    ) -> Result<Vec<LeaderboardRow>, EngineError> {
        let limit = limit.unwrap_or(self.config.leaderboard_default_limit);
        leaderboard::top(&self.db, limit).await
    }

    /// Leaderboard window around an account's rank.
    pub async fn get_leaderboard_around(
        &self,
        account_id: &str,
        window: i64,
    ) -> Result<Vec<LeaderboardRow>, EngineError> {
        self.require_account(account_id).await?;
        leaderboard::around(&self.db, account_id, window).await
    }

    /// Streak state (get-or-create on first read).
    pub async fn get_streak(&self, account_id: &str) -> Result<StreakState, EngineError> {
        self.require_account(account_id).await?;
        streak::get_streak(&self.db, account_id).await
    }

    /// Level progress projection for profile views.
    pub async fn get_progress(
        &self,
        account_id: &str,
    ) -> Result<(i64, LevelProgress), EngineError> {
        self.require_account(account_id).await?;
        progression::get_progress(&self.db, account_id).await
    }

    /// Recent activity history, newest first.
    pub async fn get_recent_activity(
        &self,
        account_id: &str,
        limit: i64,
    ) -> Result<Vec<ActivityRecord>, EngineError> {
        self.require_account(account_id).await?;
        activity::recent(&self.db, account_id, limit).await
    }
}
