// =============================================================================
// StudyQuest Engine - Activity Ledger
// =============================================================================

use crate::db::{ActivityRecord, Database};
use crate::error::EngineError;

/// Kind of point-earning event recorded in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityKind {
    Game,
    StudyMaterial,
    StudySession,
    Task,
}

impl ActivityKind {
    /// Stable string form used as the storage key.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Game => "game",
            Self::StudyMaterial => "study_material",
            Self::StudySession => "study_session",
            Self::Task => "task",
        }
    }
}

/// Append one event to the audit trail. Pure insert; rows are never
/// mutated or deleted by the engine.
pub async fn append(
    db: &Database,
    account_id: &str,
    kind: ActivityKind,
    title: &str,
    points_earned: i64,
) -> Result<(), EngineError> {
    db.append_activity(account_id, kind.as_str(), title, points_earned)
        .await?;
    Ok(())
}

/// Recent history for an account, newest first.
pub async fn recent(
    db: &Database,
    account_id: &str,
    limit: i64,
) -> Result<Vec<ActivityRecord>, EngineError> {
    Ok(db.recent_activity(account_id, limit).await?)
}
