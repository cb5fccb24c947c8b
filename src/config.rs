// =============================================================================
// StudyQuest Engine - Configuration
// =============================================================================

use std::env;

/// Engine configuration loaded from environment variables.
///
/// All variables are optional; rule constants that are not deployment
/// concerns (streak bonus tables, task multipliers) live as `const` items in
/// their rule modules instead.
#[derive(Debug, Clone)]
pub struct Config {
    /// Database URL (SQLite path)
    pub database_url: String,

    /// XP earned per minute of a completed study session
    pub xp_per_study_minute: i64,

    /// Default entry count for leaderboard reads
    pub leaderboard_default_limit: i64,
}

impl Config {
    /// Load configuration from environment variables (reads `.env` first
    /// when present).
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();

        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:studyquest.db".into()),
            xp_per_study_minute: env::var("STUDY_XP_PER_MINUTE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(2),
            leaderboard_default_limit: env::var("LEADERBOARD_DEFAULT_LIMIT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite:studyquest.db".into(),
            xp_per_study_minute: 2,
            leaderboard_default_limit: 10,
        }
    }
}
