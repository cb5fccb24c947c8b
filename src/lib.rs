// =============================================================================
// StudyQuest Engine - Progression & Ranking
// =============================================================================
// Turns raw "activity completed" events into updated XP/level, streak, coin
// balance, badge grants and leaderboard rank. Transport (HTTP, WebSocket),
// auth and the UI are external collaborators; they consume the `Engine`
// facade and subscribe to its event sink.
// =============================================================================

pub mod activity;
pub mod badges;
pub mod coins;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod events;
pub mod leaderboard;
pub mod levels;
pub mod locks;
pub mod progression;
pub mod streak;

pub use config::Config;
pub use db::Database;
pub use engine::Engine;
pub use error::EngineError;
pub use events::{BroadcastSink, EngineEvent, EventSink, NullSink};
