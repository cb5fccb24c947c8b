// =============================================================================
// StudyQuest Engine - Domain Events
// =============================================================================
// Payload-free hints for external subscribers (the real transport is an
// out-of-scope collaborator). Delivery is best-effort: subscribers re-fetch
// state, they never read data out of the event itself.
// =============================================================================

use serde::Serialize;
use tokio::sync::broadcast;

/// Engine event hints. Deliberately carry no data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineEvent {
    LeaderboardChanged,
    LevelUp,
    BadgeEarned,
    StreakMilestone,
}

impl EngineEvent {
    /// Stable wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LeaderboardChanged => "leaderboard_changed",
            Self::LevelUp => "level_up",
            Self::BadgeEarned => "badge_earned",
            Self::StreakMilestone => "streak_milestone",
        }
    }
}

/// Fire-and-forget event publisher.
pub trait EventSink: Send + Sync {
    fn publish(&self, event: EngineEvent);
}

/// Broadcast-channel sink for in-process subscribers (a WebSocket fanout
/// layer would hold the receiving end).
pub struct BroadcastSink {
    tx: broadcast::Sender<EngineEvent>,
}

impl BroadcastSink {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to the event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.tx.subscribe()
    }
}

impl EventSink for BroadcastSink {
    fn publish(&self, event: EngineEvent) {
        tracing::debug!(event = event.as_str(), "publishing event");
        // No subscribers is fine; the signal is purely a hint
        let _ = self.tx.send(event);
    }
}

/// Discarding sink for tests and headless runs.
#[derive(Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn publish(&self, _event: EngineEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_broadcast_delivers_to_subscriber() {
        let sink = BroadcastSink::new(16);
        let mut rx = sink.subscribe();

        sink.publish(EngineEvent::LeaderboardChanged);
        assert_eq!(rx.recv().await.unwrap(), EngineEvent::LeaderboardChanged);
    }

    #[test]
    fn test_publish_without_subscribers_is_silent() {
        let sink = BroadcastSink::new(16);
        sink.publish(EngineEvent::LevelUp);
        NullSink.publish(EngineEvent::BadgeEarned);
    }

    #[test]
    fn test_serialized_form_matches_wire_name() {
        for event in [
            EngineEvent::LeaderboardChanged,
            EngineEvent::LevelUp,
            EngineEvent::BadgeEarned,
            EngineEvent::StreakMilestone,
        ] {
            let json = serde_json::to_value(event).unwrap();
            assert_eq!(json, serde_json::Value::String(event.as_str().into()));
        }
    }
}
