//! Event types for the Earshot event system
//!
//! Provides the shared event definitions and the `EventBus` used by the
//! guide engine to notify UI collaborators (indicator widgets, map overlay,
//! diagnostics) of proximity and playback activity.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Earshot event types
///
/// Events are broadcast via `EventBus`; all consumers share this central
/// enum for type safety and exhaustive matching. Serializable so an outer
/// shell can forward them verbatim to a UI layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EarshotEvent {
    /// A point of interest entered the proximity threshold
    ///
    /// Triggers:
    /// - UI: show the "nearby clip" indicator for this POI
    PoiEnteredRange {
        /// POI that came into range
        poi_id: Uuid,
        /// Distance from the user at detection time (meters)
        distance_m: f64,
        /// When the POI entered range
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A previously in-range point of interest left the proximity threshold
    ///
    /// Triggers:
    /// - UI: retract the "nearby clip" indicator
    ///
    /// NOTE: Does not cancel playback that already started for this POI.
    PoiExitedRange {
        /// POI that left range
        poi_id: Uuid,
        /// When the POI exited range
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Audio playback started for a POI clip
    PlaybackStarted {
        /// POI whose clip is playing
        poi_id: Uuid,
        /// Playback session identifier (stale-callback detection)
        session: u64,
        /// When playback started
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Audio playback finished (ran to completion, failed, or was stopped)
    PlaybackFinished {
        /// POI whose clip finished
        poi_id: Uuid,
        /// Playback session identifier
        session: u64,
        /// True if the clip ran to natural completion
        completed: bool,
        /// Failure detail when the playback engine reported an error
        error: Option<String>,
        /// When playback finished
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The autoplay toggle changed
    ///
    /// Triggers:
    /// - Coordinator: cancel playback (off) or flush pending trigger (on)
    AutoplayChanged {
        /// New toggle value
        enabled: bool,
        /// When the toggle changed
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The active floor/context changed and the POI set was replaced
    ///
    /// Triggers:
    /// - Coordinator: drop all proximity state, return to Idle
    /// - UI: reload map overlay for the new floor
    ContextReset {
        /// Floor that became active (None when clearing to no floor)
        floor_id: Option<Uuid>,
        /// Number of POIs in the replacement set
        poi_count: usize,
        /// When the context changed
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A location update was rejected as malformed
    ///
    /// Prior proximity state is kept; the next valid update re-evaluates.
    LocationRejected {
        /// Why the update was rejected
        reason: String,
        /// When the update was rejected
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

/// Broadcast bus for one-to-many event distribution
///
/// Thin wrapper over `tokio::sync::broadcast` so emitters don't care how
/// many subscribers exist. Slow subscribers lag and drop old events rather
/// than blocking emitters.
#[derive(Debug)]
pub struct EventBus {
    tx: broadcast::Sender<EarshotEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with the given channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<EarshotEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)`, or `Err` if no subscriber is
    /// currently listening.
    pub fn emit(
        &self,
        event: EarshotEvent,
    ) -> std::result::Result<usize, broadcast::error::SendError<EarshotEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring whether anyone is listening
    ///
    /// Used for non-critical notifications where a missing subscriber is
    /// acceptable.
    pub fn emit_lossy(&self, event: EarshotEvent) {
        let _ = self.tx.send(event);
    }

    /// Current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eventbus_new() {
        let bus = EventBus::new(100);
        assert_eq!(bus.capacity(), 100);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_eventbus_subscribe() {
        let bus = EventBus::new(100);
        let _rx = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);

        let _rx2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);
    }

    #[test]
    fn test_eventbus_emit_no_subscribers() {
        let bus = EventBus::new(100);
        let event = EarshotEvent::AutoplayChanged {
            enabled: true,
            timestamp: chrono::Utc::now(),
        };

        assert!(bus.emit(event).is_err());
    }

    #[tokio::test]
    async fn test_eventbus_emit_with_subscriber() {
        let bus = EventBus::new(100);
        let mut rx = bus.subscribe();

        let poi_id = Uuid::new_v4();
        let event = EarshotEvent::PoiEnteredRange {
            poi_id,
            distance_m: 4.2,
            timestamp: chrono::Utc::now(),
        };

        assert!(bus.emit(event).is_ok());

        let received = rx.recv().await.unwrap();
        match received {
            EarshotEvent::PoiEnteredRange {
                poi_id: id,
                distance_m,
                ..
            } => {
                assert_eq!(id, poi_id);
                assert!((distance_m - 4.2).abs() < f64::EPSILON);
            }
            other => panic!("Wrong event type received: {other:?}"),
        }
    }

    #[test]
    fn test_eventbus_emit_lossy() {
        let bus = EventBus::new(100);
        // Must not panic without subscribers
        bus.emit_lossy(EarshotEvent::LocationRejected {
            reason: "non-finite coordinates".into(),
            timestamp: chrono::Utc::now(),
        });
    }

    #[test]
    fn test_event_serialization_tag() {
        let event = EarshotEvent::PlaybackStarted {
            poi_id: Uuid::new_v4(),
            session: 7,
            timestamp: chrono::Utc::now(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"PlaybackStarted\""));
        assert!(json.contains("\"session\":7"));
    }
}
