//! Coordinator state machine types
//!
//! The playback flag and "current fragment" conflation of a hand-rolled
//! implementation is split into an explicit state tag plus an opaque
//! session id, so "nothing on screen" and "nothing playing" stay distinct.

use crate::playback::PlaybackSession;
use uuid::Uuid;

/// The one in-flight playback, when there is one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivePlayback {
    /// POI whose clip is playing
    pub poi_id: Uuid,
    /// Session id handed to the playback port for this start
    pub session: PlaybackSession,
}

/// Coordinator state: at most one playback is ever active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoordinatorState {
    /// No playback in progress
    #[default]
    Idle,
    /// Exactly one playback running
    Playing(ActivePlayback),
}

impl CoordinatorState {
    /// The active playback, if any
    pub fn active(&self) -> Option<&ActivePlayback> {
        match self {
            CoordinatorState::Idle => None,
            CoordinatorState::Playing(active) => Some(active),
        }
    }

    pub fn is_playing(&self) -> bool {
        matches!(self, CoordinatorState::Playing(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_idle() {
        let state = CoordinatorState::default();
        assert!(!state.is_playing());
        assert!(state.active().is_none());
    }

    #[test]
    fn test_playing_exposes_active() {
        let active = ActivePlayback {
            poi_id: Uuid::new_v4(),
            session: 3,
        };
        let state = CoordinatorState::Playing(active);
        assert!(state.is_playing());
        assert_eq!(state.active(), Some(&active));
    }
}
