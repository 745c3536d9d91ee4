//! Audio playback port
//!
//! The coordinator drives playback through this abstract capability and
//! never touches playback internals. Start/stop are fire-and-forget from
//! the coordinator's perspective; completion and failure flow back
//! asynchronously through a `CompletionSender` into the coordinator
//! mailbox.

use crate::error::{Error, Result};
use crate::poi::PointOfInterest;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Identifier for one playback attempt
///
/// Monotonically increasing per coordinator; a completion callback whose
/// session no longer matches the active one is stale and gets dropped.
pub type PlaybackSession = u64;

/// How a playback attempt ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackOutcome {
    /// The clip ran to natural completion
    Completed,
    /// The playback engine reported an error (resource/codec)
    Failed(String),
}

/// Asynchronous completion notice from a playback adapter
#[derive(Debug, Clone)]
pub struct PlaybackNotice {
    pub session: PlaybackSession,
    pub outcome: PlaybackOutcome,
}

/// Channel half handed to playback adapters for reporting completion
///
/// Sends are non-blocking; a notice for a coordinator that already shut
/// down is silently dropped.
#[derive(Debug, Clone)]
pub struct CompletionSender {
    tx: mpsc::UnboundedSender<PlaybackNotice>,
}

impl CompletionSender {
    pub(crate) fn new(tx: mpsc::UnboundedSender<PlaybackNotice>) -> Self {
        Self { tx }
    }

    /// Report that a playback session finished
    pub fn notify(&self, session: PlaybackSession, outcome: PlaybackOutcome) {
        let _ = self.tx.send(PlaybackNotice { session, outcome });
    }
}

/// Abstract playback capability the coordinator depends on
///
/// Implementations must not block: `start` kicks off playback and returns,
/// reporting the eventual outcome through `done`. `stop` is best-effort
/// cancellation; a completion that races a stop is filtered by session id
/// on the coordinator side.
pub trait AudioPlaybackPort: Send + Sync {
    /// Begin playback of the POI's clip. A synchronous error means
    /// playback never started.
    fn start(
        &self,
        poi: &PointOfInterest,
        session: PlaybackSession,
        done: CompletionSender,
    ) -> Result<()>;

    /// Stop an in-flight playback session. No-op for unknown sessions.
    fn stop(&self, session: PlaybackSession);
}

/// Default clip length when a POI carries no duration hint
const DEFAULT_CLIP_MS: u64 = 5_000;

/// Timer-backed playback adapter
///
/// Stands in for a real audio engine: "plays" a clip by sleeping for its
/// duration, then reports completion. Used by the simulation binary and
/// useful for soak-testing coordinator behavior at real cadences.
#[derive(Debug, Default)]
pub struct TimedPlayer {
    active: Mutex<HashMap<PlaybackSession, JoinHandle<()>>>,
}

impl TimedPlayer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AudioPlaybackPort for TimedPlayer {
    fn start(
        &self,
        poi: &PointOfInterest,
        session: PlaybackSession,
        done: CompletionSender,
    ) -> Result<()> {
        let duration = poi.duration_ms.unwrap_or(DEFAULT_CLIP_MS);
        info!(
            "Playing clip {} for POI {} ({duration}ms, session {session})",
            poi.clip.as_str(),
            poi.id
        );

        let task = tokio::spawn(async move {
            tokio::time::sleep(tokio::time::Duration::from_millis(duration)).await;
            done.notify(session, PlaybackOutcome::Completed);
        });

        let mut active = self
            .active
            .lock()
            .map_err(|_| Error::Playback {
                poi_id: poi.id,
                cause: "player session table poisoned".into(),
            })?;
        active.retain(|_, t| !t.is_finished());
        active.insert(session, task);
        Ok(())
    }

    fn stop(&self, session: PlaybackSession) {
        if let Ok(mut active) = self.active.lock() {
            if let Some(task) = active.remove(&session) {
                task.abort();
                debug!("Stopped playback session {session}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poi::AudioClipRef;
    use earshot_common::GeoPoint;
    use uuid::Uuid;

    fn short_poi() -> PointOfInterest {
        PointOfInterest {
            id: Uuid::new_v4(),
            location: GeoPoint::new(0.0, 0.0).unwrap(),
            clip: AudioClipRef("clips/test.mp3".into()),
            duration_ms: Some(10),
        }
    }

    #[tokio::test]
    async fn test_timed_player_reports_completion() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let player = TimedPlayer::new();

        player
            .start(&short_poi(), 1, CompletionSender::new(tx))
            .unwrap();

        let notice = tokio::time::timeout(tokio::time::Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(notice.session, 1);
        assert_eq!(notice.outcome, PlaybackOutcome::Completed);
    }

    #[tokio::test]
    async fn test_timed_player_stop_suppresses_completion() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let player = TimedPlayer::new();

        let mut poi = short_poi();
        poi.duration_ms = Some(10_000);
        player.start(&poi, 2, CompletionSender::new(tx)).unwrap();
        player.stop(2);

        // Aborted task never sends: either the channel closes (sender
        // dropped with the task) or the window elapses silently
        let raced =
            tokio::time::timeout(tokio::time::Duration::from_millis(100), rx.recv()).await;
        match raced {
            Err(_) | Ok(None) => {}
            Ok(Some(notice)) => panic!("unexpected completion: {notice:?}"),
        }
    }

    #[test]
    fn test_stop_unknown_session_is_noop() {
        let player = TimedPlayer::new();
        player.stop(99);
    }
}
