//! Audio trigger coordinator
//!
//! Coalesces a high-frequency stream of proximity evaluations into a
//! single-flight sequence of playback triggers.
//!
//! # Architecture
//!
//! One tokio task owns all coordinator state. Location updates, toggle
//! changes, context resets, and playback completions originate on
//! independent execution contexts and are marshaled into the task's
//! mailbox before touching state, so no transition ever runs concurrently
//! with another. Handle methods enqueue and return immediately.
//!
//! # State machine
//!
//! `Idle | Playing(active)` plus at most one coalesced pending detection:
//! 1. Detected while Idle with autoplay on → start playback.
//! 2. Detected while Playing: same POI → no-op; different POI → overwrite
//!    the pending slot (latest detection wins, no backlog).
//! 3. Completion (or failure) → Idle, then flush the pending slot as if
//!    freshly detected (exactly one re-entrant hop).
//! 4. Autoplay off → stop playback, discard pending.
//! 5. Autoplay on → flush pending accumulated while disabled.
//! 6. Context reset → stop playback, discard everything, replace POI set.
//!
//! Completions carry the session id they were started with; a callback for
//! a session that is no longer active is stale and dropped.

mod state;

pub use state::{ActivePlayback, CoordinatorState};

use crate::error::{Error, Result};
use crate::indicator::IndicatorSink;
use crate::playback::{
    AudioPlaybackPort, CompletionSender, PlaybackNotice, PlaybackOutcome, PlaybackSession,
};
use crate::poi::{Floor, PointOfInterest};
use crate::proximity::{evaluate, ProximityEvent};
use earshot_common::events::{EarshotEvent, EventBus};
use earshot_common::GeoPoint;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Inputs serialized through the coordinator mailbox
#[derive(Debug)]
enum Command {
    /// Raw location update from the location source
    LocationUpdate { latitude: f64, longitude: f64 },
    /// Autoplay toggle from the UI
    SetAutoplay(bool),
    /// Floor/context change with wholesale POI replacement
    ResetContext {
        floor: Option<Floor>,
        pois: Vec<PointOfInterest>,
    },
    /// Completion/failure relayed by an external playback adapter
    PlaybackFinished {
        session: PlaybackSession,
        outcome: PlaybackOutcome,
    },
    /// Stop the coordinator task
    Shutdown,
}

/// Cloneable, non-blocking front door to the coordinator task
#[derive(Debug, Clone)]
pub struct CoordinatorHandle {
    tx: mpsc::UnboundedSender<Command>,
}

impl CoordinatorHandle {
    fn send(&self, cmd: Command) -> Result<()> {
        self.tx
            .send(cmd)
            .map_err(|_| Error::CoordinatorGone("mailbox closed".into()))
    }

    /// Feed a location update; triggers one proximity evaluation pass.
    ///
    /// Coordinates are validated inside the coordinator so a malformed
    /// update is rejected without disturbing prior state.
    pub fn location_update(&self, latitude: f64, longitude: f64) -> Result<()> {
        self.send(Command::LocationUpdate {
            latitude,
            longitude,
        })
    }

    /// Flip the autoplay toggle
    pub fn set_autoplay(&self, enabled: bool) -> Result<()> {
        self.send(Command::SetAutoplay(enabled))
    }

    /// Switch floor/context, replacing the POI set wholesale
    pub fn reset_context(
        &self,
        floor: Option<Floor>,
        pois: Vec<PointOfInterest>,
    ) -> Result<()> {
        self.send(Command::ResetContext { floor, pois })
    }

    /// Report a playback completion or failure from an external adapter
    pub fn playback_finished(
        &self,
        session: PlaybackSession,
        outcome: PlaybackOutcome,
    ) -> Result<()> {
        self.send(Command::PlaybackFinished { session, outcome })
    }

    /// Shut the coordinator task down, stopping any active playback
    pub fn shutdown(&self) -> Result<()> {
        self.send(Command::Shutdown)
    }
}

/// The coordinator actor: exclusive owner of all proximity/playback state
pub struct GuideCoordinator {
    /// In-range distance threshold (meters), injected configuration
    threshold_m: f64,

    /// Autoplay toggle state
    autoplay: bool,

    /// Current POI set (read-only here; replaced wholesale on reset)
    pois: Vec<PointOfInterest>,

    /// Playback state tag
    state: CoordinatorState,

    /// At most one coalesced pending detection (latest wins)
    pending: Option<ProximityEvent>,

    /// POIs currently in range, for edge-triggered indicator updates
    in_range: HashSet<Uuid>,

    /// Next playback session id
    next_session: PlaybackSession,

    /// Playback capability (external collaborator)
    port: Arc<dyn AudioPlaybackPort>,

    /// UI indicator sink (external collaborator)
    indicator: Arc<dyn IndicatorSink>,

    /// Broadcast bus for observers
    bus: Arc<EventBus>,

    /// Completion channel half handed to the port on each start
    done_tx: CompletionSender,
}

impl GuideCoordinator {
    /// Spawn the coordinator task and return its handle
    pub fn spawn(
        threshold_m: f64,
        autoplay: bool,
        port: Arc<dyn AudioPlaybackPort>,
        indicator: Arc<dyn IndicatorSink>,
        bus: Arc<EventBus>,
    ) -> CoordinatorHandle {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (done_tx, done_rx) = mpsc::unbounded_channel();

        let coordinator = Self {
            threshold_m,
            autoplay,
            pois: Vec::new(),
            state: CoordinatorState::Idle,
            pending: None,
            in_range: HashSet::new(),
            next_session: 1,
            port,
            indicator,
            bus,
            done_tx: CompletionSender::new(done_tx),
        };

        tokio::spawn(coordinator.run(cmd_rx, done_rx));
        CoordinatorHandle { tx: cmd_tx }
    }

    /// Mailbox loop: the only place coordinator state is touched
    async fn run(
        mut self,
        mut cmd_rx: mpsc::UnboundedReceiver<Command>,
        mut done_rx: mpsc::UnboundedReceiver<PlaybackNotice>,
    ) {
        info!(
            "Coordinator started (threshold {}m, autoplay {})",
            self.threshold_m, self.autoplay
        );
        loop {
            tokio::select! {
                cmd = cmd_rx.recv() => match cmd {
                    Some(Command::LocationUpdate { latitude, longitude }) => {
                        self.on_location_update(latitude, longitude);
                    }
                    Some(Command::SetAutoplay(enabled)) => self.on_set_autoplay(enabled),
                    Some(Command::ResetContext { floor, pois }) => {
                        self.on_context_reset(floor, pois);
                    }
                    Some(Command::PlaybackFinished { session, outcome }) => {
                        self.on_playback_finished(session, outcome);
                    }
                    Some(Command::Shutdown) | None => break,
                },
                Some(notice) = done_rx.recv() => {
                    self.on_playback_finished(notice.session, notice.outcome);
                }
            }
        }

        if let Some(active) = self.state.active().copied() {
            self.port.stop(active.session);
        }
        info!("Coordinator stopped");
    }

    /// One full evaluation pass for a fresh location fix
    fn on_location_update(&mut self, latitude: f64, longitude: f64) {
        let current = match GeoPoint::new(latitude, longitude) {
            Ok(p) => p,
            Err(e) => {
                warn!("Rejected location update: {e}");
                self.bus.emit_lossy(EarshotEvent::LocationRejected {
                    reason: e.to_string(),
                    timestamp: chrono::Utc::now(),
                });
                return;
            }
        };

        let hits = evaluate(current, &self.pois, self.threshold_m);
        let hit_ids: HashSet<Uuid> = hits.iter().map(|e| e.poi.id).collect();

        // Edge-triggered indicator updates: show on entry, hide on exit
        for hit in &hits {
            if self.in_range.insert(hit.poi.id) {
                self.indicator.show_indicator(&hit.poi, hit.distance_m);
                self.bus.emit_lossy(EarshotEvent::PoiEnteredRange {
                    poi_id: hit.poi.id,
                    distance_m: hit.distance_m,
                    timestamp: chrono::Utc::now(),
                });
            }
        }
        let exited: Vec<Uuid> = self.in_range.difference(&hit_ids).copied().collect();
        for poi_id in exited {
            self.in_range.remove(&poi_id);
            self.indicator.hide_indicator(poi_id);
            self.bus.emit_lossy(EarshotEvent::PoiExitedRange {
                poi_id,
                timestamp: chrono::Utc::now(),
            });
        }

        // A pending trigger whose POI left range never plays; out-of-range
        // does not cancel playback that already started.
        if let Some(p) = self.pending.take() {
            if hit_ids.contains(&p.poi.id) {
                self.pending = Some(p);
            } else {
                debug!("Pending POI {} left range, dropping trigger", p.poi.id);
            }
        }

        // Nearest-first tie-break: at most one detection per pass
        if let Some(nearest) = hits.into_iter().next() {
            self.on_proximity_detected(nearest);
        }
    }

    /// Decide what a fresh detection does given the current state
    fn on_proximity_detected(&mut self, event: ProximityEvent) {
        match self.state {
            CoordinatorState::Playing(active) => {
                if active.poi_id == event.poi.id {
                    // Already playing this clip
                    return;
                }
                // Replace, never queue: the latest detection wins
                debug!(
                    "Coalescing detection of POI {} ({:.1}m) into pending slot",
                    event.poi.id, event.distance_m
                );
                self.pending = Some(event);
            }
            CoordinatorState::Idle => {
                if !self.autoplay {
                    // Detection and playback-trigger are decoupled: the
                    // indicator is already up; keep the latest detection
                    // so re-enabling autoplay can flush it.
                    self.pending = Some(event);
                    return;
                }
                self.start_playback(event);
            }
        }
    }

    /// Hand the clip to the playback port and enter Playing
    fn start_playback(&mut self, event: ProximityEvent) {
        let session = self.next_session;
        self.next_session += 1;

        match self.port.start(&event.poi, session, self.done_tx.clone()) {
            Ok(()) => {
                info!(
                    "Playback started: POI {} at {:.1}m (session {session})",
                    event.poi.id, event.distance_m
                );
                self.state = CoordinatorState::Playing(ActivePlayback {
                    poi_id: event.poi.id,
                    session,
                });
                self.bus.emit_lossy(EarshotEvent::PlaybackStarted {
                    poi_id: event.poi.id,
                    session,
                    timestamp: chrono::Utc::now(),
                });
            }
            Err(e) => {
                // Failure must not stall the machine: behave exactly like
                // a completed playback, including the pending flush.
                warn!("Playback start failed for POI {}: {e}", event.poi.id);
                self.bus.emit_lossy(EarshotEvent::PlaybackFinished {
                    poi_id: event.poi.id,
                    session,
                    completed: false,
                    error: Some(e.to_string()),
                    timestamp: chrono::Utc::now(),
                });
                self.state = CoordinatorState::Idle;
                self.flush_pending();
            }
        }
    }

    /// Handle a completion notice from the port, filtering stale sessions
    fn on_playback_finished(&mut self, session: PlaybackSession, outcome: PlaybackOutcome) {
        let active = match self.state.active() {
            Some(active) if active.session == session => *active,
            _ => {
                debug!("Stale playback callback for session {session}, ignored");
                return;
            }
        };

        let (completed, error) = match outcome {
            PlaybackOutcome::Completed => (true, None),
            PlaybackOutcome::Failed(cause) => {
                warn!(
                    "Playback failed for POI {} (session {session}): {cause}",
                    active.poi_id
                );
                (false, Some(cause))
            }
        };
        info!(
            "Playback finished: POI {} (session {session}, completed {completed})",
            active.poi_id
        );
        self.bus.emit_lossy(EarshotEvent::PlaybackFinished {
            poi_id: active.poi_id,
            session,
            completed,
            error,
            timestamp: chrono::Utc::now(),
        });

        self.state = CoordinatorState::Idle;
        self.flush_pending();
    }

    /// Consume the pending slot, one re-entrant hop.
    ///
    /// The slot is taken before re-entry, so a failing start that flushes
    /// again terminates: each hop drains the slot it consumes.
    fn flush_pending(&mut self) {
        if !self.autoplay {
            return;
        }
        if let Some(next) = self.pending.take() {
            debug!("Flushing pending trigger for POI {}", next.poi.id);
            self.on_proximity_detected(next);
        }
    }

    /// Toggle autoplay: disabling cancels, enabling flushes
    fn on_set_autoplay(&mut self, enabled: bool) {
        if self.autoplay == enabled {
            return;
        }
        self.autoplay = enabled;
        info!("Autoplay {}", if enabled { "enabled" } else { "disabled" });
        self.bus.emit_lossy(EarshotEvent::AutoplayChanged {
            enabled,
            timestamp: chrono::Utc::now(),
        });

        if enabled {
            // Flush the latest detection accumulated while disabled
            self.flush_pending();
        } else {
            // Cancel in-flight playback and discard pending
            self.pending = None;
            self.stop_active(CoordinatorState::Idle);
        }
    }

    /// Unconditional reset, regardless of current state
    fn on_context_reset(&mut self, floor: Option<Floor>, pois: Vec<PointOfInterest>) {
        self.pending = None;
        self.stop_active(CoordinatorState::Idle);

        for poi_id in self.in_range.drain() {
            self.indicator.hide_indicator(poi_id);
            self.bus.emit_lossy(EarshotEvent::PoiExitedRange {
                poi_id,
                timestamp: chrono::Utc::now(),
            });
        }

        info!(
            "Context reset: floor {:?}, {} POIs",
            floor.as_ref().map(|f| f.name.as_str()),
            pois.len()
        );
        self.bus.emit_lossy(EarshotEvent::ContextReset {
            floor_id: floor.as_ref().map(|f| f.id),
            poi_count: pois.len(),
            timestamp: chrono::Utc::now(),
        });
        self.pois = pois;
    }

    /// Stop any active playback and move to `next` state.
    ///
    /// The port's stop suppresses further audio; a completion callback
    /// that races the stop is filtered by session id.
    fn stop_active(&mut self, next: CoordinatorState) {
        if let Some(active) = self.state.active().copied() {
            self.port.stop(active.session);
            self.bus.emit_lossy(EarshotEvent::PlaybackFinished {
                poi_id: active.poi_id,
                session: active.session,
                completed: false,
                error: None,
                timestamp: chrono::Utc::now(),
            });
        }
        self.state = next;
    }
}
