//! # Earshot Guide Engine (earshot-guide)
//!
//! Proximity-triggered audio notification coordinator.
//!
//! **Purpose:** Consume a stream of user-location updates, decide which
//! point-of-interest audio clips are in range, and drive at most one
//! playback at a time through an abstract playback port, coalescing bursts
//! of detections into a single pending trigger.
//!
//! **Architecture:** A pure proximity evaluator feeds an explicit
//! Idle/Playing state machine owned by a single tokio task. All inputs
//! (location updates, toggle changes, context resets, playback
//! completions) are serialized through one mailbox, so state mutation is
//! never concurrent with itself.

pub mod coordinator;
pub mod error;
pub mod indicator;
pub mod playback;
pub mod poi;
pub mod proximity;

pub use coordinator::{CoordinatorHandle, GuideCoordinator};
pub use error::{Error, Result};
pub use indicator::IndicatorSink;
pub use playback::{AudioPlaybackPort, PlaybackOutcome, PlaybackSession};
pub use poi::{Floor, PointOfInterest};
pub use proximity::{evaluate, ProximityEvent};
