//! UI indicator sink
//!
//! The coordinator tells the UI when a POI enters or exits range,
//! independent of whether autoplay triggers playback. The concrete widget
//! is an external collaborator behind this trait.

use crate::poi::PointOfInterest;
use tracing::info;
use uuid::Uuid;

/// External sink for "nearby clip" indicators
pub trait IndicatorSink: Send + Sync {
    /// A POI entered range; surface its indicator
    fn show_indicator(&self, poi: &PointOfInterest, distance_m: f64);

    /// A POI exited range; retract its indicator
    fn hide_indicator(&self, poi_id: Uuid);
}

/// Log-only indicator sink used by the simulation binary
#[derive(Debug, Default)]
pub struct TracingIndicator;

impl IndicatorSink for TracingIndicator {
    fn show_indicator(&self, poi: &PointOfInterest, distance_m: f64) {
        info!("POI {} in range ({distance_m:.1}m): show indicator", poi.id);
    }

    fn hide_indicator(&self, poi_id: Uuid) {
        info!("POI {poi_id} out of range: hide indicator");
    }
}
