//! Proximity evaluation
//!
//! Pure function from (current location, POI set, threshold) to the set of
//! in-range detections. No state, no side effects; the coordinator decides
//! what to do with the result.

use crate::poi::PointOfInterest;
use earshot_common::GeoPoint;

/// One in-range detection produced by an evaluation pass
///
/// Ephemeral: produced per evaluation, never persisted.
#[derive(Debug, Clone)]
pub struct ProximityEvent {
    pub poi: PointOfInterest,
    pub current_location: GeoPoint,
    pub distance_m: f64,
}

/// Evaluate which POIs are within `threshold_m` of `current`.
///
/// Returns detections sorted nearest-first. Ties (exactly equal distance)
/// keep the input order, which makes repeated evaluation deterministic for
/// fixed inputs. Callers that act on a single POI take the first entry.
pub fn evaluate(
    current: GeoPoint,
    pois: &[PointOfInterest],
    threshold_m: f64,
) -> Vec<ProximityEvent> {
    let mut hits: Vec<ProximityEvent> = pois
        .iter()
        .filter_map(|poi| {
            let distance_m = current.distance_m(&poi.location);
            (distance_m <= threshold_m).then(|| ProximityEvent {
                poi: poi.clone(),
                current_location: current,
                distance_m,
            })
        })
        .collect();
    hits.sort_by(|a, b| a.distance_m.total_cmp(&b.distance_m));
    hits
}
