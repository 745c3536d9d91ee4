//! Point-of-interest and floor model
//!
//! A `PointOfInterest` ties a geographic anchor to an opaque audio clip
//! reference. POI sets are replaced wholesale when the active floor
//! changes; the coordinator never mutates them.

use crate::error::{Error, Result};
use earshot_common::GeoPoint;
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

/// Opaque reference to an audio clip resource
///
/// The playback port decides how to resolve it (file path, URL, asset id);
/// the coordinator only carries it through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioClipRef(pub String);

impl AudioClipRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A floor (context) within a venue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Floor {
    pub id: Uuid,
    pub name: String,
    /// Opaque reference to the floor map image (external collaborator)
    #[serde(default)]
    pub map_ref: Option<String>,
}

/// A location tied to an audio clip
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointOfInterest {
    pub id: Uuid,
    pub location: GeoPoint,
    pub clip: AudioClipRef,
    /// Clip duration hint for playback adapters that simulate timing
    #[serde(default)]
    pub duration_ms: Option<u64>,
}

/// On-disk POI set: one floor plus its points of interest
///
/// Raw coordinates are validated into `GeoPoint`s at load time, so a file
/// with NaN/out-of-range values is rejected as a whole rather than
/// producing POIs that can never be evaluated.
#[derive(Debug, Deserialize)]
struct FloorFileRaw {
    floor: Floor,
    pois: Vec<PoiRaw>,
}

#[derive(Debug, Deserialize)]
struct PoiRaw {
    #[serde(default = "Uuid::new_v4")]
    id: Uuid,
    latitude: f64,
    longitude: f64,
    clip: String,
    #[serde(default)]
    duration_ms: Option<u64>,
}

/// Load a floor and its POI set from a JSON file
pub fn load_floor_file(path: &Path) -> Result<(Floor, Vec<PointOfInterest>)> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::PoiFile(format!("cannot read {}: {e}", path.display())))?;
    let raw: FloorFileRaw = serde_json::from_str(&content)
        .map_err(|e| Error::PoiFile(format!("invalid JSON in {}: {e}", path.display())))?;

    let mut pois = Vec::with_capacity(raw.pois.len());
    for p in raw.pois {
        let location = GeoPoint::new(p.latitude, p.longitude)?;
        pois.push(PointOfInterest {
            id: p.id,
            location,
            clip: AudioClipRef(p.clip),
            duration_ms: p.duration_ms,
        });
    }
    Ok((raw.floor, pois))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_floor_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "floor": {{
                    "id": "5f64a1c2-0000-4000-8000-000000000001",
                    "name": "B1 Food Court"
                }},
                "pois": [
                    {{"latitude": 37.5665, "longitude": 126.978, "clip": "clips/entrance.mp3", "duration_ms": 4000}},
                    {{"latitude": 37.5666, "longitude": 126.9781, "clip": "clips/bakery.mp3"}}
                ]
            }}"#
        )
        .unwrap();

        let (floor, pois) = load_floor_file(file.path()).unwrap();
        assert_eq!(floor.name, "B1 Food Court");
        assert_eq!(pois.len(), 2);
        assert_eq!(pois[0].clip.as_str(), "clips/entrance.mp3");
        assert_eq!(pois[0].duration_ms, Some(4000));
        assert!(pois[1].duration_ms.is_none());
        assert_ne!(pois[0].id, pois[1].id);
    }

    #[test]
    fn test_load_rejects_bad_coordinates() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "floor": {{"id": "5f64a1c2-0000-4000-8000-000000000002", "name": "1F"}},
                "pois": [{{"latitude": 999.0, "longitude": 0.0, "clip": "x.mp3"}}]
            }}"#
        )
        .unwrap();

        assert!(load_floor_file(file.path()).is_err());
    }

    #[test]
    fn test_load_rejects_invalid_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(load_floor_file(file.path()).is_err());
    }
}
