//! Map markers and viewport fitting.

use std::collections::BTreeMap;

use aprehensys_analytics_models::{LatLng, MapDefaults, MapPoint, MapView};
use aprehensys_apprehension_models::Apprehension;

/// Builds map markers for `records`.
///
/// When `aggregated`, emits one point per municipality in first-seen order,
/// placed at the coordinate of that municipality's first record and
/// carrying the summed value and record count. Otherwise emits one point
/// per record, labelled with its address.
#[must_use]
pub fn cluster_for_map(records: &[Apprehension], aggregated: bool) -> Vec<MapPoint> {
    if !aggregated {
        return records
            .iter()
            .map(|record| MapPoint {
                label: record.address.clone(),
                lat: record.lat,
                lng: record.lng,
                total_value: record.commercial_value,
                count: 1,
                classification: Some(record.classification.clone()),
            })
            .collect();
    }

    let mut points: Vec<MapPoint> = Vec::new();
    let mut index: BTreeMap<&str, usize> = BTreeMap::new();
    for record in records {
        if let Some(&i) = index.get(record.municipality.as_str()) {
            points[i].total_value += record.commercial_value;
            points[i].count += 1;
        } else {
            index.insert(record.municipality.as_str(), points.len());
            points.push(MapPoint {
                label: record.municipality.clone(),
                lat: record.lat,
                lng: record.lng,
                total_value: record.commercial_value,
                count: 1,
                classification: None,
            });
        }
    }
    points
}

/// Fits a viewport to `points`.
///
/// The center is the midpoint of the bounding box. The zoom is
/// `floor(log2(360 / span)) - 1` where `span` is the larger of the
/// latitude and longitude extents, clamped to the configured bounds. A
/// single point uses the close-in zoom, coincident points keep the
/// fallback zoom, and an empty set yields the fallback view.
#[must_use]
pub fn map_view(points: &[MapPoint], defaults: &MapDefaults) -> MapView {
    let Some(first) = points.first() else {
        return MapView {
            center: defaults.fallback_center,
            zoom: defaults.fallback_zoom,
        };
    };

    let (mut min_lat, mut max_lat) = (first.lat, first.lat);
    let (mut min_lng, mut max_lng) = (first.lng, first.lng);
    for point in &points[1..] {
        min_lat = min_lat.min(point.lat);
        max_lat = max_lat.max(point.lat);
        min_lng = min_lng.min(point.lng);
        max_lng = max_lng.max(point.lng);
    }

    let center = LatLng {
        lat: f64::midpoint(min_lat, max_lat),
        lng: f64::midpoint(min_lng, max_lng),
    };

    let zoom = if points.len() == 1 {
        f64::from(defaults.single_point_zoom)
    } else {
        let span = (max_lat - min_lat).max(max_lng - min_lng);
        if span > 0.0 {
            (360.0 / span).log2().floor() - 1.0
        } else {
            f64::from(defaults.fallback_zoom)
        }
    };

    MapView {
        center,
        zoom: clamp_zoom(zoom, defaults),
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn clamp_zoom(zoom: f64, defaults: &MapDefaults) -> u8 {
    zoom.clamp(f64::from(defaults.min_zoom), f64::from(defaults.max_zoom)) as u8
}
