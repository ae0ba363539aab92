use anyhow::anyhow;
use geo::Winding;
use serde::{de::IgnoredAny, Deserialize};

use crate::geofile::feature::{FeatureCollection, Position, PropertyMap, RawFeature, SourceGeometry};

#[derive(Deserialize, Debug)]
struct EsriFeatureSet {
    #[serde(default)]
    features: Vec<EsriFeature>,
    error: Option<EsriServiceError>,
}

#[derive(Deserialize, Debug)]
struct EsriServiceError {
    code: Option<i64>,
    #[serde(default)]
    message: String,
}

#[derive(Deserialize, Debug)]
struct EsriFeature {
    #[serde(default)]
    attributes: PropertyMap,
    geometry: Option<EsriGeometry>,
}

#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum EsriGeometry {
    Point { x: f64, y: f64 },
    Polyline { paths: Vec<Vec<Position>> },
    Polygon { rings: Vec<Vec<Position>> },
    MultiPoint {
        #[allow(dead_code)]
        points: IgnoredAny,
    },
    Other(#[allow(dead_code)] IgnoredAny),
}

/// Convert an ESRI JSON feature set into features.
pub fn parse_esri_features(contents: &str) -> anyhow::Result<FeatureCollection> {
    esri_feature_set_to_features(serde_json::from_str(contents)?)
}

/// Features of an already parsed ESRI JSON document.
pub fn features_from_esri_value(value: serde_json::Value) -> anyhow::Result<FeatureCollection> {
    esri_feature_set_to_features(serde_json::from_value(value)?)
}

fn esri_feature_set_to_features(feature_set: EsriFeatureSet) -> anyhow::Result<FeatureCollection> {
    if let Some(error) = feature_set.error {
        return Err(anyhow!(
            "Feature service returned error {}: {}",
            error.code.map_or("?".to_string(), |code| code.to_string()),
            error.message
        ));
    }
    Ok(feature_set
        .features
        .into_iter()
        .map(|feature| {
            let geometry = feature
                .geometry
                .map(esri_geometry_to_source_geometry)
                .unwrap_or(SourceGeometry::Empty);
            RawFeature::new(geometry, feature.attributes)
        })
        .collect())
}

fn esri_geometry_to_source_geometry(geometry: EsriGeometry) -> SourceGeometry {
    match geometry {
        EsriGeometry::Point { x, y } => SourceGeometry::Point(vec![x, y]),
        EsriGeometry::Polyline { mut paths } => match paths.len() {
            0 => SourceGeometry::Empty,
            1 => SourceGeometry::LineString(paths.remove(0)),
            _ => SourceGeometry::MultiLineString(paths),
        },
        EsriGeometry::Polygon { rings } => {
            let mut polygons = group_rings(rings);
            match polygons.len() {
                0 => SourceGeometry::Empty,
                1 => SourceGeometry::Polygon(polygons.remove(0)),
                _ => SourceGeometry::MultiPolygon(polygons),
            }
        }
        EsriGeometry::MultiPoint { .. } => SourceGeometry::Unsupported("MultiPoint".to_string()),
        EsriGeometry::Other(_) => SourceGeometry::Empty,
    }
}

/// Group ESRI polygon rings into polygons. Outer rings run clockwise and each starts a new
/// polygon, counter-clockwise rings are holes of the polygon before them.
fn group_rings(rings: Vec<Vec<Position>>) -> Vec<Vec<Vec<Position>>> {
    let mut polygons: Vec<Vec<Vec<Position>>> = Vec::new();
    for ring in rings {
        let line: geo::LineString = ring
            .iter()
            .filter(|position| position.len() >= 2)
            .map(|position| geo::Coord {
                x: position[0],
                y: position[1],
            })
            .collect();
        match polygons.last_mut() {
            Some(polygon) if line.is_ccw() => polygon.push(ring),
            _ => polygons.push(vec![ring]),
        }
    }
    polygons
}
