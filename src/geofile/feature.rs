use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A GeoJSON position: longitude, latitude and optional further ordinates.
pub type Position = Vec<f64>;

/// Property bag of a source feature, as received.
pub type PropertyMap = geojson::JsonObject;

/// Stable identifier a feature service assigns to its records, e.g. the value of `OBJECTID`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SourceId {
    Number(i64),
    Text(String),
}

impl SourceId {
    /// Interpret a property value as an identifier. Numbers and non-empty strings qualify.
    ///
    /// Values which print the same are the same identifier: `5`, `5.0` and `"5"` all become
    /// `Number(5)`, while `"05"` stays text.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(number) => Some(Self::from_number(number)),
            Value::String(text) if !text.is_empty() => Some(Self::from_text(text)),
            _ => None,
        }
    }

    fn from_number(number: &serde_json::Number) -> Self {
        if let Some(integer) = number.as_i64() {
            return SourceId::Number(integer);
        }
        match number.as_f64() {
            Some(x) if x.fract() == 0.0 && x >= i64::MIN as f64 && x < i64::MAX as f64 => {
                SourceId::Number(x as i64)
            }
            _ => SourceId::Text(number.to_string()),
        }
    }

    fn from_text(text: &str) -> Self {
        match text.parse::<i64>() {
            Ok(integer) if integer.to_string() == text => SourceId::Number(integer),
            _ => SourceId::Text(text.to_string()),
        }
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceId::Number(number) => write!(f, "{number}"),
            SourceId::Text(text) => write!(f, "{text}"),
        }
    }
}

impl From<&geojson::feature::Id> for SourceId {
    fn from(id: &geojson::feature::Id) -> Self {
        match id {
            geojson::feature::Id::String(text) => SourceId::from_text(text),
            geojson::feature::Id::Number(number) => SourceId::from_number(number),
        }
    }
}

/// Geometry of a source feature. Only the five kinds the importer understands carry coordinates,
/// everything else enters as `Unsupported` at the parsing boundary.
#[derive(Clone, Debug, PartialEq)]
pub enum SourceGeometry {
    Point(Position),
    LineString(Vec<Position>),
    MultiLineString(Vec<Vec<Position>>),
    Polygon(Vec<Vec<Position>>),
    MultiPolygon(Vec<Vec<Vec<Position>>>),
    Unsupported(String),
    /// The feature carried no usable geometry at all.
    Empty,
}

impl SourceGeometry {
    pub fn kind_name(&self) -> &str {
        match self {
            SourceGeometry::Point(_) => "Point",
            SourceGeometry::LineString(_) => "LineString",
            SourceGeometry::MultiLineString(_) => "MultiLineString",
            SourceGeometry::Polygon(_) => "Polygon",
            SourceGeometry::MultiPolygon(_) => "MultiPolygon",
            SourceGeometry::Unsupported(kind) => kind,
            SourceGeometry::Empty => "Empty",
        }
    }

    /// Iterate over every position of the geometry, holes included.
    pub fn positions(&self) -> Box<dyn Iterator<Item = &Position> + '_> {
        match self {
            SourceGeometry::Point(position) => Box::new(std::iter::once(position)),
            SourceGeometry::LineString(line) => Box::new(line.iter()),
            SourceGeometry::MultiLineString(lines) | SourceGeometry::Polygon(lines) => {
                Box::new(lines.iter().flatten())
            }
            SourceGeometry::MultiPolygon(polygons) => Box::new(polygons.iter().flatten().flatten()),
            SourceGeometry::Unsupported(_) | SourceGeometry::Empty => Box::new(std::iter::empty()),
        }
    }
}

impl From<geojson::Value> for SourceGeometry {
    fn from(value: geojson::Value) -> Self {
        match value {
            geojson::Value::Point(position) => SourceGeometry::Point(position),
            geojson::Value::LineString(line) => SourceGeometry::LineString(line),
            geojson::Value::MultiLineString(lines) => SourceGeometry::MultiLineString(lines),
            geojson::Value::Polygon(rings) => SourceGeometry::Polygon(rings),
            geojson::Value::MultiPolygon(polygons) => SourceGeometry::MultiPolygon(polygons),
            geojson::Value::MultiPoint(_) => SourceGeometry::Unsupported("MultiPoint".to_string()),
            geojson::Value::GeometryCollection(_) => {
                SourceGeometry::Unsupported("GeometryCollection".to_string())
            }
        }
    }
}

/// One feature of an incoming collection.
#[derive(Clone, Debug, PartialEq)]
pub struct RawFeature {
    pub geometry: SourceGeometry,
    pub properties: PropertyMap,
    /// Feature level identifier, as GeoJSON features may carry one next to their properties.
    pub feature_id: Option<SourceId>,
}

impl RawFeature {
    pub fn new(geometry: SourceGeometry, properties: PropertyMap) -> Self {
        Self {
            geometry,
            properties,
            feature_id: None,
        }
    }

    pub fn from_geojson(feature: geojson::Feature) -> Self {
        let geometry = feature
            .geometry
            .map(|geometry| SourceGeometry::from(geometry.value))
            .unwrap_or(SourceGeometry::Empty);
        Self {
            geometry,
            properties: feature.properties.unwrap_or_default(),
            feature_id: feature.id.as_ref().map(SourceId::from),
        }
    }
}

/// Features in arrival order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FeatureCollection {
    pub features: Vec<RawFeature>,
}

impl FeatureCollection {
    pub fn from_geojson(collection: geojson::FeatureCollection) -> Self {
        collection
            .features
            .into_iter()
            .map(RawFeature::from_geojson)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }
}

impl FromIterator<RawFeature> for FeatureCollection {
    fn from_iter<I: IntoIterator<Item = RawFeature>>(iter: I) -> Self {
        Self {
            features: iter.into_iter().collect(),
        }
    }
}
