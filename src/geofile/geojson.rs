use std::{fs, path::Path};

use anyhow::{anyhow, Context};

use super::feature::FeatureCollection;
use crate::graph::{
    edit_graph::EditGraph,
    entity::{EntityId, Tags},
};

/// Parse a GeoJSON document into features. A single feature is treated as a collection of one.
pub fn parse_geojson_features(contents: &str) -> anyhow::Result<FeatureCollection> {
    geojson_to_features(contents.parse()?)
}

/// Features of an already parsed JSON document.
pub fn features_from_geojson_value(value: serde_json::Value) -> anyhow::Result<FeatureCollection> {
    geojson_to_features(geojson::GeoJson::from_json_value(value)?)
}

fn geojson_to_features(geojson: geojson::GeoJson) -> anyhow::Result<FeatureCollection> {
    let collection = match geojson {
        geojson::GeoJson::FeatureCollection(collection) => collection,
        geojson::GeoJson::Feature(feature) => geojson::FeatureCollection {
            bbox: None,
            features: vec![feature],
            foreign_members: None,
        },
        geojson::GeoJson::Geometry(_) => {
            return Err(anyhow!("Expected a Feature or FeatureCollection, found a bare Geometry"))
        }
    };
    Ok(FeatureCollection::from_geojson(collection))
}

fn tags_to_properties(id: EntityId, tags: &Tags) -> geojson::JsonObject {
    let mut properties: geojson::JsonObject = tags
        .iter()
        .map(|(key, value)| (key.clone(), serde_json::Value::String(value.clone())))
        .collect();
    properties.insert("@id".to_string(), serde_json::Value::String(id.to_string()));
    properties
}

fn feature(id: EntityId, value: geojson::Value, tags: &Tags) -> geojson::Feature {
    geojson::Feature {
        bbox: None,
        geometry: Some(geojson::Geometry::new(value)),
        id: Some(geojson::feature::Id::String(id.to_string())),
        properties: Some(tags_to_properties(id, tags)),
        foreign_members: None,
    }
}

/// Export the graph: tagged nodes become points, areas with a closed outline become polygons and
/// every other way a linestring. Untagged vertices only appear as way coordinates.
pub fn graph_to_geojson(graph: &EditGraph) -> anyhow::Result<geojson::FeatureCollection> {
    let mut features: Vec<geojson::Feature> = graph
        .nodes()
        .filter(|node| !node.tags.is_empty())
        .map(|node| {
            feature(
                node.id,
                geojson::Value::from(&node.loc),
                &node.tags,
            )
        })
        .collect();
    for way in graph.ways() {
        let line = graph.way_geometry(way)?;
        let value = if way.is_area() && line.is_closed() {
            geojson::Value::from(&geo::Polygon::new(line, vec![]))
        } else {
            geojson::Value::from(&line)
        };
        features.push(feature(way.id, value, &way.tags));
    }
    Ok(features.into_iter().collect())
}

pub fn write_graph_to_geojson(graph: &EditGraph, output_filepath: &Path) -> anyhow::Result<()> {
    let feature_collection = graph_to_geojson(graph)?;
    let geojson_contents: geojson::GeoJson = geojson::GeoJson::from(feature_collection);
    fs::write(output_filepath, geojson_contents.to_string())
        .with_context(|| format!("Writing GeoJSON to {:?}", output_filepath))
}
