use anyhow::{anyhow, Context};
use geohash::{encode, Coord};
use serde::Deserialize;
use std::{
    collections::hash_map::DefaultHasher,
    fs,
    hash::{Hash, Hasher},
    path::{Path, PathBuf},
};

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct WgsBoundingBox {
    pub left_lon: f64,
    pub right_lon: f64,
    pub bottom_lat: f64,
    pub top_lat: f64,
}

impl WgsBoundingBox {
    /// ESRI envelope geometry of the box, coordinates rounded to 6 decimals.
    pub fn to_envelope_json(&self) -> String {
        serde_json::json!({
            "xmin": format!("{:.6}", self.left_lon),
            "ymin": format!("{:.6}", self.bottom_lat),
            "xmax": format!("{:.6}", self.right_lon),
            "ymax": format!("{:.6}", self.top_lat),
            "spatialReference": {"wkid": 4326},
        })
        .to_string()
    }

    pub fn to_rect(&self) -> geo::Rect {
        geo::Rect::new(
            geo::Coord {
                x: self.left_lon,
                y: self.bottom_lat,
            },
            geo::Coord {
                x: self.right_lon,
                y: self.top_lat,
            },
        )
    }
}

fn has_param(url: &str, name: &str) -> bool {
    url.contains(&format!("?{name}=")) || url.contains(&format!("&{name}="))
}

fn append_param(url: &mut String, name: &str, value: &str) {
    url.push(if url.contains('?') { '&' } else { '?' });
    url.push_str(name);
    url.push('=');
    url.push_str(value);
}

/// Complete a feature service query URL: WGS84 output as JSON, and unless the URL already
/// holds a spatial query, an envelope intersection with `envelope_json`.
pub fn build_query_url(base_url: &str, envelope_json: &str) -> String {
    let mut url = base_url.to_string();
    if !has_param(&url, "outSR") {
        append_param(&mut url, "outSR", "4326");
    }
    if !has_param(&url, "f") {
        append_param(&mut url, "f", "json");
    }
    if !has_param(&url, "spatialRel") {
        append_param(&mut url, "geometry", envelope_json);
        append_param(&mut url, "geometryType", "esriGeometryEnvelope");
        append_param(&mut url, "spatialRel", "esriSpatialRelIntersects");
        append_param(&mut url, "inSR", "4326");
    }
    url
}

/// Queries a feature service for the current viewport, suppressing repeated queries for bounds
/// that did not change.
#[derive(Debug)]
pub struct EsriQuery {
    base_url: String,
    last_bounds: Option<String>,
}

impl EsriQuery {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            last_bounds: None,
        }
    }

    /// The query URL for `bbox`, or None when the previous query used the same bounds.
    pub fn url_for_bounds(&mut self, bbox: &WgsBoundingBox) -> Option<String> {
        let bounds = bbox.to_envelope_json();
        if self.last_bounds.as_ref() == Some(&bounds) {
            return None;
        }
        let url = build_query_url(&self.base_url, &bounds);
        self.last_bounds = Some(bounds);
        Some(url)
    }
}

pub fn get_filename_for_query(url: &str, bbox: &WgsBoundingBox) -> anyhow::Result<String> {
    const GEOHASH_LENGTH: usize = 8;
    let top_left_coord = Coord {
        x: bbox.left_lon,
        y: bbox.top_lat,
    };
    let bottom_right_coord = Coord {
        x: bbox.right_lon,
        y: bbox.bottom_lat,
    };
    let top_left_geohash = encode(top_left_coord, GEOHASH_LENGTH)?;
    let bottom_right_geohash = encode(bottom_right_coord, GEOHASH_LENGTH)?;
    let mut hasher = DefaultHasher::new();
    url.hash(&mut hasher);
    let url_hash = hasher.finish();
    Ok(format!(
        "{top_left_geohash}_{bottom_right_geohash}_{url_hash:016x}_esri.json"
    ))
}

pub fn download_esri_features(url: &str) -> anyhow::Result<String> {
    let client = reqwest::blocking::Client::builder()
        .user_agent("esri-import")
        .build()?;
    let response = client
        .get(url)
        .send()
        .with_context(|| format!("Querying {url}"))?;
    if !response.status().is_success() {
        return Err(anyhow!(
            "Feature service answered with status {}",
            response.status()
        ));
    }
    response.text().or(Err(anyhow!("No response text")))
}

/// Fetch the query result into `output_dir`, reusing a previous download of the same query.
pub fn sync_esri_query_to_file(
    url: &str,
    bbox: &WgsBoundingBox,
    output_dir: &Path,
) -> anyhow::Result<PathBuf> {
    let filename = get_filename_for_query(url, bbox)?;
    let output_filepath = output_dir.join(filename);
    if output_filepath.exists() {
        log::info!(
            "Local file exists for ESRI query: {:?}",
            output_filepath.canonicalize()
        );
        return Ok(output_filepath);
    }

    log::info!("Downloading features for {:?}", bbox);
    let esri_data = download_esri_features(url)?;
    fs::write(&output_filepath, esri_data)
        .or(Err(anyhow!("Could not write ESRI data to file")))?;
    Ok(output_filepath)
}
