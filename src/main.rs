extern crate log;
pub mod esri;
pub mod geofile;
pub mod graph;
pub mod import;
use crate::esri::conversion::{features_from_esri_value, parse_esri_features};
use crate::esri::debounce::{settled_viewports, ViewportMove};
use crate::esri::query::{sync_esri_query_to_file, EsriQuery, WgsBoundingBox};
use crate::geofile::extent::{fit_viewport, FitSuggestion};
use crate::geofile::feature::FeatureCollection;
use crate::geofile::geojson::{features_from_geojson_value, write_graph_to_geojson};
use crate::graph::edit_graph::EditGraph;
use crate::import::driver::{Importer, DEFAULT_SOURCE_ID_FIELD};
use crate::import::field_mapper::FieldMapping;
use crate::import::report::ImportReport;
use anyhow::anyhow;
use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;
use std::{fs::read_to_string, path::Path};

/// Import features of an ESRI feature service or a local file into an editable map graph.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the input config file.
    #[arg(short, long)]
    config_filepath: String,
}

#[derive(Deserialize, Debug)]
enum FeatureSourceConfig {
    /// A GeoJSON or ESRI JSON file.
    Geofile { filepath: PathBuf },
    /// A feature service layer query URL and the map moves to follow. Only viewports the map
    /// rests on for the debounce period are queried.
    Service {
        url: String,
        viewports: Vec<ViewportMove>,
    },
}

#[derive(Deserialize, Debug)]
struct Config {
    source: FeatureSourceConfig,
    data_dir: PathBuf,
    #[serde(default = "default_source_id_field")]
    source_id_field: String,
    #[serde(default)]
    field_mapping: FieldMapping,
}

fn default_source_id_field() -> String {
    DEFAULT_SOURCE_ID_FIELD.to_string()
}

/// Read a local feature file. GeoJSON documents carry a `type` member, ESRI feature sets do not.
fn read_features_from_file(filepath: &Path) -> anyhow::Result<FeatureCollection> {
    let document: serde_json::Value = serde_json::from_str(&read_to_string(filepath)?)?;
    if document.get("type").is_some() {
        log::info!("Reading GeoJSON features from {:?}", filepath);
        features_from_geojson_value(document)
    } else {
        log::info!("Reading ESRI features from {:?}", filepath);
        features_from_esri_value(document)
    }
}

fn log_field_table(importer: &Importer, collection: &FeatureCollection) {
    match collection.features.first() {
        Some(sample) => {
            for row in importer.mapping().field_table(&sample.properties) {
                log::debug!("Field {} -> {}", row.source_key, row.placeholder);
            }
        }
        None => log::info!("No feature to build the field table from"),
    }
}

fn import_from_service(
    url: &str,
    moves: &[ViewportMove],
    data_dir: &Path,
    importer: &mut Importer,
    graph: &mut EditGraph,
) -> anyhow::Result<ImportReport> {
    let mut report = ImportReport::default();
    let mut query = EsriQuery::new(url);
    let viewports: Vec<WgsBoundingBox> = settled_viewports(moves);
    log::info!("{} map moves settle on {} viewports", moves.len(), viewports.len());
    for viewport in &viewports {
        let query_url = match query.url_for_bounds(viewport) {
            Some(query_url) => query_url,
            None => {
                log::info!("Viewport {:?} unchanged, not querying again", viewport);
                continue;
            }
        };
        let filepath = sync_esri_query_to_file(&query_url, viewport, data_dir)?;
        let collection = parse_esri_features(&read_to_string(&filepath)?)?;
        log::info!("Received {} features", collection.len());
        log_field_table(importer, &collection);
        if let FitSuggestion::CenterOn { center, .. } = fit_viewport(&viewport.to_rect(), &collection) {
            log::info!(
                "Features lie outside the viewport, their extent is centered at ({:.6}, {:.6})",
                center.x,
                center.y
            );
        }
        report.extend(importer.import_feature_collection(graph, &collection));
    }
    Ok(report)
}

fn try_main() -> anyhow::Result<()> {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    env_logger::init();

    let args = Args::try_parse()?;
    if !Path::new(&args.config_filepath).exists() {
        return Err(anyhow!("Config file {} not found", &args.config_filepath));
    }
    let config_contents = read_to_string(args.config_filepath)?;
    let config: Config = serde_yaml::from_str(&config_contents)?;
    std::fs::create_dir_all(&config.data_dir)?;

    let mut importer = Importer::new(&config.source_id_field).with_mapping(config.field_mapping);
    let mut graph = EditGraph::new();

    let report = match &config.source {
        FeatureSourceConfig::Geofile { filepath } => {
            let collection = read_features_from_file(filepath)?;
            log_field_table(&importer, &collection);
            importer.import_feature_collection(&mut graph, &collection)
        }
        FeatureSourceConfig::Service { url, viewports } => {
            import_from_service(url, viewports, &config.data_dir, &mut importer, &mut graph)?
        }
    };
    log::info!(
        "Graph holds {} nodes and {} ways",
        graph.node_count(),
        graph.way_count()
    );

    let geojson_filepath = config.data_dir.join("imported.geojson");
    log::info!("Writing imported entities to {:?}", &geojson_filepath);
    write_graph_to_geojson(&graph, &geojson_filepath)?;

    let report_filepath = config.data_dir.join("import_report.yaml");
    log::info!("Writing import report to {:?}", &report_filepath);
    std::fs::write(&report_filepath, serde_yaml::to_string(&report)?)?;
    Ok(())
}

fn main() {
    if let Err(e) = try_main() {
        eprintln!("Error: {:?}", e);
        std::process::exit(1)
    }
}

#[cfg(test)]
mod tests {
    use testdir::testdir;

    use crate::geofile::feature::{SourceGeometry, SourceId};
    use crate::graph::edit_graph::EditGraph;
    use crate::import::{driver::Importer, report::FeatureOutcome};

    use super::{read_features_from_file, Config, FeatureSourceConfig};

    #[test]
    fn test_parse_config() {
        let config: Config = serde_yaml::from_str(
            r#"
source: !Service
  url: https://example.com/arcgis/rest/services/Parks/FeatureServer/0/query?where=1%3D1&outFields=*
  viewports:
    - left_lon: -77.05
      right_lon: -77.0
      bottom_lat: 38.88
      top_lat: 38.9
    - left_lon: -77.04
      right_lon: -76.99
      bottom_lat: 38.88
      top_lat: 38.9
      after_ms: 100
data_dir: data
field_mapping:
  PARK_NAME: name
"#,
        )
        .unwrap();
        assert_eq!(config.source_id_field, "OBJECTID");
        assert_eq!(config.field_mapping.get("PARK_NAME"), Some("name"));
        match config.source {
            FeatureSourceConfig::Service { viewports, .. } => {
                assert_eq!(viewports.len(), 2);
                assert_eq!(viewports[0].after_ms, 500);
                assert_eq!(viewports[1].after_ms, 100);
                assert_eq!(viewports[1].bounds.left_lon, -77.04);
            }
            other => panic!("Expected a service source, got {:?}", other),
        }
    }

    #[test]
    fn test_read_features_from_file_detects_format() {
        let test_dir = testdir!();
        let geojson_filepath = test_dir.join("features.geojson");
        std::fs::write(
            &geojson_filepath,
            r#"{"type": "FeatureCollection", "features": [
                {"type": "Feature", "geometry": {"type": "Point", "coordinates": [1, 2]}, "properties": {"FID": 3}}
            ]}"#,
        )
        .unwrap();
        let esri_filepath = test_dir.join("features.json");
        std::fs::write(
            &esri_filepath,
            r#"{"features": [{"attributes": {"FID": 4}, "geometry": {"x": 1, "y": 2}}]}"#,
        )
        .unwrap();

        let from_geojson = read_features_from_file(&geojson_filepath).unwrap();
        let from_esri = read_features_from_file(&esri_filepath).unwrap();
        assert_eq!(
            from_esri.features[0].geometry,
            SourceGeometry::Point(vec![1.0, 2.0])
        );

        let mut graph = EditGraph::new();
        let mut importer = Importer::new("FID");
        let mut report = importer.import_feature_collection(&mut graph, &from_geojson);
        report.extend(importer.import_feature_collection(&mut graph, &from_esri));
        let source_ids: Vec<SourceId> = report
            .outcomes
            .iter()
            .map(|outcome| match outcome {
                FeatureOutcome::Imported { source_id, .. } => source_id.clone(),
                other => panic!("Expected an imported feature, got {:?}", other),
            })
            .collect();
        assert_eq!(source_ids, vec![SourceId::Number(3), SourceId::Number(4)]);
        assert!(graph.nodes().all(|node| !node.tags.contains_key("FID")));
    }
}
