use indicatif::ProgressBar;

use crate::{
    geofile::feature::{FeatureCollection, RawFeature, SourceGeometry},
    graph::{
        entity::{EntityId, Tags},
        host::EntityHost,
    },
};

use super::{
    error::ImportError,
    field_mapper::FieldMapping,
    ledger::DedupLedger,
    normalizer::normalize,
    report::{FeatureOutcome, ImportReport},
    synthesizer::Synthesizer,
};

pub const DEFAULT_SOURCE_ID_FIELD: &str = "OBJECTID";

/// Turns feature collections into entities of a host.
///
/// The importer owns the field mapping and the dedup ledger for as long as the editing session
/// lasts. Features are converted strictly one after the other. All entities of a feature are
/// committed in a single transaction, and the feature is recorded in the ledger only once that
/// transaction went through, so a failed feature leaves nothing behind and is attempted again
/// by the next import.
pub struct Importer {
    mapping: FieldMapping,
    ledger: DedupLedger,
    source_id_field: String,
}

impl Default for Importer {
    fn default() -> Self {
        Self::new(DEFAULT_SOURCE_ID_FIELD)
    }
}

impl Importer {
    pub fn new(source_id_field: &str) -> Self {
        Self {
            mapping: FieldMapping::new(),
            ledger: DedupLedger::new(),
            source_id_field: source_id_field.to_string(),
        }
    }

    pub fn with_mapping(mut self, mapping: FieldMapping) -> Self {
        self.mapping = mapping;
        self
    }

    pub fn mapping(&self) -> &FieldMapping {
        &self.mapping
    }

    pub fn mapping_mut(&mut self) -> &mut FieldMapping {
        &mut self.mapping
    }

    pub fn ledger(&self) -> &DedupLedger {
        &self.ledger
    }

    pub fn source_id_field(&self) -> &str {
        &self.source_id_field
    }

    /// Forget every imported feature and clear the field mapping.
    pub fn reset(&mut self) {
        self.ledger.reset();
        self.mapping.clear();
    }

    /// Import all features of the collection into the host, in arrival order.
    pub fn import_feature_collection<H: EntityHost>(
        &mut self,
        host: &mut H,
        collection: &FeatureCollection,
    ) -> ImportReport {
        let mut report = ImportReport::default();
        let bar = ProgressBar::new(collection.len() as u64);
        for feature in &collection.features {
            let outcome = self.import_feature(host, feature);
            match &outcome {
                FeatureOutcome::Skipped { source_id } => {
                    log::debug!("Feature {} was imported before, skipping", source_id)
                }
                FeatureOutcome::Imported {
                    source_id,
                    entity_ids,
                } => log::debug!(
                    "Imported feature {} as {} entities",
                    source_id,
                    entity_ids.len()
                ),
                FeatureOutcome::Failed { source_id, error } => match source_id {
                    Some(source_id) => log::warn!("Could not import feature {}: {}", source_id, error),
                    None => log::warn!("Could not import feature: {}", error),
                },
            }
            report.push(outcome);
            bar.inc(1);
        }
        bar.finish_and_clear();
        log::info!(
            "Imported {} features, skipped {}, failed {}",
            report.imported_count(),
            report.skipped_count(),
            report.failed_count()
        );
        report
    }

    /// The feature's identity is the value of the source id property, else its feature level
    /// identifier. The mapping strips that same property from the tags.
    fn import_feature<H: EntityHost>(&mut self, host: &mut H, feature: &RawFeature) -> FeatureOutcome {
        let (tags, property_id) = self.mapping.apply(&feature.properties, &self.source_id_field);
        let source_id = match property_id.or_else(|| feature.feature_id.clone()) {
            Some(source_id) => source_id,
            None => {
                return FeatureOutcome::Failed {
                    source_id: None,
                    error: ImportError::MissingSourceId,
                }
            }
        };
        if self.ledger.contains(&source_id) {
            return FeatureOutcome::Skipped { source_id };
        }
        match self.convert_feature(host, &feature.geometry, tags) {
            Ok(entity_ids) => {
                log::trace!(
                    "Committed {} feature {}",
                    feature.geometry.kind_name(),
                    source_id
                );
                self.ledger.mark(source_id.clone());
                FeatureOutcome::Imported {
                    source_id,
                    entity_ids,
                }
            }
            Err(error) => FeatureOutcome::Failed {
                source_id: Some(source_id),
                error,
            },
        }
    }

    /// Synthesize the entities of one feature and commit them as one transaction.
    fn convert_feature<H: EntityHost>(
        &self,
        host: &mut H,
        geometry: &SourceGeometry,
        tags: Tags,
    ) -> Result<Vec<EntityId>, ImportError> {
        let rings = normalize(geometry)?;

        let transaction = {
            let mut synthesizer = Synthesizer::new(host);
            for ring in &rings {
                match (geometry, ring.coords.as_slice()) {
                    (SourceGeometry::Point(_), [coord]) => {
                        synthesizer.make_point(*coord, tags.clone(), "adding point");
                    }
                    (geometry, _) => {
                        synthesizer.make_way(ring, tags.clone(), way_description(geometry));
                    }
                }
            }
            synthesizer.finish()
        };

        let entity_ids = transaction.entity_ids();
        host.perform(transaction)
            .map_err(|err| ImportError::CommitRejected {
                reason: err.to_string(),
            })?;
        Ok(entity_ids)
    }
}

fn way_description(geometry: &SourceGeometry) -> &'static str {
    match geometry {
        SourceGeometry::MultiLineString(_) => "adding way within MultiLineString",
        SourceGeometry::Polygon(_) => "adding way within Polygon",
        SourceGeometry::MultiPolygon(_) => "adding way within MultiPolygon",
        _ => "adding way",
    }
}
