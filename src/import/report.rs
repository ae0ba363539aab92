use serde::Serialize;

use crate::{geofile::feature::SourceId, graph::entity::EntityId};

use super::error::ImportError;

/// What happened to a single feature of an imported collection.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum FeatureOutcome {
    Skipped {
        source_id: SourceId,
    },
    Imported {
        source_id: SourceId,
        entity_ids: Vec<EntityId>,
    },
    Failed {
        source_id: Option<SourceId>,
        error: ImportError,
    },
}

/// Outcomes in feature arrival order.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ImportReport {
    pub outcomes: Vec<FeatureOutcome>,
}

impl ImportReport {
    pub fn push(&mut self, outcome: FeatureOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn extend(&mut self, other: ImportReport) {
        self.outcomes.extend(other.outcomes);
    }

    pub fn imported_count(&self) -> usize {
        self.count(|outcome| matches!(outcome, FeatureOutcome::Imported { .. }))
    }

    pub fn skipped_count(&self) -> usize {
        self.count(|outcome| matches!(outcome, FeatureOutcome::Skipped { .. }))
    }

    pub fn failed_count(&self) -> usize {
        self.count(|outcome| matches!(outcome, FeatureOutcome::Failed { .. }))
    }

    /// Identities of all entities created by the import, in commit order.
    pub fn entity_ids(&self) -> Vec<EntityId> {
        self.outcomes
            .iter()
            .filter_map(|outcome| match outcome {
                FeatureOutcome::Imported { entity_ids, .. } => Some(entity_ids.iter().copied()),
                _ => None,
            })
            .flatten()
            .collect()
    }

    fn count(&self, predicate: impl Fn(&FeatureOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|&outcome| predicate(outcome)).count()
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        geofile::feature::SourceId, graph::entity::EntityId, import::error::ImportError,
    };

    use super::{FeatureOutcome, ImportReport};

    #[test]
    fn test_report_serializes_to_yaml() {
        let report = ImportReport {
            outcomes: vec![
                FeatureOutcome::Imported {
                    source_id: SourceId::Number(1),
                    entity_ids: vec![EntityId::Node(-1)],
                },
                FeatureOutcome::Failed {
                    source_id: None,
                    error: ImportError::MissingSourceId,
                },
                FeatureOutcome::Failed {
                    source_id: Some(SourceId::Text("A-7".to_string())),
                    error: ImportError::UnknownGeometryKind {
                        geometry_type: "MultiPoint".to_string(),
                    },
                },
            ],
        };
        let yaml = serde_yaml::to_string(&report).unwrap();
        assert!(yaml.contains("status: imported"));
        assert!(yaml.contains("- n-1"));
        assert!(yaml.contains("kind: missing-source-id"));
        assert!(yaml.contains("kind: unknown-geometry-kind"));
        assert!(yaml.contains("geometry_type: MultiPoint"));
        assert!(yaml.contains("source_id: A-7"));
        assert_eq!(report.imported_count(), 1);
        assert_eq!(report.failed_count(), 2);
        assert_eq!(report.skipped_count(), 0);
    }
}
