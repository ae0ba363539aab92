use serde::Serialize;

/// Reasons a single feature could not be imported. These never abort the import of the
/// remaining features of a collection, they end up in the import report.
#[derive(Clone, Debug, PartialEq, thiserror::Error, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ImportError {
    #[error("malformed geometry: {reason}")]
    MalformedGeometry { reason: String },

    #[error("unknown geometry kind {geometry_type}")]
    UnknownGeometryKind { geometry_type: String },

    #[error("feature has no source identifier")]
    MissingSourceId,

    #[error("host rejected the transaction: {reason}")]
    CommitRejected { reason: String },
}

impl ImportError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        ImportError::MalformedGeometry {
            reason: reason.into(),
        }
    }
}
