use std::collections::HashSet;

use crate::geofile::feature::SourceId;

/// Source identifiers whose features were already turned into committed entities.
///
/// The ledger only grows while its importer lives, so panning back over an area of the service
/// does not import the same records twice. `reset` starts over.
#[derive(Debug, Default)]
pub struct DedupLedger {
    seen: HashSet<SourceId>,
}

impl DedupLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, source_id: &SourceId) -> bool {
        self.seen.contains(source_id)
    }

    /// Record a converted feature. Returns false when it was recorded before.
    pub fn mark(&mut self, source_id: SourceId) -> bool {
        self.seen.insert(source_id)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    pub fn reset(&mut self) {
        self.seen.clear();
    }
}

#[cfg(test)]
mod tests {
    use crate::geofile::feature::SourceId;

    use super::DedupLedger;

    #[test]
    fn test_mark_and_reset() {
        let mut ledger = DedupLedger::new();
        assert!(ledger.mark(SourceId::Number(5)));
        assert!(!ledger.mark(SourceId::Number(5)));
        assert!(ledger.mark(SourceId::Text("5".to_string())));
        assert!(ledger.contains(&SourceId::Number(5)));
        assert_eq!(ledger.len(), 2);

        ledger.reset();
        assert!(ledger.is_empty());
        assert!(!ledger.contains(&SourceId::Number(5)));
    }
}
