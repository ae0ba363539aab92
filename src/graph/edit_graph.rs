use std::collections::{BTreeMap, HashSet};

use anyhow::anyhow;

use super::{
    entity::{Entity, EntityId, EntityKind, Node, Way},
    host::{EntityHost, Operation, Transaction},
};

/// A transaction that was applied to the graph, kept for undo.
#[derive(Clone, Debug, PartialEq)]
pub struct HistoryEntry {
    pub descriptions: Vec<String>,
    pub entity_ids: Vec<EntityId>,
}

/// In-memory editable map graph. Nodes and ways are stored in maps indexed by their identity,
/// ways reference nodes by identity. Every applied transaction is recorded in the history.
pub struct EditGraph {
    nodes: BTreeMap<EntityId, Node>,
    ways: BTreeMap<EntityId, Way>,
    history: Vec<HistoryEntry>,
    next_node_id: i64,
    next_way_id: i64,
}

impl Default for EditGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl EditGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self {
            nodes: BTreeMap::new(),
            ways: BTreeMap::new(),
            history: Vec::new(),
            next_node_id: -1,
            next_way_id: -1,
        }
    }

    /// Nodes in creation order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values().rev()
    }

    /// Ways in creation order.
    pub fn ways(&self) -> impl Iterator<Item = &Way> {
        self.ways.values().rev()
    }

    pub fn node(&self, id: &EntityId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn way(&self, id: &EntityId) -> Option<&Way> {
        self.ways.get(id)
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.nodes.contains_key(id) || self.ways.contains_key(id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn way_count(&self) -> usize {
        self.ways.len()
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// Resolve the node locations of a way into a linestring.
    pub fn way_geometry(&self, way: &Way) -> anyhow::Result<geo::LineString> {
        way.nodes
            .iter()
            .map(|node_id| {
                self.nodes
                    .get(node_id)
                    .map(|node| node.loc.0)
                    .ok_or_else(|| anyhow!("Way {} references missing node {}", way.id, node_id))
            })
            .collect()
    }

    /// Revert the most recent transaction. Returns the reverted entry, if any.
    pub fn undo(&mut self) -> Option<HistoryEntry> {
        let entry = self.history.pop()?;
        for id in entry.entity_ids.iter().rev() {
            match id.kind() {
                EntityKind::Node => self.nodes.remove(id).map(|_| ()),
                EntityKind::Way => self.ways.remove(id).map(|_| ()),
            };
        }
        log::debug!("Undid {} entities", entry.entity_ids.len());
        Some(entry)
    }

    /// Check that the operations can be applied in order without breaking the graph invariants.
    fn validate(&self, operations: &[Operation]) -> anyhow::Result<()> {
        let mut staged: HashSet<EntityId> = HashSet::new();
        for operation in operations {
            let id = operation.entity.id();
            if self.contains(&id) || staged.contains(&id) {
                return Err(anyhow!("Entity with the same id ({}) already exists", id));
            }
            match &operation.entity {
                Entity::Node(_) if id.kind() != EntityKind::Node => {
                    return Err(anyhow!("Node carries non-node id {}", id));
                }
                Entity::Way(way) => {
                    if id.kind() != EntityKind::Way {
                        return Err(anyhow!("Way carries non-way id {}", id));
                    }
                    if 2 > way.nodes.len() {
                        return Err(anyhow!("Cannot insert way {} with less than two nodes", id));
                    }
                    for node_id in &way.nodes {
                        if node_id.kind() != EntityKind::Node {
                            return Err(anyhow!("Way {} references non-node {}", id, node_id));
                        }
                        if !self.nodes.contains_key(node_id) && !staged.contains(node_id) {
                            return Err(anyhow!(
                                "Way {} references node {} which was not added before it",
                                id,
                                node_id
                            ));
                        }
                    }
                }
                Entity::Node(_) => {}
            }
            staged.insert(id);
        }
        Ok(())
    }
}

impl EntityHost for EditGraph {
    fn allocate_id(&mut self, kind: EntityKind) -> EntityId {
        match kind {
            EntityKind::Node => {
                self.next_node_id -= 1;
                EntityId::Node(self.next_node_id + 1)
            }
            EntityKind::Way => {
                self.next_way_id -= 1;
                EntityId::Way(self.next_way_id + 1)
            }
        }
    }

    fn perform(&mut self, transaction: Transaction) -> anyhow::Result<()> {
        if transaction.is_empty() {
            log::debug!("Empty transaction, nothing to record");
            return Ok(());
        }
        self.validate(transaction.operations())?;
        let mut entry = HistoryEntry {
            descriptions: Vec::with_capacity(transaction.len()),
            entity_ids: Vec::with_capacity(transaction.len()),
        };
        for operation in transaction.into_operations() {
            entry.entity_ids.push(operation.entity.id());
            entry.descriptions.push(operation.description);
            match operation.entity {
                Entity::Node(node) => {
                    self.nodes.insert(node.id, node);
                }
                Entity::Way(way) => {
                    self.ways.insert(way.id, way);
                }
            }
        }
        self.history.push(entry);
        Ok(())
    }
}
