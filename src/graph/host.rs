use super::entity::{Entity, EntityId, EntityKind};

/// One entity addition together with the description shown in the undo history.
#[derive(Clone, Debug, PartialEq)]
pub struct Operation {
    pub entity: Entity,
    pub description: String,
}

/// Entity additions which a host applies all together or not at all. Order matters: an entity
/// may only reference entities added before it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Transaction {
    operations: Vec<Operation>,
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_entity(&mut self, entity: impl Into<Entity>, description: &str) -> EntityId {
        let entity = entity.into();
        let id = entity.id();
        self.operations.push(Operation {
            entity,
            description: description.to_string(),
        });
        id
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn into_operations(self) -> Vec<Operation> {
        self.operations
    }

    pub fn entity_ids(&self) -> Vec<EntityId> {
        self.operations
            .iter()
            .map(|operation| operation.entity.id())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

/// The editor that owns the entity store. Identities are assigned by the host, mutations go
/// through `perform` so they end up in its undo history.
pub trait EntityHost {
    /// Reserve a fresh identity for an entity of the given kind.
    fn allocate_id(&mut self, kind: EntityKind) -> EntityId;

    /// Apply the transaction atomically. An error means nothing was applied.
    fn perform(&mut self, transaction: Transaction) -> anyhow::Result<()>;
}
