use std::{collections::BTreeMap, fmt};

use serde::Serialize;

/// Tag set of an entity, ordered by key.
pub type Tags = BTreeMap<String, String>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityKind {
    Node,
    Way,
}

/// Identity of an entity in the edit graph. Entities created by an import carry negative
/// numbers, following the editor convention for entities not yet uploaded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(into = "String")]
pub enum EntityId {
    Node(i64),
    Way(i64),
}

impl EntityId {
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityId::Node(_) => EntityKind::Node,
            EntityId::Way(_) => EntityKind::Way,
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Node(x) => write!(f, "n{x}"),
            EntityId::Way(x) => write!(f, "w{x}"),
        }
    }
}

impl From<EntityId> for String {
    fn from(id: EntityId) -> Self {
        id.to_string()
    }
}

/// A point entity. Standalone points carry the feature tags, vertices of a way carry none.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub id: EntityId,
    pub loc: geo::Point,
    pub tags: Tags,
}

/// An ordered sequence of nodes forming a line or, when tagged `area=yes`, an area.
#[derive(Clone, Debug, PartialEq)]
pub struct Way {
    pub id: EntityId,
    pub nodes: Vec<EntityId>,
    pub tags: Tags,
    pub visible: bool,
}

impl Way {
    pub fn is_area(&self) -> bool {
        self.tags.get("area").map_or(false, |value| value == "yes")
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Entity {
    Node(Node),
    Way(Way),
}

impl Entity {
    pub fn id(&self) -> EntityId {
        match self {
            Entity::Node(node) => node.id,
            Entity::Way(way) => way.id,
        }
    }

    pub fn tags(&self) -> &Tags {
        match self {
            Entity::Node(node) => &node.tags,
            Entity::Way(way) => &way.tags,
        }
    }
}

impl From<Node> for Entity {
    fn from(node: Node) -> Self {
        Entity::Node(node)
    }
}

impl From<Way> for Entity {
    fn from(way: Way) -> Self {
        Entity::Way(way)
    }
}
