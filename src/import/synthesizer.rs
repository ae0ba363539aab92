use crate::graph::{
    entity::{EntityId, EntityKind, Node, Tags, Way},
    host::{EntityHost, Transaction},
};

use super::normalizer::Ring;

pub const VERTEX_DESCRIPTION: &str = "adding node inside a way";

/// Builds the entities of one feature into a transaction. Identities come from the host, the
/// transaction is handed back with `finish` so the caller decides when to commit it.
pub struct Synthesizer<'a, H: EntityHost> {
    host: &'a mut H,
    transaction: Transaction,
}

impl<'a, H: EntityHost> Synthesizer<'a, H> {
    pub fn new(host: &'a mut H) -> Self {
        Self {
            host,
            transaction: Transaction::new(),
        }
    }

    /// Stage a node at `coord` with the given tags.
    pub fn make_point(&mut self, coord: geo::Coord, tags: Tags, description: &str) -> EntityId {
        let node = Node {
            id: self.host.allocate_id(EntityKind::Node),
            loc: coord.into(),
            tags,
        };
        self.transaction.add_entity(node, description)
    }

    /// Stage one untagged vertex per coordinate of the ring, then the way connecting them in
    /// order. Vertices are never shared with other rings or features.
    pub fn make_way(&mut self, ring: &Ring, mut tags: Tags, description: &str) -> EntityId {
        let nodes: Vec<EntityId> = ring
            .coords
            .iter()
            .map(|coord| self.make_point(*coord, Tags::new(), VERTEX_DESCRIPTION))
            .collect();

        if ring.is_areal {
            let area = tags.entry("area".to_string()).or_default();
            if matches!(area.as_str(), "" | "0" | "false") {
                *area = "yes".to_string();
            }
        }

        let way = Way {
            id: self.host.allocate_id(EntityKind::Way),
            nodes,
            tags,
            visible: true,
        };
        self.transaction.add_entity(way, description)
    }

    pub fn finish(self) -> Transaction {
        self.transaction
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        graph::{
            edit_graph::EditGraph,
            entity::{Entity, EntityId, Tags},
        },
        import::normalizer::Ring,
    };

    use super::{Synthesizer, VERTEX_DESCRIPTION};

    fn ring(pairs: &[(f64, f64)], is_areal: bool) -> Ring {
        Ring {
            coords: pairs.iter().map(|(x, y)| geo::Coord { x: *x, y: *y }).collect(),
            is_areal,
        }
    }

    #[test]
    fn test_make_point_keeps_tags() {
        let mut graph = EditGraph::new();
        let mut synthesizer = Synthesizer::new(&mut graph);
        let tags = Tags::from([("amenity".to_string(), "bench".to_string())]);
        let id = synthesizer.make_point(geo::Coord { x: 10.0, y: 20.0 }, tags.clone(), "adding point");
        let transaction = synthesizer.finish();

        assert_eq!(id, EntityId::Node(-1));
        assert_eq!(transaction.len(), 1);
        match &transaction.operations()[0].entity {
            Entity::Node(node) => {
                assert_eq!(node.loc, geo::Point::new(10.0, 20.0));
                assert_eq!(node.tags, tags);
            }
            other => panic!("Expected a node, got {:?}", other),
        }
    }

    #[test]
    fn test_make_way_stages_vertices_before_way() {
        let mut graph = EditGraph::new();
        let mut synthesizer = Synthesizer::new(&mut graph);
        let way_id = synthesizer.make_way(
            &ring(&[(0.0, 0.0), (1.0, 1.0), (2.0, 2.0)], false),
            Tags::from([("highway".to_string(), "residential".to_string())]),
            "adding way",
        );
        let transaction = synthesizer.finish();

        assert_eq!(way_id, EntityId::Way(-1));
        assert_eq!(transaction.len(), 4);
        let operations = transaction.operations();
        assert!(operations[..3]
            .iter()
            .all(|operation| operation.description == VERTEX_DESCRIPTION
                && operation.entity.tags().is_empty()));
        match &operations[3].entity {
            Entity::Way(way) => {
                assert_eq!(
                    way.nodes,
                    vec![EntityId::Node(-1), EntityId::Node(-2), EntityId::Node(-3)]
                );
                assert!(way.visible);
                assert!(!way.tags.contains_key("area"));
            }
            other => panic!("Expected a way, got {:?}", other),
        }
    }

    #[test]
    fn test_make_way_areal_tags() {
        let square = ring(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 0.0)], true);
        let mut graph = EditGraph::new();
        let mut synthesizer = Synthesizer::new(&mut graph);
        synthesizer.make_way(&square, Tags::new(), "adding way within Polygon");
        synthesizer.make_way(
            &square,
            Tags::from([("area".to_string(), "no".to_string())]),
            "adding way within Polygon",
        );
        for falsy in ["", "0", "false"] {
            synthesizer.make_way(
                &square,
                Tags::from([("area".to_string(), falsy.to_string())]),
                "adding way within Polygon",
            );
        }
        let transaction = synthesizer.finish();

        let areas: Vec<String> = transaction
            .operations()
            .iter()
            .filter_map(|operation| match &operation.entity {
                Entity::Way(way) => way.tags.get("area").cloned(),
                Entity::Node(_) => None,
            })
            .collect();
        assert_eq!(areas, vec!["yes", "no", "yes", "yes", "yes"]);
    }
}
