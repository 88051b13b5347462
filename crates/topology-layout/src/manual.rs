//! Manual layout: put every node back where it was originally placed.

use std::collections::BTreeMap;

use topology_types::{Node, Position};

/// Restore each node's entry from `original_positions`. Nodes without an
/// entry keep their current position.
pub fn manual(nodes: &[Node], original_positions: &BTreeMap<String, Position>) -> Vec<Node> {
    nodes
        .iter()
        .map(|node| {
            let mut node = node.clone();
            if let Some(&position) = original_positions.get(&node.id) {
                node.position = Some(position);
            }
            node
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use topology_types::NodeKind;

    use super::*;

    #[test]
    fn restores_known_and_keeps_unknown() {
        let nodes = vec![
            Node::new("a", "A", NodeKind::Compute).at(500.0, 500.0),
            Node::new("b", "B", NodeKind::Compute).at(10.0, 20.0),
            Node::new("c", "C", NodeKind::Compute),
        ];
        let originals = BTreeMap::from([(String::from("a"), Position::new(1.0, 2.0))]);

        let out = manual(&nodes, &originals);

        assert_eq!(out[0].position, Some(Position::new(1.0, 2.0)));
        assert_eq!(out[1].position, Some(Position::new(10.0, 20.0)));
        assert_eq!(out[2].position, None);
    }
}
