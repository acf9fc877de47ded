//! Aggregated ultimate ownership.

use std::collections::{BTreeMap, HashSet};

use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use crate::error::Result;
use crate::graph::{EdgeKind, NodeKind, OwnershipGraph, Vertex};

/// An entity up the ownership chain and its aggregated stake, in percent.
#[derive(Debug, Clone, PartialEq)]
pub struct TopOwner<'g> {
    pub owner: &'g Vertex,
    pub share: f64,
}

impl OwnershipGraph {
    /// Direct holders of `node` over edges of `kind`, with the capital
    /// share as a fraction (operation counts as 1).
    fn holders(&self, node: NodeIndex, kind: EdgeKind) -> impl Iterator<Item = (NodeIndex, f64)> + '_ {
        self.graph
            .edges_directed(node, Direction::Incoming)
            .filter(move |edge| edge.weight().kind == kind)
            .map(|edge| {
                let fraction = match edge.weight().kind {
                    EdgeKind::Owns => edge.weight().capital_shares.unwrap_or(0.0) / 100.0,
                    EdgeKind::Operates => 1.0,
                };
                (edge.source(), fraction)
            })
    }

    /// Everyone holding a direct or indirect stake in `squuid`.
    ///
    /// A media outlet starts from its operators at full weight, any other
    /// entity from its direct owners. Stakes are multiplied up the chain and
    /// summed per owner; each (holder, owner) edge is walked once, so cycles
    /// terminate. Sorted by share, largest first, then by name.
    pub fn top_owners(&self, squuid: &str) -> Result<Vec<TopOwner<'_>>> {
        let start = self.node(squuid)?;
        let first_kind = match self.graph[start].kind {
            NodeKind::Media => EdgeKind::Operates,
            NodeKind::Shareholder | NodeKind::Unknown => EdgeKind::Owns,
        };

        let mut open: BTreeMap<NodeIndex, f64> = BTreeMap::new();
        for (holder, fraction) in self.holders(start, first_kind) {
            *open.entry(holder).or_default() += fraction;
        }

        let mut totals: BTreeMap<NodeIndex, f64> = BTreeMap::new();
        let mut walked: HashSet<(NodeIndex, NodeIndex)> = HashSet::new();
        while let Some((holder, share)) = open.pop_first() {
            *totals.entry(holder).or_default() += share;
            for (owner, fraction) in self.holders(holder, EdgeKind::Owns) {
                if walked.insert((holder, owner)) {
                    *open.entry(owner).or_default() += share * fraction;
                }
            }
        }

        let mut owners: Vec<TopOwner<'_>> = totals
            .into_iter()
            .map(|(node, share)| TopOwner {
                owner: &self.graph[node],
                share: share * 100.0,
            })
            .collect();
        owners.sort_by(|a, b| {
            b.share
                .total_cmp(&a.share)
                .then_with(|| a.owner.name.cmp(&b.owner.name))
        });
        Ok(owners)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GraphError;
    use crate::graph::tests::sample_db;

    #[allow(clippy::cast_possible_truncation)]
    fn summary(owners: &[TopOwner<'_>]) -> Vec<(String, i64)> {
        owners
            .iter()
            .map(|o| (o.owner.squuid.to_string(), o.share.round() as i64))
            .collect()
    }

    #[test]
    fn test_media_owners_start_from_operators() {
        let db = sample_db();
        let graph = OwnershipGraph::load(&db, None).unwrap();

        let owners = graph.top_owners("M").unwrap();
        assert_eq!(
            summary(&owners),
            vec![
                ("S1".to_string(), 100),
                ("S2".to_string(), 100),
                ("S3".to_string(), 40),
            ]
        );
    }

    #[test]
    fn test_shareholder_owners_use_capital_shares() {
        let db = sample_db();
        let graph = OwnershipGraph::load(&db, None).unwrap();

        let owners = graph.top_owners("S1").unwrap();
        assert_eq!(
            summary(&owners),
            vec![("S2".to_string(), 100), ("S3".to_string(), 40)]
        );
    }

    #[test]
    fn test_cycles_terminate() {
        let db = sample_db();
        db.conn()
            .execute(
                "INSERT INTO ownership_relations (squuid, holder_squuid, held_squuid, state, capital_shares)
                 VALUES ('loop', 'S1', 'S2', 'active', 50.0)",
                [],
            )
            .unwrap();
        let graph = OwnershipGraph::load(&db, None).unwrap();

        let owners = graph.top_owners("M").unwrap();
        assert!(owners.iter().any(|o| o.owner.squuid.as_str() == "S2"));
    }

    #[test]
    fn test_entity_without_owners() {
        let db = sample_db();
        let graph = OwnershipGraph::load(&db, None).unwrap();
        assert!(graph.top_owners("X").unwrap().is_empty());
    }

    #[test]
    fn test_unknown_entity() {
        let db = sample_db();
        let graph = OwnershipGraph::load(&db, None).unwrap();
        assert!(matches!(
            graph.top_owners("nope"),
            Err(GraphError::UnknownEntity(_))
        ));
    }
}
