//! Text rendering of the operator/owner tree around one entity.

use std::collections::HashSet;

use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use crate::error::Result;
use crate::graph::{EdgeKind, OwnershipGraph, Vertex};

fn label(vertex: &Vertex) -> String {
    match &vertex.media_type {
        Some(media_type) => format!("({media_type}) {}", vertex.name),
        None => vertex.name.clone(),
    }
}

impl OwnershipGraph {
    /// Neighbours of `node` one level up (`Incoming`) or down (`Outgoing`).
    ///
    /// Operation edges take precedence; ownership edges are used only when
    /// there are none. Sorted by capital share, largest first, then by name.
    fn branches(&self, node: NodeIndex, direction: Direction) -> Vec<(NodeIndex, Option<f64>)> {
        let collect = |kind: EdgeKind| -> Vec<(NodeIndex, Option<f64>)> {
            self.graph
                .edges_directed(node, direction)
                .filter(|edge| edge.weight().kind == kind)
                .map(|edge| {
                    let other = match direction {
                        Direction::Incoming => edge.source(),
                        Direction::Outgoing => edge.target(),
                    };
                    (other, edge.weight().capital_shares)
                })
                .collect()
        };

        let mut branches = collect(EdgeKind::Operates);
        if branches.is_empty() {
            branches = collect(EdgeKind::Owns);
        }
        branches.sort_by(|(a, a_share), (b, b_share)| {
            b_share
                .unwrap_or(f64::NEG_INFINITY)
                .total_cmp(&a_share.unwrap_or(f64::NEG_INFINITY))
                .then_with(|| self.graph[*a].name.cmp(&self.graph[*b].name))
        });
        branches
    }

    /// Render the tree rooted at `squuid`.
    ///
    /// `Direction::Incoming` walks to operators and owners,
    /// `Direction::Outgoing` to operated media and holdings. Ownership
    /// branches are prefixed with their capital share. An entity already
    /// expanded elsewhere in the tree is shown once more and then cut off
    /// with `└─...`, so cycles terminate.
    pub fn tree(&self, squuid: &str, direction: Direction) -> Result<String> {
        let root = self.node(squuid)?;
        let mut out = String::new();
        let mut seen = HashSet::new();
        self.render(root, direction, "", "", &mut seen, &mut out);
        Ok(out)
    }

    fn render(
        &self,
        node: NodeIndex,
        direction: Direction,
        prefix: &str,
        share: &str,
        seen: &mut HashSet<NodeIndex>,
        out: &mut String,
    ) {
        out.push_str(&format!("{prefix}{share}{}\n", label(&self.graph[node])));

        let indent = prefix.replace(['└', '─'], " ").replace('├', "│");
        let branches = self.branches(node, direction);
        if !seen.insert(node) {
            if !branches.is_empty() {
                out.push_str(&format!("{indent}└─...\n"));
            }
            return;
        }

        let last = branches.len().saturating_sub(1);
        for (i, (child, capital_shares)) in branches.into_iter().enumerate() {
            let connector = if i == last { "└─" } else { "├─" };
            let share = capital_shares.map(|s| format!("{s}% ")).unwrap_or_default();
            self.render(
                child,
                direction,
                &format!("{indent}{connector}"),
                &share,
                seen,
                out,
            );
        }
    }
}
