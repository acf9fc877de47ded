//! Loading the ownership graph from the store.

use std::collections::HashMap;
use std::fmt;

use kek_core::model::{SnapshotId, Squuid};
use kek_core::schema::{snapshots, Database};
use petgraph::dot::Dot;
use petgraph::graph::{DiGraph, NodeIndex};
use rusqlite::{params_from_iter, Connection};

use crate::error::{GraphError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Media,
    Shareholder,
    /// An edge endpoint with no media or shareholder row (outside a sample,
    /// or never published).
    Unknown,
}

/// A media outlet or shareholder.
#[derive(Debug, Clone, PartialEq)]
pub struct Vertex {
    pub squuid: Squuid,
    pub name: String,
    pub kind: NodeKind,
    /// Media type (`rf`, `press`, `online`); media only.
    pub media_type: Option<String>,
}

impl fmt::Display for Vertex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    Owns,
    Operates,
}

/// A directed edge from holder to held.
#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    pub kind: EdgeKind,
    /// Percentage of capital held; owns edges only.
    pub capital_shares: Option<f64>,
}

impl Relation {
    /// Layout weight: the capital share (at least 1) for ownership, 100 for
    /// operation.
    #[must_use]
    pub fn weight(&self) -> f64 {
        match self.kind {
            EdgeKind::Owns => self.capital_shares.unwrap_or(0.0).max(1.0),
            EdgeKind::Operates => 100.0,
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.kind, self.capital_shares) {
            (EdgeKind::Owns, Some(shares)) => write!(f, "owns {shares}%"),
            (EdgeKind::Owns, None) => f.write_str("owns"),
            (EdgeKind::Operates, _) => f.write_str("operates"),
        }
    }
}

/// Media and shareholders linked by ownership and operation edges.
#[derive(Debug, Default)]
pub struct OwnershipGraph {
    pub(crate) graph: DiGraph<Vertex, Relation>,
    index: HashMap<Squuid, NodeIndex>,
}

impl OwnershipGraph {
    /// Build the graph from the current tables, or from the history tables
    /// of `snapshot` when given.
    pub fn load(db: &Database, snapshot: Option<SnapshotId>) -> Result<Self> {
        let conn = db.conn();
        if let Some(id) = snapshot {
            // Fails with NotFound for an unknown snapshot.
            snapshots::get(conn, id)?;
        }

        let mut graph = Self::default();
        for (squuid, name, media_type) in load_vertices(conn, "media", "type", snapshot)? {
            graph.add_vertex(squuid, name, NodeKind::Media, media_type);
        }
        for (squuid, name, _) in load_vertices(conn, "shareholders", "NULL", snapshot)? {
            graph.add_vertex(squuid, name, NodeKind::Shareholder, None);
        }

        let (sql, filter) = source("ownership_relations", snapshot);
        let mut stmt =
            conn.prepare(&format!("SELECT holder_squuid, held_squuid, capital_shares FROM {sql}{filter}"))?;
        let owns = stmt
            .query_map(params_from_iter(snapshot.map(SnapshotId::get)), |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<f64>>(2)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        for (holder, held, capital_shares) in owns {
            graph.add_relation(
                &holder,
                &held,
                Relation {
                    kind: EdgeKind::Owns,
                    capital_shares,
                },
            );
        }

        let (sql, filter) = source("operation_relations", snapshot);
        let mut stmt = conn.prepare(&format!("SELECT holder_squuid, held_squuid FROM {sql}{filter}"))?;
        let operates = stmt
            .query_map(params_from_iter(snapshot.map(SnapshotId::get)), |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        for (holder, held) in operates {
            graph.add_relation(
                &holder,
                &held,
                Relation {
                    kind: EdgeKind::Operates,
                    capital_shares: None,
                },
            );
        }

        log::info!(
            "Loaded ownership graph: {} nodes, {} edges",
            graph.node_count(),
            graph.edge_count()
        );
        Ok(graph)
    }

    fn add_vertex(
        &mut self,
        squuid: String,
        name: String,
        kind: NodeKind,
        media_type: Option<String>,
    ) -> NodeIndex {
        let squuid = Squuid::new(squuid);
        let node = self.graph.add_node(Vertex {
            squuid: squuid.clone(),
            name,
            kind,
            media_type,
        });
        self.index.insert(squuid, node);
        node
    }

    fn node_or_unknown(&mut self, squuid: &str) -> NodeIndex {
        match self.index.get(&Squuid::from(squuid)) {
            Some(node) => *node,
            None => self.add_vertex(
                squuid.to_string(),
                squuid.to_string(),
                NodeKind::Unknown,
                None,
            ),
        }
    }

    fn add_relation(&mut self, holder: &str, held: &str, relation: Relation) {
        let holder = self.node_or_unknown(holder);
        let held = self.node_or_unknown(held);
        self.graph.add_edge(holder, held, relation);
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// The vertex for `squuid`, if present.
    #[must_use]
    pub fn vertex(&self, squuid: &str) -> Option<&Vertex> {
        self.index
            .get(&Squuid::from(squuid))
            .map(|node| &self.graph[*node])
    }

    pub(crate) fn node(&self, squuid: &str) -> Result<NodeIndex> {
        self.index
            .get(&Squuid::from(squuid))
            .copied()
            .ok_or_else(|| GraphError::UnknownEntity(squuid.to_string()))
    }

    /// Graphviz rendering. Media are boxes, shareholders ellipses; edges
    /// carry their layout weight.
    #[must_use]
    pub fn to_dot(&self) -> String {
        let dot = Dot::with_attr_getters(
            &self.graph,
            &[],
            &|_, edge| format!("weight = {}", edge.weight().weight()),
            &|_, (_, vertex)| match vertex.kind {
                NodeKind::Media => "shape = box".to_string(),
                NodeKind::Shareholder => "shape = ellipse".to_string(),
                NodeKind::Unknown => "shape = ellipse, style = dashed".to_string(),
            },
        );
        format!("{dot}")
    }
}

/// Table and filter for the current or the historical variant of `base`.
fn source(base: &str, snapshot: Option<SnapshotId>) -> (String, &'static str) {
    match snapshot {
        Some(_) => (format!("{base}_history"), " WHERE snapshot_id = ?1"),
        None => (base.to_string(), ""),
    }
}

/// `(squuid, name, type)` rows of `base`; `type_column` may be `NULL`.
fn load_vertices(
    conn: &Connection,
    base: &str,
    type_column: &str,
    snapshot: Option<SnapshotId>,
) -> Result<Vec<(String, String, Option<String>)>> {
    let (table, filter) = source(base, snapshot);
    let mut stmt =
        conn.prepare(&format!("SELECT squuid, name, {type_column} FROM {table}{filter}"))?;
    let rows = stmt
        .query_map(params_from_iter(snapshot.map(SnapshotId::get)), |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}
