//! Ownership graph for kek-archive.
//!
//! Builds a petgraph graph of media outlets and shareholders linked by
//! ownership and operation edges, either from the current tables or from
//! one snapshot, answers "who ultimately owns this?" and prints the
//! operator/owner tree around an entity.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod error;
pub mod graph;
pub mod owners;
pub mod tree;

pub use error::{GraphError, Result};
pub use graph::{EdgeKind, NodeKind, OwnershipGraph, Relation, Vertex};
pub use owners::TopOwner;
pub use petgraph::Direction;
