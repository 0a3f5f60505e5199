//! DAG node arena, operator trait, and factory.
//!
//! Nodes live in a flat arena addressed by [`NodeId`], with child edges and
//! parent back-references kept in sync by the arena's mutators. Operator
//! behavior is attached per node as a shared [`Call`] trait object created
//! through the [`CallFactory`].

mod bfs;
mod factory;
mod node;


pub use bfs::{bfs_down, bfs_up};
pub use factory::CallFactory;
pub use node::{Call, Dag, Node, NodeId, NodeKind};
