//! Sea-of-nodes IR data model.
//!
//! A graph owns its nodes in an arena and hands out dense [`NodeIdx`]
//! handles; edges are stored as ordered input lists that may contain holes.
//! The positional meaning of every input is given by the opcode's
//! [`Schema`], mirroring how HotSpot C2 lays out node inputs in its IGV
//! dumps.

pub mod dump_spec;
mod graph;
mod node;
mod opcode;
mod prop;
mod schema;

pub use graph::{Graph, NodeIdx};
pub use node::{Node, NodeId, TypeStamp};
pub use opcode::Opcode;
pub use prop::PropValue;
pub use schema::Schema;
