#[cfg(any(test, feature = "dom-snapshot"))]
pub mod snapshot;
pub mod traverse;

mod types;

pub use crate::types::{AttrName, Attribute, Id, Node, NodeId, NodeKind};
