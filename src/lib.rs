//! Incremental reconciliation of a live DOM tree against a document that is
//! still arriving over a byte stream.
//!
//! Unlike a conventional tree diff, the engine patches while the new tree is
//! only partially known: traversal suspends exactly at the frontier of "not
//! yet received" data and resumes once enough bytes prove a subtree is
//! complete.
//!
//! Data flow: [`ByteSource`] → builder thread (decode → tokenize → append)
//! → [`SharedDocument`] → [`StreamWalker`] → reconciler paired with the live
//! tree → mutations through the transition gate, applied in place and
//! returned in the [`ReconcileReport`].

pub use dom::{AttrName, Attribute, Id, Node, NodeId, NodeKind};
pub use reconcile::{
    Mutation, ReconcileError, ReconcileOptions, ReconcileReport, TransitionUnit, reconcile,
};
pub use stream::{
    BuildMode, ByteSource, ChunkSource, FailingSource, NodeRef, NodeSummary, SharedDocument,
    SliceSource, StreamError, StreamWalker, parse, spawn_builder,
};
