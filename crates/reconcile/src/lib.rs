pub mod attrs;
pub mod mutation;
pub mod transition;

mod engine;
mod error;

pub use crate::engine::{ReconcileOptions, reconcile};
pub use crate::error::ReconcileError;
pub use crate::mutation::{Mutation, ReconcileReport, TransitionUnit};
pub use crate::transition::TransitionGate;
