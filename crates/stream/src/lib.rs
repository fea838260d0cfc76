pub mod source;
pub mod walker;

mod builder;
mod decode;
mod entities;
mod pump;
mod shared;
mod tokenizer;

pub use crate::builder::{BuildMode, TreeBuilder, parse};
pub use crate::decode::Utf8Decoder;
pub use crate::pump::spawn_builder;
pub use crate::shared::{SharedDocument, StreamError};
pub use crate::source::{ByteSource, ChunkSource, FailingSource, SliceSource};
pub use crate::tokenizer::{Token, Tokenizer};
pub use crate::walker::{IgnorePredicate, NextNodeHook, NodeRef, NodeSummary, StreamWalker};
