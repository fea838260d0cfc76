//! The shared growing document and its notification primitive.
//!
//! The builder thread is the only writer; the walker reads under the same
//! mutex. Every state change (nodes appended, stream complete, stream
//! failed) notifies the condvar, so suspended traversals re-check instead of
//! polling on a timer.

use crate::builder::BuildMode;
use dom::Node;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StreamError {
    #[error("byte stream failed: {0}")]
    Failed(String),
    #[error("stream completed before a document root element was available")]
    MissingRoot,
}

pub(crate) struct DocState {
    pub root: Node,
    pub done: bool,
    pub failed: Option<String>,
    pub revision: u64,
}

impl DocState {
    pub fn stream_in_progress(&self) -> bool {
        !self.done && self.failed.is_none()
    }
}

#[derive(Clone)]
pub struct SharedDocument {
    inner: Arc<(Mutex<DocState>, Condvar)>,
}

impl SharedDocument {
    pub fn new(mode: BuildMode) -> Self {
        let state = DocState {
            root: mode.new_root(),
            done: false,
            failed: None,
            revision: 0,
        };
        Self {
            inner: Arc::new((Mutex::new(state), Condvar::new())),
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, DocState> {
        self.inner.0.lock().expect("shared document lock poisoned")
    }

    /// Block until the builder signals a change.
    pub(crate) fn wait<'a>(&self, guard: MutexGuard<'a, DocState>) -> MutexGuard<'a, DocState> {
        self.inner
            .1
            .wait(guard)
            .expect("shared document lock poisoned")
    }

    /// Run a builder-side mutation, bump the revision and wake waiters.
    pub(crate) fn mutate<R>(&self, f: impl FnOnce(&mut DocState) -> R) -> R {
        let mut state = self.lock();
        let result = f(&mut state);
        state.revision += 1;
        drop(state);
        self.inner.1.notify_all();
        result
    }

    pub fn mark_failed(&self, message: String) {
        self.mutate(|state| state.failed = Some(message));
    }

    pub fn is_done(&self) -> bool {
        self.lock().done
    }

    /// Deep clone of the current tree, for inspection outside the lock.
    pub fn snapshot_root(&self) -> Node {
        self.lock().root.clone()
    }
}
