//! The patch engine: walks the live tree and the streaming walker in
//! lockstep and converges the live tree onto the streamed one.
//!
//! Matching rules, in priority order:
//! - A keyed new child claims the registry entry with its key anywhere among
//!   the old siblings; an out-of-position match relocates the live node
//!   (identity preserved), never clones it.
//! - An unkeyed old child at the cursor is a positional match.
//! - A keyed old child at the cursor is never consumed positionally; the new
//!   child is cloned in before it and the occupant is left to be claimed by
//!   its key or removed at the end.
//! - With no old children left, clones are appended.
//!
//! After the new children are exhausted, unclaimed registry entries are
//! removed wherever they sit and the remaining unconsumed old children are
//! removed from the tail; that whole phase is one transition unit.

use crate::attrs::sync_attributes;
use crate::error::ReconcileError;
use crate::mutation::{Mutation, ReconcileReport};
use crate::transition::TransitionGate;
use dom::traverse::{assign_node_ids, renumber_subtree};
use dom::{AttrName, Id, Node, NodeId, NodeKind};
use stream::{
    BuildMode, ByteSource, IgnorePredicate, NextNodeHook, NodeRef, SharedDocument, StreamError,
    StreamWalker, spawn_builder,
};
use std::collections::{HashMap, HashSet};

/// The container whose own attributes are left untouched by updates, so
/// out-of-band markers (theme classes and the like) survive reconciliation.
const ATTRIBUTE_EXEMPT_CONTAINER: &str = "body";

/// Template elements pass their content through as a fragment, so a rename
/// onto one clones its content along with it.
const FRAGMENT_PASSTHROUGH: &str = "template";

pub struct ReconcileOptions {
    /// Wrap each batch of mutations in an externally visible transition unit.
    pub use_transition: bool,
    /// Whether the stream materializes a document or a rootless fragment.
    pub mode: BuildMode,
    /// Attribute exempt from re-application once present (see `attrs`).
    pub sticky_attribute: Option<AttrName>,
    /// Invoked once per node as it becomes visible during traversal.
    pub on_next_node: Option<NextNodeHook>,
    /// Nodes matching the predicate are invisible to reconciliation.
    pub should_ignore_node: Option<IgnorePredicate>,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            use_transition: false,
            mode: BuildMode::Document,
            sticky_attribute: Some(AttrName::local("data-action")),
            on_next_node: None,
            should_ignore_node: None,
        }
    }
}

/// Converge `live` onto the tree streamed out of `source`.
///
/// Blocks until the stream completes or fails; suspension happens inside
/// the walker whenever the next node is not yet proven complete. On stream
/// failure the live tree keeps its partially patched state.
pub fn reconcile<S: ByteSource + 'static>(
    live: &mut Node,
    source: S,
    options: ReconcileOptions,
) -> Result<ReconcileReport, ReconcileError> {
    validate_live(live)?;
    let highest = assign_node_ids(live);

    let doc = SharedDocument::new(options.mode);
    let builder = spawn_builder(source, doc.clone());
    let walker = StreamWalker::with_hooks(doc, options.on_next_node, options.should_ignore_node);

    let mut engine = Engine {
        walker,
        gate: TransitionGate::new(options.use_transition),
        next_live_id: highest,
        sticky: options.sticky_attribute,
    };
    let outcome = engine.run(live);
    let _ = builder.join();
    outcome?;
    Ok(engine.gate.into_report())
}

fn validate_live(live: &Node) -> Result<(), ReconcileError> {
    match live {
        Node::Text { .. } | Node::Comment { .. } => Err(ReconcileError::InvalidArgument(
            "live root must be a document, fragment, or element",
        )),
        Node::Document { children, .. }
            if !children.iter().any(|c| matches!(c, Node::Element { .. })) =>
        {
            Err(ReconcileError::InvalidArgument(
                "live document has no root element",
            ))
        }
        _ => Ok(()),
    }
}

struct Engine {
    walker: StreamWalker,
    gate: TransitionGate,
    next_live_id: NodeId,
    sticky: Option<AttrName>,
}

impl Engine {
    fn run(&mut self, live: &mut Node) -> Result<(), StreamError> {
        let root_ref = self.walker.root()?;
        let root_kind = self.walker.summary(root_ref).kind;

        // Both sides normalize to an element-or-fragment view: a live
        // document stands in for its root element.
        let target = match live {
            Node::Document { children, .. } => children
                .iter_mut()
                .find(|child| matches!(child, Node::Element { .. }))
                .expect("validated: document has a root element"),
            other => other,
        };

        if root_kind == NodeKind::Fragment {
            // No wrapper node exists to diff as a unit.
            self.set_child_nodes(target, root_ref)
        } else {
            self.update_node(target, root_ref)
        }
    }

    fn update_node(&mut self, slot: &mut Node, new_ref: NodeRef) -> Result<(), StreamError> {
        let summary = self.walker.summary(new_ref);

        if slot.kind() != summary.kind {
            let clone = self.clone_from_stream(new_ref);
            let batch = vec![Mutation::ReplaceNode {
                old: slot.id(),
                new: clone.id(),
            }];
            *slot = clone;
            self.gate.apply(batch);
            return Ok(());
        }

        match summary.kind {
            NodeKind::Element => {
                self.set_child_nodes(slot, new_ref)?;

                let new_name = summary.name.as_deref().unwrap_or_default();
                let mut batch = Vec::new();
                if slot
                    .name()
                    .is_some_and(|name| name.eq_ignore_ascii_case(new_name))
                {
                    if !new_name.eq_ignore_ascii_case(ATTRIBUTE_EXEMPT_CONTAINER) {
                        let Node::Element { id, attributes, .. } = slot else {
                            unreachable!("kind already matched Element");
                        };
                        sync_attributes(
                            attributes,
                            &summary.attributes,
                            self.sticky.as_ref(),
                            *id,
                            &mut batch,
                        );
                    }
                } else {
                    // Tag changed: move the live children into a clone of the
                    // new node so their identity survives the rename.
                    let mut clone = if new_name.eq_ignore_ascii_case(FRAGMENT_PASSTHROUGH) {
                        self.clone_from_stream(new_ref)
                    } else {
                        let id = self.alloc();
                        Node::Element {
                            id,
                            name: new_name.to_string(),
                            attributes: summary.attributes.clone(),
                            children: Vec::new(),
                        }
                    };
                    let adopted =
                        std::mem::take(slot.children_mut().expect("element has a child list"));
                    clone
                        .children_mut()
                        .expect("element has a child list")
                        .extend(adopted);
                    batch.push(Mutation::ReplaceNode {
                        old: slot.id(),
                        new: clone.id(),
                    });
                    *slot = clone;
                }
                self.gate.apply(batch);
            }
            NodeKind::Text | NodeKind::Comment => {
                let new_value = summary.value.unwrap_or_default();
                if slot.value() != Some(new_value.as_str()) {
                    let batch = vec![Mutation::SetText {
                        node: slot.id(),
                        text: new_value.clone(),
                    }];
                    slot.set_value(new_value);
                    self.gate.apply(batch);
                }
            }
            NodeKind::Document | NodeKind::Fragment => {
                self.set_child_nodes(slot, new_ref)?;
            }
        }
        Ok(())
    }

    fn set_child_nodes(&mut self, parent: &mut Node, parent_ref: NodeRef) -> Result<(), StreamError> {
        let parent_id = parent.id();
        let Some(children) = parent.children_mut() else {
            return Ok(());
        };

        // Keyed registry over the current children. A later duplicate key
        // overwrites the earlier entry; duplicate sibling keys are undefined
        // behavior for callers.
        let mut keyed: HashMap<String, Id> = HashMap::new();
        let mut extra = children.len();
        for child in children.iter() {
            if let Some(key) = child.key() {
                keyed.insert(key.to_string(), child.id());
            }
        }

        let mut cursor = 0usize;
        let mut new_child = self.walker.first_child(parent_ref)?;
        while let Some(new_ref) = new_child {
            let summary = self.walker.summary(new_ref);
            let mut inserted_at: Option<usize> = None;

            let claimed = match summary.key.as_deref() {
                Some(key) => keyed.remove(key),
                None => None,
            };

            if let Some(found) = claimed {
                let position = children
                    .iter()
                    .position(|child| child.id() == found)
                    .expect("keyed registry entries point at live children");
                if position == cursor {
                    cursor += 1;
                } else {
                    // Relocate the matched node to the cursor; moving rather
                    // than cloning is what preserves its identity.
                    let node = children.remove(position);
                    let at = if position < cursor { cursor - 1 } else { cursor };
                    let before = children.get(at).map(Node::id);
                    children.insert(at, node);
                    self.gate.apply(vec![Mutation::MoveBefore {
                        parent: parent_id,
                        node: found,
                        before,
                    }]);
                    cursor = at + 1;
                }
                extra -= 1;
                self.update_node(&mut children[cursor - 1], new_ref)?;
            } else if cursor < children.len() {
                if children[cursor].key().is_none() {
                    extra -= 1;
                    self.update_node(&mut children[cursor], new_ref)?;
                    cursor += 1;
                } else {
                    // The occupant belongs elsewhere (or nowhere); do not
                    // consume it yet.
                    let clone = self.clone_from_stream(new_ref);
                    let before = Some(children[cursor].id());
                    self.gate.apply(vec![Mutation::InsertBefore {
                        parent: parent_id,
                        node: clone.id(),
                        before,
                    }]);
                    children.insert(cursor, clone);
                    inserted_at = Some(cursor);
                    cursor += 2;
                }
            } else {
                let clone = self.clone_from_stream(new_ref);
                self.gate.apply(vec![Mutation::InsertBefore {
                    parent: parent_id,
                    node: clone.id(),
                    before: None,
                }]);
                children.push(clone);
                inserted_at = Some(children.len() - 1);
                cursor = children.len();
            }

            if let Some(at) = inserted_at
                && matches!(children[at], Node::Element { .. })
            {
                // The clone was taken from a possibly still-growing subtree;
                // a follow-up pass reconciles content that streamed in after
                // the snapshot.
                self.update_node(&mut children[at], new_ref)?;
            }

            new_child = self.walker.next_sibling(new_ref)?;
        }

        let mut batch = Vec::new();
        if !keyed.is_empty() {
            let unclaimed: HashSet<Id> = keyed.into_values().collect();
            children.retain(|child| {
                if unclaimed.contains(&child.id()) {
                    batch.push(Mutation::RemoveNode {
                        parent: parent_id,
                        node: child.id(),
                    });
                    extra -= 1;
                    false
                } else {
                    true
                }
            });
        }
        debug_assert!(extra <= children.len());
        for _ in 0..extra {
            let node = children.pop().expect("trailing removals stay in bounds");
            batch.push(Mutation::RemoveNode {
                parent: parent_id,
                node: node.id(),
            });
        }
        self.gate.apply(batch);
        Ok(())
    }

    fn clone_from_stream(&mut self, new_ref: NodeRef) -> Node {
        let mut node = self.walker.clone_subtree(new_ref);
        renumber_subtree(&mut node, &mut self.next_live_id);
        node
    }

    fn alloc(&mut self) -> Id {
        self.next_live_id += 1;
        Id(self.next_live_id)
    }
}
