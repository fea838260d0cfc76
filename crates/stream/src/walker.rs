//! Suspend-capable traversal of the in-progress tree.
//!
//! Contract:
//! - `first_child`/`next_sibling` block in two places: while the requested
//!   axis is still unproven (the child/sibling does not exist yet but the
//!   stream could still produce it), and once a candidate exists, while that
//!   candidate is still the last node of the currently available data. The
//!   tree is append-only, so a resolved candidate never changes identity.
//! - A `None` result is definitive: it is only produced once the stream can
//!   no longer extend the requested axis.
//! - The node-skipping predicate advances along the requested axis before
//!   the hook fires; skipped nodes stay in the tree but are invisible to
//!   traversal.
//!
//! Settlement ("last node of chunk") rules:
//! - Nothing is pending once the stream has completed.
//! - A node with a next sibling is settled.
//! - Structural containers (`html`, `head`, `body`) stay pending until the
//!   document's body region has content; an empty body usually means a later
//!   chunk is still coming.
//! - Otherwise a node is pending only while it sits on the right edge (no
//!   ancestor has a next sibling). On the edge, a `first_child` candidate
//!   waits until it leaves the edge; a `next_sibling` candidate settles as
//!   soon as it has any child.

use crate::shared::{DocState, SharedDocument, StreamError};
use dom::traverse::{find_node_by_id, find_path, node_at_path};
use dom::{Attribute, Id, Node, NodeKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeRef(Id);

/// Read-only view of a streaming-tree node, detached from the shared lock.
#[derive(Clone, Debug)]
pub struct NodeSummary {
    pub id: Id,
    pub kind: NodeKind,
    pub name: Option<String>,
    pub value: Option<String>,
    pub attributes: Vec<Attribute>,
    pub key: Option<String>,
}

pub type NextNodeHook = Box<dyn FnMut(&NodeSummary)>;
pub type IgnorePredicate = Box<dyn Fn(&NodeSummary) -> bool>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Axis {
    FirstChild,
    NextSibling,
}

const STRUCTURAL_CONTAINERS: [&str; 3] = ["html", "head", "body"];

pub struct StreamWalker {
    doc: SharedDocument,
    on_next_node: Option<NextNodeHook>,
    should_ignore: Option<IgnorePredicate>,
}

impl StreamWalker {
    pub fn new(doc: SharedDocument) -> Self {
        Self::with_hooks(doc, None, None)
    }

    pub fn with_hooks(
        doc: SharedDocument,
        on_next_node: Option<NextNodeHook>,
        should_ignore: Option<IgnorePredicate>,
    ) -> Self {
        Self {
            doc,
            on_next_node,
            should_ignore,
        }
    }

    /// The traversal root. Document mode blocks until a root element exists
    /// and has settled; fragment mode hands back the fragment itself (its
    /// children are awaited lazily by `first_child`).
    pub fn root(&mut self) -> Result<NodeRef, StreamError> {
        let mut state = self.doc.lock();
        if state.root.kind() == NodeKind::Fragment {
            return Ok(NodeRef(state.root.id()));
        }
        loop {
            if let Some(message) = &state.failed {
                return Err(StreamError::Failed(message.clone()));
            }
            let candidate = state
                .root
                .children()
                .unwrap_or_default()
                .iter()
                .find(|child| child.kind() == NodeKind::Element)
                .map(Node::id);
            match candidate {
                Some(id) if !is_last_node_of_chunk(&state, id, false) => {
                    return Ok(NodeRef(id));
                }
                None if state.done => return Err(StreamError::MissingRoot),
                _ => {}
            }
            state = self.doc.wait(state);
        }
    }

    pub fn first_child(&mut self, node: NodeRef) -> Result<Option<NodeRef>, StreamError> {
        self.advance(node, Axis::FirstChild)
    }

    pub fn next_sibling(&mut self, node: NodeRef) -> Result<Option<NodeRef>, StreamError> {
        self.advance(node, Axis::NextSibling)
    }

    pub fn summary(&self, node: NodeRef) -> NodeSummary {
        let state = self.doc.lock();
        summarize(&state, node.0)
    }

    /// Deep clone of the subtree as currently materialized. Content that
    /// streams in later is picked up by a follow-up update pass, not here.
    pub fn clone_subtree(&self, node: NodeRef) -> Node {
        let state = self.doc.lock();
        find_node_by_id(&state.root, node.0)
            .expect("walker node ref resolves")
            .clone()
    }

    fn advance(&mut self, from: NodeRef, axis: Axis) -> Result<Option<NodeRef>, StreamError> {
        let state = self.doc.lock();
        let (mut state, mut candidate) = wait_resolve(&self.doc, state, from.0, axis)?;

        if let Some(ignore) = &self.should_ignore {
            while let Some(id) = candidate {
                if !ignore(&summarize(&state, id)) {
                    break;
                }
                let (next_state, next) = wait_resolve(&self.doc, state, id, axis)?;
                state = next_state;
                candidate = next;
            }
        }
        let Some(id) = candidate else {
            return Ok(None);
        };

        if let Some(hook) = &mut self.on_next_node {
            hook(&summarize(&state, id));
        }

        let wait_children = axis == Axis::FirstChild;
        loop {
            if let Some(message) = &state.failed {
                return Err(StreamError::Failed(message.clone()));
            }
            if !is_last_node_of_chunk(&state, id, wait_children) {
                return Ok(Some(NodeRef(id)));
            }
            log::trace!(target: "stream.walker", "suspend on {id:?} ({axis:?})");
            state = self.doc.wait(state);
        }
    }
}

/// Resolve the axis endpoint, blocking while it is still unproven: a missing
/// first child of a node that may yet receive children, or a missing sibling
/// of a node that may yet receive siblings. `None` comes back only once the
/// stream can no longer extend that axis.
fn wait_resolve<'a>(
    doc: &SharedDocument,
    mut state: std::sync::MutexGuard<'a, DocState>,
    from: Id,
    axis: Axis,
) -> Result<(std::sync::MutexGuard<'a, DocState>, Option<Id>), StreamError> {
    loop {
        if let Some(message) = &state.failed {
            return Err(StreamError::Failed(message.clone()));
        }
        if let Some(id) = resolve_axis(&state, from, axis) {
            return Ok((state, Some(id)));
        }
        if !axis_may_extend(&state, from, axis) {
            return Ok((state, None));
        }
        log::trace!(target: "stream.walker", "await data after {from:?} ({axis:?})");
        state = doc.wait(state);
    }
}

/// Could the stream still extend this axis? A node can gain children while
/// it sits open on the right edge; it can gain siblings under the same
/// condition. Root containers gain children until the stream completes and
/// never gain siblings.
fn axis_may_extend(state: &DocState, id: Id, axis: Axis) -> bool {
    if !state.stream_in_progress() {
        return false;
    }
    let Some(path) = find_path(&state.root, id) else {
        return false;
    };
    if path.is_empty() {
        return axis == Axis::FirstChild;
    }
    on_right_edge(state, &path)
}

fn on_right_edge(state: &DocState, path: &[usize]) -> bool {
    (1..=path.len()).all(|depth| !has_next_sibling(state, &path[..depth]))
}

fn resolve_axis(state: &DocState, id: Id, axis: Axis) -> Option<Id> {
    match axis {
        Axis::FirstChild => find_node_by_id(&state.root, id)?
            .children()?
            .first()
            .map(Node::id),
        Axis::NextSibling => {
            let path = find_path(&state.root, id)?;
            let (&last, parent_path) = path.split_last()?;
            let parent = node_at_path(&state.root, parent_path)?;
            parent.children()?.get(last + 1).map(Node::id)
        }
    }
}

fn summarize(state: &DocState, id: Id) -> NodeSummary {
    let node = find_node_by_id(&state.root, id).expect("walker node ref resolves");
    NodeSummary {
        id,
        kind: node.kind(),
        name: node.name().map(str::to_string),
        value: node.value().map(str::to_string),
        attributes: node.attributes().map(<[Attribute]>::to_vec).unwrap_or_default(),
        key: node.key().map(str::to_string),
    }
}

fn is_last_node_of_chunk(state: &DocState, id: Id, wait_children: bool) -> bool {
    if !state.stream_in_progress() {
        return false;
    }
    let Some(path) = find_path(&state.root, id) else {
        return false;
    };
    if path.is_empty() {
        // The root container itself; `root()` has its own wait.
        return false;
    }
    if has_next_sibling(state, &path) {
        return false;
    }

    let node = node_at_path(&state.root, &path).expect("path just resolved");
    if let Some(name) = node.name()
        && STRUCTURAL_CONTAINERS
            .iter()
            .any(|container| name.eq_ignore_ascii_case(container))
    {
        return !body_region_populated(&state.root);
    }

    for depth in 1..path.len() {
        if has_next_sibling(state, &path[..depth]) {
            return false;
        }
    }

    if wait_children {
        true
    } else {
        node.children().is_none_or(|children| children.is_empty())
    }
}

fn has_next_sibling(state: &DocState, path: &[usize]) -> bool {
    let (&last, parent_path) = path.split_last().expect("path addresses a non-root node");
    node_at_path(&state.root, parent_path)
        .and_then(Node::children)
        .is_some_and(|children| children.len() > last + 1)
}

fn body_region_populated(root: &Node) -> bool {
    fn find_body(node: &Node) -> Option<&Node> {
        if node.name().is_some_and(|n| n.eq_ignore_ascii_case("body")) {
            return Some(node);
        }
        for child in node.children()? {
            if let Some(found) = find_body(child) {
                return Some(found);
            }
        }
        None
    }
    find_body(root).is_some_and(|body| body.children().is_some_and(|c| !c.is_empty()))
}
