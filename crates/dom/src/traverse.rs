use crate::{Id, Node, NodeId};

/// Assign ids to every node that still carries `Id::UNSET`, continuing past
/// the highest id already present. Returns the highest id in the tree
/// afterwards, so callers can keep allocating without collisions.
pub fn assign_node_ids(root: &mut Node) -> NodeId {
    fn max_id(node: &Node, max: &mut NodeId) {
        if node.id().0 > *max {
            *max = node.id().0;
        }
        if let Some(children) = node.children() {
            for child in children {
                max_id(child, max);
            }
        }
    }

    fn walk(node: &mut Node, next: &mut NodeId) {
        if node.id() == Id::UNSET {
            *next += 1;
            node.set_id(Id(*next));
        }
        if let Some(children) = node.children_mut() {
            for child in children {
                walk(child, next);
            }
        }
    }

    let mut next = 0;
    max_id(root, &mut next);
    walk(root, &mut next);
    next
}

/// Stamp fresh ids onto an entire subtree, e.g. after cloning a node out of
/// another tree whose id space must not leak into this one.
pub fn renumber_subtree(node: &mut Node, next: &mut NodeId) {
    *next += 1;
    node.set_id(Id(*next));
    if let Some(children) = node.children_mut() {
        for child in children {
            renumber_subtree(child, next);
        }
    }
}

pub fn find_node_by_id(node: &Node, id: Id) -> Option<&Node> {
    if node.id() == id {
        return Some(node);
    }
    if let Some(children) = node.children() {
        for child in children {
            if let Some(found) = find_node_by_id(child, id) {
                return Some(found);
            }
        }
    }
    None
}

/// Child-index path from `root` down to the node with `id`. The empty path
/// addresses the root itself.
pub fn find_path(root: &Node, id: Id) -> Option<Vec<usize>> {
    fn walk(node: &Node, id: Id, path: &mut Vec<usize>) -> bool {
        if node.id() == id {
            return true;
        }
        if let Some(children) = node.children() {
            for (index, child) in children.iter().enumerate() {
                path.push(index);
                if walk(child, id, path) {
                    return true;
                }
                path.pop();
            }
        }
        false
    }

    let mut path = Vec::new();
    walk(root, id, &mut path).then_some(path)
}

pub fn node_at_path<'a>(root: &'a Node, path: &[usize]) -> Option<&'a Node> {
    let mut current = root;
    for &index in path {
        current = current.children()?.get(index)?;
    }
    Some(current)
}
