use crate::{Node, NodeKind};
use std::fmt;

/// Deterministic DOM serialization and equality rules for streaming tests.
/// Not a public stable format; intended for internal test comparisons.
///
/// Equivalence rules:
/// - Node kinds must match.
/// - Element names must match (case-insensitive, names are canonicalized to
///   lowercase by the builder anyway).
/// - Attribute list order is significant; names and values must match.
/// - Text and comment payloads must match exactly (post entity decode).
/// - Ids can be ignored by options (the default, since the two trees under
///   comparison usually come from different id spaces).
#[derive(Clone, Copy, Debug)]
pub struct DomSnapshotOptions {
    pub ignore_ids: bool,
}

impl Default for DomSnapshotOptions {
    fn default() -> Self {
        Self { ignore_ids: true }
    }
}

#[derive(Debug)]
pub struct DomSnapshot {
    lines: Vec<String>,
}

impl DomSnapshot {
    pub fn new(root: &Node, options: DomSnapshotOptions) -> Self {
        let mut lines = Vec::new();
        walk_snapshot(root, &options, 0, &mut lines);
        Self { lines }
    }

    pub fn render(&self) -> String {
        self.lines.join("\n")
    }
}

#[derive(Debug)]
pub struct DomMismatch {
    path: String,
    detail: String,
    expected_subtree: String,
    actual_subtree: String,
}

impl fmt::Display for DomMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "DOM mismatch at {}: {}", self.path, self.detail)?;
        writeln!(f, "expected subtree:\n{}", self.expected_subtree)?;
        writeln!(f, "actual subtree:\n{}", self.actual_subtree)?;
        Ok(())
    }
}

impl std::error::Error for DomMismatch {}

pub fn assert_dom_eq(expected: &Node, actual: &Node, options: DomSnapshotOptions) {
    if let Err(mismatch) = compare_dom(expected, actual, options) {
        panic!("{mismatch}");
    }
}

pub fn compare_dom(
    expected: &Node,
    actual: &Node,
    options: DomSnapshotOptions,
) -> Result<(), Box<DomMismatch>> {
    let mut path = vec![node_label(expected)];
    compare_nodes(expected, actual, &options, &mut path)
}

fn compare_nodes(
    expected: &Node,
    actual: &Node,
    options: &DomSnapshotOptions,
    path: &mut Vec<String>,
) -> Result<(), Box<DomMismatch>> {
    if expected.kind() != actual.kind() {
        return Err(mismatch(
            expected,
            actual,
            options,
            path,
            format!("kind {:?} != {:?}", expected.kind(), actual.kind()),
        ));
    }

    if !options.ignore_ids && expected.id() != actual.id() {
        return Err(mismatch(
            expected,
            actual,
            options,
            path,
            format!("id {:?} != {:?}", expected.id(), actual.id()),
        ));
    }

    match expected.kind() {
        NodeKind::Element => {
            let expected_name = expected.name().unwrap_or_default();
            let actual_name = actual.name().unwrap_or_default();
            if !expected_name.eq_ignore_ascii_case(actual_name) {
                return Err(mismatch(
                    expected,
                    actual,
                    options,
                    path,
                    format!("element name {expected_name:?} != {actual_name:?}"),
                ));
            }
            let expected_attrs = expected.attributes().unwrap_or_default();
            let actual_attrs = actual.attributes().unwrap_or_default();
            if expected_attrs != actual_attrs {
                return Err(mismatch(
                    expected,
                    actual,
                    options,
                    path,
                    format!("attributes {expected_attrs:?} != {actual_attrs:?}"),
                ));
            }
        }
        NodeKind::Text | NodeKind::Comment => {
            if expected.value() != actual.value() {
                return Err(mismatch(
                    expected,
                    actual,
                    options,
                    path,
                    format!("payload {:?} != {:?}", expected.value(), actual.value()),
                ));
            }
        }
        NodeKind::Document => {
            let (Node::Document { doctype: a, .. }, Node::Document { doctype: b, .. }) =
                (expected, actual)
            else {
                unreachable!("kind already matched");
            };
            if a != b {
                return Err(mismatch(
                    expected,
                    actual,
                    options,
                    path,
                    format!("doctype {a:?} != {b:?}"),
                ));
            }
        }
        NodeKind::Fragment => {}
    }

    let expected_children = expected.children().unwrap_or_default();
    let actual_children = actual.children().unwrap_or_default();
    if expected_children.len() != actual_children.len() {
        return Err(mismatch(
            expected,
            actual,
            options,
            path,
            format!(
                "child count {} != {}",
                expected_children.len(),
                actual_children.len()
            ),
        ));
    }
    for (index, (ec, ac)) in expected_children.iter().zip(actual_children).enumerate() {
        path.push(format!("{}[{index}]", node_label(ec)));
        compare_nodes(ec, ac, options, path)?;
        path.pop();
    }
    Ok(())
}

fn mismatch(
    expected: &Node,
    actual: &Node,
    options: &DomSnapshotOptions,
    path: &[String],
    detail: String,
) -> Box<DomMismatch> {
    Box::new(DomMismatch {
        path: path.join("/"),
        detail,
        expected_subtree: DomSnapshot::new(expected, *options).render(),
        actual_subtree: DomSnapshot::new(actual, *options).render(),
    })
}

fn node_label(node: &Node) -> String {
    match node {
        Node::Document { .. } => "#document".to_string(),
        Node::Fragment { .. } => "#fragment".to_string(),
        Node::Element { name, .. } => format!("<{name}>"),
        Node::Text { .. } => "#text".to_string(),
        Node::Comment { .. } => "#comment".to_string(),
    }
}

fn walk_snapshot(
    node: &Node,
    options: &DomSnapshotOptions,
    depth: usize,
    lines: &mut Vec<String>,
) {
    let indent = "  ".repeat(depth);
    let id = if options.ignore_ids {
        String::new()
    } else {
        format!(" #{}", node.id().0)
    };
    match node {
        Node::Document { doctype, .. } => match doctype {
            Some(doctype) => lines.push(format!("{indent}#document{id} doctype={doctype:?}")),
            None => lines.push(format!("{indent}#document{id}")),
        },
        Node::Fragment { .. } => lines.push(format!("{indent}#fragment{id}")),
        Node::Element {
            name, attributes, ..
        } => {
            let mut line = format!("{indent}<{name}{id}");
            for (attr, value) in attributes {
                match value {
                    Some(value) => line.push_str(&format!(" {attr}={value:?}")),
                    None => line.push_str(&format!(" {attr}")),
                }
            }
            line.push('>');
            lines.push(line);
        }
        Node::Text { text, .. } => lines.push(format!("{indent}#text{id} {text:?}")),
        Node::Comment { text, .. } => lines.push(format!("{indent}#comment{id} {text:?}")),
    }
    if let Some(children) = node.children() {
        for child in children {
            walk_snapshot(child, options, depth + 1, lines);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AttrName, Id};

    fn text(text: &str) -> Node {
        Node::Text {
            id: Id::UNSET,
            text: text.to_string(),
        }
    }

    fn div(attrs: Vec<(&str, &str)>, children: Vec<Node>) -> Node {
        Node::Element {
            id: Id::UNSET,
            name: "div".to_string(),
            attributes: attrs
                .into_iter()
                .map(|(k, v)| (AttrName::parse(k), Some(v.to_string())))
                .collect(),
            children,
        }
    }

    #[test]
    fn equal_trees_compare_equal() {
        let a = div(vec![("class", "x")], vec![text("hi")]);
        let b = div(vec![("class", "x")], vec![text("hi")]);
        assert!(compare_dom(&a, &b, DomSnapshotOptions::default()).is_ok());
    }

    #[test]
    fn mismatch_reports_path_and_detail() {
        let a = div(vec![], vec![div(vec![], vec![text("one")])]);
        let b = div(vec![], vec![div(vec![], vec![text("two")])]);
        let err = compare_dom(&a, &b, DomSnapshotOptions::default())
            .expect_err("payloads differ");
        let rendered = err.to_string();
        assert!(rendered.contains("payload"), "got: {rendered}");
        assert!(rendered.contains("<div>"), "got: {rendered}");
    }

    #[test]
    fn child_count_mismatch_is_detected() {
        let a = div(vec![], vec![text("one")]);
        let b = div(vec![], vec![text("one"), text("two")]);
        assert!(compare_dom(&a, &b, DomSnapshotOptions::default()).is_err());
    }
}
