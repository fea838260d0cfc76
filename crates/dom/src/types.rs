use std::fmt;

pub type NodeId = u32;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Id(pub NodeId);

impl Id {
    /// Reserved sentinel for "not yet assigned".
    pub const UNSET: Id = Id(0);
}

/// Attribute identity is namespace + local name, not the raw qualified string.
///
/// Qualified names split on the first `:` (`xlink:href` -> ns `xlink`,
/// local `href`); a bare name has no namespace. Equality and hashing follow
/// that split, so `href` and `xlink:href` are distinct attributes.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AttrName {
    pub ns: Option<String>,
    pub local: String,
}

impl AttrName {
    pub fn parse(qualified: &str) -> Self {
        match qualified.split_once(':') {
            Some((prefix, local)) if !prefix.is_empty() && !local.is_empty() => Self {
                ns: Some(prefix.to_string()),
                local: local.to_string(),
            },
            _ => Self {
                ns: None,
                local: qualified.to_string(),
            },
        }
    }

    pub fn local(name: &str) -> Self {
        Self {
            ns: None,
            local: name.to_string(),
        }
    }

    pub fn is_local(&self, name: &str) -> bool {
        self.ns.is_none() && self.local == name
    }
}

impl fmt::Display for AttrName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.ns {
            Some(ns) => write!(f, "{ns}:{}", self.local),
            None => f.write_str(&self.local),
        }
    }
}

/// Ordered attribute entry. Order is preserved through every operation so
/// diff output stays deterministic.
pub type Attribute = (AttrName, Option<String>);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Document,
    Fragment,
    Element,
    Text,
    Comment,
}

/// Key derivation order: explicit `key`, then `id`, then the fallback
/// identity attribute. Empty values do not count.
const KEY_ATTRIBUTES: [&str; 3] = ["key", "id", "data-cid"];

#[derive(Clone, Debug)]
pub enum Node {
    Document {
        id: Id,
        doctype: Option<String>,
        children: Vec<Node>,
    },
    Fragment {
        id: Id,
        children: Vec<Node>,
    },
    Element {
        id: Id,
        name: String,
        attributes: Vec<Attribute>,
        children: Vec<Node>,
    },
    Text {
        id: Id,
        text: String,
    },
    Comment {
        id: Id,
        text: String,
    },
}

impl Node {
    pub fn id(&self) -> Id {
        match self {
            Node::Document { id, .. } => *id,
            Node::Fragment { id, .. } => *id,
            Node::Element { id, .. } => *id,
            Node::Text { id, .. } => *id,
            Node::Comment { id, .. } => *id,
        }
    }

    pub fn set_id(&mut self, new_id: Id) {
        match self {
            Node::Document { id, .. } => *id = new_id,
            Node::Fragment { id, .. } => *id = new_id,
            Node::Element { id, .. } => *id = new_id,
            Node::Text { id, .. } => *id = new_id,
            Node::Comment { id, .. } => *id = new_id,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Document { .. } => NodeKind::Document,
            Node::Fragment { .. } => NodeKind::Fragment,
            Node::Element { .. } => NodeKind::Element,
            Node::Text { .. } => NodeKind::Text,
            Node::Comment { .. } => NodeKind::Comment,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Node::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Scalar payload of text-like nodes.
    pub fn value(&self) -> Option<&str> {
        match self {
            Node::Text { text, .. } | Node::Comment { text, .. } => Some(text),
            _ => None,
        }
    }

    pub fn set_value(&mut self, value: String) {
        match self {
            Node::Text { text, .. } | Node::Comment { text, .. } => *text = value,
            _ => {}
        }
    }

    pub fn children(&self) -> Option<&[Node]> {
        match self {
            Node::Document { children, .. }
            | Node::Fragment { children, .. }
            | Node::Element { children, .. } => Some(children),
            Node::Text { .. } | Node::Comment { .. } => None,
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::Document { children, .. }
            | Node::Fragment { children, .. }
            | Node::Element { children, .. } => Some(children),
            Node::Text { .. } | Node::Comment { .. } => None,
        }
    }

    pub fn attributes(&self) -> Option<&[Attribute]> {
        match self {
            Node::Element { attributes, .. } => Some(attributes),
            _ => None,
        }
    }

    pub fn attribute(&self, name: &AttrName) -> Option<Option<&str>> {
        self.attributes()?
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_deref())
    }

    /// Stable identity used to match elements across old/new trees
    /// independent of position. Only elements carry keys.
    pub fn key(&self) -> Option<&str> {
        let attributes = match self {
            Node::Element { attributes, .. } => attributes,
            _ => return None,
        };
        for name in KEY_ATTRIBUTES {
            let value = attributes
                .iter()
                .find(|(k, _)| k.is_local(name))
                .and_then(|(_, v)| v.as_deref());
            if let Some(value) = value
                && !value.is_empty()
            {
                return Some(value);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(name: &str, attributes: Vec<(&str, &str)>) -> Node {
        Node::Element {
            id: Id::UNSET,
            name: name.to_string(),
            attributes: attributes
                .into_iter()
                .map(|(k, v)| (AttrName::parse(k), Some(v.to_string())))
                .collect(),
            children: Vec::new(),
        }
    }

    #[test]
    fn key_prefers_explicit_key_over_id() {
        let node = element("li", vec![("id", "fallback"), ("key", "primary")]);
        assert_eq!(node.key(), Some("primary"));
    }

    #[test]
    fn key_falls_back_to_id_then_identity_attribute() {
        let node = element("li", vec![("data-cid", "c1"), ("id", "i1")]);
        assert_eq!(node.key(), Some("i1"));
        let node = element("li", vec![("data-cid", "c1")]);
        assert_eq!(node.key(), Some("c1"));
    }

    #[test]
    fn key_ignores_empty_values() {
        let node = element("li", vec![("key", ""), ("id", "i1")]);
        assert_eq!(node.key(), Some("i1"));
        let node = element("li", vec![("key", "")]);
        assert_eq!(node.key(), None);
    }

    #[test]
    fn key_is_element_only() {
        let node = Node::Text {
            id: Id::UNSET,
            text: "hi".to_string(),
        };
        assert_eq!(node.key(), None);
    }

    #[test]
    fn attr_name_splits_namespace_once() {
        let name = AttrName::parse("xlink:href");
        assert_eq!(name.ns.as_deref(), Some("xlink"));
        assert_eq!(name.local, "href");
        assert_ne!(name, AttrName::local("href"));
        assert_eq!(AttrName::parse("href"), AttrName::local("href"));
    }

    #[test]
    fn attr_name_keeps_degenerate_colons_local() {
        assert_eq!(AttrName::parse(":x"), AttrName::local(":x"));
        assert_eq!(AttrName::parse("x:"), AttrName::local("x:"));
    }
}
