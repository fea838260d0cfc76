//! Attribute synchronization: make one node's attribute list equal another's.
//!
//! Identity is namespace + local name. Removals run first (in live order),
//! then adds/updates in new-list order, so the emitted records and the
//! resulting list order are deterministic.

use crate::mutation::Mutation;
use dom::{AttrName, Attribute, Id};

/// The sticky attribute is exempt from being re-added or updated once it is
/// already present on the live node, so a side-effectful registration tied
/// to it cannot run twice. Its first application still goes through.
pub fn sync_attributes(
    live: &mut Vec<Attribute>,
    new: &[Attribute],
    sticky: Option<&AttrName>,
    node: Id,
    batch: &mut Vec<Mutation>,
) {
    live.retain(|(name, _)| {
        let kept = new.iter().any(|(new_name, _)| new_name == name);
        if !kept {
            batch.push(Mutation::RemoveAttribute {
                node,
                name: name.clone(),
            });
        }
        kept
    });

    for (name, value) in new {
        let position = live.iter().position(|(live_name, _)| live_name == name);
        if sticky == Some(name) && position.is_some() {
            continue;
        }
        match position {
            Some(index) => {
                if live[index].1 != *value {
                    live[index].1 = value.clone();
                    batch.push(Mutation::SetAttribute {
                        node,
                        name: name.clone(),
                        value: value.clone(),
                    });
                }
            }
            None => {
                live.push((name.clone(), value.clone()));
                batch.push(Mutation::SetAttribute {
                    node,
                    name: name.clone(),
                    value: value.clone(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(list: &[(&str, &str)]) -> Vec<Attribute> {
        list.iter()
            .map(|(k, v)| (AttrName::parse(k), Some(v.to_string())))
            .collect()
    }

    #[test]
    fn removes_adds_and_updates() {
        let mut live = attrs(&[("a", "1"), ("b", "2")]);
        let new = attrs(&[("b", "2"), ("c", "3")]);
        let mut batch = Vec::new();
        sync_attributes(&mut live, &new, None, Id(7), &mut batch);
        assert_eq!(live, new);
        assert_eq!(
            batch,
            vec![
                Mutation::RemoveAttribute {
                    node: Id(7),
                    name: AttrName::local("a"),
                },
                Mutation::SetAttribute {
                    node: Id(7),
                    name: AttrName::local("c"),
                    value: Some("3".to_string()),
                },
            ]
        );
    }

    #[test]
    fn removal_only_diff_emits_exactly_one_record() {
        let mut live = attrs(&[("a", "1"), ("b", "2")]);
        let new = attrs(&[("b", "2")]);
        let mut batch = Vec::new();
        sync_attributes(&mut live, &new, None, Id(1), &mut batch);
        assert_eq!(batch.len(), 1);
        assert!(matches!(
            &batch[0],
            Mutation::RemoveAttribute { name, .. } if name.is_local("a")
        ));
    }

    #[test]
    fn identity_is_namespace_aware() {
        let mut live = attrs(&[("href", "a")]);
        let new = attrs(&[("xlink:href", "a")]);
        let mut batch = Vec::new();
        sync_attributes(&mut live, &new, None, Id(1), &mut batch);
        assert_eq!(live, new);
        assert_eq!(batch.len(), 2, "plain href removed, xlink:href added");
    }

    #[test]
    fn sticky_attribute_is_never_updated_once_present() {
        let sticky = AttrName::local("data-action");
        let mut live = attrs(&[("data-action", "a1")]);
        let new = attrs(&[("data-action", "a2")]);
        let mut batch = Vec::new();
        sync_attributes(&mut live, &new, Some(&sticky), Id(1), &mut batch);
        assert!(batch.is_empty());
        assert_eq!(live[0].1.as_deref(), Some("a1"));
    }

    #[test]
    fn sticky_attribute_first_application_goes_through() {
        let sticky = AttrName::local("data-action");
        let mut live = Vec::new();
        let new = attrs(&[("data-action", "a1")]);
        let mut batch = Vec::new();
        sync_attributes(&mut live, &new, Some(&sticky), Id(1), &mut batch);
        assert_eq!(live, new);
        assert_eq!(batch.len(), 1);
    }

    #[test]
    fn valueless_attributes_round_trip() {
        let mut live = vec![(AttrName::local("checked"), None)];
        let new = vec![(AttrName::local("checked"), None)];
        let mut batch = Vec::new();
        sync_attributes(&mut live, &new, None, Id(1), &mut batch);
        assert!(batch.is_empty());
    }
}
