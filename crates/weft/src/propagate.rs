//! Path-scoped modifier propagation.
//!
//! Every manifold first gets a function name (its declaring label unless one
//! was given upstream). Then each modifier walks down the tree along its
//! scoping key and appends its payload to the matching list of every manifold
//! whose label is the key's last component. Lists are append-only and keep
//! declaration order.

use log::debug;

use crate::error::LinkError;
use crate::tree::{Entry, ManifoldId, Node, Tree};

/// Default naming followed by propagation. Returns the number of payloads appended.
pub fn link_modifiers(tree: &mut Tree) -> Result<usize, LinkError> {
    assign_default_functions(tree)?;
    propagate_modifiers(tree)
}

/// Name every manifold without a function after its declaring label.
/// Returns the number of manifolds named.
pub fn assign_default_functions(tree: &mut Tree) -> Result<usize, LinkError> {
    let Tree { manifolds, top } = tree;
    let mut named = 0;
    for (label, id) in top.declarations() {
        let manifold = manifolds
            .get_mut(id)
            .ok_or(LinkError::DanglingManifold(id))?;
        if manifold.function.is_none() {
            manifold.function = Some(label.to_owned());
            named += 1;
        }
    }
    debug!("assigned {named} default function names");
    Ok(named)
}

pub fn propagate_modifiers(tree: &mut Tree) -> Result<usize, LinkError> {
    let Tree { manifolds, top } = tree;
    let modifiers = top
        .find_recursive_by(|entry| entry.node.tag().modifier_kind().is_some())
        .into_iter()
        .filter_map(|entry| match &entry.node {
            Node::Modifier(modifier) => Some(modifier),
            _ => None,
        });

    let mut appended = 0;
    for modifier in modifiers {
        let mut targets = Vec::new();
        top.scoped_walk(modifier.key.components(), &mut |entry, rest| {
            if let Some(id) = basename_match(entry, rest) {
                targets.push(id);
            }
        });
        for id in targets {
            let manifold = manifolds
                .get_mut(id)
                .ok_or(LinkError::DanglingManifold(id))?;
            manifold
                .modifiers_mut(modifier.kind)
                .push(modifier.payload.clone());
            appended += 1;
        }
    }

    debug!("propagated {appended} modifier payloads");
    Ok(appended)
}

/// Remove every modifier declaration from the tree.
pub fn erase_modifiers(tree: &mut Tree) -> usize {
    tree.top.erase(&|node| matches!(node, Node::Modifier(_)))
}

// Only a single remaining component can match; longer keys just steer the walk.
fn basename_match(entry: &Entry, rest: &[String]) -> Option<ManifoldId> {
    match (&entry.node, rest) {
        (Node::Manifold { label, id }, [name]) if label == name => Some(*id),
        _ => None,
    }
}
