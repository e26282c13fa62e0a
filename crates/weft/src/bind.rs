//! Selector-bound couplets.
//!
//! A couplet's selection is resolved against the whole tree and its payload
//! is written into every manifold it reaches. Binding overwrites: when two
//! couplets reach the same manifold the later one wins. Group references
//! resolve the other way round (first declaration wins); both are kept as
//! observable behavior.

use indexmap::IndexSet;
use log::{debug, trace};

use crate::error::LinkError;
use crate::tree::{Couplet, ManifoldId, Manifold, ModifierKind, Node, Selection, Table, Tag, Tree};

/// Manifolds reached by `selection`, in first-seen order.
///
/// A key reaches a manifold whose label equals its last component, or every
/// manifold under a path of that name.
pub fn select_manifolds(top: &Table, selection: &Selection) -> Vec<ManifoldId> {
    let mut selected = IndexSet::new();
    for key in selection.keys() {
        top.scoped_walk(key.components(), &mut |entry, rest| {
            let [last] = rest else {
                return;
            };
            match &entry.node {
                Node::Manifold { label, id } if label == last => {
                    selected.insert(*id);
                }
                Node::Path { name, composons } if name == last => {
                    for composon in composons {
                        selected.extend(composon.manifold_ids());
                    }
                }
                _ => {}
            }
        });
    }
    selected.into_iter().collect()
}

/// Bind every couplet of `kind` to the manifolds its selection reaches.
/// Returns the number of manifold bindings made.
pub fn bind_couplets(tree: &mut Tree, kind: ModifierKind) -> Result<usize, LinkError> {
    let apply: fn(&mut Manifold, &Couplet) = match kind {
        ModifierKind::Effect => bind_effect,
        ModifierKind::Cache
        | ModifierKind::Check
        | ModifierKind::Open
        | ModifierKind::Pack
        | ModifierKind::Pass
        | ModifierKind::Fail
        | ModifierKind::Doc => return Err(LinkError::UnsupportedCoupletKind(kind)),
    };

    let Tree { manifolds, top } = tree;
    let couplets = top
        .find_recursive(Tag::Couplet)
        .into_iter()
        .filter_map(|entry| match &entry.node {
            Node::Couplet(couplet) if couplet.kind == kind => Some(couplet),
            _ => None,
        });

    let mut bindings = 0;
    for couplet in couplets {
        let targets = select_manifolds(top, &couplet.selection);
        if targets.is_empty() {
            trace!("{kind} selection '{}' reached no manifold", couplet.selection);
            continue;
        }
        for id in targets {
            let manifold = manifolds
                .get_mut(id)
                .ok_or(LinkError::DanglingManifold(id))?;
            apply(manifold, couplet);
            bindings += 1;
        }
    }

    debug!("bound {bindings} {kind} couplets");
    Ok(bindings)
}

fn bind_effect(manifold: &mut Manifold, couplet: &Couplet) {
    manifold.bound_effect = Some(couplet.payload.clone());
}

/// Remove the couplets of `kind`, bound or not, from the tree.
pub fn erase_couplets(tree: &mut Tree, kind: ModifierKind) -> usize {
    tree.top
        .erase(&|node| matches!(node, Node::Couplet(couplet) if couplet.kind == kind))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{Entry, Payload, TreeBuilder};

    fn id(entry: &Entry) -> ManifoldId {
        entry.manifold_id().unwrap()
    }

    #[test]
    fn selection_reaches_manifolds_and_whole_paths() {
        let mut b = TreeBuilder::new();
        let f = b.manifold("f");
        let g = b.manifold("g");
        let h = b.manifold("h");
        let (f_id, g_id, h_id) = (id(&f), id(&g), id(&h));
        let sub = b.path("sub", vec![vec![g], vec![h]]);
        let main = b.path("main", vec![vec![f], vec![sub]]);
        let tree = b.build(vec![main]);

        assert_eq!(select_manifolds(&tree.top, &Selection::parse("main/f")), [f_id]);
        assert_eq!(select_manifolds(&tree.top, &Selection::parse("main/sub")), [g_id, h_id]);
        assert_eq!(
            select_manifolds(&tree.top, &Selection::parse("main/sub/h, main/f, main/sub")),
            [h_id, f_id, g_id]
        );
        assert!(select_manifolds(&tree.top, &Selection::parse("f")).is_empty());
        assert!(select_manifolds(&tree.top, &Selection::parse("main/nothing")).is_empty());
    }

    #[test]
    fn last_binding_wins() {
        let mut b = TreeBuilder::new();
        let m = b.manifold("m");
        let m_id = id(&m);
        let main = b.path("main", vec![vec![m]]);
        let first = b.couplet(ModifierKind::Effect, "main/m", Payload::function("log"));
        let second = b.couplet(ModifierKind::Effect, "main", Payload::function("notify"));
        let listed = b.modifier(ModifierKind::Effect, "main/m", Payload::function("trace"));
        let mut tree = b.build(vec![main, first, second, listed]);
        tree.manifolds
            .get_mut(m_id)
            .unwrap()
            .effect
            .push(Payload::function("trace"));

        let bindings = bind_couplets(&mut tree, ModifierKind::Effect).unwrap();

        let manifold = tree.manifold(m_id).unwrap();
        assert_eq!(bindings, 2);
        assert_eq!(manifold.bound_effect, Some(Payload::function("notify")));
        assert_eq!(manifold.effect, [Payload::function("trace")]);
    }

    #[test]
    fn empty_selection_binds_nothing() {
        let mut b = TreeBuilder::new();
        let m = b.manifold("m");
        let m_id = id(&m);
        let main = b.path("main", vec![vec![m]]);
        let couplet = b.couplet(ModifierKind::Effect, "other/m", Payload::function("log"));
        let mut tree = b.build(vec![main, couplet]);

        assert_eq!(bind_couplets(&mut tree, ModifierKind::Effect).unwrap(), 0);
        assert_eq!(tree.manifold(m_id).unwrap().bound_effect, None);
    }

    #[test]
    fn couplets_nested_in_paths_are_found() {
        let mut b = TreeBuilder::new();
        let m = b.manifold("m");
        let m_id = id(&m);
        let couplet = b.couplet(ModifierKind::Effect, "main/m", Payload::function("log"));
        let main = b.path("main", vec![vec![m, couplet]]);
        let mut tree = b.build(vec![main]);

        bind_couplets(&mut tree, ModifierKind::Effect).unwrap();
        assert_eq!(
            tree.manifold(m_id).unwrap().bound_effect,
            Some(Payload::function("log"))
        );

        assert_eq!(erase_couplets(&mut tree, ModifierKind::Effect), 1);
        assert!(tree.top.find_recursive(Tag::Couplet).is_empty());
    }

    #[test]
    fn unsupported_kinds_abort() {
        let mut tree = TreeBuilder::new().build(vec![]);
        for kind in ModifierKind::ALL {
            let result = bind_couplets(&mut tree, kind);
            if kind == ModifierKind::Effect {
                assert_eq!(result, Ok(0));
            } else {
                assert_eq!(result, Err(LinkError::UnsupportedCoupletKind(kind)));
            }
        }
    }
}
