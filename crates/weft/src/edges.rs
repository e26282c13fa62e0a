//! Data-flow edges between adjacent stages.
//!
//! In a scope with stages `[c0, c1, c2]` every manifold waiting for input in
//! `c0` receives the outputs of `c1`, and so on pairwise. Adjacency is the only
//! wiring convention; acyclicity follows from the scope structure.

use log::{debug, trace};

use crate::error::LinkError;
use crate::tree::{Tag, Tree, union};

/// Append successor outputs to the inputs of every scope's stages.
/// Returns the number of edges added.
pub fn link_inputs(tree: &mut Tree) -> Result<usize, LinkError> {
    let Tree { manifolds, top } = tree;
    let scopes = union(top.find_recursive(Tag::Path), top.find_recursive(Tag::Group));

    let mut edges = 0;
    for scope in scopes {
        let composons = scope.node.composons().unwrap_or_default();
        for pair in composons.windows(2) {
            let [current, next] = pair else {
                continue;
            };
            let outputs = next.composon_outputs();
            if outputs.is_empty() {
                continue;
            }
            for input in current.composon_inputs() {
                let manifold = manifolds
                    .get_mut(input)
                    .ok_or(LinkError::DanglingManifold(input))?;
                trace!("{input} <- {outputs:?}");
                manifold.inputs.extend_from_slice(&outputs);
                edges += outputs.len();
            }
        }
    }

    debug!("linked {edges} input edges");
    Ok(edges)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{Entry, ManifoldId, Node, TreeBuilder};

    fn id(entry: &Entry) -> ManifoldId {
        entry.manifold_id().unwrap()
    }

    #[test]
    fn only_adjacent_stages_link() {
        let mut b = TreeBuilder::new();
        let m = b.manifold("m");
        let o1 = b.manifold("o1");
        let o2 = b.manifold("o2");
        let c = b.manifold("c");
        let (m_id, o1_id, o2_id, c_id) = (id(&m), id(&o1), id(&o2), id(&c));
        let main = b.path("main", vec![vec![m], vec![o1, o2], vec![c]]);
        let mut tree = b.build(vec![main]);

        let edges = link_inputs(&mut tree).unwrap();

        assert_eq!(edges, 4);
        assert_eq!(tree.manifold(m_id).unwrap().inputs, [o1_id, o2_id]);
        assert_eq!(tree.manifold(o1_id).unwrap().inputs, [c_id]);
        assert_eq!(tree.manifold(o2_id).unwrap().inputs, [c_id]);
        assert!(tree.manifold(c_id).unwrap().inputs.is_empty());
    }

    #[test]
    fn stage_without_outputs_adds_nothing() {
        let mut b = TreeBuilder::new();
        let m = b.manifold("m");
        let m_id = id(&m);
        let dangling_ref = b.reference("elsewhere");
        let main = b.path("main", vec![vec![m], vec![dangling_ref]]);
        let mut tree = b.build(vec![main]);

        assert_eq!(link_inputs(&mut tree).unwrap(), 0);
        assert!(tree.manifold(m_id).unwrap().inputs.is_empty());
    }

    #[test]
    fn nested_groups_link_inside_and_across() {
        // main: f . (g . h) . k
        let mut b = TreeBuilder::new();
        let f = b.manifold("f");
        let g = b.manifold("g");
        let h = b.manifold("h");
        let k = b.manifold("k");
        let (f_id, g_id, h_id, k_id) = (id(&f), id(&g), id(&h), id(&k));
        let nested = b.group(vec![vec![g], vec![h]]);
        let main = b.path("main", vec![vec![f], vec![nested], vec![k]]);
        let mut tree = b.build(vec![main]);

        link_inputs(&mut tree).unwrap();

        assert_eq!(tree.manifold(f_id).unwrap().inputs, [g_id]);
        assert_eq!(tree.manifold(g_id).unwrap().inputs, [h_id]);
        assert_eq!(tree.manifold(h_id).unwrap().inputs, [k_id]);
    }

    #[test]
    fn relinking_appends_instead_of_replacing() {
        let mut b = TreeBuilder::new();
        let m = b.manifold("m");
        let z = b.manifold("z");
        let (m_id, z_id) = (id(&m), id(&z));
        let inner = b.path("inner", vec![vec![m]]);
        let main = b.path("main", vec![vec![inner], vec![z]]);
        let mut tree = b.build(vec![main]);

        link_inputs(&mut tree).unwrap();
        assert_eq!(tree.manifold(m_id).unwrap().inputs, [z_id]);

        link_inputs(&mut tree).unwrap();
        assert_eq!(tree.manifold(m_id).unwrap().inputs, [z_id, z_id]);
    }

    #[test]
    fn dangling_input_handle_is_fatal() {
        let mut b = TreeBuilder::new();
        let ghost = Entry::new(Node::Manifold {
            label: "ghost".into(),
            id: ManifoldId(9),
        });
        let o = b.manifold("o");
        let main = b.path("main", vec![vec![ghost], vec![o]]);
        let mut tree = b.build(vec![main]);

        assert_eq!(
            link_inputs(&mut tree).unwrap_err(),
            LinkError::DanglingManifold(ManifoldId(9))
        );
    }
}
