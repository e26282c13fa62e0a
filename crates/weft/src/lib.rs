//! Resolution and linking of manifold symbol trees.
//!
//! The parser hands over a raw [`Tree`]; [`build_manifolds`] runs the passes
//! in their required order and leaves a fully wired tree for the emitter:
//!
//! 1. group references are expanded into cloned paths,
//! 2. adjacent stages are linked into input edges,
//! 3. selector couplets are bound,
//! 4. manifolds get default function names and path-scoped modifiers.

pub mod bind;
pub mod config;
pub mod diagnostics;
pub mod edges;
pub mod error;
pub mod propagate;
pub mod resolve;
pub mod tree;

pub use bind::{bind_couplets, erase_couplets, select_manifolds};
pub use config::LinkConfig;
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use edges::link_inputs;
pub use error::LinkError;
pub use propagate::{assign_default_functions, erase_modifiers, link_modifiers, propagate_modifiers};
pub use resolve::{Resolution, resolve_group_references};
pub use tree::{
    Arena, Couplet, Entry, Manifold, ManifoldId, Modifier, ModifierKind, Node, Payload, ScopeKey,
    Selection, Span, Table, Tag, Tree, TreeBuilder,
};

use log::info;

/// Run every pass over `tree` in place.
///
/// Recoverable problems come back as diagnostics and the tree is linked as far
/// as possible; whether they reject the tree is up to the caller (see
/// [`Diagnostics::is_fatal`]). A broken engine invariant aborts with
/// [`LinkError`].
pub fn build_manifolds(tree: &mut Tree, config: &LinkConfig) -> Result<Diagnostics, LinkError> {
    let resolution = resolve_group_references(tree)?;
    let edges = link_inputs(tree)?;

    let mut bindings = 0;
    for &kind in &config.bind {
        bindings += bind_couplets(tree, kind)?;
        if config.erase_annotations {
            erase_couplets(tree, kind);
        }
    }

    let payloads = link_modifiers(tree)?;
    if config.erase_annotations {
        erase_modifiers(tree);
    }

    info!(
        "linked {} manifolds: {} references, {edges} edges, {bindings} bindings, {payloads} modifier payloads",
        tree.declared_manifolds().len(),
        resolution.references,
    );
    Ok(resolution.diagnostics)
}
