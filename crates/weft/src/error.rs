use thiserror::Error;

use crate::tree::{ManifoldId, ModifierKind};

/// Broken engine invariants. These abort the pipeline immediately.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    #[error("group reference '{name}' could not be resolved: its target holds dangling manifold {manifold}")]
    UnresolvableGroupReference { name: String, manifold: ManifoldId },

    #[error("couplets of kind '{0}' cannot be bound by selection")]
    UnsupportedCoupletKind(ModifierKind),

    #[error("manifold {0} is not in the arena")]
    DanglingManifold(ManifoldId),
}
