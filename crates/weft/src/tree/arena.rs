use serde::{Deserialize, Serialize};
use std::fmt;

use super::{ModifierKind, Payload};

/// Handle into the manifold arena.
/// Tree nodes and `inputs` lists hold handles, never the manifolds themselves.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ManifoldId(pub u32);

impl ManifoldId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ManifoldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m{}", self.0)
    }
}

/// A computational unit of the resolved graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Manifold {
    /// Falls back to the declaring label during modifier linking.
    pub function: Option<String>,
    /// Outputs of downstream stages feeding this manifold.
    pub inputs: Vec<ManifoldId>,
    /// Set by selector-bound effect couplets, last binding wins.
    pub bound_effect: Option<Payload>,
    pub effect: Vec<Payload>,
    pub cache: Vec<Payload>,
    pub check: Vec<Payload>,
    pub open: Vec<Payload>,
    pub pack: Vec<Payload>,
    pub pass: Vec<Payload>,
    pub fail: Vec<Payload>,
    pub doc: Vec<Payload>,
}

impl Manifold {
    pub fn with_function(function: impl Into<String>) -> Self {
        Self {
            function: Some(function.into()),
            ..Self::default()
        }
    }

    /// The accumulated list a modifier of `kind` appends to.
    pub fn modifiers(&self, kind: ModifierKind) -> &[Payload] {
        match kind {
            ModifierKind::Effect => &self.effect,
            ModifierKind::Cache => &self.cache,
            ModifierKind::Check => &self.check,
            ModifierKind::Open => &self.open,
            ModifierKind::Pack => &self.pack,
            ModifierKind::Pass => &self.pass,
            ModifierKind::Fail => &self.fail,
            ModifierKind::Doc => &self.doc,
        }
    }

    pub fn modifiers_mut(&mut self, kind: ModifierKind) -> &mut Vec<Payload> {
        match kind {
            ModifierKind::Effect => &mut self.effect,
            ModifierKind::Cache => &mut self.cache,
            ModifierKind::Check => &mut self.check,
            ModifierKind::Open => &mut self.open,
            ModifierKind::Pack => &mut self.pack,
            ModifierKind::Pass => &mut self.pass,
            ModifierKind::Fail => &mut self.fail,
            ModifierKind::Doc => &mut self.doc,
        }
    }
}

/// Arena owning every manifold of a tree.
///
/// Slots are never freed: erased couplets and references never own manifolds,
/// and a manifold dropped from the tree simply stops being reachable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Arena {
    manifolds: Vec<Manifold>,
}

impl Arena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            manifolds: Vec::with_capacity(capacity),
        }
    }

    /// Allocate a new slot holding `manifold`.
    pub fn alloc(&mut self, manifold: Manifold) -> ManifoldId {
        let id = ManifoldId(self.manifolds.len() as u32);
        self.manifolds.push(manifold);
        id
    }

    /// Copy the manifold behind `id` into a fresh slot.
    /// Returns `None` for a dangling handle.
    pub fn duplicate(&mut self, id: ManifoldId) -> Option<ManifoldId> {
        let manifold = self.get(id)?.clone();
        Some(self.alloc(manifold))
    }

    pub fn contains(&self, id: ManifoldId) -> bool {
        id.index() < self.manifolds.len()
    }

    pub fn get(&self, id: ManifoldId) -> Option<&Manifold> {
        self.manifolds.get(id.index())
    }

    pub fn get_mut(&mut self, id: ManifoldId) -> Option<&mut Manifold> {
        self.manifolds.get_mut(id.index())
    }

    /// Get the number of slots in the arena.
    pub fn len(&self) -> usize {
        self.manifolds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.manifolds.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ManifoldId, &Manifold)> {
        self.manifolds
            .iter()
            .enumerate()
            .map(|(index, manifold)| (ManifoldId(index as u32), manifold))
    }
}
