//! Programmatic tree construction.
//! Tests and demos build trees here instead of going through the parser.

use super::{Arena, Couplet, Entry, Manifold, Modifier, ModifierKind, Node, Payload, ScopeKey, Selection, Table, Tree};

/// Builds entries while owning the arena their manifolds are allocated in.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    arena: Arena,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Manifold declared under `label` with no function set.
    pub fn manifold(&mut self, label: &str) -> Entry {
        self.declare(label, Manifold::default())
    }

    pub fn manifold_with_function(&mut self, label: &str, function: &str) -> Entry {
        self.declare(label, Manifold::with_function(function))
    }

    pub fn declare(&mut self, label: &str, manifold: Manifold) -> Entry {
        let id = self.arena.alloc(manifold);
        Entry::new(Node::Manifold {
            label: label.to_owned(),
            id,
        })
    }

    pub fn path(&self, name: &str, composons: Vec<Vec<Entry>>) -> Entry {
        Entry::new(Node::Path {
            name: name.to_owned(),
            composons: composons.into_iter().map(Table::from).collect(),
        })
    }

    pub fn group(&self, composons: Vec<Vec<Entry>>) -> Entry {
        Entry::new(Node::Group {
            composons: composons.into_iter().map(Table::from).collect(),
        })
    }

    pub fn reference(&self, name: &str) -> Entry {
        Entry::new(Node::GroupReference {
            name: name.to_owned(),
        })
    }

    /// Path-scoped modifier, `key` written as `main/sqrt`.
    pub fn modifier(&self, kind: ModifierKind, key: &str, payload: Payload) -> Entry {
        Entry::new(Node::Modifier(Modifier {
            kind,
            key: ScopeKey::parse(key),
            payload,
        }))
    }

    /// Selector-bound couplet, `selection` written as `main/sqrt, main/log`.
    pub fn couplet(&self, kind: ModifierKind, selection: &str, payload: Payload) -> Entry {
        Entry::new(Node::Couplet(Couplet {
            kind,
            selection: Selection::parse(selection),
            payload,
        }))
    }

    pub fn build(self, top: Vec<Entry>) -> Tree {
        Tree::new(Table::from(top), self.arena)
    }
}
