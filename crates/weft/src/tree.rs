//! Symbol tree handed over by the parser.
//!
//! A tree is an ordered table of entries. `Path` and `Group` entries own a
//! sequence of composons (one table per stage), every other node is a leaf.
//! Manifolds live in an [`Arena`] and the tree only holds their handles, so
//! read-only searches over the tree can run while the arena is mutated.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use std::ops::Range;

mod arena;
pub use arena::{Arena, Manifold, ManifoldId};

mod builder;
pub use builder::TreeBuilder;

mod dump;

pub type Span = Range<usize>;

/// Leaf value carried by couplets and modifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Payload {
    Text(String),
    Function(String),
}

impl Payload {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn function(name: impl Into<String>) -> Self {
        Self::Function(name.into())
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Text(text) => text,
            Self::Function(name) => name,
        }
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => write!(f, "{text:?}"),
            Self::Function(name) => f.write_str(name),
        }
    }
}

/// The eight annotation kinds that accumulate onto manifolds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifierKind {
    Effect,
    Cache,
    Check,
    Open,
    Pack,
    Pass,
    Fail,
    Doc,
}

impl ModifierKind {
    pub const ALL: [Self; 8] = [
        Self::Effect,
        Self::Cache,
        Self::Check,
        Self::Open,
        Self::Pack,
        Self::Pass,
        Self::Fail,
        Self::Doc,
    ];

    pub fn tag(self) -> Tag {
        match self {
            Self::Effect => Tag::Effect,
            Self::Cache => Tag::Cache,
            Self::Check => Tag::Check,
            Self::Open => Tag::Open,
            Self::Pack => Tag::Pack,
            Self::Pass => Tag::Pass,
            Self::Fail => Tag::Fail,
            Self::Doc => Tag::Doc,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Effect => "effect",
            Self::Cache => "cache",
            Self::Check => "check",
            Self::Open => "open",
            Self::Pack => "pack",
            Self::Pass => "pass",
            Self::Fail => "fail",
            Self::Doc => "doc",
        }
    }
}

impl fmt::Display for ModifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Node kind used by typed searches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Tag {
    Path,
    Group,
    Manifold,
    GroupReference,
    Selection,
    Couplet,
    Effect,
    Cache,
    Check,
    Open,
    Pack,
    Pass,
    Fail,
    Doc,
    Text,
    Function,
}

impl Tag {
    pub fn modifier_kind(self) -> Option<ModifierKind> {
        match self {
            Self::Effect => Some(ModifierKind::Effect),
            Self::Cache => Some(ModifierKind::Cache),
            Self::Check => Some(ModifierKind::Check),
            Self::Open => Some(ModifierKind::Open),
            Self::Pack => Some(ModifierKind::Pack),
            Self::Pass => Some(ModifierKind::Pass),
            Self::Fail => Some(ModifierKind::Fail),
            Self::Doc => Some(ModifierKind::Doc),
            Self::Path
            | Self::Group
            | Self::Manifold
            | Self::GroupReference
            | Self::Selection
            | Self::Couplet
            | Self::Text
            | Self::Function => None,
        }
    }
}

/// Slash separated name path, e.g. `main/sqrt`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopeKey(SmallVec<[String; 4]>);

impl ScopeKey {
    pub fn new<S: Into<String>>(components: impl IntoIterator<Item = S>) -> Self {
        Self(components.into_iter().map(Into::into).collect())
    }

    pub fn parse(text: &str) -> Self {
        Self::new(text.split('/').map(str::trim).filter(|part| !part.is_empty()))
    }

    pub fn components(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ScopeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("/"))
    }
}

/// Union of scope keys targeting manifolds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Selection(pub Vec<ScopeKey>);

impl Selection {
    pub fn parse(text: &str) -> Self {
        Self(
            text.split(',')
                .map(ScopeKey::parse)
                .filter(|key| !key.is_empty())
                .collect(),
        )
    }

    pub fn keys(&self) -> &[ScopeKey] {
        &self.0
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, key) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key}")?;
        }
        Ok(())
    }
}

/// Annotation bound to every manifold its selection reaches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Couplet {
    pub kind: ModifierKind,
    pub selection: Selection,
    pub payload: Payload,
}

/// Annotation appended to manifolds along its scoping key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifier {
    pub kind: ModifierKind,
    pub key: ScopeKey,
    pub payload: Payload,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    Path { name: String, composons: Vec<Table> },
    Group { composons: Vec<Table> },
    Manifold { label: String, id: ManifoldId },
    GroupReference { name: String },
    Selection(Selection),
    Couplet(Couplet),
    Modifier(Modifier),
    Payload(Payload),
}

impl Node {
    pub fn tag(&self) -> Tag {
        match self {
            Self::Path { .. } => Tag::Path,
            Self::Group { .. } => Tag::Group,
            Self::Manifold { .. } => Tag::Manifold,
            Self::GroupReference { .. } => Tag::GroupReference,
            Self::Selection(_) => Tag::Selection,
            Self::Couplet(_) => Tag::Couplet,
            Self::Modifier(modifier) => modifier.kind.tag(),
            Self::Payload(Payload::Text(_)) => Tag::Text,
            Self::Payload(Payload::Function(_)) => Tag::Function,
        }
    }

    /// Name used by top-level lookups: path name, manifold label or referenced name.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Path { name, .. } | Self::GroupReference { name } => Some(name),
            Self::Manifold { label, .. } => Some(label),
            _ => None,
        }
    }

    pub fn composons(&self) -> Option<&[Table]> {
        match self {
            Self::Path { composons, .. } | Self::Group { composons } => Some(composons),
            _ => None,
        }
    }

    fn deep_clone(&self, arena: &mut Arena) -> Result<Self, ManifoldId> {
        Ok(match self {
            Self::Path { name, composons } => Self::Path {
                name: name.clone(),
                composons: clone_composons(composons, arena)?,
            },
            Self::Group { composons } => Self::Group {
                composons: clone_composons(composons, arena)?,
            },
            Self::Manifold { label, id } => Self::Manifold {
                label: label.clone(),
                id: arena.duplicate(*id).ok_or(*id)?,
            },
            leaf => leaf.clone(),
        })
    }
}

fn clone_composons(composons: &[Table], arena: &mut Arena) -> Result<Vec<Table>, ManifoldId> {
    composons
        .iter()
        .map(|composon| composon.deep_clone(arena))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span: Option<Span>,
    pub node: Node,
}

impl Entry {
    pub fn new(node: Node) -> Self {
        Self { span: None, node }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Clone this entry with every manifold copied into a fresh arena slot.
    /// Fails with the first dangling manifold handle found.
    pub fn deep_clone(&self, arena: &mut Arena) -> Result<Self, ManifoldId> {
        Ok(Self {
            span: self.span.clone(),
            node: self.node.deep_clone(arena)?,
        })
    }

    pub fn manifold_id(&self) -> Option<ManifoldId> {
        match self.node {
            Node::Manifold { id, .. } => Some(id),
            _ => None,
        }
    }
}

/// Ordered sequence of entries. Insertion order decides ties.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Table(Vec<Entry>);

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: Entry) {
        self.0.push(entry);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.0.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Entry> {
        self.0.iter_mut()
    }

    /// Entries of the given tag at any depth, in pre-order.
    pub fn find_recursive(&self, tag: Tag) -> Vec<&Entry> {
        self.find_recursive_by(|entry| entry.node.tag() == tag)
    }

    pub fn find_recursive_by(&self, predicate: impl Fn(&Entry) -> bool) -> Vec<&Entry> {
        let mut found = Vec::new();
        self.collect_recursive(&predicate, &mut found);
        found
    }

    fn collect_recursive<'a>(&'a self, predicate: &dyn Fn(&Entry) -> bool, found: &mut Vec<&'a Entry>) {
        for entry in &self.0 {
            if predicate(entry) {
                found.push(entry);
            }
            for composon in entry.node.composons().unwrap_or_default() {
                composon.collect_recursive(predicate, found);
            }
        }
    }

    /// Entries of the given tag and name at this level only.
    pub fn find_named(&self, name: &str, tag: Tag) -> Vec<&Entry> {
        self.0
            .iter()
            .filter(|entry| entry.node.tag() == tag && entry.node.name() == Some(name))
            .collect()
    }

    /// Handles of every manifold at any depth, in pre-order.
    pub fn manifold_ids(&self) -> Vec<ManifoldId> {
        self.find_recursive(Tag::Manifold)
            .into_iter()
            .filter_map(Entry::manifold_id)
            .collect()
    }

    /// Every manifold at any depth with the label it was declared under.
    pub fn declarations(&self) -> Vec<(&str, ManifoldId)> {
        self.find_recursive(Tag::Manifold)
            .into_iter()
            .filter_map(|entry| match &entry.node {
                Node::Manifold { label, id } => Some((label.as_str(), *id)),
                _ => None,
            })
            .collect()
    }

    /// Remove matching entries at any depth. Returns how many were removed.
    pub fn erase(&mut self, predicate: &impl Fn(&Node) -> bool) -> usize {
        let before = self.0.len();
        self.0.retain(|entry| !predicate(&entry.node));
        let mut erased = before - self.0.len();
        for entry in &mut self.0 {
            if let Node::Path { composons, .. } | Node::Group { composons } = &mut entry.node {
                for composon in composons {
                    erased += composon.erase(predicate);
                }
            }
        }
        erased
    }

    pub fn deep_clone(&self, arena: &mut Arena) -> Result<Self, ManifoldId> {
        self.0
            .iter()
            .map(|entry| entry.deep_clone(arena))
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    /// Walk the entries lying along `key`, calling `visit` with every reached
    /// entry and the part of the key still unmatched at its level.
    ///
    /// Groups are anonymous and always entered with the same key. A path is
    /// entered only while more than one component remains and the first one
    /// names it; everything else is pruned.
    pub fn scoped_walk<'a>(&'a self, key: &[String], visit: &mut dyn FnMut(&'a Entry, &[String])) {
        for entry in &self.0 {
            visit(entry, key);
            match &entry.node {
                Node::Group { composons } => {
                    for composon in composons {
                        composon.scoped_walk(key, visit);
                    }
                }
                Node::Path { name, composons } if key.len() > 1 && key[0] == *name => {
                    for composon in composons {
                        composon.scoped_walk(&key[1..], visit);
                    }
                }
                _ => {}
            }
        }
    }

    /// Manifolds this stage exposes to the stage before it.
    /// A nested scope exposes the outputs of its first stage.
    pub fn composon_outputs(&self) -> Vec<ManifoldId> {
        let mut outputs = Vec::new();
        for entry in &self.0 {
            match &entry.node {
                Node::Manifold { id, .. } => outputs.push(*id),
                Node::Path { composons, .. } | Node::Group { composons } => {
                    if let Some(first) = composons.first() {
                        outputs.extend(first.composon_outputs());
                    }
                }
                _ => {}
            }
        }
        outputs
    }

    /// Manifolds of this stage waiting for inputs.
    /// A nested scope waits through the inputs of its last stage.
    pub fn composon_inputs(&self) -> Vec<ManifoldId> {
        let mut inputs = Vec::new();
        for entry in &self.0 {
            match &entry.node {
                Node::Manifold { id, .. } => inputs.push(*id),
                Node::Path { composons, .. } | Node::Group { composons } => {
                    if let Some(last) = composons.last() {
                        inputs.extend(last.composon_inputs());
                    }
                }
                _ => {}
            }
        }
        inputs
    }
}

impl From<Vec<Entry>> for Table {
    fn from(entries: Vec<Entry>) -> Self {
        Self(entries)
    }
}

impl FromIterator<Entry> for Table {
    fn from_iter<I: IntoIterator<Item = Entry>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Table {
    type Item = &'a Entry;
    type IntoIter = std::slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for Table {
    type Item = Entry;
    type IntoIter = std::vec::IntoIter<Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Merge two search results, keeping each entry once in first-seen order.
pub fn union<'a>(mut left: Vec<&'a Entry>, right: Vec<&'a Entry>) -> Vec<&'a Entry> {
    for entry in right {
        if !left.iter().any(|seen| std::ptr::eq(*seen, entry)) {
            left.push(entry);
        }
    }
    left
}

/// The whole program: the top-level table plus the arena owning its manifolds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    #[serde(default)]
    pub manifolds: Arena,
    pub top: Table,
}

impl Tree {
    pub fn new(top: Table, manifolds: Arena) -> Self {
        Self { manifolds, top }
    }

    pub fn manifold(&self, id: ManifoldId) -> Option<&Manifold> {
        self.manifolds.get(id)
    }

    /// Declared manifolds reachable from the top, with their labels.
    pub fn declared_manifolds(&self) -> Vec<(&str, ManifoldId)> {
        self.top.declarations()
    }
}
