//! Group reference expansion.
//!
//! Every `GroupReference` is replaced by a deep clone of the top-level path it
//! names, and the clone is resolved in turn. Only the top level of the tree is
//! searched for targets.

use indexmap::IndexSet;
use log::{debug, trace};

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::LinkError;
use crate::tree::{Arena, Entry, Node, Span, Table, Tag, Tree};

#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// References met during the pass, resolved or not.
    pub references: usize,
    pub diagnostics: Diagnostics,
}

impl Resolution {
    pub fn found_any(&self) -> bool {
        self.references > 0
    }
}

pub fn resolve_group_references(tree: &mut Tree) -> Result<Resolution, LinkError> {
    // Targets are cloned from the paths as declared, so the pass can rewrite
    // the top level while looking names up in it.
    let global: Table = tree
        .top
        .iter()
        .filter(|entry| entry.node.tag() == Tag::Path)
        .cloned()
        .collect();

    let mut resolver = Resolver {
        global: &global,
        arena: &mut tree.manifolds,
        references: 0,
        diagnostics: Diagnostics::new(),
        cycles: IndexSet::new(),
    };
    let mut chain = IndexSet::new();
    resolver.resolve_table(&mut tree.top, &mut chain)?;

    let Resolver {
        references,
        diagnostics,
        ..
    } = resolver;
    debug!(
        "resolved group references: {references} found, {} diagnostics",
        diagnostics.len()
    );
    Ok(Resolution {
        references,
        diagnostics,
    })
}

struct Resolver<'g, 'a> {
    global: &'g Table,
    arena: &'a mut Arena,
    references: usize,
    diagnostics: Diagnostics,
    cycles: IndexSet<(Vec<String>, Option<Span>)>,
}

impl Resolver<'_, '_> {
    fn resolve_table(&mut self, table: &mut Table, chain: &mut IndexSet<String>) -> Result<(), LinkError> {
        for entry in table.iter_mut() {
            if let Some(replacement) = self.resolve_entry(entry, chain)? {
                *entry = replacement;
            }
        }
        Ok(())
    }

    /// Returns the entry replacing `entry`, if it has to be replaced.
    fn resolve_entry(&mut self, entry: &mut Entry, chain: &mut IndexSet<String>) -> Result<Option<Entry>, LinkError> {
        let span = entry.span.clone();
        match &mut entry.node {
            Node::GroupReference { name } => self.expand(name, span, chain),
            Node::Path { composons, .. } | Node::Group { composons } => {
                for composon in composons {
                    self.resolve_table(composon, chain)?;
                }
                Ok(None)
            }
            _ => Ok(None),
        }
    }

    fn expand(&mut self, name: &str, span: Option<Span>, chain: &mut IndexSet<String>) -> Result<Option<Entry>, LinkError> {
        self.references += 1;

        if let Some(start) = chain.get_index_of(name) {
            let mut cycle: Vec<String> = chain.iter().skip(start).cloned().collect();
            cycle.push(name.to_owned());
            // Every entry point into the same loop walks into it again.
            if self.cycles.insert((cycle.clone(), span.clone())) {
                self.diagnostics
                    .push(Diagnostic::CyclicGroupReference { chain: cycle, span });
            }
            return Ok(None);
        }

        // Inside a clone, a reference is reported where its source path is
        // resolved at the top level instead.
        let in_clone = !chain.is_empty();
        let global = self.global;
        let candidates = global.find_named(name, Tag::Path);
        let Some(target) = candidates.first() else {
            if !in_clone {
                self.diagnostics.push(Diagnostic::MissingGroupReference {
                    name: name.to_owned(),
                    span,
                });
            }
            return Ok(None);
        };
        if candidates.len() > 1 && !in_clone {
            self.diagnostics.push(Diagnostic::AmbiguousGroupReference {
                name: name.to_owned(),
                candidates: candidates.len(),
                span: span.clone(),
            });
        }

        let mut resolved = target
            .deep_clone(self.arena)
            .map_err(|manifold| LinkError::UnresolvableGroupReference {
                name: name.to_owned(),
                manifold,
            })?;
        // The clone takes the reference's place, including its position in the source.
        resolved.span = span;
        trace!("expanded group reference '{name}'");

        chain.insert(name.to_owned());
        if let Node::Path { composons, .. } = &mut resolved.node {
            for composon in composons {
                self.resolve_table(composon, chain)?;
            }
        }
        chain.pop();

        Ok(Some(resolved))
    }
}
