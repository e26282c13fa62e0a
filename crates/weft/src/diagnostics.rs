//! Recoverable problems found while resolving a tree.
//!
//! Passes never print. They collect diagnostics and keep going so one run
//! surfaces every problem; the caller decides what is fatal.

use std::fmt;
use thiserror::Error;

use crate::tree::Span;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => f.write_str("warning"),
            Self::Error => f.write_str("error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Diagnostic {
    /// The reference stays in the tree unresolved.
    #[error("group reference '{name}' does not name any top-level path")]
    MissingGroupReference { name: String, span: Option<Span> },

    /// Resolution continues with the first declared candidate.
    #[error("ambiguous group reference '{name}': {candidates} paths share this name, using the first")]
    AmbiguousGroupReference {
        name: String,
        candidates: usize,
        span: Option<Span>,
    },

    /// The innermost reference of the cycle stays unresolved.
    #[error("cyclic group reference: {}", .chain.join(" -> "))]
    CyclicGroupReference { chain: Vec<String>, span: Option<Span> },
}

impl Diagnostic {
    pub fn severity(&self) -> Severity {
        match self {
            Self::MissingGroupReference { .. } | Self::CyclicGroupReference { .. } => Severity::Error,
            Self::AmbiguousGroupReference { .. } => Severity::Warning,
        }
    }

    pub fn span(&self) -> Option<&Span> {
        match self {
            Self::MissingGroupReference { span, .. }
            | Self::AmbiguousGroupReference { span, .. }
            | Self::CyclicGroupReference { span, .. } => span.as_ref(),
        }
    }

    /// Short text for the label under the offending source.
    pub fn label(&self) -> &'static str {
        match self {
            Self::MissingGroupReference { .. } => "no path with this name",
            Self::AmbiguousGroupReference { .. } => "resolved to the first declaration",
            Self::CyclicGroupReference { .. } => "this reference leads back to itself",
        }
    }
}

/// Ordered diagnostics of one or more passes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.0.push(diagnostic);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.0.iter().any(|diagnostic| diagnostic.severity() == Severity::Error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0
            .iter()
            .filter(|diagnostic| diagnostic.severity() == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0
            .iter()
            .filter(|diagnostic| diagnostic.severity() == Severity::Warning)
    }

    /// Whether these diagnostics should reject the tree.
    pub fn is_fatal(&self, deny_warnings: bool) -> bool {
        self.has_errors() || (deny_warnings && !self.is_empty())
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.0
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severities() {
        let missing = Diagnostic::MissingGroupReference {
            name: "sub".into(),
            span: None,
        };
        let ambiguous = Diagnostic::AmbiguousGroupReference {
            name: "sub".into(),
            candidates: 2,
            span: Some(4..7),
        };
        assert_eq!(missing.severity(), Severity::Error);
        assert_eq!(ambiguous.severity(), Severity::Warning);
        assert_eq!(ambiguous.span(), Some(&(4..7)));
    }

    #[test]
    fn messages() {
        let cyclic = Diagnostic::CyclicGroupReference {
            chain: vec!["a".into(), "b".into(), "a".into()],
            span: None,
        };
        assert_eq!(cyclic.to_string(), "cyclic group reference: a -> b -> a");
    }

    #[test]
    fn equal_diagnostics_are_all_kept() {
        let mut diagnostics = Diagnostics::new();
        let missing = Diagnostic::MissingGroupReference {
            name: "sub".into(),
            span: None,
        };
        diagnostics.push(missing.clone());
        diagnostics.push(missing);
        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics.has_errors());
    }

    #[test]
    fn warnings_are_fatal_only_when_denied() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.push(Diagnostic::AmbiguousGroupReference {
            name: "sub".into(),
            candidates: 2,
            span: None,
        });
        assert!(!diagnostics.is_fatal(false));
        assert!(diagnostics.is_fatal(true));
        assert_eq!(diagnostics.warnings().count(), 1);
        assert_eq!(diagnostics.errors().count(), 0);
    }
}
