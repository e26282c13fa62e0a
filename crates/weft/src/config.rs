//! Pipeline settings, usually read from a `weft.toml`.

use serde::{Deserialize, Serialize};

use crate::tree::ModifierKind;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LinkConfig {
    /// Couplet kinds bound by selection, in order.
    pub bind: Vec<ModifierKind>,

    /// Reject trees that only produced warnings.
    pub deny_warnings: bool,

    /// Erase consumed couplets and modifiers from the linked tree.
    pub erase_annotations: bool,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            bind: vec![ModifierKind::Effect],
            deny_warnings: false,
            erase_annotations: true,
        }
    }
}

impl LinkConfig {
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        assert_eq!(LinkConfig::from_toml("").unwrap(), LinkConfig::default());
    }

    #[test]
    fn reads_all_fields() {
        let config = LinkConfig::from_toml(
            r#"
            bind = ["effect", "cache"]
            deny_warnings = true
            erase_annotations = false
            "#,
        )
        .unwrap();
        assert_eq!(config.bind, [ModifierKind::Effect, ModifierKind::Cache]);
        assert!(config.deny_warnings);
        assert!(!config.erase_annotations);
    }

    #[test]
    fn rejects_unknown_fields() {
        assert!(LinkConfig::from_toml("strict = true").is_err());
        assert!(LinkConfig::from_toml(r#"bind = ["memo"]"#).is_err());
    }
}
