use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

/// Imported-symbol marker of a `from m import *` clause
pub const WILDCARD: &str = "*";

/// A discovered source module, before any facts are extracted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleInfo {
    /// Dotted module name (e.g., "pkg.sub.mod"), unique across the tree
    pub name: String,

    /// Source file path
    pub path: PathBuf,

    /// Whether this module is a package root (`__init__.py`)
    pub is_package: bool,
}

impl ModuleInfo {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, is_package: bool) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            is_package,
        }
    }
}

/// One import clause.
///
/// `submodule` is `None` for `import m`, the imported symbol for
/// `from m import s`, and [`WILDCARD`] for `from m import *`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImportRecord<T = String> {
    pub target: T,
    pub submodule: Option<String>,
    pub alias: Option<String>,
}

impl<T> ImportRecord<T> {
    /// `import target [as alias]`
    pub fn module(target: T, alias: Option<String>) -> Self {
        Self {
            target,
            submodule: None,
            alias,
        }
    }

    /// `from target import symbol [as alias]`
    pub fn symbol(target: T, symbol: impl Into<String>, alias: Option<String>) -> Self {
        Self {
            target,
            submodule: Some(symbol.into()),
            alias,
        }
    }

    /// `from target import *`
    pub fn wildcard(target: T) -> Self {
        Self::symbol(target, WILDCARD, None)
    }

    pub fn is_wildcard(&self) -> bool {
        self.submodule.as_deref() == Some(WILDCARD)
    }

    /// Replace the target, keeping symbol and alias
    pub fn map_target<U>(self, f: impl FnOnce(T) -> U) -> ImportRecord<U> {
        ImportRecord {
            target: f(self.target),
            submodule: self.submodule,
            alias: self.alias,
        }
    }
}

/// Everything extraction learns about one module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleFacts {
    #[serde(flatten)]
    pub info: ModuleInfo,

    /// Names defined at module top level
    pub method_defs: BTreeSet<String>,

    /// Names visible to importers
    pub exports: BTreeSet<String>,

    /// Imports of discovered modules, in declaration order
    pub internal_imports: Vec<ImportRecord>,

    /// Imports of anything else
    pub external_imports: Vec<ImportRecord>,

    /// Callee name -> occurrence count
    pub method_calls: BTreeMap<String, u64>,

    /// Targets of internal wildcard imports, awaiting export closure
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub wildcard_queue: Vec<String>,

    #[serde(rename = "LOC")]
    pub loc: usize,
}

impl ModuleFacts {
    /// Empty facts for a discovered module
    pub fn new(info: ModuleInfo) -> Self {
        Self {
            info,
            method_defs: BTreeSet::new(),
            exports: BTreeSet::new(),
            internal_imports: Vec::new(),
            external_imports: Vec::new(),
            method_calls: BTreeMap::new(),
            wildcard_queue: Vec::new(),
            loc: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_records_are_detected() {
        let star = ImportRecord::wildcard("pkg.c".to_string());
        let named = ImportRecord::symbol("pkg.c".to_string(), "qux", None);

        assert!(star.is_wildcard());
        assert!(!named.is_wildcard());
        assert!(!ImportRecord::module("pkg.c".to_string(), None).is_wildcard());
    }

    #[test]
    fn map_target_keeps_symbol_and_alias() {
        let record = ImportRecord::symbol("pkg.y".to_string(), "z", Some("w".to_string()));
        let mapped = record.map_target(|name| name.len());

        assert_eq!(mapped.target, 5);
        assert_eq!(mapped.submodule.as_deref(), Some("z"));
        assert_eq!(mapped.alias.as_deref(), Some("w"));
    }
}
