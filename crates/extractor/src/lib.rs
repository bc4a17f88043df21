//! # Modview Extractor
//!
//! Per-module fact extraction for Python sources.
//!
//! ## Architecture
//!
//! ```text
//! Source Code
//!     │
//!     ├──> Tree-sitter Parsing → concrete tree
//!     │
//!     ├──> Lowering → closed syntax model (SourceFile / SyntaxNode)
//!     │    ├─> imports (plain, from, relative, wildcard)
//!     │    ├─> calls (bare name, attribute chain, call-of-call)
//!     │    └─> definitions with docstring spans
//!     │
//!     └──> Fact Collection (single traversal)
//!          ├─> internal / external import records
//!          ├─> top-level definitions and exports
//!          ├─> call-name multiset
//!          └─> LOC (docstrings excluded)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use modview_extractor::{FactExtractor, ModuleInfo};
//! use std::collections::BTreeSet;
//!
//! let known: BTreeSet<String> = ["pkg.a", "pkg.b"].iter().map(|s| s.to_string()).collect();
//! let info = ModuleInfo::new("pkg.a", "pkg/a.py", false);
//!
//! let mut extractor = FactExtractor::new().unwrap();
//! let facts = extractor
//!     .extract(&info, "import pkg.b as b\nb.bar()\n", &known)
//!     .unwrap();
//!
//! assert_eq!(facts.method_calls["b.bar"], 1);
//! ```

mod error;
mod facts;
mod parser;
mod syntax;
mod types;

pub use error::{ExtractError, Result};
pub use facts::{collect_facts, extract_facts, FactExtractor};
pub use parser::PythonParser;
pub use syntax::{
    Callee, ChainRoot, Definition, DefinitionKind, FromImport, FromNames, ImportedName, LineSpan,
    NodeKind, SourceFile, SyntaxNode,
};
pub use types::{ImportRecord, ModuleFacts, ModuleInfo, WILDCARD};
