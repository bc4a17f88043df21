//! Closed syntax model consumed by fact extraction.
//!
//! The parser lowers the concrete tree into these variants; everything the
//! extractor does not look at collapses into [`NodeKind::Other`], so the
//! fact visitor is a single exhaustive `match`.

/// Inclusive 1-based line range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSpan {
    pub start: usize,
    pub end: usize,
}

impl LineSpan {
    pub fn lines(self) -> std::ops::RangeInclusive<usize> {
        self.start..=self.end
    }
}

/// Parsed source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Module-level docstring, if the first statement is one
    pub docstring: Option<LineSpan>,
    pub body: Vec<SyntaxNode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxNode {
    /// 1-based line where the node starts
    pub line: usize,
    pub kind: NodeKind,
    pub children: Vec<SyntaxNode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// `import a.b as c, d`
    Import(Vec<ImportedName>),
    /// `from .a import b as c` / `from a import *`
    ImportFrom(FromImport),
    Call(Callee),
    Definition(Definition),
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedName {
    pub name: String,
    pub alias: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FromImport {
    /// Module text after the leading dots, if any
    pub module: Option<String>,
    /// Number of leading dots
    pub level: usize,
    pub names: FromNames,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FromNames {
    Wildcard,
    Names(Vec<ImportedName>),
}

/// Shape of a call's callee expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Callee {
    /// `f()`
    Name(String),
    /// `a.b.c()`, `f().g()`, `x[0].y()`
    Chain {
        root: ChainRoot,
        attributes: Vec<String>,
    },
    /// `f()()`, `x[0]()`, `(lambda: 0)()`
    Opaque,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainRoot {
    Name(String),
    Call,
    Expression,
}

impl Callee {
    /// Dotted name a call can be attributed by.
    ///
    /// Chains rooted in another call are unresolved; chains rooted in any
    /// other expression keep only their attribute path.
    pub fn attributable_name(&self) -> Option<String> {
        match self {
            Callee::Name(name) => Some(name.clone()),
            Callee::Chain {
                root: ChainRoot::Name(root),
                attributes,
            } => {
                let mut parts = Vec::with_capacity(attributes.len() + 1);
                parts.push(root.as_str());
                parts.extend(attributes.iter().map(String::as_str));
                Some(parts.join("."))
            }
            Callee::Chain {
                root: ChainRoot::Expression,
                attributes,
            } if !attributes.is_empty() => Some(attributes.join(".")),
            Callee::Chain { .. } | Callee::Opaque => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionKind {
    Function,
    Class,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Definition {
    pub name: String,
    pub kind: DefinitionKind,
    pub docstring: Option<LineSpan>,
}
