use crate::error::{ExtractError, Result};
use crate::syntax::{
    Callee, ChainRoot, Definition, DefinitionKind, FromImport, FromNames, ImportedName, LineSpan,
    NodeKind, SourceFile, SyntaxNode,
};
use tree_sitter::{Node, Parser};

/// Python parser lowering tree-sitter trees into the closed syntax model
pub struct PythonParser {
    parser: Parser,
}

impl PythonParser {
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        let language: tree_sitter::Language = tree_sitter_python::LANGUAGE.into();
        parser
            .set_language(&language)
            .map_err(|e| ExtractError::tree_sitter(format!("Failed to set language: {e}")))?;

        Ok(Self { parser })
    }

    /// Parse one file. `path` is only used in error messages.
    pub fn parse(&mut self, source: &str, path: &str) -> Result<SourceFile> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| ExtractError::tree_sitter(format!("No tree produced for {path}")))?;

        let root = tree.root_node();
        if root.has_error() {
            let line = first_error_line(root).unwrap_or(1);
            log::debug!("{path}: syntax error near line {line}");
            return Err(ExtractError::parse(path, line, "invalid Python syntax"));
        }

        let mut body = Vec::new();
        lower_children(root, source, &mut body);

        Ok(SourceFile {
            docstring: docstring(root, source),
            body,
        })
    }
}

fn first_error_line(node: Node) -> Option<usize> {
    if node.is_error() || node.is_missing() {
        return Some(node.start_position().row + 1);
    }
    if !node.has_error() {
        return None;
    }

    let mut cursor = node.walk();
    let children: Vec<_> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_error_line)
}

fn text<'a>(node: Node, source: &'a str) -> &'a str {
    &source[node.start_byte()..node.end_byte()]
}

/// Dotted name with any interior whitespace dropped (`a . b` -> `a.b`)
fn dotted(node: Node, source: &str) -> String {
    if node.kind() != "dotted_name" {
        return text(node, source).to_string();
    }

    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|child| child.kind() == "identifier")
        .map(|child| text(child, source))
        .collect::<Vec<_>>()
        .join(".")
}

fn line(node: Node) -> usize {
    node.start_position().row + 1
}

fn lower_children(node: Node, source: &str, out: &mut Vec<SyntaxNode>) {
    let mut cursor = node.walk();
    let children: Vec<_> = node.named_children(&mut cursor).collect();
    for child in children {
        lower_node(child, source, out);
    }
}

fn lower_node(node: Node, source: &str, out: &mut Vec<SyntaxNode>) {
    if node.is_extra() {
        return;
    }

    match node.kind() {
        // No line of their own in Python's AST; only their children count
        "block" | "else_clause" | "finally_clause" | "string_content" => {
            lower_children(node, source, out)
        }
        "string_start" | "string_end" | "escape_sequence" => {}
        // Implicit concatenation is a single constant at its first part
        "concatenated_string" => {
            let mut children = Vec::new();
            let mut cursor = node.walk();
            let parts: Vec<_> = node.named_children(&mut cursor).collect();
            for part in parts {
                if part.kind() == "string" {
                    lower_children(part, source, &mut children);
                } else {
                    lower_node(part, source, &mut children);
                }
            }
            out.push(SyntaxNode {
                line: line(node),
                kind: NodeKind::Other,
                children,
            });
        }
        "decorated_definition" => {
            let Some(definition) = node.child_by_field_name("definition") else {
                out.push(lower_single(node, source));
                return;
            };

            let mut decorators = Vec::new();
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                if child.kind() == "decorator" {
                    lower_node(child, source, &mut decorators);
                }
            }

            let mut lowered = lower_single(definition, source);
            decorators.append(&mut lowered.children);
            lowered.children = decorators;
            out.push(lowered);
        }
        _ => out.push(lower_single(node, source)),
    }
}

fn lower_single(node: Node, source: &str) -> SyntaxNode {
    let kind = match node.kind() {
        "import_statement" => NodeKind::Import(imported_names(node, source)),
        "import_from_statement" => NodeKind::ImportFrom(from_import(node, source)),
        "future_import_statement" => NodeKind::ImportFrom(FromImport {
            module: Some("__future__".to_string()),
            level: 0,
            names: FromNames::Names(imported_names(node, source)),
        }),
        "call" => NodeKind::Call(callee(node, source)),
        "function_definition" => definition(node, source, DefinitionKind::Function),
        "class_definition" => definition(node, source, DefinitionKind::Class),
        _ => NodeKind::Other,
    };

    let mut children = Vec::new();
    lower_children(node, source, &mut children);

    SyntaxNode {
        line: line(node),
        kind,
        children,
    }
}

fn imported_names(node: Node, source: &str) -> Vec<ImportedName> {
    let mut cursor = node.walk();
    node.children_by_field_name("name", &mut cursor)
        .map(|name| imported_name(name, source))
        .collect()
}

fn imported_name(node: Node, source: &str) -> ImportedName {
    if node.kind() == "aliased_import" {
        let name = node
            .child_by_field_name("name")
            .map(|n| dotted(n, source))
            .unwrap_or_default();
        let alias = node
            .child_by_field_name("alias")
            .map(|a| text(a, source).to_string());
        return ImportedName { name, alias };
    }

    ImportedName {
        name: dotted(node, source),
        alias: None,
    }
}

fn from_import(node: Node, source: &str) -> FromImport {
    let (module, level) = match node.child_by_field_name("module_name") {
        Some(module) if module.kind() == "relative_import" => {
            let mut level = 0;
            let mut name = None;
            let mut cursor = module.walk();
            for child in module.named_children(&mut cursor) {
                match child.kind() {
                    "import_prefix" => level = text(child, source).matches('.').count(),
                    "dotted_name" => name = Some(dotted(child, source)),
                    _ => {}
                }
            }
            (name, level)
        }
        Some(module) => (Some(dotted(module, source)), 0),
        None => (None, 0),
    };

    let mut cursor = node.walk();
    let wildcard = node
        .named_children(&mut cursor)
        .any(|child| child.kind() == "wildcard_import");

    let names = if wildcard {
        FromNames::Wildcard
    } else {
        FromNames::Names(imported_names(node, source))
    };

    FromImport {
        module,
        level,
        names,
    }
}

fn unparenthesize(mut node: Node) -> Node {
    while node.kind() == "parenthesized_expression" {
        match node.named_child(0) {
            Some(inner) => node = inner,
            None => break,
        }
    }
    node
}

fn callee(call: Node, source: &str) -> Callee {
    let Some(function) = call.child_by_field_name("function") else {
        return Callee::Opaque;
    };

    let function = unparenthesize(function);
    match function.kind() {
        "identifier" => Callee::Name(text(function, source).to_string()),
        "attribute" => {
            let mut attributes = Vec::new();
            let mut current = function;
            while current.kind() == "attribute" {
                if let Some(attribute) = current.child_by_field_name("attribute") {
                    attributes.push(text(attribute, source).to_string());
                }
                match current.child_by_field_name("object") {
                    Some(object) => current = unparenthesize(object),
                    None => break,
                }
            }
            attributes.reverse();

            let root = match current.kind() {
                "identifier" => ChainRoot::Name(text(current, source).to_string()),
                "call" => ChainRoot::Call,
                _ => ChainRoot::Expression,
            };
            Callee::Chain { root, attributes }
        }
        _ => Callee::Opaque,
    }
}

fn definition(node: Node, source: &str, kind: DefinitionKind) -> NodeKind {
    let name = node
        .child_by_field_name("name")
        .map(|n| text(n, source).to_string())
        .unwrap_or_default();
    let docstring = node
        .child_by_field_name("body")
        .and_then(|body| docstring(body, source));

    NodeKind::Definition(Definition {
        name,
        kind,
        docstring,
    })
}

/// Docstring span of a module or block: a first statement that is a plain,
/// non-empty string literal
fn docstring(body: Node, source: &str) -> Option<LineSpan> {
    let mut cursor = body.walk();
    let first = body
        .named_children(&mut cursor)
        .find(|child| !child.is_extra())?;

    if first.kind() != "expression_statement" || first.named_child_count() != 1 {
        return None;
    }

    let literal = first.named_child(0)?;
    let is_doc = match literal.kind() {
        "string" => string_contents(literal, source).is_some_and(|content| !content.is_empty()),
        "concatenated_string" => {
            let mut parts_cursor = literal.walk();
            let parts: Vec<_> = literal
                .named_children(&mut parts_cursor)
                .filter(|part| !part.is_extra())
                .map(|part| string_contents(part, source))
                .collect();
            parts.iter().all(Option::is_some) && parts.iter().flatten().any(|c| !c.is_empty())
        }
        _ => false,
    };

    is_doc.then(|| LineSpan {
        start: line(first),
        end: first.end_position().row + 1,
    })
}

/// Raw contents of a plain string literal; `None` for f-strings and bytes
fn string_contents<'a>(node: Node, source: &'a str) -> Option<&'a str> {
    if node.kind() != "string" {
        return None;
    }

    let raw = text(node, source);
    let quote_at = raw.find(['"', '\''])?;
    let prefix = raw[..quote_at].to_ascii_lowercase();
    if prefix.contains('f') || prefix.contains('b') {
        return None;
    }

    let quoted = &raw[quote_at..];
    let quote_len = if quoted.starts_with("\"\"\"") || quoted.starts_with("'''") {
        3
    } else {
        1
    };
    if quoted.len() < quote_len * 2 {
        return None;
    }
    Some(&quoted[quote_len..quoted.len() - quote_len])
}
