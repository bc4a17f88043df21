use crate::error::Result;
use crate::parser::PythonParser;
use crate::syntax::{FromImport, FromNames, LineSpan, NodeKind, SourceFile, SyntaxNode};
use crate::types::{ImportRecord, ModuleFacts, ModuleInfo, WILDCARD};
use std::collections::{BTreeSet, HashSet};

/// Receiver name whose attribute calls are always local
const SELF_RECEIVER: &str = "self";

/// Extracts [`ModuleFacts`] from Python source
pub struct FactExtractor {
    parser: PythonParser,
}

impl FactExtractor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            parser: PythonParser::new()?,
        })
    }

    /// Parse `source` and collect facts for `info`.
    ///
    /// `known_modules` is the full set of discovered module names; imports
    /// of anything outside it are external.
    pub fn extract(
        &mut self,
        info: &ModuleInfo,
        source: &str,
        known_modules: &BTreeSet<String>,
    ) -> Result<ModuleFacts> {
        let path = info.path.display().to_string();
        let file = self.parser.parse(source, &path)?;
        Ok(collect_facts(info, &file, known_modules))
    }
}

/// One-shot extraction with a fresh parser
pub fn extract_facts(
    info: &ModuleInfo,
    source: &str,
    known_modules: &BTreeSet<String>,
) -> Result<ModuleFacts> {
    FactExtractor::new()?.extract(info, source, known_modules)
}

/// Collect facts from an already parsed file
pub fn collect_facts(
    info: &ModuleInfo,
    file: &SourceFile,
    known_modules: &BTreeSet<String>,
) -> ModuleFacts {
    let mut collector = FactCollector::new(info, known_modules);

    for node in &file.body {
        if let NodeKind::Definition(def) = &node.kind {
            collector.facts.method_defs.insert(def.name.clone());
        }
    }
    collector.facts.exports = collector.facts.method_defs.clone();

    collector.exclude(file.docstring);
    for node in &file.body {
        collector.visit(node);
    }

    collector.finish()
}

struct FactCollector<'a> {
    known_modules: &'a BTreeSet<String>,
    facts: ModuleFacts,
    loc_lines: HashSet<usize>,
    loc_exclude: HashSet<usize>,
}

impl<'a> FactCollector<'a> {
    fn new(info: &ModuleInfo, known_modules: &'a BTreeSet<String>) -> Self {
        Self {
            known_modules,
            facts: ModuleFacts::new(info.clone()),
            loc_lines: HashSet::new(),
            loc_exclude: HashSet::new(),
        }
    }

    fn finish(mut self) -> ModuleFacts {
        self.facts.loc = self.loc_lines.len();
        self.facts
    }

    fn visit(&mut self, node: &SyntaxNode) {
        if let NodeKind::Definition(def) = &node.kind {
            self.exclude(def.docstring);
        }
        if !self.loc_exclude.contains(&node.line) {
            self.loc_lines.insert(node.line);
        }

        match &node.kind {
            NodeKind::Import(names) => {
                for imported in names {
                    self.add_module_import(&imported.name, imported.alias.clone());
                }
            }
            NodeKind::ImportFrom(from) => self.add_from_import(from),
            NodeKind::Call(callee) => {
                if let Some(name) = callee.attributable_name() {
                    if !is_self_call(&name) {
                        *self.facts.method_calls.entry(name).or_insert(0) += 1;
                    }
                }
            }
            NodeKind::Definition(_) | NodeKind::Other => {}
        }

        for child in &node.children {
            self.visit(child);
        }
    }

    fn exclude(&mut self, docstring: Option<LineSpan>) {
        if let Some(span) = docstring {
            self.loc_exclude.extend(span.lines());
        }
    }

    fn add_module_import(&mut self, name: &str, alias: Option<String>) {
        if !self.known_modules.contains(name) {
            self.facts
                .external_imports
                .push(ImportRecord::module(name.to_string(), alias));
            return;
        }

        if let Some(alias) = &alias {
            self.facts.exports.insert(alias.clone());
        }
        self.facts
            .internal_imports
            .push(ImportRecord::module(name.to_string(), alias));
    }

    fn add_from_import(&mut self, from: &FromImport) {
        let target = self.absolute_module(from.module.as_deref(), from.level);
        let internal = target
            .as_ref()
            .filter(|name| self.known_modules.contains(name.as_str()))
            .cloned();

        let Some(target) = internal else {
            let raw = format!("{}{}", ".".repeat(from.level), from.module.as_deref().unwrap_or(""));
            let name = target.unwrap_or(raw);
            match &from.names {
                FromNames::Wildcard => self
                    .facts
                    .external_imports
                    .push(ImportRecord::wildcard(name)),
                FromNames::Names(names) => {
                    for imported in names {
                        self.facts.external_imports.push(ImportRecord::symbol(
                            name.clone(),
                            imported.name.clone(),
                            imported.alias.clone(),
                        ));
                    }
                }
            }
            return;
        };

        match &from.names {
            FromNames::Wildcard => {
                if !self.facts.wildcard_queue.contains(&target) {
                    self.facts.wildcard_queue.push(target.clone());
                }
                self.facts
                    .internal_imports
                    .push(ImportRecord::wildcard(target));
            }
            FromNames::Names(names) => {
                for imported in names {
                    let exported = imported.alias.as_ref().unwrap_or(&imported.name);
                    if exported != WILDCARD {
                        self.facts.exports.insert(exported.clone());
                    }
                    self.facts.internal_imports.push(ImportRecord::symbol(
                        target.clone(),
                        imported.name.clone(),
                        imported.alias.clone(),
                    ));
                }
            }
        }
    }

    /// Rewrite a (possibly relative) from-import module to an absolute
    /// dotted name. `None` when the level climbs past the top package.
    fn absolute_module(&self, module: Option<&str>, level: usize) -> Option<String> {
        if level == 0 {
            return module.map(str::to_string);
        }

        let info = &self.facts.info;
        let cut = if info.is_package { level - 1 } else { level };
        let parts: Vec<&str> = info.name.split('.').collect();
        if cut >= parts.len() {
            log::debug!(
                "{}: relative import at level {level} leaves the top package",
                info.name
            );
            return None;
        }

        let mut base = parts[..parts.len() - cut].to_vec();
        if let Some(module) = module {
            base.extend(module.split('.'));
        }
        Some(base.join("."))
    }
}

fn is_self_call(name: &str) -> bool {
    name.split_once('.')
        .is_some_and(|(receiver, _)| receiver == SELF_RECEIVER)
}
