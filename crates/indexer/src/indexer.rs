use crate::error::{IndexerError, Result};
use crate::scanner::{DiscoveryOptions, ModuleScanner};
use crate::stats::IndexStats;
use modview_extractor::{FactExtractor, ModuleFacts, ModuleInfo};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// What to do with a module whose source cannot be read or parsed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseErrorPolicy {
    /// Abort the run on the first failure
    #[default]
    Fail,
    /// Drop the module, record a diagnostic, and continue
    Skip,
}

/// A module dropped under [`ParseErrorPolicy::Skip`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub module: String,
    pub path: PathBuf,
    pub message: String,
}

/// Result of indexing a discovered module set
#[derive(Debug, Clone, Default)]
pub struct IndexedModules {
    /// Extracted facts keyed by module name
    pub modules: BTreeMap<String, ModuleFacts>,
    pub diagnostics: Vec<Diagnostic>,
    pub stats: IndexStats,
}

/// Indexer that extracts facts for every discovered module
pub struct ModuleIndexer {
    extractor: FactExtractor,
    policy: ParseErrorPolicy,
}

impl ModuleIndexer {
    pub fn new(policy: ParseErrorPolicy) -> Result<Self> {
        Ok(Self {
            extractor: FactExtractor::new()?,
            policy,
        })
    }

    /// Discover modules under `root` and index them
    pub fn index_project(
        &mut self,
        root: impl AsRef<Path>,
        options: DiscoveryOptions,
    ) -> Result<IndexedModules> {
        let modules = ModuleScanner::new(root, options).scan()?;
        self.index(&modules)
    }

    /// Extract facts for every module.
    ///
    /// Imports are classified against the full discovered name set, so a
    /// module skipped here may still be the target of internal imports.
    pub fn index(&mut self, modules: &BTreeMap<String, ModuleInfo>) -> Result<IndexedModules> {
        let start = Instant::now();
        let known: BTreeSet<String> = modules.keys().cloned().collect();
        let mut indexed = IndexedModules::default();

        for info in modules.values() {
            match self.index_module(info, &known) {
                Ok(facts) => {
                    indexed.stats.add_module(
                        facts.loc,
                        facts.internal_imports.len(),
                        facts.method_calls.values().sum(),
                    );
                    indexed.modules.insert(info.name.clone(), facts);
                }
                Err(err) if self.policy == ParseErrorPolicy::Skip => {
                    log::warn!("Skipping module {}: {err}", info.name);
                    indexed.stats.add_skipped();
                    indexed.diagnostics.push(Diagnostic {
                        module: info.name.clone(),
                        path: info.path.clone(),
                        message: err.to_string(),
                    });
                }
                Err(err) => return Err(err),
            }
        }

        indexed.stats.time_ms = start.elapsed().as_millis() as u64;
        log::info!(
            "Indexed {} modules ({} skipped, {} LOC) in {} ms",
            indexed.stats.modules,
            indexed.stats.skipped,
            indexed.stats.total_loc,
            indexed.stats.time_ms
        );

        Ok(indexed)
    }

    fn index_module(&mut self, info: &ModuleInfo, known: &BTreeSet<String>) -> Result<ModuleFacts> {
        let source = fs::read_to_string(&info.path).map_err(|source| IndexerError::Read {
            path: info.path.display().to_string(),
            source,
        })?;

        let facts = self.extractor.extract(info, &source, known)?;
        log::debug!(
            "{}: {} internal imports, {} call names, {} LOC",
            info.name,
            facts.internal_imports.len(),
            facts.method_calls.len(),
            facts.loc
        );
        Ok(facts)
    }
}
