use crate::error::{IndexerError, Result};
use ignore::WalkBuilder;
use modview_extractor::ModuleInfo;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::{Path, PathBuf};

/// File whose presence makes a directory a package
pub const PACKAGE_MARKER: &str = "__init__.py";

const SOURCE_EXTENSION: &str = "py";

/// Options for module discovery
///
/// Hidden entries (names starting with `.`) are never walked, so a package
/// living under a dot-directory such as `.venv` or `.tox` is not discovered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveryOptions {
    /// Directory names pruned from the walk, wherever they appear
    pub skip_analyze: BTreeSet<String>,

    /// Honour `.gitignore` / `.ignore` files while walking
    pub respect_gitignore: bool,
}

/// Scanner assigning dotted module names to the Python files of a tree
pub struct ModuleScanner {
    root: PathBuf,
    options: DiscoveryOptions,
}

impl ModuleScanner {
    pub fn new(root: impl AsRef<Path>, options: DiscoveryOptions) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            options,
        }
    }

    /// Discover every module under the root, keyed by dotted name
    pub fn scan(&self) -> Result<BTreeMap<String, ModuleInfo>> {
        let root = self
            .root
            .canonicalize()
            .map_err(|e| IndexerError::InvalidPath(format!("{}: {e}", self.root.display())))?;
        if !root.is_dir() {
            return Err(IndexerError::InvalidPath(format!(
                "{} is not a directory",
                root.display()
            )));
        }

        let (packages, sources) = self.walk(&root)?;

        let mut modules: BTreeMap<String, ModuleInfo> = BTreeMap::new();
        for path in sources {
            let Some(info) = Self::module_info(&root, &path, &packages) else {
                continue;
            };

            if let Some(existing) = modules.get(&info.name) {
                log::warn!(
                    "Duplicate module name {}: keeping {}, ignoring {}",
                    info.name,
                    existing.path.display(),
                    path.display()
                );
                continue;
            }
            modules.insert(info.name.clone(), info);
        }

        log::info!("Discovered {} modules under {}", modules.len(), root.display());
        Ok(modules)
    }

    /// Walk the tree once, returning package directories and source files
    fn walk(&self, root: &Path) -> Result<(HashSet<PathBuf>, Vec<PathBuf>)> {
        let respect = self.options.respect_gitignore;
        let skip = self.options.skip_analyze.clone();

        let mut builder = WalkBuilder::new(root);
        builder
            .hidden(true)
            .parents(respect)
            .ignore(respect)
            .git_ignore(respect)
            .git_global(respect)
            .git_exclude(respect)
            .require_git(false)
            .sort_by_file_name(|a, b| a.cmp(b));
        builder.filter_entry(move |entry| {
            let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
            !(is_dir && entry.depth() > 0 && Self::is_skipped(entry.path(), &skip))
        });

        let mut packages = HashSet::new();
        let mut sources = Vec::new();

        for result in builder.build() {
            let entry = result.map_err(|source| IndexerError::Discovery {
                path: root.display().to_string(),
                source,
            })?;

            let Some(file_type) = entry.file_type() else {
                continue;
            };
            if !file_type.is_file() {
                continue;
            }

            let path = entry.path();
            if !Self::is_source_file(path) {
                continue;
            }

            if Self::is_package_marker(path) {
                if let Some(dir) = path.parent() {
                    packages.insert(dir.to_path_buf());
                }
            }
            sources.push(path.to_path_buf());
        }

        log::debug!(
            "Walked {}: {} source files, {} packages",
            root.display(),
            sources.len(),
            packages.len()
        );
        Ok((packages, sources))
    }

    /// Dotted name of a source file: every package directory from the root
    /// down to the file, then the file stem. Files outside packages are not
    /// modules.
    fn module_info(root: &Path, path: &Path, packages: &HashSet<PathBuf>) -> Option<ModuleInfo> {
        let dir = path.parent()?;
        if !packages.contains(dir) {
            return None;
        }

        let mut segments: Vec<String> = dir
            .ancestors()
            .take_while(|ancestor| ancestor.starts_with(root))
            .filter(|ancestor| packages.contains(*ancestor))
            .filter_map(|ancestor| ancestor.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .collect();
        segments.reverse();

        let is_package = Self::is_package_marker(path);
        if !is_package {
            let stem = path.file_stem()?.to_string_lossy().into_owned();
            segments.push(stem);
        }

        if segments.is_empty() {
            return None;
        }

        Some(ModuleInfo::new(segments.join("."), path, is_package))
    }

    fn is_source_file(path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext == SOURCE_EXTENSION)
    }

    fn is_package_marker(path: &Path) -> bool {
        path.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name == PACKAGE_MARKER)
    }

    fn is_skipped(path: &Path, skip: &BTreeSet<String>) -> bool {
        path.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| skip.contains(name))
    }
}
