//! # Modview Indexer
//!
//! Module discovery and fact indexing for Python source trees.
//!
//! ## Pipeline
//!
//! ```text
//! Directory
//!     │
//!     ├──> Module Scanner (package-aware, skip list, optional .gitignore)
//!     │      └─> dotted name -> ModuleInfo
//!     │
//!     └──> Module Indexer (one parse per module)
//!            ├─> dotted name -> ModuleFacts
//!            └─> diagnostics for skipped modules
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use modview_indexer::{DiscoveryOptions, ModuleIndexer, ParseErrorPolicy};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut indexer = ModuleIndexer::new(ParseErrorPolicy::Skip)?;
//!     let indexed = indexer.index_project("/path/to/project", DiscoveryOptions::default())?;
//!
//!     println!(
//!         "Indexed {} modules, skipped {}",
//!         indexed.stats.modules, indexed.stats.skipped
//!     );
//!     Ok(())
//! }
//! ```

mod error;
mod indexer;
mod scanner;
mod stats;

pub use error::{IndexerError, Result};
pub use indexer::{Diagnostic, IndexedModules, ModuleIndexer, ParseErrorPolicy};
pub use scanner::{DiscoveryOptions, ModuleScanner, PACKAGE_MARKER};
pub use stats::IndexStats;
