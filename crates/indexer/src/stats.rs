use serde::{Deserialize, Serialize};

/// Statistics about an indexing run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    /// Number of modules with extracted facts
    pub modules: usize,

    /// Number of modules skipped after a parse failure
    pub skipped: usize,

    /// Sum of module LOC
    pub total_loc: usize,

    /// Internal import records across all modules
    pub internal_imports: usize,

    /// Call sites tallied across all modules
    pub calls: u64,

    /// Time taken in milliseconds
    pub time_ms: u64,
}

impl IndexStats {
    pub fn add_module(&mut self, loc: usize, internal_imports: usize, calls: u64) {
        self.modules += 1;
        self.total_loc += loc;
        self.internal_imports += internal_imports;
        self.calls += calls;
    }

    pub fn add_skipped(&mut self) {
        self.skipped += 1;
    }
}
