//! Path exclusion by substring token.
//!
//! Deliberately not a glob engine: the exclusion set is small and fixed
//! (version-control dirs, caches, logs, the backup root itself), so a plain
//! substring match over the path string is cheap and predictable. Applied to
//! directories (pruning descent) and to individual files during the walk.

use std::path::Path;

#[derive(Debug, Clone)]
pub struct PathFilter {
    tokens: Vec<String>,
}

impl PathFilter {
    pub fn new(tokens: Vec<String>) -> Self {
        Self { tokens }
    }

    /// True if any configured token appears anywhere in the path string.
    pub fn excluded(&self, path: &Path) -> bool {
        let text = path.to_string_lossy();
        self.tokens.iter().any(|token| text.contains(token.as_str()))
    }
}
