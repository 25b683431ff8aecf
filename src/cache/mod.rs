//! Page cache invalidation
//!
//! Mutating operations end by invalidating the cached rendering of the page
//! that displays the changed state. Rendering lives outside this service, so
//! invalidation is a hook keyed by an opaque path string.
//!
//! [`RevalidationRegistry`] is the bundled implementation: it bumps a
//! generation counter per path, which a renderer compares against the
//! generation it last rendered.

use dashmap::DashMap;
use tracing::debug;

/// Cache-invalidation collaborator
pub trait PathInvalidator: Send + Sync {
    /// Invalidate any cached rendering keyed by `path`
    fn invalidate(&self, path: &str);
}

/// Per-path generation counters
#[derive(Default)]
pub struct RevalidationRegistry {
    generations: DashMap<String, u64>,
}

impl RevalidationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current generation of a path (0 if never invalidated)
    pub fn generation(&self, path: &str) -> u64 {
        self.generations.get(path).map(|g| *g).unwrap_or(0)
    }

    /// Number of distinct paths invalidated so far
    pub fn tracked_paths(&self) -> usize {
        self.generations.len()
    }
}

impl PathInvalidator for RevalidationRegistry {
    fn invalidate(&self, path: &str) {
        let mut generation = self.generations.entry(path.to_string()).or_insert(0);
        *generation += 1;
        debug!(path, generation = *generation, "Path invalidated");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_bumps_per_path() {
        let registry = RevalidationRegistry::new();
        assert_eq!(registry.generation("/question/1"), 0);

        registry.invalidate("/question/1");
        registry.invalidate("/question/1");
        registry.invalidate("/collection");

        assert_eq!(registry.generation("/question/1"), 2);
        assert_eq!(registry.generation("/collection"), 1);
        assert_eq!(registry.tracked_paths(), 2);
    }
}
