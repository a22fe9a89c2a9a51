//! Chunk ID generation with collision resolution
//!
//! ID format: `chunk:{repo_id}:{level}:{fqn}`. Overloaded symbols share an
//! FQN; the second and later sightings append the line range.
//!
//! Thread safety: `parking_lot::Mutex` over the seen-set, safe to share
//! across rayon workers.

use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;

use super::chunk::ChunkLevel;

/// Thread-safe chunk ID generator
#[derive(Debug, Clone)]
pub struct ChunkIdGenerator {
    seen: Arc<Mutex<HashSet<String>>>,
}

impl ChunkIdGenerator {
    pub fn new() -> Self {
        Self {
            seen: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Generate a unique chunk id; collisions get a `:{start}-{end}` suffix.
    pub fn generate(
        &self,
        repo_id: &str,
        level: ChunkLevel,
        fqn: &str,
        start_line: u32,
        end_line: u32,
    ) -> String {
        let base = format!("chunk:{}:{}:{}", repo_id, level.as_str(), fqn);
        let mut seen = self.seen.lock();
        if seen.insert(base.clone()) {
            return base;
        }
        let candidate = format!("{}:{}-{}", base, start_line, end_line);
        seen.insert(candidate.clone());
        candidate
    }

    pub fn contains(&self, chunk_id: &str) -> bool {
        self.seen.lock().contains(chunk_id)
    }

    pub fn reset(&self) {
        self.seen.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.seen.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ChunkIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_basic() {
        let gen = ChunkIdGenerator::new();
        let id = gen.generate("myrepo", ChunkLevel::Function, "main.foo", 1, 10);
        assert_eq!(id, "chunk:myrepo:function:main.foo");
    }

    #[test]
    fn test_overload_collision_appends_line_range() {
        let gen = ChunkIdGenerator::new();
        let first = gen.generate("myrepo", ChunkLevel::Function, "A.f", 1, 5);
        let second = gen.generate("myrepo", ChunkLevel::Function, "A.f", 7, 12);
        assert_eq!(first, "chunk:myrepo:function:A.f");
        assert_eq!(second, "chunk:myrepo:function:A.f:7-12");
    }

    #[test]
    fn test_levels_do_not_collide() {
        let gen = ChunkIdGenerator::new();
        let func = gen.generate("r", ChunkLevel::Function, "m.X", 1, 5);
        let class = gen.generate("r", ChunkLevel::Class, "m.X", 1, 20);
        assert_ne!(func, class);
    }

    #[test]
    fn test_thread_safety() {
        use rayon::prelude::*;

        let gen = ChunkIdGenerator::new();
        let ids: Vec<String> = (0..500)
            .into_par_iter()
            .map(|i| gen.generate("r", ChunkLevel::Function, &format!("m.f{}", i), i, i + 5))
            .collect();

        let unique: HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), 500);
        assert_eq!(gen.len(), 500);
    }
}
