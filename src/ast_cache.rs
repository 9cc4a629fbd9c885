use std::collections::{HashMap, VecDeque};

use tree_sitter::Tree;

/// Default number of syntax trees retained by [`AstCache`].
pub const DEFAULT_AST_CACHE_CAPACITY: usize = 256;

/// Bounded `file path -> syntax tree` cache.
///
/// A side channel for post-parse consumers (call-edge resolvers). Entries may
/// be evicted at any time (FIFO once the capacity is reached), so consumers
/// must tolerate absent entries and re-parse when needed.
pub struct AstCache {
    capacity: usize,
    trees: HashMap<String, Tree>,
    /// Insertion order, oldest first.
    order: VecDeque<String>,
}

impl AstCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_AST_CACHE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            trees: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    /// Store the tree for `file_path`, evicting the oldest entry when full.
    /// Re-inserting an existing path replaces the tree without changing its
    /// position in the eviction order.
    pub fn insert(&mut self, file_path: &str, tree: Tree) {
        if self.trees.insert(file_path.to_owned(), tree).is_some() {
            return;
        }
        self.order.push_back(file_path.to_owned());
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.trees.remove(&oldest);
            }
        }
    }

    pub fn get(&self, file_path: &str) -> Option<&Tree> {
        self.trees.get(file_path)
    }

    pub fn len(&self) -> usize {
        self.trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }
}

impl Default for AstCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Tree {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&tree_sitter_javascript::LANGUAGE.into())
            .unwrap();
        parser.parse(source, None).unwrap()
    }

    #[test]
    fn test_insert_and_get() {
        let mut cache = AstCache::with_capacity(4);
        cache.insert("a.js", parse("let a = 1;"));
        assert!(cache.get("a.js").is_some());
        assert!(cache.get("missing.js").is_none());
    }

    #[test]
    fn test_fifo_eviction_at_capacity() {
        let mut cache = AstCache::with_capacity(2);
        cache.insert("a.js", parse("let a = 1;"));
        cache.insert("b.js", parse("let b = 2;"));
        cache.insert("c.js", parse("let c = 3;"));
        assert_eq!(cache.len(), 2);
        assert!(cache.get("a.js").is_none(), "oldest entry is evicted first");
        assert!(cache.get("b.js").is_some());
        assert!(cache.get("c.js").is_some());
    }

    #[test]
    fn test_reinsert_replaces_without_growth() {
        let mut cache = AstCache::with_capacity(2);
        cache.insert("a.js", parse("let a = 1;"));
        cache.insert("a.js", parse("let a = 2;"));
        assert_eq!(cache.len(), 1);
    }
}
