use anyhow::Result;
use tracing::warn;

use crate::ast_cache::AstCache;
use crate::graph::KnowledgeGraph;
use crate::language::LanguageKind;
use crate::symbols::SymbolTable;

use super::facts::{DeferredFacts, ParseWorkerInput, ParseWorkerResult};
use super::parse_single_file;
use super::pool::{ParseProgress, WorkerPool};

/// How many files the sequential fallback processes between yields, so a
/// long single-threaded parse does not starve co-scheduled tasks.
const YIELD_EVERY: usize = 20;

/// Parse `files` and merge every contribution into `graph` and `symbols`.
///
/// When a pool is provided, files whose language is unknown are filtered out
/// up front, the rest are dispatched, and results are merged in result order
/// on this thread (the single writer). The aggregated deferred facts are
/// returned for the downstream call-edge resolver.
///
/// When the pool is absent or its dispatch fails (logged, never fatal), the
/// sequential fallback parses in input order, writes straight into the graph
/// and symbol table, feeds `ast_cache`, and yields every [`YIELD_EVERY`]
/// files. The fallback does not accumulate deferred facts, so the return
/// value is `None` in that case — callers that need facts must supply a
/// working pool or re-run.
pub fn ingest_files(
    graph: &mut KnowledgeGraph,
    symbols: &mut SymbolTable,
    ast_cache: &mut AstCache,
    files: &[ParseWorkerInput],
    progress: Option<&ParseProgress>,
    pool: Option<&dyn WorkerPool>,
) -> Result<Option<DeferredFacts>> {
    if let Some(pool) = pool {
        let known: Vec<ParseWorkerInput> = files
            .iter()
            .filter(|f| LanguageKind::from_path(&f.path).is_some())
            .cloned()
            .collect();
        let total = known.len();
        if let Some(cb) = progress {
            cb(0, total, "Parsing...");
        }
        match pool.dispatch(known, progress) {
            Ok(results) => {
                let mut facts = DeferredFacts::default();
                for result in results {
                    merge_result(graph, symbols, &mut facts, result);
                }
                if let Some(cb) = progress {
                    cb(total, total, "done");
                }
                return Ok(Some(facts));
            }
            Err(err) => {
                warn!(%err, "worker pool dispatch failed; falling back to sequential parsing");
            }
        }
    }

    sequential_ingest(graph, symbols, ast_cache, files, progress);
    Ok(None)
}

/// Apply one worker result to the graph and symbol table. Node and
/// relationship ids are deterministic, so duplicate inserts collapse inside
/// the graph.
fn merge_result(
    graph: &mut KnowledgeGraph,
    symbols: &mut SymbolTable,
    facts: &mut DeferredFacts,
    result: ParseWorkerResult,
) {
    for node in result.nodes {
        graph.add_node(node);
    }
    for rel in result.relationships {
        graph.add_relationship(rel);
    }
    for entry in result.symbols {
        symbols.add(&entry.file_path, &entry.name, entry.node_id, entry.label);
    }
    facts.imports.extend(result.imports);
    facts.calls.extend(result.calls);
    facts.heritage.extend(result.heritage);
}

/// Single-threaded cooperative fallback: same per-file logic as a worker,
/// writing directly to the graph and symbol table.
fn sequential_ingest(
    graph: &mut KnowledgeGraph,
    symbols: &mut SymbolTable,
    ast_cache: &mut AstCache,
    files: &[ParseWorkerInput],
    progress: Option<&ParseProgress>,
) {
    let total = files.len();
    if let Some(cb) = progress {
        cb(0, total, "Parsing...");
    }

    for (i, input) in files.iter().enumerate() {
        let (result, tree) = parse_single_file(input);
        for node in result.nodes {
            graph.add_node(node);
        }
        for rel in result.relationships {
            graph.add_relationship(rel);
        }
        for entry in result.symbols {
            symbols.add(&entry.file_path, &entry.name, entry.node_id, entry.label);
        }
        if let Some(tree) = tree {
            ast_cache.insert(&input.path, tree);
        }

        if let Some(cb) = progress {
            cb(i + 1, total, &input.path);
        }
        if (i + 1) % YIELD_EVERY == 0 {
            std::thread::yield_now();
        }
    }

    if let Some(cb) = progress {
        cb(total, total, "done");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::pool::RayonWorkerPool;
    use anyhow::anyhow;

    struct FailingPool;

    impl WorkerPool for FailingPool {
        fn dispatch(
            &self,
            _items: Vec<ParseWorkerInput>,
            _progress: Option<&ParseProgress>,
        ) -> Result<Vec<crate::parser::facts::ParseWorkerResult>> {
            Err(anyhow!("pool exploded"))
        }
    }

    fn fixture_files() -> Vec<ParseWorkerInput> {
        vec![
            ParseWorkerInput::new("a.ts", "export function alpha() { beta(); }"),
            ParseWorkerInput::new("b.py", "def beta(): pass"),
            ParseWorkerInput::new("notes.txt", "not source code"),
        ]
    }

    #[test]
    fn test_pool_path_returns_deferred_facts() {
        let mut graph = KnowledgeGraph::new();
        let mut symbols = SymbolTable::new();
        let mut cache = AstCache::new();
        let pool = RayonWorkerPool::with_workers(2);

        let facts = ingest_files(
            &mut graph,
            &mut symbols,
            &mut cache,
            &fixture_files(),
            None,
            Some(&pool),
        )
        .unwrap()
        .expect("pool path must return facts");

        assert!(facts.calls.iter().any(|c| c.callee_name == "beta"));
        assert_eq!(symbols.lookup("a.ts", "alpha").len(), 1);
        assert_eq!(symbols.lookup("b.py", "beta").len(), 1);
        // 2 file nodes + 2 symbol nodes; the .txt file was filtered out.
        assert_eq!(graph.node_count(), 4);
    }

    #[test]
    fn test_sequential_path_returns_none_and_fills_cache() {
        let mut graph = KnowledgeGraph::new();
        let mut symbols = SymbolTable::new();
        let mut cache = AstCache::new();

        let facts = ingest_files(
            &mut graph,
            &mut symbols,
            &mut cache,
            &fixture_files(),
            None,
            None,
        )
        .unwrap();

        assert!(facts.is_none(), "fallback does not accumulate facts");
        assert_eq!(graph.node_count(), 4);
        assert!(cache.get("a.ts").is_some());
        assert!(cache.get("b.py").is_some());
        assert!(cache.get("notes.txt").is_none());
    }

    #[test]
    fn test_failing_pool_degrades_to_sequential() {
        let mut graph = KnowledgeGraph::new();
        let mut symbols = SymbolTable::new();
        let mut cache = AstCache::new();

        let facts = ingest_files(
            &mut graph,
            &mut symbols,
            &mut cache,
            &fixture_files(),
            None,
            Some(&FailingPool),
        )
        .unwrap();

        assert!(facts.is_none(), "degraded run signals missing facts");
        assert_eq!(graph.node_count(), 4, "sequential fallback still built the graph");
    }

    #[test]
    fn test_reingestion_is_idempotent() {
        let mut graph = KnowledgeGraph::new();
        let mut symbols = SymbolTable::new();
        let mut cache = AstCache::new();
        let files = fixture_files();

        ingest_files(&mut graph, &mut symbols, &mut cache, &files, None, None).unwrap();
        let nodes_first = graph.node_count();
        let rels_first = graph.relationship_count();

        ingest_files(&mut graph, &mut symbols, &mut cache, &files, None, None).unwrap();
        assert_eq!(graph.node_count(), nodes_first);
        assert_eq!(graph.relationship_count(), rels_first);
        assert_eq!(symbols.lookup("a.ts", "alpha").len(), 1);
    }

    #[test]
    fn test_empty_input_is_not_an_error() {
        let mut graph = KnowledgeGraph::new();
        let mut symbols = SymbolTable::new();
        let mut cache = AstCache::new();
        let facts = ingest_files(&mut graph, &mut symbols, &mut cache, &[], None, None).unwrap();
        assert!(facts.is_none());
        assert_eq!(graph.node_count(), 0);
    }

    #[test]
    fn test_progress_reaches_done() {
        use std::sync::{Arc, Mutex};
        let mut graph = KnowledgeGraph::new();
        let mut symbols = SymbolTable::new();
        let mut cache = AstCache::new();
        let labels: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let labels_clone = Arc::clone(&labels);
        let progress = move |_done: usize, _total: usize, label: &str| {
            labels_clone.lock().unwrap().push(label.to_owned());
        };

        ingest_files(
            &mut graph,
            &mut symbols,
            &mut cache,
            &fixture_files(),
            Some(&progress),
            None,
        )
        .unwrap();

        let labels = labels.lock().unwrap();
        assert_eq!(labels.first().map(String::as_str), Some("Parsing..."));
        assert_eq!(labels.last().map(String::as_str), Some("done"));
    }
}
