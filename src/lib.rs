//! code-atlas: a code knowledge graph engine.
//!
//! Ingests a snapshot of source files and produces a typed graph of code
//! definitions (`DEFINES` containment plus externally-resolved `CALLS`
//! edges) across eleven languages, then detects plausible end-to-end
//! execution flows as first-class process nodes.
//!
//! The crate is a library: file discovery, graph persistence, call-edge
//! resolution, and community detection are external collaborators that this
//! core talks to through the types re-exported below.
//!
//! ```no_run
//! use code_atlas::{
//!     AstCache, KnowledgeGraph, ParseWorkerInput, ProcessConfig, RayonWorkerPool, SymbolTable,
//!     detect_processes, ingest_files,
//! };
//!
//! let mut graph = KnowledgeGraph::new();
//! let mut symbols = SymbolTable::new();
//! let mut cache = AstCache::new();
//! let files = vec![ParseWorkerInput::new("a.ts", "export function main() { run(); }")];
//!
//! let pool = RayonWorkerPool::new();
//! let facts = ingest_files(&mut graph, &mut symbols, &mut cache, &files, None, Some(&pool))
//!     .expect("parsing is infallible per file");
//!
//! // ... hand `facts` to a call-edge resolver, then:
//! let result = detect_processes(&graph, &[], &ProcessConfig::default(), None);
//! println!("{} processes", result.stats.total_processes);
//! ```

pub mod ast_cache;
pub mod graph;
pub mod language;
pub mod parser;
pub mod process;
pub mod symbols;

pub use ast_cache::AstCache;
pub use graph::KnowledgeGraph;
pub use graph::edge::{GraphRelationship, RelationshipId, RelationshipKind};
pub use graph::node::{GraphNode, NodeId, NodeLabel, NodeProperties};
pub use language::{LanguageKind, MAX_FILE_BYTES};
pub use parser::coordinator::ingest_files;
pub use parser::facts::{
    DeferredFacts, ExtractedCall, ExtractedHeritage, ExtractedImport, HeritageKind,
    ParseWorkerInput, ParseWorkerResult, SymbolEntry,
};
pub use parser::pool::{ParseProgress, RayonWorkerPool, WorkerPool};
pub use parser::run_parse_worker;
pub use process::{
    DetectProgress, MIN_TRACE_CONFIDENCE, ProcessConfig, ProcessDetectionResult, ProcessNode,
    ProcessStats, ProcessStep, ProcessType, detect_processes,
};
pub use symbols::{SymbolRef, SymbolTable};
