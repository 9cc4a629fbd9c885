pub mod scoring;

use std::collections::{HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::graph::KnowledgeGraph;
use crate::graph::edge::RelationshipKind;
use crate::graph::node::{NodeId, NodeLabel};

use scoring::{EntryPointSignals, score_entry_point};

/// CALLS edges below this confidence are ignored when building the call
/// graph; it filters out fuzzy global name matches.
pub const MIN_TRACE_CONFIDENCE: f32 = 0.5;

/// Upper bound on scored entry-point candidates considered for tracing.
const MAX_ENTRY_POINTS: usize = 200;

/// Configuration for process detection. Unknown fields in the serialized
/// form are ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcessConfig {
    /// Hard cap on trace length.
    pub max_trace_depth: usize,
    /// Fan-out per node during the breadth-first walk.
    pub max_branching: usize,
    /// Upper bound on emitted processes.
    pub max_processes: usize,
    /// Minimum trace length retained.
    pub min_steps: usize,
    /// Development mode: log the winning entry points and their reasons.
    pub debug: bool,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            max_trace_depth: 10,
            max_branching: 4,
            max_processes: 75,
            min_steps: 3,
            debug: false,
        }
    }
}

/// Whether a process stays inside one community or crosses between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessType {
    IntraCommunity,
    CrossCommunity,
}

/// A detected end-to-end execution flow, exposed as a first-class node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessNode {
    /// `proc_<index>_<sanitized entry name>`; unique within one run.
    pub id: String,
    pub label: String,
    /// `"EntryName → TerminalName"`, both capitalized.
    pub heuristic_label: String,
    pub process_type: ProcessType,
    pub step_count: usize,
    /// Distinct community ids touched by the trace, in first-seen order.
    pub communities: Vec<String>,
    pub entry_point_id: NodeId,
    pub terminal_id: NodeId,
    pub trace: Vec<NodeId>,
}

/// Membership of one node in one process, 1-indexed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessStep {
    pub node_id: NodeId,
    pub process_id: String,
    pub step: usize,
}

/// Summary statistics for one detection run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessStats {
    pub total_processes: usize,
    pub cross_community_count: usize,
    /// Mean trace length, rounded to one decimal place.
    pub avg_step_count: f64,
    pub entry_points_found: usize,
}

/// Everything one detection run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessDetectionResult {
    pub processes: Vec<ProcessNode>,
    pub steps: Vec<ProcessStep>,
    pub stats: ProcessStats,
}

/// Progress callback for detection: `(message, percent 0..=100)`.
pub type DetectProgress = dyn Fn(&str, u8);

/// Detect plausible end-to-end processes in a completed graph.
///
/// Runs after parsing and call-edge resolution: builds a call graph from
/// confident `CALLS` edges, selects scored entry points among Function and
/// Method nodes, traces bounded breadth-first call paths, deduplicates
/// (subset removal, then endpoint collapse), and emits at most
/// `config.max_processes` process nodes with 1-indexed step memberships.
///
/// The graph is only read; all output is returned. Running twice over the
/// same graph and memberships yields the same traces.
pub fn detect_processes(
    graph: &KnowledgeGraph,
    memberships: &[(NodeId, String)],
    config: &ProcessConfig,
    progress: Option<&DetectProgress>,
) -> ProcessDetectionResult {
    let report = |message: &str, percent: u8| {
        if let Some(cb) = progress {
            cb(message, percent);
        }
    };

    report("Building call graph", 5);
    let (forward, reverse) = build_call_adjacency(graph);

    report("Selecting entry points", 20);
    let entries = select_entry_points(graph, &forward, &reverse, config);
    let entry_points_found = entries.total_found;

    report("Tracing call paths", 40);
    let mut all_traces: Vec<Vec<NodeId>> = Vec::new();
    for entry in &entries.ranked {
        if all_traces.len() >= config.max_processes * 2 {
            break;
        }
        trace_from_entry(*entry, &forward, config, &mut all_traces);
    }

    report("Deduplicating traces", 70);
    let final_traces = dedup_traces(all_traces, config);

    report("Emitting processes", 90);
    let membership_map: HashMap<NodeId, &str> = memberships
        .iter()
        .map(|(id, community)| (*id, community.as_str()))
        .collect();

    let mut processes = Vec::with_capacity(final_traces.len());
    let mut steps = Vec::new();
    for (index, trace) in final_traces.into_iter().enumerate() {
        let entry_id = trace[0];
        let terminal_id = *trace.last().expect("traces are non-empty");
        let entry_name = node_name(graph, entry_id);
        let terminal_name = node_name(graph, terminal_id);

        let mut communities: Vec<String> = Vec::new();
        for id in &trace {
            if let Some(community) = membership_map.get(id)
                && !communities.iter().any(|c| c == community)
            {
                communities.push((*community).to_owned());
            }
        }
        let process_type = if communities.len() > 1 {
            ProcessType::CrossCommunity
        } else {
            ProcessType::IntraCommunity
        };

        let id = format!("proc_{}_{}", index, sanitize_name(entry_name));
        for (i, node_id) in trace.iter().enumerate() {
            steps.push(ProcessStep {
                node_id: *node_id,
                process_id: id.clone(),
                step: i + 1,
            });
        }
        processes.push(ProcessNode {
            id,
            label: "Process".to_owned(),
            heuristic_label: format!("{} → {}", capitalize(entry_name), capitalize(terminal_name)),
            process_type,
            step_count: trace.len(),
            communities,
            entry_point_id: entry_id,
            terminal_id,
            trace,
        });
    }

    let stats = ProcessStats {
        total_processes: processes.len(),
        cross_community_count: processes
            .iter()
            .filter(|p| p.process_type == ProcessType::CrossCommunity)
            .count(),
        avg_step_count: round_to_tenth(
            processes.iter().map(|p| p.step_count as f64).sum::<f64>()
                / (processes.len().max(1)) as f64,
        ),
        entry_points_found,
    };

    report("done", 100);
    ProcessDetectionResult {
        processes,
        steps,
        stats,
    }
}

/// Forward and reverse adjacency over `CALLS` edges with confidence at or
/// above [`MIN_TRACE_CONFIDENCE`]. Adjacency order follows relationship
/// insertion order, which is deterministic for a deterministically-built
/// graph.
type Adjacency = HashMap<NodeId, Vec<NodeId>>;

fn build_call_adjacency(graph: &KnowledgeGraph) -> (Adjacency, Adjacency) {
    let mut forward: Adjacency = HashMap::new();
    let mut reverse: Adjacency = HashMap::new();
    for rel in graph.relationships() {
        if rel.kind != RelationshipKind::Calls || rel.confidence < MIN_TRACE_CONFIDENCE {
            continue;
        }
        forward.entry(rel.source_id).or_default().push(rel.target_id);
        reverse.entry(rel.target_id).or_default().push(rel.source_id);
    }
    (forward, reverse)
}

struct RankedEntries {
    ranked: Vec<NodeId>,
    /// Candidates with a positive score, before the cap.
    total_found: usize,
}

fn select_entry_points(
    graph: &KnowledgeGraph,
    forward: &Adjacency,
    reverse: &Adjacency,
    config: &ProcessConfig,
) -> RankedEntries {
    let mut scored: Vec<(NodeId, f32, Vec<String>)> = Vec::new();

    for node in graph.nodes() {
        if !matches!(node.label, NodeLabel::Function | NodeLabel::Method) {
            continue;
        }
        if is_test_path(&node.properties.file_path) {
            continue;
        }
        let callee_count = forward.get(&node.id).map(Vec::len).unwrap_or(0);
        if callee_count == 0 {
            continue;
        }
        let caller_count = reverse.get(&node.id).map(Vec::len).unwrap_or(0);

        let (score, reasons) = score_entry_point(&EntryPointSignals {
            name: &node.properties.name,
            language: &node.properties.language,
            is_exported: node.properties.is_exported,
            caller_count,
            callee_count,
            file_path: &node.properties.file_path,
        });
        if score > 0.0 {
            scored.push((node.id, score, reasons));
        }
    }

    let total_found = scored.len();
    // Stable sort: equal scores keep graph iteration order.
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(MAX_ENTRY_POINTS);

    if config.debug {
        for (id, score, reasons) in scored.iter().take(10) {
            debug!(node = %id, score, reasons = ?reasons, "entry-point candidate");
        }
    }

    RankedEntries {
        ranked: scored.into_iter().map(|(id, _, _)| id).collect(),
        total_found,
    }
}

/// Breadth-first forward walk from one entry point. Paths never revisit a
/// node (cycle avoidance), stop extending at `max_trace_depth`, branch over
/// at most `max_branching` callees in adjacency order, and the per-entry
/// yield is capped at `max_branching * 3` traces.
fn trace_from_entry(
    entry: NodeId,
    forward: &Adjacency,
    config: &ProcessConfig,
    out: &mut Vec<Vec<NodeId>>,
) {
    let cap = config.max_branching * 3;
    let mut emitted = 0usize;
    let mut queue: VecDeque<(NodeId, Vec<NodeId>)> = VecDeque::new();
    queue.push_back((entry, vec![entry]));

    while let Some((current, path)) = queue.pop_front() {
        if emitted >= cap {
            break;
        }
        let callees = forward.get(&current).map(Vec::as_slice).unwrap_or(&[]);

        if callees.is_empty() || path.len() >= config.max_trace_depth {
            if path.len() >= config.min_steps {
                out.push(path);
                emitted += 1;
            }
            continue;
        }

        let mut extended = false;
        for callee in callees.iter().take(config.max_branching) {
            if path.contains(callee) {
                continue;
            }
            let mut next = path.clone();
            next.push(*callee);
            queue.push_back((*callee, next));
            extended = true;
        }
        // Every candidate closed a cycle: the path ends here.
        if !extended && path.len() >= config.min_steps {
            out.push(path);
            emitted += 1;
        }
    }
}

/// Deduplicate traces: subset removal first (a trace whose `a->b->c` key is
/// a substring of a kept trace's key is dropped), then endpoint collapse
/// (one trace per `(entry, terminal)` pair, longest wins). The survivors
/// stay sorted longest-first and are capped at `max_processes`.
fn dedup_traces(mut traces: Vec<Vec<NodeId>>, config: &ProcessConfig) -> Vec<Vec<NodeId>> {
    traces.sort_by(|a, b| b.len().cmp(&a.len()));

    let mut kept: Vec<(String, Vec<NodeId>)> = Vec::new();
    for trace in traces {
        let key = trace
            .iter()
            .map(NodeId::to_string)
            .collect::<Vec<_>>()
            .join("->");
        if !kept.iter().any(|(existing, _)| existing.contains(&key)) {
            kept.push((key, trace));
        }
    }

    let mut seen_endpoints: HashSet<(NodeId, NodeId)> = HashSet::new();
    let mut survivors = Vec::new();
    for (_, trace) in kept {
        let endpoints = (trace[0], *trace.last().expect("traces are non-empty"));
        if seen_endpoints.insert(endpoints) {
            survivors.push(trace);
        }
    }

    survivors.truncate(config.max_processes);
    survivors
}

/// Heuristic for files whose symbols should never seed a process.
fn is_test_path(path: &str) -> bool {
    let lower = path.to_lowercase();
    let file = lower.rsplit('/').next().unwrap_or(&lower);
    lower.contains("/test/")
        || lower.contains("/tests/")
        || lower.contains("__tests__")
        || lower.contains("/spec/")
        || file.contains(".test.")
        || file.contains(".spec.")
        || file.contains("_test.")
        || file.starts_with("test_")
}

fn node_name(graph: &KnowledgeGraph, id: NodeId) -> &str {
    graph
        .node(id)
        .map(|n| n.properties.name.as_str())
        .unwrap_or("unknown")
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
