pub mod coordinator;
pub mod exports;
pub mod facts;
pub mod pool;
pub mod queries;

use std::cell::RefCell;
use std::collections::HashMap;

use tracing::warn;
use tree_sitter::{Node, Parser, Query, StreamingIterator, Tree};

use crate::graph::edge::GraphRelationship;
use crate::graph::node::{DEFINITION_PRIORITY, GraphNode, NodeId, NodeLabel, NodeProperties};
use crate::language::{GrammarId, MAX_FILE_BYTES};
use facts::{
    ExtractedCall, ExtractedHeritage, ExtractedImport, HeritageKind, ParseWorkerInput,
    ParseWorkerResult, SymbolEntry,
};

// Thread-local Parser instances — one map per worker thread, zero lock
// contention. Each Parser is initialised lazily with the grammar it first
// needs; parser state is never shared across threads.
thread_local! {
    static PARSERS: RefCell<HashMap<GrammarId, Parser>> = RefCell::new(HashMap::new());
}

fn parse_with_thread_parser(grammar: GrammarId, content: &str) -> Option<Tree> {
    PARSERS.with(|cell| {
        let mut parsers = cell.borrow_mut();
        let parser = parsers.entry(grammar).or_insert_with(|| {
            let mut parser = Parser::new();
            parser
                .set_language(grammar.language())
                .expect("grammar ABI mismatch");
            parser
        });
        parser.parse(content, None)
    })
}

/// Parse one file and extract its contribution to the knowledge graph.
///
/// Never fails: unsupported extensions, oversized content, and parser
/// failures all yield an empty result (the latter with one logged warning).
pub fn run_parse_worker(input: &ParseWorkerInput) -> ParseWorkerResult {
    parse_single_file(input).0
}

/// Worker body that also returns the syntax tree, for callers (the
/// sequential path) that feed the AST cache.
pub(crate) fn parse_single_file(input: &ParseWorkerInput) -> (ParseWorkerResult, Option<Tree>) {
    let mut result = ParseWorkerResult::default();

    let Some(grammar) = GrammarId::from_path(&input.path) else {
        return (result, None);
    };
    if input.content.len() > MAX_FILE_BYTES {
        return (result, None);
    }

    let Some(tree) = parse_with_thread_parser(grammar, &input.content) else {
        warn!(path = %input.path, "skipping file: parser produced no tree");
        return (result, None);
    };

    let language = grammar.kind();
    let line_count = input.content.lines().count().max(1);
    let file_node = GraphNode::file(&input.path, language.as_str(), line_count);
    let file_id = file_node.id;
    result.nodes.push(file_node);

    // No query for this grammar: the file still parses (and can be cached),
    // but extraction stays off.
    let Some(query) = queries::catalog_query(grammar) else {
        return (result, Some(tree));
    };

    extract_matches(&mut result, query, &tree, input, grammar, file_id);
    (result, Some(tree))
}

fn node_text<'a>(node: Node<'a>, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or("")
}

/// Strip string-literal delimiters from an import source.
fn strip_source_delimiters(raw: &str) -> &str {
    raw.trim_matches(|c| matches!(c, '"' | '\'' | '`' | '<' | '>'))
}

fn find_capture<'t>(captures: &[(&str, Node<'t>)], wanted: &str) -> Option<Node<'t>> {
    captures
        .iter()
        .find(|(name, _)| *name == wanted)
        .map(|(_, node)| *node)
}

/// Run the catalog query over the tree and dispatch each match.
fn extract_matches(
    result: &mut ParseWorkerResult,
    query: &Query,
    tree: &Tree,
    input: &ParseWorkerInput,
    grammar: GrammarId,
    file_id: NodeId,
) {
    let source = input.content.as_bytes();
    let language = grammar.kind();
    let capture_names = query.capture_names();

    let mut cursor = tree_sitter::QueryCursor::new();
    let mut matches = cursor.matches(query, tree.root_node(), source);

    // Definitions keyed by (name, start line). The C++ template patterns wrap
    // the class/function patterns, so one declaration can be claimed twice;
    // the more specific label (later in DEFINITION_PRIORITY) wins.
    let mut definitions: HashMap<(String, usize), (NodeLabel, Node)> = HashMap::new();

    while let Some(m) = matches.next() {
        let captures: Vec<(&str, Node)> = m
            .captures
            .iter()
            .map(|c| (capture_names[c.index as usize], c.node))
            .collect();

        if find_capture(&captures, "import").is_some() {
            // Malformed capture (no source text): skip the match.
            if let Some(source_node) = find_capture(&captures, "import.source") {
                result.imports.push(ExtractedImport {
                    file_path: input.path.clone(),
                    source: strip_source_delimiters(node_text(source_node, source)).to_owned(),
                });
            }
            continue;
        }

        if let Some(call_node) = find_capture(&captures, "call") {
            if let Some(name_node) = find_capture(&captures, "call.name") {
                result.calls.push(ExtractedCall {
                    file_path: input.path.clone(),
                    caller_context_node_id: None,
                    callee_name: node_text(name_node, source).to_owned(),
                    line: call_node.start_position().row + 1,
                });
            }
            continue;
        }

        if captures.iter().any(|(name, _)| name.starts_with("heritage")) {
            let Some(child_node) = find_capture(&captures, "heritage.class") else {
                continue;
            };
            let child_name = node_text(child_node, source).to_owned();
            for (name, node) in &captures {
                let kind = match *name {
                    "heritage.extends" => HeritageKind::Extends,
                    "heritage.implements" => HeritageKind::Implements,
                    "heritage.trait" => HeritageKind::Trait,
                    _ => continue,
                };
                result.heritage.push(ExtractedHeritage {
                    file_path: input.path.clone(),
                    child_name: child_name.clone(),
                    parent_name: node_text(*node, source).to_owned(),
                    kind,
                });
            }
            continue;
        }

        // Definition: a @name paired with a @definition.<kind> capture.
        let Some(name_node) = find_capture(&captures, "name") else {
            continue;
        };
        let label = DEFINITION_PRIORITY
            .iter()
            .find(|l| {
                captures
                    .iter()
                    .any(|(n, _)| n.strip_prefix("definition.") == Some(l.capture_suffix()))
            })
            .copied()
            .or_else(|| {
                captures
                    .iter()
                    .any(|(n, _)| n.starts_with("definition."))
                    .then_some(NodeLabel::CodeElement)
            });
        let Some(label) = label else {
            continue;
        };

        let name = node_text(name_node, source).to_owned();
        if name.is_empty() {
            continue;
        }
        let key = (name, name_node.start_position().row + 1);
        match definitions.get(&key) {
            Some((existing, _)) if specificity(*existing) >= specificity(label) => {}
            _ => {
                definitions.insert(key, (label, name_node));
            }
        }
    }

    // Emit definitions in source order for deterministic result layout.
    let mut ordered: Vec<(&(String, usize), &(NodeLabel, Node))> = definitions.iter().collect();
    ordered.sort_by(|a, b| (a.0.1, &a.0.0).cmp(&(b.0.1, &b.0.0)));

    for ((name, _), (label, name_node)) in ordered {
        let exported = exports::is_exported(*name_node, name, language, source);
        let node_id = NodeId::symbol(*label, &input.path, name);
        result.nodes.push(GraphNode {
            id: node_id,
            label: *label,
            properties: NodeProperties {
                name: name.clone(),
                file_path: input.path.clone(),
                start_line: name_node.start_position().row + 1,
                end_line: name_node.end_position().row + 1,
                language: language.as_str().to_owned(),
                is_exported: exported,
            },
        });
        result.symbols.push(SymbolEntry {
            file_path: input.path.clone(),
            name: name.clone(),
            node_id,
            label: *label,
        });
        result
            .relationships
            .push(GraphRelationship::defines(file_id, node_id));
    }
}

/// Position in the dispatch priority list; later entries are more specific
/// wrappers (Method over Function, Template over Class).
fn specificity(label: NodeLabel) -> usize {
    DEFINITION_PRIORITY
        .iter()
        .position(|l| *l == label)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(path: &str, content: &str) -> ParseWorkerResult {
        run_parse_worker(&ParseWorkerInput::new(path, content))
    }

    fn symbol_nodes(result: &ParseWorkerResult) -> Vec<&GraphNode> {
        result
            .nodes
            .iter()
            .filter(|n| n.label != NodeLabel::File)
            .collect()
    }

    fn find<'a>(result: &'a ParseWorkerResult, name: &str) -> &'a GraphNode {
        result
            .nodes
            .iter()
            .find(|n| n.properties.name == name && n.label != NodeLabel::File)
            .unwrap_or_else(|| panic!("symbol {name} not found"))
    }

    #[test]
    fn test_typescript_functions_and_exports() {
        let result = parse("a.ts", "export function foo(){ return 1; }\nfunction bar(){}");
        let symbols = symbol_nodes(&result);
        assert_eq!(symbols.len(), 2, "expected foo and bar");
        assert_eq!(find(&result, "foo").label, NodeLabel::Function);
        assert!(find(&result, "foo").properties.is_exported);
        assert!(!find(&result, "bar").properties.is_exported);
        // One DEFINES edge per symbol, sourced at the file node.
        let file_id = NodeId::file("a.ts");
        assert_eq!(result.relationships.len(), 2);
        assert!(result.relationships.iter().all(|r| r.source_id == file_id));
        assert!(result.relationships.iter().all(|r| r.confidence == 1.0));
    }

    #[test]
    fn test_typescript_class_with_method() {
        let result = parse(
            "svc.ts",
            "export class UserService {\n  findAll() { return []; }\n}",
        );
        assert_eq!(find(&result, "UserService").label, NodeLabel::Class);
        assert_eq!(find(&result, "findAll").label, NodeLabel::Method);
        assert!(find(&result, "UserService").properties.is_exported);
    }

    #[test]
    fn test_typescript_imports_and_calls() {
        let result = parse(
            "a.ts",
            "import { api } from './api';\nfunction go() { api.fetchUsers(); render(); }",
        );
        assert_eq!(result.imports.len(), 1);
        assert_eq!(result.imports[0].source, "./api");
        let callees: Vec<&str> = result.calls.iter().map(|c| c.callee_name.as_str()).collect();
        assert!(callees.contains(&"fetchUsers"));
        assert!(callees.contains(&"render"));
        assert!(result.calls.iter().all(|c| c.caller_context_node_id.is_none()));
    }

    #[test]
    fn test_typescript_heritage() {
        let result = parse("a.ts", "class Dog extends Animal {}\ninterface A extends B {}");
        assert_eq!(result.heritage.len(), 2);
        let dog = result.heritage.iter().find(|h| h.child_name == "Dog").unwrap();
        assert_eq!(dog.parent_name, "Animal");
        assert_eq!(dog.kind, HeritageKind::Extends);
    }

    #[test]
    fn test_typescript_arrow_const_is_function() {
        let result = parse("a.ts", "export const handler = () => {};\nconst local = () => {};");
        assert_eq!(find(&result, "handler").label, NodeLabel::Function);
        assert!(find(&result, "handler").properties.is_exported);
        assert_eq!(find(&result, "local").label, NodeLabel::Function);
        assert!(!find(&result, "local").properties.is_exported);
    }

    #[test]
    fn test_python_module_and_class() {
        let result = parse(
            "mod.py",
            "import os\n\ndef foo(): pass\ndef _bar(): pass\n\nclass Greeter:\n    def greet(self):\n        self.say('hi')\n",
        );
        assert!(find(&result, "foo").properties.is_exported);
        assert!(!find(&result, "_bar").properties.is_exported);
        assert_eq!(find(&result, "Greeter").label, NodeLabel::Class);
        assert_eq!(find(&result, "greet").label, NodeLabel::Method);
        assert_eq!(result.imports.len(), 1);
        assert_eq!(result.imports[0].source, "os");
        assert!(result.calls.iter().any(|c| c.callee_name == "say"));
    }

    #[test]
    fn test_python_heritage() {
        let result = parse("m.py", "class Child(Base): pass");
        assert_eq!(result.heritage.len(), 1);
        assert_eq!(result.heritage[0].child_name, "Child");
        assert_eq!(result.heritage[0].parent_name, "Base");
    }

    #[test]
    fn test_go_capitalization_and_kinds() {
        let result = parse(
            "m.go",
            "package m\n\nimport \"fmt\"\n\ntype Server struct{}\n\nfunc Hello() { fmt.Println(\"hi\") }\nfunc hello() {}\nfunc (s *Server) Run() { hello() }\n",
        );
        assert!(find(&result, "Hello").properties.is_exported);
        assert!(!find(&result, "hello").properties.is_exported);
        assert_eq!(find(&result, "Server").label, NodeLabel::Struct);
        assert_eq!(find(&result, "Run").label, NodeLabel::Method);
        assert_eq!(result.imports.len(), 1);
        assert_eq!(result.imports[0].source, "fmt");
        assert!(result.calls.iter().any(|c| c.callee_name == "Println"));
        assert!(result.calls.iter().any(|c| c.callee_name == "hello"));
    }

    #[test]
    fn test_rust_items_and_impl_methods() {
        let src = "pub struct Engine;\n\nimpl Engine {\n    pub fn start(&self) { self.warm_up(); }\n}\n\npub fn boot() {}\nfn private_helper() {}\nuse std::collections::HashMap;\n";
        let result = parse("lib.rs", src);
        assert_eq!(find(&result, "Engine").label, NodeLabel::Struct);
        assert!(find(&result, "Engine").properties.is_exported);
        assert_eq!(find(&result, "start").label, NodeLabel::Method);
        assert_eq!(find(&result, "boot").label, NodeLabel::Function);
        assert!(!find(&result, "private_helper").properties.is_exported);
        assert!(
            result.imports.iter().any(|i| i.source.contains("HashMap")),
            "use declaration should surface as an import"
        );
        assert!(result.calls.iter().any(|c| c.callee_name == "warm_up"));
    }

    #[test]
    fn test_rust_trait_impl_heritage() {
        let result = parse("a.rs", "trait Runner {}\nstruct Job;\nimpl Runner for Job {}");
        let rel = result
            .heritage
            .iter()
            .find(|h| h.kind == HeritageKind::Trait)
            .expect("trait impl heritage");
        assert_eq!(rel.child_name, "Job");
        assert_eq!(rel.parent_name, "Runner");
    }

    #[test]
    fn test_java_class_method_and_implements() {
        let src = "import java.util.List;\n\npublic class OrderController implements Handler {\n    public void handle() { process(); }\n}\n";
        let result = parse("OrderController.java", src);
        assert_eq!(find(&result, "OrderController").label, NodeLabel::Class);
        assert!(find(&result, "OrderController").properties.is_exported);
        assert_eq!(find(&result, "handle").label, NodeLabel::Method);
        assert_eq!(result.imports.len(), 1);
        assert_eq!(result.imports[0].source, "java.util.List");
        let h = result.heritage.iter().find(|h| h.child_name == "OrderController").unwrap();
        assert_eq!(h.parent_name, "Handler");
        assert_eq!(h.kind, HeritageKind::Implements);
        assert!(result.calls.iter().any(|c| c.callee_name == "process"));
    }

    #[test]
    fn test_c_functions_structs_and_includes() {
        let src = "#include <stdio.h>\n#define MAX_LEN 16\n\nstruct point { int x; int y; };\n\nint main(void) { printf(\"hi\");\n return 0; }\n";
        let result = parse("main.c", src);
        assert_eq!(find(&result, "main").label, NodeLabel::Function);
        assert!(!find(&result, "main").properties.is_exported);
        assert_eq!(find(&result, "point").label, NodeLabel::Struct);
        assert_eq!(find(&result, "MAX_LEN").label, NodeLabel::Macro);
        assert_eq!(result.imports.len(), 1);
        assert_eq!(result.imports[0].source, "stdio.h");
        assert!(result.calls.iter().any(|c| c.callee_name == "printf"));
    }

    #[test]
    fn test_oversized_file_is_skipped() {
        let big = "var x = 1;\n".repeat((MAX_FILE_BYTES / 10) + 1);
        assert!(big.len() > MAX_FILE_BYTES);
        let result = parse("big.js", &big);
        assert!(result.is_empty(), "oversized files contribute nothing");
    }

    #[test]
    fn test_unsupported_extension_is_skipped() {
        let result = parse("README.md", "# hello");
        assert!(result.is_empty());
    }

    #[test]
    fn test_node_ids_are_stable_across_runs() {
        let src = "export function foo(){}\nclass Bar {}";
        let first = parse("a.ts", src);
        let second = parse("a.ts", src);
        let ids = |r: &ParseWorkerResult| -> Vec<NodeId> { r.nodes.iter().map(|n| n.id).collect() };
        assert_eq!(ids(&first), ids(&second));
    }

    #[test]
    fn test_duplicate_definitions_same_name_same_file() {
        // Same name on two lines: both retained, distinct lines, same id.
        let result = parse("d.ts", "function dup(){}\nfunction dup(){}\n");
        let dups: Vec<&GraphNode> = result
            .nodes
            .iter()
            .filter(|n| n.properties.name == "dup")
            .collect();
        assert_eq!(dups.len(), 2);
        assert_eq!(dups[0].id, dups[1].id, "id depends on (label, path, name) only");
    }

    #[test]
    fn test_call_line_numbers() {
        let result = parse("a.ts", "function f() {\n  g();\n}\n");
        let call = result.calls.iter().find(|c| c.callee_name == "g").unwrap();
        assert_eq!(call.line, 2);
    }
}
