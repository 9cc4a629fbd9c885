use tree_sitter::Node;

use crate::language::LanguageKind;

/// Defensive cap on ancestor walks. Syntax trees have no cycles, but a
/// pathological grammar should not be able to spin this loop forever.
const MAX_ANCESTOR_HOPS: usize = 64;

/// Decide whether the symbol named by `name_node` is exported, per the
/// language's visibility convention. The decision depends only on the syntax
/// tree and the language, never on file order.
///
/// Rules by language:
/// - typescript/javascript: nested inside an `export_statement` or
///   `export_specifier`, a `lexical_declaration` directly under an
///   `export_statement`, or an ancestor whose text begins with `export `
/// - python: name does not start with `_`
/// - java: an ancestor carries a `modifiers` child containing `public`, or
///   the parent is a method/constructor declaration whose text starts with
///   `public`
/// - csharp: an ancestor carries a `modifier`/`modifiers` child containing
///   `public`
/// - go: the name starts with a cased letter in its uppercase form
/// - rust: an ancestor carries a `visibility_modifier` child containing `pub`
/// - swift: an ancestor carries a `modifiers`/`visibility_modifier` child
///   containing `public` or `open`
/// - c/cpp: always false
pub fn is_exported(name_node: Node, name: &str, language: LanguageKind, source: &[u8]) -> bool {
    match language {
        LanguageKind::TypeScript | LanguageKind::JavaScript => {
            is_js_exported(name_node, source)
        }
        LanguageKind::Python => !name.starts_with('_'),
        LanguageKind::Java => is_java_public(name_node, source),
        LanguageKind::CSharp => {
            ancestor_has_modifier_child(name_node, &["modifier", "modifiers"], &["public"], source)
        }
        LanguageKind::Go => name.chars().next().is_some_and(is_go_exported_initial),
        LanguageKind::Rust => {
            ancestor_has_modifier_child(name_node, &["visibility_modifier"], &["pub"], source)
        }
        LanguageKind::Swift => ancestor_has_modifier_child(
            name_node,
            &["modifiers", "visibility_modifier"],
            &["public", "open"],
            source,
        ),
        LanguageKind::C | LanguageKind::Cpp => false,
        LanguageKind::Php => true,
    }
}

fn node_text<'a>(node: Node<'a>, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or("")
}

/// A letter whose upper- and lower-cased forms differ and which equals its
/// upper form. Matches Go's notion of an exported identifier without
/// special-casing ASCII.
fn is_go_exported_initial(c: char) -> bool {
    if !c.is_alphabetic() {
        return false;
    }
    let upper: String = c.to_uppercase().collect();
    let lower: String = c.to_lowercase().collect();
    upper != lower && upper == c.to_string()
}

fn is_js_exported(name_node: Node, source: &[u8]) -> bool {
    let mut current = Some(name_node);
    for _ in 0..MAX_ANCESTOR_HOPS {
        let Some(node) = current else { break };
        match node.kind() {
            "export_statement" | "export_specifier" => return true,
            "lexical_declaration" => {
                if node.parent().is_some_and(|p| p.kind() == "export_statement") {
                    return true;
                }
            }
            _ => {}
        }
        if node_text(node, source).starts_with("export ") {
            return true;
        }
        current = node.parent();
    }
    false
}

fn is_java_public(name_node: Node, source: &[u8]) -> bool {
    if ancestor_has_modifier_child(name_node, &["modifiers"], &["public"], source) {
        return true;
    }
    // Fallback for trees where the modifiers did not parse as a child list.
    name_node.parent().is_some_and(|p| {
        matches!(p.kind(), "method_declaration" | "constructor_declaration")
            && node_text(p, source).starts_with("public")
    })
}

/// Walk ancestors of `name_node`; true when any ancestor has a direct child
/// whose kind is in `child_kinds` and whose text contains one of `tokens`.
fn ancestor_has_modifier_child(
    name_node: Node,
    child_kinds: &[&str],
    tokens: &[&str],
    source: &[u8],
) -> bool {
    let mut current = Some(name_node);
    for _ in 0..MAX_ANCESTOR_HOPS {
        let Some(node) = current else { break };
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child_kinds.contains(&child.kind()) {
                let text = node_text(child, source);
                if tokens.iter().any(|t| text.contains(t)) {
                    return true;
                }
            }
        }
        current = node.parent();
    }
    false
}
