use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use tree_sitter::Language;

/// Files larger than this are skipped unconditionally to bound parser memory.
pub const MAX_FILE_BYTES: usize = 512 * 1024;

/// A source language handled by the parsing engine.
///
/// The tag set is stable and matches the wire format:
/// `typescript | javascript | python | java | c | go | cpp | csharp | rust |
/// php | swift`. Uses a plain enum (not trait objects) so dispatch is a cheap
/// match and the kind can be hashed and serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageKind {
    TypeScript,
    JavaScript,
    Python,
    Java,
    C,
    Go,
    Cpp,
    CSharp,
    Rust,
    Php,
    Swift,
}

impl LanguageKind {
    /// Stable language tag string.
    pub fn as_str(&self) -> &'static str {
        match self {
            LanguageKind::TypeScript => "typescript",
            LanguageKind::JavaScript => "javascript",
            LanguageKind::Python => "python",
            LanguageKind::Java => "java",
            LanguageKind::C => "c",
            LanguageKind::Go => "go",
            LanguageKind::Cpp => "cpp",
            LanguageKind::CSharp => "csharp",
            LanguageKind::Rust => "rust",
            LanguageKind::Php => "php",
            LanguageKind::Swift => "swift",
        }
    }

    /// Resolve the language tag for a file path by extension, or `None` when
    /// the extension is not supported.
    pub fn from_path(path: &str) -> Option<LanguageKind> {
        GrammarId::from_path(path).map(|g| g.kind())
    }
}

/// One compiled tree-sitter grammar.
///
/// There is one more grammar than language tags: the `.tsx` extension selects
/// the TSX grammar while keeping the `typescript` tag. These MUST be
/// different: the TypeScript grammar cannot parse JSX, and the TSX grammar
/// breaks angle-bracket type assertions (`<T>expr`). Mixing them causes parse
/// errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum GrammarId {
    TypeScript,
    Tsx,
    JavaScript,
    Python,
    Java,
    C,
    Go,
    Cpp,
    CSharp,
    Rust,
    Php,
    Swift,
}

/// All grammar variants, indexable by `GrammarId as usize`.
pub(crate) const GRAMMAR_COUNT: usize = 12;

impl GrammarId {
    /// Resolve the grammar for a file path by extension.
    pub(crate) fn from_path(path: &str) -> Option<GrammarId> {
        let ext = path.rsplit('.').next().filter(|e| *e != path)?;
        match ext {
            "ts" => Some(GrammarId::TypeScript),
            "tsx" => Some(GrammarId::Tsx),
            "js" | "jsx" | "mjs" | "cjs" => Some(GrammarId::JavaScript),
            "py" => Some(GrammarId::Python),
            "java" => Some(GrammarId::Java),
            "c" | "h" => Some(GrammarId::C),
            "go" => Some(GrammarId::Go),
            "cpp" | "cc" | "cxx" | "hpp" | "hh" => Some(GrammarId::Cpp),
            "cs" => Some(GrammarId::CSharp),
            "rs" => Some(GrammarId::Rust),
            "php" => Some(GrammarId::Php),
            "swift" => Some(GrammarId::Swift),
            _ => None,
        }
    }

    /// The stable language tag this grammar belongs to.
    pub(crate) fn kind(&self) -> LanguageKind {
        match self {
            GrammarId::TypeScript | GrammarId::Tsx => LanguageKind::TypeScript,
            GrammarId::JavaScript => LanguageKind::JavaScript,
            GrammarId::Python => LanguageKind::Python,
            GrammarId::Java => LanguageKind::Java,
            GrammarId::C => LanguageKind::C,
            GrammarId::Go => LanguageKind::Go,
            GrammarId::Cpp => LanguageKind::Cpp,
            GrammarId::CSharp => LanguageKind::CSharp,
            GrammarId::Rust => LanguageKind::Rust,
            GrammarId::Php => LanguageKind::Php,
            GrammarId::Swift => LanguageKind::Swift,
        }
    }

    pub(crate) fn index(&self) -> usize {
        *self as usize
    }

    /// The compiled tree-sitter [`Language`] for this grammar.
    ///
    /// Grammars are loaded lazily and at most once per process lifetime; the
    /// returned reference is `'static` and shared. Parser *state* is never
    /// shared across threads (see `parser::mod`), but the `Language` values
    /// themselves are immutable and thread-safe.
    pub(crate) fn language(&self) -> &'static Language {
        static GRAMMARS: [OnceLock<Language>; GRAMMAR_COUNT] =
            [const { OnceLock::new() }; GRAMMAR_COUNT];
        GRAMMARS[self.index()].get_or_init(|| match self {
            GrammarId::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            GrammarId::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
            GrammarId::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
            GrammarId::Python => tree_sitter_python::LANGUAGE.into(),
            GrammarId::Java => tree_sitter_java::LANGUAGE.into(),
            GrammarId::C => tree_sitter_c::LANGUAGE.into(),
            GrammarId::Go => tree_sitter_go::LANGUAGE.into(),
            GrammarId::Cpp => tree_sitter_cpp::LANGUAGE.into(),
            GrammarId::CSharp => tree_sitter_c_sharp::LANGUAGE.into(),
            GrammarId::Rust => tree_sitter_rust::LANGUAGE.into(),
            GrammarId::Php => tree_sitter_php::LANGUAGE_PHP.into(),
            GrammarId::Swift => tree_sitter_swift::LANGUAGE.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_mapping() {
        assert_eq!(LanguageKind::from_path("src/a.ts"), Some(LanguageKind::TypeScript));
        assert_eq!(LanguageKind::from_path("src/a.tsx"), Some(LanguageKind::TypeScript));
        assert_eq!(LanguageKind::from_path("a.jsx"), Some(LanguageKind::JavaScript));
        assert_eq!(LanguageKind::from_path("pkg/m.go"), Some(LanguageKind::Go));
        assert_eq!(LanguageKind::from_path("Main.java"), Some(LanguageKind::Java));
        assert_eq!(LanguageKind::from_path("lib.rs"), Some(LanguageKind::Rust));
        assert_eq!(LanguageKind::from_path("app.py"), Some(LanguageKind::Python));
        assert_eq!(LanguageKind::from_path("x.cs"), Some(LanguageKind::CSharp));
        assert_eq!(LanguageKind::from_path("x.cpp"), Some(LanguageKind::Cpp));
        assert_eq!(LanguageKind::from_path("x.c"), Some(LanguageKind::C));
        assert_eq!(LanguageKind::from_path("index.php"), Some(LanguageKind::Php));
        assert_eq!(LanguageKind::from_path("App.swift"), Some(LanguageKind::Swift));
    }

    #[test]
    fn test_unsupported_extensions_are_skipped() {
        assert_eq!(LanguageKind::from_path("README.md"), None);
        assert_eq!(LanguageKind::from_path("Makefile"), None);
        assert_eq!(LanguageKind::from_path("data.json"), None);
    }

    #[test]
    fn test_tsx_selects_distinct_grammar_same_tag() {
        let ts = GrammarId::from_path("a.ts").unwrap();
        let tsx = GrammarId::from_path("a.tsx").unwrap();
        assert_ne!(ts, tsx);
        assert_eq!(ts.kind(), LanguageKind::TypeScript);
        assert_eq!(tsx.kind(), LanguageKind::TypeScript);
    }

    #[test]
    fn test_grammar_loads_once() {
        let first = GrammarId::Rust.language() as *const Language;
        let second = GrammarId::Rust.language() as *const Language;
        assert_eq!(first, second, "grammar must be compiled at most once");
    }

    #[test]
    fn test_all_grammars_load() {
        for id in [
            GrammarId::TypeScript,
            GrammarId::Tsx,
            GrammarId::JavaScript,
            GrammarId::Python,
            GrammarId::Java,
            GrammarId::C,
            GrammarId::Go,
            GrammarId::Cpp,
            GrammarId::CSharp,
            GrammarId::Rust,
            GrammarId::Php,
            GrammarId::Swift,
        ] {
            // Loading must not panic and must produce a usable grammar.
            let lang = id.language();
            assert!(lang.node_kind_count() > 0, "{:?} grammar is empty", id);
        }
    }
}
