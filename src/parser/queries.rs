//! The query catalog: one tree-sitter S-expression pattern string per
//! grammar, embedded verbatim and compiled at most once per process.
//!
//! Capture vocabulary shared by all languages:
//! - `@definition.<kind>` on the declaration node, with `@name` on its
//!   identifier. `<kind>` selects the node label (see `NodeLabel`).
//! - `@import` on the import statement, with `@import.source` on the
//!   imported path/module text.
//! - `@call` on the call expression, with `@call.name` on the callee.
//! - `@heritage` on the declaration, with `@heritage.class` on the child and
//!   `@heritage.extends` / `@heritage.implements` / `@heritage.trait` on the
//!   parents (`@heritage.impl` tags Rust trait impls).
//!
//! No `#eq?`/`#match?` predicates: the tree-sitter 0.26 StreamingIterator
//! match API does not evaluate predicates, so every constraint must be
//! structural. Patterns are written to not overlap (functions anchored to
//! their container so method patterns own class/impl bodies); the one
//! remaining overlap (C++ template wrappers) is resolved downstream by
//! specific-label-wins dedup on `(name, line)`.

use std::sync::OnceLock;

use tracing::warn;
use tree_sitter::Query;

use crate::language::{GRAMMAR_COUNT, GrammarId};

/// TypeScript (`.ts`). The TSX grammar compiles the same pattern string.
const TYPESCRIPT_QUERY: &str = r#"
    ; Class methods before the generic declarations they nest inside
    (method_definition
      name: (property_identifier) @name) @definition.method

    (function_declaration
      name: (identifier) @name) @definition.function

    (class_declaration
      name: (type_identifier) @name) @definition.class

    (abstract_class_declaration
      name: (type_identifier) @name) @definition.class

    (interface_declaration
      name: (type_identifier) @name) @definition.interface

    (type_alias_declaration
      name: (type_identifier) @name) @definition.type_alias

    (enum_declaration
      name: (identifier) @name) @definition.enum

    (internal_module
      name: (identifier) @name) @definition.namespace

    ; Top-level arrow-function constants: const foo = () => {}
    (program
      (lexical_declaration
        (variable_declarator
          name: (identifier) @name
          value: (arrow_function))) @definition.function)

    (export_statement
      (lexical_declaration
        (variable_declarator
          name: (identifier) @name
          value: (arrow_function))) @definition.function)

    (import_statement
      source: (string) @import.source) @import

    (call_expression
      function: (identifier) @call.name) @call

    (call_expression
      function: (member_expression
        property: (property_identifier) @call.name)) @call

    ; class Foo extends Bar
    (class_declaration
      name: (type_identifier) @heritage.class
      (class_heritage
        (extends_clause
          value: (identifier) @heritage.extends))) @heritage

    ; class Foo implements IBar
    (class_declaration
      name: (type_identifier) @heritage.class
      (class_heritage
        (implements_clause
          (type_identifier) @heritage.implements))) @heritage

    ; interface IFoo extends IBar
    (interface_declaration
      name: (type_identifier) @heritage.class
      (extends_type_clause
        (type_identifier) @heritage.extends)) @heritage
"#;

/// JavaScript (`.js`/`.jsx`/`.mjs`/`.cjs`). No interfaces, type aliases,
/// enums, or implements clauses; class_heritage holds the identifier
/// directly (no extends_clause node).
const JAVASCRIPT_QUERY: &str = r#"
    (method_definition
      name: (property_identifier) @name) @definition.method

    (function_declaration
      name: (identifier) @name) @definition.function

    (class_declaration
      name: (identifier) @name) @definition.class

    (program
      (lexical_declaration
        (variable_declarator
          name: (identifier) @name
          value: (arrow_function))) @definition.function)

    (export_statement
      (lexical_declaration
        (variable_declarator
          name: (identifier) @name
          value: (arrow_function))) @definition.function)

    (import_statement
      source: (string) @import.source) @import

    (call_expression
      function: (identifier) @call.name) @call

    (call_expression
      function: (member_expression
        property: (property_identifier) @call.name)) @call

    (class_declaration
      name: (identifier) @heritage.class
      (class_heritage
        (identifier) @heritage.extends)) @heritage
"#;

const PYTHON_QUERY: &str = r#"
    ; Methods live in class bodies; free functions are anchored to module
    ; level so the two patterns never claim the same node
    (class_definition
      body: (block
        (function_definition
          name: (identifier) @name) @definition.method))

    (class_definition
      body: (block
        (decorated_definition
          definition: (function_definition
            name: (identifier) @name)) @definition.method))

    (module
      (function_definition
        name: (identifier) @name) @definition.function)

    (module
      (decorated_definition
        definition: (function_definition
          name: (identifier) @name)) @definition.function)

    (class_definition
      name: (identifier) @name) @definition.class

    (import_statement
      name: (dotted_name) @import.source) @import

    (import_from_statement
      module_name: (dotted_name) @import.source) @import

    (import_from_statement
      module_name: (relative_import) @import.source) @import

    (call
      function: (identifier) @call.name) @call

    (call
      function: (attribute
        attribute: (identifier) @call.name)) @call

    (class_definition
      name: (identifier) @heritage.class
      superclasses: (argument_list
        (identifier) @heritage.extends)) @heritage
"#;

const JAVA_QUERY: &str = r#"
    (class_declaration
      name: (identifier) @name) @definition.class

    (interface_declaration
      name: (identifier) @name) @definition.interface

    (enum_declaration
      name: (identifier) @name) @definition.enum

    (record_declaration
      name: (identifier) @name) @definition.record

    (annotation_type_declaration
      name: (identifier) @name) @definition.annotation

    (method_declaration
      name: (identifier) @name) @definition.method

    (constructor_declaration
      name: (identifier) @name) @definition.constructor

    (import_declaration
      (scoped_identifier) @import.source) @import

    (import_declaration
      (identifier) @import.source) @import

    (method_invocation
      name: (identifier) @call.name) @call

    (object_creation_expression
      type: (type_identifier) @call.name) @call

    (class_declaration
      name: (identifier) @heritage.class
      superclass: (superclass
        (type_identifier) @heritage.extends)) @heritage

    (class_declaration
      name: (identifier) @heritage.class
      interfaces: (super_interfaces
        (type_list
          (type_identifier) @heritage.implements))) @heritage

    (interface_declaration
      name: (identifier) @heritage.class
      (extends_interfaces
        (type_list
          (type_identifier) @heritage.extends))) @heritage
"#;

const C_QUERY: &str = r#"
    (function_definition
      declarator: (function_declarator
        declarator: (identifier) @name)) @definition.function

    (function_definition
      declarator: (pointer_declarator
        declarator: (function_declarator
          declarator: (identifier) @name))) @definition.function

    (struct_specifier
      name: (type_identifier) @name
      body: (field_declaration_list)) @definition.struct

    (enum_specifier
      name: (type_identifier) @name
      body: (enumerator_list)) @definition.enum

    (union_specifier
      name: (type_identifier) @name
      body: (field_declaration_list)) @definition.union

    (type_definition
      declarator: (type_identifier) @name) @definition.typedef

    (preproc_function_def
      name: (identifier) @name) @definition.macro

    (preproc_def
      name: (identifier) @name) @definition.macro

    (preproc_include
      path: (string_literal) @import.source) @import

    (preproc_include
      path: (system_lib_string) @import.source) @import

    (call_expression
      function: (identifier) @call.name) @call
"#;

const CPP_QUERY: &str = r#"
    ; Templated declarations before the class/function patterns they wrap
    (template_declaration
      (class_specifier
        name: (type_identifier) @name)) @definition.template

    ; In-class method definitions use field_identifier, out-of-line
    ; definitions a qualified_identifier
    (function_definition
      declarator: (function_declarator
        declarator: (field_identifier) @name)) @definition.method

    (function_definition
      declarator: (function_declarator
        declarator: (qualified_identifier
          name: (identifier) @name))) @definition.method

    (function_definition
      declarator: (function_declarator
        declarator: (identifier) @name)) @definition.function

    (function_definition
      declarator: (pointer_declarator
        declarator: (function_declarator
          declarator: (identifier) @name))) @definition.function

    (class_specifier
      name: (type_identifier) @name
      body: (field_declaration_list)) @definition.class

    (struct_specifier
      name: (type_identifier) @name
      body: (field_declaration_list)) @definition.struct

    (enum_specifier
      name: (type_identifier) @name
      body: (enumerator_list)) @definition.enum

    (union_specifier
      name: (type_identifier) @name
      body: (field_declaration_list)) @definition.union

    (namespace_definition
      name: (namespace_identifier) @name) @definition.namespace

    (type_definition
      declarator: (type_identifier) @name) @definition.typedef

    (preproc_function_def
      name: (identifier) @name) @definition.macro

    (preproc_def
      name: (identifier) @name) @definition.macro

    (preproc_include
      path: (string_literal) @import.source) @import

    (preproc_include
      path: (system_lib_string) @import.source) @import

    (call_expression
      function: (identifier) @call.name) @call

    (call_expression
      function: (field_expression
        field: (field_identifier) @call.name)) @call

    (call_expression
      function: (qualified_identifier
        name: (identifier) @call.name)) @call

    (class_specifier
      name: (type_identifier) @heritage.class
      (base_class_clause
        (type_identifier) @heritage.extends)) @heritage
"#;

const GO_QUERY: &str = r#"
    (function_declaration
      name: (identifier) @name) @definition.function

    (method_declaration
      name: (field_identifier) @name) @definition.method

    ; Typed specs before the generic type_spec fallback
    (type_declaration
      (type_spec
        name: (type_identifier) @name
        type: (struct_type))) @definition.struct

    (type_declaration
      (type_spec
        name: (type_identifier) @name
        type: (interface_type))) @definition.interface

    ; Named non-struct, non-interface types (type ID int, type Handler func...)
    (type_declaration
      (type_spec
        name: (type_identifier) @name
        type: [(type_identifier) (qualified_type) (map_type) (slice_type)
               (array_type) (pointer_type) (function_type) (channel_type)])) @definition.type_alias

    ; Package-level consts and vars only
    (source_file
      (const_declaration
        (const_spec
          name: (identifier) @name)) @definition.const)

    (source_file
      (var_declaration
        (var_spec
          name: (identifier) @name)) @definition.static)

    (import_spec
      path: (interpreted_string_literal) @import.source) @import

    (call_expression
      function: (identifier) @call.name) @call

    (call_expression
      function: (selector_expression
        field: (field_identifier) @call.name)) @call
"#;

const CSHARP_QUERY: &str = r#"
    (class_declaration
      name: (identifier) @name) @definition.class

    (interface_declaration
      name: (identifier) @name) @definition.interface

    (struct_declaration
      name: (identifier) @name) @definition.struct

    (enum_declaration
      name: (identifier) @name) @definition.enum

    (record_declaration
      name: (identifier) @name) @definition.record

    (delegate_declaration
      name: (identifier) @name) @definition.delegate

    (method_declaration
      name: (identifier) @name) @definition.method

    (constructor_declaration
      name: (identifier) @name) @definition.constructor

    (property_declaration
      name: (identifier) @name) @definition.property

    (namespace_declaration
      name: [(identifier) (qualified_name)] @name) @definition.namespace

    (file_scoped_namespace_declaration
      name: [(identifier) (qualified_name)] @name) @definition.namespace

    (using_directive
      [(identifier) (qualified_name)] @import.source) @import

    (invocation_expression
      function: (identifier) @call.name) @call

    (invocation_expression
      function: (member_access_expression
        name: (identifier) @call.name)) @call

    ; C# base lists mix the base class and interfaces; both surface as extends
    (class_declaration
      name: (identifier) @heritage.class
      (base_list
        (identifier) @heritage.extends)) @heritage

    (interface_declaration
      name: (identifier) @heritage.class
      (base_list
        (identifier) @heritage.extends)) @heritage
"#;

const RUST_QUERY: &str = r#"
    ; Methods live in impl/trait bodies; free functions are anchored to the
    ; source file or an inline module so the patterns never overlap
    (impl_item
      body: (declaration_list
        (function_item
          name: (identifier) @name) @definition.method))

    (trait_item
      body: (declaration_list
        (function_item
          name: (identifier) @name) @definition.method))

    (source_file
      (function_item
        name: (identifier) @name) @definition.function)

    (mod_item
      body: (declaration_list
        (function_item
          name: (identifier) @name) @definition.function))

    (struct_item
      name: (type_identifier) @name) @definition.struct

    (enum_item
      name: (type_identifier) @name) @definition.enum

    (trait_item
      name: (type_identifier) @name) @definition.trait

    (impl_item
      type: (type_identifier) @name) @definition.impl

    (mod_item
      name: (identifier) @name) @definition.module

    (type_item
      name: (type_identifier) @name) @definition.type_alias

    (const_item
      name: (identifier) @name) @definition.const

    (static_item
      name: (identifier) @name) @definition.static

    (macro_definition
      name: (identifier) @name) @definition.macro

    (union_item
      name: (type_identifier) @name) @definition.union

    (use_declaration
      argument: (_) @import.source) @import

    (call_expression
      function: (identifier) @call.name) @call

    (call_expression
      function: (field_expression
        field: (field_identifier) @call.name)) @call

    (call_expression
      function: (scoped_identifier
        name: (identifier) @call.name)) @call

    (macro_invocation
      macro: (identifier) @call.name) @call

    ; impl Trait for Type
    (impl_item
      trait: (type_identifier) @heritage.trait
      type: (type_identifier) @heritage.class) @heritage.impl

    ; trait Sub: Super
    (trait_item
      name: (type_identifier) @heritage.class
      bounds: (trait_bounds
        (type_identifier) @heritage.extends)) @heritage
"#;

const PHP_QUERY: &str = r#"
    (function_definition
      name: (name) @name) @definition.function

    (method_declaration
      name: (name) @name) @definition.method

    (class_declaration
      name: (name) @name) @definition.class

    (interface_declaration
      name: (name) @name) @definition.interface

    (trait_declaration
      name: (name) @name) @definition.trait

    (enum_declaration
      name: (name) @name) @definition.enum

    (namespace_definition
      name: (namespace_name) @name) @definition.namespace

    (namespace_use_declaration
      (namespace_use_clause
        [(qualified_name) (name)] @import.source)) @import

    (function_call_expression
      function: (name) @call.name) @call

    (member_call_expression
      name: (name) @call.name) @call

    (scoped_call_expression
      name: (name) @call.name) @call

    (class_declaration
      name: (name) @heritage.class
      (base_clause
        [(name) (qualified_name)] @heritage.extends)) @heritage

    (class_declaration
      name: (name) @heritage.class
      (class_interface_clause
        [(name) (qualified_name)] @heritage.implements)) @heritage
"#;

/// Swift. The grammar folds classes, structs, enums, and actors into
/// `class_declaration`; protocols map to the Interface label.
const SWIFT_QUERY: &str = r#"
    (function_declaration
      name: (simple_identifier) @name) @definition.function

    (class_declaration
      name: (type_identifier) @name) @definition.class

    (protocol_declaration
      name: (type_identifier) @name) @definition.interface

    (import_declaration
      (identifier) @import.source) @import

    (call_expression
      (simple_identifier) @call.name) @call

    (call_expression
      (navigation_expression
        (navigation_suffix
          (simple_identifier) @call.name))) @call

    (class_declaration
      name: (type_identifier) @heritage.class
      (inheritance_specifier
        (user_type
          (type_identifier) @heritage.extends))) @heritage
"#;

/// The raw pattern string for a grammar.
pub(crate) fn pattern_for(id: GrammarId) -> &'static str {
    match id {
        GrammarId::TypeScript | GrammarId::Tsx => TYPESCRIPT_QUERY,
        GrammarId::JavaScript => JAVASCRIPT_QUERY,
        GrammarId::Python => PYTHON_QUERY,
        GrammarId::Java => JAVA_QUERY,
        GrammarId::C => C_QUERY,
        GrammarId::Go => GO_QUERY,
        GrammarId::Cpp => CPP_QUERY,
        GrammarId::CSharp => CSHARP_QUERY,
        GrammarId::Rust => RUST_QUERY,
        GrammarId::Php => PHP_QUERY,
        GrammarId::Swift => SWIFT_QUERY,
    }
}

/// The compiled catalog query for a grammar, or `None` when compilation
/// failed (extraction is then disabled for that grammar; the file still
/// parses).
///
/// Queries compiled for one grammar cannot be used with another grammar's
/// trees, so TS and TSX compile the shared pattern string separately.
pub(crate) fn catalog_query(id: GrammarId) -> Option<&'static Query> {
    static COMPILED: [OnceLock<Option<Query>>; GRAMMAR_COUNT] =
        [const { OnceLock::new() }; GRAMMAR_COUNT];
    COMPILED[id.index()]
        .get_or_init(|| match Query::new(id.language(), pattern_for(id)) {
            Ok(query) => Some(query),
            Err(err) => {
                warn!(grammar = ?id, %err, "query compilation failed; extraction disabled");
                None
            }
        })
        .as_ref()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_GRAMMARS: [GrammarId; 12] = [
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
    ];

    #[test]
    fn test_every_catalog_query_compiles() {
        for id in ALL_GRAMMARS {
            assert!(
                catalog_query(id).is_some(),
                "catalog query for {:?} failed to compile",
                id
            );
        }
    }

    #[test]
    fn test_every_query_has_the_shared_capture_vocabulary() {
        for id in ALL_GRAMMARS {
            let query = catalog_query(id).unwrap();
            let names: Vec<&str> = query.capture_names().to_vec();
            assert!(names.contains(&"name"), "{:?} lacks @name", id);
            assert!(
                names.iter().any(|n| n.starts_with("definition.")),
                "{:?} lacks definition captures",
                id
            );
            assert!(names.contains(&"import.source"), "{:?} lacks @import.source", id);
            assert!(names.contains(&"call.name"), "{:?} lacks @call.name", id);
        }
    }

    #[test]
    fn test_heritage_captures_where_language_has_inheritance() {
        for id in [
            GrammarId::TypeScript,
            GrammarId::JavaScript,
            GrammarId::Python,
            GrammarId::Java,
            GrammarId::Cpp,
            GrammarId::CSharp,
            GrammarId::Rust,
            GrammarId::Php,
            GrammarId::Swift,
        ] {
            let query = catalog_query(id).unwrap();
            assert!(
                query.capture_names().contains(&"heritage.class"),
                "{:?} lacks heritage captures",
                id
            );
        }
    }

    #[test]
    fn test_c_has_no_heritage() {
        let query = catalog_query(GrammarId::C).unwrap();
        assert!(!query.capture_names().contains(&"heritage.class"));
    }
}
