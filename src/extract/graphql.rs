//! GraphQL operation extraction.
//!
//! Operations come from three places: standalone documents (`.graphql`,
//! `.gql`), tagged templates in code (`gql`...``), and hook calls whose first
//! argument is a bare identifier (`useQuery(GET_USER)`). The last kind is a
//! naming guess, not a resolved reference.

use async_graphql::parser::parse_query;
use async_graphql::parser::types::{
    DocumentOperations, ExecutableDocument, OperationDefinition, OperationType, Selection,
};
use async_graphql::Positioned;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, trace};

use crate::config::GraphqlConfig;
use crate::error::Warning;
use crate::graph::types::{GraphQLOperation, OperationKind};
use crate::ids;
use crate::scanner::{SourceFile, SourceKind};
use crate::syntax::visit::{walk_call, walk_tagged_template};
use crate::syntax::{CallExpr, ImportDecl, ImportSpecifier, SyntaxNode, TaggedTemplate, Visit};

use super::{LayerOutput, LayerResult};

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{[^}]*\}").expect("valid placeholder regex"));

/// Prefix of the raw text recorded for hook arguments that were not resolved.
pub const UNRESOLVED_PREFIX: &str = "unresolved reference: ";

/// All operations in `files`, documents and scripts alike.
pub fn extract_operations(files: &[SourceFile], config: &GraphqlConfig) -> LayerResult<GraphQLOperation> {
    let mut output = LayerOutput::default();
    for file in files {
        match file.kind {
            SourceKind::Document => output.push(operations_in_document(file)),
            SourceKind::Script => output.push(Ok(operations_in_script(file, config))),
            SourceKind::InterfaceDefinition => {}
        }
    }
    debug!(
        operations = output.entities.len(),
        warnings = output.warnings.len(),
        "extracted GraphQL operations"
    );
    Ok(output)
}

/// Every operation in a standalone document. A parse failure is a warning.
///
/// Definitions are parsed one at a time so fragment-only files, repeated
/// operation names and schema definitions do not hide the operations next
/// to them.
pub fn operations_in_document(file: &SourceFile) -> Result<Vec<GraphQLOperation>, Warning> {
    let mut operations = Vec::new();
    for definition in split_definitions(&file.content) {
        match leading_keyword(definition) {
            // A fragment alone is not an executable document.
            "fragment" => {
                parse_query(format!("{}\n{{ __typename }}", definition))
                    .map_err(|e| parse_failure(file, e))?;
            }
            keyword if TYPE_SYSTEM_KEYWORDS.contains(&keyword) => {
                trace!(path = %file.path.display(), keyword, "skipping type system definition");
            }
            _ => {
                let document = parse_query(definition).map_err(|e| parse_failure(file, e))?;
                operations.extend(
                    ordered_operations(&document)
                        .into_iter()
                        .filter_map(|(name, op)| operation(name, op, &file.path, &file.content)),
                );
            }
        }
    }
    Ok(operations)
}

fn parse_failure(file: &SourceFile, error: impl std::fmt::Display) -> Warning {
    Warning::new(format!(
        "Failed to parse GraphQL in {}: {}",
        file.path.display(),
        error
    ))
}

const DEFINITION_KEYWORDS: &[&str] = &[
    "query",
    "mutation",
    "subscription",
    "fragment",
    "schema",
    "scalar",
    "type",
    "interface",
    "union",
    "enum",
    "input",
    "directive",
    "extend",
];

const TYPE_SYSTEM_KEYWORDS: &[&str] = &[
    "schema",
    "scalar",
    "type",
    "interface",
    "union",
    "enum",
    "input",
    "directive",
    "extend",
];

/// Split a document into its top-level definitions.
///
/// A definition ends at the `}` that returns to depth zero, or where the
/// next definition keyword starts at depth zero (`scalar`, `union` and
/// `directive` have no body). Strings and `#` comments are skipped.
/// Trailing text that never closes is returned as its own chunk.
fn split_definitions(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut depth = 0usize;
    let mut has_content = false;
    let mut prev_word: Option<&str> = None;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'#' => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
                continue;
            }
            // A description belongs to the definition that follows it.
            b'"' => {
                i = skip_string(bytes, i);
                continue;
            }
            b'{' | b'(' | b'[' => {
                depth += 1;
                has_content = true;
            }
            b'}' | b')' | b']' => {
                depth = depth.saturating_sub(1);
                has_content = true;
                if depth == 0 && bytes[i] == b'}' {
                    chunks.push(&text[start..=i]);
                    start = i + 1;
                    has_content = false;
                    prev_word = None;
                }
            }
            b if b.is_ascii_alphabetic() || b == b'_' => {
                let end = i + bytes[i..]
                    .iter()
                    .position(|c| !(c.is_ascii_alphanumeric() || *c == b'_'))
                    .unwrap_or(bytes.len() - i);
                let word = &text[i..end];
                let sigil = i > 0 && matches!(bytes[i - 1], b'$' | b'@');
                if depth == 0
                    && has_content
                    && !sigil
                    && prev_word != Some("extend")
                    && DEFINITION_KEYWORDS.contains(&word)
                {
                    chunks.push(&text[start..i]);
                    start = i;
                }
                has_content = true;
                prev_word = Some(word);
                i = end;
                continue;
            }
            b if b.is_ascii_whitespace() || b == b',' => {}
            _ => has_content = true,
        }
        i += 1;
    }
    if has_content {
        chunks.push(&text[start..]);
    }

    chunks
        .into_iter()
        .map(str::trim)
        .filter(|chunk| !chunk.is_empty())
        .collect()
}

/// Offset just past the string starting at `start` (plain or block).
fn skip_string(bytes: &[u8], start: usize) -> usize {
    if bytes[start..].starts_with(b"\"\"\"") {
        let mut i = start + 3;
        while i < bytes.len() {
            if bytes[i] == b'\\' && bytes[i + 1..].starts_with(b"\"\"\"") {
                i += 4;
            } else if bytes[i..].starts_with(b"\"\"\"") {
                return i + 3;
            } else {
                i += 1;
            }
        }
        return bytes.len();
    }
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => return i + 1,
            b'\n' => return i,
            _ => i += 1,
        }
    }
    bytes.len()
}

/// First keyword of a definition, or `{` for the query shorthand.
/// Descriptions and comments before it are skipped.
fn leading_keyword(definition: &str) -> &str {
    let bytes = definition.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'#' => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'"' => i = skip_string(bytes, i),
            b'{' => return &definition[i..=i],
            b if b.is_ascii_alphabetic() || b == b'_' => {
                let end = i + bytes[i..]
                    .iter()
                    .position(|c| !(c.is_ascii_alphanumeric() || *c == b'_'))
                    .unwrap_or(bytes.len() - i);
                return &definition[i..end];
            }
            b if b.is_ascii_whitespace() || b == b',' => i += 1,
            _ => return "",
        }
    }
    ""
}

/// Operations embedded in a script's syntax tree. Files without a tree
/// contribute nothing.
pub fn operations_in_script(file: &SourceFile, config: &GraphqlConfig) -> Vec<GraphQLOperation> {
    let Some(program) = &file.syntax else {
        return Vec::new();
    };
    let mut scan = ScriptScan::new(config, &file.path);
    scan.visit_program(program);
    scan.operations
}

/// Operation ids a screen file depends on: embedded operations, hook
/// references, and bindings imported from GraphQL documents. Each id
/// appears once, in the order first seen.
pub fn discover_dependencies(file: &SourceFile, config: &GraphqlConfig) -> Vec<String> {
    let Some(program) = &file.syntax else {
        return Vec::new();
    };
    let mut scan = ScriptScan::new(config, &file.path);
    scan.visit_program(program);

    let mut seen = std::collections::HashSet::new();
    scan.dependencies
        .into_iter()
        .filter(|id| seen.insert(id.clone()))
        .collect()
}

/// Parse template text, ignoring interpolations. Returns the first operation
/// only; text that is not a valid operation document yields `None`.
pub fn parse_embedded(text: &str, source_file: &Path) -> Option<GraphQLOperation> {
    let cleaned = PLACEHOLDER.replace_all(text, "");
    match parse_query(cleaned.as_ref()) {
        Ok(document) => ordered_operations(&document)
            .into_iter()
            .next()
            .and_then(|(name, op)| operation(name, op, source_file, text)),
        Err(e) => {
            trace!(path = %source_file.display(), error = %e, "discarding partial template");
            None
        }
    }
}

/// Operations in source order. Anonymous documents have exactly one.
fn ordered_operations(
    document: &ExecutableDocument,
) -> Vec<(Option<&str>, &Positioned<OperationDefinition>)> {
    match &document.operations {
        DocumentOperations::Single(op) => vec![(None, op)],
        DocumentOperations::Multiple(ops) => {
            let mut ops: Vec<_> = ops
                .iter()
                .map(|(name, op)| (Some(name.as_str()), op))
                .collect();
            ops.sort_by_key(|(_, op)| (op.pos.line, op.pos.column));
            ops
        }
    }
}

fn operation(
    name: Option<&str>,
    op: &Positioned<OperationDefinition>,
    source_file: &Path,
    raw_text: &str,
) -> Option<GraphQLOperation> {
    let kind = match op.node.ty {
        OperationType::Query => OperationKind::Query,
        OperationType::Mutation => OperationKind::Mutation,
        OperationType::Subscription => OperationKind::Subscription,
    };
    let first_field = op
        .node
        .selection_set
        .node
        .items
        .first()
        .and_then(|selection| match &selection.node {
            Selection::Field(field) => Some(field.node.name.node.as_str()),
            _ => None,
        });
    let field_name = name.or(first_field).filter(|n| !n.is_empty())?;

    Some(GraphQLOperation {
        id: ids::operation_id(kind, field_name),
        operation_kind: kind,
        field_name: field_name.to_string(),
        operation_name: name.map(str::to_string),
        source_file: source_file.to_path_buf(),
        raw_text: raw_text.to_string(),
    })
}

fn is_hook(name: &str) -> bool {
    name.starts_with("use") && (name.contains("Query") || name.contains("Mutation"))
}

fn hook_reference(hook: &str, reference: &str, source_file: &Path) -> GraphQLOperation {
    let kind = if hook.contains("Mutation") {
        OperationKind::Mutation
    } else {
        OperationKind::Query
    };
    GraphQLOperation {
        id: ids::operation_id(kind, reference),
        operation_kind: kind,
        field_name: reference.to_string(),
        operation_name: None,
        source_file: source_file.to_path_buf(),
        raw_text: format!("{}{}", UNRESOLVED_PREFIX, reference),
    }
}

struct ScriptScan<'a> {
    config: &'a GraphqlConfig,
    path: &'a Path,
    operations: Vec<GraphQLOperation>,
    dependencies: Vec<String>,
}

impl<'a> ScriptScan<'a> {
    fn new(config: &'a GraphqlConfig, path: &'a Path) -> Self {
        Self {
            config,
            path,
            operations: Vec::new(),
            dependencies: Vec::new(),
        }
    }

    fn is_operation_tag(&self, tag: &SyntaxNode) -> bool {
        tag.as_identifier()
            .is_some_and(|name| self.config.tag_names.iter().any(|t| t == name))
    }

    fn record(&mut self, op: GraphQLOperation) {
        self.dependencies.push(op.id.clone());
        self.operations.push(op);
    }
}

impl<'ast> Visit<'ast> for ScriptScan<'_> {
    fn visit_tagged_template(&mut self, template: &'ast TaggedTemplate) {
        if self.is_operation_tag(&template.tag) {
            if let Some(op) = parse_embedded(&template.text_with_placeholders(), self.path) {
                self.record(op);
            }
        }
        walk_tagged_template(self, template);
    }

    // Tagged-template arguments are reached by the walk; only bare
    // identifiers need handling here.
    fn visit_call(&mut self, call: &'ast CallExpr) {
        if let Some(hook) = call.callee.as_identifier().filter(|n| is_hook(n)) {
            if let Some(reference) = call.arguments.first().and_then(SyntaxNode::as_identifier) {
                self.record(hook_reference(hook, reference, self.path));
            }
        }
        walk_call(self, call);
    }

    fn visit_import(&mut self, import: &'ast ImportDecl) {
        let is_document = self
            .config
            .document_extensions
            .iter()
            .any(|ext| import.source.ends_with(ext.as_str()));
        if !is_document {
            return;
        }
        for spec in &import.specifiers {
            if let ImportSpecifier::Default(local) | ImportSpecifier::Named { local, .. } = spec {
                let kind = ids::guess_operation_kind(local);
                self.dependencies.push(ids::operation_id(kind, local));
            }
        }
    }
}
