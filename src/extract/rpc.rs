//! RPC method extraction from `.proto` service definitions.
//!
//! Structural regex matching over comment-stripped text; service bodies are
//! delimited by brace counting so nested option blocks do not end a service
//! early.

use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use crate::error::Warning;
use crate::graph::types::RpcMethod;
use crate::ids;
use crate::scanner::{SourceFile, SourceKind};

use super::{LayerOutput, LayerResult};

// Leftmost match wins, so whichever opener comes first decides the comment
// kind. String literals are matched only to be kept.
static COMMENT_OR_STRING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)"(?:[^"\\\n]|\\.)*"|//[^\n]*|/\*.*?\*/"#).expect("valid comment regex")
});
static PACKAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*package\s+([\w.]+)\s*;").expect("valid package regex")
});
static SERVICE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bservice\s+(\w+)\s*\{").expect("valid service regex"));
static RPC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\brpc\s+(\w+)\s*\(\s*([^)]+?)\s*\)\s*returns\s*\(\s*([^)]+?)\s*\)")
        .expect("valid rpc regex")
});
static STREAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^stream\s+").expect("valid stream regex"));

/// RPC methods of every interface-definition file in `files`.
pub fn extract_rpc_methods<'f>(
    files: impl IntoIterator<Item = &'f SourceFile>,
) -> LayerResult<RpcMethod> {
    let mut output = LayerOutput::default();
    for file in files
        .into_iter()
        .filter(|f| f.kind == SourceKind::InterfaceDefinition)
    {
        output.extend(parse_proto(file));
    }
    debug!(
        methods = output.entities.len(),
        warnings = output.warnings.len(),
        "extracted RPC methods"
    );
    Ok(output)
}

/// Methods of one file; malformed services are skipped with a warning.
pub fn parse_proto(file: &SourceFile) -> LayerOutput<RpcMethod> {
    let mut output = LayerOutput::default();
    let content = strip_comments(&file.content);
    let package = PACKAGE
        .captures(&content)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();

    let mut search_from = 0;
    while let Some(caps) = SERVICE.captures_at(&content, search_from) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            break;
        };
        let service = name.as_str();
        // The match ends just past the opening brace.
        let body_start = whole.end();
        let Some(body_end) = closing_brace(&content, body_start) else {
            output.warnings.push(Warning::new(format!(
                "Skipping malformed service {} in {}: unbalanced braces",
                service,
                file.path.display()
            )));
            break;
        };

        for rpc in RPC.captures_iter(&content[body_start..body_end]) {
            let (Some(method), Some(input), Some(out)) = (rpc.get(1), rpc.get(2), rpc.get(3))
            else {
                continue;
            };
            output.entities.push(RpcMethod {
                id: ids::rpc_id(service, method.as_str()),
                service_name: service.to_string(),
                method_name: method.as_str().to_string(),
                package_name: package.clone(),
                input_type: clean_type(input.as_str()),
                output_type: clean_type(out.as_str()),
                source_file: file.path.clone(),
            });
        }
        search_from = body_end + 1;
    }
    output
}

fn strip_comments(content: &str) -> String {
    COMMENT_OR_STRING
        .replace_all(content, |caps: &regex::Captures| {
            let matched = &caps[0];
            if matched.starts_with('"') {
                matched.to_string()
            } else {
                String::new()
            }
        })
        .into_owned()
}

/// Byte offset of the `}` closing a block whose body starts at `start`.
fn closing_brace(content: &str, start: usize) -> Option<usize> {
    let mut depth = 1usize;
    for (offset, ch) in content.get(start..)?.char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(start + offset);
                }
            }
            _ => {}
        }
    }
    None
}

fn clean_type(raw: &str) -> String {
    STREAM
        .replace(raw.trim(), "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
