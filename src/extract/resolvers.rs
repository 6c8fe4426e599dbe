//! Resolver extraction for decorator-based GraphQL backends.
//!
//! A class marked with a resolver decorator contributes one
//! [`ResolverBinding`] per method carrying a query, mutation or field
//! decorator. Method bodies are searched for RPC client calls:
//!
//! - `this.orderClient.createOrder(..)` -> `grpc:OrderService.CreateOrder`
//! - `this.client.getService('Billing').charge` -> `grpc:Billing.Charge`
//!
//! Files without a syntax tree go through a regex fallback that finds the
//! same decorators but no calls.

use regex::Regex;
use std::path::Path;
use tracing::debug;

use crate::config::{DecoratorConfig, NestjsConfig};
use crate::error::ExtractError;
use crate::graph::types::{ResolverBinding, ResolverKind};
use crate::ids;
use crate::scanner::{SourceFile, SourceKind};
use crate::syntax::visit::{walk_call, walk_member};
use crate::syntax::{CallExpr, ClassDecl, Decorator, MemberExpr, MethodDecl, SyntaxNode, Visit};

use super::{LayerOutput, LayerResult};

/// Resolver bindings declared in `files`.
pub fn extract_resolvers<'f>(
    files: impl IntoIterator<Item = &'f SourceFile>,
    config: &NestjsConfig,
) -> LayerResult<ResolverBinding> {
    let fallback = FallbackPatterns::new(&config.decorators)
        .map_err(|e| ExtractError::layer("resolver", e.to_string()))?;

    let mut output = LayerOutput::default();
    for file in files.into_iter().filter(|f| f.kind == SourceKind::Script) {
        let bindings = match &file.syntax {
            Some(program) => {
                let mut scan = ResolverScan::new(config, &file.path);
                scan.visit_program(program);
                scan.bindings
            }
            None => {
                let bindings = fallback.extract(&file.content, &file.path);
                if !bindings.is_empty() {
                    debug!(
                        path = %file.path.display(),
                        bindings = bindings.len(),
                        "resolvers found by textual fallback"
                    );
                }
                bindings
            }
        };
        output.push(Ok(bindings));
    }
    debug!(resolvers = output.entities.len(), "extracted resolvers");
    Ok(output)
}

fn marker_kind(decorator: &Decorator, markers: &DecoratorConfig) -> Option<ResolverKind> {
    if decorator.is_any(&markers.query) {
        Some(ResolverKind::Query)
    } else if decorator.is_any(&markers.mutation) {
        Some(ResolverKind::Mutation)
    } else if decorator.is_any(&markers.resolve_field) {
        Some(ResolverKind::Field)
    } else {
        None
    }
}

/// The first marked decorator, checked in query, mutation, field order.
fn method_marker<'d>(
    method: &'d MethodDecl,
    markers: &DecoratorConfig,
) -> Option<(ResolverKind, &'d Decorator)> {
    [ResolverKind::Query, ResolverKind::Mutation, ResolverKind::Field]
        .into_iter()
        .find_map(|kind| {
            method
                .decorators
                .iter()
                .find(|d| marker_kind(d, markers) == Some(kind))
                .map(|d| (kind, d))
        })
}

struct ResolverScan<'a> {
    config: &'a NestjsConfig,
    path: &'a Path,
    bindings: Vec<ResolverBinding>,
}

impl<'a> ResolverScan<'a> {
    fn new(config: &'a NestjsConfig, path: &'a Path) -> Self {
        Self {
            config,
            path,
            bindings: Vec::new(),
        }
    }

    fn binding(&self, owner: &str, method: &MethodDecl) -> Option<ResolverBinding> {
        let (kind, decorator) = method_marker(method, &self.config.decorators)?;
        let exposed_name = decorator
            .string_argument()
            .or_else(|| decorator.option("name"))
            .unwrap_or(method.name.as_str())
            .to_string();

        let mut calls = OutboundCalls::new(self.config);
        for node in &method.body {
            calls.visit_node(node);
        }

        Some(ResolverBinding {
            id: ids::resolver_id(owner, &method.name),
            owner_name: owner.to_string(),
            method_name: method.name.clone(),
            kind,
            exposed_name,
            source_file: self.path.to_path_buf(),
            outbound_calls: calls.finish(),
        })
    }
}

impl<'ast> Visit<'ast> for ResolverScan<'_> {
    fn visit_class(&mut self, class: &'ast ClassDecl) {
        let is_resolver = class
            .decorators
            .iter()
            .any(|d| d.is_any(&self.config.decorators.resolver));
        let Some(owner) = class.name.as_deref().filter(|_| is_resolver) else {
            return;
        };
        let found: Vec<ResolverBinding> = class
            .methods()
            .filter_map(|m| self.binding(owner, m))
            .collect();
        self.bindings.extend(found);
    }
}

/// Candidate RPC ids called from one method body.
struct OutboundCalls<'a> {
    hints: &'a [String],
    lookup: &'a str,
    calls: Vec<String>,
}

impl<'a> OutboundCalls<'a> {
    fn new(config: &'a NestjsConfig) -> Self {
        Self {
            hints: &config.call_hints,
            lookup: &config.service_lookup,
            calls: Vec::new(),
        }
    }

    fn push(&mut self, id: String) {
        if !self.calls.contains(&id) {
            self.calls.push(id);
        }
    }

    fn finish(self) -> Vec<String> {
        self.calls
    }

    /// `this.<member>` where the member name carries a client hint.
    fn client_member<'n>(&self, node: &'n SyntaxNode) -> Option<&'n str> {
        let SyntaxNode::Member(member) = node else {
            return None;
        };
        if !matches!(*member.object, SyntaxNode::This) {
            return None;
        }
        let lower = member.property.to_lowercase();
        self.hints
            .iter()
            .any(|hint| lower.contains(&hint.to_lowercase()))
            .then_some(member.property.as_str())
    }

    /// `<anything>.<lookup>('Service')`, returning the literal service name.
    fn looked_up_service<'n>(&self, node: &'n SyntaxNode) -> Option<&'n str> {
        let SyntaxNode::Call(call) = node else {
            return None;
        };
        match call.callee.as_ref() {
            SyntaxNode::Member(callee) if callee.property == self.lookup => {
                call.arguments.first().and_then(SyntaxNode::as_string)
            }
            _ => None,
        }
    }
}

impl<'ast> Visit<'ast> for OutboundCalls<'_> {
    fn visit_call(&mut self, call: &'ast CallExpr) {
        if let SyntaxNode::Member(callee) = call.callee.as_ref() {
            if callee.property != self.lookup {
                if let Some(member) = self.client_member(&callee.object) {
                    if let Some(id) = ids::rpc_id_from_member(member, &callee.property) {
                        self.push(id);
                    }
                }
            }
        }
        walk_call(self, call);
    }

    fn visit_member(&mut self, member: &'ast MemberExpr) {
        if let Some(service) = self.looked_up_service(&member.object) {
            if !service.is_empty() && !member.property.is_empty() {
                self.push(ids::rpc_id(service, &ids::title_case(&member.property)));
            }
        }
        walk_member(self, member);
    }

    // Nested classes are not part of this method's resolver.
    fn visit_class(&mut self, _class: &'ast ClassDecl) {}
}

/// Regex fallback for files that did not parse.
struct FallbackPatterns {
    class: Regex,
    method: Regex,
    markers: DecoratorConfig,
}

/// A decorator call, allowing one level of nested parentheses in its arguments.
const DECORATOR_ARGS: &str = r"\s*\(((?:[^()]|\([^()]*\))*)\)";

/// Any further decorators between a marker and the member it marks.
const OTHER_DECORATORS: &str = r"(?:\s*@\w+(?:\.\w+)*(?:\s*\((?:[^()]|\([^()]*\))*\))?)*";

impl FallbackPatterns {
    fn new(markers: &DecoratorConfig) -> Result<Self, regex::Error> {
        let alternation = |names: &[String]| {
            names
                .iter()
                .map(|n| regex::escape(n))
                .collect::<Vec<_>>()
                .join("|")
        };
        let class = Regex::new(&format!(
            r"@(?:{}){}\s*(?:export\s+)?(?:default\s+)?(?:abstract\s+)?class\s+(\w+)",
            alternation(&markers.resolver),
            DECORATOR_ARGS
        ))?;
        let method_markers: Vec<String> = markers
            .query
            .iter()
            .chain(&markers.mutation)
            .chain(&markers.resolve_field)
            .cloned()
            .collect();
        let method = Regex::new(&format!(
            r"@({}){}{}\s*(?:(?:public|private|protected)\s+)?(?:async\s+)?(\w+)\s*\(",
            alternation(&method_markers),
            DECORATOR_ARGS,
            OTHER_DECORATORS
        ))?;
        Ok(Self {
            class,
            method,
            markers: markers.clone(),
        })
    }

    fn kind_of(&self, marker: &str) -> Option<ResolverKind> {
        marker_kind(&Decorator::new(marker, Vec::new()), &self.markers)
    }

    fn extract(&self, content: &str, path: &Path) -> Vec<ResolverBinding> {
        // (match start, body start, class name)
        let classes: Vec<(usize, usize, &str)> = self
            .class
            .captures_iter(content)
            .filter_map(|c| {
                let whole = c.get(0)?;
                Some((whole.start(), whole.end(), c.get(2)?.as_str()))
            })
            .collect();

        let mut bindings = Vec::new();
        for (i, (_, start, owner)) in classes.iter().enumerate() {
            let end = classes
                .get(i + 1)
                .map(|(next, _, _)| *next)
                .unwrap_or(content.len());
            let Some(body) = content.get(*start..end) else {
                continue;
            };
            for caps in self.method.captures_iter(body) {
                let (Some(marker), Some(method)) = (caps.get(1), caps.get(3)) else {
                    continue;
                };
                let Some(kind) = self.kind_of(marker.as_str()) else {
                    continue;
                };
                let method = method.as_str();
                let exposed_name = caps
                    .get(2)
                    .and_then(|args| leading_string(args.as_str()))
                    .unwrap_or(method);
                bindings.push(ResolverBinding {
                    id: ids::resolver_id(owner, method),
                    owner_name: owner.to_string(),
                    method_name: method.to_string(),
                    kind,
                    exposed_name: exposed_name.to_string(),
                    source_file: path.to_path_buf(),
                    outbound_calls: Vec::new(),
                });
            }
        }
        bindings
    }
}

fn leading_string(args: &str) -> Option<&str> {
    let args = args.trim_start();
    let quote = args.chars().next().filter(|c| matches!(c, '\'' | '"' | '`'))?;
    let rest = &args[1..];
    let end = rest.find(quote)?;
    Some(&rest[..end]).filter(|s| !s.is_empty())
}
