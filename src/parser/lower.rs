//! Lowering of tree-sitter concrete syntax trees into [`crate::syntax`].
//!
//! Handles the JavaScript and TypeScript grammars. The two disagree on where
//! method decorators live: the JavaScript grammar nests them inside
//! `method_definition`, the TypeScript grammar puts them before it as siblings
//! in `class_body`. Both shapes end up on [`MethodDecl::decorators`].

use tree_sitter::Node;

use crate::syntax::{
    CallExpr, ClassDecl, Decorator, ImportDecl, ImportSpecifier, MemberExpr, MethodDecl,
    Program, Property, SyntaxNode, TaggedTemplate,
};

pub(crate) struct Lowerer<'src> {
    source: &'src str,
}

impl<'src> Lowerer<'src> {
    pub(crate) fn new(source: &'src str) -> Self {
        Self { source }
    }

    pub(crate) fn program(&self, root: Node) -> Program {
        Program {
            body: self.children(root),
        }
    }

    fn text(&self, node: Node) -> &'src str {
        self.source.get(node.byte_range()).unwrap_or("")
    }

    fn children(&self, node: Node) -> Vec<SyntaxNode> {
        named_children(node)
            .into_iter()
            .filter_map(|child| self.lower(child))
            .collect()
    }

    fn lower(&self, node: Node) -> Option<SyntaxNode> {
        if node.is_extra() {
            return None;
        }
        match node.kind() {
            "import_statement" => self.import(node).map(SyntaxNode::Import),
            "export_statement" => self.export(node),
            "class_declaration" | "abstract_class_declaration" | "class" => {
                Some(SyntaxNode::Class(self.class(node, Vec::new())))
            }
            "method_definition" => Some(SyntaxNode::Method(self.method(node, Vec::new()))),
            "call_expression" => Some(self.call(node)),
            "member_expression" => Some(self.member(node)),
            "identifier" | "shorthand_property_identifier" => {
                Some(SyntaxNode::Identifier(self.text(node).to_string()))
            }
            "this" => Some(SyntaxNode::This),
            "string" => Some(SyntaxNode::StringLiteral(unquote(self.text(node)).to_string())),
            "template_string" => Some(self.template(node)),
            "object" => Some(self.object(node)),
            _ => {
                let children = self.children(node);
                if children.is_empty() {
                    None
                } else {
                    Some(SyntaxNode::Other(children))
                }
            }
        }
    }

    fn import(&self, node: Node) -> Option<ImportDecl> {
        let source = node.child_by_field_name("source")?;
        let mut specifiers = Vec::new();
        for child in named_children(node) {
            if child.kind() != "import_clause" {
                continue;
            }
            for clause in named_children(child) {
                match clause.kind() {
                    "identifier" => {
                        specifiers.push(ImportSpecifier::Default(self.text(clause).to_string()))
                    }
                    "namespace_import" => {
                        if let Some(name) = named_children(clause)
                            .into_iter()
                            .find(|n| n.kind() == "identifier")
                        {
                            specifiers
                                .push(ImportSpecifier::Namespace(self.text(name).to_string()));
                        }
                    }
                    "named_imports" => {
                        for spec in named_children(clause)
                            .into_iter()
                            .filter(|n| n.kind() == "import_specifier")
                        {
                            let Some(name) = spec.child_by_field_name("name") else {
                                continue;
                            };
                            let imported = unquote(self.text(name)).to_string();
                            let local = spec
                                .child_by_field_name("alias")
                                .map(|alias| self.text(alias).to_string())
                                .unwrap_or_else(|| imported.clone());
                            specifiers.push(ImportSpecifier::Named { imported, local });
                        }
                    }
                    _ => {}
                }
            }
        }
        Some(ImportDecl {
            source: unquote(self.text(source)).to_string(),
            specifiers,
        })
    }

    /// `@Dec export class X {}` carries the class decorators on the export.
    fn export(&self, node: Node) -> Option<SyntaxNode> {
        let decorators: Vec<Decorator> = named_children(node)
            .into_iter()
            .filter(|n| n.kind() == "decorator")
            .filter_map(|n| self.decorator(n))
            .collect();

        match node.child_by_field_name("declaration") {
            Some(decl)
                if matches!(
                    decl.kind(),
                    "class_declaration" | "abstract_class_declaration"
                ) =>
            {
                Some(SyntaxNode::Class(self.class(decl, decorators)))
            }
            _ => {
                let children: Vec<SyntaxNode> = named_children(node)
                    .into_iter()
                    .filter(|n| n.kind() != "decorator")
                    .filter_map(|n| self.lower(n))
                    .collect();
                if children.is_empty() {
                    None
                } else {
                    Some(SyntaxNode::Other(children))
                }
            }
        }
    }

    fn class(&self, node: Node, mut decorators: Vec<Decorator>) -> ClassDecl {
        decorators.extend(
            named_children(node)
                .into_iter()
                .filter(|n| n.kind() == "decorator")
                .filter_map(|n| self.decorator(n)),
        );

        let mut members = Vec::new();
        if let Some(body) = node.child_by_field_name("body") {
            let mut pending = Vec::new();
            for member in named_children(body) {
                match member.kind() {
                    "decorator" => pending.extend(self.decorator(member)),
                    "method_definition" => {
                        let leading = std::mem::take(&mut pending);
                        members.push(SyntaxNode::Method(self.method(member, leading)));
                    }
                    _ => {
                        pending.clear();
                        if let Some(lowered) = self.lower(member) {
                            members.push(lowered);
                        }
                    }
                }
            }
        }

        ClassDecl {
            name: node
                .child_by_field_name("name")
                .map(|n| self.text(n).to_string()),
            decorators,
            members,
        }
    }

    fn method(&self, node: Node, mut decorators: Vec<Decorator>) -> MethodDecl {
        decorators.extend(
            named_children(node)
                .into_iter()
                .filter(|n| n.kind() == "decorator")
                .filter_map(|n| self.decorator(n)),
        );
        let body = node
            .child_by_field_name("body")
            .map(|b| self.children(b))
            .unwrap_or_default();
        MethodDecl {
            name: node
                .child_by_field_name("name")
                .map(|n| unquote(self.text(n)).to_string())
                .unwrap_or_default(),
            decorators,
            body,
        }
    }

    fn decorator(&self, node: Node) -> Option<Decorator> {
        let expr = named_children(node).into_iter().next()?;
        match expr.kind() {
            "call_expression" => {
                let callee = expr.child_by_field_name("function")?;
                let name = self.lower(callee)?.terminal_name()?.to_string();
                let arguments = expr
                    .child_by_field_name("arguments")
                    .map(|args| self.children(args))
                    .unwrap_or_default();
                Some(Decorator::new(name, arguments))
            }
            _ => {
                let name = self.lower(expr)?.terminal_name()?.to_string();
                Some(Decorator::new(name, Vec::new()))
            }
        }
    }

    fn call(&self, node: Node) -> SyntaxNode {
        let callee = node
            .child_by_field_name("function")
            .and_then(|f| self.lower(f))
            .unwrap_or(SyntaxNode::Other(Vec::new()));
        let Some(args) = node.child_by_field_name("arguments") else {
            return SyntaxNode::Call(CallExpr {
                callee: Box::new(callee),
                arguments: Vec::new(),
            });
        };

        if args.kind() == "template_string" {
            let (quasis, expressions) = self.template_parts(args);
            return SyntaxNode::TaggedTemplate(TaggedTemplate {
                tag: Box::new(callee),
                quasis,
                expressions,
            });
        }

        SyntaxNode::Call(CallExpr {
            callee: Box::new(callee),
            arguments: self.children(args),
        })
    }

    fn member(&self, node: Node) -> SyntaxNode {
        let object = node
            .child_by_field_name("object")
            .and_then(|o| self.lower(o))
            .unwrap_or(SyntaxNode::Other(Vec::new()));
        let property = node
            .child_by_field_name("property")
            .map(|p| self.text(p).to_string())
            .unwrap_or_default();
        SyntaxNode::Member(MemberExpr {
            object: Box::new(object),
            property,
        })
    }

    /// An untagged template: plain text when it has no interpolation,
    /// otherwise a container of the interpolated expressions.
    fn template(&self, node: Node) -> SyntaxNode {
        let (quasis, expressions) = self.template_parts(node);
        if expressions.is_empty() && quasis.len() == 1 {
            SyntaxNode::StringLiteral(quasis.into_iter().collect())
        } else {
            SyntaxNode::Other(expressions)
        }
    }

    /// Split a `template_string` into its static chunks and interpolations.
    fn template_parts(&self, node: Node) -> (Vec<String>, Vec<SyntaxNode>) {
        let range = node.byte_range();
        // Skip the backticks.
        let mut cursor = range.start + 1;
        let end = range.end.saturating_sub(1).max(cursor);

        let mut quasis = Vec::new();
        let mut expressions = Vec::new();
        for sub in named_children(node)
            .into_iter()
            .filter(|n| n.kind() == "template_substitution")
        {
            quasis.push(self.slice(cursor, sub.start_byte()));
            expressions.push(
                self.children(sub)
                    .into_iter()
                    .next()
                    .unwrap_or(SyntaxNode::Other(Vec::new())),
            );
            cursor = sub.end_byte();
        }
        quasis.push(self.slice(cursor, end));
        (quasis, expressions)
    }

    fn slice(&self, start: usize, end: usize) -> String {
        self.source.get(start..end).unwrap_or("").to_string()
    }

    fn object(&self, node: Node) -> SyntaxNode {
        let mut properties = Vec::new();
        for child in named_children(node) {
            match child.kind() {
                "pair" => {
                    let key = child
                        .child_by_field_name("key")
                        .map(|k| unquote(self.text(k)).to_string());
                    let value = child.child_by_field_name("value").and_then(|v| self.lower(v));
                    if let (Some(key), Some(value)) = (key, value) {
                        properties.push(Property { key, value });
                    }
                }
                "shorthand_property_identifier" => {
                    let name = self.text(child).to_string();
                    properties.push(Property {
                        key: name.clone(),
                        value: SyntaxNode::Identifier(name),
                    });
                }
                _ => {
                    if let Some(value) = self.lower(child) {
                        properties.push(Property {
                            key: String::new(),
                            value,
                        });
                    }
                }
            }
        }
        SyntaxNode::Object(properties)
    }
}

fn named_children(node: Node) -> Vec<Node> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

fn unquote(text: &str) -> &str {
    let trimmed = text.trim();
    for quote in ['\'', '"', '`'] {
        if let Some(inner) = trimmed
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    trimmed
}
