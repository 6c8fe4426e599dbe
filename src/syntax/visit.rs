//! Read-only traversal over [`Program`].
//!
//! Every `visit_*` method defaults to the matching `walk_*` function, which
//! recurses into the children. Override a method to observe a node kind, and
//! call the `walk_*` function from the override to keep descending.

use super::ast::*;

pub trait Visit<'ast> {
    fn visit_program(&mut self, program: &'ast Program) {
        walk_program(self, program);
    }

    fn visit_node(&mut self, node: &'ast SyntaxNode) {
        walk_node(self, node);
    }

    fn visit_import(&mut self, _import: &'ast ImportDecl) {}

    fn visit_class(&mut self, class: &'ast ClassDecl) {
        walk_class(self, class);
    }

    fn visit_method(&mut self, method: &'ast MethodDecl) {
        walk_method(self, method);
    }

    fn visit_decorator(&mut self, decorator: &'ast Decorator) {
        walk_decorator(self, decorator);
    }

    fn visit_call(&mut self, call: &'ast CallExpr) {
        walk_call(self, call);
    }

    fn visit_member(&mut self, member: &'ast MemberExpr) {
        walk_member(self, member);
    }

    fn visit_tagged_template(&mut self, template: &'ast TaggedTemplate) {
        walk_tagged_template(self, template);
    }
}

pub fn walk_program<'ast, V: Visit<'ast> + ?Sized>(v: &mut V, program: &'ast Program) {
    for node in &program.body {
        v.visit_node(node);
    }
}

pub fn walk_node<'ast, V: Visit<'ast> + ?Sized>(v: &mut V, node: &'ast SyntaxNode) {
    match node {
        SyntaxNode::Import(import) => v.visit_import(import),
        SyntaxNode::Class(class) => v.visit_class(class),
        SyntaxNode::Method(method) => v.visit_method(method),
        SyntaxNode::Call(call) => v.visit_call(call),
        SyntaxNode::Member(member) => v.visit_member(member),
        SyntaxNode::TaggedTemplate(template) => v.visit_tagged_template(template),
        SyntaxNode::Object(properties) => {
            for property in properties {
                v.visit_node(&property.value);
            }
        }
        SyntaxNode::Other(children) => {
            for child in children {
                v.visit_node(child);
            }
        }
        SyntaxNode::Identifier(_) | SyntaxNode::StringLiteral(_) | SyntaxNode::This => {}
    }
}

pub fn walk_class<'ast, V: Visit<'ast> + ?Sized>(v: &mut V, class: &'ast ClassDecl) {
    for decorator in &class.decorators {
        v.visit_decorator(decorator);
    }
    for member in &class.members {
        v.visit_node(member);
    }
}

pub fn walk_method<'ast, V: Visit<'ast> + ?Sized>(v: &mut V, method: &'ast MethodDecl) {
    for decorator in &method.decorators {
        v.visit_decorator(decorator);
    }
    for node in &method.body {
        v.visit_node(node);
    }
}

pub fn walk_decorator<'ast, V: Visit<'ast> + ?Sized>(v: &mut V, decorator: &'ast Decorator) {
    for arg in &decorator.arguments {
        v.visit_node(arg);
    }
}

pub fn walk_call<'ast, V: Visit<'ast> + ?Sized>(v: &mut V, call: &'ast CallExpr) {
    v.visit_node(&call.callee);
    for arg in &call.arguments {
        v.visit_node(arg);
    }
}

pub fn walk_member<'ast, V: Visit<'ast> + ?Sized>(v: &mut V, member: &'ast MemberExpr) {
    v.visit_node(&member.object);
}

pub fn walk_tagged_template<'ast, V: Visit<'ast> + ?Sized>(
    v: &mut V,
    template: &'ast TaggedTemplate,
) {
    v.visit_node(&template.tag);
    for expr in &template.expressions {
        v.visit_node(expr);
    }
}
