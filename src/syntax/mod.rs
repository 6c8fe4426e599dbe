//! Parser-independent syntax tree for script sources.
//!
//! Extractors only ever see these types. The tree-sitter front end in
//! [`crate::parser`] lowers its concrete trees into a [`Program`]; anything the
//! extractors do not care about is kept as an [`SyntaxNode::Other`] container
//! so walks still reach nested calls and templates.

pub mod ast;
pub mod visit;

pub use ast::{
    CallExpr, ClassDecl, Decorator, ImportDecl, ImportSpecifier, MemberExpr, MethodDecl,
    Program, Property, SyntaxNode, TaggedTemplate,
};
pub use visit::Visit;
