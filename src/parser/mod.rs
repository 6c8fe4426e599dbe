//! Script parsing: tree-sitter front end producing [`crate::syntax::Program`].

pub mod language;
mod lower;

pub use language::ScriptLanguage;

use rayon::prelude::*;
use std::path::Path;
use tracing::{debug, trace};
use tree_sitter::Parser;

use crate::scanner::{SourceFile, SourceKind};
use crate::syntax::Program;

/// Parse a script source into a syntax tree.
///
/// Returns `None` for non-script paths, when the grammar cannot be loaded, or
/// when the source contains syntax errors. Callers fall back to textual
/// matching in that case.
pub fn parse_script(path: &Path, source: &str) -> Option<Program> {
    let language = ScriptLanguage::from_path(path)?;
    parse_with(language, source)
}

pub fn parse_with(language: ScriptLanguage, source: &str) -> Option<Program> {
    let mut parser = Parser::new();
    if let Err(e) = parser.set_language(&language.tree_sitter_language()) {
        debug!(language = language.name(), error = %e, "failed to load grammar");
        return None;
    }
    let tree = parser.parse(source, None)?;
    let root = tree.root_node();
    if root.has_error() {
        return None;
    }
    Some(lower::Lowerer::new(source).program(root))
}

/// Attach syntax trees to every script file, in parallel.
pub fn attach_syntax(files: &mut [SourceFile]) {
    files
        .par_iter_mut()
        .filter(|f| f.kind == SourceKind::Script)
        .for_each(|file| {
            file.syntax = parse_script(&file.path, &file.content);
            if file.syntax.is_none() {
                trace!(path = %file.path.display(), "no syntax tree, textual fallback");
            }
        });
    let parsed = files.iter().filter(|f| f.syntax.is_some()).count();
    debug!(parsed, total = files.len(), "attached syntax trees");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::visit::{walk_call, walk_tagged_template};
    use crate::syntax::{CallExpr, ClassDecl, ImportSpecifier, SyntaxNode, TaggedTemplate, Visit};

    #[derive(Default)]
    struct Collect<'a> {
        classes: Vec<&'a ClassDecl>,
        calls: Vec<&'a CallExpr>,
        templates: Vec<&'a TaggedTemplate>,
    }

    impl<'a> Visit<'a> for Collect<'a> {
        fn visit_class(&mut self, class: &'a ClassDecl) {
            self.classes.push(class);
            crate::syntax::visit::walk_class(self, class);
        }

        fn visit_call(&mut self, call: &'a CallExpr) {
            self.calls.push(call);
            walk_call(self, call);
        }

        fn visit_tagged_template(&mut self, template: &'a TaggedTemplate) {
            self.templates.push(template);
            walk_tagged_template(self, template);
        }
    }

    #[test]
    fn test_typescript_resolver_decorators() {
        let source = r#"
import { Resolver, Query, Args } from '@nestjs/graphql';

@Resolver(() => User)
export class UserResolver {
  constructor(private readonly userClient: UserClient) {}

  @Query(() => User, { name: 'user' })
  async getUser(@Args('id') id: string) {
    return this.userClient.getUser({ id });
  }
}
"#;
        let program = parse_script(Path::new("user.resolver.ts"), source).unwrap();
        let mut collect = Collect::default();
        collect.visit_program(&program);

        assert_eq!(collect.classes.len(), 1);
        let class = collect.classes[0];
        assert_eq!(class.name.as_deref(), Some("UserResolver"));
        assert_eq!(class.decorators[0].name, "Resolver");

        let methods: Vec<_> = class.methods().collect();
        let method = methods.iter().find(|m| m.name == "getUser").unwrap();
        assert_eq!(method.decorators.len(), 1);
        assert_eq!(method.decorators[0].name, "Query");
        assert_eq!(method.decorators[0].option("name"), Some("user"));
    }

    #[test]
    fn test_tagged_template_parts() {
        let source = "const Q = gql`\n  query GetUser { user { ...F } }\n  ${FRAGMENT}\n`;\n";
        let program = parse_script(Path::new("q.ts"), source).unwrap();
        let mut collect = Collect::default();
        collect.visit_program(&program);

        assert_eq!(collect.templates.len(), 1);
        let template = collect.templates[0];
        assert_eq!(template.tag.as_identifier(), Some("gql"));
        assert_eq!(template.quasis.len(), 2);
        assert!(template.quasis[0].contains("query GetUser"));
        assert_eq!(
            template.expressions,
            vec![SyntaxNode::Identifier("FRAGMENT".into())]
        );
    }

    #[test]
    fn test_imports_lowered() {
        let source = "import GetUser, { UpdateUser as Upd } from './user.graphql';\n";
        let program = parse_script(Path::new("page.tsx"), source).unwrap();
        let SyntaxNode::Import(import) = &program.body[0] else {
            panic!("expected import, got {:?}", program.body[0]);
        };
        assert_eq!(import.source, "./user.graphql");
        let locals: Vec<&str> = import.specifiers.iter().map(ImportSpecifier::local).collect();
        assert_eq!(locals, vec!["GetUser", "Upd"]);
    }

    #[test]
    fn test_javascript_hook_call() {
        let source = "export default function Page() { const r = useQuery(GET_USER); return r; }\n";
        let program = parse_script(Path::new("page.js"), source).unwrap();
        let mut collect = Collect::default();
        collect.visit_program(&program);
        let call = collect
            .calls
            .iter()
            .find(|c| c.callee.as_identifier() == Some("useQuery"))
            .unwrap();
        assert_eq!(call.arguments[0].as_identifier(), Some("GET_USER"));
    }

    #[test]
    fn test_syntax_error_yields_no_tree() {
        assert!(parse_script(Path::new("broken.ts"), "class { @@ (((").is_none());
        assert!(parse_script(Path::new("schema.graphql"), "type Query { a: Int }").is_none());
    }
}
