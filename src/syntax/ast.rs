use std::fmt;

/// A parsed script file: its top-level statements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    pub body: Vec<SyntaxNode>,
}

/// Tagged union over the expression and declaration shapes the extractors
/// recognise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxNode {
    Import(ImportDecl),
    Class(ClassDecl),
    Method(MethodDecl),
    Call(CallExpr),
    Member(MemberExpr),
    TaggedTemplate(TaggedTemplate),
    Identifier(String),
    /// String literal with quotes removed. Templates without interpolation
    /// are lowered to this too.
    StringLiteral(String),
    Object(Vec<Property>),
    This,
    /// Any other construct, keeping its children in source order.
    Other(Vec<SyntaxNode>),
}

impl SyntaxNode {
    pub fn as_identifier(&self) -> Option<&str> {
        match self {
            SyntaxNode::Identifier(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            SyntaxNode::StringLiteral(value) => Some(value),
            _ => None,
        }
    }

    /// Last name in a callee path: `foo` for `foo`, `bar` for `a.b.bar`.
    pub fn terminal_name(&self) -> Option<&str> {
        match self {
            SyntaxNode::Identifier(name) => Some(name),
            SyntaxNode::Member(member) => Some(&member.property),
            _ => None,
        }
    }

    /// Value of a string-valued `key` in an object literal.
    pub fn object_string(&self, key: &str) -> Option<&str> {
        match self {
            SyntaxNode::Object(properties) => properties
                .iter()
                .find(|p| p.key == key)
                .and_then(|p| p.value.as_string()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDecl {
    pub source: String,
    pub specifiers: Vec<ImportSpecifier>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportSpecifier {
    Default(String),
    Named { imported: String, local: String },
    Namespace(String),
}

impl ImportSpecifier {
    /// The name the import is bound to in the importing module.
    pub fn local(&self) -> &str {
        match self {
            ImportSpecifier::Default(local)
            | ImportSpecifier::Named { local, .. }
            | ImportSpecifier::Namespace(local) => local,
        }
    }
}

/// `@Name(args)` or bare `@Name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decorator {
    /// Identifier of the decorator, or the last segment of a member path
    /// (`Query` for `@graphql.Query()`).
    pub name: String,
    pub arguments: Vec<SyntaxNode>,
}

impl Decorator {
    pub fn new(name: impl Into<String>, arguments: Vec<SyntaxNode>) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }

    pub fn is_any(&self, names: &[String]) -> bool {
        names.iter().any(|n| *n == self.name)
    }

    /// First string-literal argument.
    pub fn string_argument(&self) -> Option<&str> {
        self.arguments.iter().find_map(SyntaxNode::as_string)
    }

    /// `key` of the first object-literal argument that has it as a string.
    pub fn option(&self, key: &str) -> Option<&str> {
        self.arguments.iter().find_map(|arg| arg.object_string(key))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDecl {
    pub name: Option<String>,
    pub decorators: Vec<Decorator>,
    pub members: Vec<SyntaxNode>,
}

impl ClassDecl {
    pub fn methods(&self) -> impl Iterator<Item = &MethodDecl> {
        self.members.iter().filter_map(|m| match m {
            SyntaxNode::Method(method) => Some(method),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDecl {
    pub name: String,
    pub decorators: Vec<Decorator>,
    pub body: Vec<SyntaxNode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallExpr {
    pub callee: Box<SyntaxNode>,
    pub arguments: Vec<SyntaxNode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberExpr {
    pub object: Box<SyntaxNode>,
    pub property: String,
}

/// ``tag`...${expr}...` ``. `quasis` always has one more element than
/// `expressions`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedTemplate {
    pub tag: Box<SyntaxNode>,
    pub quasis: Vec<String>,
    pub expressions: Vec<SyntaxNode>,
}

impl TaggedTemplate {
    /// Static text with `${...}` standing in for each interpolation.
    pub fn text_with_placeholders(&self) -> String {
        let mut text = String::new();
        for (i, quasi) in self.quasis.iter().enumerate() {
            if i > 0 {
                text.push_str("${...}");
            }
            text.push_str(quasi);
        }
        text
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub key: String,
    pub value: SyntaxNode,
}

impl fmt::Display for SyntaxNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyntaxNode::Identifier(name) => write!(f, "{}", name),
            SyntaxNode::StringLiteral(value) => write!(f, "'{}'", value),
            SyntaxNode::This => write!(f, "this"),
            SyntaxNode::Member(member) => write!(f, "{}.{}", member.object, member.property),
            SyntaxNode::Call(call) => write!(f, "{}(..)", call.callee),
            SyntaxNode::Import(import) => write!(f, "import '{}'", import.source),
            SyntaxNode::Class(class) => {
                write!(f, "class {}", class.name.as_deref().unwrap_or("<anonymous>"))
            }
            SyntaxNode::Method(method) => write!(f, "{}()", method.name),
            SyntaxNode::TaggedTemplate(template) => write!(f, "{}`..`", template.tag),
            SyntaxNode::Object(_) => write!(f, "{{..}}"),
            SyntaxNode::Other(_) => write!(f, ".."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_text() {
        let template = TaggedTemplate {
            tag: Box::new(SyntaxNode::Identifier("gql".into())),
            quasis: vec!["query { ".into(), " user }".into()],
            expressions: vec![SyntaxNode::Identifier("FRAGMENT".into())],
        };
        assert_eq!(template.text_with_placeholders(), "query { ${...} user }");
    }

    #[test]
    fn test_decorator_arguments() {
        let decorator = Decorator::new(
            "Query",
            vec![
                SyntaxNode::Other(vec![SyntaxNode::Identifier("User".into())]),
                SyntaxNode::Object(vec![Property {
                    key: "name".into(),
                    value: SyntaxNode::StringLiteral("viewer".into()),
                }]),
            ],
        );
        assert_eq!(decorator.string_argument(), None);
        assert_eq!(decorator.option("name"), Some("viewer"));
        assert!(decorator.is_any(&["Query".to_string()]));
    }

    #[test]
    fn test_display_member_chain() {
        let node = SyntaxNode::Member(MemberExpr {
            object: Box::new(SyntaxNode::Member(MemberExpr {
                object: Box::new(SyntaxNode::This),
                property: "orderClient".into(),
            })),
            property: "createOrder".into(),
        });
        assert_eq!(node.to_string(), "this.orderClient.createOrder");
        assert_eq!(node.terminal_name(), Some("createOrder"));
    }
}
