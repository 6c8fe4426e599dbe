//! Language detection and tree-sitter grammar loading.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tree_sitter::Language;

/// Script dialects with a tree-sitter grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScriptLanguage {
    JavaScript,
    TypeScript,
    Tsx,
}

impl ScriptLanguage {
    /// Detect language from file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        match ext {
            "js" | "mjs" | "cjs" => Some(ScriptLanguage::JavaScript),
            "ts" | "mts" | "cts" => Some(ScriptLanguage::TypeScript),
            "tsx" | "jsx" => Some(ScriptLanguage::Tsx),
            _ => None,
        }
    }

    /// Get the tree-sitter Language for this dialect.
    pub fn tree_sitter_language(&self) -> Language {
        match self {
            ScriptLanguage::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
            ScriptLanguage::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            ScriptLanguage::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ScriptLanguage::JavaScript => "JavaScript",
            ScriptLanguage::TypeScript => "TypeScript",
            ScriptLanguage::Tsx => "TSX",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_path() {
        assert_eq!(
            ScriptLanguage::from_path(Path::new("app/page.tsx")),
            Some(ScriptLanguage::Tsx)
        );
        assert_eq!(
            ScriptLanguage::from_path(Path::new("Button.jsx")),
            Some(ScriptLanguage::Tsx)
        );
        assert_eq!(
            ScriptLanguage::from_path(Path::new("user.resolver.ts")),
            Some(ScriptLanguage::TypeScript)
        );
        assert_eq!(
            ScriptLanguage::from_path(Path::new("server.mjs")),
            Some(ScriptLanguage::JavaScript)
        );
        assert_eq!(ScriptLanguage::from_path(Path::new("schema.graphql")), None);
        assert_eq!(ScriptLanguage::from_path(Path::new("Makefile")), None);
    }
}
