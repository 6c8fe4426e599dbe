//! Project configuration.
//!
//! Loaded from `screen-link.config.json` (or `.screen-link.json`). Every
//! section is `#[serde(default)]`, so a partial file is merged over the
//! defaults field by field.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{Result, ScreenLinkError};

/// File names probed when no explicit config path is given.
pub const CONFIG_CANDIDATES: &[&str] = &["screen-link.config.json", ".screen-link.json"];

/// Files at or above this size are skipped by the scanner.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub root_dir: PathBuf,
    pub apps: BTreeMap<String, ProjectConfig>,
    pub packages: BTreeMap<String, ProjectConfig>,
    pub protos: ProtoConfig,
    pub analysis: AnalysisConfig,
    pub output: OutputConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("."),
            apps: BTreeMap::new(),
            packages: BTreeMap::new(),
            protos: ProtoConfig::default(),
            analysis: AnalysisConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

/// What kind of sub-project an app/package entry is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectKind {
    /// Front end whose routes become screens.
    Nextjs,
    /// Backend whose resolver classes become resolver bindings.
    Nestjs,
}

/// Which routing conventions to apply to a front-end project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoutingMode {
    #[default]
    Both,
    /// Directory-tree routes (`app/**/page.tsx`).
    App,
    /// File-tree routes (`pages/**.tsx`).
    Pages,
}

impl RoutingMode {
    pub fn app_router(self) -> bool {
        matches!(self, RoutingMode::Both | RoutingMode::App)
    }

    pub fn pages_router(self) -> bool {
        matches!(self, RoutingMode::Both | RoutingMode::Pages)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    #[serde(rename = "type")]
    pub kind: ProjectKind,
    pub path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default)]
    pub routing: RoutingMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_path: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locales: Vec<String>,
}

impl ProjectConfig {
    pub fn new(kind: ProjectKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
            namespace: None,
            routing: RoutingMode::default(),
            base_path: None,
            locales: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProtoConfig {
    pub path: PathBuf,
}

impl Default for ProtoConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("packages/protos"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisConfig {
    pub include_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,
    pub max_file_size: u64,
    pub graphql: GraphqlConfig,
    pub nestjs: NestjsConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            include_patterns: strings(&[
                "**/*.ts",
                "**/*.tsx",
                "**/*.js",
                "**/*.jsx",
                "**/*.graphql",
                "**/*.gql",
                "**/*.proto",
            ]),
            exclude_patterns: strings(&[
                "**/node_modules/**",
                "**/dist/**",
                "**/.next/**",
                "**/coverage/**",
            ]),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            graphql: GraphqlConfig::default(),
            nestjs: NestjsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GraphqlConfig {
    /// Template tags whose literals are GraphQL documents.
    pub tag_names: Vec<String>,
    /// Import sources ending in one of these are GraphQL documents.
    pub document_extensions: Vec<String>,
}

impl Default for GraphqlConfig {
    fn default() -> Self {
        Self {
            tag_names: strings(&["gql", "graphql"]),
            document_extensions: strings(&[".graphql", ".gql"]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NestjsConfig {
    pub decorators: DecoratorConfig,
    /// A `this.<member>` whose lower-cased name contains one of these is
    /// treated as an RPC client.
    pub call_hints: Vec<String>,
    /// Method name of the dynamic service lookup (`client.getService('X')`).
    pub service_lookup: String,
}

impl Default for NestjsConfig {
    fn default() -> Self {
        Self {
            decorators: DecoratorConfig::default(),
            call_hints: strings(&["client", "service", "grpc"]),
            service_lookup: "getService".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DecoratorConfig {
    pub resolver: Vec<String>,
    pub query: Vec<String>,
    pub mutation: Vec<String>,
    pub resolve_field: Vec<String>,
}

impl Default for DecoratorConfig {
    fn default() -> Self {
        Self {
            resolver: strings(&["Resolver"]),
            query: strings(&["Query"]),
            mutation: strings(&["Mutation"]),
            resolve_field: strings(&["ResolveField"]),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OutputConfig {
    /// When set, the config is not echoed into `meta.config`.
    pub anonymize: bool,
}

impl Config {
    /// Load config from `path`, or from the first candidate file found in
    /// the working directory, or fall back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            if path.exists() {
                return Self::from_file(path);
            }
            debug!(path = %path.display(), "config file not found, probing defaults");
        }
        for candidate in CONFIG_CANDIDATES {
            let candidate = Path::new(candidate);
            if candidate.exists() {
                return Self::from_file(candidate);
            }
        }
        info!("no config file found, using defaults");
        Ok(Self::default())
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| ScreenLinkError::io(path, e))?;
        let config: Config =
            serde_json::from_str(&content).map_err(|e| ScreenLinkError::json(path, e))?;
        info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// All configured sub-projects, apps first, in name order.
    pub fn projects(&self) -> impl Iterator<Item = (&str, &ProjectConfig)> {
        self.apps
            .iter()
            .chain(self.packages.iter())
            .map(|(name, project)| (name.as_str(), project))
    }

    /// Human-readable problems; empty means the config is usable.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.root_dir.as_os_str().is_empty() {
            errors.push("rootDir is required".to_string());
        }
        if self.protos.path.as_os_str().is_empty() {
            errors.push("protos.path is required".to_string());
        }
        for (section, projects) in [("apps", &self.apps), ("packages", &self.packages)] {
            for (name, project) in projects {
                if project.path.as_os_str().is_empty() {
                    errors.push(format!("{}.{}.path is required", section, name));
                }
            }
        }

        let decorators = &self.analysis.nestjs.decorators;
        for (field, names) in [
            ("resolver", &decorators.resolver),
            ("query", &decorators.query),
            ("mutation", &decorators.mutation),
            ("resolveField", &decorators.resolve_field),
        ] {
            if names.is_empty() {
                errors.push(format!(
                    "analysis.nestjs.decorators.{} must name at least one decorator",
                    field
                ));
            }
        }
        if self.analysis.graphql.tag_names.is_empty() {
            errors.push("analysis.graphql.tagNames must name at least one tag".to_string());
        }

        for pattern in self
            .analysis
            .include_patterns
            .iter()
            .chain(self.analysis.exclude_patterns.iter())
        {
            if let Err(e) = globset::Glob::new(pattern) {
                errors.push(format!("invalid glob '{}': {}", pattern, e));
            }
        }

        errors
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_merges_over_defaults() {
        let json = r#"{
            "apps": { "web": { "type": "nextjs", "path": "apps/web", "namespace": "web" } },
            "packages": { "bff": { "type": "nestjs", "path": "packages/bff" } },
            "analysis": { "nestjs": { "decorators": { "query": ["Query", "GqlQuery"] } } }
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();

        assert_eq!(config.root_dir, PathBuf::from("."));
        assert_eq!(config.protos.path, PathBuf::from("packages/protos"));
        assert_eq!(config.apps["web"].namespace.as_deref(), Some("web"));
        assert_eq!(config.apps["web"].routing, RoutingMode::Both);
        assert_eq!(config.packages["bff"].kind, ProjectKind::Nestjs);
        assert_eq!(
            config.analysis.nestjs.decorators.query,
            vec!["Query".to_string(), "GqlQuery".to_string()]
        );
        // Sibling lists keep their defaults.
        assert_eq!(config.analysis.nestjs.decorators.mutation, vec!["Mutation"]);
        assert_eq!(config.analysis.graphql.tag_names, vec!["gql", "graphql"]);
        assert_eq!(config.analysis.max_file_size, DEFAULT_MAX_FILE_SIZE);
        assert!(!config.output.anonymize);
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_empty());
    }

    #[test]
    fn test_validate_reports_problems() {
        let mut config = Config::default();
        config.protos.path = PathBuf::new();
        config
            .apps
            .insert("web".into(), ProjectConfig::new(ProjectKind::Nextjs, ""));
        config.analysis.nestjs.decorators.resolver.clear();
        config.analysis.include_patterns.push("src/[".into());

        let errors = config.validate();
        assert!(errors.contains(&"protos.path is required".to_string()));
        assert!(errors.contains(&"apps.web.path is required".to_string()));
        assert!(errors.iter().any(|e| e.contains("decorators.resolver")));
        assert!(errors.iter().any(|e| e.starts_with("invalid glob 'src/['")));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("screen-link.config.json");
        fs::write(&path, r#"{ "output": { "anonymize": true } }"#).unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert!(config.output.anonymize);
    }

    #[test]
    fn test_load_malformed_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();

        let err = Config::from_file(&path).unwrap_err();
        assert!(matches!(err, ScreenLinkError::Json { .. }));
    }

    #[test]
    fn test_projects_iterates_apps_then_packages() {
        let mut config = Config::default();
        config
            .packages
            .insert("bff".into(), ProjectConfig::new(ProjectKind::Nestjs, "packages/bff"));
        config
            .apps
            .insert("web".into(), ProjectConfig::new(ProjectKind::Nextjs, "apps/web"));

        let names: Vec<&str> = config.projects().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["web", "bff"]);
    }
}
