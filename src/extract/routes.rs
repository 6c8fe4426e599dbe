//! Route extraction: screens from the front end's file layout.
//!
//! Two conventions are understood:
//!
//! - directory tree: `app/(group)/@slot/products/[id]/page.tsx` -> `/products/[id]`
//! - file tree: `pages/blog/index.tsx` -> `/blog`
//!
//! Only file paths are consulted; contents are never read.

use std::path::{Component, Path};
use tracing::debug;

use crate::config::ProjectConfig;
use crate::graph::types::{RoutingStyle, Screen};
use crate::ids;
use crate::scanner::SourceFile;

use super::{files_under, LayerOutput, LayerResult};

const SCRIPT_EXTENSIONS: &[&str] = &["tsx", "ts", "jsx", "js"];
const APP_DIR: &str = "app";
const PAGES_DIR: &str = "pages";
const PAGE_STEM: &str = "page";

/// Screens of one front-end project.
pub fn extract_screens(project: &ProjectConfig, files: &[SourceFile]) -> LayerResult<Screen> {
    let mut output = LayerOutput::default();
    for file in files_under(files, &project.path) {
        let relative = project_relative(&file.path, &project.path);

        if project.routing.app_router() {
            if let Some(route) = app_route(relative, project) {
                output.entities.push(screen(project, route, file, RoutingStyle::AppRouter));
                continue;
            }
        }
        if project.routing.pages_router() {
            if let Some(route) = pages_route(relative, project) {
                output.entities.push(screen(project, route, file, RoutingStyle::PagesRouter));
            }
        }
    }
    debug!(
        project = %project.path.display(),
        screens = output.entities.len(),
        "extracted screens"
    );
    Ok(output)
}

fn screen(project: &ProjectConfig, route: String, file: &SourceFile, style: RoutingStyle) -> Screen {
    Screen {
        id: ids::screen_id(project.namespace.as_deref(), &route),
        route,
        source_file: file.path.clone(),
        namespace: project.namespace.clone(),
        routing_style: style,
    }
}

fn project_relative<'a>(path: &'a Path, project_dir: &Path) -> &'a Path {
    path.strip_prefix(project_dir).unwrap_or(path)
}

fn segments(path: &Path) -> Vec<&str> {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(s) => s.to_str(),
            _ => None,
        })
        .collect()
}

fn split_extension(name: &str) -> Option<(&str, &str)> {
    let (stem, ext) = name.rsplit_once('.')?;
    SCRIPT_EXTENSIONS.contains(&ext).then_some((stem, ext))
}

/// `.../app/<segments>/page.<ext>` -> route.
pub fn app_route(path: &Path, project: &ProjectConfig) -> Option<String> {
    let parts = segments(path);
    let root = parts.iter().position(|s| *s == APP_DIR)?;
    let (file_name, dirs) = parts[root + 1..].split_last()?;
    let (stem, _) = split_extension(file_name)?;
    if stem != PAGE_STEM {
        return None;
    }

    let kept: Vec<&str> = dirs
        .iter()
        .copied()
        .filter(|s| !(s.starts_with('(') && s.ends_with(')')))
        .filter(|s| !s.starts_with('@'))
        .filter(|s| !s.is_empty())
        .collect();
    Some(normalize_route(&format!("/{}", kept.join("/")), project))
}

/// `.../pages/<path>.<ext>` -> route. `_app`, `_document` and the like, and
/// everything under `api/`, are not screens.
pub fn pages_route(path: &Path, project: &ProjectConfig) -> Option<String> {
    let parts = segments(path);
    let root = parts.iter().position(|s| *s == PAGES_DIR)?;
    let (file_name, dirs) = parts[root + 1..].split_last()?;
    let (stem, _) = split_extension(file_name)?;

    if stem.starts_with('_') || dirs.iter().any(|d| d.starts_with('_')) {
        return None;
    }
    if dirs.first() == Some(&"api") {
        return None;
    }

    let mut kept: Vec<&str> = dirs.to_vec();
    if stem != "index" {
        kept.push(stem);
    }
    Some(normalize_route(&format!("/{}", kept.join("/")), project))
}

/// Strip base path and locale, force a leading `/`, drop a trailing `/`
/// except on the root route.
pub fn normalize_route(route: &str, project: &ProjectConfig) -> String {
    let mut route = route.to_string();

    if let Some(base) = project.base_path.as_deref().filter(|b| !b.is_empty()) {
        let base = format!("/{}", base.trim_matches('/'));
        if base != "/" {
            if route == base {
                route = "/".to_string();
            } else if let Some(rest) = route.strip_prefix(&format!("{}/", base)) {
                route = format!("/{}", rest);
            }
        }
    }

    for locale in &project.locales {
        let prefix = format!("/{}", locale);
        if route == prefix {
            route = "/".to_string();
            break;
        }
        if let Some(rest) = route.strip_prefix(&format!("{}/", prefix)) {
            route = format!("/{}", rest);
            break;
        }
    }

    if !route.starts_with('/') {
        route.insert(0, '/');
    }
    while route.len() > 1 && route.ends_with('/') {
        route.pop();
    }
    route
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ProjectKind, RoutingMode};

    fn project() -> ProjectConfig {
        ProjectConfig::new(ProjectKind::Nextjs, "")
    }

    fn app(path: &str) -> Option<String> {
        app_route(Path::new(path), &project())
    }

    fn pages(path: &str) -> Option<String> {
        pages_route(Path::new(path), &project())
    }

    #[test]
    fn test_app_router_routes() {
        assert_eq!(app("/app/(marketing)/about/page.tsx").as_deref(), Some("/about"));
        assert_eq!(
            app("/app/products/[id]/page.tsx").as_deref(),
            Some("/products/[id]")
        );
        assert_eq!(app("app/page.tsx").as_deref(), Some("/"));
        assert_eq!(
            app("src/app/dashboard/@analytics/stats/page.js").as_deref(),
            Some("/dashboard/stats")
        );
        assert_eq!(app("app/about/layout.tsx"), None);
        assert_eq!(app("app/about/page.css"), None);
        assert_eq!(app("components/page.tsx"), None);
    }

    #[test]
    fn test_pages_router_routes() {
        assert_eq!(pages("/pages/index.tsx").as_deref(), Some("/"));
        assert_eq!(pages("/pages/blog/index.tsx").as_deref(), Some("/blog"));
        assert_eq!(
            pages("pages/products/[id].tsx").as_deref(),
            Some("/products/[id]")
        );
        assert_eq!(pages("pages/_app.tsx"), None);
        assert_eq!(pages("pages/api/users.ts"), None);
        assert_eq!(pages("pages/notes.md"), None);
    }

    #[test]
    fn test_normalize_base_path_and_locale() {
        let mut project = project();
        project.base_path = Some("/shop".into());
        assert_eq!(normalize_route("/shop/cart", &project), "/cart");
        assert_eq!(normalize_route("/shop", &project), "/");
        // Segment-aware: `/shopping` is not under `/shop`.
        assert_eq!(normalize_route("/shopping", &project), "/shopping");

        let mut project = ProjectConfig::new(ProjectKind::Nextjs, "");
        project.locales = vec!["en".into(), "fr".into()];
        assert_eq!(normalize_route("/en/about", &project), "/about");
        assert_eq!(normalize_route("/fr", &project), "/");
        assert_eq!(normalize_route("/english/about", &project), "/english/about");
        assert_eq!(normalize_route("about/", &project), "/about");
    }

    #[test]
    fn test_extract_screens_for_project() {
        let mut project = ProjectConfig::new(ProjectKind::Nextjs, "apps/web");
        project.namespace = Some("web".into());
        let files = vec![
            SourceFile::new("apps/web/app/(shop)/cart/page.tsx", ""),
            SourceFile::new("apps/web/pages/index.tsx", ""),
            SourceFile::new("apps/web/components/Button.tsx", ""),
            SourceFile::new("apps/admin/app/page.tsx", ""),
        ];

        let screens = extract_screens(&project, &files).unwrap().entities;
        let ids: Vec<&str> = screens.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["screen:web:/cart", "screen:web:/"]);
        assert_eq!(screens[0].routing_style, RoutingStyle::AppRouter);
        assert_eq!(screens[1].routing_style, RoutingStyle::PagesRouter);

        project.routing = RoutingMode::App;
        let screens = extract_screens(&project, &files).unwrap().entities;
        assert_eq!(screens.len(), 1);
    }
}
