use serde::{Deserialize, Serialize};

use crate::localization::{keys, Localizer};

/// Route names the guard needs to know about
pub const HOME_ROUTE: &str = "home";
pub const LOGIN_ROUTE: &str = "login-form";
pub const TASKS_ROUTE: &str = "tasks";

/// Redirects are followed at most this many times per resolution
const MAX_REDIRECTS: usize = 8;

/// Page chrome a route renders inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
#[serde(rename_all = "kebab-case")]
pub enum Layout {
    /// Side navigation with an outer toolbar
    SideNavOuterToolbar,
    /// A single centered card, used by the sign-in form
    SingleCard,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDescriptor {
    pub path: &'static str,
    pub name: &'static str,
    pub requires_auth: bool,
    pub layout: Layout,
    /// Localization key for the page title
    pub title_key: Option<&'static str>,
}

impl RouteDescriptor {
    pub fn title(&self, localizer: &Localizer) -> Option<String> {
        self.title_key.map(|key| localizer.translate(key))
    }
}

/// A route resolved from a requested location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRoute {
    pub route: RouteDescriptor,
    /// Path plus the requested query string, if any
    pub full_path: String,
}

/// Static route table. Built once at startup and never mutated.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<RouteDescriptor>,
    redirects: Vec<(&'static str, &'static str)>,
    fallback: &'static str,
}

impl RouteTable {
    pub fn new(
        routes: Vec<RouteDescriptor>,
        redirects: Vec<(&'static str, &'static str)>,
        fallback: &'static str,
    ) -> Self {
        Self {
            routes,
            redirects,
            fallback,
        }
    }

    /// The portal's routes: home, sign-in form and tasks.
    pub fn standard() -> Self {
        Self::new(
            vec![
                RouteDescriptor {
                    path: "/home",
                    name: HOME_ROUTE,
                    requires_auth: true,
                    layout: Layout::SideNavOuterToolbar,
                    title_key: Some(keys::HOME_TITLE),
                },
                RouteDescriptor {
                    path: "/login-form",
                    name: LOGIN_ROUTE,
                    requires_auth: false,
                    layout: Layout::SingleCard,
                    title_key: Some(keys::LOGIN_FORM_LOGIN_TITLE),
                },
                RouteDescriptor {
                    path: "/tasks",
                    name: TASKS_ROUTE,
                    requires_auth: true,
                    layout: Layout::SideNavOuterToolbar,
                    title_key: Some(keys::TASKS_TITLE),
                },
            ],
            vec![("/", "/home")],
            "/home",
        )
    }

    pub fn routes(&self) -> &[RouteDescriptor] {
        &self.routes
    }

    pub fn by_name(&self, name: &str) -> Option<&RouteDescriptor> {
        self.routes.iter().find(|r| r.name == name)
    }

    fn by_path(&self, path: &str) -> Option<&RouteDescriptor> {
        self.routes.iter().find(|r| r.path == path)
    }

    /// Resolve a location such as `/tasks?id=3`, following redirects.
    /// Unknown paths land on the fallback route.
    pub fn resolve(&self, location: &str) -> Option<ResolvedRoute> {
        let (path, query) = split_location(location);
        let mut path = normalize_path(path);

        for _ in 0..MAX_REDIRECTS {
            if let Some(route) = self.by_path(&path) {
                let full_path = match query {
                    Some(q) if !q.is_empty() => format!("{}?{}", route.path, q),
                    _ => route.path.to_string(),
                };
                return Some(ResolvedRoute {
                    route: route.clone(),
                    full_path,
                });
            }

            path = match self.redirects.iter().find(|(from, _)| *from == path) {
                Some((_, to)) => to.to_string(),
                None => self.fallback.to_string(),
            };
        }
        None
    }
}

fn split_location(location: &str) -> (&str, Option<&str>) {
    let location = location.trim_start_matches('#');
    match location.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (location, None),
    }
}

fn normalize_path(path: &str) -> String {
    let trimmed = path.trim();
    let mut normalized = if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    };
    while normalized.len() > 1 && normalized.ends_with('/') {
        normalized.pop();
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use std::sync::Arc;

    #[test]
    fn test_resolve_known_routes() {
        let table = RouteTable::standard();

        let tasks = table.resolve("/tasks").unwrap();
        assert_eq!(tasks.route.name, TASKS_ROUTE);
        assert_eq!(tasks.full_path, "/tasks");

        let login = table.resolve("#/login-form").unwrap();
        assert_eq!(login.route.layout, Layout::SingleCard);
        assert!(!login.route.requires_auth);
    }

    #[test]
    fn test_resolve_keeps_query() {
        let table = RouteTable::standard();
        let resolved = table.resolve("/tasks/?id=3&tab=open").unwrap();
        assert_eq!(resolved.full_path, "/tasks?id=3&tab=open");
    }

    #[test]
    fn test_root_and_unknown_paths_land_home() {
        let table = RouteTable::standard();
        assert_eq!(table.resolve("/").unwrap().route.name, HOME_ROUTE);
        assert_eq!(table.resolve("").unwrap().route.name, HOME_ROUTE);
        assert_eq!(table.resolve("/no/such/page").unwrap().route.name, HOME_ROUTE);
    }

    #[test]
    fn test_redirect_loop_gives_up() {
        let table = RouteTable::new(vec![], vec![("/a", "/b"), ("/b", "/a")], "/a");
        assert!(table.resolve("/a").is_none());
    }

    #[test]
    fn test_route_title_is_localized() {
        let table = RouteTable::standard();
        let localizer = Localizer::new(Arc::new(MemoryStore::new()));
        let login = table.by_name(LOGIN_ROUTE).unwrap();
        assert_eq!(login.title(&localizer).as_deref(), Some("登录"));
    }
}
