use reqwest::Url;
use serde::Serialize;

use super::routes::{HOME_ROUTE, LOGIN_ROUTE};

/// Query parameter carrying the originally requested location
pub const REDIRECT_PARAM: &str = "redirect";

// Only used to borrow Url's query encoding
const LOCATION_BASE: &str = "app:";

/// What the guard needs to know about a navigation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigationRequest<'a> {
    pub name: &'a str,
    pub full_path: &'a str,
    pub requires_auth: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum NavigationDecision {
    Allow,
    Redirect {
        route: String,
        query: Vec<(String, String)>,
    },
}

impl NavigationDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, NavigationDecision::Allow)
    }
}

/// Pre-navigation access check.
#[derive(Debug, Clone)]
pub struct NavigationGuard {
    login_route: String,
    home_route: String,
}

impl Default for NavigationGuard {
    fn default() -> Self {
        Self::new(LOGIN_ROUTE, HOME_ROUTE)
    }
}

impl NavigationGuard {
    pub fn new(login_route: impl Into<String>, home_route: impl Into<String>) -> Self {
        Self {
            login_route: login_route.into(),
            home_route: home_route.into(),
        }
    }

    /// Decide whether a navigation may proceed. Deterministic in its inputs.
    pub fn decide(&self, target: NavigationRequest<'_>, is_authenticated: bool) -> NavigationDecision {
        if target.name == self.login_route && is_authenticated {
            return NavigationDecision::Redirect {
                route: self.home_route.clone(),
                query: Vec::new(),
            };
        }

        if target.requires_auth && !is_authenticated {
            return NavigationDecision::Redirect {
                route: self.login_route.clone(),
                query: vec![(REDIRECT_PARAM.to_string(), target.full_path.to_string())],
            };
        }

        NavigationDecision::Allow
    }
}

/// Render `path` plus an encoded query string, e.g. `/login-form?redirect=%2Ftasks`.
pub fn location_with_query(path: &str, query: &[(String, String)]) -> String {
    let mut url = match Url::parse(&format!("{}{}", LOCATION_BASE, path)) {
        Ok(url) => url,
        Err(_) => return path.to_string(),
    };
    if !query.is_empty() {
        url.query_pairs_mut()
            .extend_pairs(query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    }
    match url.query() {
        Some(q) => format!("{}?{}", url.path(), q),
        None => url.path().to_string(),
    }
}
