//! Route table and the pre-navigation access guard.

pub mod guard;
pub mod routes;

pub use guard::{location_with_query, NavigationDecision, NavigationGuard, NavigationRequest, REDIRECT_PARAM};
pub use routes::{Layout, ResolvedRoute, RouteDescriptor, RouteTable, HOME_ROUTE, LOGIN_ROUTE, TASKS_ROUTE};

impl ResolvedRoute {
    pub fn request(&self) -> NavigationRequest<'_> {
        NavigationRequest {
            name: self.route.name,
            full_path: &self.full_path,
            requires_auth: self.route.requires_auth,
        }
    }
}

/// Where a navigation attempt ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationOutcome {
    pub route: RouteDescriptor,
    /// Location to show, including any redirect query
    pub location: String,
    pub redirected: bool,
}

/// Resolve `location`, run the guard, and follow a redirect it asks for.
pub fn navigate(
    table: &RouteTable,
    guard: &NavigationGuard,
    location: &str,
    is_authenticated: bool,
) -> Option<NavigationOutcome> {
    let resolved = table.resolve(location)?;

    match guard.decide(resolved.request(), is_authenticated) {
        NavigationDecision::Allow => Some(NavigationOutcome {
            route: resolved.route,
            location: resolved.full_path,
            redirected: false,
        }),
        NavigationDecision::Redirect { route, query } => {
            let target = table.by_name(&route)?;
            Some(NavigationOutcome {
                route: target.clone(),
                location: location_with_query(target.path, &query),
                redirected: true,
            })
        }
    }
}
