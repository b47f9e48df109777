//! Route table built from the endpoint configuration.
//!
//! # Responsibilities
//! - Keep only active endpoints with valid templates
//! - Resolve a request path to its mock route
//!
//! # Design Decisions
//! - Immutable after construction; one table per listener start
//! - Templates matching the same paths (`/a` and `/a/`, `/u/:id` and `/u/{id}`):
//!   the last definition wins, at the first one's position
//! - Exact literal matches beat parameterised ones, then registration order
//! - Method is not part of the match key

use crate::control::state::EndpointConfig;
use crate::routing::matcher::PathTemplate;

/// One registered mock route.
#[derive(Debug, Clone)]
pub struct MockRoute {
    pub name: String,
    pub template: PathTemplate,
    /// `None` answers with the default acknowledgement.
    pub response_file: Option<String>,
}

impl MockRoute {
    /// The configured path, recorded in request logs.
    pub fn path(&self) -> &str {
        self.template.as_str()
    }
}

/// Snapshot of the routes served by one listener instance.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<MockRoute>,
    project: String,
}

impl RouteTable {
    /// Build from an endpoint snapshot. `project` is where response files are resolved.
    pub fn build(endpoints: &[EndpointConfig], project: impl Into<String>) -> Self {
        let mut routes: Vec<MockRoute> = Vec::new();

        for endpoint in endpoints.iter().filter(|e| e.active) {
            let template = match PathTemplate::parse(endpoint.path.trim()) {
                Ok(t) => t,
                Err(e) => {
                    tracing::warn!(name = %endpoint.name, error = %e, "Skipping endpoint");
                    continue;
                }
            };

            let response_file = Some(endpoint.response_file.trim())
                .filter(|f| !f.is_empty())
                .map(str::to_string);

            let route = MockRoute {
                name: endpoint.name.clone(),
                template,
                response_file,
            };

            if let Some(existing) = routes.iter_mut().find(|r| r.template.same_shape(&route.template)) {
                tracing::warn!(path = %route.template, "Duplicate endpoint path, last definition wins");
                *existing = route;
            } else {
                routes.push(route);
            }
        }

        Self {
            routes,
            project: project.into(),
        }
    }

    /// Find the route serving `path`.
    pub fn resolve(&self, path: &str) -> Option<&MockRoute> {
        self.routes
            .iter()
            .find(|r| r.template.is_literal() && r.template.matches(path))
            .or_else(|| self.routes.iter().find(|r| r.template.matches(path)))
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn routes(&self) -> &[MockRoute] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inactive_and_invalid_endpoints_are_skipped() {
        let table = RouteTable::build(
            &[
                EndpointConfig::new("a", "/api/a"),
                EndpointConfig::new("b", "/api/b").inactive(),
                EndpointConfig::new("c", "relative/path"),
            ],
            "default",
        );

        assert_eq!(table.len(), 1);
        assert!(table.resolve("/api/a").is_some());
        assert!(table.resolve("/api/b").is_none());
        assert_eq!(table.project(), "default");
    }

    #[test]
    fn last_duplicate_wins_in_first_position() {
        let table = RouteTable::build(
            &[
                EndpointConfig::new("first", "/dup").with_response_file("one.json"),
                EndpointConfig::new("other", "/other"),
                EndpointConfig::new("second", "/dup").with_response_file("two.json"),
            ],
            "default",
        );

        assert_eq!(table.len(), 2);
        assert_eq!(table.routes()[0].name, "second");
        let route = table.resolve("/dup").unwrap();
        assert_eq!(route.response_file.as_deref(), Some("two.json"));
    }

    #[test]
    fn trailing_slash_and_param_spelling_count_as_duplicates() {
        let table = RouteTable::build(
            &[
                EndpointConfig::new("bare", "/dup"),
                EndpointConfig::new("slashed", "/dup/").with_response_file("two.json"),
                EndpointConfig::new("colon", "/users/:id"),
                EndpointConfig::new("braced", "/users/{id}"),
            ],
            "default",
        );

        assert_eq!(table.len(), 2);
        let route = table.resolve("/dup").unwrap();
        assert_eq!(route.name, "slashed");
        assert_eq!(route.path(), "/dup/");
        assert_eq!(table.resolve("/users/7").unwrap().name, "braced");
    }

    #[test]
    fn literal_beats_param() {
        let table = RouteTable::build(
            &[
                EndpointConfig::new("param", "/users/:id"),
                EndpointConfig::new("me", "/users/me"),
            ],
            "default",
        );

        assert_eq!(table.resolve("/users/me").unwrap().name, "me");
        assert_eq!(table.resolve("/users/7").unwrap().name, "param");
        assert!(table.resolve("/nothing").is_none());
    }

    #[test]
    fn blank_response_file_means_default() {
        let table = RouteTable::build(&[EndpointConfig::new("a", "/a").with_response_file("  ")], "p");
        assert!(table.resolve("/a").unwrap().response_file.is_none());
    }
}
