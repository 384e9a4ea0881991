//! Dynamic path router for post-launch callbacks.
//!
//! Patterns use `:name` segments for parameters, e.g. `/course/:id/grade`.
//! Compiled expressions are anchored at the end of the path only, with an
//! optional trailing slash, so `/course/:id` also matches
//! `/tool/course/7/`.

use std::{collections::HashMap, sync::Arc, sync::OnceLock};

use regex::Regex;
use tracing::debug;

use crate::{Error, Result};

/// Parameter name to captured segment
pub type RouteParams = HashMap<String, String>;

type Handler<C, R> = Arc<dyn Fn(&C, Option<RouteParams>) -> R + Send + Sync>;

struct RouteDef<C, R> {
    pattern: String,
    matcher: Regex,
    has_params: bool,
    handler: Handler<C, R>,
}

/// Ordered table of path patterns and their handlers.
///
/// Built during setup; dispatch only reads it.
pub struct RouteTable<C, R> {
    routes: Vec<RouteDef<C, R>>,
}

impl<C, R> std::fmt::Debug for RouteTable<C, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.routes.iter().map(|r| &r.pattern))
            .finish()
    }
}

impl<C, R> Default for RouteTable<C, R> {
    fn default() -> Self {
        Self { routes: Vec::new() }
    }
}

impl<C, R> RouteTable<C, R> {
    /// Empty table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `pattern`, replacing the handler of an
    /// identical pattern in place
    pub fn define_route<F>(&mut self, pattern: &str, handler: F) -> Result<()>
    where
        F: Fn(&C, Option<RouteParams>) -> R + Send + Sync + 'static,
    {
        if let Some(existing) = self.routes.iter_mut().find(|r| r.pattern == pattern) {
            existing.handler = Arc::new(handler);
            return Ok(());
        }

        let (matcher, has_params) = compile_pattern(pattern)?;
        debug!(pattern = %pattern, regex = %matcher, "Route defined");
        self.routes.push(RouteDef {
            pattern: pattern.to_string(),
            matcher,
            has_params,
            handler: Arc::new(handler),
        });
        Ok(())
    }

    /// Run the handler of the first pattern matching `path`.
    ///
    /// `None` when nothing matches.
    pub fn dispatch(&self, path: &str, ctx: &C) -> Option<R> {
        let (route, params) = self.find(path)?;
        debug!(path = %path, pattern = %route.pattern, "Route matched");
        Some((route.handler)(ctx, params))
    }

    /// Pattern that would handle `path`, with its parameters
    #[must_use]
    pub fn resolve(&self, path: &str) -> Option<(&str, Option<RouteParams>)> {
        self.find(path)
            .map(|(route, params)| (route.pattern.as_str(), params))
    }

    fn find(&self, path: &str) -> Option<(&RouteDef<C, R>, Option<RouteParams>)> {
        self.routes.iter().find_map(|route| {
            let caps = route.matcher.captures(path)?;
            let params = route.has_params.then(|| {
                route
                    .matcher
                    .capture_names()
                    .flatten()
                    .filter_map(|name| {
                        caps.name(name)
                            .map(|m| (name.to_string(), m.as_str().to_string()))
                    })
                    .collect()
            });
            Some((route, params))
        })
    }

    /// Number of routes
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// `true` when no route is defined
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

fn param_name_regex() -> &'static Regex {
    static PARAM_NAME: OnceLock<Regex> = OnceLock::new();
    PARAM_NAME.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("parameter name pattern is valid")
    })
}

/// Compile a route pattern; the flag tells whether it declares parameters
pub(crate) fn compile_pattern(pattern: &str) -> Result<(Regex, bool)> {
    let mut expr = String::new();
    let mut has_params = false;

    for segment in pattern.split('/').filter(|s| !s.is_empty()) {
        if let Some(name) = segment.strip_prefix(':') {
            if !param_name_regex().is_match(name) {
                return Err(Error::Config(format!(
                    "invalid route parameter {name:?} in {pattern:?}"
                )));
            }
            has_params = true;
            expr.push_str(&format!("/(?P<{name}>[^/]+)"));
        } else {
            expr.push('/');
            expr.push_str(&regex::escape(segment));
        }
    }
    expr.push_str("/?$");

    let matcher = Regex::new(&expr)
        .map_err(|e| Error::Config(format!("invalid route pattern {pattern:?}: {e}")))?;
    Ok((matcher, has_params))
}
