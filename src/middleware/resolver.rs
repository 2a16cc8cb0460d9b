//! # Middleware chain resolver.
//!
//! Middleware lists are registered under a filter and looked up by route:
//!
//! | filter         | matches                              |
//! |----------------|--------------------------------------|
//! | `"*"` or `""`  | every route (global)                 |
//! | `"<prefix>*"`  | every route starting with `<prefix>` |
//! | anything else  | exactly that route                   |
//!
//! ## Lookup
//! `search(route)` returns the globals followed by **one** more bucket at most:
//! the exact match when present, otherwise the most specific matching prefix
//! (longest first, ties broken lexicographically).
//!
//! ## Example
//! ```rust
//! use procvisor::{MiddlewareChainResolver, Handler, handler_fn, middleware_fn};
//!
//! let noop = || middleware_fn(|next: Handler<String, usize>| next);
//!
//! let mut resolver = MiddlewareChainResolver::new();
//! resolver.register("*", [noop()]);
//! resolver.register("/api/*", [noop(), noop()]);
//!
//! assert_eq!(resolver.search("/api/users").len(), 3);
//! assert_eq!(resolver.search("/health").len(), 1);
//!
//! let handler = resolver.resolve("/api/users", handler_fn(|req: String| async move { req.len() }));
//! # drop(handler);
//! ```

use std::collections::HashMap;
use std::fmt;

use crate::middleware::chain::{Handler, MiddlewareRef, compose};

/// Registry of middleware lists keyed by route filter.
///
/// Mutated through `&mut self` during setup; lookups through `&self` are
/// side-effect free and safe to share across tasks afterwards.
pub struct MiddlewareChainResolver<Req, Res> {
    globals: Vec<MiddlewareRef<Req, Res>>,
    exact: HashMap<String, Vec<MiddlewareRef<Req, Res>>>,
    /// Ordered by specificity: longest prefix first.
    prefixes: Vec<(String, Vec<MiddlewareRef<Req, Res>>)>,
}

impl<Req: 'static, Res: 'static> MiddlewareChainResolver<Req, Res> {
    /// Creates an empty resolver.
    pub fn new() -> Self {
        Self {
            globals: Vec::new(),
            exact: HashMap::new(),
            prefixes: Vec::new(),
        }
    }

    /// Appends `middlewares` to the list registered under `filter`.
    ///
    /// Registering the same filter twice extends its list in call order.
    pub fn register(
        &mut self,
        filter: &str,
        middlewares: impl IntoIterator<Item = MiddlewareRef<Req, Res>>,
    ) {
        match filter.strip_suffix('*') {
            None if filter.is_empty() => self.globals.extend(middlewares),
            None => self
                .exact
                .entry(filter.to_string())
                .or_default()
                .extend(middlewares),
            Some("") => self.globals.extend(middlewares),
            Some(prefix) => {
                if let Some(i) = self.prefixes.iter().position(|(p, _)| p == prefix) {
                    self.prefixes[i].1.extend(middlewares);
                    return;
                }
                self.prefixes
                    .push((prefix.to_string(), middlewares.into_iter().collect()));
                self.prefixes
                    .sort_by(|(a, _), (b, _)| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
            }
        }
    }

    /// Returns the middlewares that apply to `route`, in execution order.
    pub fn search(&self, route: &str) -> Vec<MiddlewareRef<Req, Res>> {
        let mut out = self.globals.clone();
        if route.is_empty() {
            return out;
        }

        if let Some(list) = self.exact.get(route) {
            out.extend(list.iter().cloned());
            return out;
        }

        if let Some((_, list)) = self
            .prefixes
            .iter()
            .find(|(prefix, _)| route.starts_with(prefix.as_str()))
        {
            out.extend(list.iter().cloned());
        }
        out
    }

    /// Searches `route` and composes the result around `terminal`.
    pub fn resolve(&self, route: &str, terminal: Handler<Req, Res>) -> Handler<Req, Res> {
        compose(&self.search(route), terminal)
    }

    /// Registered prefixes, most specific first.
    pub fn prefixes(&self) -> impl Iterator<Item = &str> {
        self.prefixes.iter().map(|(p, _)| p.as_str())
    }
}

impl<Req: 'static, Res: 'static> Default for MiddlewareChainResolver<Req, Res> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Req: 'static, Res: 'static> fmt::Debug for MiddlewareChainResolver<Req, Res> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewareChainResolver")
            .field("globals", &self.globals.len())
            .field("exact", &self.exact.keys().collect::<Vec<_>>())
            .field("prefixes", &self.prefixes().collect::<Vec<_>>())
            .finish()
    }
}
