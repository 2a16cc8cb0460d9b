//! Filter-based selection and onion composition of handler wrappers.
//!
//! ## Contents
//! - [`Handler`], [`handler_fn`] type-erased async request handlers
//! - [`Middleware`], [`middleware_fn`] wrappers around a handler (like a tower `Layer`)
//! - [`compose`] folds a middleware list around a terminal handler
//! - [`MiddlewareChainResolver`] registration by filter (`"*"`, exact route, `"<prefix>*"`)
//!   and lookup by route

mod chain;
mod resolver;

pub use chain::{Handler, Middleware, MiddlewareRef, compose, handler_fn, middleware_fn};
pub use resolver::MiddlewareChainResolver;
