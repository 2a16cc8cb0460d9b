//! # Handlers, middleware and composition.
//!
//! A [`Middleware`] takes the next handler and returns a new one that may act
//! before and after delegating to it. [`compose`] builds the onion:
//!
//! ```text
//! compose([M1, M2], t)(req):
//!   M1 pre ─► M2 pre ─► t ─► M2 post ─► M1 post
//! ```

use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;

/// Type-erased async handler.
pub type Handler<Req, Res> = Arc<dyn Fn(Req) -> BoxFuture<'static, Res> + Send + Sync>;

/// Shared middleware handle.
pub type MiddlewareRef<Req, Res> = Arc<dyn Middleware<Req, Res>>;

/// Wraps a handler with behavior that runs around it.
pub trait Middleware<Req, Res>: Send + Sync + 'static {
    /// Returns a handler that eventually delegates to `next`.
    fn wrap(&self, next: Handler<Req, Res>) -> Handler<Req, Res>;
}

impl<Req, Res, F> Middleware<Req, Res> for F
where
    F: Fn(Handler<Req, Res>) -> Handler<Req, Res> + Send + Sync + 'static,
{
    fn wrap(&self, next: Handler<Req, Res>) -> Handler<Req, Res> {
        self(next)
    }
}

/// Turns an async function into a [`Handler`].
pub fn handler_fn<Req, Res, F, Fut>(f: F) -> Handler<Req, Res>
where
    F: Fn(Req) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Res> + Send + 'static,
    Req: 'static,
{
    Arc::new(move |req| f(req).boxed())
}

/// Turns a `next -> handler` closure into a [`MiddlewareRef`].
pub fn middleware_fn<Req, Res, F>(f: F) -> MiddlewareRef<Req, Res>
where
    F: Fn(Handler<Req, Res>) -> Handler<Req, Res> + Send + Sync + 'static,
    Req: 'static,
    Res: 'static,
{
    Arc::new(f)
}

/// Folds `middlewares` around `terminal`; the first middleware is the outermost.
pub fn compose<Req, Res>(
    middlewares: &[MiddlewareRef<Req, Res>],
    terminal: Handler<Req, Res>,
) -> Handler<Req, Res>
where
    Req: 'static,
    Res: 'static,
{
    middlewares
        .iter()
        .rev()
        .fold(terminal, |next, mw| mw.wrap(next))
}
