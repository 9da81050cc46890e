//! Middleware helpers.
//!
//! Any type implementing [`Middleware`] can be added to a [`Router`](crate::Router). This module
//! provides adapters for the common cases.

use std::{future::Future, sync::Arc};

use crate::{
    error::Error,
    handler::{BoxHandler, HandlerFuture, Middleware, Request, RequestContext, Response},
};

/// Wraps an async function to be used as a middleware.
///
/// # Examples
///
/// The wrapped function should have the following form:
///
/// ```
/// use segment_router::{
///     middleware::{self, Next},
///     Error, Request, RequestContext, Response, Router,
/// };
///
/// async fn my_mw(req: Request, ctx: RequestContext, next: Next) -> Result<Response, Error> {
///     // pre-processing
///     next.call(req, ctx).await
///     // post-processing
/// }
///
/// let mut router = Router::new();
/// router.add(middleware::from_fn(my_mw));
/// ```
pub fn from_fn<F, Fut>(mw_fn: F) -> FromFn<F>
where
    F: Fn(Request, RequestContext, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, Error>> + Send + 'static,
{
    FromFn {
        mw_fn: Arc::new(mw_fn),
    }
}

/// Middleware returned by [`from_fn`].
#[allow(missing_debug_implementations)]
pub struct FromFn<F> {
    mw_fn: Arc<F>,
}

impl<F, Fut> Middleware for FromFn<F>
where
    F: Fn(Request, RequestContext, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, Error>> + Send + 'static,
{
    fn wrap(&self, next: BoxHandler) -> BoxHandler {
        let mw_fn = Arc::clone(&self.mw_fn);

        BoxHandler::new(move |req: Request, ctx: RequestContext| {
            let next = Next {
                inner: next.clone(),
            };
            (mw_fn)(req, ctx, next)
        })
    }
}

/// The rest of the handler chain, passed to functions wrapped with [`from_fn`].
#[derive(Debug, Clone)]
pub struct Next {
    inner: BoxHandler,
}

impl Next {
    /// Calls the next handler in the chain.
    pub fn call(&self, req: Request, ctx: RequestContext) -> HandlerFuture {
        self.inner.call(req, ctx)
    }
}

/// Middleware for conditionally enabling other middleware.
///
/// The condition is evaluated once, when a route is registered; a disabled `Condition` leaves the
/// handler untouched.
///
/// # Examples
/// ```
/// use segment_router::{middleware::{self, Condition}, Router};
///
/// let verbose = std::env::var("VERBOSE").is_ok();
///
/// let mut router = Router::new();
/// router.add(Condition::new(
///     verbose,
///     middleware::from_fn(|req, ctx, next: middleware::Next| next.call(req, ctx)),
/// ));
/// ```
#[derive(Debug, Clone)]
pub struct Condition<M> {
    middleware: M,
    enable: bool,
}

impl<M> Condition<M> {
    pub fn new(enable: bool, middleware: M) -> Self {
        Self { middleware, enable }
    }
}

impl<M: Middleware> Middleware for Condition<M> {
    fn wrap(&self, next: BoxHandler) -> BoxHandler {
        if self.enable {
            self.middleware.wrap(next)
        } else {
            next
        }
    }
}
