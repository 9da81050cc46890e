use std::{fmt, future::Future, sync::Arc};

use bytes::Bytes;
use bytestring::ByteString;
use futures_core::future::BoxFuture;
use http::Extensions;

use crate::{error::Error, params::Params};

/// Request type routed by this crate.
pub type Request = http::Request<Bytes>;

/// Response type produced by handlers.
pub type Response = http::Response<Bytes>;

/// Future returned by a [`Handler`].
pub type HandlerFuture = BoxFuture<'static, Result<Response, Error>>;

/// Per-request data handed to handlers alongside the request.
///
/// Created fresh for every dispatched request; never shared between requests.
#[derive(Debug, Default)]
pub struct RequestContext {
    params: Params,
    route: Option<ByteString>,
    extensions: Extensions,
}

impl RequestContext {
    /// Constructs an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the path parameters captured by the matched route.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Returns the display form of the matched route pattern, e.g. `/users/:id`.
    ///
    /// `None` for requests that did not match a route.
    pub fn matched_route(&self) -> Option<&str> {
        self.route.as_deref()
    }

    /// Caller-provided request-local data.
    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    /// Mutable variant of [`extensions`](Self::extensions).
    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }

    pub(crate) fn set_match(&mut self, route: ByteString, params: Params) {
        self.route = Some(route);
        self.params = params;
    }
}

/// An asynchronous request handler.
///
/// Implemented for every `Fn(Request, RequestContext) -> impl Future<Output = Result<Response,
/// Error>>` that is `Send + Sync + 'static`, which includes `async` closures and functions.
///
/// # Examples
/// ```
/// use segment_router::{Error, Request, RequestContext, Response};
///
/// async fn hello(_req: Request, ctx: RequestContext) -> Result<Response, Error> {
///     let name = ctx.params().get("name").unwrap_or("world").to_owned();
///     Ok(Response::new(format!("hello {}", name).into()))
/// }
/// # let _ = segment_router::BoxHandler::new(hello);
/// ```
pub trait Handler: Send + Sync + 'static {
    fn call(&self, req: Request, ctx: RequestContext) -> HandlerFuture;
}

impl<F, Fut> Handler for F
where
    F: Fn(Request, RequestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, Error>> + Send + 'static,
{
    fn call(&self, req: Request, ctx: RequestContext) -> HandlerFuture {
        Box::pin((self)(req, ctx))
    }
}

/// Type-erased, cheaply clonable [`Handler`].
#[derive(Clone)]
pub struct BoxHandler(Arc<dyn Handler>);

impl BoxHandler {
    /// Boxes a handler.
    pub fn new(handler: impl Handler) -> Self {
        BoxHandler(Arc::new(handler))
    }

    /// Invokes the handler.
    #[inline]
    pub fn call(&self, req: Request, ctx: RequestContext) -> HandlerFuture {
        self.0.call(req, ctx)
    }
}

impl fmt::Debug for BoxHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BoxHandler")
    }
}

/// Wraps a handler, forming a new handler.
///
/// Middleware is applied when a route is registered: each route handler is composed with the
/// middleware added to the router before that registration.
pub trait Middleware: Send + Sync + 'static {
    fn wrap(&self, next: BoxHandler) -> BoxHandler;
}

impl<M: Middleware + ?Sized> Middleware for Arc<M> {
    fn wrap(&self, next: BoxHandler) -> BoxHandler {
        (**self).wrap(next)
    }
}

/// Composes `handler` with `stack`; the first middleware in `stack` becomes the outermost layer.
pub(crate) fn compose(handler: BoxHandler, stack: &[Arc<dyn Middleware>]) -> BoxHandler {
    stack.iter().rev().fold(handler, |next, mw| mw.wrap(next))
}

#[cfg(test)]
mod tests {
    use http::{HeaderValue, StatusCode};

    use super::*;

    struct Tag(&'static str);

    impl Middleware for Tag {
        fn wrap(&self, next: BoxHandler) -> BoxHandler {
            let tag = self.0;
            BoxHandler::new(move |req: Request, ctx: RequestContext| {
                let fut = next.call(req, ctx);
                async move {
                    let mut res = fut.await?;
                    res.headers_mut()
                        .append("x-order", HeaderValue::from_static(tag));
                    Ok(res)
                }
            })
        }
    }

    fn order(res: &Response) -> Vec<&str> {
        res.headers()
            .get_all("x-order")
            .iter()
            .map(|v| v.to_str().unwrap())
            .collect()
    }

    #[actix_rt::test]
    async fn closure_handler() {
        let handler = BoxHandler::new(|_req: Request, ctx: RequestContext| async move {
            let body = ctx.params().get("id").unwrap_or("none").to_owned();
            Ok(Response::new(Bytes::from(body)))
        });

        let res = handler
            .call(Request::default(), RequestContext::new())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.body(), "none");
    }

    #[actix_rt::test]
    async fn compose_order() {
        let handler = BoxHandler::new(|_req: Request, _ctx: RequestContext| async {
            Ok(Response::new(Bytes::new()))
        });

        let stack: Vec<Arc<dyn Middleware>> = vec![Arc::new(Tag("first")), Arc::new(Tag("second"))];
        let composed = compose(handler, &stack);

        let res = composed
            .call(Request::default(), RequestContext::new())
            .await
            .unwrap();

        // first-added is outermost: it sees the response last
        assert_eq!(order(&res), ["second", "first"]);
    }

    #[test]
    fn context_extensions() {
        let mut ctx = RequestContext::new();
        assert!(ctx.matched_route().is_none());
        assert!(ctx.params().is_empty());

        ctx.extensions_mut().insert(7u32);
        assert_eq!(ctx.extensions().get::<u32>(), Some(&7));

        let mut params = Params::new();
        params.push("id".into(), "1");
        ctx.set_match("/users/:id".into(), params);
        assert_eq!(ctx.matched_route(), Some("/users/:id"));
        assert_eq!(ctx.params().get("id"), Some("1"));
    }
}
