use std::{fmt, sync::Arc};

use http::Method;
use tracing::trace;

use crate::{
    endpoint::Endpoint,
    error::Error,
    handler::{BoxHandler, HandlerFuture, Request, RequestContext, Response},
    matcher::Match,
    options::RouterOptions,
    params::Params,
    router::route_table,
    trie::Trie,
};

/// Immutable route table built by [`Router::build`](crate::Router::build).
///
/// Cloning is cheap and clones share the table, so one dispatcher can serve any number of
/// concurrent requests.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<Inner>,
}

struct Inner {
    trie: Trie<Endpoint>,
    not_found: BoxHandler,
    options: RouterOptions,
}

impl Dispatcher {
    pub(crate) fn new(
        trie: Trie<Endpoint>,
        not_found: BoxHandler,
        options: RouterOptions,
    ) -> Self {
        Dispatcher {
            inner: Arc::new(Inner {
                trie,
                not_found,
                options,
            }),
        }
    }

    /// Routes `req` to its handler and runs it with a fresh [`RequestContext`].
    ///
    /// Resolves to [`Error::NotFound`] when no pattern matches the path, or when the matched
    /// pattern has no handler for the request method, unless middleware turns that into a
    /// response.
    pub async fn respond(&self, req: Request) -> Result<Response, Error> {
        self.dispatch(req, RequestContext::new()).await
    }

    /// Routes `req` to its handler, passing `ctx` along with the captured parameters.
    ///
    /// Matching happens before this returns; the returned future only runs the handler.
    pub fn dispatch(&self, req: Request, mut ctx: RequestContext) -> HandlerFuture {
        let handler = match self.recognize(req.method(), req.uri().path()) {
            Some((endpoint, handler, params)) => {
                trace!(
                    method = %req.method(),
                    path = req.uri().path(),
                    route = %endpoint.pattern(),
                    "matched route"
                );

                ctx.set_match(endpoint.route().clone(), params);
                handler.clone()
            }

            None => {
                trace!(method = %req.method(), path = req.uri().path(), "no route matched");
                self.inner.not_found.clone()
            }
        };

        handler.call(req, ctx)
    }

    /// Looks up the endpoint and handler for `method` and `path` without running anything.
    ///
    /// Returns `None` if no pattern matches `path` or the matched endpoint has no handler for
    /// `method`.
    pub fn recognize(
        &self,
        method: &Method,
        path: &str,
    ) -> Option<(&Endpoint, &BoxHandler, Params)> {
        let Match { value, params } = self
            .inner
            .trie
            .find(path, self.inner.options.is_case_insensitive())?;

        let handler = value.get(method)?;
        Some((value, handler, params))
    }

    /// Lists `(method, pattern)` pairs served by this dispatcher, including derived `HEAD` routes,
    /// sorted by method name and then pattern.
    pub fn routes(&self) -> Vec<(Method, String)> {
        route_table(self.inner.trie.values())
    }

    /// Returns the options the router was built with.
    pub fn options(&self) -> &RouterOptions {
        &self.inner.options
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("routes", &self.routes())
            .field("options", &self.inner.options)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use http::StatusCode;
    use static_assertions::assert_impl_all;

    use super::*;
    use crate::Router;

    assert_impl_all!(Dispatcher: Send, Sync, Clone, fmt::Debug);

    async fn echo(_req: Request, ctx: RequestContext) -> Result<Response, Error> {
        let body = format!(
            "{} {:?}",
            ctx.matched_route().unwrap_or("-"),
            ctx.params().iter().collect::<Vec<_>>()
        );
        Ok(Response::new(Bytes::from(body)))
    }

    fn request(method: Method, path: &str) -> Request {
        http::Request::builder()
            .method(method)
            .uri(path)
            .body(Bytes::new())
            .unwrap()
    }

    fn dispatcher() -> Dispatcher {
        let mut router = Router::new();
        router
            .get("/users/:id", echo)
            .unwrap()
            .get("/users/me", echo)
            .unwrap()
            .post("/users", echo)
            .unwrap();
        router.build()
    }

    #[actix_rt::test]
    async fn respond_with_params() {
        let dispatcher = dispatcher();

        let res = dispatcher
            .respond(request(Method::GET, "/users/42"))
            .await
            .unwrap();
        assert_eq!(res.body(), r#"/users/:id [("id", "42")]"#);

        let res = dispatcher
            .respond(request(Method::GET, "/users/me?verbose=1"))
            .await
            .unwrap();
        assert_eq!(res.body(), "/users/me []");
    }

    #[actix_rt::test]
    async fn not_found_outcomes() {
        let dispatcher = dispatcher();

        let err = dispatcher
            .respond(request(Method::GET, "/orders"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        // path matches, method does not
        let err = dispatcher
            .respond(request(Method::DELETE, "/users/42"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "no route for DELETE /users/42");
    }

    #[actix_rt::test]
    async fn caller_context_is_kept() {
        let mut router = Router::new();
        router
            .get("/", |_req: Request, ctx: RequestContext| async move {
                let user = ctx.extensions().get::<&'static str>().copied().unwrap_or("anon");
                Ok(Response::new(Bytes::from(user)))
            })
            .unwrap();
        let dispatcher = router.build();

        let mut ctx = RequestContext::new();
        ctx.extensions_mut().insert("alice");

        let res = dispatcher
            .dispatch(request(Method::GET, "/"), ctx)
            .await
            .unwrap();
        assert_eq!(res.body(), "alice");
    }

    #[test]
    fn recognize() {
        let dispatcher = dispatcher();

        let (endpoint, _, params) = dispatcher.recognize(&Method::GET, "/users/7").unwrap();
        assert_eq!(endpoint.pattern().to_string(), "/users/:id");
        assert_eq!(params.get("id"), Some("7"));

        assert!(dispatcher.recognize(&Method::HEAD, "/users/7").is_some());
        assert!(dispatcher.recognize(&Method::PUT, "/users/7").is_none());
        assert!(dispatcher.recognize(&Method::GET, "/users").is_none());
    }

    #[actix_rt::test]
    async fn matched_route_shares_endpoint_text() {
        let mut router = Router::new();
        router
            .get("/files/{name}.txt", |_req: Request, ctx: RequestContext| async move {
                let route = ctx.matched_route().unwrap_or_default();
                Ok(Response::new(Bytes::from(format!("{:p}", route.as_ptr()))))
            })
            .unwrap();
        let dispatcher = router.build();

        let (endpoint, _, _) = dispatcher.recognize(&Method::GET, "/files/a.txt").unwrap();
        let expected = format!("{:p}", endpoint.route().as_ptr());

        for _ in 0..2 {
            let res = dispatcher
                .respond(request(Method::GET, "/files/a.txt"))
                .await
                .unwrap();
            assert_eq!(res.body(), expected.as_str());
        }
    }

    #[test]
    fn routes_include_derived_head() {
        let routes = dispatcher().routes();
        let heads = routes
            .iter()
            .filter(|(method, _)| *method == Method::HEAD)
            .map(|(_, pattern)| pattern.as_str())
            .collect::<Vec<_>>();
        assert_eq!(heads, ["/users/:id", "/users/me"]);
    }
}
