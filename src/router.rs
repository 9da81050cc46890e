use std::{fmt, sync::Arc};

use http::Method;
use tracing::debug;

use crate::{
    dispatcher::Dispatcher,
    endpoint::Endpoint,
    error::{Error, RouteConflict, RouteError},
    handler::{compose, BoxHandler, Handler, Middleware, Request, RequestContext, Response},
    options::RouterOptions,
    pattern::Pattern,
    trie::TrieBuilder,
    validate,
};

macro_rules! method_shortcuts {
    ($($name:ident => $method:ident,)+) => {
        $(
            #[doc = concat!(
                "Registers a `", stringify!($method), "` handler. See [`on`](Self::on)."
            )]
            pub fn $name(
                &mut self,
                path: &str,
                handler: impl Handler,
            ) -> Result<&mut Self, RouteError> {
                self.on(path, Method::$method, handler)
            }
        )+
    };
}

/// Route table under construction.
///
/// Routes are registered with [`on`](Self::on) or the method shortcuts, then frozen into a
/// [`Dispatcher`] with [`build`](Self::build).
///
/// Middleware is applied at registration time: a route is wrapped by exactly the middleware that
/// was [added](Self::add) before it was registered. The first-added middleware is the outermost
/// layer; it sees the request first and the response last.
///
/// # Examples
/// ```
/// use segment_router::{Request, RequestContext, Response, Router};
///
/// let mut router = Router::new();
/// router
///     .get("/users/:id", |_req: Request, ctx: RequestContext| async move {
///         Ok(Response::new(ctx.params()["id"].to_owned().into()))
///     })?
///     .post("/users", |_req: Request, _ctx: RequestContext| async {
///         Ok(Response::new("created".into()))
///     })?;
///
/// let dispatcher = router.build();
/// assert!(dispatcher.recognize(&http::Method::GET, "/users/42").is_some());
/// # Ok::<_, segment_router::RouteError>(())
/// ```
pub struct Router {
    trie: TrieBuilder<Endpoint>,
    middleware: Vec<Arc<dyn Middleware>>,
    options: RouterOptions,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    /// Constructs an empty router with default options.
    pub fn new() -> Self {
        Self::with_options(RouterOptions::default())
    }

    /// Constructs an empty router.
    pub fn with_options(options: RouterOptions) -> Self {
        Router {
            trie: TrieBuilder::new(),
            middleware: Vec::new(),
            options,
        }
    }

    /// Returns the options this router was created with.
    pub fn router_options(&self) -> &RouterOptions {
        &self.options
    }

    /// Registers `handler` for requests with `method` whose path matches `path`.
    ///
    /// The handler is wrapped by the middleware added so far. Fails if `path` is not a valid
    /// pattern or if a handler for the same pattern and method is already registered.
    pub fn on(
        &mut self,
        path: &str,
        method: Method,
        handler: impl Handler,
    ) -> Result<&mut Self, RouteError> {
        let pattern = Pattern::parse(path)?;
        let handler = compose(BoxHandler::new(handler), &self.middleware);
        self.insert(pattern, method, handler)?;
        Ok(self)
    }

    method_shortcuts! {
        get => GET,
        post => POST,
        put => PUT,
        patch => PATCH,
        delete => DELETE,
        head => HEAD,
        options => OPTIONS,
    }

    /// Adds middleware that wraps every route registered after this call.
    ///
    /// Routes registered before this call are not affected. The not-found fallback of a built
    /// [`Dispatcher`] is wrapped by all middleware added before [`build`](Self::build).
    pub fn add(&mut self, middleware: impl Middleware) -> &mut Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// Starts a group of routes sharing a path prefix.
    ///
    /// The group inherits the middleware added to this router so far and can add its own, which
    /// only applies to routes registered on the group.
    ///
    /// # Examples
    /// ```
    /// use segment_router::{Error, Request, RequestContext, Response, Router};
    ///
    /// async fn show(_req: Request, _ctx: RequestContext) -> Result<Response, Error> {
    ///     Ok(Response::new("user".into()))
    /// }
    ///
    /// let mut router = Router::new();
    /// router.group("/api/:version")?.get("/users/:id", show)?;
    ///
    /// let routes = router.routes();
    /// assert_eq!(routes[0].1, "/api/:version/users/:id");
    /// # Ok::<_, segment_router::RouteError>(())
    /// ```
    pub fn group(&mut self, prefix: &str) -> Result<RouterGroup<'_>, RouteError> {
        let prefix = Pattern::parse(prefix)?;
        let middleware = self.middleware.clone();

        Ok(RouterGroup {
            router: self,
            prefix,
            middleware,
        })
    }

    fn insert(
        &mut self,
        pattern: Pattern,
        method: Method,
        handler: BoxHandler,
    ) -> Result<(), RouteError> {
        let pattern = if self.options.is_case_insensitive() {
            pattern.lowercased()
        } else {
            pattern
        };

        debug!(%method, %pattern, "registering route");

        self.trie.add_entry(
            &pattern,
            |pattern| Endpoint::new(pattern.clone()),
            |endpoint| endpoint.add_responder(method, handler),
        )
    }

    /// Lists registered `(method, pattern)` pairs, sorted by method name and then pattern.
    ///
    /// `HEAD` routes derived at build time are not included; see [`Dispatcher::routes`].
    pub fn routes(&self) -> Vec<(Method, String)> {
        route_table(self.trie.values())
    }

    /// Checks the route table for patterns that can never be matched because a higher priority
    /// pattern accepts every path they accept.
    ///
    /// This is a sampling check and is not run by [`build`](Self::build).
    pub fn validate(&self) -> Result<(), RouteConflict> {
        let endpoints = self.trie.values_in_match_order();
        validate::validate(endpoints.into_iter().map(Endpoint::pattern))
    }

    /// Freezes the current route table into a [`Dispatcher`].
    ///
    /// The router is left untouched and can be built again.
    pub fn build(&self) -> Dispatcher {
        let mut trie = self.trie.clone();

        if self.options.auto_generates_head_endpoints() {
            let mut generated = 0;
            trie.for_each(|node| {
                if let Some(endpoint) = node.value_mut() {
                    if endpoint.auto_generate_head_endpoint() {
                        generated += 1;
                    }
                }
            });
            debug!(generated, "derived HEAD handlers");
        }

        let not_found = compose(BoxHandler::new(not_found), &self.middleware);

        debug!(
            nodes = trie.node_count(),
            endpoints = trie.values().count(),
            "built dispatcher"
        );

        Dispatcher::new(trie.finish(), not_found, self.options)
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.routes())
            .field("middleware", &self.middleware.len())
            .field("options", &self.options)
            .finish()
    }
}

async fn not_found(req: Request, _ctx: RequestContext) -> Result<Response, Error> {
    Err(Error::not_found(req.method(), req.uri().path()))
}

pub(crate) fn route_table<'a>(
    endpoints: impl Iterator<Item = &'a Endpoint>,
) -> Vec<(Method, String)> {
    let mut routes = endpoints
        .flat_map(|endpoint| {
            let pattern = endpoint.pattern().to_string();
            endpoint
                .methods()
                .map(move |method| (method.clone(), pattern.clone()))
        })
        .collect::<Vec<_>>();

    routes.sort_by(|(m1, p1), (m2, p2)| (m1.as_str(), p1).cmp(&(m2.as_str(), p2)));
    routes
}

/// Routes sharing a path prefix, created by [`Router::group`].
///
/// Middleware added to a group wraps only the routes registered on that group, and on groups
/// nested in it, after the call.
pub struct RouterGroup<'r> {
    router: &'r mut Router,
    prefix: Pattern,
    middleware: Vec<Arc<dyn Middleware>>,
}

impl RouterGroup<'_> {
    /// Registers `handler` for `method` on the group prefix joined with `path`.
    pub fn on(
        &mut self,
        path: &str,
        method: Method,
        handler: impl Handler,
    ) -> Result<&mut Self, RouteError> {
        let pattern = self.prefix.join(&Pattern::parse(path)?)?;
        let handler = compose(BoxHandler::new(handler), &self.middleware);
        self.router.insert(pattern, method, handler)?;
        Ok(self)
    }

    method_shortcuts! {
        get => GET,
        post => POST,
        put => PUT,
        patch => PATCH,
        delete => DELETE,
        head => HEAD,
        options => OPTIONS,
    }

    /// Adds middleware that wraps every route registered on this group after this call.
    pub fn add(&mut self, middleware: impl Middleware) -> &mut Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// Starts a nested group; its prefix is appended to this group's prefix.
    pub fn group(&mut self, prefix: &str) -> Result<RouterGroup<'_>, RouteError> {
        let prefix = self.prefix.join(&Pattern::parse(prefix)?)?;

        Ok(RouterGroup {
            router: &mut *self.router,
            prefix,
            middleware: self.middleware.clone(),
        })
    }

    /// Returns the full prefix of this group.
    pub fn prefix(&self) -> &Pattern {
        &self.prefix
    }
}

impl fmt::Debug for RouterGroup<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterGroup")
            .field("prefix", &format_args!("{}", self.prefix))
            .field("middleware", &self.middleware.len())
            .finish()
    }
}
