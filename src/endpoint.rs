use std::fmt;

use bytes::Bytes;
use bytestring::ByteString;
use http::Method;

use crate::{
    error::RouteError,
    handler::{BoxHandler, Request, RequestContext},
    pattern::Pattern,
    trie::HashMap,
};

/// Handlers registered for one distinct path pattern, keyed by method.
#[derive(Clone)]
pub struct Endpoint {
    pattern: Pattern,
    route: ByteString,
    methods: HashMap<Method, BoxHandler>,
}

impl Endpoint {
    pub(crate) fn new(pattern: Pattern) -> Self {
        Endpoint {
            route: ByteString::from(pattern.to_string()),
            pattern,
            methods: HashMap::default(),
        }
    }

    /// Registers `handler` for `method`.
    ///
    /// Fails with [`RouteError::Duplicate`] if a handler is already registered for `method`; the
    /// existing handler is kept.
    pub(crate) fn add_responder(
        &mut self,
        method: Method,
        handler: BoxHandler,
    ) -> Result<(), RouteError> {
        if self.methods.contains_key(&method) {
            return Err(RouteError::Duplicate {
                method,
                pattern: self.pattern.to_string(),
            });
        }

        self.methods.insert(method, handler);
        Ok(())
    }

    /// Installs a `HEAD` handler derived from the `GET` handler, if there is a `GET` handler and
    /// no explicit `HEAD` handler.
    ///
    /// The derived handler keeps the status and headers produced by `GET` and drops the body.
    pub(crate) fn auto_generate_head_endpoint(&mut self) -> bool {
        if self.methods.contains_key(&Method::HEAD) {
            return false;
        }

        let Some(get) = self.methods.get(&Method::GET).cloned() else {
            return false;
        };

        let head = BoxHandler::new(move |req: Request, ctx: RequestContext| {
            let fut = get.call(req, ctx);
            async move {
                let res = fut.await?;
                Ok(res.map(|_| Bytes::new()))
            }
        });

        self.methods.insert(Method::HEAD, head);
        true
    }

    /// Returns the handler registered for `method`.
    pub fn get(&self, method: &Method) -> Option<&BoxHandler> {
        self.methods.get(method)
    }

    /// Iterates over the registered methods, in no particular order.
    pub fn methods(&self) -> impl Iterator<Item = &Method> {
        self.methods.keys()
    }

    /// Returns the pattern this endpoint was registered under.
    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    /// Returns the canonical text of [`pattern`](Self::pattern), as handed to matched requests.
    pub fn route(&self) -> &ByteString {
        &self.route
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut methods = self.methods.keys().map(Method::as_str).collect::<Vec<_>>();
        methods.sort_unstable();

        f.debug_struct("Endpoint")
            .field("pattern", &format_args!("{}", self.pattern))
            .field("methods", &methods)
            .finish()
    }
}
