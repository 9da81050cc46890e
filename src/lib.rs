//! Segment-trie request router.
//!
//! Route patterns are split into typed segments and indexed in a prefix trie. Lookups walk the
//! trie trying the most specific segment kind first and backtrack when a branch fails deeper in
//! the path, so the result does not depend on registration order.
//!
//! # Pattern Syntax
//! See [`Pattern`] for the full grammar. In short: literals, `:name` / `{name}` captures, affix
//! captures such as `{file}.json` or `v:version`, `*` wildcards with optional affixes, a trailing
//! `**` that consumes the rest of the path, and empty segments for trailing slashes.
//!
//! # Examples
//! ```
//! use segment_router::{middleware, Request, RequestContext, Response, Router};
//!
//! # actix_rt::System::new().block_on(async {
//! let mut router = Router::new();
//!
//! router.add(middleware::from_fn(|req, ctx, next: middleware::Next| next.call(req, ctx)));
//! router.get("/users/:id", |_req: Request, ctx: RequestContext| async move {
//!     Ok(Response::new(format!("user {}", &ctx.params()["id"]).into()))
//! })?;
//!
//! let dispatcher = router.build();
//!
//! let req = http::Request::get("/users/42").body(bytes::Bytes::new()).unwrap();
//! let res = dispatcher.respond(req).await.unwrap();
//! assert_eq!(res.body(), "user 42");
//!
//! let req = http::Request::get("/posts").body(bytes::Bytes::new()).unwrap();
//! assert!(dispatcher.respond(req).await.unwrap_err().is_not_found());
//! # Ok::<_, segment_router::RouteError>(())
//! # }).unwrap();
//! ```

#![doc(html_root_url = "https://docs.rs/segment-router/0.1.0")]

mod dispatcher;
mod endpoint;
mod error;
mod handler;
pub mod matcher;
pub mod middleware;
mod options;
mod params;
mod pattern;
mod router;
mod segment;
mod trie;
mod validate;

pub use self::dispatcher::Dispatcher;
pub use self::endpoint::Endpoint;
pub use self::error::{BoxError, Error, PatternError, RouteConflict, RouteError};
pub use self::handler::{
    BoxHandler, Handler, HandlerFuture, Middleware, Request, RequestContext, Response,
};
pub use self::matcher::Match;
pub use self::options::RouterOptions;
pub use self::params::Params;
pub use self::pattern::Pattern;
pub use self::router::{Router, RouterGroup};
pub use self::segment::{Priority, Segment};
pub use self::trie::{Trie, TrieBuilder, TrieNode};
