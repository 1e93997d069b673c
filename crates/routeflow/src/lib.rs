//! A synchronous HTTP request-dispatch engine.
//!
//! `routeflow` resolves an incoming `(method, path)` pair against an
//! ordered route table and drives the matched target through a chained
//! middleware executor. Routing control flow is expressed with a tagged
//! [`Flow`] result instead of exceptions: a unit completes, declines the
//! route attempt (`Continue`, the dispatch loop falls through to the next
//! candidate), or halts the whole dispatch (`Halt`, the buffered response
//! is final).
//!
//! Wire parsing, TLS and response transmission live outside this crate: an
//! adaptation layer populates a [`RequestContext`], and the finished
//! [`ResponseContext`] is snapshotted into an `http::Response` for
//! whatever sends it.
//!
//! # Example
//!
//! ```
//! use routeflow::{Flow, Router, RequestContext, ResponseContext, Target};
//!
//! let mut router = Router::new();
//! router
//!     .register("/hello/:name", Target::closure(|req, res, _next| {
//!         res.write(format!("hello {}", req.param("name").unwrap_or("world")));
//!         Ok(Flow::Complete)
//!     }))
//!     .unwrap();
//!
//! let mut req = RequestContext::builder().path("/hello/rust").build();
//! let mut res = ResponseContext::new();
//! assert!(router.dispatch(&mut req, &mut res).unwrap());
//! assert_eq!(res.body(), "hello rust");
//! ```

mod chain;
mod config;
mod error;
mod flow;
mod matcher;
mod request;
mod response;
mod router;

pub mod handler;

pub use chain::unit_fn;
pub use chain::ChainUnit;
pub use chain::FnUnit;
pub use chain::MiddlewareChain;
pub use chain::Next;
pub use config::Config;
pub use error::RouteError;
pub use flow::BoxError;
pub use flow::Flow;
pub use flow::FlowResult;
pub use matcher::PathMatcher;
pub use matcher::PathParams;
pub use request::RequestBuilder;
pub use request::RequestContext;
pub use request::UploadedFile;
pub use response::Cookie;
pub use response::ResponseContext;
pub use router::Router;
pub use router::Target;

pub use handler::RouteHandler;
