//! # hellod
//!
//! A minimal greeting HTTP service: one route, a request-timing hook, and an
//! access-log line per request.
//!
//! Every request flows through a server-level middleware chain before the
//! router: a timer stamps its start time into the request context, and once
//! the response is determined a logger prints
//! `<METHOD> <URL> - <STATUS> - <duration>ms` to stdout. `GET /` answers
//! `Hello world !`; everything else falls through to a 404.
//!
//! ## Quick start
//!
//! ```no_run
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     hellod::service::build().listen(8080)
//! }
//! ```

pub mod app;
pub mod error;
pub mod handler;
pub mod http;
pub mod middleware;
pub mod monitor;
pub mod plugins;
pub mod router;
pub mod service;

pub use app::{Application, Server};
pub use error::{ServerError, ServerResult};
pub use http::{Method, Request, Response};
