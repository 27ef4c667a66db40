mod logging;
mod timing;

pub use logging::RequestLogger;
pub use timing::RequestTimer;

use futures::future::BoxFuture;

use crate::handler::{Handler, HandlerResult, IntoResponse};
use crate::http::Request;

/// Continuation handed to a middleware; invoking it runs the rest of the
/// pipeline.
#[derive(Clone)]
pub struct Next {
    handler: Box<dyn Handler>,
}

impl Next {
    pub fn new<F, R>(handler: F) -> Self
    where
        F: Fn(Request) -> R + Send + Sync + Clone + 'static,
        R: IntoResponse,
    {
        Self {
            handler: Box::new(handler),
        }
    }

    pub(crate) fn from_handler(handler: Box<dyn Handler>) -> Self {
        Self { handler }
    }

    pub async fn handle(&self, req: Request) -> HandlerResult {
        self.handler.handle(req).await
    }
}

pub type MiddlewareResult = BoxFuture<'static, HandlerResult>;

pub trait Middleware: Send + Sync + 'static {
    fn call(&self, req: Request, next: Next) -> MiddlewareResult;
    fn clone_box(&self) -> Box<dyn Middleware>;
}

impl Clone for Box<dyn Middleware> {
    fn clone(&self) -> Box<dyn Middleware> {
        self.clone_box()
    }
}

#[derive(Clone)]
pub(crate) struct MiddlewareManager {
    middlewares: Vec<Box<dyn Middleware>>,
}

impl MiddlewareManager {
    pub fn new() -> Self {
        Self {
            middlewares: Vec::new(),
        }
    }

    pub fn add<M: Middleware + 'static>(&mut self, middleware: M) {
        self.middlewares.push(Box::new(middleware));
    }

    /// Nests the registered middlewares around `next`; the first one
    /// registered ends up outermost.
    pub async fn call(&self, req: Request, next: Next) -> HandlerResult {
        let mut next = next;
        let mut index = self.middlewares.len();
        while index > 0 {
            index -= 1;
            let middleware = self.middlewares[index].clone();
            next = Next::from_handler(Box::new(move |req| middleware.call(req, next.clone())));
        }
        next.handle(req).await
    }
}
