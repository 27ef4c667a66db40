use std::future::Future;

use futures::future::BoxFuture;

use crate::error::ServerResult;
use crate::http::{Request, Response};

/// Outcome of a route handler or middleware stage.
pub type HandlerResult = ServerResult<Response>;

pub trait IntoResponse {
    fn into_response_future(self) -> BoxFuture<'static, HandlerResult>;
}

impl<F: Future<Output = HandlerResult> + Send + 'static> IntoResponse for F {
    fn into_response_future(self) -> BoxFuture<'static, HandlerResult> {
        Box::pin(self)
    }
}

pub trait Handler: Send + Sync + 'static {
    fn handle(&self, req: Request) -> BoxFuture<'static, HandlerResult>;

    fn clone_boxed(&self) -> Box<dyn Handler>;
}

impl Clone for Box<dyn Handler> {
    fn clone(&self) -> Box<dyn Handler> {
        self.clone_boxed()
    }
}

impl<F, R> Handler for F
where
    F: Fn(Request) -> R + Send + Sync + Clone + 'static,
    R: IntoResponse,
{
    fn handle(&self, req: Request) -> BoxFuture<'static, HandlerResult> {
        (self)(req).into_response_future()
    }

    fn clone_boxed(&self) -> Box<dyn Handler> {
        Box::new(self.clone())
    }
}
