use std::time::{SystemTime, UNIX_EPOCH};

use crate::http::Request;
use crate::middleware::{Middleware, MiddlewareResult, Next};

/// Request-context key holding the wall-clock start of the current request.
pub(crate) const STARTED_AT: &str = "started_at_ms";

/// Stamps each incoming request with the time it entered the pipeline.
///
/// The stamp is read back by [`super::RequestLogger`] once the response has
/// been determined. Registered outermost, so it runs before everything else.
pub struct RequestTimer;

impl RequestTimer {
    pub fn new() -> RequestTimer {
        RequestTimer
    }
}

impl Middleware for RequestTimer {
    fn call(&self, mut req: Request, next: Next) -> MiddlewareResult {
        Box::pin(async move {
            req.set_data(STARTED_AT, now_millis());
            next.handle(req).await
        })
    }

    fn clone_box(&self) -> Box<dyn Middleware> {
        Box::new(RequestTimer)
    }
}

/// Wall-clock time in milliseconds since the Unix epoch.
pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}
