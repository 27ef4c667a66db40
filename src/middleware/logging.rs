use crate::http::{Method, Request};
use crate::middleware::timing::{now_millis, STARTED_AT};
use crate::middleware::{Middleware, MiddlewareResult, Next};

/// Emits one access-log line per completed request, matched or not.
///
/// Format: `<METHOD> <URL> - <STATUS> - <duration>ms`, where the URL is the
/// raw request target. The duration is measured from the stamp left by
/// [`super::RequestTimer`]; requests that never passed the timer are logged
/// with 0ms. The downstream outcome is returned untouched.
pub struct RequestLogger;

impl RequestLogger {
    pub fn new() -> RequestLogger {
        RequestLogger
    }
}

impl Middleware for RequestLogger {
    fn call(&self, req: Request, next: Next) -> MiddlewareResult {
        Box::pin(async move {
            let method = req.method;
            let target = req.target.clone();
            let started = req.get_typed_data::<u64>(STARTED_AT);

            let result = next.handle(req).await;

            let status = match &result {
                Ok(response) => response.status,
                Err(err) => err.status_code(),
            };
            let duration = elapsed_ms(started, now_millis());
            println!("{}", access_entry(method, &target, status, duration));

            result
        })
    }

    fn clone_box(&self) -> Box<dyn Middleware> {
        Box::new(RequestLogger)
    }
}

/// Milliseconds elapsed since `started`, or 0 when no start was recorded.
fn elapsed_ms(started: Option<u64>, now: u64) -> u64 {
    match started {
        Some(started) => now.saturating_sub(started),
        None => 0,
    }
}

fn access_entry(method: Method, target: &str, status: u16, duration_ms: u64) -> String {
    format!("{} {} - {} - {}ms", method, target, status, duration_ms)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::error::ServerError;
    use crate::handler::HandlerResult;
    use crate::http::Response;

    async fn not_found(_req: Request) -> HandlerResult {
        Err(ServerError::NotFound)
    }

    #[test]
    fn entry_matches_the_access_log_format() {
        assert_eq!(
            access_entry(Method::GET, "/foo", 200, 5),
            "GET /foo - 200 - 5ms"
        );
    }

    #[test]
    fn duration_is_the_wall_clock_difference() {
        assert_eq!(elapsed_ms(Some(995), 1_000), 5);
    }

    #[test]
    fn missing_stamp_defaults_to_zero() {
        assert_eq!(elapsed_ms(None, 1_000), 0);
        assert_eq!(access_entry(Method::GET, "/foo", 200, 0), "GET /foo - 200 - 0ms");
    }

    #[test]
    fn clock_regressions_clamp_to_zero() {
        assert_eq!(elapsed_ms(Some(2_000), 1_000), 0);
    }

    #[tokio::test]
    async fn returns_the_downstream_response_untouched() {
        let result = RequestLogger::new()
            .call(
                Request::new(Method::GET, "/"),
                Next::new(|_req| async { Ok(Response::text("Hello world !")) }),
            )
            .await;

        let response = result.expect("response dropped by logger");
        assert_eq!(response.status, 200);
        assert_eq!(response.body, "Hello world !");
    }

    #[tokio::test]
    async fn passes_errors_through_for_unmatched_routes() {
        let result = RequestLogger::new()
            .call(Request::new(Method::GET, "/missing"), Next::new(not_found))
            .await;

        assert!(matches!(result, Err(ServerError::NotFound)));
    }
}
