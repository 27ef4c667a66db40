//! Assembly of the greeting service: timing hook, access logging, and the
//! single root route.

use crate::app::Application;
use crate::handler::HandlerResult;
use crate::http::{Request, Response};
use crate::middleware::{RequestLogger, RequestTimer};

/// Body served by the root route.
const GREETING: &str = "Hello world !";

/// Builds the service with its hooks and route attached.
///
/// The timer is registered first so it runs outermost and every request the
/// logger sees already carries its start stamp. The returned application is
/// fully configured but not yet listening.
pub fn build() -> Application {
    let mut app = Application::new();
    app.middleware(RequestTimer::new());
    app.middleware(RequestLogger::new());
    app.get("/", hello);
    app
}

async fn hello(_req: Request) -> HandlerResult {
    Ok(Response::text(GREETING))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    use super::*;
    use crate::http::Method;

    #[tokio::test]
    async fn root_route_serves_the_greeting() {
        let app = build();

        let response = app.dispatch(Request::new(Method::GET, "/")).await;

        assert_eq!(response.status, 200);
        assert_eq!(response.body, "Hello world !");
    }

    #[tokio::test]
    async fn query_parameters_do_not_change_the_greeting() {
        let app = build();

        let response = app
            .dispatch(Request::new(Method::GET, "/?name=world&x=1"))
            .await;

        assert_eq!(response.status, 200);
        assert_eq!(response.body, "Hello world !");
    }

    #[tokio::test]
    async fn other_paths_fall_through_to_not_found() {
        let app = build();

        let response = app.dispatch(Request::new(Method::GET, "/foo")).await;

        assert_eq!(response.status, 404);
    }

    #[tokio::test]
    async fn serves_a_full_request_over_a_stream() {
        let app = build();
        let (mut client, server_side) = tokio::io::duplex(1024);

        client
            .write_all(b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n")
            .await
            .expect("request not written");
        app.handle_connection(server_side)
            .await
            .expect("connection failed");

        let mut raw = Vec::new();
        client.read_to_end(&mut raw).await.expect("response not read");
        let response = String::from_utf8(raw).expect("response not utf-8");

        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(response.ends_with("Hello world !"));
    }

    #[tokio::test]
    async fn request_headers_do_not_change_the_greeting() {
        let app = build();
        let mut request = Request::new(Method::GET, "/");
        request
            .headers
            .insert("x-custom".to_string(), "value".to_string());

        let response = app.dispatch(request).await;

        assert_eq!(response.body, "Hello world !");
    }
}
