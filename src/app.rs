//! Application assembly and the listening loop.
//!
//! An [`Application`] owns the router, the server-level middleware chain, and
//! the plugin registry. `listen` binds the port and serves forever; `bind`
//! exposes the intermediate [`Server`] handle so callers can observe the
//! bound address before the accept loop starts.

use std::any::Any;
use std::io::{Error, ErrorKind};
use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use futures::FutureExt;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::runtime::Runtime;

use crate::error::{ServerError, ServerResult};
use crate::handler::{HandlerResult, IntoResponse};
use crate::http::{Body, Method, Request, Response};
use crate::middleware::{Middleware, MiddlewareManager, Next};
use crate::plugins::Plugins;
use crate::router::Router;

/// How long to pause accepting when the connection limit is reached.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(10);

#[derive(Clone)]
pub struct Application {
    pub max_connections: usize,
    router: Router,
    middlewares: MiddlewareManager,
    plugins: Plugins,
}

impl Application {
    /// Creates an application with no routes or middleware attached.
    pub fn new() -> Self {
        Self {
            max_connections: 256,
            router: Router::new(),
            middlewares: MiddlewareManager::new(),
            plugins: Plugins::new(),
        }
    }

    pub fn max_connections(&mut self, max_connections: usize) -> &mut Self {
        self.max_connections = max_connections;
        self
    }

    /// Registers a value in the plugin registry, readable from any request.
    pub fn plugin<T>(&mut self, value: T) -> &mut Self
    where
        T: Send + Sync + 'static,
    {
        self.plugins.insert(value);
        self
    }

    /// Attaches a server-level middleware.
    ///
    /// Middlewares run for every request in registration order (first
    /// registered is outermost), including requests no route matches.
    pub fn middleware(&mut self, middleware: impl Middleware + 'static) -> &mut Self {
        self.middlewares.add(middleware);
        self
    }

    /// Registers a GET route handler.
    pub fn get<F, R>(&mut self, path: &str, handler: F)
    where
        F: Fn(Request) -> R + Send + Clone + Sync + 'static,
        R: IntoResponse + 'static,
    {
        self.router.get(path, handler);
    }

    /// Starts accepting connections on `port`.
    ///
    /// Blocks the calling thread for the lifetime of the server. A failed
    /// bind propagates as a fatal startup error.
    pub fn listen(self, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let runtime = Runtime::new()?;
        runtime.block_on(async {
            let server = self.bind(port).await?;
            server.run().await?;
            Ok(())
        })
    }

    /// Binds the listening socket and reports startup, without serving yet.
    pub async fn bind(self, port: u16) -> ServerResult<Server> {
        let listener = TcpListener::bind(("0.0.0.0", port)).await?;
        let local_addr = listener.local_addr()?;
        println!("{}", startup_entry(port));
        Ok(Server {
            app: self,
            listener,
            local_addr,
        })
    }

    pub(crate) async fn handle_connection<S>(&self, mut stream: S) -> Result<(), Error>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let mut buf_reader = BufReader::new(&mut stream);
        let mut request_line = String::new();
        buf_reader.read_line(&mut request_line).await?;

        if request_line.is_empty() {
            return Ok(());
        }

        let mut parts = request_line.trim().split_whitespace();
        let method = parts
            .next()
            .ok_or_else(|| Error::new(ErrorKind::InvalidData, "Invalid request line"))?;
        let target = parts
            .next()
            .ok_or_else(|| Error::new(ErrorKind::InvalidData, "Invalid request line"))?;

        let mut request = Request::new(Method::from_string(method), target);
        request.plugins = self.plugins.clone();

        loop {
            let mut line = String::new();
            buf_reader.read_line(&mut line).await?;

            if line.trim().is_empty() {
                break;
            }

            if let Some((name, value)) = line.trim().split_once(':') {
                request
                    .headers
                    .insert(name.trim().to_lowercase(), value.trim().to_string());
            }
        }

        if let Some(length) = request
            .headers
            .get("content-length")
            .and_then(|value| value.parse::<usize>().ok())
        {
            let mut data = Vec::with_capacity(length);
            let mut body_reader = buf_reader.take(length as u64);
            body_reader.read_to_end(&mut data).await?;
            let content_type = request
                .headers
                .get("content-type")
                .cloned()
                .unwrap_or_default();
            request.body = Body::new(content_type, data);
        }

        let response = self.dispatch(request).await;

        let mut head = format!("HTTP/1.1 {} {}\r\n", response.status, response.reason());
        for (name, value) in &response.headers {
            head += &format!("{}: {}\r\n", name, value);
        }
        head += &format!("Date: {}\r\n", httpdate::fmt_http_date(SystemTime::now()));
        head += &format!(
            "Content-Length: {}\r\n\r\n{}",
            response.body.len(),
            response.body
        );
        stream.write_all(head.as_bytes()).await?;
        Ok(())
    }

    /// Runs the full pipeline: the middleware chain around route dispatch,
    /// then error conversion. Middleware therefore observes unmatched routes
    /// and handler failures with the status they produce on the wire.
    pub(crate) async fn dispatch(&self, req: Request) -> Response {
        let router = self.router.clone();
        let next = Next::new(move |req| route_request(router.clone(), req));

        let outcome = AssertUnwindSafe(self.middlewares.call(req, next))
            .catch_unwind()
            .await;
        let outcome = match outcome {
            Ok(result) => result,
            Err(panic) => Err(ServerError::PanicError(panic_message(panic))),
        };

        match outcome {
            Ok(response) => response,
            Err(err) => Response::error(err),
        }
    }
}

async fn route_request(router: Router, req: Request) -> HandlerResult {
    if let Some(route) = router.find(&req.method, &req.path) {
        return route.handle(req).await;
    }

    // HEAD is answered from the GET handler with the body stripped
    if req.method == Method::HEAD {
        if let Some(route) = router.find(&Method::GET, &req.path) {
            let mut response = route.handle(req).await?;
            response.body = String::new();
            return Ok(response);
        }
    }

    Err(ServerError::NotFound)
}

/// A bound listener that has not started accepting yet.
pub struct Server {
    app: Application,
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl Server {
    /// Address the listening socket is actually bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn port(&self) -> u16 {
        self.local_addr.port()
    }

    /// Accepts connections until the process exits, one task per connection.
    pub async fn run(self) -> ServerResult<()> {
        let connections = Arc::new(AtomicUsize::new(0));

        loop {
            if connections.load(Ordering::Relaxed) >= self.app.max_connections {
                tokio::time::sleep(ACCEPT_BACKOFF).await;
                continue;
            }

            match self.listener.accept().await {
                Ok((stream, peer_addr)) => {
                    connections.fetch_add(1, Ordering::Relaxed);
                    let app = self.app.clone();
                    let connections = Arc::clone(&connections);

                    tokio::spawn(async move {
                        log::debug!("Accepted connection from {}", peer_addr);
                        if let Err(err) = app.handle_connection(stream).await {
                            log::error!("Connection error: {}", err);
                        }
                        connections.fetch_sub(1, Ordering::Relaxed);
                    });
                }
                Err(err) => log::error!("Accept failed: {}", err),
            }
        }
    }
}

/// One-line startup notice emitted after a successful bind.
fn startup_entry(port: u16) -> String {
    format!("Server started on port {}", port)
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "Unknown panic".to_string()
    }
}
