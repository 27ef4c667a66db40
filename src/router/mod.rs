use std::collections::HashMap;

use crate::handler::{Handler, HandlerResult, IntoResponse};
use crate::http::{normalize_path, Method, Request};

#[derive(Clone)]
pub(crate) struct Route {
    handler: Box<dyn Handler>,
}

impl Route {
    pub async fn handle(&self, req: Request) -> HandlerResult {
        self.handler.handle(req).await
    }
}

/// Exact-match method+path dispatch table.
#[derive(Clone)]
pub struct Router {
    routes: HashMap<String, HashMap<Method, Route>>,
}

impl Router {
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
        }
    }

    /// Registers a GET route handler.
    pub fn get<F, R>(&mut self, path: &str, handler: F) -> &mut Self
    where
        F: Fn(Request) -> R + Send + Clone + Sync + 'static,
        R: IntoResponse + 'static,
    {
        self.add(Method::GET, path, handler);
        self
    }

    fn add<F, R>(&mut self, method: Method, path: &str, handler: F)
    where
        F: Fn(Request) -> R + Send + Sync + Clone + 'static,
        R: IntoResponse,
    {
        self.routes.entry(normalize_path(path)).or_default().insert(
            method,
            Route {
                handler: Box::new(handler),
            },
        );
    }

    pub(crate) fn find(&self, method: &Method, path: &str) -> Option<&Route> {
        self.routes.get(path).and_then(|routes| routes.get(method))
    }
}
