use std::collections::HashMap;
use std::fmt;

use serde_json::Value;

use crate::plugins::Plugins;

#[derive(Eq, Hash, PartialEq, Copy, Clone, Debug)]
pub enum Method {
    GET,
    POST,
    PUT,
    DELETE,
    HEAD,
    CONNECT,
    OPTIONS,
    TRACE,
    PATCH,
}

impl Method {
    pub fn from_string(s: &str) -> Method {
        match s {
            "GET" => Method::GET,
            "POST" => Method::POST,
            "PUT" => Method::PUT,
            "DELETE" => Method::DELETE,
            "HEAD" => Method::HEAD,
            "CONNECT" => Method::CONNECT,
            "OPTIONS" => Method::OPTIONS,
            "TRACE" => Method::TRACE,
            "PATCH" => Method::PATCH,
            _ => Method::GET,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::DELETE => "DELETE",
            Method::HEAD => "HEAD",
            Method::CONNECT => "CONNECT",
            Method::OPTIONS => "OPTIONS",
            Method::TRACE => "TRACE",
            Method::PATCH => "PATCH",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
pub struct Body {
    content_type: String,
    data: Vec<u8>,
}

impl Body {
    pub fn empty() -> Body {
        Body {
            content_type: String::new(),
            data: Vec::new(),
        }
    }

    pub fn new<T: AsRef<str>>(content_type: T, data: Vec<u8>) -> Body {
        Body {
            content_type: content_type.as_ref().to_string(),
            data,
        }
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn as_string(&self) -> String {
        String::from_utf8_lossy(&self.data).to_string()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// One inbound HTTP request, alive for the duration of its connection task.
///
/// `target` is the request target exactly as received (path plus query
/// string); `path` is the normalized form used for routing. The `data` map is
/// the per-request context threaded through the middleware pipeline.
#[derive(Debug)]
pub struct Request {
    pub method: Method,
    pub target: String,
    pub path: String,
    pub query: HashMap<String, String>,
    pub headers: HashMap<String, String>,
    pub data: HashMap<String, Value>,
    pub body: Body,
    pub plugins: Plugins,
}

impl Request {
    /// Builds a request from a request-line target such as `/foo?tag=1`.
    pub fn new(method: Method, target: &str) -> Request {
        let (path, query) = split_target(target);
        Request {
            method,
            target: target.to_string(),
            path,
            query,
            headers: HashMap::new(),
            data: HashMap::new(),
            body: Body::empty(),
            plugins: Plugins::default(),
        }
    }

    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(|value| value.as_str())
    }

    pub fn get_data(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn set_data<T>(&mut self, key: &str, value: T)
    where
        T: serde::Serialize,
    {
        if let Ok(value) = serde_json::to_value(value) {
            self.data.insert(key.to_string(), value);
        }
    }

    pub fn get_typed_data<T>(&self, key: &str) -> Option<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.data
            .get(key)
            .and_then(|value| serde_json::from_value(value.to_owned()).ok())
    }
}

fn split_target(target: &str) -> (String, HashMap<String, String>) {
    let mut parts = target.splitn(2, '?');
    let path = normalize_path(parts.next().unwrap_or("/"));
    let query = parts.next().map(parse_query).unwrap_or_default();
    (path, query)
}

/// Strips trailing slashes so `/foo/` and `/foo` route identically.
pub(crate) fn normalize_path(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

fn parse_query(query: &str) -> HashMap<String, String> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let key = urlencoding::decode(key).ok()?.into_owned();
            let value = urlencoding::decode(value).ok()?.into_owned();
            Some((key, value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn parses_known_methods() {
        assert_eq!(Method::from_string("GET"), Method::GET);
        assert_eq!(Method::from_string("HEAD"), Method::HEAD);
        assert_eq!(Method::GET.to_string(), "GET");
    }

    #[test]
    fn keeps_the_raw_target_and_normalizes_the_path() {
        let req = Request::new(Method::GET, "/foo/?tag=a%20b&flag");

        assert_eq!(req.target, "/foo/?tag=a%20b&flag");
        assert_eq!(req.path, "/foo");
        assert_eq!(req.query.get("tag").map(String::as_str), Some("a b"));
        assert_eq!(req.query.get("flag").map(String::as_str), Some(""));
    }

    #[test]
    fn root_path_survives_normalization() {
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path(""), "/");
        assert_eq!(normalize_path("/foo//"), "/foo");
    }

    #[test]
    fn data_context_round_trips_typed_values() {
        let mut req = Request::new(Method::GET, "/");
        req.set_data("started_at_ms", 1_234u64);

        assert_eq!(req.get_typed_data::<u64>("started_at_ms"), Some(1_234));
        assert_eq!(req.get_typed_data::<u64>("missing"), None);
    }
}
