use std::collections::HashMap;

use serde::Serialize;

use crate::error::ServerError;

#[derive(Debug)]
pub struct Response {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl Response {
    pub fn new(status: u16) -> Response {
        Response {
            status,
            headers: HashMap::new(),
            body: String::new(),
        }
    }

    pub fn status(&mut self, status: u16) -> &mut Self {
        self.status = status;
        self
    }

    pub fn body<T: AsRef<str>>(&mut self, body: T) -> &mut Self {
        self.body = body.as_ref().to_string();
        self
    }

    pub fn header<K: AsRef<str>, V: AsRef<str>>(&mut self, name: K, value: V) -> &mut Self {
        self.headers
            .insert(name.as_ref().to_string(), value.as_ref().to_string());
        self
    }

    pub fn json<T: Serialize>(&mut self, value: &T) -> Result<&mut Self, ServerError> {
        let json_string = serde_json::to_string(value)
            .map_err(|e| ServerError::InternalError(format!("JSON serialization error: {}", e)))?;
        self.header("Content-Type", "application/json");
        self.body(json_string);
        Ok(self)
    }

    /// Plain-text 200 response.
    pub fn text<T: AsRef<str>>(content: T) -> Response {
        let mut response = Response::new(200);
        response.header("Content-Type", "text/plain").body(content);
        response
    }

    /// Converts an error into its wire form: matching status, JSON envelope.
    pub fn error(err: ServerError) -> Response {
        let status = err.status_code();
        let mut response = Response::new(status);
        response
            .json(&serde_json::json!({
                "error": {
                    "message": err.to_string(),
                    "status": status
                }
            }))
            .expect("Error creating JSON response");
        response
    }

    pub(crate) fn reason(&self) -> &'static str {
        match self.status {
            200 => "OK",
            204 => "No Content",
            400 => "Bad Request",
            404 => "Not Found",
            500 => "Internal Server Error",
            _ => "",
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn text_builds_a_plain_ok_response() {
        let response = Response::text("Hello world !");

        assert_eq!(response.status, 200);
        assert_eq!(response.body, "Hello world !");
        assert_eq!(
            response.headers.get("Content-Type").map(String::as_str),
            Some("text/plain")
        );
    }

    #[test]
    fn error_carries_the_status_of_its_cause() {
        let response = Response::error(ServerError::NotFound);

        assert_eq!(response.status, 404);
        assert_eq!(response.reason(), "Not Found");
        assert!(response.body.contains("Not found"));
    }
}
