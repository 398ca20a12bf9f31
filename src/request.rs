//! Outbound request snapshot consumed by the stack.

use std::collections::HashMap;

/// An immutable snapshot of an outbound HTTP request at dispatch time.
///
/// The stack consumes requests, it does not own the client's request type;
/// transport adapters build one of these from whatever their client uses.
#[derive(Debug, Clone)]
pub struct MockRequest {
    method: String,
    path: String,
    query: Option<String>,
    headers: HashMap<String, String>,
    body: Option<Vec<u8>>,
}

impl MockRequest {
    /// Create a request snapshot with the given method and path.
    pub fn new(method: &str, path: &str) -> Self {
        Self {
            method: method.to_uppercase(),
            path: path.to_string(),
            query: None,
            headers: HashMap::new(),
            body: None,
        }
    }

    /// Shorthand for a GET request.
    pub fn get(path: &str) -> Self {
        Self::new("GET", path)
    }

    /// Shorthand for a POST request.
    pub fn post(path: &str) -> Self {
        Self::new("POST", path)
    }

    /// Shorthand for a DELETE request.
    pub fn delete(path: &str) -> Self {
        Self::new("DELETE", path)
    }

    /// Attach a raw query string (without the leading `?`).
    pub fn with_query(mut self, query: &str) -> Self {
        self.query = Some(query.to_string());
        self
    }

    /// Attach a header.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }

    /// Attach a body.
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_uppercased() {
        let req = MockRequest::new("get", "/v1/organizations/org1");
        assert_eq!(req.method(), "GET");
    }

    #[test]
    fn test_header_lookup_case_insensitive() {
        let req = MockRequest::get("/hello").with_header("Content-Type", "application/json");
        assert_eq!(req.header("content-type"), Some("application/json"));
        assert_eq!(req.header("Accept"), None);
    }

    #[test]
    fn test_builder_chain() {
        let req = MockRequest::post("/v1/organizations/org1/developers")
            .with_query("expand=true")
            .with_body(br#"{"email":"dev1@example.com"}"#.to_vec());
        assert_eq!(req.method(), "POST");
        assert_eq!(req.query(), Some("expand=true"));
        assert!(req.body().is_some());
    }
}
