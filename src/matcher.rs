//! Request matching logic.
//!
//! A [`RequestMatcher`] is a stateless predicate over an outbound request:
//! optional path pattern, optional method restriction, optional header and
//! body predicates. Path patterns compile when the matcher is built, so an
//! invalid pattern fails at registration time rather than mid-test.

use crate::error::MockError;
use crate::request::MockRequest;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Declarative path matching configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PathPattern {
    /// Exact path match
    Exact { value: String },
    /// Path prefix match
    Prefix { value: String },
    /// Regex pattern, unanchored unless the pattern anchors itself
    Regex { pattern: String },
    /// Glob pattern match
    Glob { pattern: String },
}

/// Query parameter matching.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QueryMatcher {
    /// Exact value match
    Exact { value: String },
    /// Regex pattern match
    Regex { pattern: String },
    /// Parameter must be present (any value)
    Present,
    /// Parameter must be absent
    Absent,
}

/// Header matching.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HeaderMatcher {
    /// Exact value match
    Exact { value: String },
    /// Regex pattern match
    Regex { pattern: String },
    /// Header must be present (any value)
    Present,
    /// Header must be absent
    Absent,
    /// Value must contain substring
    Contains { value: String },
}

/// Body matching configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BodyMatcher {
    /// Exact body match
    Exact { value: String },
    /// Regex pattern match
    Regex { pattern: String },
    /// JSON path expressions and expected values
    JsonPath {
        expressions: HashMap<String, serde_json::Value>,
    },
    /// Body must contain substring
    Contains { value: String },
    /// Body must be valid JSON (any structure)
    Json,
    /// Body must be empty
    Empty,
}

#[derive(Debug)]
enum CompiledPath {
    Exact(String),
    Prefix(String),
    Regex(Regex),
    Glob(globset::GlobMatcher),
}

impl CompiledPath {
    fn compile(pattern: &PathPattern) -> Result<Self, MockError> {
        match pattern {
            PathPattern::Exact { value } => Ok(Self::Exact(value.clone())),
            PathPattern::Prefix { value } => Ok(Self::Prefix(value.clone())),
            PathPattern::Regex { pattern } => {
                let regex = Regex::new(pattern).map_err(|source| MockError::InvalidPattern {
                    pattern: pattern.clone(),
                    source,
                })?;
                Ok(Self::Regex(regex))
            }
            PathPattern::Glob { pattern } => {
                let glob =
                    globset::Glob::new(pattern).map_err(|source| MockError::InvalidGlob {
                        pattern: pattern.clone(),
                        source,
                    })?;
                Ok(Self::Glob(glob.compile_matcher()))
            }
        }
    }

    fn matches(&self, path: &str) -> bool {
        match self {
            Self::Exact(value) => path == value,
            Self::Prefix(value) => path.starts_with(value),
            Self::Regex(regex) => regex.is_match(path),
            Self::Glob(glob) => glob.is_match(path),
        }
    }
}

/// Predicate over an outbound request.
///
/// Built once, evaluated against any number of requests. All conditions must
/// hold for [`matches`](Self::matches) to return true; an empty matcher
/// (no conditions) matches every request.
#[derive(Debug)]
pub struct RequestMatcher {
    methods: Vec<String>,
    path: Option<CompiledPath>,
    query: Vec<(String, QueryMatcher)>,
    headers: Vec<(String, HeaderMatcher)>,
    body: Option<BodyMatcher>,
}

impl RequestMatcher {
    /// A matcher with no conditions; matches any request.
    pub fn any() -> Self {
        Self {
            methods: Vec::new(),
            path: None,
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Matcher on a regex path pattern.
    ///
    /// The pattern is unanchored; use `$` to pin the end of the path, e.g.
    /// `"/v1/organizations/org1$"`.
    pub fn path(pattern: &str) -> Result<Self, MockError> {
        Self::any().with_path(PathPattern::Regex {
            pattern: pattern.to_string(),
        })
    }

    /// Matcher on an exact path.
    pub fn path_exact(path: &str) -> Self {
        let mut matcher = Self::any();
        matcher.path = Some(CompiledPath::Exact(path.to_string()));
        matcher
    }

    /// Matcher on a path prefix.
    pub fn path_prefix(prefix: &str) -> Self {
        let mut matcher = Self::any();
        matcher.path = Some(CompiledPath::Prefix(prefix.to_string()));
        matcher
    }

    /// Matcher on a glob path pattern.
    pub fn path_glob(pattern: &str) -> Result<Self, MockError> {
        Self::any().with_path(PathPattern::Glob {
            pattern: pattern.to_string(),
        })
    }

    /// Set the path condition from a declarative pattern, compiling it now.
    pub fn with_path(mut self, pattern: PathPattern) -> Result<Self, MockError> {
        self.path = Some(CompiledPath::compile(&pattern)?);
        Ok(self)
    }

    /// Restrict to a single HTTP method.
    pub fn method(self, method: &str) -> Self {
        self.methods(&[method])
    }

    /// Restrict to a set of HTTP methods.
    pub fn methods(mut self, methods: &[&str]) -> Self {
        self.methods
            .extend(methods.iter().map(|m| m.to_uppercase()));
        self
    }

    /// Add a query parameter condition.
    pub fn query(mut self, name: &str, matcher: QueryMatcher) -> Self {
        self.query.push((name.to_string(), matcher));
        self
    }

    /// Add a header condition. Header names compare case-insensitively.
    pub fn header(mut self, name: &str, matcher: HeaderMatcher) -> Self {
        self.headers.push((name.to_string(), matcher));
        self
    }

    /// Add a body condition.
    pub fn body(mut self, matcher: BodyMatcher) -> Self {
        self.body = Some(matcher);
        self
    }

    /// Evaluate the predicate. No side effects.
    pub fn matches(&self, request: &MockRequest) -> bool {
        if !self.methods.is_empty() && !self.methods.iter().any(|m| m == request.method()) {
            return false;
        }

        if let Some(path) = &self.path {
            if !path.matches(request.path()) {
                return false;
            }
        }

        if !self.query.is_empty() {
            let params = parse_query_string(request.query().unwrap_or(""));
            for (name, qm) in &self.query {
                if !matches_query(&params, name, qm) {
                    return false;
                }
            }
        }

        for (name, hm) in &self.headers {
            if !matches_header(request, name, hm) {
                return false;
            }
        }

        if let Some(bm) = &self.body {
            if !matches_body(request.body(), bm) {
                return false;
            }
        }

        true
    }
}

fn matches_query(params: &HashMap<String, String>, name: &str, matcher: &QueryMatcher) -> bool {
    match matcher {
        QueryMatcher::Exact { value } => params.get(name) == Some(value),
        QueryMatcher::Regex { pattern } => {
            if let Some(val) = params.get(name) {
                if let Ok(regex) = Regex::new(pattern) {
                    return regex.is_match(val);
                }
            }
            false
        }
        QueryMatcher::Present => params.contains_key(name),
        QueryMatcher::Absent => !params.contains_key(name),
    }
}

fn matches_header(request: &MockRequest, name: &str, matcher: &HeaderMatcher) -> bool {
    let header_value = request.header(name);

    match matcher {
        HeaderMatcher::Exact { value } => header_value == Some(value.as_str()),
        HeaderMatcher::Regex { pattern } => {
            if let Some(val) = header_value {
                if let Ok(regex) = Regex::new(pattern) {
                    return regex.is_match(val);
                }
            }
            false
        }
        HeaderMatcher::Present => header_value.is_some(),
        HeaderMatcher::Absent => header_value.is_none(),
        HeaderMatcher::Contains { value } => header_value
            .map(|v| v.contains(value.as_str()))
            .unwrap_or(false),
    }
}

fn matches_body(body: Option<&[u8]>, matcher: &BodyMatcher) -> bool {
    let body_str = body.and_then(|b| std::str::from_utf8(b).ok());

    match matcher {
        BodyMatcher::Exact { value } => body_str == Some(value.as_str()),
        BodyMatcher::Regex { pattern } => {
            if let Some(bs) = body_str {
                if let Ok(regex) = Regex::new(pattern) {
                    return regex.is_match(bs);
                }
            }
            false
        }
        BodyMatcher::JsonPath { expressions } => {
            if let Some(bs) = body_str {
                if let Ok(json) = serde_json::from_str::<serde_json::Value>(bs) {
                    return matches_json_paths(&json, expressions);
                }
            }
            false
        }
        BodyMatcher::Contains { value } => body_str
            .map(|bs| bs.contains(value.as_str()))
            .unwrap_or(false),
        BodyMatcher::Json => body_str
            .map(|bs| serde_json::from_str::<serde_json::Value>(bs).is_ok())
            .unwrap_or(false),
        BodyMatcher::Empty => body.map(|b| b.is_empty()).unwrap_or(true),
    }
}

fn matches_json_paths(
    json: &serde_json::Value,
    expressions: &HashMap<String, serde_json::Value>,
) -> bool {
    use jsonpath_rust::JsonPath;

    for (path_expr, expected) in expressions {
        let path = match JsonPath::try_from(path_expr.as_str()) {
            Ok(p) => p,
            Err(_) => return false,
        };

        let results = path.find(json);

        // A null expected value means "the path must resolve to something".
        let matches = if expected.is_null() {
            !results.is_null()
        } else {
            results == *expected
        };
        if !matches {
            return false;
        }
    }
    true
}

/// Parse a query string into key-value pairs.
fn parse_query_string(query: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();

    for part in query.split('&') {
        if part.is_empty() {
            continue;
        }
        if let Some((key, value)) = part.split_once('=') {
            params.insert(urlencoding_decode(key), urlencoding_decode(value));
        } else {
            params.insert(urlencoding_decode(part), String::new());
        }
    }

    params
}

/// Simple URL decoding.
fn urlencoding_decode(s: &str) -> String {
    let mut result = String::new();
    let mut chars = s.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '%' {
            let hex: String = chars.by_ref().take(2).collect();
            if hex.len() == 2 {
                if let Ok(byte) = u8::from_str_radix(&hex, 16) {
                    result.push(byte as char);
                    continue;
                }
            }
            result.push('%');
            result.push_str(&hex);
        } else if ch == '+' {
            result.push(' ');
        } else {
            result.push(ch);
        }
    }

    result
}
