//! Response synthesis.
//!
//! A [`ResponseSpec`] says how to produce a response: render a named
//! template, replay a literal, or serialize an entity snapshot. The
//! [`ResponseFactory`] turns a spec into a fully materialized
//! [`MockResponse`], deterministically.

use crate::config::{TemplateBody, TemplateDefinition, TemplateLibrary};
use crate::error::MockError;
use crate::template::{Context, TemplateEngine};
use serde::Serialize;
use std::collections::HashMap;

/// A fully materialized HTTP response: status, headers, body bytes.
///
/// Nothing is lazy or streamed; what the caller receives is what the
/// simulated server "sent".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockResponse {
    status: u16,
    headers: HashMap<String, String>,
    body: Vec<u8>,
}

impl MockResponse {
    /// An empty-bodied response with the given status.
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: Vec::new(),
        }
    }

    /// Builder-style header.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }

    /// Builder-style body.
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Builder-style JSON body; sets the content type.
    ///
    /// # Panics
    ///
    /// Panics if the value cannot be represented as JSON.
    pub fn with_json_body(self, value: impl Serialize) -> Self {
        let body = serde_json::to_vec(&value).expect("body must be representable as JSON");
        self.with_header("content-type", "application/json")
            .with_body(body)
    }

    pub fn status(&self) -> u16 {
        self.status
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

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body as UTF-8, lossily.
    pub fn body_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Parse the body as JSON.
    pub fn json(&self) -> Result<serde_json::Value, MockError> {
        serde_json::from_slice(&self.body)
            .map_err(|e| MockError::Body(format!("response body is not JSON: {e}")))
    }
}

/// A read-only field bag representing a domain entity's state, serialized
/// into the API's wire shape as-is.
#[derive(Debug, Clone)]
pub struct EntitySnapshot {
    status: u16,
    fields: serde_json::Map<String, serde_json::Value>,
}

impl EntitySnapshot {
    /// Snapshot an entity's public fields.
    ///
    /// # Panics
    ///
    /// Panics if the entity does not serialize to a JSON object; a
    /// non-object entity source is a test-authoring bug.
    pub fn of(entity: &impl Serialize) -> Self {
        let value =
            serde_json::to_value(entity).expect("entity must be representable as JSON");
        let serde_json::Value::Object(fields) = value else {
            panic!("entity snapshot must serialize to a JSON object");
        };
        Self { status: 200, fields }
    }

    /// Override the default 200 status.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    pub fn fields(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.fields
    }
}

/// How a response should be produced when its turn comes.
#[derive(Debug, Clone)]
pub enum ResponseSpec {
    /// Render a named template against a context
    Template { name: String, context: Context },
    /// Replay a pre-built response verbatim
    Literal(MockResponse),
    /// Serialize an entity snapshot as the response body
    Entity(EntitySnapshot),
}

impl ResponseSpec {
    pub fn template(name: &str, context: Context) -> Self {
        Self::Template {
            name: name.to_string(),
            context,
        }
    }

    pub fn literal(response: MockResponse) -> Self {
        Self::Literal(response)
    }

    pub fn entity(snapshot: EntitySnapshot) -> Self {
        Self::Entity(snapshot)
    }
}

/// Renders [`ResponseSpec`]s into [`MockResponse`]s.
///
/// Pure: the same spec renders to the same bytes every time. The factory
/// owns its template library; there is no ambient registry.
pub struct ResponseFactory {
    library: TemplateLibrary,
    engine: TemplateEngine,
}

impl ResponseFactory {
    /// Create a factory over a template library.
    pub fn new(library: TemplateLibrary) -> Self {
        Self {
            library,
            engine: TemplateEngine::new(),
        }
    }

    /// Factory over the built-in management API templates.
    pub fn builtin() -> Self {
        Self::new(TemplateLibrary::builtin())
    }

    pub fn library(&self) -> &TemplateLibrary {
        &self.library
    }

    pub fn library_mut(&mut self) -> &mut TemplateLibrary {
        &mut self.library
    }

    /// Materialize a response from a spec.
    pub fn render(&self, spec: &ResponseSpec) -> Result<MockResponse, MockError> {
        match spec {
            ResponseSpec::Template { name, context } => self.render_template(name, context),
            ResponseSpec::Literal(response) => Ok(response.clone()),
            ResponseSpec::Entity(snapshot) => self.render_entity(snapshot),
        }
    }

    /// Render a named template. Fails if the name is unregistered or a
    /// required context key is missing.
    pub fn render_template(&self, name: &str, context: &Context) -> Result<MockResponse, MockError> {
        let template = self.library.get(name).ok_or_else(|| MockError::TemplateNotFound {
            name: name.to_string(),
        })?;

        for key in &template.requires {
            if !context.contains(key) {
                return Err(MockError::MissingContextKey {
                    template: name.to_string(),
                    key: key.clone(),
                });
            }
        }

        let status = context.status_override().unwrap_or(template.status);
        if !(100..=599).contains(&status) {
            return Err(MockError::InvalidStatus(status));
        }

        let mut response = MockResponse::new(status);
        for (header, value) in &template.headers {
            let rendered = if value.contains("{{") {
                self.engine.render_str(value, context)?
            } else {
                value.clone()
            };
            response = response.with_header(header, &rendered);
        }

        if let Some(body) = &template.body {
            if response.header("content-type").is_none() {
                response = response.with_header("content-type", body.content_type());
            }
            response = response.with_body(self.render_body(body, context)?);
        }

        Ok(response)
    }

    fn render_body(&self, body: &TemplateBody, context: &Context) -> Result<Vec<u8>, MockError> {
        match body {
            TemplateBody::Text { content } => {
                Ok(self.engine.render_str(content, context)?.into_bytes())
            }
            TemplateBody::Json { content } => {
                let rendered = self.engine.render_json(content, context)?;
                serde_json::to_vec(&rendered)
                    .map_err(|e| MockError::Body(format!("unserializable JSON body: {e}")))
            }
            // Binary and file bodies pass through untemplated.
            _ => body.to_bytes(),
        }
    }

    /// Serialize an entity snapshot as a JSON response, the way the real
    /// server would return exactly that resource.
    fn render_entity(&self, snapshot: &EntitySnapshot) -> Result<MockResponse, MockError> {
        if !(100..=599).contains(&snapshot.status) {
            return Err(MockError::InvalidStatus(snapshot.status));
        }

        let body = serde_json::to_vec(snapshot.fields())
            .map_err(|e| MockError::Body(format!("unserializable entity snapshot: {e}")))?;

        Ok(MockResponse::new(snapshot.status)
            .with_header("content-type", "application/json")
            .with_body(body))
    }
}

/// Helper to register a template programmatically without authoring YAML.
pub fn literal_template(status: u16, body: serde_json::Value) -> TemplateDefinition {
    TemplateDefinition {
        status,
        headers: HashMap::new(),
        requires: Vec::new(),
        body: Some(TemplateBody::Json { content: body }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn factory_with(name: &str, yaml_template: &str) -> ResponseFactory {
        let yaml = format!("templates:\n  {name}:\n{yaml_template}");
        ResponseFactory::new(TemplateLibrary::from_yaml(&yaml).unwrap())
    }

    #[test]
    fn test_render_literal() {
        let factory = ResponseFactory::new(TemplateLibrary::default());
        let spec = ResponseSpec::literal(MockResponse::new(201).with_body(b"ok".to_vec()));

        let response = factory.render(&spec).unwrap();
        assert_eq!(response.status(), 201);
        assert_eq!(response.body(), b"ok");
    }

    #[test]
    fn test_render_unknown_template_fails() {
        let factory = ResponseFactory::new(TemplateLibrary::default());
        let err = factory
            .render(&ResponseSpec::template("nope", Context::new()))
            .unwrap_err();
        assert!(matches!(err, MockError::TemplateNotFound { name } if name == "nope"));
    }

    #[test]
    fn test_render_missing_required_key_fails() {
        let factory = factory_with(
            "greet",
            "    status: 200\n    requires: [who]\n    body:\n      type: text\n      content: \"hi {{who}}\"\n",
        );

        let err = factory
            .render(&ResponseSpec::template("greet", Context::new()))
            .unwrap_err();
        assert!(
            matches!(err, MockError::MissingContextKey { ref key, .. } if key == "who"),
            "unexpected error: {err}"
        );

        let ok = factory
            .render(&ResponseSpec::template("greet", Context::new().set("who", "dev")))
            .unwrap();
        assert_eq!(ok.body(), b"hi dev");
    }

    #[test]
    fn test_status_code_override() {
        let factory = factory_with(
            "thing",
            "    status: 200\n    body:\n      type: text\n      content: x\n",
        );

        let ctx = Context::new().set("status_code", 404);
        let response = factory
            .render(&ResponseSpec::template("thing", ctx))
            .unwrap();
        assert_eq!(response.status(), 404);
    }

    #[test]
    fn test_json_body_content_type_defaulted() {
        let factory = factory_with(
            "data",
            "    status: 200\n    body:\n      type: json\n      content:\n        id: \"{{id}}\"\n",
        );

        let response = factory
            .render(&ResponseSpec::template("data", Context::new().set("id", "42")))
            .unwrap();
        assert_eq!(response.header("content-type"), Some("application/json"));
        assert_eq!(response.json().unwrap()["id"], "42");
    }

    #[test]
    fn test_render_is_idempotent() {
        let factory = ResponseFactory::builtin();
        let ctx = Context::new()
            .set("developer", serde_json::json!({"email": "dev1@example.com"}))
            .set("org_name", "org1");
        let spec = ResponseSpec::template("get_developer", ctx);

        let a = factory.render(&spec).unwrap();
        let b = factory.render(&spec).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_entity_snapshot_round_trip() {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Widget {
            name: String,
            display_name: String,
        }

        let widget = Widget {
            name: "w1".to_string(),
            display_name: "Widget One".to_string(),
        };
        let snapshot = EntitySnapshot::of(&widget);
        let factory = ResponseFactory::new(TemplateLibrary::default());

        let response = factory.render(&ResponseSpec::entity(snapshot.clone())).unwrap();
        assert_eq!(response.status(), 200);

        // Every exposed field must come back under its canonical key.
        let decoded = response.json().unwrap();
        let decoded = decoded.as_object().unwrap();
        assert_eq!(decoded.len(), snapshot.fields().len());
        for (key, value) in snapshot.fields() {
            assert_eq!(decoded.get(key), Some(value));
        }
    }

    #[test]
    fn test_entity_snapshot_status_override() {
        let snapshot =
            EntitySnapshot::of(&serde_json::json!({"name": "org1"})).with_status(201);
        let factory = ResponseFactory::new(TemplateLibrary::default());

        let response = factory.render(&ResponseSpec::entity(snapshot)).unwrap();
        assert_eq!(response.status(), 201);
    }

    #[test]
    fn test_entity_snapshot_rejects_out_of_range_status() {
        let snapshot = EntitySnapshot::of(&serde_json::json!({"name": "org1"})).with_status(777);
        let factory = ResponseFactory::new(TemplateLibrary::default());

        let err = factory.render(&ResponseSpec::entity(snapshot)).unwrap_err();
        assert!(matches!(err, MockError::InvalidStatus(777)));
    }

    #[test]
    fn test_builtin_get_organization_template() {
        let factory = ResponseFactory::builtin();
        let ctx = Context::new().set("org_name", "org1");

        let response = factory
            .render(&ResponseSpec::template("get_organization", ctx))
            .unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(response.header("content-type"), Some("application/json"));

        let body = response.json().unwrap();
        assert_eq!(body["name"], "org1");
        // displayName falls back to the organization name when unset.
        assert_eq!(body["displayName"], "org1");
    }

    #[test]
    fn test_builtin_get_developer_apps_listing() {
        let factory = ResponseFactory::builtin();
        let ctx = Context::new().set(
            "apps",
            serde_json::json!([
                {"appId": "a-1", "name": "first_app", "status": "approved"},
                {"appId": "a-2", "name": "second_app", "status": "revoked"}
            ]),
        );

        let response = factory
            .render(&ResponseSpec::template("get_developer_apps", ctx))
            .unwrap();
        let body = response.json().unwrap();
        let apps = body.as_array().unwrap();
        assert_eq!(apps.len(), 2);
        assert_eq!(apps[0]["appId"], "a-1");
        assert_eq!(apps[1]["status"], "revoked");
    }

    #[test]
    fn test_builtin_get_developer_apps_single_entry_has_no_trailing_comma() {
        let factory = ResponseFactory::builtin();
        let ctx = Context::new().set(
            "apps",
            serde_json::json!([{"appId": "a-1", "name": "only_app", "status": "approved"}]),
        );

        let response = factory
            .render(&ResponseSpec::template("get_developer_apps", ctx))
            .unwrap();
        let body = response.json().unwrap();
        assert_eq!(body.as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_builtin_access_token_template() {
        let factory = ResponseFactory::builtin();

        let response = factory
            .render(&ResponseSpec::template("access_token", Context::new()))
            .unwrap();
        let body = response.json().unwrap();
        assert_eq!(body["access_token"], "mock-access-token");
        assert_eq!(body["token_type"], "BearerToken");

        let response = factory
            .render(&ResponseSpec::template(
                "access_token",
                Context::new().set("token", "t-123"),
            ))
            .unwrap();
        assert_eq!(response.json().unwrap()["access_token"], "t-123");
    }

    #[test]
    fn test_register_programmatic_template() {
        let mut factory = ResponseFactory::new(TemplateLibrary::default());
        factory.library_mut().register(
            "quota_exceeded",
            literal_template(429, serde_json::json!({"code": "quota.Exceeded"})),
        );

        let response = factory
            .render(&ResponseSpec::template("quota_exceeded", Context::new()))
            .unwrap();
        assert_eq!(response.status(), 429);
        assert_eq!(response.header("content-type"), Some("application/json"));
        assert_eq!(response.json().unwrap()["code"], "quota.Exceeded");
    }
}
