//! Template library configuration.
//!
//! Defines the named response templates the factory renders from, and the
//! YAML fixture format they are authored in.

use crate::error::MockError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// A name -> template mapping, supplied to the [`ResponseFactory`].
///
/// The library owns the authoring format (YAML fixtures); the stack only ever
/// looks templates up by name.
///
/// [`ResponseFactory`]: crate::response::ResponseFactory
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct TemplateLibrary {
    /// Named template definitions
    #[serde(default)]
    pub templates: HashMap<String, TemplateDefinition>,
}

impl TemplateLibrary {
    /// Load a template library from a YAML file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse a template library from a YAML string.
    pub fn from_yaml(yaml: &str) -> anyhow::Result<Self> {
        let library: Self = serde_yaml::from_str(yaml)?;
        library.validate()?;
        Ok(library)
    }

    /// The built-in library covering the management API's canned responses
    /// (developers, apps, companies, organizations, tokens).
    pub fn builtin() -> Self {
        serde_yaml::from_str(include_str!("../fixtures/templates.yaml"))
            .expect("built-in template fixtures are valid YAML")
    }

    /// Validate every template definition.
    pub fn validate(&self) -> anyhow::Result<()> {
        for (name, template) in &self.templates {
            template
                .validate()
                .map_err(|e| anyhow::anyhow!("Template '{}': {}", name, e))?;
        }
        Ok(())
    }

    /// Look up a template by name.
    pub fn get(&self, name: &str) -> Option<&TemplateDefinition> {
        self.templates.get(name)
    }

    /// Register (or replace) a template under a name.
    pub fn register(&mut self, name: &str, template: TemplateDefinition) {
        self.templates.insert(name.to_string(), template);
    }

    /// Number of templates in the library.
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Whether the library is empty.
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Template names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.templates.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// A single named template: default status, headers, required context keys,
/// and a body recipe.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TemplateDefinition {
    /// HTTP status code returned unless the context overrides it
    #[serde(default = "default_status")]
    pub status: u16,

    /// Response headers; values may themselves contain template expressions
    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// Context keys this template requires; rendering fails if one is missing
    #[serde(default)]
    pub requires: Vec<String>,

    /// Response body
    #[serde(default)]
    pub body: Option<TemplateBody>,
}

fn default_status() -> u16 {
    200
}

impl TemplateDefinition {
    /// Validate the template definition.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.status < 100 || self.status > 599 {
            anyhow::bail!("Invalid status code: {}", self.status);
        }
        if self.requires.iter().any(|k| k.is_empty()) {
            anyhow::bail!("Required context keys cannot be empty");
        }
        Ok(())
    }
}

/// Template body recipe.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TemplateBody {
    /// Plain text body, rendered as a single template string
    Text { content: String },
    /// JSON body; string leaves containing template expressions are rendered
    Json { content: serde_json::Value },
    /// Base64 encoded binary, returned verbatim
    Base64 { content: String },
    /// Load from file, returned verbatim
    File { path: String },
}

impl TemplateBody {
    /// Get the body content as bytes without any template rendering.
    pub fn to_bytes(&self) -> Result<Vec<u8>, MockError> {
        match self {
            TemplateBody::Text { content } => Ok(content.as_bytes().to_vec()),
            TemplateBody::Json { content } => serde_json::to_vec(content)
                .map_err(|e| MockError::Body(format!("unserializable JSON body: {e}"))),
            TemplateBody::Base64 { content } => {
                use base64::Engine;
                base64::engine::general_purpose::STANDARD
                    .decode(content)
                    .map_err(|e| MockError::Body(format!("invalid base64: {e}")))
            }
            TemplateBody::File { path } => std::fs::read(path)
                .map_err(|e| MockError::Body(format!("failed to read file {path}: {e}"))),
        }
    }

    /// Default content type for this body kind.
    pub fn content_type(&self) -> &'static str {
        match self {
            TemplateBody::Text { .. } => "text/plain",
            TemplateBody::Json { .. } => "application/json",
            TemplateBody::Base64 { .. } => "application/octet-stream",
            TemplateBody::File { .. } => "application/octet-stream",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_template() {
        let yaml = r#"
templates:
  hello:
    status: 200
    body:
      type: text
      content: "Hello, World!"
"#;
        let library = TemplateLibrary::from_yaml(yaml).unwrap();
        assert_eq!(library.len(), 1);
        assert_eq!(library.get("hello").unwrap().status, 200);
    }

    #[test]
    fn test_parse_json_template_with_requires() {
        let yaml = r#"
templates:
  get_developer:
    status: 200
    requires: [developer]
    headers:
      content-type: application/json
    body:
      type: json
      content:
        email: "{{developer.email}}"
"#;
        let library = TemplateLibrary::from_yaml(yaml).unwrap();
        let template = library.get("get_developer").unwrap();
        assert_eq!(template.requires, vec!["developer"]);

        if let Some(TemplateBody::Json { content }) = &template.body {
            assert_eq!(content["email"], "{{developer.email}}");
        } else {
            panic!("Expected JSON body");
        }
    }

    #[test]
    fn test_invalid_status_rejected() {
        let yaml = r#"
templates:
  bad:
    status: 777
"#;
        assert!(TemplateLibrary::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_builtin_library_parses() {
        let library = TemplateLibrary::builtin();
        assert!(library.get("get_developer").is_some());
        assert!(library.get("get_developer_app").is_some());
        assert!(library.get("company").is_some());
        assert!(library.get("no_content").is_some());
        library.validate().unwrap();
    }

    #[test]
    fn test_from_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
templates:
  pong:
    status: 200
    body:
      type: text
      content: pong
"#
        )
        .unwrap();

        let library = TemplateLibrary::from_file(file.path()).unwrap();
        assert_eq!(library.names(), vec!["pong"]);
    }

    #[test]
    fn test_body_to_bytes() {
        let text = TemplateBody::Text {
            content: "hello".to_string(),
        };
        assert_eq!(text.to_bytes().unwrap(), b"hello");

        let json = TemplateBody::Json {
            content: serde_json::json!({"key": "value"}),
        };
        let bytes = json.to_bytes().unwrap();
        assert!(String::from_utf8(bytes).unwrap().contains("key"));

        let bad = TemplateBody::Base64 {
            content: "!!!".to_string(),
        };
        assert!(bad.to_bytes().is_err());
    }
}
