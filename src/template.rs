//! Template engine for dynamic responses.
//!
//! Uses Handlebars for template rendering with an explicit render context.
//! Every helper is deterministic: rendering the same template against the
//! same context always produces byte-identical output.

use crate::error::MockError;
use handlebars::Handlebars;
use serde::{Deserialize, Serialize};

/// Key-value input to a template render.
///
/// Keys are template-specific; the reserved `status_code` key overrides the
/// template's default status. Unknown keys are ignored by the template.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Context(serde_json::Map<String, serde_json::Value>);

impl Context {
    /// An empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    ///
    /// # Panics
    ///
    /// Panics if the value cannot be represented as JSON; an unserializable
    /// context value is a test-authoring bug.
    pub fn set(mut self, key: &str, value: impl Serialize) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert a value under a key, replacing any previous value.
    ///
    /// # Panics
    ///
    /// Panics if the value cannot be represented as JSON.
    pub fn insert(&mut self, key: &str, value: impl Serialize) {
        let value = serde_json::to_value(value)
            .expect("context values must be representable as JSON");
        self.0.insert(key.to_string(), value);
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The `status_code` override, if present as a number or numeric string.
    ///
    /// # Panics
    ///
    /// Panics if `status_code` is present but is not a number or numeric
    /// string; a malformed override is a test-authoring bug, not something
    /// to silently fall back from.
    pub fn status_override(&self) -> Option<u16> {
        let value = self.get("status_code")?;
        let status = match value {
            serde_json::Value::Number(n) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
            serde_json::Value::String(s) => s.parse().ok(),
            _ => None,
        };
        Some(status.unwrap_or_else(|| {
            panic!("status_code context key must be a status number, got {value}")
        }))
    }
}

/// Renders template strings and JSON bodies against a [`Context`].
pub struct TemplateEngine {
    handlebars: Handlebars<'static>,
}

impl TemplateEngine {
    /// Create a new template engine with the deterministic helper set.
    pub fn new() -> Self {
        let mut handlebars = Handlebars::new();

        handlebars.register_helper("json", Box::new(json_helper));
        handlebars.register_helper("default", Box::new(default_helper));
        handlebars.register_helper("upper", Box::new(upper_helper));
        handlebars.register_helper("lower", Box::new(lower_helper));

        // Don't escape HTML by default (we're not rendering HTML)
        handlebars.register_escape_fn(handlebars::no_escape);

        Self { handlebars }
    }

    /// Render a template string with the given context.
    pub fn render_str(&self, template: &str, context: &Context) -> Result<String, MockError> {
        Ok(self.handlebars.render_template(template, context)?)
    }

    /// Render a JSON value, substituting into string leaves that contain
    /// template syntax. Non-string leaves pass through unchanged.
    pub fn render_json(
        &self,
        value: &serde_json::Value,
        context: &Context,
    ) -> Result<serde_json::Value, MockError> {
        match value {
            serde_json::Value::String(s) => {
                if s.contains("{{") {
                    let rendered = self.handlebars.render_template(s, context)?;
                    Ok(serde_json::Value::String(rendered))
                } else {
                    Ok(value.clone())
                }
            }
            serde_json::Value::Array(arr) => {
                let rendered: Result<Vec<_>, _> =
                    arr.iter().map(|v| self.render_json(v, context)).collect();
                Ok(serde_json::Value::Array(rendered?))
            }
            serde_json::Value::Object(obj) => {
                let mut rendered = serde_json::Map::new();
                for (k, v) in obj {
                    rendered.insert(k.clone(), self.render_json(v, context)?);
                }
                Ok(serde_json::Value::Object(rendered))
            }
            _ => Ok(value.clone()),
        }
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

// Custom Handlebars helpers

fn json_helper(
    h: &handlebars::Helper,
    _: &Handlebars,
    _: &handlebars::Context,
    _: &mut handlebars::RenderContext,
    out: &mut dyn handlebars::Output,
) -> handlebars::HelperResult {
    let param = h.param(0).map(|v| v.value());
    match param {
        Some(value) => out.write(&serde_json::to_string(value).unwrap_or_default())?,
        None => out.write("null")?,
    }
    Ok(())
}

fn default_helper(
    h: &handlebars::Helper,
    _: &Handlebars,
    _: &handlebars::Context,
    _: &mut handlebars::RenderContext,
    out: &mut dyn handlebars::Output,
) -> handlebars::HelperResult {
    let value = h.param(0).map(|v| v.value());
    let default = h.param(1).and_then(|v| v.value().as_str()).unwrap_or("");

    match value {
        Some(v) if !v.is_null() => {
            if let Some(s) = v.as_str() {
                if !s.is_empty() {
                    out.write(s)?;
                    return Ok(());
                }
            } else {
                out.write(&v.to_string())?;
                return Ok(());
            }
        }
        _ => {}
    }

    out.write(default)?;
    Ok(())
}

fn upper_helper(
    h: &handlebars::Helper,
    _: &Handlebars,
    _: &handlebars::Context,
    _: &mut handlebars::RenderContext,
    out: &mut dyn handlebars::Output,
) -> handlebars::HelperResult {
    let value = h.param(0).and_then(|v| v.value().as_str()).unwrap_or("");
    out.write(&value.to_uppercase())?;
    Ok(())
}

fn lower_helper(
    h: &handlebars::Helper,
    _: &Handlebars,
    _: &handlebars::Context,
    _: &mut handlebars::RenderContext,
    out: &mut dyn handlebars::Output,
) -> handlebars::HelperResult {
    let value = h.param(0).and_then(|v| v.value().as_str()).unwrap_or("");
    out.write(&value.to_lowercase())?;
    Ok(())
}
