//! Test helper façade.
//!
//! Domain-shaped conveniences over the handler stack: build a context from a
//! developer/app/company value and push it as a queued response or a matched
//! rule. Everything here is a thin composition of the matcher, factory, and
//! stack; the entity types are plain field bags mirroring the management
//! API's wire shapes.

use crate::error::MockError;
use crate::matcher::RequestMatcher;
use crate::request::MockRequest;
use crate::response::{EntitySnapshot, MockResponse, ResponseSpec};
use crate::stack::HandlerStack;
use crate::template::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Developer account states on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeveloperStatus {
    Active,
    Inactive,
}

/// App approval states on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppStatus {
    Approved,
    Revoked,
    Pending,
}

/// A developer resource as the management API returns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Developer {
    pub email: String,
    pub developer_id: String,
    pub first_name: String,
    pub last_name: String,
    pub user_name: String,
    pub status: DeveloperStatus,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "chrono::serde::ts_milliseconds_option"
    )]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "chrono::serde::ts_milliseconds_option"
    )]
    pub last_modified_at: Option<DateTime<Utc>>,
}

impl Developer {
    /// An active developer with ids derived from the email's local part.
    pub fn active(email: &str, first_name: &str, last_name: &str) -> Self {
        let local = email.split('@').next().unwrap_or(email);
        Self {
            email: email.to_string(),
            developer_id: format!("{local}-id"),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            user_name: local.to_string(),
            status: DeveloperStatus::Active,
            created_at: None,
            last_modified_at: None,
        }
    }
}

/// A developer app resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeveloperApp {
    pub app_id: String,
    pub name: String,
    pub display_name: String,
    pub status: AppStatus,
    pub developer_id: String,
}

/// A company resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub name: String,
    pub display_name: String,
    pub status: DeveloperStatus,
}

/// An organization resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub name: String,
    pub display_name: String,
}

/// A developer's membership in a company, as listed by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyMember {
    pub email: String,
    pub role: String,
}

/// Arranges expected API interactions against one organization.
///
/// Owns a [`HandlerStack`]; each test creates its own helper, arranges the
/// calls it expects, and hands the stack to the client transport under test.
pub struct MockApiHelper {
    stack: HandlerStack,
    org: String,
}

impl MockApiHelper {
    /// Helper over the built-in template library for the given organization.
    pub fn new(org: &str) -> Self {
        Self::with_stack(HandlerStack::builtin(), org)
    }

    /// Helper over an existing stack (e.g. one with extra templates).
    pub fn with_stack(stack: HandlerStack, org: &str) -> Self {
        Self {
            stack,
            org: org.to_string(),
        }
    }

    pub fn org(&self) -> &str {
        &self.org
    }

    pub fn stack(&self) -> &HandlerStack {
        &self.stack
    }

    pub fn stack_mut(&mut self) -> &mut HandlerStack {
        &mut self.stack
    }

    /// Resolve a request against the arranged expectations.
    pub fn resolve(&mut self, request: &MockRequest) -> Result<MockResponse, MockError> {
        self.stack.resolve(request)
    }

    /// Register a standing rule: any GET of the organization endpoint
    /// returns the organization as the server would serialize it.
    pub fn matched_organization_response(&mut self) -> Result<(), MockError> {
        let organization = Organization {
            name: self.org.clone(),
            display_name: self.org.clone(),
        };

        let matcher = RequestMatcher::path(&format!(
            "/v1/organizations/{}$",
            regex::escape(&self.org)
        ))?
        .method("GET");

        self.stack.on(
            matcher,
            ResponseSpec::entity(EntitySnapshot::of(&organization)),
        );
        Ok(())
    }

    /// Register a standing rule: any GET of the developer's endpoint returns
    /// the developer as the server would serialize it.
    pub fn matched_developer_response(&mut self, developer: &Developer) -> Result<(), MockError> {
        let matcher = RequestMatcher::path(&format!(
            "/v1/organizations/{}/developers/{}$",
            regex::escape(&self.org),
            regex::escape(&developer.email)
        ))?
        .method("GET");

        self.stack
            .on(matcher, ResponseSpec::entity(EntitySnapshot::of(developer)));
        Ok(())
    }

    /// Queue a one-shot developer response, optionally overriding the status
    /// code and adding extra template context keys.
    pub fn queue_developer_response(
        &mut self,
        developer: &Developer,
        status: Option<u16>,
        extra: Context,
    ) {
        let mut context = extra;
        if let Some(status) = status {
            context.insert("status_code", status);
        }
        context.insert("developer", developer);
        context.insert("org_name", &self.org);

        self.stack
            .queue_response(ResponseSpec::template("get_developer", context));
    }

    /// Queue a one-shot developer app response.
    pub fn queue_developer_app_response(&mut self, app: &DeveloperApp, status: Option<u16>) {
        let mut context = Context::new().set("app", app);
        if let Some(status) = status {
            context.insert("status_code", status);
        }

        self.stack
            .queue_response(ResponseSpec::template("get_developer_app", context));
    }

    /// Queue a one-shot company response.
    pub fn queue_company_response(&mut self, company: &Company, status: Option<u16>) {
        let mut context = Context::new()
            .set("company", company)
            .set("org_name", &self.org);
        if let Some(status) = status {
            context.insert("status_code", status);
        }

        self.stack
            .queue_response(ResponseSpec::template("company", context));
    }

    /// Queue a one-shot developers-in-company listing.
    pub fn queue_developers_in_company_response(
        &mut self,
        members: &[CompanyMember],
        status: Option<u16>,
    ) {
        let mut context = Context::new().set("developers", members);
        if let Some(status) = status {
            context.insert("status_code", status);
        }

        self.stack
            .queue_response(ResponseSpec::template("developers_in_company", context));
    }

    /// Queue a one-shot 204 with no body.
    pub fn queue_no_content(&mut self) {
        self.stack
            .queue_response(ResponseSpec::template("no_content", Context::new()));
    }

    /// Queue a one-shot API error payload.
    pub fn queue_error_response(&mut self, status: u16, message: &str) {
        let context = Context::new()
            .set("status_code", status)
            .set("message", message);

        self.stack
            .queue_response(ResponseSpec::template("error", context));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn helper() -> MockApiHelper {
        MockApiHelper::new("org1")
    }

    #[test]
    fn test_developer_wire_shape() {
        let developer = Developer::active("dev1@example.com", "Dev", "One");
        let value = serde_json::to_value(&developer).unwrap();

        assert_eq!(value["email"], "dev1@example.com");
        assert_eq!(value["developerId"], "dev1-id");
        assert_eq!(value["firstName"], "Dev");
        assert_eq!(value["userName"], "dev1");
        assert_eq!(value["status"], "active");
        // Unset timestamps stay off the wire.
        assert!(value.get("createdAt").is_none());
    }

    #[test]
    fn test_developer_timestamps_as_epoch_millis() {
        let mut developer = Developer::active("dev1@example.com", "Dev", "One");
        developer.created_at = DateTime::from_timestamp_millis(1_500_000_000_000);

        let value = serde_json::to_value(&developer).unwrap();
        assert_eq!(value["createdAt"], 1_500_000_000_000u64);
    }

    #[test]
    fn test_matched_developer_response() {
        let mut helper = helper();
        let developer = Developer::active("dev1@example.com", "Dev", "One");
        helper.matched_developer_response(&developer).unwrap();

        let response = helper
            .resolve(&MockRequest::get(
                "/v1/organizations/org1/developers/dev1@example.com",
            ))
            .unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(response.json().unwrap()["email"], "dev1@example.com");

        // Wrong method does not match the rule.
        let err = helper
            .resolve(&MockRequest::delete(
                "/v1/organizations/org1/developers/dev1@example.com",
            ))
            .unwrap_err();
        assert!(matches!(err, MockError::UnhandledRequest { .. }));
    }

    #[test]
    fn test_matched_organization_response() {
        let mut helper = helper();
        helper.matched_organization_response().unwrap();

        let response = helper
            .resolve(&MockRequest::get("/v1/organizations/org1"))
            .unwrap();
        assert_eq!(response.json().unwrap()["name"], "org1");
    }

    #[test]
    fn test_queue_developer_response_with_status_override() {
        let mut helper = helper();
        let developer = Developer::active("dev1@example.com", "Dev", "One");
        helper.queue_developer_response(&developer, Some(201), Context::new());

        let response = helper
            .resolve(&MockRequest::post("/v1/organizations/org1/developers"))
            .unwrap();
        assert_eq!(response.status(), 201);

        let body = response.json().unwrap();
        assert_eq!(body["email"], "dev1@example.com");
        assert_eq!(body["organizationName"], "org1");
    }

    #[test]
    fn test_queue_developer_app_response() {
        let mut helper = helper();
        let app = DeveloperApp {
            app_id: "app-1".to_string(),
            name: "test_app".to_string(),
            display_name: "Test App".to_string(),
            status: AppStatus::Approved,
            developer_id: "dev1-id".to_string(),
        };
        helper.queue_developer_app_response(&app, None);

        let response = helper
            .resolve(&MockRequest::get(
                "/v1/organizations/org1/developers/dev1@example.com/apps/test_app",
            ))
            .unwrap();
        let body = response.json().unwrap();
        assert_eq!(body["appId"], "app-1");
        assert_eq!(body["status"], "approved");
    }

    #[test]
    fn test_queue_developers_in_company_response() {
        let mut helper = helper();
        helper.queue_developers_in_company_response(
            &[
                CompanyMember {
                    email: "a@example.com".to_string(),
                    role: "admin".to_string(),
                },
                CompanyMember {
                    email: "b@example.com".to_string(),
                    role: "member".to_string(),
                },
            ],
            None,
        );

        let response = helper
            .resolve(&MockRequest::get("/v1/organizations/org1/companies/c1/developers"))
            .unwrap();
        let body = response.json().unwrap();
        assert_eq!(body["developer"][0]["email"], "a@example.com");
        assert_eq!(body["developer"][1]["role"], "member");
    }

    #[test]
    fn test_queue_error_response() {
        let mut helper = helper();
        helper.queue_error_response(500, "boom");

        let response = helper.resolve(&MockRequest::get("/anything")).unwrap();
        assert_eq!(response.status(), 500);
        assert_eq!(response.json().unwrap()["message"], "boom");
    }

    #[test]
    fn test_queue_no_content() {
        let mut helper = helper();
        helper.queue_no_content();

        let response = helper
            .resolve(&MockRequest::delete("/v1/organizations/org1/developers/x"))
            .unwrap();
        assert_eq!(response.status(), 204);
        assert!(response.body().is_empty());
    }
}
