//! Edge Mock Client
//!
//! A mock HTTP response stack for testing clients of an Edge-style
//! management REST API without network access. Test code arranges expected
//! interactions; the stack intercepts each outbound request and answers it
//! from a FIFO queue of one-shot responses or a list of persistent
//! matcher rules.
//!
//! # Features
//!
//! - **Request Matching**: match by path (exact, prefix, regex, glob),
//!   method, headers, query params, body
//! - **FIFO Expectations**: "the next call returns X", served in order
//!   regardless of rules
//! - **Standing Rules**: "any GET to this endpoint returns Y", first
//!   registered wins
//! - **Template Responses**: named Handlebars templates rendered from an
//!   explicit context, with required-key validation
//! - **Entity Snapshots**: serialize a domain entity exactly as the server
//!   would return it
//! - **Hard Failures**: an unarranged request is an error carrying its
//!   method and path, never a silent default
//!
//! # Example
//!
//! ```
//! use edge_mock_client::{HandlerStack, MockRequest, ResponseSpec, Context};
//!
//! let mut stack = HandlerStack::builtin();
//! stack.queue_response(ResponseSpec::template(
//!     "get_developer",
//!     Context::new()
//!         .set("developer", serde_json::json!({"email": "dev1@example.com"}))
//!         .set("org_name", "org1"),
//! ));
//!
//! let request = MockRequest::get("/v1/organizations/org1/developers/dev1@example.com");
//! let response = stack.resolve(&request).unwrap();
//! assert_eq!(response.status(), 200);
//! assert!(response.body_str().contains(r#""email":"dev1@example.com""#));
//! ```

pub mod config;
pub mod error;
pub mod helpers;
pub mod matcher;
pub mod request;
pub mod response;
pub mod stack;
pub mod template;

pub use config::{TemplateBody, TemplateDefinition, TemplateLibrary};
pub use error::MockError;
pub use helpers::MockApiHelper;
pub use matcher::{BodyMatcher, HeaderMatcher, PathPattern, QueryMatcher, RequestMatcher};
pub use request::MockRequest;
pub use response::{EntitySnapshot, MockResponse, ResponseFactory, ResponseSpec};
pub use stack::{HandlerStack, Rule, Transport};
pub use template::{Context, TemplateEngine};
