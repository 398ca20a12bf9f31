//! The handler stack: ordered queue of pending responses plus persistent
//! matcher rules, with one dispatch path.
//!
//! Queued responses always win: they encode an explicit, ordered expectation
//! the test author asserted, so the Nth queued response answers the Nth
//! request even when a rule would also match. Only once the queue is empty
//! are rules consulted, in registration order. An unserved request is a hard
//! failure, never a silent default.

use crate::error::MockError;
use crate::matcher::RequestMatcher;
use crate::request::MockRequest;
use crate::response::{MockResponse, ResponseFactory, ResponseSpec};
use std::collections::VecDeque;
use tracing::{debug, warn};

/// A persistent (matcher, response) pair. Matches any number of requests
/// until explicitly cleared or the stack is reset.
pub struct Rule {
    matcher: RequestMatcher,
    response: ResponseSpec,
}

impl Rule {
    pub fn new(matcher: RequestMatcher, response: ResponseSpec) -> Self {
        Self { matcher, response }
    }
}

/// The transport hook: install an implementation as the sole handler of an
/// HTTP client's underlying transport to make its traffic deterministic.
pub trait Transport {
    /// Handle one fully-formed outbound request, returning a fully-formed
    /// response or failing.
    fn handle(&mut self, request: &MockRequest) -> Result<MockResponse, MockError>;
}

/// Request-matching, response-queuing simulator.
///
/// Scoped to a single test case: create one per test, never share one across
/// threads. Parallel test workers must each own their own stack.
pub struct HandlerStack {
    factory: ResponseFactory,
    queue: VecDeque<ResponseSpec>,
    rules: Vec<Rule>,
    served_queued: u64,
    served_matched: u64,
    unhandled: u64,
}

impl HandlerStack {
    /// Create a stack over a response factory.
    pub fn new(factory: ResponseFactory) -> Self {
        Self {
            factory,
            queue: VecDeque::new(),
            rules: Vec::new(),
            served_queued: 0,
            served_matched: 0,
            unhandled: 0,
        }
    }

    /// Stack over the built-in management API templates.
    pub fn builtin() -> Self {
        Self::new(ResponseFactory::builtin())
    }

    pub fn factory(&self) -> &ResponseFactory {
        &self.factory
    }

    pub fn factory_mut(&mut self) -> &mut ResponseFactory {
        &mut self.factory
    }

    /// Append a one-shot response to the FIFO queue. It answers the next
    /// resolved request, regardless of any rules also registered.
    pub fn queue_response(&mut self, spec: ResponseSpec) {
        self.queue.push_back(spec);
        debug!(pending = self.queue.len(), "Queued mock response");
    }

    /// Register a persistent rule. Registration order is the tie-break when
    /// several rules match: first registered wins.
    pub fn on(&mut self, matcher: RequestMatcher, response: ResponseSpec) {
        self.rules.push(Rule::new(matcher, response));
        debug!(rules = self.rules.len(), "Registered mock rule");
    }

    /// Resolve one request: queue head first, then rules in order, else fail.
    pub fn resolve(&mut self, request: &MockRequest) -> Result<MockResponse, MockError> {
        if let Some(spec) = self.queue.pop_front() {
            self.served_queued += 1;
            debug!(
                method = request.method(),
                path = request.path(),
                remaining = self.queue.len(),
                "Serving queued response"
            );
            return self.factory.render(&spec);
        }

        for (idx, rule) in self.rules.iter().enumerate() {
            if rule.matcher.matches(request) {
                self.served_matched += 1;
                debug!(
                    method = request.method(),
                    path = request.path(),
                    rule = idx,
                    "Request matched rule"
                );
                return self.factory.render(&rule.response);
            }
        }

        self.unhandled += 1;
        warn!(
            method = request.method(),
            path = request.path(),
            "No queued response or matching rule"
        );
        Err(MockError::unhandled(request.method(), request.path()))
    }

    /// Clear both the queue and the rule list. Call between test cases to
    /// avoid cross-test leakage.
    pub fn reset(&mut self) {
        self.queue.clear();
        self.rules.clear();
        debug!("Handler stack reset");
    }

    /// Drop all registered rules, keeping the queue.
    pub fn clear_rules(&mut self) {
        self.rules.clear();
    }

    /// Drop all queued responses, keeping the rules.
    pub fn clear_queue(&mut self) {
        self.queue.clear();
    }

    /// Number of queued responses not yet consumed.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Number of registered rules.
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Responses served from the queue so far.
    pub fn served_queued(&self) -> u64 {
        self.served_queued
    }

    /// Responses served from rules so far.
    pub fn served_matched(&self) -> u64 {
        self.served_matched
    }

    /// Requests that found neither a queued response nor a matching rule.
    pub fn unhandled(&self) -> u64 {
        self.unhandled
    }
}

impl Transport for HandlerStack {
    fn handle(&mut self, request: &MockRequest) -> Result<MockResponse, MockError> {
        self.resolve(request)
    }
}
