//! Default matcher: an ordered table of compiled endpoint conditions.
//!
//! # Responsibilities
//! - Match host header (exact match, case-insensitive)
//! - Match path prefix (case-sensitive)
//! - Match method set (empty = any)
//! - Combine conditions with AND semantics
//!
//! # Design Decisions
//! - Compiled once from the composite source, immutable afterwards
//! - Ordered by priority (higher first); ties keep source order
//! - First match wins
//! - No regex, O(n) scan over entries

use std::sync::Arc;
use std::time::Instant;

use futures_util::future::{self, BoxFuture, FutureExt};
use http::request::Parts;
use http::{header, Method};

use crate::dispatch::error::{BuildError, MatchError};
use crate::dispatch::feature::EndpointFeature;
use crate::routing::endpoint::Endpoint;
use crate::routing::matcher::{Matcher, MatcherBuilder};
use crate::routing::source::{CompositeSource, EndpointSource};

/// A single match condition evaluated against the request head.
pub trait Condition: Send + Sync + std::fmt::Debug {
    /// Returns true if the request satisfies this condition.
    fn matches(&self, request: &Parts) -> bool;
}

/// Matches the Host header.
///
/// The comparison covers the whole authority: `example.com` and
/// `example.com:8080` are different hosts.
#[derive(Debug, Clone)]
pub struct HostCondition {
    expected_host: String,
}

impl HostCondition {
    /// The host is normalized to lowercase for case-insensitive matching.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            expected_host: host.into().to_lowercase(),
        }
    }
}

impl Condition for HostCondition {
    fn matches(&self, request: &Parts) -> bool {
        let from_header = request
            .headers
            .get(header::HOST)
            .and_then(|h| h.to_str().ok());
        // HTTP/2 requests carry the authority in the URI instead.
        let host = from_header.or_else(|| request.uri.authority().map(|a| a.as_str()));

        host.map(|h| h.eq_ignore_ascii_case(&self.expected_host))
            .unwrap_or(false)
    }
}

/// Matches the request path prefix.
#[derive(Debug, Clone)]
pub struct PathPrefixCondition {
    prefix: String,
}

impl PathPrefixCondition {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Condition for PathPrefixCondition {
    fn matches(&self, request: &Parts) -> bool {
        request.uri.path().starts_with(&self.prefix)
    }
}

/// Matches one of a set of methods.
#[derive(Debug, Clone)]
pub struct MethodCondition {
    methods: Vec<Method>,
}

impl MethodCondition {
    pub fn new(methods: Vec<Method>) -> Self {
        Self { methods }
    }
}

impl Condition for MethodCondition {
    fn matches(&self, request: &Parts) -> bool {
        self.methods.contains(&request.method)
    }
}

/// Combines conditions with AND semantics. No conditions means always match.
#[derive(Debug, Default)]
pub struct AllOf {
    conditions: Vec<Box<dyn Condition>>,
}

impl AllOf {
    pub fn new(conditions: Vec<Box<dyn Condition>>) -> Self {
        Self { conditions }
    }

    /// Compile the routing hints of an endpoint.
    pub fn for_endpoint(endpoint: &Endpoint) -> Self {
        let mut conditions: Vec<Box<dyn Condition>> = Vec::new();
        if let Some(host) = endpoint.host() {
            conditions.push(Box::new(HostCondition::new(host)));
        }
        if let Some(prefix) = endpoint.path_prefix() {
            conditions.push(Box::new(PathPrefixCondition::new(prefix)));
        }
        if !endpoint.methods().is_empty() {
            conditions.push(Box::new(MethodCondition::new(endpoint.methods().to_vec())));
        }
        Self::new(conditions)
    }
}

impl Condition for AllOf {
    fn matches(&self, request: &Parts) -> bool {
        self.conditions.iter().all(|c| c.matches(request))
    }
}

#[derive(Debug)]
struct Entry {
    endpoint: Arc<Endpoint>,
    condition: AllOf,
}

/// Immutable, ordered route table.
#[derive(Debug, Default)]
pub struct RouteTable {
    entries: Vec<Entry>,
}

impl RouteTable {
    /// Number of compiled endpoints.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First endpoint whose conditions all hold.
    pub fn lookup(&self, request: &Parts) -> Option<&Arc<Endpoint>> {
        self.entries
            .iter()
            .find(|entry| entry.condition.matches(request))
            .map(|entry| &entry.endpoint)
    }
}

impl Matcher for RouteTable {
    fn match_request<'a>(
        &'a self,
        request: &'a Parts,
        feature: &'a EndpointFeature,
    ) -> BoxFuture<'a, Result<(), MatchError>> {
        let result = match self.lookup(request) {
            Some(endpoint) => feature.set_endpoint(endpoint.clone()),
            None => feature.set_no_match(),
        };
        future::ready(result).boxed()
    }
}

/// Builds a `RouteTable` from every endpoint in the composite source.
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteTableBuilder;

impl RouteTableBuilder {
    fn validate(endpoint: &Endpoint) -> Result<(), BuildError> {
        if endpoint.display_name().trim().is_empty() {
            return Err(BuildError::InvalidEndpoint {
                name: endpoint.display_name().to_string(),
                reason: "display name is empty".to_string(),
            });
        }
        if let Some(prefix) = endpoint.path_prefix() {
            if !prefix.starts_with('/') {
                return Err(BuildError::InvalidEndpoint {
                    name: endpoint.display_name().to_string(),
                    reason: format!("path prefix '{}' must start with '/'", prefix),
                });
            }
        }
        Ok(())
    }

    /// Compile the table without erasing its type.
    pub fn compile(&self, source: &CompositeSource) -> Result<RouteTable, BuildError> {
        let start = Instant::now();
        let mut endpoints = source.endpoints();
        for endpoint in &endpoints {
            Self::validate(endpoint)?;
        }

        // Stable: equal priorities keep source order.
        endpoints.sort_by(|a, b| b.priority().cmp(&a.priority()));

        let entries: Vec<Entry> = endpoints
            .into_iter()
            .map(|endpoint| Entry {
                condition: AllOf::for_endpoint(&endpoint),
                endpoint,
            })
            .collect();

        tracing::debug!(
            sources = source.sources().len(),
            endpoints = entries.len(),
            elapsed_us = start.elapsed().as_micros() as u64,
            "Route table compiled"
        );

        Ok(RouteTable { entries })
    }
}

impl MatcherBuilder for RouteTableBuilder {
    fn build(&self, source: &CompositeSource) -> Result<Arc<dyn Matcher>, BuildError> {
        Ok(Arc::new(self.compile(source)?))
    }
}
