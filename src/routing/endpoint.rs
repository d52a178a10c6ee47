//! Endpoint descriptors.
//!
//! An endpoint is an opaque handler target identified by its display name.
//! The routing hints (host, path prefix, methods, priority) are only read by
//! the route table; the dispatch stage never looks past the display name.

use std::fmt;

use http::Method;

use crate::config::EndpointConfig;

/// A named, immutable handler target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    display_name: String,
    host: Option<String>,
    path_prefix: Option<String>,
    methods: Vec<Method>,
    priority: u32,
}

impl Endpoint {
    /// Create an endpoint that matches every request.
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            host: None,
            path_prefix: None,
            methods: Vec::new(),
            priority: 0,
        }
    }

    /// Restrict to a Host header value.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Restrict to a path prefix.
    pub fn with_path_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.path_prefix = Some(prefix.into());
        self
    }

    /// Restrict to the given methods. Empty means any method.
    pub fn with_methods(mut self, methods: impl IntoIterator<Item = Method>) -> Self {
        self.methods = methods.into_iter().collect();
        self
    }

    /// Higher priority entries are checked first.
    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    pub fn path_prefix(&self) -> Option<&str> {
        self.path_prefix.as_deref()
    }

    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    pub fn priority(&self) -> u32 {
        self.priority
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name)
    }
}

impl From<&EndpointConfig> for Endpoint {
    /// Method tokens are checked by config validation; any that still fail
    /// to parse are skipped here.
    fn from(config: &EndpointConfig) -> Self {
        let mut endpoint = Endpoint::new(config.name.clone())
            .with_priority(config.priority)
            .with_methods(
                config
                    .methods
                    .iter()
                    .filter_map(|m| Method::from_bytes(m.as_bytes()).ok()),
            );
        if let Some(host) = &config.host {
            endpoint = endpoint.with_host(host.clone());
        }
        if let Some(prefix) = &config.path_prefix {
            endpoint = endpoint.with_path_prefix(prefix.clone());
        }
        endpoint
    }
}
