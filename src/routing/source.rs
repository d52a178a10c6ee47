//! Endpoint sources.
//!
//! # Responsibilities
//! - Provide endpoints to the matcher builder (read at build time only)
//! - Merge any number of configured sources into one logical source
//!
//! # Design Decisions
//! - Pure aggregation: no filtering, no deduplication
//! - Source order is preserved; it only matters for tie-breaks inside the matcher
//! - The provider set is fixed once the composite is constructed

use std::fmt;
use std::sync::Arc;

use crate::config::SourceConfig;
use crate::routing::endpoint::Endpoint;

/// A provider of endpoint descriptors.
pub trait EndpointSource: Send + Sync + fmt::Debug {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Snapshot of the endpoints this source currently publishes.
    fn endpoints(&self) -> Vec<Arc<Endpoint>>;
}

/// A fixed list of endpoints, usually loaded from configuration.
#[derive(Debug, Clone)]
pub struct StaticEndpointSource {
    name: String,
    endpoints: Vec<Arc<Endpoint>>,
}

impl StaticEndpointSource {
    pub fn new(name: impl Into<String>, endpoints: impl IntoIterator<Item = Endpoint>) -> Self {
        Self {
            name: name.into(),
            endpoints: endpoints.into_iter().map(Arc::new).collect(),
        }
    }

    /// A source with no endpoints.
    pub fn empty(name: impl Into<String>) -> Self {
        Self::new(name, Vec::new())
    }
}

impl From<&SourceConfig> for StaticEndpointSource {
    fn from(config: &SourceConfig) -> Self {
        Self::new(
            config.name.clone(),
            config.endpoints.iter().map(Endpoint::from),
        )
    }
}

impl EndpointSource for StaticEndpointSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn endpoints(&self) -> Vec<Arc<Endpoint>> {
        self.endpoints.clone()
    }
}

/// Presents several sources as one.
#[derive(Debug, Clone, Default)]
pub struct CompositeSource {
    sources: Vec<Arc<dyn EndpointSource>>,
}

impl CompositeSource {
    pub fn new(sources: Vec<Arc<dyn EndpointSource>>) -> Self {
        Self { sources }
    }

    /// The underlying sources, in configured order.
    pub fn sources(&self) -> &[Arc<dyn EndpointSource>] {
        &self.sources
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl EndpointSource for CompositeSource {
    fn name(&self) -> &str {
        "composite"
    }

    fn endpoints(&self) -> Vec<Arc<Endpoint>> {
        self.sources
            .iter()
            .flat_map(|source| source.endpoints())
            .collect()
    }
}
