//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges and formats (timeouts > 0, addresses parse)
//! - Reject endpoint definitions the route table cannot compile
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: DispatchConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use http::Method;
use thiserror::Error;

use crate::config::schema::DispatchConfig;

/// A single semantic problem in the configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid bind address '{0}'")]
    InvalidBindAddress(String),

    #[error("invalid metrics address '{0}'")]
    InvalidMetricsAddress(String),

    #[error("request timeout must be greater than zero")]
    ZeroRequestTimeout,

    #[error("source #{0} has an empty name")]
    EmptySourceName(usize),

    #[error("duplicate source name '{0}'")]
    DuplicateSource(String),

    #[error("source '{source_name}' has an endpoint with an empty name")]
    EmptyEndpointName { source_name: String },

    #[error("endpoint '{endpoint}' path prefix '{prefix}' must start with '/'")]
    RelativePathPrefix { endpoint: String, prefix: String },

    #[error("endpoint '{endpoint}' has invalid method '{method}'")]
    InvalidMethod { endpoint: String, method: String },
}

/// Check a parsed configuration.
pub fn validate_config(config: &DispatchConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }

    let mut seen = HashSet::new();
    for (index, source) in config.sources.iter().enumerate() {
        if source.name.trim().is_empty() {
            errors.push(ValidationError::EmptySourceName(index));
        } else if !seen.insert(source.name.as_str()) {
            errors.push(ValidationError::DuplicateSource(source.name.clone()));
        }

        for endpoint in &source.endpoints {
            if endpoint.name.trim().is_empty() {
                errors.push(ValidationError::EmptyEndpointName {
                    source_name: source.name.clone(),
                });
            }
            if let Some(prefix) = &endpoint.path_prefix {
                if !prefix.starts_with('/') {
                    errors.push(ValidationError::RelativePathPrefix {
                        endpoint: endpoint.name.clone(),
                        prefix: prefix.clone(),
                    });
                }
            }
            for method in &endpoint.methods {
                if Method::from_bytes(method.as_bytes()).is_err() {
                    errors.push(ValidationError::InvalidMethod {
                        endpoint: endpoint.name.clone(),
                        method: method.clone(),
                    });
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{EndpointConfig, SourceConfig};

    fn endpoint(name: &str, prefix: Option<&str>, methods: &[&str]) -> EndpointConfig {
        EndpointConfig {
            name: name.to_string(),
            host: None,
            path_prefix: prefix.map(str::to_string),
            methods: methods.iter().map(|m| m.to_string()).collect(),
            priority: 0,
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&DispatchConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = DispatchConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.timeouts.request_secs = 0;
        config.sources = vec![
            SourceConfig {
                name: "web".into(),
                endpoints: vec![
                    endpoint("", Some("/"), &[]),
                    endpoint("Api", Some("api"), &["GET", "BAD METHOD"]),
                ],
            },
            SourceConfig {
                name: "web".into(),
                endpoints: Vec::new(),
            },
            SourceConfig {
                name: " ".into(),
                endpoints: Vec::new(),
            },
        ];

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::InvalidBindAddress("not-an-address".into()),
                ValidationError::ZeroRequestTimeout,
                ValidationError::EmptyEndpointName {
                    source_name: "web".into()
                },
                ValidationError::RelativePathPrefix {
                    endpoint: "Api".into(),
                    prefix: "api".into()
                },
                ValidationError::InvalidMethod {
                    endpoint: "Api".into(),
                    method: "BAD METHOD".into()
                },
                ValidationError::DuplicateSource("web".into()),
                ValidationError::EmptySourceName(2),
            ]
        );
    }

    #[test]
    fn test_metrics_address_checked_only_when_enabled() {
        let mut config = DispatchConfig::default();
        config.observability.metrics_address = "nope".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        assert_eq!(
            validate_config(&config).unwrap_err(),
            vec![ValidationError::InvalidMetricsAddress("nope".into())]
        );
    }
}
