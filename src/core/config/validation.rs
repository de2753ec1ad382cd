#![allow(clippy::result_large_err)]

use super::{parse_timeout, DocsConfig};
use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use crate::server::is_valid_docs_route;
use std::net::SocketAddr;
use url::Url;

pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate configuration rules
    pub fn validate(config: &DocsConfig) -> Result<(), AppError> {
        if config.paths.collection.as_os_str().is_empty() {
            return Err(invalid("paths.collection cannot be empty"));
        }

        if config.paths.output.as_os_str().is_empty() {
            return Err(invalid("paths.output cannot be empty"));
        }

        if config.conversion.default_tag.trim().is_empty() {
            return Err(invalid("conversion.default_tag cannot be empty"));
        }

        for server in &config.conversion.servers {
            // OpenAPI allows server URLs relative to the document location
            if server.url.starts_with('/') {
                continue;
            }
            Url::parse(&server.url).map_err(|err| {
                invalid(format!(
                    "conversion.servers url '{}' is invalid: {}",
                    server.url, err
                ))
            })?;
        }

        if config.fallback.enabled && config.fallback.command.trim().is_empty() {
            return Err(invalid(
                "fallback.command is required when fallback.enabled is true",
            ));
        }

        parse_timeout(&config.fallback.timeout).map_err(|err| {
            invalid(format!(
                "fallback.timeout '{}' is not a duration: {}",
                config.fallback.timeout, err
            ))
        })?;

        config.server.bind.parse::<SocketAddr>().map_err(|err| {
            invalid(format!(
                "server.bind '{}' is not a socket address: {}",
                config.server.bind, err
            ))
        })?;

        let route = &config.server.docs_route;
        if !is_valid_docs_route(route) {
            return Err(invalid(format!(
                "server.docs_route '{}' must start with '/', not end with '/', and not be the root",
                route
            )));
        }

        Ok(())
    }
}

fn invalid<T: Into<String>>(message: T) -> AppError {
    AppError::new(ErrorCategory::ConfigError, message).with_code("CFG-003")
}
