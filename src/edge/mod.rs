//! Edge request handling
//!
//! Each inbound request runs through a fixed sequence:
//!
//! ```text
//! strip route prefix -> verify signature -> validate origin path
//!     -> build provider options -> negotiate format
//! ```
//!
//! The result is an [`OriginRequest`] describing the single fetch the proxy
//! issues. Nothing here touches the network, so every step is testable
//! without a server.

pub mod options;
pub mod origin;
pub mod response;

use regex::Regex;
use std::sync::OnceLock;

use crate::config::EdgeConfig;
use crate::error::TransformError;
use crate::signing::UrlVerifier;
use crate::transform::ParamMap;

pub use options::{build_options, parse_query, EDGE_PARAMS};
pub use origin::Origin;
pub use response::Decoration;

/// Origin image URLs must end in one of these extensions
static ALLOWED_EXTENSION: OnceLock<Regex> = OnceLock::new();

fn allowed_extension() -> &'static Regex {
    ALLOWED_EXTENSION.get_or_init(|| {
        // Compile-time constant pattern, covered by tests
        Regex::new(r"(?i)\.(jpe?g|png|gif|webp|avif)$").expect("Invalid extension regex")
    })
}

/// The single outbound fetch for a verified request
#[derive(Debug, Clone, PartialEq)]
pub struct OriginRequest {
    /// Absolute origin URL, for logging
    pub url: String,
    /// Path sent upstream
    pub path: String,
    /// Provider-native transform options
    pub options: ParamMap,
}

impl OriginRequest {
    /// Options serialised for the options header
    pub fn options_json(&self) -> Result<String, TransformError> {
        Ok(serde_json::to_string(&self.options)?)
    }
}

/// Stateless per-request handler built once from configuration
#[derive(Debug, Clone)]
pub struct EdgeRequestHandler {
    origin: Origin,
    route: String,
    verifier: UrlVerifier,
    strict_signatures: bool,
}

impl EdgeRequestHandler {
    pub fn new(config: &EdgeConfig) -> Result<Self, String> {
        let origin = Origin::parse(&config.origin)?;

        let verifier = if config.verify_requests {
            let secret = config.signing_secret().ok_or_else(|| {
                "edge.signing_secret is required when edge.verify_requests is enabled".to_string()
            })?;
            UrlVerifier::new(secret, config.verify_param.as_str())
        } else {
            tracing::warn!("Request signature verification is disabled");
            UrlVerifier::disabled()
        };

        Ok(Self {
            origin,
            route: config.route.clone(),
            verifier,
            strict_signatures: config.strict_signatures,
        })
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    /// Remove the configured route prefix from the start of `path`
    pub fn strip_route_prefix<'a>(&self, path: &'a str) -> &'a str {
        if self.route.is_empty() {
            return path;
        }
        path.strip_prefix(self.route.as_str()).unwrap_or(path)
    }

    /// Run the request through every stage up to the origin fetch
    pub fn prepare(
        &self,
        path: &str,
        query: Option<&str>,
        accept: Option<&str>,
    ) -> Result<OriginRequest, TransformError> {
        let path = self.strip_route_prefix(path);
        let remaining_query = self.verifier.verify_request(path, query.unwrap_or(""))?;
        let origin_path = self.validate_origin_path(path)?;
        let options = build_options(&parse_query(&remaining_query), accept)?;

        Ok(OriginRequest {
            url: self.origin.url_for(&origin_path),
            path: self.origin.path_for(&origin_path),
            options,
        })
    }

    /// Require a non-empty path with an allowed image extension
    fn validate_origin_path(&self, path: &str) -> Result<String, TransformError> {
        let trimmed = path.trim_matches('/');
        if trimmed.is_empty() {
            return Err(TransformError::MissingPath);
        }
        if !allowed_extension().is_match(trimmed) {
            return Err(TransformError::DisallowedExtension);
        }
        Ok(trimmed.to_string())
    }

    /// HTTP status for a failed request
    pub fn status_for(&self, error: &TransformError) -> u16 {
        error.to_http_status(self.strict_signatures)
    }
}
