//! Edge handler configuration.
//!
//! Where origin images live, which route prefix the edge is mounted on and
//! how inbound signatures are checked.

use serde::{Deserialize, Serialize};

use crate::signing::DEFAULT_VERIFY_PARAM;

pub const DEFAULT_OPTIONS_HEADER: &str = "x-image-options";

fn default_verify_requests() -> bool {
    true
}

fn default_verify_param() -> String {
    DEFAULT_VERIFY_PARAM.to_string()
}

fn default_options_header() -> String {
    DEFAULT_OPTIONS_HEADER.to_string()
}

#[derive(Clone, Serialize, Deserialize)]
pub struct EdgeConfig {
    /// Origin image store, e.g. `https://images.example.com`
    pub origin: String,

    /// Prefix removed from inbound paths (may be empty)
    #[serde(default)]
    pub route: String,

    /// Disable only for local development
    #[serde(default = "default_verify_requests")]
    pub verify_requests: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signing_secret: Option<String>,

    #[serde(default = "default_verify_param")]
    pub verify_param: String,

    /// Answer signature failures with 403 instead of 400
    #[serde(default)]
    pub strict_signatures: bool,

    /// Request header carrying the provider options to the origin
    #[serde(default = "default_options_header")]
    pub options_header: String,
}

impl EdgeConfig {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            route: String::new(),
            verify_requests: default_verify_requests(),
            signing_secret: None,
            verify_param: default_verify_param(),
            strict_signatures: false,
            options_header: default_options_header(),
        }
    }

    /// Signing secret, if one is configured and non-empty
    pub fn signing_secret(&self) -> Option<&str> {
        self.signing_secret
            .as_deref()
            .filter(|secret| !secret.is_empty())
    }
}

impl std::fmt::Debug for EdgeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EdgeConfig")
            .field("origin", &self.origin)
            .field("route", &self.route)
            .field("verify_requests", &self.verify_requests)
            .field("signing_secret", &self.signing_secret.as_ref().map(|_| "<redacted>"))
            .field("verify_param", &self.verify_param)
            .field("strict_signatures", &self.strict_signatures)
            .field("options_header", &self.options_header)
            .finish()
    }
}
