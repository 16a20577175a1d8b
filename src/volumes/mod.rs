//! Per-volume transform settings and their resolution
//!
//! Each storage volume picks a transformer and may carry default and enforced
//! parameters. Lookup is exact handle first, then the shared `*` entry.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::TransformError;
use crate::transform::ParamMap;

/// Key of the settings shared by every volume without its own entry
pub const SHARED_SETTINGS_KEY: &str = "*";

/// Which provider adapter renders URLs for a volume
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformerKind {
    CloudflareBasic,
    CloudflareWorker,
    AwsSharp,
    /// No transformation; the plain asset URL
    Native,
}

impl TransformerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransformerKind::CloudflareBasic => "cloudflare_basic",
            TransformerKind::CloudflareWorker => "cloudflare_worker",
            TransformerKind::AwsSharp => "aws_sharp",
            TransformerKind::Native => "native",
        }
    }
}

fn default_transform_base_url() -> String {
    "/".to_string()
}

/// Transform settings for one volume
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeTransformSettings {
    pub transformer: TransformerKind,

    /// Base URL transform URLs are built on (e.g. CDN hostname)
    #[serde(default = "default_transform_base_url")]
    pub transform_base_url: String,

    /// Shared secret; when present and non-empty URLs are signed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_signing_secret: Option<String>,

    /// Applied to every transform unless the transform overrides the key
    #[serde(default)]
    pub default_params: ParamMap,

    /// Applied to every transform and never overridden
    #[serde(default)]
    pub enforce_params: ParamMap,
}

impl VolumeTransformSettings {
    pub fn new(transformer: TransformerKind) -> Self {
        Self {
            transformer,
            transform_base_url: default_transform_base_url(),
            url_signing_secret: None,
            default_params: ParamMap::new(),
            enforce_params: ParamMap::new(),
        }
    }

    /// Passthrough settings used when nothing is configured
    pub fn native() -> Self {
        Self::new(TransformerKind::Native)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.transform_base_url = base_url.into();
        self
    }

    pub fn with_signing_secret(mut self, secret: impl Into<String>) -> Self {
        self.url_signing_secret = Some(secret.into());
        self
    }

    pub fn with_default_params(mut self, params: ParamMap) -> Self {
        self.default_params = params;
        self
    }

    pub fn with_enforce_params(mut self, params: ParamMap) -> Self {
        self.enforce_params = params;
        self
    }

    /// The signing secret, if signing is enabled
    pub fn signing_secret(&self) -> Option<&str> {
        self.url_signing_secret
            .as_deref()
            .filter(|secret| !secret.is_empty())
    }

    pub fn should_sign_urls(&self) -> bool {
        self.signing_secret().is_some()
    }
}

/// Resolves the settings that apply to a volume
///
/// Holds an immutable snapshot of the configured volumes; resolution is
/// deterministic and has no side effects beyond logging.
#[derive(Debug, Clone, Default)]
pub struct VolumeSettingsResolver {
    volumes: HashMap<String, VolumeTransformSettings>,
}

impl VolumeSettingsResolver {
    pub fn new(volumes: HashMap<String, VolumeTransformSettings>) -> Self {
        Self { volumes }
    }

    /// Settings for `volume`: exact handle, then `*`
    ///
    /// With no volumes configured at all this degrades to the native
    /// passthrough transformer and logs a warning. A non-empty configuration
    /// that matches neither the handle nor `*` is a configuration error.
    pub fn resolve(&self, volume: &str) -> Result<VolumeTransformSettings, TransformError> {
        if let Some(settings) = self
            .volumes
            .get(volume)
            .or_else(|| self.volumes.get(SHARED_SETTINGS_KEY))
        {
            return Ok(settings.clone());
        }

        if self.volumes.is_empty() {
            tracing::warn!(
                volume = %volume,
                error = %TransformError::NoTransformerConfigured,
                "Falling back to native transformer"
            );
            return Ok(VolumeTransformSettings::native());
        }

        Err(TransformError::VolumeNotConfigured {
            volume: volume.to_string(),
        })
    }

    pub fn volumes(&self) -> &HashMap<String, VolumeTransformSettings> {
        &self.volumes
    }
}
