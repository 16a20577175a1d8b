//! AWS Serverless Image Handler (Sharp) URLs
//!
//! The request is a base64-encoded JSON document `{bucket, key, edits}` used
//! as the whole URL path. `edits` holds one entry keyed by the output format
//! with its encoder options, and a `resize` entry.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::{json, Value};

use super::{join_base_url, ProviderAdapter, RESIZABLE_EXTENSIONS};
use crate::error::TransformError;
use crate::signing::UrlSigner;
use crate::transform::{
    position_to_aws_position, Asset, Filesystem, Interlace, Mode, OutputFormat, ParamMap,
    TransformDescriptor, DEFAULT_QUALITY,
};
use crate::volumes::{TransformerKind, VolumeTransformSettings};

/// Query parameter carrying the handler signature
pub const SIGNATURE_PARAM: &str = "signature";

/// Source formats a browser can display as-is
const WEB_SAFE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "gif", "png", "webp", "avif"];

/// Builds `{base}/{base64(json)}[?signature={hmac}]` URLs
#[derive(Debug, Clone, Copy, Default)]
pub struct AwsSharpAdapter;

impl AwsSharpAdapter {
    /// Output format name in Sharp's vocabulary
    ///
    /// Explicit formats win; otherwise a web-safe source keeps its format and
    /// anything else becomes webp.
    pub fn format_name(descriptor: &TransformDescriptor, asset: &Asset) -> String {
        match descriptor.format {
            Some(format) if format != OutputFormat::Auto => format.as_str().to_string(),
            _ => {
                let extension = asset.extension();
                if WEB_SAFE_EXTENSIONS.contains(&extension.as_str()) {
                    OutputFormat::parse(&extension)
                        .map(|format| format.as_str().to_string())
                        .unwrap_or(extension)
                } else {
                    OutputFormat::Webp.as_str().to_string()
                }
            }
        }
    }

    /// Encoder options for the chosen format
    pub fn format_options(format: &str, descriptor: &TransformDescriptor) -> ParamMap {
        let mut options = ParamMap::new();
        options.insert(
            "quality".into(),
            Value::from(descriptor.quality.unwrap_or(DEFAULT_QUALITY)),
        );

        let progressive = descriptor
            .interlace
            .map(|interlace| interlace != Interlace::None)
            .unwrap_or(false);

        match format {
            "webp" => {
                options.insert("nearLossless".into(), Value::Bool(true));
            }
            "jpeg" => {
                options.insert("progressive".into(), Value::Bool(progressive));
                if progressive {
                    options.insert("optimizeScans".into(), Value::Bool(true));
                }
                options.insert("trellisQuantisation".into(), Value::Bool(true));
                options.insert("overshootDeringing".into(), Value::Bool(true));
            }
            "png" => {
                options.insert("progressive".into(), Value::Bool(progressive));
            }
            _ => {}
        }
        options
    }

    /// Map a canonical mode onto Sharp's `resize.fit`
    pub fn sharp_fit(mode: Option<&Mode>) -> String {
        match mode {
            None | Some(Mode::Crop) => "cover".to_string(),
            Some(Mode::Fit) => "inside".to_string(),
            Some(Mode::Stretch) => "fill".to_string(),
            Some(Mode::Other(value)) => value.to_lowercase(),
        }
    }

    /// Build the `edits` object, before volume params are applied
    pub fn edits(descriptor: &TransformDescriptor, asset: &Asset) -> ParamMap {
        let format = Self::format_name(descriptor, asset);
        let mut edits = ParamMap::new();
        edits.insert(
            format.clone(),
            Value::Object(Self::format_options(&format, descriptor)),
        );

        let mut resize = ParamMap::new();
        if let Some(width) = descriptor.width.filter(|w| *w > 0) {
            resize.insert("width".into(), Value::from(width));
        }
        if let Some(height) = descriptor.height.filter(|h| *h > 0) {
            resize.insert("height".into(), Value::from(height));
        }
        resize.insert(
            "fit".into(),
            Value::String(Self::sharp_fit(descriptor.mode.as_ref())),
        );
        if let Some(position) = position_to_aws_position(&descriptor.effective_focal_point(asset)) {
            resize.insert("position".into(), Value::String(position));
        }
        edits.insert("resize".into(), Value::Object(resize));

        edits
    }
}

impl ProviderAdapter for AwsSharpAdapter {
    fn kind(&self) -> TransformerKind {
        TransformerKind::AwsSharp
    }

    fn supports(&self, extension: &str) -> bool {
        RESIZABLE_EXTENSIONS.contains(&extension)
    }

    fn build_url(
        &self,
        descriptor: &TransformDescriptor,
        asset: &Asset,
        settings: &VolumeTransformSettings,
    ) -> Result<String, TransformError> {
        let Filesystem::S3 { bucket, .. } = &asset.filesystem else {
            return Err(TransformError::UnsupportedStorageBackend);
        };

        let mut edits = settings.default_params.clone();
        for (key, value) in Self::edits(descriptor, asset) {
            edits.insert(key, value);
        }
        for (key, value) in &settings.enforce_params {
            edits.insert(key.clone(), value.clone());
        }

        let request = json!({
            "bucket": bucket,
            "key": asset.storage_key(),
            "edits": Value::Object(edits),
        });
        let encoded = STANDARD.encode(serde_json::to_vec(&request)?);

        let url = join_base_url(&settings.transform_base_url, &encoded);
        match settings.signing_secret() {
            Some(secret) => {
                let signature = UrlSigner::new(secret).sign(&format!("/{}", encoded));
                Ok(format!("{}?{}={}", url, SIGNATURE_PARAM, signature))
            }
            None => Ok(url),
        }
    }
}
