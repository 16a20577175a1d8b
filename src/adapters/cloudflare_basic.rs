//! Cloudflare image resizing via the `/cdn-cgi/image/` URL format

use super::{encode_storage_key, ProviderAdapter, RESIZABLE_EXTENSIONS};
use crate::error::TransformError;
use crate::transform::{
    collapse_slashes, merge_params, normalize, param_to_string, Asset, ParamMap,
    TransformDescriptor, Vocabulary,
};
use crate::volumes::{TransformerKind, VolumeTransformSettings};

/// Path segment that makes Cloudflare parse transform options
pub const CF_PATH_PREFIX: &str = "/cdn-cgi/image/";

/// Builds `{base}/cdn-cgi/image/{k=v,...}/{storageKey}` URLs
///
/// This format cannot carry a signature; URLs are never signed.
#[derive(Debug, Clone, Copy, Default)]
pub struct CloudflareBasicAdapter;

impl CloudflareBasicAdapter {
    /// Comma-joined `key=value` list in map order, values percent-encoded
    pub fn encode_params(params: &ParamMap) -> String {
        params
            .iter()
            .map(|(key, value)| {
                format!("{}={}", key, urlencoding::encode(&param_to_string(value)))
            })
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl ProviderAdapter for CloudflareBasicAdapter {
    fn kind(&self) -> TransformerKind {
        TransformerKind::CloudflareBasic
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
        if settings.should_sign_urls() {
            tracing::warn!(
                volume = %asset.volume,
                transformer = self.name(),
                "URL signing secret is ignored by the basic Cloudflare transformer"
            );
        }

        let params = merge_params(
            &settings.default_params,
            normalize(descriptor, asset, &Vocabulary::CLOUDFLARE),
            &settings.enforce_params,
        );

        let path = collapse_slashes(&format!(
            "{}/{}",
            Self::encode_params(&params),
            encode_storage_key(&asset.storage_key())
        ));

        Ok(format!(
            "{}{}{}",
            settings.transform_base_url.trim_end_matches('/'),
            CF_PATH_PREFIX,
            path
        ))
    }
}
