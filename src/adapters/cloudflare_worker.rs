//! Query-string URLs consumed by the resizing edge worker

use super::{encode_storage_key, join_base_url, ProviderAdapter};
use crate::error::TransformError;
use crate::signing::{UrlSigner, DEFAULT_VERIFY_PARAM};
use crate::transform::{
    merge_params, normalize, param_to_string, Asset, ParamMap, TransformDescriptor, Vocabulary,
};
use crate::volumes::{TransformerKind, VolumeTransformSettings};

/// The worker also serves AVIF sources
const WORKER_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "avif"];

/// Builds `{base}/{storageKey}?{params}[&verify={hmac}]` URLs
///
/// The signature covers `/{storageKey}` plus the query, which is exactly what
/// the edge sees once its route prefix is stripped.
#[derive(Debug, Clone, Copy, Default)]
pub struct CloudflareWorkerAdapter;

impl CloudflareWorkerAdapter {
    /// URL-encode params as `k=v&k=v` in map order
    pub fn encode_query(params: &ParamMap) -> String {
        params
            .iter()
            .map(|(key, value)| {
                format!(
                    "{}={}",
                    urlencoding::encode(key),
                    urlencoding::encode(&param_to_string(value))
                )
            })
            .collect::<Vec<_>>()
            .join("&")
    }
}

impl ProviderAdapter for CloudflareWorkerAdapter {
    fn kind(&self) -> TransformerKind {
        TransformerKind::CloudflareWorker
    }

    fn supports(&self, extension: &str) -> bool {
        WORKER_EXTENSIONS.contains(&extension)
    }

    fn build_url(
        &self,
        descriptor: &TransformDescriptor,
        asset: &Asset,
        settings: &VolumeTransformSettings,
    ) -> Result<String, TransformError> {
        let params = merge_params(
            &settings.default_params,
            normalize(descriptor, asset, &Vocabulary::CLOUDFLARE_WORKER),
            &settings.enforce_params,
        );

        let path = format!("/{}", encode_storage_key(&asset.storage_key()));
        let mut query = Self::encode_query(&params);

        if let Some(secret) = settings.signing_secret() {
            let signature = UrlSigner::new(secret).sign_request(&path, &query);
            if !query.is_empty() {
                query.push('&');
            }
            query.push_str(DEFAULT_VERIFY_PARAM);
            query.push('=');
            query.push_str(&signature);
        }

        let url = join_base_url(&settings.transform_base_url, &path);
        if query.is_empty() {
            Ok(url)
        } else {
            Ok(format!("{}?{}", url, query))
        }
    }
}
