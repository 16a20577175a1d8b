//! Passthrough: the plain asset URL, no transformation

use super::{encode_storage_key, join_base_url, ProviderAdapter};
use crate::error::TransformError;
use crate::transform::{Asset, TransformDescriptor};
use crate::volumes::{TransformerKind, VolumeTransformSettings};

#[derive(Debug, Clone, Copy, Default)]
pub struct NativeAdapter;

impl ProviderAdapter for NativeAdapter {
    fn kind(&self) -> TransformerKind {
        TransformerKind::Native
    }

    fn supports(&self, _extension: &str) -> bool {
        true
    }

    fn build_url(
        &self,
        _descriptor: &TransformDescriptor,
        asset: &Asset,
        settings: &VolumeTransformSettings,
    ) -> Result<String, TransformError> {
        Ok(join_base_url(
            &settings.transform_base_url,
            &encode_storage_key(&asset.storage_key()),
        ))
    }
}
