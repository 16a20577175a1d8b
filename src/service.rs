//! Asset + transform -> provider URL
//!
//! Resolves the volume's settings, picks the adapter, checks the asset kind
//! and builds the URL. Construction is all-or-nothing.

use crate::adapters::adapter_for;
use crate::error::TransformError;
use crate::transform::{Asset, TransformDescriptor};
use crate::volumes::VolumeSettingsResolver;

#[derive(Debug, Clone, Default)]
pub struct ImageTransformService {
    resolver: VolumeSettingsResolver,
}

impl ImageTransformService {
    pub fn new(resolver: VolumeSettingsResolver) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &VolumeSettingsResolver {
        &self.resolver
    }

    /// Build the transform URL for `asset`
    pub fn transform_url(
        &self,
        asset: &Asset,
        descriptor: &TransformDescriptor,
    ) -> Result<String, TransformError> {
        let settings = self.resolver.resolve(&asset.volume)?;
        let adapter = adapter_for(settings.transformer);

        let extension = asset.extension();
        if !adapter.supports(&extension) {
            return Err(TransformError::UnsupportedAssetKind {
                extension,
                transformer: adapter.name().to_string(),
            });
        }

        let url = adapter.build_url(descriptor, asset, &settings)?;
        tracing::debug!(
            volume = %asset.volume,
            transformer = adapter.name(),
            signed = settings.should_sign_urls(),
            "Built transform URL"
        );
        Ok(url)
    }
}
