//! Provider adapters
//!
//! Each adapter renders a [`TransformDescriptor`] for an [`Asset`] into one
//! provider's URL grammar. Adapters are stateless unit structs; the set of
//! variants is fixed at compile time and selected from configuration through
//! [`adapter_for`].

mod aws_sharp;
mod cloudflare_basic;
mod cloudflare_worker;
mod native;

pub use aws_sharp::AwsSharpAdapter;
pub use cloudflare_basic::CloudflareBasicAdapter;
pub use cloudflare_worker::CloudflareWorkerAdapter;
pub use native::NativeAdapter;

use crate::error::TransformError;
use crate::transform::{Asset, TransformDescriptor};
use crate::volumes::{TransformerKind, VolumeTransformSettings};

/// Extensions the Cloudflare and Sharp resizers can decode (no SVG)
pub(crate) const RESIZABLE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Trait for provider URL builders
///
/// Implementations must be pure: the same descriptor, asset and settings
/// always produce the same URL.
pub trait ProviderAdapter: Send + Sync {
    /// Which transformer this adapter implements
    fn kind(&self) -> TransformerKind;

    /// Whether the provider can transform assets with this (lowercase) extension
    ///
    /// Callers must not invoke [`ProviderAdapter::build_url`] for assets this
    /// returns false for.
    fn supports(&self, extension: &str) -> bool;

    /// Build the final, optionally signed, transform URL
    fn build_url(
        &self,
        descriptor: &TransformDescriptor,
        asset: &Asset,
        settings: &VolumeTransformSettings,
    ) -> Result<String, TransformError>;

    fn name(&self) -> &'static str {
        self.kind().as_str()
    }
}

static CLOUDFLARE_BASIC: CloudflareBasicAdapter = CloudflareBasicAdapter;
static CLOUDFLARE_WORKER: CloudflareWorkerAdapter = CloudflareWorkerAdapter;
static AWS_SHARP: AwsSharpAdapter = AwsSharpAdapter;
static NATIVE: NativeAdapter = NativeAdapter;

/// Look up the adapter for a configured transformer
pub fn adapter_for(kind: TransformerKind) -> &'static dyn ProviderAdapter {
    match kind {
        TransformerKind::CloudflareBasic => &CLOUDFLARE_BASIC,
        TransformerKind::CloudflareWorker => &CLOUDFLARE_WORKER,
        TransformerKind::AwsSharp => &AWS_SHARP,
        TransformerKind::Native => &NATIVE,
    }
}

/// Join a base URL and a relative path with exactly one slash between them
pub(crate) fn join_base_url(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Percent-encode each segment of a storage key, keeping the separators
pub(crate) fn encode_storage_key(key: &str) -> String {
    key.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
