// URL construction through ImageTransformService

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use imguru::transform::{Asset, Filesystem, Mode, NamedPosition, OutputFormat, TransformDescriptor};
use imguru::volumes::{TransformerKind, VolumeSettingsResolver, VolumeTransformSettings};
use imguru::{ImageTransformService, TransformError};
use rstest::rstest;
use serde_json::{json, Value};
use std::collections::HashMap;

fn service(volumes: Vec<(&str, VolumeTransformSettings)>) -> ImageTransformService {
    let volumes: HashMap<String, VolumeTransformSettings> = volumes
        .into_iter()
        .map(|(handle, settings)| (handle.to_string(), settings))
        .collect();
    ImageTransformService::new(VolumeSettingsResolver::new(volumes))
}

fn local(volume: &str, path: &str) -> Asset {
    Asset::new(volume, path, Filesystem::Local { subfolder: None })
}

fn crop_100() -> TransformDescriptor {
    TransformDescriptor::new()
        .width(100)
        .quality(80)
        .mode(Mode::Crop)
        .position(NamedPosition::CenterCenter)
}

#[test]
fn test_basic_cloudflare_url() {
    let service = service(vec![(
        "*",
        VolumeTransformSettings::new(TransformerKind::CloudflareBasic)
            .with_base_url("https://cdn.test"),
    )]);
    let url = service
        .transform_url(&local("uploads", "a/b.jpg"), &crop_100())
        .unwrap();
    assert_eq!(
        url,
        "https://cdn.test/cdn-cgi/image/width=100,quality=80,fit=cover,gravity=0.5x0.5/a/b.jpg"
    );
}

#[test]
fn test_exact_volume_wins_over_wildcard() {
    let service = service(vec![
        (
            "*",
            VolumeTransformSettings::new(TransformerKind::CloudflareBasic)
                .with_base_url("https://cdn.test"),
        ),
        (
            "raw",
            VolumeTransformSettings::native().with_base_url("https://files.test/"),
        ),
    ]);
    let url = service
        .transform_url(&local("raw", "docs/a.jpg"), &crop_100())
        .unwrap();
    assert_eq!(url, "https://files.test/docs/a.jpg");
}

#[test]
fn test_unknown_volume_without_wildcard_is_an_error() {
    let service = service(vec![(
        "uploads",
        VolumeTransformSettings::new(TransformerKind::CloudflareBasic),
    )]);
    let err = service
        .transform_url(&local("archive", "a.jpg"), &crop_100())
        .unwrap_err();
    assert!(matches!(err, TransformError::VolumeNotConfigured { .. }));
}

#[rstest]
#[case(TransformerKind::CloudflareBasic, "svg", false)]
#[case(TransformerKind::CloudflareBasic, "avif", false)]
#[case(TransformerKind::CloudflareWorker, "avif", true)]
#[case(TransformerKind::AwsSharp, "webp", true)]
#[case(TransformerKind::Native, "pdf", true)]
fn test_extension_support_per_transformer(
    #[case] kind: TransformerKind,
    #[case] extension: &str,
    #[case] supported: bool,
) {
    let service = service(vec![("*", VolumeTransformSettings::new(kind))]);
    let asset = Asset::new(
        "any",
        format!("file.{}", extension),
        Filesystem::S3 {
            bucket: "bucket".into(),
            subfolder: None,
        },
    );
    let result = service.transform_url(&asset, &TransformDescriptor::new().width(10));
    match result {
        Err(TransformError::UnsupportedAssetKind { .. }) => assert!(!supported),
        Err(other) => panic!("unexpected error: {other:?}"),
        Ok(_) => assert!(supported),
    }
}

#[test]
fn test_sharp_url_payload_and_signature() {
    let service = service(vec![(
        "s3Images",
        VolumeTransformSettings::new(TransformerKind::AwsSharp)
            .with_base_url("https://sharp.test/")
            .with_signing_secret("sharp-secret"),
    )]);
    let asset = Asset::new(
        "s3Images",
        "cats/tabby.png",
        Filesystem::S3 {
            bucket: "media".into(),
            subfolder: None,
        },
    );
    let descriptor = TransformDescriptor::new()
        .width(200)
        .format(OutputFormat::Webp);

    let url = service.transform_url(&asset, &descriptor).unwrap();
    let (path, query) = url
        .trim_start_matches("https://sharp.test")
        .split_once('?')
        .unwrap();
    let signature = query.strip_prefix("signature=").unwrap();
    assert_eq!(signature, imguru::signing::sign(path, b"sharp-secret"));

    let payload: Value =
        serde_json::from_slice(&STANDARD.decode(path.trim_start_matches('/')).unwrap()).unwrap();
    assert_eq!(payload["bucket"], json!("media"));
    assert_eq!(payload["key"], json!("cats/tabby.png"));
    assert_eq!(payload["edits"]["webp"]["quality"], json!(80));
    assert_eq!(payload["edits"]["resize"]["width"], json!(200));
    assert_eq!(payload["edits"]["resize"]["fit"], json!("cover"));
}
