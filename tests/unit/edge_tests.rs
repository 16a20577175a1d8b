// Edge request handling: URLs minted by the worker adapter must verify at the edge

use imguru::config::{Config, EdgeConfig};
use imguru::edge::{Decoration, EdgeRequestHandler};
use imguru::transform::{Asset, Filesystem, FocalPoint, TransformDescriptor};
use imguru::{ImageTransformService, TransformError};
use serde_json::json;

const CONFIG: &str = r#"
edge:
  origin: "https://origin.test/library"
  route: "/img"
  signing_secret: "shared-secret"
volumes:
  "*":
    transformer: cloudflare_worker
    transform_base_url: "https://edge.test/img"
    url_signing_secret: "shared-secret"
"#;

fn setup() -> (ImageTransformService, EdgeRequestHandler) {
    let config = Config::from_yaml_with_env(CONFIG).unwrap();
    config.validate().unwrap();
    let service = ImageTransformService::new(config.volume_resolver());
    let handler = EdgeRequestHandler::new(&config.edge).unwrap();
    (service, handler)
}

fn split(url: &str) -> (&str, &str) {
    let relative = url.trim_start_matches("https://edge.test");
    relative.split_once('?').unwrap_or((relative, ""))
}

#[test]
fn test_minted_url_is_accepted_by_edge() {
    let (service, handler) = setup();
    let asset = Asset::new("uploads", "cats/tabby.jpg", Filesystem::Local { subfolder: None });
    let url = service
        .transform_url(&asset, &TransformDescriptor::new().width(320).quality(70))
        .unwrap();

    let (path, query) = split(&url);
    let request = handler.prepare(path, Some(query), None).unwrap();
    assert_eq!(request.url, "https://origin.test/library/cats/tabby.jpg");
    assert_eq!(request.path, "/library/cats/tabby.jpg");
    assert_eq!(request.options["width"], json!(320));
    assert_eq!(request.options["quality"], json!(70));
    assert_eq!(request.options["fit"], json!("crop"));
}

#[test]
fn test_focal_point_survives_the_round_trip() {
    let (service, handler) = setup();
    let asset = Asset::new("uploads", "a.png", Filesystem::Local { subfolder: None })
        .with_focal_point(FocalPoint::new(0.25, 0.75));
    let url = service
        .transform_url(&asset, &TransformDescriptor::new().width(64))
        .unwrap();

    let (path, query) = split(&url);
    let request = handler.prepare(path, Some(query), None).unwrap();
    assert_eq!(request.options["gravity"], json!({"x": 0.25, "y": 0.75}));
    assert!(request.options.get("fp-x").is_none());
}

#[test]
fn test_edited_minted_url_is_rejected() {
    let (service, handler) = setup();
    let asset = Asset::new("uploads", "a.jpg", Filesystem::Local { subfolder: None });
    let url = service
        .transform_url(&asset, &TransformDescriptor::new().width(100))
        .unwrap();

    let (path, query) = split(&url);
    let tampered = query.replace("width=100", "width=4000");
    let err = handler.prepare(path, Some(&tampered), None).unwrap_err();
    assert!(matches!(err, TransformError::InvalidSignature));
    assert_eq!(handler.status_for(&err), 400);
}

#[test]
fn test_unsigned_edge_negotiates_format() {
    let mut config = EdgeConfig::new("http://origin.test:8080");
    config.verify_requests = false;
    let handler = EdgeRequestHandler::new(&config).unwrap();

    let request = handler
        .prepare("/photo.jpg", Some("width=10&format=auto"), Some("image/webp"))
        .unwrap();
    assert_eq!(request.url, "http://origin.test:8080/photo.jpg");
    assert_eq!(request.options["format"], json!("webp"));

    let request = handler.prepare("/photo.jpg", None, Some("text/html")).unwrap();
    assert!(request.options.get("format").is_none());
}

#[test]
fn test_response_decoration() {
    assert!(matches!(Decoration::for_status(200), Decoration::Cacheable));
    assert!(matches!(Decoration::for_status(304), Decoration::Cacheable));
    assert!(matches!(Decoration::for_status(404), Decoration::Failure));
    assert_eq!(Decoration::for_status(502).status(502), 400);
    assert_eq!(Decoration::for_status(200).status(200), 200);
}
