// Configuration loading and validation tests

use imguru::config::{Config, LogFormat};
use imguru::volumes::TransformerKind;
use std::io::Write;

const FULL_CONFIG: &str = r#"
server:
  address: "127.0.0.1"
  port: 9090
  threads: 2
  log_format: pretty
edge:
  origin: "https://origin.test:8443/images"
  route: "/img"
  signing_secret: "edge-secret"
  strict_signatures: true
volumes:
  "*":
    transformer: cloudflare_basic
    transform_base_url: "https://cdn.test"
  s3Images:
    transformer: aws_sharp
    transform_base_url: "https://sharp.test"
    url_signing_secret: "sharp-secret"
    enforce_params:
      quality: 60
"#;

#[test]
fn test_full_config_loads_and_validates() {
    let config = Config::from_yaml_with_env(FULL_CONFIG).unwrap();
    config.validate().unwrap();

    assert_eq!(config.server.listen_addr(), "127.0.0.1:9090");
    assert_eq!(config.server.threads, 2);
    assert_eq!(config.server.log_format, LogFormat::Pretty);
    assert_eq!(config.edge.route, "/img");
    assert_eq!(config.edge.verify_param, "verify");
    assert!(config.edge.strict_signatures);
    assert_eq!(config.volumes.len(), 2);
    assert_eq!(
        config.volumes["s3Images"].transformer,
        TransformerKind::AwsSharp
    );
}

#[test]
fn test_resolver_built_from_config_falls_back_to_wildcard() {
    let config = Config::from_yaml_with_env(FULL_CONFIG).unwrap();
    let resolver = config.volume_resolver();

    let settings = resolver.resolve("uploads").unwrap();
    assert_eq!(settings.transformer, TransformerKind::CloudflareBasic);

    let settings = resolver.resolve("s3Images").unwrap();
    assert!(settings.should_sign_urls());
}

#[test]
fn test_config_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(FULL_CONFIG.as_bytes()).unwrap();

    let config = Config::from_file(file.path()).unwrap();
    assert_eq!(config.edge.origin, "https://origin.test:8443/images");
}

#[test]
fn test_missing_file_is_an_error() {
    assert!(Config::from_file("/nonexistent/imguru.yaml").is_err());
}

#[test]
fn test_verification_without_secret_fails_validation() {
    let config = Config::from_yaml_with_env(
        r#"
edge:
  origin: "https://origin.test"
"#,
    )
    .unwrap();
    assert!(config.validate().is_err());
}

#[test]
fn test_unverified_edge_needs_no_secret() {
    let config = Config::from_yaml_with_env(
        r#"
edge:
  origin: "https://origin.test"
  verify_requests: false
"#,
    )
    .unwrap();
    assert!(config.validate().is_ok());
}

#[test]
fn test_origin_without_scheme_fails_validation() {
    let config = Config::from_yaml_with_env(
        r#"
edge:
  origin: "origin.test"
  verify_requests: false
"#,
    )
    .unwrap();
    assert!(config.validate().is_err());
}
