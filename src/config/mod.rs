// Configuration module

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::edge::Origin;
use crate::volumes::{VolumeSettingsResolver, VolumeTransformSettings};

pub mod edge;
pub mod server;

pub use edge::EdgeConfig;
pub use server::{LogFormat, ServerConfig};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub edge: EdgeConfig,
    /// Transform settings keyed by volume handle (`*` applies to all others)
    #[serde(default)]
    pub volumes: HashMap<String, VolumeTransformSettings>,
}

impl Config {
    pub fn from_yaml_with_env(yaml: &str) -> Result<Self, String> {
        // Replace ${VAR_NAME} with environment variable values
        let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").map_err(|e| e.to_string())?;

        // Every referenced variable must be set
        for caps in re.captures_iter(yaml) {
            let var_name = &caps[1];
            std::env::var(var_name).map_err(|_| {
                format!(
                    "Environment variable '{}' is referenced but not set",
                    var_name
                )
            })?;
        }

        let substituted = re.replace_all(yaml, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_default()
        });

        serde_yaml::from_str(&substituted).map_err(|e| e.to_string())
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;
        Self::from_yaml_with_env(&yaml)
    }

    pub fn validate(&self) -> Result<(), String> {
        let edge = &self.edge;

        if edge.origin.trim().is_empty() {
            return Err("edge.origin cannot be empty".to_string());
        }
        Origin::parse(&edge.origin)?;

        if !edge.route.is_empty() && !edge.route.starts_with('/') {
            return Err(format!(
                "edge.route '{}' must be empty or start with /",
                edge.route
            ));
        }

        if edge.verify_requests && edge.signing_secret().is_none() {
            return Err(
                "edge.signing_secret is required when edge.verify_requests is enabled".to_string(),
            );
        }

        if edge.verify_param.trim().is_empty() {
            return Err("edge.verify_param cannot be empty".to_string());
        }

        if edge.options_header.trim().is_empty() {
            return Err("edge.options_header cannot be empty".to_string());
        }
        http::HeaderName::from_bytes(edge.options_header.as_bytes()).map_err(|_| {
            format!(
                "edge.options_header '{}' is not a valid header name",
                edge.options_header
            )
        })?;

        for (handle, settings) in &self.volumes {
            if handle.trim().is_empty() {
                return Err("Volume handle cannot be empty".to_string());
            }
            if settings.transform_base_url.trim().is_empty() {
                return Err(format!(
                    "Volume '{}' has an empty transform_base_url",
                    handle
                ));
            }
        }

        Ok(())
    }

    /// Immutable resolver over the configured volumes
    pub fn volume_resolver(&self) -> VolumeSettingsResolver {
        VolumeSettingsResolver::new(self.volumes.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::volumes::TransformerKind;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MINIMAL: &str = r#"
edge:
  origin: "https://images.example.com"
  verify_requests: false
"#;

    #[test]
    fn test_config_can_be_loaded_from_file_path() {
        let mut temp_file = NamedTempFile::new().unwrap();
        let config_yaml = r#"
server:
  address: "127.0.0.1"
  port: 9090
  log_format: pretty

edge:
  origin: "https://images.example.com"
  route: "/img"
  signing_secret: "ilovepotatoes"

volumes:
  "*":
    transformer: cloudflare_basic
    transform_base_url: "https://cdn.example.com"
  s3Images:
    transformer: aws_sharp
    transform_base_url: "https://d123.cloudfront.net"
    url_signing_secret: "aws"
"#;
        temp_file.write_all(config_yaml.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = Config::from_file(temp_file.path()).unwrap();

        assert_eq!(config.server.address, "127.0.0.1");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.log_format, LogFormat::Pretty);
        assert_eq!(config.edge.route, "/img");
        assert!(config.edge.verify_requests);
        assert_eq!(config.edge.verify_param, "verify");
        assert_eq!(config.edge.options_header, "x-image-options");
        assert_eq!(config.volumes.len(), 2);
        assert_eq!(
            config.volumes["s3Images"].transformer,
            TransformerKind::AwsSharp
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults_applied() {
        let config = Config::from_yaml_with_env(MINIMAL).unwrap();
        assert_eq!(config.server.address, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.log_format, LogFormat::Json);
        assert_eq!(config.edge.route, "");
        assert!(!config.edge.strict_signatures);
        assert!(config.volumes.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_substitution() {
        std::env::set_var("IMGURU_TEST_SIGNING_SECRET", "from-env");
        let yaml = r#"
edge:
  origin: "https://images.example.com"
  signing_secret: "${IMGURU_TEST_SIGNING_SECRET}"
"#;
        let config = Config::from_yaml_with_env(yaml).unwrap();
        assert_eq!(config.edge.signing_secret(), Some("from-env"));
    }

    #[test]
    fn test_missing_env_var_is_an_error() {
        let yaml = r#"
edge:
  origin: "${IMGURU_TEST_UNSET_ORIGIN_VARIABLE}"
"#;
        let err = Config::from_yaml_with_env(yaml).unwrap_err();
        assert!(err.contains("IMGURU_TEST_UNSET_ORIGIN_VARIABLE"));
    }

    #[test]
    fn test_verification_requires_secret() {
        let yaml = r#"
edge:
  origin: "https://images.example.com"
"#;
        let config = Config::from_yaml_with_env(yaml).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.contains("signing_secret"));
    }

    #[test]
    fn test_rejects_bad_origin_and_route() {
        let mut config = Config::from_yaml_with_env(MINIMAL).unwrap();
        config.edge.origin = "images.example.com".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::from_yaml_with_env(MINIMAL).unwrap();
        config.edge.route = "img".to_string();
        assert!(config.validate().unwrap_err().contains("edge.route"));

        let mut config = Config::from_yaml_with_env(MINIMAL).unwrap();
        config.edge.options_header = "bad header".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_empty_transform_base_url() {
        let yaml = r#"
edge:
  origin: "https://images.example.com"
  verify_requests: false
volumes:
  uploads:
    transformer: cloudflare_worker
    transform_base_url: ""
"#;
        let config = Config::from_yaml_with_env(yaml).unwrap();
        assert!(config.validate().unwrap_err().contains("uploads"));
    }

    #[test]
    fn test_unknown_transformer_fails_to_parse() {
        let yaml = r#"
edge:
  origin: "https://images.example.com"
volumes:
  uploads:
    transformer: imgix
"#;
        assert!(Config::from_yaml_with_env(yaml).is_err());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let mut config = Config::from_yaml_with_env(MINIMAL).unwrap();
        config.edge.signing_secret = Some("super-secret".to_string());
        assert!(!format!("{:?}", config).contains("super-secret"));
    }
}
