//! Origin image store address

use http::Uri;

/// Parsed `edge.origin`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    pub host: String,
    pub port: u16,
    pub tls: bool,
    /// Path prefix on the origin, without surrounding slashes
    pub base_path: String,
}

impl Origin {
    /// Parse an absolute http(s) URL such as `https://images.example.com/media`
    pub fn parse(origin: &str) -> Result<Self, String> {
        let uri: Uri = origin
            .trim()
            .parse()
            .map_err(|e| format!("Invalid origin URL '{}': {}", origin, e))?;

        let tls = match uri.scheme_str() {
            Some("https") => true,
            Some("http") => false,
            _ => {
                return Err(format!(
                    "Origin URL '{}' must use http:// or https://",
                    origin
                ))
            }
        };

        let host = uri
            .host()
            .filter(|host| !host.is_empty())
            .ok_or_else(|| format!("Origin URL '{}' has no host", origin))?
            .to_string();
        let port = uri.port_u16().unwrap_or(if tls { 443 } else { 80 });

        Ok(Self {
            host,
            port,
            tls,
            base_path: uri.path().trim_matches('/').to_string(),
        })
    }

    /// Upstream request path for an inbound path (`/{base}/{path}`)
    pub fn path_for(&self, path: &str) -> String {
        let path = path.trim_matches('/');
        if self.base_path.is_empty() {
            format!("/{}", path)
        } else {
            format!("/{}/{}", self.base_path, path)
        }
    }

    /// Absolute origin URL for an inbound path
    pub fn url_for(&self, path: &str) -> String {
        let scheme = if self.tls { "https" } else { "http" };
        let default_port = if self.tls { 443 } else { 80 };
        if self.port == default_port {
            format!("{}://{}{}", scheme, self.host, self.path_for(path))
        } else {
            format!("{}://{}:{}{}", scheme, self.host, self.port, self.path_for(path))
        }
    }

    /// Value for the upstream `Host` header
    pub fn host_header(&self) -> String {
        let default_port = if self.tls { 443 } else { 80 };
        if self.port == default_port {
            self.host.clone()
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}
