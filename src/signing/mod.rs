//! URL signing and verification
//!
//! Signatures are hex-encoded HMAC-SHA256 over a canonical string:
//!
//! ```text
//! canonical = pathname + ("?" + query, when the query is non-empty)
//! ```
//!
//! where `query` never contains the signature parameter itself. The signer
//! builds the canonical string before appending the signature; the verifier
//! removes the signature pair from the raw query text, so both sides see the
//! same bytes without re-encoding anything.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::TransformError;

type HmacSha256 = Hmac<Sha256>;

/// Default query parameter carrying the edge signature
pub const DEFAULT_VERIFY_PARAM: &str = "verify";

fn mac_for(secret: &[u8]) -> HmacSha256 {
    HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size")
}

/// Hex HMAC-SHA256 of `message`
pub fn sign(message: &str, secret: &[u8]) -> String {
    let mut mac = mac_for(secret);
    mac.update(message.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Check a hex signature against `message`
///
/// Comparison goes through `Mac::verify_slice`, which is constant time.
/// Malformed hex is simply an invalid signature.
pub fn verify(message: &str, signature_hex: &str, secret: &[u8]) -> bool {
    let Ok(signature) = hex::decode(signature_hex.trim()) else {
        return false;
    };
    let mut mac = mac_for(secret);
    mac.update(message.as_bytes());
    mac.verify_slice(&signature).is_ok()
}

/// Canonical string for a path and an already-stripped query
pub fn canonical_string(path: &str, query: &str) -> String {
    if query.is_empty() {
        path.to_string()
    } else {
        format!("{}?{}", path, query)
    }
}

/// Remove every `param` pair from a raw query string
///
/// Returns the remaining query text (original encoding preserved) and the
/// decoded value of the first occurrence.
pub fn strip_param(query: &str, param: &str) -> (String, Option<String>) {
    let mut found = None;
    let mut remaining = Vec::new();

    for pair in query.split('&').filter(|pair| !pair.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let key_matches = urlencoding::decode(key)
            .map(|decoded| decoded == param)
            .unwrap_or(false);
        if key_matches {
            if found.is_none() {
                found = Some(
                    urlencoding::decode(value)
                        .map(|v| v.into_owned())
                        .unwrap_or_else(|_| value.to_string()),
                );
            }
        } else {
            remaining.push(pair);
        }
    }

    (remaining.join("&"), found)
}

/// Signs canonical strings with a shared secret
#[derive(Clone)]
pub struct UrlSigner {
    secret: Vec<u8>,
}

impl UrlSigner {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    pub fn sign(&self, canonical: &str) -> String {
        sign(canonical, &self.secret)
    }

    /// Sign a path + query pair (query without the signature parameter)
    pub fn sign_request(&self, path: &str, query: &str) -> String {
        self.sign(&canonical_string(path, query))
    }
}

impl std::fmt::Debug for UrlSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrlSigner").finish_non_exhaustive()
    }
}

/// Verifies signed inbound requests at the edge
#[derive(Clone)]
pub struct UrlVerifier {
    enabled: bool,
    secret: Vec<u8>,
    param: String,
}

impl UrlVerifier {
    pub fn new(secret: impl Into<Vec<u8>>, param: impl Into<String>) -> Self {
        Self {
            enabled: true,
            secret: secret.into(),
            param: param.into(),
        }
    }

    /// A verifier that accepts everything (local development)
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            secret: Vec::new(),
            param: DEFAULT_VERIFY_PARAM.to_string(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn param(&self) -> &str {
        &self.param
    }

    /// Verify `path` + `query` (raw, still carrying the signature)
    ///
    /// Returns the query with the signature parameter removed.
    pub fn verify_request(&self, path: &str, query: &str) -> Result<String, TransformError> {
        let (remaining, signature) = strip_param(query, &self.param);
        if !self.enabled {
            return Ok(remaining);
        }

        let signature = signature
            .filter(|s| !s.is_empty())
            .ok_or_else(|| TransformError::missing_signature(&self.param))?;

        if verify(&canonical_string(path, &remaining), &signature, &self.secret) {
            Ok(remaining)
        } else {
            Err(TransformError::InvalidSignature)
        }
    }
}

impl std::fmt::Debug for UrlVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrlVerifier")
            .field("enabled", &self.enabled)
            .field("param", &self.param)
            .finish_non_exhaustive()
    }
}
