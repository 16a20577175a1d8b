//! Response decoration for proxied image responses
//!
//! Successful responses are cached for a year and vary on Accept. Anything
//! else from the origin is replaced by a generic 400 that is never cached and
//! carries nothing from the upstream body.

use crate::transform::vary_header;

pub const IMMUTABLE_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";
pub const NO_CACHE_CONTROL: &str = "no-store, no-cache, must-revalidate, max-age=0";

/// Body sent in place of a failed upstream response
pub const UPSTREAM_FAILURE_MESSAGE: &str = "Unable to process image";

/// Status sent in place of a failed upstream response
pub const UPSTREAM_FAILURE_STATUS: u16 = 400;

/// How an upstream response is presented to the client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoration {
    Cacheable,
    Failure,
}

impl Decoration {
    /// 2xx and 304 are passed through; everything else is a failure
    pub fn for_status(status: u16) -> Self {
        if (200..300).contains(&status) || status == 304 {
            Decoration::Cacheable
        } else {
            Decoration::Failure
        }
    }

    /// Status the client will see
    pub fn status(&self, upstream_status: u16) -> u16 {
        match self {
            Decoration::Cacheable => upstream_status,
            Decoration::Failure => UPSTREAM_FAILURE_STATUS,
        }
    }

    /// Headers to set on the client response
    pub fn headers(&self) -> Vec<(&'static str, &'static str)> {
        match self {
            Decoration::Cacheable => vec![
                ("Cache-Control", IMMUTABLE_CACHE_CONTROL),
                ("Vary", vary_header()),
            ],
            Decoration::Failure => vec![
                ("Cache-Control", NO_CACHE_CONTROL),
                ("Pragma", "no-cache"),
                ("Content-Type", "text/plain; charset=utf-8"),
            ],
        }
    }

    /// Upstream headers that must not reach the client
    pub fn stripped_headers(&self) -> &'static [&'static str] {
        match self {
            Decoration::Cacheable => &[],
            Decoration::Failure => &[
                "Content-Length",
                "Content-Encoding",
                "ETag",
                "Last-Modified",
                "Expires",
                "Set-Cookie",
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_statuses_are_cacheable() {
        for status in [200, 204, 206, 304] {
            assert_eq!(Decoration::for_status(status), Decoration::Cacheable);
            assert_eq!(Decoration::for_status(status).status(status), status);
        }
    }

    #[test]
    fn test_non_ok_statuses_become_generic_400() {
        for status in [301, 403, 404, 500, 502] {
            let decoration = Decoration::for_status(status);
            assert_eq!(decoration, Decoration::Failure);
            assert_eq!(decoration.status(status), 400);
        }
    }

    #[test]
    fn test_cacheable_headers() {
        let headers = Decoration::Cacheable.headers();
        assert!(headers.contains(&("Cache-Control", "public, max-age=31536000, immutable")));
        assert!(headers.contains(&("Vary", "Accept")));
    }

    #[test]
    fn test_failure_headers_disable_caching() {
        let headers = Decoration::Failure.headers();
        assert!(headers
            .iter()
            .any(|(name, value)| *name == "Cache-Control" && value.contains("no-store")));
        assert!(Decoration::Failure
            .stripped_headers()
            .contains(&"Content-Length"));
    }
}
