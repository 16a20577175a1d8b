// Request pipeline module - per-request state carried through the proxy hooks

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::edge::{Decoration, OriginRequest};

/// Request context that holds everything known about one edge request
/// as it flows through the Pingora hooks
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: String,
    method: String,
    path: String,
    timestamp: u64,
    started: Instant,
    origin_request: Option<OriginRequest>,
    decoration: Option<Decoration>,
    upstream_status: Option<u16>,
    response_status: Option<u16>,
}

impl RequestContext {
    /// Create a new RequestContext
    /// Generates a unique request ID (UUID v4) and captures the current time
    pub fn new(method: String, path: String) -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            method,
            path,
            timestamp: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or_default(),
            started: Instant::now(),
            origin_request: None,
            decoration: None,
            upstream_status: None,
            response_status: None,
        }
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Fill in method and path once the request header has been read
    pub fn set_request_line(&mut self, method: String, path: String) {
        self.method = method;
        self.path = path;
    }

    /// Unix epoch seconds when the request arrived
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn set_origin_request(&mut self, request: OriginRequest) {
        self.origin_request = Some(request);
    }

    pub fn origin_request(&self) -> Option<&OriginRequest> {
        self.origin_request.as_ref()
    }

    /// Record the upstream status and how the response will be decorated
    pub fn set_upstream_status(&mut self, status: u16) {
        let decoration = Decoration::for_status(status);
        self.upstream_status = Some(status);
        self.decoration = Some(decoration);
        self.response_status = Some(decoration.status(status));
    }

    pub fn upstream_status(&self) -> Option<u16> {
        self.upstream_status
    }

    pub fn decoration(&self) -> Option<Decoration> {
        self.decoration
    }

    /// Whether the upstream body must be replaced by the generic message
    pub fn replaces_body(&self) -> bool {
        self.decoration == Some(Decoration::Failure)
    }

    /// Status sent for a request answered without an upstream fetch
    pub fn set_response_status(&mut self, status: u16) {
        self.response_status = Some(status);
    }

    pub fn response_status(&self) -> Option<u16> {
        self.response_status
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_context_new() {
        let ctx = RequestContext::new("GET".to_string(), "/img/a.jpg".to_string());
        assert_eq!(ctx.method(), "GET");
        assert_eq!(ctx.path(), "/img/a.jpg");
        assert!(Uuid::parse_str(ctx.request_id()).is_ok());
        assert!(ctx.origin_request().is_none());
        assert!(!ctx.replaces_body());
    }

    #[test]
    fn test_request_ids_are_unique() {
        let a = RequestContext::new("GET".to_string(), "/".to_string());
        let b = RequestContext::new("GET".to_string(), "/".to_string());
        assert_ne!(a.request_id(), b.request_id());
    }

    #[test]
    fn test_upstream_failure_is_replaced() {
        let mut ctx = RequestContext::new("GET".to_string(), "/a.jpg".to_string());
        ctx.set_upstream_status(404);
        assert_eq!(ctx.upstream_status(), Some(404));
        assert_eq!(ctx.response_status(), Some(400));
        assert!(ctx.replaces_body());
    }

    #[test]
    fn test_not_modified_passes_through() {
        let mut ctx = RequestContext::new("GET".to_string(), "/a.jpg".to_string());
        ctx.set_upstream_status(304);
        assert_eq!(ctx.response_status(), Some(304));
        assert_eq!(ctx.decoration(), Some(Decoration::Cacheable));
    }
}
