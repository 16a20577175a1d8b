// Proxy module - Pingora ProxyHttp implementation
// Authenticates inbound transform requests and forwards them to the origin

pub mod helpers;
pub mod special_endpoints;

use async_trait::async_trait;
use bytes::Bytes;
use pingora_core::upstreams::peer::HttpPeer;
use pingora_core::Result;
use pingora_http::{RequestHeader, ResponseHeader};
use pingora_proxy::{ProxyHttp, Session};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::edge::response::{NO_CACHE_CONTROL, UPSTREAM_FAILURE_MESSAGE};
use crate::edge::{Decoration, EdgeRequestHandler};
use crate::metrics::Metrics;
use crate::pipeline::RequestContext;

use helpers::{error_response, get_client_ip, write_response};
use special_endpoints::handle_special_endpoint;

/// ImguruProxy implements the Pingora ProxyHttp trait
///
/// Every request gets exactly one origin fetch or a local response; nothing
/// is retried.
pub struct ImguruProxy {
    config: Arc<Config>,
    handler: EdgeRequestHandler,
    metrics: Arc<Metrics>,
    /// Proxy start time (for uptime calculation in /health endpoint)
    start_time: Instant,
}

impl ImguruProxy {
    /// Create a new proxy from configuration
    pub fn new(config: Config) -> std::result::Result<Self, String> {
        let handler = EdgeRequestHandler::new(&config.edge)?;
        Ok(Self {
            config: Arc::new(config),
            handler,
            metrics: Arc::new(Metrics::new()),
            start_time: Instant::now(),
        })
    }

    pub fn metrics(&self) -> Arc<Metrics> {
        Arc::clone(&self.metrics)
    }

    pub fn handler(&self) -> &EdgeRequestHandler {
        &self.handler
    }

    fn internal_error(message: &'static str) -> Box<pingora_core::Error> {
        pingora_core::Error::explain(pingora_core::ErrorType::InternalError, message)
    }
}

/// Drop every origin chunk and emit the generic message once the stream ends
fn replace_failed_body(body: &mut Option<Bytes>, end_of_stream: bool) {
    *body = if end_of_stream {
        Some(Bytes::from_static(UPSTREAM_FAILURE_MESSAGE.as_bytes()))
    } else {
        None
    };
}

#[async_trait]
impl ProxyHttp for ImguruProxy {
    type CTX = RequestContext;

    fn new_ctx(&self) -> Self::CTX {
        RequestContext::new("GET".to_string(), "/".to_string())
    }

    /// Verify and validate the request; answer locally when it is rejected
    async fn request_filter(&self, session: &mut Session, ctx: &mut Self::CTX) -> Result<bool> {
        self.metrics.increment_request_count();
        self.metrics.increment_active_requests();

        let req = session.req_header();
        let path = req.uri.path().to_string();
        let query = req.uri.query().map(|q| q.to_string());
        let accept = req
            .headers
            .get("accept")
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());
        ctx.set_request_line(req.method.to_string(), path.clone());

        if let Some(response) = handle_special_endpoint(&path, self.start_time, &self.metrics) {
            ctx.set_response_status(response.status);
            write_response(session, response, Some("no-store")).await?;
            return Ok(true);
        }

        match self
            .handler
            .prepare(&path, query.as_deref(), accept.as_deref())
        {
            Ok(origin_request) => {
                tracing::debug!(
                    request_id = %ctx.request_id(),
                    origin_url = %origin_request.url,
                    "Forwarding transform request to origin"
                );
                ctx.set_origin_request(origin_request);
                Ok(false)
            }
            Err(error) => {
                let status = self.handler.status_for(&error);
                if error.is_signature_failure() {
                    self.metrics.increment_signature_failure();
                } else {
                    self.metrics.increment_validation_failure();
                }

                tracing::warn!(
                    request_id = %ctx.request_id(),
                    client_ip = %get_client_ip(session),
                    path = %path,
                    status_code = status,
                    error = %error,
                    "Rejected transform request"
                );

                ctx.set_response_status(status);
                write_response(
                    session,
                    error_response(status, &error),
                    Some(NO_CACHE_CONTROL),
                )
                .await?;
                Ok(true)
            }
        }
    }

    /// The origin image store; one peer for every request
    async fn upstream_peer(
        &self,
        _session: &mut Session,
        _ctx: &mut Self::CTX,
    ) -> Result<Box<HttpPeer>> {
        let origin = self.handler.origin();
        let peer = Box::new(HttpPeer::new(
            (origin.host.clone(), origin.port),
            origin.tls,
            origin.host.clone(),
        ));
        Ok(peer)
    }

    /// Point the request at the origin path and attach the transform options
    async fn upstream_request_filter(
        &self,
        _session: &mut Session,
        upstream_request: &mut RequestHeader,
        ctx: &mut Self::CTX,
    ) -> Result<()> {
        let origin_request = ctx
            .origin_request()
            .ok_or_else(|| Self::internal_error("No origin request in context"))?;

        let uri = origin_request
            .path
            .parse::<http::Uri>()
            .map_err(|_| Self::internal_error("Invalid origin path"))?;
        upstream_request.set_uri(uri);
        upstream_request.insert_header("Host", self.handler.origin().host_header())?;

        let options = origin_request
            .options_json()
            .map_err(|_| Self::internal_error("Failed to serialize transform options"))?;
        upstream_request.insert_header(self.config.edge.options_header.clone(), options)?;

        Ok(())
    }

    /// Decorate the origin response: long-lived caching on success, a generic
    /// uncached 400 otherwise
    fn upstream_response_filter(
        &self,
        _session: &mut Session,
        upstream_response: &mut ResponseHeader,
        ctx: &mut Self::CTX,
    ) -> Result<()> {
        let upstream_status = upstream_response.status.as_u16();
        ctx.set_upstream_status(upstream_status);
        let decoration = Decoration::for_status(upstream_status);

        if ctx.replaces_body() {
            self.metrics.increment_upstream_failure();
            tracing::warn!(
                request_id = %ctx.request_id(),
                upstream_status = upstream_status,
                "Origin returned a non-OK response"
            );
            upstream_response.set_status(decoration.status(upstream_status))?;
        }

        for name in decoration.stripped_headers() {
            upstream_response.remove_header(*name);
        }
        for (name, value) in decoration.headers() {
            upstream_response.insert_header(name, value)?;
        }
        upstream_response.insert_header("X-Request-ID", ctx.request_id())?;

        Ok(())
    }

    /// Swap a failed origin body for the generic message
    fn response_body_filter(
        &self,
        _session: &mut Session,
        body: &mut Option<Bytes>,
        end_of_stream: bool,
        ctx: &mut Self::CTX,
    ) -> Result<Option<Duration>> {
        if ctx.replaces_body() {
            replace_failed_body(body, end_of_stream);
        }
        Ok(None)
    }

    /// Log request completion and record metrics
    async fn logging(
        &self,
        session: &mut Session,
        e: Option<&pingora_core::Error>,
        ctx: &mut Self::CTX,
    ) {
        let status_code = session
            .response_written()
            .map(|resp| resp.status.as_u16())
            .or(ctx.response_status())
            .unwrap_or(500);
        let duration = ctx.elapsed();

        self.metrics.increment_status_count(status_code);
        self.metrics.record_duration(duration);
        self.metrics.decrement_active_requests();

        if let Some(error) = e {
            tracing::error!(
                request_id = %ctx.request_id(),
                path = %ctx.path(),
                error = %error,
                "Proxy error"
            );
        }

        tracing::info!(
            request_id = %ctx.request_id(),
            client_ip = %get_client_ip(session),
            method = %ctx.method(),
            path = %ctx.path(),
            status_code = status_code,
            upstream_status = ctx.upstream_status(),
            duration_ms = duration.as_secs_f64() * 1000.0,
            "Request completed"
        );
    }
}
