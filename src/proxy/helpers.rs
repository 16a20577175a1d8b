//! Proxy utility functions.
//!
//! - Client IP detection (X-Forwarded-For aware)
//! - Writing locally generated responses to the session
//! - Error response bodies

use pingora_core::Result;
use pingora_http::ResponseHeader;
use pingora_proxy::Session;

use super::special_endpoints::EndpointResponse;
use crate::error::TransformError;

/// Extract client IP address from session (X-Forwarded-For aware).
///
/// The header can contain multiple IPs: `"client, proxy1, proxy2"`.
/// The first IP is the original client, which is what we return.
pub fn get_client_ip(session: &Session) -> String {
    if let Some(forwarded_for) = session
        .req_header()
        .headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
    {
        if let Some(client_ip) = forwarded_for.split(',').next() {
            return client_ip.trim().to_string();
        }
    }

    session
        .client_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// JSON body for a rejected request
pub fn error_body(status: u16, error: &TransformError) -> String {
    serde_json::json!({
        "error": error.to_string(),
        "status": status
    })
    .to_string()
}

/// Error responses are never cached
pub fn error_response(status: u16, error: &TransformError) -> EndpointResponse {
    EndpointResponse::json(status, error_body(status, error))
}

/// Write a complete response and finish the session
pub async fn write_response(
    session: &mut Session,
    response: EndpointResponse,
    cache_control: Option<&str>,
) -> Result<()> {
    let mut header = ResponseHeader::build(response.status, None)?;
    header.insert_header("Content-Type", response.content_type)?;
    header.insert_header("Content-Length", response.body.len().to_string())?;
    if let Some(cache_control) = cache_control {
        header.insert_header("Cache-Control", cache_control)?;
    }

    session
        .write_response_header(Box::new(header), false)
        .await?;
    session
        .write_response_body(Some(response.body.into()), true)
        .await?;
    Ok(())
}
