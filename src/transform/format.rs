//! Output format negotiation based on the Accept header
//!
//! Only formats that beat the source on compression are negotiated, and the
//! most compressed one wins regardless of the order or q-values the client
//! lists them in: AVIF before WebP.

use super::descriptor::OutputFormat;

/// Formats negotiated from Accept, most compressed first
const NEGOTIABLE: [OutputFormat; 2] = [OutputFormat::Avif, OutputFormat::Webp];

/// Parsed Accept header entry
#[derive(Debug, Clone)]
struct MediaPreference {
    media_type: String,
    quality: f32,
}

/// Pick the best modern format the client accepts, if any
pub fn negotiate_format(accept_header: Option<&str>) -> Option<OutputFormat> {
    let accept = accept_header?;
    let preferences = parse_accept_header(accept);

    NEGOTIABLE.into_iter().find(|format| {
        let media_type = format!("image/{}", format.as_str());
        preferences
            .iter()
            .any(|pref| pref.media_type == media_type && pref.quality > 0.0)
    })
}

/// Resolve the format a transform should request
///
/// Absent or `auto` formats are negotiated; when negotiation finds nothing the
/// configured value is kept. Explicit formats are never overridden.
pub fn resolve_format(configured: Option<OutputFormat>, accept_header: Option<&str>) -> Option<OutputFormat> {
    match configured {
        None | Some(OutputFormat::Auto) => negotiate_format(accept_header).or(configured),
        explicit => explicit,
    }
}

fn parse_accept_header(accept: &str) -> Vec<MediaPreference> {
    accept
        .split(',')
        .filter_map(|part| {
            let part = part.trim();
            if part.is_empty() {
                return None;
            }
            let (media_type, quality) = match part.split_once(';') {
                Some((media_type, params)) => (media_type.trim(), parse_quality(params)),
                None => (part, 1.0),
            };
            Some(MediaPreference {
                media_type: media_type.to_lowercase(),
                quality,
            })
        })
        .collect()
}

/// Parse the q-value from media type parameters (e.g. "q=0.8")
fn parse_quality(params: &str) -> f32 {
    for param in params.split(';') {
        if let Some(q) = param.trim().strip_prefix("q=") {
            if let Ok(quality) = q.trim().parse::<f32>() {
                return quality.clamp(0.0, 1.0);
            }
        }
    }
    1.0
}

/// Vary header value for negotiated responses
pub fn vary_header() -> &'static str {
    "Accept"
}
