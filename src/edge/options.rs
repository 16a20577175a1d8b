//! Provider option map built from an inbound query string
//!
//! Only recognised keys are copied, each coerced to its declared type. The
//! `fp-x` / `fp-y` pair turns into an explicit gravity point, which is only
//! allowed while gravity is still `auto`.

use std::collections::HashMap;

use serde_json::{json, Value};

use crate::error::TransformError;
use crate::transform::{coerce_param, resolve_format, OutputFormat, ParamMap, DEFAULT_QUALITY};

/// Keys copied from the query string, in output order (no trim or border)
pub const EDGE_PARAMS: &[&str] = &[
    "anim",
    "background",
    "blur",
    "brightness",
    "compression",
    "contrast",
    "dpr",
    "fit",
    "format",
    "gamma",
    "gravity",
    "height",
    "metadata",
    "quality",
    "rotate",
    "sharpen",
    "width",
];

pub const FOCAL_X_PARAM: &str = "fp-x";
pub const FOCAL_Y_PARAM: &str = "fp-y";
pub const AUTO_GRAVITY: &str = "auto";

/// Value a key starts from before the query is applied
fn default_value(key: &str) -> Option<Value> {
    match key {
        "anim" => Some(Value::Bool(false)),
        "fit" => Some(Value::from("crop")),
        "gravity" => Some(Value::from(AUTO_GRAVITY)),
        "quality" => Some(Value::from(DEFAULT_QUALITY)),
        _ => None,
    }
}

/// Decode a raw query into its first value per key
///
/// `+` is treated as a space, as browsers encode forms.
pub fn parse_query(query: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();
    for pair in query.split('&').filter(|pair| !pair.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let decode = |s: &str| {
            let s = s.replace('+', " ");
            urlencoding::decode(&s)
                .map(|decoded| decoded.into_owned())
                .unwrap_or(s)
        };
        params.entry(decode(key)).or_insert_with(|| decode(value));
    }
    params
}

/// Build the provider option map for a verified query
pub fn build_options(
    query: &HashMap<String, String>,
    accept: Option<&str>,
) -> Result<ParamMap, TransformError> {
    let mut options = ParamMap::new();
    for key in EDGE_PARAMS {
        let from_query = query
            .get(*key)
            .filter(|raw| !raw.trim().is_empty())
            .and_then(|raw| coerce_param(key, raw));
        if let Some(value) = from_query.or_else(|| default_value(key)) {
            options.insert(key.to_string(), value);
        }
    }

    if let Some(point) = focal_point(query)? {
        let gravity_is_auto = options
            .get("gravity")
            .and_then(Value::as_str)
            .map(|gravity| gravity == AUTO_GRAVITY)
            .unwrap_or(false);
        if !gravity_is_auto {
            return Err(TransformError::ConflictingFocalPointGravity);
        }
        options.insert("gravity".to_string(), point);
    }

    negotiate(&mut options, accept);
    Ok(options)
}

/// The `{x, y}` gravity requested through `fp-x` / `fp-y`, if both are set
fn focal_point(query: &HashMap<String, String>) -> Result<Option<Value>, TransformError> {
    let (Some(x), Some(y)) = (
        query.get(FOCAL_X_PARAM).filter(|v| !v.trim().is_empty()),
        query.get(FOCAL_Y_PARAM).filter(|v| !v.trim().is_empty()),
    ) else {
        return Ok(None);
    };

    let parse = |param: &str, raw: &str| {
        raw.trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| TransformError::invalid_param(param, "must be a number"))
    };
    let x = parse(FOCAL_X_PARAM, x)?;
    let y = parse(FOCAL_Y_PARAM, y)?;
    Ok(Some(json!({ "x": x, "y": y })))
}

/// Pick avif/webp from Accept when the format is absent or `auto`
fn negotiate(options: &mut ParamMap, accept: Option<&str>) {
    let configured = match options.get("format").and_then(Value::as_str) {
        None => None,
        Some(raw) => match OutputFormat::parse(raw) {
            Some(OutputFormat::Auto) => Some(OutputFormat::Auto),
            _ => return,
        },
    };

    if let Some(format) = resolve_format(configured, accept) {
        options.insert("format".to_string(), Value::from(format.as_str()));
    }
}
