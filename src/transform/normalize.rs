//! Parameter normalization
//!
//! Maps the canonical transform vocabulary onto a provider vocabulary:
//! `mode` becomes `fit`, `position` becomes `gravity` (or an `fp-x`/`fp-y`
//! pair), keys the provider does not know are dropped, and raw string values
//! are coerced to the type each key is declared with.

use serde_json::{Map, Number, Value};

use super::descriptor::{Asset, Mode, TransformDescriptor};
use super::position::position_to_gravity;

/// Ordered provider parameter map; iteration follows insertion order
pub type ParamMap = Map<String, Value>;

/// Keys understood by Cloudflare image resizing
pub const CLOUDFLARE_PARAMS: &[&str] = &[
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
    "onerror",
    "quality",
    "rotate",
    "sharpen",
    "trim",
    "width",
];

/// How a provider wants the crop anchor expressed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionEncoding {
    /// `gravity={x}x{y}`
    Gravity,
    /// `fp-x={x}&fp-y={y}`
    FocalPointPair,
}

/// A provider's recognised keys plus its anchor encoding
#[derive(Debug, Clone, Copy)]
pub struct Vocabulary {
    pub keys: &'static [&'static str],
    pub position: PositionEncoding,
}

impl Vocabulary {
    /// Cloudflare `/cdn-cgi/image/` URL format
    pub const CLOUDFLARE: Vocabulary = Vocabulary {
        keys: CLOUDFLARE_PARAMS,
        position: PositionEncoding::Gravity,
    };

    /// Query string consumed by the edge worker
    pub const CLOUDFLARE_WORKER: Vocabulary = Vocabulary {
        keys: CLOUDFLARE_PARAMS,
        position: PositionEncoding::FocalPointPair,
    };

    pub fn recognises(&self, key: &str) -> bool {
        self.keys.contains(&key)
    }
}

/// Declared type of a provider parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Int,
    Float,
    Bool,
    Str,
}

/// Declared type for a provider key; unknown keys are strings
pub fn param_type(key: &str) -> ParamType {
    match key {
        "width" | "height" | "quality" | "rotate" => ParamType::Int,
        "blur" | "brightness" | "contrast" | "dpr" | "gamma" | "sharpen" | "fp-x" | "fp-y" => {
            ParamType::Float
        }
        "anim" => ParamType::Bool,
        _ => ParamType::Str,
    }
}

/// Coerce a raw string value by the key's declared type
///
/// Returns `None` when the value does not parse, so callers can drop it.
pub fn coerce_param(key: &str, raw: &str) -> Option<Value> {
    let raw = raw.trim();
    match param_type(key) {
        ParamType::Int => raw.parse::<i64>().ok().map(Value::from),
        ParamType::Float => raw
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number),
        ParamType::Bool => to_boolean(raw).map(Value::Bool),
        ParamType::Str => Some(Value::String(raw.to_string())),
    }
}

/// Lenient boolean parsing for query parameters
pub fn to_boolean(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "yes" | "y" | "1" => Some(true),
        "false" | "no" | "n" | "0" => Some(false),
        _ => None,
    }
}

/// Map a canonical resize mode to Cloudflare's `fit`
///
/// Cloudflare never changes the aspect ratio, so `stretch` degrades to
/// `cover`.
pub fn normalize_mode(mode: &Mode) -> String {
    match mode {
        Mode::Fit => "contain".to_string(),
        Mode::Crop | Mode::Stretch => "cover".to_string(),
        Mode::Other(value) => value.clone(),
    }
}

/// Render a parameter value the way URL grammars expect it
pub fn param_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Number(number) if number.is_f64() => number
            .as_f64()
            .map(|v| v.to_string())
            .unwrap_or_else(|| number.to_string()),
        other => other.to_string(),
    }
}

fn float(value: f64) -> Option<Value> {
    Number::from_f64(value).map(Value::Number)
}

/// Translate a descriptor into a provider parameter map
///
/// Keys are emitted in a fixed order (size, quality, fit, anchor, then the
/// rest alphabetically) and only when the vocabulary recognises them.
pub fn normalize(descriptor: &TransformDescriptor, asset: &Asset, vocabulary: &Vocabulary) -> ParamMap {
    let mut candidates: Vec<(&str, Option<Value>)> = Vec::with_capacity(24);

    let anchor = descriptor.effective_focal_point(asset);
    if vocabulary.position == PositionEncoding::FocalPointPair {
        candidates.push(("fp-x", float(anchor.x)));
        candidates.push(("fp-y", float(anchor.y)));
    }

    candidates.push(("width", descriptor.width.map(Value::from)));
    candidates.push(("height", descriptor.height.map(Value::from)));
    candidates.push(("quality", descriptor.quality.map(Value::from)));
    candidates.push((
        "fit",
        descriptor
            .mode
            .as_ref()
            .map(|mode| Value::String(normalize_mode(mode))),
    ));
    if vocabulary.position == PositionEncoding::Gravity {
        candidates.push((
            "gravity",
            Some(Value::String(position_to_gravity(&anchor))),
        ));
    }
    candidates.push((
        "format",
        descriptor
            .format
            .map(|format| Value::String(format.as_str().to_string())),
    ));
    candidates.push(("anim", descriptor.anim.map(Value::Bool)));
    candidates.push(("background", descriptor.background.clone().map(Value::String)));
    candidates.push(("blur", descriptor.blur.and_then(float)));
    candidates.push(("brightness", descriptor.brightness.and_then(float)));
    candidates.push(("compression", descriptor.compression.clone().map(Value::String)));
    candidates.push(("contrast", descriptor.contrast.and_then(float)));
    candidates.push(("dpr", descriptor.dpr.and_then(float)));
    candidates.push(("gamma", descriptor.gamma.and_then(float)));
    candidates.push(("metadata", descriptor.metadata.clone().map(Value::String)));
    candidates.push(("onerror", descriptor.onerror.clone().map(Value::String)));
    candidates.push(("rotate", descriptor.rotate.map(Value::from)));
    candidates.push(("sharpen", descriptor.sharpen.and_then(float)));
    candidates.push(("trim", descriptor.trim.clone().map(Value::String)));

    let mut params = ParamMap::new();
    for (key, value) in candidates {
        let recognised = vocabulary.recognises(key)
            || (vocabulary.position == PositionEncoding::FocalPointPair
                && (key == "fp-x" || key == "fp-y"));
        if let (true, Some(value)) = (recognised, value) {
            params.insert(key.to_string(), value);
        }
    }
    params
}

/// Apply precedence: defaults, then transform params, then enforced params
///
/// Later maps override earlier keys; an overridden key keeps the position it
/// had when first inserted.
pub fn merge_params(defaults: &ParamMap, normalized: ParamMap, enforced: &ParamMap) -> ParamMap {
    let mut merged = defaults.clone();
    for (key, value) in normalized {
        merged.insert(key, value);
    }
    for (key, value) in enforced {
        merged.insert(key.clone(), value.clone());
    }
    merged
}
