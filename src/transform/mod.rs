//! Canonical transform model and the normalization layer
//!
//! Everything here is a pure function of its inputs and safe to share across
//! requests without locking.

pub mod descriptor;
pub mod format;
pub mod normalize;
pub mod position;

pub use descriptor::{
    collapse_slashes, Asset, Filesystem, FocalPoint, Interlace, Mode, NamedPosition,
    OutputFormat, Position, TransformDescriptor, DEFAULT_QUALITY,
};
pub use format::{negotiate_format, resolve_format, vary_header};
pub use normalize::{
    coerce_param, merge_params, normalize, normalize_mode, param_to_string, ParamMap,
    PositionEncoding, Vocabulary, CLOUDFLARE_PARAMS,
};
pub use position::{
    focal_point_for_name, named_focal_point, position_to_aws_position, position_to_gravity,
};
