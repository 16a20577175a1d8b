//! Crop anchor encodings
//!
//! The nine named anchors map onto fixed points of the unit square. Providers
//! then want that point in their own grammar:
//!
//! - Cloudflare: `gravity={x}x{y}`
//! - Cloudflare Worker: an `fp-x` / `fp-y` pair
//! - Sharp: a 3x3 cluster such as `left top`, or nothing for the exact center

use super::descriptor::{FocalPoint, NamedPosition};

/// Below this an axis clusters to the near edge (left / top)
const NEAR_EDGE: f64 = 0.33;
/// Above this an axis clusters to the far edge (right / bottom)
const FAR_EDGE: f64 = 0.67;

/// Fixed unit-square coordinates of a named anchor
pub fn named_focal_point(named: NamedPosition) -> FocalPoint {
    let (x, y) = match named {
        NamedPosition::TopLeft => (0.0, 0.0),
        NamedPosition::TopCenter => (0.5, 0.0),
        NamedPosition::TopRight => (1.0, 0.0),
        NamedPosition::CenterLeft => (0.0, 0.5),
        NamedPosition::CenterCenter => (0.5, 0.5),
        NamedPosition::CenterRight => (1.0, 0.5),
        NamedPosition::BottomLeft => (0.0, 1.0),
        NamedPosition::BottomCenter => (0.5, 1.0),
        NamedPosition::BottomRight => (1.0, 1.0),
    };
    FocalPoint { x, y }
}

/// Unit-square coordinates for an anchor name, `center-center` when unknown
pub fn focal_point_for_name(name: &str) -> FocalPoint {
    named_focal_point(NamedPosition::from_name(name))
}

/// Cloudflare URL-format gravity, e.g. `0.5x0.5`
pub fn position_to_gravity(point: &FocalPoint) -> String {
    format!("{}x{}", point.x, point.y)
}

/// Sharp `resize.position` for a focal point
///
/// Returns `None` for the exact center so no override is sent.
pub fn position_to_aws_position(point: &FocalPoint) -> Option<String> {
    let horizontal = if point.x < NEAR_EDGE {
        Some("left")
    } else if point.x > FAR_EDGE {
        Some("right")
    } else {
        None
    };
    let vertical = if point.y < NEAR_EDGE {
        Some("top")
    } else if point.y > FAR_EDGE {
        Some("bottom")
    } else {
        None
    };

    let parts: Vec<&str> = [horizontal, vertical].into_iter().flatten().collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("top-left", "0x0", Some("left top"))]
    #[case("top-center", "0.5x0", Some("top"))]
    #[case("top-right", "1x0", Some("right top"))]
    #[case("center-left", "0x0.5", Some("left"))]
    #[case("center-center", "0.5x0.5", None)]
    #[case("center-right", "1x0.5", Some("right"))]
    #[case("bottom-left", "0x1", Some("left bottom"))]
    #[case("bottom-center", "0.5x1", Some("bottom"))]
    #[case("bottom-right", "1x1", Some("right bottom"))]
    fn test_named_position_table(
        #[case] name: &str,
        #[case] gravity: &str,
        #[case] aws: Option<&str>,
    ) {
        let point = focal_point_for_name(name);
        assert_eq!(position_to_gravity(&point), gravity);
        assert_eq!(position_to_aws_position(&point).as_deref(), aws);
    }

    #[test]
    fn test_unknown_name_uses_center() {
        let point = focal_point_for_name("somewhere");
        assert_eq!(point, FocalPoint::CENTER);
        assert_eq!(position_to_gravity(&point), "0.5x0.5");
        assert_eq!(position_to_aws_position(&point), None);
    }

    #[test]
    fn test_gravity_keeps_native_float_formatting() {
        let point = FocalPoint::new(0.25, 0.125);
        assert_eq!(position_to_gravity(&point), "0.25x0.125");
    }

    #[test]
    fn test_aws_position_cluster_boundaries() {
        assert_eq!(
            position_to_aws_position(&FocalPoint::new(0.33, 0.67)),
            None
        );
        assert_eq!(
            position_to_aws_position(&FocalPoint::new(0.32, 0.68)).as_deref(),
            Some("left bottom")
        );
        assert_eq!(
            position_to_aws_position(&FocalPoint::new(0.9, 0.5)).as_deref(),
            Some("right")
        );
    }
}
