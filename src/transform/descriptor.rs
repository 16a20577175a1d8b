//! Canonical, provider-agnostic transform model
//!
//! A [`TransformDescriptor`] says what edit is wanted; an [`Asset`] says where
//! the source image lives. Both are built per request and never mutated after
//! construction.

use serde::{Deserialize, Serialize};

/// Default output quality when a transform does not set one
pub const DEFAULT_QUALITY: u8 = 80;

/// Resize mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Mode {
    Crop,
    Fit,
    Stretch,
    /// Provider-specific mode passed through untouched
    Other(String),
}

impl Mode {
    pub fn as_str(&self) -> &str {
        match self {
            Mode::Crop => "crop",
            Mode::Fit => "fit",
            Mode::Stretch => "stretch",
            Mode::Other(value) => value,
        }
    }
}

impl From<&str> for Mode {
    fn from(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "crop" => Mode::Crop,
            "fit" => Mode::Fit,
            "stretch" => Mode::Stretch,
            _ => Mode::Other(value.to_string()),
        }
    }
}

impl From<String> for Mode {
    fn from(value: String) -> Self {
        Mode::from(value.as_str())
    }
}

impl From<Mode> for String {
    fn from(mode: Mode) -> Self {
        mode.as_str().to_string()
    }
}

/// Point in the unit square used as the crop anchor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FocalPoint {
    pub x: f64,
    pub y: f64,
}

impl FocalPoint {
    pub const CENTER: FocalPoint = FocalPoint { x: 0.5, y: 0.5 };

    /// Create a focal point, clamping both axes into `[0, 1]`
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x: x.clamp(0.0, 1.0),
            y: y.clamp(0.0, 1.0),
        }
    }
}

/// The nine symbolic crop anchors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NamedPosition {
    TopLeft,
    TopCenter,
    TopRight,
    CenterLeft,
    #[default]
    CenterCenter,
    CenterRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

impl NamedPosition {
    pub const ALL: [NamedPosition; 9] = [
        NamedPosition::TopLeft,
        NamedPosition::TopCenter,
        NamedPosition::TopRight,
        NamedPosition::CenterLeft,
        NamedPosition::CenterCenter,
        NamedPosition::CenterRight,
        NamedPosition::BottomLeft,
        NamedPosition::BottomCenter,
        NamedPosition::BottomRight,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NamedPosition::TopLeft => "top-left",
            NamedPosition::TopCenter => "top-center",
            NamedPosition::TopRight => "top-right",
            NamedPosition::CenterLeft => "center-left",
            NamedPosition::CenterCenter => "center-center",
            NamedPosition::CenterRight => "center-right",
            NamedPosition::BottomLeft => "bottom-left",
            NamedPosition::BottomCenter => "bottom-center",
            NamedPosition::BottomRight => "bottom-right",
        }
    }

    /// Look up an anchor by name, `None` for unknown names
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim().to_lowercase();
        Self::ALL.into_iter().find(|p| p.as_str() == name)
    }

    /// Look up an anchor by name, falling back to `center-center`
    pub fn from_name(name: &str) -> Self {
        Self::parse(name).unwrap_or_default()
    }
}

/// Crop anchor: a named anchor or an explicit focal point
#[derive(Debug, Clone, PartialEq)]
pub enum Position {
    Named(NamedPosition),
    Focal(FocalPoint),
}

impl From<NamedPosition> for Position {
    fn from(named: NamedPosition) -> Self {
        Position::Named(named)
    }
}

impl From<FocalPoint> for Position {
    fn from(point: FocalPoint) -> Self {
        Position::Focal(point)
    }
}

impl From<&str> for Position {
    fn from(name: &str) -> Self {
        Position::Named(NamedPosition::from_name(name))
    }
}

/// Interlacing requested for the output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interlace {
    None,
    Line,
    Plane,
    Partition,
}

/// Output image format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[serde(alias = "jpg")]
    Jpeg,
    Png,
    Gif,
    Webp,
    Avif,
    /// Negotiate from the Accept header
    Auto,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::Gif => "gif",
            Self::Webp => "webp",
            Self::Avif => "avif",
            Self::Auto => "auto",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "jpeg" | "jpg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "gif" => Some(Self::Gif),
            "webp" => Some(Self::Webp),
            "avif" => Some(Self::Avif),
            "auto" => Some(Self::Auto),
            _ => None,
        }
    }
}

/// Canonical transform attributes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransformDescriptor {
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// 0-100; adapters that need a value fall back to [`DEFAULT_QUALITY`]
    pub quality: Option<u8>,
    pub mode: Option<Mode>,
    pub position: Option<Position>,
    pub interlace: Option<Interlace>,
    /// `None` derives the format from the source or the Accept header
    pub format: Option<OutputFormat>,
    pub dpr: Option<f64>,
    pub blur: Option<f64>,
    pub brightness: Option<f64>,
    pub contrast: Option<f64>,
    pub gamma: Option<f64>,
    pub sharpen: Option<f64>,
    pub rotate: Option<i32>,
    pub background: Option<String>,
    pub anim: Option<bool>,
    pub metadata: Option<String>,
    pub compression: Option<String>,
    pub onerror: Option<String>,
    pub trim: Option<String>,
}

impl TransformDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }

    pub fn height(mut self, height: u32) -> Self {
        self.height = Some(height);
        self
    }

    pub fn quality(mut self, quality: u8) -> Self {
        self.quality = Some(quality.min(100));
        self
    }

    pub fn mode(mut self, mode: impl Into<Mode>) -> Self {
        self.mode = Some(mode.into());
        self
    }

    pub fn position(mut self, position: impl Into<Position>) -> Self {
        self.position = Some(position.into());
        self
    }

    pub fn format(mut self, format: OutputFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn interlace(mut self, interlace: Interlace) -> Self {
        self.interlace = Some(interlace);
        self
    }

    /// Resolve the crop anchor for this transform applied to `asset`
    ///
    /// An explicit focal point on the descriptor wins, then the asset's focal
    /// point, then the named position, then `center-center`.
    pub fn effective_focal_point(&self, asset: &Asset) -> FocalPoint {
        match (&self.position, asset.focal_point) {
            (Some(Position::Focal(point)), _) => *point,
            (_, Some(point)) => point,
            (Some(Position::Named(named)), None) => super::position::named_focal_point(*named),
            (None, None) => FocalPoint::CENTER,
        }
    }
}

/// Where an asset's bytes are stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Filesystem {
    S3 {
        bucket: String,
        #[serde(default)]
        subfolder: Option<String>,
    },
    Local {
        #[serde(default)]
        subfolder: Option<String>,
    },
}

impl Filesystem {
    pub fn subfolder(&self) -> Option<&str> {
        match self {
            Filesystem::S3 { subfolder, .. } | Filesystem::Local { subfolder } => {
                subfolder.as_deref()
            }
        }
    }
}

/// Source image reference
#[derive(Debug, Clone, PartialEq)]
pub struct Asset {
    /// Handle of the storage volume the asset belongs to
    pub volume: String,
    /// Path relative to the filesystem root (excluding subfolder)
    pub path: String,
    pub filesystem: Filesystem,
    pub focal_point: Option<FocalPoint>,
}

impl Asset {
    pub fn new(volume: impl Into<String>, path: impl Into<String>, filesystem: Filesystem) -> Self {
        Self {
            volume: volume.into(),
            path: path.into(),
            filesystem,
            focal_point: None,
        }
    }

    pub fn with_focal_point(mut self, point: FocalPoint) -> Self {
        self.focal_point = Some(point);
        self
    }

    /// Lowercased file extension, empty when the path has none
    pub fn extension(&self) -> String {
        let file_name = self.path.rsplit('/').next().unwrap_or_default();
        match file_name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => ext.to_lowercase(),
            _ => String::new(),
        }
    }

    /// Subfolder + path with duplicate slashes collapsed and no leading slash
    pub fn storage_key(&self) -> String {
        let joined = match self.filesystem.subfolder() {
            Some(folder) if !folder.is_empty() => format!("{}/{}", folder, self.path),
            _ => self.path.clone(),
        };
        collapse_slashes(&joined)
    }
}

/// Collapse runs of `/` into one and strip leading slashes
pub fn collapse_slashes(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut previous_slash = false;
    for c in s.chars() {
        if c == '/' {
            if !previous_slash {
                out.push(c);
            }
            previous_slash = true;
        } else {
            out.push(c);
            previous_slash = false;
        }
    }
    out.trim_start_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local(path: &str) -> Asset {
        Asset::new("uploads", path, Filesystem::Local { subfolder: None })
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!(Mode::from("crop"), Mode::Crop);
        assert_eq!(Mode::from("FIT"), Mode::Fit);
        assert_eq!(Mode::from("stretch"), Mode::Stretch);
        assert_eq!(Mode::from("pad"), Mode::Other("pad".to_string()));
        assert_eq!(Mode::from("pad").as_str(), "pad");
    }

    #[test]
    fn test_named_position_lookup() {
        assert_eq!(NamedPosition::parse("top-left"), Some(NamedPosition::TopLeft));
        assert_eq!(
            NamedPosition::parse(" Bottom-Right "),
            Some(NamedPosition::BottomRight)
        );
        assert_eq!(NamedPosition::parse("middle"), None);
        assert_eq!(NamedPosition::from_name("middle"), NamedPosition::CenterCenter);
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!(OutputFormat::parse("jpg"), Some(OutputFormat::Jpeg));
        assert_eq!(OutputFormat::parse("WEBP"), Some(OutputFormat::Webp));
        assert_eq!(OutputFormat::parse("auto"), Some(OutputFormat::Auto));
        assert_eq!(OutputFormat::parse("tga"), None);
    }

    #[test]
    fn test_focal_point_clamps() {
        let point = FocalPoint::new(-0.2, 1.4);
        assert_eq!(point, FocalPoint { x: 0.0, y: 1.0 });
    }

    #[test]
    fn test_descriptor_focal_point_beats_asset_and_named() {
        let asset = local("a.jpg").with_focal_point(FocalPoint::new(0.1, 0.1));
        let descriptor = TransformDescriptor::new().position(FocalPoint::new(0.9, 0.8));
        assert_eq!(
            descriptor.effective_focal_point(&asset),
            FocalPoint::new(0.9, 0.8)
        );
    }

    #[test]
    fn test_asset_focal_point_beats_named_position() {
        let asset = local("a.jpg").with_focal_point(FocalPoint::new(0.2, 0.3));
        let descriptor = TransformDescriptor::new().position(NamedPosition::BottomRight);
        assert_eq!(
            descriptor.effective_focal_point(&asset),
            FocalPoint::new(0.2, 0.3)
        );
    }

    #[test]
    fn test_anchor_defaults_to_center() {
        assert_eq!(
            TransformDescriptor::new().effective_focal_point(&local("a.jpg")),
            FocalPoint::CENTER
        );
    }

    #[test]
    fn test_asset_extension() {
        assert_eq!(local("photos/Cat.JPG").extension(), "jpg");
        assert_eq!(local("photos/archive.tar.gz").extension(), "gz");
        assert_eq!(local("photos/README").extension(), "");
        assert_eq!(local("photos/.hidden").extension(), "");
    }

    #[test]
    fn test_storage_key_collapses_slashes() {
        let asset = Asset::new(
            "uploads",
            "/b.jpg",
            Filesystem::Local {
                subfolder: Some("/a//".to_string()),
            },
        );
        assert_eq!(asset.storage_key(), "a/b.jpg");
        assert_eq!(local("//nested///c.png").storage_key(), "nested/c.png");
    }

    #[test]
    fn test_quality_is_capped() {
        assert_eq!(TransformDescriptor::new().quality(150).quality, Some(100));
    }
}
