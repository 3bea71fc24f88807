//! Discrete, selectable whiteboard elements.

use crate::style::ElementStyle;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use kurbo::{Affine, BezPath, Ellipse, Point, Rect, RoundedRect, Shape as KurboShape, Size, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for elements.
pub type ElementId = Uuid;

/// Smallest width/height an element may have.
pub const MIN_ELEMENT_SIZE: f64 = 1.0;

/// The fixed set of element kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ElementKind {
    Text,
    Rectangle,
    Circle,
    Triangle,
    Arrow,
    StickyNote,
    Image,
}

impl ElementKind {
    pub const ALL: [ElementKind; 7] = [
        ElementKind::Text,
        ElementKind::Rectangle,
        ElementKind::Circle,
        ElementKind::Triangle,
        ElementKind::Arrow,
        ElementKind::StickyNote,
        ElementKind::Image,
    ];

    /// Size given to a freshly placed element of this kind.
    pub fn default_size(self) -> Size {
        match self {
            ElementKind::Text => Size::new(200.0, 50.0),
            ElementKind::StickyNote => Size::new(150.0, 150.0),
            ElementKind::Rectangle
            | ElementKind::Circle
            | ElementKind::Triangle
            | ElementKind::Arrow
            | ElementKind::Image => Size::new(100.0, 100.0),
        }
    }

    /// Placeholder content for a freshly placed element of this kind.
    pub fn default_content(self) -> &'static str {
        match self {
            ElementKind::Text => "Double-click to edit",
            ElementKind::StickyNote => "New note",
            ElementKind::Rectangle
            | ElementKind::Circle
            | ElementKind::Triangle
            | ElementKind::Arrow
            | ElementKind::Image => "",
        }
    }

    /// Whether `content` is shown and editable for this kind.
    pub fn carries_text(self) -> bool {
        match self {
            ElementKind::Text | ElementKind::StickyNote => true,
            ElementKind::Rectangle
            | ElementKind::Circle
            | ElementKind::Triangle
            | ElementKind::Arrow
            | ElementKind::Image => false,
        }
    }

    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            ElementKind::Text => "Text",
            ElementKind::Rectangle => "Rectangle",
            ElementKind::Circle => "Circle",
            ElementKind::Triangle => "Triangle",
            ElementKind::Arrow => "Arrow",
            ElementKind::StickyNote => "Sticky note",
            ElementKind::Image => "Image",
        }
    }
}

/// Image format for embedded image data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFormat {
    Png,
    Jpeg,
    WebP,
}

impl ImageFormat {
    /// Get MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::WebP => "image/webp",
        }
    }

    /// Detect format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Some(ImageFormat::Png);
        }
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(ImageFormat::Jpeg);
        }
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Some(ImageFormat::WebP);
        }
        None
    }
}

/// Raster payload of an image element, stored base64-encoded so documents
/// stay plain JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedImage {
    pub format: ImageFormat,
    /// Original image width in pixels.
    pub source_width: u32,
    /// Original image height in pixels.
    pub source_height: u32,
    /// Base64-encoded file bytes.
    pub data: String,
}

impl EmbeddedImage {
    /// Wrap encoded image bytes. Returns `None` if the format is not recognized.
    pub fn from_bytes(bytes: &[u8], source_width: u32, source_height: u32) -> Option<Self> {
        let format = ImageFormat::from_magic_bytes(bytes)?;
        Some(Self {
            format,
            source_width,
            source_height,
            data: BASE64.encode(bytes),
        })
    }

    /// Decode the stored file bytes.
    pub fn bytes(&self) -> Result<Vec<u8>, base64::DecodeError> {
        BASE64.decode(&self.data)
    }
}

/// A discrete, independently selectable whiteboard object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub(crate) id: ElementId,
    pub kind: ElementKind,
    /// Top-left corner in document coordinates.
    pub position: Point,
    pub(crate) size: Size,
    /// Plain text content (text and sticky notes).
    #[serde(default)]
    pub content: String,
    pub style: ElementStyle,
    /// Rotation in degrees around the element's centre.
    #[serde(default)]
    pub rotation: f64,
    /// Paint-order tiebreak; higher paints later.
    #[serde(default)]
    pub z_index: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<EmbeddedImage>,
}

impl Element {
    /// Create an element of `kind` at `position` with the kind's default size
    /// and placeholder content.
    pub fn new(kind: ElementKind, position: Point, style: ElementStyle) -> Self {
        let mut element = Self {
            id: Uuid::new_v4(),
            kind,
            position,
            size: kind.default_size(),
            content: kind.default_content().to_string(),
            style,
            rotation: 0.0,
            z_index: 0,
            image: None,
        };
        element.style.sanitize();
        element
    }

    /// Create an image element showing `image` at its source size.
    pub fn image(position: Point, image: EmbeddedImage, style: ElementStyle) -> Self {
        let mut element = Self::new(ElementKind::Image, position, style);
        element.set_size(Size::new(image.source_width as f64, image.source_height as f64));
        element.image = Some(image);
        element
    }

    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn size(&self) -> Size {
        self.size
    }

    /// Set the size, clamping each side to at least [`MIN_ELEMENT_SIZE`].
    pub fn set_size(&mut self, size: Size) {
        self.size = clamp_size(size);
    }

    /// Axis-aligned bounding box in document coordinates (rotation ignored).
    pub fn bounds(&self) -> Rect {
        Rect::from_origin_size(self.position, self.size)
    }

    pub fn center(&self) -> Point {
        self.bounds().center()
    }

    /// Point containment against the unrotated bounding box, edges inclusive.
    ///
    /// Rotation is deliberately not accounted for.
    pub fn contains(&self, point: Point) -> bool {
        let b = self.bounds();
        point.x >= b.x0 && point.x <= b.x1 && point.y >= b.y0 && point.y <= b.y1
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.position += delta;
    }

    /// Transform from element-local space (origin at the top-left corner) to
    /// document space, including rotation about the centre.
    pub fn local_transform(&self) -> Affine {
        let center = Point::new(self.size.width / 2.0, self.size.height / 2.0);
        Affine::translate(self.position.to_vec2())
            * Affine::rotate_about(self.rotation.to_radians(), center)
    }

    /// Outline of the element in local coordinates.
    pub fn local_path(&self) -> BezPath {
        let (w, h) = (self.size.width, self.size.height);
        let rect = Rect::new(0.0, 0.0, w, h);
        match self.kind {
            ElementKind::Text | ElementKind::Rectangle | ElementKind::Image => rect.to_path(0.1),
            ElementKind::StickyNote => {
                let radius = (w.min(h) * 0.05).min(6.0);
                RoundedRect::from_rect(rect, radius).to_path(0.1)
            }
            ElementKind::Circle => Ellipse::from_rect(rect).to_path(0.1),
            ElementKind::Triangle => {
                let mut path = BezPath::new();
                path.move_to(Point::new(w / 2.0, 0.0));
                path.line_to(Point::new(w, h));
                path.line_to(Point::new(0.0, h));
                path.close_path();
                path
            }
            ElementKind::Arrow => {
                let mid = h / 2.0;
                let head = (w * 0.3).min(24.0).min(h.max(MIN_ELEMENT_SIZE));
                let mut path = BezPath::new();
                path.move_to(Point::new(0.0, mid));
                path.line_to(Point::new(w, mid));
                path.move_to(Point::new(w - head, mid - head / 2.0));
                path.line_to(Point::new(w, mid));
                path.line_to(Point::new(w - head, mid + head / 2.0));
                path
            }
        }
    }

    /// Whether the outline is a closed region that can take a fill.
    pub fn is_fillable(&self) -> bool {
        match self.kind {
            ElementKind::Arrow | ElementKind::Image => false,
            ElementKind::Text
            | ElementKind::Rectangle
            | ElementKind::Circle
            | ElementKind::Triangle
            | ElementKind::StickyNote => true,
        }
    }

    /// Merge the `Some` fields of `patch` into this element.
    pub fn apply(&mut self, patch: ElementPatch) {
        if let Some(position) = patch.position {
            if position.x.is_finite() && position.y.is_finite() {
                self.position = position;
            }
        }
        if let Some(size) = patch.size {
            self.set_size(size);
        }
        if let Some(content) = patch.content {
            self.content = content;
        }
        if let Some(mut style) = patch.style {
            style.sanitize();
            self.style = style;
        }
        if let Some(rotation) = patch.rotation {
            if rotation.is_finite() {
                self.rotation = rotation;
            }
        }
        if let Some(z_index) = patch.z_index {
            self.z_index = z_index;
        }
    }
}

fn clamp_size(size: Size) -> Size {
    let side = |v: f64| if v.is_finite() { v.max(MIN_ELEMENT_SIZE) } else { MIN_ELEMENT_SIZE };
    Size::new(side(size.width), side(size.height))
}

/// A partial update to an element. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementPatch {
    pub position: Option<Point>,
    pub size: Option<Size>,
    pub content: Option<String>,
    pub style: Option<ElementStyle>,
    pub rotation: Option<f64>,
    pub z_index: Option<i64>,
}

impl ElementPatch {
    pub fn position(mut self, position: Point) -> Self {
        self.position = Some(position);
        self
    }

    pub fn size(mut self, width: f64, height: f64) -> Self {
        self.size = Some(Size::new(width, height));
        self
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn style(mut self, style: ElementStyle) -> Self {
        self.style = Some(style);
        self
    }

    pub fn rotation(mut self, degrees: f64) -> Self {
        self.rotation = Some(degrees);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
