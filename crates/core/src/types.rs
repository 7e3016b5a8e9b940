//! Domain types for representing a slide deck as the extraction pipeline sees it.
//!
//! Geometry is expressed in EMU (English Metric Units), the native length unit of
//! Office documents: 12700 EMU per point.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An entire deck with its slides in presentation order.
#[derive(Debug, Clone)]
pub struct Deck {
    /// Deck file base name (without extension).
    pub name: String,

    /// Slides in presentation order.
    pub slides: Vec<Slide>,
}

impl Deck {
    /// Create a new, empty deck.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slides: Vec::new(),
        }
    }

    /// Add a slide to the deck.
    pub fn add_slide(&mut self, slide: Slide) {
        self.slides.push(slide);
    }
}

/// The format of a deck file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeckFormat {
    /// Modern PPTX (Office Open XML).
    Pptx,
}

impl DeckFormat {
    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pptx" => Some(Self::Pptx),
            _ => None,
        }
    }

    /// Detect format from file magic bytes.
    pub fn from_magic(bytes: &[u8]) -> Option<Self> {
        // PPTX is a ZIP file (PK\x03\x04)
        if bytes.starts_with(&[0x50, 0x4B, 0x03, 0x04]) {
            return Some(Self::Pptx);
        }
        None
    }
}

/// A single slide: its shapes in document (z-) order.
#[derive(Debug, Clone)]
pub struct Slide {
    /// 1-based slide number, stable across the deck.
    pub index: usize,

    /// Shapes in enumeration order.
    pub shapes: Vec<Shape>,
}

impl Slide {
    /// Create a new slide with the given number.
    pub fn new(index: usize) -> Self {
        Self {
            index,
            shapes: Vec::new(),
        }
    }

    /// Add a shape to this slide.
    pub fn add_shape(&mut self, shape: Shape) {
        self.shapes.push(shape);
    }

    /// Picture shapes, in enumeration order.
    pub fn pictures(&self) -> impl Iterator<Item = &Shape> {
        self.shapes.iter().filter(|s| s.is_picture())
    }

    /// Shapes carrying non-empty (trimmed) text, in enumeration order.
    pub fn text_shapes(&self) -> impl Iterator<Item = &Shape> {
        self.shapes
            .iter()
            .filter(|s| s.text().is_some_and(|t| !t.trim().is_empty()))
    }
}

/// A shape on a slide with its bounding box.
#[derive(Debug, Clone)]
pub struct Shape {
    /// Shape id from the document (`cNvPr/@id`), 0 if unknown.
    pub id: u32,

    /// Shape name from the document (`cNvPr/@name`).
    pub name: String,

    /// Horizontal offset (EMU).
    pub left: i64,

    /// Vertical offset (EMU).
    pub top: i64,

    /// Width (EMU).
    pub width: i64,

    /// Height (EMU).
    pub height: i64,

    /// What the shape is.
    pub kind: ShapeKind,
}

impl Shape {
    /// Create a shape at the given position and size.
    pub fn new(kind: ShapeKind, left: i64, top: i64, width: i64, height: i64) -> Self {
        Self {
            id: 0,
            name: String::new(),
            left,
            top,
            width,
            height,
            kind,
        }
    }

    /// Set the document id and name.
    pub fn with_identity(mut self, id: u32, name: impl Into<String>) -> Self {
        self.id = id;
        self.name = name.into();
        self
    }

    pub fn is_picture(&self) -> bool {
        matches!(self.kind, ShapeKind::Picture { .. })
    }

    /// Text content, for text-capable shapes.
    pub fn text(&self) -> Option<&str> {
        match &self.kind {
            ShapeKind::Text { text } => Some(text),
            _ => None,
        }
    }

    /// Embedded image reference, for pictures.
    pub fn image(&self) -> Option<&ImageRef> {
        match &self.kind {
            ShapeKind::Picture { image } => Some(image),
            _ => None,
        }
    }
}

/// Shape kinds the pipeline dispatches on.
#[derive(Debug, Clone)]
pub enum ShapeKind {
    /// A picture with its embedded image.
    Picture { image: ImageRef },

    /// A text-capable shape (text box, placeholder, autoshape with a text body).
    Text { text: String },

    /// Anything else: connectors, groups, graphic frames.
    Other,
}

/// The image behind a picture shape.
#[derive(Debug, Clone)]
pub struct ImageRef {
    /// Declared media type, e.g. `image/jpeg`.
    pub media_type: String,

    /// Raw bytes, `None` when the referenced part could not be read.
    pub data: Option<Vec<u8>>,
}

impl ImageRef {
    pub fn new(media_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            media_type: media_type.into(),
            data: Some(data),
        }
    }

    /// An image whose payload is missing from the container.
    pub fn missing(media_type: impl Into<String>) -> Self {
        Self {
            media_type: media_type.into(),
            data: None,
        }
    }
}

/// The five named positions of the photo template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Slot {
    Main,
    Sub1,
    Sub2,
    Sub3,
    Sub4,
}

impl Slot {
    /// All slots in write order.
    pub const ALL: [Slot; 5] = [Slot::Main, Slot::Sub1, Slot::Sub2, Slot::Sub3, Slot::Sub4];

    /// Folder and filename suffix for this slot.
    pub fn as_str(&self) -> &'static str {
        match self {
            Slot::Main => "MAIN",
            Slot::Sub1 => "SUB1",
            Slot::Sub2 => "SUB2",
            Slot::Sub3 => "SUB3",
            Slot::Sub4 => "SUB4",
        }
    }

    fn position(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exactly one shape per slot.
///
/// Only the classifier builds these, and only from exactly five photographs.
#[derive(Debug, Clone, Copy)]
pub struct SlotAssignment<'a> {
    shapes: [&'a Shape; 5],
}

impl<'a> SlotAssignment<'a> {
    pub(crate) fn new(shapes: [&'a Shape; 5]) -> Self {
        Self { shapes }
    }

    /// The shape assigned to a slot.
    pub fn get(&self, slot: Slot) -> &'a Shape {
        self.shapes[slot.position()]
    }

    /// Slot/shape pairs in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (Slot, &'a Shape)> + '_ {
        Slot::ALL.iter().map(move |&slot| (slot, self.get(slot)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_detection() {
        assert_eq!(DeckFormat::from_extension("PPTX"), Some(DeckFormat::Pptx));
        assert_eq!(DeckFormat::from_extension("ppt"), None);
        assert_eq!(
            DeckFormat::from_magic(&[0x50, 0x4B, 0x03, 0x04, 0x14, 0x00]),
            Some(DeckFormat::Pptx)
        );
        assert_eq!(DeckFormat::from_magic(b"%PDF-1.7"), None);
        assert_eq!(DeckFormat::from_magic(&[0x50]), None);
    }

    #[test]
    fn test_slot_names() {
        let names: Vec<_> = Slot::ALL.iter().map(Slot::as_str).collect();
        assert_eq!(names, vec!["MAIN", "SUB1", "SUB2", "SUB3", "SUB4"]);
        assert_eq!(Slot::Sub3.to_string(), "SUB3");
    }

    #[test]
    fn test_slide_shape_views() {
        let mut slide = Slide::new(1);
        slide.add_shape(Shape::new(
            ShapeKind::Picture {
                image: ImageRef::new("image/png", vec![1]),
            },
            0,
            0,
            10,
            10,
        ));
        slide.add_shape(Shape::new(
            ShapeKind::Text {
                text: "  ".to_string(),
            },
            0,
            0,
            10,
            10,
        ));
        slide.add_shape(Shape::new(
            ShapeKind::Text {
                text: "caption".to_string(),
            },
            0,
            0,
            10,
            10,
        ));
        slide.add_shape(Shape::new(ShapeKind::Other, 0, 0, 10, 10));

        assert_eq!(slide.pictures().count(), 1);
        let texts: Vec<_> = slide.text_shapes().filter_map(Shape::text).collect();
        assert_eq!(texts, vec!["caption"]);
    }
}
