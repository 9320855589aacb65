//! Domain types for representing a parsed presentation.

use serde::{Deserialize, Serialize};

/// A parsed presentation: its slides in document order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Presentation {
    /// Original filename (without path).
    pub filename: String,

    /// Slides in presentation order.
    pub slides: Vec<Slide>,
}

impl Presentation {
    /// Create an empty presentation with the given filename.
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            slides: Vec::new(),
        }
    }

    /// Append a slide, numbering it after the slides already present.
    pub fn add_slide(&mut self, shapes: Vec<Shape>) {
        let number = self.slides.len() + 1;
        self.slides.push(Slide { number, shapes });
    }

    /// Number of slides.
    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }
}

/// The format of a presentation file, as sniffed from its header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PresentationFormat {
    /// Modern PPTX (Office Open XML, a ZIP package).
    Pptx,
    /// Legacy PPT (OLE/CFB binary). Recognised but not supported.
    Ppt,
}

impl PresentationFormat {
    /// Detect format from file magic bytes.
    pub fn from_magic(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < 4 {
            return None;
        }

        // PK\x03\x04
        if bytes.starts_with(&[0x50, 0x4B, 0x03, 0x04]) {
            return Some(Self::Pptx);
        }

        if bytes.len() >= 8
            && bytes.starts_with(&[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1])
        {
            return Some(Self::Ppt);
        }

        None
    }
}

/// A single slide and the shapes on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slide {
    /// 1-based slide number.
    pub number: usize,

    /// Top-level shapes in document order.
    pub shapes: Vec<Shape>,
}

/// What kind of element a shape is on the slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShapeKind {
    /// `p:sp`: text boxes, placeholders and geometric shapes. Carries text.
    AutoShape,
    /// `p:pic`
    Picture,
    /// `p:graphicFrame`: tables, charts, diagrams.
    GraphicFrame,
    /// `p:grpSp`
    Group,
    /// `p:cxnSp`
    Connector,
    /// `p:contentPart`
    ContentPart,
}

impl ShapeKind {
    /// Map a shape-tree child's local element name to a shape kind.
    pub fn from_local_name(name: &[u8]) -> Option<Self> {
        match name {
            b"sp" => Some(Self::AutoShape),
            b"pic" => Some(Self::Picture),
            b"graphicFrame" => Some(Self::GraphicFrame),
            b"grpSp" => Some(Self::Group),
            b"cxnSp" => Some(Self::Connector),
            b"contentPart" => Some(Self::ContentPart),
            _ => None,
        }
    }

    /// Whether shapes of this kind expose a text frame.
    pub fn has_text(self) -> bool {
        matches!(self, Self::AutoShape)
    }
}

/// A visual element placed on a slide.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shape {
    /// Shape name from its non-visual properties (may be empty).
    pub name: String,

    /// Element kind.
    pub kind: ShapeKind,

    /// Raw (untrimmed) text; `None` for shapes without a text frame.
    pub text: Option<String>,
}

impl Shape {
    /// Create a shape of the given kind. Text-bearing kinds start with
    /// empty text, all others with none.
    pub fn new(kind: ShapeKind) -> Self {
        Self {
            name: String::new(),
            kind,
            text: kind.has_text().then(String::new),
        }
    }

    /// Create a text-bearing shape with the given text.
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            name: String::new(),
            kind: ShapeKind::AutoShape,
            text: Some(text.into()),
        }
    }

    /// Set the shape name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// The shape's text with surrounding whitespace removed, if it has
    /// text and that text is not blank.
    pub fn trimmed_text(&self) -> Option<&str> {
        self.text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_magic() {
        assert_eq!(
            PresentationFormat::from_magic(b"PK\x03\x04rest"),
            Some(PresentationFormat::Pptx)
        );
        assert_eq!(
            PresentationFormat::from_magic(&[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1]),
            Some(PresentationFormat::Ppt)
        );
        assert_eq!(PresentationFormat::from_magic(b"%PDF-1.7"), None);
        assert_eq!(PresentationFormat::from_magic(b"PK"), None);
    }

    #[test]
    fn test_add_slide_numbers_from_one() {
        let mut presentation = Presentation::new("deck.pptx");
        presentation.add_slide(Vec::new());
        presentation.add_slide(vec![Shape::with_text("x")]);

        assert_eq!(presentation.slide_count(), 2);
        assert_eq!(presentation.slides[0].number, 1);
        assert_eq!(presentation.slides[1].number, 2);
    }

    #[test]
    fn test_shape_text_capability() {
        assert_eq!(Shape::new(ShapeKind::AutoShape).text, Some(String::new()));
        assert_eq!(Shape::new(ShapeKind::Picture).text, None);
        assert_eq!(Shape::new(ShapeKind::GraphicFrame).text, None);
        assert_eq!(ShapeKind::from_local_name(b"grpSp"), Some(ShapeKind::Group));
        assert_eq!(ShapeKind::from_local_name(b"nvGrpSpPr"), None);
    }

    #[test]
    fn test_trimmed_text() {
        assert_eq!(Shape::with_text("  Hello  ").trimmed_text(), Some("Hello"));
        assert_eq!(Shape::with_text(" \n\t ").trimmed_text(), None);
        assert_eq!(Shape::with_text("").trimmed_text(), None);
        assert_eq!(Shape::new(ShapeKind::Picture).trimmed_text(), None);
    }

    #[test]
    fn test_presentation_serializes() {
        let mut presentation = Presentation::new("deck.pptx");
        presentation.add_slide(vec![Shape::with_text("Title").named("Title 1")]);

        let json = serde_json::to_value(&presentation).unwrap();
        assert_eq!(json["filename"], "deck.pptx");
        assert_eq!(json["slides"][0]["number"], 1);
        assert_eq!(json["slides"][0]["shapes"][0]["kind"], "AutoShape");
        assert_eq!(json["slides"][0]["shapes"][0]["text"], "Title");
    }
}
