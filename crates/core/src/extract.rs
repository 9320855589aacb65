//! Plain-text assembly from a parsed presentation.
//!
//! Every slide opens with a banner, followed by one line per text-bearing
//! shape whose trimmed text is non-empty, each followed by a blank line.

use crate::types::Presentation;
use std::fmt;

/// Character used for banner rule lines.
pub const RULE_CHAR: char = '=';

/// Width of banner rule lines.
pub const RULE_WIDTH: usize = 60;

/// A rule line of [`RULE_WIDTH`] [`RULE_CHAR`]s.
pub fn rule() -> String {
    RULE_CHAR.to_string().repeat(RULE_WIDTH)
}

/// One block of extracted output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextBlock {
    /// Slide boundary banner carrying the 1-based slide number.
    Banner(usize),
    /// Trimmed text of one shape.
    Line(String),
    /// Empty separator line after a shape's text.
    Spacer,
}

impl fmt::Display for TextBlock {
    /// # Example output
    /// ```text
    ///
    /// ============================================================
    /// Slide 3
    /// ============================================================
    ///
    /// ```
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Banner(number) => {
                let rule = rule();
                write!(f, "\n{rule}\nSlide {number}\n{rule}\n")
            }
            Self::Line(text) => f.write_str(text),
            Self::Spacer => Ok(()),
        }
    }
}

/// The extracted text of a presentation, as an ordered list of blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedText {
    blocks: Vec<TextBlock>,
}

impl ExtractedText {
    /// All blocks in output order.
    pub fn blocks(&self) -> &[TextBlock] {
        &self.blocks
    }

    /// Number of slide banners.
    pub fn slide_count(&self) -> usize {
        self.blocks
            .iter()
            .filter(|b| matches!(b, TextBlock::Banner(_)))
            .count()
    }

    /// The text lines, without banners or spacers.
    pub fn lines(&self) -> Vec<&str> {
        self.blocks
            .iter()
            .filter_map(|b| match b {
                TextBlock::Line(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Whether nothing was extracted (no slides at all).
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

impl fmt::Display for ExtractedText {
    /// Blocks joined with newlines.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, block) in self.blocks.iter().enumerate() {
            if idx > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{block}")?;
        }
        Ok(())
    }
}

/// Turns a [`Presentation`] into [`ExtractedText`].
#[derive(Debug, Clone, Default)]
pub struct TextExtractor;

impl TextExtractor {
    /// Create a new extractor.
    pub fn new() -> Self {
        Self
    }

    /// Walk slides and shapes in document order and collect their text.
    pub fn extract(&self, presentation: &Presentation) -> ExtractedText {
        let mut blocks = Vec::new();

        for (idx, slide) in presentation.slides.iter().enumerate() {
            blocks.push(TextBlock::Banner(idx + 1));

            for shape in &slide.shapes {
                match shape.trimmed_text() {
                    Some(text) => {
                        blocks.push(TextBlock::Line(text.to_string()));
                        blocks.push(TextBlock::Spacer);
                    }
                    None => {
                        log::debug!(
                            "Slide {}: skipping {:?} shape '{}' (no text)",
                            idx + 1,
                            shape.kind,
                            shape.name
                        );
                    }
                }
            }
        }

        ExtractedText { blocks }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Shape, ShapeKind};

    fn banner(number: usize) -> String {
        let rule = "=".repeat(60);
        format!("\n{rule}\nSlide {number}\n{rule}\n")
    }

    fn presentation(slides: Vec<Vec<Shape>>) -> Presentation {
        let mut presentation = Presentation::new("deck.pptx");
        for shapes in slides {
            presentation.add_slide(shapes);
        }
        presentation
    }

    #[test]
    fn test_rule() {
        assert_eq!(rule().len(), 60);
        assert!(rule().chars().all(|c| c == '='));
    }

    #[test]
    fn test_zero_slides_is_empty_string() {
        let text = TextExtractor::new().extract(&presentation(Vec::new()));
        assert!(text.is_empty());
        assert_eq!(text.to_string(), "");
    }

    #[test]
    fn test_banners_numbered_in_order() {
        let text = TextExtractor::new().extract(&presentation(vec![Vec::new(); 4]));
        let numbers: Vec<usize> = text
            .blocks()
            .iter()
            .filter_map(|b| match b {
                TextBlock::Banner(n) => Some(*n),
                _ => None,
            })
            .collect();

        assert_eq!(numbers, vec![1, 2, 3, 4]);
        assert_eq!(text.slide_count(), 4);
        for n in 1..=4 {
            assert_eq!(text.to_string().matches(&format!("Slide {n}\n")).count(), 1);
        }
    }

    #[test]
    fn test_blank_text_skipped() {
        let text = TextExtractor::new().extract(&presentation(vec![vec![
            Shape::with_text(""),
            Shape::with_text("   \n\t"),
            Shape::new(ShapeKind::Picture),
            Shape::new(ShapeKind::GraphicFrame),
        ]]));

        assert!(text.lines().is_empty());
        assert_eq!(text.to_string(), banner(1));
    }

    #[test]
    fn test_text_is_trimmed() {
        let text = TextExtractor::new().extract(&presentation(vec![vec![Shape::with_text(
            "  Hello  ",
        )]]));
        assert_eq!(text.lines(), vec!["Hello"]);
        assert_eq!(text.to_string(), format!("{}\nHello\n", banner(1)));
    }

    #[test]
    fn test_lines_follow_shape_order() {
        let text = TextExtractor::new().extract(&presentation(vec![vec![
            Shape::with_text("first"),
            Shape::new(ShapeKind::Picture),
            Shape::with_text("second"),
            Shape::with_text("third"),
        ]]));
        assert_eq!(text.lines(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_multiline_shape_text_kept_intact() {
        let text = TextExtractor::new().extract(&presentation(vec![vec![Shape::with_text(
            "\nBullet one\nBullet two\n\n",
        )]]));
        assert_eq!(text.lines(), vec!["Bullet one\nBullet two"]);
    }

    #[test]
    fn test_title_then_empty_slide() {
        let text = TextExtractor::new().extract(&presentation(vec![
            vec![Shape::with_text("Title").named("Title 1")],
            vec![Shape::new(ShapeKind::Picture)],
        ]));

        let expected = format!("{}\nTitle\n\n{}", banner(1), banner(2));
        assert_eq!(text.to_string(), expected);
        assert!(text.to_string().ends_with(&format!("{}\n", rule())));
        assert_eq!(
            text.blocks(),
            &[
                TextBlock::Banner(1),
                TextBlock::Line("Title".to_string()),
                TextBlock::Spacer,
                TextBlock::Banner(2),
            ]
        );
    }
}
