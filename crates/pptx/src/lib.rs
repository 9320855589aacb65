//! PPTX (Office Open XML) parser backend for presentation text extraction.
//!
//! Parses .pptx files which are ZIP archives containing XML documents.

pub mod parser;

#[cfg(any(test, feature = "test-support"))]
#[doc(hidden)]
pub mod test_support;

pub use parser::PptxParser;

use slidetext_core::{ExtractedText, Result, TextExtractor};
use std::path::Path;

/// Open the presentation at `path` and extract its slide text.
pub fn extract(path: impl AsRef<Path>) -> Result<ExtractedText> {
    let presentation = PptxParser::new().open(path.as_ref())?;
    log::debug!(
        "Parsed {} ({} slides)",
        presentation.filename,
        presentation.slide_count()
    );
    Ok(TextExtractor::new().extract(&presentation))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{build_pptx, pic, slide_xml, sp};
    use slidetext_core::Error;

    #[test]
    fn test_extract_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deck.pptx");
        std::fs::write(
            &path,
            build_pptx(&[
                slide_xml(&[sp("Title 1", &["Title"]), pic("Logo")]),
                slide_xml(&[pic("Photo")]),
            ]),
        )
        .unwrap();

        let text = extract(&path).unwrap();
        let rule = "=".repeat(60);
        assert_eq!(
            text.to_string(),
            format!("\n{rule}\nSlide 1\n{rule}\n\nTitle\n\n\n{rule}\nSlide 2\n{rule}\n")
        );
    }

    #[test]
    fn test_extract_trims_and_skips_blank_shapes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deck.pptx");
        std::fs::write(
            &path,
            build_pptx(&[slide_xml(&[
                sp("Blank", &["   "]),
                sp("Padded", &["  Hello  "]),
                sp("Empty", &[]),
                sp("Body", &["line one", "line two"]),
            ])]),
        )
        .unwrap();

        let text = extract(&path).unwrap();
        assert_eq!(text.lines(), vec!["Hello", "line one\nline two"]);
    }

    #[test]
    fn test_extract_not_a_presentation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.pptx");
        std::fs::write(&path, "plain text pretending to be a deck").unwrap();

        assert!(matches!(extract(&path), Err(Error::UnsupportedFormat(_))));
    }
}
