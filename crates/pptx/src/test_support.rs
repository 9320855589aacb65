//! In-memory PPTX packages for tests.
//!
//! Compiled for this crate's tests and, through the `test-support`
//! feature, for dependents' tests.

use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/>
</Types>"#;

const PACKAGE_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="ppt/presentation.xml"/>
</Relationships>"#;

const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Builder for a minimal presentation package.
pub struct PptxFixture {
    slides: Vec<String>,
    order: Option<Vec<usize>>,
    slide_parts: bool,
    sections: bool,
    package_rels: Option<Vec<u8>>,
}

impl PptxFixture {
    pub fn new(slides: Vec<String>) -> Self {
        Self {
            slides,
            order: None,
            slide_parts: true,
            sections: false,
            package_rels: Some(PACKAGE_RELS_XML.as_bytes().to_vec()),
        }
    }

    /// List slides in `p:sldIdLst` in this order of part indices.
    pub fn with_order(mut self, order: Vec<usize>) -> Self {
        self.order = Some(order);
        self
    }

    /// Reference the slides but leave their parts out of the archive.
    pub fn without_slide_parts(mut self) -> Self {
        self.slide_parts = false;
        self
    }

    /// Add a `p14:sectionLst` extension splitting the slides into two
    /// sections, the way PowerPoint writes decks that use sections.
    pub fn with_sections(mut self) -> Self {
        self.sections = true;
        self
    }

    /// Replace the `_rels/.rels` part with raw bytes, or leave it out.
    pub fn with_package_rels(mut self, content: Option<&[u8]>) -> Self {
        self.package_rels = content.map(<[u8]>::to_vec);
        self
    }

    pub fn build(self) -> Vec<u8> {
        let order = self
            .order
            .clone()
            .unwrap_or_else(|| (0..self.slides.len()).collect());

        // rId1 is the slide master; slide part i gets rId{i + 2}.
        let slide_ids: String = order
            .iter()
            .enumerate()
            .map(|(pos, idx)| format!(r#"<p:sldId id="{}" r:id="rId{}"/>"#, 256 + pos, idx + 2))
            .collect();
        let section_list = if self.sections {
            let numeric_ids: Vec<String> = (0..order.len())
                .map(|pos| format!(r#"<p14:sldId id="{}"/>"#, 256 + pos))
                .collect();
            let split = numeric_ids.len().min(1);
            format!(
                r#"<p:extLst><p:ext uri="{{521415D9-36F7-43E2-AB2F-B90AF26B5E84}}"><p14:sectionLst xmlns:p14="http://schemas.microsoft.com/office/powerpoint/2010/main"><p14:section name="Default Section" id="{{3F1B3E5A-1F0C-4A8B-9E2D-6C7A1B2D3E4F}}"><p14:sldIdLst>{}</p14:sldIdLst></p14:section><p14:section name="Appendix" id="{{8D2C4B6A-2E1D-4C3B-8A9F-0E1D2C3B4A5F}}"><p14:sldIdLst>{}</p14:sldIdLst></p14:section></p14:sectionLst></p:ext></p:extLst>"#,
                numeric_ids[..split].concat(),
                numeric_ids[split..].concat()
            )
        } else {
            String::new()
        };
        let presentation_xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:presentation xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="{REL_NS}" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" saveSubsetFonts="1">
  <p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst>
  {}
  <p:sldSz cx="9144000" cy="6858000"/>
  <p:notesSz cx="6858000" cy="9144000"/>
  <p:defaultTextStyle><a:defPPr><a:defRPr lang="en-US"/></a:defPPr></p:defaultTextStyle>
  {}
</p:presentation>"#,
            if self.slides.is_empty() {
                String::new()
            } else {
                format!("<p:sldIdLst>{}</p:sldIdLst>", slide_ids)
            },
            section_list
        );

        let slide_rels: String = (0..self.slides.len())
            .map(|idx| {
                format!(
                    r#"<Relationship Id="rId{}" Type="{REL_NS}/slide" Target="slides/slide{}.xml"/>"#,
                    idx + 2,
                    idx + 1
                )
            })
            .collect();
        let presentation_rels = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="{REL_NS}/slideMaster" Target="slideMasters/slideMaster1.xml"/>
  {}
</Relationships>"#,
            slide_rels
        );

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        let mut add = |name: String, content: &[u8]| {
            zip.start_file(name, options).unwrap();
            zip.write_all(content).unwrap();
        };

        add("[Content_Types].xml".to_string(), CONTENT_TYPES_XML.as_bytes());
        if let Some(ref package_rels) = self.package_rels {
            add("_rels/.rels".to_string(), package_rels);
        }
        add("ppt/presentation.xml".to_string(), presentation_xml.as_bytes());
        add(
            "ppt/_rels/presentation.xml.rels".to_string(),
            presentation_rels.as_bytes(),
        );
        if self.slide_parts {
            for (idx, slide) in self.slides.iter().enumerate() {
                add(format!("ppt/slides/slide{}.xml", idx + 1), slide.as_bytes());
            }
        }

        zip.finish().unwrap().into_inner()
    }
}

/// Package with slides listed in part order.
pub fn build_pptx(slides: &[String]) -> Vec<u8> {
    PptxFixture::new(slides.to_vec()).build()
}

/// A slide part whose shape tree holds `shapes`.
pub fn slide_xml(shapes: &[String]) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="{REL_NS}" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>{}</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>"#,
        shapes.concat()
    )
}

/// A text shape with one paragraph per entry. Entries are inserted as-is,
/// so they may contain XML entities.
pub fn sp(name: &str, paragraphs: &[&str]) -> String {
    let body: String = paragraphs
        .iter()
        .map(|p| format!(r#"<a:p><a:r><a:rPr lang="en-US"/><a:t>{}</a:t></a:r></a:p>"#, p))
        .collect();
    format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="{}"/><p:cNvSpPr/><p:nvPr/></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:lstStyle/>{}</p:txBody></p:sp>"#,
        name, body
    )
}

pub fn pic(name: &str) -> String {
    format!(
        r#"<p:pic><p:nvPicPr><p:cNvPr id="3" name="{}"/><p:cNvPicPr/><p:nvPr/></p:nvPicPr><p:blipFill><a:blip r:embed="rId9"/></p:blipFill><p:spPr/></p:pic>"#,
        name
    )
}

/// A table frame with a single cell holding `cell`.
pub fn graphic_frame(name: &str, cell: &str) -> String {
    format!(
        r#"<p:graphicFrame><p:nvGraphicFramePr><p:cNvPr id="5" name="{}"/><p:cNvGraphicFramePr/><p:nvPr/></p:nvGraphicFramePr><p:xfrm/><a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/table"><a:tbl><a:tr h="370840"><a:tc><a:txBody><a:bodyPr/><a:p><a:r><a:t>{}</a:t></a:r></a:p></a:txBody></a:tc></a:tr></a:tbl></a:graphicData></a:graphic></p:graphicFrame>"#,
        name, cell
    )
}

/// `inner` wrapped in `mc:AlternateContent`, with a picture as fallback.
pub fn alternate_content(inner: &str) -> String {
    format!(
        r#"<mc:AlternateContent xmlns:mc="http://schemas.openxmlformats.org/markup-compatibility/2006"><mc:Choice xmlns:p14="http://schemas.microsoft.com/office/powerpoint/2010/main" Requires="p14">{}</mc:Choice><mc:Fallback>{}</mc:Fallback></mc:AlternateContent>"#,
        inner,
        pic("Fallback")
    )
}

pub fn group(name: &str, children: &[String]) -> String {
    format!(
        r#"<p:grpSp><p:nvGrpSpPr><p:cNvPr id="6" name="{}"/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>{}</p:grpSp>"#,
        name,
        children.concat()
    )
}
