//! PPTX file parser implementation.
//!
//! A `.pptx` is a ZIP package of XML parts. The main presentation part is
//! found through the package relationships, slides are ordered by its
//! `p:sldIdLst`, and each slide's top-level shapes are read from its
//! `p:spTree`.

use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use slidetext_core::{Error, Presentation, PresentationFormat, Result, Shape, ShapeKind};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use zip::ZipArchive;

const PACKAGE_RELS_PATH: &str = "_rels/.rels";
const DEFAULT_PRESENTATION_PATH: &str = "ppt/presentation.xml";
const OFFICE_DOCUMENT_REL: &str = "/officeDocument";
const SLIDE_REL: &str = "/slide";
/// Soft line break (`a:br`) within a paragraph.
const LINE_BREAK: &str = "\u{000B}";

/// Parser for PPTX (Office Open XML) files.
pub struct PptxParser;

impl PptxParser {
    /// Create a new PPTX parser.
    pub fn new() -> Self {
        Self
    }

    /// Open and parse the PPTX file at `path`.
    pub fn open(&self, path: &Path) -> Result<Presentation> {
        let file = File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::MissingInputFile(path.to_path_buf()),
            _ => Error::IoError(e),
        })?;

        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown");

        self.parse(BufReader::new(file), filename)
    }

    /// Parse a PPTX file from a reader.
    pub fn parse<R: Read + Seek>(&self, mut reader: R, filename: &str) -> Result<Presentation> {
        check_format(&mut reader)?;

        let mut archive =
            ZipArchive::new(reader).map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;

        let mut presentation = Presentation::new(filename);

        let slide_order = self.get_slide_order(&mut archive)?;
        log::debug!("{}: {} slides", filename, slide_order.len());

        for slide_path in &slide_order {
            let shapes = self.parse_slide(&mut archive, slide_path)?;
            presentation.add_slide(shapes);
        }

        Ok(presentation)
    }

    /// Get the ordered list of slide part paths.
    ///
    /// Order comes from `p:sldIdLst` in the presentation part; each entry's
    /// `r:id` is resolved through the presentation's relationships.
    fn get_slide_order<R: Read + Seek>(&self, archive: &mut ZipArchive<R>) -> Result<Vec<String>> {
        let presentation_path = self.main_part_path(archive)?;
        let rels_path = rels_path_for(&presentation_path);
        let base_dir = part_dir(&presentation_path);

        let rels_content = self.read_file_from_archive(archive, &rels_path)?;
        let slide_targets: HashMap<String, String> = parse_relationships(&rels_content)?
            .into_iter()
            .filter(|rel| rel.is_slide())
            .map(|rel| (rel.id, resolve_target(base_dir, &rel.target)))
            .collect();

        let presentation_content = self.read_file_from_archive(archive, &presentation_path)?;
        let slide_ids = parse_slide_ids(&presentation_content)?;

        slide_ids
            .into_iter()
            .map(|id| -> Result<String> {
                let path = slide_targets.get(&id).cloned().ok_or_else(|| {
                    Error::PptxParseError(format!("No slide relationship for '{}'", id))
                })?;
                log::debug!("Slide {} -> {}", id, path);
                Ok(path)
            })
            .collect()
    }

    /// Locate the main presentation part through the package relationships.
    fn main_part_path<R: Read + Seek>(&self, archive: &mut ZipArchive<R>) -> Result<String> {
        if !archive.file_names().any(|name| name == PACKAGE_RELS_PATH) {
            log::warn!(
                "Package has no {} (assuming {})",
                PACKAGE_RELS_PATH,
                DEFAULT_PRESENTATION_PATH
            );
            return Ok(DEFAULT_PRESENTATION_PATH.to_string());
        }

        let content = self.read_file_from_archive(archive, PACKAGE_RELS_PATH)?;

        parse_relationships(&content)?
            .into_iter()
            .find(|rel| rel.rel_type.ends_with(OFFICE_DOCUMENT_REL))
            .map(|rel| resolve_target("", &rel.target))
            .ok_or_else(|| {
                Error::PptxParseError("Package has no officeDocument relationship".to_string())
            })
    }

    /// Parse a single slide part into its top-level shapes.
    fn parse_slide<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        slide_path: &str,
    ) -> Result<Vec<Shape>> {
        let content = self.read_file_from_archive(archive, slide_path)?;
        extract_shapes_from_xml(&content)
            .map_err(|e| Error::XmlError(format!("Error parsing slide '{}': {}", slide_path, e)))
    }

    /// Read a file from the ZIP archive.
    fn read_file_from_archive<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        path: &str,
    ) -> Result<String> {
        let mut file = archive
            .by_name(path)
            .map_err(|e| Error::ZipError(format!("File not found in archive '{}': {}", path, e)))?;

        let mut content = String::new();
        file.read_to_string(&mut content)
            .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", path, e)))?;

        Ok(content)
    }
}

impl Default for PptxParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Reject anything that is not a ZIP package, leaving the reader where it
/// started.
fn check_format<R: Read + Seek>(reader: &mut R) -> Result<()> {
    let start = reader.stream_position()?;
    let mut magic = Vec::with_capacity(8);
    reader.by_ref().take(8).read_to_end(&mut magic)?;
    reader.seek(SeekFrom::Start(start))?;

    match PresentationFormat::from_magic(&magic) {
        Some(PresentationFormat::Pptx) => Ok(()),
        Some(PresentationFormat::Ppt) => Err(Error::UnsupportedFormat(
            "legacy PPT (OLE/CFB) files are not supported, save as .pptx".to_string(),
        )),
        None => Err(Error::UnsupportedFormat("not a PPTX (ZIP) package".to_string())),
    }
}

/// A package relationship.
#[derive(Debug)]
struct Relationship {
    id: String,
    rel_type: String,
    target: String,
    external: bool,
}

impl Relationship {
    fn is_slide(&self) -> bool {
        !self.external && self.rel_type.ends_with(SLIDE_REL)
    }
}

/// Parse a `.rels` part.
fn parse_relationships(content: &str) -> Result<Vec<Relationship>> {
    let mut relationships = Vec::new();
    let mut reader = Reader::from_str(content);
    reader.trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if local_name(e.name().as_ref()) == b"Relationship" =>
            {
                let mut rel = Relationship {
                    id: String::new(),
                    rel_type: String::new(),
                    target: String::new(),
                    external: false,
                };

                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"Type" => rel.rel_type = attr_value(&attr),
                        b"Target" => rel.target = attr_value(&attr),
                        b"Id" => rel.id = attr_value(&attr),
                        b"TargetMode" => rel.external = attr_value(&attr) == "External",
                        _ => {}
                    }
                }

                relationships.push(rel);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!(
                    "Error parsing relationships: {}",
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(relationships)
}

/// Collect the `r:id` of every `p:sldId`, in document order.
///
/// Only the presentation's own `p:sldIdLst` counts. Extensions such as
/// `p14:sectionLst` carry their own `sldIdLst`/`sldId` elements without
/// relationship ids.
fn parse_slide_ids(content: &str) -> Result<Vec<String>> {
    // presentation > sldIdLst > sldId
    const LIST_DEPTH: usize = 2;

    let mut ids = Vec::new();
    let mut reader = Reader::from_str(content);
    reader.trim_text(true);

    let mut depth = 0usize;
    let mut in_list = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                depth += 1;
                let name = e.name();
                let local = local_name(name.as_ref());

                if depth == LIST_DEPTH && local == b"sldIdLst" {
                    in_list = true;
                } else if in_list && depth == LIST_DEPTH + 1 && local == b"sldId" {
                    ids.push(slide_rel_id(e)?);
                }
            }
            Ok(Event::Empty(ref e)) => {
                let name = e.name();
                // Empty elements sit one level below the current depth.
                if in_list && depth == LIST_DEPTH && local_name(name.as_ref()) == b"sldId" {
                    ids.push(slide_rel_id(e)?);
                }
            }
            Ok(Event::End(_)) => {
                if depth == LIST_DEPTH {
                    in_list = false;
                }
                depth = depth.saturating_sub(1);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!(
                    "Error parsing presentation: {}",
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(ids)
}

/// The relationship id of a `p:sldId`.
fn slide_rel_id(e: &BytesStart) -> Result<String> {
    // The bare `id` is the numeric slide id; the prefixed one is the rel id.
    e.attributes()
        .flatten()
        .find(|attr| {
            let key = attr.key.as_ref();
            local_name(key) == b"id" && local_name(key).len() < key.len()
        })
        .map(|attr| attr_value(&attr))
        .ok_or_else(|| Error::PptxParseError("Slide entry without a relationship id".to_string()))
}

/// In-progress state for the top-level shape currently being read.
#[derive(Debug)]
struct ShapeState {
    shape: Shape,
    /// Element depth of the shape's own start tag.
    depth: usize,
    in_text_body: bool,
    in_run_text: bool,
    paragraphs: usize,
}

impl ShapeState {
    fn new(kind: ShapeKind, depth: usize) -> Self {
        Self {
            shape: Shape::new(kind),
            depth,
            in_text_body: false,
            in_run_text: false,
            paragraphs: 0,
        }
    }

    fn start(&mut self, local: &[u8], e: &BytesStart, depth: usize) {
        match local {
            // shape > nvSpPr > cNvPr
            b"cNvPr" if depth == self.depth + 2 => self.read_name(e),
            b"txBody" if self.shape.kind.has_text() => self.in_text_body = true,
            b"p" if self.in_text_body => self.begin_paragraph(),
            b"t" if self.in_text_body => self.in_run_text = true,
            b"br" if self.in_text_body => self.push_text(LINE_BREAK),
            _ => {}
        }
    }

    fn empty(&mut self, local: &[u8], e: &BytesStart, depth: usize) {
        match local {
            b"cNvPr" if depth == self.depth + 2 => self.read_name(e),
            b"p" if self.in_text_body => self.begin_paragraph(),
            b"br" if self.in_text_body => self.push_text(LINE_BREAK),
            _ => {}
        }
    }

    fn end(&mut self, local: &[u8]) {
        match local {
            b"txBody" => self.in_text_body = false,
            b"t" => self.in_run_text = false,
            _ => {}
        }
    }

    fn read_name(&mut self, e: &BytesStart) {
        if let Some(attr) = e
            .attributes()
            .flatten()
            .find(|attr| attr.key.as_ref() == b"name")
        {
            self.shape.name = attr_value(&attr);
        }
    }

    fn begin_paragraph(&mut self) {
        if self.paragraphs > 0 {
            self.push_text("\n");
        }
        self.paragraphs += 1;
    }

    fn push_text(&mut self, text: &str) {
        if let Some(ref mut current) = self.shape.text {
            current.push_str(text);
        }
    }
}

/// Extract the top-level shapes of the first shape tree in a slide.
fn extract_shapes_from_xml(xml_content: &str) -> Result<Vec<Shape>> {
    let mut shapes = Vec::new();
    let mut reader = Reader::from_str(xml_content);
    // Whitespace inside `a:t` runs is content.
    reader.trim_text(false);

    let mut depth = 0usize;
    let mut tree_depth: Option<usize> = None;
    let mut tree_done = false;
    let mut current: Option<ShapeState> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                depth += 1;
                let name = e.name();
                let local = local_name(name.as_ref());

                match (tree_depth, current.as_mut()) {
                    (None, _) if !tree_done && local == b"spTree" => tree_depth = Some(depth),
                    (Some(tree), None) if depth == tree + 1 => {
                        if let Some(kind) = ShapeKind::from_local_name(local) {
                            current = Some(ShapeState::new(kind, depth));
                        }
                    }
                    (Some(_), Some(state)) => state.start(local, e, depth),
                    _ => {}
                }
            }
            Ok(Event::Empty(ref e)) => {
                let name = e.name();
                let local = local_name(name.as_ref());
                let element_depth = depth + 1;

                match (tree_depth, current.as_mut()) {
                    (Some(tree), None) if element_depth == tree + 1 => {
                        if let Some(kind) = ShapeKind::from_local_name(local) {
                            shapes.push(Shape::new(kind));
                        }
                    }
                    (Some(_), Some(state)) => state.empty(local, e, element_depth),
                    _ => {}
                }
            }
            Ok(Event::Text(ref e)) => {
                if let Some(state) = current.as_mut().filter(|s| s.in_run_text) {
                    let text = e
                        .unescape()
                        .map_err(|e| Error::XmlError(e.to_string()))?;
                    state.push_text(&text);
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(state) = current.as_mut().filter(|s| s.in_run_text) {
                    state.push_text(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Ok(Event::End(ref e)) => {
                let name = e.name();
                let local = local_name(name.as_ref());

                match current.take() {
                    Some(state) if state.depth == depth => {
                        log::debug!(
                            "Shape {:?} '{}' ({} chars of text)",
                            state.shape.kind,
                            state.shape.name,
                            state.shape.text.as_ref().map_or(0, |t| t.chars().count())
                        );
                        shapes.push(state.shape);
                    }
                    Some(mut state) => {
                        state.end(local);
                        current = Some(state);
                    }
                    None => {
                        if tree_depth == Some(depth) {
                            tree_depth = None;
                            tree_done = true;
                        }
                    }
                }

                depth = depth.saturating_sub(1);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!(
                    "at position {}: {}",
                    reader.buffer_position(),
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(shapes)
}

/// Unescaped attribute value, falling back to the raw bytes.
fn attr_value(attr: &Attribute) -> String {
    attr.unescape_value()
        .map(|v| v.into_owned())
        .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).to_string())
}

/// Extract the local name from a potentially namespaced XML element name.
fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}

/// Directory of a part path, e.g. `ppt` for `ppt/presentation.xml`.
fn part_dir(part: &str) -> &str {
    part.rsplit_once('/').map_or("", |(dir, _)| dir)
}

/// Path of the relationships part belonging to `part`.
fn rels_path_for(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part),
    }
}

/// Resolve a relationship target against the directory of its source part.
fn resolve_target(base_dir: &str, target: &str) -> String {
    let joined = match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None if base_dir.is_empty() => target.to_string(),
        None => format!("{}/{}", base_dir, target),
    };

    let mut segments: Vec<&str> = Vec::new();
    for segment in joined.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }
    segments.join("/")
}
