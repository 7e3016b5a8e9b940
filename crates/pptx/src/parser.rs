//! PPTX deck reader implementation.

use crate::package::{
    parent_dir, parse_relationships, rels_path_for, relationship_map, resolve_part_path,
    ContentTypes, Relationship,
};
use crate::shapes::{extract_shapes, inherit_geometry, RawKind, RawShape};
use quick_xml::events::Event;
use quick_xml::Reader;
use slotdeck_core::{
    Deck, DeckFormat, DeckReader, Error, ImageRef, Result, Shape, ShapeKind, Slide,
};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use zip::ZipArchive;

const PRESENTATION_PATH: &str = "ppt/presentation.xml";
const PRESENTATION_RELS_PATH: &str = "ppt/_rels/presentation.xml.rels";
const CONTENT_TYPES_PATH: &str = "[Content_Types].xml";

/// Placeholders a slide inherits geometry from: its layout's and the
/// layout master's.
#[derive(Debug, Default)]
struct InheritedShapes {
    layout: Vec<RawShape>,
    master: Vec<RawShape>,
}

/// Reader for PPTX (Office Open XML) decks.
pub struct PptxReader;

impl PptxReader {
    /// Create a new PPTX reader.
    pub fn new() -> Self {
        Self
    }

    /// Parse a PPTX deck from a reader.
    pub fn parse<R: Read + Seek>(&self, reader: R, name: &str) -> Result<Deck> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;

        let content_types = match self.read_file_from_archive(&mut archive, CONTENT_TYPES_PATH) {
            Ok(xml) => ContentTypes::parse(&xml)?,
            Err(e) => {
                log::warn!("no content types in package ({}), guessing from extensions", e);
                ContentTypes::default()
            }
        };

        let mut deck = Deck::new(name);
        let slide_order = self.get_slide_order(&mut archive)?;
        log::debug!("{} slides in presentation order", slide_order.len());

        // Keyed by layout part path; most decks share a handful of layouts.
        let mut layouts: HashMap<String, InheritedShapes> = HashMap::new();

        for (idx, slide_path) in slide_order.iter().enumerate() {
            let slide = self.parse_slide(
                &mut archive,
                &content_types,
                &mut layouts,
                slide_path,
                idx + 1,
            )?;
            deck.add_slide(slide);
        }

        Ok(deck)
    }

    /// Ordered slide part paths.
    ///
    /// Order comes from `p:sldIdLst` in `presentation.xml`; when that is
    /// unavailable, slides are ordered by the number in their id or file name.
    fn get_slide_order<R: Read + Seek>(&self, archive: &mut ZipArchive<R>) -> Result<Vec<String>> {
        let rels_content = self.read_file_from_archive(archive, PRESENTATION_RELS_PATH)?;
        let rels = parse_relationships(&rels_content)?;

        let slide_rels: Vec<Relationship> = rels
            .into_iter()
            .filter(|r| is_slide_relationship(&r.rel_type))
            .collect();

        let listed = match self.read_file_from_archive(archive, PRESENTATION_PATH) {
            Ok(xml) => slide_id_list(&xml)?,
            Err(e) => {
                log::debug!("no presentation part ({}), ordering slides by number", e);
                Vec::new()
            }
        };

        if !listed.is_empty() {
            let by_id = relationship_map(slide_rels);
            return Ok(listed
                .iter()
                .filter_map(|id| by_id.get(id))
                .map(|r| resolve_part_path("ppt", &r.target))
                .collect());
        }

        let mut slides: Vec<(String, Option<usize>)> = slide_rels
            .iter()
            .map(|r| {
                let order_num = extract_slide_number(&r.target).or_else(|| extract_slide_number(&r.id));
                (resolve_part_path("ppt", &r.target), order_num)
            })
            .collect();

        slides.sort_by(|a, b| match (a.1, b.1) {
            (Some(na), Some(nb)) => na.cmp(&nb),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.0.cmp(&b.0),
        });

        Ok(slides.into_iter().map(|(path, _)| path).collect())
    }

    /// Parse a single slide from the archive.
    fn parse_slide<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        content_types: &ContentTypes,
        layouts: &mut HashMap<String, InheritedShapes>,
        slide_path: &str,
        slide_number: usize,
    ) -> Result<Slide> {
        let content = self.read_file_from_archive(archive, slide_path)?;
        let mut raw_shapes = extract_shapes(&content)?;

        let rels = match self.read_file_from_archive(archive, &rels_path_for(slide_path)) {
            Ok(xml) => relationship_map(parse_relationships(&xml)?),
            Err(_) => HashMap::new(),
        };

        if raw_shapes.iter().any(RawShape::needs_inherited_geometry) {
            match find_related(rels.values(), "/slideLayout") {
                Some(rel) => {
                    let layout_path = resolve_part_path(parent_dir(slide_path), &rel.target);
                    let inherited = layouts
                        .entry(layout_path)
                        .or_insert_with_key(|path| self.load_layout(archive, path));
                    for raw in raw_shapes.iter_mut().filter(|r| r.needs_inherited_geometry()) {
                        inherit_geometry(raw, &inherited.layout, &inherited.master);
                    }
                }
                None => log::warn!(
                    "{}: placeholders without a slide layout keep zero geometry",
                    slide_path
                ),
            }
        }

        let mut slide = Slide::new(slide_number);
        for raw in raw_shapes {
            let kind = match raw.kind {
                Some(RawKind::Pic) => ShapeKind::Picture {
                    image: self.load_image(archive, content_types, slide_path, &rels, &raw),
                },
                Some(RawKind::Sp) => match &raw.text {
                    Some(text) => ShapeKind::Text { text: text.clone() },
                    None => ShapeKind::Other,
                },
                Some(RawKind::Other) | None => ShapeKind::Other,
            };
            slide.add_shape(
                Shape::new(kind, raw.x, raw.y, raw.cx, raw.cy).with_identity(raw.id, raw.name),
            );
        }

        log::debug!(
            "slide {}: {} shapes ({} pictures)",
            slide_number,
            slide.shapes.len(),
            slide.pictures().count()
        );

        Ok(slide)
    }

    /// Read the placeholders of a layout and of its master. Unreadable parts
    /// contribute no placeholders.
    fn load_layout<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        layout_path: &str,
    ) -> InheritedShapes {
        let layout = self.load_part_shapes(archive, layout_path);

        let master = match self.read_file_from_archive(archive, &rels_path_for(layout_path)) {
            Ok(xml) => match parse_relationships(&xml) {
                Ok(rels) => match find_related(rels.iter(), "/slideMaster") {
                    Some(rel) => {
                        let master_path = resolve_part_path(parent_dir(layout_path), &rel.target);
                        self.load_part_shapes(archive, &master_path)
                    }
                    None => Vec::new(),
                },
                Err(e) => {
                    log::warn!("bad relationships for {}: {}", layout_path, e);
                    Vec::new()
                }
            },
            Err(_) => Vec::new(),
        };

        log::debug!(
            "{}: {} layout shapes, {} master shapes",
            layout_path,
            layout.len(),
            master.len()
        );
        InheritedShapes { layout, master }
    }

    fn load_part_shapes<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        path: &str,
    ) -> Vec<RawShape> {
        match self
            .read_file_from_archive(archive, path)
            .and_then(|xml| extract_shapes(&xml))
        {
            Ok(shapes) => shapes,
            Err(e) => {
                log::warn!("cannot read placeholders from {}: {}", path, e);
                Vec::new()
            }
        }
    }

    /// Resolve a picture's embedded image. Missing or unreadable parts give
    /// an image without data; the slot pipeline reports it for the slide.
    fn load_image<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        content_types: &ContentTypes,
        slide_path: &str,
        rels: &HashMap<String, Relationship>,
        raw: &RawShape,
    ) -> ImageRef {
        let rel = match raw.embed.as_ref().and_then(|id| rels.get(id)) {
            Some(rel) if !rel.external => rel,
            _ => {
                log::warn!(
                    "picture '{}' in {} has no embedded image (linked: {})",
                    raw.name,
                    slide_path,
                    raw.link.is_some()
                );
                return ImageRef::missing("");
            }
        };

        let part_path = resolve_part_path(parent_dir(slide_path), &rel.target);
        let media_type = content_types.media_type(&part_path);

        match self.read_bytes_from_archive(archive, &part_path) {
            Ok(data) => ImageRef::new(media_type, data),
            Err(e) => {
                log::warn!("picture '{}': {}", raw.name, e);
                ImageRef::missing(media_type)
            }
        }
    }

    /// Read a text file from the ZIP archive.
    fn read_file_from_archive<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        path: &str,
    ) -> Result<String> {
        let bytes = self.read_bytes_from_archive(archive, path)?;
        String::from_utf8(bytes)
            .map_err(|e| Error::PptxParseError(format!("'{}' is not UTF-8: {}", path, e)))
    }

    /// Read a binary part from the ZIP archive.
    fn read_bytes_from_archive<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        path: &str,
    ) -> Result<Vec<u8>> {
        let mut file = archive
            .by_name(path)
            .map_err(|e| Error::ZipError(format!("File not found in archive '{}': {}", path, e)))?;

        let mut content = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut content)
            .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", path, e)))?;

        Ok(content)
    }
}

impl Default for PptxReader {
    fn default() -> Self {
        Self::new()
    }
}

impl DeckReader for PptxReader {
    fn read_deck(&self, path: &Path) -> Result<Deck> {
        let mut file = File::open(path)?;

        let mut magic = [0u8; 4];
        let read = file.read(&mut magic)?;
        let format = DeckFormat::from_magic(&magic[..read]).or_else(|| {
            path.extension()
                .and_then(|e| e.to_str())
                .and_then(DeckFormat::from_extension)
        });
        if format != Some(DeckFormat::Pptx) {
            return Err(Error::UnsupportedFormat(format!(
                "{} is not a PPTX file",
                path.display()
            )));
        }

        file.rewind()?;
        let name = path
            .file_stem()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown");

        self.parse(BufReader::new(file), name)
    }
}

/// First internal relationship whose type ends with `type_suffix`.
fn find_related<'a>(
    mut rels: impl Iterator<Item = &'a Relationship>,
    type_suffix: &str,
) -> Option<&'a Relationship> {
    rels.find(|r| !r.external && r.rel_type.ends_with(type_suffix))
}

/// True for the presentation-to-slide relationship type.
fn is_slide_relationship(rel_type: &str) -> bool {
    rel_type.ends_with("/slide")
}

/// Relationship ids of `p:sldIdLst/p:sldId`, in presentation order.
fn slide_id_list(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut ids = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if e.local_name().as_ref() == b"sldId" =>
            {
                for attr in e.attributes().flatten() {
                    if attr.key.local_name().as_ref() == b"id" && attr.key.as_ref() != b"id" {
                        ids.push(String::from_utf8_lossy(&attr.value).to_string());
                    }
                }
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

/// Extract a slide number from a string like "rId2" or "slides/slide3.xml".
fn extract_slide_number(s: &str) -> Option<usize> {
    let s = s.trim_end_matches(".xml").trim_end_matches(".rels");

    let digits: String = s.chars().rev().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let digits: String = digits.chars().rev().collect();
    digits.parse().ok()
}
