//! OPC package plumbing: relationship parts, content types and part paths.

use quick_xml::events::Event;
use quick_xml::Reader;
use slotdeck_core::{Error, Result};
use std::collections::HashMap;

/// One `<Relationship>` entry of a `.rels` part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
    /// `TargetMode="External"`: the target is a URL or file outside the package.
    pub external: bool,
}

/// Parse a `.rels` part.
pub fn parse_relationships(xml: &str) -> Result<Vec<Relationship>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut rels = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if e.local_name().as_ref() == b"Relationship" =>
            {
                let mut rel = Relationship {
                    id: String::new(),
                    rel_type: String::new(),
                    target: String::new(),
                    external: false,
                };

                for attr in e.attributes().flatten() {
                    let value = String::from_utf8_lossy(&attr.value).to_string();
                    match attr.key.as_ref() {
                        b"Id" => rel.id = value,
                        b"Type" => rel.rel_type = value,
                        b"Target" => rel.target = value,
                        b"TargetMode" => rel.external = value == "External",
                        _ => {}
                    }
                }
                rels.push(rel);
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

    Ok(rels)
}

/// Index of relationships by id.
pub fn relationship_map(rels: Vec<Relationship>) -> HashMap<String, Relationship> {
    rels.into_iter().map(|r| (r.id.clone(), r)).collect()
}

/// `[Content_Types].xml`: media types by part name and by extension.
#[derive(Debug, Default, Clone)]
pub struct ContentTypes {
    defaults: HashMap<String, String>,
    overrides: HashMap<String, String>,
}

impl ContentTypes {
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);
        let mut types = Self::default();

        loop {
            match reader.read_event() {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => {
                    let mut key = None;
                    let mut content_type = None;
                    for attr in e.attributes().flatten() {
                        let value = String::from_utf8_lossy(&attr.value).to_string();
                        match attr.key.as_ref() {
                            b"Extension" | b"PartName" => key = Some(value),
                            b"ContentType" => content_type = Some(value),
                            _ => {}
                        }
                    }

                    if let (Some(key), Some(content_type)) = (key, content_type) {
                        match e.local_name().as_ref() {
                            b"Default" => {
                                types.defaults.insert(key.to_lowercase(), content_type);
                            }
                            b"Override" => {
                                types.overrides.insert(key, content_type);
                            }
                            _ => {}
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::XmlError(format!(
                        "Error parsing content types: {}",
                        e
                    )));
                }
                _ => {}
            }
        }

        Ok(types)
    }

    /// Media type of a part (`ppt/media/image1.png`). Overrides win over
    /// extension defaults; unknown parts are labelled `image/<ext>`.
    pub fn media_type(&self, part_path: &str) -> String {
        let part_name = format!("/{}", part_path.trim_start_matches('/'));
        if let Some(ct) = self.overrides.get(&part_name) {
            return ct.clone();
        }

        let ext = part_path
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .unwrap_or_default();
        self.defaults
            .get(&ext)
            .cloned()
            .unwrap_or_else(|| format!("image/{}", ext))
    }
}

/// Resolve a relationship target against the folder of its source part.
///
/// `resolve_part_path("ppt/slides", "../media/image1.png")` is
/// `ppt/media/image1.png`; absolute targets are taken from the package root.
pub fn resolve_part_path(base_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// `ppt/slides/slide3.xml` -> `ppt/slides/_rels/slide3.xml.rels`
pub fn rels_path_for(part_path: &str) -> String {
    match part_path.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part_path),
    }
}

/// Folder of a part path (`ppt/slides/slide1.xml` -> `ppt/slides`).
pub fn parent_dir(part_path: &str) -> &str {
    part_path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}
