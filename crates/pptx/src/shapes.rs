//! Shape extraction from slide XML (`ppt/slides/slideN.xml`).
//!
//! Only the top-level children of `p:spTree` become shapes. Groups are kept
//! as a single `Other` shape; their members are not flattened.
//!
//! Slide layouts and masters share the same shape tree, so the same reader
//! supplies the placeholders that slide shapes inherit their geometry from.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use slotdeck_core::{Error, Result};

/// What kind of top-level element a raw shape came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawKind {
    /// `p:sp`
    Sp,
    /// `p:pic`
    Pic,
    /// `p:grpSp`, `p:graphicFrame`, `p:cxnSp`, `p:contentPart`
    Other,
}

/// A shape as read from slide XML, before picture payloads are resolved.
#[derive(Debug, Clone, Default)]
pub struct RawShape {
    pub kind: Option<RawKind>,
    pub id: u32,
    pub name: String,
    pub x: i64,
    pub y: i64,
    pub cx: i64,
    pub cy: i64,
    /// Text of a `p:sp` with a text body; paragraphs joined by `\n`.
    pub text: Option<String>,
    /// `a:blip/@r:embed` of a picture.
    pub embed: Option<String>,
    /// `a:blip/@r:link` of a linked (not embedded) picture.
    pub link: Option<String>,
    /// `p:nvPr/p:ph` of a placeholder shape.
    pub placeholder: Option<Placeholder>,
    /// Whether the shape carries its own `a:off`.
    pub positioned: bool,
}

impl RawShape {
    /// A placeholder that takes its position from the layout or master.
    pub fn needs_inherited_geometry(&self) -> bool {
        self.placeholder.is_some() && !self.positioned
    }

    fn copy_geometry(&mut self, from: &RawShape) {
        self.x = from.x;
        self.y = from.y;
        self.cx = from.cx;
        self.cy = from.cy;
        self.positioned = true;
    }
}

/// Placeholder identity (`p:ph`). Absent attributes take the OOXML defaults:
/// type `obj`, index 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub ph_type: String,
    pub idx: u32,
}

impl Default for Placeholder {
    fn default() -> Self {
        Self {
            ph_type: "obj".to_string(),
            idx: 0,
        }
    }
}

/// Master placeholder type a layout placeholder of `ph_type` inherits from.
/// Masters carry only title, body, date, footer and slide number placeholders.
fn master_type(ph_type: &str) -> &str {
    match ph_type {
        "title" | "ctrTitle" => "title",
        "dt" | "ftr" | "sldNum" => ph_type,
        _ => "body",
    }
}

/// Give a placeholder without its own `a:xfrm` the geometry it inherits.
///
/// The layout placeholder with the same `idx` is used when it is positioned;
/// otherwise the master placeholder of the matching base type. A shape with
/// no positioned ancestor keeps (0, 0, 0, 0).
pub fn inherit_geometry(shape: &mut RawShape, layout: &[RawShape], master: &[RawShape]) {
    let Some(ph) = shape.placeholder.clone() else {
        return;
    };

    let from_layout = layout
        .iter()
        .find(|l| l.placeholder.as_ref().is_some_and(|lp| lp.idx == ph.idx));
    if let Some(source) = from_layout.filter(|l| l.positioned) {
        shape.copy_geometry(source);
        return;
    }

    let base_type = from_layout
        .and_then(|l| l.placeholder.as_ref())
        .map_or(master_type(&ph.ph_type), |lp| master_type(&lp.ph_type));
    let from_master = master.iter().find(|m| {
        m.positioned
            && m.placeholder
                .as_ref()
                .is_some_and(|mp| master_type(&mp.ph_type) == base_type)
    });
    match from_master {
        Some(source) => shape.copy_geometry(source),
        None => log::debug!(
            "placeholder '{}' ({} #{}) has no inherited geometry",
            shape.name,
            ph.ph_type,
            ph.idx
        ),
    }
}

fn raw_kind(local_name: &[u8]) -> Option<RawKind> {
    match local_name {
        b"sp" => Some(RawKind::Sp),
        b"pic" => Some(RawKind::Pic),
        b"grpSp" | b"graphicFrame" | b"cxnSp" | b"contentPart" => Some(RawKind::Other),
        _ => None,
    }
}

/// State of the shape currently being read.
struct Builder {
    shape: RawShape,
    /// Open elements inside the shape, the shape element included.
    depth: usize,
    /// Shape elements nested inside this one (group members).
    nested: usize,
    has_offset: bool,
    has_extent: bool,
    has_identity: bool,
    in_text: bool,
}

impl Builder {
    fn new(kind: RawKind) -> Self {
        Self {
            shape: RawShape {
                kind: Some(kind),
                ..RawShape::default()
            },
            depth: 1,
            nested: 0,
            has_offset: false,
            has_extent: false,
            has_identity: false,
            in_text: false,
        }
    }

    /// Handle an element inside the shape (start or empty).
    fn element(&mut self, e: &BytesStart<'_>) {
        if self.nested > 0 {
            return;
        }

        match e.local_name().as_ref() {
            b"cNvPr" if !self.has_identity => {
                self.has_identity = true;
                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"id" => {
                            self.shape.id = parse_attr(&attr.value).unwrap_or(0);
                        }
                        b"name" => {
                            self.shape.name = attr
                                .unescape_value()
                                .map(|v| v.into_owned())
                                .unwrap_or_default();
                        }
                        _ => {}
                    }
                }
            }
            b"off" if !self.has_offset => {
                self.has_offset = true;
                self.shape.positioned = true;
                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"x" => self.shape.x = parse_attr(&attr.value).unwrap_or(0),
                        b"y" => self.shape.y = parse_attr(&attr.value).unwrap_or(0),
                        _ => {}
                    }
                }
            }
            b"ext" if !self.has_extent && self.has_offset => {
                // `a:ext` also names extension-list entries; only the one
                // following the offset is the shape size.
                self.has_extent = true;
                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"cx" => self.shape.cx = parse_attr(&attr.value).unwrap_or(0),
                        b"cy" => self.shape.cy = parse_attr(&attr.value).unwrap_or(0),
                        _ => {}
                    }
                }
            }
            b"ph" if self.shape.placeholder.is_none() => {
                let mut ph = Placeholder::default();
                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"type" => ph.ph_type = String::from_utf8_lossy(&attr.value).to_string(),
                        b"idx" => ph.idx = parse_attr(&attr.value).unwrap_or(0),
                        _ => {}
                    }
                }
                self.shape.placeholder = Some(ph);
            }
            b"txBody" if self.shape.kind == Some(RawKind::Sp) => {
                self.shape.text.get_or_insert_with(String::new);
            }
            b"p" => {
                if let Some(text) = self.shape.text.as_mut() {
                    if !text.is_empty() {
                        text.push('\n');
                    }
                }
            }
            b"br" => {
                if let Some(text) = self.shape.text.as_mut() {
                    text.push('\n');
                }
            }
            b"blip" if self.shape.kind == Some(RawKind::Pic) => {
                for attr in e.attributes().flatten() {
                    let value = String::from_utf8_lossy(&attr.value).to_string();
                    match attr.key.local_name().as_ref() {
                        b"embed" => self.shape.embed = Some(value),
                        b"link" => self.shape.link = Some(value),
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }
}

/// Read the top-level shapes of a slide, in document order.
pub fn extract_shapes(xml: &str) -> Result<Vec<RawShape>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);

    let mut shapes = Vec::new();
    let mut in_tree = false;
    let mut current: Option<Builder> = None;
    // Depth inside an `mc:Fallback`, whose content duplicates `mc:Choice`.
    let mut fallback_depth = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let local = e.local_name();
                let local = local.as_ref();

                if fallback_depth > 0 {
                    fallback_depth += 1;
                    continue;
                }
                if local == b"Fallback" {
                    fallback_depth = 1;
                    continue;
                }

                match current.as_mut() {
                    Some(builder) => {
                        builder.depth += 1;
                        if raw_kind(local).is_some() {
                            builder.nested += 1;
                        }
                        builder.element(e);
                        if local == b"t" && builder.nested == 0 {
                            builder.in_text = true;
                        }
                    }
                    None if local == b"spTree" => in_tree = true,
                    None if in_tree => {
                        if let Some(kind) = raw_kind(local) {
                            current = Some(Builder::new(kind));
                        }
                    }
                    None => {}
                }
            }
            Ok(Event::Empty(ref e)) => {
                if fallback_depth > 0 {
                    continue;
                }
                match current.as_mut() {
                    Some(builder) => builder.element(e),
                    None if in_tree => {
                        // Self-closing shape element: nothing to read inside.
                        if let Some(kind) = raw_kind(e.local_name().as_ref()) {
                            shapes.push(RawShape {
                                kind: Some(kind),
                                ..RawShape::default()
                            });
                        }
                    }
                    None => {}
                }
            }
            Ok(Event::Text(ref e)) => {
                if let Some(builder) = current.as_mut() {
                    if builder.in_text {
                        let text = e
                            .unescape()
                            .map_err(|err| Error::XmlError(format!("Bad text run: {}", err)))?;
                        if let Some(buf) = builder.shape.text.as_mut() {
                            buf.push_str(&text);
                        }
                    }
                }
            }
            Ok(Event::End(ref e)) => {
                if fallback_depth > 0 {
                    fallback_depth -= 1;
                    continue;
                }

                let local = e.local_name();
                let local = local.as_ref();
                let finished = match current.as_mut() {
                    Some(builder) => {
                        builder.depth -= 1;
                        if local == b"t" {
                            builder.in_text = false;
                        }
                        if builder.depth > 0 && raw_kind(local).is_some() {
                            builder.nested -= 1;
                        }
                        builder.depth == 0
                    }
                    None => {
                        if local == b"spTree" {
                            in_tree = false;
                        }
                        false
                    }
                };

                if finished {
                    if let Some(builder) = current.take() {
                        shapes.push(builder.shape);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!(
                    "Error at position {}: {}",
                    reader.buffer_position(),
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(shapes)
}

fn parse_attr<T: std::str::FromStr>(value: &[u8]) -> Option<T> {
    std::str::from_utf8(value).ok()?.trim().parse().ok()
}
