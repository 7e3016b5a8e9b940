//! PPTX (OOXML) deck reader.
//!
//! Parses .pptx files, which are ZIP archives of XML parts, into the shape
//! model of `slotdeck-core`: per slide, every top-level shape with its kind,
//! geometry, text and embedded picture bytes.

pub mod package;
pub mod parser;
pub mod shapes;

pub use parser::PptxReader;
