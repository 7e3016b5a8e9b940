//! Slide interpretation pipeline for five-photo profile decks: photo
//! filtering, positional slot classification, caption parsing and
//! all-or-nothing slot storage.

pub mod caption;
pub mod classify;
pub mod config;
pub mod error;
pub mod extractor;
pub mod image;
pub mod processor;
pub mod store;
pub mod types;

pub use caption::{parse_caption, CaptionSource, Identity};
pub use classify::{classify_slots, filter_photos};
pub use config::ExtractorConfig;
pub use error::{Error, Result};
pub use extractor::{DeckExtractor, DeckReader, ExtractionSummary};
pub use image::{extract_image, ExtractedImage};
pub use processor::{SkipReason, SlideOutcome, SlideProcessor};
pub use store::{SlotStore, WriteTransaction};
pub use types::{Deck, DeckFormat, ImageRef, Shape, ShapeKind, Slide, Slot, SlotAssignment};
