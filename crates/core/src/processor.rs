//! Per-slide pipeline: filter, classify, parse caption, extract, store.
//!
//! All five images are prepared in memory before the first write, and the
//! writes run inside a [`WriteTransaction`](crate::store::WriteTransaction),
//! so a slide ends up with either all five slot files on disk or none.

use crate::caption::parse_caption;
use crate::classify::{classify_slots, filter_photos, PHOTOS_PER_SLIDE};
use crate::config::ExtractorConfig;
use crate::image::{extract_image, ExtractedImage};
use crate::store::SlotStore;
use crate::types::{Slide, Slot};
use std::path::PathBuf;

/// Why a slide was skipped before anything was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The slide does not carry exactly five photographs.
    ImageCount { found: usize },
    /// A slot image could not be read.
    Extraction { slot: Slot, reason: String },
}

/// Final state of one slide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlideOutcome {
    /// All five slot files were written.
    Extracted { base_name: String, written: Vec<PathBuf> },
    /// Nothing was written.
    Skipped(SkipReason),
    /// A write failed; files already written for the slide were removed.
    RolledBack {
        slot: Slot,
        error: String,
        removed: Vec<PathBuf>,
    },
}

impl SlideOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SlideOutcome::Extracted { .. })
    }

    /// Paths written and kept for the slide.
    pub fn written(&self) -> &[PathBuf] {
        match self {
            SlideOutcome::Extracted { written, .. } => written,
            _ => &[],
        }
    }
}

/// Runs the slot pipeline on single slides against one store.
#[derive(Debug)]
pub struct SlideProcessor<'a> {
    config: &'a ExtractorConfig,
    store: &'a SlotStore,
}

impl<'a> SlideProcessor<'a> {
    pub fn new(config: &'a ExtractorConfig, store: &'a SlotStore) -> Self {
        Self { config, store }
    }

    /// Process one slide. Every per-slide failure becomes an outcome; nothing
    /// here aborts the run.
    pub fn process(&self, slide: &Slide) -> SlideOutcome {
        let photos = filter_photos(slide, self.config);

        // The classifier rejects anything but five photographs.
        let assignment = match classify_slots(&photos) {
            Ok(assignment) => assignment,
            Err(e) => {
                log::warn!("slide {}: {}, skipping", slide.index, e);
                return SlideOutcome::Skipped(SkipReason::ImageCount {
                    found: photos.len(),
                });
            }
        };

        let base_name = parse_caption(slide).base_name();

        // Prepare phase: nothing touches the disk until every slot is readable.
        let mut prepared: Vec<ExtractedImage> = Vec::with_capacity(PHOTOS_PER_SLIDE);
        for (slot, shape) in assignment.iter() {
            match extract_image(shape, slot) {
                Ok(image) => prepared.push(image),
                Err(e) => {
                    log::warn!("slide {}: {}, skipping whole slide", slide.index, e);
                    return SlideOutcome::Skipped(SkipReason::Extraction {
                        slot,
                        reason: e.to_string(),
                    });
                }
            }
        }

        // Commit phase.
        let mut tx = self.store.transaction();
        for image in &prepared {
            match tx.save(image, &base_name) {
                Ok(path) => log::info!("  {}: saved {}", image.slot, file_name(&path)),
                Err(e) => {
                    log::warn!(
                        "slide {}: {} write failed ({}), rolling back",
                        slide.index,
                        image.slot,
                        e
                    );
                    let removed = tx.rollback();
                    return SlideOutcome::RolledBack {
                        slot: image.slot,
                        error: e.to_string(),
                        removed,
                    };
                }
            }
        }

        SlideOutcome::Extracted {
            base_name,
            written: tx.commit(),
        }
    }
}

fn file_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
