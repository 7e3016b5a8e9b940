//! Deck-level extraction: the entry point front ends call.

use crate::config::ExtractorConfig;
use crate::error::{Error, Result};
use crate::processor::{SlideOutcome, SlideProcessor};
use crate::store::SlotStore;
use crate::types::Deck;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Reads a deck file into the shape model.
///
/// Implemented by container-format backends (e.g. PPTX).
pub trait DeckReader {
    fn read_deck(&self, path: &Path) -> Result<Deck>;
}

/// Totals of one extraction run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionSummary {
    /// Deck base name.
    pub deck: String,

    /// Folder holding the slot folders.
    pub output_dir: PathBuf,

    /// Number of slides in the deck.
    pub total: usize,

    /// Slides whose five slot files were written.
    pub extracted: usize,

    /// 1-based indices of slides that were skipped or rolled back, ascending.
    pub skipped: Vec<usize>,
}

impl ExtractionSummary {
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}

/// Extracts slot photos from every slide of a deck.
pub struct DeckExtractor<R: DeckReader> {
    reader: R,
    config: ExtractorConfig,
}

impl<R: DeckReader> DeckExtractor<R> {
    /// Create an extractor with the default template settings.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            config: ExtractorConfig::default(),
        }
    }

    /// Use custom settings.
    pub fn with_config(mut self, config: ExtractorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Extract every slide of `deck_path` into `output_root/<deck name>/<SLOT>/`.
    pub fn extract(&self, deck_path: &Path, output_root: &Path) -> Result<ExtractionSummary> {
        self.extract_with_progress(deck_path, output_root, |_, _| {})
    }

    /// Like [`extract`](Self::extract), calling `progress(done, total)` after each slide.
    pub fn extract_with_progress<F>(
        &self,
        deck_path: &Path,
        output_root: &Path,
        mut progress: F,
    ) -> Result<ExtractionSummary>
    where
        F: FnMut(usize, usize),
    {
        if !deck_path.is_file() {
            return Err(Error::DeckNotFound(deck_path.to_path_buf()));
        }

        let deck_name = deck_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "deck".to_string());
        let store = SlotStore::create(output_root.join(&deck_name))?;

        let deck = self.reader.read_deck(deck_path)?;
        log::debug!("read {} slides from {}", deck.slides.len(), deck_path.display());

        let processor = SlideProcessor::new(&self.config, &store);
        let total = deck.slides.len();
        let mut skipped = Vec::new();

        for (done, slide) in deck.slides.iter().enumerate() {
            log::info!("slide {}: processing", slide.index);
            let outcome = processor.process(slide);
            if let SlideOutcome::RolledBack { slot, removed, .. } = &outcome {
                log::warn!(
                    "slide {}: rolled back after {} failure ({} files removed)",
                    slide.index,
                    slot,
                    removed.len()
                );
            }
            if !outcome.is_success() {
                skipped.push(slide.index);
            }
            progress(done + 1, total);
        }

        let summary = ExtractionSummary {
            deck: deck_name,
            output_dir: store.root().to_path_buf(),
            total,
            extracted: total - skipped.len(),
            skipped,
        };

        log::info!("extraction finished: {}", summary.output_dir.display());
        log::info!(
            "{} slides, {} extracted, {} skipped",
            summary.total,
            summary.extracted,
            summary.skipped_count()
        );
        if !summary.skipped.is_empty() {
            log::info!("skipped slides: {:?}", summary.skipped);
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EMU_PER_POINT;
    use crate::types::{ImageRef, Shape, ShapeKind, Slide, Slot};
    use std::fs;
    use tempfile::TempDir;

    const PT: i64 = EMU_PER_POINT;

    /// Serves a prepared deck regardless of the path.
    struct FixedReader(Deck);

    impl DeckReader for FixedReader {
        fn read_deck(&self, _path: &Path) -> Result<Deck> {
            Ok(self.0.clone())
        }
    }

    fn photo(tag: &str, left: i64, top: i64) -> Shape {
        Shape::new(
            ShapeKind::Picture {
                image: ImageRef::new("image/jpeg", tag.as_bytes().to_vec()),
            },
            left,
            top,
            120 * PT,
            120 * PT,
        )
    }

    fn template_slide(index: usize, caption: &str, photos: usize) -> Slide {
        let positions = [(0, 0), (300, 0), (450, 0), (300, 150), (450, 150)];
        let mut slide = Slide::new(index);
        for (i, (left, top)) in positions.iter().take(photos).enumerate() {
            slide.add_shape(photo(&format!("{}-{}", index, i), left * PT, top * PT));
        }
        slide.add_shape(Shape::new(
            ShapeKind::Text {
                text: caption.to_string(),
            },
            0,
            300 * PT,
            200 * PT,
            20 * PT,
        ));
        slide
    }

    fn deck_file(dir: &Path) -> PathBuf {
        let path = dir.join("models.pptx");
        fs::write(&path, b"placeholder").unwrap();
        path
    }

    #[test]
    fn test_missing_deck_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let extractor = DeckExtractor::new(FixedReader(Deck::new("x")));
        match extractor.extract(&tmp.path().join("nope.pptx"), tmp.path()) {
            Err(Error::DeckNotFound(path)) => assert!(path.ends_with("nope.pptx")),
            other => panic!("expected DeckNotFound, got {:?}", other),
        }
        assert!(!tmp.path().join("nope").exists());
    }

    #[test]
    fn test_three_slides_one_short() {
        let tmp = TempDir::new().unwrap();
        let mut deck = Deck::new("models");
        deck.add_slide(template_slide(1, "지민 (97) 175cm", 5));
        deck.add_slide(template_slide(2, "윤호 (95) 180cm", 4));
        deck.add_slide(template_slide(3, "VINCENT 1997's 179cm 프랑스", 5));

        let extractor = DeckExtractor::new(FixedReader(deck));
        let deck_path = deck_file(tmp.path());
        let out = tmp.path().join("output");

        let mut ticks = Vec::new();
        let summary = extractor
            .extract_with_progress(&deck_path, &out, |done, total| ticks.push((done, total)))
            .unwrap();

        assert_eq!(summary.deck, "models");
        assert_eq!(summary.total, 3);
        assert_eq!(summary.extracted, 2);
        assert_eq!(summary.skipped, vec![2]);
        assert_eq!(ticks, vec![(1, 3), (2, 3), (3, 3)]);

        let main_dir = out.join("models").join(Slot::Main.as_str());
        let mut names: Vec<String> = fs::read_dir(&main_dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["VINCENT(97)179cm_MAIN.jpg", "지민(97)175cm_MAIN.jpg"]);
        for slot in Slot::ALL {
            assert!(out.join("models").join(slot.as_str()).is_dir());
        }
    }

    #[test]
    fn test_skipped_count() {
        let summary = ExtractionSummary {
            deck: "models".into(),
            output_dir: PathBuf::from("out/models"),
            total: 3,
            extracted: 2,
            skipped: vec![2],
        };
        assert_eq!(summary.skipped_count(), 1);
    }
}
