//! Photo filtering and positional slot classification.
//!
//! The template puts one tall portrait on the left and four smaller photos in
//! a 2x2 grid to its right. Classification only looks at geometry.

use crate::config::ExtractorConfig;
use crate::error::{Error, Result};
use crate::types::{Shape, Slide, SlotAssignment};

/// Number of photographs a template slide carries.
pub const PHOTOS_PER_SLIDE: usize = 5;

/// Select the photographs on a slide: picture shapes whose width and height
/// both reach the configured minimum. Text boxes, groups and connectors are
/// never candidates, whatever their size.
pub fn filter_photos<'a>(slide: &'a Slide, config: &ExtractorConfig) -> Vec<&'a Shape> {
    slide
        .pictures()
        .filter(|s| s.width >= config.min_width && s.height >= config.min_height)
        .collect()
}

/// Assign exactly five photographs to MAIN and SUB1..SUB4.
///
/// - MAIN is the leftmost photo.
/// - The other four are split by vertical position into a top and bottom pair.
/// - Each pair is ordered left to right: SUB1/SUB2 on top, SUB3/SUB4 below.
///
/// All sorts are stable, so ties keep the shapes' enumeration order.
pub fn classify_slots<'a>(photos: &[&'a Shape]) -> Result<SlotAssignment<'a>> {
    if photos.len() != PHOTOS_PER_SLIDE {
        return Err(Error::ImageCount {
            found: photos.len(),
        });
    }

    let mut by_left = photos.to_vec();
    by_left.sort_by_key(|s| s.left);
    let main = by_left[0];

    let mut subs = by_left[1..].to_vec();
    subs.sort_by_key(|s| s.top);
    let (top_row, bottom_row) = subs.split_at_mut(2);
    top_row.sort_by_key(|s| s.left);
    bottom_row.sort_by_key(|s| s.left);

    log::debug!(
        "classified: MAIN@({}, {}) top row @{} bottom row @{}",
        main.left,
        main.top,
        top_row[0].top,
        bottom_row[0].top
    );

    Ok(SlotAssignment::new([
        main,
        top_row[0],
        top_row[1],
        bottom_row[0],
        bottom_row[1],
    ]))
}
