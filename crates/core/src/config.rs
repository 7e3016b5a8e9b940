//! Extraction settings.

/// EMU per typographic point.
pub const EMU_PER_POINT: i64 = 12_700;

/// Default minimum photo edge, in points. Tuned to the five-photo profile
/// template; smaller pictures are icons and logos.
pub const DEFAULT_MIN_SIZE_POINTS: i64 = 100;

/// Default output root when none is given.
pub const DEFAULT_OUTPUT_DIR: &str = "./output";

/// Settings shared by every slide of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractorConfig {
    /// Minimum picture width (EMU) to count as a photograph.
    pub min_width: i64,

    /// Minimum picture height (EMU) to count as a photograph.
    pub min_height: i64,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            min_width: DEFAULT_MIN_SIZE_POINTS * EMU_PER_POINT,
            min_height: DEFAULT_MIN_SIZE_POINTS * EMU_PER_POINT,
        }
    }
}

impl ExtractorConfig {
    /// Create a config with the template defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the minimum photo size in points.
    pub fn with_min_size_points(mut self, width: i64, height: i64) -> Self {
        self.min_width = width.max(0).saturating_mul(EMU_PER_POINT);
        self.min_height = height.max(0).saturating_mul(EMU_PER_POINT);
        self
    }
}
