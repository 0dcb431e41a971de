use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::redaction::domain::bounding_box_mapper::{BoundingBoxMapper, ClampPolicy, MarginPolicy};
use crate::redaction::infrastructure::outline_redactor::OutlineStyle;
use crate::redaction::infrastructure::redactor_factory::RedactionStrategy;
use crate::shared::constants::{
    DEFAULT_GAUSSIAN_KERNEL_SIZE, DEFAULT_GAUSSIAN_SIGMA, DEFAULT_MARGIN_HEIGHT_DIVISOR,
    DEFAULT_MARGIN_WIDTH_DIVISOR, DEFAULT_PIXELATION_BLOCKS, DEFAULT_WINDOW_DIVISOR,
    MAX_LOOKAHEAD_FRAMES,
};
use crate::shared::error::RedactionError;

/// Tunables for one redaction run.
///
/// Every field has a default, so a JSON file only needs the keys it changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedactionConfig {
    pub pixelation_block_count: u32,
    pub expansion_margin_width_divisor: u32,
    pub expansion_margin_height_divisor: u32,
    pub window_divisor: f64,
    pub redaction_strategy: RedactionStrategy,
    /// Frames held back before writing; each region also covers this many
    /// frames after its window. At most [`MAX_LOOKAHEAD_FRAMES`].
    pub lookahead_frames: usize,
    pub clamp_policy: ClampPolicy,
    pub gaussian_kernel_size: usize,
    pub gaussian_sigma: f64,
    pub outline: Option<OutlineStyle>,
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            pixelation_block_count: DEFAULT_PIXELATION_BLOCKS,
            expansion_margin_width_divisor: DEFAULT_MARGIN_WIDTH_DIVISOR,
            expansion_margin_height_divisor: DEFAULT_MARGIN_HEIGHT_DIVISOR,
            window_divisor: DEFAULT_WINDOW_DIVISOR,
            redaction_strategy: RedactionStrategy::default(),
            lookahead_frames: 0,
            clamp_policy: ClampPolicy::default(),
            gaussian_kernel_size: DEFAULT_GAUSSIAN_KERNEL_SIZE,
            gaussian_sigma: DEFAULT_GAUSSIAN_SIGMA,
            outline: None,
        }
    }
}

impl RedactionConfig {
    pub fn from_json_file(path: &Path) -> Result<Self, RedactionError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            RedactionError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(json: &str) -> Result<Self, RedactionError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| RedactionError::Configuration(format!("invalid config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), RedactionError> {
        let fail = |msg: String| Err(RedactionError::Configuration(msg));

        if self.pixelation_block_count == 0 {
            return fail("pixelation_block_count must be positive".into());
        }
        if self.expansion_margin_width_divisor == 0 || self.expansion_margin_height_divisor == 0 {
            return fail(format!(
                "margin divisors must be positive, got {}/{}",
                self.expansion_margin_width_divisor, self.expansion_margin_height_divisor
            ));
        }
        if !self.window_divisor.is_finite() || self.window_divisor <= 0.0 {
            return fail(format!(
                "window_divisor must be positive, got {}",
                self.window_divisor
            ));
        }
        if self.lookahead_frames > MAX_LOOKAHEAD_FRAMES {
            return fail(format!(
                "lookahead_frames must be at most {MAX_LOOKAHEAD_FRAMES}, got {}",
                self.lookahead_frames
            ));
        }
        if self.gaussian_kernel_size == 0 || self.gaussian_kernel_size % 2 == 0 {
            return fail(format!(
                "gaussian_kernel_size must be odd, got {}",
                self.gaussian_kernel_size
            ));
        }
        if !self.gaussian_sigma.is_finite() || self.gaussian_sigma <= 0.0 {
            return fail(format!(
                "gaussian_sigma must be positive, got {}",
                self.gaussian_sigma
            ));
        }
        if let Some(style) = &self.outline {
            if style.thickness == 0 {
                return fail("outline thickness must be positive".into());
            }
        }
        Ok(())
    }

    pub fn margin_policy(&self) -> MarginPolicy {
        MarginPolicy::new(
            self.expansion_margin_width_divisor,
            self.expansion_margin_height_divisor,
        )
    }

    pub fn bounding_box_mapper(&self) -> BoundingBoxMapper {
        BoundingBoxMapper::new(self.margin_policy(), self.clamp_policy)
    }
}
