use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::pipeline::redaction_config::RedactionConfig;
use crate::redaction::domain::region_redactor::RegionRedactor;

use super::gaussian_blur_filter::GaussianBlurFilter;
use super::outline_redactor::OutlinedRedactor;
use super::pixelate_filter::PixelateFilter;

/// How detected regions are obscured.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedactionStrategy {
    #[default]
    Pixelate,
    GaussianBlur,
}

impl fmt::Display for RedactionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RedactionStrategy::Pixelate => write!(f, "pixelate"),
            RedactionStrategy::GaussianBlur => write!(f, "gaussian_blur"),
        }
    }
}

impl FromStr for RedactionStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pixelate" => Ok(RedactionStrategy::Pixelate),
            "gaussian" | "gaussian_blur" | "blur" => Ok(RedactionStrategy::GaussianBlur),
            other => Err(format!(
                "redaction strategy must be 'pixelate' or 'gaussian_blur', got '{other}'"
            )),
        }
    }
}

/// Builds the redactor described by `config`, wrapped with an outline
/// decorator when one is configured.
pub fn create_redactor(config: &RedactionConfig) -> Box<dyn RegionRedactor> {
    let base: Box<dyn RegionRedactor> = match config.redaction_strategy {
        RedactionStrategy::Pixelate => {
            log::info!(
                "Redacting with block-mean pixelation ({0}x{0} blocks)",
                config.pixelation_block_count
            );
            Box::new(PixelateFilter::new(config.pixelation_block_count))
        }
        RedactionStrategy::GaussianBlur => {
            log::info!(
                "Redacting with Gaussian blur (kernel_size={}, sigma={})",
                config.gaussian_kernel_size,
                config.gaussian_sigma
            );
            Box::new(GaussianBlurFilter::new(
                config.gaussian_kernel_size,
                config.gaussian_sigma,
            ))
        }
    };

    match config.outline {
        Some(style) => Box::new(OutlinedRedactor::new(base, style)),
        None => base,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::redaction::infrastructure::outline_redactor::OutlineStyle;
    use crate::shared::frame::Frame;
    use crate::shared::pixel_rect::PixelRect;
    use rstest::rstest;

    fn checker_frame() -> Frame {
        let mut frame = Frame::filled(40, 40, [0, 0, 0], 0);
        let mut arr = frame.as_ndarray_mut();
        for y in 0..40 {
            for x in 0..40 {
                if (x + y) % 2 == 0 {
                    arr[[y, x, 0]] = 255;
                }
            }
        }
        frame
    }

    #[rstest]
    #[case("pixelate", RedactionStrategy::Pixelate)]
    #[case("gaussian_blur", RedactionStrategy::GaussianBlur)]
    #[case("gaussian", RedactionStrategy::GaussianBlur)]
    fn test_parse_strategy(#[case] text: &str, #[case] expected: RedactionStrategy) {
        assert_eq!(text.parse::<RedactionStrategy>().unwrap(), expected);
    }

    #[test]
    fn test_parse_unknown_strategy() {
        assert!("mosaic".parse::<RedactionStrategy>().is_err());
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&RedactionStrategy::GaussianBlur).unwrap();
        assert_eq!(json, "\"gaussian_blur\"");
    }

    #[rstest]
    #[case::pixelate(RedactionStrategy::Pixelate)]
    #[case::gaussian(RedactionStrategy::GaussianBlur)]
    fn test_created_redactor_modifies_region(#[case] strategy: RedactionStrategy) {
        let config = RedactionConfig {
            redaction_strategy: strategy,
            gaussian_kernel_size: 5,
            gaussian_sigma: 1.0,
            ..RedactionConfig::default()
        };
        let redactor = create_redactor(&config);
        let mut frame = checker_frame();
        let original = frame.clone();
        redactor.redact(&mut frame, &[PixelRect::new(10, 10, 30, 30)]);
        assert_ne!(frame, original);
        assert_eq!(frame.as_ndarray()[[0, 0, 0]], 255);
    }

    #[test]
    fn test_outline_is_applied_when_configured() {
        let config = RedactionConfig {
            outline: Some(OutlineStyle {
                thickness: 1,
                color: [1, 2, 3],
            }),
            ..RedactionConfig::default()
        };
        let redactor = create_redactor(&config);
        let mut frame = checker_frame();
        redactor.redact(&mut frame, &[PixelRect::new(10, 10, 30, 30)]);
        let arr = frame.as_ndarray();
        assert_eq!([arr[[10, 10, 0]], arr[[10, 10, 1]], arr[[10, 10, 2]]], [1, 2, 3]);
    }
}
