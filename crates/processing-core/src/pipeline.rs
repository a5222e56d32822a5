//! The per-frame transform pipeline.
//!
//! Steps always run in this order, each one optional except normalization
//! and color mapping:
//!
//! 1. top-reflection suppression
//! 2. bottom-reflection suppression
//! 3. normalization to 8 bits
//! 4. pseudo-color mapping
//! 5. integer upscale
//! 6. text overlay
//!
//! Rendering is a pure function of the raw frame, its matched record and the
//! configuration. The raw frame is never modified.

use image::RgbImage;
use ndarray::{Array2, CowArray, Ix2};

use meltview_common::config::RenderDefaults;
use meltview_common::error::{MeltviewError, MeltviewResult};
use meltview_session_model::record::{MatchedRecord, ReflectionBounds};
use meltview_session_model::thermal::{ThermalFrame, ThermalStack};

use crate::colormap::{apply_colormap, normalize};
use crate::overlay::draw_overlay;
use crate::reflection::{find_lower_bounds, remove_bottom, remove_top, Persistence, TopReflection};

/// Which optional steps run, and their parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineConfig {
    /// Top-reflection thresholds; `None` skips the step.
    pub top_reflection: Option<TopReflection>,

    /// Parameters for the session-wide bottom bounds; `None` skips the step.
    pub bottom_reflection: Option<Persistence>,

    /// Integer upscale factor, at least 1.
    pub scale: u32,

    /// Draw the sensor-value overlay.
    pub overlay: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            top_reflection: None,
            bottom_reflection: None,
            scale: 1,
            overlay: false,
        }
    }
}

impl PipelineConfig {
    /// Build a config from rendering defaults and the step toggles.
    pub fn from_defaults(defaults: &RenderDefaults, top: bool, bottom: bool, overlay: bool) -> Self {
        Self {
            top_reflection: top.then_some(TopReflection {
                zero_level: defaults.zero_level_threshold,
                max_temperature: defaults.max_temp_threshold,
            }),
            bottom_reflection: bottom.then_some(Persistence {
                hot_threshold: defaults.hot_threshold,
                min_fraction: defaults.min_persistence,
            }),
            scale: defaults.scale,
            overlay,
        }
    }

    pub fn validate(&self) -> MeltviewResult<()> {
        if self.scale == 0 {
            return Err(MeltviewError::config("scale must be at least 1"));
        }
        if let Some(p) = self.bottom_reflection {
            if !(0.0..=1.0).contains(&p.min_fraction) {
                return Err(MeltviewError::config(format!(
                    "min_persistence must be within [0, 1], got {}",
                    p.min_fraction
                )));
            }
        }
        Ok(())
    }
}

/// A configured pipeline, ready to render frames of one session.
#[derive(Debug, Clone)]
pub struct FrameTransformPipeline {
    config: PipelineConfig,
    bounds: Option<ReflectionBounds>,
}

impl FrameTransformPipeline {
    /// Validate the config and compute bottom bounds from the whole stack
    /// when that step is enabled.
    pub fn prepare(config: PipelineConfig, stack: &ThermalStack) -> MeltviewResult<Self> {
        config.validate()?;
        let bounds = config
            .bottom_reflection
            .map(|params| find_lower_bounds(stack, params));
        Ok(Self { config, bounds })
    }

    /// Build a pipeline with precomputed bounds.
    pub fn with_bounds(config: PipelineConfig, bounds: ReflectionBounds) -> MeltviewResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            bounds: config.bottom_reflection.map(|_| bounds),
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn bounds(&self) -> Option<&ReflectionBounds> {
        self.bounds.as_ref()
    }

    /// Output size `(width, height)` for a source frame size.
    pub fn output_size(&self, width: usize, height: usize) -> (u32, u32) {
        (
            width as u32 * self.config.scale,
            height as u32 * self.config.scale,
        )
    }

    /// Render one frame.
    pub fn render(&self, frame: ThermalFrame<'_>, record: &MatchedRecord) -> MeltviewResult<RgbImage> {
        let mut temperatures: CowArray<'_, f32, Ix2> = frame.into();

        if let Some(thresholds) = self.config.top_reflection {
            let cleaned = remove_top(&temperatures.view(), thresholds);
            temperatures = cleaned.into();
        }
        if let Some(bounds) = &self.bounds {
            let cleaned = remove_bottom(&temperatures.view(), bounds)?;
            temperatures = cleaned.into();
        }

        let intensity: Array2<u8> = normalize(&temperatures.view());
        let mut image = apply_colormap(&intensity);

        if self.config.scale > 1 {
            image = upscale(&image, self.config.scale);
        }
        if self.config.overlay {
            draw_overlay(&mut image, record);
        }
        Ok(image)
    }
}

/// Nearest-neighbour upscale by an integer factor.
pub fn upscale(image: &RgbImage, scale: u32) -> RgbImage {
    let (width, height) = image.dimensions();
    RgbImage::from_fn(width * scale, height * scale, |x, y| {
        *image.get_pixel(x / scale, y / scale)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use meltview_session_model::sensor::SensorReading;
    use ndarray::Array3;

    fn stack() -> ThermalStack {
        ThermalStack::new(Array3::from_shape_fn((3, 12, 10), |(f, r, c)| {
            (150 + 40 * f + 30 * r + 7 * c) as f32
        }))
    }

    fn record_for(stack: &ThermalStack, index: usize) -> MatchedRecord {
        let reading = SensorReading::new(0.0, 1.0, 2.0, 3.0, 0.4);
        let max = meltview_session_model::thermal::frame_max(&stack.get(index).unwrap());
        MatchedRecord::new(index, index as f64, 0, &reading, max)
    }

    fn full_config() -> PipelineConfig {
        PipelineConfig::from_defaults(&RenderDefaults::default(), true, true, true)
    }

    #[test]
    fn test_render_is_idempotent() {
        let stack = stack();
        let mut config = full_config();
        config.scale = 2;
        let pipeline = FrameTransformPipeline::prepare(config, &stack).unwrap();
        let record = record_for(&stack, 1);

        let first = pipeline.render(stack.get(1).unwrap(), &record).unwrap();
        let second = pipeline.render(stack.get(1).unwrap(), &record).unwrap();
        assert_eq!(first.as_raw(), second.as_raw());
    }

    #[test]
    fn test_render_does_not_mutate_source() {
        let stack = stack();
        let before = stack.data().clone();
        let pipeline = FrameTransformPipeline::prepare(full_config(), &stack).unwrap();
        for i in 0..stack.len() {
            pipeline.render(stack.get(i).unwrap(), &record_for(&stack, i)).unwrap();
        }
        assert_eq!(stack.data(), &before);
    }

    #[test]
    fn test_output_dimensions_follow_scale() {
        let stack = stack();
        let pipeline = FrameTransformPipeline::prepare(PipelineConfig::default(), &stack).unwrap();
        let image = pipeline.render(stack.get(0).unwrap(), &record_for(&stack, 0)).unwrap();
        assert_eq!(image.dimensions(), (10, 12));

        let config = PipelineConfig {
            scale: 3,
            ..PipelineConfig::default()
        };
        let pipeline = FrameTransformPipeline::prepare(config, &stack).unwrap();
        assert_eq!(pipeline.output_size(10, 12), (30, 36));
        let image = pipeline.render(stack.get(0).unwrap(), &record_for(&stack, 0)).unwrap();
        assert_eq!(image.dimensions(), (30, 36));
    }

    #[test]
    fn test_zero_scale_is_a_config_error() {
        let config = PipelineConfig {
            scale: 0,
            ..PipelineConfig::default()
        };
        let err = FrameTransformPipeline::prepare(config, &stack()).unwrap_err();
        assert!(matches!(err, MeltviewError::Config { .. }));
    }

    #[test]
    fn test_bottom_bounds_blank_lower_rows() {
        let stack = stack();
        let config = PipelineConfig {
            bottom_reflection: Some(Persistence::default()),
            ..PipelineConfig::default()
        };
        let pipeline =
            FrameTransformPipeline::with_bounds(config, ReflectionBounds::uniform(6, 10)).unwrap();
        let image = pipeline.render(stack.get(2).unwrap(), &record_for(&stack, 2)).unwrap();

        let black = crate::colormap::inferno_lut()[0];
        assert!((6..12).all(|y| (0..10).all(|x| image.get_pixel(x, y).0 == black)));
        assert_ne!(image.get_pixel(9, 5).0, black);
    }

    #[test]
    fn test_upscale_replicates_pixels() {
        let mut image = RgbImage::new(2, 1);
        image.put_pixel(1, 0, image::Rgb([9, 8, 7]));
        let big = upscale(&image, 2);
        assert_eq!(big.dimensions(), (4, 2));
        assert_eq!(big.get_pixel(3, 1).0, [9, 8, 7]);
        assert_eq!(big.get_pixel(1, 1).0, [0, 0, 0]);
    }
}
