//! Engine options with TOML file support.
//!
//! Camera defaults, animation timing and framebuffer settings live here.
//! Options serialize to/from TOML; every section uses `#[serde(default)]`
//! so partial files work.

mod animation;
mod camera;
mod render;

use std::path::Path;

pub use animation::AnimationOptions;
pub use camera::CameraOptions;
pub use render::RenderOptions;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::TouchviewError;
use crate::util::frame_timing::validate_frame_interval;

/// Top-level options container.
#[derive(
    Debug, Clone, Serialize, Deserialize, PartialEq, Default, JsonSchema,
)]
#[serde(default)]
pub struct Options {
    /// Default view and clipping parameters.
    pub camera: CameraOptions,
    /// Restore-view tween and idle timer settings.
    pub animation: AnimationOptions,
    /// Framebuffer and display-link settings.
    pub render: RenderOptions,
}

impl Options {
    /// Generate JSON Schema describing the UI-exposed options.
    #[must_use]
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(Options)
    }

    /// Load options from a TOML file. Missing fields use defaults.
    ///
    /// # Errors
    ///
    /// [`TouchviewError::Io`] if the file cannot be read,
    /// [`TouchviewError::OptionsParse`] if it is not valid TOML, and
    /// [`TouchviewError::InvalidArgument`] if a value is out of range.
    pub fn load(path: &Path) -> Result<Self, TouchviewError> {
        let content = std::fs::read_to_string(path)?;
        let options = Self::from_toml(&content)?;
        log::info!("loaded options from {}", path.display());
        Ok(options)
    }

    /// Parse and validate options from TOML text.
    ///
    /// # Errors
    ///
    /// [`TouchviewError::OptionsParse`] or
    /// [`TouchviewError::InvalidArgument`].
    pub fn from_toml(content: &str) -> Result<Self, TouchviewError> {
        let options: Self = toml::from_str(content)
            .map_err(|e| TouchviewError::OptionsParse(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    /// Save options to a TOML file (pretty-printed).
    ///
    /// # Errors
    ///
    /// [`TouchviewError`] if serialization or writing fails.
    pub fn save(&self, path: &Path) -> Result<(), TouchviewError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| TouchviewError::OptionsParse(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject values the engine cannot run with.
    ///
    /// # Errors
    ///
    /// [`TouchviewError::InvalidArgument`] naming the first bad field.
    pub fn validate(&self) -> Result<(), TouchviewError> {
        validate_frame_interval(self.render.frame_interval)?;
        if self.render.refresh_hz == 0 {
            return Err(TouchviewError::invalid_argument(
                "render.refresh_hz",
                "display refresh rate must be positive",
            ));
        }
        let lens = self.camera.lens_length;
        if !lens.is_finite() || lens <= 0.0 {
            return Err(TouchviewError::invalid_argument(
                "camera.lens_length",
                format!("{lens} is not a positive length"),
            ));
        }
        let padding = self.camera.extents_padding;
        if !padding.is_finite() || padding <= 0.0 {
            return Err(TouchviewError::invalid_argument(
                "camera.extents_padding",
                format!("{padding} is not a positive scale"),
            ));
        }
        let ratio = self.camera.min_near_ratio;
        if ratio.is_nan() || ratio <= 0.0 || ratio >= 1.0 {
            return Err(TouchviewError::invalid_argument(
                "camera.min_near_ratio",
                "must lie strictly between 0 and 1",
            ));
        }
        let margin = self.camera.clip_margin_ratio;
        if margin.is_nan() || margin < 0.0 {
            return Err(TouchviewError::invalid_argument(
                "camera.clip_margin_ratio",
                "must not be negative",
            ));
        }
        if self.animation.inactivity_interval_ms == 0 {
            return Err(TouchviewError::invalid_argument(
                "animation.inactivity_interval_ms",
                "inactivity interval must be positive",
            ));
        }
        Ok(())
    }
}
