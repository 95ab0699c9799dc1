use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::camera::frustum::ClipParams;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Camera", inline)]
#[serde(default)]
/// Default view and clipping parameters.
pub struct CameraOptions {
    /// 35 mm equivalent lens length of synthesized views.
    #[schemars(
        title = "Lens Length",
        range(min = 10.0, max = 300.0),
        extend("step" = 1.0)
    )]
    pub lens_length: f64,
    /// Scale of the scene box fitted by the default view.
    #[schemars(
        title = "Extents Padding",
        range(min = 0.5, max = 3.0),
        extend("step" = 0.05)
    )]
    pub extents_padding: f64,
    /// Room added around the scene depth range, relative to that range.
    #[schemars(skip)]
    pub clip_margin_ratio: f64,
    /// Smallest allowed near / far ratio.
    #[schemars(skip)]
    pub min_near_ratio: f64,
}

impl Default for CameraOptions {
    fn default() -> Self {
        let clip = ClipParams::default();
        Self {
            lens_length: 50.0,
            extents_padding: 1.0,
            clip_margin_ratio: clip.margin_ratio,
            min_near_ratio: clip.min_near_ratio,
        }
    }
}

impl CameraOptions {
    /// Near/far fitting parameters.
    #[must_use]
    pub fn clip_params(&self) -> ClipParams {
        ClipParams {
            margin_ratio: self.clip_margin_ratio,
            min_near_ratio: self.min_near_ratio,
        }
    }
}
