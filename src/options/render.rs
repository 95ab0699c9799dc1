use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Render", inline)]
#[serde(default)]
/// Framebuffer and display-link settings.
pub struct RenderOptions {
    /// Sample count ceiling for the multisampled target (1 disables MSAA).
    #[schemars(title = "MSAA Samples", range(min = 1, max = 16))]
    pub msaa_samples: u32,
    /// Draw every n-th display refresh. Must be at least 1.
    #[schemars(title = "Frame Interval", range(min = 1, max = 4))]
    pub frame_interval: u32,
    /// Display refresh rate in Hz.
    #[schemars(skip)]
    pub refresh_hz: u32,
    /// Linear RGBA clear color.
    #[schemars(skip)]
    pub clear_color: [f64; 4],
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            msaa_samples: 8,
            frame_interval: 1,
            refresh_hz: 60,
            clear_color: [0.08, 0.09, 0.11, 1.0],
        }
    }
}
