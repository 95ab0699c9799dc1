//! Adaptive multisample framebuffer management.
//!
//! Two targets are owned side by side: an optional multisampled offscreen
//! target and the single-sampled visible target backed by the presentable
//! surface. While fast drawing is on, rendering goes straight to the
//! visible target; otherwise it goes to the multisampled target and is
//! resolved before presentation.
//!
//! The manager is generic over a [`RenderTargetBackend`] so the selection
//! and degradation logic runs without a GPU.

use std::fmt;

/// What a target is backed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    /// Offscreen textures owned by the target.
    Offscreen,
    /// The presentable surface plus an owned depth buffer.
    Visible,
}

/// Parameters for [`RenderTargetBackend::create_target`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetDescriptor {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Requested samples per pixel.
    pub sample_count: u32,
    /// Attach a color buffer.
    pub color: bool,
    /// Attach a depth buffer.
    pub depth: bool,
    /// Offscreen or surface-backed.
    pub kind: TargetKind,
}

/// Render-target creation or frame failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetError {
    /// The device rejected this sample count for the target format.
    UnsupportedSampleCount(u32),
    /// Width or height is zero.
    ZeroSize,
    /// The presentable surface could not be acquired.
    Surface(String),
    /// Any other backend failure.
    Backend(String),
}

impl fmt::Display for TargetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedSampleCount(n) => {
                write!(f, "sample count {n} not supported")
            }
            Self::ZeroSize => write!(f, "render target has zero size"),
            Self::Surface(msg) => write!(f, "surface unavailable: {msg}"),
            Self::Backend(msg) => write!(f, "render target error: {msg}"),
        }
    }
}

impl std::error::Error for TargetError {}

/// A created render target. Releasing happens when it is dropped.
pub trait RenderTarget {
    /// Effective samples per pixel.
    fn samples(&self) -> u32;
    /// Size in pixels.
    fn size(&self) -> (u32, u32);
    /// Whether a color buffer is attached.
    fn has_color(&self) -> bool;
    /// Whether a depth buffer is attached.
    fn has_depth(&self) -> bool;
}

/// GPU operations the framebuffer manager and render loop need.
pub trait RenderTargetBackend {
    /// Target type produced by this backend.
    type Target: RenderTarget;

    /// Allocate a target.
    ///
    /// # Errors
    ///
    /// [`TargetError`] if the backend cannot create the target.
    fn create_target(
        &mut self,
        desc: &TargetDescriptor,
    ) -> Result<Self::Target, TargetError>;

    /// Start a frame (acquire the presentable surface).
    ///
    /// # Errors
    ///
    /// [`TargetError::Surface`] if no surface image is available.
    fn begin_frame(&mut self) -> Result<(), TargetError>;

    /// Bind `target` as the draw destination for this frame.
    fn enable(&mut self, target: &Self::Target);

    /// Resolve the color of `src` into `dst`.
    fn resolve(&mut self, src: &Self::Target, dst: &Self::Target);

    /// Submit and present the frame.
    fn present(&mut self);
}

/// Which owned target is drawn into this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActiveTarget {
    /// The multisampled offscreen target.
    Multisample,
    /// The single-sampled surface-backed target.
    #[default]
    Visible,
}

/// Sample counts tried for a multisampled target: the largest power of two
/// not above `requested`, halving down to 2.
#[must_use]
pub fn sample_candidates(requested: u32) -> Vec<u32> {
    if requested < 2 {
        return Vec::new();
    }
    let mut count = 1 << (31 - requested.leading_zeros());
    let mut out = Vec::new();
    while count > 1 {
        out.push(count);
        count /= 2;
    }
    out
}

/// Owns the multisampled and visible targets.
#[derive(Debug)]
pub struct FramebufferManager<T> {
    multisample: Option<T>,
    visible: Option<T>,
    active: ActiveTarget,
    size: (u32, u32),
}

impl<T> Default for FramebufferManager<T> {
    fn default() -> Self {
        Self {
            multisample: None,
            visible: None,
            active: ActiveTarget::Visible,
            size: (0, 0),
        }
    }
}

impl<T: RenderTarget> FramebufferManager<T> {
    /// Manager with no targets.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the multisampled target, degrading the sample count until the
    /// backend accepts one.
    ///
    /// Attempts use [`sample_candidates`], so every attempt is strictly
    /// lower than the previous and none is below 2. A target reporting one
    /// sample or fewer is discarded. Returns the accepted sample count.
    pub fn create_multisample_target<B>(
        &mut self,
        backend: &mut B,
        width: u32,
        height: u32,
        requested_samples: u32,
        wants_color: bool,
        wants_depth: bool,
    ) -> Option<u32>
    where
        B: RenderTargetBackend<Target = T> + ?Sized,
    {
        self.multisample = None;
        for sample_count in sample_candidates(requested_samples) {
            let desc = TargetDescriptor {
                width,
                height,
                sample_count,
                color: wants_color,
                depth: wants_depth,
                kind: TargetKind::Offscreen,
            };
            match backend.create_target(&desc) {
                Ok(target) if target.samples() > 1 => {
                    let samples = target.samples();
                    log::info!(
                        "multisample target {width}x{height}, {samples}x"
                    );
                    self.multisample = Some(target);
                    self.size = (width, height);
                    return Some(samples);
                }
                Ok(target) => {
                    log::debug!(
                        "multisample target reported {} samples, discarded",
                        target.samples()
                    );
                    return None;
                }
                Err(e) => {
                    log::debug!("{sample_count}x MSAA rejected: {e}");
                }
            }
        }
        log::debug!("no MSAA available");
        None
    }

    /// Create the surface-backed visible target (always with depth).
    ///
    /// # Errors
    ///
    /// [`TargetError`] if the backend cannot create it.
    pub fn create_visible_target<B>(
        &mut self,
        backend: &mut B,
        width: u32,
        height: u32,
    ) -> Result<(), TargetError>
    where
        B: RenderTargetBackend<Target = T> + ?Sized,
    {
        let desc = TargetDescriptor {
            width,
            height,
            sample_count: 1,
            color: true,
            depth: true,
            kind: TargetKind::Visible,
        };
        let target = backend.create_target(&desc)?;
        log::info!("visible target {width}x{height}");
        self.visible = Some(target);
        self.size = (width, height);
        Ok(())
    }

    /// Pick the draw target: multisampled when not fast drawing and one
    /// exists, otherwise visible.
    pub fn select_active(&mut self, fast_drawing: bool) -> ActiveTarget {
        self.active = if !fast_drawing && self.multisample.is_some() {
            ActiveTarget::Multisample
        } else {
            ActiveTarget::Visible
        };
        self.active
    }

    /// Last selected target kind.
    #[must_use]
    pub fn active(&self) -> ActiveTarget {
        self.active
    }

    /// The last selected target, if it exists.
    #[must_use]
    pub fn active_target(&self) -> Option<&T> {
        match self.active {
            ActiveTarget::Multisample => self.multisample.as_ref(),
            ActiveTarget::Visible => self.visible.as_ref(),
        }
    }

    /// Resolve the target selected for this frame into the visible one.
    /// No-op when the visible target was selected.
    pub fn resolve<B>(&self, backend: &mut B)
    where
        B: RenderTargetBackend<Target = T> + ?Sized,
    {
        if self.active != ActiveTarget::Multisample {
            return;
        }
        if let (Some(src), Some(dst)) =
            (self.multisample.as_ref(), self.visible.as_ref())
        {
            backend.resolve(src, dst);
        }
    }

    /// The multisampled target, if any.
    #[must_use]
    pub fn multisample(&self) -> Option<&T> {
        self.multisample.as_ref()
    }

    /// The visible target, if created.
    #[must_use]
    pub fn visible(&self) -> Option<&T> {
        self.visible.as_ref()
    }

    /// Visible target exists.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.visible.is_some()
    }

    /// Size the targets were created at.
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    /// Drop both targets if they were created at a different size.
    /// Returns `true` when targets were dropped.
    pub fn invalidate_if_resized(&mut self, width: u32, height: u32) -> bool {
        if !self.is_initialized() || self.size == (width, height) {
            return false;
        }
        log::debug!(
            "framebuffers {}x{} -> {width}x{height}, recreating",
            self.size.0,
            self.size.1
        );
        self.teardown();
        true
    }

    /// Drop both targets; each releases its GPU memory in `Drop`.
    pub fn teardown(&mut self) {
        self.multisample = None;
        self.visible = None;
        self.active = ActiveTarget::Visible;
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Recording fake backend shared by the gpu and engine tests.

    use super::{
        RenderTarget, RenderTargetBackend, TargetDescriptor, TargetError,
        TargetKind,
    };

    #[derive(Debug, PartialEq, Eq)]
    pub(crate) struct FakeTarget {
        pub(crate) id: usize,
        pub(crate) desc: TargetDescriptor,
        pub(crate) reported_samples: u32,
    }

    impl RenderTarget for FakeTarget {
        fn samples(&self) -> u32 {
            self.reported_samples
        }

        fn size(&self) -> (u32, u32) {
            (self.desc.width, self.desc.height)
        }

        fn has_color(&self) -> bool {
            self.desc.color
        }

        fn has_depth(&self) -> bool {
            self.desc.depth
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub(crate) enum Call {
        Create(u32, TargetKind),
        BeginFrame,
        Enable(usize),
        Resolve(usize, usize),
        Present,
    }

    /// Accepts sample counts up to `max_samples`; can report a different
    /// count than requested and fail the visible target.
    #[derive(Debug, Default)]
    pub(crate) struct FakeBackend {
        pub(crate) max_samples: u32,
        pub(crate) report_samples: Option<u32>,
        pub(crate) fail_visible: bool,
        pub(crate) fail_begin: bool,
        pub(crate) calls: Vec<Call>,
        next_id: usize,
    }

    impl FakeBackend {
        pub(crate) fn with_max_samples(max_samples: u32) -> Self {
            Self {
                max_samples,
                ..Self::default()
            }
        }

        pub(crate) fn attempts(&self) -> Vec<u32> {
            self.calls
                .iter()
                .filter_map(|c| match c {
                    Call::Create(n, TargetKind::Offscreen) => Some(*n),
                    _ => None,
                })
                .collect()
        }
    }

    impl RenderTargetBackend for FakeBackend {
        type Target = FakeTarget;

        fn create_target(
            &mut self,
            desc: &TargetDescriptor,
        ) -> Result<FakeTarget, TargetError> {
            self.calls.push(Call::Create(desc.sample_count, desc.kind));
            if desc.kind == TargetKind::Visible && self.fail_visible {
                return Err(TargetError::Surface("lost".into()));
            }
            if desc.sample_count > self.max_samples.max(1) {
                return Err(TargetError::UnsupportedSampleCount(
                    desc.sample_count,
                ));
            }
            self.next_id += 1;
            Ok(FakeTarget {
                id: self.next_id,
                desc: *desc,
                reported_samples: if desc.kind == TargetKind::Visible {
                    1
                } else {
                    self.report_samples.unwrap_or(desc.sample_count)
                },
            })
        }

        fn begin_frame(&mut self) -> Result<(), TargetError> {
            self.calls.push(Call::BeginFrame);
            if self.fail_begin {
                return Err(TargetError::Surface("outdated".into()));
            }
            Ok(())
        }

        fn enable(&mut self, target: &FakeTarget) {
            self.calls.push(Call::Enable(target.id));
        }

        fn resolve(&mut self, src: &FakeTarget, dst: &FakeTarget) {
            self.calls.push(Call::Resolve(src.id, dst.id));
        }

        fn present(&mut self) {
            self.calls.push(Call::Present);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{Call, FakeBackend, FakeTarget};
    use super::*;

    fn manager() -> FramebufferManager<FakeTarget> {
        FramebufferManager::new()
    }

    #[test]
    fn candidates_halve_from_largest_power_of_two() {
        assert_eq!(sample_candidates(8), vec![8, 4, 2]);
        assert_eq!(sample_candidates(6), vec![4, 2]);
        assert_eq!(sample_candidates(2), vec![2]);
        assert!(sample_candidates(1).is_empty());
        assert!(sample_candidates(0).is_empty());
    }

    #[test]
    fn degrades_until_backend_accepts() {
        let mut backend = FakeBackend::with_max_samples(4);
        let mut fb = manager();
        let samples =
            fb.create_multisample_target(&mut backend, 64, 32, 16, true, true);
        assert_eq!(samples, Some(4));
        assert_eq!(backend.attempts(), vec![16, 8, 4]);
        assert!(fb.multisample().unwrap().has_depth());
    }

    #[test]
    fn no_msaa_when_every_attempt_fails() {
        let mut backend = FakeBackend::with_max_samples(1);
        let mut fb = manager();
        assert_eq!(
            fb.create_multisample_target(&mut backend, 64, 32, 8, true, true),
            None
        );
        assert_eq!(backend.attempts(), vec![8, 4, 2]);
        assert!(fb.multisample().is_none());
    }

    #[test]
    fn single_sample_report_is_discarded() {
        let mut backend = FakeBackend::with_max_samples(8);
        backend.report_samples = Some(1);
        let mut fb = manager();
        assert_eq!(
            fb.create_multisample_target(&mut backend, 64, 32, 8, true, false),
            None
        );
        assert!(fb.multisample().is_none());
    }

    #[test]
    fn visible_target_always_has_depth() {
        let mut backend = FakeBackend::with_max_samples(8);
        let mut fb = manager();
        fb.create_visible_target(&mut backend, 64, 32).unwrap();
        let visible = fb.visible().unwrap();
        assert!(visible.has_depth());
        assert_eq!(visible.samples(), 1);
    }

    #[test]
    fn selection_follows_fast_drawing() {
        let mut backend = FakeBackend::with_max_samples(4);
        let mut fb = manager();
        fb.create_visible_target(&mut backend, 64, 32).unwrap();
        assert_eq!(fb.select_active(false), ActiveTarget::Visible);

        let _ =
            fb.create_multisample_target(&mut backend, 64, 32, 4, true, true);
        assert_eq!(fb.select_active(true), ActiveTarget::Visible);
        assert_eq!(fb.select_active(false), ActiveTarget::Multisample);
    }

    #[test]
    fn resolve_is_elided_for_visible() {
        let mut backend = FakeBackend::with_max_samples(4);
        let mut fb = manager();
        let _ =
            fb.create_multisample_target(&mut backend, 64, 32, 4, true, true);
        fb.create_visible_target(&mut backend, 64, 32).unwrap();
        backend.calls.clear();

        let _ = fb.select_active(true);
        fb.resolve(&mut backend);
        assert!(backend.calls.is_empty());

        let _ = fb.select_active(false);
        fb.resolve(&mut backend);
        let ms = fb.multisample().unwrap().id;
        let vis = fb.visible().unwrap().id;
        assert_eq!(backend.calls, vec![Call::Resolve(ms, vis)]);
    }

    #[test]
    fn resolve_follows_selection_not_later_state() {
        let mut backend = FakeBackend::with_max_samples(4);
        let mut fb = manager();
        fb.create_visible_target(&mut backend, 64, 32).unwrap();
        assert_eq!(fb.select_active(false), ActiveTarget::Visible);

        // Created after selection; this frame still drew into visible.
        let _ =
            fb.create_multisample_target(&mut backend, 64, 32, 4, true, true);
        backend.calls.clear();
        fb.resolve(&mut backend);
        assert!(backend.calls.is_empty());
    }

    #[test]
    fn resize_invalidates_targets() {
        let mut backend = FakeBackend::with_max_samples(4);
        let mut fb = manager();
        fb.create_visible_target(&mut backend, 64, 32).unwrap();
        assert!(!fb.invalidate_if_resized(64, 32));
        assert!(fb.invalidate_if_resized(32, 64));
        assert!(!fb.is_initialized());
    }
}
