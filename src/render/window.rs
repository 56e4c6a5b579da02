//! Window conformance: fitting one aspect ratio into another.

use glam::DVec2;

/// A 2D interval, used both for frustum image windows and aperture windows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range2 {
    pub min: DVec2,
    pub max: DVec2,
}

impl Range2 {
    pub fn new(min: DVec2, max: DVec2) -> Self {
        Self { min, max }
    }

    pub fn from_center_half_size(center: DVec2, half_size: DVec2) -> Self {
        Self::new(center - half_size, center + half_size)
    }

    pub fn size(&self) -> DVec2 {
        self.max - self.min
    }

    pub fn midpoint(&self) -> DVec2 {
        (self.min + self.max) * 0.5
    }

    pub fn aspect(&self) -> f64 {
        let size = self.size();
        if size.y != 0.0 {
            size.x / size.y
        } else {
            1.0
        }
    }
}

/// How a camera's image window is fit into a differently shaped target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowPolicy {
    /// Keep the vertical extent; crop or pad horizontally.
    #[default]
    MatchVertically,
    /// Keep the horizontal extent; crop or pad vertically.
    MatchHorizontally,
    /// Grow one axis so the whole original window stays visible.
    Fit,
    /// Shrink one axis so the target is completely filled.
    CropToFill,
    DontConform,
}

impl WindowPolicy {
    /// Reduce `Fit` and `CropToFill` to one of the match policies.
    fn resolve(self, size: DVec2, target_aspect: f64) -> WindowPolicy {
        match self {
            WindowPolicy::MatchVertically
            | WindowPolicy::MatchHorizontally
            | WindowPolicy::DontConform => self,
            WindowPolicy::Fit | WindowPolicy::CropToFill => {
                let aspect = if size.y != 0.0 { size.x / size.y } else { 1.0 };
                if (self == WindowPolicy::Fit) == (aspect > target_aspect) {
                    WindowPolicy::MatchHorizontally
                } else {
                    WindowPolicy::MatchVertically
                }
            }
        }
    }
}

/// Rescale `window` around its midpoint along one axis so that its aspect
/// ratio becomes `target_aspect`.
pub fn conformed_window(window: Range2, policy: WindowPolicy, target_aspect: f64) -> Range2 {
    let size = window.size();
    let center = window.midpoint();
    match policy.resolve(size, target_aspect) {
        WindowPolicy::DontConform => window,
        WindowPolicy::MatchHorizontally => {
            let height = if target_aspect != 0.0 {
                size.x / target_aspect
            } else {
                size.y
            };
            Range2::new(
                DVec2::new(window.min.x, center.y - height * 0.5),
                DVec2::new(window.max.x, center.y + height * 0.5),
            )
        }
        _ => {
            let width = size.y * target_aspect;
            Range2::new(
                DVec2::new(center.x - width * 0.5, window.min.y),
                DVec2::new(center.x + width * 0.5, window.max.y),
            )
        }
    }
}

/// Width over height with the height clamped to at least one pixel.
pub fn viewport_aspect(width: f64, height: f64) -> f64 {
    width / height.max(1.0)
}

/// A pixel rectangle given by origin and size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportRect {
    pub origin: DVec2,
    pub size: DVec2,
}

impl ViewportRect {
    pub fn new(origin: DVec2, size: DVec2) -> Self {
        Self { origin, size }
    }

    /// The whole window, with each dimension clamped to at least one pixel.
    pub fn window(width: f64, height: f64) -> Self {
        Self::new(DVec2::ZERO, DVec2::new(width.max(1.0), height.max(1.0)))
    }

    pub fn as_range(&self) -> Range2 {
        Range2::new(self.origin, self.origin + self.size)
    }

    pub fn from_range(range: Range2) -> Self {
        Self::new(range.min, range.size())
    }

    /// Snap to whole pixels, trimming a pixel from both sides of any axis
    /// that grew by more than a pixel while rounding outwards.
    pub fn make_centered_integral(&self) -> Self {
        let mut left = self.origin.x.floor();
        let mut bottom = self.origin.y.floor();
        let right = (self.origin.x + self.size.x).ceil();
        let top = (self.origin.y + self.size.y).ceil();
        let mut width = right - left;
        let mut height = top - bottom;

        if height - self.size.y > 1.0 {
            bottom += 1.0;
            height -= 2.0;
        }
        if width - self.size.x > 1.0 {
            left += 1.0;
            width -= 2.0;
        }
        Self::new(DVec2::new(left, bottom), DVec2::new(width, height))
    }
}
