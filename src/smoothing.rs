//! Exponential smoothing for per-frame visual parameters.

#[inline]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// A scalar that eases toward its target by a fixed fraction per frame.
///
/// With `factor` in (0, 1] the value approaches the target monotonically
/// and never overshoots it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothedParameter {
    pub current: f64,
    pub target: f64,
    factor: f64,
}

impl SmoothedParameter {
    pub fn new(initial: f64, factor: f64) -> Self {
        Self {
            current: initial,
            target: initial,
            factor: factor.clamp(0.0, 1.0),
        }
    }

    pub fn set_target(&mut self, target: f64) {
        self.target = target;
    }

    /// One frame toward `target` at this parameter's own factor.
    pub fn advance(&mut self) -> f64 {
        self.current = lerp(self.current, self.target, self.factor);
        self.current
    }

    /// One frame toward `target` at a different rate. The stored target is
    /// left alone.
    pub fn relax_toward(&mut self, target: f64, factor: f64) -> f64 {
        self.current = lerp(self.current, target, factor.clamp(0.0, 1.0));
        self.current
    }

    /// Move the value without easing, e.g. for free-running rotation.
    pub fn offset(&mut self, delta: f64) -> f64 {
        self.current += delta;
        self.current
    }
}
