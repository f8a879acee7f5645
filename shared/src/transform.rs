use std::fmt::Write as FmtWrite;

use serde::{Deserialize, Serialize};

/// Wheel delta to zoom factor: `2^(-delta * WHEEL_SENSITIVITY)`.
const WHEEL_SENSITIVITY: f64 = 0.002;

/// Allowed zoom scale range, inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct ScaleExtent {
    pub min: f64,
    pub max: f64,
}

impl Default for ScaleExtent {
    fn default() -> Self {
        Self { min: 0.5, max: 8.0 }
    }
}

impl From<[f64; 2]> for ScaleExtent {
    fn from([min, max]: [f64; 2]) -> Self {
        Self { min, max }
    }
}

impl From<ScaleExtent> for [f64; 2] {
    fn from(e: ScaleExtent) -> Self {
        [e.min, e.max]
    }
}

impl ScaleExtent {
    pub fn clamp(&self, k: f64) -> f64 {
        k.clamp(self.min, self.max)
    }

    pub fn contains(&self, k: f64) -> bool {
        k >= self.min && k <= self.max
    }
}

/// Pan/zoom transform applied to the shape layer: `p' = p * k + (x, y)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomTransform {
    pub x: f64,
    pub y: f64,
    pub k: f64,
}

impl Default for ZoomTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ZoomTransform {
    pub const IDENTITY: Self = Self {
        x: 0.0,
        y: 0.0,
        k: 1.0,
    };

    /// Screen coordinates to layer coordinates.
    pub fn invert(&self, point: [f64; 2]) -> [f64; 2] {
        [(point[0] - self.x) / self.k, (point[1] - self.y) / self.k]
    }

    pub fn translated(self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            k: self.k,
        }
    }

    /// Scale by `factor` keeping the screen point `anchor` fixed. The resulting
    /// scale is clamped to `extent`.
    pub fn zoomed(self, factor: f64, anchor: [f64; 2], extent: ScaleExtent) -> Self {
        if factor.is_nan() || factor.is_sign_negative() {
            return self;
        }
        let k = extent.clamp(self.k * factor);
        let [wx, wy] = self.invert(anchor);
        Self {
            x: anchor[0] - wx * k,
            y: anchor[1] - wy * k,
            k,
        }
    }

    /// Linear interpolation between two transforms. Endpoints inside an extent
    /// keep every sample inside it.
    pub fn lerp(self, to: Self, t: f64) -> Self {
        Self {
            x: self.x + (to.x - self.x) * t,
            y: self.y + (to.y - self.y) * t,
            k: self.k + (to.k - self.k) * t,
        }
    }

    /// SVG `transform` attribute value.
    pub fn to_svg(&self) -> String {
        let mut out = String::with_capacity(48);
        let _ = write!(out, "translate({},{}) scale({})", self.x, self.y, self.k);
        out
    }
}

pub fn wheel_factor(delta_y: f64) -> f64 {
    2f64.powf(-delta_y * WHEEL_SENSITIVITY)
}

/// Wheel delta equivalent to a zoom factor, for pinch gestures.
pub fn wheel_delta_for(factor: f64) -> f64 {
    -factor.log2() / WHEEL_SENSITIVITY
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoomDirection {
    In,
    Out,
}

impl ZoomDirection {
    pub fn factor(self, step: f64) -> f64 {
        match self {
            Self::In => step,
            Self::Out => 1.0 / step,
        }
    }
}

/// An animated move between two transforms, sampled by frame time (ms).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomTransition {
    pub from: ZoomTransform,
    pub to: ZoomTransform,
    pub start_time: f64,
    pub duration: f64,
}

impl ZoomTransition {
    /// Returns the current transform, or None if the transition is complete.
    pub fn sample(&self, now: f64) -> Option<ZoomTransform> {
        let elapsed = now - self.start_time;
        if elapsed >= self.duration {
            return None;
        }
        let t = cubic_ease_out((elapsed / self.duration).max(0.0));
        Some(self.from.lerp(self.to, t))
    }
}

/// Cubic ease-out: decelerating to zero velocity.
fn cubic_ease_out(t: f64) -> f64 {
    let t = t - 1.0;
    t * t * t + 1.0
}

/// Untransformed layer, with the scale pulled into `extent` when 1 lies outside it.
fn resting(extent: ScaleExtent) -> ZoomTransform {
    ZoomTransform {
        k: extent.clamp(1.0),
        ..ZoomTransform::IDENTITY
    }
}

/// Owns the transform and the optional in-flight button transition.
#[derive(Debug, Clone)]
pub struct PanZoom {
    transform: ZoomTransform,
    extent: ScaleExtent,
    step: f64,
    duration_ms: f64,
    transition: Option<ZoomTransition>,
}

impl PanZoom {
    pub fn new(extent: ScaleExtent, step: f64, duration_ms: f64) -> Self {
        Self {
            transform: resting(extent),
            extent,
            step,
            duration_ms,
            transition: None,
        }
    }

    pub const fn transform(&self) -> ZoomTransform {
        self.transform
    }

    pub const fn extent(&self) -> ScaleExtent {
        self.extent
    }

    pub const fn is_animating(&self) -> bool {
        self.transition.is_some()
    }

    pub fn reset(&mut self) {
        self.transform = resting(self.extent);
        self.transition = None;
    }

    /// Wheel or pinch zoom about a screen point. Cancels any transition.
    pub fn zoom_gesture(&mut self, delta_y: f64, anchor: [f64; 2]) {
        self.transition = None;
        self.transform = self
            .transform
            .zoomed(wheel_factor(delta_y), anchor, self.extent);
    }

    /// Drag pan. Cancels any transition.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.transition = None;
        self.transform = self.transform.translated(dx, dy);
    }

    /// Discrete button zoom about `anchor`. Presses during a transition build
    /// on its pending target. Returns true when a transition was started.
    pub fn press(&mut self, direction: ZoomDirection, anchor: [f64; 2], now: f64) -> bool {
        let base = self.transition.map_or(self.transform, |t| t.to);
        let target = base.zoomed(direction.factor(self.step), anchor, self.extent);
        if self.duration_ms <= 0.0 {
            self.transition = None;
            self.transform = target;
            return false;
        }
        self.transition = Some(ZoomTransition {
            from: self.transform,
            to: target,
            start_time: now,
            duration: self.duration_ms,
        });
        true
    }

    /// Advance the transition to `now`. Returns true while more frames are needed.
    pub fn tick(&mut self, now: f64) -> bool {
        let Some(transition) = self.transition else {
            return false;
        };
        match transition.sample(now) {
            Some(current) => {
                self.transform = current;
                true
            }
            None => {
                self.transform = transition.to;
                self.transition = None;
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        let diff = (actual - expected).abs();
        assert!(diff < 1e-9, "expected {expected}, got {actual} (diff: {diff})");
    }

    #[test]
    fn zoom_keeps_anchor_fixed() {
        let t = ZoomTransform {
            x: 30.0,
            y: -12.0,
            k: 1.4,
        };
        let anchor = [250.0, 180.0];
        let before = t.invert(anchor);
        let after = t.zoomed(2.0, anchor, ScaleExtent::default());
        assert_close(before[0] * after.k + after.x, anchor[0]);
        assert_close(before[1] * after.k + after.y, anchor[1]);
        assert_close(after.k, 2.8);
    }

    #[test]
    fn wheel_factor_direction() {
        assert!(wheel_factor(100.0) < 1.0);
        assert!(wheel_factor(-100.0) > 1.0);
        assert_close(wheel_factor(500.0), 0.5);
        assert_close(wheel_factor(wheel_delta_for(1.75)), 1.75);
    }

    #[test]
    fn gestures_never_leave_extent() {
        let mut pz = PanZoom::new(ScaleExtent::default(), 1.5, 250.0);
        for delta in [-1e6, -5000.0, -3.0, 0.0, 3.0, 5000.0, 1e6, f64::MAX] {
            pz.zoom_gesture(delta, [400.0, 300.0]);
            assert!(pz.extent().contains(pz.transform().k), "k={}", pz.transform().k);
        }
    }

    #[test]
    fn repeated_presses_accumulate_and_clamp() {
        let mut pz = PanZoom::new(ScaleExtent::default(), 1.5, 250.0);
        let center = [400.0, 300.0];
        let mut now = 0.0;
        for _ in 0..20 {
            assert!(pz.press(ZoomDirection::In, center, now));
            now += 40.0;
            pz.tick(now);
            assert!(pz.extent().contains(pz.transform().k));
        }
        while pz.tick(now) {
            now += 16.0;
            assert!(pz.extent().contains(pz.transform().k));
        }
        assert_close(pz.transform().k, 8.0);
        assert!(!pz.is_animating());
    }

    #[test]
    fn press_mid_transition_targets_pending_scale() {
        let mut pz = PanZoom::new(ScaleExtent::default(), 1.5, 250.0);
        let center = [400.0, 300.0];
        pz.press(ZoomDirection::In, center, 0.0);
        pz.tick(50.0);
        pz.press(ZoomDirection::In, center, 50.0);
        pz.tick(1000.0);
        assert_close(pz.transform().k, 2.25);
    }

    #[test]
    fn gesture_cancels_transition() {
        let mut pz = PanZoom::new(ScaleExtent::default(), 1.5, 250.0);
        pz.press(ZoomDirection::Out, [400.0, 300.0], 0.0);
        pz.tick(100.0);
        let mid = pz.transform();
        pz.pan(10.0, 5.0);
        assert!(!pz.is_animating());
        assert!(!pz.tick(1000.0));
        assert_close(pz.transform().k, mid.k);
        assert_close(pz.transform().x, mid.x + 10.0);
    }

    #[test]
    fn transition_eases_out() {
        let tr = ZoomTransition {
            from: ZoomTransform::IDENTITY,
            to: ZoomTransform {
                x: 0.0,
                y: 0.0,
                k: 2.0,
            },
            start_time: 100.0,
            duration: 200.0,
        };
        assert_close(tr.sample(100.0).unwrap().k, 1.0);
        // Past the halfway point in value before halfway in time.
        assert!(tr.sample(200.0).unwrap().k > 1.5);
        assert!(tr.sample(300.0).is_none());
    }

    #[test]
    fn extent_above_one_starts_inside_it() {
        let extent = ScaleExtent { min: 2.0, max: 8.0 };
        let mut pz = PanZoom::new(extent, 1.5, 250.0);
        assert_close(pz.transform().k, 2.0);
        pz.pan(15.0, -5.0);
        assert!(extent.contains(pz.transform().k));
        pz.reset();
        assert_eq!(
            pz.transform(),
            ZoomTransform {
                x: 0.0,
                y: 0.0,
                k: 2.0
            }
        );

        let below = PanZoom::new(ScaleExtent { min: 0.1, max: 0.5 }, 1.5, 250.0);
        assert_close(below.transform().k, 0.5);
    }

    #[test]
    fn zero_duration_applies_immediately() {
        let mut pz = PanZoom::new(ScaleExtent::default(), 2.0, 0.0);
        assert!(!pz.press(ZoomDirection::In, [0.0, 0.0], 0.0));
        assert_close(pz.transform().k, 2.0);
    }

    #[test]
    fn svg_attribute() {
        let t = ZoomTransform {
            x: 12.5,
            y: -4.0,
            k: 2.0,
        };
        assert_eq!(t.to_svg(), "translate(12.5,-4) scale(2)");
        assert_eq!(ZoomTransform::IDENTITY.to_svg(), "translate(0,0) scale(1)");
    }
}
