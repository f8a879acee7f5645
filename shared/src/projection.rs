use std::f64::consts::FRAC_PI_4;

use serde::{Deserialize, Serialize};

use geo::Coord;

use crate::collection::FeatureCollection;

/// Latitude at which spherical Mercator is clipped (the Web Mercator square).
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// Scale used while measuring bounds during a fit, before rescaling.
const FIT_MEASURE_SCALE: f64 = 150.0;

/// Drawing surface size in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// False until the container has been laid out with a usable size.
    pub fn is_laid_out(&self) -> bool {
        self.width > 0.0 && self.height > 0.0 && self.width.is_finite() && self.height.is_finite()
    }

    pub fn center(&self) -> [f64; 2] {
        [self.width / 2.0, self.height / 2.0]
    }
}

/// Spherical Mercator with a center, uniform scale and pixel translate.
/// `center` maps to `translate`; north is up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mercator {
    scale: f64,
    translate: [f64; 2],
    origin: [f64; 2],
}

impl Mercator {
    pub fn new(center: Coord<f64>, scale: f64, translate: [f64; 2]) -> Self {
        let origin = raw(center);
        Self {
            scale,
            translate,
            origin,
        }
    }

    pub const fn scale(&self) -> f64 {
        self.scale
    }

    pub const fn translate(&self) -> [f64; 2] {
        self.translate
    }

    pub fn project(&self, p: Coord<f64>) -> [f64; 2] {
        let [x, y] = raw(p);
        [
            (x - self.origin[0]) * self.scale + self.translate[0],
            self.translate[1] - (y - self.origin[1]) * self.scale,
        ]
    }

    /// Pixel bounds `[[x0, y0], [x1, y1]]` of every position in the collection.
    /// Both axes are monotone, so the corners of the geographic box suffice.
    pub fn bounds(&self, collection: &FeatureCollection) -> Option<[[f64; 2]; 2]> {
        let rect = collection.bounding_rect()?;
        let [x0, y1] = self.project(rect.min());
        let [x1, y0] = self.project(rect.max());
        Some([[x0, y0], [x1, y1]])
    }

    /// Fit `collection` inside `extent` (`[[x0, y0], [x1, y1]]` in pixels).
    /// Returns `None` for empty data or a degenerate extent or data span.
    pub fn fit_extent(collection: &FeatureCollection, extent: [[f64; 2]; 2]) -> Option<Self> {
        let w = extent[1][0] - extent[0][0];
        let h = extent[1][1] - extent[0][1];
        if !(w > 0.0 && h > 0.0) {
            return None;
        }

        let measure = Self::new(Coord::zero(), FIT_MEASURE_SCALE, [0.0, 0.0]);
        let b = measure.bounds(collection)?;
        let span_x = b[1][0] - b[0][0];
        let span_y = b[1][1] - b[0][1];

        // A single point (or a horizontal/vertical line) has no span on one axis.
        let k = match (span_x > 0.0, span_y > 0.0) {
            (true, true) => (w / span_x).min(h / span_y),
            (true, false) => w / span_x,
            (false, true) => h / span_y,
            (false, false) => return None,
        };
        let x = extent[0][0] + (w - k * (b[1][0] + b[0][0])) / 2.0;
        let y = extent[0][1] + (h - k * (b[1][1] + b[0][1])) / 2.0;
        Some(Self::new(Coord::zero(), FIT_MEASURE_SCALE * k, [x, y]))
    }

    /// Scale by `factor` about the pixel point `anchor`.
    pub fn magnified(self, factor: f64, anchor: [f64; 2]) -> Self {
        Self {
            scale: self.scale * factor,
            translate: [
                anchor[0] + (self.translate[0] - anchor[0]) * factor,
                anchor[1] + (self.translate[1] - anchor[1]) * factor,
            ],
            origin: self.origin,
        }
    }
}

fn raw(p: Coord<f64>) -> [f64; 2] {
    let lambda = p.x.to_radians();
    let phi = p.y.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    [lambda, (FRAC_PI_4 + phi / 2.0).tan().ln()]
}

/// How the projection is parameterized for a viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum ProjectionPolicy {
    /// Known extent: a named center and fixed scale, centred in the viewport.
    Fixed { center: [f64; 2], scale: f64 },
    /// Fit the data bounds into the viewport minus `padding` on every edge,
    /// then magnify about the viewport center.
    Fit { padding: f64, magnification: f64 },
}

impl Default for ProjectionPolicy {
    fn default() -> Self {
        Self::Fixed {
            center: [138.0, 36.0],
            scale: 1200.0,
        }
    }
}

impl ProjectionPolicy {
    /// True when the projection must be recomputed for every render pass.
    pub const fn depends_on_data(&self) -> bool {
        matches!(self, Self::Fit { .. })
    }

    /// Build the projection, or `None` when it would degenerate (no layout yet,
    /// no data for a fit, or a viewport smaller than the padding).
    pub fn build(
        &self,
        viewport: Viewport,
        collection: Option<&FeatureCollection>,
    ) -> Option<Mercator> {
        if !viewport.is_laid_out() {
            return None;
        }
        match *self {
            Self::Fixed { center, scale } => Some(Mercator::new(
                Coord {
                    x: center[0],
                    y: center[1],
                },
                scale,
                viewport.center(),
            )),
            Self::Fit {
                padding,
                magnification,
            } => {
                let extent = [
                    [padding, padding],
                    [viewport.width - padding, viewport.height - padding],
                ];
                let fitted = Mercator::fit_extent(collection?, extent)?;
                Some(fitted.magnified(magnification, viewport.center()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{LineString, Point, Polygon};

    use crate::collection::{Feature, Geometry};

    fn assert_close(actual: f64, expected: f64) {
        let diff = (actual - expected).abs();
        assert!(diff < 1e-6, "expected {expected}, got {actual} (diff: {diff})");
    }

    fn lonlat(x: f64, y: f64) -> Coord<f64> {
        Coord { x, y }
    }

    fn japan_outline() -> FeatureCollection {
        let feature = |geometry| Feature {
            geometry,
            properties: Default::default(),
        };
        let polygon = |pts: Vec<(f64, f64)>| {
            Geometry::Polygon(Polygon::new(LineString::from(pts), Vec::new()))
        };
        FeatureCollection {
            features: vec![
                feature(polygon(vec![
                    (139.5, 35.5),
                    (139.9, 35.5),
                    (139.9, 35.8),
                    (139.5, 35.8),
                ])),
                feature(polygon(vec![(141.0, 42.0), (145.5, 43.5), (141.5, 45.5)])),
                feature(Geometry::Point(Point::new(127.7, 26.2))),
            ],
        }
    }

    #[test]
    fn fixed_center_maps_to_viewport_center() {
        let vp = Viewport::new(800.0, 600.0);
        let projection = ProjectionPolicy::default().build(vp, None).unwrap();
        let [x, y] = projection.project(lonlat(138.0, 36.0));
        assert_close(x, 400.0);
        assert_close(y, 300.0);
    }

    #[test]
    fn north_is_up_and_east_is_right() {
        let projection = Mercator::new(lonlat(138.0, 36.0), 1200.0, [0.0, 0.0]);
        let tokyo = projection.project(lonlat(139.7, 35.7));
        let sapporo = projection.project(lonlat(141.35, 43.06));
        assert!(sapporo[1] < tokyo[1]);
        assert!(sapporo[0] > tokyo[0]);
    }

    #[test]
    fn bounds_match_projected_extremes() {
        let data = japan_outline();
        let projection = Mercator::new(lonlat(138.0, 36.0), 1200.0, [400.0, 300.0]);
        let [[x0, y0], [x1, y1]] = projection.bounds(&data).unwrap();
        // West edge is Naha, east edge is the Hokkaido triangle.
        assert_close(x0, projection.project(lonlat(127.7, 26.2))[0]);
        assert_close(x1, projection.project(lonlat(145.5, 43.5))[0]);
        assert_close(y0, projection.project(lonlat(141.5, 45.5))[1]);
        assert_close(y1, projection.project(lonlat(127.7, 26.2))[1]);
        assert!(projection.bounds(&FeatureCollection::default()).is_none());
    }

    #[test]
    fn poles_are_clamped() {
        let projection = Mercator::new(lonlat(0.0, 0.0), 100.0, [0.0, 0.0]);
        let [_, y] = projection.project(lonlat(0.0, 90.0));
        assert!(y.is_finite());
    }

    #[test]
    fn fit_stays_inside_padding() {
        let data = japan_outline();
        let padding = 20.0;
        for (w, h) in [(800.0, 600.0), (1600.0, 400.0), (300.0, 900.0), (41.0, 41.0)] {
            let vp = Viewport::new(w, h);
            let policy = ProjectionPolicy::Fit {
                padding,
                magnification: 1.0,
            };
            let projection = policy.build(vp, Some(&data)).unwrap();
            let [[x0, y0], [x1, y1]] = projection.bounds(&data).unwrap();
            let eps = 1e-6;
            assert!(x0 >= padding - eps && y0 >= padding - eps, "{w}x{h}: {x0},{y0}");
            assert!(x1 <= w - padding + eps && y1 <= h - padding + eps, "{w}x{h}: {x1},{y1}");
            // One axis is filled edge to edge.
            let fills_x = (x0 - padding).abs() < 1e-6 && (x1 - (w - padding)).abs() < 1e-6;
            let fills_y = (y0 - padding).abs() < 1e-6 && (y1 - (h - padding)).abs() < 1e-6;
            assert!(fills_x || fills_y);
        }
    }

    #[test]
    fn magnification_scales_about_viewport_center() {
        let data = japan_outline();
        let vp = Viewport::new(800.0, 600.0);
        let plain = ProjectionPolicy::Fit {
            padding: 20.0,
            magnification: 1.0,
        }
        .build(vp, Some(&data))
        .unwrap();
        let magnified = ProjectionPolicy::Fit {
            padding: 20.0,
            magnification: 1.5,
        }
        .build(vp, Some(&data))
        .unwrap();
        assert_close(magnified.scale(), plain.scale() * 1.5);

        let p = lonlat(139.7, 35.7);
        let [px, py] = plain.project(p);
        let [mx, my] = magnified.project(p);
        assert_close(mx - 400.0, (px - 400.0) * 1.5);
        assert_close(my - 300.0, (py - 300.0) * 1.5);
    }

    #[test]
    fn degenerate_inputs_defer_projection() {
        let data = japan_outline();
        let fit = ProjectionPolicy::Fit {
            padding: 20.0,
            magnification: 1.2,
        };
        assert!(fit.build(Viewport::new(0.0, 0.0), Some(&data)).is_none());
        assert!(fit.build(Viewport::new(800.0, 600.0), None).is_none());
        assert!(fit.build(Viewport::new(30.0, 600.0), Some(&data)).is_none());
        assert!(
            fit.build(Viewport::new(800.0, 600.0), Some(&FeatureCollection::default()))
                .is_none()
        );
        assert!(
            ProjectionPolicy::default()
                .build(Viewport::new(0.0, 600.0), None)
                .is_none()
        );
    }

    #[test]
    fn policy_is_tagged() {
        let policy: ProjectionPolicy =
            serde_json::from_str(r#"{"policy":"fit","padding":20,"magnification":1.2}"#).unwrap();
        assert!(policy.depends_on_data());
    }
}
