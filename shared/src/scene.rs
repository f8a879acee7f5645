use std::fmt::Write as FmtWrite;

use geo::LineString;

use crate::collection::{FeatureCollection, Geometry};
use crate::descriptor::{FeatureDescriptor, FeatureId};
use crate::projection::{Mercator, Viewport};
use crate::style::{MagnitudeRange, ShapeStyle, Theme};

/// Smallest marker radius in pixels.
pub const MIN_MARKER_RADIUS: f64 = 3.0;

/// Magnitude per unit of squared radius growth.
const MARKER_MAGNITUDE_UNIT: f64 = 100_000.0;

/// Marker radius for a magnitude: `sqrt(m / 100000) + 3`. Missing or negative
/// magnitudes get the minimum radius.
pub fn marker_radius(magnitude: Option<f64>) -> f64 {
    let m = magnitude.filter(|m| m.is_finite()).unwrap_or(0.0).max(0.0);
    (m / MARKER_MAGNITUDE_UNIT).sqrt() + MIN_MARKER_RADIUS
}

#[derive(Debug, Clone, PartialEq)]
pub enum ShapeGeometry {
    /// SVG path data for every ring of a polygonal feature.
    Outline { path: String },
    Marker { cx: f64, cy: f64, r: f64 },
}

/// One drawn element, tagged with the feature it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub feature: FeatureId,
    pub class: &'static str,
    pub geometry: ShapeGeometry,
    pub base_style: ShapeStyle,
}

/// Output of one render pass. `generation` changes on every pass so the host
/// knows when element bindings must be rebuilt.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Scene {
    pub generation: u64,
    pub viewport: Viewport,
    pub shapes: Vec<Shape>,
}

impl Scene {
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn shape(&self, id: FeatureId) -> Option<&Shape> {
        self.shapes.get(id.0).filter(|s| s.feature == id)
    }
}

/// Project every feature into exactly one shape, in collection order.
pub fn build_scene(
    collection: &FeatureCollection,
    descriptors: &[FeatureDescriptor],
    projection: &Mercator,
    theme: &Theme,
    viewport: Viewport,
    generation: u64,
) -> Scene {
    let range = MagnitudeRange::of(descriptors);
    let shapes = collection
        .features
        .iter()
        .zip(descriptors)
        .map(|(feature, desc)| {
            let (geometry, base_style) = match &feature.geometry {
                Geometry::Point(p) => {
                    let [cx, cy] = projection.project(p.0);
                    let r = marker_radius(desc.magnitude);
                    (ShapeGeometry::Marker { cx, cy, r }, theme.marker_style())
                }
                polygonal => (
                    ShapeGeometry::Outline {
                        path: outline_path(polygonal.rings(), projection),
                    },
                    theme.outline_style(desc, range),
                ),
            };
            Shape {
                feature: desc.id,
                class: desc.kind.css_class(),
                geometry,
                base_style,
            }
        })
        .collect();
    Scene {
        generation,
        viewport,
        shapes,
    }
}

/// `M x,y L x,y ... Z` per ring.
fn outline_path<'a>(
    rings: impl Iterator<Item = &'a LineString<f64>>,
    projection: &Mercator,
) -> String {
    let mut d = String::new();
    for ring in rings {
        // The closing position, when repeated, is implied by `Z`.
        let coords = &ring.0;
        let open = match (coords.first(), coords.last()) {
            (Some(first), Some(last)) if coords.len() > 1 && first == last => {
                &coords[..coords.len() - 1]
            }
            _ => &coords[..],
        };
        for (i, p) in open.iter().enumerate() {
            let [x, y] = projection.project(*p);
            let cmd = if i == 0 { 'M' } else { 'L' };
            let _ = write!(d, "{cmd}{x:.2},{y:.2}");
        }
        if !open.is_empty() {
            d.push('Z');
        }
    }
    d
}
