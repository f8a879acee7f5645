use std::fmt::Write as FmtWrite;

use serde::{Deserialize, Serialize};

use crate::colors::{blend_rgb, hex_css, parse_hex, soft_region_color};
use crate::descriptor::FeatureDescriptor;

/// Presentation attributes of one drawn shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeStyle {
    pub fill: String,
    pub stroke: String,
    pub stroke_width: f64,
    pub opacity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

impl ShapeStyle {
    /// Inline CSS for the SVG element.
    pub fn to_css(&self) -> String {
        let mut css = String::with_capacity(96);
        let _ = write!(
            css,
            "fill:{};stroke:{};stroke-width:{}px;opacity:{};cursor:pointer;",
            self.fill, self.stroke, self.stroke_width, self.opacity
        );
        match &self.filter {
            Some(filter) => {
                let _ = write!(css, "filter:{filter};");
            }
            None => css.push_str("filter:none;"),
        }
        css
    }

    /// Hovered rendition. Fields the highlight leaves unset keep the baseline value.
    pub fn highlighted(&self, highlight: &HighlightStyle) -> Self {
        Self {
            fill: highlight.fill.clone().unwrap_or_else(|| self.fill.clone()),
            stroke: highlight.stroke.clone().unwrap_or_else(|| self.stroke.clone()),
            stroke_width: highlight.stroke_width.unwrap_or(self.stroke_width),
            opacity: highlight.opacity.unwrap_or(self.opacity),
            filter: highlight.filter.clone().or_else(|| self.filter.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightStyle {
    pub fill: Option<String>,
    pub stroke: Option<String>,
    pub stroke_width: Option<f64>,
    pub opacity: Option<f64>,
    pub filter: Option<String>,
}

/// How outline fills are chosen.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum FillMode {
    /// Every outline uses the theme fill.
    #[default]
    Uniform,
    /// Stable pale color per parent region (or per feature when it has none).
    ByParentRegion,
    /// Log-scaled ramp over the magnitude attribute.
    ByMagnitude { low: String, high: String },
}

/// Magnitude range of a dataset, computed once per scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MagnitudeRange {
    pub min: f64,
    pub max: f64,
}

impl MagnitudeRange {
    pub fn of<'a>(descriptors: impl IntoIterator<Item = &'a FeatureDescriptor>) -> Option<Self> {
        descriptors
            .into_iter()
            .filter_map(|d| d.magnitude)
            .filter(|m| *m > 0.0)
            .fold(None, |range: Option<Self>, m| {
                Some(match range {
                    None => Self { min: m, max: m },
                    Some(r) => Self {
                        min: r.min.min(m),
                        max: r.max.max(m),
                    },
                })
            })
    }

    /// Position of `value` in the range on a log scale, 0..=1.
    pub fn fraction(&self, value: f64) -> f64 {
        if value <= 0.0 {
            return 0.0;
        }
        let (lo, hi) = (self.min.ln(), self.max.ln());
        if hi - lo <= f64::EPSILON {
            return 1.0;
        }
        ((value.ln() - lo) / (hi - lo)).clamp(0.0, 1.0)
    }
}

/// Baseline and hover styles for a map variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    pub outline: ShapeStyle,
    pub marker: ShapeStyle,
    pub highlight: HighlightStyle,
    pub fill_mode: FillMode,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            outline: ShapeStyle {
                fill: "#e6f3ff".into(),
                stroke: "#2980b9".into(),
                stroke_width: 1.0,
                opacity: 1.0,
                filter: None,
            },
            marker: ShapeStyle {
                fill: "#e74c3c".into(),
                stroke: "#c0392b".into(),
                stroke_width: 1.0,
                opacity: 0.8,
                filter: None,
            },
            highlight: HighlightStyle {
                opacity: Some(1.0),
                filter: Some("brightness(1.2)".into()),
                ..HighlightStyle::default()
            },
            fill_mode: FillMode::Uniform,
        }
    }
}

impl Theme {
    /// Muted green administrative palette with a drop-shadow hover.
    pub fn administrative() -> Self {
        Self {
            outline: ShapeStyle {
                fill: "#dfeedd".into(),
                stroke: "#4a7a4c".into(),
                stroke_width: 0.8,
                opacity: 1.0,
                filter: None,
            },
            highlight: HighlightStyle {
                fill: Some("#9fd3a2".into()),
                stroke_width: Some(1.6),
                filter: Some("drop-shadow(0 0 4px rgba(0,0,0,0.35))".into()),
                ..HighlightStyle::default()
            },
            fill_mode: FillMode::ByMagnitude {
                low: "#e6f3ff".into(),
                high: "#1f4e8c".into(),
            },
            ..Self::default()
        }
    }

    /// Fine municipal borders colored by parent region.
    pub fn municipal() -> Self {
        Self {
            outline: ShapeStyle {
                fill: "#f4f1ea".into(),
                stroke: "#8c7b6b".into(),
                stroke_width: 0.4,
                opacity: 1.0,
                filter: None,
            },
            highlight: HighlightStyle {
                fill: Some("#f5c542".into()),
                stroke: Some("#5b4a3a".into()),
                ..HighlightStyle::default()
            },
            fill_mode: FillMode::ByParentRegion,
            ..Self::default()
        }
    }

    /// Baseline style of a polygon outline for `descriptor`.
    pub fn outline_style(
        &self,
        descriptor: &FeatureDescriptor,
        range: Option<MagnitudeRange>,
    ) -> ShapeStyle {
        let mut style = self.outline.clone();
        match &self.fill_mode {
            FillMode::Uniform => {}
            FillMode::ByParentRegion => {
                let key = descriptor
                    .parent_region
                    .as_deref()
                    .unwrap_or(&descriptor.display_name);
                let (r, g, b) = soft_region_color(key);
                style.fill = hex_css(r, g, b);
            }
            FillMode::ByMagnitude { low, high } => {
                if let (Some(m), Some(range), Some(low), Some(high)) =
                    (descriptor.magnitude, range, parse_hex(low), parse_hex(high))
                {
                    let (r, g, b) = blend_rgb(low, high, range.fraction(m));
                    style.fill = hex_css(r, g, b);
                }
            }
        }
        style
    }

    pub fn marker_style(&self) -> ShapeStyle {
        self.marker.clone()
    }
}
