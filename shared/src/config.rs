use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::descriptor::PropertySchema;
use crate::error::ConfigError;
use crate::projection::ProjectionPolicy;
use crate::style::Theme;
use crate::transform::ScaleExtent;

/// What happens to the pan/zoom transform when the map is redrawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedrawPolicy {
    /// Clear the whole surface and reset the transform to identity.
    #[default]
    ResetTransform,
    /// Replace only the data layer; the current transform is kept.
    PreserveTransform,
}

/// Named starting points for the supported datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    /// Prefectures and city markers with a fixed projection.
    #[default]
    Legacy,
    /// Municipal boundaries fitted to the viewport.
    Municipal,
    /// GADM level-1 boundaries, fitted and magnified.
    Gadm,
}

impl FromStr for Preset {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "legacy" => Ok(Self::Legacy),
            "municipal" => Ok(Self::Municipal),
            "gadm" => Ok(Self::Gadm),
            other => Err(ConfigError::UnknownPreset(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub data_url: String,
    pub schema: PropertySchema,
    pub projection: ProjectionPolicy,
    pub scale_extent: ScaleExtent,
    /// Factor applied by one zoom-in press (its inverse for zoom-out).
    pub zoom_step: f64,
    pub zoom_transition_ms: f64,
    /// Tooltip position relative to the pointer, in pixels.
    pub tooltip_offset: [f64; 2],
    pub redraw: RedrawPolicy,
    pub theme: Theme,
    pub log_level: String,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            data_url: "./data/japan.geojson".to_string(),
            schema: PropertySchema::Legacy,
            projection: ProjectionPolicy::default(),
            scale_extent: ScaleExtent::default(),
            zoom_step: 1.5,
            zoom_transition_ms: 250.0,
            tooltip_offset: [10.0, -10.0],
            redraw: RedrawPolicy::ResetTransform,
            theme: Theme::default(),
            log_level: "info".to_string(),
        }
    }
}

impl MapConfig {
    pub fn preset(preset: Preset) -> Self {
        match preset {
            Preset::Legacy => Self::default(),
            Preset::Municipal => Self {
                data_url: "./data/japan-municipal.geojson".to_string(),
                schema: PropertySchema::Municipal,
                projection: ProjectionPolicy::Fit {
                    padding: 10.0,
                    magnification: 1.0,
                },
                theme: Theme::municipal(),
                ..Self::default()
            },
            Preset::Gadm => Self {
                data_url: "./data/gadm41_JPN_1.geojson".to_string(),
                schema: PropertySchema::Gadm,
                projection: ProjectionPolicy::Fit {
                    padding: 20.0,
                    magnification: 1.25,
                },
                redraw: RedrawPolicy::PreserveTransform,
                theme: Theme::administrative(),
                ..Self::default()
            },
        }
    }

    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        Self::from_host_value(serde_json::from_str(s)?)
    }

    /// Build from the host page's config object: `{ "preset": ..., ...overrides }`.
    /// Overrides replace whole top-level keys of the preset. `null` yields the default.
    pub fn from_host_value(value: Value) -> Result<Self, ConfigError> {
        let mut overrides = match value {
            Value::Null => return Ok(Self::default()),
            Value::Object(map) => map,
            _ => return Err(ConfigError::invalid("config", "expected an object")),
        };
        let preset = match overrides.remove("preset") {
            None | Some(Value::Null) => Preset::default(),
            Some(Value::String(name)) => name.parse()?,
            Some(_) => return Err(ConfigError::invalid("preset", "expected a string")),
        };

        let mut merged = match serde_json::to_value(Self::preset(preset))? {
            Value::Object(map) => map,
            _ => return Err(ConfigError::invalid("config", "preset is not an object")),
        };
        merged.extend(overrides);

        let config: Self = serde_json::from_value(Value::Object(merged))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.data_url.trim().is_empty() {
            return Err(ConfigError::invalid("data_url", "must not be empty"));
        }

        let ScaleExtent { min, max } = self.scale_extent;
        if !(min.is_finite() && max.is_finite() && min > 0.0) {
            return Err(ConfigError::invalid(
                "scale_extent",
                format!("bounds must be positive and finite, got [{min}, {max}]"),
            ));
        }
        if min > max {
            return Err(ConfigError::invalid(
                "scale_extent",
                format!("min {min} exceeds max {max}"),
            ));
        }

        if !(self.zoom_step.is_finite() && self.zoom_step > 1.0) {
            return Err(ConfigError::invalid(
                "zoom_step",
                format!("must be greater than 1, got {}", self.zoom_step),
            ));
        }
        if !(self.zoom_transition_ms.is_finite() && self.zoom_transition_ms >= 0.0) {
            return Err(ConfigError::invalid(
                "zoom_transition_ms",
                format!("must be non-negative, got {}", self.zoom_transition_ms),
            ));
        }
        if !self.tooltip_offset.iter().all(|v| v.is_finite()) {
            return Err(ConfigError::invalid("tooltip_offset", "must be finite"));
        }

        match self.projection {
            ProjectionPolicy::Fixed { center, scale } => {
                if !(scale.is_finite() && scale > 0.0) {
                    return Err(ConfigError::invalid(
                        "projection.scale",
                        format!("must be positive, got {scale}"),
                    ));
                }
                if !center.iter().all(|v| v.is_finite()) {
                    return Err(ConfigError::invalid("projection.center", "must be finite"));
                }
            }
            ProjectionPolicy::Fit {
                padding,
                magnification,
            } => {
                if !(padding.is_finite() && padding >= 0.0) {
                    return Err(ConfigError::invalid(
                        "projection.padding",
                        format!("must be non-negative, got {padding}"),
                    ));
                }
                if !(magnification.is_finite() && magnification > 0.0) {
                    return Err(ConfigError::invalid(
                        "projection.magnification",
                        format!("must be positive, got {magnification}"),
                    ));
                }
            }
        }

        self.level()?;
        Ok(())
    }

    pub fn level(&self) -> Result<tracing::Level, ConfigError> {
        self.log_level
            .parse()
            .map_err(|_| ConfigError::invalid("log_level", format!("unknown level `{}`", self.log_level)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn presets_validate() {
        for preset in [Preset::Legacy, Preset::Municipal, Preset::Gadm] {
            MapConfig::preset(preset).validate().unwrap();
        }
    }

    #[test]
    fn null_is_default() {
        assert_eq!(MapConfig::from_host_value(Value::Null).unwrap(), MapConfig::default());
    }

    #[test]
    fn overrides_merge_over_preset() {
        let config = MapConfig::from_host_value(json!({
            "preset": "gadm",
            "data_url": "/geo/jp.json",
            "zoom_step": 2.0,
        }))
        .unwrap();
        assert_eq!(config.data_url, "/geo/jp.json");
        assert_eq!(config.zoom_step, 2.0);
        assert_eq!(config.schema, PropertySchema::Gadm);
        assert_eq!(config.redraw, RedrawPolicy::PreserveTransform);
    }

    #[test]
    fn nested_override_replaces_whole_key() {
        let config = MapConfig::from_json_str(
            r#"{ "preset": "municipal", "projection": { "policy": "fixed", "center": [135.5, 34.7], "scale": 4000 } }"#,
        )
        .unwrap();
        assert_eq!(
            config.projection,
            ProjectionPolicy::Fixed {
                center: [135.5, 34.7],
                scale: 4000.0
            }
        );
    }

    #[test]
    fn rejects_unknown_preset() {
        let err = MapConfig::from_host_value(json!({ "preset": "world" })).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownPreset(name) if name == "world"));
    }

    #[test]
    fn rejects_out_of_range_values() {
        let cases = [
            json!({ "scale_extent": [0.0, 8.0] }),
            json!({ "scale_extent": [4.0, 2.0] }),
            json!({ "zoom_step": 1.0 }),
            json!({ "zoom_transition_ms": -1.0 }),
            json!({ "projection": { "policy": "fit", "padding": -5, "magnification": 1 } }),
            json!({ "projection": { "policy": "fit", "padding": 5, "magnification": 0 } }),
            json!({ "projection": { "policy": "fixed", "center": [138, 36], "scale": 0 } }),
            json!({ "log_level": "loud" }),
            json!({ "data_url": "" }),
        ];
        for case in cases {
            let err = MapConfig::from_host_value(case.clone()).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid { .. }), "{case}: {err}");
        }
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            MapConfig::from_json_str("{ not json"),
            Err(ConfigError::Json(_))
        ));
        assert!(matches!(
            MapConfig::from_host_value(json!([1, 2])),
            Err(ConfigError::Invalid { field: "config", .. })
        ));
    }

    #[test]
    fn level_parses() {
        let config = MapConfig {
            log_level: "debug".into(),
            ..MapConfig::default()
        };
        assert_eq!(config.level().unwrap(), tracing::Level::DEBUG);
    }
}
