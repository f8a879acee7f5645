use serde::Serialize;

use crate::descriptor::FeatureDescriptor;
use crate::format::format_thousands;

/// Display content for the hovered feature. Absent fields are omitted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TooltipContent {
    pub title: String,
    pub subtitle: Option<String>,
    pub kind: String,
    /// Labelled lines in display order.
    pub rows: Vec<(String, String)>,
    pub image: Option<String>,
}

impl TooltipContent {
    pub fn from_descriptor(d: &FeatureDescriptor) -> Self {
        let mut rows = Vec::new();
        if let Some(m) = d.magnitude {
            rows.push(("Population".to_string(), format_thousands(m)));
        }
        if let Some(parent) = &d.parent_region {
            rows.push(("Prefecture".to_string(), parent.clone()));
        }
        if let Some(capital) = &d.capital {
            rows.push(("Capital".to_string(), capital.clone()));
        }
        if let Some(code) = &d.code {
            rows.push(("Code".to_string(), code.clone()));
        }
        rows.extend(d.extra.iter().map(|(k, v)| (k.clone(), v.clone())));

        Self {
            title: d.display_name.clone(),
            subtitle: d.localized_name.clone(),
            kind: d.type_label().to_string(),
            rows,
            image: d.image.clone(),
        }
    }

    /// Text lines as shown, one per line. Used for accessibility labels and logs.
    pub fn plain_text(&self) -> String {
        let mut lines = vec![self.title.clone()];
        lines.extend(self.subtitle.clone());
        lines.push(self.kind.clone());
        lines.extend(self.rows.iter().map(|(k, v)| format!("{k}: {v}")));
        lines.join("\n")
    }
}

/// Visible tooltip: content plus its position relative to the container.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TooltipState {
    pub content: TooltipContent,
    pub x: f64,
    pub y: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{FeatureId, PropertySchema};
    use serde_json::{Value, json};

    fn describe(schema: PropertySchema, props: Value) -> FeatureDescriptor {
        let Value::Object(map) = props else {
            unreachable!()
        };
        schema.describe(FeatureId(0), &map)
    }

    #[test]
    fn legacy_prefecture() {
        let d = describe(
            PropertySchema::Legacy,
            json!({ "name": "Tokyo", "name_ja": "東京都", "type": "prefecture", "population": 14000000 }),
        );
        let tip = TooltipContent::from_descriptor(&d);
        assert_eq!(
            tip.plain_text(),
            "Tokyo\n東京都\nPrefecture\nPopulation: 14,000,000"
        );
        assert_eq!(tip.image, None);
    }

    #[test]
    fn city_lists_parent_prefecture() {
        let d = describe(
            PropertySchema::Legacy,
            json!({ "name": "Nagoya", "type": "city", "prefecture": "Aichi", "image": "nagoya.jpg" }),
        );
        let tip = TooltipContent::from_descriptor(&d);
        assert_eq!(tip.kind, "City");
        assert_eq!(tip.rows, vec![("Prefecture".to_string(), "Aichi".to_string())]);
        assert_eq!(tip.image.as_deref(), Some("nagoya.jpg"));
    }

    #[test]
    fn missing_name_uses_fallback() {
        let d = describe(PropertySchema::Municipal, json!({ "code_1_20": "13101" }));
        let tip = TooltipContent::from_descriptor(&d);
        assert_eq!(tip.plain_text(), "Unnamed\nRegion\nCode: 13101");
    }

    #[test]
    fn gadm_extras_follow_code() {
        let d = describe(
            PropertySchema::Gadm,
            json!({ "NAME_1": "Osaka", "GID_1": "JPN.34_1", "ISO_1": "JP-27", "HASC_1": "JP.OS" }),
        );
        let labels: Vec<_> = TooltipContent::from_descriptor(&d)
            .rows
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(labels, ["Code", "HASC", "ISO"]);
    }
}
