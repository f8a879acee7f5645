use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Label used when a dataset carries no usable name for a feature.
pub const UNNAMED: &str = "Unnamed";

/// Index of a feature within the loaded collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FeatureId(pub usize);

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    Prefecture,
    City,
    Region,
}

impl FeatureKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Prefecture => "Prefecture",
            Self::City => "City",
            Self::Region => "Region",
        }
    }

    /// CSS class carried by the drawn shape.
    pub const fn css_class(self) -> &'static str {
        match self {
            Self::Prefecture => "prefecture",
            Self::City => "city",
            Self::Region => "region",
        }
    }
}

/// Schema-agnostic view of one feature's property bag.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureDescriptor {
    pub id: FeatureId,
    pub display_name: String,
    pub localized_name: Option<String>,
    pub kind: FeatureKind,
    /// Dataset-specific type label (e.g. GADM `ENGTYPE_1`), shown instead of the kind label.
    pub kind_label: Option<String>,
    pub code: Option<String>,
    /// Population, when the dataset has one. Drives marker size and magnitude fills.
    pub magnitude: Option<f64>,
    pub parent_region: Option<String>,
    pub capital: Option<String>,
    pub image: Option<String>,
    pub extra: BTreeMap<String, String>,
}

impl FeatureDescriptor {
    fn bare(id: FeatureId, kind: FeatureKind) -> Self {
        Self {
            id,
            display_name: UNNAMED.to_string(),
            localized_name: None,
            kind,
            kind_label: None,
            code: None,
            magnitude: None,
            parent_region: None,
            capital: None,
            image: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn type_label(&self) -> &str {
        self.kind_label.as_deref().unwrap_or(self.kind.label())
    }
}

/// The property layouts the map understands. Fixed per dataset; never sniffed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertySchema {
    /// `name`, `name_ja`, `type`, `population`, `prefecture`, `capital`, `image`.
    #[default]
    Legacy,
    /// `names_1_20`, `code_1_20`.
    Municipal,
    /// GADM level-1 administrative fields (`NAME_1`, `GID_1`, ...).
    Gadm,
}

impl PropertySchema {
    pub fn describe(self, id: FeatureId, props: &Map<String, Value>) -> FeatureDescriptor {
        match self {
            Self::Legacy => describe_legacy(id, props),
            Self::Municipal => describe_municipal(id, props),
            Self::Gadm => describe_gadm(id, props),
        }
    }
}

fn describe_legacy(id: FeatureId, props: &Map<String, Value>) -> FeatureDescriptor {
    let kind = match text(props, "type").as_deref() {
        Some("prefecture") => FeatureKind::Prefecture,
        Some("city") => FeatureKind::City,
        _ => FeatureKind::Region,
    };
    let mut d = FeatureDescriptor::bare(id, kind);
    if let Some(name) = text(props, "name") {
        d.display_name = name;
    }
    d.localized_name = text(props, "name_ja");
    d.magnitude = number(props, "population");
    d.parent_region = text(props, "prefecture");
    d.capital = text(props, "capital");
    d.image = text(props, "image");
    d
}

fn describe_municipal(id: FeatureId, props: &Map<String, Value>) -> FeatureDescriptor {
    let mut d = FeatureDescriptor::bare(id, FeatureKind::Region);
    if let Some(name) = text(props, "names_1_20") {
        d.display_name = name;
    }
    d.code = text(props, "code_1_20");
    d
}

const GADM_EXTRA_FIELDS: &[(&str, &str)] = &[
    ("VARNAME_1", "Also known as"),
    ("HASC_1", "HASC"),
    ("ISO_1", "ISO"),
];

fn describe_gadm(id: FeatureId, props: &Map<String, Value>) -> FeatureDescriptor {
    let mut d = FeatureDescriptor::bare(id, FeatureKind::Prefecture);
    if let Some(name) = gadm_text(props, "NAME_1").or_else(|| text(props, "name")) {
        d.display_name = name;
    }
    d.localized_name = gadm_text(props, "NL_NAME_1").or_else(|| text(props, "name_ja"));
    d.kind_label = gadm_text(props, "ENGTYPE_1").or_else(|| gadm_text(props, "TYPE_1"));
    d.code = gadm_text(props, "GID_1");
    d.magnitude = number(props, "population");
    d.capital = text(props, "capital");
    d.image = text(props, "image");
    for &(key, label) in GADM_EXTRA_FIELDS {
        if let Some(value) = gadm_text(props, key) {
            d.extra.insert(label.to_string(), value);
        }
    }
    d
}

/// Non-empty string field; numbers are accepted and rendered as text.
fn text(props: &Map<String, Value>, key: &str) -> Option<String> {
    match props.get(key)? {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// GADM writes `NA` for missing values.
fn gadm_text(props: &Map<String, Value>, key: &str) -> Option<String> {
    text(props, key).filter(|s| s != "NA")
}

fn number(props: &Map<String, Value>, key: &str) -> Option<f64> {
    let value = match props.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', "").parse::<f64>().ok(),
        _ => None,
    };
    value.filter(|v| v.is_finite())
}
