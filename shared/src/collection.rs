use std::str::FromStr;

use geo::{BoundingRect, Coord, LineString, MultiPolygon, Point, Polygon, Rect};
use geojson::GeoJson;
use serde_json::{Map, Value};

use crate::error::LoadError;

/// The geometry kinds the map can draw.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Point<f64>),
    Polygon(Polygon<f64>),
    MultiPolygon(MultiPolygon<f64>),
}

impl Geometry {
    /// Exterior and interior rings of a polygonal geometry. Points have none.
    pub fn rings(&self) -> impl Iterator<Item = &LineString<f64>> {
        let polygons: &[Polygon<f64>] = match self {
            Self::Point(_) => &[],
            Self::Polygon(p) => std::slice::from_ref(p),
            Self::MultiPolygon(mp) => &mp.0,
        };
        polygons
            .iter()
            .flat_map(|p| std::iter::once(p.exterior()).chain(p.interiors()))
    }

    pub fn bounding_rect(&self) -> Option<Rect<f64>> {
        match self {
            Self::Point(p) => Some(p.bounding_rect()),
            Self::Polygon(p) => p.bounding_rect(),
            Self::MultiPolygon(mp) => mp.bounding_rect(),
        }
    }

    /// Check a parsed GeoJSON geometry and convert it. Unsupported types are a
    /// parse error; malformed coordinates fail the feature at `index`.
    fn from_geojson(index: usize, value: geojson::Value) -> Result<Self, LoadError> {
        let checked = match &value {
            geojson::Value::Point(p) => check_position(p),
            geojson::Value::Polygon(rings) => check_polygon(rings),
            geojson::Value::MultiPolygon(polygons) if polygons.is_empty() => {
                Err("multipolygon has no polygons".to_string())
            }
            geojson::Value::MultiPolygon(polygons) => {
                polygons.iter().try_for_each(|rings| check_polygon(rings))
            }
            geojson::Value::MultiPoint(_) => return Err(unsupported("MultiPoint")),
            geojson::Value::LineString(_) => return Err(unsupported("LineString")),
            geojson::Value::MultiLineString(_) => return Err(unsupported("MultiLineString")),
            geojson::Value::GeometryCollection(_) => {
                return Err(unsupported("GeometryCollection"));
            }
        };
        checked.map_err(|reason| LoadError::InvalidFeature { index, reason })?;

        // Coordinates were checked above, so the conversion cannot index short positions.
        match geo::Geometry::<f64>::try_from(value)? {
            geo::Geometry::Point(p) => Ok(Self::Point(p)),
            geo::Geometry::Polygon(p) => Ok(Self::Polygon(p)),
            geo::Geometry::MultiPolygon(mp) => Ok(Self::MultiPolygon(mp)),
            _ => Err(LoadError::Parse(format!("feature {index}: unexpected geometry"))),
        }
    }
}

fn unsupported(kind: &str) -> LoadError {
    LoadError::Parse(format!("unsupported geometry type `{kind}`"))
}

fn check_position(p: &geojson::PointType) -> Result<(), String> {
    if p.len() < 2 {
        return Err(format!("position has {} coordinates, need 2", p.len()));
    }
    if !p.iter().all(|v| v.is_finite()) {
        return Err("coordinates are not finite numbers".to_string());
    }
    Ok(())
}

fn check_polygon(rings: &geojson::PolygonType) -> Result<(), String> {
    if rings.is_empty() {
        return Err("polygon has no rings".to_string());
    }
    for (i, ring) in rings.iter().enumerate() {
        if ring.len() < 3 {
            return Err(format!("ring {i} has {} positions, need at least 3", ring.len()));
        }
        for (j, p) in ring.iter().enumerate() {
            check_position(p).map_err(|e| format!("ring {i} position {j}: {e}"))?;
        }
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub geometry: Geometry,
    /// GeoJSON `null` properties are read as an empty bag.
    pub properties: Map<String, Value>,
}

/// A validated feature collection. Every feature has a drawable geometry.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    /// Parse and validate a GeoJSON document. The whole load fails on the first
    /// bad feature; partial collections are never rendered.
    pub fn from_json_str(body: &str) -> Result<Self, LoadError> {
        let GeoJson::FeatureCollection(fc) = GeoJson::from_str(body)? else {
            return Err(LoadError::Parse("expected a FeatureCollection".to_string()));
        };
        fc.try_into()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Longitude/latitude box around every feature, `None` when empty.
    pub fn bounding_rect(&self) -> Option<Rect<f64>> {
        self.features
            .iter()
            .filter_map(|f| f.geometry.bounding_rect())
            .reduce(|a, b| {
                Rect::new(
                    Coord {
                        x: a.min().x.min(b.min().x),
                        y: a.min().y.min(b.min().y),
                    },
                    Coord {
                        x: a.max().x.max(b.max().x),
                        y: a.max().y.max(b.max().y),
                    },
                )
            })
    }
}

impl TryFrom<geojson::FeatureCollection> for FeatureCollection {
    type Error = LoadError;

    fn try_from(fc: geojson::FeatureCollection) -> Result<Self, Self::Error> {
        let features = fc
            .features
            .into_iter()
            .enumerate()
            .map(|(index, feature)| {
                let geometry = feature.geometry.ok_or_else(|| LoadError::InvalidFeature {
                    index,
                    reason: "feature has no geometry".to_string(),
                })?;
                Ok(Feature {
                    geometry: Geometry::from_geojson(index, geometry.value)?,
                    properties: feature.properties.unwrap_or_default(),
                })
            })
            .collect::<Result<_, LoadError>>()?;
        Ok(Self { features })
    }
}
