pub mod collection;
pub mod colors;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod event;
pub mod format;
pub mod projection;
pub mod scene;
pub mod style;
pub mod tooltip;
pub mod transform;
pub mod view;

pub use config::{MapConfig, Preset, RedrawPolicy};
pub use descriptor::{FeatureDescriptor, FeatureId, FeatureKind, PropertySchema};
pub use error::{ConfigError, LoadError};
pub use event::{ClickRecord, Effect, Layer, LoadRequest, LoadTicket, MapEvent};
pub use collection::{Feature, FeatureCollection, Geometry};
pub use projection::{Mercator, ProjectionPolicy, Viewport};
pub use scene::{Scene, Shape, ShapeGeometry};
pub use style::{ShapeStyle, Theme};
pub use tooltip::{TooltipContent, TooltipState};
pub use transform::{ZoomDirection, ZoomTransform};
pub use view::{MapView, ViewPhase};
