use serde::Serialize;

use crate::descriptor::FeatureId;
use crate::error::LoadError;
use crate::collection::FeatureCollection;
use crate::transform::ZoomDirection;

/// Identifies one outstanding load. Results carrying any other ticket are stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoadTicket(pub(crate) u64);

/// What the host must fetch, returned by `MapView::begin_load`.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadRequest {
    pub ticket: LoadTicket,
    pub url: String,
}

/// Inputs to the view. Coordinates are CSS pixels relative to the container.
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    DataLoaded {
        ticket: LoadTicket,
        collection: FeatureCollection,
    },
    DataLoadFailed {
        ticket: LoadTicket,
        error: LoadError,
    },
    Resized {
        width: f64,
        height: f64,
    },
    PointerEntered(FeatureId),
    PointerMoved {
        x: f64,
        y: f64,
    },
    PointerLeft,
    Clicked(FeatureId),
    /// Wheel or pinch, about a screen point. Positive `delta` zooms out.
    ZoomGesture {
        delta: f64,
        x: f64,
        y: f64,
    },
    PanGesture {
        dx: f64,
        dy: f64,
    },
    ZoomButtonPressed {
        direction: ZoomDirection,
        now: f64,
    },
    /// Animation frame timestamp in milliseconds.
    Frame {
        now: f64,
    },
    TornDown,
}

/// Part of the presentation that must be redrawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    /// Surface size and viewBox.
    Surface,
    /// The whole shape set (new scene generation).
    Shapes,
    Transform,
    /// Style of a single shape.
    Highlight(FeatureId),
    Tooltip,
}

/// Diagnostic record emitted when a shape is clicked.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClickRecord {
    pub id: FeatureId,
    pub code: Option<String>,
    pub name: String,
}

/// Work for the host after handling an event.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Invalidate(Layer),
    FeatureClicked(ClickRecord),
    /// Schedule a `Frame` event on the next animation frame.
    AnimationRequested,
}
