use tracing::{debug, error, info};

use crate::config::{MapConfig, RedrawPolicy};
use crate::descriptor::{FeatureDescriptor, FeatureId};
use crate::error::LoadError;
use crate::event::{ClickRecord, Effect, Layer, LoadRequest, LoadTicket, MapEvent};
use crate::collection::FeatureCollection;
use crate::projection::{Mercator, Viewport};
use crate::scene::{Scene, build_scene};
use crate::style::ShapeStyle;
use crate::tooltip::{TooltipContent, TooltipState};
use crate::transform::{PanZoom, ZoomTransform};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewPhase {
    /// No data yet (load not started or in flight).
    Loading,
    Ready,
    /// The one load attempt failed; the map stays blank.
    Failed,
    TornDown,
}

/// Per-instance map state. Every mutation goes through [`MapView::handle`].
#[derive(Debug)]
pub struct MapView {
    config: MapConfig,
    phase: ViewPhase,
    viewport: Viewport,
    projection: Option<Mercator>,
    collection: Option<FeatureCollection>,
    descriptors: Vec<FeatureDescriptor>,
    scene: Scene,
    generation: u64,
    pan_zoom: PanZoom,
    hovered: Option<FeatureId>,
    tooltip: Option<TooltipState>,
    pointer: [f64; 2],
    load_started: bool,
    pending: Option<LoadTicket>,
    next_ticket: u64,
}

impl MapView {
    pub fn new(config: MapConfig, viewport: Viewport) -> Self {
        let pan_zoom = PanZoom::new(
            config.scale_extent,
            config.zoom_step,
            config.zoom_transition_ms,
        );
        let mut view = Self {
            config,
            phase: ViewPhase::Loading,
            viewport,
            projection: None,
            collection: None,
            descriptors: Vec::new(),
            scene: Scene::default(),
            generation: 0,
            pan_zoom,
            hovered: None,
            tooltip: None,
            pointer: [0.0, 0.0],
            load_started: false,
            pending: None,
            next_ticket: 1,
        };
        view.rebuild_projection();
        view
    }

    /// Start the single data load of this view's lifetime. Returns `None` if a
    /// load was already started or the view is torn down.
    pub fn begin_load(&mut self) -> Option<LoadRequest> {
        if self.load_started || self.phase == ViewPhase::TornDown {
            return None;
        }
        self.load_started = true;
        let ticket = LoadTicket(self.next_ticket);
        self.next_ticket += 1;
        self.pending = Some(ticket);
        Some(LoadRequest {
            ticket,
            url: self.config.data_url.clone(),
        })
    }

    pub fn handle(&mut self, event: MapEvent) -> Vec<Effect> {
        if self.phase == ViewPhase::TornDown {
            if matches!(
                event,
                MapEvent::DataLoaded { .. } | MapEvent::DataLoadFailed { .. }
            ) {
                debug!("discarding load result after teardown");
            }
            return Vec::new();
        }

        match event {
            MapEvent::DataLoaded { ticket, collection } => {
                if !self.accept(ticket) {
                    return Vec::new();
                }
                self.install(collection);
                self.render()
            }
            MapEvent::DataLoadFailed { ticket, error } => {
                if self.accept(ticket) {
                    self.fail(&error);
                }
                Vec::new()
            }
            MapEvent::Resized { width, height } => self.resize(width, height),
            MapEvent::PointerEntered(id) => self.enter(id),
            MapEvent::PointerMoved { x, y } => {
                self.pointer = [x, y];
                match self.tooltip.as_mut() {
                    Some(tip) => {
                        let [dx, dy] = self.config.tooltip_offset;
                        tip.x = x + dx;
                        tip.y = y + dy;
                        vec![Effect::Invalidate(Layer::Tooltip)]
                    }
                    None => Vec::new(),
                }
            }
            MapEvent::PointerLeft => match self.hovered.take() {
                Some(id) => {
                    self.tooltip = None;
                    vec![
                        Effect::Invalidate(Layer::Highlight(id)),
                        Effect::Invalidate(Layer::Tooltip),
                    ]
                }
                None => Vec::new(),
            },
            MapEvent::Clicked(id) => match self.descriptor(id) {
                Some(d) => {
                    let record = ClickRecord {
                        id,
                        code: d.code.clone(),
                        name: d.display_name.clone(),
                    };
                    info!(id = %record.id, code = ?record.code, name = %record.name, "feature clicked");
                    vec![Effect::FeatureClicked(record)]
                }
                None => Vec::new(),
            },
            MapEvent::ZoomGesture { delta, x, y } => {
                self.pan_zoom.zoom_gesture(delta, [x, y]);
                vec![Effect::Invalidate(Layer::Transform)]
            }
            MapEvent::PanGesture { dx, dy } => {
                self.pan_zoom.pan(dx, dy);
                vec![Effect::Invalidate(Layer::Transform)]
            }
            MapEvent::ZoomButtonPressed { direction, now } => {
                if self
                    .pan_zoom
                    .press(direction, self.viewport.center(), now)
                {
                    vec![Effect::AnimationRequested]
                } else {
                    vec![Effect::Invalidate(Layer::Transform)]
                }
            }
            MapEvent::Frame { now } => {
                if !self.pan_zoom.is_animating() {
                    return Vec::new();
                }
                let mut effects = vec![Effect::Invalidate(Layer::Transform)];
                if self.pan_zoom.tick(now) {
                    effects.push(Effect::AnimationRequested);
                }
                effects
            }
            MapEvent::TornDown => {
                self.phase = ViewPhase::TornDown;
                self.pending = None;
                self.hovered = None;
                self.tooltip = None;
                self.pan_zoom.reset();
                debug!("map view torn down");
                Vec::new()
            }
        }
    }

    fn accept(&mut self, ticket: LoadTicket) -> bool {
        if self.pending != Some(ticket) {
            debug!(?ticket, "discarding stale load result");
            return false;
        }
        self.pending = None;
        true
    }

    fn fail(&mut self, e: &LoadError) {
        error!(error = %e, url = %self.config.data_url, "failed to load map data");
        self.phase = ViewPhase::Failed;
    }

    fn install(&mut self, collection: FeatureCollection) {
        let schema = self.config.schema;
        self.descriptors = collection
            .features
            .iter()
            .enumerate()
            .map(|(i, f)| schema.describe(FeatureId(i), &f.properties))
            .collect();
        info!(features = collection.len(), ?schema, "map data loaded");
        self.collection = Some(collection);
        self.phase = ViewPhase::Ready;
    }

    fn rebuild_projection(&mut self) {
        self.projection = self
            .config
            .projection
            .build(self.viewport, self.collection.as_ref());
    }

    fn resize(&mut self, width: f64, height: f64) -> Vec<Effect> {
        let next = Viewport::new(width, height);
        if next == self.viewport {
            return Vec::new();
        }
        self.viewport = next;
        let mut effects = vec![Effect::Invalidate(Layer::Surface)];
        if !next.is_laid_out() {
            debug!(width, height, "container has no size; keeping current scene");
            return effects;
        }
        self.rebuild_projection();
        if self.collection.is_some() {
            effects.extend(self.render());
        }
        effects
    }

    /// Replace the whole shape set. Safe to call repeatedly.
    fn render(&mut self) -> Vec<Effect> {
        if self.config.projection.depends_on_data() || self.projection.is_none() {
            self.rebuild_projection();
        }
        let (Some(collection), Some(projection)) = (self.collection.as_ref(), self.projection)
        else {
            debug!(
                width = self.viewport.width,
                height = self.viewport.height,
                "projection unavailable; deferring render"
            );
            return Vec::new();
        };

        self.generation += 1;
        self.scene = build_scene(
            collection,
            &self.descriptors,
            &projection,
            &self.config.theme,
            self.viewport,
            self.generation,
        );
        self.hovered = None;
        self.tooltip = None;

        let mut effects = vec![Effect::Invalidate(Layer::Shapes)];
        if self.config.redraw == RedrawPolicy::ResetTransform {
            self.pan_zoom.reset();
            effects.push(Effect::Invalidate(Layer::Transform));
        }
        effects.push(Effect::Invalidate(Layer::Tooltip));
        effects
    }

    fn enter(&mut self, id: FeatureId) -> Vec<Effect> {
        if self.hovered == Some(id) || self.scene.shape(id).is_none() {
            return Vec::new();
        }
        let Some(descriptor) = self.descriptors.get(id.0) else {
            return Vec::new();
        };
        let content = TooltipContent::from_descriptor(descriptor);
        let [dx, dy] = self.config.tooltip_offset;
        self.tooltip = Some(TooltipState {
            content,
            x: self.pointer[0] + dx,
            y: self.pointer[1] + dy,
        });

        let mut effects = Vec::with_capacity(3);
        // A missed leave leaves the previous shape highlighted; restore it first.
        if let Some(previous) = self.hovered.replace(id) {
            effects.push(Effect::Invalidate(Layer::Highlight(previous)));
        }
        effects.push(Effect::Invalidate(Layer::Highlight(id)));
        effects.push(Effect::Invalidate(Layer::Tooltip));
        effects
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub const fn phase(&self) -> ViewPhase {
        self.phase
    }

    pub const fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn projection(&self) -> Option<&Mercator> {
        self.projection.as_ref()
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn transform(&self) -> ZoomTransform {
        self.pan_zoom.transform()
    }

    pub fn is_animating(&self) -> bool {
        self.pan_zoom.is_animating()
    }

    pub fn hovered(&self) -> Option<FeatureId> {
        self.hovered
    }

    pub fn tooltip(&self) -> Option<&TooltipState> {
        self.tooltip.as_ref()
    }

    pub fn descriptor(&self, id: FeatureId) -> Option<&FeatureDescriptor> {
        self.descriptors.get(id.0)
    }

    /// Current style of a shape: its baseline, or the highlight while hovered.
    pub fn style_of(&self, id: FeatureId) -> Option<ShapeStyle> {
        let shape = self.scene.shape(id)?;
        Some(if self.hovered == Some(id) {
            shape.base_style.highlighted(&self.config.theme.highlight)
        } else {
            shape.base_style.clone()
        })
    }
}
