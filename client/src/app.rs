use std::sync::Arc;

use japan_map_shared::style::HighlightStyle;
use japan_map_shared::{
    ClickRecord, Effect as ViewEffect, FeatureId, Layer, LoadRequest, MapConfig, MapEvent,
    MapView, Scene, TooltipState, Viewport, ZoomDirection, ZoomTransform,
};
use leptos::prelude::*;
use tracing::{debug, warn};
use wasm_bindgen::JsValue;

use crate::dom::{self, ListenerBinding};
use crate::loader;
use crate::render_loop::FrameScheduler;
use crate::surface::MapSurface;
use crate::tooltip::MapTooltip;

/// DOM event fired on the container when a feature is clicked. `detail` is the click record.
pub(crate) const FEATURE_CLICK_EVENT: &str = "japan-map:feature-click";

/// Presentation state mirrored out of `MapView` after each handled event.
#[derive(Clone, Copy)]
pub(crate) struct MapSignals {
    pub surface: RwSignal<Viewport>,
    pub scene: RwSignal<Arc<Scene>>,
    pub transform: RwSignal<ZoomTransform>,
    pub hovered: RwSignal<Option<FeatureId>>,
    pub tooltip: RwSignal<Option<TooltipState>>,
}

/// Shared entry point into one mounted map. Components get it from context.
#[derive(Clone, Copy)]
pub(crate) struct MapHandle {
    view: StoredValue<MapView>,
    signals: MapSignals,
    frames: StoredValue<Option<FrameScheduler>, LocalStorage>,
    container: StoredValue<web_sys::HtmlElement, LocalStorage>,
}

/// A layer refresh read out of the view, applied after the view is released.
enum Refresh {
    Surface(Viewport),
    Shapes(Scene),
    Transform(ZoomTransform),
    Hovered(Option<FeatureId>),
    Tooltip(Option<TooltipState>),
    Click(ClickRecord),
}

impl MapHandle {
    fn new(view: MapView, container: web_sys::HtmlElement) -> Self {
        let signals = MapSignals {
            surface: RwSignal::new(view.viewport()),
            scene: RwSignal::new(Arc::new(view.scene().clone())),
            transform: RwSignal::new(view.transform()),
            hovered: RwSignal::new(None),
            tooltip: RwSignal::new(None),
        };
        Self {
            view: StoredValue::new(view),
            signals,
            frames: StoredValue::new_local(None),
            container: StoredValue::new_local(container),
        }
    }

    pub fn signals(&self) -> MapSignals {
        self.signals
    }

    pub fn highlight_style(&self) -> HighlightStyle {
        self.view
            .try_with_value(|v| v.config().theme.highlight.clone())
            .unwrap_or_default()
    }

    fn container(&self) -> Option<web_sys::HtmlElement> {
        self.container.try_with_value(Clone::clone)
    }

    fn begin_load(&self) -> Option<LoadRequest> {
        self.view.try_update_value(|v| v.begin_load()).flatten()
    }

    /// Feed one event through the view and push the resulting effects out.
    pub fn dispatch(&self, event: MapEvent) {
        let Some(effects) = self.view.try_update_value(|v| v.handle(event)) else {
            return;
        };
        if self.apply(effects) {
            self.frames.try_with_value(|frames| {
                if let Some(frames) = frames {
                    frames.request();
                }
            });
        }
    }

    /// Animation frame tick. Returns true while the transition is running.
    fn frame(&self) -> bool {
        let now = dom::now_ms();
        self.view
            .try_update_value(|v| v.handle(MapEvent::Frame { now }))
            .is_some_and(|effects| self.apply(effects))
    }

    fn apply(&self, effects: Vec<ViewEffect>) -> bool {
        let (refreshes, animate) = self
            .view
            .try_with_value(|view| collect_refreshes(view, effects))
            .unwrap_or_default();

        let s = self.signals;
        for refresh in refreshes {
            match refresh {
                Refresh::Surface(vp) => s.surface.set(vp),
                Refresh::Shapes(scene) => s.scene.set(Arc::new(scene)),
                Refresh::Transform(t) => s.transform.set(t),
                Refresh::Hovered(id) => s.hovered.set(id),
                Refresh::Tooltip(tip) => s.tooltip.set(tip),
                Refresh::Click(record) => self.announce_click(&record),
            }
        }
        animate
    }

    fn announce_click(&self, record: &ClickRecord) {
        let Some(container) = self.container() else {
            return;
        };
        let detail = serde_wasm_bindgen::to_value(record).unwrap_or(JsValue::NULL);
        let init = web_sys::CustomEventInit::new();
        init.set_bubbles(true);
        init.set_detail(&detail);
        if let Ok(event) =
            web_sys::CustomEvent::new_with_event_init_dict(FEATURE_CLICK_EVENT, &init)
        {
            let _ = container.dispatch_event(&event);
        }
    }
}

/// Read the layers named by `effects` out of the view. The flag is set when a
/// transition wants another frame.
fn collect_refreshes(view: &MapView, effects: Vec<ViewEffect>) -> (Vec<Refresh>, bool) {
    let mut animate = false;
    let refreshes = effects
        .into_iter()
        .filter_map(|effect| match effect {
            ViewEffect::Invalidate(Layer::Surface) => Some(Refresh::Surface(view.viewport())),
            ViewEffect::Invalidate(Layer::Shapes) => Some(Refresh::Shapes(view.scene().clone())),
            ViewEffect::Invalidate(Layer::Transform) => {
                Some(Refresh::Transform(view.transform()))
            }
            ViewEffect::Invalidate(Layer::Highlight(_)) => Some(Refresh::Hovered(view.hovered())),
            ViewEffect::Invalidate(Layer::Tooltip) => {
                Some(Refresh::Tooltip(view.tooltip().cloned()))
            }
            ViewEffect::FeatureClicked(record) => Some(Refresh::Click(record)),
            ViewEffect::AnimationRequested => {
                animate = true;
                None
            }
        })
        .collect();
    (refreshes, animate)
}

/// Root map component, mounted into the host container.
#[component]
pub fn App(config: MapConfig, container: web_sys::HtmlElement) -> impl IntoView {
    let view_key = dom::next_view_key();
    let initial = dom::element_size(&container);
    if !initial.is_laid_out() {
        debug!(
            width = initial.width,
            height = initial.height,
            "container not laid out yet; waiting for resize"
        );
    }

    let handle = MapHandle::new(MapView::new(config, initial), container);
    handle
        .frames
        .set_value(Some(FrameScheduler::new(move || handle.frame())));
    provide_context(handle);

    let load = handle
        .begin_load()
        .map(|request| loader::spawn_load(request, move |event| handle.dispatch(event)));

    // Window resize + optional zoom controls. Listeners live until the view is torn down.
    Effect::new(move || {
        dom::release_listeners(view_key);
        wire_resize(view_key, handle);
        wire_zoom_buttons(view_key, handle);
    });

    on_cleanup(move || {
        if let Some(load) = &load {
            load.abort();
        }
        handle.dispatch(MapEvent::TornDown);
        dom::release_listeners(view_key);
        handle.frames.try_update_value(|frames| frames.take());
    });

    view! {
        <div
            class="japan-map"
            style="position: relative; width: 100%; height: 100%; overflow: hidden;"
        >
            <MapSurface />
            <MapTooltip />
        </div>
    }
}

fn wire_resize(view_key: u64, handle: MapHandle) {
    let (Some(window), Some(container)) = (web_sys::window(), handle.container()) else {
        return;
    };
    let binding = ListenerBinding::attach(window.into(), "resize", move |_| {
        let Viewport { width, height } = dom::element_size(&container);
        handle.dispatch(MapEvent::Resized { width, height });
    });
    match binding {
        Some(binding) => dom::keep_listener(view_key, binding),
        None => warn!("could not register window resize listener"),
    }
}

fn wire_zoom_buttons(view_key: u64, handle: MapHandle) {
    let Some(document) = dom::document() else {
        return;
    };
    for (id, direction) in [
        (dom::ZOOM_IN_ID, ZoomDirection::In),
        (dom::ZOOM_OUT_ID, ZoomDirection::Out),
    ] {
        let Some(button) = document.get_element_by_id(id) else {
            debug!(id, "zoom control not present");
            continue;
        };
        let binding = ListenerBinding::attach(button.into(), "click", move |_| {
            handle.dispatch(MapEvent::ZoomButtonPressed {
                direction,
                now: dom::now_ms(),
            });
        });
        if let Some(binding) = binding {
            dom::keep_listener(view_key, binding);
        }
    }
}
