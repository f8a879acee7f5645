use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use japan_map_shared::{ConfigError, MapConfig, Viewport};
use js_sys::Reflect;
use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use wasm_bindgen::closure::Closure;

/// Host page global holding the map configuration object.
const CONFIG_GLOBAL: &str = "JAPAN_MAP_CONFIG";

/// Container lookup order before falling back to `<body>`.
pub(crate) const CONTAINER_IDS: [&str; 2] = ["map-container", "app"];

pub(crate) const ZOOM_IN_ID: &str = "zoom-in";
pub(crate) const ZOOM_OUT_ID: &str = "zoom-out";

pub(crate) fn document() -> Option<web_sys::Document> {
    web_sys::window()?.document()
}

pub(crate) fn mount_target() -> Option<web_sys::HtmlElement> {
    let document = document()?;
    CONTAINER_IDS
        .iter()
        .find_map(|id| {
            document
                .get_element_by_id(id)
                .and_then(|node| node.dyn_into::<web_sys::HtmlElement>().ok())
        })
        .or_else(|| document.body())
}

pub(crate) fn element_size(el: &web_sys::Element) -> Viewport {
    Viewport::new(f64::from(el.client_width()), f64::from(el.client_height()))
}

/// `(client_x, client_y)` relative to the element's top-left corner.
pub(crate) fn local_point(el: &web_sys::Element, client_x: i32, client_y: i32) -> [f64; 2] {
    let rect = el.get_bounding_client_rect();
    [
        f64::from(client_x) - rect.left(),
        f64::from(client_y) - rect.top(),
    ]
}

/// High-resolution timestamp in milliseconds.
pub(crate) fn now_ms() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or_else(js_sys::Date::now)
}

/// Read `window.JAPAN_MAP_CONFIG`. An absent global yields the default preset.
pub(crate) fn host_config() -> Result<MapConfig, ConfigError> {
    let Some(window) = web_sys::window() else {
        return Ok(MapConfig::default());
    };
    let raw = Reflect::get(&window, &JsValue::from_str(CONFIG_GLOBAL))
        .unwrap_or(JsValue::UNDEFINED);
    if raw.is_undefined() || raw.is_null() {
        return Ok(MapConfig::default());
    }
    let value: serde_json::Value = serde_wasm_bindgen::from_value(raw)
        .map_err(|e| ConfigError::invalid("JAPAN_MAP_CONFIG", e.to_string()))?;
    MapConfig::from_host_value(value)
}

/// An event listener that is removed from its target when dropped.
pub(crate) struct ListenerBinding {
    target: web_sys::EventTarget,
    kind: &'static str,
    handler: Closure<dyn Fn(web_sys::Event)>,
}

impl ListenerBinding {
    pub(crate) fn attach(
        target: web_sys::EventTarget,
        kind: &'static str,
        handler: impl Fn(web_sys::Event) + 'static,
    ) -> Option<Self> {
        let handler = Closure::<dyn Fn(web_sys::Event)>::new(handler);
        target
            .add_event_listener_with_callback(kind, handler.as_ref().unchecked_ref())
            .ok()?;
        Some(Self {
            target,
            kind,
            handler,
        })
    }
}

impl Drop for ListenerBinding {
    fn drop(&mut self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(self.kind, self.handler.as_ref().unchecked_ref());
    }
}

thread_local! {
    static NEXT_VIEW_KEY: Cell<u64> = const { Cell::new(1) };
    static LISTENER_BINDINGS: RefCell<HashMap<u64, Vec<ListenerBinding>>> =
        RefCell::new(HashMap::new());
}

/// Key under which one mounted map keeps its window and control listeners.
pub(crate) fn next_view_key() -> u64 {
    NEXT_VIEW_KEY.with(|next| {
        let key = next.get();
        next.set(key + 1);
        key
    })
}

pub(crate) fn keep_listener(view_key: u64, binding: ListenerBinding) {
    LISTENER_BINDINGS.with(|slot| {
        slot.borrow_mut().entry(view_key).or_default().push(binding);
    });
}

/// Detach every listener registered for `view_key`.
pub(crate) fn release_listeners(view_key: u64) {
    let released = LISTENER_BINDINGS.with(|slot| slot.borrow_mut().remove(&view_key));
    drop(released);
}
