use japan_map_shared::style::HighlightStyle;
use japan_map_shared::transform::wheel_delta_for;
use japan_map_shared::{FeatureId, MapEvent, Shape, ShapeGeometry};
use leptos::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{MouseEvent, PointerEvent, TouchEvent, WheelEvent};

use crate::app::{MapHandle, MapSignals};
use crate::dom;

/// Pointer travel (px, per axis) below which a press counts as a click.
const CLICK_SLOP: f64 = 5.0;

/// Drag bookkeeping for the surface, in client coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct DragState {
    active: bool,
    start: [f64; 2],
    last: [f64; 2],
}

impl DragState {
    pub(crate) fn begin(&mut self, at: [f64; 2]) {
        *self = Self {
            active: true,
            start: at,
            last: at,
        };
    }

    /// Movement since the last sample while a drag is active.
    pub(crate) fn advance(&mut self, at: [f64; 2]) -> Option<[f64; 2]> {
        if !self.active {
            return None;
        }
        let delta = [at[0] - self.last[0], at[1] - self.last[1]];
        self.last = at;
        Some(delta)
    }

    pub(crate) fn end(&mut self) {
        self.active = false;
    }

    /// True when a press released at `at` should count as a click.
    pub(crate) fn is_click(&self, at: [f64; 2]) -> bool {
        (at[0] - self.start[0]).abs() < CLICK_SLOP && (at[1] - self.start[1]).abs() < CLICK_SLOP
    }
}

pub(crate) fn span(a: [f64; 2], b: [f64; 2]) -> f64 {
    (b[0] - a[0]).hypot(b[1] - a[1])
}

pub(crate) fn midpoint(a: [f64; 2], b: [f64; 2]) -> [f64; 2] {
    [(a[0] + b[0]) / 2.0, (a[1] + b[1]) / 2.0]
}

fn client_point(e: &MouseEvent) -> [f64; 2] {
    [f64::from(e.client_x()), f64::from(e.client_y())]
}

/// Event position relative to the element the listener is attached to.
fn surface_point(e: &web_sys::Event, client_x: i32, client_y: i32) -> Option<[f64; 2]> {
    let el = e.current_target()?.dyn_into::<web_sys::Element>().ok()?;
    Some(dom::local_point(&el, client_x, client_y))
}

fn two_touches(e: &TouchEvent) -> Option<([i32; 2], [i32; 2])> {
    let touches = e.touches();
    if touches.length() != 2 {
        return None;
    }
    let (t0, t1) = (touches.get(0)?, touches.get(1)?);
    Some((
        [t0.client_x(), t0.client_y()],
        [t1.client_x(), t1.client_y()],
    ))
}

/// SVG drawing surface: sized to the container, one transformed group holding
/// the data layer.
#[component]
pub fn MapSurface() -> impl IntoView {
    let handle: MapHandle = expect_context();
    let MapSignals {
        surface,
        scene,
        transform,
        hovered,
        ..
    } = handle.signals();
    let highlight = handle.highlight_style();

    let drag = StoredValue::new(DragState::default());
    let pinch_span = StoredValue::new(0.0f64);

    let on_wheel = move |e: WheelEvent| {
        e.prevent_default();
        let Some([x, y]) = surface_point(&e, e.client_x(), e.client_y()) else {
            return;
        };
        handle.dispatch(MapEvent::ZoomGesture {
            delta: e.delta_y(),
            x,
            y,
        });
    };

    let on_pointer_down = move |e: PointerEvent| {
        let at = client_point(&e);
        drag.update_value(|d| d.begin(at));
    };

    let on_pointer_move = move |e: PointerEvent| {
        if let Some([x, y]) = surface_point(&e, e.client_x(), e.client_y()) {
            handle.dispatch(MapEvent::PointerMoved { x, y });
        }
        let at = client_point(&e);
        if let Some(Some([dx, dy])) = drag.try_update_value(|d| d.advance(at))
            && (dx != 0.0 || dy != 0.0)
        {
            handle.dispatch(MapEvent::PanGesture { dx, dy });
        }
    };

    let on_pointer_end = move |_: PointerEvent| {
        drag.update_value(DragState::end);
    };

    let on_touch_start = move |e: TouchEvent| {
        if let Some((a, b)) = two_touches(&e) {
            e.prevent_default();
            let a = [f64::from(a[0]), f64::from(a[1])];
            let b = [f64::from(b[0]), f64::from(b[1])];
            pinch_span.set_value(span(a, b));
        }
    };

    let on_touch_move = move |e: TouchEvent| {
        let Some((ta, tb)) = two_touches(&e) else {
            return;
        };
        e.prevent_default();
        // Two fingers are a pinch, not a drag.
        drag.update_value(DragState::end);
        let a = [f64::from(ta[0]), f64::from(ta[1])];
        let b = [f64::from(tb[0]), f64::from(tb[1])];
        let new_span = span(a, b);
        let old_span = pinch_span.get_value();
        pinch_span.set_value(new_span);
        if old_span <= 0.0 || new_span <= 0.0 {
            return;
        }
        let mid = midpoint(a, b);
        let Some([x, y]) = surface_point(&e, mid[0] as i32, mid[1] as i32) else {
            return;
        };
        handle.dispatch(MapEvent::ZoomGesture {
            delta: wheel_delta_for(new_span / old_span),
            x,
            y,
        });
    };

    view! {
        <svg
            class="map-surface"
            width=move || surface.get().width.to_string()
            height=move || surface.get().height.to_string()
            viewBox=move || {
                let vp = surface.get();
                format!("0 0 {} {}", vp.width, vp.height)
            }
            style="display: block; width: 100%; height: 100%; touch-action: none; cursor: grab;"
            on:wheel=on_wheel
            on:pointerdown=on_pointer_down
            on:pointermove=on_pointer_move
            on:pointerup=on_pointer_end
            on:pointercancel=on_pointer_end
            on:pointerleave=on_pointer_end
            on:touchstart=on_touch_start
            on:touchmove=on_touch_move
        >
            <g class="map-layer" transform=move || transform.get().to_svg()>
                <g class="data-layer">
                    {move || {
                        let scene = scene.get();
                        scene
                            .shapes
                            .iter()
                            .map(|shape| render_shape(shape, &highlight, handle, hovered, drag))
                            .collect_view()
                    }}
                </g>
            </g>
        </svg>
    }
}

/// One shape element. Styles are precomputed; hover only swaps between them.
fn render_shape(
    shape: &Shape,
    highlight: &HighlightStyle,
    handle: MapHandle,
    hovered: RwSignal<Option<FeatureId>>,
    drag: StoredValue<DragState>,
) -> AnyView {
    let id = shape.feature;
    let base_css = shape.base_style.to_css();
    let hot_css = shape.base_style.highlighted(highlight).to_css();
    let style = move || {
        if hovered.get() == Some(id) {
            hot_css.clone()
        } else {
            base_css.clone()
        }
    };
    let on_enter = move |_: PointerEvent| handle.dispatch(MapEvent::PointerEntered(id));
    let on_leave = move |_: PointerEvent| handle.dispatch(MapEvent::PointerLeft);
    let on_click = move |e: MouseEvent| {
        let at = client_point(&e);
        if drag.try_with_value(|d| d.is_click(at)).unwrap_or(true) {
            handle.dispatch(MapEvent::Clicked(id));
        }
    };
    let class = shape.class;
    let key = id.0.to_string();

    match &shape.geometry {
        ShapeGeometry::Outline { path } => view! {
            <path
                class=class
                data-feature=key
                d=path.clone()
                style=style
                on:pointerenter=on_enter
                on:pointerleave=on_leave
                on:click=on_click
            />
        }
        .into_any(),
        ShapeGeometry::Marker { cx, cy, r } => view! {
            <circle
                class=class
                data-feature=key
                cx=format!("{cx:.2}")
                cy=format!("{cy:.2}")
                r=format!("{r:.2}")
                style=style
                on:pointerenter=on_enter
                on:pointerleave=on_leave
                on:click=on_click
            />
        }
        .into_any(),
    }
}
