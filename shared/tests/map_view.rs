use japan_map_shared::{
    Effect, FeatureCollection, FeatureId, Layer, LoadError, MapConfig, MapEvent, MapView,
    ShapeGeometry, ViewPhase, Viewport, ZoomDirection,
};

const TOKYO: &str = r#"{
    "type": "FeatureCollection",
    "features": [{
        "type": "Feature",
        "properties": { "name": "Tokyo", "name_ja": "東京都", "type": "prefecture", "population": 14000000 },
        "geometry": {
            "type": "Polygon",
            "coordinates": [[[138.9,35.5],[139.9,35.5],[139.9,35.9],[138.9,35.9],[138.9,35.5]]]
        }
    }]
}"#;

fn tokyo() -> FeatureCollection {
    FeatureCollection::from_json_str(TOKYO).unwrap()
}

fn loaded_view(width: f64, height: f64) -> MapView {
    let mut view = MapView::new(MapConfig::default(), Viewport::new(width, height));
    let request = view.begin_load().unwrap();
    view.handle(MapEvent::DataLoaded {
        ticket: request.ticket,
        collection: tokyo(),
    });
    view
}

#[test]
fn hover_shows_tooltip_and_leave_restores_baseline() {
    let mut view = loaded_view(800.0, 600.0);
    assert_eq!(view.phase(), ViewPhase::Ready);
    assert_eq!(view.scene().len(), 1);
    let shape = &view.scene().shapes[0];
    assert_eq!(shape.feature, FeatureId(0));
    assert_eq!(shape.class, "prefecture");
    let baseline = view.style_of(FeatureId(0)).unwrap();

    view.handle(MapEvent::PointerMoved { x: 420.0, y: 310.0 });
    let effects = view.handle(MapEvent::PointerEntered(FeatureId(0)));
    assert!(effects.contains(&Effect::Invalidate(Layer::Highlight(FeatureId(0)))));
    let text = view.tooltip().unwrap().content.plain_text();
    assert!(text.contains("Tokyo"), "{text}");
    assert!(text.contains("14,000,000"), "{text}");
    assert_ne!(view.style_of(FeatureId(0)).unwrap(), baseline);

    view.handle(MapEvent::PointerLeft);
    assert!(view.tooltip().is_none());
    assert_eq!(view.hovered(), None);
    assert_eq!(view.style_of(FeatureId(0)).unwrap(), baseline);
    assert_eq!(view.style_of(FeatureId(0)).unwrap().fill, "#e6f3ff");
}

#[test]
fn resize_redraws_with_new_coordinates() {
    let mut view = loaded_view(800.0, 600.0);
    let before = view.scene().clone();

    let effects = view.handle(MapEvent::Resized {
        width: 400.0,
        height: 300.0,
    });
    assert_eq!(effects[0], Effect::Invalidate(Layer::Surface));
    assert!(effects.contains(&Effect::Invalidate(Layer::Shapes)));
    assert_eq!(view.viewport(), Viewport::new(400.0, 300.0));
    assert_eq!(view.scene().len(), before.len());
    assert!(view.scene().generation > before.generation);
    assert_ne!(view.scene().shapes[0].geometry, before.shapes[0].geometry);

    // Same size again is a no-op.
    assert!(
        view.handle(MapEvent::Resized {
            width: 400.0,
            height: 300.0
        })
        .is_empty()
    );
}

#[test]
fn http_error_never_draws() {
    let mut view = MapView::new(MapConfig::default(), Viewport::new(800.0, 600.0));
    let request = view.begin_load().unwrap();
    let effects = view.handle(MapEvent::DataLoadFailed {
        ticket: request.ticket,
        error: LoadError::Http { status: 404 },
    });
    assert!(effects.is_empty());
    assert_eq!(view.phase(), ViewPhase::Failed);
    assert!(view.scene().is_empty());

    view.handle(MapEvent::Resized {
        width: 1024.0,
        height: 768.0,
    });
    view.handle(MapEvent::PointerEntered(FeatureId(0)));
    assert!(view.scene().is_empty());
    assert!(view.tooltip().is_none());
    assert!(view.begin_load().is_none());
}

#[test]
fn late_results_are_ignored() {
    let mut view = MapView::new(MapConfig::default(), Viewport::new(800.0, 600.0));
    let request = view.begin_load().unwrap();
    view.handle(MapEvent::TornDown);
    let effects = view.handle(MapEvent::DataLoaded {
        ticket: request.ticket,
        collection: tokyo(),
    });
    assert!(effects.is_empty());
    assert_eq!(view.phase(), ViewPhase::TornDown);
    assert!(view.scene().is_empty());
}

#[test]
fn stale_ticket_is_ignored() {
    let mut first = MapView::new(MapConfig::default(), Viewport::new(800.0, 600.0));
    let ticket = first.begin_load().unwrap().ticket;

    // A result delivered twice only counts once.
    first.handle(MapEvent::DataLoaded {
        ticket,
        collection: tokyo(),
    });
    let generation = first.scene().generation;
    let effects = first.handle(MapEvent::DataLoaded {
        ticket,
        collection: tokyo(),
    });
    assert!(effects.is_empty());
    assert_eq!(first.scene().generation, generation);
}

#[test]
fn zero_size_defers_render_until_first_resize() {
    let mut view = MapView::new(MapConfig::default(), Viewport::new(0.0, 0.0));
    assert!(view.projection().is_none());
    let request = view.begin_load().unwrap();
    view.handle(MapEvent::DataLoaded {
        ticket: request.ticket,
        collection: tokyo(),
    });
    assert_eq!(view.phase(), ViewPhase::Ready);
    assert!(view.scene().is_empty());

    let effects = view.handle(MapEvent::Resized {
        width: 0.0,
        height: 480.0,
    });
    assert_eq!(effects, vec![Effect::Invalidate(Layer::Surface)]);
    assert!(view.scene().is_empty());

    view.handle(MapEvent::Resized {
        width: 640.0,
        height: 480.0,
    });
    assert_eq!(view.scene().len(), 1);
    assert!(view.projection().is_some());
}

#[test]
fn rendering_twice_yields_the_same_shapes() {
    let mut view = loaded_view(800.0, 600.0);
    let first = view.scene().clone();
    let ShapeGeometry::Outline { path } = &first.shapes[0].geometry else {
        panic!("Tokyo should be an outline");
    };
    assert!(path.starts_with('M') && path.ends_with('Z'));

    view.handle(MapEvent::Resized {
        width: 400.0,
        height: 300.0,
    });
    view.handle(MapEvent::Resized {
        width: 800.0,
        height: 600.0,
    });
    assert_eq!(view.scene().shapes, first.shapes);
    assert_eq!(view.scene().viewport, first.viewport);
    assert_eq!(view.scene().generation, first.generation + 2);
}

#[test]
fn scale_extent_above_one_is_respected_from_the_start() {
    let mut config = MapConfig::default();
    config.scale_extent = [2.0, 8.0].into();
    config.validate().unwrap();
    let mut view = MapView::new(config, Viewport::new(800.0, 600.0));
    let request = view.begin_load().unwrap();
    view.handle(MapEvent::DataLoaded {
        ticket: request.ticket,
        collection: tokyo(),
    });
    view.handle(MapEvent::PanGesture { dx: 12.0, dy: 4.0 });
    assert_eq!(view.transform().k, 2.0);

    // Redraw under the default reset policy lands inside the extent too.
    view.handle(MapEvent::Resized {
        width: 640.0,
        height: 480.0,
    });
    assert_eq!(view.transform().k, 2.0);
}

#[test]
fn repeated_zoom_in_stays_clamped() {
    let mut view = loaded_view(800.0, 600.0);
    let max = view.config().scale_extent.max;
    let mut now = 0.0;
    for _ in 0..30 {
        view.handle(MapEvent::ZoomButtonPressed {
            direction: ZoomDirection::In,
            now,
        });
        now += 30.0;
        view.handle(MapEvent::Frame { now });
        assert!(view.transform().k <= max);
    }
    while view.is_animating() {
        now += 16.0;
        view.handle(MapEvent::Frame { now });
        assert!(view.transform().k <= max);
    }
    assert!((view.transform().k - max).abs() < 1e-9);

    for _ in 0..10 {
        view.handle(MapEvent::ZoomGesture {
            delta: 5000.0,
            x: 10.0,
            y: 10.0,
        });
    }
    assert_eq!(view.transform().k, view.config().scale_extent.min);
}
