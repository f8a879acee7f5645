mod app;
mod dom;
mod loader;
mod logging;
mod render_loop;
mod surface;
mod tooltip;

use app::App;
use japan_map_shared::MapConfig;
use leptos::mount::mount_to;
use leptos::prelude::*;
use std::any::Any;
use std::cell::RefCell;

thread_local! {
    static APP_MOUNT_HANDLE: RefCell<Option<Box<dyn Any>>> = RefCell::new(None);
}

fn main() {
    console_error_panic_hook::set_once();

    let config = dom::host_config();
    let level = config
        .as_ref()
        .ok()
        .and_then(|c| c.level().ok())
        .unwrap_or(tracing::Level::INFO);
    logging::init(level);
    let config = config.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "invalid JAPAN_MAP_CONFIG; using default preset");
        MapConfig::default()
    });

    let Some(target) = dom::mount_target() else {
        tracing::error!("no mount target (#map-container, #app or <body>)");
        return;
    };

    APP_MOUNT_HANDLE.with(move |slot| {
        // Drop a previous mount so its listeners and pending load are released.
        let _old = slot.borrow_mut().take();
        let container = target.clone();
        let handle = mount_to(target, move || view! { <App config=config container=container /> });
        *slot.borrow_mut() = Some(Box::new(handle));
    });
}
