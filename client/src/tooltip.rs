use japan_map_shared::{TooltipContent, TooltipState};
use leptos::prelude::*;

use crate::app::MapHandle;

/// Tooltip that follows the pointer while a feature is hovered.
#[component]
pub fn MapTooltip() -> impl IntoView {
    let handle: MapHandle = expect_context();
    let tooltip = handle.signals().tooltip;

    view! {
        {move || {
            let Some(TooltipState { content, x, y }) = tooltip.get() else {
                return view! { <div class="map-tooltip" style="display:none;" /> }.into_any();
            };
            let label = content.plain_text();
            let TooltipContent { title, subtitle, kind, rows, image } = content;
            view! {
                <div
                    class="map-tooltip show"
                    role="tooltip"
                    aria-label=label
                    style:left=format!("{x}px")
                    style:top=format!("{y}px")
                    style="position: absolute; pointer-events: none; z-index: 10; background: rgba(255,255,255,0.96); border: 1px solid #2980b9; border-radius: 4px; padding: 6px 9px; font: 12px/1.4 system-ui, sans-serif; color: #1b2631; box-shadow: 0 2px 8px rgba(0,0,0,0.2); max-width: 240px;"
                >
                    <div><strong>{title}</strong></div>
                    {subtitle.map(|s| view! { <div>{s}</div> })}
                    <div style="color: #5d6d7e;">{kind}</div>
                    {rows
                        .into_iter()
                        .map(|(label, value)| view! { <div>{label}": "{value}</div> })
                        .collect_view()}
                    {image.map(|src| view! {
                        <img src=src alt="" style="display: block; max-width: 100%; margin-top: 4px; border-radius: 2px;" />
                    })}
                </div>
            }
            .into_any()
        }}
    }
}
