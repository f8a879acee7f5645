use futures::future::{AbortHandle, Aborted, abortable};
use japan_map_shared::{FeatureCollection, LoadError, LoadRequest, MapEvent};
use wasm_bindgen_futures::spawn_local;

/// Fetch and validate the dataset.
pub async fn fetch_collection(url: &str) -> Result<FeatureCollection, LoadError> {
    let resp = gloo_net::http::Request::get(url)
        .send()
        .await
        .map_err(|e| LoadError::Network(e.to_string()))?;

    if !resp.ok() {
        return Err(LoadError::Http {
            status: resp.status(),
        });
    }

    let body = resp
        .text()
        .await
        .map_err(|e| LoadError::Network(e.to_string()))?;
    FeatureCollection::from_json_str(&body)
}

/// Run the load for `request` in the background and deliver the outcome as a
/// `MapEvent`. Aborting the returned handle drops the fetch without delivering.
pub fn spawn_load(request: LoadRequest, deliver: impl FnOnce(MapEvent) + 'static) -> AbortHandle {
    let LoadRequest { ticket, url } = request;
    let (task, handle) = abortable(async move { fetch_collection(&url).await });
    spawn_local(async move {
        match task.await {
            Ok(Ok(collection)) => deliver(MapEvent::DataLoaded { ticket, collection }),
            Ok(Err(error)) => deliver(MapEvent::DataLoadFailed { ticket, error }),
            Err(Aborted) => tracing::debug!("map data load aborted"),
        }
    });
    handle
}
