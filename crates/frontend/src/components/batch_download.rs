use dioxus::prelude::*;
use tracing::error;

use gis_portal_shared::models::{batch_download_filename, LocationFilter};

use crate::api;
use crate::download::save_bytes;

/// Bulk download of every file matching the active state/district filter.
/// Merged mode combines everything into one GeoJSON document; otherwise the
/// server returns a ZIP with one document per file.
#[component]
pub fn BatchDownload(filter: ReadSignal<LocationFilter>) -> Element {
    let mut merge = use_signal(|| true);
    let mut downloading = use_signal(|| false);
    let mut message = use_signal(|| None::<String>);

    let current = filter.read().clone();
    let has_filters = current.state.is_some() || current.district.is_some();
    let merge_on = *merge.read();
    let busy = *downloading.read();

    let start = move |_| {
        let current = filter.read().clone();
        if current.state.is_none() && current.district.is_none() {
            message.set(Some(
                "Please select at least a state or district to download files.".to_string(),
            ));
            return;
        }
        let merge_on = *merge.peek();
        downloading.set(true);
        message.set(None);
        spawn(async move {
            let filename = batch_download_filename(&current, merge_on);
            match api::download_batch(&current, merge_on, "geojson").await {
                Ok(bytes) => {
                    if let Err(save_error) = save_bytes(&bytes, &filename) {
                        message.set(Some(save_error));
                    }
                }
                Err(err) => {
                    error!("batch download failed: {err}");
                    message.set(Some(err.to_string()));
                }
            }
            downloading.set(false);
        });
    };

    rsx! {
        div { class: "panel",
            h3 { "Batch Download" }
            if let Some(text) = message.read().clone() {
                div { class: "banner banner-error", "{text}" }
            }
            label { class: "checkbox-row",
                input {
                    r#type: "checkbox",
                    checked: merge_on,
                    disabled: busy,
                    onchange: move |evt: Event<FormData>| merge.set(evt.checked()),
                }
                "Merge into a single file"
            }
            p { class: "muted",
                if merge_on {
                    "All files will be combined into a single GeoJSON file with all features merged."
                } else {
                    "Each file is exported separately and bundled into a ZIP archive."
                }
            }
            div { class: "filter-summary",
                if let Some(state) = &current.state {
                    span { "State: {state}" }
                }
                if let Some(district) = &current.district {
                    span { "District: {district}" }
                }
                if !has_filters {
                    span { class: "muted", "Select a state or district above to download files." }
                }
            }
            button {
                class: "btn btn-primary",
                disabled: busy || !has_filters,
                onclick: start,
                if busy { "Preparing download..." } else { "Download Files" }
            }
            p { class: "muted",
                "All geometry and properties are preserved during conversion to GeoJSON format."
            }
        }
    }
}
