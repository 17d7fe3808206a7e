use dioxus::prelude::*;
use tracing::error;

use gis_portal_shared::models::LocationFilter;

use crate::api;
use crate::components::batch_download::BatchDownload;
use crate::components::features_list::FeaturesList;
use crate::components::files_list::FilesList;
use crate::components::location_filter::LocationFilterPanel;

/// Landing page: location filter, batch download, file cards, and the
/// paginated feature table, all reading the same filter signal.
#[component]
pub fn HomePage() -> Element {
    let filter = use_signal(LocationFilter::default);
    let mut refresh = use_signal(|| 0_u64);
    let mut delete_error = use_signal(|| None::<String>);

    let files = use_resource(move || {
        let current = filter.read().clone();
        let _bump = *refresh.read();
        async move { api::fetch_files(&current).await }
    });

    let (file_list, files_loading, files_error) = match &*files.read() {
        Some(Ok(list)) => (list.clone(), false, None),
        Some(Err(err)) => (Vec::new(), false, Some(err.to_string())),
        None => (Vec::new(), true, None),
    };

    rsx! {
        div { class: "page",
            h1 { "GIS Portal" }
            LocationFilterPanel { filter }
            BatchDownload { filter }
            if let Some(message) = files_error {
                div { class: "banner banner-error",
                    span { "{message}" }
                    button {
                        class: "btn btn-small",
                        onclick: move |_| {
                            let current = *refresh.peek();
                            refresh.set(current + 1);
                        },
                        "Retry"
                    }
                }
            }
            if let Some(message) = delete_error.read().clone() {
                div { class: "banner banner-error", "{message}" }
            }
            FilesList {
                files: file_list,
                loading: files_loading,
                on_delete: move |id: String| {
                    spawn(async move {
                        match api::delete_file(&id).await {
                            Ok(()) => {
                                delete_error.set(None);
                                let current = *refresh.peek();
                                refresh.set(current + 1);
                            }
                            Err(err) => {
                                error!("file delete failed: {err}");
                                delete_error.set(Some(err.to_string()));
                            }
                        }
                    });
                },
            }
            FeaturesList { filter }
        }
    }
}
