use dioxus::prelude::*;
use tracing::error;

use gis_portal_shared::models::{format_file_size, LocationFilter};

use crate::api;
use crate::components::features_list::FeaturesList;
use crate::Route;

/// Detail page for one uploaded file: its metadata and a paginated list of
/// the features it produced. Deleting the file removes every feature with it
/// and returns to the home page.
#[component]
pub fn FileDetail(file_id: String) -> Element {
    let navigator = use_navigator();
    let mut action_error = use_signal(|| None::<String>);
    let mut confirm_delete = use_signal(|| false);
    let filter = use_signal(LocationFilter::default);

    let id_for_fetch = file_id.clone();
    let file = use_resource(move || {
        let id = id_for_fetch.clone();
        async move { api::fetch_file(&id).await }
    });

    let loaded = file.read().clone();

    rsx! {
        div { class: "page",
            {match loaded {
                None => rsx! {
                    div { class: "panel", p { class: "muted", "Loading file..." } }
                },
                Some(Err(err)) => rsx! {
                    div { class: "panel",
                        div { class: "banner banner-error", "{err}" }
                        Link { class: "btn", to: Route::Home {}, "Back to Files" }
                    }
                },
                Some(Ok(file)) => {
                    let size = format_file_size(file.file_size);
                    let file_type = file.file_type.to_uppercase();
                    let confirm_text = format!(
                        "Delete \"{}\"? This will also delete all {} features.",
                        file.filename, file.total_features
                    );
                    rsx! {
                        div { class: "panel",
                            div { class: "panel-header",
                                h2 { "{file.filename}" }
                                Link { class: "btn", to: Route::Home {}, "Back" }
                            }
                            if let Some(message) = action_error.read().clone() {
                                div { class: "banner banner-error", "{message}" }
                            }
                            dl { class: "detail-grid",
                                dt { "Original Filename" }
                                dd { "{file.original_filename}" }
                                dt { "File Type" }
                                dd { "{file_type}" }
                                dt { "File Size" }
                                dd { "{size}" }
                                dt { "Total Features" }
                                dd { "{file.total_features}" }
                                if let Some(state) = &file.state {
                                    dt { "State" }
                                    dd { "{state}" }
                                }
                                if let Some(district) = &file.district {
                                    dt { "District" }
                                    dd { "{district}" }
                                }
                                dt { "Uploaded" }
                                dd { "{file.created_at}" }
                            }
                            if *confirm_delete.read() {
                                div { class: "confirm-box",
                                    p { "{confirm_text}" }
                                    button {
                                        class: "btn btn-danger",
                                        onclick: {
                                            let id = file.id.clone();
                                            move |_| {
                                                let id = id.clone();
                                                spawn(async move {
                                                    match api::delete_file(&id).await {
                                                        Ok(()) => {
                                                            navigator.push(Route::Home {});
                                                        }
                                                        Err(err) => {
                                                            error!("file delete failed: {err}");
                                                            confirm_delete.set(false);
                                                            action_error.set(Some(err.to_string()));
                                                        }
                                                    }
                                                });
                                            }
                                        },
                                        "Confirm Delete"
                                    }
                                    button {
                                        class: "btn",
                                        onclick: move |_| confirm_delete.set(false),
                                        "Cancel"
                                    }
                                }
                            } else {
                                button {
                                    class: "btn btn-danger",
                                    onclick: move |_| confirm_delete.set(true),
                                    "Delete File"
                                }
                            }
                        }
                        FeaturesList { filter, file_id: file.id.clone() }
                    }
                }
            }}
        }
    }
}
