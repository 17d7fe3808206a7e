use dioxus::prelude::*;
use tracing::error;

use gis_portal_shared::models::{file_type_label, format_file_size, single_download_filename, GeoFile};

use crate::api;
use crate::download::save_bytes;
use crate::Route;

/// Grid of uploaded-file cards. Deletion is two-step: the first click arms
/// the confirm button, the second fires `on_delete`. Downloads run here;
/// list refreshes after delete are the parent's job.
#[component]
pub fn FilesList(files: Vec<GeoFile>, loading: bool, on_delete: EventHandler<String>) -> Element {
    let mut pending_delete = use_signal(|| None::<String>);
    let mut downloading = use_signal(|| None::<String>);
    let mut download_error = use_signal(|| None::<String>);

    if loading {
        return rsx! {
            div { class: "panel", p { class: "muted", "Loading files..." } }
        };
    }
    if files.is_empty() {
        return rsx! {
            div { class: "panel", p { class: "muted", "No files found. Upload one to get started." } }
        };
    }

    rsx! {
        if let Some(message) = download_error.read().clone() {
            div { class: "banner banner-error", "{message}" }
        }
        div { class: "file-grid",
            for file in files {
                div { class: "card file-card", key: "{file.id}",
                    h4 { "{file.original_filename}" }
                    div { class: "file-meta",
                        span { class: "badge", "{file_type_label(&file.original_filename)}" }
                        span { "{format_file_size(file.file_size)}" }
                        span { "{file.total_features} features" }
                    }
                    div { class: "file-location",
                        if let Some(state) = &file.state {
                            span { "{state}" }
                        }
                        if let Some(district) = &file.district {
                            span { "{district}" }
                        }
                    }
                    p { class: "muted", "Uploaded {file.created_at}" }
                    div { class: "card-actions",
                        Link { class: "btn", to: Route::FileView { id: file.id.clone() }, "View" }
                        button {
                            class: "btn",
                            disabled: *downloading.read() == Some(file.id.clone()),
                            onclick: {
                                let id = file.id.clone();
                                let filename = single_download_filename(&file.filename, "geojson");
                                move |_| {
                                    let id = id.clone();
                                    let filename = filename.clone();
                                    downloading.set(Some(id.clone()));
                                    download_error.set(None);
                                    spawn(async move {
                                        match api::download_file(&id, "geojson").await {
                                            Ok(bytes) => {
                                                if let Err(message) = save_bytes(&bytes, &filename) {
                                                    download_error.set(Some(message));
                                                }
                                            }
                                            Err(err) => {
                                                error!("download of file {id} failed: {err}");
                                                download_error.set(Some(err.to_string()));
                                            }
                                        }
                                        downloading.set(None);
                                    });
                                }
                            },
                            if *downloading.read() == Some(file.id.clone()) { "Downloading..." } else { "Download" }
                        }
                        if *pending_delete.read() == Some(file.id.clone()) {
                            button {
                                class: "btn btn-danger",
                                onclick: {
                                    let id = file.id.clone();
                                    move |_| {
                                        pending_delete.set(None);
                                        on_delete.call(id.clone());
                                    }
                                },
                                "Confirm Delete"
                            }
                            button {
                                class: "btn",
                                onclick: move |_| pending_delete.set(None),
                                "Cancel"
                            }
                        } else {
                            button {
                                class: "btn btn-danger",
                                onclick: {
                                    let id = file.id.clone();
                                    move |_| pending_delete.set(Some(id.clone()))
                                },
                                "Delete"
                            }
                        }
                    }
                }
            }
        }
    }
}
