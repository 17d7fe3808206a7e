use dioxus::prelude::*;
use gloo_timers::future::TimeoutFuture;
use serde_json::{Map, Value};
use tracing::error;

use gis_portal_shared::models::{GeoFeature, LocationFilter};

use crate::api;
use crate::Route;

pub const PAGE_LIMIT: u64 = 20;

/// Filter edits settle for this long before a fetch fires.
const DEBOUNCE_MS: u32 = 300;

/// Look up a display property tolerating the mixed key casing the source
/// files come with.
fn property_value(properties: &Map<String, Value>, key: &str) -> String {
    for candidate in [key.to_string(), key.to_lowercase(), key.to_uppercase()] {
        if let Some(value) = properties.get(&candidate) {
            return match value {
                Value::String(s) if !s.is_empty() => s.clone(),
                Value::Null => continue,
                Value::String(_) => continue,
                other => other.to_string(),
            };
        }
    }
    "N/A".to_string()
}

/// Whether a Next button makes sense: a short page means we reached the end.
fn has_next_page(fetched: usize) -> bool {
    fetched as u64 == PAGE_LIMIT
}

/// Paginated feature table. With a `file_id` it lists that file's features;
/// otherwise it lists features matching the location filter. Fetches are
/// debounced, and a generation counter drops responses that arrive after a
/// newer request started, so rapid filter and page changes can never render
/// stale rows.
#[component]
pub fn FeaturesList(filter: ReadSignal<LocationFilter>, file_id: Option<String>) -> Element {
    let mut page = use_signal(|| 0_u64);
    let mut features = use_signal(Vec::<GeoFeature>::new);
    let mut loading = use_signal(|| true);
    let mut load_error = use_signal(|| None::<String>);
    let mut generation = use_signal(|| 0_u64);
    let mut refresh = use_signal(|| 0_u64);
    let mut last_filter = use_signal(LocationFilter::default);
    let mut pending_delete = use_signal(|| None::<String>);

    // Any filter edit jumps back to the first page.
    use_effect(move || {
        let current = filter.read().clone();
        if *last_filter.peek() != current {
            last_filter.set(current);
            page.set(0);
        }
    });

    use_effect(move || {
        let current = filter.read().clone();
        let skip = *page.read() * PAGE_LIMIT;
        let _refresh = *refresh.read();
        let file_id = file_id.clone();

        let my_generation = *generation.peek() + 1;
        generation.set(my_generation);

        spawn(async move {
            TimeoutFuture::new(DEBOUNCE_MS).await;
            if *generation.peek() != my_generation {
                return;
            }
            loading.set(true);
            let result = match &file_id {
                Some(id) => api::fetch_file_features(id, skip, PAGE_LIMIT).await,
                None => api::fetch_features(&current, skip, PAGE_LIMIT).await,
            };
            if *generation.peek() != my_generation {
                return;
            }
            match result {
                Ok(list) => {
                    features.set(list);
                    load_error.set(None);
                }
                Err(err) => {
                    error!("feature list fetch failed: {err}");
                    load_error.set(Some(err.to_string()));
                }
            }
            loading.set(false);
        });
    });

    let rows = features.read().clone();
    let current_page = *page.read();
    let page_number = current_page + 1;
    let next_enabled = has_next_page(rows.len());
    let row_count = rows.len();
    let display_rows: Vec<_> = rows
        .iter()
        .map(|feature| {
            (
                feature.id.clone(),
                feature.name.clone(),
                feature.created_at.clone(),
                property_value(&feature.properties, "District_Name"),
                property_value(&feature.properties, "Taluk_Name"),
                property_value(&feature.properties, "Village_Name"),
                property_value(&feature.properties, "Survey_Number"),
            )
        })
        .collect();

    rsx! {
        div { class: "panel",
            h3 { "Features" }
            if let Some(message) = load_error.read().clone() {
                div { class: "banner banner-error",
                    span { "{message}" }
                    button {
                        class: "btn btn-small",
                        onclick: move |_| {
                            load_error.set(None);
                            let current = *refresh.peek();
                            refresh.set(current + 1);
                        },
                        "Retry"
                    }
                }
            }
            if *loading.read() {
                p { class: "muted", "Loading features..." }
            } else if rows.is_empty() {
                p { class: "muted", "No features found." }
            } else {
                table { class: "feature-table",
                    thead {
                        tr {
                            th { "Name" }
                            th { "District" }
                            th { "Taluk" }
                            th { "Village" }
                            th { "Survey No." }
                            th { "Actions" }
                        }
                    }
                    tbody {
                        for (id, name, created_at, district, taluk, village, survey) in display_rows {
                            tr { key: "{id}",
                                td {
                                    div { "{name}" }
                                    div { class: "muted", "{created_at}" }
                                }
                                td { "{district}" }
                                td { "{taluk}" }
                                td { "{village}" }
                                td { "{survey}" }
                                td {
                                    Link {
                                        class: "btn btn-small",
                                        to: Route::FeatureView { id: id.clone() },
                                        "View"
                                    }
                                    if *pending_delete.read() == Some(id.clone()) {
                                        button {
                                            class: "btn btn-small btn-danger",
                                            onclick: {
                                                let id = id.clone();
                                                move |_| {
                                                    let id = id.clone();
                                                    pending_delete.set(None);
                                                    spawn(async move {
                                                        match api::delete_feature(&id).await {
                                                            Ok(()) => {
                                                                let current = *refresh.peek();
                                                                refresh.set(current + 1);
                                                            }
                                                            Err(err) => {
                                                                error!("feature delete failed: {err}");
                                                                load_error.set(Some(err.to_string()));
                                                            }
                                                        }
                                                    });
                                                }
                                            },
                                            "Confirm"
                                        }
                                        button {
                                            class: "btn btn-small",
                                            onclick: move |_| pending_delete.set(None),
                                            "Cancel"
                                        }
                                    } else {
                                        button {
                                            class: "btn btn-small btn-danger",
                                            onclick: {
                                                let id = id.clone();
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
                div { class: "pager",
                    button {
                        class: "btn",
                        disabled: current_page == 0,
                        onclick: move |_| {
                            let current = *page.peek();
                            page.set(current.saturating_sub(1));
                        },
                        "Previous"
                    }
                    span { "Page {page_number} ({row_count} items)" }
                    button {
                        class: "btn",
                        disabled: !next_enabled,
                        onclick: move |_| {
                            let current = *page.peek();
                            page.set(current + 1);
                        },
                        "Next"
                    }
                }
            }
        }
    }
}
