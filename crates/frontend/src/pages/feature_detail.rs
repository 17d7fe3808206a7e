use dioxus::prelude::*;
use serde_json::{Map, Value};
use tracing::error;

use gis_portal_shared::models::FeatureUpdate;

use crate::api;
use crate::components::feature_map::FeatureMap;
use crate::Route;

/// Parse the properties editor text. Only a JSON object is a valid
/// properties payload; anything else is rejected.
fn parse_properties(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

fn pretty_properties(properties: &Map<String, Value>) -> String {
    serde_json::to_string_pretty(&Value::Object(properties.clone()))
        .unwrap_or_else(|_| "{}".to_string())
}

/// Detail page for one feature: geometry preview, metadata, and an editor
/// for the name and properties. The properties textarea is tolerant while
/// typing: invalid JSON never blocks input, and the last valid parse is what
/// a save submits.
#[component]
pub fn FeatureDetail(feature_id: String) -> Element {
    let navigator = use_navigator();
    let mut editing = use_signal(|| false);
    let mut saving = use_signal(|| false);
    let mut confirm_delete = use_signal(|| false);
    let mut action_error = use_signal(|| None::<String>);
    let mut name_draft = use_signal(String::new);
    let mut properties_text = use_signal(String::new);
    let mut properties_draft = use_signal(Map::<String, Value>::new);
    // Overrides the fetched feature after a successful save.
    let mut saved_feature = use_signal(|| None::<gis_portal_shared::models::GeoFeature>);

    let id_for_fetch = feature_id.clone();
    let fetched = use_resource(move || {
        let id = id_for_fetch.clone();
        async move { api::fetch_feature(&id).await }
    });

    let loaded = match saved_feature.read().clone() {
        Some(feature) => Some(Ok(feature)),
        None => fetched.read().clone(),
    };

    rsx! {
        div { class: "page",
            {match loaded {
                None => rsx! {
                    div { class: "panel", p { class: "muted", "Loading feature..." } }
                },
                Some(Err(err)) => rsx! {
                    div { class: "panel",
                        div { class: "banner banner-error", "{err}" }
                        Link { class: "btn", to: Route::Home {}, "Back" }
                    }
                },
                Some(Ok(feature)) => {
                    let properties_display = pretty_properties(&feature.properties);
                    let is_editing = *editing.read();
                    let is_saving = *saving.read();
                    let feature_for_edit = feature.clone();
                    let feature_for_save = feature.clone();
                    rsx! {
                        div { class: "panel",
                            div { class: "panel-header",
                                h2 { "{feature.name}" }
                                Link { class: "btn", to: Route::Home {}, "Back" }
                            }
                            if let Some(message) = action_error.read().clone() {
                                div { class: "banner banner-error", "{message}" }
                            }

                            FeatureMap {
                                key: "{feature.id}-{feature.updated_at}",
                                geometry: feature.geometry.clone().unwrap_or(Value::Null),
                                name: feature.name.clone(),
                            }

                            if is_editing {
                                div { class: "filter-field",
                                    label { "Name" }
                                    input {
                                        r#type: "text",
                                        value: "{name_draft}",
                                        oninput: move |evt: Event<FormData>| name_draft.set(evt.value()),
                                    }
                                }
                                div { class: "filter-field",
                                    label { "Properties (JSON)" }
                                    textarea {
                                        rows: 12,
                                        value: "{properties_text}",
                                        oninput: move |evt: Event<FormData>| {
                                            let text = evt.value();
                                            if let Some(map) = parse_properties(&text) {
                                                properties_draft.set(map);
                                            }
                                            properties_text.set(text);
                                        },
                                    }
                                }
                                div { class: "card-actions",
                                    button {
                                        class: "btn btn-primary",
                                        disabled: is_saving,
                                        onclick: move |_| {
                                            let id = feature_for_save.id.clone();
                                            let update = FeatureUpdate {
                                                name: name_draft.peek().clone(),
                                                properties: properties_draft.peek().clone(),
                                            };
                                            saving.set(true);
                                            spawn(async move {
                                                match api::update_feature(&id, &update).await {
                                                    Ok(updated) => {
                                                        saved_feature.set(Some(updated));
                                                        editing.set(false);
                                                        action_error.set(None);
                                                    }
                                                    Err(err) => {
                                                        error!("feature update failed: {err}");
                                                        action_error.set(Some(err.to_string()));
                                                    }
                                                }
                                                saving.set(false);
                                            });
                                        },
                                        if is_saving { "Saving..." } else { "Save" }
                                    }
                                    button {
                                        class: "btn",
                                        disabled: is_saving,
                                        onclick: move |_| {
                                            editing.set(false);
                                            action_error.set(None);
                                        },
                                        "Cancel"
                                    }
                                }
                            } else {
                                h3 { "Properties" }
                                pre { class: "properties-view", "{properties_display}" }
                                dl { class: "detail-grid",
                                    dt { "Created" }
                                    dd { "{feature.created_at}" }
                                    dt { "Updated" }
                                    dd { "{feature.updated_at}" }
                                }
                                div { class: "card-actions",
                                    button {
                                        class: "btn",
                                        onclick: move |_| {
                                            name_draft.set(feature_for_edit.name.clone());
                                            properties_text.set(pretty_properties(&feature_for_edit.properties));
                                            properties_draft.set(feature_for_edit.properties.clone());
                                            editing.set(true);
                                        },
                                        "Edit"
                                    }
                                    if *confirm_delete.read() {
                                        button {
                                            class: "btn btn-danger",
                                            onclick: {
                                                let id = feature.id.clone();
                                                move |_| {
                                                    let id = id.clone();
                                                    spawn(async move {
                                                        match api::delete_feature(&id).await {
                                                            Ok(()) => {
                                                                navigator.push(Route::Home {});
                                                            }
                                                            Err(err) => {
                                                                error!("feature delete failed: {err}");
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
                                    } else {
                                        button {
                                            class: "btn btn-danger",
                                            onclick: move |_| confirm_delete.set(true),
                                            "Delete"
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_properties_accepts_object() {
        let map = parse_properties(r#"{"Village_Name":"Poruvazhy","Survey_Number":118}"#).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("Survey_Number"), Some(&Value::from(118)));
    }

    #[test]
    fn test_parse_properties_rejects_non_objects() {
        assert!(parse_properties("[1,2,3]").is_none());
        assert!(parse_properties("\"text\"").is_none());
        assert!(parse_properties("not json at all").is_none());
        assert!(parse_properties("{\"unterminated\":").is_none());
    }

    #[test]
    fn test_parse_properties_empty_object() {
        assert_eq!(parse_properties("{}"), Some(Map::new()));
    }

    #[test]
    fn test_pretty_round_trip() {
        let map = parse_properties(r#"{"a":1}"#).unwrap();
        let text = pretty_properties(&map);
        assert_eq!(parse_properties(&text), Some(map));
    }
}
