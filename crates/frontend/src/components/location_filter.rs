use dioxus::prelude::*;
use tracing::warn;

use gis_portal_shared::models::{Level, LocationFilter};

use crate::api;

/// One dropdown of the cascade. Emits the raw selected value; an empty
/// value means "clear this level".
#[component]
fn LevelSelect(
    label: &'static str,
    options: Vec<String>,
    value: String,
    disabled: bool,
    on_select: EventHandler<String>,
) -> Element {
    rsx! {
        div { class: "filter-field",
            label { "{label}" }
            select {
                "aria-label": "Filter by {label}",
                disabled,
                value: "{value}",
                onchange: move |evt: Event<FormData>| on_select.call(evt.value()),
                option { value: "", "All" }
                for opt in options {
                    option { value: "{opt}", selected: opt == value, "{opt}" }
                }
            }
        }
    }
}

/// Cascading state/district/taluk/village filter. Each option list is
/// fetched constrained by the levels above it; changing a level clears
/// everything below and refetches. `use_resource` restarts on each
/// dependency change and drops the superseded future, so only the latest
/// option fetch ever lands.
#[component]
pub fn LocationFilterPanel(filter: Signal<LocationFilter>) -> Element {
    let states = use_resource(|| async {
        api::fetch_file_states().await.unwrap_or_else(|err| {
            warn!("failed to load state options: {err}");
            Vec::new()
        })
    });

    let districts = use_resource(move || {
        let state = filter.read().state.clone();
        async move {
            let Some(state) = state else {
                return Vec::new();
            };
            api::fetch_file_districts(Some(&state))
                .await
                .unwrap_or_else(|err| {
                    warn!("failed to load district options: {err}");
                    Vec::new()
                })
        }
    });

    let taluks = use_resource(move || {
        let district = filter.read().district.clone();
        async move {
            let Some(district) = district else {
                return Vec::new();
            };
            api::fetch_feature_taluks(Some(&district))
                .await
                .unwrap_or_else(|err| {
                    warn!("failed to load taluk options: {err}");
                    Vec::new()
                })
        }
    });

    let villages = use_resource(move || {
        let current = filter.read().clone();
        async move {
            let Some(district) = current.district else {
                return Vec::new();
            };
            api::fetch_feature_villages(Some(&district), current.taluk.as_deref())
                .await
                .unwrap_or_else(|err| {
                    warn!("failed to load village options: {err}");
                    Vec::new()
                })
        }
    });

    let current = filter.read().clone();
    let state_options = states.read().clone().unwrap_or_default();
    let district_options = districts.read().clone().unwrap_or_default();
    let taluk_options = taluks.read().clone().unwrap_or_default();
    let village_options = villages.read().clone().unwrap_or_default();

    let has_filters = !current.is_empty();

    rsx! {
        div { class: "panel filter-panel",
            h3 { "Filter by Location" }
            div { class: "filter-row",
                LevelSelect {
                    label: "State",
                    options: state_options,
                    value: current.state.clone().unwrap_or_default(),
                    disabled: false,
                    on_select: move |value: String| filter.write().select(Level::State, &value),
                }
                LevelSelect {
                    label: "District",
                    options: district_options,
                    value: current.district.clone().unwrap_or_default(),
                    disabled: current.state.is_none(),
                    on_select: move |value: String| filter.write().select(Level::District, &value),
                }
                LevelSelect {
                    label: "Taluk",
                    options: taluk_options,
                    value: current.taluk.clone().unwrap_or_default(),
                    disabled: current.district.is_none(),
                    on_select: move |value: String| filter.write().select(Level::Taluk, &value),
                }
                LevelSelect {
                    label: "Village",
                    options: village_options,
                    value: current.village.clone().unwrap_or_default(),
                    disabled: current.district.is_none(),
                    on_select: move |value: String| filter.write().select(Level::Village, &value),
                }
            }
            if has_filters {
                button {
                    class: "btn-secondary",
                    onclick: move |_| filter.set(LocationFilter::default()),
                    "Clear Filters"
                }
            }
        }
    }
}
