use dioxus::html::HasFileData;
use dioxus::prelude::*;
use gloo_timers::future::TimeoutFuture;
use tracing::error;

use gis_portal_shared::models::{file_type_label, INDIAN_STATES_AND_UTS};

use crate::api::ApiError;
use crate::upload::{classify_upload_outcome, start_upload, StagedFile};

/// How the success checkmark lingers before the form rearms.
const SUCCESS_RESET_MS: u32 = 3_000;

/// Polling interval for upload progress.
const PROGRESS_POLL_MS: u32 = 100;

/// Above this the form warns that the upload may take a while.
const LARGE_FILE_BYTES: usize = 50 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UploadPhase {
    Idle,
    Uploading,
    Success,
}

fn total_megabytes(files: &[StagedFile]) -> f64 {
    files.iter().map(|f| f.bytes.len()).sum::<usize>() as f64 / 1024.0 / 1024.0
}

/// User-facing message for a failed upload.
fn upload_error_message(err: &ApiError, total_mb: f64) -> String {
    match err {
        ApiError::Timeout => format!(
            "Upload timeout. The file ({:.2} MB) may be too large or your connection is slow. \
             Please try again with a stable connection.",
            total_mb
        ),
        ApiError::PayloadTooLarge => {
            "File is too large. Maximum file size may be limited. Please contact support."
                .to_string()
        }
        other => other.to_string(),
    }
}

/// Geographic file upload form. A state must be selected before any file can
/// be staged; the selection survives a completed upload so several files for
/// the same state can go up in a row. Progress comes from the XHR transport's
/// cells, polled here so all signal writes stay inside the component runtime.
#[component]
pub fn FileUpload(on_success: EventHandler<()>, on_error: EventHandler<String>) -> Element {
    let mut selected_state = use_signal(String::new);
    let mut staged = use_signal(Vec::<StagedFile>::new);
    let mut phase = use_signal(|| UploadPhase::Idle);
    let mut progress = use_signal(|| 0.0_f64);
    let mut dragging = use_signal(|| false);

    let mut stage_files = move |incoming: Vec<dioxus::html::FileData>| {
        if selected_state.read().is_empty() {
            return;
        }
        spawn(async move {
            let mut loaded = Vec::new();
            for file in incoming {
                match file.read_bytes().await {
                    Ok(bytes) => loaded.push(StagedFile {
                        name: file.name(),
                        bytes: bytes.to_vec(),
                    }),
                    Err(err) => {
                        error!("could not read selected file: {err:?}");
                        on_error.call("Could not read the selected file.".to_string());
                        return;
                    }
                }
            }
            if !loaded.is_empty() {
                staged.set(loaded);
                progress.set(0.0);
            }
        });
    };

    let begin_upload = move |_| {
        let files = staged.read().clone();
        let state = selected_state.read().clone();
        if files.is_empty() || state.is_empty() {
            return;
        }
        phase.set(UploadPhase::Uploading);
        progress.set(0.0);
        let total_mb = total_megabytes(&files);

        let handle = match start_upload(&files, &state, None) {
            Ok(handle) => handle,
            Err(err) => {
                phase.set(UploadPhase::Idle);
                on_error.call(upload_error_message(&err, total_mb));
                return;
            }
        };

        spawn(async move {
            loop {
                TimeoutFuture::new(PROGRESS_POLL_MS).await;
                progress.set(handle.progress());
                let Some(raw) = handle.take_outcome() else {
                    continue;
                };
                match classify_upload_outcome(&raw) {
                    Ok(()) => {
                        progress.set(100.0);
                        phase.set(UploadPhase::Success);
                        on_success.call(());
                        TimeoutFuture::new(SUCCESS_RESET_MS).await;
                        staged.set(Vec::new());
                        progress.set(0.0);
                        phase.set(UploadPhase::Idle);
                    }
                    Err(err) => {
                        error!("upload failed: {err}");
                        phase.set(UploadPhase::Idle);
                        progress.set(0.0);
                        on_error.call(upload_error_message(&err, total_mb));
                    }
                }
                break;
            }
        });
    };

    let state = selected_state.read().clone();
    let files = staged.read().clone();
    let current_phase = *phase.read();
    let pct = *progress.read();
    let is_uploading = current_phase == UploadPhase::Uploading;
    let is_success = current_phase == UploadPhase::Success;

    let is_large = files.iter().map(|f| f.bytes.len()).sum::<usize>() > LARGE_FILE_BYTES;
    let upload_label = if files.len() > 1 {
        format!("Upload {} Files", files.len())
    } else {
        "Upload File".to_string()
    };
    let dropzone_class = if *dragging.read() {
        "dropzone dragging"
    } else if is_success {
        "dropzone success"
    } else if !files.is_empty() {
        "dropzone staged"
    } else {
        "dropzone"
    };

    rsx! {
        div { class: "panel",
            h2 { "Upload Geographic File" }

            div { class: "filter-field",
                label { "Select State / Union Territory *" }
                select {
                    value: "{state}",
                    disabled: is_uploading,
                    onchange: move |evt: Event<FormData>| {
                        let value = evt.value();
                        if value.is_empty() {
                            staged.set(Vec::new());
                        }
                        selected_state.set(value);
                    },
                    option { value: "", "-- Select State / Union Territory --" }
                    for name in INDIAN_STATES_AND_UTS {
                        option { value: "{name}", selected: state == *name, "{name}" }
                    }
                }
                p { class: "muted",
                    "You must select a state before uploading a file. All features in this file \
                     will be associated with the selected state."
                }
            }

            if state.is_empty() {
                div { class: "dropzone disabled",
                    p { "Please select a state first" }
                    p { class: "muted",
                        "Choose a state or union territory from the dropdown above to enable file upload"
                    }
                }
            } else {
                div {
                    class: "{dropzone_class}",
                    ondragover: move |evt: Event<DragData>| {
                        evt.prevent_default();
                        dragging.set(true);
                    },
                    ondragleave: move |evt: Event<DragData>| {
                        evt.prevent_default();
                        dragging.set(false);
                    },
                    ondrop: move |evt: Event<DragData>| {
                        evt.prevent_default();
                        dragging.set(false);
                        stage_files(evt.files());
                    },

                    if files.is_empty() {
                        p { "Drag and drop your file here" }
                        p { class: "muted", "or" }
                        label { class: "btn",
                            input {
                                r#type: "file",
                                class: "hidden-input",
                                accept: ".geojson,.json,.kml,.kmz,.shp,.zip,.gpx,.csv",
                                multiple: true,
                                onchange: move |evt: Event<FormData>| {
                                    stage_files(evt.files());
                                },
                            }
                            "Browse Files"
                        }
                        p { class: "muted",
                            "Supported formats: GeoJSON, JSON, KML, KMZ, Shapefile (ZIP), GPX, CSV"
                        }
                    } else {
                        for (name, summary) in files.iter().map(|file| {
                            let mb = file.bytes.len() as f64 / 1024.0 / 1024.0;
                            (
                                file.name.clone(),
                                format!("{} \u{2022} {:.2} MB", file_type_label(&file.name), mb),
                            )
                        }) {
                            div { class: "staged-file", key: "{name}",
                                p { class: "file-name", "{name}" }
                                p { class: "muted", "{summary}" }
                            }
                        }
                        if is_large {
                            p { class: "warning", "(Large file - upload may take several minutes)" }
                        }
                        p { class: "muted", "State: {state}" }

                        if is_uploading {
                            div { class: "progress-track",
                                div { class: "progress-bar", style: "width: {pct}%;" }
                            }
                            p { "Uploading: {pct:.0}%" }
                            p { class: "muted", "Please wait, this may take a while for large files..." }
                        } else if is_success {
                            div { class: "progress-track",
                                div { class: "progress-bar success", style: "width: 100%;" }
                            }
                            p { class: "success-text", "Upload complete!" }
                            p { class: "muted", "Your file has been successfully uploaded and processed." }
                        } else {
                            div { class: "card-actions",
                                button {
                                    class: "btn",
                                    disabled: is_uploading,
                                    onclick: move |_| {
                                        staged.set(Vec::new());
                                        progress.set(0.0);
                                    },
                                    "Clear File"
                                }
                                button {
                                    class: "btn btn-primary",
                                    disabled: is_uploading,
                                    onclick: begin_upload,
                                    "{upload_label}"
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message_includes_size() {
        let message = upload_error_message(&ApiError::Timeout, 72.5);
        assert!(message.contains("72.50 MB"));
        assert!(message.starts_with("Upload timeout"));
    }

    #[test]
    fn test_too_large_message() {
        let message = upload_error_message(&ApiError::PayloadTooLarge, 1.0);
        assert!(message.contains("too large"));
        assert!(message.contains("contact support"));
    }

    #[test]
    fn test_other_errors_pass_through_detail() {
        let message = upload_error_message(&ApiError::Api("Unsupported file type".into()), 1.0);
        assert_eq!(message, "Unsupported file type");
    }

    #[test]
    fn test_total_megabytes() {
        let files = vec![
            StagedFile { name: "a.kml".into(), bytes: vec![0; 1024 * 1024] },
            StagedFile { name: "b.kml".into(), bytes: vec![0; 512 * 1024] },
        ];
        assert!((total_megabytes(&files) - 1.5).abs() < 1e-9);
    }
}
