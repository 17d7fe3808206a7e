//! Multipart upload transport with byte-level progress.
//!
//! Uploads go through `XmlHttpRequest` rather than fetch so the browser can
//! report upload progress events. The event callbacks run outside the
//! component runtime, so they only write into shared cells; the owning
//! component polls those cells from its own task and moves the values into
//! signals itself.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Blob, FormData, ProgressEvent, XmlHttpRequest};

use crate::api::{build_url, classify_status, ApiError};

/// Matches the service-side limit for very large shapefile archives.
const UPLOAD_TIMEOUT_MS: u32 = 600_000;

/// Terminal state of an upload as reported by the browser.
#[derive(Debug, Clone, PartialEq)]
pub enum RawOutcome {
    /// The server answered; classification happens from the status and body.
    Loaded { status: u16, body: String },
    /// The connection failed or was aborted.
    NetworkError,
    /// The browser-side timeout fired.
    TimedOut,
}

/// Turn a raw transport outcome into the shared error taxonomy.
pub fn classify_upload_outcome(raw: &RawOutcome) -> Result<(), ApiError> {
    match raw {
        RawOutcome::Loaded { status, .. } if (200_u16..300).contains(status) => Ok(()),
        RawOutcome::Loaded { status, body } => {
            let detail = serde_json::from_str::<serde_json::Value>(body)
                .ok()
                .and_then(|value| value.get("detail").and_then(|d| d.as_str().map(str::to_string)));
            Err(classify_status(*status, detail))
        }
        RawOutcome::NetworkError => Err(ApiError::Network),
        RawOutcome::TimedOut => Err(ApiError::Timeout),
    }
}

/// Advance the reported upload percentage. Progress never moves backwards,
/// even when the browser delivers events out of order, and an unusable
/// total leaves the current value alone.
fn next_progress(current: f64, loaded: f64, total: f64) -> f64 {
    if total <= 0.0 {
        return current;
    }
    let pct = (loaded / total * 100.0).min(100.0);
    if pct > current {
        pct
    } else {
        current
    }
}

/// A file staged for upload: display name plus raw contents.
#[derive(Debug, Clone, PartialEq)]
pub struct StagedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Handle to an in-flight upload. Keeps the event closures alive for as
/// long as the owning component polls it.
pub struct UploadHandle {
    progress: Rc<Cell<f64>>,
    outcome: Rc<RefCell<Option<RawOutcome>>>,
    _callbacks: Vec<Closure<dyn FnMut(ProgressEvent)>>,
}

impl UploadHandle {
    /// Upload percentage so far, 0 to 100. Never decreases.
    pub fn progress(&self) -> f64 {
        self.progress.get()
    }

    /// The terminal outcome, once the browser reports one.
    pub fn take_outcome(&self) -> Option<RawOutcome> {
        self.outcome.borrow_mut().take()
    }
}

fn bytes_to_blob(bytes: &[u8]) -> Result<Blob, JsValue> {
    let array = js_sys::Uint8Array::from(bytes);
    let parts = js_sys::Array::new();
    parts.push(&array.buffer());
    Blob::new_with_u8_array_sequence(&parts)
}

fn build_form(
    files: &[StagedFile],
    field: &str,
    state: &str,
    district: Option<&str>,
) -> Result<FormData, JsValue> {
    let form = FormData::new()?;
    for file in files {
        let blob = bytes_to_blob(&file.bytes)?;
        form.append_with_blob_and_filename(field, &blob, &file.name)?;
    }
    form.append_with_str("state", state)?;
    if let Some(district) = district {
        form.append_with_str("district", district)?;
    }
    Ok(form)
}

/// Start a multipart upload. One file posts to the single-file endpoint;
/// several post to the multi-file endpoint with a repeated `files` field.
pub fn start_upload(
    files: &[StagedFile],
    state: &str,
    district: Option<&str>,
) -> Result<UploadHandle, ApiError> {
    let (path, field) = if files.len() == 1 {
        ("/files/upload", "file")
    } else {
        ("/files/upload-multiple", "files")
    };
    start_inner(files, path, field, state, district).map_err(|_| ApiError::Network)
}

fn start_inner(
    files: &[StagedFile],
    path: &str,
    field: &str,
    state: &str,
    district: Option<&str>,
) -> Result<UploadHandle, JsValue> {
    let form = build_form(files, field, state, district)?;

    let xhr = XmlHttpRequest::new()?;
    xhr.open("POST", &build_url(path, &[]))?;
    xhr.set_timeout(UPLOAD_TIMEOUT_MS);

    let progress = Rc::new(Cell::new(0.0_f64));
    let outcome: Rc<RefCell<Option<RawOutcome>>> = Rc::new(RefCell::new(None));
    let mut callbacks = Vec::new();

    {
        let progress = Rc::clone(&progress);
        let on_progress = Closure::<dyn FnMut(ProgressEvent)>::new(move |ev: ProgressEvent| {
            if ev.length_computable() {
                progress.set(next_progress(progress.get(), ev.loaded(), ev.total()));
            }
        });
        xhr.upload()?
            .set_onprogress(Some(on_progress.as_ref().unchecked_ref()));
        callbacks.push(on_progress);
    }

    {
        let outcome = Rc::clone(&outcome);
        let xhr_done = xhr.clone();
        let on_load = Closure::<dyn FnMut(ProgressEvent)>::new(move |_| {
            let status = xhr_done.status().unwrap_or(0);
            let body = xhr_done
                .response_text()
                .ok()
                .flatten()
                .unwrap_or_default();
            *outcome.borrow_mut() = Some(RawOutcome::Loaded { status, body });
        });
        xhr.set_onload(Some(on_load.as_ref().unchecked_ref()));
        callbacks.push(on_load);
    }

    {
        let outcome = Rc::clone(&outcome);
        let on_error = Closure::<dyn FnMut(ProgressEvent)>::new(move |_| {
            *outcome.borrow_mut() = Some(RawOutcome::NetworkError);
        });
        xhr.set_onerror(Some(on_error.as_ref().unchecked_ref()));
        callbacks.push(on_error);
    }

    {
        let outcome = Rc::clone(&outcome);
        let on_timeout = Closure::<dyn FnMut(ProgressEvent)>::new(move |_| {
            *outcome.borrow_mut() = Some(RawOutcome::TimedOut);
        });
        xhr.set_ontimeout(Some(on_timeout.as_ref().unchecked_ref()));
        callbacks.push(on_timeout);
    }

    xhr.send_with_opt_form_data(Some(&form))?;

    Ok(UploadHandle {
        progress,
        outcome,
        _callbacks: callbacks,
    })
}
