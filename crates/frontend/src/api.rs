use serde::de::DeserializeOwned;
use serde::Deserialize;

use gis_portal_shared::models::{FeatureUpdate, GeoFeature, GeoFile, LocationFilter};

/// Build-time override for the REST service, mirroring a deployment-specific
/// base URL. Defaults to the hosted portal.
const DEFAULT_API_BASE: &str = "https://gis-portal.1acre.in";

pub fn api_base() -> &'static str {
    option_env!("GIS_API_URL").unwrap_or(DEFAULT_API_BASE)
}

/// Frontend-visible request failures. Superseded fetches never surface here:
/// their responses are dropped by the caller's generation check.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    /// Connection failed or was interrupted.
    Network,
    /// The request timed out.
    Timeout,
    /// The server rejected the payload as too large (HTTP 413).
    PayloadTooLarge,
    /// The entity does not exist (HTTP 404).
    NotFound,
    /// Any other server-reported failure, with its detail message.
    Api(String),
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Network => write!(f, "Could not reach the server. Please try again."),
            ApiError::Timeout => write!(f, "The request timed out. Please try again."),
            ApiError::PayloadTooLarge => write!(f, "The file is too large for the server."),
            ApiError::NotFound => write!(f, "Not found."),
            ApiError::Api(detail) => write!(f, "{}", detail),
        }
    }
}

impl std::error::Error for ApiError {}

/// Classify an HTTP status into the error taxonomy.
pub fn classify_status(status: u16, detail: Option<String>) -> ApiError {
    match status {
        404 => ApiError::NotFound,
        413 => ApiError::PayloadTooLarge,
        408 | 504 => ApiError::Timeout,
        _ => ApiError::Api(detail.unwrap_or_else(|| format!("Request failed ({})", status))),
    }
}

fn classify_reqwest(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::Timeout
    } else {
        ApiError::Network
    }
}

/// Error body shape the service uses for failures.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<String>,
}

// ---------------------------------------------------------------------------
// URL builders (pure, unit-tested)
// ---------------------------------------------------------------------------

/// Percent-encode a query value. Unreserved characters pass through.
fn encode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

/// Join a path and query parameters onto the API base.
pub fn build_url(path: &str, params: &[(&str, String)]) -> String {
    let mut url = format!("{}{}", api_base(), path);
    for (i, (key, value)) in params.iter().enumerate() {
        url.push(if i == 0 { '?' } else { '&' });
        url.push_str(key);
        url.push('=');
        url.push_str(&encode(value));
    }
    url
}

pub fn files_url(filter: &LocationFilter) -> String {
    build_url("/files", &filter.query_pairs())
}

pub fn file_features_url(file_id: &str, skip: u64, limit: u64) -> String {
    build_url(
        &format!("/files/{}/features", file_id),
        &[
            ("skip", skip.to_string()),
            ("limit", limit.to_string()),
            ("include_geometry", "false".to_string()),
        ],
    )
}

pub fn features_url(filter: &LocationFilter, skip: u64, limit: u64) -> String {
    let mut params = vec![
        ("skip", skip.to_string()),
        ("limit", limit.to_string()),
        ("include_geometry", "false".to_string()),
    ];
    params.extend(filter.query_pairs());
    build_url("/features", &params)
}

pub fn single_download_url(file_id: &str, format: &str) -> String {
    build_url(
        &format!("/files/{}/download", file_id),
        &[("format", format.to_string())],
    )
}

pub fn batch_download_url(filter: &LocationFilter, merge: bool, format: &str) -> String {
    let mut params = vec![
        ("format", format.to_string()),
        ("merge", merge.to_string()),
    ];
    params.extend(filter.query_pairs());
    build_url("/files/download/batch", &params)
}

// ---------------------------------------------------------------------------
// Transport helpers
// ---------------------------------------------------------------------------

async fn read_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ApiError> {
    let status = resp.status();
    if !status.is_success() {
        let detail = resp
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.detail);
        return Err(classify_status(status.as_u16(), detail));
    }
    resp.json::<T>()
        .await
        .map_err(|_| ApiError::Api("Malformed response from server".to_string()))
}

async fn ensure_ok(resp: reqwest::Response) -> Result<(), ApiError> {
    let status = resp.status();
    if !status.is_success() {
        let detail = resp
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.detail);
        return Err(classify_status(status.as_u16(), detail));
    }
    Ok(())
}

async fn get_json<T: DeserializeOwned>(url: &str) -> Result<T, ApiError> {
    let resp = reqwest::Client::new()
        .get(url)
        .send()
        .await
        .map_err(classify_reqwest)?;
    read_json(resp).await
}

async fn get_bytes(url: &str) -> Result<Vec<u8>, ApiError> {
    let resp = reqwest::Client::new()
        .get(url)
        .send()
        .await
        .map_err(classify_reqwest)?;
    let status = resp.status();
    if !status.is_success() {
        return Err(classify_status(status.as_u16(), None));
    }
    resp.bytes()
        .await
        .map(|bytes| bytes.to_vec())
        .map_err(|_| ApiError::Network)
}

// ---------------------------------------------------------------------------
// Files API
// ---------------------------------------------------------------------------

pub async fn fetch_files(filter: &LocationFilter) -> Result<Vec<GeoFile>, ApiError> {
    get_json(&files_url(filter)).await
}

pub async fn fetch_file(id: &str) -> Result<GeoFile, ApiError> {
    get_json(&build_url(&format!("/files/{}", id), &[])).await
}

pub async fn fetch_file_features(
    file_id: &str,
    skip: u64,
    limit: u64,
) -> Result<Vec<GeoFeature>, ApiError> {
    get_json(&file_features_url(file_id, skip, limit)).await
}

pub async fn delete_file(id: &str) -> Result<(), ApiError> {
    let resp = reqwest::Client::new()
        .delete(build_url(&format!("/files/{}", id), &[]))
        .send()
        .await
        .map_err(classify_reqwest)?;
    ensure_ok(resp).await
}

pub async fn fetch_file_states() -> Result<Vec<String>, ApiError> {
    get_json(&build_url("/files/states", &[])).await
}

pub async fn fetch_file_districts(state: Option<&str>) -> Result<Vec<String>, ApiError> {
    let params = match state {
        Some(state) => vec![("state", state.to_string())],
        None => vec![],
    };
    get_json(&build_url("/files/districts", &params)).await
}

pub async fn download_file(file_id: &str, format: &str) -> Result<Vec<u8>, ApiError> {
    get_bytes(&single_download_url(file_id, format)).await
}

pub async fn download_batch(
    filter: &LocationFilter,
    merge: bool,
    format: &str,
) -> Result<Vec<u8>, ApiError> {
    get_bytes(&batch_download_url(filter, merge, format)).await
}

// ---------------------------------------------------------------------------
// Features API
// ---------------------------------------------------------------------------

pub async fn fetch_features(
    filter: &LocationFilter,
    skip: u64,
    limit: u64,
) -> Result<Vec<GeoFeature>, ApiError> {
    get_json(&features_url(filter, skip, limit)).await
}

pub async fn fetch_feature(id: &str) -> Result<GeoFeature, ApiError> {
    get_json(&build_url(&format!("/features/{}", id), &[])).await
}

pub async fn update_feature(id: &str, update: &FeatureUpdate) -> Result<GeoFeature, ApiError> {
    let resp = reqwest::Client::new()
        .put(build_url(&format!("/features/{}", id), &[]))
        .json(update)
        .send()
        .await
        .map_err(classify_reqwest)?;
    read_json(resp).await
}

pub async fn delete_feature(id: &str) -> Result<(), ApiError> {
    let resp = reqwest::Client::new()
        .delete(build_url(&format!("/features/{}", id), &[]))
        .send()
        .await
        .map_err(classify_reqwest)?;
    ensure_ok(resp).await
}

pub async fn fetch_feature_taluks(district: Option<&str>) -> Result<Vec<String>, ApiError> {
    let params = match district {
        Some(district) => vec![("district", district.to_string())],
        None => vec![],
    };
    get_json(&build_url("/features/taluks", &params)).await
}

pub async fn fetch_feature_villages(
    district: Option<&str>,
    taluk: Option<&str>,
) -> Result<Vec<String>, ApiError> {
    let mut params = Vec::new();
    if let Some(district) = district {
        params.push(("district", district.to_string()));
    }
    if let Some(taluk) = taluk {
        params.push(("taluk", taluk.to_string()));
    }
    get_json(&build_url("/features/villages", &params)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(state: Option<&str>, district: Option<&str>) -> LocationFilter {
        LocationFilter {
            state: state.map(str::to_string),
            district: district.map(str::to_string),
            taluk: None,
            village: None,
        }
    }

    #[test]
    fn test_files_url_includes_only_set_filters() {
        let url = files_url(&filter(Some("Kerala"), None));
        assert_eq!(url, format!("{}/files?state=Kerala", api_base()));
    }

    #[test]
    fn test_files_url_encodes_spaces() {
        let url = files_url(&filter(Some("Tamil Nadu"), Some("The Nilgiris")));
        assert!(url.ends_with("/files?state=Tamil%20Nadu&district=The%20Nilgiris"));
    }

    #[test]
    fn test_files_url_no_filters_has_no_query() {
        let url = files_url(&LocationFilter::default());
        assert_eq!(url, format!("{}/files", api_base()));
    }

    #[test]
    fn test_features_url_pagination_and_geometry_flag() {
        let url = features_url(&filter(Some("Kerala"), Some("Kollam")), 40, 20);
        assert!(url.contains("skip=40"));
        assert!(url.contains("limit=20"));
        assert!(url.contains("include_geometry=false"));
        assert!(url.contains("state=Kerala"));
        assert!(url.contains("district=Kollam"));
    }

    #[test]
    fn test_file_features_url() {
        let url = file_features_url("abc", 0, 20);
        assert!(url.ends_with("/files/abc/features?skip=0&limit=20&include_geometry=false"));
    }

    #[test]
    fn test_batch_download_url_merge_flag() {
        let merged = batch_download_url(&filter(Some("Karnataka"), None), true, "geojson");
        assert!(merged.contains("merge=true"));
        assert!(merged.contains("format=geojson"));
        assert!(merged.contains("state=Karnataka"));
        let unmerged = batch_download_url(&filter(Some("Karnataka"), None), false, "geojson");
        assert!(unmerged.contains("merge=false"));
    }

    #[test]
    fn test_single_download_url() {
        let url = single_download_url("f-1", "geojson");
        assert!(url.ends_with("/files/f-1/download?format=geojson"));
    }

    #[test]
    fn test_encode_unreserved_untouched() {
        assert_eq!(encode("Kollam-2025_v1.0~x"), "Kollam-2025_v1.0~x");
    }

    #[test]
    fn test_encode_reserved_characters() {
        assert_eq!(encode("a&b=c d"), "a%26b%3Dc%20d");
    }

    #[test]
    fn test_classify_status() {
        assert_eq!(classify_status(404, None), ApiError::NotFound);
        assert_eq!(classify_status(413, None), ApiError::PayloadTooLarge);
        assert_eq!(classify_status(504, None), ApiError::Timeout);
        assert_eq!(
            classify_status(500, Some("boom".to_string())),
            ApiError::Api("boom".to_string())
        );
        assert_eq!(
            classify_status(422, None),
            ApiError::Api("Request failed (422)".to_string())
        );
    }

    #[test]
    fn test_error_display_is_user_readable() {
        assert_eq!(
            ApiError::Timeout.to_string(),
            "The request timed out. Please try again."
        );
        assert_eq!(ApiError::Api("detail".to_string()).to_string(), "detail");
    }

    #[test]
    fn test_error_body_parses_fastapi_detail() {
        let body: ErrorBody = serde_json::from_str(r#"{"detail":"File not found"}"#).unwrap();
        assert_eq!(body.detail.as_deref(), Some("File not found"));
    }
}
