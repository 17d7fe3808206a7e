use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Metadata for an uploaded geospatial file. Owned by the remote service;
/// the UI only ever holds read-only copies fetched per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoFile {
    pub id: String,
    pub filename: String,
    pub original_filename: String,
    pub file_type: String,
    #[serde(default)]
    pub file_size: Option<u64>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
    pub total_features: u64,
    pub created_at: String,
}

/// A single geographic feature. `geometry` is raw GeoJSON (Geometry,
/// Feature, or FeatureCollection) and is omitted by list endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoFeature {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub properties: Map<String, Value>,
    #[serde(default)]
    pub geometry: Option<Value>,
    pub created_at: String,
    pub updated_at: String,
}

/// Body for `PUT /features/{id}`.
#[derive(Debug, Clone, Serialize)]
pub struct FeatureUpdate {
    pub name: String,
    pub properties: Map<String, Value>,
}

/// Hierarchy level of the location filter cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    State,
    District,
    Taluk,
    Village,
}

/// The cascading location filter tuple. Each level constrains the option
/// lists of the levels below it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationFilter {
    pub state: Option<String>,
    pub district: Option<String>,
    pub taluk: Option<String>,
    pub village: Option<String>,
}

impl LocationFilter {
    pub fn is_empty(&self) -> bool {
        self.state.is_none()
            && self.district.is_none()
            && self.taluk.is_none()
            && self.village.is_none()
    }

    /// Set the selection at `level` and clear every level below it.
    /// An empty string clears the level itself.
    pub fn select(&mut self, level: Level, value: &str) {
        let value = if value.is_empty() {
            None
        } else {
            Some(value.to_string())
        };
        match level {
            Level::State => {
                self.state = value;
                self.district = None;
                self.taluk = None;
                self.village = None;
            }
            Level::District => {
                self.district = value;
                self.taluk = None;
                self.village = None;
            }
            Level::Taluk => {
                self.taluk = value;
                self.village = None;
            }
            Level::Village => {
                self.village = value;
            }
        }
    }

    /// Non-empty filter values as query parameters, in hierarchy order.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(s) = &self.state {
            pairs.push(("state", s.clone()));
        }
        if let Some(d) = &self.district {
            pairs.push(("district", d.clone()));
        }
        if let Some(t) = &self.taluk {
            pairs.push(("taluk", t.clone()));
        }
        if let Some(v) = &self.village {
            pairs.push(("village", v.clone()));
        }
        pairs
    }
}

/// Accepted upload extensions, matching the backend's parsers.
pub const UPLOAD_EXTENSIONS: &[&str] = &[
    "geojson", "json", "kml", "kmz", "shp", "zip", "gpx", "csv",
];

/// Human-readable label for a file extension.
pub fn file_type_label(filename: &str) -> String {
    let ext = filename
        .rsplit('.')
        .next()
        .unwrap_or_default()
        .to_lowercase();
    match ext.as_str() {
        "geojson" => "GeoJSON".to_string(),
        "json" => "JSON".to_string(),
        "kml" => "KML".to_string(),
        "kmz" => "KMZ".to_string(),
        "shp" => "Shapefile".to_string(),
        "zip" => "ZIP (Shapefile)".to_string(),
        "gpx" => "GPX".to_string(),
        "csv" => "CSV".to_string(),
        _ => ext.to_uppercase(),
    }
}

/// Format a byte count the way the listing cards display it.
pub fn format_file_size(bytes: Option<u64>) -> String {
    match bytes {
        None | Some(0) => "N/A".to_string(),
        Some(b) if b < 1024 => format!("{} B", b),
        Some(b) if b < 1024 * 1024 => format!("{:.2} KB", b as f64 / 1024.0),
        Some(b) => format!("{:.2} MB", b as f64 / (1024.0 * 1024.0)),
    }
}

/// Filename for a single-file download in the given export format.
pub fn single_download_filename(filename: &str, format: &str) -> String {
    format!("{}.{}", filename, format)
}

/// Filename for a batch download, derived from the active filters.
/// Merged batches are one GeoJSON document; unmerged batches are a ZIP of
/// per-file documents.
pub fn batch_download_filename(filter: &LocationFilter, merge: bool) -> String {
    let mut stem = String::new();
    if let Some(state) = &filter.state {
        stem = state.split_whitespace().collect::<Vec<_>>().join("_");
    }
    if let Some(district) = &filter.district {
        let district = district.split_whitespace().collect::<Vec<_>>().join("_");
        if stem.is_empty() {
            stem = district;
        } else {
            stem = format!("{}_{}", stem, district);
        }
    }
    if stem.is_empty() {
        stem = "batch_download".to_string();
    }
    let extension = if merge { "geojson" } else { "zip" };
    format!("{}.{}", stem, extension)
}

/// All Indian states and union territories, in the order the upload form
/// presents them (28 states, then 8 UTs).
pub const INDIAN_STATES_AND_UTS: &[&str] = &[
    "Andhra Pradesh",
    "Arunachal Pradesh",
    "Assam",
    "Bihar",
    "Chhattisgarh",
    "Goa",
    "Gujarat",
    "Haryana",
    "Himachal Pradesh",
    "Jharkhand",
    "Karnataka",
    "Kerala",
    "Madhya Pradesh",
    "Maharashtra",
    "Manipur",
    "Meghalaya",
    "Mizoram",
    "Nagaland",
    "Odisha",
    "Punjab",
    "Rajasthan",
    "Sikkim",
    "Tamil Nadu",
    "Telangana",
    "Tripura",
    "Uttar Pradesh",
    "Uttarakhand",
    "West Bengal",
    "Andaman and Nicobar Islands",
    "Chandigarh",
    "Dadra and Nagar Haveli and Daman and Diu",
    "Delhi",
    "Jammu and Kashmir",
    "Ladakh",
    "Lakshadweep",
    "Puducherry",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_state_clears_everything_below() {
        let mut filter = LocationFilter {
            state: Some("Karnataka".to_string()),
            district: Some("Mysuru".to_string()),
            taluk: Some("Nanjangud".to_string()),
            village: Some("Hedathale".to_string()),
        };
        filter.select(Level::State, "Kerala");
        assert_eq!(filter.state.as_deref(), Some("Kerala"));
        assert!(filter.district.is_none());
        assert!(filter.taluk.is_none());
        assert!(filter.village.is_none());
    }

    #[test]
    fn test_select_district_keeps_state_clears_below() {
        let mut filter = LocationFilter {
            state: Some("Kerala".to_string()),
            district: Some("Kollam".to_string()),
            taluk: Some("Kunnathur".to_string()),
            village: Some("Poruvazhy".to_string()),
        };
        filter.select(Level::District, "Alappuzha");
        assert_eq!(filter.state.as_deref(), Some("Kerala"));
        assert_eq!(filter.district.as_deref(), Some("Alappuzha"));
        assert!(filter.taluk.is_none());
        assert!(filter.village.is_none());
    }

    #[test]
    fn test_select_empty_clears_level_and_below() {
        let mut filter = LocationFilter {
            state: Some("Kerala".to_string()),
            district: Some("Kollam".to_string()),
            taluk: None,
            village: None,
        };
        filter.select(Level::District, "");
        assert_eq!(filter.state.as_deref(), Some("Kerala"));
        assert!(filter.district.is_none());
    }

    #[test]
    fn test_query_pairs_skips_unset_levels() {
        let filter = LocationFilter {
            state: Some("Kerala".to_string()),
            district: None,
            taluk: None,
            village: Some("Poruvazhy".to_string()),
        };
        assert_eq!(
            filter.query_pairs(),
            vec![
                ("state", "Kerala".to_string()),
                ("village", "Poruvazhy".to_string())
            ]
        );
    }

    #[test]
    fn test_query_pairs_empty_filter() {
        assert!(LocationFilter::default().query_pairs().is_empty());
        assert!(LocationFilter::default().is_empty());
    }

    #[test]
    fn test_file_type_label() {
        assert_eq!(file_type_label("survey.geojson"), "GeoJSON");
        assert_eq!(file_type_label("plots.ZIP"), "ZIP (Shapefile)");
        assert_eq!(file_type_label("tracks.gpx"), "GPX");
        assert_eq!(file_type_label("data.xyz"), "XYZ");
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(None), "N/A");
        assert_eq!(format_file_size(Some(0)), "N/A");
        assert_eq!(format_file_size(Some(512)), "512 B");
        assert_eq!(format_file_size(Some(2048)), "2.00 KB");
        assert_eq!(format_file_size(Some(5 * 1024 * 1024)), "5.00 MB");
    }

    #[test]
    fn test_batch_filename_merge_vs_zip() {
        let filter = LocationFilter {
            state: Some("Karnataka".to_string()),
            ..Default::default()
        };
        assert_eq!(batch_download_filename(&filter, true), "Karnataka.geojson");
        assert_eq!(batch_download_filename(&filter, false), "Karnataka.zip");
    }

    #[test]
    fn test_batch_filename_state_and_district_with_spaces() {
        let filter = LocationFilter {
            state: Some("Tamil Nadu".to_string()),
            district: Some("The Nilgiris".to_string()),
            ..Default::default()
        };
        assert_eq!(
            batch_download_filename(&filter, true),
            "Tamil_Nadu_The_Nilgiris.geojson"
        );
    }

    #[test]
    fn test_batch_filename_no_filters() {
        let filter = LocationFilter::default();
        assert_eq!(batch_download_filename(&filter, false), "batch_download.zip");
    }

    #[test]
    fn test_geo_file_deserializes() {
        let json = r#"{
            "id": "f-1",
            "filename": "kollam_survey",
            "original_filename": "kollam survey.kml",
            "file_type": "kml",
            "file_size": 20480,
            "state": "Kerala",
            "district": "Kollam",
            "total_features": 42,
            "created_at": "2025-05-01T10:00:00Z"
        }"#;
        let file: GeoFile = serde_json::from_str(json).unwrap();
        assert_eq!(file.filename, "kollam_survey");
        assert_eq!(file.total_features, 42);
        assert_eq!(file.district.as_deref(), Some("Kollam"));
    }

    #[test]
    fn test_geo_feature_deserializes_without_geometry() {
        let json = r#"{
            "id": "feat-9",
            "name": "Survey 118/2",
            "properties": {"Village_Name": "Poruvazhy"},
            "created_at": "2025-05-01T10:00:00Z",
            "updated_at": "2025-05-02T09:30:00Z"
        }"#;
        let feature: GeoFeature = serde_json::from_str(json).unwrap();
        assert!(feature.geometry.is_none());
        assert_eq!(
            feature.properties.get("Village_Name"),
            Some(&Value::String("Poruvazhy".to_string()))
        );
    }

    #[test]
    fn test_state_list_complete() {
        assert_eq!(INDIAN_STATES_AND_UTS.len(), 36);
    }
}
