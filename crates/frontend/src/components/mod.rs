pub mod batch_download;
pub mod feature_map;
pub mod features_list;
pub mod file_upload;
pub mod files_list;
pub mod location_filter;
