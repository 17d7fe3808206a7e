pub mod feature_detail;
pub mod file_detail;
pub mod home;
pub mod upload;
