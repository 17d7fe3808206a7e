pub mod bounds;
pub mod fit;
pub mod mercator;
pub mod models;
