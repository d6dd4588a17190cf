//! API endpoint implementations.

mod detections;
mod images;
mod map_features;
mod organizations;
mod query;
mod sequences;
mod vector_tiles;

pub use detections::DetectionsApi;
pub use images::ImagesApi;
pub use map_features::MapFeaturesApi;
pub use organizations::OrganizationsApi;
pub use query::Query;
pub use sequences::SequencesApi;
pub use vector_tiles::{DEFAULT_FORMAT, LayerInfo, TileLayer, VectorTilesApi, validate_tile};
