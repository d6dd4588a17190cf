//! Vector tiles API.
//!
//! Tiles are Mapbox Vector Tile payloads addressed by `z/x/y`. The tile
//! service only accepts the access token as a query parameter.

use std::fmt;
use std::str::FromStr;

use url::Url;

use crate::client::MapiryClient;
use crate::error::{Error, Result};
use crate::request::Auth;
use crate::tiles::{MAX_ZOOM, TileBounds, TileCoord, bbox_to_tiles, tile_to_bounds};

/// Default tile format. Adds no extension to the tile path.
pub const DEFAULT_FORMAT: &str = "mvt";

/// A per-layer tile set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileLayer {
    /// Image points.
    Image,
    /// Sequence lines.
    Sequence,
    /// Low-zoom overview.
    Overview,
    /// Traffic sign detections.
    TrafficSign,
    /// Map features.
    MapFeature,
}

/// Static description of a tile layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerInfo {
    /// What the layer contains.
    pub description: &'static str,
    /// Geometry of its features.
    pub geometry_type: &'static str,
    /// Feature properties carried in the tiles.
    pub fields: &'static [&'static str],
}

impl TileLayer {
    /// Every layer.
    pub const ALL: [TileLayer; 5] = [
        TileLayer::Image,
        TileLayer::Sequence,
        TileLayer::Overview,
        TileLayer::TrafficSign,
        TileLayer::MapFeature,
    ];

    /// Path segment for this layer.
    pub fn as_str(&self) -> &'static str {
        match self {
            TileLayer::Image => "image",
            TileLayer::Sequence => "sequence",
            TileLayer::Overview => "overview",
            TileLayer::TrafficSign => "traffic_sign",
            TileLayer::MapFeature => "map_feature",
        }
    }

    /// Layer description.
    pub fn metadata(&self) -> LayerInfo {
        match self {
            TileLayer::Image => LayerInfo {
                description: "Image points",
                geometry_type: "Point",
                fields: &["id", "captured_at", "compass_angle", "sequence_id"],
            },
            TileLayer::Sequence => LayerInfo {
                description: "Image sequences",
                geometry_type: "LineString",
                fields: &["id", "created_at", "captured_at", "creator_id"],
            },
            TileLayer::Overview => LayerInfo {
                description: "Simplified overview data",
                geometry_type: "Mixed",
                fields: &["id", "type"],
            },
            TileLayer::TrafficSign => LayerInfo {
                description: "Traffic sign detections",
                geometry_type: "Point",
                fields: &["id", "object_type", "object_value", "confidence"],
            },
            TileLayer::MapFeature => LayerInfo {
                description: "Map features and detections",
                geometry_type: "Point",
                fields: &["id", "feature_type", "feature_value", "confidence"],
            },
        }
    }
}

impl fmt::Display for TileLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TileLayer {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        TileLayer::ALL
            .into_iter()
            .find(|layer| layer.as_str() == s)
            .ok_or_else(|| Error::validation(format!("Invalid layer: {}", s), "layer"))
    }
}

/// Check a tile address: `z <= 14` and `x, y < 2^z`.
pub fn validate_tile(z: u8, x: u32, y: u32) -> Result<()> {
    if z > MAX_ZOOM {
        return Err(Error::validation(
            format!("Zoom level must be between 0 and {}", MAX_ZOOM),
            "z",
        ));
    }
    let size = 1u32 << z;
    for (value, field) in [(x, "x"), (y, "y")] {
        if value >= size {
            return Err(Error::validation(
                format!(
                    "{} coordinate must be between 0 and {} for zoom level {}",
                    field.to_uppercase(),
                    size - 1,
                    z
                ),
                field,
            ));
        }
    }
    Ok(())
}

/// Path `{prefix}/{z}/{x}/{y}`, with `.{format}` unless the format is `mvt`.
fn tile_path(prefix: Option<&str>, z: u8, x: u32, y: u32, format: &str) -> Result<String> {
    if format.is_empty() {
        return Err(Error::validation("Tile format cannot be empty", "format"));
    }
    let mut path = match prefix {
        Some(prefix) => format!("{}/{}/{}/{}", prefix, z, x, y),
        None => format!("{}/{}/{}", z, x, y),
    };
    if format != DEFAULT_FORMAT {
        path.push('.');
        path.push_str(format);
    }
    Ok(path)
}

/// Vector tile fetches.
#[derive(Debug, Clone)]
pub struct VectorTilesApi {
    client: MapiryClient,
}

impl VectorTilesApi {
    pub(crate) fn new(client: MapiryClient) -> Self {
        Self { client }
    }

    /// Fetch one MVT tile of `layer`.
    pub fn get_tile(&self, layer: TileLayer, z: u8, x: u32, y: u32) -> Result<Vec<u8>> {
        self.get_tile_with_format(layer, z, x, y, DEFAULT_FORMAT)
    }

    /// Fetch one tile of `layer` in `format`.
    pub fn get_tile_with_format(
        &self,
        layer: TileLayer,
        z: u8,
        x: u32,
        y: u32,
        format: &str,
    ) -> Result<Vec<u8>> {
        validate_tile(z, x, y)?;
        let path = tile_path(Some(layer.as_str()), z, x, y, format)?;
        self.fetch(self.client.base_urls().tiles.clone(), &path)
    }

    /// Image layer tile.
    pub fn get_image_tiles(&self, z: u8, x: u32, y: u32) -> Result<Vec<u8>> {
        self.get_tile(TileLayer::Image, z, x, y)
    }

    /// Sequence layer tile.
    pub fn get_sequence_tiles(&self, z: u8, x: u32, y: u32) -> Result<Vec<u8>> {
        self.get_tile(TileLayer::Sequence, z, x, y)
    }

    /// Overview layer tile.
    pub fn get_overview_tiles(&self, z: u8, x: u32, y: u32) -> Result<Vec<u8>> {
        self.get_tile(TileLayer::Overview, z, x, y)
    }

    /// Traffic sign layer tile.
    pub fn get_traffic_sign_tiles(&self, z: u8, x: u32, y: u32) -> Result<Vec<u8>> {
        self.get_tile(TileLayer::TrafficSign, z, x, y)
    }

    /// Coverage tile.
    pub fn get_coverage_tiles(&self, z: u8, x: u32, y: u32, format: &str) -> Result<Vec<u8>> {
        self.fixed(self.client.base_urls().coverage.clone(), z, x, y, format)
    }

    /// Computed coverage tile.
    pub fn get_computed_coverage_tiles(
        &self,
        z: u8,
        x: u32,
        y: u32,
        format: &str,
    ) -> Result<Vec<u8>> {
        self.fixed(self.client.base_urls().computed_coverage.clone(), z, x, y, format)
    }

    /// Map feature point tile.
    pub fn get_map_feature_point_tiles(
        &self,
        z: u8,
        x: u32,
        y: u32,
        format: &str,
    ) -> Result<Vec<u8>> {
        self.fixed(self.client.base_urls().map_feature_points.clone(), z, x, y, format)
    }

    /// Map feature traffic sign tile.
    pub fn get_map_feature_traffic_sign_tiles(
        &self,
        z: u8,
        x: u32,
        y: u32,
        format: &str,
    ) -> Result<Vec<u8>> {
        self.fixed(
            self.client.base_urls().map_feature_traffic_signs.clone(),
            z,
            x,
            y,
            format,
        )
    }

    /// Geographic bounds of a tile.
    pub fn tile_bounds(&self, z: u8, x: u32, y: u32) -> TileBounds {
        tile_to_bounds(z, x, y)
    }

    /// Tiles covering a bounding box at `zoom`.
    pub fn tiles_for_bbox(
        &self,
        west: f64,
        south: f64,
        east: f64,
        north: f64,
        zoom: u8,
    ) -> Result<Vec<TileCoord>> {
        bbox_to_tiles(west, south, east, north, zoom)
    }

    fn fixed(&self, base: Url, z: u8, x: u32, y: u32, format: &str) -> Result<Vec<u8>> {
        validate_tile(z, x, y)?;
        let path = tile_path(None, z, x, y, format)?;
        self.fetch(base, &path)
    }

    fn fetch(&self, base: Url, path: &str) -> Result<Vec<u8>> {
        self.client.fetch_bytes(base, path, Auth::QueryToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_of(err: Error) -> String {
        match err {
            Error::Validation { field, .. } => field,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_layer_parsing() {
        for layer in TileLayer::ALL {
            assert_eq!(layer.as_str().parse::<TileLayer>().unwrap(), layer);
        }
        assert_eq!(field_of("roads".parse::<TileLayer>().unwrap_err()), "layer");
        assert_eq!(TileLayer::TrafficSign.to_string(), "traffic_sign");
    }

    #[test]
    fn test_layer_metadata() {
        let info = TileLayer::Sequence.metadata();
        assert_eq!(info.geometry_type, "LineString");
        assert!(info.fields.contains(&"creator_id"));
        assert_eq!(TileLayer::Overview.metadata().fields, ["id", "type"]);
    }

    #[test]
    fn test_validate_tile() {
        assert!(validate_tile(0, 0, 0).is_ok());
        assert!(validate_tile(14, 16383, 16383).is_ok());
        assert_eq!(field_of(validate_tile(15, 0, 0).unwrap_err()), "z");
        assert_eq!(field_of(validate_tile(2, 4, 0).unwrap_err()), "x");
        assert_eq!(field_of(validate_tile(2, 0, 4).unwrap_err()), "y");
    }

    #[test]
    fn test_tile_path() {
        assert_eq!(tile_path(Some("image"), 3, 1, 2, "mvt").unwrap(), "image/3/1/2");
        assert_eq!(tile_path(None, 3, 1, 2, "pbf").unwrap(), "3/1/2.pbf");
        assert_eq!(field_of(tile_path(None, 0, 0, 0, "").unwrap_err()), "format");
    }

    #[test]
    fn test_invalid_tile_fails_before_request() {
        let tiles = MapiryClient::new("token").unwrap().vector_tiles();
        assert!(tiles.get_tile(TileLayer::Image, 20, 0, 0).is_err());
        assert!(tiles.get_coverage_tiles(1, 2, 0, "mvt").is_err());
    }
}
