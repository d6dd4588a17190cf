//! Web Mercator tile math.
//!
//! Converts between XYZ tile addresses and longitude/latitude bounds in the
//! standard slippy-map scheme (origin at the top-left, `y` growing south).

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Highest zoom level served.
pub const MAX_ZOOM: u8 = 14;

/// Geographic bounds of a tile, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TileBounds {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

/// An XYZ tile address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    pub x: u32,
    pub y: u32,
    pub z: u8,
}

impl TileCoord {
    /// Create a tile address.
    pub fn new(z: u8, x: u32, y: u32) -> Self {
        Self { x, y, z }
    }

    /// Geographic bounds of this tile.
    pub fn bounds(&self) -> TileBounds {
        tile_to_bounds(self.z, self.x, self.y)
    }
}

/// Bounds of tile `(z, x, y)`.
pub fn tile_to_bounds(z: u8, x: u32, y: u32) -> TileBounds {
    let n = 2f64.powi(i32::from(z));
    let lat_at = |row: f64| (PI * (1.0 - 2.0 * row / n)).sinh().atan().to_degrees();

    TileBounds {
        west: f64::from(x) / n * 360.0 - 180.0,
        east: (f64::from(x) + 1.0) / n * 360.0 - 180.0,
        north: lat_at(f64::from(y)),
        south: lat_at(f64::from(y) + 1.0),
    }
}

/// Tile containing the point at `zoom`, clamped onto the tile grid.
fn lonlat_to_tile(longitude: f64, latitude: f64, zoom: u8) -> (u32, u32) {
    let n = 2f64.powi(i32::from(zoom));
    let max_index = n - 1.0;
    let lat_rad = latitude.to_radians();

    let x = ((longitude + 180.0) / 360.0 * n).floor();
    let y = ((1.0 - lat_rad.tan().asinh() / PI) / 2.0 * n).floor();

    // Poles and the antimeridian land one past the last tile.
    let clamp = |v: f64| if v.is_nan() { 0.0 } else { v.clamp(0.0, max_index) };
    (clamp(x) as u32, clamp(y) as u32)
}

/// Every tile at `zoom` intersecting the bounding box, column by column.
///
/// Corners may be given in either order. Zoom levels above [`MAX_ZOOM`] are
/// rejected.
pub fn bbox_to_tiles(
    west: f64,
    south: f64,
    east: f64,
    north: f64,
    zoom: u8,
) -> Result<Vec<TileCoord>> {
    if zoom > MAX_ZOOM {
        return Err(Error::validation(
            format!("Zoom level must be between 0 and {}", MAX_ZOOM),
            "zoom",
        ));
    }

    let (mut x_min, mut y_max) = lonlat_to_tile(west, north, zoom);
    let (mut x_max, mut y_min) = lonlat_to_tile(east, south, zoom);

    if x_min > x_max {
        std::mem::swap(&mut x_min, &mut x_max);
    }
    if y_min > y_max {
        std::mem::swap(&mut y_min, &mut y_max);
    }

    Ok((x_min..=x_max)
        .flat_map(|x| (y_min..=y_max).map(move |y| TileCoord::new(zoom, x, y)))
        .collect())
}
