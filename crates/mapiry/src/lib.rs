//! Blocking client SDK for the Mapillary v4 API.
//!
//! This crate provides typed, chainable query builders for images,
//! sequences, detections, map features and organizations, plus vector tile
//! downloads and Web Mercator tile math.
//!
//! # Example
//!
//! ```no_run
//! use mapiry::{MapiryClient, Result, ThumbnailSize};
//!
//! # fn example() -> Result<()> {
//! let client = MapiryClient::new("MLY|your-token")?;
//!
//! // Recent panoramas around a point
//! let page = client
//!     .images()
//!     .close_to(13.4050, 52.5200, Some(200.0))?
//!     .panoramic_only()
//!     .captured_after("2022-01-01")?
//!     .limit(20)?
//!     .get()?;
//! println!("{} images, more: {}", page.len(), page.has_more);
//!
//! // Thumbnail bytes for the first hit
//! if let Some(image) = page.data.first() {
//!     let jpeg = client.images().download_image(&image.id, ThumbnailSize::Thumb1024)?;
//!     println!("downloaded {} bytes", jpeg.len());
//! }
//!
//! // Stop signs with high confidence
//! let signs = client
//!     .detections()
//!     .in_bbox(13.30, 52.45, 13.50, 52.55)?
//!     .object_value("regulatory--stop--g1")?
//!     .min_confidence(0.8)?
//!     .get()?;
//! for sign in signs {
//!     println!("{} seen {:?}", sign.id, sign.first_seen_at);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # API Coverage
//!
//! - **Images**: location, ownership, time and camera filters; thumbnail download
//! - **Sequences**: filters and per-sequence image listing
//! - **Detections**: object type/value and confidence filters, statistics
//! - **Map features**: object filters and per-feature detections
//! - **Organizations**: lookups, stats and owned content
//! - **Vector tiles**: per-layer and coverage tiles
//!
//! Builders are values: each filter call returns a new builder, and the
//! client's accessors always hand out an empty one.

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod request;
pub mod retry;
pub mod tiles;
pub mod timestamp;
pub mod transport;
pub mod types;
pub mod validate;

pub use api::{
    DetectionsApi, ImagesApi, MapFeaturesApi, OrganizationsApi, Query, SequencesApi, TileLayer,
    VectorTilesApi,
};
pub use client::{BaseUrls, ClientBuilder, MapiryClient};
pub use config::{ClientConfig, load_config, load_config_file};
pub use error::{Error, Result};
pub use request::{ApiRequest, ApiResponse, Auth, RawResponse};
pub use retry::{RetryPolicy, Sleeper, ThreadSleeper};
pub use tiles::{MAX_ZOOM, TileBounds, TileCoord, bbox_to_tiles, tile_to_bounds};
pub use transport::{
    ReqwestTransport, Transport, TransportError, TransportRequest, TransportResponse,
};
pub use types::*;
pub use validate::{CompassAngle, ImageType};
