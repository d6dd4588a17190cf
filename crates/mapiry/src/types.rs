//! Response entities for the Mapillary API.
//!
//! Records arrive as GeoJSON-style features: a `geometry` object next to a
//! `properties` object. Field selection on the server side means any property
//! may be missing, so every field apart from `id` is optional and absent
//! sections parse to empty defaults rather than errors.
//!
//! A record with no `properties` key at all is not treated as empty. It is
//! read flat, with the entity fields at the top level beside `geometry`,
//! which is the shape single-entity lookups return. So `{"id": "99"}` parses
//! to an entity with id `99`, while `{"properties": null}` parses to the
//! empty default.

use chrono::{DateTime, Utc};
use serde::de::{DeserializeOwned, Error as _, IgnoredAny};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::timestamp;

// ─────────────────────────────────────────────────────────────────────────────
// Envelope parsing
// ─────────────────────────────────────────────────────────────────────────────

/// An entity that can be built from a single feature record.
pub trait FromEnvelope: Sized {
    /// Parse one feature record.
    fn from_envelope(record: Value) -> serde_json::Result<Self>;
}

/// One feature: geometry plus properties `P`.
#[derive(Deserialize)]
struct Feature<P> {
    #[serde(default, deserialize_with = "optional_geometry")]
    geometry: Option<Geometry>,
    #[serde(default)]
    properties: Option<P>,
}

/// Split a record into geometry and properties. Records without a
/// `properties` key (single-entity lookups) are read flat.
fn parse_feature<P>(record: Value) -> serde_json::Result<(Option<Geometry>, P)>
where
    P: DeserializeOwned + Default,
{
    let flat = record
        .as_object()
        .is_some_and(|map| !map.contains_key("properties"));

    if flat {
        let feature: Feature<IgnoredAny> = serde_json::from_value(record.clone())?;
        let properties: P = serde_json::from_value(record)?;
        return Ok((feature.geometry, properties));
    }

    let feature: Feature<P> = serde_json::from_value(record)?;
    Ok((feature.geometry, feature.properties.unwrap_or_default()))
}

/// Treat `null`, a missing key and `{}` alike as "no geometry".
fn optional_geometry<'de, D>(deserializer: D) -> Result<Option<Geometry>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) if map.is_empty() => Ok(None),
        Some(value) => serde_json::from_value(value).map(Some).map_err(D::Error::custom),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Geometry
// ─────────────────────────────────────────────────────────────────────────────

/// GeoJSON geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    /// Geometry type, e.g. `Point` or `LineString`.
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Coordinate payload.
    #[serde(default)]
    pub coordinates: Coordinates,
}

/// GeoJSON coordinates at the nesting depth of the geometry type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Coordinates {
    /// A single position (`Point`).
    Position(Vec<f64>),
    /// A list of positions (`LineString`, `MultiPoint`).
    Positions(Vec<Vec<f64>>),
    /// A list of rings (`Polygon`, `MultiLineString`).
    Rings(Vec<Vec<Vec<f64>>>),
    /// Anything deeper is kept as raw JSON.
    Other(Value),
}

impl Default for Coordinates {
    fn default() -> Self {
        Coordinates::Position(Vec::new())
    }
}

impl Geometry {
    /// `(longitude, latitude)` of a point geometry.
    pub fn point(&self) -> Option<(f64, f64)> {
        match &self.coordinates {
            Coordinates::Position(p) if p.len() >= 2 => Some((p[0], p[1])),
            _ => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Images
// ─────────────────────────────────────────────────────────────────────────────

/// Thumbnail resolutions an image can be downloaded at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ThumbnailSize {
    /// 256 px wide.
    Thumb256,
    /// 1024 px wide.
    Thumb1024,
    /// 2048 px wide.
    #[default]
    Thumb2048,
    /// Original resolution.
    Original,
}

impl ThumbnailSize {
    /// Name of the image field holding this thumbnail's URL.
    pub fn field_name(&self) -> &'static str {
        match self {
            ThumbnailSize::Thumb256 => "thumb_256_url",
            ThumbnailSize::Thumb1024 => "thumb_1024_url",
            ThumbnailSize::Thumb2048 => "thumb_2048_url",
            ThumbnailSize::Original => "thumb_original_url",
        }
    }
}

/// A street-level image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Image {
    /// Image ID.
    pub id: String,
    /// Original capture location.
    #[serde(skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Geometry>,
    /// Camera manufacturer.
    pub camera_make: Option<String>,
    /// Camera model.
    pub camera_model: Option<String>,
    /// Projection type, e.g. `perspective` or `spherical`.
    pub camera_type: Option<String>,
    /// Focal length and radial distortion parameters.
    pub camera_parameters: Option<Vec<f64>>,
    /// When the image was captured.
    #[serde(deserialize_with = "timestamp::lenient")]
    pub captured_at: Option<DateTime<Utc>>,
    /// Original compass heading in degrees.
    pub compass_angle: Option<f64>,
    /// Sequence the image belongs to.
    pub sequence_id: Option<String>,
    /// Owning organization.
    pub organization_id: Option<String>,
    /// Uploader ID.
    pub creator_id: Option<String>,
    /// Uploader username.
    pub creator_username: Option<String>,
    /// Whether the image is a panorama.
    pub is_pano: Option<bool>,
    /// Original altitude in meters.
    pub altitude: Option<f64>,
    /// 256 px thumbnail URL.
    pub thumb_256_url: Option<String>,
    /// 1024 px thumbnail URL.
    pub thumb_1024_url: Option<String>,
    /// 2048 px thumbnail URL.
    pub thumb_2048_url: Option<String>,
    /// Full resolution URL.
    pub thumb_original_url: Option<String>,
    /// Location after structure-from-motion refinement.
    #[serde(deserialize_with = "optional_geometry")]
    pub computed_geometry: Option<Geometry>,
    /// Refined compass heading.
    pub computed_compass_angle: Option<f64>,
    /// Refined altitude.
    pub computed_altitude: Option<f64>,
    /// Refined rotation as an angle-axis vector.
    pub computed_rotation: Option<Vec<f64>>,
    /// Width in pixels.
    pub width: Option<u32>,
    /// Height in pixels.
    pub height: Option<u32>,
    /// EXIF orientation tag.
    pub exif_orientation: Option<u8>,
    /// Scale of the reconstruction.
    pub atomic_scale: Option<f64>,
    /// Mesh ID.
    pub mesh_id: Option<String>,
    /// Structure-from-motion cluster ID.
    pub sfm_cluster_id: Option<String>,
    /// Detections embedded in the image record.
    #[serde(deserialize_with = "nested_detections")]
    pub detections: Vec<Detection>,
}

impl Image {
    /// URL of the thumbnail at `size`, if the record carries it.
    pub fn thumbnail_url(&self, size: ThumbnailSize) -> Option<&str> {
        match size {
            ThumbnailSize::Thumb256 => self.thumb_256_url.as_deref(),
            ThumbnailSize::Thumb1024 => self.thumb_1024_url.as_deref(),
            ThumbnailSize::Thumb2048 => self.thumb_2048_url.as_deref(),
            ThumbnailSize::Original => self.thumb_original_url.as_deref(),
        }
    }
}

impl FromEnvelope for Image {
    fn from_envelope(record: Value) -> serde_json::Result<Self> {
        let (geometry, mut image) = parse_feature::<Image>(record)?;
        image.geometry = geometry;
        Ok(image)
    }
}

/// Embedded detections come either as a list of feature records or wrapped
/// in `{"data": [...]}`.
fn nested_detections<'de, D>(deserializer: D) -> Result<Vec<Detection>, D::Error>
where
    D: Deserializer<'de>,
{
    let records = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => items,
        Some(Value::Object(mut map)) => match map.remove("data") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };

    records
        .into_iter()
        .map(Detection::from_envelope)
        .collect::<serde_json::Result<Vec<_>>>()
        .map_err(D::Error::custom)
}

// ─────────────────────────────────────────────────────────────────────────────
// Sequences
// ─────────────────────────────────────────────────────────────────────────────

/// A capture sequence: images taken in one continuous run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sequence {
    /// Sequence ID.
    pub id: String,
    /// Path of the sequence.
    #[serde(skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Geometry>,
    /// Upload time.
    #[serde(deserialize_with = "timestamp::lenient")]
    pub created_at: Option<DateTime<Utc>>,
    /// Capture time.
    #[serde(deserialize_with = "timestamp::lenient")]
    pub captured_at: Option<DateTime<Utc>>,
    /// Owning organization.
    pub organization_id: Option<String>,
    /// Uploader ID.
    pub creator_id: Option<String>,
    /// Uploader username.
    pub creator_username: Option<String>,
    /// Camera manufacturer.
    pub camera_make: Option<String>,
    /// Camera model.
    pub camera_model: Option<String>,
    /// Number of images in the sequence.
    pub image_count: Option<u64>,
}

impl FromEnvelope for Sequence {
    fn from_envelope(record: Value) -> serde_json::Result<Self> {
        let (geometry, mut sequence) = parse_feature::<Sequence>(record)?;
        sequence.geometry = geometry;
        Ok(sequence)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Detections
// ─────────────────────────────────────────────────────────────────────────────

/// An object detected in an image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Detection {
    /// Detection ID.
    pub id: String,
    /// Detected region or location.
    #[serde(skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Geometry>,
    /// Image the detection was made in.
    pub image_id: Option<String>,
    /// Sequence of that image.
    pub sequence_id: Option<String>,
    /// Owning organization.
    pub organization_id: Option<String>,
    /// Uploader ID.
    pub creator_id: Option<String>,
    /// When the detection was created.
    #[serde(deserialize_with = "timestamp::lenient")]
    pub created_at: Option<DateTime<Utc>>,
    /// First time the object was seen.
    #[serde(deserialize_with = "timestamp::lenient")]
    pub first_seen_at: Option<DateTime<Utc>>,
    /// Last time the object was seen.
    #[serde(deserialize_with = "timestamp::lenient")]
    pub last_seen_at: Option<DateTime<Utc>>,
    /// Object class, e.g. `traffic_sign`.
    pub object_type: Option<String>,
    /// Specific value, e.g. `regulatory--stop--g1`.
    pub object_value: Option<String>,
    /// Detector confidence in `[0, 1]`.
    pub confidence: Option<f64>,
}

impl FromEnvelope for Detection {
    fn from_envelope(record: Value) -> serde_json::Result<Self> {
        let (geometry, mut detection) = parse_feature::<Detection>(record)?;
        detection.geometry = geometry;
        Ok(detection)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Map features
// ─────────────────────────────────────────────────────────────────────────────

/// A map object triangulated from one or more detections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapFeature {
    /// Map feature ID.
    pub id: String,
    /// Estimated location.
    #[serde(skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Geometry>,
    /// Feature class.
    pub feature_type: Option<String>,
    /// Specific value, e.g. `object--bench`.
    pub feature_value: Option<String>,
    /// Confidence in `[0, 1]`.
    pub confidence: Option<f64>,
    /// First time the feature was seen.
    #[serde(deserialize_with = "timestamp::lenient")]
    pub first_seen_at: Option<DateTime<Utc>>,
    /// Last time the feature was seen.
    #[serde(deserialize_with = "timestamp::lenient")]
    pub last_seen_at: Option<DateTime<Utc>>,
    /// IDs of images the feature appears in.
    pub images: Vec<String>,
}

impl FromEnvelope for MapFeature {
    fn from_envelope(record: Value) -> serde_json::Result<Self> {
        let (geometry, mut feature) = parse_feature::<MapFeature>(record)?;
        feature.geometry = geometry;
        Ok(feature)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Organizations
// ─────────────────────────────────────────────────────────────────────────────

/// An organization owning imagery.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Organization {
    /// Organization ID.
    pub id: String,
    /// Display name.
    pub name: Option<String>,
    /// Free-form description.
    pub description: Option<String>,
    /// When the organization was created.
    #[serde(deserialize_with = "timestamp::lenient")]
    pub created_at: Option<DateTime<Utc>>,
}

impl FromEnvelope for Organization {
    fn from_envelope(record: Value) -> serde_json::Result<Self> {
        let (_, organization) = parse_feature::<Organization>(record)?;
        Ok(organization)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Paged responses
// ─────────────────────────────────────────────────────────────────────────────

/// One page of results from a list endpoint.
///
/// `total_count` falls back to `data.len()` when the server omits it, so it is
/// not the upstream total while `has_more` is true.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PagedResponse<T> {
    /// Parsed entities, in server order.
    pub data: Vec<T>,
    /// Total count reported by the server, or the page length.
    pub total_count: u64,
    /// Whether more pages exist.
    pub has_more: bool,
    /// Cursor for the next page.
    pub next_cursor: Option<String>,
    /// Extra metadata from the envelope.
    pub metadata: Map<String, Value>,
}

#[derive(Deserialize)]
struct RawPage {
    #[serde(default)]
    features: Option<Vec<Value>>,
    #[serde(default)]
    total_count: Option<u64>,
    #[serde(default)]
    has_more: Option<bool>,
    #[serde(default)]
    next_cursor: Option<String>,
    #[serde(default)]
    metadata: Option<Map<String, Value>>,
}

impl<T: FromEnvelope> PagedResponse<T> {
    /// Parse a feature-collection envelope.
    pub fn from_envelope(envelope: Value) -> serde_json::Result<Self> {
        let raw: RawPage = serde_json::from_value(envelope)?;
        let data = raw
            .features
            .unwrap_or_default()
            .into_iter()
            .map(T::from_envelope)
            .collect::<serde_json::Result<Vec<T>>>()?;

        Ok(Self {
            total_count: raw.total_count.unwrap_or(data.len() as u64),
            has_more: raw.has_more.unwrap_or(false),
            next_cursor: raw.next_cursor,
            metadata: raw.metadata.unwrap_or_default(),
            data,
        })
    }
}

impl<T> PagedResponse<T> {
    /// Number of entities on this page.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True when the page holds no entities.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl<T> IntoIterator for PagedResponse<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.into_iter()
    }
}
