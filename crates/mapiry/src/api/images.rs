//! Images API.

use crate::api::query::{Query, explicit_fields, lookup_fields};
use crate::client::MapiryClient;
use crate::error::{Error, Result};
use crate::request::Auth;
use crate::types::{Detection, Image, PagedResponse, ThumbnailSize};
use crate::validate::{
    CompassAngle, ImageType, require_path_segment, validate_compass_angle, validate_coordinates,
};

/// Image query builder.
///
/// Every filter consumes the builder and returns a new one, so a builder
/// value always describes exactly the filters chained onto it.
#[derive(Debug, Clone)]
pub struct ImagesApi {
    client: MapiryClient,
    query: Query,
}

impl ImagesApi {
    pub(crate) fn new(client: MapiryClient) -> Self {
        Self {
            client,
            query: Query::default(),
        }
    }

    /// Current filter state.
    pub fn query(&self) -> &Query {
        &self.query
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Location
    // ─────────────────────────────────────────────────────────────────────────

    /// Images near a point, optionally within `radius` meters.
    pub fn close_to(mut self, longitude: f64, latitude: f64, radius: Option<f64>) -> Result<Self> {
        self.query.close_to(longitude, latitude, radius)?;
        Ok(self)
    }

    /// Images inside a bounding box.
    pub fn in_bbox(mut self, west: f64, south: f64, east: f64, north: f64) -> Result<Self> {
        self.query.in_bbox(west, south, east, north)?;
        Ok(self)
    }

    /// Images looking towards a point.
    pub fn lookat(mut self, longitude: f64, latitude: f64) -> Result<Self> {
        validate_coordinates(latitude, longitude)?;
        self.query.set("lookat", format!("{},{}", longitude, latitude));
        Ok(self)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Ownership
    // ─────────────────────────────────────────────────────────────────────────

    /// Images in one sequence.
    pub fn by_sequence(mut self, sequence_id: &str) -> Result<Self> {
        self.query.text("sequence_id", sequence_id, "sequence_id")?;
        Ok(self)
    }

    /// Images owned by an organization.
    pub fn by_organization(mut self, organization_id: &str) -> Result<Self> {
        self.query
            .text("organization_id", organization_id, "organization_id")?;
        Ok(self)
    }

    /// Images uploaded by one user.
    pub fn by_creator_username(mut self, username: &str) -> Result<Self> {
        self.query.text("usernames", username, "username")?;
        Ok(self)
    }

    /// Images uploaded by any of these users.
    pub fn by_usernames<I, S>(mut self, usernames: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.query.list("usernames", usernames, "usernames")?;
        Ok(self)
    }

    /// Images uploaded by any of these user keys.
    pub fn by_userkeys<I, S>(mut self, userkeys: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.query.list("userkeys", userkeys, "userkeys")?;
        Ok(self)
    }

    /// Images with these keys.
    pub fn by_image_keys<I, S>(mut self, image_keys: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.query.list("image_keys", image_keys, "image_keys")?;
        Ok(self)
    }

    /// Images in any of these sequences.
    pub fn by_sequence_keys<I, S>(mut self, sequence_keys: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.query
            .list("sequence_keys", sequence_keys, "sequence_keys")?;
        Ok(self)
    }

    /// Images owned by any of these organizations.
    pub fn by_organization_keys<I, S>(mut self, organization_keys: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.query
            .list("organization_keys", organization_keys, "organization_keys")?;
        Ok(self)
    }

    /// Private (`true`) or public (`false`) images only.
    pub fn private_images(mut self, private: bool) -> Self {
        self.query.set("private", private);
        self
    }

    /// Public images only.
    pub fn public_images(self) -> Self {
        self.private_images(false)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Time
    // ─────────────────────────────────────────────────────────────────────────

    /// Images captured since `timestamp`.
    pub fn start_time(mut self, timestamp: &str) -> Result<Self> {
        self.query.date("start_time", timestamp)?;
        Ok(self)
    }

    /// Images captured before `timestamp`.
    pub fn end_time(mut self, timestamp: &str) -> Result<Self> {
        self.query.date("end_time", timestamp)?;
        Ok(self)
    }

    /// Images captured from `start`, up to `end` when given.
    pub fn captured_between(mut self, start: &str, end: Option<&str>) -> Result<Self> {
        self.query
            .date_range("min_captured_at", "max_captured_at", start, end)?;
        Ok(self)
    }

    /// Images captured after `date`.
    pub fn captured_after(mut self, date: &str) -> Result<Self> {
        self.query.date("min_captured_at", date)?;
        Ok(self)
    }

    /// Images captured before `date`.
    pub fn captured_before(mut self, date: &str) -> Result<Self> {
        self.query.date("max_captured_at", date)?;
        Ok(self)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Camera
    // ─────────────────────────────────────────────────────────────────────────

    /// Images of one projection type.
    pub fn image_type(mut self, image_type: ImageType) -> Self {
        self.query.set("image_type", image_type);
        self
    }

    /// Panoramas only.
    pub fn panoramic_only(self) -> Self {
        self.image_type(ImageType::Pano)
    }

    /// Non-panoramic images only.
    pub fn flat_only(self) -> Self {
        self.image_type(ImageType::Flat)
    }

    /// Images facing an angle or inside an angle range.
    pub fn compass_angle(mut self, angle: impl Into<CompassAngle>) -> Result<Self> {
        let angle = angle.into();
        validate_compass_angle(angle)?;
        self.query.set("compass_angle", angle.to_query_value());
        Ok(self)
    }

    /// Images from one camera manufacturer.
    pub fn camera_make(mut self, make: &str) -> Result<Self> {
        self.query.text("camera_make", make, "camera_make")?;
        Ok(self)
    }

    /// Images from one camera model.
    pub fn camera_model(mut self, model: &str) -> Result<Self> {
        self.query.text("camera_model", model, "camera_model")?;
        Ok(self)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Result shape
    // ─────────────────────────────────────────────────────────────────────────

    /// Fields to return. `all` requests every field.
    pub fn fields<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.query.set_fields(names);
        self
    }

    /// Maximum number of results.
    pub fn limit(mut self, count: u32) -> Result<Self> {
        self.query.limit(count)?;
        Ok(self)
    }

    /// Page size, between 1 and 1000.
    pub fn per_page(mut self, count: u32) -> Result<Self> {
        if !(1..=1000).contains(&count) {
            return Err(Error::validation(
                "Per page count must be between 1 and 1000",
                "per_page",
            ));
        }
        self.query.set("per_page", count);
        Ok(self)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Requests
    // ─────────────────────────────────────────────────────────────────────────

    /// Run the query.
    pub fn get(&self) -> Result<PagedResponse<Image>> {
        self.client.fetch_page("images", self.query.to_params())
    }

    /// Fetch one image. Empty `fields` falls back to the builder's selection.
    pub fn get_by_id(&self, image_id: &str, fields: &[&str]) -> Result<Image> {
        self.client.fetch_by_id(
            image_id,
            "image_id",
            lookup_fields(fields, self.query.fields()),
        )
    }

    /// Download the image bytes at one thumbnail size.
    pub fn download_image(&self, image_id: &str, size: ThumbnailSize) -> Result<Vec<u8>> {
        let image = self.get_by_id(image_id, &[size.field_name()])?;
        let url = image.thumbnail_url(size).ok_or_else(|| {
            Error::validation(
                format!("{} not available for image {}", size.field_name(), image_id),
                "size",
            )
        })?;
        let url = url::Url::parse(url).map_err(|e| Error::Api {
            status: 200,
            message: format!("invalid thumbnail URL {}: {}", url, e),
            body: None,
        })?;

        tracing::debug!(image_id, size = size.field_name(), "Downloading image");
        self.client.fetch_bytes(url, "", Auth::None)
    }

    /// Detections in one image.
    pub fn get_detections(
        &self,
        image_id: &str,
        fields: &[&str],
    ) -> Result<PagedResponse<Detection>> {
        require_path_segment(image_id, "image_id")?;
        self.client
            .fetch_page(&format!("{}/detections", image_id), explicit_fields(fields))
    }
}
