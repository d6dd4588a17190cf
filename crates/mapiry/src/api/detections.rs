//! Detections API.
//!
//! Detections are served from the map features endpoints upstream, so list
//! and statistics queries go to `/map_features`.

use serde_json::Value;

use crate::api::query::{Query, lookup_fields};
use crate::client::MapiryClient;
use crate::error::Result;
use crate::types::{Detection, PagedResponse};
use crate::validate::validate_confidence;

/// Detection query builder.
#[derive(Debug, Clone)]
pub struct DetectionsApi {
    client: MapiryClient,
    query: Query,
}

impl DetectionsApi {
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

    /// Detections near a point, optionally within `radius` meters.
    pub fn close_to(mut self, longitude: f64, latitude: f64, radius: Option<f64>) -> Result<Self> {
        self.query.close_to(longitude, latitude, radius)?;
        Ok(self)
    }

    /// Detections inside a bounding box.
    pub fn in_bbox(mut self, west: f64, south: f64, east: f64, north: f64) -> Result<Self> {
        self.query.in_bbox(west, south, east, north)?;
        Ok(self)
    }

    /// Detections in one image.
    pub fn by_image(mut self, image_id: &str) -> Result<Self> {
        self.query.text("image_id", image_id, "image_id")?;
        Ok(self)
    }

    /// Detections in one sequence.
    pub fn by_sequence(mut self, sequence_id: &str) -> Result<Self> {
        self.query.text("sequence_id", sequence_id, "sequence_id")?;
        Ok(self)
    }

    /// Detections owned by an organization.
    pub fn by_organization(mut self, organization_id: &str) -> Result<Self> {
        self.query
            .text("organization_id", organization_id, "organization_id")?;
        Ok(self)
    }

    /// Detections in images uploaded by one user.
    pub fn by_creator(mut self, creator_id: &str) -> Result<Self> {
        self.query.text("creator_id", creator_id, "creator_id")?;
        Ok(self)
    }

    /// Detections of one object class, e.g. `traffic_sign`.
    pub fn object_type(mut self, object_type: &str) -> Result<Self> {
        self.query.text("object_type", object_type, "object_type")?;
        Ok(self)
    }

    /// Detections of one specific value, e.g. `regulatory--stop--g1`.
    pub fn object_value(mut self, object_value: &str) -> Result<Self> {
        self.query
            .text("object_value", object_value, "object_value")?;
        Ok(self)
    }

    /// Detections at or above a confidence in `[0, 1]`.
    pub fn min_confidence(mut self, confidence: f64) -> Result<Self> {
        validate_confidence(confidence, "min_confidence")?;
        self.query.set("min_confidence", confidence);
        Ok(self)
    }

    /// Traffic signs only.
    pub fn traffic_signs(mut self) -> Self {
        self.query.set("object_type", "traffic_sign");
        self
    }

    /// Traffic lights only.
    pub fn traffic_lights(mut self) -> Self {
        self.query.set("object_type", "traffic_light");
        self
    }

    /// People only.
    pub fn persons(mut self) -> Self {
        self.query.set("object_type", "person");
        self
    }

    /// Vehicles only.
    pub fn vehicles(mut self) -> Self {
        self.query.set("object_type", "vehicle");
        self
    }

    /// Detections created from `start`, up to `end` when given.
    pub fn created_between(mut self, start: &str, end: Option<&str>) -> Result<Self> {
        self.query
            .date_range("min_created_at", "max_created_at", start, end)?;
        Ok(self)
    }

    /// Objects first seen from `start`, up to `end` when given.
    pub fn first_seen_between(mut self, start: &str, end: Option<&str>) -> Result<Self> {
        self.query
            .date_range("min_first_seen_at", "max_first_seen_at", start, end)?;
        Ok(self)
    }

    /// Objects last seen from `start`, up to `end` when given.
    pub fn last_seen_between(mut self, start: &str, end: Option<&str>) -> Result<Self> {
        self.query
            .date_range("min_last_seen_at", "max_last_seen_at", start, end)?;
        Ok(self)
    }

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

    /// Run the query.
    pub fn get(&self) -> Result<PagedResponse<Detection>> {
        self.client.fetch_page("map_features", self.query.to_params())
    }

    /// Fetch one detection. Empty `fields` falls back to the builder's selection.
    pub fn get_by_id(&self, detection_id: &str, fields: &[&str]) -> Result<Detection> {
        self.client.fetch_by_id(
            detection_id,
            "detection_id",
            lookup_fields(fields, self.query.fields()),
        )
    }

    /// Aggregate statistics for the current filters, grouped by `group_by`
    /// (e.g. `object_type`).
    pub fn get_statistics(&self, group_by: &str) -> Result<Value> {
        let mut query = self.query.clone();
        query.text("group_by", group_by, "group_by")?;
        query.set("statistics", true);
        self.client.get("map_features/statistics", query.to_params())
    }
}
