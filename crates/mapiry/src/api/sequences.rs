//! Sequences API.

use crate::api::query::{Query, explicit_fields, lookup_fields};
use crate::client::MapiryClient;
use crate::error::{Error, Result};
use crate::types::{Image, PagedResponse, Sequence};
use crate::validate::require_non_empty;

/// Sequence query builder.
#[derive(Debug, Clone)]
pub struct SequencesApi {
    client: MapiryClient,
    query: Query,
}

impl SequencesApi {
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

    /// Sequences near a point, optionally within `radius` meters.
    pub fn close_to(mut self, longitude: f64, latitude: f64, radius: Option<f64>) -> Result<Self> {
        self.query.close_to(longitude, latitude, radius)?;
        Ok(self)
    }

    /// Sequences inside a bounding box.
    pub fn in_bbox(mut self, west: f64, south: f64, east: f64, north: f64) -> Result<Self> {
        self.query.in_bbox(west, south, east, north)?;
        Ok(self)
    }

    /// Sequences owned by an organization.
    pub fn by_organization(mut self, organization_id: &str) -> Result<Self> {
        self.query
            .text("organization_id", organization_id, "organization_id")?;
        Ok(self)
    }

    /// Sequences uploaded by one user.
    pub fn by_creator(mut self, creator_id: &str) -> Result<Self> {
        self.query.text("creator_id", creator_id, "creator_id")?;
        Ok(self)
    }

    /// Sequences captured from `start`, up to `end` when given.
    pub fn captured_between(mut self, start: &str, end: Option<&str>) -> Result<Self> {
        self.query
            .date_range("min_captured_at", "max_captured_at", start, end)?;
        Ok(self)
    }

    /// Sequences captured after `date`.
    pub fn captured_after(mut self, date: &str) -> Result<Self> {
        self.query.date("min_captured_at", date)?;
        Ok(self)
    }

    /// Sequences captured before `date`.
    pub fn captured_before(mut self, date: &str) -> Result<Self> {
        self.query.date("max_captured_at", date)?;
        Ok(self)
    }

    /// Sequences uploaded from `start`, up to `end` when given.
    pub fn created_between(mut self, start: &str, end: Option<&str>) -> Result<Self> {
        self.query
            .date_range("min_created_at", "max_created_at", start, end)?;
        Ok(self)
    }

    /// Sequences from one camera manufacturer.
    pub fn camera_make(mut self, make: &str) -> Result<Self> {
        self.query.text("camera_make", make, "camera_make")?;
        Ok(self)
    }

    /// Sequences from one camera model.
    pub fn camera_model(mut self, model: &str) -> Result<Self> {
        self.query.text("camera_model", model, "camera_model")?;
        Ok(self)
    }

    /// Sequences holding at least `count` images.
    pub fn min_images(mut self, count: u32) -> Result<Self> {
        if count == 0 {
            return Err(Error::validation(
                "Minimum image count must be positive",
                "min_images",
            ));
        }
        self.query.set("min_image_count", count);
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
    pub fn get(&self) -> Result<PagedResponse<Sequence>> {
        self.client.fetch_page("sequences", self.query.to_params())
    }

    /// Fetch one sequence. Empty `fields` falls back to the builder's selection.
    pub fn get_by_id(&self, sequence_id: &str, fields: &[&str]) -> Result<Sequence> {
        self.client.fetch_by_id(
            sequence_id,
            "sequence_id",
            lookup_fields(fields, self.query.fields()),
        )
    }

    /// Images in one sequence.
    pub fn get_images(
        &self,
        sequence_id: &str,
        limit: Option<u32>,
        fields: &[&str],
    ) -> Result<PagedResponse<Image>> {
        require_non_empty(sequence_id, "sequence_id")?;
        let mut query = Query::default();
        query.set("sequence_id", sequence_id);
        if let Some(limit) = limit {
            query.limit(limit)?;
        }

        let mut params = query.to_params();
        params.extend(explicit_fields(fields));
        self.client.fetch_page("images", params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sequences() -> SequencesApi {
        MapiryClient::new("token").unwrap().sequences()
    }

    #[test]
    fn test_filters_write_query_keys() {
        let api = sequences()
            .by_creator("user1")
            .unwrap()
            .created_between("2019-01-01", Some("2019-12-31"))
            .unwrap()
            .min_images(10)
            .unwrap()
            .camera_make("GoPro")
            .unwrap();

        let q = api.query();
        assert_eq!(q.filter("creator_id"), Some("user1"));
        assert_eq!(q.filter("min_created_at"), Some("2019-01-01"));
        assert_eq!(q.filter("max_created_at"), Some("2019-12-31"));
        assert_eq!(q.filter("min_image_count"), Some("10"));
        assert_eq!(q.filter("camera_make"), Some("GoPro"));
    }

    #[test]
    fn test_invalid_filters() {
        assert!(sequences().min_images(0).is_err());
        assert!(sequences().by_organization("").is_err());
        assert!(sequences().camera_model("").is_err());
        assert!(sequences().limit(0).is_err());
    }

    #[test]
    fn test_get_images_rejects_empty_id_and_zero_limit() {
        let api = sequences();
        assert!(api.get_images("", None, &[]).unwrap_err().is_validation_error());
        assert!(api.get_images("s1", Some(0), &[]).unwrap_err().is_validation_error());
    }
}
