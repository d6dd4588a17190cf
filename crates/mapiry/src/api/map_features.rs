//! Map features API.

use crate::api::query::{Query, explicit_fields, lookup_fields, validate_radius};
use crate::client::MapiryClient;
use crate::error::Result;
use crate::types::{Detection, MapFeature, PagedResponse};
use crate::validate::{require_path_segment, validate_confidence, validate_coordinates};

/// Map feature query builder.
#[derive(Debug, Clone)]
pub struct MapFeaturesApi {
    client: MapiryClient,
    query: Query,
}

impl MapFeaturesApi {
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

    /// Features near a point, optionally within `radius` meters.
    ///
    /// Unlike the other resources this endpoint takes a single
    /// `closeto=lon,lat` parameter.
    pub fn close_to(mut self, longitude: f64, latitude: f64, radius: Option<f64>) -> Result<Self> {
        validate_coordinates(latitude, longitude)?;
        validate_radius(radius)?;
        self.query.set("closeto", format!("{},{}", longitude, latitude));
        if let Some(radius) = radius {
            self.query.set("radius", radius);
        }
        Ok(self)
    }

    /// Features inside a bounding box.
    pub fn in_bbox(mut self, west: f64, south: f64, east: f64, north: f64) -> Result<Self> {
        self.query.in_bbox(west, south, east, north)?;
        Ok(self)
    }

    /// Features with any of these values, e.g. `object--bench`.
    pub fn object_values<I, S>(mut self, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.query.list("object_values", values, "object_values")?;
        Ok(self)
    }

    /// Features of any of these classes.
    pub fn object_types<I, S>(mut self, types: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.query.list("object_types", types, "object_types")?;
        Ok(self)
    }

    /// Features seen in one image.
    pub fn by_image(mut self, image_id: &str) -> Result<Self> {
        self.query.text("image_id", image_id, "image_id")?;
        Ok(self)
    }

    /// First seen after `date`.
    pub fn first_seen_after(mut self, date: &str) -> Result<Self> {
        self.query.date("first_seen_after", date)?;
        Ok(self)
    }

    /// First seen before `date`.
    pub fn first_seen_before(mut self, date: &str) -> Result<Self> {
        self.query.date("first_seen_before", date)?;
        Ok(self)
    }

    /// Last seen after `date`.
    pub fn last_seen_after(mut self, date: &str) -> Result<Self> {
        self.query.date("last_seen_after", date)?;
        Ok(self)
    }

    /// Last seen before `date`.
    pub fn last_seen_before(mut self, date: &str) -> Result<Self> {
        self.query.date("last_seen_before", date)?;
        Ok(self)
    }

    /// Confidence at or above `confidence`.
    pub fn min_confidence(mut self, confidence: f64) -> Result<Self> {
        validate_confidence(confidence, "min_confidence")?;
        self.query.set("min_confidence", confidence);
        Ok(self)
    }

    /// Confidence at or below `confidence`.
    pub fn max_confidence(mut self, confidence: f64) -> Result<Self> {
        validate_confidence(confidence, "max_confidence")?;
        self.query.set("max_confidence", confidence);
        Ok(self)
    }

    /// Benches only.
    pub fn benches(mut self) -> Self {
        self.query.set("object_values", "object--bench");
        self
    }

    /// Fire hydrants only.
    pub fn fire_hydrants(mut self) -> Self {
        self.query.set("object_values", "object--fire-hydrant");
        self
    }

    /// Trash cans only.
    pub fn trash_cans(mut self) -> Self {
        self.query.set("object_values", "object--trash-can");
        self
    }

    /// Mailboxes only.
    pub fn mailboxes(mut self) -> Self {
        self.query.set("object_values", "object--mailbox");
        self
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
    pub fn get(&self) -> Result<PagedResponse<MapFeature>> {
        self.client.fetch_page("map_features", self.query.to_params())
    }

    /// Fetch one feature. Empty `fields` falls back to the builder's selection.
    pub fn get_by_id(&self, feature_id: &str, fields: &[&str]) -> Result<MapFeature> {
        self.client.fetch_by_id(
            feature_id,
            "feature_id",
            lookup_fields(fields, self.query.fields()),
        )
    }

    /// Detections that make up one feature.
    pub fn get_detections(
        &self,
        feature_id: &str,
        fields: &[&str],
    ) -> Result<PagedResponse<Detection>> {
        require_path_segment(feature_id, "feature_id")?;
        self.client
            .fetch_page(&format!("{}/detections", feature_id), explicit_fields(fields))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map_features() -> MapFeaturesApi {
        MapiryClient::new("token").unwrap().map_features()
    }

    #[test]
    fn test_close_to_uses_single_key() {
        let api = map_features().close_to(13.4, 52.5, Some(25.0)).unwrap();
        let q = api.query();
        assert_eq!(q.filter("closeto"), Some("13.4,52.5"));
        assert_eq!(q.filter("radius"), Some("25"));
        assert!(q.filter("longitude").is_none());
    }

    #[test]
    fn test_object_values() {
        let api = map_features()
            .object_values(["object--bench", "object--mailbox"])
            .unwrap();
        assert_eq!(
            api.query().filter("object_values"),
            Some("object--bench,object--mailbox")
        );
        assert_eq!(
            map_features().fire_hydrants().query().filter("object_values"),
            Some("object--fire-hydrant")
        );
        assert!(map_features().object_types(Vec::<String>::new()).is_err());
    }

    #[test]
    fn test_confidence_bounds() {
        let api = map_features()
            .min_confidence(0.2)
            .unwrap()
            .max_confidence(0.9)
            .unwrap();
        assert_eq!(api.query().filter("min_confidence"), Some("0.2"));
        assert_eq!(api.query().filter("max_confidence"), Some("0.9"));
        assert!(map_features().max_confidence(-0.5).is_err());
    }

    #[test]
    fn test_empty_ids_rejected() {
        assert!(map_features().get_by_id("", &[]).is_err());
        assert!(map_features().get_detections("", &[]).is_err());
        assert!(map_features().by_image("").is_err());
    }
}
