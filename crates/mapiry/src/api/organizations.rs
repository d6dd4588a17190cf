//! Organizations API.

use serde_json::Value;

use crate::api::query::{Query, explicit_fields, lookup_fields};
use crate::client::MapiryClient;
use crate::error::Result;
use crate::types::{Detection, FromEnvelope, Image, Organization, PagedResponse, Sequence};
use crate::validate::{require_non_empty, require_path_segment, validate_date_string};

/// Organization lookups.
///
/// Organizations cannot be listed or filtered server-side, so there is no
/// `get()`. `fields` and `limit` shape `get_by_id` and
/// `get_current_user_organizations`.
#[derive(Debug, Clone)]
pub struct OrganizationsApi {
    client: MapiryClient,
    query: Query,
}

impl OrganizationsApi {
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

    /// Fetch one organization. Empty `fields` falls back to the builder's
    /// selection.
    pub fn get_by_id(&self, organization_id: &str, fields: &[&str]) -> Result<Organization> {
        self.client.fetch_by_id(
            organization_id,
            "organization_id",
            lookup_fields(fields, self.query.fields()),
        )
    }

    /// Organizations the token's user belongs to.
    pub fn get_current_user_organizations(&self) -> Result<PagedResponse<Organization>> {
        self.client
            .fetch_page("me/organizations", self.query.to_params())
    }

    /// Statistics for one organization, optionally bounded by dates.
    pub fn get_organization_stats(
        &self,
        organization_id: &str,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> Result<Value> {
        require_path_segment(organization_id, "organization_id")?;
        let mut params = Vec::new();
        for (key, date) in [("start_date", start_date), ("end_date", end_date)] {
            if let Some(date) = date {
                validate_date_string(date)?;
                params.push((key.to_string(), date.to_string()));
            }
        }
        self.client
            .get(&format!("{}/stats", organization_id), params)
    }

    /// Images owned by one organization.
    pub fn get_organization_images(
        &self,
        organization_id: &str,
        limit: Option<u32>,
        fields: &[&str],
    ) -> Result<PagedResponse<Image>> {
        self.owned("images", organization_id, limit, fields)
    }

    /// Sequences owned by one organization.
    pub fn get_organization_sequences(
        &self,
        organization_id: &str,
        limit: Option<u32>,
        fields: &[&str],
    ) -> Result<PagedResponse<Sequence>> {
        self.owned("sequences", organization_id, limit, fields)
    }

    /// Detections owned by one organization.
    pub fn get_organization_detections(
        &self,
        organization_id: &str,
        limit: Option<u32>,
        fields: &[&str],
    ) -> Result<PagedResponse<Detection>> {
        self.owned("map_features", organization_id, limit, fields)
    }

    /// List `path` filtered by `organization_id`.
    fn owned<T: FromEnvelope>(
        &self,
        path: &str,
        organization_id: &str,
        limit: Option<u32>,
        fields: &[&str],
    ) -> Result<PagedResponse<T>> {
        require_non_empty(organization_id, "organization_id")?;
        let mut query = Query::default();
        query.set("organization_id", organization_id);
        if let Some(limit) = limit {
            query.limit(limit)?;
        }

        let mut params = query.to_params();
        params.extend(explicit_fields(fields));
        self.client.fetch_page(path, params)
    }
}
