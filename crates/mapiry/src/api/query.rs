//! Filter state shared by the resource builders.

use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::validate::{require_non_empty, validate_bbox, validate_coordinates, validate_date_string};

/// Accumulated filters and field selection for one query.
///
/// Builders own a `Query` by value, so every filter call produces a new
/// builder and nothing carries over between independent queries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    filters: BTreeMap<String, String>,
    fields: Vec<String>,
}

impl Query {
    /// Filter values by query key.
    pub fn filters(&self) -> &BTreeMap<String, String> {
        &self.filters
    }

    /// Value of one filter.
    pub fn filter(&self, key: &str) -> Option<&str> {
        self.filters.get(key).map(String::as_str)
    }

    /// Requested fields; empty means the server default set.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Query parameters: every filter plus `fields` when any were requested.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params: Vec<(String, String)> = self
            .filters
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        if !self.fields.is_empty() {
            params.push(("fields".to_string(), self.fields.join(",")));
        }
        params
    }

    pub(crate) fn set(&mut self, key: &str, value: impl ToString) {
        self.filters.insert(key.to_string(), value.to_string());
    }

    /// Replace the field list. A name of `all` requests every field.
    pub(crate) fn set_fields<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        self.fields = if names.iter().any(|n| n == "all") {
            vec!["all".to_string()]
        } else {
            names
        };
    }

    pub(crate) fn limit(&mut self, count: u32) -> Result<()> {
        if count == 0 {
            return Err(Error::validation("Limit must be positive", "limit"));
        }
        self.set("limit", count);
        Ok(())
    }

    /// `longitude`/`latitude` keys plus an optional positive `radius`.
    pub(crate) fn close_to(
        &mut self,
        longitude: f64,
        latitude: f64,
        radius: Option<f64>,
    ) -> Result<()> {
        validate_coordinates(latitude, longitude)?;
        validate_radius(radius)?;
        self.set("longitude", longitude);
        self.set("latitude", latitude);
        if let Some(radius) = radius {
            self.set("radius", radius);
        }
        Ok(())
    }

    /// `bbox=west,south,east,north`.
    pub(crate) fn in_bbox(&mut self, west: f64, south: f64, east: f64, north: f64) -> Result<()> {
        validate_bbox(west, south, east, north)?;
        self.set("bbox", format!("{},{},{},{}", west, south, east, north));
        Ok(())
    }

    /// A non-empty string filter. `field` names the argument in errors.
    pub(crate) fn text(&mut self, key: &str, value: &str, field: &str) -> Result<()> {
        require_non_empty(value, field)?;
        self.set(key, value);
        Ok(())
    }

    /// A validated date filter.
    pub(crate) fn date(&mut self, key: &str, value: &str) -> Result<()> {
        validate_date_string(value)?;
        self.set(key, value);
        Ok(())
    }

    /// `min_key` from `start`, `max_key` from `end` when given.
    pub(crate) fn date_range(
        &mut self,
        min_key: &str,
        max_key: &str,
        start: &str,
        end: Option<&str>,
    ) -> Result<()> {
        validate_date_string(start)?;
        if let Some(end) = end {
            validate_date_string(end)?;
        }
        self.set(min_key, start);
        if let Some(end) = end {
            self.set(max_key, end);
        }
        Ok(())
    }

    /// Comma-joined list filter; at least one value is required.
    pub(crate) fn list<I, S>(&mut self, key: &str, values: I, field: &str) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let values: Vec<String> = values.into_iter().map(|v| v.as_ref().to_string()).collect();
        if values.is_empty() {
            return Err(Error::validation(
                format!("At least one {} is required", field),
                field,
            ));
        }
        self.set(key, values.join(","));
        Ok(())
    }
}

pub(crate) fn validate_radius(radius: Option<f64>) -> Result<()> {
    match radius {
        Some(r) if !(r > 0.0) => Err(Error::validation("Radius must be positive", "radius")),
        _ => Ok(()),
    }
}

/// `fields` parameter for a single lookup: explicit names win over the
/// builder's selection.
pub(crate) fn lookup_fields(explicit: &[&str], selected: &[String]) -> Vec<(String, String)> {
    if !explicit.is_empty() {
        vec![("fields".to_string(), explicit.join(","))]
    } else if !selected.is_empty() {
        vec![("fields".to_string(), selected.join(","))]
    } else {
        Vec::new()
    }
}

/// `fields` parameter only when names were given.
pub(crate) fn explicit_fields(explicit: &[&str]) -> Vec<(String, String)> {
    lookup_fields(explicit, &[])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_replace_and_collapse() {
        let mut query = Query::default();
        query.set_fields(["id"]);
        query.set_fields(["id"]);
        assert_eq!(query.fields(), ["id"]);

        query.set_fields(["id", "all", "geometry"]);
        assert_eq!(query.fields(), ["all"]);

        query.set_fields(Vec::<String>::new());
        assert!(query.fields().is_empty());
    }

    #[test]
    fn test_to_params() {
        let mut query = Query::default();
        query.limit(10).unwrap();
        query.in_bbox(-1.0, -2.0, 3.0, 4.5).unwrap();
        query.set_fields(["id", "captured_at"]);

        let params = query.to_params();
        assert!(params.contains(&("limit".into(), "10".into())));
        assert!(params.contains(&("bbox".into(), "-1,-2,3,4.5".into())));
        assert!(params.contains(&("fields".into(), "id,captured_at".into())));
    }

    #[test]
    fn test_limit_must_be_positive() {
        let mut query = Query::default();
        assert!(query.limit(0).unwrap_err().is_validation_error());
        assert!(query.filter("limit").is_none());
    }

    #[test]
    fn test_close_to_validates_before_writing() {
        let mut query = Query::default();
        assert!(query.close_to(10.0, 95.0, None).is_err());
        assert!(query.close_to(10.0, 45.0, Some(0.0)).is_err());
        assert!(query.filters().is_empty());

        query.close_to(10.0, 45.0, Some(50.0)).unwrap();
        assert_eq!(query.filter("longitude"), Some("10"));
        assert_eq!(query.filter("latitude"), Some("45"));
        assert_eq!(query.filter("radius"), Some("50"));
    }

    #[test]
    fn test_list_requires_values() {
        let mut query = Query::default();
        let err = query.list("usernames", Vec::<&str>::new(), "username").unwrap_err();
        assert!(matches!(err, Error::Validation { field, .. } if field == "username"));

        query.list("usernames", ["a", "b"], "username").unwrap();
        assert_eq!(query.filter("usernames"), Some("a,b"));
    }

    #[test]
    fn test_date_range() {
        let mut query = Query::default();
        assert!(query
            .date_range("min_captured_at", "max_captured_at", "2020", Some("soon"))
            .is_err());
        assert!(query.filters().is_empty());

        query
            .date_range("min_captured_at", "max_captured_at", "2020-01", None)
            .unwrap();
        assert_eq!(query.filter("min_captured_at"), Some("2020-01"));
        assert!(query.filter("max_captured_at").is_none());
    }

    #[test]
    fn test_lookup_fields() {
        let selected = vec!["id".to_string()];
        assert_eq!(
            lookup_fields(&["geometry"], &selected),
            vec![("fields".to_string(), "geometry".to_string())]
        );
        assert_eq!(
            lookup_fields(&[], &selected),
            vec![("fields".to_string(), "id".to_string())]
        );
        assert!(explicit_fields(&[]).is_empty());
    }
}
