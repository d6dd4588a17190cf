//! Input validation for query filters.
//!
//! Every validator either returns `Ok` or a [`Error::Validation`] naming the
//! offending argument. Nothing here is ever silently corrected.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;

use crate::error::{Error, Result};

/// Check that a latitude/longitude pair lies on the globe.
pub fn validate_coordinates(latitude: f64, longitude: f64) -> Result<()> {
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(Error::validation(
            "Latitude must be between -90 and 90",
            "latitude",
        ));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(Error::validation(
            "Longitude must be between -180 and 180",
            "longitude",
        ));
    }
    Ok(())
}

/// Check a bounding box. Both corners must be valid coordinates and the box
/// must have a strictly positive extent on both axes.
pub fn validate_bbox(west: f64, south: f64, east: f64, north: f64) -> Result<()> {
    validate_coordinates(south, west)?;
    validate_coordinates(north, east)?;

    if west >= east {
        return Err(Error::validation(
            "West longitude must be less than east longitude",
            "bbox",
        ));
    }
    if south >= north {
        return Err(Error::validation(
            "South latitude must be less than north latitude",
            "bbox",
        ));
    }
    Ok(())
}

/// Check a filter date string.
///
/// Accepted shapes: `YYYY`, `YYYY-MM`, `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM:SS`,
/// and the last one with a trailing `Z`. Calendar values are checked too, so
/// `2021-13` is rejected.
pub fn validate_date_string(date: &str) -> Result<()> {
    if is_valid_date(date) {
        Ok(())
    } else {
        Err(Error::validation(
            "Date must be in format YYYY, YYYY-MM, YYYY-MM-DD, or YYYY-MM-DDTHH:MM:SS",
            "date",
        ))
    }
}

fn is_valid_date(date: &str) -> bool {
    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());

    match date.len() {
        4 => all_digits(date),
        7 => {
            let (year, rest) = date.split_at(4);
            let Some(month) = rest.strip_prefix('-') else {
                return false;
            };
            all_digits(year)
                && all_digits(month)
                && month.parse::<u32>().is_ok_and(|m| (1..=12).contains(&m))
        }
        10 => shaped(date, "dddd-dd-dd") && NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok(),
        19 | 20 => {
            let date = date.strip_suffix('Z').unwrap_or(date);
            date.len() == 19
                && shaped(date, "dddd-dd-ddTdd:dd:dd")
                && chrono::NaiveDateTime::parse_from_str(date, "%Y-%m-%dT%H:%M:%S").is_ok()
        }
        _ => false,
    }
}

/// Match `value` against a template where `d` stands for an ASCII digit and
/// every other character must match literally.
fn shaped(value: &str, template: &str) -> bool {
    value.len() == template.len()
        && value.bytes().zip(template.bytes()).all(|(v, t)| match t {
            b'd' => v.is_ascii_digit(),
            _ => v == t,
        })
}

/// Kind of camera projection to filter images by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageType {
    /// Perspective (non-panoramic) images.
    Flat,
    /// 360° panoramas.
    Pano,
    /// Either kind.
    Both,
    /// No restriction.
    All,
}

impl ImageType {
    /// Query-string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageType::Flat => "flat",
            ImageType::Pano => "pano",
            ImageType::Both => "both",
            ImageType::All => "all",
        }
    }
}

impl fmt::Display for ImageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        validate_image_type(s)
    }
}

/// Parse an image type name, failing unless it is one of
/// `flat`, `pano`, `both` or `all`.
pub fn validate_image_type(image_type: &str) -> Result<ImageType> {
    match image_type {
        "flat" => Ok(ImageType::Flat),
        "pano" => Ok(ImageType::Pano),
        "both" => Ok(ImageType::Both),
        "all" => Ok(ImageType::All),
        _ => Err(Error::validation(
            "Image type must be one of: flat, pano, both, all",
            "image_type",
        )),
    }
}

/// A compass heading filter, either a single angle or a range in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CompassAngle {
    /// A single heading.
    Exact(f64),
    /// A heading range from `min` to `max`, clockwise.
    Range(f64, f64),
}

impl CompassAngle {
    /// Query-string form: `v` or `min,max`.
    pub fn to_query_value(&self) -> String {
        match self {
            CompassAngle::Exact(angle) => angle.to_string(),
            CompassAngle::Range(min, max) => format!("{},{}", min, max),
        }
    }
}

impl From<f64> for CompassAngle {
    fn from(angle: f64) -> Self {
        CompassAngle::Exact(angle)
    }
}

impl From<(f64, f64)> for CompassAngle {
    fn from((min, max): (f64, f64)) -> Self {
        CompassAngle::Range(min, max)
    }
}

/// Check a compass angle or range.
///
/// Angles must be in `[0, 360]`. A descending range is only accepted when it
/// wraps through north, i.e. `min > 180` and `max < 180` (`(315, 45)`).
/// Other descending ranges such as `(200, 170)` are rejected.
pub fn validate_compass_angle(angle: CompassAngle) -> Result<()> {
    let in_range = |a: f64| (0.0..=360.0).contains(&a);

    match angle {
        CompassAngle::Exact(a) => {
            if !in_range(a) {
                return Err(Error::validation(
                    "Compass angle must be between 0 and 360",
                    "compass_angle",
                ));
            }
        }
        CompassAngle::Range(min, max) => {
            if !in_range(min) || !in_range(max) {
                return Err(Error::validation(
                    "Compass angles must be between 0 and 360",
                    "compass_angle",
                ));
            }
            if min > max && !(min > 180.0 && max < 180.0) {
                return Err(Error::validation(
                    "Invalid compass angle range",
                    "compass_angle",
                ));
            }
        }
    }
    Ok(())
}

/// Fail with a validation error when an identifier or key is empty.
pub(crate) fn require_non_empty(value: &str, field: &str) -> Result<()> {
    if value.is_empty() {
        Err(Error::validation(format!("{} cannot be empty", field), field))
    } else {
        Ok(())
    }
}

/// Fail unless `value` is usable as one URL path segment: non-empty, not a
/// dot segment, and free of separators, escapes and whitespace.
pub(crate) fn require_path_segment(value: &str, field: &str) -> Result<()> {
    require_non_empty(value, field)?;
    let reserved = |c: char| {
        matches!(c, '/' | '\\' | '?' | '#' | '%') || c.is_whitespace() || c.is_control()
    };
    if value == "." || value == ".." || value.contains(reserved) {
        return Err(Error::validation(
            format!("{} must be a single path segment: {:?}", field, value),
            field,
        ));
    }
    Ok(())
}

/// Fail with a validation error when a confidence lies outside `[0, 1]`.
pub(crate) fn validate_confidence(confidence: f64, field: &str) -> Result<()> {
    if (0.0..=1.0).contains(&confidence) {
        Ok(())
    } else {
        Err(Error::validation(
            "Confidence must be between 0.0 and 1.0",
            field,
        ))
    }
}
