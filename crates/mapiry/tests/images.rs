//! Image queries end to end against the mock transport.

mod common;

use std::time::Duration;

use mapiry::{CompassAngle, Error, ThumbnailSize};
use serde_json::json;

use common::{Harness, envelope, header, param};

#[test]
fn test_get_sends_filters_and_parses_page() {
    let h = Harness::new();
    h.transport.push_json(
        200,
        json!({
            "features": [
                {
                    "type": "Feature",
                    "geometry": {"type": "Point", "coordinates": [-122.15, 37.485]},
                    "properties": {"id": "1", "captured_at": 1617235200000i64, "is_pano": true}
                },
                {
                    "type": "Feature",
                    "geometry": null,
                    "properties": {"id": "2", "captured_at": "2021-04-01T00:00:00.123Z"}
                }
            ],
            "has_more": true,
            "next_cursor": "c2"
        }),
    );

    let page = h
        .client
        .images()
        .in_bbox(-122.151, 37.484, -122.149, 37.486)
        .unwrap()
        .panoramic_only()
        .compass_angle(CompassAngle::Range(315.0, 45.0))
        .unwrap()
        .fields(["id", "captured_at", "is_pano"])
        .limit(2)
        .unwrap()
        .get()
        .unwrap();

    let req = h.transport.last_request();
    assert_eq!(req.url.as_str(), "https://graph.mapillary.com/images");
    assert_eq!(param(&req, "bbox"), Some("-122.151,37.484,-122.149,37.486"));
    assert_eq!(param(&req, "image_type"), Some("pano"));
    assert_eq!(param(&req, "compass_angle"), Some("315,45"));
    assert_eq!(param(&req, "fields"), Some("id,captured_at,is_pano"));
    assert_eq!(param(&req, "limit"), Some("2"));

    assert_eq!(page.len(), 2);
    assert_eq!(page.total_count, 2);
    assert!(page.has_more);
    assert_eq!(page.next_cursor.as_deref(), Some("c2"));
    assert_eq!(page.data[0].geometry.as_ref().unwrap().point(), Some((-122.15, 37.485)));
    assert_eq!(page.data[0].is_pano, Some(true));
    assert!(page.data[0].captured_at.is_some());
    assert!(page.data[1].geometry.is_none());
    assert!(page.data[1].captured_at.is_some());
}

#[test]
fn test_empty_page() {
    let h = Harness::new();
    h.transport.push_json(200, envelope(vec![]));

    let page = h.client.images().get().unwrap();
    assert!(page.data.is_empty());
    assert_eq!(page.total_count, 0);
    assert!(!page.has_more);
}

#[test]
fn test_accessor_returns_fresh_builder() {
    let h = Harness::new();
    h.transport.push_json(200, envelope(vec![]));
    h.transport.push_json(200, envelope(vec![]));

    h.client
        .images()
        .in_bbox(0.0, 0.0, 1.0, 1.0)
        .unwrap()
        .get()
        .unwrap();
    h.client.images().limit(5).unwrap().get().unwrap();

    let requests = h.transport.requests();
    assert_eq!(param(&requests[0], "bbox"), Some("0,0,1,1"));
    assert_eq!(param(&requests[1], "bbox"), None);
    assert_eq!(param(&requests[1], "limit"), Some("5"));
}

#[test]
fn test_reusing_a_builder_repeats_its_filters() {
    let h = Harness::new();
    h.transport.push_json(200, envelope(vec![]));
    h.transport.push_json(200, envelope(vec![]));

    let query = h.client.images().by_organization("org1").unwrap();
    query.get().unwrap();
    query.get().unwrap();

    for req in h.transport.requests() {
        assert_eq!(param(&req, "organization_id"), Some("org1"));
    }
}

#[test]
fn test_get_by_id_fields() {
    let h = Harness::new();
    h.transport.push_json(
        200,
        json!({
            "id": "42",
            "camera_make": "Sony",
            "geometry": {"type": "Point", "coordinates": [1.0, 2.0]}
        }),
    );
    h.transport.push_json(200, json!({"id": "42"}));
    h.transport.push_json(200, json!({"id": "42"}));

    let images = h.client.images().fields(["id", "camera_make"]);
    let image = images.get_by_id("42", &[]).unwrap();
    assert_eq!(image.id, "42");
    assert_eq!(image.camera_make.as_deref(), Some("Sony"));
    assert_eq!(image.geometry.unwrap().point(), Some((1.0, 2.0)));

    images.get_by_id("42", &["altitude"]).unwrap();
    h.client.images().get_by_id("42", &[]).unwrap();

    let requests = h.transport.requests();
    assert_eq!(requests[0].url.as_str(), "https://graph.mapillary.com/42");
    assert_eq!(param(&requests[0], "fields"), Some("id,camera_make"));
    assert_eq!(param(&requests[1], "fields"), Some("altitude"));
    assert_eq!(param(&requests[2], "fields"), None);
}

#[test]
fn test_get_by_id_empty_fails_without_request() {
    let h = Harness::new();
    let err = h.client.images().get_by_id("", &[]).unwrap_err();
    match err {
        Error::Validation { field, .. } => assert_eq!(field, "image_id"),
        other => panic!("expected validation error, got {other:?}"),
    }
    assert_eq!(h.transport.calls(), 0);
}

#[test]
fn test_ids_cannot_escape_their_path_segment() {
    let h = Harness::new();
    let images = h.client.images();

    let err = images
        .get_by_id("123?fields=thumb_original_url&x=", &["id"])
        .unwrap_err();
    assert!(matches!(err, Error::Validation { ref field, .. } if field == "image_id"));

    let err = images.get_detections("../me/organizations", &[]).unwrap_err();
    assert!(matches!(err, Error::Validation { ref field, .. } if field == "image_id"));

    assert!(images.download_image("1#top", ThumbnailSize::Thumb256).is_err());
    assert_eq!(h.transport.calls(), 0);

    h.transport.push_json(200, json!({"id": "123"}));
    let image = images.get_by_id("123", &["id"]).unwrap();
    assert_eq!(image.id, "123");
    let req = h.transport.last_request();
    assert_eq!(req.url.as_str(), "https://graph.mapillary.com/123");
    assert_eq!(param(&req, "fields"), Some("id"));
    assert_eq!(req.query.len(), 1);
}

#[test]
fn test_invalid_filter_fails_without_request() {
    let h = Harness::new();
    assert!(h.client.images().close_to(200.0, 0.0, None).is_err());
    assert!(h.client.images().captured_between("2021-02-30", None).is_err());
    assert_eq!(h.transport.calls(), 0);
}

#[test]
fn test_download_image() {
    let h = Harness::new();
    h.transport.push_json(
        200,
        json!({"id": "7", "thumb_1024_url": "https://scontent.example.com/t/7.jpg?sig=abc&exp=1"}),
    );
    h.transport
        .push_response(200, b"\xff\xd8\xff\xe0jpeg".to_vec(), &[("Content-Type", "image/jpeg")]);

    let bytes = h
        .client
        .images()
        .download_image("7", ThumbnailSize::Thumb1024)
        .unwrap();
    assert_eq!(bytes, b"\xff\xd8\xff\xe0jpeg".to_vec());

    let requests = h.transport.requests();
    assert_eq!(param(&requests[0], "fields"), Some("thumb_1024_url"));

    let fetch = &requests[1];
    assert_eq!(
        fetch.url.as_str(),
        "https://scontent.example.com/t/7.jpg?sig=abc&exp=1"
    );
    assert!(fetch.query.is_empty());
    assert_eq!(header(fetch, "Authorization"), None);
}

#[test]
fn test_download_image_missing_size() {
    let h = Harness::new();
    h.transport.push_json(200, json!({"id": "7"}));

    let err = h
        .client
        .images()
        .download_image("7", ThumbnailSize::Original)
        .unwrap_err();
    assert!(err.is_validation_error());
    assert!(err.to_string().contains("thumb_original_url"));
    assert_eq!(h.transport.calls(), 1);
}

#[test]
fn test_get_detections() {
    let h = Harness::new();
    h.transport.push_json(
        200,
        envelope(vec![json!({
            "properties": {"id": "d1", "confidence": 0.87, "object_value": "object--bench"},
            "geometry": {"type": "Polygon", "coordinates": [[[0.1, 0.1], [0.2, 0.1], [0.2, 0.2]]]}
        })]),
    );

    let page = h.client.images().get_detections("42", &["id", "value"]).unwrap();
    assert_eq!(page.data[0].confidence, Some(0.87));

    let req = h.transport.last_request();
    assert_eq!(req.url.as_str(), "https://graph.mapillary.com/42/detections");
    assert_eq!(param(&req, "fields"), Some("id,value"));
}

#[test]
fn test_no_sleep_on_validation() {
    let h = Harness::new();
    let _ = h.client.images().get_detections("", &[]);
    assert_eq!(h.transport.calls(), 0);
    assert_eq!(h.sleeper.slept(), Vec::<Duration>::new());
}
