//! Vector tile requests.

mod common;

use mapiry::{Error, TileLayer, tile_to_bounds};
use serde_json::json;

use common::{Harness, TOKEN, header, param};

const MVT: &[u8] = &[0x1a, 0x8c, 0x01, 0x0a, 0x05, b'i', b'm', b'a', b'g', b'e'];

#[test]
fn test_layer_tile_uses_query_token() {
    let h = Harness::new();
    h.transport.push_response(
        200,
        MVT.to_vec(),
        &[("Content-Type", "application/x-protobuf")],
    );

    let bytes = h
        .client
        .vector_tiles()
        .get_tile(TileLayer::Image, 14, 2621, 6348)
        .unwrap();
    assert_eq!(bytes, MVT);

    let req = h.transport.last_request();
    assert_eq!(
        req.url.as_str(),
        "https://tiles.mapillary.com/maps/vtp/image/14/2621/6348"
    );
    assert_eq!(param(&req, "access_token"), Some(TOKEN));
    assert_eq!(header(&req, "Authorization"), None);
}

#[test]
fn test_coverage_tiles_keep_base_path() {
    let h = Harness::new();
    for _ in 0..4 {
        h.transport.push_response(200, MVT.to_vec(), &[]);
    }

    let tiles = h.client.vector_tiles();
    tiles.get_coverage_tiles(5, 1, 2, "mvt").unwrap();
    tiles.get_computed_coverage_tiles(5, 1, 2, "pbf").unwrap();
    tiles.get_map_feature_point_tiles(5, 1, 2, "mvt").unwrap();
    tiles.get_map_feature_traffic_sign_tiles(5, 1, 2, "mvt").unwrap();

    let urls: Vec<String> = h
        .transport
        .requests()
        .iter()
        .map(|r| r.url.to_string())
        .collect();
    assert_eq!(
        urls,
        vec![
            "https://tiles.mapillary.com/maps/vtp/mly1_public/2/5/1/2",
            "https://tiles.mapillary.com/maps/vtp/mly1_computed_public/2/5/1/2.pbf",
            "https://tiles.mapillary.com/maps/vtp/mly_map_feature_point/2/5/1/2",
            "https://tiles.mapillary.com/maps/vtp/mly_map_feature_traffic_sign/2/5/1/2",
        ]
    );
}

#[test]
fn test_format_extension_and_overrides() {
    let h = Harness::with_builder(|b| b.tiles_url("http://localhost:8081/vtp/"));
    h.transport.push_json(200, json!({"tile": "as json"}));

    let bytes = h
        .client
        .vector_tiles()
        .get_tile_with_format(TileLayer::TrafficSign, 3, 7, 0, "json")
        .unwrap();
    assert_eq!(
        serde_json::from_slice::<serde_json::Value>(&bytes).unwrap()["tile"],
        "as json"
    );
    assert_eq!(
        h.transport.last_request().url.as_str(),
        "http://localhost:8081/vtp/traffic_sign/3/7/0.json"
    );
}

#[test]
fn test_invalid_addresses_fail_without_request() {
    let h = Harness::new();
    let tiles = h.client.vector_tiles();

    assert!(tiles.get_image_tiles(15, 0, 0).unwrap_err().is_validation_error());
    assert!(tiles.get_sequence_tiles(1, 2, 0).is_err());
    assert!(tiles.get_overview_tiles(1, 0, 2).is_err());
    assert!(tiles.get_traffic_sign_tiles(0, 1, 0).is_err());
    assert!(tiles.get_coverage_tiles(0, 0, 0, "").is_err());
    assert_eq!(h.transport.calls(), 0);
}

#[test]
fn test_tile_helpers() {
    let h = Harness::new();
    let tiles = h.client.vector_tiles();

    assert_eq!(tiles.tile_bounds(3, 4, 2), tile_to_bounds(3, 4, 2));
    let covering = tiles
        .tiles_for_bbox(-122.151, 37.484, -122.149, 37.486, 14)
        .unwrap();
    assert_eq!(covering.len(), 1);
    assert_eq!(covering[0].z, 14);
    let bounds = covering[0].bounds();
    assert!(bounds.west <= -122.151 && bounds.east >= -122.149);

    let err = tiles.tiles_for_bbox(10.0, 10.0, 10.0001, 10.0001, 40).unwrap_err();
    assert!(matches!(err, Error::Validation { ref field, .. } if field == "zoom"));
}
