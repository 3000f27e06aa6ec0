//! Overpass JSON to GeoJSON conversion.
//!
//! Nodes become `Point` features. Ways fetched with `out geom` carry
//! their own coordinates and become `LineString` features, or `Polygon`
//! features when closed and tagged as an area. Elements without usable
//! coordinates are dropped. Feature properties hold the element `type`,
//! `id`, nested `tags`, any metadata emitted by `out meta`, and `nodes`
//! for ways.

use serde_json::{json, Map, Value};

const META_KEYS: &[&str] = &["version", "timestamp", "changeset", "user", "uid"];

/// `power=*` values that describe an enclosed area when the way is closed.
const AREA_POWER_VALUES: &[&str] = &[
    "substation",
    "switchgear",
    "plant",
    "generator",
    "converter",
    "compensator",
];

/// Convert an Overpass `{"elements": [...]}` payload into a FeatureCollection.
#[must_use]
pub fn osm_to_geojson(osm: &Value) -> Value {
    let features: Vec<Value> = osm
        .get("elements")
        .and_then(Value::as_array)
        .map(|elements| elements.iter().filter_map(element_to_feature).collect())
        .unwrap_or_default();

    json!({"type": "FeatureCollection", "features": features})
}

fn element_to_feature(element: &Value) -> Option<Value> {
    let geometry = match element.get("type")?.as_str()? {
        "node" => node_geometry(element)?,
        "way" => way_geometry(element)?,
        _ => return None,
    };

    let mut properties = Map::new();
    for key in ["type", "id", "tags"] {
        if let Some(v) = element.get(key) {
            properties.insert(key.to_string(), v.clone());
        }
    }
    for key in META_KEYS {
        if let Some(v) = element.get(*key) {
            properties.insert((*key).to_string(), v.clone());
        }
    }
    if let Some(nodes) = element.get("nodes") {
        properties.insert("nodes".to_string(), nodes.clone());
    }

    Some(json!({
        "type": "Feature",
        "properties": properties,
        "geometry": geometry,
    }))
}

fn lon_lat(point: &Value) -> Option<[f64; 2]> {
    Some([point.get("lon")?.as_f64()?, point.get("lat")?.as_f64()?])
}

fn node_geometry(element: &Value) -> Option<Value> {
    let [lon, lat] = lon_lat(element)?;
    Some(json!({"type": "Point", "coordinates": [lon, lat]}))
}

fn way_geometry(element: &Value) -> Option<Value> {
    let coords: Vec<[f64; 2]> = element
        .get("geometry")?
        .as_array()?
        .iter()
        .filter_map(lon_lat)
        .collect();
    if coords.len() < 2 {
        return None;
    }

    let closed = coords.len() >= 4 && coords.first() == coords.last();
    if closed && is_area(element.get("tags")) {
        Some(json!({"type": "Polygon", "coordinates": [coords]}))
    } else {
        Some(json!({"type": "LineString", "coordinates": coords}))
    }
}

fn is_area(tags: Option<&Value>) -> bool {
    let Some(tags) = tags.and_then(Value::as_object) else {
        return false;
    };
    match tags.get("area").and_then(Value::as_str) {
        Some("no") => return false,
        Some("yes") => return true,
        _ => {}
    }
    if tags.contains_key("building") {
        return true;
    }
    tags.get("power")
        .and_then(Value::as_str)
        .is_some_and(|v| AREA_POWER_VALUES.contains(&v))
}

/// Drop internal OSM references (`nodes`, `type`) from feature properties.
#[must_use]
pub fn strip_way_properties(collection: Value) -> Value {
    let features: Vec<Value> = collection
        .get("features")
        .and_then(Value::as_array)
        .map(|features| {
            features
                .iter()
                .map(|feature| {
                    let mut props = feature
                        .get("properties")
                        .and_then(Value::as_object)
                        .cloned()
                        .unwrap_or_default();
                    props.remove("nodes");
                    props.remove("type");
                    json!({
                        "type": "Feature",
                        "properties": props,
                        "geometry": feature.get("geometry").cloned().unwrap_or(Value::Null),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    json!({"type": "FeatureCollection", "features": features})
}

#[must_use]
pub fn feature_count(collection: &Value) -> usize {
    collection
        .get("features")
        .and_then(Value::as_array)
        .map_or(0, Vec::len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_becomes_point_with_meta() {
        let osm = json!({"elements": [{
            "type": "node", "id": 42, "lat": 48.85, "lon": 2.35,
            "version": 3, "user": "mapper",
            "tags": {"power": "transformer"}
        }]});
        let fc = osm_to_geojson(&osm);
        assert_eq!(feature_count(&fc), 1);
        let feature = &fc["features"][0];
        assert_eq!(feature["geometry"]["type"], "Point");
        assert_eq!(feature["geometry"]["coordinates"], json!([2.35, 48.85]));
        assert_eq!(feature["properties"]["id"], 42);
        assert_eq!(feature["properties"]["type"], "node");
        assert_eq!(feature["properties"]["version"], 3);
        assert_eq!(feature["properties"]["tags"]["power"], "transformer");
    }

    #[test]
    fn open_way_becomes_linestring() {
        let osm = json!({"elements": [{
            "type": "way", "id": 7, "nodes": [1, 2],
            "tags": {"power": "line"},
            "geometry": [{"lat": 0.0, "lon": 0.0}, {"lat": 1.0, "lon": 1.0}]
        }]});
        let fc = osm_to_geojson(&osm);
        assert_eq!(fc["features"][0]["geometry"]["type"], "LineString");
        assert_eq!(fc["features"][0]["properties"]["nodes"], json!([1, 2]));
    }

    #[test]
    fn closed_substation_becomes_polygon() {
        let ring = json!([
            {"lat": 0.0, "lon": 0.0}, {"lat": 0.0, "lon": 1.0},
            {"lat": 1.0, "lon": 1.0}, {"lat": 0.0, "lon": 0.0}
        ]);
        let osm = json!({"elements": [{
            "type": "way", "id": 9, "tags": {"power": "substation"}, "geometry": ring
        }]});
        let fc = osm_to_geojson(&osm);
        assert_eq!(fc["features"][0]["geometry"]["type"], "Polygon");
        assert_eq!(
            fc["features"][0]["geometry"]["coordinates"][0]
                .as_array()
                .unwrap()
                .len(),
            4
        );
    }

    #[test]
    fn closed_line_stays_linestring() {
        let ring = json!([
            {"lat": 0.0, "lon": 0.0}, {"lat": 0.0, "lon": 1.0},
            {"lat": 1.0, "lon": 1.0}, {"lat": 0.0, "lon": 0.0}
        ]);
        let osm = json!({"elements": [{
            "type": "way", "id": 9, "tags": {"power": "line"}, "geometry": ring
        }]});
        assert_eq!(
            osm_to_geojson(&osm)["features"][0]["geometry"]["type"],
            "LineString"
        );
    }

    #[test]
    fn elements_without_coordinates_are_dropped() {
        let osm = json!({"elements": [
            {"type": "node", "id": 1},
            {"type": "way", "id": 2, "geometry": [{"lat": 0.0, "lon": 0.0}]},
            {"type": "relation", "id": 3}
        ]});
        assert_eq!(feature_count(&osm_to_geojson(&osm)), 0);
    }

    #[test]
    fn strip_removes_internal_references() {
        let osm = json!({"elements": [{
            "type": "way", "id": 7, "nodes": [1, 2],
            "tags": {"power": "cable"},
            "geometry": [{"lat": 0.0, "lon": 0.0}, {"lat": 1.0, "lon": 1.0}]
        }]});
        let fc = strip_way_properties(osm_to_geojson(&osm));
        let props = &fc["features"][0]["properties"];
        assert!(props.get("nodes").is_none());
        assert!(props.get("type").is_none());
        assert_eq!(props["id"], 7);
        assert_eq!(fc["features"][0]["geometry"]["type"], "LineString");
    }
}
