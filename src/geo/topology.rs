use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::feature::{CountryFeature, Geometry, LonLat, Ring};

pub(super) fn parse_features(raw: &str, object: Option<&str>) -> Result<Vec<CountryFeature>> {
    let parsed: Value = serde_json::from_str(raw).context("invalid topology JSON")?;
    let kind = parsed
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("topology document has no \"type\" member"))?
        .to_owned();

    let features = match kind.as_str() {
        "FeatureCollection" => {
            let items = parsed
                .get("features")
                .and_then(Value::as_array)
                .ok_or_else(|| anyhow!("FeatureCollection without a features array"))?;
            items.iter().filter_map(geojson_feature).collect::<Vec<_>>()
        }
        "Feature" => geojson_feature(&parsed).into_iter().collect(),
        "Topology" => topojson_features(parsed, object)?,
        other => return Err(anyhow!("unsupported topology type {other:?}")),
    };

    if features.is_empty() {
        Err(anyhow!("topology contained no polygon features"))
    } else {
        debug!(count = features.len(), kind = kind.as_str(), "parsed topology features");
        Ok(features)
    }
}

fn feature_id(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn feature_properties(value: Option<&Value>) -> Map<String, Value> {
    match value {
        Some(Value::Object(properties)) => properties.clone(),
        _ => Map::new(),
    }
}

fn geojson_feature(value: &Value) -> Option<CountryFeature> {
    let id = feature_id(value.get("id"));
    let properties = feature_properties(value.get("properties"));
    let geometry = value.get("geometry").and_then(geojson_geometry);

    match geometry {
        Some(geometry) => Some(CountryFeature::new(id, properties, geometry)),
        None => {
            let name = properties.get("name").and_then(|name| name.as_str()).unwrap_or("-");
            warn!(
                id = id.as_deref().unwrap_or("-"),
                name,
                "skipping feature without polygon geometry"
            );
            None
        }
    }
}

fn geojson_geometry(value: &Value) -> Option<Geometry> {
    let coordinates = value.get("coordinates")?;
    match value.get("type")?.as_str()? {
        "Polygon" => polygon_rings(coordinates).map(Geometry::Polygon),
        "MultiPolygon" => coordinates
            .as_array()?
            .iter()
            .map(polygon_rings)
            .collect::<Option<Vec<_>>>()
            .map(Geometry::MultiPolygon),
        _ => None,
    }
}

fn polygon_rings(value: &Value) -> Option<Vec<Ring>> {
    let rings = value
        .as_array()?
        .iter()
        .map(|ring| ring.as_array()?.iter().map(position).collect::<Option<Ring>>())
        .collect::<Option<Vec<_>>>()?;
    if rings.first().is_some_and(|exterior| exterior.len() >= 3) {
        Some(rings)
    } else {
        None
    }
}

fn position(value: &Value) -> Option<LonLat> {
    let coordinates = value.as_array()?;
    let lon = coordinates.first()?.as_f64()?;
    let lat = coordinates.get(1)?.as_f64()?;
    (lon.is_finite() && lat.is_finite()).then_some([lon, lat])
}

#[derive(Debug, Deserialize)]
struct Topology {
    #[serde(default)]
    transform: Option<TopologyTransform>,
    #[serde(default)]
    arcs: Vec<Vec<Vec<f64>>>,
    objects: Map<String, Value>,
}

#[derive(Clone, Copy, Debug, Deserialize)]
struct TopologyTransform {
    scale: [f64; 2],
    translate: [f64; 2],
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum TopoGeometry {
    Polygon {
        arcs: Vec<Vec<i64>>,
        #[serde(default)]
        id: Option<Value>,
        #[serde(default)]
        properties: Option<Value>,
    },
    MultiPolygon {
        arcs: Vec<Vec<Vec<i64>>>,
        #[serde(default)]
        id: Option<Value>,
        #[serde(default)]
        properties: Option<Value>,
    },
}

fn topojson_features(parsed: Value, object: Option<&str>) -> Result<Vec<CountryFeature>> {
    let topology = Topology::deserialize(parsed).context("invalid TopoJSON topology")?;
    let arcs = decode_arcs(&topology.arcs, topology.transform);

    let (object_name, object_value) = match object {
        Some(name) => topology
            .objects
            .get(name)
            .map(|value| (name, value))
            .ok_or_else(|| anyhow!("TopoJSON object {name:?} not found"))?,
        None => topology
            .objects
            .iter()
            .next()
            .map(|(name, value)| (name.as_str(), value))
            .ok_or_else(|| anyhow!("TopoJSON topology has no objects"))?,
    };
    debug!(object = object_name, "decoding TopoJSON object");

    let geometries = match object_value.get("type").and_then(Value::as_str) {
        Some("GeometryCollection") => object_value
            .get("geometries")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default(),
        _ => vec![object_value.clone()],
    };

    let features = geometries
        .into_iter()
        .filter_map(|geometry| {
            let parsed = match TopoGeometry::deserialize(&geometry) {
                Ok(parsed) => parsed,
                Err(error) => {
                    warn!(%error, "skipping unsupported TopoJSON geometry");
                    return None;
                }
            };
            topo_feature(parsed, &arcs)
        })
        .collect();

    Ok(features)
}

fn topo_feature(geometry: TopoGeometry, arcs: &[Vec<LonLat>]) -> Option<CountryFeature> {
    let (geometry, id, properties) = match geometry {
        TopoGeometry::Polygon {
            arcs: rings,
            id,
            properties,
        } => (
            topo_polygon(&rings, arcs).map(Geometry::Polygon),
            id,
            properties,
        ),
        TopoGeometry::MultiPolygon {
            arcs: polygons,
            id,
            properties,
        } => {
            let polygons = polygons
                .iter()
                .filter_map(|rings| topo_polygon(rings, arcs))
                .collect::<Vec<_>>();
            let geometry = (!polygons.is_empty()).then_some(Geometry::MultiPolygon(polygons));
            (geometry, id, properties)
        }
    };

    let id = feature_id(id.as_ref());
    let Some(geometry) = geometry else {
        warn!(id = id.as_deref().unwrap_or("-"), "skipping TopoJSON geometry with broken arcs");
        return None;
    };
    Some(CountryFeature::new(
        id,
        feature_properties(properties.as_ref()),
        geometry,
    ))
}

fn topo_polygon(rings: &[Vec<i64>], arcs: &[Vec<LonLat>]) -> Option<Vec<Ring>> {
    let rings = rings
        .iter()
        .map(|indices| stitch_ring(indices, arcs))
        .collect::<Option<Vec<_>>>()?;
    rings
        .first()
        .is_some_and(|exterior| exterior.len() >= 3)
        .then_some(rings)
}

fn decode_arcs(arcs: &[Vec<Vec<f64>>], transform: Option<TopologyTransform>) -> Vec<Vec<LonLat>> {
    arcs.iter()
        .map(|arc| {
            let mut x = 0.0;
            let mut y = 0.0;
            arc.iter()
                .filter(|point| point.len() >= 2)
                .map(|point| match transform {
                    Some(transform) => {
                        x += point[0];
                        y += point[1];
                        [
                            x * transform.scale[0] + transform.translate[0],
                            y * transform.scale[1] + transform.translate[1],
                        ]
                    }
                    None => [point[0], point[1]],
                })
                .collect()
        })
        .collect()
}

/// Joins arcs into one ring. Negative indices (`!i`) walk arc `i` backwards;
/// each arc's first point duplicates the previous arc's last point.
fn stitch_ring(indices: &[i64], arcs: &[Vec<LonLat>]) -> Option<Ring> {
    let mut ring: Ring = Vec::new();
    for &index in indices {
        let (arc_index, reversed) = if index < 0 {
            (!index, true)
        } else {
            (index, false)
        };
        let arc = arcs.get(usize::try_from(arc_index).ok()?)?;

        ring.pop();
        if reversed {
            ring.extend(arc.iter().rev().copied());
        } else {
            ring.extend(arc.iter().copied());
        }
    }
    (!ring.is_empty()).then_some(ring)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GEOJSON: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "id": 250,
                "properties": { "name": "France", "iso_a3": "FRA" },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[0, 0], [5, 0], [5, 5], [0, 5], [0, 0]]]
                }
            },
            {
                "type": "Feature",
                "properties": { "name": "Broken" },
                "geometry": { "type": "Point", "coordinates": [1, 1] }
            },
            {
                "type": "Feature",
                "properties": { "name": "Islands" },
                "geometry": {
                    "type": "MultiPolygon",
                    "coordinates": [
                        [[[10, 10], [11, 10], [11, 11], [10, 10]]],
                        [[[12, 12], [13, 12], [13, 13], [12, 12]]]
                    ]
                }
            }
        ]
    }"#;

    #[test]
    fn geojson_skips_non_polygon_features() {
        let features = parse_features(GEOJSON, None).expect("valid collection");
        assert_eq!(features.len(), 2);
        assert_eq!(features[0].id.as_deref(), Some("250"));
        assert_eq!(features[0].name(), Some("France"));
        assert_eq!(features[1].geometry.polygons().len(), 2);
    }

    #[test]
    fn topojson_decodes_quantized_shared_arcs() {
        let raw = r#"{
            "type": "Topology",
            "transform": { "scale": [0.5, 0.5], "translate": [-10, -10] },
            "arcs": [
                [[0, 0], [10, 0], [0, 10]],
                [[10, 10], [-10, 0], [0, -10]]
            ],
            "objects": {
                "countries": {
                    "type": "GeometryCollection",
                    "geometries": [
                        { "type": "Polygon", "arcs": [[0, 1]], "id": "004", "properties": { "name": "Square" } },
                        { "type": "Polygon", "arcs": [[-2, -1]], "id": "008" },
                        { "type": "LineString", "arcs": [0] }
                    ]
                }
            }
        }"#;

        let features = parse_features(raw, Some("countries")).expect("valid topology");
        assert_eq!(features.len(), 2);

        let Geometry::Polygon(rings) = &features[0].geometry else {
            panic!("expected polygon");
        };
        assert_eq!(
            rings[0],
            vec![[-10.0, -10.0], [-5.0, -10.0], [-5.0, -5.0], [-10.0, -5.0], [-10.0, -10.0]]
        );
        assert_eq!(features[0].numeric_id(), Some(4));

        let Geometry::Polygon(reversed) = &features[1].geometry else {
            panic!("expected polygon");
        };
        let mut expected = rings[0].clone();
        expected.reverse();
        assert_eq!(reversed[0], expected);
    }

    #[test]
    fn topojson_defaults_to_the_first_object_in_document_order() {
        let raw = r#"{
            "type": "Topology",
            "arcs": [[[0, 0], [4, 0], [4, 4], [0, 0]]],
            "objects": {
                "zcountries": {
                    "type": "GeometryCollection",
                    "geometries": [{ "type": "Polygon", "arcs": [[0]], "properties": { "name": "Tri" } }]
                },
                "aland": { "type": "GeometryCollection", "geometries": [] }
            }
        }"#;

        let features = parse_features(raw, None).expect("first object has a polygon");
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].name(), Some("Tri"));
    }

    #[test]
    fn unknown_topojson_object_is_an_error() {
        let raw = r#"{ "type": "Topology", "arcs": [], "objects": { "land": { "type": "GeometryCollection", "geometries": [] } } }"#;
        assert!(parse_features(raw, Some("countries")).is_err());
        assert!(parse_features(raw, None).is_err());
    }

    #[test]
    fn rejects_unknown_document_types() {
        assert!(parse_features(r#"{ "type": "GeometryCollection" }"#, None).is_err());
        assert!(parse_features("not json", None).is_err());
    }
}
