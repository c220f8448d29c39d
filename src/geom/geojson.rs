use anyhow::{anyhow, bail, Context, Result};
use geo::{Coord, LineString, MultiPolygon, Polygon};
use serde_json::{json, Value};

/// Encode a MultiPolygon as a GeoJSON geometry object.
pub fn multipolygon_to_geojson(shape: &MultiPolygon<f64>) -> String {
    let ring = |ls: &LineString<f64>| ls.coords().map(|c| vec![c.x, c.y]).collect::<Vec<_>>();

    let polygons = shape.0.iter()
        .map(|polygon| std::iter::once(ring(polygon.exterior()))
            .chain(polygon.interiors().iter().map(ring))
            .collect::<Vec<_>>())
        .collect::<Vec<_>>();

    json!({ "type": "MultiPolygon", "coordinates": polygons }).to_string()
}

/// Decode a GeoJSON `Polygon` or `MultiPolygon` geometry object.
pub fn multipolygon_from_geojson(text: &str) -> Result<MultiPolygon<f64>> {
    let value: Value = serde_json::from_str(text).context("Failed to parse GeoJSON geometry")?;
    let coords = value["coordinates"].as_array()
        .ok_or_else(|| anyhow!("GeoJSON geometry has no coordinates array"))?;

    match value["type"].as_str() {
        Some("MultiPolygon") => Ok(MultiPolygon(
            coords.iter()
                .map(|polygon| parse_polygon_coords(polygon))
                .collect::<Result<Vec<_>>>()?
        )),
        Some("Polygon") => Ok(MultiPolygon(vec![parse_polygon_coords(&value["coordinates"])?])),
        other => bail!("Unsupported GeoJSON geometry type: {:?}", other),
    }
}

/// Parse polygon coordinates: [exterior, hole, hole, ...]
fn parse_polygon_coords(value: &Value) -> Result<Polygon<f64>> {
    let rings = value.as_array()
        .ok_or_else(|| anyhow!("Invalid Polygon: coordinates must be an array of rings"))?;
    let (exterior, interiors) = rings.split_first()
        .ok_or_else(|| anyhow!("Invalid Polygon: missing exterior ring"))?;

    Ok(Polygon::new(
        parse_ring_coords(exterior)?,
        interiors.iter().map(parse_ring_coords).collect::<Result<Vec<_>>>()?,
    ))
}

/// Parse a ring (exterior or interior) from GeoJSON coordinates.
/// Format: [[x, y], [x, y], ...]
fn parse_ring_coords(value: &Value) -> Result<LineString<f64>> {
    let mut points = value.as_array()
        .ok_or_else(|| anyhow!("Invalid ring: must be an array of positions"))?
        .iter()
        .map(|position| {
            let x = position[0].as_f64().ok_or_else(|| anyhow!("Invalid coordinate: x must be a number"))?;
            let y = position[1].as_f64().ok_or_else(|| anyhow!("Invalid coordinate: y must be a number"))?;
            Ok(Coord { x, y })
        })
        .collect::<Result<Vec<_>>>()?;

    // Ensure ring is closed (first point == last point)
    if !points.is_empty() && points[0] != points[points.len() - 1] {
        points.push(points[0]);
    }

    Ok(LineString(points))
}

#[cfg(test)]
mod tests {
    use geo::{polygon, Area};

    use super::*;

    #[test]
    fn reads_polygon_with_hole() {
        let shape = multipolygon_from_geojson(r#"{
            "type": "Polygon",
            "coordinates": [
                [[0, 0], [4, 0], [4, 4], [0, 4]],
                [[1, 1], [2, 1], [2, 2], [1, 2], [1, 1]]
            ]
        }"#).unwrap();
        assert_eq!(shape.0.len(), 1);
        assert_eq!(shape.0[0].interiors().len(), 1);
        assert!((shape.unsigned_area() - 15.0).abs() < 1e-12);
    }

    #[test]
    fn writes_readable_multipolygon() {
        let shape = MultiPolygon(vec![
            polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 0.0)],
            polygon![(x: 2.0, y: 2.0), (x: 3.0, y: 2.0), (x: 3.0, y: 3.0), (x: 2.0, y: 2.0)],
        ]);
        assert_eq!(multipolygon_from_geojson(&multipolygon_to_geojson(&shape)).unwrap(), shape);
    }

    #[test]
    fn rejects_points() {
        assert!(multipolygon_from_geojson(r#"{"type": "Point", "coordinates": [1, 2]}"#).is_err());
    }
}
