use geojson::{Feature, FeatureCollection, GeoJson, Geometry, Value};

/// Lat/lng span below which a bounding region is treated as a single point.
pub const DEGENERATE_EPSILON: f64 = 1e-6;

/// Axis-aligned bounding region over GeoJSON coordinates, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl Bounds {
    fn from_position(lng: f64, lat: f64) -> Self {
        Bounds {
            south: lat,
            west: lng,
            north: lat,
            east: lng,
        }
    }

    fn extend(&mut self, lng: f64, lat: f64) {
        self.south = self.south.min(lat);
        self.west = self.west.min(lng);
        self.north = self.north.max(lat);
        self.east = self.east.max(lng);
    }

    pub fn center(&self) -> (f64, f64) {
        ((self.south + self.north) / 2.0, (self.west + self.east) / 2.0)
    }

    pub fn lat_span(&self) -> f64 {
        (self.north - self.south).abs()
    }

    pub fn lng_span(&self) -> f64 {
        (self.east - self.west).abs()
    }

    /// A single point or near-zero-extent geometry: both spans below epsilon.
    pub fn is_degenerate(&self) -> bool {
        self.lat_span() < DEGENERATE_EPSILON && self.lng_span() < DEGENERATE_EPSILON
    }
}

/// Wrap any of the three GeoJSON shapes into a feature collection, so the
/// rest of the fitter only deals with one representation.
pub fn normalize(geojson: GeoJson) -> FeatureCollection {
    match geojson {
        GeoJson::FeatureCollection(fc) => fc,
        GeoJson::Feature(feature) => FeatureCollection {
            bbox: None,
            features: vec![feature],
            foreign_members: None,
        },
        GeoJson::Geometry(geometry) => FeatureCollection {
            bbox: None,
            features: vec![Feature {
                bbox: None,
                geometry: Some(geometry),
                id: None,
                properties: None,
                foreign_members: None,
            }],
            foreign_members: None,
        },
    }
}

/// Bounding region of every finite coordinate in the input, or `None` when
/// no valid coordinate exists. NaN and infinite coordinates are skipped so a
/// single malformed vertex cannot poison the fit.
pub fn bounds_of(geojson: &GeoJson) -> Option<Bounds> {
    let mut acc: Option<Bounds> = None;
    match geojson {
        GeoJson::Geometry(geometry) => accumulate_geometry(geometry, &mut acc),
        GeoJson::Feature(feature) => accumulate_feature(feature, &mut acc),
        GeoJson::FeatureCollection(fc) => {
            for feature in &fc.features {
                accumulate_feature(feature, &mut acc);
            }
        }
    }
    acc
}

fn accumulate_feature(feature: &Feature, acc: &mut Option<Bounds>) {
    if let Some(geometry) = &feature.geometry {
        accumulate_geometry(geometry, acc);
    }
}

fn accumulate_geometry(geometry: &Geometry, acc: &mut Option<Bounds>) {
    match &geometry.value {
        Value::Point(position) => accumulate_position(position, acc),
        Value::MultiPoint(positions) | Value::LineString(positions) => {
            for position in positions {
                accumulate_position(position, acc);
            }
        }
        Value::MultiLineString(lines) | Value::Polygon(lines) => {
            for line in lines {
                for position in line {
                    accumulate_position(position, acc);
                }
            }
        }
        Value::MultiPolygon(polygons) => {
            for polygon in polygons {
                for ring in polygon {
                    for position in ring {
                        accumulate_position(position, acc);
                    }
                }
            }
        }
        Value::GeometryCollection(geometries) => {
            for geometry in geometries {
                accumulate_geometry(geometry, acc);
            }
        }
    }
}

fn accumulate_position(position: &[f64], acc: &mut Option<Bounds>) {
    let (Some(&lng), Some(&lat)) = (position.first(), position.get(1)) else {
        return;
    };
    if !lng.is_finite() || !lat.is_finite() {
        return;
    }
    match acc {
        Some(bounds) => bounds.extend(lng, lat),
        None => *acc = Some(Bounds::from_position(lng, lat)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> GeoJson {
        json.parse().unwrap()
    }

    #[test]
    fn test_bounds_of_point() {
        let geo = parse(r#"{"type":"Point","coordinates":[76.6,8.9]}"#);
        let bounds = bounds_of(&geo).unwrap();
        assert_eq!(bounds.center(), (8.9, 76.6));
        assert!(bounds.is_degenerate());
    }

    #[test]
    fn test_bounds_of_polygon() {
        let geo = parse(
            r#"{"type":"Polygon","coordinates":[[[76.0,8.0],[77.0,8.0],[77.0,9.0],[76.0,9.0],[76.0,8.0]]]}"#,
        );
        let bounds = bounds_of(&geo).unwrap();
        assert_eq!(bounds.west, 76.0);
        assert_eq!(bounds.east, 77.0);
        assert_eq!(bounds.south, 8.0);
        assert_eq!(bounds.north, 9.0);
        assert!(!bounds.is_degenerate());
    }

    #[test]
    fn test_bounds_of_multi_polygon() {
        let geo = parse(
            r#"{"type":"MultiPolygon","coordinates":[
                [[[76.0,8.0],[76.1,8.0],[76.1,8.1],[76.0,8.0]]],
                [[[78.0,10.0],[78.1,10.0],[78.1,10.1],[78.0,10.0]]]
            ]}"#,
        );
        let bounds = bounds_of(&geo).unwrap();
        assert_eq!(bounds.west, 76.0);
        assert_eq!(bounds.east, 78.1);
        assert_eq!(bounds.north, 10.1);
    }

    #[test]
    fn test_bounds_of_feature_and_collection_match_geometry() {
        let geometry = r#"{"type":"Point","coordinates":[76.6,8.9]}"#;
        let feature = format!(r#"{{"type":"Feature","geometry":{},"properties":{{}}}}"#, geometry);
        let collection = format!(
            r#"{{"type":"FeatureCollection","features":[{}]}}"#,
            feature
        );
        let from_geometry = bounds_of(&parse(geometry)).unwrap();
        let from_feature = bounds_of(&parse(&feature)).unwrap();
        let from_collection = bounds_of(&parse(&collection)).unwrap();
        assert_eq!(from_geometry, from_feature);
        assert_eq!(from_feature, from_collection);
    }

    #[test]
    fn test_bounds_skips_non_finite_coordinates() {
        let geometry = Geometry::new(Value::LineString(vec![
            vec![76.0, 8.0],
            vec![f64::NAN, 8.5],
            vec![f64::INFINITY, f64::NEG_INFINITY],
            vec![77.0, 9.0],
        ]));
        let bounds = bounds_of(&GeoJson::Geometry(geometry)).unwrap();
        assert_eq!(bounds.west, 76.0);
        assert_eq!(bounds.east, 77.0);
        assert!(bounds.north.is_finite() && bounds.south.is_finite());
    }

    #[test]
    fn test_bounds_all_invalid_is_none() {
        let geometry = Geometry::new(Value::Point(vec![f64::NAN, f64::NAN]));
        assert!(bounds_of(&GeoJson::Geometry(geometry)).is_none());
    }

    #[test]
    fn test_bounds_of_empty_collection_is_none() {
        let geo = parse(r#"{"type":"FeatureCollection","features":[]}"#);
        assert!(bounds_of(&geo).is_none());
    }

    #[test]
    fn test_two_coincident_points_are_degenerate() {
        let geo = parse(
            r#"{"type":"MultiPoint","coordinates":[[76.6,8.9],[76.6,8.9]]}"#,
        );
        assert!(bounds_of(&geo).unwrap().is_degenerate());
    }

    #[test]
    fn test_near_zero_extent_polygon_is_degenerate() {
        let geo = parse(
            r#"{"type":"Polygon","coordinates":[[[76.6,8.9],[76.6000001,8.9],[76.6,8.9000001],[76.6,8.9]]]}"#,
        );
        assert!(bounds_of(&geo).unwrap().is_degenerate());
    }

    #[test]
    fn test_normalize_wraps_all_shapes() {
        let geometry = parse(r#"{"type":"Point","coordinates":[76.6,8.9]}"#);
        let fc = normalize(geometry);
        assert_eq!(fc.features.len(), 1);
        assert!(fc.features[0].geometry.is_some());

        let feature = parse(
            r#"{"type":"Feature","geometry":{"type":"Point","coordinates":[0.0,0.0]},"properties":{}}"#,
        );
        assert_eq!(normalize(feature).features.len(), 1);

        let collection = parse(
            r#"{"type":"FeatureCollection","features":[
                {"type":"Feature","geometry":{"type":"Point","coordinates":[1.0,1.0]},"properties":{}},
                {"type":"Feature","geometry":{"type":"Point","coordinates":[2.0,2.0]},"properties":{}}
            ]}"#,
        );
        assert_eq!(normalize(collection).features.len(), 2);
    }

    #[test]
    fn test_geometry_collection_bounds() {
        let geo = parse(
            r#"{"type":"GeometryCollection","geometries":[
                {"type":"Point","coordinates":[76.0,8.0]},
                {"type":"Point","coordinates":[77.0,9.0]}
            ]}"#,
        );
        let bounds = bounds_of(&geo).unwrap();
        assert_eq!(bounds.center(), (8.5, 76.5));
    }
}
