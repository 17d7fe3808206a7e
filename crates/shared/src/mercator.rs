//! Web Mercator math for the map preview: projection, viewport fitting, and
//! the OSM tile grid covering a viewport.

use crate::bounds::Bounds;

pub const TILE_SIZE: f64 = 256.0;

/// Zoom used when centering on a single point or degenerate geometry.
pub const POINT_ZOOM: f64 = 13.0;

/// Ceiling for bounds fitting, so tiny polygons don't over-zoom.
pub const MAX_FIT_ZOOM: f64 = 18.0;

/// Pixel margin kept around fitted bounds.
pub const FIT_PADDING_PX: f64 = 100.0;

/// Fallback view before any geometry is fitted (center of India).
pub const DEFAULT_CENTER: (f64, f64) = (20.5937, 78.9629);
pub const DEFAULT_ZOOM: f64 = 5.0;

const MAX_MERCATOR_LAT: f64 = 85.051_128_779_806_6;

/// World pixel width/height of the whole map at `zoom`.
pub fn world_size(zoom: f64) -> f64 {
    TILE_SIZE * 2f64.powf(zoom)
}

/// Project lat/lng (degrees) to world pixel coordinates at `zoom`.
pub fn project(lat: f64, lng: f64, zoom: f64) -> (f64, f64) {
    let size = world_size(zoom);
    let lat = lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT);
    let x = (lng + 180.0) / 360.0 * size;
    let sin = lat.to_radians().sin();
    let y = (0.5 - ((1.0 + sin) / (1.0 - sin)).ln() / (4.0 * std::f64::consts::PI)) * size;
    (x, y)
}

/// Inverse of [`project`].
pub fn unproject(x: f64, y: f64, zoom: f64) -> (f64, f64) {
    let size = world_size(zoom);
    let lng = x / size * 360.0 - 180.0;
    let n = std::f64::consts::PI * (1.0 - 2.0 * y / size);
    let lat = n.sinh().atan().to_degrees();
    (lat, lng)
}

/// Largest integer zoom at which `bounds`, padded on every side, fits a
/// `viewport_w` x `viewport_h` viewport. Clamped to `[0, max_zoom]`.
pub fn fit_zoom(
    bounds: &Bounds,
    viewport_w: f64,
    viewport_h: f64,
    padding_px: f64,
    max_zoom: f64,
) -> f64 {
    let avail_w = (viewport_w - 2.0 * padding_px).max(TILE_SIZE / 4.0);
    let avail_h = (viewport_h - 2.0 * padding_px).max(TILE_SIZE / 4.0);

    // Projected span at zoom 0, in world pixels.
    let (west_x, north_y) = project(bounds.north, bounds.west, 0.0);
    let (east_x, south_y) = project(bounds.south, bounds.east, 0.0);
    let span_x = (east_x - west_x).abs().max(f64::EPSILON);
    let span_y = (south_y - north_y).abs().max(f64::EPSILON);

    let zoom_x = (avail_w / span_x).log2();
    let zoom_y = (avail_h / span_y).log2();
    zoom_x.min(zoom_y).floor().clamp(0.0, max_zoom)
}

/// One tile of the grid covering a viewport, with its screen placement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TilePlacement {
    pub z: u32,
    pub x: u32,
    pub y: u32,
    /// Screen offset of the tile's top-left corner, in CSS pixels.
    pub left: f64,
    pub top: f64,
}

/// Tiles covering a `width` x `height` viewport centered on `center` at
/// `zoom`. X indices wrap around the antimeridian; Y indices outside the
/// world are dropped.
pub fn tiles_for_view(
    center: (f64, f64),
    zoom: f64,
    width: f64,
    height: f64,
) -> Vec<TilePlacement> {
    if width <= 0.0 || height <= 0.0 {
        return Vec::new();
    }
    let z = zoom.round().max(0.0) as u32;
    let tiles_per_axis = 1u64 << z;
    let (cx, cy) = project(center.0, center.1, z as f64);
    let origin_x = cx - width / 2.0;
    let origin_y = cy - height / 2.0;

    let first_x = (origin_x / TILE_SIZE).floor() as i64;
    let last_x = ((origin_x + width) / TILE_SIZE).floor() as i64;
    let first_y = (origin_y / TILE_SIZE).floor() as i64;
    let last_y = ((origin_y + height) / TILE_SIZE).floor() as i64;

    let mut tiles = Vec::new();
    for ty in first_y..=last_y {
        if ty < 0 || ty as u64 >= tiles_per_axis {
            continue;
        }
        for tx in first_x..=last_x {
            let wrapped_x = tx.rem_euclid(tiles_per_axis as i64) as u32;
            tiles.push(TilePlacement {
                z,
                x: wrapped_x,
                y: ty as u32,
                left: tx as f64 * TILE_SIZE - origin_x,
                top: ty as f64 * TILE_SIZE - origin_y,
            });
        }
    }
    tiles
}

/// Screen position of a lat/lng within a viewport centered on `center`.
pub fn latlng_to_screen(
    lat: f64,
    lng: f64,
    center: (f64, f64),
    zoom: f64,
    width: f64,
    height: f64,
) -> (f64, f64) {
    let (x, y) = project(lat, lng, zoom);
    let (cx, cy) = project(center.0, center.1, zoom);
    (x - cx + width / 2.0, y - cy + height / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_origin_is_world_center() {
        let (x, y) = project(0.0, 0.0, 0.0);
        assert!((x - 128.0).abs() < 1e-9);
        assert!((y - 128.0).abs() < 1e-9);
    }

    #[test]
    fn test_project_unproject_round_trip() {
        for &(lat, lng) in &[(8.9, 76.6), (-33.86, 151.2), (51.5, -0.12)] {
            let (x, y) = project(lat, lng, 10.0);
            let (lat2, lng2) = unproject(x, y, 10.0);
            assert!((lat - lat2).abs() < 1e-9);
            assert!((lng - lng2).abs() < 1e-9);
        }
    }

    #[test]
    fn test_project_clamps_polar_latitudes() {
        let (_, y) = project(90.0, 0.0, 0.0);
        assert!(y.is_finite());
        assert!(y >= 0.0);
    }

    #[test]
    fn test_fit_zoom_small_polygon_hits_ceiling() {
        // ~11m square: without the ceiling this would fit at zoom > 18
        let bounds = Bounds {
            south: 8.9,
            west: 76.6,
            north: 8.9001,
            east: 76.6001,
        };
        let zoom = fit_zoom(&bounds, 800.0, 384.0, FIT_PADDING_PX, MAX_FIT_ZOOM);
        assert_eq!(zoom, MAX_FIT_ZOOM);
    }

    #[test]
    fn test_fit_zoom_large_region_zooms_out() {
        // Roughly all of India
        let bounds = Bounds {
            south: 8.0,
            west: 68.0,
            north: 35.0,
            east: 97.0,
        };
        let zoom = fit_zoom(&bounds, 800.0, 384.0, FIT_PADDING_PX, MAX_FIT_ZOOM);
        assert!(zoom <= 5.0, "zoom {} too close for a subcontinent", zoom);
    }

    #[test]
    fn test_fit_zoom_monotonic_in_viewport_size() {
        let bounds = Bounds {
            south: 8.0,
            west: 76.0,
            north: 9.0,
            east: 77.0,
        };
        let small = fit_zoom(&bounds, 400.0, 300.0, FIT_PADDING_PX, MAX_FIT_ZOOM);
        let large = fit_zoom(&bounds, 1600.0, 1200.0, FIT_PADDING_PX, MAX_FIT_ZOOM);
        assert!(large >= small);
    }

    #[test]
    fn test_fit_zoom_deterministic() {
        let bounds = Bounds {
            south: 8.0,
            west: 76.0,
            north: 9.0,
            east: 77.0,
        };
        let a = fit_zoom(&bounds, 800.0, 384.0, FIT_PADDING_PX, MAX_FIT_ZOOM);
        let b = fit_zoom(&bounds, 800.0, 384.0, FIT_PADDING_PX, MAX_FIT_ZOOM);
        assert_eq!(a, b);
    }

    #[test]
    fn test_tiles_cover_viewport() {
        let tiles = tiles_for_view((8.9, 76.6), 13.0, 800.0, 384.0);
        assert!(!tiles.is_empty());
        // Every screen pixel must be covered by some tile
        let min_left = tiles.iter().map(|t| t.left).fold(f64::MAX, f64::min);
        let max_right = tiles
            .iter()
            .map(|t| t.left + TILE_SIZE)
            .fold(f64::MIN, f64::max);
        let min_top = tiles.iter().map(|t| t.top).fold(f64::MAX, f64::min);
        let max_bottom = tiles
            .iter()
            .map(|t| t.top + TILE_SIZE)
            .fold(f64::MIN, f64::max);
        assert!(min_left <= 0.0 && max_right >= 800.0);
        assert!(min_top <= 0.0 && max_bottom >= 384.0);
        for tile in &tiles {
            assert_eq!(tile.z, 13);
            assert!(tile.x < 1 << 13);
            assert!(tile.y < 1 << 13);
        }
    }

    #[test]
    fn test_tiles_empty_for_zero_viewport() {
        assert!(tiles_for_view((8.9, 76.6), 13.0, 0.0, 0.0).is_empty());
    }

    #[test]
    fn test_latlng_to_screen_center_maps_to_middle() {
        let (x, y) = latlng_to_screen(8.9, 76.6, (8.9, 76.6), 13.0, 800.0, 384.0);
        assert!((x - 400.0).abs() < 1e-9);
        assert!((y - 192.0).abs() < 1e-9);
    }

    #[test]
    fn test_latlng_to_screen_north_is_up() {
        let (_, y) = latlng_to_screen(9.0, 76.6, (8.9, 76.6), 13.0, 800.0, 384.0);
        assert!(y < 192.0);
    }
}
