use dioxus::prelude::*;
use geojson::{GeoJson, Value as GeomValue};
use gloo_timers::future::TimeoutFuture;

use gis_portal_shared::bounds::normalize;
use gis_portal_shared::fit::{FitAction, FitMachine, MapView};
use gis_portal_shared::mercator::{latlng_to_screen, tiles_for_view, DEFAULT_CENTER, DEFAULT_ZOOM};

const MAP_CONTAINER_ID: &str = "feature-map-container";

/// Used until the real container size is known.
const FALLBACK_SIZE: (f64, f64) = (800.0, 384.0);

const TILE_URL: &str = "https://tile.openstreetmap.org";

// ---------------------------------------------------------------------------
// DOM helpers
// ---------------------------------------------------------------------------

fn container_size() -> Option<(f64, f64)> {
    let document = web_sys::window()?.document()?;
    let element = document.get_element_by_id(MAP_CONTAINER_ID)?;
    let rect = element.get_bounding_client_rect();
    Some((rect.width(), rect.height()))
}

// ---------------------------------------------------------------------------
// SVG overlay builder (pure, easily testable)
// ---------------------------------------------------------------------------

struct Projection {
    center: (f64, f64),
    zoom: f64,
    width: f64,
    height: f64,
}

impl Projection {
    fn screen(&self, lng: f64, lat: f64) -> (f64, f64) {
        latlng_to_screen(lat, lng, self.center, self.zoom, self.width, self.height)
    }
}

fn push_point(svg: &mut String, proj: &Projection, position: &[f64]) {
    if position.len() < 2 {
        return;
    }
    let (x, y) = proj.screen(position[0], position[1]);
    svg.push_str(&format!(
        r##"<circle cx="{x:.1}" cy="{y:.1}" r="6" fill="#dc2626" stroke="white" stroke-width="2"/>"##
    ));
}

fn path_data(proj: &Projection, line: &[Vec<f64>], close: bool) -> String {
    let mut d = String::new();
    for (i, position) in line.iter().enumerate() {
        if position.len() < 2 {
            continue;
        }
        let (x, y) = proj.screen(position[0], position[1]);
        if i == 0 {
            d.push_str(&format!("M{x:.1},{y:.1}"));
        } else {
            d.push_str(&format!(" L{x:.1},{y:.1}"));
        }
    }
    if close && !d.is_empty() {
        d.push_str(" Z");
    }
    d
}

fn push_line(svg: &mut String, proj: &Projection, line: &[Vec<f64>]) {
    let d = path_data(proj, line, false);
    if !d.is_empty() {
        svg.push_str(&format!(
            r##"<path d="{d}" fill="none" stroke="#2563eb" stroke-width="3"/>"##
        ));
    }
}

fn push_polygon(svg: &mut String, proj: &Projection, rings: &[Vec<Vec<f64>>]) {
    let mut d = String::new();
    for ring in rings {
        let part = path_data(proj, ring, true);
        if !part.is_empty() {
            if !d.is_empty() {
                d.push(' ');
            }
            d.push_str(&part);
        }
    }
    if !d.is_empty() {
        svg.push_str(&format!(
            r##"<path d="{d}" fill="rgba(37,99,235,0.2)" stroke="#2563eb" stroke-width="2" fill-rule="evenodd"/>"##
        ));
    }
}

fn push_geometry(svg: &mut String, proj: &Projection, value: &GeomValue) {
    match value {
        GeomValue::Point(position) => push_point(svg, proj, position),
        GeomValue::MultiPoint(positions) => {
            for position in positions {
                push_point(svg, proj, position);
            }
        }
        GeomValue::LineString(line) => push_line(svg, proj, line),
        GeomValue::MultiLineString(lines) => {
            for line in lines {
                push_line(svg, proj, line);
            }
        }
        GeomValue::Polygon(rings) => push_polygon(svg, proj, rings),
        GeomValue::MultiPolygon(polygons) => {
            for rings in polygons {
                push_polygon(svg, proj, rings);
            }
        }
        GeomValue::GeometryCollection(geometries) => {
            for geometry in geometries {
                push_geometry(svg, proj, &geometry.value);
            }
        }
    }
}

/// Build the geometry overlay as a standalone SVG document string.
fn build_overlay_svg(
    geometry: &GeoJson,
    center: (f64, f64),
    zoom: f64,
    width: f64,
    height: f64,
) -> String {
    let proj = Projection {
        center,
        zoom,
        width,
        height,
    };
    let collection = normalize(geometry.clone());
    let mut svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}" style="position:absolute;top:0;left:0;pointer-events:none;z-index:2;">"#
    );
    for feature in &collection.features {
        if let Some(geometry) = &feature.geometry {
            push_geometry(&mut svg, &proj, &geometry.value);
        }
    }
    svg.push_str("</svg>");
    svg
}

// ---------------------------------------------------------------------------
// Component
// ---------------------------------------------------------------------------

/// Map preview for one feature's geometry, rendered as an OpenStreetMap tile
/// grid with an SVG overlay. `geometry` is the raw GeoJSON value from the
/// API (`Null` when the feature has none). The viewport fit runs as a driver
/// loop around [`FitMachine`]: measure the container, feed the size in,
/// sleep for whatever delay the machine requests. The parent must remount
/// this component (via `key`) when the geometry changes; the old driver
/// future is dropped with the old instance.
#[component]
pub fn FeatureMap(geometry: serde_json::Value, name: String) -> Element {
    let parsed: Option<GeoJson> = serde_json::from_value(geometry.clone()).ok();

    let mut view = use_signal(|| None::<MapView>);
    let mut size = use_signal(|| FALLBACK_SIZE);

    let driver_geometry = use_hook(|| parsed.clone());
    use_future(move || {
        let geo = driver_geometry.clone();
        async move {
            let Some(geo) = geo else {
                view.set(Some(MapView::Empty));
                return;
            };
            let mut machine = FitMachine::new(geo);
            loop {
                let measured = container_size();
                match machine.on_measure(measured) {
                    FitAction::RetryAfter { delay_ms } => {
                        TimeoutFuture::new(delay_ms).await;
                    }
                    FitAction::Apply {
                        view: fitted,
                        settle_ms,
                    } => {
                        if let Some(s) = measured {
                            size.set(s);
                        }
                        view.set(Some(fitted));
                        TimeoutFuture::new(settle_ms).await;
                    }
                    FitAction::Done { view: fitted } => {
                        if let Some(s) = measured {
                            if s.0 > 0.0 && s.1 > 0.0 {
                                size.set(s);
                            }
                        }
                        view.set(Some(fitted));
                        break;
                    }
                }
            }
        }
    });

    let current_view = *view.read();
    let (width, height) = *size.read();

    if parsed.is_none() || current_view == Some(MapView::Empty) {
        return rsx! {
            div { class: "map-placeholder",
                p { class: "muted", "No geometry available for this feature." }
            }
        };
    }

    // Until the fit lands, show the default India view.
    let (center, zoom) = match current_view {
        Some(v) => match (v.center(), v.zoom()) {
            (Some(center), Some(zoom)) => (center, zoom),
            _ => (DEFAULT_CENTER, DEFAULT_ZOOM),
        },
        None => (DEFAULT_CENTER, DEFAULT_ZOOM),
    };
    // Tiles only exist at integer zoom; the overlay must project at the same
    // level or it drifts off the raster.
    let tile_zoom = zoom.round().clamp(0.0, 19.0);
    let tiles = tiles_for_view(center, tile_zoom, width, height);
    let overlay = parsed
        .as_ref()
        .map(|geo| build_overlay_svg(geo, center, tile_zoom, width, height))
        .unwrap_or_default();

    rsx! {
        div { class: "map-frame",
            div { id: MAP_CONTAINER_ID, class: "map-container",
                for tile in tiles {
                    img {
                        key: "{tile.z}-{tile.x}-{tile.y}",
                        class: "map-tile",
                        src: "{TILE_URL}/{tile.z}/{tile.x}/{tile.y}.png",
                        style: "left: {tile.left}px; top: {tile.top}px;",
                        draggable: "false",
                        alt: "",
                    }
                }
                div {
                    dangerous_inner_html: "{overlay}",
                    style: "position:absolute;top:0;left:0;width:100%;height:100%;pointer-events:none;",
                }
                div { class: "map-attribution", "© OpenStreetMap contributors" }
            }
            p { class: "map-caption", "{name}" }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proj() -> Projection {
        Projection {
            center: (8.5, 76.5),
            zoom: 13.0,
            width: 800.0,
            height: 384.0,
        }
    }

    #[test]
    fn test_center_point_lands_mid_viewport() {
        let p = proj();
        let (x, y) = p.screen(76.5, 8.5);
        assert!((x - 400.0).abs() < 1e-6);
        assert!((y - 192.0).abs() < 1e-6);
    }

    #[test]
    fn test_point_overlay_draws_circle_at_center() {
        let geo: GeoJson = r#"{"type":"Point","coordinates":[76.5,8.5]}"#.parse().unwrap();
        let svg = build_overlay_svg(&geo, (8.5, 76.5), 13.0, 800.0, 384.0);
        assert!(svg.contains(r#"cx="400.0""#));
        assert!(svg.contains(r#"cy="192.0""#));
    }

    #[test]
    fn test_polygon_overlay_is_closed_path() {
        let geo: GeoJson = r#"{"type":"Polygon","coordinates":[[[76.0,8.0],[77.0,8.0],[77.0,9.0],[76.0,9.0],[76.0,8.0]]]}"#
            .parse()
            .unwrap();
        let svg = build_overlay_svg(&geo, (8.5, 76.5), 10.0, 800.0, 384.0);
        assert!(svg.contains("<path"));
        assert!(svg.contains(" Z"));
        assert!(svg.contains("fill-rule=\"evenodd\""));
    }

    #[test]
    fn test_linestring_overlay_is_open_path() {
        let geo: GeoJson = r#"{"type":"LineString","coordinates":[[76.0,8.0],[77.0,9.0]]}"#
            .parse()
            .unwrap();
        let svg = build_overlay_svg(&geo, (8.5, 76.5), 10.0, 800.0, 384.0);
        assert!(svg.contains("<path"));
        assert!(!svg.contains(" Z"));
        assert!(svg.contains(r#"fill="none""#));
    }

    #[test]
    fn test_feature_wrapper_renders_same_as_bare_geometry() {
        let bare: GeoJson = r#"{"type":"Point","coordinates":[76.5,8.5]}"#.parse().unwrap();
        let wrapped: GeoJson =
            r#"{"type":"Feature","properties":{},"geometry":{"type":"Point","coordinates":[76.5,8.5]}}"#
                .parse()
                .unwrap();
        assert_eq!(
            build_overlay_svg(&bare, (8.5, 76.5), 13.0, 800.0, 384.0),
            build_overlay_svg(&wrapped, (8.5, 76.5), 13.0, 800.0, 384.0)
        );
    }

    #[test]
    fn test_short_positions_are_skipped() {
        let mut svg = String::new();
        push_point(&mut svg, &proj(), &[76.5]);
        assert!(svg.is_empty());
    }
}
