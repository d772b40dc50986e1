//! Derived map artifacts: a self-contained HTML page and a shareable
//! directions link.
//!
//! Both are read-only outputs regenerated from the persisted map on every
//! save; the pipeline never reads them back.

use storymap_core::{Place, PlaceMap};

const LEAFLET_CSS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.css";
const LEAFLET_JS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.js";
const TILE_URL: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";

/// Marker colour per tag.
fn tag_color(tag: &str) -> &'static str {
    match tag {
        "landmark" => "#d63e2a",
        "attraction" => "#a23336",
        "viewpoint" => "#ff8e7f",
        "cultural" => "#0067a3",
        "natural" => "#72b026",
        "restaurant" => "#f69730",
        "cafe" => "#ffcb92",
        "bar" => "#d252b9",
        "nightlife" => "#5b396b",
        "snacks" => "#ff91ea",
        "groceries" => "#728224",
        "lodging" => "#38aadd",
        "shopping" => "#436978",
        "concert" => "#446877",
        "transit" => "#575757",
        _ => "#a3a3a3",
    }
}

/// Map centre and zoom derived from the coordinate spread.
fn view(places: &[Place]) -> (f64, f64, u32) {
    if places.is_empty() {
        return (0.0, 0.0, 2);
    }
    let lats: Vec<f64> = places.iter().map(|p| p.lat).collect();
    let lngs: Vec<f64> = places.iter().map(|p| p.lng).collect();
    let center_lat = lats.iter().sum::<f64>() / lats.len() as f64;
    let center_lng = lngs.iter().sum::<f64>() / lngs.len() as f64;

    let range = |vs: &[f64]| {
        let min = vs.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = vs.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        max - min
    };
    let spread = range(&lats).max(range(&lngs));
    let zoom = if spread > 20.0 {
        4
    } else if spread > 10.0 {
        6
    } else if spread > 5.0 {
        8
    } else if spread > 1.0 {
        10
    } else {
        12
    };
    (center_lat, center_lng, zoom)
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Render the map as a standalone HTML document.
pub fn render_html(map: &PlaceMap) -> String {
    let (center_lat, center_lng, zoom) = view(&map.places);

    let mut markers = String::new();
    for place in &map.places {
        let mut popup = format!(
            "<b>{}</b><br>Tag: {}<br>Sentiment: {}",
            escape(&place.name),
            escape(&place.tag),
            place.sentiment.as_str()
        );
        if !place.note.is_empty() {
            popup.push_str(&format!("<br>Note: {}", escape(&place.note)));
        }
        markers.push_str(&format!(
            "    L.circleMarker([{lat}, {lng}], {{radius: 8, color: '{color}', fillOpacity: 0.8}})\n      .bindPopup(\"{popup}\").addTo(map);\n",
            lat = place.lat,
            lng = place.lng,
            color = tag_color(&place.tag),
            popup = popup.replace('"', "\\\""),
        ));
    }

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>{title}</title>
  <link rel="stylesheet" href="{css}">
  <style>html, body, #map {{ height: 100%; margin: 0; }}</style>
</head>
<body>
  <div id="map"></div>
  <script src="{js}"></script>
  <script>
    const map = L.map('map').setView([{lat}, {lng}], {zoom});
    L.tileLayer('{tiles}', {{ maxZoom: 19 }}).addTo(map);
{markers}  </script>
</body>
</html>
"#,
        title = escape(&map.name),
        css = LEAFLET_CSS,
        js = LEAFLET_JS,
        lat = center_lat,
        lng = center_lng,
        zoom = zoom,
        tiles = TILE_URL,
        markers = markers,
    )
}

/// Shareable directions link over the map's places.
///
/// The first place is the destination, up to nine more become waypoints —
/// the link format caps out there. `None` for an empty map.
pub fn share_url(map: &PlaceMap) -> Option<String> {
    let first = map.places.first()?;
    let mut url = format!(
        "https://www.google.com/maps/dir/?api=1&destination={},{}",
        first.lat, first.lng
    );
    let waypoints: Vec<String> = map
        .places
        .iter()
        .skip(1)
        .take(9)
        .map(|p| format!("{},{}", p.lat, p.lng))
        .collect();
    if !waypoints.is_empty() {
        url.push_str("&waypoints=");
        url.push_str(&waypoints.join("|"));
    }
    Some(url)
}
