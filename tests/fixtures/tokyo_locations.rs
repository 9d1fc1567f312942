//! Central Tokyo locations for realistic test fixtures.
//!
//! Coordinates sourced from OpenStreetMap.

use route_finder::Coordinate;
use route_finder::haversine::EARTH_RADIUS_M;

/// A named location with coordinates.
#[derive(Debug, Clone)]
pub struct Location {
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub const fn new(name: &'static str, lat: f64, lng: f64) -> Self {
        Self { name, lat, lng }
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lng).expect("fixture coordinates are in range")
    }

    pub fn param(&self) -> String {
        format!("{},{}", self.lat, self.lng)
    }
}

pub const TOKYO_STATION: Location = Location::new("Tokyo Station", 35.681236, 139.767125);
pub const HIBIYA_PARK: Location = Location::new("Hibiya Park", 35.673640, 139.755840);
pub const EAST_GARDENS: Location = Location::new("Imperial Palace East Gardens", 35.685175, 139.752800);
pub const KANDA_SHRINE: Location = Location::new("Kanda Myojin", 35.702030, 139.767890);

/// GeoJSON `LineString` running due north from `from` for `meters`.
pub fn northward_route(from: &Location, meters: f64) -> String {
    let delta = (meters / EARTH_RADIUS_M).to_degrees();
    format!(
        r#"{{"type":"LineString","coordinates":[[{lng},{lat}],[{lng},{end}]]}}"#,
        lng = from.lng,
        lat = from.lat,
        end = from.lat + delta,
    )
}

/// GeoJSON feature collection of named point landmarks.
pub fn landmark_points(locations: &[Location]) -> String {
    let features = locations
        .iter()
        .map(|location| {
            format!(
                r#"{{"type":"Feature","properties":{{"name":"{}"}},"geometry":{{"type":"Point","coordinates":[{},{}]}}}}"#,
                location.name, location.lng, location.lat
            )
        })
        .collect::<Vec<_>>()
        .join(",");
    format!(r#"{{"type":"FeatureCollection","features":[{features}]}}"#)
}

/// A well-formed explanation mentioning the given locations as details.
pub fn explanation_json(locations: &[Location]) -> String {
    let summary = "緑豊かな公園と静かな小道をつなぐ散歩ルートです。車通りが少なく、木陰のベンチで休みながら歩けます。\
                   途中には歴史ある神社や庭園もあり、季節の花や木々を眺めながらゆったりとした時間を過ごせます。\
                   朝の散歩や休日のリフレッシュにも最適で、初めて訪れる人でも迷わず歩ける分かりやすい道順になっています。\
                   水辺の風も心地よく、夏でも比較的涼しく歩けます。";
    let details = locations
        .iter()
        .map(|location| {
            format!(
                r#"{{"name":"{}","description":"大きな木々に囲まれた落ち着いた場所で、ベンチに座ってゆっくり休憩できます。季節ごとの花も楽しめるので写真撮影にもおすすめの場所です。","latitude":{},"longitude":{}}}"#,
                location.name, location.lat, location.lng
            )
        })
        .collect::<Vec<_>>()
        .join(",");
    format!(r#"{{"title":"緑を感じる静かな散歩ルート","summary":"{summary}","details":[{details}]}}"#)
}
