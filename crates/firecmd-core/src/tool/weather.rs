//! Weather at the incident coordinate.
//!
//! Surface conditions come from a point-forecast service; the coordinate is
//! reverse-geocoded for a readable address. Output ends with a windy event
//! tag for the map overlay.

use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use firecmd_types::event::{EventEncoding, EventTag, WindyEvent};
use firecmd_types::tool::ToolError;

use super::{Tool, parse_args, schema_of};

pub const WEATHER_UNAVAILABLE: &str = "기상 정보를 가져올 수 없습니다.";

const KELVIN_OFFSET: f64 = 273.15;
const DEFAULT_PRESSURE: f64 = 1013.0;

/// Raw point-forecast response. Series are indexed in step with `ts`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PointForecast {
    #[serde(default)]
    pub ts: Vec<i64>,
    #[serde(rename = "wind_u-surface", default)]
    pub wind_u: Vec<Option<f64>>,
    #[serde(rename = "wind_v-surface", default)]
    pub wind_v: Vec<Option<f64>>,
    #[serde(rename = "temp-surface", default)]
    pub temp: Vec<Option<f64>>,
    #[serde(rename = "rh-surface", default)]
    pub humidity: Vec<Option<f64>>,
    #[serde(rename = "pressure-surface", default)]
    pub pressure: Vec<Option<f64>>,
}

/// Surface conditions at one forecast step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceConditions {
    /// Eastward wind component, m/s.
    pub wind_u: f64,
    /// Northward wind component, m/s.
    pub wind_v: f64,
    pub temp_kelvin: f64,
    pub humidity: f64,
    pub pressure: f64,
}

impl PointForecast {
    /// Conditions at the first timestamp, or `None` when there is none.
    /// Missing values take calm, freezing-point, standard-pressure defaults.
    pub fn first_conditions(&self) -> Option<SurfaceConditions> {
        if self.ts.is_empty() {
            return None;
        }
        fn first(series: &[Option<f64>], default: f64) -> f64 {
            series.first().copied().flatten().unwrap_or(default)
        }
        Some(SurfaceConditions {
            wind_u: first(&self.wind_u, 0.0),
            wind_v: first(&self.wind_v, 0.0),
            temp_kelvin: first(&self.temp, KELVIN_OFFSET),
            humidity: first(&self.humidity, 0.0),
            pressure: first(&self.pressure, DEFAULT_PRESSURE),
        })
    }
}

pub fn wind_speed(u: f64, v: f64) -> f64 {
    u.hypot(v)
}

/// Wind direction in degrees, in `[0, 360)`.
pub fn wind_direction(u: f64, v: f64) -> f64 {
    let deg = u.atan2(-v).to_degrees().rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs.
    if deg >= 360.0 { 0.0 } else { deg }
}

pub fn kelvin_to_celsius(k: f64) -> f64 {
    k - KELVIN_OFFSET
}

/// Address components from a reverse-geocoding lookup.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddressParts {
    pub city: Option<String>,
    pub province: Option<String>,
    pub borough: Option<String>,
    pub suburb: Option<String>,
    pub road: Option<String>,
    pub house_number: Option<String>,
    pub postcode: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReverseGeocode {
    #[serde(default)]
    pub address: AddressParts,
    pub display_name: Option<String>,
}

/// Join city/province, borough/suburb, road, house number and postcode.
/// Falls back to the display name, then to the bare coordinate.
pub fn compose_address(geo: &ReverseGeocode, lat: f64, lon: f64) -> String {
    let a = &geo.address;
    fn present(v: &Option<String>) -> Option<&str> {
        v.as_deref().filter(|s| !s.is_empty())
    }
    let parts: Vec<&str> = [
        present(&a.city).or(present(&a.province)),
        present(&a.borough).or(present(&a.suburb)),
        present(&a.road),
        present(&a.house_number),
        present(&a.postcode),
    ]
    .into_iter()
    .flatten()
    .collect();

    if !parts.is_empty() {
        return parts.join(" ");
    }
    geo.display_name
        .clone()
        .unwrap_or_else(|| coordinate_label(lat, lon))
}

pub fn coordinate_label(lat: f64, lon: f64) -> String {
    format!("{lat:.6}, {lon:.6}")
}

/// Point-forecast service.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn point_forecast(&self, lat: f64, lon: f64) -> Result<PointForecast, ToolError>;
}

/// Coordinate-to-address service.
#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    async fn reverse(&self, lat: f64, lon: f64) -> Result<ReverseGeocode, ToolError>;
}

/// Render conditions for the model, ending with a windy event tag.
pub fn format_weather(
    lat: f64,
    lon: f64,
    address: &str,
    c: &SurfaceConditions,
    encoding: EventEncoding,
) -> String {
    let speed = wind_speed(c.wind_u, c.wind_v);
    let direction = wind_direction(c.wind_u, c.wind_v);
    let celsius = kelvin_to_celsius(c.temp_kelvin);

    let tag = EventTag::Windy(WindyEvent {
        lat,
        lon,
        temp: celsius,
        wind_speed: speed,
        wind_dir: direction,
        humidity: c.humidity,
        pressure: c.pressure,
        address: address.to_string(),
    });

    format!(
        "위도: {lat}, 경도: {lon}\n\
         주소: {address}\n\
         온도: {celsius:.1}°C\n\
         풍속: {speed:.1} m/s\n\
         풍향: {direction:.0}°\n\
         습도: {}%\n\
         기압: {} hPa\n\
         {}",
        c.humidity,
        c.pressure,
        tag.render(encoding)
    )
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct WeatherArgs {
    /// 위도 (prompt에서 받은 값)
    pub latitude: f64,
    /// 경도 (prompt에서 받은 값)
    pub longitude: f64,
}

pub struct WeatherTool {
    source: Arc<dyn WeatherSource>,
    geocoder: Arc<dyn ReverseGeocoder>,
    encoding: EventEncoding,
}

impl WeatherTool {
    pub fn new(
        source: Arc<dyn WeatherSource>,
        geocoder: Arc<dyn ReverseGeocoder>,
        encoding: EventEncoding,
    ) -> Self {
        Self {
            source,
            geocoder,
            encoding,
        }
    }

    async fn address_for(&self, lat: f64, lon: f64) -> String {
        let address = match self.geocoder.reverse(lat, lon).await {
            Ok(geo) => compose_address(&geo, lat, lon),
            Err(e) => {
                warn!(lat, lon, error = %e, "Reverse geocoding failed");
                coordinate_label(lat, lon)
            }
        };
        address.replace(',', " ")
    }
}

#[async_trait]
impl Tool for WeatherTool {
    fn name(&self) -> &str {
        "get_weather_info"
    }

    fn description(&self) -> &str {
        "Windy API를 사용해 좌표의 기상 정보(온도, 풍속, 풍향, 습도, 기압)와 주소를 조회합니다."
    }

    fn args_schema(&self) -> Value {
        schema_of::<WeatherArgs>()
    }

    fn error_prefix(&self) -> &str {
        "기상 정보 조회 오류"
    }

    async fn call(&self, args: Value) -> Result<String, ToolError> {
        let WeatherArgs {
            latitude,
            longitude,
        } = parse_args(args)?;
        info!(latitude, longitude, "Fetching weather");

        let forecast = self.source.point_forecast(latitude, longitude).await?;
        let Some(conditions) = forecast.first_conditions() else {
            return Ok(WEATHER_UNAVAILABLE.to_string());
        };
        let address = self.address_for(latitude, longitude).await;

        Ok(format_weather(
            latitude,
            longitude,
            &address,
            &conditions,
            self.encoding,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::tool::ToolRegistry;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    #[test]
    fn test_wind_speed() {
        assert_close(wind_speed(3.0, 4.0), 5.0);
        assert_close(wind_speed(0.0, 0.0), 0.0);
    }

    #[test]
    fn test_wind_direction_cardinal_cases() {
        assert_close(wind_direction(0.0, -1.0), 0.0);
        assert_close(wind_direction(1.0, 0.0), 90.0);
        assert_close(wind_direction(0.0, 1.0), 180.0);
        assert_close(wind_direction(-1.0, 0.0), 270.0);
    }

    #[test]
    fn test_wind_direction_range() {
        let samples = [-7.5, -1.0, -1e-12, 0.0, 1e-12, 0.3, 2.0, 12.25];
        for u in samples {
            for v in samples {
                let d = wind_direction(u, v);
                assert!((0.0..360.0).contains(&d), "({u}, {v}) -> {d}");
            }
        }
    }

    #[test]
    fn test_kelvin_to_celsius() {
        assert_close(kelvin_to_celsius(273.15), 0.0);
    }

    #[test]
    fn test_first_conditions_defaults() {
        let forecast: PointForecast = serde_json::from_value(json!({
            "ts": [1_700_000_000_000_i64],
            "temp-surface": [293.15],
            "wind_u-surface": [null],
        }))
        .unwrap();
        let c = forecast.first_conditions().unwrap();
        assert_close(c.temp_kelvin, 293.15);
        assert_close(c.wind_u, 0.0);
        assert_close(c.wind_v, 0.0);
        assert_close(c.humidity, 0.0);
        assert_close(c.pressure, 1013.0);
    }

    #[test]
    fn test_empty_timestamps_have_no_conditions() {
        let forecast: PointForecast = serde_json::from_value(json!({"ts": []})).unwrap();
        assert!(forecast.first_conditions().is_none());
    }

    #[test]
    fn test_compose_address_order_and_fallbacks() {
        let geo: ReverseGeocode = serde_json::from_value(json!({
            "address": {
                "province": "경기도",
                "suburb": "분당구",
                "road": "판교역로",
                "house_number": "235",
                "postcode": "13494"
            },
            "display_name": "unused"
        }))
        .unwrap();
        assert_eq!(compose_address(&geo, 0.0, 0.0), "경기도 분당구 판교역로 235 13494");

        let city_wins: ReverseGeocode = serde_json::from_value(json!({
            "address": {"city": "서울특별시", "province": "x", "borough": "강남구", "suburb": "y"}
        }))
        .unwrap();
        assert_eq!(compose_address(&city_wins, 0.0, 0.0), "서울특별시 강남구");

        let display: ReverseGeocode =
            serde_json::from_value(json!({"display_name": "Somewhere, Korea"})).unwrap();
        assert_eq!(compose_address(&display, 0.0, 0.0), "Somewhere, Korea");

        assert_eq!(
            compose_address(&ReverseGeocode::default(), 37.5, 127.0),
            "37.500000, 127.000000"
        );
    }

    #[test]
    fn test_format_weather() {
        let c = SurfaceConditions {
            wind_u: 3.0,
            wind_v: 4.0,
            temp_kelvin: 293.15,
            humidity: 55.0,
            pressure: 1008.5,
        };
        let out = format_weather(37.5, 127.25, "서울특별시 강남구", &c, EventEncoding::Positional);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "위도: 37.5, 경도: 127.25");
        assert_eq!(lines[1], "주소: 서울특별시 강남구");
        assert_eq!(lines[2], "온도: 20.0°C");
        assert_eq!(lines[3], "풍속: 5.0 m/s");
        assert_eq!(lines[5], "습도: 55%");
        assert_eq!(lines[6], "기압: 1008.5 hPa");
        assert!(lines[7].starts_with("<event type=\"windy\">37.5,127.25,20.0,5.0,"));
        assert!(lines[7].ends_with(",55,1008.5,서울특별시 강남구</event>"));
    }

    struct StaticWeather(Result<PointForecast, u16>);

    #[async_trait]
    impl WeatherSource for StaticWeather {
        async fn point_forecast(&self, _lat: f64, _lon: f64) -> Result<PointForecast, ToolError> {
            match &self.0 {
                Ok(f) => Ok(f.clone()),
                Err(status) => Err(ToolError::Upstream {
                    status: *status,
                    message: "bad key".to_string(),
                }),
            }
        }
    }

    struct FailingGeocoder;

    #[async_trait]
    impl ReverseGeocoder for FailingGeocoder {
        async fn reverse(&self, _lat: f64, _lon: f64) -> Result<ReverseGeocode, ToolError> {
            Err(ToolError::Network("timeout".to_string()))
        }
    }

    fn registry(source: StaticWeather) -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(WeatherTool::new(
            Arc::new(source),
            Arc::new(FailingGeocoder),
            EventEncoding::Keyed,
        )));
        registry
    }

    #[tokio::test]
    async fn test_geocoder_failure_falls_back_to_coordinates() {
        let forecast = PointForecast {
            ts: vec![1],
            ..Default::default()
        };
        let outcome = registry(StaticWeather(Ok(forecast)))
            .dispatch("get_weather_info", json!({"latitude": 37.5, "longitude": 127.0}))
            .await;
        assert!(!outcome.is_error);
        assert!(outcome.content.contains("주소: 37.500000  127.000000\n"));
        assert!(outcome.content.contains("온도: 0.0°C"));
    }

    #[tokio::test]
    async fn test_empty_forecast_message() {
        let outcome = registry(StaticWeather(Ok(PointForecast::default())))
            .dispatch("get_weather_info", json!({"latitude": 1.0, "longitude": 2.0}))
            .await;
        assert_eq!(outcome.content, WEATHER_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_upstream_failure_is_reported() {
        let outcome = registry(StaticWeather(Err(401)))
            .dispatch("get_weather_info", json!({"latitude": 1.0, "longitude": 2.0}))
            .await;
        assert!(outcome.is_error);
        assert!(outcome.content.starts_with("기상 정보 조회 오류: upstream returned 401"));
    }
}
