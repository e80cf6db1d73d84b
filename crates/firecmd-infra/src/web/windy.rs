//! Windy point-forecast client.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::debug;

use firecmd_core::tool::weather::{PointForecast, WeatherSource};
use firecmd_types::config::WeatherSettings;
use firecmd_types::tool::ToolError;

use super::{check_status, network_error, read_json};

/// Environment variable holding the API key.
pub const API_KEY_VAR: &str = "WINDY_API_KEY";

const PARAMETERS: [&str; 4] = ["wind", "temp", "rh", "pressure"];
const LEVELS: [&str; 1] = ["surface"];

#[derive(Debug, Serialize)]
struct ForecastRequest<'a> {
    lat: f64,
    lon: f64,
    model: &'a str,
    parameters: &'a [&'a str],
    levels: &'a [&'a str],
    key: &'a str,
}

pub struct WindyClient {
    http: reqwest::Client,
    api_url: String,
    model: String,
    api_key: SecretString,
}

impl WindyClient {
    pub fn new(http: reqwest::Client, settings: &WeatherSettings, api_key: SecretString) -> Self {
        Self {
            http,
            api_url: settings.api_url.clone(),
            model: settings.model.clone(),
            api_key,
        }
    }
}

#[async_trait]
impl WeatherSource for WindyClient {
    async fn point_forecast(&self, lat: f64, lon: f64) -> Result<PointForecast, ToolError> {
        let body = ForecastRequest {
            lat,
            lon,
            model: &self.model,
            parameters: &PARAMETERS,
            levels: &LEVELS,
            key: self.api_key.expose_secret(),
        };
        let response = self
            .http
            .post(&self.api_url)
            .json(&body)
            .send()
            .await
            .map_err(network_error)?;
        let forecast: PointForecast = read_json(check_status(response).await?, "point forecast").await?;
        debug!(lat, lon, steps = forecast.ts.len(), "point forecast received");
        Ok(forecast)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_body() {
        let body = ForecastRequest {
            lat: 37.4837,
            lon: 127.0324,
            model: "gfs",
            parameters: &PARAMETERS,
            levels: &LEVELS,
            key: "k",
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "lat": 37.4837,
                "lon": 127.0324,
                "model": "gfs",
                "parameters": ["wind", "temp", "rh", "pressure"],
                "levels": ["surface"],
                "key": "k"
            })
        );
    }

    #[test]
    fn test_response_parses_into_forecast() {
        let forecast: PointForecast = serde_json::from_value(json!({
            "ts": [1760000000000i64],
            "units": {"temp-surface": "K"},
            "wind_u-surface": [3.0],
            "wind_v-surface": [4.0],
            "temp-surface": [283.15],
            "rh-surface": [55.0],
            "pressure-surface": [101300.0]
        }))
        .unwrap();
        let c = forecast.first_conditions().unwrap();
        assert_eq!(c.wind_u, 3.0);
        assert_eq!(c.pressure, 101300.0);
    }
}
