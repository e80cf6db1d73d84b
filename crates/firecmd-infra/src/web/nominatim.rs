//! Nominatim reverse geocoding.

use async_trait::async_trait;

use firecmd_core::tool::weather::{ReverseGeocode, ReverseGeocoder};
use firecmd_types::config::GeocoderSettings;
use firecmd_types::tool::ToolError;

use super::{check_status, network_error, read_json};

pub struct NominatimClient {
    http: reqwest::Client,
    url: String,
    user_agent: String,
    language: String,
}

impl NominatimClient {
    pub fn new(http: reqwest::Client, settings: &GeocoderSettings) -> Self {
        Self {
            http,
            url: settings.url.clone(),
            user_agent: settings.user_agent.clone(),
            language: settings.language.clone(),
        }
    }

    fn query(lat: f64, lon: f64) -> [(&'static str, String); 4] {
        [
            ("format", "json".to_string()),
            ("lat", lat.to_string()),
            ("lon", lon.to_string()),
            ("addressdetails", "1".to_string()),
        ]
    }
}

#[async_trait]
impl ReverseGeocoder for NominatimClient {
    async fn reverse(&self, lat: f64, lon: f64) -> Result<ReverseGeocode, ToolError> {
        let response = self
            .http
            .get(&self.url)
            .query(&Self::query(lat, lon))
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .header(reqwest::header::ACCEPT_LANGUAGE, &self.language)
            .send()
            .await
            .map_err(network_error)?;
        read_json(check_status(response).await?, "reverse geocode").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_url_and_headers() {
        let client = NominatimClient::new(reqwest::Client::new(), &GeocoderSettings::default());
        let request = client
            .http
            .get(&client.url)
            .query(&NominatimClient::query(37.5, 127.25))
            .header(reqwest::header::USER_AGENT, &client.user_agent)
            .build()
            .unwrap();
        assert_eq!(
            request.url().as_str(),
            "https://nominatim.openstreetmap.org/reverse?format=json&lat=37.5&lon=127.25&addressdetails=1"
        );
        assert_eq!(request.headers()["user-agent"], "DisasterMonitoring/1.0");
    }

    #[test]
    fn test_response_shape() {
        let geo: ReverseGeocode = serde_json::from_str(
            r#"{"display_name": "서초구, 서울", "address": {"city": "서울특별시", "borough": "서초구", "road": "남부순환로"}}"#,
        )
        .unwrap();
        assert_eq!(geo.address.borough.as_deref(), Some("서초구"));
    }
}
