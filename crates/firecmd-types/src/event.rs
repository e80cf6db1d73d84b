//! Map event tags embedded in assistant text.
//!
//! The map frontend scans responses for `<event type="geocode">…</event>` and
//! `<event type="windy">…</event>`. Bodies come in two encodings: `keyed`
//! (`lat=…;lon=…;name=…`) and the legacy comma-separated `positional` one.
//! Parsing accepts either.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Body encoding used when rendering event tags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventEncoding {
    #[default]
    Keyed,
    Positional,
}

/// A fire station marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeEvent {
    pub lat: f64,
    pub lon: f64,
    pub name: String,
}

/// A weather overlay at the incident coordinate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindyEvent {
    pub lat: f64,
    pub lon: f64,
    pub temp: f64,
    pub wind_speed: f64,
    pub wind_dir: f64,
    pub humidity: f64,
    pub pressure: f64,
    pub address: String,
}

/// One `<event>` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EventTag {
    Geocode(GeocodeEvent),
    Windy(WindyEvent),
}

#[derive(Debug, Error, PartialEq)]
pub enum EventTagError {
    #[error("unknown event type '{0}'")]
    UnknownType(String),

    #[error("missing field '{0}'")]
    MissingField(&'static str),

    #[error("invalid number for '{field}': '{value}'")]
    InvalidNumber { field: &'static str, value: String },
}

const GEOCODE_FIELDS: [&str; 3] = ["lat", "lon", "name"];
const WINDY_FIELDS: [&str; 8] = [
    "lat",
    "lon",
    "temp",
    "wind_speed",
    "wind_dir",
    "humidity",
    "pressure",
    "address",
];

impl EventTag {
    /// Value of the tag's `type` attribute.
    pub fn kind(&self) -> &'static str {
        match self {
            EventTag::Geocode(_) => "geocode",
            EventTag::Windy(_) => "windy",
        }
    }

    /// Full `<event type="…">…</event>` markup.
    pub fn render(&self, encoding: EventEncoding) -> String {
        format!(
            "<event type=\"{}\">{}</event>",
            self.kind(),
            self.body(encoding)
        )
    }

    /// Tag body in the requested encoding.
    pub fn body(&self, encoding: EventEncoding) -> String {
        let values = self.values(encoding);
        match encoding {
            EventEncoding::Positional => values
                .iter()
                .map(|(_, v)| v.as_str())
                .collect::<Vec<_>>()
                .join(","),
            EventEncoding::Keyed => values
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join(";"),
        }
    }

    fn values(&self, encoding: EventEncoding) -> Vec<(&'static str, String)> {
        match self {
            EventTag::Geocode(g) => vec![
                ("lat", g.lat.to_string()),
                ("lon", g.lon.to_string()),
                ("name", sanitize(&g.name, encoding)),
            ],
            EventTag::Windy(w) => vec![
                ("lat", w.lat.to_string()),
                ("lon", w.lon.to_string()),
                ("temp", format!("{:.1}", w.temp)),
                ("wind_speed", format!("{:.1}", w.wind_speed)),
                ("wind_dir", format!("{:.0}", w.wind_dir)),
                ("humidity", w.humidity.to_string()),
                ("pressure", w.pressure.to_string()),
                ("address", sanitize(&w.address, encoding)),
            ],
        }
    }

    /// Parse a tag from its `type` attribute and body, in either encoding.
    pub fn parse(kind: &str, body: &str) -> Result<Self, EventTagError> {
        let fields: &[&'static str] = match kind {
            "geocode" => &GEOCODE_FIELDS,
            "windy" => &WINDY_FIELDS,
            other => return Err(EventTagError::UnknownType(other.to_string())),
        };
        let values = split_body(body.trim(), fields);
        let text = |name: &'static str| -> Result<String, EventTagError> {
            values
                .get(name)
                .map(|v| v.trim().to_string())
                .ok_or(EventTagError::MissingField(name))
        };
        let number = |name: &'static str| -> Result<f64, EventTagError> {
            let raw = text(name)?;
            raw.parse::<f64>()
                .map_err(|_| EventTagError::InvalidNumber {
                    field: name,
                    value: raw,
                })
        };

        match kind {
            "geocode" => Ok(EventTag::Geocode(GeocodeEvent {
                lat: number("lat")?,
                lon: number("lon")?,
                name: text("name")?,
            })),
            _ => Ok(EventTag::Windy(WindyEvent {
                lat: number("lat")?,
                lon: number("lon")?,
                temp: number("temp")?,
                wind_speed: number("wind_speed")?,
                wind_dir: number("wind_dir")?,
                humidity: number("humidity")?,
                pressure: number("pressure")?,
                address: text("address")?,
            })),
        }
    }
}

impl fmt::Display for EventTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(EventEncoding::Keyed))
    }
}

/// Split a body into named values. Keyed bodies start with `lat=`; anything
/// else is positional, where the last field absorbs remaining commas.
fn split_body<'a>(body: &'a str, fields: &[&'static str]) -> HashMap<&'a str, &'a str> {
    if body.starts_with("lat=") {
        body.split(';')
            .filter_map(|pair| pair.split_once('='))
            .map(|(k, v)| (k.trim(), v))
            .collect()
    } else {
        fields
            .iter()
            .copied()
            .zip(body.splitn(fields.len(), ','))
            .collect()
    }
}

/// Strip characters that would break the tag or its body encoding.
fn sanitize(value: &str, encoding: EventEncoding) -> String {
    value
        .chars()
        .filter(|c| *c != '<' && *c != '>')
        .map(|c| match c {
            '\n' | '\r' => ' ',
            ';' | '=' if encoding == EventEncoding::Keyed => ' ',
            _ => c,
        })
        .collect::<String>()
        .trim()
        .to_string()
}
