//! Extraction of event tags from streamed agent text.
//!
//! Consumers (the map front end, the `ask` CLI) pull `<event type="...">`
//! tags out of the assistant's answer to place markers and weather overlays.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use firecmd_types::event::EventTag;

static EVENT_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<event type="(geocode|windy)">(.*?)</event>"#).expect("invalid event tag regex")
});

/// Every well-formed event tag in `text`, in order of appearance.
///
/// Tags whose body does not parse are skipped.
pub fn extract_events(text: &str) -> Vec<EventTag> {
    EVENT_TAG
        .captures_iter(text)
        .filter_map(|caps| {
            let (kind, body) = (&caps[1], &caps[2]);
            match EventTag::parse(kind, body) {
                Ok(tag) => Some(tag),
                Err(e) => {
                    debug!(kind, body, error = %e, "Skipping malformed event tag");
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use firecmd_types::event::{EventEncoding, GeocodeEvent, WindyEvent};

    #[test]
    fn test_extracts_both_encodings() {
        let text = "### 소방서\n\
            - <event type=\"geocode\">37.4837,127.0324,서초소방서</event>\n\
            - <event type=\"geocode\">lat=37.5;lon=127.1;name=강남소방서</event>\n\
            기상: <event type=\"windy\">37.5,127.0,12.3,4.2,270,55,1013,서울특별시 서초구</event>";
        let events = extract_events(text);
        assert_eq!(events.len(), 3);
        assert_eq!(
            events[0],
            EventTag::Geocode(GeocodeEvent {
                lat: 37.4837,
                lon: 127.0324,
                name: "서초소방서".to_string()
            })
        );
        assert_eq!(
            events[1],
            EventTag::Geocode(GeocodeEvent {
                lat: 37.5,
                lon: 127.1,
                name: "강남소방서".to_string()
            })
        );
        match &events[2] {
            EventTag::Windy(WindyEvent { address, wind_dir, .. }) => {
                assert_eq!(address, "서울특별시 서초구");
                assert_eq!(*wind_dir, 270.0);
            }
            other => panic!("unexpected tag {other:?}"),
        }
    }

    #[test]
    fn test_rendered_tags_are_extracted_back() {
        let tag = EventTag::Geocode(GeocodeEvent {
            lat: 36.8,
            lon: 127.15,
            name: "천안동남소방서".to_string(),
        });
        let text = format!("위치 {}", tag.render(EventEncoding::Keyed));
        assert_eq!(extract_events(&text), vec![tag]);
    }

    #[test]
    fn test_skips_malformed_and_unknown() {
        let text = "<event type=\"geocode\">north,east,x</event>\
            <event type=\"traffic\">1,2</event>";
        assert!(extract_events(text).is_empty());
    }
}
