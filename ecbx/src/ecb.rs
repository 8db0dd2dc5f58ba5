//! Client for the ECB reference-rate XML feed.
//!
//! The ECB publishes EUR reference rates as nested `Cube` elements:
//! an outer `Cube` per date (`time` attribute) containing one `Cube` per
//! currency (`currency` and `rate` attributes). Everything else in the
//! envelope is metadata we do not need.

use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::Client;

use crate::error::{EcbxError, Result};

const ECB_FEED_BASE: &str = "https://www.ecb.europa.eu/stats/eurofxref";
const HISTORY_PATH: &str = "/eurofxref-hist.xml";
const NINETY_DAYS_PATH: &str = "/eurofxref-hist-90d.xml";

/// A single `(date, currency, rate)` observation from the feed, quoted
/// against EUR.
#[derive(Debug, Clone, PartialEq)]
pub struct RateObservation {
    pub date: String,
    pub currency: String,
    pub rate: f64,
}

/// Client for downloading the ECB feed.
pub struct EcbFeed {
    client: Client,
    pub base_url: String,
}

impl EcbFeed {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: ECB_FEED_BASE.to_string(),
        }
    }

    /// Download and parse the full historical feed (back to 1999).
    pub async fn fetch_history(&self) -> Result<Vec<RateObservation>> {
        self.fetch(HISTORY_PATH).await
    }

    /// Download and parse the last-90-days feed.
    pub async fn fetch_recent(&self) -> Result<Vec<RateObservation>> {
        self.fetch(NINETY_DAYS_PATH).await
    }

    async fn fetch(&self, path: &str) -> Result<Vec<RateObservation>> {
        let url = format!("{}{}", self.base_url, path);
        log::info!("Fetching ECB feed: {}", url);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            log::error!("ECB feed request failed with status {}", response.status());
            return Err(EcbxError::HttpStatus(response.status()));
        }

        let body = response.text().await?;
        log::debug!("ECB feed body: {} bytes", body.len());

        let observations = parse_feed(&body)?;
        log::info!("Parsed {} rate observations from feed", observations.len());
        Ok(observations)
    }
}

impl Default for EcbFeed {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse the feed XML into observations.
///
/// Walks `Cube` elements by local name so namespace prefixes do not
/// matter; the date context is the `time` attribute of the enclosing
/// `Cube`.
pub fn parse_feed(xml: &str) -> Result<Vec<RateObservation>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut observations = Vec::new();
    let mut current_date: Option<String> = None;

    loop {
        let event = reader.read_event()?;
        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                if e.local_name().as_ref() != b"Cube" {
                    continue;
                }
                let mut time = None;
                let mut currency = None;
                let mut rate = None;
                for attr in e.attributes() {
                    let attr = attr.map_err(quick_xml::Error::from)?;
                    let value = attr.unescape_value()?.into_owned();
                    match attr.key.local_name().as_ref() {
                        b"time" => time = Some(value),
                        b"currency" => currency = Some(value),
                        b"rate" => rate = Some(value),
                        _ => {}
                    }
                }
                if let Some(time) = time {
                    current_date = Some(time);
                } else if let (Some(currency), Some(rate_str)) = (currency, rate) {
                    let Some(date) = current_date.clone() else {
                        log::warn!("Currency cube for {} outside a dated cube, skipping", currency);
                        continue;
                    };
                    match rate_str.parse::<f64>() {
                        Ok(rate) => observations.push(RateObservation {
                            date,
                            currency,
                            rate,
                        }),
                        Err(_) => {
                            log::warn!(
                                "Unparseable rate '{}' for {} on {}, skipping",
                                rate_str,
                                currency,
                                date
                            );
                        }
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(observations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SAMPLE_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gesmes:Envelope xmlns:gesmes="http://www.gesmes.org/xml/2002-08-01" xmlns="http://www.ecb.int/vocabulary/2002-08-01/eurofxref">
    <gesmes:subject>Reference rates</gesmes:subject>
    <gesmes:Sender>
        <gesmes:name>European Central Bank</gesmes:name>
    </gesmes:Sender>
    <Cube>
        <Cube time="2024-03-15">
            <Cube currency="USD" rate="1.0892"/>
            <Cube currency="JPY" rate="161.85"/>
            <Cube currency="GBP" rate="0.8541"/>
        </Cube>
        <Cube time="2024-03-14">
            <Cube currency="USD" rate="1.0925"/>
        </Cube>
    </Cube>
</gesmes:Envelope>"#;

    #[test]
    fn parse_feed_extracts_dated_observations() {
        let observations = parse_feed(SAMPLE_FEED).unwrap();
        assert_eq!(observations.len(), 4);
        assert_eq!(
            observations[0],
            RateObservation {
                date: "2024-03-15".to_string(),
                currency: "USD".to_string(),
                rate: 1.0892,
            }
        );
        assert_eq!(observations[3].date, "2024-03-14");
        assert_eq!(observations[3].currency, "USD");
    }

    #[test]
    fn parse_feed_handles_empty_document() {
        let observations = parse_feed("<Cube></Cube>").unwrap();
        assert!(observations.is_empty());
    }

    #[test]
    fn parse_feed_skips_unparseable_rates() {
        let xml = r#"<Cube><Cube time="2024-03-15"><Cube currency="USD" rate="oops"/><Cube currency="JPY" rate="161.85"/></Cube></Cube>"#;
        let observations = parse_feed(xml).unwrap();
        assert_eq!(observations.len(), 1);
        assert_eq!(observations[0].currency, "JPY");
    }

    #[test]
    fn parse_feed_rejects_broken_xml() {
        assert!(parse_feed("<Cube><Cube time=").is_err());
    }

    #[tokio::test]
    async fn fetch_recent_downloads_and_parses() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/eurofxref-hist-90d.xml"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(SAMPLE_FEED, "application/xml"),
            )
            .mount(&mock_server)
            .await;

        let mut feed = EcbFeed::new();
        feed.base_url = mock_server.uri();

        let observations = feed.fetch_recent().await.unwrap();
        assert_eq!(observations.len(), 4);
    }

    #[tokio::test]
    async fn fetch_history_propagates_http_errors() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/eurofxref-hist.xml"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let mut feed = EcbFeed::new();
        feed.base_url = mock_server.uri();

        let err = feed.fetch_history().await.unwrap_err();
        match err {
            EcbxError::HttpStatus(status) => assert_eq!(status.as_u16(), 503),
            other => panic!("expected HttpStatus error, got {:?}", other),
        }
    }
}
