use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::{LookupError, Query, WeatherResult};

use super::WeatherProvider;

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(base_url: impl Into<String>, http: Client) -> Self {
        Self {
            base_url: base_url.into(),
            http,
        }
    }

    pub fn current_weather_url(&self) -> String {
        format!("{}/data/2.5/weather", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    #[instrument(skip(self, query, api_key), fields(city = %query))]
    async fn current_by_city(
        &self,
        query: &Query,
        api_key: &str,
    ) -> Result<WeatherResult, LookupError> {
        let url = self.current_weather_url();
        debug!(url = %url, "Fetching current weather");

        let res = self
            .http
            .get(&url)
            .query(&[
                ("q", query.as_str()),
                ("appid", api_key),
                ("units", "metric"),
            ])
            .send()
            .await
            .map_err(|err| {
                warn!(error = %err, "OpenWeather request did not get a response");
                LookupError::network()
            })?;

        let status = res.status();
        let body = read_json_body(res).await;
        debug!(status = status.as_u16(), has_body = body.is_some(), "OpenWeather responded");

        if !status.is_success() {
            return Err(LookupError::api(status.as_u16(), body.as_ref()));
        }

        Ok(WeatherResult::from_body(body))
    }
}

/// Parse the body as JSON, treating anything unreadable as absent.
async fn read_json_body(res: reqwest::Response) -> Option<Value> {
    let bytes = match res.bytes().await {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!(error = %err, "Failed to read OpenWeather response body");
            return None;
        }
    };

    serde_json::from_slice(&bytes)
        .inspect_err(|err| debug!(error = %err, body = %truncate_body(&bytes), "Body is not JSON"))
        .ok()
}

fn truncate_body(body: &[u8]) -> String {
    const MAX: usize = 200;
    let text = String::from_utf8_lossy(body);
    match text.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.into_owned(),
    }
}
