use crate::{Config, LookupError, Query, WeatherResult, provider::openweather::OpenWeatherProvider};
use anyhow::Context;
use async_trait::async_trait;
use std::{fmt::Debug, time::Duration};

pub mod openweather;

/// Source of current weather for a city.
///
/// The API key is passed per call so the caller decides when a missing key is
/// an error, before any network activity happens.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn current_by_city(
        &self,
        query: &Query,
        api_key: &str,
    ) -> Result<WeatherResult, LookupError>;
}

/// Construct the OpenWeather provider from config (base URL and timeout).
pub fn provider_from_config(config: &Config) -> anyhow::Result<OpenWeatherProvider> {
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .context("Failed to build HTTP client")?;

    Ok(OpenWeatherProvider::new(config.base_url.clone(), http))
}
