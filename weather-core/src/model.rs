use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, de::DeserializeOwned};
use tracing::warn;

/// A city name as submitted by the user: trimmed and never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query(String);

impl Query {
    /// Trim the raw input; `None` when nothing is left.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_owned()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Current conditions for one location, as returned by OpenWeather.
///
/// Every field is optional: a response that is missing pieces still renders
/// whatever it does carry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherResult {
    #[serde(deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub sys: Option<Sys>,
    #[serde(deserialize_with = "lenient")]
    pub weather: Vec<Condition>,
    #[serde(deserialize_with = "lenient")]
    pub main: Option<Readings>,
    #[serde(deserialize_with = "lenient")]
    pub wind: Option<Wind>,
    /// Observation time, unix seconds.
    #[serde(deserialize_with = "lenient")]
    pub dt: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sys {
    #[serde(deserialize_with = "lenient")]
    pub country: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Condition {
    /// Category such as "Clear", "Clouds" or "Rain".
    #[serde(deserialize_with = "lenient")]
    pub main: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub description: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Readings {
    #[serde(deserialize_with = "lenient")]
    pub temp: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub feels_like: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub humidity: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Wind {
    // Any JSON value; only numbers count as a speed.
    #[serde(deserialize_with = "lenient")]
    pub speed: Option<serde_json::Value>,
}

/// Deserialize one field, falling back to its default when the value has an
/// unexpected type. Keeps a single odd field from discarding the whole result.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).unwrap_or_default())
}

impl WeatherResult {
    /// Interpret a successful response body. An absent or mis-shaped body yields
    /// an empty result.
    pub fn from_body(body: Option<serde_json::Value>) -> Self {
        let Some(body) = body else {
            warn!("Successful response carried no JSON body");
            return Self::default();
        };

        serde_json::from_value(body).unwrap_or_else(|err| {
            warn!(error = %err, "Response body does not look like current weather");
            Self::default()
        })
    }

    pub fn primary_condition(&self) -> Option<&Condition> {
        self.weather.first()
    }

    pub fn country(&self) -> Option<&str> {
        self.sys
            .as_ref()
            .and_then(|s| s.country.as_deref())
            .filter(|c| !c.is_empty())
    }

    pub fn icon_id(&self) -> Option<&str> {
        self.primary_condition()
            .and_then(|c| c.icon.as_deref())
            .filter(|i| !i.is_empty())
    }

    pub fn wind_speed_mps(&self) -> Option<f64> {
        self.wind
            .as_ref()
            .and_then(|w| w.speed.as_ref())
            .and_then(serde_json::Value::as_f64)
    }

    pub fn observed_at(&self) -> Option<DateTime<Utc>> {
        self.dt.and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn query_is_trimmed() {
        let q = Query::parse("  London \n").expect("non-empty");
        assert_eq!(q.as_str(), "London");
        assert!(Query::parse("   ").is_none());
        assert!(Query::parse("").is_none());
    }

    #[test]
    fn parses_openweather_body() {
        let body = json!({
            "name": "Karachi",
            "sys": { "country": "PK" },
            "weather": [{ "main": "Clear", "description": "clear sky", "icon": "01d" }],
            "main": { "temp": 31.4, "feels_like": 35.0, "humidity": 62 },
            "wind": { "speed": 5.1 },
            "dt": 1_700_000_000
        });

        let result = WeatherResult::from_body(Some(body));

        assert_eq!(result.name.as_deref(), Some("Karachi"));
        assert_eq!(result.country(), Some("PK"));
        assert_eq!(result.icon_id(), Some("01d"));
        assert_eq!(result.wind_speed_mps(), Some(5.1));
        assert_eq!(result.main.as_ref().and_then(|m| m.humidity), Some(62.0));
        assert_eq!(
            result.observed_at().map(|t| t.timestamp()),
            Some(1_700_000_000)
        );
    }

    #[test]
    fn missing_body_yields_empty_result() {
        let result = WeatherResult::from_body(None);
        assert_eq!(result, WeatherResult::default());
        assert!(result.main.is_none());
    }

    #[test]
    fn non_object_body_yields_empty_result() {
        let result = WeatherResult::from_body(Some(json!(["not", "an", "object"])));
        assert_eq!(result, WeatherResult::default());
    }

    #[test]
    fn mistyped_main_block_is_dropped_alone() {
        let result = WeatherResult::from_body(Some(json!({
            "name": "London",
            "main": "not an object"
        })));
        assert!(result.main.is_none());
        assert_eq!(result.name.as_deref(), Some("London"));
    }

    #[test]
    fn null_weather_list_keeps_readings() {
        let result = WeatherResult::from_body(Some(json!({
            "name": "London",
            "weather": null,
            "main": { "temp": 21.7, "feels_like": 21.2, "humidity": 56 }
        })));

        assert!(result.weather.is_empty());
        assert!(result.primary_condition().is_none());
        assert_eq!(result.main.as_ref().and_then(|m| m.temp), Some(21.7));
    }

    #[test]
    fn fractional_dt_keeps_readings() {
        let result = WeatherResult::from_body(Some(json!({
            "name": "London",
            "main": { "temp": 21.7 },
            "dt": 1_718_366_400.5
        })));

        assert_eq!(result.dt, None);
        assert!(result.observed_at().is_none());
        assert_eq!(result.main.as_ref().and_then(|m| m.temp), Some(21.7));
    }

    #[test]
    fn mistyped_fields_inside_blocks_are_dropped_alone() {
        let result = WeatherResult::from_body(Some(json!({
            "sys": { "country": 826 },
            "weather": [{ "main": "Rain", "description": 7, "icon": "10d" }],
            "main": { "temp": "hot", "feels_like": 18.4, "humidity": 90 }
        })));

        assert_eq!(result.country(), None);
        let condition = result.primary_condition().expect("condition kept");
        assert_eq!(condition.main.as_deref(), Some("Rain"));
        assert_eq!(condition.description, None);
        assert_eq!(result.icon_id(), Some("10d"));

        let main = result.main.expect("main kept");
        assert_eq!(main.temp, None);
        assert_eq!(main.feels_like, Some(18.4));
    }

    #[test]
    fn non_numeric_wind_speed_is_none() {
        let result = WeatherResult::from_body(Some(json!({ "wind": { "speed": "fast" } })));
        assert!(result.wind.is_some());
        assert_eq!(result.wind_speed_mps(), None);
    }
}
