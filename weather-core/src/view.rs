//! Pure rendering of a [`LookupState`] into a [`View`].

use std::fmt;

use crate::{LookupState, WeatherResult};

pub const TITLE: &str = "Weather App";
pub const SUBTITLE: &str = "Search any city to get live weather updates";
pub const PLACEHOLDER: &str = "Enter city (e.g., Karachi, London)";
pub const ICON_BASE_URL: &str = "https://openweathermap.org/img/wn";

const PLACEHOLDER_VALUE: &str = "-";

/// Background theme keyed off the primary condition category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Theme {
    Clear,
    Clouds,
    Rain,
    Storm,
    Snow,
    #[default]
    Default,
}

impl Theme {
    pub fn from_result(result: Option<&WeatherResult>) -> Self {
        let main = result
            .and_then(WeatherResult::primary_condition)
            .and_then(|c| c.main.as_deref())
            .unwrap_or_default()
            .to_lowercase();

        if main.contains("clear") {
            Theme::Clear
        } else if main.contains("cloud") {
            Theme::Clouds
        } else if main.contains("rain") || main.contains("drizzle") {
            Theme::Rain
        } else if main.contains("thunder") {
            Theme::Storm
        } else if main.contains("snow") {
            Theme::Snow
        } else {
            Theme::Default
        }
    }

    pub fn css_class(&self) -> &'static str {
        match self {
            Theme::Clear => "bg bg--clear",
            Theme::Clouds => "bg bg--clouds",
            Theme::Rain => "bg bg--rain",
            Theme::Storm => "bg bg--storm",
            Theme::Snow => "bg bg--snow",
            Theme::Default => "bg",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: &'static str,
    pub disabled: bool,
}

/// The result card. Values are preformatted for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub heading: String,
    pub description: String,
    pub icon_url: Option<String>,
    pub temperature: String,
    pub feels_like: String,
    pub humidity: String,
    pub wind: String,
    pub observed_at: Option<String>,
}

/// Everything the user sees for one state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View {
    pub title: &'static str,
    pub subtitle: &'static str,
    pub input: String,
    pub placeholder: &'static str,
    pub button: Button,
    /// Rendered with the alert role.
    pub alert: Option<String>,
    pub card: Option<Card>,
    pub theme: Theme,
}

pub fn render(state: &LookupState, city_input: &str) -> View {
    let loading = state.is_loading();

    View {
        title: TITLE,
        subtitle: SUBTITLE,
        input: city_input.to_owned(),
        placeholder: PLACEHOLDER,
        button: Button {
            label: if loading { "Loading..." } else { "Get Weather" },
            disabled: loading,
        },
        alert: state.error().map(ToString::to_string),
        card: state.result().and_then(render_card),
        theme: Theme::from_result(state.result()),
    }
}

fn render_card(result: &WeatherResult) -> Option<Card> {
    let main = result.main.as_ref()?;
    let condition = result.primary_condition();

    let name = result.name.as_deref().unwrap_or_default();
    let heading = match result.country() {
        Some(country) => format!("{name}, {country}"),
        None => name.to_owned(),
    };

    Some(Card {
        heading,
        description: condition
            .and_then(|c| c.description.clone())
            .unwrap_or_default(),
        icon_url: result.icon_id().map(icon_url),
        temperature: celsius(main.temp),
        feels_like: celsius(main.feels_like),
        humidity: main
            .humidity
            .map(|h| format!("{h}%"))
            .unwrap_or_else(|| PLACEHOLDER_VALUE.to_owned()),
        wind: result
            .wind_speed_mps()
            .map(|s| format!("{s} m/s"))
            .unwrap_or_else(|| PLACEHOLDER_VALUE.to_owned()),
        observed_at: result
            .observed_at()
            .map(|t| t.format("%H:%M UTC").to_string()),
    })
}

pub fn icon_url(icon: &str) -> String {
    format!("{ICON_BASE_URL}/{icon}@2x.png")
}

fn celsius(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{}°C", round_half_up(v)),
        None => PLACEHOLDER_VALUE.to_owned(),
    }
}

/// Round to the nearest integer, halves towards positive infinity.
fn round_half_up(value: f64) -> i64 {
    let floor = value.floor();
    let rounded = if value - floor >= 0.5 { floor + 1.0 } else { floor };
    rounded as i64
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.heading)?;
        if !self.description.is_empty() {
            writeln!(f, "{}", self.description)?;
        }
        if let Some(icon) = &self.icon_url {
            writeln!(f, "Icon:        {icon}")?;
        }
        writeln!(f, "Temperature: {}", self.temperature)?;
        writeln!(f, "Feels like:  {}", self.feels_like)?;
        writeln!(f, "Humidity:    {}", self.humidity)?;
        writeln!(f, "Wind:        {}", self.wind)?;
        if let Some(at) = &self.observed_at {
            writeln!(f, "Updated {at}")?;
        }
        Ok(())
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        writeln!(f, "{}", self.subtitle)?;

        if self.button.disabled {
            writeln!(f, "[{}]", self.button.label)?;
        }

        if let Some(alert) = &self.alert {
            writeln!(f, "Error: {alert}")?;
        }

        if let Some(card) = &self.card {
            writeln!(f)?;
            write!(f, "{card}")?;
        }

        Ok(())
    }
}
