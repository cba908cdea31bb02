use std::io::{self, Write};

use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::{InquireError, Password, PasswordDisplayMode, Text};
use tokio::sync::watch;
use tracing::{debug, info};
use weather_core::{
    API_KEY_ENV, Config, LookupState, OpenWeatherProvider, WeatherLookup, WeatherProvider,
    provider_from_config, render,
    view::{PLACEHOLDER, SUBTITLE, TITLE},
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Current weather for a city, from OpenWeather")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key in the config file.
    Configure,

    /// Show current weather for a city.
    Show {
        /// City name, e.g. "London" or "Karachi".
        #[arg(num_args = 0.., trailing_var_arg = true)]
        city: Vec<String>,
    },

    /// Prompt for cities until interrupted (default).
    Interactive,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command.unwrap_or(Command::Interactive) {
            Command::Configure => configure(),
            Command::Show { city } => show(&city.join(" ")).await,
            Command::Interactive => interactive().await,
        }
    }
}

/// Config file plus the environment key. The environment is read here only.
fn load_config() -> anyhow::Result<Config> {
    let config = Config::load()?.with_env_api_key(std::env::var(API_KEY_ENV).ok());
    debug!(has_api_key = config.has_api_key(), base_url = %config.base_url, "Loaded configuration");
    Ok(config)
}

fn build_lookup() -> anyhow::Result<WeatherLookup<OpenWeatherProvider>> {
    let config = load_config()?;
    let provider = provider_from_config(&config)?;
    Ok(WeatherLookup::from_config(provider, &config))
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let key = Password::new("OpenWeather API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .with_help_message("Get one at https://openweathermap.org/api")
        .prompt()
        .context("Failed to read API key")?;

    config.set_api_key(&key);
    if !config.has_api_key() {
        anyhow::bail!("API key must not be empty");
    }

    let path = config.save()?;
    info!(path = %path.display(), "Saved configuration");
    println!("Saved API key to {}", path.display());
    Ok(())
}

async fn show(city: &str) -> anyhow::Result<()> {
    let mut lookup = build_lookup()?;

    // Failures surface once, through the returned error.
    if let LookupState::Failed(err) = lookup.submit_query(city).await {
        return Err(err.into());
    }

    print!("{}", lookup.view());
    Ok(())
}

async fn interactive() -> anyhow::Result<()> {
    let mut lookup = build_lookup()?;
    println!("{TITLE}");
    println!("{SUBTITLE}");

    loop {
        let city = match Text::new("City:")
            .with_placeholder(PLACEHOLDER)
            .with_help_message("Enter to search, Esc to quit")
            .prompt()
        {
            Ok(city) => city,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => break,
            Err(err) => return Err(err).context("Failed to read city"),
        };

        submit_with_progress(&mut lookup, city, &mut io::stdout()).await?;

        let view = lookup.view();
        if let Some(alert) = &view.alert {
            println!("Error: {alert}");
        }
        if let Some(card) = &view.card {
            print!("{card}");
        }
        println!();
    }

    Ok(())
}

/// Submit `city`, writing the busy button label only if the request actually goes out.
async fn submit_with_progress<P: WeatherProvider, W: Write>(
    lookup: &mut WeatherLookup<P>,
    city: String,
    out: &mut W,
) -> anyhow::Result<LookupState> {
    let mut rx = lookup.subscribe();
    let (state, announced) =
        tokio::join!(lookup.submit_query(city), announce_loading(&mut rx, out));
    announced.context("Failed to write progress")?;
    Ok(state)
}

/// Wait for the next transition and print the loading label if it is `Loading`.
async fn announce_loading<W: Write>(
    rx: &mut watch::Receiver<LookupState>,
    out: &mut W,
) -> io::Result<bool> {
    if rx.changed().await.is_err() {
        return Ok(false);
    }

    let button = render(&rx.borrow_and_update(), "").button;
    if button.disabled {
        writeln!(out, "{}", button.label)?;
    }
    Ok(button.disabled)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_interactive() {
        let cli = Cli::try_parse_from(["weather"]).expect("parses");
        assert!(cli.command.is_none());
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn show_joins_multi_word_city() {
        let cli = Cli::try_parse_from(["weather", "-vv", "show", "New", "York"]).expect("parses");
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Some(Command::Show { city }) => assert_eq!(city.join(" "), "New York"),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn show_without_city_parses_to_empty() {
        let cli = Cli::try_parse_from(["weather", "show"]).expect("parses");
        match cli.command {
            Some(Command::Show { city }) => assert!(city.is_empty()),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    fn offline_lookup(api_key: Option<&str>) -> WeatherLookup<OpenWeatherProvider> {
        let config = Config {
            base_url: "http://127.0.0.1:1".into(),
            ..Config::default()
        };
        let provider = provider_from_config(&config).expect("client builds");
        WeatherLookup::new(provider, api_key.map(str::to_owned))
    }

    #[tokio::test]
    async fn validation_failure_prints_no_loading_label() {
        let mut lookup = offline_lookup(Some("KEY"));
        let mut out = Vec::new();

        let state = submit_with_progress(&mut lookup, "   ".into(), &mut out)
            .await
            .expect("writes succeed");

        assert!(state.error().is_some());
        assert!(out.is_empty(), "got: {:?}", String::from_utf8_lossy(&out));
    }

    #[tokio::test]
    async fn missing_key_prints_no_loading_label() {
        let mut lookup = offline_lookup(None);
        let mut out = Vec::new();

        let state = submit_with_progress(&mut lookup, "London".into(), &mut out)
            .await
            .expect("writes succeed");

        assert!(state.error().is_some());
        assert!(out.is_empty());
    }

    /// Answers after yielding once, so the request is observably in flight.
    #[derive(Debug)]
    struct SlowProvider;

    #[async_trait::async_trait]
    impl WeatherProvider for SlowProvider {
        async fn current_by_city(
            &self,
            _query: &weather_core::Query,
            _api_key: &str,
        ) -> Result<weather_core::WeatherResult, weather_core::LookupError> {
            tokio::task::yield_now().await;
            Ok(weather_core::WeatherResult::default())
        }
    }

    #[tokio::test]
    async fn request_in_flight_prints_loading_label() {
        let mut lookup = WeatherLookup::new(SlowProvider, Some("KEY".into()));
        let mut out = Vec::new();

        let state = submit_with_progress(&mut lookup, "London".into(), &mut out)
            .await
            .expect("writes succeed");

        assert!(matches!(state, LookupState::Success(_)));
        assert_eq!(String::from_utf8_lossy(&out), "Loading...\n");
    }

    #[tokio::test]
    async fn announce_skips_non_loading_transition() {
        let (tx, mut rx) = watch::channel(LookupState::Idle);
        tx.send_replace(LookupState::Failed(weather_core::LookupError::empty_city()));

        let mut out = Vec::new();
        let shown = announce_loading(&mut rx, &mut out).await.expect("writes succeed");

        assert!(!shown);
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn announce_stops_when_lookup_is_gone() {
        let (tx, mut rx) = watch::channel(LookupState::Idle);
        drop(tx);

        let mut out = Vec::new();
        assert!(!announce_loading(&mut rx, &mut out).await.expect("writes succeed"));
    }

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
