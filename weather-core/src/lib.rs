//! Core library for the `weather` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The OpenWeather provider behind the [`WeatherProvider`] seam
//! - The lookup state machine ([`WeatherLookup`], [`reduce`])
//! - Pure rendering of lookup state into a [`View`]
//!
//! It is used by `weather-cli`, but can also be reused by other front ends.

pub mod config;
pub mod error;
pub mod lookup;
pub mod model;
pub mod provider;
pub mod view;

pub use config::{API_KEY_ENV, Config};
pub use error::{ErrorKind, LookupError};
pub use lookup::{Event, LookupState, WeatherLookup, reduce};
pub use model::{Query, WeatherResult};
pub use provider::{WeatherProvider, openweather::OpenWeatherProvider, provider_from_config};
pub use view::{Theme, View, render};
