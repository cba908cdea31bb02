//! The lookup state machine.
//!
//! [`reduce`] is a pure transition function over [`LookupState`]; [`WeatherLookup`]
//! drives it for one submission at a time and publishes every transition on a
//! `watch` channel.

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::{
    Config, LookupError, Query, WeatherResult, WeatherProvider,
    view::{View, render},
};

/// Lifecycle of the current lookup. A result and an error can never coexist.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum LookupState {
    #[default]
    Idle,
    Loading,
    Success(WeatherResult),
    Failed(LookupError),
}

impl LookupState {
    pub fn is_loading(&self) -> bool {
        matches!(self, LookupState::Loading)
    }

    pub fn result(&self) -> Option<&WeatherResult> {
        match self {
            LookupState::Success(result) => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&LookupError> {
        match self {
            LookupState::Failed(err) => Some(err),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A valid query was submitted; the request is about to go out.
    Submitted,
    /// The submission failed before any request was made.
    Rejected(LookupError),
    /// The in-flight request finished.
    Settled(Result<WeatherResult, LookupError>),
}

/// Apply one event. While loading, only `Settled` moves the state; a settlement
/// that arrives when nothing is in flight is dropped.
pub fn reduce(state: LookupState, event: Event) -> LookupState {
    match (state, event) {
        (LookupState::Loading, Event::Settled(Ok(result))) => LookupState::Success(result),
        (LookupState::Loading, Event::Settled(Err(err))) => LookupState::Failed(err),
        (LookupState::Loading, _) => LookupState::Loading,
        (state, Event::Settled(_)) => state,
        (_, Event::Submitted) => LookupState::Loading,
        (_, Event::Rejected(err)) => LookupState::Failed(err),
    }
}

/// One weather lookup widget: the city input, the credential and the request state.
#[derive(Debug)]
pub struct WeatherLookup<P> {
    provider: P,
    api_key: Option<String>,
    city: String,
    state: watch::Sender<LookupState>,
}

impl<P: WeatherProvider> WeatherLookup<P> {
    /// `api_key` is trimmed; blank means not configured.
    pub fn new(provider: P, api_key: Option<String>) -> Self {
        let api_key = api_key
            .map(|k| k.trim().to_owned())
            .filter(|k| !k.is_empty());
        let (state, _) = watch::channel(LookupState::Idle);

        Self {
            provider,
            api_key,
            city: String::new(),
            state,
        }
    }

    pub fn from_config(provider: P, config: &Config) -> Self {
        Self::new(provider, config.api_key().map(str::to_owned))
    }

    pub fn set_city(&mut self, city: impl Into<String>) {
        self.city = city.into();
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn state(&self) -> LookupState {
        self.state.borrow().clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading()
    }

    /// Observe every state transition.
    pub fn subscribe(&self) -> watch::Receiver<LookupState> {
        self.state.subscribe()
    }

    pub fn view(&self) -> View {
        render(&self.state.borrow(), &self.city)
    }

    /// Set the city input and look it up. Returns the settled state.
    pub async fn submit_query(&mut self, city: impl Into<String>) -> LookupState {
        self.set_city(city);
        self.submit().await
    }

    /// Look up the current city input.
    pub async fn submit(&mut self) -> LookupState {
        if self.is_loading() {
            debug!("Ignoring submission while a request is in flight");
            return self.state();
        }

        let Some(api_key) = self.api_key.clone() else {
            return self.reject(LookupError::missing_api_key());
        };

        let Some(query) = Query::parse(&self.city) else {
            return self.reject(LookupError::empty_city());
        };

        self.dispatch(Event::Submitted);
        let outcome = self.provider.current_by_city(&query, &api_key).await;

        match &outcome {
            Ok(_) => info!(city = %query, "Weather lookup succeeded"),
            Err(err) => warn!(city = %query, kind = %err.kind, message = %err.message, "Weather lookup failed"),
        }

        self.dispatch(Event::Settled(outcome));
        self.state()
    }

    fn reject(&mut self, err: LookupError) -> LookupState {
        debug!(kind = %err.kind, "Rejecting submission");
        self.dispatch(Event::Rejected(err));
        self.state()
    }

    fn dispatch(&self, event: Event) {
        self.state
            .send_modify(|state| *state = reduce(std::mem::take(state), event));
    }
}
