//! Core library for the `weather-dash` client.
//!
//! This crate defines:
//! - Device position lookup with bounded retries ([`LocationResolver`])
//! - A typed gateway to the dashboard backend ([`WeatherGateway`])
//! - Shared view models (locations, forecasts, coordinates)
//! - Configuration handling
//!
//! It is used by `weather-dash-cli`, but the two components can be driven by any front end.

pub mod config;
pub mod error;
pub mod gateway;
pub mod model;
pub mod resolver;

pub use config::{Config, GeolocationSettings};
pub use error::{GatewayError, LocationError};
pub use gateway::WeatherGateway;
pub use model::{
    AddLocationOutcome, Coordinates, CurrentWeather, DailyForecast, DeletionAck, Forecast,
    ForecastDay, Location, SearchMatch, WeatherIcon,
};
pub use resolver::{
    ConfiguredPosition, Delay, LocationResolver, PositionOptions, PositionSource, Resolution,
    TokioDelay,
};
