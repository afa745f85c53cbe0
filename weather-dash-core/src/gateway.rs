//! Typed client for the dashboard backend.
//!
//! Every endpoint has two entry points: a `try_` method that keeps the failure
//! reason, and a plain method that logs the failure and returns the endpoint's
//! sentinel (an empty `Vec` or `None`) so callers can degrade to an empty view.
//! Nothing here retries.

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::{
    error::GatewayError,
    model::{
        AddLocationOutcome, AddLocationRequest, Coordinates, CurrentWeather, DeletionAck,
        Forecast, Location, SearchMatch,
    },
};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct WeatherGateway {
    base: Url,
    http: Client,
}

impl WeatherGateway {
    pub fn new(base: &str) -> Result<Self, GatewayError> {
        let invalid = |reason: String| GatewayError::InvalidBaseUrl {
            url: base.to_string(),
            reason,
        };

        let parsed = Url::parse(base).map_err(|err| invalid(err.to_string()))?;
        if parsed.cannot_be_a_base() {
            return Err(invalid("URL cannot have a path".to_string()));
        }

        let http = Client::builder().timeout(DEFAULT_TIMEOUT).build()?;

        Ok(Self { base: parsed, http })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// `GET /locations`: saved locations with their current weather.
    pub async fn list_locations(&self) -> Vec<Location> {
        self.try_list_locations()
            .await
            .inspect_err(|err| log_failure("list locations", err))
            .unwrap_or_default()
    }

    pub async fn try_list_locations(&self) -> Result<Vec<Location>, GatewayError> {
        self.execute(self.request(Method::GET, &["locations"])).await
    }

    /// `POST /locations/single`: weather at the given coordinates.
    pub async fn fetch_current_weather(&self, coordinates: Coordinates) -> Option<CurrentWeather> {
        self.try_fetch_current_weather(coordinates)
            .await
            .inspect_err(|err| log_failure("fetch current weather", err))
            .ok()
    }

    pub async fn try_fetch_current_weather(
        &self,
        coordinates: Coordinates,
    ) -> Result<CurrentWeather, GatewayError> {
        let request = self
            .request(Method::POST, &["locations", "single"])
            .json(&coordinates);
        self.execute(request).await
    }

    /// `GET /forecast/{id}`: daily forecast for a saved location.
    pub async fn fetch_forecast(&self, location_id: i64) -> Option<Forecast> {
        self.try_fetch_forecast(location_id)
            .await
            .inspect_err(|err| log_failure("fetch forecast", err))
            .ok()
    }

    pub async fn try_fetch_forecast(&self, location_id: i64) -> Result<Forecast, GatewayError> {
        let id = location_id.to_string();
        let forecast: Forecast = self
            .execute(self.request(Method::GET, &["forecast", id.as_str()]))
            .await?;

        if !forecast.daily.is_consistent() {
            return Err(GatewayError::InconsistentForecast);
        }

        Ok(forecast)
    }

    /// `POST /locations`: save a city.
    pub async fn add_location(&self, city: &str) -> Option<AddLocationOutcome> {
        self.try_add_location(city)
            .await
            .inspect_err(|err| log_failure("add location", err))
            .ok()
    }

    pub async fn try_add_location(&self, city: &str) -> Result<AddLocationOutcome, GatewayError> {
        let request = self
            .request(Method::POST, &["locations"])
            .json(&AddLocationRequest { city });
        self.execute(request).await
    }

    /// `GET /locations/{city}`: cities matching a search term.
    pub async fn search_location(&self, city: &str) -> Vec<SearchMatch> {
        self.try_search_location(city)
            .await
            .inspect_err(|err| log_failure("search location", err))
            .unwrap_or_default()
    }

    pub async fn try_search_location(&self, city: &str) -> Result<Vec<SearchMatch>, GatewayError> {
        self.execute(self.request(Method::GET, &["locations", city]))
            .await
    }

    /// `DELETE /locations/{id}`: remove a saved location.
    pub async fn delete_location(&self, location_id: i64) -> Option<DeletionAck> {
        self.try_delete_location(location_id)
            .await
            .inspect_err(|err| log_failure("delete location", err))
            .ok()
    }

    pub async fn try_delete_location(&self, location_id: i64) -> Result<DeletionAck, GatewayError> {
        let id = location_id.to_string();
        self.execute(self.request(Method::DELETE, &["locations", id.as_str()]))
            .await
    }

    fn request(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        let url = self.endpoint(segments);
        debug!(%method, %url, "backend request");
        self.http.request(method, url)
    }

    /// Base URL with `segments` appended, each percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        // Checked in `new`: the base always accepts path segments.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, GatewayError> {
        let res = request.send().await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(GatewayError::Status {
                status,
                body: truncate_body(&body),
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

fn log_failure(operation: &str, err: &GatewayError) {
    warn!(operation, error = %err, "backend request failed, returning empty result");
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}
