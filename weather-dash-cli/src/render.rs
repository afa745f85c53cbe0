//! Plain-text rendering of backend results.

use std::fmt::Write;

use chrono::NaiveDate;
use weather_dash_core::{Coordinates, CurrentWeather, Forecast, ForecastDay, Location};

const FAILURE_NOTICE: &str = "Something went wrong. Please try again later.";

pub fn notify(message: &str) {
    eprintln!("! {message}");
}

/// Generic notice shown whenever a backend call came back empty-handed.
pub fn notify_failure() {
    notify(FAILURE_NOTICE);
}

pub fn location_line(location: &Location) -> String {
    let place = if location.country.is_empty() {
        location.name.clone()
    } else {
        format!("{}, {}", location.name, location.country)
    };
    let sky = location.icon().map(|icon| icon.label()).unwrap_or("-");

    format!(
        "[{}] {place}: {:.0}°C, {:.0} mm, {sky}",
        location.id, location.temperature, location.rain
    )
}

pub fn current_line(coords: Coordinates, current: &CurrentWeather) -> String {
    let place = match current {
        CurrentWeather::Location(location) => location.name.clone(),
        CurrentWeather::Reading(_) => format!("{}, {}", coords.latitude, coords.longitude),
    };
    format!("{place}: {:.0}°C", current.temperature())
}

pub fn forecast_table(forecast: &Forecast) -> String {
    let mut out = format!("{}, {}\n", forecast.name, forecast.country);
    for day in forecast.daily.days() {
        // Writing to a String cannot fail.
        let _ = writeln!(out, "{}", day_line(&day));
    }
    out
}

fn day_line(day: &ForecastDay<'_>) -> String {
    let date = day
        .date()
        .map(date_label)
        .unwrap_or_else(|| day.time.to_string());
    let sky = day.icon().map(|icon| icon.label()).unwrap_or("-");

    format!(
        "{date:<10}  {}°C / {}°C  {} mm  {sky}",
        reading(day.temperature_max),
        reading(day.temperature_min),
        reading(day.rain_sum)
    )
}

/// Short weekday form, e.g. `Sat 17 Oct`.
fn date_label(date: NaiveDate) -> String {
    date.format("%a %d %b").to_string()
}

/// Right-aligned one-decimal value, or a dash where the backend sent `null`.
fn reading(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:>5.1}"),
        None => format!("{:>5}", "-"),
    }
}
