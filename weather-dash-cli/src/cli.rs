use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use inquire::Text;
use tracing::debug;
use weather_dash_core::{
    AddLocationOutcome, Config, ConfiguredPosition, Coordinates, LocationResolver, WeatherGateway,
};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-dash", version, about = "Weather dashboard client")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Set the backend base URL.
    Configure {
        /// e.g. "http://localhost:8000"; prompted for when omitted.
        #[arg(long)]
        api_base: Option<String>,
    },

    /// Store a fixed device position used by `here`.
    SetPosition {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
    },

    /// Forget the stored device position.
    ClearPosition,

    /// List saved locations with their current weather.
    List,

    /// Show the weather at the current device position.
    Here {
        /// How many times to retry while the position is unavailable.
        #[arg(long)]
        retries: Option<u32>,
    },

    /// Show the daily forecast for a saved location.
    Forecast { id: i64 },

    /// Save a city.
    Add { city: String },

    /// Search cities known to the backend.
    Search { city: String },

    /// Remove a saved location.
    Delete { id: i64 },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let mut config = Config::load()?;
        debug!(command = ?self.command, "running command");

        match self.command {
            Command::Configure { api_base } => {
                let api_base = match api_base {
                    Some(url) => url,
                    None => prompt_api_base(&config)?,
                };
                // Fail early on a URL the gateway would refuse.
                let checked = WeatherGateway::new(&api_base)?;
                config.set_api_base(api_base);
                config.save()?;
                println!("Backend set to {}", checked.base_url());
                println!("Saved configuration to {}", Config::config_file_path()?.display());
            }
            Command::SetPosition { lat, lon } => {
                config.set_position(Coordinates::new(lat, lon));
                config.save()?;
                println!("Position set to {lat}, {lon}");
            }
            Command::ClearPosition => {
                config.clear_position();
                config.save()?;
                println!("Position cleared");
            }
            Command::List => {
                let locations = gateway(&config)?.list_locations().await;
                if locations.is_empty() {
                    println!("No saved locations.");
                }
                for location in &locations {
                    println!("{}", render::location_line(location));
                }
            }
            Command::Here { retries } => {
                let settings = config.geolocation;
                let resolver = LocationResolver::new(ConfiguredPosition::new(config.position))
                    .options(settings.position_options())
                    .retry_delay(settings.retry_delay());

                let Some(coords) = resolver.resolve(retries.unwrap_or(settings.max_retries)).await
                else {
                    render::notify("Could not determine your location.");
                    return Ok(());
                };

                match gateway(&config)?.fetch_current_weather(coords).await {
                    Some(current) => println!("{}", render::current_line(coords, &current)),
                    None => render::notify_failure(),
                }
            }
            Command::Forecast { id } => match gateway(&config)?.fetch_forecast(id).await {
                Some(forecast) => print!("{}", render::forecast_table(&forecast)),
                None => render::notify_failure(),
            },
            Command::Add { city } => match gateway(&config)?.add_location(&city).await {
                Some(AddLocationOutcome::Created(location)) => {
                    println!("Added {}", render::location_line(&location));
                }
                Some(AddLocationOutcome::Rejected { error }) => render::notify(&error),
                None => render::notify_failure(),
            },
            Command::Search { city } => {
                let matches = gateway(&config)?.search_location(&city).await;
                if matches.is_empty() {
                    println!("No matches for '{city}'.");
                }
                for found in &matches {
                    println!("{}", found.name());
                }
            }
            Command::Delete { id } => match gateway(&config)?.delete_location(id).await {
                Some(ack) if ack.is_deleted() => {
                    println!("{}", ack.message.as_deref().unwrap_or("Deleted"));
                }
                Some(ack) => render::notify(ack.error.as_deref().unwrap_or("Delete failed")),
                None => render::notify_failure(),
            },
        }

        Ok(())
    }
}

fn gateway(config: &Config) -> Result<WeatherGateway> {
    let api_base = config.api_base()?;
    WeatherGateway::new(&api_base).with_context(|| format!("Cannot use API base '{api_base}'"))
}

fn prompt_api_base(config: &Config) -> Result<String> {
    let mut prompt = Text::new("Backend base URL:");
    if let Some(current) = config.api_base.as_deref() {
        prompt = prompt.with_default(current);
    } else {
        prompt = prompt.with_placeholder("http://localhost:8000");
    }

    prompt.prompt().context("Failed to read API base URL")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_negative_coordinates() {
        let cli = Cli::try_parse_from([
            "weather-dash",
            "set-position",
            "--lat",
            "-33.87",
            "--lon",
            "151.21",
        ])
        .expect("arguments must parse");

        match cli.command {
            Command::SetPosition { lat, lon } => {
                assert_eq!(lat, -33.87);
                assert_eq!(lon, 151.21);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn here_retries_are_optional() {
        let cli = Cli::try_parse_from(["weather-dash", "here"]).unwrap();
        assert!(matches!(cli.command, Command::Here { retries: None }));

        let cli = Cli::try_parse_from(["weather-dash", "here", "--retries", "0"]).unwrap();
        assert!(matches!(cli.command, Command::Here { retries: Some(0) }));
    }
}
