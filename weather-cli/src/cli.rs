use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode, Select, Text};
use simple_weather_core::{
    ApiMode, Config, Coordinates, FixedGeolocator, Geolocator, IpApiGeolocator,
    LocationWeatherService, OpenWeatherProvider, PositionAcquirer, WeatherState,
};
use std::sync::Arc;
use tracing::debug;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "simple-weather", version, about = "Current weather for where you are")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure the OpenWeather API key and how to reach the API.
    Configure,

    /// Locate this machine and show the current weather there.
    Show {
        /// Use this latitude instead of looking up the position.
        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,

        /// Use this longitude instead of looking up the position.
        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,

        /// Print the derived values as JSON.
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { lat, lon, json } => {
                let coords = lat.zip(lon).map(|(lat, lon)| Coordinates::new(lat, lon));
                show(coords, json).await
            }
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("OpenWeather API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    if api_key.trim().is_empty() {
        bail!("API key must not be empty");
    }
    config.set_api_key(api_key.trim().to_string());

    let mode = Select::new("How should requests reach OpenWeather?", ApiMode::all().to_vec())
        .with_starting_cursor(ApiMode::all().iter().position(|m| *m == config.mode).unwrap_or(0))
        .prompt()
        .context("Failed to read API mode")?;
    config.mode = mode;

    match mode {
        ApiMode::Direct => {
            let api_url = Text::new("API URL:")
                .with_default(&config.api_url)
                .prompt()
                .context("Failed to read API URL")?;
            config.api_url = api_url;
        }
        ApiMode::Proxied => {
            let proxy_url = Text::new("Proxy URL:")
                .with_default(&config.proxy_url)
                .prompt()
                .context("Failed to read proxy URL")?;
            config.proxy_url = proxy_url;
        }
    }

    let path = config.save()?;
    println!("Configuration saved to {}", path.display());
    Ok(())
}

async fn show(coords: Option<Coordinates>, json: bool) -> anyhow::Result<()> {
    let config = Config::load()?.with_env()?;
    debug!(mode = %config.mode, fixed = coords.is_some(), "resolved configuration");
    let provider = Arc::new(OpenWeatherProvider::new(config.endpoints()?));

    let geolocator: Arc<dyn Geolocator> = match coords {
        Some(coords) => Arc::new(FixedGeolocator::new(coords)),
        None => Arc::new(IpApiGeolocator::new()),
    };
    let service = LocationWeatherService::new(PositionAcquirer::new(geolocator), provider);

    service.refresh().await.context("Could not determine your location")?;
    let state = service.state();

    if json {
        let out = serde_json::to_string_pretty(&state.summary())
            .context("Failed to serialize weather summary")?;
        println!("{out}");
    } else {
        print_human(&state);
    }

    if let Some(error) = state.error() {
        eprintln!("warning: {error}");
    }

    Ok(())
}

fn print_human(state: &WeatherState) {
    let place = state.full_location();
    if !place.is_empty() {
        println!("{place}");
    }

    if state.weather.is_none() {
        println!("No weather data available.");
        return;
    }

    println!("{}°C  {}", state.temperature(), state.weather_description());
    if let Some(feels_like) = state.feels_like() {
        println!("  Feels like   {feels_like}°C");
    }
    if let Some(humidity) = state.humidity() {
        println!("  Humidity     {humidity}%");
    }
    if let Some(wind) = state.wind_speed() {
        println!("  Wind         {wind} m/s");
    }
    if let Some(visibility) = state.visibility() {
        println!("  Visibility   {visibility} km");
    }

    let icon = state.weather_icon_url();
    if !icon.is_empty() {
        println!("  Icon         {icon}");
    }

    if let Some(updated) = state.last_updated {
        let local = updated.with_timezone(&chrono::Local);
        println!("Updated {}", local.format("%Y-%m-%d %H:%M:%S"));
    }
}
