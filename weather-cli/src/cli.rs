use anyhow::anyhow;
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode, Select};
use weather_core::{
    Config, OpenWeatherClient, ReportView, Resolver, UnitPreference, WeatherError, WeatherQuery,
    config::SUPPORTED_LANGS, provider_from_config,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Weather CLI")]
pub struct Cli {
    /// Log provider calls and cache activity to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key and default display settings.
    Configure,

    /// Show current weather and the short-range forecast for a city.
    Show {
        /// City name in any script, e.g. "Seoul" or "서울".
        city: String,

        /// auto, metric or imperial. Defaults to the configured value.
        #[arg(long)]
        units: Option<UnitPreference>,

        /// Display language (kr, en). Defaults to the configured value.
        #[arg(long)]
        lang: Option<String>,

        /// Print the report as JSON instead of text.
        #[arg(long)]
        raw: bool,
    },

    /// Print the coordinates a city name resolves to.
    Locate {
        city: String,

        #[arg(long)]
        lang: Option<String>,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { city, units, lang, raw } => {
                let config = Config::load()?;
                let query = WeatherQuery::new(
                    city,
                    units.unwrap_or(config.units),
                    lang.unwrap_or_else(|| config.lang.clone()),
                );
                show(&config, &query, raw).await
            }
            Command::Locate { city, lang } => {
                let config = Config::load()?;
                let lang = lang.unwrap_or_else(|| config.lang.clone());
                locate(&config, &city, &lang).await
            }
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("OpenWeather API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()?;
    if api_key.trim().is_empty() {
        return Err(anyhow!("API key must not be empty"));
    }
    config.set_api_key(api_key.trim().to_string());

    config.units = Select::new("Default units:", UnitPreference::all().to_vec()).prompt()?;
    config.lang = Select::new("Display language:", SUPPORTED_LANGS.to_vec())
        .prompt()?
        .to_string();

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn show(config: &Config, query: &WeatherQuery, raw: bool) -> anyhow::Result<()> {
    // Blank input is a prompt for input, not a configuration problem.
    query.key().map_err(user_facing)?;

    let resolver = Resolver::new(client(config)?);
    let report = resolver.resolve(query).await.map_err(user_facing)?;

    if raw {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", ReportView::new(&report).render_text());
    }
    Ok(())
}

async fn locate(config: &Config, city: &str, lang: &str) -> anyhow::Result<()> {
    let resolver = Resolver::new(client(config)?);
    let location = resolver.locate(city, lang).await.map_err(user_facing)?;

    println!(
        "{} ({}) {:.4}, {:.4}",
        location.display_name(lang),
        location.country.as_deref().unwrap_or("—"),
        location.lat,
        location.lon,
    );
    Ok(())
}

fn client(config: &Config) -> anyhow::Result<OpenWeatherClient> {
    provider_from_config(config).map_err(user_facing)
}

fn user_facing(err: WeatherError) -> anyhow::Error {
    tracing::debug!(error = %err, "query failed");
    anyhow!(err.user_message())
}
