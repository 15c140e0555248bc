//! Weather Forecast Server: entry point.

use std::sync::Arc;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use weather_forecast_server::config::{
    resolve_addr, resolve_allowed_origins, resolve_artifact_paths, PathOverrides,
};
use weather_forecast_server::service::{ForecastService, HistorySource};
use weather_forecast_server::transport::{HttpTransport, RouterOptions};
use weather_forecast_server::types::WeatherInput;

#[derive(Parser)]
#[command(
    name = "weather-forecast-server",
    about = "HTTP API for next-day global average temperature predictions",
    version
)]
struct Cli {
    /// Project directory holding models/, data/, and static/.
    /// Also reads WEATHER_FORECAST_HOME.
    #[arg(long)]
    base_dir: Option<String>,

    /// Path to the .wfm ensemble model.
    #[arg(long)]
    model: Option<String>,

    /// Path to the historical temperatures CSV.
    #[arg(long)]
    history: Option<String>,

    /// Path to the feature metadata JSON.
    #[arg(long)]
    metadata: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server (default).
    Serve {
        /// Listen address (host:port). Also reads WEATHER_ADDR, then PORT.
        #[arg(long)]
        addr: Option<String>,

        /// Directory with the web UI. Defaults to <base-dir>/static.
        #[arg(long)]
        static_dir: Option<String>,

        /// Comma-separated CORS origins. Also reads ALLOWED_ORIGINS.
        #[arg(long)]
        allowed_origins: Option<String>,
    },

    /// Load all artifacts and report what was found.
    Validate,

    /// Print model information as JSON.
    Info,

    /// Run one prediction offline and print the result as JSON.
    Predict {
        /// Target date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        date: Option<String>,

        /// Mean pressure in mb.
        #[arg(long, default_value_t = 1014.0)]
        pressure: f64,

        /// Mean relative humidity in percent.
        #[arg(long, default_value_t = 60.0)]
        humidity: f64,

        /// Mean wind speed in kph.
        #[arg(long, default_value_t = 10.0)]
        wind: f64,

        /// Mean precipitation in mm.
        #[arg(long, default_value_t = 0.5)]
        precip: f64,
    },

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   weather-forecast-server completions bash > ~/.local/share/bash-completion/completions/weather-forecast-server
    ///   weather-forecast-server completions zsh > ~/.zfunc/_weather-forecast-server
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let command = cli.command.unwrap_or(Commands::Serve {
        addr: None,
        static_dir: None,
        allowed_origins: None,
    });

    let static_override = match &command {
        Commands::Serve { static_dir, .. } => static_dir.clone(),
        _ => None,
    };
    let paths = resolve_artifact_paths(&PathOverrides {
        base_dir: cli.base_dir,
        model: cli.model,
        history: cli.history,
        metadata: cli.metadata,
        static_dir: static_override,
    });

    match command {
        Commands::Serve {
            addr,
            static_dir: _,
            allowed_origins,
        } => {
            let addr = resolve_addr(addr.as_deref());
            let allowed_origins = resolve_allowed_origins(allowed_origins.as_deref());

            tracing::info!("Global Weather Forecast API v{}", env!("CARGO_PKG_VERSION"));
            tracing::info!("Model: {}", paths.model.display());
            tracing::info!("CORS origins: {}", allowed_origins.join(", "));

            let service = Arc::new(ForecastService::load(&paths));
            let options = RouterOptions {
                static_dir: Some(paths.static_dir.clone()),
                allowed_origins,
            };
            let transport = HttpTransport::new(service, options);
            transport.run(&addr).await?;
        }

        Commands::Validate => {
            let service = ForecastService::load(&paths);
            let artifacts = service.artifacts();

            match &artifacts.model {
                Some(model) => {
                    println!("Model: {}", paths.model.display());
                    println!("  {}", model.description());
                    println!("  Final estimator: {}", model.final_estimator.name);
                    println!("  Features: {}", model.feature_names.join(", "));
                }
                None => println!("Model: not loaded ({})", paths.model.display()),
            }

            match (&artifacts.history, artifacts.history_source) {
                (Some(series), Some(HistorySource::File)) => {
                    println!("History: {} days from {}", series.len(), paths.history.display());
                    if let Some(last) = series.last_date() {
                        println!("  Last observation: {last}");
                    }
                }
                (Some(series), _) => println!("History: fallback series ({} days)", series.len()),
                (None, _) => println!("History: not loaded ({})", paths.history.display()),
            }

            match &artifacts.metadata {
                Some(meta) => println!(
                    "Metadata: version {}",
                    meta.model_version().unwrap_or_else(|| "unknown".to_string())
                ),
                None => println!("Metadata: not loaded ({})", paths.metadata.display()),
            }

            if !service.model_loaded() {
                std::process::exit(1);
            }
        }

        Commands::Info => {
            let service = ForecastService::load(&paths);
            println!("{}", serde_json::to_string_pretty(&service.model_info())?);
        }

        Commands::Predict {
            date,
            pressure,
            humidity,
            wind,
            precip,
        } => {
            let service = ForecastService::load(&paths);
            let mut input = WeatherInput {
                pressure_mean: pressure,
                humidity_mean: humidity,
                wind_mean: wind,
                precip_mean: precip,
                ..WeatherInput::default()
            };
            if let Some(date) = date {
                input.target_date = date;
            }

            match service.predict(&input) {
                Ok(response) => println!("{}", serde_json::to_string_pretty(&response)?),
                Err(e) => {
                    eprintln!("{}", serde_json::to_string_pretty(&e.to_body())?);
                    std::process::exit(1);
                }
            }
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(
                shell,
                &mut cmd,
                "weather-forecast-server",
                &mut std::io::stdout(),
            );
        }
    }

    Ok(())
}
