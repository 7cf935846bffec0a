use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use aqiwatch::aqi;
use aqiwatch::dashboard::DashboardMetrics;
use aqiwatch::detail::{DetailState, HtmlDetailView, StationDetailPresenter};
use aqiwatch::filter::{Parameter, StationFilter};
use aqiwatch::map::{MapRenderer, SvgMapSurface};
use aqiwatch::telemetry::{HttpTelemetrySource, SeedTelemetrySource, TelemetrySource};
use aqiwatch::{AqiwatchConfig, LoadOutcome, StationRepository, logging, web};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, env = "AQIWATCH_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use the built-in demonstration stations instead of the telemetry endpoint
    #[arg(long, global = true)]
    seed: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List stations with their AQI classification
    Stations {
        /// Only stations whose name contains this text
        #[arg(short, long)]
        region: Option<String>,
        /// Headline reading: aqi, pm25, pm10, no2 or o3
        #[arg(short, long, default_value = "aqi")]
        parameter: Parameter,
    },
    /// Show every reading of one station
    Show { name: String },
    /// Render the station map to an SVG file
    Map {
        #[arg(short, long, default_value = "stations.svg")]
        out: PathBuf,
        #[arg(long, default_value_t = 960)]
        width: u32,
        #[arg(long, default_value_t = 640)]
        height: u32,
    },
    /// Serve the JSON API and rendered map from the demonstration stations
    Serve {
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AqiwatchConfig::load_from_path(cli.config.clone())?;
    logging::init(&config.logging, cli.verbose);

    match cli.command {
        Commands::Stations { region, parameter } => {
            let repository = load_repository(&config, cli.seed).await?;
            let filter = StationFilter { region, parameter };
            let snapshot = repository.snapshot();
            let stations = filter.apply(snapshot.stations());

            if stations.is_empty() {
                println!("No stations found");
            }
            for station in &stations {
                let category = aqi::classify(station.aqi);
                println!(
                    "{:<32} {:<20} {:<30} {}",
                    station.name,
                    filter.headline(station),
                    category.severity.label(),
                    station
                        .coordinates()
                        .map_or_else(|| "not mapped".to_string(), |c| c.format()),
                );
            }

            for alert in DashboardMetrics::from_stations(&stations).alerts {
                println!("{:?}: {} ({})", alert.level, alert.message, alert.stations.join(", "));
            }
        }
        Commands::Show { name } => {
            let repository = load_repository(&config, cli.seed).await?;
            let mut presenter = StationDetailPresenter::new(repository, HtmlDetailView::default());
            match presenter.show(&name) {
                DetailState::NotFound { name } => bail!("Station '{name}' not found"),
                DetailState::Found(detail) => {
                    println!("{}", detail.name);
                    println!(
                        "  AQI: {} ({})",
                        detail
                            .aqi
                            .map_or_else(|| "N/A".to_string(), |aqi| aqi.to_string()),
                        detail.severity.label()
                    );
                    if let Some(computed) = detail.computed_aqi {
                        println!("  AQI from readings: {computed:.0}");
                    }
                    for reading in detail.pollutants.iter().chain(&detail.weather) {
                        println!("  {}: {}", reading.label, reading.display());
                    }
                    println!("  Last update: {}", detail.last_update);
                    println!("  {}", detail.recommendation);
                }
            }
        }
        Commands::Map { out, width, height } => {
            let repository = load_repository(&config, cli.seed).await?;
            let snapshot = repository.snapshot();

            let mut map = MapRenderer::new(SvgMapSurface::new(width, height), &config.map);
            let summary = map.render(snapshot.stations())?;
            let svg = map.surface().to_svg()?;
            std::fs::write(&out, svg)
                .with_context(|| format!("Failed to write map to {}", out.display()))?;
            println!(
                "Wrote {} markers to {} ({} stations not mapped)",
                summary.placed,
                out.display(),
                summary.skipped
            );
        }
        Commands::Serve { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            let repository = load_repository(&config, true).await?;
            web::run(&config, repository).await?;
        }
    }

    Ok(())
}

async fn load_repository(config: &AqiwatchConfig, seed: bool) -> Result<Arc<StationRepository>> {
    let source: Arc<dyn TelemetrySource> = if seed {
        Arc::new(SeedTelemetrySource::new())
    } else {
        Arc::new(HttpTelemetrySource::new(&config.telemetry)?)
    };
    tracing::debug!("Loading stations from {}", source.describe());

    let repository = Arc::new(StationRepository::new(source, config.telemetry.timeout()));
    match repository.load().await {
        Ok(LoadOutcome::Applied(snapshot)) => {
            tracing::info!("Loaded {} stations", snapshot.len());
        }
        Ok(LoadOutcome::Superseded { .. }) => {}
        Err(e) => {
            let message = e.user_message();
            return Err(anyhow::Error::new(e).context(message));
        }
    }
    Ok(repository)
}
