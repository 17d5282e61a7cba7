use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use devpulse::config::Config;
use devpulse::logging;
use devpulse::rest::{self, ApiDoc};
use devpulse::tour::{
    FileFlagStore, FlagStore, HistoryRouter, MemoryFlagStore, StepCatalog, TourController,
    TourService,
};

#[derive(Parser)]
#[command(name = "devpulse")]
#[command(about = "Developer analytics dashboard backend with a guided product tour")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file path
    #[arg(short, long)]
    config: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the REST API and tour service (default)
    Serve {
        /// Port to listen on (overrides api.port)
        #[arg(short, long)]
        port: Option<u16>,

        /// Keep the completed flag in memory only
        #[arg(long)]
        ephemeral: bool,
    },

    /// Write the effective configuration to .devpulse/config.toml
    Init {
        /// Overwrite an existing config file
        #[arg(short, long)]
        force: bool,
    },

    /// Show whether the tour has been completed
    Status,

    /// Forget the completed flag so the tour shows again
    Reset,

    /// Print the tour catalog
    Catalog {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the OpenAPI document
    Openapi {
        /// Output as YAML instead of JSON
        #[arg(long)]
        yaml: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first (needed for logging setup)
    let config = Config::load(cli.config.as_deref())?;

    let is_server_mode = matches!(cli.command, None | Some(Commands::Serve { .. }));
    let logging_handle = logging::init_logging(&config, is_server_mode, cli.debug)?;

    match cli.command {
        Some(Commands::Serve { port, ephemeral }) => {
            cmd_serve(config, port, ephemeral, logging_handle.log_file_path).await?;
        }
        None => {
            cmd_serve(config, None, false, logging_handle.log_file_path).await?;
        }
        Some(Commands::Init { force }) => {
            cmd_init(&config, force)?;
        }
        Some(Commands::Status) => {
            cmd_status(&config)?;
        }
        Some(Commands::Reset) => {
            cmd_reset(&config)?;
        }
        Some(Commands::Catalog { json }) => {
            cmd_catalog(&config, json)?;
        }
        Some(Commands::Openapi { yaml }) => {
            cmd_openapi(yaml)?;
        }
    }

    Ok(())
}

async fn cmd_serve(
    config: Config,
    port: Option<u16>,
    ephemeral: bool,
    log_file_path: Option<PathBuf>,
) -> Result<()> {
    let port = port.unwrap_or(config.api.port);
    let catalog = Arc::new(config.tour_catalog()?);

    let store: Box<dyn FlagStore> = if ephemeral {
        Box::new(MemoryFlagStore::new(false))
    } else {
        Box::new(FileFlagStore::in_dir(&config.state_path()))
    };

    let controller = TourController::new(
        Arc::clone(&catalog),
        store,
        HistoryRouter::default(),
        config.tour.mount_delay(),
    )
    .context("Invalid tour catalog")?;
    let (tour, service_task) = TourService::spawn(controller, config.tour.auto_start);

    println!("Starting devpulse...");
    println!("  Port: {}", port);
    println!(
        "  Tour: {} groups, {} steps",
        catalog.len(),
        catalog.total_steps()
    );
    if let Some(log_path) = &log_file_path {
        println!("  Log:  {}", log_path.display());
    }
    println!("  Endpoints:");
    println!("    GET  /api/v1/tour            Current tour view");
    println!("    GET  /api/v1/tour/stream     Tour view event stream");
    println!("    POST /api/v1/tour/events     Overlay events");
    println!("    POST /api/v1/tour/location   Host route changes");
    println!("    GET  /swagger-ui             API documentation");
    println!();

    let state = rest::ApiState::new(tour.clone(), catalog, config);
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for ctrl-c");
        }
        tracing::info!("shutting down");
    };
    let result = rest::serve(state, port, shutdown).await;

    tour.shutdown();
    if let Err(e) = service_task.await {
        tracing::warn!(error = %e, "tour service task failed");
    }

    result
}

fn cmd_init(config: &Config, force: bool) -> Result<()> {
    let path = Config::project_config_path();
    if path.exists() && !force {
        println!("{} already exists (use --force to overwrite)", path.display());
        return Ok(());
    }
    config.save()?;
    println!("Wrote {}", path.display());
    Ok(())
}

fn cmd_status(config: &Config) -> Result<()> {
    let store = FileFlagStore::in_dir(&config.state_path());
    match store.record()? {
        Some(record) if record.completed => {
            println!(
                "Tour completed ({})",
                record.updated_at.format("%Y-%m-%d %H:%M:%S UTC")
            );
        }
        Some(record) => {
            println!(
                "Tour not completed (reset {})",
                record.updated_at.format("%Y-%m-%d %H:%M:%S UTC")
            );
        }
        None => println!("Tour not completed"),
    }
    println!("State file: {}", store.path().display());
    Ok(())
}

fn cmd_reset(config: &Config) -> Result<()> {
    let store = FileFlagStore::in_dir(&config.state_path());
    store.clear()?;
    println!("Tour reset; it will show again on next start");
    Ok(())
}

fn cmd_catalog(config: &Config, json: bool) -> Result<()> {
    let catalog = config.tour_catalog()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&catalog)?);
        return Ok(());
    }

    print_catalog(&catalog);
    Ok(())
}

fn print_catalog(catalog: &StepCatalog) {
    println!(
        "{} groups, {} steps",
        catalog.len(),
        catalog.total_steps()
    );
    for (index, group) in catalog.groups().iter().enumerate() {
        println!();
        println!("[{}] {}", index, group.route);
        let offset = catalog.offset(index);
        for (step_index, step) in group.steps.iter().enumerate() {
            println!(
                "  {:>2}. {:<28} {}",
                offset + step_index + 1,
                step.title,
                step.target
            );
        }
    }
}

fn cmd_openapi(yaml: bool) -> Result<()> {
    let spec = if yaml {
        ApiDoc::yaml()?
    } else {
        ApiDoc::json()?
    };
    println!("{}", spec);
    Ok(())
}
