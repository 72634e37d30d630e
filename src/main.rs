use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Deserialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use rocket_forge::api::{self, SecurityConfig};
use rocket_forge::config::AppConfig;
use rocket_forge::db::Database;
use rocket_forge::export::{EncoderRegistry, TemplateExporter};
use rocket_forge::models::{CreateDesignInput, Design, DesignAnalysis};
use rocket_forge::service::DesignService;
use rocket_forge::{graph, physics};

#[derive(Parser)]
#[command(name = "rforge")]
#[command(about = "Parametric model rocket designer with cutting-template export")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Port for HTTP API
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
    /// Export a design JSON file as a cutting template
    Export {
        /// Design document or creation input (JSON)
        file: PathBuf,

        /// svg, pdf, cutterA or cutterB
        #[arg(short, long, default_value = "svg")]
        format: String,

        /// Output path (defaults to a name derived from the design)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Validate a design JSON file and print its analysis
    Check {
        /// Design document or creation input (JSON)
        file: PathBuf,

        /// Print the analysis as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
}

/// Either a stored design document or the body of a create request.
#[derive(Deserialize)]
#[serde(untagged)]
enum DesignFile {
    Stored(Box<Design>),
    Input(CreateDesignInput),
}

fn load_design(path: &PathBuf) -> anyhow::Result<Design> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let file: DesignFile = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a design document", path.display()))?;
    Ok(match file {
        DesignFile::Stored(design) => *design,
        DesignFile::Input(input) => Design::from_input(Uuid::nil(), input),
    })
}

fn print_summary(design: &Design, analysis: &DesignAnalysis) {
    println!("{} (version {})", design.name, design.version);
    for section in &design.sections {
        println!(
            "  {:<12} {:<12} [{:.2}, {:.2}]",
            section.id,
            section.kind.as_str(),
            section.start,
            section.end
        );
    }
    for mass in &analysis.mass.components {
        let Some(part) = design.components.iter().find(|c| c.id == mass.component_id) else {
            continue;
        };
        let material = part.material.unwrap_or(design.settings.default_material);
        println!(
            "  {:<12} {:<20} x{} {:>8.2} g",
            part.id,
            material.as_str(),
            mass.copies,
            mass.mass_g
        );
    }

    let s = &analysis.stability;
    println!("Total mass:  {:.2} g", analysis.mass.total_mass_g);
    println!("CG / CP:     {:.1} mm / {:.1} mm", s.center_of_gravity_mm, s.center_of_pressure_mm);
    println!("Margin:      {:.2} cal ({})", s.margin_calibers, s.classification.as_str());
    println!(
        "Cd {:.3}, estimated apogee {:.0} m",
        analysis.performance.drag_coefficient, analysis.performance.estimated_height_m
    );
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "rocket_forge=debug,tower_http=debug".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn serve(config: AppConfig, port: u16) -> anyhow::Result<()> {
    tracing::info!("Starting rocket-forge server on port {}", port);

    let db = match &config.database_path {
        Some(path) => Database::open(path.clone())?,
        None => Database::open_default()?,
    };
    db.migrate()?;

    let service = DesignService::new(Arc::new(db), &config);
    let app = api::create_router_with_security(service, SecurityConfig::from_config(&config));

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    tracing::info!("rocket-forge listening on http://127.0.0.1:{}", port);

    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();
    let config = AppConfig::from_env();
    let exporter = TemplateExporter::new(EncoderRegistry::default(), config.outline_samples);

    match cli.command {
        Some(Commands::Serve { port }) => serve(config, port).await?,
        Some(Commands::Export { file, format, out }) => {
            let design = load_design(&file)?;
            let artifact = exporter.export(&design, &format)?;
            let out = out.unwrap_or_else(|| PathBuf::from(&artifact.file_name));
            std::fs::write(&out, &artifact.bytes)
                .with_context(|| format!("Failed to write {}", out.display()))?;
            println!("Wrote {} ({} bytes)", out.display(), artifact.bytes.len());
        }
        Some(Commands::Check { file, json }) => {
            let design = load_design(&file)?;
            if let Err(errors) = graph::validate(&design) {
                for v in &errors.violations {
                    println!("{:?} at {}: {}", v.kind, v.field, v.message);
                }
                anyhow::bail!("{} violation(s) found", errors.violations.len());
            }
            let analysis = physics::analyze(&design, exporter.samples_for(&design));
            if json {
                println!("{}", serde_json::to_string_pretty(&analysis)?);
            } else {
                print_summary(&design, &analysis);
            }
        }
        None => serve(config, 3000).await?,
    }

    Ok(())
}
