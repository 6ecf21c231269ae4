//! Point d'entrée CLI pour geo-scripts

use anyhow::Result;
use clap::Parser;
use tracing::{debug, Level};
use tracing_subscriber::{fmt, EnvFilter};

use geo_scripts::filter::ThresholdFilter;
use geo_scripts::Settings;

// Charger .env au démarrage
fn load_env() {
    // Chercher .env dans le répertoire courant ou parent
    if dotenvy::dotenv().is_err() {
        // Essayer depuis le répertoire du binaire
        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                let _ = dotenvy::from_path(dir.join(".env"));
            }
        }
    }
}

mod cli;

use cli::Commands;

/// Conversions, surfaces, requêtes spatiales et plans de levé
#[derive(Parser)]
#[command(name = "geo-scripts")]
#[command(author, version)]
#[command(about = "Conversions KML/KMZ/GeoJSON, surfaces, requêtes spatiales et plans de levé")]
struct Cli {
    /// Augmenter la verbosité (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Mode silencieux
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Preset (a1/a3) ou chemin d'une configuration JSON
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

fn main() -> Result<()> {
    // Charger .env avant tout
    load_env();

    let cli = Cli::parse();

    // Configurer le logging
    init_logging(cli.verbose, cli.quiet);

    let settings = Settings::resolve(cli.config.as_deref())?.with_env();
    debug!(?settings, "Settings resolved");

    match cli.command {
        Commands::Classify { coords, input } => cli::cmd_classify(coords.as_deref(), input.as_deref())?,
        Commands::KmzToKml { kmz } => cli::cmd_kmz_to_kml(&kmz)?,
        Commands::Unzip { archive, dest } => cli::cmd_unzip(&archive, &dest)?,
        Commands::Convert { input, output } => cli::cmd_convert(&input, &output)?,
        Commands::Area {
            input,
            zone,
            north,
            south,
            output,
            report,
        } => cli::cmd_area(
            &settings,
            &input,
            zone,
            north,
            south,
            output.as_deref(),
            report.as_deref(),
        )?,
        Commands::Filter {
            input,
            output,
            axis,
            op,
            threshold,
        } => cli::cmd_filter(&input, &output, ThresholdFilter::new(axis, op, threshold))?,
        Commands::Benchmark {
            target,
            reference,
            parquet,
            report,
        } => cli::cmd_benchmark(&target, &reference, parquet, report.as_deref())?,
        Commands::AddAttribute {
            input,
            key,
            value,
            output,
        } => cli::cmd_add_attribute(&input, &key, &value, &output)?,
        Commands::Similarity { a, b } => cli::cmd_similarity(&a, &b)?,
        Commands::Scale {
            input,
            paper,
            mode,
            fixed,
            utm,
        } => cli::cmd_scale(&settings, &input, paper.as_deref(), mode, fixed, utm)?,
        Commands::Survey {
            input,
            output,
            scale,
            heuristic,
            utm,
            auto_zone,
        } => cli::cmd_survey(&settings, &input, &output, scale, heuristic, utm, auto_zone)?,
        Commands::Reproject {
            input,
            output,
            from,
            to,
        } => cli::cmd_reproject(&input, &output, from, to)?,
        Commands::ToMercator { lat, lon } => cli::cmd_to_mercator(lat, lon)?,
    }

    Ok(())
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::WARN,
        (_, 0) => Level::INFO,
        (_, 1) => Level::DEBUG,
        (_, _) => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .init();
}
