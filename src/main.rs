//! Flight Crash - command-line front end for the accident data pipeline.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use flight_crash_pipeline::data::write_view_csv;
use flight_crash_pipeline::extract::extract_uploads;
use flight_crash_pipeline::geo::{
    geocode_missing, CancelFlag, GeocodeCache, NominatimGeocoder, RateLimiter,
};
use flight_crash_pipeline::{
    load_dataset, load_with_geocodes, DashboardReport, Delimiter, FilterOptions, FilterSelection,
    PipelineConfig,
};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "flight-crash", about = "Flight accident data pipeline")]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Source data file (overrides config)
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// Field delimiter: "," or "tab" (overrides config)
    #[arg(long, global = true)]
    delimiter: Option<Delimiter>,

    /// Geocode cache file (overrides config)
    #[arg(long, global = true)]
    cache: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Default)]
struct FilterArgs {
    /// Keep only these years (repeatable)
    #[arg(long = "year")]
    years: Vec<i32>,

    /// Keep only these damage levels (repeatable)
    #[arg(long = "damage")]
    damage_levels: Vec<String>,

    /// Keep only these operators (repeatable)
    #[arg(long = "operator")]
    operators: Vec<String>,
}

impl FilterArgs {
    fn selection(&self) -> FilterSelection {
        FilterSelection::new()
            .with_years(self.years.iter().copied())
            .with_damage_levels(self.damage_levels.iter().cloned())
            .with_operators(self.operators.iter().cloned())
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print every dashboard aggregation for the filtered view as JSON
    Summary {
        #[command(flatten)]
        filters: FilterArgs,

        /// Length of ranking lists
        #[arg(long, default_value_t = 15)]
        top: usize,
    },
    /// Print the selectable years, damage levels and operators
    Options,
    /// Geocode unique locations missing from the cache and save it
    Geocode {
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Write the filtered view, newest first
    Export {
        output: PathBuf,

        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Extract CSV/JSON/TXT files from uploaded archives
    Extract {
        input_dir: PathBuf,

        #[arg(default_value = "data")]
        output_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    pretty_env_logger::init();
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;

    match cli.command {
        Commands::Summary { filters, top } => {
            let loaded = load_with_geocodes(&config)
                .with_context(|| format!("Could not load {}", config.data_path.display()))?;
            let view = filters.selection().apply(&loaded.dataset);
            let report = DashboardReport::build(&view, top);
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Options => {
            let loaded = load_dataset(&config)
                .with_context(|| format!("Could not load {}", config.data_path.display()))?;
            let options = FilterOptions::from_dataset(&loaded.dataset);
            println!("Years: {:?}", options.years);
            println!("Damage levels: {:?}", options.damage_levels);
            println!("Operators: {:?}", options.operators);
        }
        Commands::Geocode { filters } => run_geocode(&config, &filters)?,
        Commands::Export { output, filters } => {
            let loaded = load_with_geocodes(&config)
                .with_context(|| format!("Could not load {}", config.data_path.display()))?;
            let view = filters.selection().apply(&loaded.dataset);
            write_view_csv(&view, &output, config.delimiter)
                .with_context(|| format!("Could not write {}", output.display()))?;
            println!("Showing {} rows (after filters) -> {}", view.len(), output.display());
        }
        Commands::Extract {
            input_dir,
            output_dir,
        } => {
            let report = extract_uploads(&input_dir, &output_dir)?;
            for path in report.found() {
                println!("{}", path.display());
            }
            for (path, reason) in &report.failed {
                eprintln!("Failed {}: {reason}", path.display());
            }
        }
    }

    Ok(())
}

fn resolve_config(cli: &Cli) -> Result<PipelineConfig> {
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::from_file(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(data) = &cli.data {
        config.data_path = data.clone();
    }
    if let Some(delimiter) = cli.delimiter {
        config.delimiter = delimiter;
    }
    if let Some(cache) = &cli.cache {
        config.geocode_cache_path = cache.clone();
    }
    Ok(config)
}

fn run_geocode(config: &PipelineConfig, filters: &FilterArgs) -> Result<()> {
    let loaded = load_dataset(config)
        .with_context(|| format!("Could not load {}", config.data_path.display()))?;
    if loaded.dataset.has_coordinate_columns() {
        println!("Source data already has latitude/longitude columns; nothing to geocode.");
        return Ok(());
    }

    let mut cache = GeocodeCache::load_if_exists(&config.geocode_cache_path)?.unwrap_or_default();
    let geocoder = NominatimGeocoder::new(&config.geocoder)?;
    let mut limiter = RateLimiter::new(Duration::from_millis(config.geocoder.min_delay_ms));

    let view = filters.selection().apply(&loaded.dataset);
    let run = geocode_missing(view, &mut cache, &geocoder, &mut limiter, &CancelFlag::new());

    cache
        .save(&config.geocode_cache_path)
        .with_context(|| format!("Could not write {}", config.geocode_cache_path.display()))?;
    println!(
        "Geocoding finished: {} looked up, {} resolved. Saved {} rows to {}",
        run.looked_up,
        run.resolved,
        cache.len(),
        config.geocode_cache_path.display()
    );
    Ok(())
}
