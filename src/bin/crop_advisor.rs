// Crop Advisor CLI
//
// Purpose: Load a reference dataset and run recommendations, yield estimates,
// crop rankings and soil checks from the command line. Output is pretty JSON.
// Usage: cargo run --bin crop_advisor -- recommend --nitrogen 90 --phosphorus 42 ...

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use crop_advisor_rust::{AdvisorConfig, CropAdvisor, CropQuery};
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "crop_advisor", about = "Crop recommendation and suitability scoring")]
struct Cli {
    /// JSON config file (environment variables override it)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Reference CSV (overrides config and CROP_DATASET)
    #[arg(short, long)]
    dataset: Option<PathBuf>,

    /// Neighbours per prediction (overrides config and KNN_K)
    #[arg(short, long)]
    k: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List known crops
    Crops,
    /// Show a crop's range profile
    Profile { crop: String },
    /// Recommend a crop for the given conditions
    Recommend(QueryArgs),
    /// Estimate yield potential of one crop
    Yield {
        crop: String,
        #[command(flatten)]
        query: QueryArgs,
    },
    /// Rank every known crop for the given conditions
    Rank {
        #[command(flatten)]
        query: QueryArgs,
        /// Only show the best N crops
        #[arg(long)]
        top: Option<usize>,
    },
    /// Soil health from N, P, K and pH
    Soil {
        #[arg(long)]
        nitrogen: f64,
        #[arg(long)]
        phosphorus: f64,
        #[arg(long)]
        potassium: f64,
        #[arg(long)]
        ph: f64,
    },
    /// Summary of the loaded dataset
    Summary,
}

#[derive(Args, Debug)]
struct QueryArgs {
    #[arg(long)]
    nitrogen: f64,
    #[arg(long)]
    phosphorus: f64,
    #[arg(long)]
    potassium: f64,
    #[arg(long)]
    temperature: f64,
    #[arg(long)]
    humidity: f64,
    #[arg(long)]
    ph: f64,
    #[arg(long)]
    rainfall: f64,
}

impl QueryArgs {
    fn to_query(&self) -> Result<CropQuery> {
        Ok(CropQuery::new(
            self.nitrogen,
            self.phosphorus,
            self.potassium,
            self.temperature,
            self.humidity,
            self.ph,
            self.rainfall,
        )?)
    }
}

fn main() -> Result<()> {
    // Initialize tracing (structured logging)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "crop_advisor_rust=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AdvisorConfig::load(path)?.with_env()?,
        None => AdvisorConfig::from_env()?,
    };
    if let Some(dataset) = &cli.dataset {
        config.dataset_path = dataset.clone();
    }
    if let Some(k) = cli.k {
        config.k = k;
    }
    config.validate()?;

    tracing::info!("Configuration:");
    tracing::info!("  dataset: {}", config.dataset_path.display());
    tracing::info!("  k: {}", config.k);

    // Soil health is a pure rule table, no dataset needed
    if let Command::Soil { nitrogen, phosphorus, potassium, ph } = cli.command {
        let advisor = CropAdvisor::from_config(&config);
        return print_json(&advisor.soil_health(nitrogen, phosphorus, potassium, ph));
    }

    let advisor = CropAdvisor::from_config(&config);
    advisor
        .load_csv(&config.dataset_path)
        .with_context(|| format!("Failed to load dataset {}", config.dataset_path.display()))?;

    match cli.command {
        Command::Crops => print_json(&advisor.list_known_crops()),
        Command::Profile { crop } => print_json(&advisor.get_range_profile(&crop)?),
        Command::Recommend(query) => print_json(&advisor.predict(&query.to_query()?)?),
        Command::Yield { crop, query } => {
            print_json(&advisor.yield_potential(&crop, &query.to_query()?)?)
        }
        Command::Rank { query, top } => {
            let limit = top.unwrap_or(config.top_n);
            print_json(&advisor.top_suitable_crops(&query.to_query()?, limit)?)
        }
        Command::Summary => print_json(&advisor.summary()?),
        Command::Soil { .. } => Ok(()),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
