//! leafcure CLI
//!
//! Identify leaf diseases from photos and print a treatment suggestion.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::{error, info};

use leafcure::backend::backend_name;
use leafcure::dataset::discover_classes;
use leafcure::model::{scaffold_artifact, LeafClassifierConfig, ModelManifest};
use leafcure::remedy::{self, REMEDY_CATALOG};
use leafcure::utils::logging::{init_logging, LogConfig};
use leafcure::utils::{format_confidence, format_duration};
use leafcure::{diagnosis, ModelHandle, ModelLoadError};

/// Leaf disease identification with cure suggestions
#[derive(Parser, Debug)]
#[command(name = "leafcure")]
#[command(version)]
#[command(about = "Identify leaf diseases and suggest a cure", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, default_value = "false")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, default_value = "false", conflicts_with = "verbose")]
    quiet: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Classify a leaf image and print the cure suggestion
    Diagnose {
        /// Path to the model manifest
        #[arg(short, long, env = "LEAFCURE_MODEL", default_value = "models/tomato.json")]
        model: PathBuf,

        /// Path to the leaf image (JPEG or PNG)
        #[arg(short, long)]
        image: PathBuf,

        /// Print the result as JSON
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Look up the cure suggestion for a disease label
    Remedy {
        /// Label, e.g. "Tomato___Early_blight" or "late blight"
        label: String,
    },

    /// List the remedy catalog in matching order
    Catalog,

    /// Show the labels and settings stored in a model manifest
    Inspect {
        /// Path to the model manifest
        #[arg(short, long, env = "LEAFCURE_MODEL", default_value = "models/tomato.json")]
        model: PathBuf,
    },

    /// Write an untrained model artifact for the classes of a dataset folder
    Scaffold {
        /// Dataset directory with one subdirectory per class
        #[arg(short, long, default_value = "data/tomato")]
        data_dir: PathBuf,

        /// Where to write the manifest (weights go next to it)
        #[arg(short, long, default_value = "models/tomato.json")]
        output: PathBuf,

        /// Square input size in pixels
        #[arg(long, default_value = "128")]
        input_size: usize,

        /// Filters in the first convolutional block
        #[arg(long, default_value = "32")]
        base_filters: usize,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_config = if cli.verbose {
        LogConfig::verbose()
    } else if cli.quiet {
        LogConfig::quiet()
    } else {
        LogConfig::default()
    };
    let _ = init_logging(&log_config);

    let outcome = match cli.command {
        Commands::Diagnose { model, image, json } => cmd_diagnose(&model, &image, json),
        Commands::Remedy { label } => {
            cmd_remedy(&label);
            Ok(())
        }
        Commands::Catalog => {
            cmd_catalog();
            Ok(())
        }
        Commands::Inspect { model } => cmd_inspect(&model),
        Commands::Scaffold {
            data_dir,
            output,
            input_size,
            base_filters,
        } => cmd_scaffold(&data_dir, &output, input_size, base_filters),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_diagnose(model: &Path, image: &Path, json: bool) -> Result<()> {
    info!("Diagnosing {:?} with model {:?}", image, model);

    let started = std::time::Instant::now();
    let handle = ModelHandle::load_default(model).map_err(|e| match e {
        ModelLoadError::NotFound(_) => anyhow::Error::new(e)
            .context("Train or scaffold a model first (see `leafcure scaffold`)"),
        other => anyhow::Error::new(other),
    })?;
    let input_size = handle.manifest().input_size;
    info!(
        "Model loaded in {} on {} ({}x{} input)",
        format_duration(started.elapsed().as_secs_f64()),
        backend_name(),
        input_size,
        input_size
    );

    let bytes = std::fs::read(image).with_context(|| format!("Failed to read {:?}", image))?;
    let result = diagnosis::diagnose(&handle, &bytes)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("{}", "Prediction".cyan().bold());
    println!("  Disease:    {}", result.label.green().bold());
    println!("  Confidence: {}", format_confidence(result.confidence));
    println!();
    println!("{}", "Cure Suggestion".cyan().bold());
    if result.unknown_disease {
        println!("  {}", result.advisory.text.yellow());
    } else {
        for line in result.advisory.text.lines() {
            println!("  {}", line);
        }
    }

    if !result.alternatives.is_empty() {
        println!();
        println!("{}", "Other candidates".dimmed());
        for alt in &result.alternatives {
            println!(
                "  {:40} {}",
                remedy::normalize(&alt.label).display,
                format_confidence(alt.probability)
            );
        }
    }

    Ok(())
}

fn cmd_remedy(label: &str) {
    let (normalized, advisory) = remedy::lookup(label);

    println!("{} {}", "Disease:".cyan().bold(), normalized.display);
    match advisory.keyword {
        Some(keyword) => println!("{} {}", "Matched:".cyan().bold(), keyword),
        None => println!("{} none", "Matched:".cyan().bold()),
    }
    println!();
    println!("{}", advisory.text);
}

fn cmd_catalog() {
    println!("{}", "Remedy catalog (first match wins)".cyan().bold());
    for (i, (keyword, text)) in REMEDY_CATALOG.iter().enumerate() {
        println!();
        println!("{}. {}", i + 1, keyword.green().bold());
        for line in text.lines() {
            println!("   {}", line);
        }
    }
}

fn cmd_inspect(model: &Path) -> Result<()> {
    let manifest = ModelManifest::load(model)?;

    println!("{}", "Model manifest".cyan().bold());
    println!("  Path:        {}", model.display());
    println!("  Version:     {}", manifest.version);
    println!("  Input size:  {}x{}", manifest.input_size, manifest.input_size);
    println!("  Weights:     {}", manifest.weights_path(model).display());
    println!(
        "  Network:     {} blocks, {} base filters, {} hidden units",
        manifest.network.num_blocks, manifest.network.base_filters, manifest.network.hidden_units
    );
    println!("  Trained:     {}", manifest.provenance.trained);
    if let Some(dir) = &manifest.provenance.dataset_dir {
        println!("  Dataset:     {}", dir.display());
    }

    println!();
    println!("{} ({})", "Classes".cyan().bold(), manifest.labels.len());
    for (i, label) in manifest.labels.iter().enumerate() {
        let advisory = remedy::lookup(label).1;
        let keyword = advisory.keyword.unwrap_or("-");
        println!("  {:>3}  {:45} {}", i, label, keyword.dimmed());
    }

    Ok(())
}

fn cmd_scaffold(
    data_dir: &Path,
    output: &Path,
    input_size: usize,
    base_filters: usize,
) -> Result<()> {
    let classes = discover_classes(data_dir)?;

    println!("{}", "Dataset".cyan().bold());
    for class in &classes.classes {
        println!("  {:45} {:>6} images", class.label, class.image_count);
    }
    println!("  {} classes, {} images", classes.classes.len(), classes.total_images());

    let network = LeafClassifierConfig::new().with_base_filters(base_filters);
    let manifest = scaffold_artifact(
        classes.labels(),
        output,
        network,
        input_size,
        Some(classes.root_dir.clone()),
    )?;

    println!();
    println!(
        "{} {} ({} classes, untrained weights)",
        "Wrote".green().bold(),
        output.display(),
        manifest.labels.len()
    );

    Ok(())
}
