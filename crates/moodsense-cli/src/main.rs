use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use moodsense_core::{aggregate, recommend, OnnxAnalyzer};

mod config;
mod engine;
mod render;

use config::Config;
use render::Outcome;

#[derive(Parser)]
#[command(name = "moodsense", about = "Employee mood analysis and task recommendation CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a face image and print mood scores and task recommendations
    Analyze {
        /// Path to a JPG/JPEG/PNG face image
        image: PathBuf,
        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
        /// Analyze the full frame when no face clears the detection threshold
        #[arg(long)]
        no_require_face: bool,
    },
    /// Verify the configured model files load
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();

    match cli.command {
        Commands::Analyze {
            image,
            json,
            no_require_face,
        } => {
            // The flag only ever relaxes enforcement; the env default stands otherwise.
            let require_face = config.require_face && !no_require_face;
            run_analyze(&config, &image, json, require_face).await
        }
        Commands::Check => run_check(&config),
    }
}

async fn run_analyze(
    config: &Config,
    image_path: &PathBuf,
    json: bool,
    require_face: bool,
) -> Result<()> {
    let image = image::open(image_path)
        .with_context(|| format!("failed to load image {}", image_path.display()))?
        .to_rgb8();

    // Model load failures and detection failures render the same way: a
    // single failure outcome, and the scoring core never runs.
    let engine = match engine::spawn_engine(config, require_face) {
        Ok(engine) => engine,
        Err(e) => return fail(json, e.to_string()),
    };

    let analysis = match engine.analyze(image).await {
        Ok(analysis) => analysis,
        Err(e) => return fail(json, e.to_string()),
    };

    let report = aggregate(
        &analysis.emotions,
        analysis.dominant_emotion,
        analysis.age,
        analysis.gender.as_deref(),
    );
    let recommendation = recommend(report.category, report.stress_score, report.positive_score);

    if json {
        let outcome = Outcome::success(report, recommendation);
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print!("{}", render::render_text(&report, &recommendation));
    }

    Ok(())
}

/// Print a failure outcome (the error message verbatim) and exit nonzero.
fn fail(json: bool, message: String) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&Outcome::error(message))?);
    } else {
        eprintln!("Error in emotion analysis: {message}");
    }
    std::process::exit(1);
}

fn run_check(config: &Config) -> Result<()> {
    println!("model directory: {}", config.model_dir.display());

    match OnnxAnalyzer::load(
        &config.detector_model_path(),
        &config.emotion_model_path(),
        &config.age_model_path(),
        &config.gender_model_path(),
        config.confidence_threshold,
        true,
    ) {
        Ok(analyzer) => {
            println!("detector: ok");
            println!("emotion: ok");
            println!("age: {}", if analyzer.has_age() { "ok" } else { "missing (optional)" });
            println!("gender: {}", if analyzer.has_gender() { "ok" } else { "missing (optional)" });
            Ok(())
        }
        Err(e) => {
            println!("load failed: {e}");
            std::process::exit(1);
        }
    }
}
