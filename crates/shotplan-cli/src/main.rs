//! shotplan command-line entry point.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use futures::future::join_all;
use shotplan_cli::{BatchEntry, GenerationOutput, Generator, PipelineConfig};
use shotplan_models::{OutputFormat, ProviderKind};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Turn still images into timed camera-shot prompts for video models.
#[derive(Debug, Parser)]
#[command(name = "shotplan", version, about)]
struct Args {
    /// Image files to process
    #[arg(required_unless_present = "schema")]
    images: Vec<PathBuf>,

    /// Video length in seconds (defaults to SHOTPLAN_DEFAULT_DURATION, then 30)
    #[arg(short, long)]
    duration: Option<u32>,

    /// Action to embed verbatim, e.g. "waves hello"
    #[arg(short, long)]
    action: Option<String>,

    /// Output format: timestamp, narrative or both
    #[arg(short, long)]
    format: Option<OutputFormat>,

    /// Seed for reproducible plans
    #[arg(long)]
    seed: Option<u64>,

    /// Provider to try first: openai, gemini, huggingface or local
    #[arg(short, long)]
    provider: Option<ProviderKind>,

    /// Skip the other remote providers when one is pinned
    #[arg(long)]
    no_fallback: bool,

    /// Print a JSON array with one entry per image, failures included
    #[arg(long)]
    json: bool,

    /// Print the JSON Schema of the `--json` output and exit
    #[arg(long)]
    schema: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Load environment variables
    dotenvy::dotenv().ok();
    init_tracing()?;

    let args = Args::parse();

    if args.schema {
        let schema = schemars::schema_for!(Vec<BatchEntry>);
        println!("{}", serde_json::to_string_pretty(&schema)?);
        return Ok(ExitCode::SUCCESS);
    }

    // Flags override the environment
    let mut config = PipelineConfig::from_env();
    if let Some(kind) = args.provider {
        config.chain.pinned = Some(kind);
    }
    if args.no_fallback {
        config.chain.fallback_enabled = false;
    }
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    if let Some(format) = args.format {
        config.default_format = format;
    }
    if let Some(duration) = args.duration {
        config.default_duration_secs = duration;
    }

    info!(
        providers = ?config.providers.iter().map(|s| s.identifier()).collect::<Vec<_>>(),
        pinned = ?config.chain.pinned,
        images = args.images.len(),
        "Starting shotplan"
    );

    let generator = Generator::new(config).context("Failed to set up the pipeline")?;
    let mut request = generator.default_request();
    if let Some(action) = args.action {
        request = request.with_custom_action(action);
    }

    let results = join_all(
        args.images
            .iter()
            .map(|path| generator.generate_from_path(path, &request)),
    )
    .await;

    let entries: Vec<BatchEntry> = args
        .images
        .iter()
        .zip(results)
        .map(|(path, result)| BatchEntry::new(path.display().to_string(), result))
        .collect();
    let failures = entries.iter().filter(|entry| !entry.is_ok()).count();

    if args.json {
        // One entry per image, failures included
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        for entry in &entries {
            match (&entry.output, &entry.error) {
                (Some(output), _) => print_text(&entry.source, output),
                (None, Some(failure)) => eprintln!("{}: {}", entry.source, failure.message),
                (None, None) => {}
            }
        }
    }

    if failures > 0 {
        error!(failures, images = entries.len(), "Some images failed");
    }
    Ok(if failures == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn init_tracing() -> anyhow::Result<()> {
    // Colored output for terminals, JSON for log collectors
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("shotplan=info".parse()?)
        .add_directive("shotplan_cli=info".parse()?)
        .add_directive("shotplan_vision=info".parse()?)
        .add_directive("shotplan_planner=warn".parse()?);

    // Prompts go to stdout, logs to stderr
    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
    Ok(())
}

fn print_text(source: &str, output: &GenerationOutput) {
    println!("== {} ==", source);
    println!(
        "provider: {}{}",
        output.analysis.provider_used,
        if output.analysis.degraded { " (fallback)" } else { "" }
    );
    println!("seed: {}", output.timeline.seed);
    if let Some(timestamp) = &output.prompts.timestamp {
        println!("\nTimestamp:\n{}", timestamp);
    }
    if let Some(narrative) = &output.prompts.narrative {
        println!("\nNarrative:\n{}", narrative);
    }
    println!();
}
