//! CLI for planning and simulating datacenter-aware repairs

use clap::{Parser, Subcommand};
use dcrepair::ops::{plan_cluster, repair_cluster};
use dcrepair::{Error, RepairConfig, RepairParallelism};
use rand::Rng;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "dcrepair")]
#[command(about = "Datacenter-aware repair request sequencing")]
#[command(version)]
struct Cli {
    /// Cluster config (TOML)
    #[arg(long, default_value = "dcrepair.toml")]
    config: PathBuf,

    /// Override the configured parallelism (sequential, parallel, dc_parallel)
    #[arg(long)]
    parallelism: Option<RepairParallelism>,

    /// Print machine-readable JSON
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show dispatch waves without running anything
    Plan,

    /// Run a repair against simulated nodes
    Simulate {
        /// Minimum simulated request latency
        #[arg(long)]
        min_latency_ms: Option<u64>,

        /// Maximum simulated request latency
        #[arg(long)]
        max_latency_ms: Option<u64>,

        /// Probability that a simulated request fails
        #[arg(long)]
        fail_rate: Option<f64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load config from file, then override with CLI arguments
    let mut config = RepairConfig::load(&cli.config)?;
    if let Some(parallelism) = cli.parallelism {
        config.parallelism = parallelism;
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Plan => {
            let plan = plan_cluster(&config)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&plan)?);
                return Ok(());
            }

            println!("Repair plan ({}):", plan.parallelism);
            for (i, wave) in plan.waves.iter().enumerate() {
                println!("  Wave {}:", i + 1);
                for t in &wave.targets {
                    println!("    {} ({})", t.target, t.datacenter);
                }
            }
            println!("  Total targets: {}", plan.total());
            println!("  Max in flight: {}", plan.max_concurrency());
        }

        Commands::Simulate {
            min_latency_ms,
            max_latency_ms,
            fail_rate,
        } => {
            if let Some(ms) = min_latency_ms {
                config.simulation.min_latency_ms = ms;
            }
            if let Some(ms) = max_latency_ms {
                config.simulation.max_latency_ms = ms;
            }
            if let Some(rate) = fail_rate {
                config.simulation.fail_rate = rate;
            }
            config.validate()?;

            let sim = config.simulation.clone();
            let report = repair_cluster(&config, move |target: String| {
                let mut rng = rand::thread_rng();
                let latency =
                    Duration::from_millis(rng.gen_range(sim.min_latency_ms..=sim.max_latency_ms));
                let fail = rng.gen_bool(sim.fail_rate);
                async move {
                    tracing::debug!(node = %target, ?latency, "simulating repair");
                    tokio::time::sleep(latency).await;
                    if fail {
                        Err(Error::Other("simulated failure".into()))
                    } else {
                        Ok(())
                    }
                }
            })
            .await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("Repair report ({}):", report.parallelism);
                println!("  Targets: {}", report.total);
                println!("  Succeeded: {}", report.succeeded);
                println!("  Failed: {}", report.failed.len());
                for failure in &report.failed {
                    println!("    {}: {}", failure.target, failure.reason);
                }
                println!("  Dispatch order: {}", report.dispatch_order.join(", "));
                println!("  Elapsed: {} ms", report.elapsed_ms);
            }

            if !report.is_success() {
                anyhow::bail!("{} repair requests failed", report.failed.len());
            }
        }
    }

    Ok(())
}
