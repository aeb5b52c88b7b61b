//! Simulated acquisition run
//!
//! Drives the pipeline against the simulated register device, printing
//! status lines and decoded results as they arrive. With `--auto-restart`
//! the loop plays the operator and restarts whichever stage halted.
//!
//! Usage:
//!   cargo run --example simulate -- --run-secs 10 --auto-restart
//!   RUST_LOG=debug cargo run --example simulate -- --seed 7 --decode-failure-rate 0.5

use acqpipe::{
    FaultInjector, FlakyDecoder, ParseResult, Pipeline, PipelineConfig, RegisterDecoder,
    SimulatedSource, StageState, StatusEvent,
};
use clap::Parser;
use crossbeam_channel::{select, tick, unbounded};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about = "Simulated two-stage acquisition pipeline")]
struct Args {
    /// Probability that a receive attempt times out
    #[arg(long, default_value_t = 0.3)]
    receive_failure_rate: f64,

    /// Probability that a decode fails its CRC check
    #[arg(long, default_value_t = 0.3)]
    decode_failure_rate: f64,

    /// Delay between receive attempts in milliseconds
    #[arg(long, default_value_t = 100)]
    receive_interval_ms: u64,

    /// Parser wait on an empty queue in milliseconds
    #[arg(long, default_value_t = 50)]
    idle_interval_ms: u64,

    /// Parser drain time after stop in milliseconds
    #[arg(long, default_value_t = 1000)]
    grace_ms: u64,

    /// How long to run before stopping
    #[arg(short, long, default_value_t = 5)]
    run_secs: u64,

    /// Seed both fault injectors for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Restart halted stages automatically
    #[arg(short, long)]
    auto_restart: bool,
}

fn injector(rate: f64, seed: Option<u64>) -> FaultInjector {
    match seed {
        Some(seed) => FaultInjector::seeded(rate, seed),
        None => FaultInjector::new(rate),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    info!("=== Simulated Acquisition ===");
    info!(
        "Failure rates: receive={:.2}, decode={:.2}",
        args.receive_failure_rate, args.decode_failure_rate
    );

    let config = PipelineConfig::new()
        .with_receive_interval(Duration::from_millis(args.receive_interval_ms))
        .with_idle_interval(Duration::from_millis(args.idle_interval_ms))
        .with_grace_period(Duration::from_millis(args.grace_ms));

    let source = SimulatedSource::with_faults(injector(args.receive_failure_rate, args.seed));
    // Distinct seed per injector
    let decoder = FlakyDecoder::new(
        RegisterDecoder::new(),
        injector(args.decode_failure_rate, args.seed.map(|s| s.wrapping_add(1))),
    );

    let (status_tx, status_rx) = unbounded::<StatusEvent>();
    let (result_tx, result_rx) = unbounded::<ParseResult>();

    let controller = Pipeline::new(source, decoder)
        .with_config(config)
        .with_status_sink(Arc::new(status_tx))
        .with_result_sink(Box::new(result_tx))
        .build()?;

    controller.start()?;

    let deadline = Instant::now() + Duration::from_secs(args.run_secs);
    let operator = tick(Duration::from_millis(250));
    let mut results = 0usize;
    let mut restarts = 0usize;

    while Instant::now() < deadline {
        select! {
            recv(status_rx) -> event => {
                if let Ok(event) = event {
                    println!("{}", event);
                }
            }
            recv(result_rx) -> result => {
                if let Ok(result) = result {
                    results += 1;
                    println!("  result #{}: {}", results, result.summary());
                }
            }
            recv(operator) -> _ => {
                let halted = controller.receiver_state() == StageState::Faulted
                    || controller.parser_state() == StageState::Faulted;
                if halted && args.auto_restart {
                    info!("Operator restart");
                    restarts += 1;
                    if let Err(e) = controller.restart() {
                        warn!("Restart failed: {}", e);
                        break;
                    }
                }
            }
        }
    }

    info!("Stopping...");
    controller.stop();
    std::thread::sleep(config.grace_period + Duration::from_millis(100));

    for event in status_rx.try_iter() {
        println!("{}", event);
    }
    results += result_rx.try_iter().count();

    info!(
        "Done! {} results, {} restarts, {} frames left queued",
        results,
        restarts,
        controller.queue().len()
    );

    Ok(())
}
