//! Fetch Cache soak runner
//!
//! Hammers one shared cache from several worker threads and reports whether
//! the capacity bound held.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fetch_cache::soak::{self, SoakPlan, SoakReport};
use fetch_cache::{spawn_stats_reporter, Config, FetchCache};

/// Main entry point for the soak runner.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the shared cache
/// 4. Start background stats reporter
/// 5. Run the soak workers on the blocking pool
/// 6. Stop early on SIGINT/SIGTERM
/// 7. Print the final report as JSON
#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber with env filter
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fetch_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting fetch cache soak run");

    let config = Config::from_env();
    config.validate().context("invalid configuration")?;
    info!(
        "Configuration loaded: max_size={}, eviction_target={}, workers={}, requests={}, key_space={}",
        config.max_size,
        config.eviction_target,
        config.soak_workers,
        config.soak_requests,
        config.soak_key_space
    );

    let cache: FetchCache<String, String> =
        FetchCache::from_config(&config).context("failed to create cache")?;
    let reporter = spawn_stats_reporter(cache.clone(), config.stats_interval);

    let plan = Arc::new(SoakPlan::from_config(&config));
    let stop = Arc::new(AtomicBool::new(false));
    let started = Instant::now();

    let workers: Vec<_> = (0..config.soak_workers)
        .map(|worker| {
            let cache = cache.clone();
            let plan = Arc::clone(&plan);
            let stop = Arc::clone(&stop);
            tokio::task::spawn_blocking(move || soak::run_worker(worker, &cache, &plan, &stop))
        })
        .collect();

    let run = async move {
        let mut reports = Vec::with_capacity(workers.len());
        for handle in workers {
            reports.push(handle.await?);
        }
        Ok::<_, tokio::task::JoinError>(reports)
    };
    tokio::pin!(run);

    let reports = tokio::select! {
        reports = &mut run => reports,
        _ = shutdown_signal() => {
            warn!("Shutdown requested, stopping workers");
            stop.store(true, Ordering::Relaxed);
            run.await
        }
    }
    .context("soak worker panicked")?;

    reporter.abort();

    let report = SoakReport::new(&cache, reports, started.elapsed());
    info!(
        "Soak run finished: {} requests in {} ms, hit rate {:.1}%",
        report.total_requests(),
        report.elapsed_ms,
        report.stats.hit_rate() * 100.0
    );
    println!("{}", serde_json::to_string_pretty(&report)?);

    if !report.capacity_held() {
        bail!(
            "cache grew to {} entries, above capacity {}",
            report.max_observed_size,
            report.capacity
        );
    }
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
