//! CLI command implementations.

use crate::settings::{Settings, SettingsError, SimulationSettings};
use loaner_core::{MaxSize, PoolStats, PoolingConfig, TargetFactory, TargetPool};
use loaner_pool::{FixedPool, GenericPool};
use loaner_target::{InvokeError, PooledInvocationTarget, Proxy, TargetContext, TargetError};
use serde::Serialize;
use std::convert::Infallible;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;
use thiserror::Error;

/// CLI errors.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Target(#[from] TargetError),

    #[error("pool error: {0}")]
    Pool(#[from] loaner_core::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("worker thread panicked")]
    WorkerPanicked,
}

pub type Result<T> = std::result::Result<T, CliError>;

/// Which pool implementation to simulate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum PoolKind {
    /// Grows lazily; fails or blocks when exhausted.
    Generic,
    /// Built up front; always blocks when exhausted.
    Fixed,
}

impl PoolKind {
    fn as_str(self) -> &'static str {
        match self {
            Self::Generic => "generic",
            Self::Fixed => "fixed",
        }
    }
}

/// A simulated backing object.
#[derive(Debug)]
pub struct Worker {
    id: usize,
    served: u64,
}

/// Builds numbered workers.
#[derive(Debug, Default)]
pub struct WorkerFactory {
    next: AtomicUsize,
}

impl TargetFactory<Worker> for WorkerFactory {
    fn create(&self) -> loaner_core::Result<Worker> {
        let id = self.next.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(worker = id, "worker created");
        Ok(Worker { id, served: 0 })
    }

    fn destroy(&self, worker: Worker) {
        tracing::debug!(worker = worker.id, served = worker.served, "worker destroyed");
    }
}

/// Outcome of one simulation run.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    /// Pool implementation used.
    pub pool: &'static str,
    /// Configured maximum size.
    pub max_size: MaxSize,
    /// Worker threads.
    pub threads: usize,
    /// Invocations attempted per thread.
    pub iterations: usize,
    /// Invocations that ran.
    pub succeeded: u64,
    /// Invocations refused for lack of capacity.
    pub rejected: u64,
    /// Most targets observed in use at once.
    pub peak_in_use: usize,
    /// Whether the peak stayed within `max_size`.
    pub within_bounds: bool,
    /// Wall-clock duration of the run.
    pub elapsed_ms: u128,
    /// Pool statistics just before shutdown.
    pub stats: PoolStats,
}

/// Runs the borrow/release simulation and prints its report.
pub fn simulate(settings: &Settings, kind: PoolKind, json: bool) -> Result<()> {
    settings.validate()?;
    tracing::info!(pool = kind.as_str(), max_size = %settings.pool.max_size, "starting simulation");

    let report = match kind {
        PoolKind::Generic => run(
            kind,
            GenericPool::new(WorkerFactory::default(), settings.pool.clone()),
            &settings.simulation,
        )?,
        PoolKind::Fixed => run(
            kind,
            FixedPool::new(WorkerFactory::default(), settings.pool.clone()),
            &settings.simulation,
        )?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

/// Prints the effective settings as JSON.
pub fn show_config(settings: &Settings) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(settings)?);
    Ok(())
}

fn run<P>(kind: PoolKind, pool: P, workload: &SimulationSettings) -> Result<SimulationReport>
where
    P: TargetPool<Target = Worker> + 'static,
{
    let target = Arc::new(PooledInvocationTarget::new("workers", pool));
    let mut context = TargetContext::new("loaner");
    context.register("workers", target.clone())?;
    context.start()?;

    let proxy = Proxy::pooled(Arc::clone(&target));
    let in_use = AtomicUsize::new(0);
    let peak = AtomicUsize::new(0);
    let succeeded = AtomicU64::new(0);
    let rejected = AtomicU64::new(0);
    let hold = workload.hold();
    let started = Instant::now();

    thread::scope(|scope| -> Result<()> {
        let workers: Vec<_> = (0..workload.threads)
            .map(|_| {
                scope.spawn(|| -> loaner_core::Result<()> {
                    for _ in 0..workload.iterations {
                        let outcome = proxy.invoke(|worker| {
                            let now = in_use.fetch_add(1, Ordering::SeqCst) + 1;
                            peak.fetch_max(now, Ordering::SeqCst);
                            thread::sleep(hold);
                            worker.served += 1;
                            in_use.fetch_sub(1, Ordering::SeqCst);
                            Ok::<_, Infallible>(())
                        });
                        match outcome {
                            Ok(()) => {
                                succeeded.fetch_add(1, Ordering::Relaxed);
                            }
                            Err(InvokeError::Pool(e)) if e.is_exhaustion() => {
                                rejected.fetch_add(1, Ordering::Relaxed);
                            }
                            Err(InvokeError::Pool(e)) => return Err(e),
                            Err(InvokeError::Operation(never)) => match never {},
                        }
                    }
                    Ok(())
                })
            })
            .collect();

        for worker in workers {
            worker.join().map_err(|_| CliError::WorkerPanicked)??;
        }
        Ok(())
    })?;

    let elapsed = started.elapsed();
    let stats = proxy
        .pooling_config()
        .map_or_else(|| target.stats(), PoolingConfig::stats);
    context.shutdown()?;

    let max_size = stats.max_size;
    let peak_in_use = peak.load(Ordering::SeqCst);
    let report = SimulationReport {
        pool: kind.as_str(),
        max_size,
        threads: workload.threads,
        iterations: workload.iterations,
        succeeded: succeeded.load(Ordering::Relaxed),
        rejected: rejected.load(Ordering::Relaxed),
        peak_in_use,
        within_bounds: max_size.limit().map_or(true, |limit| peak_in_use <= limit),
        elapsed_ms: elapsed.as_millis(),
        stats,
    };
    tracing::info!(
        succeeded = report.succeeded,
        rejected = report.rejected,
        peak = report.peak_in_use,
        "simulation finished"
    );
    Ok(report)
}

fn print_report(report: &SimulationReport) {
    println!("Loaner simulation ({} pool)", report.pool);
    println!("==========================");
    println!("  Max size:      {}", report.max_size);
    println!(
        "  Workload:      {} threads x {} invocations",
        report.threads, report.iterations
    );
    println!("  Succeeded:     {}", report.succeeded);
    println!("  Rejected:      {}", report.rejected);
    println!(
        "  Peak in use:   {}{}",
        report.peak_in_use,
        if report.within_bounds { "" } else { " (over limit!)" }
    );
    println!("  Created:       {}", report.stats.created);
    println!("  Idle at end:   {}", report.stats.idle);
    println!("  Elapsed:       {} ms", report.elapsed_ms);
}
