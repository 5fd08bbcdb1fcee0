//! Control-loop service.
//!
//! One iteration: poll for a gain update, rebuild if one arrived, integrate
//! one step, hand off a sample when due, then wait for the next tick.

use crate::command::CommandSource;
use crate::error::{AppError, AppResult};
use crate::pacing::{Pacer, Shutdown};
use crate::telemetry::TelemetrySink;
use pl_sim::{Engine, SimError};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Options for the control loop.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Pace ticks to wall-clock time.
    pub realtime: bool,
    /// Stop after this much simulated time. Runs until shutdown when `None`.
    pub max_duration_s: Option<f64>,
}

/// Counters reported when the loop ends.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub ticks: u64,
    pub samples_emitted: u64,
    pub samples_dropped: u64,
    pub updates_accepted: u64,
    pub updates_rejected: u64,
    pub commands_malformed: u64,
    pub overruns: u64,
    /// Simulated time at exit (s).
    pub final_time: f64,
}

/// Drive `engine` until shutdown, the duration limit, or divergence.
///
/// The engine is started without resetting and is stopped on return.
/// Divergence ends the loop with [`SimError::IntegrationDiverged`].
pub fn run_loop<C, S>(
    engine: &mut Engine,
    commands: &mut C,
    sink: &mut S,
    opts: &RunOptions,
    shutdown: &Shutdown,
) -> AppResult<RunSummary>
where
    C: CommandSource,
    S: TelemetrySink,
{
    let dt = engine.clock().dt();
    let max_ticks = match opts.max_duration_s {
        Some(d) if !d.is_finite() || d < 0.0 => {
            return Err(AppError::Config(format!(
                "run duration must be non-negative (got {d})"
            )));
        }
        Some(d) => Some((d / dt).round() as u64),
        None => None,
    };
    let mut pacer = opts.realtime.then(|| Pacer::new(Duration::from_secs_f64(dt)));
    let mut summary = RunSummary::default();

    engine.start(false);
    info!(
        realtime = opts.realtime,
        max_duration_s = ?opts.max_duration_s,
        "Control loop started"
    );

    while !shutdown.is_triggered() && max_ticks.is_none_or(|max| summary.ticks < max) {
        if let Some(gains) = commands.try_recv() {
            let previous = engine.gains();
            match engine.apply_gains(gains) {
                Ok(()) => {
                    summary.updates_accepted += 1;
                    info!(from = %previous, to = %gains, "Gain update accepted");
                }
                Err(SimError::Rebuild(e)) => {
                    summary.updates_rejected += 1;
                    warn!(error = %e, "Gain update rejected");
                }
                Err(e) => return Err(e.into()),
            }
        }

        match engine.step() {
            Ok(Some(sample)) => match sink.try_deliver(&sample) {
                Ok(()) => summary.samples_emitted += 1,
                Err(AppError::SinkUnavailable) => {
                    summary.samples_dropped += 1;
                    debug!(t = sample.timestamp, "Telemetry sink busy, sample dropped");
                }
                Err(e) => return Err(e),
            },
            Ok(None) => {}
            Err(e) => {
                error!(ticks = summary.ticks, error = %e, "Control loop aborted");
                return Err(e.into());
            }
        }
        summary.ticks += 1;

        if let Some(pacer) = pacer.as_mut() {
            if !pacer.wait_next(shutdown) {
                break;
            }
        }
    }

    engine.stop();
    summary.commands_malformed = commands.malformed();
    summary.overruns = pacer.map_or(0, |p| p.overruns());
    summary.final_time = engine.time();
    info!(
        ticks = summary.ticks,
        emitted = summary.samples_emitted,
        dropped = summary.samples_dropped,
        accepted = summary.updates_accepted,
        rejected = summary.updates_rejected,
        malformed = summary.commands_malformed,
        final_time = summary.final_time,
        "Control loop finished"
    );
    Ok(summary)
}
