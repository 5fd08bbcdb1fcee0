use clap::{Args, Parser, Subcommand};
use pl_app::{
    AppError, AppResult, ChannelCommandSource, ChannelSink, EngineConfig, RunOptions, Shutdown,
    run_loop, spawn_json_writer, spawn_line_reader,
};
use pl_control::{ClosedLoopSystem, analyze};
use pl_plant::PlantMatrices;
use pl_sim::{IntegratorType, StepMetrics, run_for};
use std::io::{self, BufReader, BufWriter};
use std::path::PathBuf;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pl-cli")]
#[command(about = "PressLoop CLI - closed-loop pressure actuator simulation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stream telemetry to stdout while reading gain updates from stdin
    Run {
        #[command(flatten)]
        engine: EngineArgs,
        /// Stop after this many simulated seconds (runs until Ctrl+C otherwise)
        #[arg(long)]
        duration: Option<f64>,
    },
    /// Print the closed-loop poles for the configured gains
    Poles {
        #[command(flatten)]
        engine: EngineArgs,
    },
    /// Run a setpoint step offline and print response metrics
    Step {
        #[command(flatten)]
        engine: EngineArgs,
        /// Simulated duration in seconds
        #[arg(long, default_value_t = 20.0)]
        duration: f64,
        /// Relative settling band
        #[arg(long, default_value_t = 0.01)]
        band: f64,
    },
    /// Show the effective configuration and plant matrices
    Params {
        #[command(flatten)]
        engine: EngineArgs,
    },
}

/// Engine configuration file plus command-line overrides.
#[derive(Args)]
struct EngineArgs {
    /// Path to the engine YAML file
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Pressure setpoint in bar
    #[arg(long)]
    setpoint: Option<f64>,
    /// Proportional gain
    #[arg(long)]
    kp: Option<f64>,
    /// Integral gain
    #[arg(long)]
    ki: Option<f64>,
    /// Derivative gain
    #[arg(long)]
    kd: Option<f64>,
    /// Integration step in seconds
    #[arg(long)]
    dt: Option<f64>,
    /// Telemetry interval in seconds
    #[arg(long)]
    output_interval: Option<f64>,
    /// Use forward Euler instead of RK4
    #[arg(long)]
    euler: bool,
    /// Run as fast as possible instead of pacing to wall-clock time
    #[arg(long)]
    no_realtime: bool,
}

impl EngineArgs {
    fn load(&self) -> AppResult<EngineConfig> {
        let mut config = match &self.config {
            Some(path) => EngineConfig::load(path)?,
            None => EngineConfig::default(),
        };
        if let Some(v) = self.setpoint {
            config.setpoint = v;
        }
        if let Some(v) = self.kp {
            config.gains.kp = v;
        }
        if let Some(v) = self.ki {
            config.gains.ki = v;
        }
        if let Some(v) = self.kd {
            config.gains.kd = v;
        }
        if let Some(v) = self.dt {
            config.dt_s = v;
        }
        if let Some(v) = self.output_interval {
            config.output_interval_s = v;
        }
        if self.euler {
            config.integrator = IntegratorType::ForwardEuler;
        }
        if self.no_realtime {
            config.realtime = false;
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> AppResult<()> {
    // Logs go to stderr; stdout carries telemetry.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { engine, duration } => cmd_run(&engine, duration),
        Commands::Poles { engine } => cmd_poles(&engine),
        Commands::Step {
            engine,
            duration,
            band,
        } => cmd_step(&engine, duration, band),
        Commands::Params { engine } => cmd_params(&engine),
    }
}

fn cmd_run(args: &EngineArgs, duration: Option<f64>) -> AppResult<()> {
    let config = args.load()?;
    let mut engine = config.build_engine()?;

    let shutdown = Shutdown::new();
    let handler = shutdown.clone();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        handler.trigger();
    })
    .map_err(|e| AppError::Signal(e.to_string()))?;

    // The reader thread is not joined: it may stay blocked on stdin.
    let (lines, _reader) =
        spawn_line_reader(BufReader::new(io::stdin()), config.command_capacity);
    let mut commands = ChannelCommandSource::new(lines);

    let (tx, rx) = crossbeam::channel::bounded(config.telemetry_capacity);
    let writer = spawn_json_writer(BufWriter::new(io::stdout()), rx, shutdown.clone());
    let mut sink = ChannelSink::new(tx);

    info!(
        setpoint = config.setpoint,
        gains = %config.gains,
        dt_s = config.dt_s,
        output_interval_s = engine.clock().output_interval(),
        "Starting pressure loop"
    );

    let opts = RunOptions {
        realtime: config.realtime,
        max_duration_s: duration,
    };
    let result = run_loop(&mut engine, &mut commands, &mut sink, &opts, &shutdown);

    drop(sink);
    match writer.join() {
        Ok(Ok(written)) => debug!(written, "Telemetry writer joined"),
        Ok(Err(e)) => warn!(error = %e, "Telemetry writer stopped early"),
        Err(_) => warn!("Telemetry writer panicked"),
    }

    result.map(|_| ())
}

fn cmd_poles(args: &EngineArgs) -> AppResult<()> {
    let config = args.load()?;
    let plant = PlantMatrices::from_params(&config.plant)?;
    let system = ClosedLoopSystem::build(&plant, config.gains)?;
    let report = analyze(&system)?;

    println!("Closed-loop poles for {}:", config.gains);
    for pole in &report.poles {
        if pole.im.abs() < 1e-12 {
            println!("  {:>12.4}", pole.re);
        } else {
            println!("  {:>12.4} {:+.4}j", pole.re, pole.im);
        }
    }
    println!("  Spectral abscissa: {:.4} 1/s", report.spectral_abscissa);
    println!(
        "  Dominant pole: {:.4} {:+.4}j (wn = {:.4} rad/s, zeta = {:.3})",
        report.dominant.pole.re,
        report.dominant.pole.im,
        report.dominant.natural_frequency,
        report.dominant.damping_ratio
    );
    if report.stable {
        println!("✓ Closed loop is stable");
    } else {
        println!("✗ Closed loop is unstable");
    }
    Ok(())
}

fn cmd_step(args: &EngineArgs, duration: f64, band: f64) -> AppResult<()> {
    let config = args.load()?;
    let mut engine = config.build_engine()?;

    println!(
        "Step response to {:.1} bar with {} ({:.1} s simulated)",
        config.setpoint, config.gains, duration
    );
    let record = run_for(&mut engine, duration)?;
    let metrics = StepMetrics::from_series(&record.t, &record.y, config.setpoint, band)?;

    let fmt_time = |t: Option<f64>| match t {
        Some(t) => format!("{t:.3} s"),
        None => "n/a".to_string(),
    };
    println!("  Rise time (10-90%):  {}", fmt_time(metrics.rise_time));
    println!("  Overshoot:           {:.2} %", metrics.overshoot_percent);
    println!(
        "  Settling time (±{:.1}%): {}",
        band * 100.0,
        fmt_time(metrics.settling_time)
    );
    println!("  Steady-state error:  {:.4} bar", metrics.steady_state_error);
    println!("  Final pressure:      {:.3} bar", engine.output());
    println!("  Final voltage:       {:.3} V", engine.control_input());
    Ok(())
}

fn cmd_params(args: &EngineArgs) -> AppResult<()> {
    let config = args.load()?;
    let plant = PlantMatrices::from_params(&config.plant)?;
    let p = &config.plant;

    let yaml = serde_yaml::to_string(&config)?;
    println!("{yaml}");
    println!("Derived quantities:");
    println!("  Valve inertia:     {:.5} kg·m²", p.valve_inertia());
    println!("  Reflected inertia: {:.5} kg·m²", p.reflected_inertia());
    println!("  Total inertia:     {:.5} kg·m²", p.total_inertia());
    println!("  Load torque:       {:.4} N·m", p.load_torque());
    println!("A ={}", plant.a());
    println!("B ={}", plant.b());
    println!("C ={}", plant.c());
    Ok(())
}
